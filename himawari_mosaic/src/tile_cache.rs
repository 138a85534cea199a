/*
 * Copyright © 2025, United States Government, as represented by the Administrator of
 * the National Aeronautics and Space Administration. All rights reserved.
 *
 * The “ODIN” software is licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License. You may obtain a copy
 * of the License at http://www.apache.org/licenses/LICENSE-2.0.
 *
 * Unless required by applicable law or agreed to in writing, software distributed under
 * the License is distributed on an "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND,
 * either express or implied. See the License for the specific language governing permissions
 * and limitations under the License.
 */

//! fetch-or-reuse semantics for single tiles. A tile that exists at its cache path is complete and
//! immutable, we never request it again

use std::{path::PathBuf, sync::Arc, time::Duration};
use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use himawari_common::fs::{ensure_dir, write_file_atomic};
use crate::{
    config::MosaicConfig,
    errors::FetchError,
    grid::{Depth, GridCoordinate, wire_axes},
    layout::CacheLayout,
    transport::TileTransport,
};

/// product path element of the full disk true color imagery
pub const TILE_PRODUCT: &str = "D531106";

/// a present tile
#[derive(Debug,Clone,PartialEq)]
pub struct TileRecord {
    pub coord: GridCoordinate,
    pub path: PathBuf,
}

#[derive(Debug,Clone,Copy,PartialEq,Eq)]
pub enum TileStatus {
    Cached,
    Fetched,
}

/// `{base}/D531106/{depth}d/{tile_size}/{YYYY}/{MM}/{DD}/{HHMMSS}_{row}_{column}.png`
pub fn tile_url (base_url: &str, depth: Depth, tile_size: u32, date: &DateTime<Utc>, coord: &GridCoordinate)->String {
    let (wire_row, wire_column) = wire_axes( coord);
    format!("{}/{}/{}d/{}/{}_{}_{}.png",
        base_url.trim_end_matches('/'), TILE_PRODUCT, depth, tile_size,
        date.format("%Y/%m/%d/%H%M%S"), wire_row, wire_column)
}

/// exponential backoff `retry_delay * 2^retry`, saturating instead of overflowing for large retry counts
pub fn backoff_delay (retry_delay: Duration, retry: usize)->Duration {
    let factor = u32::try_from( retry).map_or( u32::MAX, |n| 2u32.saturating_pow( n));
    retry_delay.saturating_mul( factor)
}

pub struct TileCache {
    layout: CacheLayout,
    base_url: String,
    tile_size: u32,
    transport: Arc<dyn TileTransport>,
    max_retry: usize,
    retry_delay: Duration,
}

impl TileCache {
    pub fn new (layout: CacheLayout, config: &MosaicConfig, transport: Arc<dyn TileTransport>)->Self {
        TileCache {
            layout,
            base_url: config.base_url.clone(),
            tile_size: config.tile_size,
            transport,
            max_retry: config.max_retry,
            retry_delay: config.retry_delay,
        }
    }

    pub fn layout (&self)->&CacheLayout { &self.layout }

    pub fn tile_url (&self, date: &DateTime<Utc>, coord: &GridCoordinate)->String {
        tile_url( &self.base_url, self.layout.depth(), self.tile_size, date, coord)
    }

    /// get the path of a present tile, downloading it if we don't have it yet (single attempt)
    pub async fn fetch_tile (&self, date: &DateTime<Utc>, coord: &GridCoordinate)->Result<PathBuf,FetchError> {
        self.fetch_tile_with_status( date, coord).await.map( |(path,_)| path)
    }

    pub async fn fetch_tile_with_status (&self, date: &DateTime<Utc>, coord: &GridCoordinate)->Result<(PathBuf,TileStatus),FetchError> {
        let path = self.layout.tile_path( date, coord);
        if path.is_file() { // no dir creation, no content check
            debug!("{coord} cached");
            return Ok( (path, TileStatus::Cached) )
        }

        let url = self.tile_url( date, coord);
        info!("{coord} downloading {url}");

        let bytes = self.transport.fetch( &url).await.inspect_err( |e| warn!("{coord} download failed: {e}"))?;

        ensure_dir( self.layout.time_dir( date))?;
        write_file_atomic( &path, &bytes)?;

        Ok( (path, TileStatus::Fetched) )
    }

    /// same as `fetch_tile_with_status` but retries transport failures up to `max_retry` times
    /// with exponential backoff. Commit (IO) errors are not retried
    pub async fn fetch_tile_with_retry (&self, date: &DateTime<Utc>, coord: &GridCoordinate)->Result<(PathBuf,TileStatus),FetchError> {
        let mut retry = 0;
        loop {
            match self.fetch_tile_with_status( date, coord).await {
                Err(e) if e.is_transport() && retry < self.max_retry => {
                    let delay = backoff_delay( self.retry_delay, retry);
                    info!("{coord} retry {}/{} in {:?}", retry+1, self.max_retry, delay);
                    tokio::time::sleep( delay).await;
                    retry += 1;
                }
                res => return res
            }
        }
    }
}
