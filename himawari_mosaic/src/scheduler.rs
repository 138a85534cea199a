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

//! the per-run state machine that walks the time window and drives fetch, strip and mosaic steps

use std::{collections::HashMap, fmt, path::PathBuf, sync::Arc};
use chrono::{DateTime, DurationRound, TimeDelta, Utc};
use futures::{StreamExt, stream};
use tracing::{Instrument, Span, debug, info, info_span, warn};

use himawari_common::{datetime::{short_utc_datetime_string, to_time_delta}, fs::remove_temp_files};
use crate::{
    assembly::{ArtifactStatus, Assembler},
    config::MosaicConfig,
    daylight::DaylightFilter,
    errors::{AssemblyError, FetchError},
    grid::{GridCoordinate, RegionOfInterest},
    tile_cache::{TileCache, TileRecord, TileStatus},
};

/// what happened during one run. Incomplete timestamps are retried by the next run
#[derive(Debug,Clone,Default,PartialEq,Eq)]
pub struct RunSummary {
    pub walked: usize,
    pub skipped_night: usize,
    pub tiles_cached: usize,
    pub tiles_fetched: usize,
    pub tiles_failed: usize,
    pub corrupt_tiles: usize,
    pub strips_built: usize,
    pub mosaics_built: usize,
    pub mosaics_existing: usize,
    pub incomplete: usize,
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "timestamps: {} (night: {}, incomplete: {}), tiles: {} fetched, {} cached, {} failed, {} corrupt, strips built: {}, mosaics: {} built, {} existing",
            self.walked, self.skipped_night, self.incomplete,
            self.tiles_fetched, self.tiles_cached, self.tiles_failed, self.corrupt_tiles,
            self.strips_built, self.mosaics_built, self.mosaics_existing)
    }
}

#[derive(Debug,Clone,PartialEq)]
pub enum TimestampOutcome {
    Night,
    Complete (PathBuf),
    Incomplete,
}

pub struct Scheduler {
    cache: Arc<TileCache>,
    assembler: Arc<Assembler>,
    filter: Arc<DaylightFilter>,
    region: RegionOfInterest,
    annotate: bool,
    step: TimeDelta,
    window: TimeDelta,
    max_concurrent_fetches: usize,
}

impl Scheduler {
    pub fn new (config: &MosaicConfig, cache: Arc<TileCache>, assembler: Arc<Assembler>, filter: Arc<DaylightFilter>,
                region: RegionOfInterest, annotate: bool)->Self
    {
        Scheduler {
            cache, assembler, filter, region, annotate,
            step: to_time_delta( config.step),
            window: to_time_delta( config.window),
            max_concurrent_fetches: config.max_concurrent_fetches.max(1),
        }
    }

    /// the timestamps of the window starting at `start`, which is truncated to the step size
    pub fn timestamps (&self, start: DateTime<Utc>)->Vec<DateTime<Utc>> {
        let start = start.duration_trunc( self.step).unwrap_or( start);
        let end = start + self.window;

        let mut list = Vec::new();
        let mut date = start;
        while date < end {
            list.push( date);
            date += self.step;
        }
        list
    }

    /// walk the window in chronological order. Failures of one timestamp never stop the run
    pub async fn run (&self, start: DateTime<Utc>)->RunSummary {
        let mut summary = RunSummary::default();

        for date in self.timestamps( start) {
            summary.walked += 1;
            match self.process_timestamp( &date, &mut summary).await {
                TimestampOutcome::Night => summary.skipped_night += 1,
                TimestampOutcome::Incomplete => summary.incomplete += 1,
                TimestampOutcome::Complete(_) => {}
            }
        }

        info!("run completed - {summary}");
        summary
    }

    pub async fn process_timestamp (&self, date: &DateTime<Utc>, summary: &mut RunSummary)->TimestampOutcome {
        let span = info_span!("timestamp", ts = %short_utc_datetime_string( date));
        self.process( date, summary).instrument( span).await
    }

    async fn process (&self, date: &DateTime<Utc>, summary: &mut RunSummary)->TimestampOutcome {
        if self.filter.is_night( date) {
            debug!("night, skipped");
            return TimestampOutcome::Night
        }

        let time_dir = self.cache.layout().time_dir( date);
        match remove_temp_files( &time_dir) {
            Ok(0) => {}
            Ok(n) => info!("removed {n} orphaned temp files"),
            Err(e) => warn!("failed to clean {time_dir:?}: {e}")
        }

        let mut all_downloaded = true;
        let fetched = self.fetch_tiles( date).await;

        for res in fetched.values() {
            match res {
                Ok( (_, TileStatus::Cached) ) => summary.tiles_cached += 1,
                Ok( (_, TileStatus::Fetched) ) => summary.tiles_fetched += 1,
                Err(_) => { summary.tiles_failed += 1; all_downloaded = false; }
            }
        }

        let mut strips: Vec<PathBuf> = Vec::with_capacity( self.region.n_columns() as usize);

        for column in self.region.columns() {
            let records: Option<Vec<TileRecord>> = self.region.column_tiles( column).into_iter()
                .map( |coord| match fetched.get( &coord) {
                    Some( Ok( (path,_) )) => Some( TileRecord { coord, path: path.clone() } ),
                    _ => None
                })
                .collect();

            let Some(records) = records else {
                debug!("column {column} incomplete, no strip");
                continue
            };

            match self.build_strip( date, column, records.clone(), false, summary).await {
                Ok(path) => strips.push( path),
                Err(e) => {
                    warn!("strip {column} not built: {e}");
                    all_downloaded = false;
                }
            }

            if self.annotate {
                if let Err(e) = self.build_strip( date, column, records, true, summary).await {
                    warn!("annotated strip {column} not built: {e}");
                    all_downloaded = false;
                }
            }
        }

        if !all_downloaded || strips.is_empty() {
            info!("incomplete, no mosaic");
            return TimestampOutcome::Incomplete
        }

        let asm = self.assembler.clone();
        let ts = *date;
        let width = self.region.mosaic_width( asm.tile_size());

        match run_blocking( move || asm.build_mosaic_with_status( &ts, &strips, width)).await {
            Ok( (path, status) ) => {
                match status {
                    ArtifactStatus::Built => summary.mosaics_built += 1,
                    ArtifactStatus::Existing => summary.mosaics_existing += 1,
                }
                TimestampOutcome::Complete(path)
            }
            Err(e) => {
                warn!("mosaic not built: {e}");
                TimestampOutcome::Incomplete
            }
        }
    }

    /// fetch all tiles of the region through a bounded pool. Returns only after every fetch has
    /// completed (successfully or not)
    async fn fetch_tiles (&self, date: &DateTime<Utc>)->HashMap<GridCoordinate,Result<(PathBuf,TileStatus),FetchError>> {
        let cache = &self.cache;
        let ts = *date;

        stream::iter( self.region.tiles())
            .map( move |coord| async move {
                let res = cache.fetch_tile_with_retry( &ts, &coord).await;
                (coord, res)
            })
            .buffer_unordered( self.max_concurrent_fetches)
            .collect::<HashMap<_,_>>()
            .await
    }

    async fn build_strip (&self, date: &DateTime<Utc>, column: u32, records: Vec<TileRecord>, annotate: bool, summary: &mut RunSummary)->Result<PathBuf,AssemblyError> {
        let asm = self.assembler.clone();
        let ts = *date;

        match run_blocking( move || asm.build_strip_with_status( &ts, column, &records, annotate)).await {
            Ok( (path, status) ) => {
                if status == ArtifactStatus::Built && !annotate { summary.strips_built += 1 }
                Ok(path)
            }
            Err(e) => {
                if matches!( e, AssemblyError::CorruptTile(_)) { summary.corrupt_tiles += 1 }
                Err(e)
            }
        }
    }
}

/// run a blocking image operation on the blocking pool, within the current span
async fn run_blocking<T,F> (f: F)->Result<T,AssemblyError>
    where F: FnOnce()->Result<T,AssemblyError> + Send + 'static, T: Send + 'static
{
    let span = Span::current();
    tokio::task::spawn_blocking( move || span.in_scope( f)).await
        .map_err( |e| AssemblyError::TaskError( e.to_string()))?
}
