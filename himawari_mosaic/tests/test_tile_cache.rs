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
#![allow(unused)]

mod common;

use std::{fs, sync::Arc};
use chrono::{DateTime, TimeZone, Utc};
use tempfile::TempDir;
use himawari_common::{datetime::secs, fs::TEMP_FILE_PREFIX};
use himawari_mosaic::{
    grid::{Depth, GridCoordinate},
    layout::CacheLayout,
    tile_cache::{TileCache, TileStatus, backoff_delay},
};
use common::{MockTransport, TILE_SIZE, test_config};

fn date ()->DateTime<Utc> { Utc.with_ymd_and_hms( 2020, 1, 1, 3, 0, 0).unwrap() }

fn setup (dir: &TempDir, max_retry: usize)->(Arc<MockTransport>, TileCache) {
    let mut config = test_config( dir.path());
    config.max_retry = max_retry;
    let transport = Arc::new( MockTransport::new( TILE_SIZE));
    let layout = CacheLayout::new( dir.path(), Depth::new(4).unwrap());
    let cache = TileCache::new( layout, &config, transport.clone());
    (transport, cache)
}

#[tokio::test]
async fn test_fetch_at_most_once () {
    let dir = TempDir::new().unwrap();
    let (transport, cache) = setup( &dir, 0);
    let coord = GridCoordinate::new( 2, 1);

    let (path, status) = cache.fetch_tile_with_status( &date(), &coord).await.unwrap();
    assert_eq!( status, TileStatus::Fetched);
    assert_eq!( path, dir.path().join("4/2020-01-01/03-00/2-1.png"));
    assert!( path.is_file());
    assert_eq!( transport.n_requests(), 1);
    assert!( transport.requests()[0].ends_with("/D531106/4d/8/2020/01/01/030000_1_2.png"));

    let (path2, status) = cache.fetch_tile_with_status( &date(), &coord).await.unwrap();
    assert_eq!( status, TileStatus::Cached);
    assert_eq!( path, path2);
    assert_eq!( transport.n_requests(), 1);

    let path3 = cache.fetch_tile( &date(), &coord).await.unwrap();
    assert_eq!( path, path3);
    assert_eq!( transport.n_requests(), 1);
}

#[tokio::test]
async fn test_transport_failure () {
    let dir = TempDir::new().unwrap();
    let (transport, cache) = setup( &dir, 0);
    let coord = GridCoordinate::new( 0, 0);
    let url = cache.tile_url( &date(), &coord);
    transport.fail( &url);

    let res = cache.fetch_tile( &date(), &coord).await;
    assert!( res.as_ref().is_err_and( |e| e.is_transport()));
    assert!( !cache.layout().tile_path( &date(), &coord).exists());
    assert!( !cache.layout().time_dir( &date()).exists()); // nothing created for failed fetches

    transport.heal( &url);
    let path = cache.fetch_tile( &date(), &coord).await.unwrap();
    assert!( path.is_file());
    assert_eq!( transport.n_requests(), 2);
}

#[tokio::test]
async fn test_orphan_is_not_cached () {
    let dir = TempDir::new().unwrap();
    let (transport, cache) = setup( &dir, 0);
    let coord = GridCoordinate::new( 1, 1);

    let time_dir = cache.layout().time_dir( &date());
    fs::create_dir_all( &time_dir).unwrap();
    fs::write( time_dir.join( format!("{TEMP_FILE_PREFIX}1-1.png")), b"\x89PNG half").unwrap();

    let (_, status) = cache.fetch_tile_with_status( &date(), &coord).await.unwrap();
    assert_eq!( status, TileStatus::Fetched);
    assert_eq!( transport.n_requests(), 1);
}

#[tokio::test]
async fn test_bounded_retry () {
    let dir = TempDir::new().unwrap();
    let (transport, cache) = setup( &dir, 2);

    transport.set_flaky( 2);
    let (_, status) = cache.fetch_tile_with_retry( &date(), &GridCoordinate::new( 0, 0)).await.unwrap();
    assert_eq!( status, TileStatus::Fetched);
    assert_eq!( transport.n_requests(), 3);

    transport.reset();
    transport.set_flaky( 3);
    let res = cache.fetch_tile_with_retry( &date(), &GridCoordinate::new( 0, 1)).await;
    assert!( res.is_err());
    assert_eq!( transport.n_requests(), 3); // initial request + 2 retries
}

#[test]
fn test_backoff_delay () {
    assert_eq!( backoff_delay( secs(2), 0), secs(2));
    assert_eq!( backoff_delay( secs(2), 3), secs(16));

    // large retry counts saturate instead of overflowing
    let d = backoff_delay( secs(2), 40);
    println!("backoff after 40 retries: {d:?}");
    assert_eq!( d, secs(2).saturating_mul( u32::MAX));
    assert!( backoff_delay( secs(2), 40) >= backoff_delay( secs(2), 31));
}
