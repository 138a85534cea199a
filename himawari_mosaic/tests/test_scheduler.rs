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

use std::{collections::HashSet, fs, sync::Arc};
use chrono::{TimeZone, Utc};
use tempfile::TempDir;
use himawari_common::{datetime::minutes, fs::TEMP_FILE_PREFIX};
use himawari_mosaic::{
    assembly::{Annotator, Assembler},
    config::{MosaicConfig, RunOptions},
    daylight::DaylightFilter,
    grid::{Depth, GridCoordinate},
    layout::CacheLayout,
    run_acquisition,
    scheduler::{RunSummary, Scheduler, TimestampOutcome},
    tile_cache::{TileCache, tile_url},
};
use common::{FixedSunTimes, MockTransport, TILE_SIZE, some_location, test_config};

// 3 timestamps (00:00, 00:10, 00:20) of a 2x2 region
fn short_window (dir: &TempDir)->MosaicConfig {
    MosaicConfig { window: minutes(30), ..test_config( dir.path()) }
}

fn opts (annotate: bool)->RunOptions {
    RunOptions::from_specs( Some("2020-01-01"), false, 4, Some("1 1 2 2"), None, annotate, false).unwrap()
}

fn no_filter ()->Arc<DaylightFilter> { Arc::new( DaylightFilter::disabled()) }

#[tokio::test]
async fn test_full_run_and_resume () {
    let dir = TempDir::new().unwrap();
    let config = short_window( &dir);
    let transport = Arc::new( MockTransport::new( TILE_SIZE));

    let summary = run_acquisition( &config, &opts(false), transport.clone(), no_filter()).await.unwrap();
    println!("{summary}");
    assert_eq!( summary.walked, 3);
    assert_eq!( summary.tiles_fetched, 12);
    assert_eq!( summary.strips_built, 6);
    assert_eq!( summary.mosaics_built, 3);
    assert_eq!( summary.incomplete, 0);
    assert_eq!( transport.n_requests(), 12);

    let layout = CacheLayout::new( dir.path(), Depth::new(4).unwrap());
    for m in [0,10,20] {
        let date = Utc.with_ymd_and_hms( 2020, 1, 1, 0, m, 0).unwrap();
        let mosaic = layout.mosaic_path( &date);
        assert!( mosaic.is_file());
        assert_eq!( image::image_dimensions( &mosaic).unwrap(), (2 * TILE_SIZE, 2 * TILE_SIZE));
        assert!( !layout.strip_path( &date, 1, true).exists()); // no annotation requested
    }

    // second run is pure cache hits
    transport.reset();
    let summary = run_acquisition( &config, &opts(false), transport.clone(), no_filter()).await.unwrap();
    println!("{summary}");
    assert_eq!( transport.n_requests(), 0);
    assert_eq!( summary.tiles_cached, 12);
    assert_eq!( summary.strips_built, 0);
    assert_eq!( summary.mosaics_existing, 3);
}

#[tokio::test]
async fn test_fetches_only_region_tiles () {
    let dir = TempDir::new().unwrap();
    let config = MosaicConfig { window: minutes(10), ..test_config( dir.path()) };
    let transport = Arc::new( MockTransport::new( TILE_SIZE));
    let opts = RunOptions::from_specs( Some("2020-01-01"), false, 8, Some("2 3 4 5"), None, false, false).unwrap();
    let date = Utc.with_ymd_and_hms( 2020, 1, 1, 0, 0, 0).unwrap();

    let summary = run_acquisition( &config, &opts, transport.clone(), no_filter()).await.unwrap();
    assert_eq!( summary.tiles_fetched, 9);
    assert_eq!( summary.mosaics_built, 1);

    let requests = transport.requests();
    let requested: HashSet<String> = requests.iter().cloned().collect();
    assert_eq!( requests.len(), requested.len()); // no tile requested twice

    let depth = Depth::new(8).unwrap();
    let mut expected = HashSet::new();
    for column in 2..=4 {
        for row in 3..=5 {
            expected.insert( tile_url( &config.base_url, depth, TILE_SIZE, &date, &GridCoordinate::new( column, row)));
        }
    }
    assert_eq!( requested, expected);

    let layout = CacheLayout::new( dir.path(), depth);
    assert_eq!( image::image_dimensions( layout.mosaic_path( &date)).unwrap(), (3 * TILE_SIZE, 3 * TILE_SIZE));
}

#[tokio::test]
async fn test_night_is_skipped () {
    let dir = TempDir::new().unwrap();
    let config = short_window( &dir);
    let transport = Arc::new( MockTransport::new( TILE_SIZE));
    let filter = Arc::new( DaylightFilter::new( Some(some_location()), minutes(30), Arc::new( FixedSunTimes::new( (6,0), (18,0)))));

    let summary = run_acquisition( &config, &opts(false), transport.clone(), filter).await.unwrap();
    assert_eq!( summary.walked, 3);
    assert_eq!( summary.skipped_night, 3);
    assert_eq!( transport.n_requests(), 0);
    assert!( !dir.path().join("4").exists()); // nothing created at night
}

#[tokio::test]
async fn test_failed_tile_blocks_mosaic () {
    let dir = TempDir::new().unwrap();
    let config = MosaicConfig { window: minutes(10), ..test_config( dir.path()) };
    let transport = Arc::new( MockTransport::new( TILE_SIZE));
    let date = Utc.with_ymd_and_hms( 2020, 1, 1, 0, 0, 0).unwrap();
    let layout = CacheLayout::new( dir.path(), Depth::new(4).unwrap());

    let bad_url = tile_url( &config.base_url, Depth::new(4).unwrap(), TILE_SIZE, &date, &GridCoordinate::new( 2, 1));
    transport.fail( &bad_url);

    let summary = run_acquisition( &config, &opts(false), transport.clone(), no_filter()).await.unwrap();
    println!("{summary}");
    assert_eq!( transport.n_requests(), 4); // no early abort
    assert_eq!( summary.tiles_failed, 1);
    assert_eq!( summary.incomplete, 1);
    assert!( layout.strip_path( &date, 1, false).is_file());
    assert!( !layout.strip_path( &date, 2, false).exists());
    assert!( !layout.mosaic_path( &date).exists());

    // next run only fetches the missing tile
    transport.heal( &bad_url);
    transport.reset();
    let summary = run_acquisition( &config, &opts(false), transport.clone(), no_filter()).await.unwrap();
    assert_eq!( transport.requests(), vec![bad_url]);
    assert_eq!( summary.mosaics_built, 1);
    assert!( layout.mosaic_path( &date).is_file());
}

#[tokio::test]
async fn test_corrupt_tile_blocks_mosaic () {
    let dir = TempDir::new().unwrap();
    let config = MosaicConfig { window: minutes(10), ..test_config( dir.path()) };
    let transport = Arc::new( MockTransport::new( TILE_SIZE));
    let date = Utc.with_ymd_and_hms( 2020, 1, 1, 0, 0, 0).unwrap();
    let layout = CacheLayout::new( dir.path(), Depth::new(4).unwrap());

    // a corrupt tile that looks cached
    let bad = layout.tile_path( &date, &GridCoordinate::new( 1, 2));
    fs::create_dir_all( bad.parent().unwrap()).unwrap();
    fs::write( &bad, b"truncated").unwrap();

    let summary = run_acquisition( &config, &opts(false), transport.clone(), no_filter()).await.unwrap();
    println!("{summary}");
    assert_eq!( transport.n_requests(), 3);
    assert_eq!( summary.corrupt_tiles, 1);
    assert_eq!( summary.incomplete, 1);
    assert!( !bad.exists());
    assert!( !layout.mosaic_path( &date).exists());

    transport.reset();
    let summary = run_acquisition( &config, &opts(false), transport.clone(), no_filter()).await.unwrap();
    assert_eq!( transport.n_requests(), 1);
    assert_eq!( summary.mosaics_built, 1);
}

#[tokio::test]
async fn test_orphans_and_annotation () {
    let dir = TempDir::new().unwrap();
    let config = MosaicConfig { window: minutes(10), ..test_config( dir.path()) };
    let transport = Arc::new( MockTransport::new( TILE_SIZE));
    let date = Utc.with_ymd_and_hms( 2020, 1, 1, 0, 0, 0).unwrap();
    let layout = CacheLayout::new( dir.path(), Depth::new(4).unwrap());

    let time_dir = layout.time_dir( &date);
    fs::create_dir_all( &time_dir).unwrap();
    let orphan = time_dir.join( format!("{TEMP_FILE_PREFIX}1-1.png"));
    fs::write( &orphan, b"partial").unwrap();

    let summary = run_acquisition( &config, &opts(true), transport.clone(), no_filter()).await.unwrap();
    assert!( !orphan.exists());
    assert_eq!( summary.tiles_fetched, 4);
    assert_eq!( summary.mosaics_built, 1);
    for column in [1,2] {
        assert!( layout.strip_path( &date, column, false).is_file());
        assert!( layout.strip_path( &date, column, true).is_file());
    }
}

#[test]
fn test_timestamps () {
    let dir = TempDir::new().unwrap();
    let config = test_config( dir.path());
    let layout = CacheLayout::new( dir.path(), Depth::new(4).unwrap());
    let cache = Arc::new( TileCache::new( layout.clone(), &config, Arc::new( MockTransport::new( TILE_SIZE))));
    let assembler = Arc::new( Assembler::new( layout, TILE_SIZE, false, Annotator::without_font( 2)));
    let scheduler = Scheduler::new( &config, cache, assembler, no_filter(), opts(false).region(), false);

    let start = Utc.with_ymd_and_hms( 2020, 1, 1, 0, 0, 0).unwrap();
    let ts = scheduler.timestamps( start);
    assert_eq!( ts.len(), 144);
    assert_eq!( ts[0], start);
    assert_eq!( ts[143], Utc.with_ymd_and_hms( 2020, 1, 1, 23, 50, 0).unwrap());
    assert!( ts.windows(2).all( |w| w[0] < w[1]));

    // unaligned start is truncated to the step
    let ts = scheduler.timestamps( Utc.with_ymd_and_hms( 2020, 1, 1, 0, 7, 30).unwrap());
    assert_eq!( ts[0], start);
}
