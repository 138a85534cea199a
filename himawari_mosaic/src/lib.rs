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

//! acquisition of Himawari-8 full disk true color tiles and their assembly into per timestamp
//! mosaics, plus the manifest of all daytime mosaics in the cache

use std::{path::PathBuf, sync::Arc};
use chrono::{DateTime, Utc};
use tracing::info;

pub mod errors;
use errors::{MosaicError, Result, op_failed};

pub mod grid;
pub mod config;
pub mod daylight;
pub mod transport;
pub mod layout;
pub mod tile_cache;
pub mod assembly;
pub mod scheduler;
pub mod catalog;

use config::{MosaicConfig, RunMode, RunOptions};
use daylight::{DaylightFilter, SunTimes};
use transport::TileTransport;
use layout::CacheLayout;
use tile_cache::TileCache;
use assembly::{Annotator, Assembler};
use scheduler::{RunSummary, Scheduler};

/// the daylight filter for the run options, using the NOAA sunrise equation
pub fn create_daylight_filter (config: &MosaicConfig, opts: &RunOptions)->DaylightFilter {
    DaylightFilter::with_noaa( opts.location, config.night_margin)
}

pub fn create_layout (config: &MosaicConfig, opts: &RunOptions)->Result<CacheLayout> {
    Ok( CacheLayout::new( config.expanded_cache_root()?, opts.depth) )
}

/// walk the configured time window and acquire/assemble everything that is missing
pub async fn run_acquisition (config: &MosaicConfig, opts: &RunOptions, transport: Arc<dyn TileTransport>, filter: Arc<DaylightFilter>)->Result<RunSummary> {
    config.validate()?;
    let RunMode::Acquire { start } = opts.mode else {
        return Err( op_failed!("no start date for acquisition"))
    };

    let layout = create_layout( config, opts)?;
    let region = opts.region();
    log_sun_times( &filter, &start);
    info!("tiles target: {region} at depth {} ({} tiles per timestamp) in {:?}", opts.depth, region.n_tiles(), layout.depth_dir());

    let annotator = if opts.annotate { Annotator::from_config( config) } else { Annotator::without_font( config.label_inset) };
    let cache = Arc::new( TileCache::new( layout.clone(), config, transport));
    let assembler = Arc::new( Assembler::new( layout, config.tile_size, opts.force, annotator));
    let scheduler = Scheduler::new( config, cache, assembler, filter, region, opts.annotate);

    Ok( scheduler.run( start).await )
}

/// rebuild the manifest file from the cached mosaics
pub fn run_catalog (config: &MosaicConfig, opts: &RunOptions, filter: &DaylightFilter)->Result<Vec<PathBuf>> {
    let layout = create_layout( config, opts)?;
    catalog::build_manifest( &layout, filter, &config.manifest_path)
}

fn log_sun_times (filter: &DaylightFilter, start: &DateTime<Utc>) {
    let Some(loc) = filter.location() else {
        info!("no location given, acquiring around the clock");
        return
    };

    let (lat, lon) = (loc.latitude_degrees(), loc.longitude_degrees());
    match filter.sun_times( start.date_naive()) {
        Some(SunTimes::Daylight { sunrise, sunset }) => {
            info!("sunrise at {sunrise}, sunset at {sunset} for {lat},{lon}");
            if let Some((sunrise, sunset)) = filter.effective_sun_times( start.date_naive()) {
                info!("acquiring between {sunrise} and {sunset}");
            }
        }
        Some(SunTimes::PolarNight) => info!("polar night at {lat},{lon}, nothing to acquire"),
        Some(SunTimes::MidnightSun) => info!("midnight sun at {lat},{lon}, acquiring around the clock"),
        None => {}
    }
}
