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

//! builds the ordered manifest of mosaic files from what is in the cache. This does not
//! perform any network IO and is independent of acquisition runs

use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use himawari_common::fs::{matching_files_in_dir, path_to_lossy_string, sub_dirs, write_file_atomic};
use crate::{
    daylight::DaylightFilter,
    errors::Result,
    layout::{CacheLayout, is_mosaic_filename, timestamp_of_time_dir},
};

/// all daytime mosaics of the cached depth, sorted by path (which is chronological)
pub fn collect_mosaics (layout: &CacheLayout, filter: &DaylightFilter)->Result<Vec<PathBuf>> {
    let depth_dir = layout.depth_dir();
    if !depth_dir.is_dir() {
        warn!("no cache dir {depth_dir:?}");
        return Ok( Vec::new())
    }

    let mut list = Vec::new();
    for date_dir in sub_dirs( &depth_dir)? {
        for time_dir in sub_dirs( &date_dir)? {
            let Some(date) = timestamp_of_time_dir( &time_dir) else {
                debug!("ignoring {time_dir:?}");
                continue
            };
            if filter.is_night( &date) {
                debug!("night, ignoring {time_dir:?}");
                continue
            }
            list.extend( matching_files_in_dir( &time_dir, is_mosaic_filename)?);
        }
    }

    list.sort();
    Ok(list)
}

/// one `file '{path}'` line per mosaic
pub fn format_manifest (mosaics: &[PathBuf])->String {
    let mut s = String::new();
    for p in mosaics {
        s.push_str( &format!("file '{}'\n", path_to_lossy_string( p)));
    }
    s
}

/// (over)write the manifest file
pub fn write_manifest (path: impl AsRef<Path>, mosaics: &[PathBuf])->Result<()> {
    Ok( write_file_atomic( path, format_manifest( mosaics).as_bytes())? )
}

pub fn build_manifest (layout: &CacheLayout, filter: &DaylightFilter, manifest_path: impl AsRef<Path>)->Result<Vec<PathBuf>> {
    let manifest_path = manifest_path.as_ref();
    let mosaics = collect_mosaics( layout, filter)?;
    write_manifest( manifest_path, &mosaics)?;

    info!("wrote {} mosaic entries to {manifest_path:?}", mosaics.len());
    Ok( mosaics )
}
