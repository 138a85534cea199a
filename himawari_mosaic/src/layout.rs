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

//! on-disk cache layout:
//! ```text
//!   {root}/{depth}/{YYYY-MM-DD}/{HH-MM}/{column}-{row}.png     tiles
//!                                      strip_{column:02}.jpg
//!                                      strip_annotated_{column:02}.jpg
//!                                      target-{YYYYMMDDHHMMSS}.jpg   mosaic
//! ```

use std::path::{Path,PathBuf};
use chrono::{DateTime, NaiveDateTime, Utc};

use himawari_common::{if_let, fs::filename};
use crate::grid::{Depth,GridCoordinate};

pub const TARGET_FNAME_PREFIX: &str = "target-";
pub const TARGET_FNAME_EXT: &str = ".jpg";

const DATE_DIR_FORMAT: &str = "%Y-%m-%d";
const TIME_DIR_FORMAT: &str = "%H-%M";

#[derive(Debug,Clone)]
pub struct CacheLayout {
    root: PathBuf,
    depth: Depth,
}

impl CacheLayout {
    pub fn new (root: impl Into<PathBuf>, depth: Depth)->Self {
        CacheLayout { root: root.into(), depth }
    }

    pub fn root (&self)->&Path { &self.root }
    pub fn depth (&self)->Depth { self.depth }

    pub fn depth_dir (&self)->PathBuf {
        self.root.join( self.depth.to_string())
    }

    pub fn date_dir (&self, date: &DateTime<Utc>)->PathBuf {
        self.depth_dir().join( date.format( DATE_DIR_FORMAT).to_string())
    }

    /// the directory that holds all artifacts of one timestamp
    pub fn time_dir (&self, date: &DateTime<Utc>)->PathBuf {
        self.date_dir( date).join( date.format( TIME_DIR_FORMAT).to_string())
    }

    pub fn tile_path (&self, date: &DateTime<Utc>, coord: &GridCoordinate)->PathBuf {
        self.time_dir( date).join( format!("{}-{}.png", coord.column, coord.row))
    }

    pub fn strip_path (&self, date: &DateTime<Utc>, column: u32, annotated: bool)->PathBuf {
        let kind = if annotated { "annotated_" } else { "" };
        self.time_dir( date).join( format!("strip_{kind}{column:02}.jpg"))
    }

    pub fn mosaic_path (&self, date: &DateTime<Utc>)->PathBuf {
        self.time_dir( date).join( format!("{TARGET_FNAME_PREFIX}{}{TARGET_FNAME_EXT}", date.format("%Y%m%d%H%M%S")))
    }
}

pub fn is_mosaic_filename (fname: &str)->bool {
    fname.starts_with( TARGET_FNAME_PREFIX) && fname.ends_with( TARGET_FNAME_EXT)
}

/// reconstruct the (minute resolution) timestamp from a `.../{YYYY-MM-DD}/{HH-MM}` directory path
pub fn timestamp_of_time_dir (dir: impl AsRef<Path>)->Option<DateTime<Utc>> {
    let dir = dir.as_ref();

    if_let! {
        Some(time) = filename( &dir),
        Some(date) = dir.parent().and_then( |p| filename( &p).map( |s| s.to_string())),
        Ok(ndt) = NaiveDateTime::parse_from_str( &format!("{date} {time}"), &format!("{DATE_DIR_FORMAT} {TIME_DIR_FORMAT}")) => {
            return Some( ndt.and_utc())
        }
    }
    None
}
