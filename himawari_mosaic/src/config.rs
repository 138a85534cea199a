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

use std::{path::PathBuf, time::Duration};
use serde::Deserialize;
use chrono::{DateTime,Utc};

use himawari_common::{
    datetime::{deserialize_duration, minutes, hours, secs, parse_utc_date},
    fs::replace_env_var_path,
};
use crate::{errors::ConfigError, grid::{Depth,RegionOfInterest}};

/// general tile server and processing configuration, normally loaded from a RON file.
/// All fields have defaults so that an empty `()` config is valid
#[derive(Debug,Clone,Deserialize)]
#[serde(default)]
pub struct MosaicConfig {
    /// tile server base URL, without the product path
    pub base_url: String,

    /// root of the tile/strip/mosaic cache. Can contain '~' and '$VAR' elements
    pub cache_root: PathBuf,

    /// pixel width/height of tiles
    pub tile_size: u32,

    #[serde(deserialize_with = "deserialize_duration")]
    pub step: Duration,

    #[serde(deserialize_with = "deserialize_duration")]
    pub window: Duration,

    /// how much we widen the night on both sides of sunrise/sunset
    #[serde(deserialize_with = "deserialize_duration")]
    pub night_margin: Duration,

    /// max number of concurrent tile requests per timestamp
    pub max_concurrent_fetches: usize,

    pub max_retry: usize,
    #[serde(deserialize_with = "deserialize_duration")]
    pub retry_delay: Duration,
    #[serde(deserialize_with = "deserialize_duration")]
    pub request_timeout: Duration,

    //--- annotated strips
    pub label_inset: u32,
    pub label_font: Option<PathBuf>,
    pub label_pt_size: f32,

    /// where we write the manifest of mosaic files
    pub manifest_path: PathBuf,
}

impl Default for MosaicConfig {
    fn default()->Self {
        MosaicConfig {
            base_url: "http://himawari8.nict.go.jp/img".to_string(),
            cache_root: PathBuf::from("~/cache-sat/himawari8"),
            tile_size: 550,
            step: minutes(10),
            window: hours(24),
            night_margin: minutes(30),
            max_concurrent_fetches: 16,
            max_retry: 2,
            retry_delay: secs(2),
            request_timeout: secs(30),
            label_inset: 50,
            label_font: None,
            label_pt_size: 24.0,
            manifest_path: PathBuf::from("targets.txt"),
        }
    }
}

impl MosaicConfig {
    /// check values that would break the run loop or the image composition
    pub fn validate (&self)->Result<(),ConfigError> {
        if self.tile_size == 0 {
            return Err( ConfigError::ParseError("tile_size has to be > 0".into()))
        }
        if self.step.is_zero() {
            return Err( ConfigError::ParseError("step has to be > 0".into()))
        }
        if self.max_concurrent_fetches == 0 {
            return Err( ConfigError::ParseError("max_concurrent_fetches has to be > 0".into()))
        }
        if self.base_url.is_empty() {
            return Err( ConfigError::ParseError("no base_url".into()))
        }
        Ok(())
    }

    /// the cache root with env vars expanded
    pub fn expanded_cache_root (&self)->Result<PathBuf,ConfigError> {
        replace_env_var_path( &self.cache_root).map_err( |e| ConfigError::ParseError( format!("cache_root: {e}")))
    }
}

/// geographic position used to compute sunrise/sunset
#[derive(Debug,Clone,Copy,PartialEq)]
pub struct Location {
    latitude: f64,  // degrees, north positive
    longitude: f64, // degrees, east positive
}

impl Location {
    pub fn new (latitude: f64, longitude: f64)->Result<Self,ConfigError> {
        if !(-90.0..=90.0).contains(&latitude) {
            Err( ConfigError::InvalidLocation( format!("latitude {latitude} out of range")))
        } else if !(-180.0..=180.0).contains(&longitude) {
            Err( ConfigError::InvalidLocation( format!("longitude {longitude} out of range")))
        } else {
            Ok( Location { latitude, longitude } )
        }
    }

    /// parse a "latitude longitude" spec (whitespace or comma separated)
    pub fn parse (spec: &str)->Result<Self,ConfigError> {
        let vs: Vec<f64> = spec.split(|c: char| c.is_whitespace() || c == ',')
            .filter( |s| !s.is_empty())
            .map( |s| s.parse::<f64>())
            .collect::<Result<Vec<f64>,_>>()
            .map_err( |_| ConfigError::InvalidLocation( format!("not a list of numbers: '{spec}'")))?;

        if let [lat, lon] = vs[..] {
            Location::new( lat, lon)
        } else {
            Err( ConfigError::InvalidLocation( format!("expected 'latitude longitude', got '{spec}'")))
        }
    }

    #[inline] pub fn latitude_degrees (&self)->f64 { self.latitude }
    #[inline] pub fn longitude_degrees (&self)->f64 { self.longitude }
}

#[derive(Debug,Clone,Copy,PartialEq)]
pub enum RunMode {
    /// walk the time window starting at the given (normalized) instant
    Acquire { start: DateTime<Utc> },
    /// skip acquisition, only rebuild the manifest from the existing cache
    ManifestOnly,
}

/// parameters of a single invocation
#[derive(Debug,Clone)]
pub struct RunOptions {
    pub mode: RunMode,
    pub depth: Depth,
    pub region: Option<RegionOfInterest>,
    pub annotate: bool,
    pub force: bool,
    pub location: Option<Location>,
}

impl RunOptions {
    /// build validated options from their textual representation. No I/O is performed
    pub fn from_specs (date: Option<&str>, manifest_only: bool, depth: u32, region: Option<&str>, location: Option<&str>,
                       annotate: bool, force: bool)->Result<Self,ConfigError>
    {
        let depth = Depth::new( depth)?;
        let region = region.map( |spec| RegionOfInterest::parse( spec, depth)).transpose()?;
        let location = location.map( Location::parse).transpose()?;

        let mode = if manifest_only {
            RunMode::ManifestOnly
        } else if let Some(date) = date {
            let start = parse_utc_date( date).ok_or( ConfigError::ParseError( format!("invalid date '{date}', expected YYYY-MM-DD")))?;
            RunMode::Acquire { start }
        } else {
            return Err( ConfigError::ParseError( "either a start date or manifest-only mode is required".into()))
        };

        Ok( RunOptions { mode, depth, region, annotate, force, location } )
    }

    /// the effective region (full grid if none was specified)
    pub fn region (&self)->RegionOfInterest {
        self.region.unwrap_or_else( || RegionOfInterest::full( self.depth))
    }
}
