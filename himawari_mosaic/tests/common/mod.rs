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

//! shared test fixtures: a counting in-memory tile transport and fixed sun times

use std::{collections::HashSet, io::Cursor, path::Path, sync::{Mutex, atomic::{AtomicUsize, Ordering}}};
use async_trait::async_trait;
use bytes::Bytes;
use chrono::{NaiveDate, NaiveTime};
use image::{ImageFormat, Rgb, RgbImage};

use himawari_common::datetime::millis;
use himawari_mosaic::{
    config::{Location, MosaicConfig},
    daylight::{SunTimes, SunTimesSource},
    errors::TransportError,
    transport::TileTransport,
};

pub const TILE_SIZE: u32 = 8;

/// small tiles, no retries, no delays
pub fn test_config (cache_root: &Path)->MosaicConfig {
    MosaicConfig {
        cache_root: cache_root.to_path_buf(),
        tile_size: TILE_SIZE,
        max_retry: 0,
        retry_delay: millis(1),
        manifest_path: cache_root.join("targets.txt"),
        ..MosaicConfig::default()
    }
}

pub fn png_bytes (size: u32, color: [u8;3])->Vec<u8> {
    let img = RgbImage::from_pixel( size, size, Rgb(color));
    let mut buf = Cursor::new( Vec::new());
    img.write_to( &mut buf, ImageFormat::Png).unwrap();
    buf.into_inner()
}

/// serves generated PNG tiles for every URL that isn't marked as failing
pub struct MockTransport {
    tile_size: u32,
    requests: Mutex<Vec<String>>,
    failing: Mutex<HashSet<String>>,
    flaky: AtomicUsize, // number of requests that fail before we start to succeed
}

impl MockTransport {
    pub fn new (tile_size: u32)->Self {
        MockTransport { tile_size, requests: Mutex::new( Vec::new()), failing: Mutex::new( HashSet::new()), flaky: AtomicUsize::new(0) }
    }

    pub fn fail (&self, url: &str) { self.failing.lock().unwrap().insert( url.to_string()); }
    pub fn heal (&self, url: &str) { self.failing.lock().unwrap().remove( url); }
    pub fn set_flaky (&self, n: usize) { self.flaky.store( n, Ordering::SeqCst); }

    pub fn n_requests (&self)->usize { self.requests.lock().unwrap().len() }
    pub fn requests (&self)->Vec<String> { self.requests.lock().unwrap().clone() }
    pub fn reset (&self) { self.requests.lock().unwrap().clear(); }
}

#[async_trait]
impl TileTransport for MockTransport {
    async fn fetch (&self, url: &str)->Result<Bytes,TransportError> {
        self.requests.lock().unwrap().push( url.to_string());

        if self.failing.lock().unwrap().contains( url) {
            return Err( TransportError::OpFailed( format!("404 {url}")))
        }
        if self.flaky.fetch_update( Ordering::SeqCst, Ordering::SeqCst, |n| if n > 0 { Some(n-1) } else { None }).is_ok() {
            return Err( TransportError::OpFailed( format!("connection reset {url}")))
        }

        Ok( Bytes::from( png_bytes( self.tile_size, [40, 80, 160])))
    }
}

/// same sunrise/sunset times of day (UTC) for every date and location
pub struct FixedSunTimes {
    pub sunrise: NaiveTime,
    pub sunset: NaiveTime,
}

impl FixedSunTimes {
    pub fn new (sunrise: (u32,u32), sunset: (u32,u32))->Self {
        FixedSunTimes {
            sunrise: NaiveTime::from_hms_opt( sunrise.0, sunrise.1, 0).unwrap(),
            sunset: NaiveTime::from_hms_opt( sunset.0, sunset.1, 0).unwrap(),
        }
    }
}

impl SunTimesSource for FixedSunTimes {
    fn sun_times (&self, date: NaiveDate, _location: &Location)->SunTimes {
        SunTimes::Daylight { sunrise: date.and_time( self.sunrise).and_utc(), sunset: date.and_time( self.sunset).and_utc() }
    }
}

pub struct ConstSunTimes( pub SunTimes);

impl SunTimesSource for ConstSunTimes {
    fn sun_times (&self, _date: NaiveDate, _location: &Location)->SunTimes { self.0 }
}

pub fn some_location ()->Location {
    Location::new( 35.68, 139.69).unwrap()
}
