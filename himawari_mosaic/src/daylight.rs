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

//! decide if a timestamp falls into the (widened) local night of a location, in which case there is
//! no point in acquiring tiles

use std::{sync::Arc, time::Duration};
use chrono::{DateTime, NaiveDate, TimeDelta, Timelike, Utc};
use dashmap::DashMap;

use himawari_common::datetime::to_time_delta;
use crate::config::Location;

#[derive(Debug,Clone,Copy,PartialEq)]
pub enum SunTimes {
    /// times of day of sunrise and sunset, both on the requested UTC date
    Daylight { sunrise: DateTime<Utc>, sunset: DateTime<Utc> },
    /// sun does not rise on this date
    PolarNight,
    /// sun does not set on this date
    MidnightSun,
}

/// the capability to compute sunrise and sunset for a calendar date and location
pub trait SunTimesSource: Send + Sync {
    fn sun_times (&self, date: NaiveDate, location: &Location)->SunTimes;
}

const J2000: f64 = 2451545.0;          // Julian date of 2000-01-01T12:00Z
const UNIX_EPOCH_JD: f64 = 2440587.5;  // Julian date of 1970-01-01T00:00Z
const SUN_ALTITUDE: f64 = -0.833;      // deg, accounts for refraction and solar disk radius
const OBLIQUITY: f64 = 23.4397;        // deg, axial tilt of the earth

/// sunrise equation as used by NOAA (accurate to about a minute for non-polar latitudes)
pub struct NoaaSunTimes;

impl NoaaSunTimes {
    fn to_utc (jd: f64)->Option<DateTime<Utc>> {
        let millis = ((jd - UNIX_EPOCH_JD) * 86_400_000.0).round() as i64;
        DateTime::<Utc>::from_timestamp_millis( millis)
    }
}

impl SunTimesSource for NoaaSunTimes {
    fn sun_times (&self, date: NaiveDate, location: &Location)->SunTimes {
        let jd_midnight = UNIX_EPOCH_JD + date.signed_duration_since( DateTime::<Utc>::UNIX_EPOCH.date_naive()).num_days() as f64;
        let n = (jd_midnight + 0.5 - J2000).round(); // day number since J2000

        let j_star = n - location.longitude_degrees() / 360.0; // mean solar noon
        let m = (357.5291 + 0.98560028 * j_star).rem_euclid(360.0); // solar mean anomaly
        let m_rad = m.to_radians();
        let c = 1.9148 * m_rad.sin() + 0.0200 * (2.0 * m_rad).sin() + 0.0003 * (3.0 * m_rad).sin(); // equation of center
        let lambda = (m + c + 180.0 + 102.9372).rem_euclid(360.0).to_radians(); // ecliptic longitude
        let j_transit = J2000 + j_star + 0.0053 * m_rad.sin() - 0.0069 * (2.0 * lambda).sin();

        let sin_decl = lambda.sin() * OBLIQUITY.to_radians().sin();
        let cos_decl = (1.0 - sin_decl * sin_decl).sqrt();
        let phi = location.latitude_degrees().to_radians();

        let cos_omega = (SUN_ALTITUDE.to_radians().sin() - phi.sin() * sin_decl) / (phi.cos() * cos_decl);
        if cos_omega > 1.0 {
            SunTimes::PolarNight
        } else if cos_omega < -1.0 || cos_omega.is_nan() { // NaN at the poles
            if phi.signum() == sin_decl.signum() { SunTimes::MidnightSun } else { SunTimes::PolarNight }
        } else {
            let omega = cos_omega.acos().to_degrees() / 360.0;
            // project onto the requested UTC date, which means sunrise can come after sunset if the
            // local day straddles midnight UTC
            match (Self::to_utc( j_transit - omega), Self::to_utc( j_transit + omega)) {
                (Some(sunrise), Some(sunset)) => SunTimes::Daylight {
                    sunrise: date.and_time( sunrise.time()).and_utc(),
                    sunset: date.and_time( sunset.time()).and_utc()
                },
                _ => SunTimes::PolarNight
            }
        }
    }
}

/// night test for an optional location, with sun times cached per calendar date.
///
/// The night is widened by `margin` on both ends: effective sunset is `sunset - margin`, effective
/// sunrise is `sunrise + margin`. All comparisons are on UTC times of day (modulo 24h). If the raw
/// sunrise comes after the raw sunset the night is `[sunset', sunrise']`, otherwise the day is
/// `[sunrise', sunset']` and the night is its complement (the whole date if the day is shorter than
/// twice the margin). Night bounds are inclusive in the first case, day bounds in the second
pub struct DaylightFilter {
    location: Option<Location>,
    margin: TimeDelta,
    source: Arc<dyn SunTimesSource>,
    cache: DashMap<NaiveDate,SunTimes>,
}

impl DaylightFilter {
    pub fn new (location: Option<Location>, margin: Duration, source: Arc<dyn SunTimesSource>)->Self {
        DaylightFilter { location, margin: to_time_delta(margin), source, cache: DashMap::new() }
    }

    pub fn with_noaa (location: Option<Location>, margin: Duration)->Self {
        Self::new( location, margin, Arc::new(NoaaSunTimes))
    }

    /// a filter that never skips
    pub fn disabled ()->Self {
        Self::with_noaa( None, Duration::ZERO)
    }

    pub fn location (&self)->Option<&Location> { self.location.as_ref() }

    /// raw (not widened) sun times for the given date, None if there is no location
    pub fn sun_times (&self, date: NaiveDate)->Option<SunTimes> {
        let location = self.location.as_ref()?;
        let st = *self.cache.entry(date).or_insert_with( || self.source.sun_times( date, location));
        Some(st)
    }

    /// the widened (sunrise', sunset') pair for the given date
    pub fn effective_sun_times (&self, date: NaiveDate)->Option<(DateTime<Utc>,DateTime<Utc>)> {
        match self.sun_times( date)? {
            SunTimes::Daylight { sunrise, sunset } => Some( (sunrise + self.margin, sunset - self.margin) ),
            _ => None
        }
    }

    pub fn is_night (&self, date: &DateTime<Utc>)->bool {
        match self.sun_times( date.date_naive()) {
            None => false, // no location, never skip
            Some(SunTimes::PolarNight) => true,
            Some(SunTimes::MidnightSun) => false,
            Some(SunTimes::Daylight { sunrise, sunset }) => {
                let t = seconds_of_day( date);
                let rise = seconds_of_day( &sunrise);
                let set = seconds_of_day( &sunset);
                let margin = self.margin.num_seconds();

                if rise > set { // local day straddles midnight UTC, night is [set - margin, rise + margin]
                    let night_len = rise - set + 2 * margin;
                    night_len >= DAY_SECS || (t - (set - margin)).rem_euclid( DAY_SECS) <= night_len
                } else { // day is [rise + margin, set - margin], empty if shorter than both margins
                    let day_len = set - rise - 2 * margin;
                    day_len < 0 || (t - (rise + margin)).rem_euclid( DAY_SECS) > day_len
                }
            }
        }
    }
}

const DAY_SECS: i64 = 86_400;

fn seconds_of_day (date: &DateTime<Utc>)->i64 {
    date.num_seconds_from_midnight() as i64
}
