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

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta, Utc};
use serde::{Deserialize,Deserializer};
use std::time::Duration;
use parse_duration::parse;

// simple Duration ctors that do not require nightly features
#[inline] pub fn millis (n: u64)->Duration { Duration::from_millis(n) }
#[inline] pub fn secs (n: u64)->Duration { Duration::from_secs(n) }
#[inline] pub fn minutes (n: u64)->Duration { Duration::from_secs(n * 60) }
#[inline] pub fn hours (n: u64)->Duration { Duration::from_secs(n * 3600) }

/// convert std Duration into chrono TimeDelta, saturating at TimeDelta::MAX
pub fn to_time_delta (dur: Duration)->TimeDelta {
    TimeDelta::from_std(dur).unwrap_or(TimeDelta::MAX)
}

/// get a DateTime<Utc> for 00:00:00 of a NaiveDate that is supposed to be in Utc
pub fn naive_utc_date_to_utc_datetime (nd: NaiveDate) -> DateTime<Utc> {
    NaiveDateTime::new( nd, NaiveTime::MIN).and_utc()
}

/// parse "YYYY-MM-DD" into the DateTime<Utc> of its midnight
pub fn parse_utc_date (s: &str)->Option<DateTime<Utc>> {
    NaiveDate::parse_from_str( s.trim(), "%Y-%m-%d").ok().map( naive_utc_date_to_utc_datetime)
}

pub fn short_utc_datetime_string (dt: &DateTime<Utc>) -> String {
    format!("{}", dt.format("%Y-%m-%dT%H:%M"))
}

pub fn is_between_inclusive (dt: &DateTime<Utc>, dt_start: &DateTime<Utc>, dt_end: &DateTime<Utc>) -> bool {
    dt >= dt_start && dt <= dt_end
}

//--- support for serde

/// deserialize durations from human readable strings such as "30min" or "2s"
pub fn deserialize_duration <'a,D>(deserializer: D) -> Result<Duration,D::Error>
    where D: Deserializer<'a>
{
    String::deserialize(deserializer).and_then( |string| {
        parse(string.as_str())
            .map_err( |e| serde::de::Error::custom(format!("{:?}",e)))
    })
}
