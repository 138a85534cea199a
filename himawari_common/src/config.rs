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

use std::path::Path;
use serde::Deserialize;
use ron;

use crate::define_error;

define_error!{ pub ConfigFileError =
    IOError(#[from] std::io::Error) : "IO error reading config: {0}",
    RonError(#[from] ron::error::SpannedError) : "config parse error: {0}"
}

/// load a RON config from the given file
pub fn load_config<C> (path: impl AsRef<Path>) -> Result<C,ConfigFileError> where C: for <'a> Deserialize<'a> {
    let data = std::fs::read_to_string( path.as_ref())?;
    config_from_str( &data)
}

pub fn config_from_str<C> (data: &str) -> Result<C,ConfigFileError> where C: for <'a> Deserialize<'a> {
    Ok( ron::from_str( data)? )
}
