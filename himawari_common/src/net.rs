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

//! common utility functions for network operations

use std::time::Duration;
use bytes::Bytes;
use reqwest::{Client, StatusCode};

use crate::define_error;

define_error!{ pub NetError =
    IOError(#[from] std::io::Error) : "IO error: {0}",
    HttpError(#[from] reqwest::Error) : "http error: {0}",
    NotFoundError(String) : "not found {0}",
    StatusError(u16,String) : "response status {0} for {1}",
    EmptyResponse(String) : "empty response for {0}",
    OpFailed(String) : "operation failed: {0}"
}

pub type Result<T> = std::result::Result<T, NetError>;

/// create a reqwest client with the given per-request timeout
pub fn create_client (timeout: Duration)->Result<Client> {
    Ok( Client::builder().timeout(timeout).build()? )
}

/// fetch the complete body of the given URL via HTTP GET.
/// Anything else than a non-empty 2xx response is an error
pub async fn get_bytes (client: &Client, url: &str)->Result<Bytes> {
    let response = client.get(url).send().await?;

    match response.status() {
        status if status.is_success() => {
            let bytes = response.bytes().await?;
            if bytes.is_empty() {
                Err( NetError::EmptyResponse(url.to_string()))
            } else {
                Ok(bytes)
            }
        }
        StatusCode::NOT_FOUND => {
            Err( NetError::NotFoundError(url.to_string()))
        }
        other => {
            Err( NetError::StatusError( other.as_u16(), url.to_string()))
        }
    }
}
