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

use std::time::Duration;
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Client;

use himawari_common::net::{create_client, get_bytes};
use crate::errors::TransportError;

/// the capability to retrieve the bytes for a tile URL
#[async_trait]
pub trait TileTransport: Send + Sync {
    async fn fetch (&self, url: &str)->Result<Bytes,TransportError>;
}

/// production transport over HTTP(S)
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new (request_timeout: Duration)->Result<Self,TransportError> {
        let client = create_client( request_timeout)?;
        Ok( HttpTransport { client } )
    }
}

#[async_trait]
impl TileTransport for HttpTransport {
    async fn fetch (&self, url: &str)->Result<Bytes,TransportError> {
        Ok( get_bytes( &self.client, url).await? )
    }
}
