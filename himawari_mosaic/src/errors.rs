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

use std::path::PathBuf;
use thiserror::Error;
use himawari_common::{net::NetError, config::ConfigFileError};

use crate::grid::GridCoordinate;

pub type Result<T> = std::result::Result<T, MosaicError>;

/// failure to obtain the bytes of a single URL. This is never fatal for a run
#[derive(Error,Debug)]
pub enum TransportError {
    #[error("network error {0}")]
    NetError( #[from] NetError),

    #[error("transport failed {0}")]
    OpFailed(String),
}

#[derive(Error,Debug)]
pub enum FetchError {
    #[error("transport error {0}")]
    TransportError( #[from] TransportError),

    #[error("IO error committing tile {0}")]
    IOError( #[from] std::io::Error),
}

impl FetchError {
    pub fn is_transport (&self)->bool { matches!( self, FetchError::TransportError(_)) }
}

/// strip/mosaic composition failures. These only mean "not ready yet" for the respective artifact
#[derive(Error,Debug)]
pub enum AssemblyError {
    #[error("corrupt tile {0} (removed)")]
    CorruptTile( GridCoordinate),

    #[error("corrupt artifact {0:?} (removed)")]
    CorruptArtifact( PathBuf),

    #[error("missing constituent {0:?}")]
    MissingConstituent( PathBuf),

    #[error("nothing to assemble for {0}")]
    NothingToAssemble( String),

    #[error("image error {0}")]
    ImageError( #[from] image::ImageError),

    #[error("IO error {0}")]
    IOError( #[from] std::io::Error),

    #[error("invalid font {0}")]
    FontError( #[from] ab_glyph::InvalidFont),

    #[error("invalid dimensions {0}")]
    InvalidDimensions( String),

    #[error("assembly task failed {0}")]
    TaskError( String),
}

/// invalid run parameters. These are reported before any I/O takes place
#[derive(Error,Debug)]
pub enum ConfigError {
    #[error("invalid depth {0} (valid values are 4, 8, 16, 20)")]
    InvalidDepth( u32),

    #[error("invalid region {0}")]
    InvalidRegion( String),

    #[error("invalid location {0}")]
    InvalidLocation( String),

    #[error("invalid argument {0}")]
    ParseError( String),

    #[error("config file error {0}")]
    ConfigFileError( #[from] ConfigFileError),
}

#[derive(Error,Debug)]
pub enum MosaicError {
    #[error("configuration error {0}")]
    ConfigError( #[from] ConfigError),

    #[error("fetch error {0}")]
    FetchError( #[from] FetchError),

    #[error("assembly error {0}")]
    AssemblyError( #[from] AssemblyError),

    #[error("transport error {0}")]
    TransportError( #[from] TransportError),

    #[error("IO error {0}")]
    IOError( #[from] std::io::Error),

    #[error("operation failed {0}")]
    OpFailedError( String),
}

macro_rules! op_failed {
    ($fmt:literal $(, $arg:expr )* ) => {
        MosaicError::OpFailedError( format!( $fmt $(, $arg)* ))
    };
}
pub (crate) use op_failed;
