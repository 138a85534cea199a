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

use std::{path::PathBuf, sync::Arc};
use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use himawari_common::config::load_config;
use himawari_mosaic::{
    config::{MosaicConfig, RunMode, RunOptions},
    create_daylight_filter, run_acquisition, run_catalog,
    transport::HttpTransport,
};

#[derive(Parser, Debug)]
#[command(version, about, long_about = "download Himawari-8 true color tiles for one day and assemble them into mosaics")]
pub struct Args {
    /// start date (YYYY-MM-DD, UTC)
    #[arg(short,long)]
    pub date: Option<String>,

    /// number of tiles per grid axis (4, 8, 16 or 20)
    #[arg(long, default_value_t = 20)]
    pub depth: u32,

    /// region of interest in grid coordinates: "left top right bottom"
    #[arg(short,long)]
    pub region: Option<String>,

    /// also create strips with tile borders and labels
    #[arg(short,long)]
    pub annotated: bool,

    /// re-create strips and mosaics even if they exist
    #[arg(short,long)]
    pub force: bool,

    /// "latitude longitude" of the observer, used to skip night time
    #[arg(short,long)]
    pub location: Option<String>,

    /// only (re-)build the manifest of cached mosaics
    #[arg(short,long)]
    pub targets: bool,

    /// RON config file
    #[arg(short,long)]
    pub config: Option<PathBuf>,

    /// override the configured cache root
    #[arg(long)]
    pub cache_root: Option<PathBuf>,

    /// override the configured manifest file
    #[arg(short,long)]
    pub manifest: Option<PathBuf>,
}

#[tokio::main]
async fn main()->Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter( EnvFilter::try_from_default_env().unwrap_or_else( |_| EnvFilter::new("info")))  // use RUST_LOG to set max level
        .init();

    let args = Args::parse();

    // validate everything before we touch the file system or the network
    let opts = RunOptions::from_specs( args.date.as_deref(), args.targets, args.depth, args.region.as_deref(), args.location.as_deref(),
                                       args.annotated, args.force)?;

    let mut config: MosaicConfig = match &args.config {
        Some(path) => load_config( path)?,
        None => MosaicConfig::default()
    };
    if let Some(cache_root) = args.cache_root { config.cache_root = cache_root }
    if let Some(manifest) = args.manifest { config.manifest_path = manifest }
    config.validate()?;

    let filter = Arc::new( create_daylight_filter( &config, &opts));

    match opts.mode {
        RunMode::ManifestOnly => {
            run_catalog( &config, &opts, &filter)?;
        }
        RunMode::Acquire {..} => {
            let transport = Arc::new( HttpTransport::new( config.request_timeout)?);
            let summary = run_acquisition( &config, &opts, transport, filter).await?;
            if summary.incomplete > 0 {
                info!("{} incomplete timestamps, re-run to complete", summary.incomplete);
            }
        }
    }

    Ok(())
}
