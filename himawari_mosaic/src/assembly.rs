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

//! strip and mosaic composition. Both are blocking (CPU bound) operations that should be called
//! from `spawn_blocking` when used within async code

use std::{fs, io::{Cursor, ErrorKind}, path::{Path, PathBuf}};
use chrono::{DateTime, Utc};
use image::{DynamicImage, ImageError, ImageFormat, Rgb, RgbImage, imageops};
use imageproc::{drawing::{draw_hollow_rect_mut, draw_text_mut}, rect::Rect};
use ab_glyph::{Font, FontVec, PxScale};
use tracing::{debug, info, warn};

use himawari_common::fs::write_file_atomic;
use crate::{
    config::MosaicConfig,
    errors::AssemblyError,
    grid::GridCoordinate,
    layout::CacheLayout,
    tile_cache::TileRecord,
};

type Result<T> = std::result::Result<T,AssemblyError>;

#[derive(Debug,Clone,Copy,PartialEq,Eq)]
pub enum ArtifactStatus {
    /// artifact was already present and not re-created
    Existing,
    Built,
}

/* #region annotation ****************************************************************************************************/

const LABEL_COLOR: Rgb<u8> = Rgb([255, 255, 0]);

/// draws tile borders and "{column},{row}" labels onto annotated strips
pub struct Annotator {
    font: Option<FontVec>,
    scale: PxScale,
    inset: u32,
}

impl Annotator {
    pub fn new (font: FontVec, pt_size: f32, inset: u32)->Result<Self> {
        let scale = font.pt_to_px_scale( pt_size).ok_or( AssemblyError::InvalidDimensions( format!("font pt size {pt_size}")))?;
        Ok( Annotator { font: Some(font), scale, inset } )
    }

    /// an annotator that only draws tile borders
    pub fn without_font (inset: u32)->Self {
        Annotator { font: None, scale: PxScale::from(24.0), inset }
    }

    pub fn load (font_path: impl AsRef<Path>, pt_size: f32, inset: u32)->Result<Self> {
        let data = fs::read( font_path.as_ref())?;
        let font = FontVec::try_from_vec( data)?;
        Self::new( font, pt_size, inset)
    }

    /// never fails - annotation is a debugging aid and should not keep us from building strips
    pub fn from_config (config: &MosaicConfig)->Self {
        if let Some(path) = &config.label_font {
            match Self::load( path, config.label_pt_size, config.label_inset) {
                Ok(annotator) => annotator,
                Err(e) => {
                    warn!("cannot load label font {path:?}: {e}, annotated strips only show tile borders");
                    Self::without_font( config.label_inset)
                }
            }
        } else {
            warn!("no label font configured, annotated strips only show tile borders");
            Self::without_font( config.label_inset)
        }
    }

    /// annotate tile `i` of a strip
    pub fn annotate_tile (&self, canvas: &mut RgbImage, i: u32, tile_size: u32, coord: &GridCoordinate) {
        let x = i * tile_size;
        let rect = Rect::at( x as i32, 0).of_size( tile_size, tile_size);
        draw_hollow_rect_mut( canvas, rect, LABEL_COLOR);

        if let Some(font) = &self.font {
            let text = format!("{},{}", coord.column, coord.row);
            draw_text_mut( canvas, LABEL_COLOR, (x + self.inset) as i32, self.inset as i32, self.scale, font, &text);
        }
    }
}

/* #endregion annotation */

/// composes tiles into strips and strips into mosaics, writing results atomically into the cache
pub struct Assembler {
    layout: CacheLayout,
    tile_size: u32,
    force: bool,
    annotator: Annotator,
}

impl Assembler {
    pub fn new (layout: CacheLayout, tile_size: u32, force: bool, annotator: Annotator)->Self {
        Assembler { layout, tile_size, force, annotator }
    }

    pub fn tile_size (&self)->u32 { self.tile_size }

    pub fn build_strip (&self, date: &DateTime<Utc>, column: u32, tiles: &[TileRecord], annotate: bool)->Result<PathBuf> {
        self.build_strip_with_status( date, column, tiles, annotate).map( |(path,_)| path)
    }

    /// horizontally concatenate the (row ordered) tiles of a column. Corrupt tiles are removed from
    /// the cache so that they get re-fetched by the next run
    pub fn build_strip_with_status (&self, date: &DateTime<Utc>, column: u32, tiles: &[TileRecord], annotate: bool)->Result<(PathBuf,ArtifactStatus)> {
        let path = self.layout.strip_path( date, column, annotate);
        if tiles.is_empty() {
            return Err( AssemblyError::NothingToAssemble( format!("strip {column}")))
        }
        let size = self.tile_size;
        if !self.force && is_reusable( &path, (tiles.len() as u32 * size, size)) {
            debug!("strip {path:?} exists");
            return Ok( (path, ArtifactStatus::Existing) )
        }
        if let Some(missing) = tiles.iter().find( |t| !t.path.is_file()) {
            return Err( AssemblyError::MissingConstituent( missing.path.clone()))
        }

        let mut canvas = RgbImage::new( tiles.len() as u32 * size, size);

        for (i, tile) in tiles.iter().enumerate() {
            let img = decode( &tile.path).map_err( |e| {
                if is_corrupt( &e) {
                    remove_corrupt( &tile.path, &e);
                    AssemblyError::CorruptTile( tile.coord)
                } else {
                    AssemblyError::from(e)
                }
            })?;

            imageops::replace( &mut canvas, &img.to_rgb8(), (i as u32 * size) as i64, 0);
            if annotate {
                self.annotator.annotate_tile( &mut canvas, i as u32, size, &tile.coord);
            }
        }

        write_file_atomic( &path, &encode_jpeg( &canvas)?)?;
        info!("strip {path:?} created");
        Ok( (path, ArtifactStatus::Built) )
    }

    pub fn build_mosaic (&self, date: &DateTime<Utc>, strips: &[PathBuf], canvas_width: u32)->Result<PathBuf> {
        self.build_mosaic_with_status( date, strips, canvas_width).map( |(path,_)| path)
    }

    /// stack the (column ordered) strips of a timestamp top to bottom
    pub fn build_mosaic_with_status (&self, date: &DateTime<Utc>, strips: &[PathBuf], canvas_width: u32)->Result<(PathBuf,ArtifactStatus)> {
        let path = self.layout.mosaic_path( date);
        if strips.is_empty() {
            return Err( AssemblyError::NothingToAssemble( format!("mosaic {path:?}")))
        }
        if canvas_width == 0 {
            return Err( AssemblyError::InvalidDimensions( "zero mosaic width".into()))
        }
        let size = self.tile_size;
        if !self.force && is_reusable( &path, (canvas_width, strips.len() as u32 * size)) {
            debug!("mosaic {path:?} exists");
            return Ok( (path, ArtifactStatus::Existing) )
        }
        if let Some(missing) = strips.iter().find( |p| !p.is_file()) {
            return Err( AssemblyError::MissingConstituent( missing.clone()))
        }

        let mut canvas = RgbImage::new( canvas_width, strips.len() as u32 * size);

        for (j, strip) in strips.iter().enumerate() {
            let img = decode( strip).map_err( |e| {
                if is_corrupt( &e) {
                    remove_corrupt( strip, &e);
                    AssemblyError::CorruptArtifact( strip.clone())
                } else {
                    AssemblyError::from(e)
                }
            })?;

            imageops::replace( &mut canvas, &img.to_rgb8(), 0, (j as u32 * size) as i64);
        }

        write_file_atomic( &path, &encode_jpeg( &canvas)?)?;
        info!("mosaic {path:?} created");
        Ok( (path, ArtifactStatus::Built) )
    }
}

/// an existing artifact is only reused if it has the dimensions we would build now. Artifact names do
/// not include the region, i.e. a different region of interest yields different dimensions
fn is_reusable (path: &Path, dim: (u32,u32))->bool {
    if !path.is_file() {
        return false
    }
    match image::image_dimensions( path) {
        Ok(d) if d == dim => true,
        Ok(d) => {
            info!("re-creating {path:?} with dimensions {d:?} (expected {dim:?})");
            false
        }
        Err(e) => {
            warn!("re-creating unreadable {path:?}: {e}");
            false
        }
    }
}

fn decode (path: &Path)->std::result::Result<DynamicImage,ImageError> {
    image::open( path)
}

/// decoding failures caused by file contents (as opposed to file access)
pub fn is_corrupt (e: &ImageError)->bool {
    match e {
        ImageError::Decoding(_) | ImageError::Unsupported(_) => true,
        ImageError::IoError(ioe) => matches!( ioe.kind(), ErrorKind::UnexpectedEof | ErrorKind::InvalidData),
        _ => false
    }
}

fn remove_corrupt (path: &Path, e: &ImageError) {
    warn!("removing corrupt {path:?}: {e}");
    if let Err(e) = fs::remove_file( path) {
        warn!("failed to remove {path:?}: {e}");
    }
}

fn encode_jpeg (img: &RgbImage)->Result<Vec<u8>> {
    let mut buf = Cursor::new( Vec::new());
    img.write_to( &mut buf, ImageFormat::Jpeg)?;
    Ok( buf.into_inner() )
}
