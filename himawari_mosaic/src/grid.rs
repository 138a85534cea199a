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

//! tile grid model: depth, grid coordinates and the region of interest within the grid

use std::{fmt, ops::RangeInclusive};

use crate::errors::ConfigError;

/// the grid resolutions supported by the tile server
pub const VALID_DEPTHS: [u32;4] = [4, 8, 16, 20];

/// number of tiles per grid axis, i.e. the full disk image is split into depth x depth tiles
#[derive(Debug,Clone,Copy,PartialEq,Eq,Hash)]
pub struct Depth(u32);

impl Depth {
    pub fn new (depth: u32)->Result<Self,ConfigError> {
        if VALID_DEPTHS.contains(&depth) {
            Ok( Depth(depth) )
        } else {
            Err( ConfigError::InvalidDepth(depth) )
        }
    }

    #[inline] pub fn value (&self)->u32 { self.0 }
}

impl Default for Depth {
    fn default()->Self { Depth(20) }
}

impl TryFrom<u32> for Depth {
    type Error = ConfigError;
    fn try_from (depth: u32)->Result<Self,ConfigError> { Depth::new(depth) }
}

impl From<Depth> for u32 {
    fn from (depth: Depth)->u32 { depth.0 }
}

impl fmt::Display for Depth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// position of a tile within the depth x depth grid. Internally we always use (column,row) order
#[derive(Debug,Clone,Copy,PartialEq,Eq,Hash,PartialOrd,Ord)]
pub struct GridCoordinate {
    pub column: u32,
    pub row: u32,
}

impl GridCoordinate {
    pub fn new (column: u32, row: u32)->Self { GridCoordinate { column, row } }
}

impl fmt::Display for GridCoordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{},{}]", self.column, self.row)
    }
}

/// the tile server addresses tiles as (row,column). This is the only place where we swap axes
#[inline]
pub fn wire_axes (coord: &GridCoordinate)->(u32,u32) {
    (coord.row, coord.column)
}

/// inclusive rectangle in grid coordinates. Invariant: left <= right < depth, top <= bottom < depth
#[derive(Debug,Clone,Copy,PartialEq,Eq)]
pub struct RegionOfInterest {
    left: u32,
    top: u32,
    right: u32,
    bottom: u32,
}

impl RegionOfInterest {
    pub fn new (left: u32, top: u32, right: u32, bottom: u32, depth: Depth)->Result<Self,ConfigError> {
        let d = depth.value();
        if left > right || top > bottom {
            Err( ConfigError::InvalidRegion( format!("({left},{top})-({right},{bottom}) has inverted bounds")))
        } else if right >= d || bottom >= d {
            Err( ConfigError::InvalidRegion( format!("({left},{top})-({right},{bottom}) exceeds depth {d}")))
        } else {
            Ok( RegionOfInterest { left, top, right, bottom } )
        }
    }

    /// the whole depth x depth grid
    pub fn full (depth: Depth)->Self {
        let max = depth.value() - 1;
        RegionOfInterest { left: 0, top: 0, right: max, bottom: max }
    }

    /// parse a "left top right bottom" spec (whitespace or comma separated)
    pub fn parse (spec: &str, depth: Depth)->Result<Self,ConfigError> {
        let vs: Vec<u32> = spec.split(|c: char| c.is_whitespace() || c == ',')
            .filter( |s| !s.is_empty())
            .map( |s| s.parse::<u32>())
            .collect::<Result<Vec<u32>,_>>()
            .map_err( |_| ConfigError::InvalidRegion( format!("not a list of grid indices: '{spec}'")))?;

        if let [left, top, right, bottom] = vs[..] {
            RegionOfInterest::new( left, top, right, bottom, depth)
        } else {
            Err( ConfigError::InvalidRegion( format!("expected 'left top right bottom', got '{spec}'")))
        }
    }

    #[inline] pub fn left (&self)->u32 { self.left }
    #[inline] pub fn top (&self)->u32 { self.top }
    #[inline] pub fn right (&self)->u32 { self.right }
    #[inline] pub fn bottom (&self)->u32 { self.bottom }

    pub fn columns (&self)->RangeInclusive<u32> { self.left..=self.right }
    pub fn rows (&self)->RangeInclusive<u32> { self.top..=self.bottom }

    pub fn n_columns (&self)->u32 { self.right - self.left + 1 }
    pub fn n_rows (&self)->u32 { self.bottom - self.top + 1 }
    pub fn n_tiles (&self)->usize { (self.n_columns() * self.n_rows()) as usize }

    pub fn contains (&self, coord: &GridCoordinate)->bool {
        self.columns().contains(&coord.column) && self.rows().contains(&coord.row)
    }

    /// tiles of one column, ordered by row
    pub fn column_tiles (&self, column: u32)->Vec<GridCoordinate> {
        self.rows().map( |row| GridCoordinate::new( column, row)).collect()
    }

    /// all tiles in column-major order (outer loop over columns, inner over rows)
    pub fn tiles (&self)->impl Iterator<Item=GridCoordinate> + '_ {
        self.columns().flat_map( move |column| self.rows().map( move |row| GridCoordinate::new( column, row)))
    }

    /// pixel width of composed mosaics. Strips run along the rows of a column, hence every strip
    /// (and the mosaic) is as wide as the row span of the region
    pub fn mosaic_width (&self, tile_size: u32)->u32 {
        self.n_rows() * tile_size
    }
}

impl fmt::Display for RegionOfInterest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{})-({},{})", self.left, self.top, self.right, self.bottom)
    }
}
