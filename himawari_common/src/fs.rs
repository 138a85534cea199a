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

use std::fs;
use std::io::{self,Write,ErrorKind};
use std::path::{Path,PathBuf};
use std::env;
use tempfile::Builder as TempFileBuilder;

use crate::io_error;

type Result<T> = std::result::Result<T,std::io::Error>;

/// filename prefix of uncommitted temp files. Files with this prefix are never valid artifacts
pub const TEMP_FILE_PREFIX: &str = ".partial-";

pub fn filename<'a,T: AsRef<Path>> (path: &'a T)->Option<&'a str> {
    path.as_ref().file_name().and_then(|ostr| ostr.to_str())
}

pub fn ensure_dir (path: impl AsRef<Path>)->io::Result<()> {
    let path = path.as_ref();
    if !path.is_dir() {
        fs::create_dir_all(path)?;
    }
    Ok(())
}

pub fn path_to_lossy_string (path: impl AsRef<Path>) -> String {
    path.as_ref().to_string_lossy().as_ref().to_string()
}

/// write contents to a temp file in the directory of `path` and then rename it into `path`.
/// The rename is atomic on the same filesystem, i.e. `path` is either absent or has the complete contents.
/// An existing file at `path` is replaced
pub fn write_file_atomic (path: impl AsRef<Path>, contents: &[u8]) -> Result<()> {
    let path = path.as_ref();
    let dir = match path.parent() {
        Some(dir) if dir.as_os_str().is_empty() => Path::new("."),
        Some(dir) => dir,
        None => return Err( io_error!(ErrorKind::InvalidInput, "no parent dir for {:?}", path))
    };

    let mut file = TempFileBuilder::new().prefix(TEMP_FILE_PREFIX).tempfile_in(dir)?; // don't use path yet as that would expose partial writes
    file.write_all(contents)?;
    file.as_file().sync_all()?;

    file.persist(path).map_err(|e| e.error)?; // dropped temp files get removed automatically
    Ok(())
}

/// is this a leftover from an interrupted `write_file_atomic`
pub fn is_temp_file (path: impl AsRef<Path>)->bool {
    filename(&path).map(|fname| fname.starts_with(TEMP_FILE_PREFIX)).unwrap_or(false)
}

/// remove orphaned temp files (from interrupted runs) in the given dir. This is not recursive
pub fn remove_temp_files (dir: impl AsRef<Path>)->Result<usize> {
    let dir = dir.as_ref();
    let mut n_removed = 0;

    if dir.is_dir() {
        for e in fs::read_dir(dir)? {
            let path = e?.path();
            if path.is_file() && is_temp_file(&path) {
                if fs::remove_file(&path).is_ok() { n_removed += 1 }
            }
        }
    }
    Ok(n_removed)
}

/// sorted list of sub directories
pub fn sub_dirs (dir: impl AsRef<Path>)->Result<Vec<PathBuf>> {
    let mut list: Vec<PathBuf> = Vec::new();
    for e in fs::read_dir(dir.as_ref())? {
        let path = e?.path();
        if path.is_dir() { list.push(path) }
    }
    list.sort();
    Ok(list)
}

/// sorted list of regular files in dir whose filename satisfies the given predicate
pub fn matching_files_in_dir<F> (dir: impl AsRef<Path>, pred: F)->Result<Vec<PathBuf>> where F: Fn(&str)->bool {
    let mut list: Vec<PathBuf> = Vec::new();
    for e in fs::read_dir(dir.as_ref())? {
        let path = e?.path();
        if path.is_file() && !is_temp_file(&path) {
            if let Some(fname) = filename(&path) && pred(fname) {
                list.push(path)
            }
        }
    }
    list.sort();
    Ok(list)
}

/// replace leading '~' and '$<name>' path elements
pub fn replace_env_var_path (path: impl AsRef<Path>)->Result<PathBuf> {
    let mut p = PathBuf::new();

    for (n,c) in path.as_ref().iter().enumerate() {
        let e = c.to_str().ok_or( io_error!(ErrorKind::InvalidInput, "invalid path: {:?}", path.as_ref()))?;

        if e == "~" && n == 0 {
            p.push( env::var("HOME").map_err( |_| io_error!(ErrorKind::NotFound, "HOME not set"))?)
        } else if e.len() > 1 && e.starts_with('$') {
            p.push( env::var( &e[1..]).map_err( |_| io_error!(ErrorKind::NotFound, "{e} not set"))?)
        } else {
            p.push(e)
        }
    }

    Ok(p)
}
