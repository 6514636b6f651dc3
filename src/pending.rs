// Copyright (C) 2017 Hove and/or its affiliates.
//
// This program is free software: you can redistribute it and/or modify it
// under the terms of the GNU Affero General Public License as published by the
// Free Software Foundation, version 3.

// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU Affero General Public License for more
// details.

// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>

//! Housekeeping of the received files left behind by failed verifications.

use crate::Result;
use anyhow::{anyhow, Context};
use std::{
    fs,
    path::{Path, PathBuf},
};
use tracing::{debug, info};
use walkdir::WalkDir;

const RECEIVED_SUFFIX: &str = ".received.txt";
const APPROVED_SUFFIX: &str = ".approved.txt";

/// Received files directly in `base_dir`, sorted by name.
///
/// A missing directory has no received files.
pub fn received_files<P: AsRef<Path>>(base_dir: P) -> Result<Vec<PathBuf>> {
    let base_dir = base_dir.as_ref();
    if !base_dir.is_dir() {
        debug!("{:?} is not a directory, no received files", base_dir);
        return Ok(vec![]);
    }
    let mut files = Vec::new();
    for entry in WalkDir::new(base_dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = entry.with_context(ctx_from_path!(base_dir))?;
        let is_received = entry
            .file_name()
            .to_str()
            .map_or(false, |name| name.ends_with(RECEIVED_SUFFIX));
        if entry.file_type().is_file() && is_received {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

/// Path of the approved file matching a received file.
pub fn approved_path_for<P: AsRef<Path>>(received: P) -> Option<PathBuf> {
    let received = received.as_ref();
    let name = received.file_name()?.to_str()?;
    let stem = name.strip_suffix(RECEIVED_SUFFIX)?;
    Some(received.with_file_name(format!("{}{}", stem, APPROVED_SUFFIX)))
}

/// Replaces the approved file by the received one.
pub fn accept<P: AsRef<Path>>(received: P) -> Result<PathBuf> {
    let received = received.as_ref();
    let approved = approved_path_for(received)
        .ok_or_else(|| anyhow!("{:?} is not a received file", received))?;
    info!("Accepting {:?} as {:?}", received, approved);
    fs::rename(received, &approved)
        .with_context(ctx_from_path!("moving", received, approved))?;
    Ok(approved)
}

/// Removes every received file of `base_dir`, returns how many were removed.
pub fn clean<P: AsRef<Path>>(base_dir: P) -> Result<usize> {
    let received = received_files(base_dir)?;
    for file in &received {
        debug!("Removing {:?}", file);
        fs::remove_file(file).with_context(ctx_from_path!("removing", file))?;
    }
    Ok(received.len())
}
