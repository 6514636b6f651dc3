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

//! Listing of the entries of a zip archive.

use crate::Result;
use anyhow::Context;
use std::{
    fs::File,
    io::{self, Read, Seek, SeekFrom},
    path::Path,
};
use zip::read::read_zipfile_from_stream;

/// Full names of all the entries of an archive, in the order they are
/// stored.
///
/// Local headers are walked one by one, so an entry name stored twice is
/// listed twice. Directories are listed with their trailing `/`, like any
/// other entry.
pub fn entry_names<R: Read + Seek>(mut reader: R) -> Result<Vec<String>> {
    // validates the central directory, and an archive without entries has no
    // local header to walk
    if zip::ZipArchive::new(&mut reader)?.is_empty() {
        return Ok(vec![]);
    }
    reader.seek(SeekFrom::Start(0))?;
    let mut names = Vec::new();
    while let Some(mut entry) = read_zipfile_from_stream(&mut reader)? {
        names.push(entry.name().to_string());
        io::copy(&mut entry, &mut io::sink())?;
    }
    Ok(names)
}

/// Full names of all the entries of the archive at `path`.
pub fn entry_names_from_path<P: AsRef<Path>>(path: P) -> Result<Vec<String>> {
    let path = path.as_ref();
    let file = File::open(path).with_context(ctx_from_path!(path))?;
    entry_names(file).with_context(ctx_from_path!("reading zip archive", path))
}
