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

use std::fs::File;
use std::io::prelude::*;
use std::path::{self, Path};
use tempfile::TempDir;
use walkdir::WalkDir;
use zip::write::SimpleFileOptions;

fn zip_options() -> SimpleFileOptions {
    SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated)
}

pub fn get_file_content<P: AsRef<Path>>(path: P) -> String {
    let path = path.as_ref();
    let mut file = File::open(path).unwrap_or_else(|_| panic!("file {:?} not found", path));
    let mut contents = String::new();
    file.read_to_string(&mut contents).unwrap();
    contents
}

pub fn create_file_with_content(path: &path::Path, file_name: &str, content: &str) -> File {
    let file_path = path.join(file_name);
    let mut f = File::create(&file_path).unwrap();
    f.write_all(content.as_bytes()).unwrap();
    File::open(file_path).unwrap()
}

/// Creates an archive with the given entries, in order. Names ending with
/// `/` are directories, other entries contain their own name.
pub fn create_zip_with_entries<P: AsRef<Path>>(zip_file: P, entries: &[&str]) {
    let file = File::create(zip_file.as_ref()).unwrap();
    let mut zip = zip::ZipWriter::new(file);
    for entry in entries {
        if entry.ends_with('/') {
            zip.add_directory(*entry, zip_options()).unwrap();
        } else {
            zip.start_file(*entry, zip_options()).unwrap();
            zip.write_all(entry.as_bytes()).unwrap();
        }
    }
    zip.finish().unwrap();
}

/// Writes by hand an archive of empty stored entries, in order. Unlike
/// `ZipWriter`, the same name can be stored several times.
pub fn create_zip_with_empty_entries<P: AsRef<Path>>(zip_file: P, entries: &[&str]) {
    // 1980-01-01 00:00, the first MS-DOS date
    const DOS_DATE: u16 = (1 << 5) | 1;
    let mut archive: Vec<u8> = Vec::new();
    let mut central_directory: Vec<u8> = Vec::new();
    for name in entries {
        let offset = archive.len() as u32;
        archive.extend_from_slice(&0x0403_4b50u32.to_le_bytes());
        archive.extend_from_slice(&20u16.to_le_bytes()); // version needed
        archive.extend_from_slice(&0u16.to_le_bytes()); // flags
        archive.extend_from_slice(&0u16.to_le_bytes()); // stored
        archive.extend_from_slice(&0u16.to_le_bytes()); // time
        archive.extend_from_slice(&DOS_DATE.to_le_bytes());
        archive.extend_from_slice(&[0; 12]); // crc and sizes of empty content
        archive.extend_from_slice(&(name.len() as u16).to_le_bytes());
        archive.extend_from_slice(&0u16.to_le_bytes()); // extra field
        archive.extend_from_slice(name.as_bytes());

        central_directory.extend_from_slice(&0x0201_4b50u32.to_le_bytes());
        central_directory.extend_from_slice(&20u16.to_le_bytes()); // version made by
        central_directory.extend_from_slice(&20u16.to_le_bytes()); // version needed
        central_directory.extend_from_slice(&0u16.to_le_bytes()); // flags
        central_directory.extend_from_slice(&0u16.to_le_bytes()); // stored
        central_directory.extend_from_slice(&0u16.to_le_bytes()); // time
        central_directory.extend_from_slice(&DOS_DATE.to_le_bytes());
        central_directory.extend_from_slice(&[0; 12]); // crc and sizes
        central_directory.extend_from_slice(&(name.len() as u16).to_le_bytes());
        central_directory.extend_from_slice(&[0; 12]); // extra, comment, disk, attributes
        central_directory.extend_from_slice(&offset.to_le_bytes());
        central_directory.extend_from_slice(name.as_bytes());
    }
    let central_directory_offset = archive.len() as u32;
    archive.extend_from_slice(&central_directory);
    archive.extend_from_slice(&0x0605_4b50u32.to_le_bytes());
    archive.extend_from_slice(&[0; 4]); // disk numbers
    archive.extend_from_slice(&(entries.len() as u16).to_le_bytes());
    archive.extend_from_slice(&(entries.len() as u16).to_le_bytes());
    archive.extend_from_slice(&(central_directory.len() as u32).to_le_bytes());
    archive.extend_from_slice(&central_directory_offset.to_le_bytes());
    archive.extend_from_slice(&0u16.to_le_bytes()); // comment
    std::fs::write(zip_file.as_ref(), archive).unwrap();
}

/// Zips every file found under `source_path`, named relatively to it.
pub fn zip_to<P, R>(source_path: P, zip_file: R)
where
    P: AsRef<path::Path>,
    R: AsRef<path::Path>,
{
    let source_path = source_path.as_ref();
    let file = File::create(zip_file.as_ref()).unwrap();
    let mut zip = zip::ZipWriter::new(file);
    let mut buffer = Vec::new();
    for entry in WalkDir::new(source_path).sort_by_file_name() {
        let path = entry.unwrap().path().to_owned();
        if path.is_file() {
            let name = path.strip_prefix(source_path).unwrap();
            if let Some(name) = name.to_str() {
                zip.start_file(name, zip_options()).unwrap();
                File::open(&path).unwrap().read_to_end(&mut buffer).unwrap();
                zip.write_all(&buffer).unwrap();
                buffer.clear();
            }
        }
    }
    zip.finish().unwrap();
}

pub fn test_in_tmp_dir<F>(func: F)
where
    F: FnOnce(&path::Path),
{
    let tmp_dir = TempDir::new().expect("create temp dir");
    {
        let path = tmp_dir.as_ref();
        func(path);
    }
    tmp_dir.close().expect("delete temp dir");
}
