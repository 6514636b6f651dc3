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

//! Comparison of received artifacts against approved ones.
//!
//! Every function returns `Ok(())` when both sides match and an
//! [`ApprovalError`] wrapped in the crate error otherwise.

use crate::Result;
use anyhow::Context;
use pretty_assertions::StrComparison;
use std::{
    collections::BTreeMap,
    fs::File,
    io::{self, BufRead, BufReader, ErrorKind},
    path::{Path, PathBuf},
};
use thiserror::Error;

/// Failures of a verification.
#[derive(Debug, Error)]
pub enum ApprovalError {
    /// The approved file does not exist; it is never created implicitly.
    #[error("approved file {approved:?} not found")]
    MissingApproved {
        /// Expected path of the approved file
        approved: PathBuf,
    },
    /// Whole content comparison failed.
    #[error("received file {received:?} does not match approved file {approved:?}\n{diff}")]
    Mismatch {
        /// Approved file
        approved: PathBuf,
        /// Received file, left on disk for inspection
        received: PathBuf,
        /// Human readable difference
        diff: String,
    },
    /// Line by line comparison failed.
    #[error(
        "received file {received:?} does not match approved file {approved:?} at line {line}: expected {}, found {}",
        display_line(.expected),
        display_line(.actual)
    )]
    LineMismatch {
        /// Approved file
        approved: PathBuf,
        /// Received file, left on disk for inspection
        received: PathBuf,
        /// 1-based line number
        line: usize,
        /// Approved line, `None` if the approved file already ended
        expected: Option<String>,
        /// Received line, `None` if the received file already ended
        actual: Option<String>,
    },
    /// The entries of the archive are not those listed in the approved file.
    #[error("entries of archive {archive:?} do not match approved file {approved:?}: missing {missing:?}, unexpected {unexpected:?}")]
    ZipEntriesMismatch {
        /// Approved listing
        approved: PathBuf,
        /// Verified archive
        archive: PathBuf,
        /// Approved entries absent from the archive
        missing: Vec<String>,
        /// Archive entries absent from the approved listing
        unexpected: Vec<String>,
    },
    /// An approve operation was called while approvals are disabled.
    #[error("This test is using Approvals::{used}() when it should be using Approvals::{instead}()!")]
    ApproveInStrictMode {
        /// Approve operation which was called
        used: &'static str,
        /// Verify operation to use instead
        instead: &'static str,
    },
}

fn display_line(line: &Option<String>) -> String {
    match line {
        Some(line) => format!("{:?}", line),
        None => "end of file".to_string(),
    }
}

fn read_approved(approved: &Path) -> Result<Vec<u8>> {
    match std::fs::read(approved) {
        Ok(content) => Ok(content),
        Err(e) if e.kind() == ErrorKind::NotFound => Err(ApprovalError::MissingApproved {
            approved: approved.to_path_buf(),
        }
        .into()),
        Err(e) => Err(e).with_context(ctx_from_path!(approved)),
    }
}

fn open_approved(approved: &Path) -> Result<File> {
    match File::open(approved) {
        Ok(file) => Ok(file),
        Err(e) if e.kind() == ErrorKind::NotFound => Err(ApprovalError::MissingApproved {
            approved: approved.to_path_buf(),
        }
        .into()),
        Err(e) => Err(e).with_context(ctx_from_path!(approved)),
    }
}

fn diff(approved: &[u8], received: &[u8]) -> String {
    match (std::str::from_utf8(approved), std::str::from_utf8(received)) {
        (Ok(approved), Ok(received)) => StrComparison::new(approved, received).to_string(),
        _ => format!(
            "binary contents differ ({} bytes approved, {} bytes received)",
            approved.len(),
            received.len()
        ),
    }
}

/// Checks that both files have exactly the same bytes.
pub fn files_equal(approved: &Path, received: &Path) -> Result<()> {
    let expected = read_approved(approved)?;
    let actual = std::fs::read(received).with_context(ctx_from_path!(received))?;
    if expected == actual {
        return Ok(());
    }
    Err(ApprovalError::Mismatch {
        approved: approved.to_path_buf(),
        received: received.to_path_buf(),
        diff: diff(&expected, &actual),
    }
    .into())
}

/// Reads one line, without its terminator. `\n`, `\r\n` and a lone `\r` all
/// end a line. Returns `None` once the stream is exhausted.
fn read_line<R: BufRead>(reader: &mut R) -> io::Result<Option<Vec<u8>>> {
    let mut line = Vec::new();
    let mut read_any = false;
    loop {
        let (terminator, used) = {
            let available = reader.fill_buf()?;
            if available.is_empty() {
                return Ok(if read_any { Some(line) } else { None });
            }
            read_any = true;
            match available.iter().position(|&b| b == b'\n' || b == b'\r') {
                Some(i) => {
                    line.extend_from_slice(&available[..i]);
                    (Some(available[i]), i + 1)
                }
                None => {
                    line.extend_from_slice(available);
                    (None, available.len())
                }
            }
        };
        reader.consume(used);
        match terminator {
            Some(b'\r') => {
                if reader.fill_buf()?.first() == Some(&b'\n') {
                    reader.consume(1);
                }
                return Ok(Some(line));
            }
            Some(_) => return Ok(Some(line)),
            None => {}
        }
    }
}

fn lossy(line: Option<Vec<u8>>) -> Option<String> {
    line.map(|line| String::from_utf8_lossy(&line).into_owned())
}

/// Checks that both files have the same lines, whatever the line endings.
///
/// Lines are compared as bytes, whatever their encoding. Both files must end
/// on the same line.
pub fn lines_equal(approved: &Path, received: &Path) -> Result<()> {
    let mut approved_reader = BufReader::new(open_approved(approved)?);
    let mut received_reader =
        BufReader::new(File::open(received).with_context(ctx_from_path!(received))?);
    let mut line = 0;
    loop {
        line += 1;
        let expected =
            read_line(&mut approved_reader).with_context(ctx_from_path!(approved))?;
        let actual = read_line(&mut received_reader).with_context(ctx_from_path!(received))?;
        match (expected, actual) {
            (None, None) => return Ok(()),
            (expected, actual) if expected != actual => {
                return Err(ApprovalError::LineMismatch {
                    approved: approved.to_path_buf(),
                    received: received.to_path_buf(),
                    line,
                    expected: lossy(expected),
                    actual: lossy(actual),
                }
                .into());
            }
            _ => {}
        }
    }
}

fn count<I>(names: I) -> BTreeMap<String, usize>
where
    I: IntoIterator<Item = String>,
{
    names.into_iter().fold(BTreeMap::new(), |mut counts, name| {
        *counts.entry(name).or_insert(0) += 1;
        counts
    })
}

/// Elements of `left` not matched by an element of `right`, duplicates
/// counted.
fn surplus(left: &BTreeMap<String, usize>, right: &BTreeMap<String, usize>) -> Vec<String> {
    left.iter()
        .flat_map(|(name, &n)| {
            let m = right.get(name).copied().unwrap_or(0);
            std::iter::repeat(name.clone()).take(n.saturating_sub(m))
        })
        .collect()
}

/// Checks that the entry names of `archive` are exactly the ones listed,
/// one per line, in `approved`. Order does not matter, multiplicity does.
pub fn entries_equivalent<I>(approved: &Path, archive: &Path, entries: I) -> Result<()>
where
    I: IntoIterator<Item = String>,
{
    let content = read_approved(approved)?;
    let content = String::from_utf8(content)
        .with_context(|| format!("approved listing {:?} is not valid UTF-8", approved))?;
    let expected = count(
        content
            .lines()
            .filter(|line| !line.is_empty())
            .map(str::to_string),
    );
    let actual = count(entries);
    if expected == actual {
        return Ok(());
    }
    Err(ApprovalError::ZipEntriesMismatch {
        approved: approved.to_path_buf(),
        archive: archive.to_path_buf(),
        missing: surplus(&expected, &actual),
        unexpected: surplus(&actual, &expected),
    }
    .into())
}
