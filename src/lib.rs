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

//! The `approvals` crate verifies freshly generated output against a
//! reference approved once by a developer and stored on disk.
//!
//! Three kinds of output can be verified:
//! - a body of text, see [`Approvals::verify`]
//! - an existing file, see [`Approvals::verify_file`]
//! - the entry listing of a zip archive, see [`Approvals::verify_zip_file`]
//!
//! References live in a single directory, one file per test:
//! ```text
//! Approvals/
//!   <SourceFileName>.<TestName>.approved.txt
//!   <SourceFileName>.<TestName>.received.txt   (deleted when the test passes)
//! ```
//!
//! ```no_run
//! use approvals::{verify, Approvals};
//!
//! fn render() -> String {
//!     "hello world\n".to_string()
//! }
//!
//! // in a test function
//! verify!(Approvals::global(), &render());
//! ```

#![deny(missing_docs)]

#[macro_use]
mod macros;
pub mod compare;
pub mod configuration;
pub mod location;
pub mod pending;
#[doc(hidden)]
pub mod test_utils;
mod verifier;
pub mod version_utils;
pub mod zip_listing;

pub use crate::compare::ApprovalError;
pub use crate::configuration::Configuration;
pub use crate::location::{ApprovalKind, Location};
pub use crate::verifier::Approvals;
pub use crate::version_utils::{binary_full_version, GIT_VERSION};

/// The error type used by the crate.
pub type Error = anyhow::Error;

/// The corresponding result type used by the crate.
pub type Result<T> = std::result::Result<T, Error>;
