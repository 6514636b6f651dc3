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

//! Identity of a verification call site and resolution of the files it
//! reads and writes.

use std::{
    fmt,
    path::{Path, PathBuf},
};

/// The two kinds of artifacts stored for a test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApprovalKind {
    /// The reference output, reviewed and committed by a developer.
    Approved,
    /// The output of the current run, transient.
    Received,
}

impl ApprovalKind {
    /// Tag used in the file name.
    pub fn tag(self) -> &'static str {
        match self {
            ApprovalKind::Approved => "approved",
            ApprovalKind::Received => "received",
        }
    }
}

impl fmt::Display for ApprovalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Identifies the test a verification belongs to: the source file it is
/// written in and the name of the test itself.
///
/// Usually built with the [`location!`](crate::location!) macro at the call site.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Location {
    source_file: String,
    test_name: String,
}

impl Location {
    /// Constructs a new Location
    pub fn new<S, T>(source_file: S, test_name: T) -> Self
    where
        S: Into<String>,
        T: Into<String>,
    {
        Location {
            source_file: source_file.into(),
            test_name: test_name.into(),
        }
    }

    /// Path of the calling source file, as given.
    pub fn source_file(&self) -> &str {
        &self.source_file
    }

    /// Name of the test.
    pub fn test_name(&self) -> &str {
        &self.test_name
    }

    /// Base name of the source file without its extension.
    pub fn source_stem(&self) -> &str {
        Path::new(&self.source_file)
            .file_stem()
            .and_then(|stem| stem.to_str())
            .unwrap_or(&self.source_file)
    }

    /// File name of the artifact of the given kind,
    /// `<source stem>.<test name>.<kind>.txt`.
    pub fn file_name(&self, kind: ApprovalKind) -> String {
        format!("{}.{}.{}.txt", self.source_stem(), self.test_name, kind)
    }

    /// Full path of the artifact of the given kind under `base_dir`.
    pub fn path<P: AsRef<Path>>(&self, base_dir: P, kind: ApprovalKind) -> PathBuf {
        base_dir.as_ref().join(self.file_name(kind))
    }
}

/// Extracts the test name from the type name of a function item declared
/// inside the test, e.g. `my_crate::tests::it_works::f` gives `it_works`.
/// Closure frames are skipped.
#[doc(hidden)]
pub fn test_name_from_type_name(type_name: &str) -> &str {
    let mut name = type_name.strip_suffix("::f").unwrap_or(type_name);
    while let Some(stripped) = name.strip_suffix("::{{closure}}") {
        name = stripped;
    }
    name.rsplit("::").next().unwrap_or(name)
}

/// Builds the [`Location`] of the enclosing function.
///
/// `location!()` uses the current source file and the name of the enclosing
/// function, `location!("name")` overrides the test name.
#[macro_export]
macro_rules! location {
    () => {{
        fn f() {}
        fn type_name_of<T>(_: T) -> &'static str {
            ::std::any::type_name::<T>()
        }
        $crate::Location::new(
            file!(),
            $crate::location::test_name_from_type_name(type_name_of(f)),
        )
    }};
    ($test_name:expr) => {
        $crate::Location::new(file!(), $test_name)
    };
}
