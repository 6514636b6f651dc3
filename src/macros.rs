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

//! Assertions failing the calling test when a verification fails.
//!
//! Each macro takes the [`Approvals`](crate::Approvals) to use, the verified
//! output and, optionally, a [`Location`](crate::Location). Without one, the
//! location of the enclosing function is used, so call them directly from the
//! test function.

macro_rules! ctx_from_path {
    ($path:expr) => {
        || format!("Error reading {:?}", $path)
    };
    ($action:literal, $path:expr) => {
        || format!(concat!("Error ", $action, " {:?}"), $path)
    };
    ($action:literal, $from:expr, $to:expr) => {
        || format!(concat!("Error ", $action, " {:?} to {:?}"), $from, $to)
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __assert_approval {
    ($result:expr) => {
        if let Err(e) = $result {
            panic!("{:?}", e);
        }
    };
}

/// Fails the test if the text differs from the approved one.
#[macro_export]
macro_rules! verify {
    ($approvals:expr, $text:expr $(,)?) => {
        $crate::verify!($approvals, $text, $crate::location!())
    };
    ($approvals:expr, $text:expr, $location:expr $(,)?) => {
        $crate::__assert_approval!($approvals.verify($text, &$location))
    };
}

/// Fails the test if the file differs from the approved one.
///
/// `verify_file!(approvals, path, ignore_new_line)`
#[macro_export]
macro_rules! verify_file {
    ($approvals:expr, $path:expr, $ignore_new_line:expr $(,)?) => {
        $crate::verify_file!($approvals, $path, $ignore_new_line, $crate::location!())
    };
    ($approvals:expr, $path:expr, $ignore_new_line:expr, $location:expr $(,)?) => {
        $crate::__assert_approval!($approvals.verify_file($path, $ignore_new_line, &$location))
    };
}

/// Fails the test if the entries of the zip archive differ from the
/// approved listing.
#[macro_export]
macro_rules! verify_zip_file {
    ($approvals:expr, $path:expr $(,)?) => {
        $crate::verify_zip_file!($approvals, $path, $crate::location!())
    };
    ($approvals:expr, $path:expr, $location:expr $(,)?) => {
        $crate::__assert_approval!($approvals.verify_zip_file($path, &$location))
    };
}

/// Approves the text. Do not commit a test using it.
#[macro_export]
macro_rules! approve {
    ($approvals:expr, $text:expr $(,)?) => {
        $crate::approve!($approvals, $text, $crate::location!())
    };
    ($approvals:expr, $text:expr, $location:expr $(,)?) => {
        $crate::__assert_approval!($approvals.approve($text, &$location))
    };
}

/// Approves the file. Do not commit a test using it.
#[macro_export]
macro_rules! approve_file {
    ($approvals:expr, $path:expr $(,)?) => {
        $crate::approve_file!($approvals, $path, $crate::location!())
    };
    ($approvals:expr, $path:expr, $location:expr $(,)?) => {
        $crate::__assert_approval!($approvals.approve_file($path, &$location))
    };
}

/// Approves the entries of the zip archive. Do not commit a test using it.
#[macro_export]
macro_rules! approve_zip_file {
    ($approvals:expr, $path:expr $(,)?) => {
        $crate::approve_zip_file!($approvals, $path, $crate::location!())
    };
    ($approvals:expr, $path:expr, $location:expr $(,)?) => {
        $crate::__assert_approval!($approvals.approve_zip_file($path, &$location))
    };
}
