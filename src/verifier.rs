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

use crate::{
    compare::{self, ApprovalError},
    configuration::Configuration,
    location::{ApprovalKind, Location},
    zip_listing, Result,
};
use anyhow::Context;
use std::{
    fs,
    path::{Path, PathBuf},
};
use tracing::{debug, info, warn};

lazy_static::lazy_static! {
    static ref GLOBAL: Approvals = Approvals::from_env()
        .unwrap_or_else(|e| panic!("invalid approvals configuration: {:?}", e));
}

/// Verifies output against the approved files of a directory.
#[derive(Debug, Clone)]
pub struct Approvals {
    configuration: Configuration,
}

impl Approvals {
    /// Constructs a verifier from a configuration
    pub fn new(configuration: Configuration) -> Self {
        Approvals { configuration }
    }

    /// Constructs a verifier configured from the environment, see
    /// [`Configuration::from_env`].
    pub fn from_env() -> Result<Self> {
        Ok(Approvals::new(Configuration::from_env()?))
    }

    /// Process-wide verifier configured from the environment on first use.
    ///
    /// Panics if the configuration is invalid.
    pub fn global() -> &'static Approvals {
        &GLOBAL
    }

    /// Configuration in use.
    pub fn configuration(&self) -> &Configuration {
        &self.configuration
    }

    /// Path of the artifact of the given kind for a test.
    pub fn path(&self, location: &Location, kind: ApprovalKind) -> PathBuf {
        location.path(&self.configuration.base_dir, kind)
    }

    fn create_base_dir(&self) -> Result<()> {
        let base_dir = &self.configuration.base_dir;
        fs::create_dir_all(base_dir).with_context(ctx_from_path!("creating", base_dir))
    }

    fn check_not_strict(&self, used: &'static str, instead: &'static str) -> Result<()> {
        if self.configuration.strict {
            warn!("Approvals::{}() is forbidden in strict mode", used);
            return Err(ApprovalError::ApproveInStrictMode { used, instead }.into());
        }
        Ok(())
    }

    fn remove_received(received: &Path) -> Result<()> {
        debug!("Removing {:?}", received);
        fs::remove_file(received).with_context(ctx_from_path!("removing", received))
    }

    /// Verifies a body of text against the approved file of the test.
    ///
    /// The text is written to the received file, which is removed if it
    /// matches the approved file and left for inspection otherwise.
    pub fn verify(&self, text: &str, location: &Location) -> Result<()> {
        let received = self.path(location, ApprovalKind::Received);
        let approved = self.path(location, ApprovalKind::Approved);
        self.create_base_dir()?;
        debug!("Writing {:?}", received);
        fs::write(&received, text).with_context(ctx_from_path!("writing", received))?;
        compare::files_equal(&approved, &received)?;
        Self::remove_received(&received)
    }

    /// Verifies an existing file against the approved file of the test.
    ///
    /// With `ignore_new_line`, files are compared line by line and line
    /// endings do not matter.
    pub fn verify_file<P: AsRef<Path>>(
        &self,
        file_path: P,
        ignore_new_line: bool,
        location: &Location,
    ) -> Result<()> {
        let file_path = file_path.as_ref();
        let received = self.path(location, ApprovalKind::Received);
        let approved = self.path(location, ApprovalKind::Approved);
        self.create_base_dir()?;
        debug!("Copying {:?} to {:?}", file_path, received);
        fs::copy(file_path, &received)
            .with_context(ctx_from_path!("copying", file_path, received))?;
        if ignore_new_line {
            compare::lines_equal(&approved, &received)?;
        } else {
            compare::files_equal(&approved, &received)?;
        }
        Self::remove_received(&received)
    }

    /// Verifies the entry names of a zip archive against the approved
    /// listing of the test, one name per line. Order does not matter.
    ///
    /// No received file is written.
    pub fn verify_zip_file<P: AsRef<Path>>(&self, file_path: P, location: &Location) -> Result<()> {
        let file_path = file_path.as_ref();
        let approved = self.path(location, ApprovalKind::Approved);
        let entries = zip_listing::entry_names_from_path(file_path)?;
        compare::entries_equivalent(&approved, file_path, entries)
    }

    /// Writes a body of text as the approved file of the test, then verifies
    /// it.
    ///
    /// Only meant to be used temporarily, while approving a test. Fails in
    /// strict mode.
    #[deprecated(note = "Do not commit code using this method. It should be used temporarily to approve a test.")]
    pub fn approve(&self, text: &str, location: &Location) -> Result<()> {
        self.check_not_strict("approve", "verify")?;
        let approved = self.path(location, ApprovalKind::Approved);
        self.create_base_dir()?;
        info!("Approving {:?}", approved);
        fs::write(&approved, text).with_context(ctx_from_path!("writing", approved))?;
        self.verify(text, location)
    }

    /// Copies a file as the approved file of the test, then verifies it.
    ///
    /// Only meant to be used temporarily, while approving a test. Fails in
    /// strict mode.
    #[deprecated(note = "Do not commit code using this method. It should be used temporarily to approve a test.")]
    pub fn approve_file<P: AsRef<Path>>(&self, file_path: P, location: &Location) -> Result<()> {
        self.check_not_strict("approve_file", "verify_file")?;
        let file_path = file_path.as_ref();
        let approved = self.path(location, ApprovalKind::Approved);
        self.create_base_dir()?;
        info!("Approving {:?} as {:?}", file_path, approved);
        fs::copy(file_path, &approved)
            .with_context(ctx_from_path!("copying", file_path, approved))?;
        self.verify_file(file_path, false, location)
    }

    /// Writes the entry names of a zip archive as the approved listing of
    /// the test, then verifies it.
    ///
    /// Only meant to be used temporarily, while approving a test. Fails in
    /// strict mode.
    #[deprecated(note = "Do not commit code using this method. It should be used temporarily to approve a test.")]
    pub fn approve_zip_file<P: AsRef<Path>>(
        &self,
        file_path: P,
        location: &Location,
    ) -> Result<()> {
        self.check_not_strict("approve_zip_file", "verify_zip_file")?;
        let file_path = file_path.as_ref();
        let approved = self.path(location, ApprovalKind::Approved);
        let mut listing = zip_listing::entry_names_from_path(file_path)?.join("\n");
        listing.push('\n');
        self.create_base_dir()?;
        info!("Approving entries of {:?} as {:?}", file_path, approved);
        fs::write(&approved, listing).with_context(ctx_from_path!("writing", approved))?;
        self.verify_zip_file(file_path, location)
    }
}

#[cfg(test)]
#[allow(deprecated)]
mod tests {
    use super::*;
    use crate::test_utils::{
        create_file_with_content, create_zip_with_empty_entries, create_zip_with_entries,
        get_file_content, test_in_tmp_dir,
    };
    use pretty_assertions::assert_eq;

    fn approvals(path: &Path) -> Approvals {
        Approvals::new(Configuration::new(path.join("Approvals")).strict(false))
    }

    fn approval_error(result: Result<()>) -> ApprovalError {
        result
            .unwrap_err()
            .downcast::<ApprovalError>()
            .expect("an approval error")
    }

    #[test]
    fn approve_then_verify() {
        test_in_tmp_dir(|path| {
            let approvals = approvals(path);
            let location = Location::new("src/render.rs", "header");
            approvals.approve("Hello\nWorld\n", &location).unwrap();
            assert_eq!(
                "Hello\nWorld\n",
                get_file_content(path.join("Approvals/render.header.approved.txt"))
            );
            approvals.verify("Hello\nWorld\n", &location).unwrap();
            assert!(!approvals.path(&location, ApprovalKind::Received).exists());
        });
    }

    #[test]
    fn verify_different_text_keeps_received() {
        test_in_tmp_dir(|path| {
            let approvals = approvals(path);
            let location = Location::new("src/render.rs", "header");
            approvals.approve("Hello\n", &location).unwrap();
            let err = approval_error(approvals.verify("Bye\n", &location));
            assert!(matches!(err, ApprovalError::Mismatch { .. }));
            let received = approvals.path(&location, ApprovalKind::Received);
            assert_eq!("Bye\n", get_file_content(received));
        });
    }

    #[test]
    fn verify_without_approved_file() {
        test_in_tmp_dir(|path| {
            let approvals = approvals(path);
            let location = Location::new("src/render.rs", "never_approved");
            let err = approval_error(approvals.verify("Hello\n", &location));
            assert!(matches!(err, ApprovalError::MissingApproved { .. }));
            assert!(!approvals.path(&location, ApprovalKind::Approved).exists());
        });
    }

    #[test]
    fn verify_overwrites_stale_received() {
        test_in_tmp_dir(|path| {
            let approvals = approvals(path);
            let location = Location::new("src/render.rs", "stale");
            approvals.approve("fresh", &location).unwrap();
            create_file_with_content(&path.join("Approvals"), "render.stale.received.txt", "old");
            approvals.verify("fresh", &location).unwrap();
            assert!(!approvals.path(&location, ApprovalKind::Received).exists());
        });
    }

    #[test]
    fn verify_file_ignoring_new_lines() {
        test_in_tmp_dir(|path| {
            let approvals = approvals(path);
            let location = Location::new("src/export.rs", "csv");
            create_file_with_content(path, "unix.csv", "a\nb\n");
            create_file_with_content(path, "windows.csv", "a\r\nb\r\n");
            approvals.approve_file(path.join("unix.csv"), &location).unwrap();
            assert!(approvals
                .verify_file(path.join("windows.csv"), false, &location)
                .is_err());
            approvals
                .verify_file(path.join("windows.csv"), true, &location)
                .unwrap();
            assert!(!approvals.path(&location, ApprovalKind::Received).exists());
        });
    }

    #[test]
    fn verify_file_with_different_line() {
        test_in_tmp_dir(|path| {
            let approvals = approvals(path);
            let location = Location::new("src/export.rs", "csv");
            create_file_with_content(path, "approved.csv", "a\nb\n");
            create_file_with_content(path, "received.csv", "a\nX\n");
            approvals.approve_file(path.join("approved.csv"), &location).unwrap();
            let err = approval_error(approvals.verify_file(path.join("received.csv"), true, &location));
            assert!(matches!(err, ApprovalError::LineMismatch { line: 2, .. }));
            assert!(approvals.path(&location, ApprovalKind::Received).exists());
        });
    }

    #[test]
    fn verify_missing_file() {
        test_in_tmp_dir(|path| {
            let approvals = approvals(path);
            let location = Location::new("src/export.rs", "missing");
            let err = approvals
                .verify_file(path.join("nothing.csv"), false, &location)
                .unwrap_err();
            assert!(err.downcast_ref::<ApprovalError>().is_none());
        });
    }

    #[test]
    fn approve_zip_file_lists_entries() {
        test_in_tmp_dir(|path| {
            let approvals = approvals(path);
            let location = Location::new("src/package.rs", "bundle");
            let zip = path.join("bundle.zip");
            create_zip_with_entries(&zip, &["b.txt", "a/", "a/c.txt"]);
            approvals.approve_zip_file(&zip, &location).unwrap();
            assert_eq!(
                "b.txt\na/\na/c.txt\n",
                get_file_content(approvals.path(&location, ApprovalKind::Approved))
            );
            assert!(!approvals.path(&location, ApprovalKind::Received).exists());
        });
    }

    #[test]
    fn verify_zip_file_in_other_order() {
        test_in_tmp_dir(|path| {
            let approvals = approvals(path);
            let location = Location::new("src/package.rs", "bundle");
            create_zip_with_entries(path.join("first.zip"), &["b.txt", "a/", "a/c.txt"]);
            create_zip_with_entries(path.join("second.zip"), &["a/c.txt", "b.txt", "a/"]);
            create_zip_with_entries(path.join("third.zip"), &["a/c.txt", "b.txt"]);
            approvals
                .approve_zip_file(path.join("first.zip"), &location)
                .unwrap();
            approvals
                .verify_zip_file(path.join("second.zip"), &location)
                .unwrap();
            let err = approval_error(approvals.verify_zip_file(path.join("third.zip"), &location));
            match err {
                ApprovalError::ZipEntriesMismatch {
                    missing, unexpected, ..
                } => {
                    assert_eq!(vec!["a/".to_string()], missing);
                    assert!(unexpected.is_empty());
                }
                e => panic!("unexpected error {:?}", e),
            }
        });
    }

    #[test]
    fn verify_zip_file_with_duplicated_entry() {
        test_in_tmp_dir(|path| {
            let approvals = approvals(path);
            let location = Location::new("src/package.rs", "bundle");
            let zip = path.join("bundle.zip");
            create_zip_with_empty_entries(&zip, &["a.txt", "a.txt", "b.txt"]);
            std::fs::create_dir(path.join("Approvals")).unwrap();
            create_file_with_content(
                &path.join("Approvals"),
                "package.bundle.approved.txt",
                "a.txt\nb.txt\n",
            );
            match approval_error(approvals.verify_zip_file(&zip, &location)) {
                ApprovalError::ZipEntriesMismatch {
                    missing, unexpected, ..
                } => {
                    assert!(missing.is_empty());
                    assert_eq!(vec!["a.txt".to_string()], unexpected);
                }
                e => panic!("unexpected error {:?}", e),
            }

            approvals.approve_zip_file(&zip, &location).unwrap();
            assert_eq!(
                "a.txt\na.txt\nb.txt\n",
                get_file_content(approvals.path(&location, ApprovalKind::Approved))
            );
        });
    }

    #[test]
    fn verify_file_in_other_encoding_ignoring_new_lines() {
        test_in_tmp_dir(|path| {
            let approvals = approvals(path);
            let location = Location::new("src/export.rs", "latin1");
            std::fs::write(path.join("approved.csv"), b"caf\xe9\nna\xefve\n").unwrap();
            std::fs::write(path.join("received.csv"), b"caf\xe9\r\nna\xefve\r\n").unwrap();
            approvals.approve_file(path.join("approved.csv"), &location).unwrap();
            approvals
                .verify_file(path.join("received.csv"), true, &location)
                .unwrap();
            assert!(!approvals.path(&location, ApprovalKind::Received).exists());
        });
    }

    #[test]
    fn configured_paths() {
        test_in_tmp_dir(|path| {
            let approvals = Approvals::new(Configuration::new(path));
            assert!(approvals.configuration().strict);
            assert_eq!(path.to_path_buf(), approvals.configuration().base_dir);
            assert_eq!(
                path.join("lib.test.received.txt"),
                approvals.path(&Location::new("src/lib.rs", "test"), ApprovalKind::Received)
            );
        });
    }

    #[test]
    fn strict_mode_forbids_approvals() {
        test_in_tmp_dir(|path| {
            let approvals = Approvals::new(Configuration::new(path.join("Approvals")));
            let location = Location::new("src/render.rs", "header");
            create_file_with_content(path, "file.txt", "content");
            create_zip_with_entries(path.join("archive.zip"), &["a.txt"]);

            let err = approval_error(approvals.approve("content", &location));
            assert_eq!(
                "This test is using Approvals::approve() when it should be using Approvals::verify()!",
                format!("{}", err)
            );
            let err = approval_error(approvals.approve_file(path.join("file.txt"), &location));
            assert_eq!(
                "This test is using Approvals::approve_file() when it should be using Approvals::verify_file()!",
                format!("{}", err)
            );
            let err = approval_error(approvals.approve_zip_file(path.join("archive.zip"), &location));
            assert_eq!(
                "This test is using Approvals::approve_zip_file() when it should be using Approvals::verify_zip_file()!",
                format!("{}", err)
            );
            assert!(!path.join("Approvals").exists());
        });
    }

    #[test]
    fn strict_mode_fails_even_when_matching() {
        test_in_tmp_dir(|path| {
            let location = Location::new("src/render.rs", "header");
            approvals(path).approve("same", &location).unwrap();
            let strict = Approvals::new(Configuration::new(path.join("Approvals")));
            strict.verify("same", &location).unwrap();
            assert!(strict.approve("same", &location).is_err());
        });
    }

    #[test]
    fn strict_mode_is_logged() {
        testing_logger::setup();
        test_in_tmp_dir(|path| {
            let approvals = Approvals::new(Configuration::new(path));
            let _ = approvals.approve("content", &Location::new("a.rs", "b"));
        });
        testing_logger::validate(|captured_logs| {
            let warning = captured_logs
                .iter()
                .find(|captured_log| captured_log.level == tracing::log::Level::Warn)
                .expect("log warning expected");
            assert!(warning
                .body
                .contains("Approvals::approve() is forbidden in strict mode"));
        });
    }
}
