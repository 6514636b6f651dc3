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
//! Where approvals are stored and whether they can be written.

use crate::Result;
use anyhow::{bail, Context};
use serde::Deserialize;
use std::{
    env,
    fs::File,
    path::{Path, PathBuf},
};
use tracing::info;

/// Environment variable naming a JSON configuration file.
pub const CONFIG_ENV: &str = "APPROVALS_CONFIG";
/// Environment variable overriding the approvals directory.
pub const DIR_ENV: &str = "APPROVALS_DIR";
/// Environment variable overriding the strict mode.
pub const STRICT_ENV: &str = "APPROVALS_STRICT";

lazy_static::lazy_static! {
    /// Default approvals directory, `<executable directory>/../../Approvals`.
    pub static ref DEFAULT_BASE_DIR: PathBuf = default_base_dir();
}

fn default_base_dir() -> PathBuf {
    let exe_dir = env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
        .unwrap_or_else(|| PathBuf::from("."));
    let base_dir = exe_dir.join("..").join("..").join("Approvals");
    base_dir.canonicalize().unwrap_or(base_dir)
}

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    base_dir: Option<PathBuf>,
    strict: Option<bool>,
}

/// Settings of an [`Approvals`](crate::Approvals) verifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Configuration {
    /// Directory holding the approved and received files.
    pub base_dir: PathBuf,
    /// When set, every approve operation fails, so that an approval left in
    /// a test cannot silently accept unreviewed output.
    pub strict: bool,
}

impl Default for Configuration {
    fn default() -> Self {
        Configuration {
            base_dir: DEFAULT_BASE_DIR.clone(),
            strict: true,
        }
    }
}

impl Configuration {
    /// Constructs a strict configuration storing approvals in `base_dir`
    pub fn new<P: Into<PathBuf>>(base_dir: P) -> Self {
        Configuration {
            base_dir: base_dir.into(),
            strict: true,
        }
    }

    /// Allows or forbids approve operations.
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Reads the configuration from the environment.
    ///
    /// A JSON file named by `APPROVALS_CONFIG` is read first, for example
    /// ```text
    /// {
    ///     "base_dir": "tests/Approvals",
    ///     "strict": false
    /// }
    /// ```
    /// then `APPROVALS_DIR` and `APPROVALS_STRICT` override its values.
    pub fn from_env() -> Result<Self> {
        let config_path = env::var_os(CONFIG_ENV).map(PathBuf::from);
        let dir = env::var_os(DIR_ENV).map(PathBuf::from);
        let strict = env::var(STRICT_ENV).ok();
        Self::from_sources(config_path, dir, strict.as_deref())
    }

    fn from_sources(
        config_path: Option<PathBuf>,
        dir: Option<PathBuf>,
        strict: Option<&str>,
    ) -> Result<Self> {
        let mut configuration = Configuration::default();
        if let Some(config_path) = config_path {
            let config = read_config_file(&config_path)?;
            if let Some(base_dir) = config.base_dir {
                configuration.base_dir = base_dir;
            }
            if let Some(strict) = config.strict {
                configuration.strict = strict;
            }
        }
        if let Some(dir) = dir {
            configuration.base_dir = dir;
        }
        if let Some(strict) = strict {
            configuration.strict = parse_flag(strict)
                .with_context(|| format!("invalid value for {}", STRICT_ENV))?;
        }
        Ok(configuration)
    }
}

fn read_config_file(config_path: &Path) -> Result<ConfigFile> {
    info!("Reading approvals configuration from {:?}", config_path);
    let json_config_file =
        File::open(config_path).with_context(ctx_from_path!(config_path))?;
    let config = serde_json::from_reader(json_config_file)
        .with_context(ctx_from_path!("parsing", config_path))?;
    Ok(config)
}

fn parse_flag(value: &str) -> Result<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => bail!("expected a boolean, found {:?}", other),
    }
}
