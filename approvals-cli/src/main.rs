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

use anyhow::bail;
use approvals::{pending, Configuration, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{
    filter::{EnvFilter, LevelFilter},
    layer::SubscriberExt as _,
    util::SubscriberInitExt as _,
};

lazy_static::lazy_static! {
    pub static ref GIT_VERSION: String = approvals::binary_full_version(env!("CARGO_PKG_VERSION"));
}

fn get_version() -> &'static str {
    &GIT_VERSION
}

#[derive(Debug, Parser)]
#[clap(
    name = "approvals",
    about = "Review the received files left by failed approval tests.",
    version = get_version()
)]
struct Opt {
    /// Approvals directory.
    ///
    /// Defaults to APPROVALS_DIR, then to the directory configured in the
    /// file named by APPROVALS_CONFIG.
    #[clap(short, long, parse(from_os_str))]
    dir: Option<PathBuf>,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List the received files waiting for a review.
    Status,
    /// Replace approved files by the received ones.
    Accept {
        /// Only accept the received files whose name contains this text.
        #[clap(short, long)]
        filter: Option<String>,
    },
    /// Remove all the received files.
    Clean,
}

fn base_dir(dir: Option<PathBuf>) -> Result<PathBuf> {
    match dir {
        Some(dir) => Ok(dir),
        None => Ok(Configuration::from_env()?.base_dir),
    }
}

fn run(opt: Opt) -> Result<()> {
    info!("Launching approvals...");
    let base_dir = base_dir(opt.dir)?;
    if base_dir.exists() && !base_dir.is_dir() {
        bail!("{:?} is not a directory", base_dir);
    }

    match opt.command {
        Command::Status => {
            let received = pending::received_files(&base_dir)?;
            info!("{} received file(s) in {:?}", received.len(), base_dir);
            for file in received {
                println!("{}", file.display());
            }
        }
        Command::Accept { filter } => {
            let received = pending::received_files(&base_dir)?;
            let mut accepted = 0;
            for file in received.iter().filter(|file| {
                filter.as_deref().map_or(true, |filter| {
                    file.file_name()
                        .map_or(false, |name| name.to_string_lossy().contains(filter))
                })
            }) {
                let approved = pending::accept(file)?;
                println!("{}", approved.display());
                accepted += 1;
            }
            info!("{} file(s) accepted", accepted);
        }
        Command::Clean => {
            let removed = pending::clean(&base_dir)?;
            info!("{} received file(s) removed", removed);
        }
    }
    Ok(())
}

fn init_logger() {
    let default_level = LevelFilter::INFO;
    let rust_log =
        std::env::var(EnvFilter::DEFAULT_ENV).unwrap_or_else(|_| default_level.to_string());
    let env_filter_subscriber = EnvFilter::try_new(rust_log).unwrap_or_else(|e| {
        eprintln!(
            "invalid {}, falling back to level '{}' - {}",
            EnvFilter::DEFAULT_ENV,
            default_level,
            e,
        );
        EnvFilter::new(default_level.to_string())
    });
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(env_filter_subscriber)
        .init();
}

fn main() {
    init_logger();
    if let Err(err) = run(Opt::parse()) {
        for cause in err.chain() {
            eprintln!("{}", cause);
        }
        std::process::exit(1);
    }
}
