//! Raw page filename normalization

use crate::error::Result;
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

static PAGE_FILE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(trip_data_page_)(\d+)(\.json)$").expect("page file pattern is valid")
});

/// One performed rename
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenamedFile {
    /// Original path
    pub from: PathBuf,
    /// New path
    pub to: PathBuf,
}

/// Zero-pad page numbers in raw page filenames to `width` digits.
///
/// Only files numbered within `start..=end` are touched. Names already in
/// the padded form are left alone, and a rename whose target already
/// exists is skipped rather than overwriting it.
pub fn normalize_page_filenames(
    dir: impl AsRef<Path>,
    start: u64,
    end: u64,
    width: usize,
) -> Result<Vec<RenamedFile>> {
    let dir = dir.as_ref();

    let mut names: Vec<String> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .filter_map(|entry| entry.file_name().into_string().ok())
        .collect();
    names.sort();

    let mut renamed = Vec::new();
    for name in names {
        let Some(caps) = PAGE_FILE_RE.captures(&name) else {
            continue;
        };
        let Ok(number) = caps[2].parse::<u64>() else {
            continue;
        };
        if number < start || number > end {
            continue;
        }

        let padded = format!("{}{number:0width$}{}", &caps[1], &caps[3]);
        if padded == name {
            continue;
        }

        let from = dir.join(&name);
        let to = dir.join(&padded);
        if to.exists() {
            warn!("Skipping rename of {name}: {padded} already exists");
            continue;
        }

        std::fs::rename(&from, &to)?;
        info!("Renamed: {name} -> {padded}");
        renamed.push(RenamedFile { from, to });
    }

    Ok(renamed)
}
