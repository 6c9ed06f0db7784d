//! Measurement table discovery in a data release folder.

use std::path::{Path, PathBuf};

use crate::error::{IngestError, Result};

/// File prefix of imaging measurement tables in the release.
pub const RELEASE_PREFIX: &str = "mri_y_";

/// Prefix given to discovered table names.
pub const TABLE_PREFIX: &str = "abcd_";

/// Suffix appended to modality table names.
pub const TABLE_SUFFIX: &str = "_baseline";

/// A measurement table found on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredTable {
    /// Dataset name used in logs and the export.
    pub name: String,
    pub path: PathBuf,
}

/// Lists all CSV files in a directory.
///
/// Returns files sorted by filename.
pub fn list_csv_files(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(IngestError::DirectoryNotFound {
            path: dir.to_path_buf(),
        });
    }

    let entries = std::fs::read_dir(dir).map_err(|e| IngestError::DirectoryRead {
        path: dir.to_path_buf(),
        source: e,
    })?;

    let mut files = Vec::new();
    for entry_result in entries {
        let entry = entry_result.map_err(|e| IngestError::DirectoryRead {
            path: dir.to_path_buf(),
            source: e,
        })?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }

        let is_csv = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));
        if is_csv {
            files.push(path);
        }
    }

    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(files)
}

/// Finds `mri_y_{modality}_{pattern}*.csv` and names each table
/// `abcd_{modality}_<rest>_baseline`.
pub fn discover_modality_tables(
    dir: &Path,
    modality: &str,
    pattern: &str,
) -> Result<Vec<DiscoveredTable>> {
    let release = format!("{RELEASE_PREFIX}{modality}_");
    let prefix = format!("{release}{pattern}");
    let renamed = format!("{TABLE_PREFIX}{modality}_");

    let tables = matching_stems(dir, &prefix)?
        .into_iter()
        .map(|(stem, path)| DiscoveredTable {
            name: format!("{}{TABLE_SUFFIX}", stem.replacen(&release, &renamed, 1)),
            path,
        })
        .collect();
    Ok(tables)
}

/// Finds `{prefix}*.csv`, renaming a leading `mri_y_` to `abcd_`.
pub fn discover_tables(dir: &Path, prefix: &str) -> Result<Vec<DiscoveredTable>> {
    let tables = matching_stems(dir, prefix)?
        .into_iter()
        .map(|(stem, path)| DiscoveredTable {
            name: match stem.strip_prefix(RELEASE_PREFIX) {
                Some(rest) => format!("{TABLE_PREFIX}{rest}"),
                None => stem,
            },
            path,
        })
        .collect();
    Ok(tables)
}

fn matching_stems(dir: &Path, prefix: &str) -> Result<Vec<(String, PathBuf)>> {
    let mut matches = Vec::new();
    for path in list_csv_files(dir)? {
        let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) else {
            continue;
        };
        if stem.starts_with(prefix) {
            matches.push((stem.to_string(), path));
        }
    }
    tracing::debug!(dir = %dir.display(), prefix, count = matches.len(), "discovered tables");
    Ok(matches)
}
