//! Persistence of the fetched package catalog.

use std::fs;
use std::io;
use std::path::Path;

use tracing::debug;

use crate::error::AppError;
use crate::model::PackageEntry;

/// Replace the catalog file with `entries`.
pub fn save(path: &Path, entries: &[PackageEntry]) -> Result<(), AppError> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)?;
    }
    let staging = path.with_extension("json.tmp");
    fs::write(&staging, serde_json::to_vec(entries)?)?;
    fs::rename(&staging, path)?;
    debug!("Saved {} catalog entries to {}", entries.len(), path.display());
    Ok(())
}

pub fn load(path: &Path) -> Result<Vec<PackageEntry>, AppError> {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            return Err(AppError::config("No package data found. Run 'retro update' first."));
        }
        Err(err) => return Err(AppError::Io(err)),
    };
    serde_json::from_str(&contents)
        .map_err(|err| AppError::config(format!("Could not load {}: {err}", path.display())))
}
