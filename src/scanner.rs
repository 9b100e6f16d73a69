use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::debug;
use walkdir::WalkDir;

use crate::config::Settings;
use crate::error::AppError;
use crate::installer::STAGING_DIR;
use crate::model::{InstalledFile, Systems};
use crate::path::is_excluded;

/// Reads the install root. Nothing found here is cached between operations.
pub struct Scanner {
    root: PathBuf,
    exclude: Option<globset::GlobSet>,
}

impl Scanner {
    pub fn new(settings: &Settings) -> Result<Self, AppError> {
        let exclude = settings.compile_excludes()?;
        Ok(Self { root: settings.roms_root()?, exclude })
    }

    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into(), exclude: None }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Files directly inside each configured system directory.
    pub fn scan_installed(&self, systems: &Systems) -> Result<Vec<InstalledFile>, AppError> {
        let mut files = Vec::new();
        for system in systems.iter() {
            let dir = self.root.join(&system.id);
            if !dir.is_dir() {
                continue;
            }
            let mut entries: Vec<_> = fs::read_dir(&dir)?.filter_map(Result::ok).collect();
            entries.sort_by_key(|entry| entry.file_name());
            for entry in entries {
                let path = entry.path();
                if is_hidden(&path) || is_excluded(&path, self.exclude.as_ref()) {
                    continue;
                }
                let metadata = entry.metadata()?;
                if metadata.is_file() {
                    files.push(InstalledFile { path, system: system.id.clone(), size: metadata.len() });
                }
            }
        }
        debug!("Found {} installed files under {}", files.len(), self.root.display());
        Ok(files)
    }

    /// Every file below the per-system directories, whether or not the system
    /// is still configured. Staging directories are skipped.
    pub fn scan_tree(&self, verbose: bool) -> Vec<InstalledFile> {
        let mut files = Vec::new();
        if !self.root.is_dir() {
            return files;
        }

        let mut walker = WalkDir::new(&self.root).min_depth(1).sort_by_file_name().into_iter();
        while let Some(entry) = walker.next() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    if verbose {
                        eprintln!("Skipping {:?}: {}", err.path(), err);
                    }
                    continue;
                }
            };

            let path = entry.path();
            let staging = entry.depth() == 2 && entry.file_name() == STAGING_DIR;
            if is_hidden(path) || staging || is_excluded(path, self.exclude.as_ref()) {
                if entry.file_type().is_dir() {
                    walker.skip_current_dir();
                }
                continue;
            }

            if entry.depth() < 2 || !entry.file_type().is_file() {
                continue;
            }

            let Some(system) = path
                .strip_prefix(&self.root)
                .ok()
                .and_then(|relative| relative.components().next())
                .and_then(|component| component.as_os_str().to_str())
            else {
                continue;
            };

            match entry.metadata() {
                Ok(metadata) => files.push(InstalledFile {
                    path: path.to_path_buf(),
                    system: system.to_string(),
                    size: metadata.len(),
                }),
                Err(err) => {
                    if verbose {
                        eprintln!("Skipping {}: {}", path.display(), err);
                    }
                }
            }
        }
        files
    }

    /// Remove each file independently and report the ones that failed.
    pub fn delete_files<'a>(
        &self,
        files: impl IntoIterator<Item = &'a Path>,
    ) -> Vec<(PathBuf, io::Error)> {
        let mut failures = Vec::new();
        for path in files {
            if is_excluded(path, self.exclude.as_ref()) {
                continue;
            }
            match fs::remove_file(path) {
                Ok(()) => debug!("Removed {}", path.display()),
                Err(err) if err.kind() == io::ErrorKind::NotFound => {}
                Err(err) => failures.push((path.to_path_buf(), err)),
            }
        }
        failures
    }
}

fn is_hidden(path: &Path) -> bool {
    path.file_name().and_then(|name| name.to_str()).is_some_and(|name| name.starts_with('.'))
}
