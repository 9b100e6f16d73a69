use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::error::AppError;
use crate::model::{InstalledFile, Systems, by_system};
use crate::query::Query;
use crate::scanner::Scanner;

/// Installed files selected for removal.
#[derive(Debug, Default)]
pub struct UninstallPlan {
    pub files: Vec<InstalledFile>,
}

impl UninstallPlan {
    /// Scan the install root fresh and keep the files `query` selects.
    pub fn build(scanner: &Scanner, systems: &Systems, query: &Query) -> Result<Self, AppError> {
        let installed = scanner.scan_installed(systems)?;
        let files = query.filter(&installed).into_iter().cloned().collect();
        Ok(Self { files })
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn total_bytes(&self) -> u64 {
        self.files.iter().map(|file| file.size).sum()
    }

    /// Files and their total size per system id.
    pub fn by_system(&self) -> BTreeMap<String, (Vec<&InstalledFile>, u64)> {
        let refs: Vec<&InstalledFile> = self.files.iter().collect();
        by_system(&refs)
            .into_iter()
            .map(|(system, files)| {
                let total = files.iter().map(|file| file.size).sum();
                (system, (files, total))
            })
            .collect()
    }

    /// Delete every planned file; one failure does not stop the rest.
    pub fn execute(&self, scanner: &Scanner) -> Vec<(PathBuf, std::io::Error)> {
        scanner.delete_files(self.files.iter().map(|file| file.path.as_path()))
    }
}
