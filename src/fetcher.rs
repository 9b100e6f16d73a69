//! Catalog retrieval: one listing fetch per system on a bounded pool.

use std::collections::HashSet;

use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::error::{AppError, RemoteError};
use crate::listing::parse_listing;
use crate::model::{PackageEntry, SystemDefinition, Systems};
use crate::progress::{Finish, Progress};
use crate::remote::Remote;

/// Per-system result of a fetch pass.
#[derive(Debug)]
pub struct SystemFetch {
    pub system: String,
    pub entries: Vec<PackageEntry>,
    pub error: Option<RemoteError>,
}

pub struct CatalogFetcher<'a> {
    remote: &'a dyn Remote,
    workers: usize,
}

impl<'a> CatalogFetcher<'a> {
    pub fn new(remote: &'a dyn Remote, workers: usize) -> Self {
        Self { remote, workers: workers.max(1) }
    }

    /// Fetch every system. A failing system contributes no entries and never
    /// stops the others.
    pub fn fetch_all(
        &self,
        systems: &Systems,
        progress: &Progress,
    ) -> Result<Vec<SystemFetch>, AppError> {
        let pool = rayon::ThreadPoolBuilder::new().num_threads(self.workers).build()?;
        let definitions: Vec<&SystemDefinition> = systems.iter().collect();
        info!("Fetching listings for {} systems", definitions.len());

        let results = pool.install(|| {
            definitions
                .par_iter()
                .map(|system| {
                    let unit = progress.start();
                    match self.fetch_system(system) {
                        Ok(entries) => {
                            unit.finish(Finish::Done);
                            SystemFetch { system: system.id.clone(), entries, error: None }
                        }
                        Err(err) => {
                            warn!("Failed to fetch {}: {}", system.id, err);
                            unit.finish(Finish::Failed);
                            SystemFetch {
                                system: system.id.clone(),
                                entries: Vec::new(),
                                error: Some(err),
                            }
                        }
                    }
                })
                .collect()
        });
        Ok(results)
    }

    pub fn fetch_system(&self, system: &SystemDefinition) -> Result<Vec<PackageEntry>, RemoteError> {
        let mut entries = Vec::new();
        let mut seen = HashSet::new();
        for url in &system.urls {
            let html = self.remote.fetch_text(url)?;
            let before = entries.len();
            entries.extend(
                parse_listing(&html)
                    .into_iter()
                    .filter(|row| system.accepts(&row.name))
                    .filter(|row| {
                        // First listing to name a file wins.
                        let fresh = seen.insert(row.name.clone());
                        if !fresh {
                            debug!("{}: {} already listed, ignoring {}", system.id, row.name, url);
                        }
                        fresh
                    })
                    .map(|row| PackageEntry {
                        name: row.name,
                        link: row.link,
                        size_str: row.size_str,
                        size_bytes: row.size_bytes,
                        system: system.id.clone(),
                        base: url.clone(),
                    }),
            );
            debug!("{}: {} packages from {}", system.id, entries.len() - before, url);
        }
        Ok(entries)
    }
}

/// Flatten a fetch pass into the catalog that replaces the previous one.
pub fn into_catalog(results: &[SystemFetch]) -> Vec<PackageEntry> {
    results.iter().flat_map(|result| result.entries.iter().cloned()).collect()
}
