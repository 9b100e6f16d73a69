use std::path::Path;

use crate::catalog;
use crate::config::catalog_file_path;
use crate::error::AppError;
use crate::fetcher::{CatalogFetcher, SystemFetch, into_catalog};
use crate::model::Systems;
use crate::progress::{Progress, run_with_bar};
use crate::remote::{HttpRemote, Remote};
use crate::size;

use super::load_context;

pub fn execute_update() -> Result<(), AppError> {
    let (settings, systems) = load_context()?;
    let remote = HttpRemote::new()?;
    let results =
        update_catalog(&remote, &systems, settings.fetch_workers, &catalog_file_path()?)?;

    for result in &results {
        match &result.error {
            None => {
                let bytes: u64 = result.entries.iter().map(|entry| entry.size_bytes).sum();
                println!(
                    "✓ {:>10} [{}] ({})",
                    size::format(bytes),
                    result.system,
                    result.entries.len()
                );
            }
            Some(err) => println!("✗ {:>10} [{}] {}", "-", result.system, err),
        }
    }
    Ok(())
}

/// Fetch every listing and replace the catalog file with the result.
pub fn update_catalog(
    remote: &dyn Remote,
    systems: &Systems,
    workers: usize,
    catalog_path: &Path,
) -> Result<Vec<SystemFetch>, AppError> {
    let progress = Progress::new(systems.len());
    let fetcher = CatalogFetcher::new(remote, workers);
    let mut results = run_with_bar("Updating", &progress, || fetcher.fetch_all(systems, &progress))?;
    results.sort_by(|a, b| a.system.cmp(&b.system));

    catalog::save(catalog_path, &into_catalog(&results))?;
    Ok(results)
}
