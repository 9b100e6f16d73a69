use crate::catalog;
use crate::config::catalog_file_path;
use crate::error::AppError;
use crate::model::{PackageEntry, by_system};
use crate::query::{InstalledIndex, Query};
use crate::scanner::Scanner;

use super::{load_context, print_item, print_total};

pub struct SearchOptions {
    pub query: Vec<String>,
}

pub fn execute_search(options: SearchOptions) -> Result<(), AppError> {
    let (settings, systems) = load_context()?;
    let packages = catalog::load(&catalog_file_path()?)?;

    let query = Query::parse(&options.query, &systems);
    let found: Vec<&PackageEntry> = query.filter(&packages);
    if found.is_empty() {
        println!("No packages found.");
        return Ok(());
    }

    let installed = Scanner::new(&settings)?.scan_installed(&systems)?;
    let index = InstalledIndex::new(&installed);

    for (system, entries) in by_system(&found) {
        let bytes: u64 = entries.iter().map(|entry| entry.size_bytes).sum();
        let present = entries.iter().filter(|entry| index.is_installed(entry)).count();
        println!(
            "[{system}] {} ({}, {present} installed)",
            crate::size::format(bytes),
            entries.len()
        );
        for entry in entries {
            let marker = if index.is_installed(entry) { " [installed]" } else { "" };
            print_item(&entry.name, entry.size_bytes, marker);
        }
    }
    print_total(found.iter().map(|entry| entry.size_bytes).sum(), found.len(), "packages");
    Ok(())
}
