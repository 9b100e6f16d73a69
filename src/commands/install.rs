use crate::catalog;
use crate::config::catalog_file_path;
use crate::error::AppError;
use crate::installer::InstallScheduler;
use crate::model::{PackageEntry, by_system};
use crate::progress::{Progress, run_with_bar};
use crate::query::Query;
use crate::remote::HttpRemote;

use super::{confirm, load_context, print_item, print_system_header, print_total};

pub struct InstallOptions {
    pub query: Vec<String>,
    pub assume_yes: bool,
}

pub fn execute_install(options: InstallOptions) -> Result<(), AppError> {
    let (settings, systems) = load_context()?;
    let packages = catalog::load(&catalog_file_path()?)?;

    let query = Query::parse(&options.query, &systems);
    let selected: Vec<&PackageEntry> = query.filter(&packages);
    if selected.is_empty() {
        println!("No packages found.");
        return Ok(());
    }

    for (system, entries) in by_system(&selected) {
        let bytes = entries.iter().map(|entry| entry.size_bytes).sum();
        print_system_header(&system, entries.len(), bytes);
        for entry in entries {
            print_item(&entry.name, entry.size_bytes, "");
        }
    }
    print_total(selected.iter().map(|entry| entry.size_bytes).sum(), selected.len(), "packages");

    if !confirm("Do you want to continue?", options.assume_yes)? {
        println!("Abort.");
        return Ok(());
    }

    let selected: Vec<PackageEntry> = selected.into_iter().cloned().collect();
    let remote = HttpRemote::new()?;
    let scheduler =
        InstallScheduler::new(&remote, &systems, settings.roms_root()?, settings.install_workers);
    let progress = Progress::new(selected.len());
    let report = run_with_bar("Installing", &progress, || scheduler.install(&selected, &progress))?;

    print!("✓ {} installed, ✗ {} failed", report.done(), report.failed());
    if report.skipped() > 0 {
        print!(", {} already installed", report.skipped());
    }
    println!();
    for outcome in report.failures() {
        println!("✗ {}: {}", outcome.entry.name, outcome.detail().unwrap_or_default());
    }
    Ok(())
}
