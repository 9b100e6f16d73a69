use crate::config::Settings;
use crate::dedupe::Ranker;
use crate::error::AppError;
use crate::path::{display_path, file_name};
use crate::scanner::Scanner;
use crate::size;

use super::confirm;

pub struct AutoremoveOptions {
    pub assume_yes: bool,
    /// Region priority overriding the configured one, best first.
    pub regions: Option<Vec<String>>,
    pub verbose: bool,
}

pub fn execute_autoremove(options: AutoremoveOptions) -> Result<(), AppError> {
    let settings = Settings::load()?;
    let scanner = Scanner::new(&settings)?;
    let priority = options.regions.unwrap_or_else(|| settings.regions.clone());
    let ranker = Ranker::new(&settings.ranking_tables(), &priority)?;

    let plan = ranker.plan(scanner.scan_tree(options.verbose));
    if plan.is_empty() {
        println!("No duplicate games found.");
        return Ok(());
    }

    for group in &plan.groups {
        println!("[{}] {}", group.system, group.title);
        for keeper in &group.keep {
            println!("  → Keep   {}", file_name(&keeper.file.path));
        }
        for candidate in &group.delete {
            println!(
                "  → Delete {} ({})",
                file_name(&candidate.file.path),
                size::format(candidate.file.size)
            );
        }
    }
    println!(
        "Total: {} ({} duplicates)",
        size::format(plan.delete_bytes()),
        plan.delete_count()
    );

    if !confirm("Do you want to remove the duplicates?", options.assume_yes)? {
        println!("Abort.");
        return Ok(());
    }

    let failures =
        scanner.delete_files(plan.deletions().map(|candidate| candidate.file.path.as_path()));
    for (path, err) in &failures {
        eprintln!("✗ {}: {}", display_path(path), err);
    }
    let freed: u64 = plan
        .deletions()
        .filter(|candidate| !failures.iter().any(|(path, _)| *path == candidate.file.path))
        .map(|candidate| candidate.file.size)
        .sum();
    println!(
        "{} duplicates removed, {} freed",
        plan.delete_count() - failures.len(),
        size::format(freed)
    );
    Ok(())
}
