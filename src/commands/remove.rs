use crate::error::AppError;
use crate::path::display_path;
use crate::query::Query;
use crate::scanner::Scanner;
use crate::uninstall::UninstallPlan;

use super::{confirm, load_context, print_item, print_system_header, print_total};

pub struct RemoveOptions {
    pub query: Vec<String>,
    pub assume_yes: bool,
}

pub fn execute_remove(options: RemoveOptions) -> Result<(), AppError> {
    let (settings, systems) = load_context()?;
    let scanner = Scanner::new(&settings)?;
    let query = Query::parse(&options.query, &systems);

    let plan = UninstallPlan::build(&scanner, &systems, &query)?;
    if plan.is_empty() {
        println!("No games found to remove.");
        return Ok(());
    }

    for (system, (files, bytes)) in plan.by_system() {
        print_system_header(&system, files.len(), bytes);
        for file in files {
            print_item(file.name(), file.size, "");
        }
    }
    print_total(plan.total_bytes(), plan.files.len(), "games");

    if !confirm("Do you want to remove these games?", options.assume_yes)? {
        println!("Abort.");
        return Ok(());
    }

    let failures = plan.execute(&scanner);
    for (path, err) in &failures {
        eprintln!("✗ {}: {}", display_path(path), err);
    }
    println!("{} games removed", plan.files.len() - failures.len());
    Ok(())
}
