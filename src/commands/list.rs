use crate::error::AppError;
use crate::model::{InstalledFile, by_system};
use crate::scanner::Scanner;

use super::{load_context, print_item, print_system_header, print_total};

pub fn execute_list() -> Result<(), AppError> {
    let (settings, systems) = load_context()?;
    let installed = Scanner::new(&settings)?.scan_installed(&systems)?;
    if installed.is_empty() {
        println!("No games installed.");
        return Ok(());
    }

    let refs: Vec<&InstalledFile> = installed.iter().collect();
    for (system, files) in by_system(&refs) {
        print_system_header(&system, files.len(), files.iter().map(|file| file.size).sum());
        for file in files {
            print_item(file.name(), file.size, "");
        }
    }
    print_total(installed.iter().map(|file| file.size).sum(), installed.len(), "games");
    Ok(())
}
