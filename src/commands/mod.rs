pub mod autoremove;
pub mod compress;
pub mod config_cmd;
pub mod install;
pub mod list;
pub mod remove;
pub mod search;
pub mod update;

use std::io::{self, Write};

pub use autoremove::execute_autoremove;
pub use compress::execute_compress;
pub use config_cmd::execute_config;
pub use install::execute_install;
pub use list::execute_list;
pub use remove::execute_remove;
pub use search::execute_search;
pub use update::execute_update;

use crate::config::{Settings, load_systems, systems_file_path};
use crate::error::AppError;
use crate::model::Systems;
use crate::size;

/// Settings plus the system map, loaded fresh for one command.
pub(crate) fn load_context() -> Result<(Settings, Systems), AppError> {
    let settings = Settings::load()?;
    let systems = load_systems(&systems_file_path()?)?;
    Ok((settings, systems))
}

/// Ask a `[Y/n]` question. An empty answer means yes; end of input means no.
pub(crate) fn confirm(question: &str, assume_yes: bool) -> Result<bool, AppError> {
    if assume_yes {
        return Ok(true);
    }
    print!("{question} [Y/n] ");
    io::stdout().flush()?;
    let mut input = String::new();
    if io::stdin().read_line(&mut input)? == 0 {
        println!();
        return Ok(false);
    }
    let answer = input.trim().to_ascii_lowercase();
    Ok(matches!(answer.as_str(), "" | "y" | "yes"))
}

pub(crate) fn print_system_header(system: &str, count: usize, bytes: u64) {
    println!("[{system}] {} ({count})", size::format(bytes));
}

pub(crate) fn print_item(name: &str, bytes: u64, suffix: &str) {
    println!("  {name}  {}{suffix}", size::format(bytes));
}

pub(crate) fn print_total(bytes: u64, count: usize, noun: &str) {
    println!("Total: {} ({count} {noun})", size::format(bytes));
}
