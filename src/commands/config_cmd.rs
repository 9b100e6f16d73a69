use std::path::Path;
use std::process::Command;

use crate::config::{Settings, config_file_path, ensure_config_file, systems_file_path};
use crate::error::AppError;
use crate::path::display_path;

pub struct ConfigOptions {
    pub show_path: bool,
    pub edit: bool,
    pub add_exclude: Option<String>,
}

pub fn execute_config(options: ConfigOptions) -> Result<(), AppError> {
    if options.show_path {
        print_paths()?;
    }

    if let Some(ref pattern) = options.add_exclude {
        let mut settings = Settings::load()?;
        settings.append_exclude(pattern.clone());
        settings.save()?;
        println!("Added exclude pattern '{}'.", pattern);
    }

    if options.edit {
        let path = ensure_config_file()?;
        open_editor(&path)?;
    }

    if !options.show_path && options.add_exclude.is_none() && !options.edit {
        print_paths()?;
    }

    Ok(())
}

fn print_paths() -> Result<(), AppError> {
    println!("Configuration file: {}", display_path(&config_file_path()?));
    println!("Systems file: {}", display_path(&systems_file_path()?));
    Ok(())
}

fn open_editor(path: &Path) -> Result<(), AppError> {
    let editor = std::env::var("EDITOR")
        .or_else(|_| std::env::var("VISUAL"))
        .unwrap_or_else(|_| "nano".to_string());

    let status = Command::new(&editor)
        .arg(path)
        .status()
        .map_err(|err| AppError::Editor(err.to_string()))?;

    if status.success() {
        Ok(())
    } else {
        Err(AppError::Editor(format!("Editor exited with status {}", status)))
    }
}
