use std::collections::BTreeMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use dirs_next as dirs;
use globset::{Glob, GlobSet};
use serde::{Deserialize, Serialize};

use crate::dedupe::RankingTables;
use crate::error::AppError;
use crate::model::{SystemDefinition, Systems};

pub const SETTINGS_FILE: &str = "settings.toml";
pub const SYSTEMS_FILE: &str = "systems.json";
pub const CATALOG_FILE: &str = "packages.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub roms_dir: String,
    pub fetch_workers: usize,
    pub install_workers: usize,
    pub compress_workers: usize,
    /// Region priority for duplicate ranking, best first.
    pub regions: Vec<String>,
    pub exclude: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ranking: Option<RankingTables>,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            roms_dir: "~/roms".to_string(),
            fetch_workers: 10,
            install_workers: 20,
            compress_workers: 4,
            regions: ["World", "USA", "Europe", "Japan"].iter().map(|r| r.to_string()).collect(),
            exclude: Vec::new(),
            ranking: None,
        }
    }
}

impl Settings {
    pub fn load() -> Result<Self, AppError> {
        let path = config_file_path()?;
        if path.exists() {
            let contents = fs::read_to_string(&path)?;
            let settings: Settings = toml::from_str(&contents)?;
            Ok(settings)
        } else {
            Ok(Settings::default())
        }
    }

    pub fn save(&self) -> Result<(), AppError> {
        let path = config_file_path()?;
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }
        let mut file = fs::File::create(path)?;
        let contents = toml::to_string_pretty(self)?;
        file.write_all(contents.as_bytes())?;
        Ok(())
    }

    pub fn append_exclude(&mut self, value: String) {
        if !self.exclude.iter().any(|existing| existing == &value) {
            self.exclude.push(value);
        }
    }

    pub fn compile_excludes(&self) -> Result<Option<GlobSet>, AppError> {
        if self.exclude.is_empty() {
            return Ok(None);
        }

        let mut builder = globset::GlobSetBuilder::new();
        for pattern in &self.exclude {
            let expanded = expand_home(pattern)?;
            builder.add(Glob::new(&expanded)?);
        }

        Ok(Some(builder.build()?))
    }

    /// The install root with `~` expanded.
    pub fn roms_root(&self) -> Result<PathBuf, AppError> {
        expand_home(&self.roms_dir).map(PathBuf::from)
    }

    pub fn ranking_tables(&self) -> RankingTables {
        self.ranking.clone().unwrap_or_default()
    }
}

pub fn config_dir() -> Result<PathBuf, AppError> {
    let config_root = std::env::var_os("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .or_else(dirs::config_dir)
        .ok_or_else(|| {
            AppError::config("Unable to determine configuration directory for this platform")
        })?;
    Ok(config_root.join("retro"))
}

pub fn config_file_path() -> Result<PathBuf, AppError> {
    Ok(config_dir()?.join(SETTINGS_FILE))
}

pub fn systems_file_path() -> Result<PathBuf, AppError> {
    Ok(config_dir()?.join(SYSTEMS_FILE))
}

pub fn catalog_file_path() -> Result<PathBuf, AppError> {
    Ok(config_dir()?.join(CATALOG_FILE))
}

pub fn ensure_config_file() -> Result<PathBuf, AppError> {
    let path = config_file_path()?;
    if !path.exists() {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }
        let default = Settings::default();
        let contents = toml::to_string_pretty(&default)?;
        fs::write(&path, contents)?;
    }
    Ok(path)
}

/// Read the system map from `systems.json`.
pub fn load_systems(path: &Path) -> Result<Systems, AppError> {
    let contents = fs::read_to_string(path).map_err(|err| match err.kind() {
        io::ErrorKind::NotFound => {
            AppError::config(format!("Could not load {}: file not found", path.display()))
        }
        _ => AppError::Io(err),
    })?;
    let systems: BTreeMap<String, SystemDefinition> = serde_json::from_str(&contents)
        .map_err(|err| AppError::config(format!("Could not parse {}: {err}", path.display())))?;
    Ok(Systems::new(systems))
}

fn expand_home(value: &str) -> Result<String, AppError> {
    if !value.starts_with('~') {
        return Ok(value.to_string());
    }
    let home_dir = dirs::home_dir().ok_or_else(|| {
        AppError::config("Unable to expand '~' because the home directory is unknown")
    })?;
    if value == "~" {
        Ok(home_dir.display().to_string())
    } else if let Some(stripped) = value.strip_prefix("~/") {
        Ok(home_dir.join(stripped).display().to_string())
    } else {
        Ok(value.to_string())
    }
}
