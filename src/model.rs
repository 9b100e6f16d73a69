use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::InstallError;
use crate::size;

/// Archive extensions accepted for every system regardless of its native formats.
pub const ARCHIVE_EXTENSIONS: [&str; 4] = ["zip", "7z", "tar.xz", "rar"];

/// One platform from `systems.json`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SystemDefinition {
    #[serde(skip)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, rename = "url")]
    pub urls: Vec<String>,
    #[serde(default, rename = "format")]
    pub formats: Vec<String>,
}

impl SystemDefinition {
    /// True when `extension` (without dot) is one of the system's native formats.
    pub fn is_native(&self, extension: &str) -> bool {
        self.formats.iter().any(|format| format.eq_ignore_ascii_case(extension))
    }

    /// Whether a listing row with this filename belongs in the catalog.
    pub fn accepts(&self, filename: &str) -> bool {
        let lower = filename.to_ascii_lowercase();
        self.formats
            .iter()
            .map(|format| format.to_ascii_lowercase())
            .chain(ARCHIVE_EXTENSIONS.iter().map(|ext| ext.to_string()))
            .any(|ext| lower.ends_with(&format!(".{ext}")))
    }
}

/// The configured systems keyed by id.
#[derive(Debug, Clone, Default)]
pub struct Systems {
    systems: BTreeMap<String, SystemDefinition>,
}

impl Systems {
    pub fn new(systems: BTreeMap<String, SystemDefinition>) -> Self {
        let systems = systems
            .into_iter()
            .map(|(id, mut definition)| {
                definition.id = id.clone();
                (id, definition)
            })
            .collect();
        Self { systems }
    }

    pub fn get(&self, id: &str) -> Option<&SystemDefinition> {
        self.systems.get(id)
    }

    /// Case-insensitive lookup returning the canonical id.
    pub fn resolve(&self, token: &str) -> Option<&str> {
        self.systems.keys().find(|id| id.eq_ignore_ascii_case(token)).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &SystemDefinition> {
        self.systems.values()
    }

    pub fn len(&self) -> usize {
        self.systems.len()
    }

    pub fn is_empty(&self) -> bool {
        self.systems.is_empty()
    }
}

impl FromIterator<SystemDefinition> for Systems {
    fn from_iter<I: IntoIterator<Item = SystemDefinition>>(iter: I) -> Self {
        Systems::new(iter.into_iter().map(|system| (system.id.clone(), system)).collect())
    }
}

/// A downloadable file discovered in a directory listing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PackageEntry {
    pub name: String,
    pub link: String,
    pub size_str: String,
    pub size_bytes: u64,
    pub system: String,
    pub base: String,
}

impl PackageEntry {
    pub fn new(system: &str, base: &str, name: &str, link: &str, size_str: &str) -> Self {
        PackageEntry {
            name: name.to_string(),
            link: link.to_string(),
            size_str: size_str.to_string(),
            size_bytes: size::parse(size_str),
            system: system.to_string(),
            base: base.to_string(),
        }
    }

    pub fn url(&self) -> String {
        format!("{}/{}", self.base.trim_end_matches('/'), self.link)
    }
}

/// A file currently present under the install root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstalledFile {
    pub path: PathBuf,
    pub system: String,
    pub size: u64,
}

impl InstalledFile {
    pub fn name(&self) -> &str {
        self.path.file_name().and_then(|name| name.to_str()).unwrap_or_default()
    }
}

/// Records that can be narrowed by a search query.
pub trait Searchable {
    fn system(&self) -> &str;
    fn name(&self) -> &str;
    fn size(&self) -> u64;
}

impl Searchable for PackageEntry {
    fn system(&self) -> &str {
        &self.system
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn size(&self) -> u64 {
        self.size_bytes
    }
}

impl Searchable for InstalledFile {
    fn system(&self) -> &str {
        &self.system
    }

    fn name(&self) -> &str {
        InstalledFile::name(self)
    }

    fn size(&self) -> u64 {
        self.size
    }
}

/// Group records by system id, keeping input order inside each group.
pub fn by_system<'a, T: Searchable>(records: &[&'a T]) -> BTreeMap<String, Vec<&'a T>> {
    let mut groups: BTreeMap<String, Vec<&'a T>> = BTreeMap::new();
    for record in records {
        groups.entry(record.system().to_string()).or_default().push(*record);
    }
    groups
}

/// Filename without its extension; `.tar.xz` counts as a single extension.
pub fn file_stem(name: &str) -> &str {
    let lower = name.to_ascii_lowercase();
    if lower.ends_with(".tar.xz") {
        return &name[..name.len() - ".tar.xz".len()];
    }
    Path::new(name).file_stem().and_then(|stem| stem.to_str()).unwrap_or(name)
}

#[derive(Debug)]
pub enum JobStatus {
    Done,
    Skipped,
    Failed(InstallError),
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobStatus::Done => write!(f, "done"),
            JobStatus::Skipped => write!(f, "skipped"),
            JobStatus::Failed(_) => write!(f, "error"),
        }
    }
}

/// The `(status, entry, detail)` result of one install job.
#[derive(Debug)]
pub struct InstallOutcome {
    pub entry: PackageEntry,
    pub status: JobStatus,
}

impl InstallOutcome {
    pub fn detail(&self) -> Option<String> {
        match &self.status {
            JobStatus::Failed(err) => Some(err.to_string()),
            _ => None,
        }
    }
}

#[derive(Debug, Default)]
pub struct BatchReport {
    pub outcomes: Vec<InstallOutcome>,
}

impl BatchReport {
    pub fn done(&self) -> usize {
        self.count(|status| matches!(status, JobStatus::Done))
    }

    pub fn skipped(&self) -> usize {
        self.count(|status| matches!(status, JobStatus::Skipped))
    }

    pub fn failed(&self) -> usize {
        self.count(|status| matches!(status, JobStatus::Failed(_)))
    }

    pub fn failures(&self) -> impl Iterator<Item = &InstallOutcome> {
        self.outcomes.iter().filter(|outcome| matches!(outcome.status, JobStatus::Failed(_)))
    }

    fn count(&self, predicate: impl Fn(&JobStatus) -> bool) -> usize {
        self.outcomes.iter().filter(|outcome| predicate(&outcome.status)).count()
    }
}
