//! Search query evaluation over catalog entries and installed files.

use std::collections::{HashMap, HashSet};

use crate::model::{InstalledFile, PackageEntry, Searchable, Systems, file_stem};

/// A parsed search query.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    /// `all <system>`: every record of that system, keywords ignored.
    whole_system: Option<String>,
    systems: Vec<String>,
    include: Vec<String>,
    exclude: Vec<String>,
}

impl Query {
    pub fn parse<S: AsRef<str>>(terms: &[S], systems: &Systems) -> Self {
        let terms: Vec<&str> = terms.iter().map(AsRef::as_ref).collect();

        if let [first, second] = terms.as_slice()
            && first.eq_ignore_ascii_case("all")
            && let Some(id) = systems.resolve(second)
        {
            return Query { whole_system: Some(id.to_lowercase()), ..Query::default() };
        }

        let mut query = Query::default();
        for term in terms {
            if let Some(id) = systems.resolve(term) {
                query.systems.push(id.to_lowercase());
            } else if let Some(keyword) = term.strip_prefix('-') {
                if !keyword.is_empty() {
                    query.exclude.push(keyword.to_lowercase());
                }
            } else {
                query.include.push(term.to_lowercase());
            }
        }
        query
    }

    pub fn matches(&self, system: &str, name: &str) -> bool {
        let system = system.to_lowercase();
        if let Some(whole) = &self.whole_system {
            return system == *whole;
        }

        let name = name.to_lowercase();
        (self.systems.is_empty() || self.systems.contains(&system))
            && self.include.iter().all(|keyword| name.contains(keyword.as_str()))
            && !self.exclude.iter().any(|keyword| name.contains(keyword.as_str()))
    }

    /// Records matching the query, in input order. Empty means nothing matched.
    pub fn filter<'a, T: Searchable>(&self, records: &'a [T]) -> Vec<&'a T> {
        records.iter().filter(|record| self.matches(record.system(), record.name())).collect()
    }
}

/// Names and stems of the files already present per system.
#[derive(Debug, Default)]
pub struct InstalledIndex {
    names: HashMap<String, HashSet<String>>,
    stems: HashMap<String, HashSet<String>>,
}

impl InstalledIndex {
    pub fn new(files: &[InstalledFile]) -> Self {
        let mut index = InstalledIndex::default();
        for file in files {
            let name = file.name();
            index.names.entry(file.system.clone()).or_default().insert(name.to_string());
            index.stems.entry(file.system.clone()).or_default().insert(file_stem(name).to_string());
        }
        index
    }

    /// Exact filename first, then the extension-insensitive stem, since an
    /// archive is usually extracted into files with a different extension.
    pub fn is_installed(&self, entry: &PackageEntry) -> bool {
        let exact = self.names.get(&entry.system).is_some_and(|names| names.contains(&entry.name));
        exact
            || self
                .stems
                .get(&entry.system)
                .is_some_and(|stems| stems.contains(file_stem(&entry.name)))
    }
}
