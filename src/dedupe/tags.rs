use std::sync::LazyLock;

use regex::Regex;

use crate::model::file_stem;

static TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\[(]([^\])]+)[\])]").expect("tag pattern compiles"));

/// A comma-separated token from a `(...)` or `[...]` filename segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    pub text: String,
    /// Came from square brackets, where single letters are dump flags.
    pub square: bool,
}

/// What a tag says about the file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagKind {
    Region(String),
    Release { state: String, version: Vec<u32> },
    Disc(u32),
    Unclassified,
}

pub fn extract_tags(name: &str) -> Vec<Tag> {
    TAG_RE
        .captures_iter(name)
        .flat_map(|caps| {
            let square = caps.get(0).is_some_and(|m| m.as_str().starts_with('['));
            let inner = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
            inner
                .split(',')
                .map(str::trim)
                .filter(|text| !text.is_empty())
                .map(move |text| Tag { text: text.to_string(), square })
                .collect::<Vec<_>>()
        })
        .collect()
}

/// The grouping title: stem without any bracketed segment, whitespace collapsed.
pub fn title_of(name: &str) -> String {
    let stripped = TAG_RE.replace_all(file_stem(name), " ");
    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}
