//! Duplicate detection over the install root.
//!
//! Files are grouped by system, directory, title and extension, so files in
//! different game folders are never compared. Within a group every
//! candidate is scored from its tags and the best one is kept. Computing a
//! plan never touches the disk.

mod tables;
mod tags;

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

use regex::{Regex, RegexBuilder};
use tracing::debug;

use crate::error::AppError;
use crate::model::InstalledFile;

pub use tables::{RankingTables, RegionCode, StateRule};
pub use tags::{Tag, TagKind, extract_tags, title_of};

/// System, containing directory, lowercase title, lowercase extension.
type GroupKey = (String, PathBuf, String, String);

const UNKNOWN_REGION: &str = "Unknown";
const COLLECTION_PENALTY: i32 = 30;
const DATE_PENALTY: i32 = 10;
const BIOS_PENALTY: i32 = 1000;
const REGION_ONLY_BONUS: i32 = 10;
const WORLD_BONUS: i32 = 5;

static VERSION_RE: std::sync::LazyLock<Regex> =
    std::sync::LazyLock::new(|| Regex::new(r"\d+(?:\.\d+)*").expect("version pattern compiles"));

/// A file annotated with everything the ranking looks at.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub file: InstalledFile,
    pub tags: Vec<Tag>,
    pub regions: Vec<String>,
    pub disc: u32,
    pub state: String,
    /// Position of `state` in the state table; higher is better.
    pub build_rank: usize,
    pub version: Vec<u32>,
    pub purity: i32,
    /// Position of the best region in the priority list; lower is better.
    pub region_rank: usize,
    pub bios: bool,
}

#[derive(Debug, Clone)]
pub struct GroupDecision {
    pub system: String,
    pub title: String,
    pub keep: Vec<Candidate>,
    pub delete: Vec<Candidate>,
}

#[derive(Debug, Clone, Default)]
pub struct DedupePlan {
    pub groups: Vec<GroupDecision>,
}

impl DedupePlan {
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn deletions(&self) -> impl Iterator<Item = &Candidate> {
        self.groups.iter().flat_map(|group| &group.delete)
    }

    pub fn delete_count(&self) -> usize {
        self.deletions().count()
    }

    pub fn delete_bytes(&self) -> u64 {
        self.deletions().map(|candidate| candidate.file.size).sum()
    }
}

struct CompiledRegion {
    code: String,
    names: Vec<String>,
}

struct CompiledState {
    name: String,
    patterns: Vec<Regex>,
    flags: Vec<Regex>,
}

impl CompiledState {
    fn matches(&self, tag: &Tag) -> bool {
        self.patterns.iter().any(|re| re.is_match(&tag.text))
            || (tag.square && self.flags.iter().any(|re| re.is_match(&tag.text)))
    }
}

pub struct Ranker {
    regions: Vec<CompiledRegion>,
    states: Vec<CompiledState>,
    collections: Vec<Regex>,
    dates: Vec<Regex>,
    bios: Vec<Regex>,
    disc: Option<Regex>,
    world: String,
    priority: Vec<String>,
}

impl Ranker {
    /// `priority` lists preferred regions best first, by code or alias.
    pub fn new(tables: &RankingTables, priority: &[String]) -> Result<Self, AppError> {
        let regions: Vec<CompiledRegion> = tables
            .regions
            .iter()
            .map(|region| CompiledRegion {
                code: region.code.clone(),
                names: std::iter::once(&region.code)
                    .chain(&region.aliases)
                    .map(|name| name.to_lowercase())
                    .collect(),
            })
            .collect();

        let states = tables
            .states
            .iter()
            .map(|rule| {
                Ok(CompiledState {
                    name: rule.name.clone(),
                    patterns: compile_all(&rule.patterns)?,
                    flags: compile_all(&rule.flags)?,
                })
            })
            .collect::<Result<Vec<_>, regex::Error>>()?;

        let mut prefixes: Vec<String> =
            tables.disc_prefixes.iter().map(|prefix| regex::escape(prefix)).collect();
        // Longest first so "volume" wins over "vol".
        prefixes.sort_by_key(|prefix| std::cmp::Reverse(prefix.len()));
        let disc = if prefixes.is_empty() {
            None
        } else {
            Some(case_insensitive(&format!(
                r"^(?:{})\.?\s*([0-9]+|[a-z])\b",
                prefixes.join("|")
            ))?)
        };

        let mut ranker = Ranker {
            states,
            collections: compile_all(&tables.collection_patterns)?,
            dates: compile_all(&tables.date_patterns)?,
            bios: compile_all(&tables.bios_patterns)?,
            disc,
            world: tables.world_region.clone(),
            priority: Vec::new(),
            regions,
        };
        ranker.priority = priority
            .iter()
            .map(|entry| ranker.region_code(entry, false).unwrap_or_else(|| entry.clone()))
            .collect();
        Ok(ranker)
    }

    pub fn classify(&self, tag: &Tag) -> TagKind {
        if let Some(disc) = self.disc_index(tag) {
            return TagKind::Disc(disc);
        }
        if let Some(code) = self.region_code(&tag.text, tag.square) {
            return TagKind::Region(code);
        }
        if let Some(state) = self.states.iter().find(|state| state.matches(tag)) {
            return TagKind::Release { state: state.name.clone(), version: version_of(&tag.text) };
        }
        TagKind::Unclassified
    }

    pub fn candidate(&self, file: InstalledFile) -> Candidate {
        let name = file.path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
        let tags = extract_tags(&name);

        let mut regions = Vec::new();
        let mut disc = 0;
        let mut region_tags = 0;
        for tag in &tags {
            match self.classify(tag) {
                TagKind::Region(code) => {
                    region_tags += 1;
                    if !regions.contains(&code) {
                        regions.push(code);
                    }
                }
                TagKind::Disc(index) if disc == 0 => disc = index,
                _ => {}
            }
        }
        if regions.is_empty() {
            regions.push(UNKNOWN_REGION.to_string());
        }

        // Scan states strongest first; the first one any tag carries wins.
        let official = self.states.len().saturating_sub(1);
        let (build_rank, state, version) = self
            .states
            .iter()
            .enumerate()
            .find_map(|(rank, state)| {
                tags.iter()
                    .find(|tag| state.matches(tag))
                    .map(|tag| (rank, state.name.clone(), version_of(&tag.text)))
            })
            .unwrap_or_else(|| {
                let name = self.states.last().map(|s| s.name.clone()).unwrap_or_default();
                (official, name, Vec::new())
            });

        let bios = tags.iter().any(|tag| self.bios.iter().any(|re| re.is_match(&tag.text)));
        let lower = name.to_lowercase();
        let mut purity = 0;
        if self.collections.iter().any(|re| re.is_match(&lower)) {
            purity -= COLLECTION_PENALTY;
        }
        if tags.iter().any(|tag| self.dates.iter().any(|re| re.is_match(&tag.text))) {
            purity -= DATE_PENALTY;
        }
        if bios {
            purity -= BIOS_PENALTY;
        }
        if !tags.is_empty() && region_tags == tags.len() {
            purity += REGION_ONLY_BONUS;
        }
        if regions.iter().any(|code| code.eq_ignore_ascii_case(&self.world)) {
            purity += WORLD_BONUS;
        }

        let region_rank = self.region_rank(&regions);
        Candidate {
            file,
            tags,
            regions,
            disc,
            state,
            build_rank,
            version,
            purity,
            region_rank,
            bios,
        }
    }

    /// Sort best first.
    pub fn rank(&self, mut candidates: Vec<Candidate>) -> Vec<Candidate> {
        candidates.sort_by(compare);
        candidates
    }

    /// Group `files` and decide keepers. Only groups with deletions are returned.
    pub fn plan(&self, files: Vec<InstalledFile>) -> DedupePlan {
        // Titles compare case-insensitively; the first spelling seen is shown.
        let mut groups: BTreeMap<GroupKey, (String, Vec<Candidate>)> = BTreeMap::new();
        for file in files {
            let title = title_of(file.name());
            let extension = file
                .path
                .extension()
                .map(|ext| ext.to_string_lossy().to_lowercase())
                .unwrap_or_default();
            let dir = file.path.parent().map(PathBuf::from).unwrap_or_default();
            let key = (file.system.clone(), dir, title.to_lowercase(), extension);
            let group = groups.entry(key).or_insert_with(|| (title, Vec::new()));
            group.1.push(self.candidate(file));
        }

        let mut plan = DedupePlan::default();
        for ((system, ..), (title, members)) in groups {
            if members.len() < 2 {
                continue;
            }
            let mut decision =
                GroupDecision { system, title, keep: Vec::new(), delete: Vec::new() };
            for partition in partition_by_disc(members) {
                let mut ranked = self.rank(partition).into_iter();
                if let Some(keeper) = ranked.next() {
                    decision.keep.push(keeper);
                }
                decision.delete.extend(ranked);
            }
            if !decision.delete.is_empty() {
                debug!(
                    "{}: keeping {} of {} candidates",
                    decision.title,
                    decision.keep.len(),
                    decision.keep.len() + decision.delete.len()
                );
                plan.groups.push(decision);
            }
        }
        plan
    }

    fn region_code(&self, text: &str, square: bool) -> Option<String> {
        let lower = text.to_lowercase();
        self.regions
            .iter()
            .find(|region| {
                region.names.iter().any(|name| *name == lower && (name.len() > 1 || !square))
            })
            .map(|region| region.code.clone())
    }

    fn region_rank(&self, regions: &[String]) -> usize {
        regions
            .iter()
            .map(|code| {
                if code == UNKNOWN_REGION {
                    self.priority.len() + 1
                } else {
                    self.priority
                        .iter()
                        .position(|preferred| preferred.eq_ignore_ascii_case(code))
                        .unwrap_or(self.priority.len())
                }
            })
            .min()
            .unwrap_or(self.priority.len() + 1)
    }

    fn disc_index(&self, tag: &Tag) -> Option<u32> {
        let caps = self.disc.as_ref()?.captures(&tag.text)?;
        let value = caps.get(1)?.as_str();
        match value.parse::<u32>() {
            Ok(index) => Some(index),
            Err(_) => value.chars().next().map(letter_ordinal),
        }
    }
}

/// Best candidate first: non-BIOS, build state, purity, region, version,
/// size, disc index, then path for a stable result.
fn compare(a: &Candidate, b: &Candidate) -> Ordering {
    a.bios
        .cmp(&b.bios)
        .then_with(|| b.build_rank.cmp(&a.build_rank))
        .then_with(|| b.purity.cmp(&a.purity))
        .then_with(|| a.region_rank.cmp(&b.region_rank))
        .then_with(|| b.version.cmp(&a.version))
        .then_with(|| b.file.size.cmp(&a.file.size))
        .then_with(|| b.disc.cmp(&a.disc))
        .then_with(|| a.file.path.cmp(&b.file.path))
}

/// Distinct non-zero disc indices are separate parts of one title, never
/// duplicates of each other.
fn partition_by_disc(members: Vec<Candidate>) -> Vec<Vec<Candidate>> {
    let discs: BTreeSet<u32> =
        members.iter().map(|candidate| candidate.disc).filter(|disc| *disc != 0).collect();
    if discs.len() < 2 {
        return vec![members];
    }
    let mut partitions: BTreeMap<u32, Vec<Candidate>> = BTreeMap::new();
    for candidate in members {
        partitions.entry(candidate.disc).or_default().push(candidate);
    }
    partitions.into_values().collect()
}

fn version_of(text: &str) -> Vec<u32> {
    if let Some(found) = VERSION_RE.find_iter(text).last() {
        return found.as_str().split('.').filter_map(|part| part.parse().ok()).collect();
    }
    let words: Vec<&str> = text.split_whitespace().collect();
    match words.as_slice() {
        [_, .., last] if last.len() == 1 => last.chars().next().map(letter_ordinal).into_iter().collect(),
        _ => Vec::new(),
    }
}

fn letter_ordinal(letter: char) -> u32 {
    let lower = letter.to_ascii_lowercase();
    if lower.is_ascii_lowercase() { lower as u32 - 'a' as u32 + 1 } else { 0 }
}

fn case_insensitive(pattern: &str) -> Result<Regex, regex::Error> {
    RegexBuilder::new(pattern).case_insensitive(true).build()
}

fn compile_all(patterns: &[String]) -> Result<Vec<Regex>, regex::Error> {
    patterns.iter().map(|pattern| case_insensitive(pattern)).collect()
}
