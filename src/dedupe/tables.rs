//! Ordered lookup tables behind duplicate ranking.
//!
//! The tables are plain data so they can be overridden from the `[ranking]`
//! section of `settings.toml`; the order of `states` is the tie-break order.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionCode {
    pub code: String,
    /// Abbreviations and alternative names. Single-letter aliases only match
    /// parenthesized tags, since bracketed letters are dump flags.
    #[serde(default)]
    pub aliases: Vec<String>,
}

/// A release state and the tag patterns that identify it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateRule {
    pub name: String,
    /// Case-insensitive regexes matched against any tag.
    #[serde(default)]
    pub patterns: Vec<String>,
    /// Case-insensitive regexes matched against `[bracketed]` tags only.
    #[serde(default)]
    pub flags: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RankingTables {
    pub regions: Vec<RegionCode>,
    /// Strongest marker first; the last entry is the official release and
    /// also stands for files without any release tag.
    pub states: Vec<StateRule>,
    /// Regexes over the lowercase filename marking multi-game compilations.
    pub collection_patterns: Vec<String>,
    /// Regexes over single tags marking dated revisions.
    pub date_patterns: Vec<String>,
    /// Regexes over single tags marking BIOS images.
    pub bios_patterns: Vec<String>,
    pub disc_prefixes: Vec<String>,
    pub world_region: String,
}

impl Default for RankingTables {
    fn default() -> Self {
        RankingTables {
            regions: default_regions(),
            states: default_states(),
            collection_patterns: strings(&[
                r"\bcompilation\b",
                r"\bcollection\b",
                r"\banthology\b",
                r"\b\d+\s*-?\s*in\s*-?\s*1\b",
                r"\bmulti-?cart\b",
                r"\bdouble pack\b",
                r"\bcombo pack\b",
            ]),
            date_patterns: strings(&[r"^\d{4}-\d{2}-\d{2}$", r"^\d{4}-\d{2}$", r"^\d{8}$"]),
            bios_patterns: strings(&[r"^bios$", r"\bbios\b"]),
            disc_prefixes: strings(&["disc", "disk", "cd", "volume", "vol", "side", "part", "tape"]),
            world_region: "World".to_string(),
        }
    }
}

fn default_regions() -> Vec<RegionCode> {
    let table: &[(&str, &[&str])] = &[
        ("World", &["w", "wor"]),
        ("USA", &["u", "us", "america", "ntsc-u"]),
        ("Europe", &["e", "eu", "eur", "pal"]),
        ("Japan", &["j", "jp", "jpn", "ntsc-j"]),
        ("Asia", &["as"]),
        ("Australia", &["a", "au", "aus"]),
        ("Brazil", &["b", "br", "bra"]),
        ("Canada", &["c", "ca", "can"]),
        ("China", &["ch", "cn", "chn"]),
        ("France", &["f", "fr", "fra"]),
        ("Germany", &["g", "de", "ger", "deu"]),
        ("Hong Kong", &["hk"]),
        ("Italy", &["i", "it", "ita"]),
        ("Korea", &["k", "kr", "kor"]),
        ("Netherlands", &["h", "nl", "hol"]),
        ("Russia", &["r", "ru", "rus"]),
        ("Spain", &["s", "es", "spa"]),
        ("Sweden", &["sw", "se", "swe"]),
        ("Taiwan", &["tw", "twn"]),
        ("United Kingdom", &["uk", "gb"]),
    ];
    table
        .iter()
        .map(|(code, aliases)| RegionCode { code: code.to_string(), aliases: strings(aliases) })
        .collect()
}

fn default_states() -> Vec<StateRule> {
    let table: &[(&str, &[&str], &[&str])] = &[
        ("unlicensed", &[r"^unl(icensed)?$"], &[]),
        ("pirate", &[r"^pirate$"], &[r"^p\d*$"]),
        ("bootleg", &[r"^bootleg$", r"^hack\b"], &[r"^h\d*[a-z]*$"]),
        ("demo", &[r"^demo\b", r"^kiosk\b"], &[]),
        ("sample", &[r"^sample\b"], &[]),
        ("promo", &[r"^promo\b"], &[]),
        ("alpha", &[r"^alpha\b"], &[]),
        ("beta", &[r"^beta\b"], &[]),
        ("prototype", &[r"^proto(type)?\b"], &[]),
        ("revision", &[r"^rev(ision)?\b"], &[]),
        ("version", &[r"^v(ersion)?\s*\d"], &[]),
        ("overdump", &[r"^overdump$"], &[r"^o\d*$"]),
        ("official", &[r"^official$", r"^verified$"], &[r"^!$"]),
    ];
    table
        .iter()
        .map(|(name, patterns, flags)| StateRule {
            name: name.to_string(),
            patterns: strings(patterns),
            flags: strings(flags),
        })
        .collect()
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| value.to_string()).collect()
}
