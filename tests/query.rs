use std::path::PathBuf;

use retro::model::{InstalledFile, PackageEntry, SystemDefinition, Systems};
use retro::query::{InstalledIndex, Query};

fn systems() -> Systems {
    ["snes", "gba", "psx"]
        .into_iter()
        .map(|id| SystemDefinition {
            id: id.to_string(),
            name: id.to_uppercase(),
            urls: vec![format!("https://example.org/{id}/")],
            formats: vec!["sfc".to_string()],
        })
        .collect()
}

fn entry(system: &str, name: &str) -> PackageEntry {
    PackageEntry::new(system, "https://example.org/", name, name, "1.0MiB")
}

fn catalog() -> Vec<PackageEntry> {
    vec![
        entry("snes", "Super Mario World (USA).zip"),
        entry("snes", "Super Mario Lost Levels (Japan).zip"),
        entry("snes", "Zelda (USA).zip"),
        entry("gba", "Mario Kart (Europe).zip"),
    ]
}

fn names<'a>(found: &[&'a PackageEntry]) -> Vec<&'a str> {
    found.iter().map(|entry| entry.name.as_str()).collect()
}

#[test]
fn all_system_selects_everything_for_that_system() {
    let catalog = catalog();
    let query = Query::parse(&["all", "snes"], &systems());
    let found = query.filter(&catalog);
    assert_eq!(found.len(), 3);
    assert!(found.iter().all(|entry| entry.system == "snes"));
}

#[test]
fn exclusion_removes_matches() {
    let catalog = catalog();
    let query = Query::parse(&["snes", "mario", "-lost"], &systems());
    assert_eq!(names(&query.filter(&catalog)), vec!["Super Mario World (USA).zip"]);
}

#[test]
fn keywords_are_conjunctive_and_case_insensitive() {
    let catalog = catalog();
    let query = Query::parse(&["MARIO", "usa"], &systems());
    assert_eq!(names(&query.filter(&catalog)), vec!["Super Mario World (USA).zip"]);

    let query = Query::parse(&["mario"], &systems());
    assert_eq!(query.filter(&catalog).len(), 3);
}

#[test]
fn system_token_restricts_results() {
    let catalog = catalog();
    let query = Query::parse(&["GBA", "mario"], &systems());
    assert_eq!(names(&query.filter(&catalog)), vec!["Mario Kart (Europe).zip"]);
}

#[test]
fn empty_exclusion_is_ignored_and_no_match_is_empty() {
    let catalog = catalog();
    let query = Query::parse(&["zelda", "-"], &systems());
    assert_eq!(names(&query.filter(&catalog)), vec!["Zelda (USA).zip"]);

    let query = Query::parse(&["metroid"], &systems());
    assert!(query.filter(&catalog).is_empty());
}

#[test]
fn installed_index_matches_name_then_stem() {
    let installed = vec![
        InstalledFile { path: PathBuf::from("/roms/snes/Zelda (USA).sfc"), system: "snes".into(), size: 1 },
        InstalledFile {
            path: PathBuf::from("/roms/snes/Super Mario World (USA).zip"),
            system: "snes".into(),
            size: 1,
        },
    ];
    let index = InstalledIndex::new(&installed);

    assert!(index.is_installed(&entry("snes", "Super Mario World (USA).zip")));
    assert!(index.is_installed(&entry("snes", "Zelda (USA).zip")));
    assert!(!index.is_installed(&entry("gba", "Zelda (USA).zip")));
    assert!(!index.is_installed(&entry("snes", "Super Mario Lost Levels (Japan).zip")));
}
