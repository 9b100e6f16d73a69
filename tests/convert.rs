#![cfg(unix)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use assert_fs::prelude::*;
use retro::convert::{ConversionJob, Converter, plan};
use retro::model::InstalledFile;
use retro::progress::Progress;
use serial_test::serial;

fn installed(path: &Path) -> InstalledFile {
    InstalledFile { path: path.to_path_buf(), system: "psx".into(), size: 1 }
}

/// A stand-in for chdman that writes `body` to the `-o` argument.
fn fake_tool(dir: &Path, body: &str) -> PathBuf {
    let path = dir.join("fake-chdman");
    fs::write(&path, format!("#!/bin/sh\nprintf '{body}' > \"$5\"\n")).unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    path
}

#[test]
fn plan_picks_disc_images_and_cue_tracks() {
    let dir = assert_fs::TempDir::new().unwrap();
    for name in ["Game.cue", "Game.bin", "Other.iso", "Other.chd", "Multi.cue", "Multi (Track 1).bin", "Multi (Track 2).bin"] {
        dir.child(name).write_str("x").unwrap();
    }
    let files: Vec<InstalledFile> = ["Game.cue", "Game.bin", "Other.iso", "Other.chd", "Multi.cue"]
        .iter()
        .map(|name| installed(&dir.path().join(name)))
        .collect();

    let jobs = plan(&files);

    assert_eq!(jobs.len(), 3);
    assert_eq!(jobs[0].tracks, vec![dir.path().join("Game.bin")]);
    assert!(jobs[1].tracks.is_empty());
    assert_eq!(jobs[1].output, dir.path().join("Other.chd"));
    assert_eq!(
        jobs[2].tracks,
        vec![dir.path().join("Multi (Track 1).bin"), dir.path().join("Multi (Track 2).bin")]
    );
}

#[test]
#[serial]
fn successful_conversion_removes_sources() {
    let dir = assert_fs::TempDir::new().unwrap();
    dir.child("Game.cue").write_str("cue").unwrap();
    dir.child("Game.bin").write_str("bin").unwrap();
    let tool = fake_tool(dir.path(), "chd");
    let converter = Converter::with_program(tool.display().to_string(), 1);
    let jobs = vec![ConversionJob::new(dir.path().join("Game.cue"))];

    let results = converter.run_all(&jobs, &Progress::new(1)).unwrap();

    assert!(results[0].error.is_none(), "{:?}", results[0].error);
    dir.child("Game.chd").assert("chd");
    dir.child("Game.cue").assert(predicates::path::missing());
    dir.child("Game.bin").assert(predicates::path::missing());
}

#[test]
#[serial]
fn empty_output_keeps_sources() {
    let dir = assert_fs::TempDir::new().unwrap();
    dir.child("Game.iso").write_str("iso").unwrap();
    let tool = fake_tool(dir.path(), "");
    let converter = Converter::with_program(tool.display().to_string(), 1);

    let result = converter.convert(&ConversionJob::new(dir.path().join("Game.iso")));

    assert!(result.is_err());
    dir.child("Game.iso").assert(predicates::path::is_file());
}

#[test]
#[serial]
fn missing_tool_is_reported() {
    let converter = Converter::with_program("definitely-not-a-real-chdman", 1);
    assert!(!converter.is_available());
}

#[test]
fn cue_tracks_need_a_separator_after_the_stem() {
    let dir = assert_fs::TempDir::new().unwrap();
    for name in ["Game.cue", "Game (Track 1).bin", "Game_02.bin", "Game 2 (USA).bin", "Gameplay.bin"] {
        dir.child(name).write_str("x").unwrap();
    }

    let jobs = plan(&[installed(&dir.path().join("Game.cue"))]);

    assert_eq!(jobs.len(), 1);
    assert_eq!(
        jobs[0].tracks,
        vec![dir.path().join("Game (Track 1).bin"), dir.path().join("Game_02.bin")]
    );
}
