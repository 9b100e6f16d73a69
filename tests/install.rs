mod common;

use std::fs;
use std::io::{Cursor, Write};

use assert_fs::prelude::*;
use common::{FakeRemote, payload, system, systems};
use retro::error::InstallError;
use retro::installer::{InstallScheduler, download};
use retro::model::{JobStatus, PackageEntry};
use retro::progress::Progress;
use zip::write::SimpleFileOptions;

const BASE: &str = "https://example.org/snes/";

fn entry(name: &str) -> PackageEntry {
    PackageEntry::new("snes", BASE, name, name, "1K")
}

fn url(name: &str) -> String {
    format!("{BASE}{name}")
}

fn zipped(name: &str, data: &[u8]) -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    writer.start_file(name, SimpleFileOptions::default()).unwrap();
    writer.write_all(data).unwrap();
    writer.finish().unwrap().into_inner()
}

#[test]
fn present_file_is_skipped_without_network() {
    let root = assert_fs::TempDir::new().unwrap();
    root.child("snes/Game (USA).zip").write_str("zip").unwrap();
    root.child("snes/Other (Japan).sfc").write_str("rom").unwrap();

    let remote = FakeRemote::new();
    let systems = systems(vec![system("snes", &["sfc"])]);
    let scheduler = InstallScheduler::new(&remote, &systems, root.path(), 2);
    let packages = vec![entry("Game (USA).zip"), entry("Other (Japan).zip")];
    let progress = Progress::new(packages.len());

    let report = scheduler.install(&packages, &progress).unwrap();

    assert_eq!(report.skipped(), 2);
    assert_eq!(remote.requests(), 0);
    assert_eq!(progress.snapshot().skipped, 2);
}

#[test]
fn interrupted_download_resumes_to_exact_size() {
    let root = assert_fs::TempDir::new().unwrap();
    let data = payload(100_000);
    let name = "Game (USA).sfc";
    let remote = FakeRemote::new().with_file(&url(name), data.clone());
    let systems = systems(vec![system("snes", &["sfc"])]);
    let scheduler = InstallScheduler::new(&remote, &systems, root.path(), 1);
    let packages = vec![entry(name)];

    remote.truncate_next(30_000);
    let report = scheduler.install(&packages, &Progress::new(1)).unwrap();
    assert_eq!(report.failed(), 1);
    assert!(matches!(
        report.outcomes[0].status,
        JobStatus::Failed(InstallError::IncompleteDownload { expected: 100_000, actual: 30_000 })
    ));
    root.child("snes/tmp/Game (USA).sfc").assert(predicates::path::is_file());
    root.child("snes/Game (USA).sfc").assert(predicates::path::missing());

    let report = scheduler.install(&packages, &Progress::new(1)).unwrap();
    assert_eq!(report.done(), 1);
    assert_eq!(remote.offsets(), vec![0, 30_000]);
    assert_eq!(fs::read(root.child("snes/Game (USA).sfc").path()).unwrap(), data);
    root.child("snes/tmp").assert(predicates::path::missing());
}

#[test]
fn ignored_range_restarts_from_zero() {
    let dir = assert_fs::TempDir::new().unwrap();
    let data = payload(5_000);
    let staging = dir.child("Game.sfc");
    staging.write_binary(b"stale bytes").unwrap();

    let mut remote = FakeRemote::new().with_file(&url("Game.sfc"), data.clone());
    remote.ignore_range = true;

    let written = download(&remote, &url("Game.sfc"), staging.path()).unwrap();
    assert_eq!(written, 5_000);
    assert_eq!(fs::read(staging.path()).unwrap(), data);
}

#[test]
fn complete_staging_is_reused_and_oversized_staging_restarts() {
    let dir = assert_fs::TempDir::new().unwrap();
    let data = payload(2_000);
    let remote = FakeRemote::new().with_file(&url("Game.sfc"), data.clone());

    let complete = dir.child("complete.sfc");
    complete.write_binary(&data).unwrap();
    assert_eq!(download(&remote, &url("Game.sfc"), complete.path()).unwrap(), 2_000);
    assert!(remote.offsets().is_empty());

    let oversized = dir.child("oversized.sfc");
    oversized.write_binary(&payload(3_000)).unwrap();
    assert_eq!(download(&remote, &url("Game.sfc"), oversized.path()).unwrap(), 2_000);
    assert_eq!(remote.offsets(), vec![0]);
    assert_eq!(fs::read(oversized.path()).unwrap(), data);
}

#[test]
fn zip_is_extracted_into_system_directory() {
    let root = assert_fs::TempDir::new().unwrap();
    let rom = payload(4_096);
    let remote =
        FakeRemote::new().with_file(&url("Game (USA).zip"), zipped("Game (USA).sfc", &rom));
    let systems = systems(vec![system("snes", &["sfc"])]);
    let scheduler = InstallScheduler::new(&remote, &systems, root.path(), 1);

    let report = scheduler.install(&[entry("Game (USA).zip")], &Progress::new(1)).unwrap();

    assert_eq!(report.done(), 1, "{:?}", report.outcomes[0].detail());
    assert_eq!(fs::read(root.child("snes/Game (USA).sfc").path()).unwrap(), rom);
    root.child("snes/Game (USA).zip").assert(predicates::path::missing());
    root.child("snes/tmp").assert(predicates::path::missing());
}

#[test]
fn unsupported_format_fails_before_download() {
    let root = assert_fs::TempDir::new().unwrap();
    let remote = FakeRemote::new().with_file(&url("Game.exe"), payload(10));
    let systems = systems(vec![system("snes", &["sfc"])]);
    let scheduler = InstallScheduler::new(&remote, &systems, root.path(), 1);

    let report = scheduler.install(&[entry("Game.exe")], &Progress::new(1)).unwrap();

    assert!(matches!(
        &report.outcomes[0].status,
        JobStatus::Failed(InstallError::UnsupportedFormat(ext)) if ext == "exe"
    ));
    assert_eq!(remote.requests(), 0);
}

#[test]
fn one_failure_does_not_stop_the_batch() {
    let root = assert_fs::TempDir::new().unwrap();
    let remote = FakeRemote::new().with_file(&url("Good.sfc"), payload(64));
    let systems = systems(vec![system("snes", &["sfc"])]);
    let scheduler = InstallScheduler::new(&remote, &systems, root.path(), 4);
    let packages = vec![entry("Missing.sfc"), entry("Good.sfc")];
    let progress = Progress::new(packages.len());

    let report = scheduler.install(&packages, &progress).unwrap();

    assert_eq!(report.done(), 1);
    assert_eq!(report.failed(), 1);
    assert_eq!(report.failures().next().unwrap().entry.name, "Missing.sfc");
    root.child("snes/Good.sfc").assert(predicates::path::is_file());
    let counters = progress.snapshot();
    assert_eq!((counters.done, counters.failed, counters.pending), (1, 1, 0));
}

#[test]
fn unknown_system_and_unsafe_names_fail() {
    let root = assert_fs::TempDir::new().unwrap();
    let remote = FakeRemote::new();
    let systems = systems(vec![system("snes", &["sfc"])]);
    let scheduler = InstallScheduler::new(&remote, &systems, root.path(), 1);
    let packages = vec![
        PackageEntry::new("gba", BASE, "Game.gba", "Game.gba", "1K"),
        entry("../escape.sfc"),
    ];

    let report = scheduler.install(&packages, &Progress::new(2)).unwrap();

    assert!(matches!(report.outcomes[0].status, JobStatus::Failed(InstallError::UnknownSystem(_))));
    assert!(matches!(report.outcomes[1].status, JobStatus::Failed(InstallError::InvalidName(_))));
    assert_eq!(remote.requests(), 0);
}

#[test]
fn repeated_selection_installs_once() {
    let root = assert_fs::TempDir::new().unwrap();
    let data = payload(3_000);
    let remote = FakeRemote::new().with_file(&url("Game.sfc"), data.clone());
    let systems = systems(vec![system("snes", &["sfc"])]);
    let scheduler = InstallScheduler::new(&remote, &systems, root.path(), 2);
    let packages = vec![entry("Game.sfc"), entry("Game.sfc")];
    let progress = Progress::new(packages.len());

    let report = scheduler.install(&packages, &progress).unwrap();

    assert_eq!((report.done(), report.skipped()), (1, 1));
    assert_eq!(remote.offsets(), vec![0]);
    assert_eq!(fs::read(root.child("snes/Game.sfc").path()).unwrap(), data);
    let counters = progress.snapshot();
    assert_eq!((counters.done, counters.skipped, counters.pending), (1, 1, 0));
}

#[test]
fn corrupt_archive_fails_alone_and_keeps_its_download() {
    let root = assert_fs::TempDir::new().unwrap();
    let remote = FakeRemote::new()
        .with_file(&url("Broken.zip"), b"this is not a zip archive".to_vec())
        .with_file(&url("Good.sfc"), payload(64));
    let systems = systems(vec![system("snes", &["sfc"])]);
    let scheduler = InstallScheduler::new(&remote, &systems, root.path(), 2);
    let packages = vec![entry("Broken.zip"), entry("Good.sfc")];

    let report = scheduler.install(&packages, &Progress::new(2)).unwrap();

    assert!(matches!(report.outcomes[0].status, JobStatus::Failed(InstallError::Extraction(_))));
    assert!(matches!(report.outcomes[1].status, JobStatus::Done));
    root.child("snes/tmp/Broken.zip").assert(predicates::path::is_file());
    root.child("snes/tmp/Broken.zip.extract").assert(predicates::path::missing());
    root.child("snes/Broken.zip").assert(predicates::path::missing());
    let installed: Vec<String> = fs::read_dir(root.child("snes").path())
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(installed.len(), 2, "{installed:?}");
    assert!(installed.contains(&"Good.sfc".to_string()));
    assert!(installed.contains(&"tmp".to_string()));
}

#[test]
fn tar_xz_is_extracted_into_system_directory() {
    let root = assert_fs::TempDir::new().unwrap();
    let rom = payload(5_000);
    let mut builder = tar::Builder::new(xz2::write::XzEncoder::new(Vec::new(), 6));
    let mut header = tar::Header::new_gnu();
    header.set_size(rom.len() as u64);
    header.set_mode(0o644);
    header.set_cksum();
    builder.append_data(&mut header, "Pack (Japan).sfc", &rom[..]).unwrap();
    let archive = builder.into_inner().unwrap().finish().unwrap();

    let remote = FakeRemote::new().with_file(&url("Pack (Japan).tar.xz"), archive);
    let systems = systems(vec![system("snes", &["sfc"])]);
    let scheduler = InstallScheduler::new(&remote, &systems, root.path(), 1);

    let report = scheduler.install(&[entry("Pack (Japan).tar.xz")], &Progress::new(1)).unwrap();

    assert_eq!(report.done(), 1, "{:?}", report.outcomes[0].detail());
    assert_eq!(fs::read(root.child("snes/Pack (Japan).sfc").path()).unwrap(), rom);
    root.child("snes/tmp").assert(predicates::path::missing());
}

#[test]
fn seven_zip_is_extracted_into_system_directory() {
    let root = assert_fs::TempDir::new().unwrap();
    let source = assert_fs::TempDir::new().unwrap();
    let rom = payload(6_000);
    source.child("Game (Europe).sfc").write_binary(&rom).unwrap();
    let archive_path = source.path().join("Game (Europe).7z");
    sevenz_rust::compress_to_path(source.child("Game (Europe).sfc").path(), &archive_path).unwrap();

    let remote =
        FakeRemote::new().with_file(&url("Game (Europe).7z"), fs::read(&archive_path).unwrap());
    let systems = systems(vec![system("snes", &["sfc"])]);
    let scheduler = InstallScheduler::new(&remote, &systems, root.path(), 1);

    let report = scheduler.install(&[entry("Game (Europe).7z")], &Progress::new(1)).unwrap();

    assert_eq!(report.done(), 1, "{:?}", report.outcomes[0].detail());
    assert_eq!(fs::read(root.child("snes/Game (Europe).sfc").path()).unwrap(), rom);
    root.child("snes/tmp").assert(predicates::path::missing());
}
