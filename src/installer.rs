//! Concurrent, resumable and idempotent package installation.
//!
//! Each package runs check → acquire → place on its own worker. Downloads
//! land in `<root>/<system>/tmp/<name>` and archives are unpacked next to
//! them, so nothing appears under its final name until it is complete.

use std::collections::{BTreeSet, HashSet};
use std::fs::{self, File, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::archive::ArchiveKind;
use crate::error::{AppError, InstallError, RemoteError};
use crate::model::{
    BatchReport, InstallOutcome, JobStatus, PackageEntry, SystemDefinition, Systems, file_stem,
};
use crate::progress::{Finish, Progress, Unit};
use crate::remote::Remote;

/// Name of the per-system staging directory.
pub const STAGING_DIR: &str = "tmp";

const CHUNK_SIZE: usize = 8192;

pub struct InstallScheduler<'a> {
    remote: &'a dyn Remote,
    systems: &'a Systems,
    root: PathBuf,
    workers: usize,
}

impl<'a> InstallScheduler<'a> {
    pub fn new(
        remote: &'a dyn Remote,
        systems: &'a Systems,
        root: impl Into<PathBuf>,
        workers: usize,
    ) -> Self {
        Self { remote, systems, root: root.into(), workers: workers.max(1) }
    }

    /// Install every package independently; one failure never stops the rest.
    pub fn install(
        &self,
        packages: &[PackageEntry],
        progress: &Progress,
    ) -> Result<BatchReport, AppError> {
        let pool = rayon::ThreadPoolBuilder::new().num_threads(self.workers).build()?;
        info!("Installing {} packages with {} workers", packages.len(), self.workers);

        // A repeated (system, name) pair would stage to the same path as the first.
        let mut seen = HashSet::new();
        let (unique, repeated): (Vec<&PackageEntry>, Vec<&PackageEntry>) = packages
            .iter()
            .partition(|entry| seen.insert((entry.system.as_str(), entry.name.as_str())));

        let mut outcomes: Vec<InstallOutcome> = pool.install(|| {
            unique.par_iter().map(|entry| self.install_one(entry, progress)).collect()
        });
        for entry in repeated {
            debug!("{} selected twice, skipping the repeat", entry.name);
            progress.finish_pending(Finish::Skipped);
            outcomes.push(InstallOutcome { entry: entry.clone(), status: JobStatus::Skipped });
        }
        self.remove_empty_staging(packages);
        Ok(BatchReport { outcomes })
    }

    pub fn install_one(&self, entry: &PackageEntry, progress: &Progress) -> InstallOutcome {
        let status = match self.prepare(entry) {
            Ok(None) => {
                debug!("{} already installed, skipping", entry.name);
                progress.finish_pending(Finish::Skipped);
                JobStatus::Skipped
            }
            Ok(Some((system, dest))) => {
                let mut unit = progress.start();
                match self.acquire_and_place(entry, system, &dest, &mut unit) {
                    Ok(()) => {
                        unit.finish(Finish::Done);
                        JobStatus::Done
                    }
                    Err(err) => {
                        warn!("Failed to install {}: {}", entry.name, err);
                        unit.finish(Finish::Failed);
                        JobStatus::Failed(err)
                    }
                }
            }
            Err(err) => {
                warn!("Failed to install {}: {}", entry.name, err);
                progress.finish_pending(Finish::Failed);
                JobStatus::Failed(err)
            }
        };
        InstallOutcome { entry: entry.clone(), status }
    }

    /// Validate the entry and check whether it is already present.
    /// `Ok(None)` means there is nothing to do.
    fn prepare(
        &self,
        entry: &PackageEntry,
    ) -> Result<Option<(&SystemDefinition, PathBuf)>, InstallError> {
        let system = self
            .systems
            .get(&entry.system)
            .ok_or_else(|| InstallError::UnknownSystem(entry.system.clone()))?;
        validate_name(&entry.name)?;

        let dest = self.root.join(&system.id);
        fs::create_dir_all(&dest).map_err(|err| InstallError::fs(&dest, err))?;

        if is_present(&dest, &entry.name).map_err(|err| InstallError::fs(&dest, err))? {
            return Ok(None);
        }
        Ok(Some((system, dest)))
    }

    fn acquire_and_place(
        &self,
        entry: &PackageEntry,
        system: &SystemDefinition,
        dest: &Path,
        unit: &mut Unit<'_>,
    ) -> Result<(), InstallError> {
        let kind = ArchiveKind::resolve(&entry.name, system);
        if let ArchiveKind::Unsupported(ext) = &kind {
            return Err(InstallError::UnsupportedFormat(ext.clone()));
        }

        let staging_dir = dest.join(STAGING_DIR);
        fs::create_dir_all(&staging_dir).map_err(|err| InstallError::fs(&staging_dir, err))?;
        let staging = staging_dir.join(&entry.name);

        download(self.remote, &entry.url(), &staging)?;

        unit.begin_extract();
        if kind == ArchiveKind::Native {
            let target = dest.join(&entry.name);
            fs::rename(&staging, &target).map_err(|err| InstallError::fs(&target, err))?;
            return Ok(());
        }

        let unpack_dir = staging_dir.join(format!("{}.extract", entry.name));
        if unpack_dir.exists() {
            fs::remove_dir_all(&unpack_dir).map_err(|err| InstallError::fs(&unpack_dir, err))?;
        }
        fs::create_dir_all(&unpack_dir).map_err(|err| InstallError::fs(&unpack_dir, err))?;

        if let Err(err) = kind.extract(&staging, &unpack_dir) {
            let _ = fs::remove_dir_all(&unpack_dir);
            return Err(err);
        }
        merge_into(&unpack_dir, dest)?;
        let _ = fs::remove_dir_all(&unpack_dir);
        fs::remove_file(&staging).map_err(|err| InstallError::fs(&staging, err))?;
        Ok(())
    }

    fn remove_empty_staging(&self, packages: &[PackageEntry]) {
        let systems: BTreeSet<&str> = packages.iter().map(|entry| entry.system.as_str()).collect();
        for system in systems {
            let staging = self.root.join(system).join(STAGING_DIR);
            let empty = fs::read_dir(&staging).is_ok_and(|mut entries| entries.next().is_none());
            if empty && let Err(err) = fs::remove_dir(&staging) {
                debug!("Could not remove {}: {}", staging.display(), err);
            }
        }
    }
}

/// Download `url` into `staging`, resuming from whatever is already there.
///
/// Returns the final size. A short transfer leaves the partial file in
/// place so the next attempt can continue from it.
pub fn download(remote: &dyn Remote, url: &str, staging: &Path) -> Result<u64, InstallError> {
    let total = remote.content_length(url)?;
    let existing = fs::metadata(staging)
        .map(|meta| if meta.is_file() { meta.len() } else { 0 })
        .unwrap_or(0);

    if total > 0 && existing == total {
        debug!("{} already fully staged", staging.display());
        return Ok(total);
    }
    let offset = if existing < total { existing } else { 0 };

    let mut body = remote.open(url, offset)?;
    let mut file = if body.resumed {
        OpenOptions::new().append(true).open(staging)
    } else {
        File::create(staging)
    }
    .map_err(|err| InstallError::fs(staging, err))?;

    let mut buffer = vec![0u8; CHUNK_SIZE];
    loop {
        let read = body.reader.read(&mut buffer).map_err(RemoteError::Stream)?;
        if read == 0 {
            break;
        }
        file.write_all(&buffer[..read]).map_err(|err| InstallError::fs(staging, err))?;
    }
    file.flush().map_err(|err| InstallError::fs(staging, err))?;
    drop(file);

    let actual = fs::metadata(staging).map_err(|err| InstallError::fs(staging, err))?.len();
    if total > 0 && actual != total {
        return Err(InstallError::IncompleteDownload { expected: total, actual });
    }
    Ok(actual)
}

/// Whether `name`, or any file sharing its stem, already exists in `dest`.
pub fn is_present(dest: &Path, name: &str) -> std::io::Result<bool> {
    if dest.join(name).exists() {
        return Ok(true);
    }
    let stem = file_stem(name);
    for entry in fs::read_dir(dest)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        if entry.file_name().to_str().is_some_and(|existing| file_stem(existing) == stem) {
            return Ok(true);
        }
    }
    Ok(false)
}

fn validate_name(name: &str) -> Result<(), InstallError> {
    let plain = Path::new(name).file_name().and_then(|n| n.to_str()) == Some(name);
    if plain && name != STAGING_DIR {
        Ok(())
    } else {
        Err(InstallError::InvalidName(name.to_string()))
    }
}

/// Move everything in `src` into `dst`, merging directories that already exist.
fn merge_into(src: &Path, dst: &Path) -> Result<(), InstallError> {
    for entry in fs::read_dir(src).map_err(|err| InstallError::fs(src, err))? {
        let entry = entry.map_err(|err| InstallError::fs(src, err))?;
        let from = entry.path();
        let to = dst.join(entry.file_name());

        if from.is_dir() && to.is_dir() {
            merge_into(&from, &to)?;
            continue;
        }
        if to.is_file() {
            fs::remove_file(&to).map_err(|err| InstallError::fs(&to, err))?;
        }
        fs::rename(&from, &to).map_err(|err| InstallError::fs(&to, err))?;
    }
    Ok(())
}
