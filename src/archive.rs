//! Archive kinds and their extraction.

use std::fs::File;
use std::io;
use std::path::Path;
use std::process::{Command, Stdio};

use tracing::debug;

use crate::error::InstallError;
use crate::model::SystemDefinition;

/// How a downloaded package becomes installed files, resolved once per package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArchiveKind {
    Zip,
    SevenZip,
    Rar,
    TarXz,
    /// Already in a format the system accepts; moved into place as-is.
    Native,
    Unsupported(String),
}

impl ArchiveKind {
    pub fn resolve(name: &str, system: &SystemDefinition) -> Self {
        let lower = name.to_ascii_lowercase();
        let extension = if lower.ends_with(".tar.xz") {
            "tar.xz".to_string()
        } else {
            Path::new(&lower)
                .extension()
                .and_then(|ext| ext.to_str())
                .unwrap_or_default()
                .to_string()
        };

        if system.is_native(&extension) {
            return ArchiveKind::Native;
        }
        match extension.as_str() {
            "zip" => ArchiveKind::Zip,
            "7z" => ArchiveKind::SevenZip,
            "rar" => ArchiveKind::Rar,
            "tar.xz" => ArchiveKind::TarXz,
            _ => ArchiveKind::Unsupported(extension),
        }
    }

    /// Unpack `archive` into `dest`, which must already exist.
    pub fn extract(&self, archive: &Path, dest: &Path) -> Result<(), InstallError> {
        debug!("Extracting {} ({:?})", archive.display(), self);
        match self {
            ArchiveKind::Zip => extract_zip(archive, dest),
            ArchiveKind::SevenZip => sevenz_rust::decompress_file(archive, dest)
                .map_err(|err| InstallError::Extraction(err.to_string())),
            ArchiveKind::Rar => extract_rar(archive, dest),
            ArchiveKind::TarXz => extract_tar_xz(archive, dest),
            ArchiveKind::Native => Err(InstallError::Extraction(
                "native files are not archives".to_string(),
            )),
            ArchiveKind::Unsupported(ext) => Err(InstallError::UnsupportedFormat(ext.clone())),
        }
    }
}

fn extract_zip(archive: &Path, dest: &Path) -> Result<(), InstallError> {
    let file = File::open(archive).map_err(|err| InstallError::fs(archive, err))?;
    let mut zip =
        zip::ZipArchive::new(file).map_err(|err| InstallError::Extraction(err.to_string()))?;
    zip.extract(dest).map_err(|err| InstallError::Extraction(err.to_string()))
}

fn extract_tar_xz(archive: &Path, dest: &Path) -> Result<(), InstallError> {
    let file = File::open(archive).map_err(|err| InstallError::fs(archive, err))?;
    let decoder = xz2::read::XzDecoder::new(file);
    tar::Archive::new(decoder)
        .unpack(dest)
        .map_err(|err| InstallError::Extraction(err.to_string()))
}

/// RAR has no pure-Rust decoder; use whichever of `unrar` or `7z` is installed.
fn extract_rar(archive: &Path, dest: &Path) -> Result<(), InstallError> {
    let attempts: [(&str, Vec<String>); 2] = [
        ("unrar", vec!["x".into(), "-o+".into(), "-y".into()]),
        ("7z", vec!["x".into(), "-y".into(), format!("-o{}", dest.display())]),
    ];

    for (program, args) in attempts {
        let mut command = Command::new(program);
        command.args(&args).arg(archive);
        if program == "unrar" {
            command.arg(format!("{}/", dest.display()));
        }
        let output = command.stdout(Stdio::null()).stderr(Stdio::piped()).output();

        let output = match output {
            Ok(output) => output,
            Err(err) if err.kind() == io::ErrorKind::NotFound => continue,
            Err(err) => return Err(InstallError::Extraction(format!("launch {program}: {err}"))),
        };

        if output.status.success() {
            return Ok(());
        }
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(InstallError::Extraction(format!("{program} failed: {}", stderr.trim())));
    }

    Err(InstallError::Extraction("no RAR extractor found (install unrar or 7z)".to_string()))
}
