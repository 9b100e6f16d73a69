//! Disc-image compression through the external `chdman` tool.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::error::{AppError, ConvertError};
use crate::model::InstalledFile;
use crate::progress::{Finish, Progress};

pub const DEFAULT_PROGRAM: &str = "chdman";

/// Extensions of uncompressed disc images.
pub const DISC_EXTENSIONS: [&str; 3] = ["iso", "cue", "gdi"];

/// One image to convert and everything removed after it succeeds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionJob {
    pub input: PathBuf,
    pub output: PathBuf,
    /// Track files referenced by a cue sheet.
    pub tracks: Vec<PathBuf>,
}

impl ConversionJob {
    pub fn new(input: PathBuf) -> Self {
        let output = input.with_extension("chd");
        let tracks = if has_extension(&input, "cue") { find_tracks(&input) } else { Vec::new() };
        Self { input, output, tracks }
    }

    /// Files deleted once the output exists.
    pub fn sources(&self) -> impl Iterator<Item = &PathBuf> {
        std::iter::once(&self.input).chain(&self.tracks)
    }
}

/// Conversion jobs for every disc image among `files`.
pub fn plan(files: &[InstalledFile]) -> Vec<ConversionJob> {
    files
        .iter()
        .filter(|file| DISC_EXTENSIONS.iter().any(|ext| has_extension(&file.path, ext)))
        .map(|file| ConversionJob::new(file.path.clone()))
        .collect()
}

#[derive(Debug)]
pub struct ConversionResult {
    pub job: ConversionJob,
    pub error: Option<ConvertError>,
}

pub struct Converter {
    program: String,
    workers: usize,
}

impl Converter {
    pub fn new(workers: usize) -> Self {
        Self::with_program(DEFAULT_PROGRAM, workers)
    }

    pub fn with_program(program: impl Into<String>, workers: usize) -> Self {
        Self { program: program.into(), workers: workers.max(1) }
    }

    pub fn is_available(&self) -> bool {
        Command::new(&self.program)
            .arg("--help")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .is_ok()
    }

    pub fn run_all(
        &self,
        jobs: &[ConversionJob],
        progress: &Progress,
    ) -> Result<Vec<ConversionResult>, AppError> {
        let pool = rayon::ThreadPoolBuilder::new().num_threads(self.workers).build()?;
        info!("Converting {} images with {} workers", jobs.len(), self.workers);

        let results = pool.install(|| {
            jobs.par_iter()
                .map(|job| {
                    let unit = progress.start();
                    let error = self.convert(job).err();
                    match &error {
                        Some(err) => {
                            warn!("Failed to convert {}: {}", job.input.display(), err);
                            unit.finish(Finish::Failed);
                        }
                        None => unit.finish(Finish::Done),
                    }
                    ConversionResult { job: job.clone(), error }
                })
                .collect()
        });
        Ok(results)
    }

    /// Convert one image; the sources are deleted only once the output exists
    /// and is non-empty.
    pub fn convert(&self, job: &ConversionJob) -> Result<(), ConvertError> {
        debug!("{} createcd -i {} -o {}", self.program, job.input.display(), job.output.display());
        let status = Command::new(&self.program)
            .arg("createcd")
            .arg("-i")
            .arg(&job.input)
            .arg("-o")
            .arg(&job.output)
            .arg("-f")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map_err(|source| ConvertError::Launch { program: self.program.clone(), source })?;

        if !status.success() {
            return Err(ConvertError::Status { program: self.program.clone(), status });
        }
        let written = fs::metadata(&job.output).map(|meta| meta.len()).unwrap_or(0);
        if written == 0 {
            return Err(ConvertError::MissingOutput(job.output.clone()));
        }

        for source in job.sources() {
            fs::remove_file(source)
                .map_err(|err| ConvertError::Cleanup { path: source.clone(), source: err })?;
        }
        Ok(())
    }
}

/// `<stem>.bin` when it exists, otherwise every `<stem>*.bin` next to the cue.
fn find_tracks(cue: &Path) -> Vec<PathBuf> {
    let single = cue.with_extension("bin");
    if single.is_file() {
        return vec![single];
    }

    let (Some(dir), Some(stem)) = (cue.parent(), cue.file_stem().and_then(|s| s.to_str())) else {
        return Vec::new();
    };
    let Ok(entries) = fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut tracks: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| {
            has_extension(path, "bin")
                && path.file_name().and_then(|n| n.to_str()).is_some_and(|n| is_track_of(n, stem))
        })
        .collect();
    tracks.sort();
    tracks
}

/// `Game (Track 1).bin` and `Game_01.bin` belong to `Game.cue`; `Game 2 (USA).bin` does not.
fn is_track_of(name: &str, stem: &str) -> bool {
    name.strip_prefix(stem).is_some_and(|rest| {
        [" (", " [", " -", "_", "-", "."].iter().any(|sep| rest.starts_with(sep))
    })
}

fn has_extension(path: &Path, extension: &str) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(extension))
}
