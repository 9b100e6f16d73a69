use crate::convert::{self, Converter};
use crate::error::AppError;
use crate::path::display_path;
use crate::progress::{Progress, run_with_bar};
use crate::scanner::Scanner;

use super::{confirm, load_context};

pub struct CompressOptions {
    pub assume_yes: bool,
}

pub fn execute_compress(options: CompressOptions) -> Result<(), AppError> {
    let (settings, systems) = load_context()?;
    let installed = Scanner::new(&settings)?.scan_installed(&systems)?;
    let jobs = convert::plan(&installed);
    if jobs.is_empty() {
        println!("No disc images to compress.");
        return Ok(());
    }

    for job in &jobs {
        println!("Create {}", display_path(&job.output));
        for source in job.sources() {
            println!("Delete {}", display_path(source));
        }
    }

    if !confirm("Do you want to continue?", options.assume_yes)? {
        println!("Abort.");
        return Ok(());
    }

    let converter = Converter::new(settings.compress_workers);
    if !converter.is_available() {
        return Err(AppError::MissingTool(convert::DEFAULT_PROGRAM.to_string()));
    }

    let progress = Progress::new(jobs.len());
    let results = run_with_bar("Compressing", &progress, || converter.run_all(&jobs, &progress))?;
    let failed: Vec<_> = results.iter().filter(|result| result.error.is_some()).collect();
    println!("✓ {} compressed, ✗ {} failed", results.len() - failed.len(), failed.len());
    for result in failed {
        if let Some(err) = &result.error {
            println!("✗ {}: {}", display_path(&result.job.input), err);
        }
    }
    Ok(())
}
