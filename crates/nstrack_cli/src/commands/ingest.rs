//! Ingest command implementation.

use super::{load_config, type_codes};
use nstrack_core::{reconstruct_run, HistoryStore, Reconstruction};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Flags of the ingest command.
#[derive(Debug, Default)]
pub struct IngestOptions {
    /// Stored run name; defaults to the run directory name.
    pub name: Option<String>,
    /// Target type codes overriding the configuration.
    pub types: Vec<i32>,
    /// Clear the run before storing.
    pub replace: bool,
    /// Disable parallel assembly.
    pub sequential: bool,
    /// Keep everything in memory.
    pub dry_run: bool,
    /// JSON configuration file.
    pub config: Option<PathBuf>,
}

/// Runs the ingest command.
///
/// `store_path` is `None` for a dry run.
pub fn run(
    store_path: Option<&Path>,
    run_dir: &Path,
    options: &IngestOptions,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = load_config(options.config.as_deref())?;
    config.target_types = type_codes(&options.types, &config.target_types);
    if options.sequential {
        config = config.parallel_assembly(false);
    }

    let name = run_name(options.name.as_deref(), run_dir);
    println!("Ingesting {} as {name}", run_dir.display());
    if options.dry_run {
        println!("(dry run - nothing will be stored)");
    }
    println!();

    let reconstruction = reconstruct_run(run_dir, &config)?;
    print_segments(&reconstruction);

    let store = match store_path {
        Some(path) if !options.dry_run => {
            debug!(path = %path.display(), "opening history store");
            HistoryStore::open_dir(path)?
        }
        _ => HistoryStore::in_memory(),
    };
    if options.replace {
        let dropped = store.clear(&name)?;
        if dropped > 0 {
            println!("Replaced {dropped} stored histories");
        }
    }
    let stored = store.store(&name, &reconstruction.run.histories)?;
    store.sync()?;

    println!();
    println!("✓ {stored} histories stored under {name}");
    Ok(())
}

fn run_name(name: Option<&str>, run_dir: &Path) -> String {
    name.map(str::to_string)
        .or_else(|| {
            run_dir
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
        })
        .unwrap_or_else(|| run_dir.display().to_string())
}

fn print_segments(reconstruction: &Reconstruction) {
    println!("Segments:");
    for segment in &reconstruction.segments {
        let start = segment
            .start_time
            .map_or_else(|| "-".to_string(), |time| format!("{time:.3}"));
        println!(
            "  {:<12} start {:>10}  files {:>5} (skipped {})  retained {:>6} of {:>6}  escapes {}",
            segment.name,
            start,
            segment.stats.files_read,
            segment.stats.files_skipped,
            segment.stats.stars_retained,
            segment.stats.stars_seen,
            segment.stats.escapes_attached,
        );
    }
    println!("Stars in run: {}", reconstruction.run.len());
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn run_name_defaults_to_directory() {
        assert_eq!(run_name(None, Path::new("/data/N10K_r26_Z02_1")), "N10K_r26_Z02_1");
        assert_eq!(run_name(Some("fiducial"), Path::new("/data/N10K")), "fiducial");
    }

    fn write_run(root: &Path) {
        let save = root.join("save01");
        std::fs::create_dir_all(&save).unwrap();
        std::fs::write(save.join("sev.83_0.000"), "2 0.0\nh\nh\n1 13\n2 1\n-1000\n").unwrap();
        std::fs::write(save.join("sev.83_1.000"), "2 1.0\nh\nh\n1 13\n2 13\n-1000\n").unwrap();
    }

    #[test]
    fn ingest_and_replace() {
        let runs = tempdir().unwrap();
        let store_dir = tempdir().unwrap();
        let run_dir = runs.path().join("N10K");
        write_run(&run_dir);

        let options = IngestOptions::default();
        run(Some(store_dir.path()), &run_dir, &options).unwrap();
        run(
            Some(store_dir.path()),
            &run_dir,
            &IngestOptions {
                replace: true,
                sequential: true,
                ..IngestOptions::default()
            },
        )
        .unwrap();

        let store = HistoryStore::open_dir(store_dir.path()).unwrap();
        assert_eq!(store.document_count("N10K"), 2);
    }

    #[test]
    fn dry_run_leaves_no_store() {
        let runs = tempdir().unwrap();
        let store_dir = tempdir().unwrap();
        let run_dir = runs.path().join("N10K");
        write_run(&run_dir);

        let options = IngestOptions {
            dry_run: true,
            types: vec![1],
            ..IngestOptions::default()
        };
        run(None, &run_dir, &options).unwrap();
        assert!(std::fs::read_dir(store_dir.path()).unwrap().next().is_none());
    }
}
