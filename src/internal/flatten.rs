use crate::internal::claimed::ClaimedPaths;
use crate::internal::error::Result;
use crate::internal::extract::{self, ExtractionReport, Reporter};
use crate::internal::mode::ExtractionMode;
use log::debug;
use std::ffi::OsStr;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

// ========================================================================= //

/// Extracts the directory tree into a scratch directory, then copies every
/// file into `output_dir` by name alone.
pub(crate) fn extract_flat(
    package_path: &Path,
    output_dir: &Path,
    mode: ExtractionMode,
    names: &[String],
    reporter: &mut Reporter,
) -> Result<ExtractionReport> {
    let scratch = tempfile::Builder::new().prefix("lessmsi-tree").tempdir()?;
    let mut report = extract::extract_tree(
        package_path,
        scratch.path(),
        ExtractionMode::PreserveDirectories,
        names,
        reporter,
    )?;
    fs::create_dir_all(output_dir)?;
    let placed = flatten_tree(scratch.path(), output_dir, mode)?;
    report.set_extracted(placed);
    scratch.close()?;
    Ok(report)
}

/// Copies every file under `tree` directly into `output_dir`, visiting
/// files in a sorted, deterministic order.  Returns the paths written.
pub(crate) fn flatten_tree(
    tree: &Path,
    output_dir: &Path,
    mode: ExtractionMode,
) -> io::Result<Vec<PathBuf>> {
    let mut seen = ClaimedPaths::new();
    let mut placed = Vec::new();
    for entry in WalkDir::new(tree).sort_by_file_name() {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let mut target = output_dir.join(entry.file_name());
        if let Some(earlier) = seen.get(&target) {
            if mode == ExtractionMode::RenameFlat {
                target = renamed_target(output_dir, entry.file_name(), &seen);
                debug!(
                    "Name collision; copying {} to {}",
                    entry.path().display(),
                    target.display()
                );
            } else {
                target = earlier.to_path_buf();
                debug!("Name collision; overwriting {}", target.display());
            }
        }
        fs::copy(entry.path(), &target)?;
        if seen.insert(target.clone()) {
            placed.push(target);
        }
    }
    Ok(placed)
}

/// Picks `stem_N.ext` for the smallest N (from 1) not used yet.
fn renamed_target(
    output_dir: &Path,
    file_name: &OsStr,
    seen: &ClaimedPaths,
) -> PathBuf {
    let path = Path::new(file_name);
    let stem = path.file_stem().unwrap_or(file_name).to_string_lossy();
    let extension = path.extension().map(|ext| ext.to_string_lossy());
    let mut count = 0;
    loop {
        count += 1;
        let name = match extension {
            Some(ref extension) => format!("{stem}_{count}.{extension}"),
            None => format!("{stem}_{count}"),
        };
        let candidate = output_dir.join(name);
        if !seen.contains(&candidate) {
            return candidate;
        }
    }
}

// ========================================================================= //


// ========================================================================= //
