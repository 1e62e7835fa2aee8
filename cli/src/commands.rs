use anyhow::Context;
use chrono::{DateTime, Utc};
use lessmsi::{ExtractOptions, ExtractionMode, ExtractionReport};
use log::warn;
use std::env;
use std::io;
use std::path::{Path, PathBuf};

// ========================================================================= //

/// Splits the arguments following the package name: the first one names the
/// output directory if it ends with a path separator; all others are file
/// names to extract.
pub fn split_extract_args(rest: &[String]) -> (Option<PathBuf>, Vec<String>) {
    let mut files = rest.to_vec();
    let output_dir = match files.first() {
        Some(first) if first.ends_with(&['\\', '/'][..]) => {
            let dir = files.remove(0);
            let trimmed = dir.trim_end_matches(&['"', '\\', '/'][..]);
            if trimmed.is_empty() {
                Some(PathBuf::from(dir))
            } else {
                Some(PathBuf::from(trimmed))
            }
        }
        _ => None,
    };
    (output_dir, files)
}

/// Returns the directory to extract into: the one given, or one named after
/// the package in the current directory.  The result is absolute.
pub fn output_dir_for(
    package: &Path,
    output_dir: Option<PathBuf>,
    current_dir: &Path,
) -> PathBuf {
    let dir = output_dir.unwrap_or_else(|| {
        PathBuf::from(package.file_stem().unwrap_or(package.as_os_str()))
    });
    if dir.is_absolute() {
        dir
    } else {
        current_dir.join(dir)
    }
}

pub fn extract(
    package: &Path,
    rest: &[String],
    mode: ExtractionMode,
) -> anyhow::Result<()> {
    let current_dir =
        env::current_dir().context("Cannot determine current directory")?;
    let (output_dir, files) = split_extract_args(rest);
    let output_dir = output_dir_for(package, output_dir, &current_dir);
    let package = if package.is_absolute() {
        package.to_path_buf()
    } else {
        current_dir.join(package)
    };
    println!(
        "Extracting '{}' to '{}'.",
        package.display(),
        output_dir.display()
    );
    let options = ExtractOptions::new().with_mode(mode).with_files(files);
    let report = lessmsi::extract(&package, &output_dir, &options)
        .with_context(|| format!("Failed to extract {}", package.display()))?;
    warn_incomplete(&report);
    Ok(())
}

fn warn_incomplete(report: &ExtractionReport) {
    let problems = [
        ("not found in the package", report.not_in_package()),
        ("with an unresolved directory", report.unresolved()),
        ("not found in any cabinet", report.not_in_cabinets()),
        ("that failed to extract", report.failed_files()),
    ];
    for (reason, names) in problems {
        if !names.is_empty() {
            warn!("{} file(s) {reason}: {}", names.len(), names.join(", "));
        }
    }
    if !report.failed_cabinets().is_empty() {
        warn!(
            "Skipped unreadable cabinet(s): {}",
            report.failed_cabinets().join(", ")
        );
    }
}

// ========================================================================= //

pub fn list_table(package: &Path, table: &str) -> anyhow::Result<()> {
    let mut package = lessmsi::open_package(package)?;
    let stdout = io::stdout();
    let mut writer = io::BufWriter::new(stdout.lock());
    lessmsi::write_table_csv(&mut package, table, &mut writer)
        .with_context(|| format!("Failed to list table {table:?}"))
}

pub fn show_version(package: &Path) -> anyhow::Result<()> {
    let mut package = lessmsi::open_package(package)?;
    match lessmsi::product_version(&mut package)? {
        Some(version) => println!("{version}"),
        None => println!("Version not found!"),
    }
    Ok(())
}

pub fn show_info(package: &Path) -> anyhow::Result<()> {
    let package = lessmsi::open_package(package)?;
    let mut properties = lessmsi::summary_properties(&package);
    if let Some(time) = package.summary_info().creation_time() {
        properties.push(("Created", format_time(time.into())));
    }
    for (label, value) in properties {
        println!("{:<22}{value}", format!("{label}:"));
    }
    Ok(())
}

fn format_time(time: DateTime<Utc>) -> String {
    time.format("%Y-%m-%d %H:%M:%S UTC").to_string()
}

// ========================================================================= //


// ========================================================================= //
