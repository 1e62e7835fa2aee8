use crate::internal::cabinet::{self, CabinetSource};
use crate::internal::cabset::{self, CabinetHeader};
use crate::internal::claimed::ClaimedPaths;
use crate::internal::error::{Error, Result};
use crate::internal::file::{InstallLayout, MsiFile};
use crate::internal::flatten;
use crate::internal::mode::ExtractionMode;
use crate::internal::progress::{ExtractionActivity, ExtractionProgress};
use crate::internal::query::open_package;
use log::{debug, info, warn};
use std::collections::{HashMap, HashSet};
use std::fs;
use std::io::{self, BufReader, Write};
use std::path::{Path, PathBuf};

// ========================================================================= //

/// What to extract and how to lay it out.
#[derive(Clone, Debug, Default)]
pub struct ExtractOptions {
    mode: ExtractionMode,
    files: Vec<String>,
}

impl ExtractOptions {
    /// Options that extract every file, preserving directories.
    pub fn new() -> ExtractOptions {
        ExtractOptions::default()
    }

    /// Sets the extraction mode.
    pub fn with_mode(mut self, mode: ExtractionMode) -> ExtractOptions {
        self.mode = mode;
        self
    }

    /// Restricts extraction to the files with these long names.  An empty
    /// list means every file.
    pub fn with_files<I, S>(mut self, names: I) -> ExtractOptions
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.files = names.into_iter().map(Into::into).collect();
        self
    }

    /// Returns the extraction mode.
    pub fn mode(&self) -> ExtractionMode {
        self.mode
    }

    /// Returns the requested file names (empty for all files).
    pub fn files(&self) -> &[String] {
        &self.files
    }
}

// ========================================================================= //

/// The outcome of an extraction that ran to the end.
#[derive(Clone, Debug, Default)]
pub struct ExtractionReport {
    extracted: Vec<PathBuf>,
    unresolved: Vec<String>,
    not_in_package: Vec<String>,
    not_in_cabinets: Vec<String>,
    failed_cabinets: Vec<String>,
    failed_files: Vec<String>,
    extracted_keys: Vec<String>,
}

impl ExtractionReport {
    /// Returns the paths written, in the order they were written.
    pub fn extracted(&self) -> &[PathBuf] {
        &self.extracted
    }

    /// Returns the `File` keys of files whose directory couldn't be
    /// resolved.
    pub fn unresolved(&self) -> &[String] {
        &self.unresolved
    }

    /// Returns the requested names that match no file in the package.
    pub fn not_in_package(&self) -> &[String] {
        &self.not_in_package
    }

    /// Returns the `File` keys of resolved files that no readable cabinet
    /// contained.
    pub fn not_in_cabinets(&self) -> &[String] {
        &self.not_in_cabinets
    }

    /// Returns the names of cabinets that could not be read and were
    /// skipped.
    pub fn failed_cabinets(&self) -> &[String] {
        &self.failed_cabinets
    }

    /// Returns the `File` keys of cabinet members that failed to extract.
    pub fn failed_files(&self) -> &[String] {
        &self.failed_files
    }

    /// Returns true if every wanted file was written.
    pub fn is_complete(&self) -> bool {
        self.unresolved.is_empty()
            && self.not_in_package.is_empty()
            && self.not_in_cabinets.is_empty()
            && self.failed_files.is_empty()
    }

    pub(crate) fn set_extracted(&mut self, extracted: Vec<PathBuf>) {
        self.extracted = extracted;
    }
}

// ========================================================================= //

pub(crate) struct Reporter<'a> {
    progress: ExtractionProgress,
    callback: &'a mut dyn FnMut(&ExtractionProgress),
}

impl<'a> Reporter<'a> {
    fn new(callback: &'a mut dyn FnMut(&ExtractionProgress)) -> Reporter<'a> {
        Reporter { progress: ExtractionProgress::new(0), callback }
    }

    fn set_total(&mut self, total_file_count: usize) {
        self.progress.set_total_file_count(total_file_count);
    }

    pub(crate) fn report(
        &mut self,
        activity: ExtractionActivity,
        current_file_name: &str,
        files_extracted_so_far: usize,
    ) {
        self.progress.update(activity, current_file_name, files_extracted_so_far);
        (self.callback)(&self.progress);
    }

    fn files_extracted_so_far(&self) -> usize {
        self.progress.files_extracted_so_far()
    }
}

// ========================================================================= //

/// Extracts files from a package into `output_dir`.
pub fn extract<P: AsRef<Path>, Q: AsRef<Path>>(
    package_path: P,
    output_dir: Q,
    options: &ExtractOptions,
) -> Result<ExtractionReport> {
    extract_with_progress(package_path, output_dir, options, |_| {})
}

/// Extracts files from a package into `output_dir`, calling `callback` as
/// work proceeds.  The callback always sees a final
/// [`Complete`](ExtractionActivity::Complete) report, even when extraction
/// fails.
pub fn extract_with_progress<P, Q, C>(
    package_path: P,
    output_dir: Q,
    options: &ExtractOptions,
    mut callback: C,
) -> Result<ExtractionReport>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
    C: FnMut(&ExtractionProgress),
{
    let package_path = package_path.as_ref();
    let output_dir = output_dir.as_ref();
    let mut reporter = Reporter::new(&mut callback);
    info!(
        "Extracting {} to {} ({})",
        package_path.display(),
        output_dir.display(),
        options.mode()
    );
    let result = if options.mode().is_flat() {
        flatten::extract_flat(
            package_path,
            output_dir,
            options.mode(),
            options.files(),
            &mut reporter,
        )
    } else {
        extract_tree(
            package_path,
            output_dir,
            options.mode(),
            options.files(),
            &mut reporter,
        )
    };
    let extracted = match result {
        Ok(ref report) => report.extracted().len(),
        Err(_) => reporter.files_extracted_so_far(),
    };
    reporter.report(ExtractionActivity::Complete, "", extracted);
    result
}

// ========================================================================= //

/// Extracts into `output_dir`, mirroring the package's directory tree.
pub(crate) fn extract_tree(
    package_path: &Path,
    output_dir: &Path,
    mode: ExtractionMode,
    names: &[String],
    reporter: &mut Reporter,
) -> Result<ExtractionReport> {
    reporter.report(ExtractionActivity::Initializing, "", 0);
    let mut package = open_package(package_path)?;
    let layout = InstallLayout::read(&mut package)?;
    let mut report = ExtractionReport::default();

    let selected: Vec<&MsiFile> = if names.is_empty() {
        layout.files().iter().collect()
    } else {
        let (selected, missing) = layout.select(names);
        report.not_in_package = missing;
        selected
    };
    reporter.set_total(selected.len());

    let mut wanted: HashMap<&str, (&MsiFile, PathBuf)> =
        HashMap::with_capacity(selected.len());
    for file in selected {
        let Some(relative_path) = layout.relative_path(file) else {
            warn!(
                "Skipping {:?}: its directory could not be resolved",
                file.long_file_name()
            );
            report.unresolved.push(file.file().to_string());
            continue;
        };
        if let Some((existing, _)) = wanted.get(file.file()) {
            debug!(
                "Found duplicate file using key {:?}; keeping {:?}",
                file.file(),
                existing.long_file_name()
            );
            continue;
        }
        wanted.insert(file.file(), (file, relative_path));
    }

    fs::create_dir_all(output_dir)?;
    let temp_dir = tempfile::Builder::new().prefix("lessmsi").tempdir()?;
    let mut sources = cabinet::read_media(&mut package)?;
    let result = extract_cabinets(
        &mut package,
        package_path,
        output_dir,
        temp_dir.path(),
        mode,
        &mut sources,
        &wanted,
        &mut report,
        reporter,
    );
    for source in sources.iter_mut() {
        source.cleanup();
    }
    result?;

    let written: HashSet<&str> = report
        .extracted_keys
        .iter()
        .map(String::as_str)
        .collect();
    let mut not_in_cabinets: Vec<String> = wanted
        .keys()
        .filter(|key| !written.contains(*key))
        .map(|key| key.to_string())
        .collect();
    not_in_cabinets.sort();
    for key in not_in_cabinets.iter() {
        warn!("File {key:?} was not found in any cabinet");
    }
    report.not_in_cabinets = not_in_cabinets;
    Ok(report)
}

#[allow(clippy::too_many_arguments)]
fn extract_cabinets<F: io::Read + io::Seek>(
    package: &mut msi::Package<F>,
    package_path: &Path,
    output_dir: &Path,
    temp_dir: &Path,
    mode: ExtractionMode,
    sources: &mut [CabinetSource],
    wanted: &HashMap<&str, (&MsiFile, PathBuf)>,
    report: &mut ExtractionReport,
    reporter: &mut Reporter,
) -> Result<()> {
    // Every cabinet is made available before any is read, so that a missing
    // external cabinet fails the extraction before anything is written.
    let mut available: Vec<(String, PathBuf)> = Vec::new();
    for source in sources.iter_mut() {
        reporter.report(
            ExtractionActivity::Uncompressing,
            source.cabinet_name(),
            report.extracted.len(),
        );
        let materialized = source
            .materialize(package, package_path, temp_dir)
            .map(Path::to_path_buf);
        match materialized {
            Ok(path) => {
                available.push((source.cabinet_name().to_string(), path))
            }
            Err(error @ Error::ExternalCabNotFound { .. }) => return Err(error),
            Err(error) => {
                warn!(
                    "Cabinet {:?} could not be copied out of the package: \
                     {error}",
                    source.cabinet_name()
                );
                report.failed_cabinets.push(source.cabinet_name().to_string());
            }
        }
    }

    let mut readable: Vec<(String, PathBuf, CabinetHeader)> = Vec::new();
    for (name, path) in available {
        match read_header(&path) {
            Ok(header) => readable.push((name, path, header)),
            Err(error) => {
                warn!(
                    "Cab name {name:?} could not be read by cab reader \
                     ({error}). Will attempt to ignore..."
                );
                report.failed_cabinets.push(name);
            }
        }
    }

    let linkable: Vec<(&str, &CabinetHeader)> = readable
        .iter()
        .map(|(name, _, header)| (name.as_str(), header))
        .collect();
    let chains = cabset::link_chains(&linkable);
    // Embedded cabinets sit in `temp_dir` under package-supplied names.
    let merge_dir =
        tempfile::Builder::new().prefix("merged").tempdir_in(temp_dir)?;
    let mut written = ClaimedPaths::new();
    for (chain_index, chain) in chains.iter().enumerate() {
        let names: Vec<&str> = chain
            .members()
            .iter()
            .map(|&index| readable[index].0.as_str())
            .collect();
        if let Some(missing) = chain.missing() {
            warn!(
                "Cabinet set {names:?} links to {missing:?}, which the \
                 package does not reference; skipping the set"
            );
            report.failed_cabinets.extend(names.iter().map(|n| n.to_string()));
            continue;
        }
        let cabinet_path = if chain.is_standalone() {
            readable[chain.members()[0]].1.clone()
        } else {
            info!("Found cabinet set {names:?}");
            reporter.report(
                ExtractionActivity::Uncompressing,
                names[0],
                report.extracted.len(),
            );
            let merged_path =
                merge_dir.path().join(format!("set{chain_index}.cab"));
            let paths: Vec<&Path> = chain
                .members()
                .iter()
                .map(|&index| readable[index].1.as_path())
                .collect();
            if let Err(error) = merge_to_file(&paths, &merged_path) {
                warn!("Could not merge cabinet set {names:?}: {error}");
                report
                    .failed_cabinets
                    .extend(names.iter().map(|n| n.to_string()));
                continue;
            }
            merged_path
        };
        let result = extract_from_cabinet(
            &cabinet_path,
            output_dir,
            mode,
            wanted,
            &mut written,
            report,
            reporter,
        );
        if let Err(error) = result {
            warn!("Could not read cabinet {names:?}: {error}");
            report.failed_cabinets.extend(names.iter().map(|n| n.to_string()));
        }
    }
    Ok(())
}

fn read_header(path: &Path) -> io::Result<CabinetHeader> {
    let mut reader = BufReader::new(fs::File::open(path)?);
    CabinetHeader::read(&mut reader)
}

fn merge_to_file(parts: &[&Path], destination: &Path) -> io::Result<()> {
    let mut readers = parts
        .iter()
        .map(|path| fs::File::open(path).map(BufReader::new))
        .collect::<io::Result<Vec<_>>>()?;
    let mut writer = io::BufWriter::new(fs::File::create(destination)?);
    cabset::merge_cabinets(&mut readers, &mut writer)?;
    writer.flush()
}

fn extract_from_cabinet(
    cabinet_path: &Path,
    output_dir: &Path,
    mode: ExtractionMode,
    wanted: &HashMap<&str, (&MsiFile, PathBuf)>,
    written: &mut ClaimedPaths,
    report: &mut ExtractionReport,
    reporter: &mut Reporter,
) -> io::Result<()> {
    let reader = BufReader::new(fs::File::open(cabinet_path)?);
    let mut cabinet = cab::Cabinet::new(reader)?;
    let members: Vec<String> = cabinet
        .folder_entries()
        .flat_map(|folder| folder.file_entries())
        .map(|entry| entry.name().to_string())
        .collect();
    for member in members {
        let Some((file, relative_path)) = wanted.get(member.as_str()) else {
            continue;
        };
        reporter.report(
            ExtractionActivity::ExtractingFile,
            file.long_file_name(),
            report.extracted.len(),
        );
        let mut target = output_dir.join(relative_path);
        if let Some(earlier) = written.get(&target) {
            if mode == ExtractionMode::PreserveDirectories {
                target = duplicate_target(&target, written);
                warn!("Duplicate file found; writing {}", target.display());
            } else {
                target = earlier.to_path_buf();
            }
        }
        debug!("Extracting file {member:?} to {}", target.display());
        match write_member(&mut cabinet, &member, &target) {
            Ok(size) => {
                if size != file.file_size() {
                    debug!(
                        "File {member:?} is {size} bytes, but the File table \
                         says {}",
                        file.file_size()
                    );
                }
                written.insert(target.clone());
                report.extracted.push(target);
                report.extracted_keys.push(member);
            }
            Err(error) => {
                warn!("Could not extract {member:?}: {error}");
                report.failed_files.push(member);
            }
        }
    }
    Ok(())
}

/// Picks `<target>.duplicateN` for the smallest N (from 1) not written in
/// this run.  Files left by earlier runs are overwritten.
fn duplicate_target(target: &Path, written: &ClaimedPaths) -> PathBuf {
    let mut count = 0;
    loop {
        count += 1;
        let mut name = target.as_os_str().to_os_string();
        name.push(format!(".duplicate{count}"));
        let candidate = PathBuf::from(name);
        if !written.contains(&candidate) {
            return candidate;
        }
    }
}

fn write_member<R: io::Read + io::Seek>(
    cabinet: &mut cab::Cabinet<R>,
    member: &str,
    target: &Path,
) -> io::Result<u64> {
    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut reader = cabinet.read_file(member)?;
    let mut writer = io::BufWriter::new(fs::File::create(target)?);
    let copied = io::copy(&mut reader, &mut writer).and_then(|size| {
        writer.flush()?;
        Ok(size)
    });
    if copied.is_err() {
        drop(writer);
        let _ = fs::remove_file(target);
    }
    copied
}

// ========================================================================= //


// ========================================================================= //
