use crate::internal::directory::{split_short_long, DirectoryTree, MsiDirectory};
use crate::internal::tablerow::{self, TableRow};
use log::warn;
use msi::Package;
use std::collections::HashMap;
use std::io::{self, Read, Seek};
use std::path::PathBuf;

// ========================================================================= //

/// One entry of the `File` table, joined with its component's directory.
#[derive(Clone, Debug)]
pub struct MsiFile {
    file: String,
    short_file_name: String,
    long_file_name: String,
    file_size: u64,
    version: String,
    component: String,
    directory: Option<String>,
}

impl MsiFile {
    /// Returns the `File` key.  Inside a cabinet, the file's data is stored
    /// under this name.
    pub fn file(&self) -> &str {
        &self.file
    }

    /// Returns the short (8.3) file name.
    pub fn short_file_name(&self) -> &str {
        &self.short_file_name
    }

    /// Returns the long file name.
    pub fn long_file_name(&self) -> &str {
        &self.long_file_name
    }

    /// Returns the `FileSize` column, in bytes.
    pub fn file_size(&self) -> u64 {
        self.file_size
    }

    /// Returns the `Version` column (empty for unversioned files).
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Returns the `Component_` key that owns this file.
    pub fn component(&self) -> &str {
        &self.component
    }

    /// Returns the `Directory` key the file installs to, or `None` if the
    /// component or its directory could not be found.
    pub fn directory(&self) -> Option<&str> {
        self.directory.as_deref()
    }
}

// ========================================================================= //

/// The directory tree and file list of a package: where every file goes.
#[derive(Clone, Debug, Default)]
pub struct InstallLayout {
    directories: DirectoryTree,
    files: Vec<MsiFile>,
}

impl InstallLayout {
    /// Reads the `Directory`, `Component` and `File` tables of a package.
    /// Missing tables read as empty.
    pub fn read<F: Read + Seek>(
        package: &mut Package<F>,
    ) -> io::Result<InstallLayout> {
        let directory_rows = tablerow::read_rows(package, "Directory")?;
        let component_rows = tablerow::read_rows(package, "Component")?;
        let file_rows = tablerow::read_rows(package, "File")?;
        Ok(InstallLayout::from_rows(
            &directory_rows,
            &component_rows,
            &file_rows,
        ))
    }

    /// Joins already-read table rows.
    pub fn from_rows(
        directory_rows: &[TableRow],
        component_rows: &[TableRow],
        file_rows: &[TableRow],
    ) -> InstallLayout {
        let directories = DirectoryTree::from_rows(directory_rows);
        let mut components: HashMap<String, &TableRow> =
            HashMap::with_capacity(component_rows.len());
        for row in component_rows {
            components.insert(row.get_string("Component"), row);
        }

        let files = file_rows
            .iter()
            .map(|row| {
                let file_name = row.get_string("FileName");
                let (short_name, long_name) = split_short_long(&file_name);
                let mut file = MsiFile {
                    file: row.get_string("File"),
                    short_file_name: short_name.to_string(),
                    long_file_name: long_name.to_string(),
                    file_size: row.get_int("FileSize").unwrap_or(0).max(0)
                        as u64,
                    version: row.get_string("Version"),
                    component: row.get_string("Component_"),
                    directory: None,
                };
                file.directory =
                    resolve_directory(&file, &components, &directories);
                file
            })
            .collect();
        InstallLayout { directories, files }
    }

    /// Returns the directory tree.
    pub fn directories(&self) -> &DirectoryTree {
        &self.directories
    }

    /// Returns every file, in table order.
    pub fn files(&self) -> &[MsiFile] {
        &self.files
    }

    /// Returns the directory a file installs to, if it was resolved.
    pub fn directory_of(&self, file: &MsiFile) -> Option<&MsiDirectory> {
        file.directory().and_then(|id| self.directories.get(id))
    }

    /// Returns the path, relative to an extraction root, that a file should
    /// be written to, or `None` if its directory is unresolved.
    pub fn relative_path(&self, file: &MsiFile) -> Option<PathBuf> {
        let directory = self.directory_of(file)?;
        let mut path = self.directories.path(directory);
        path.push(sanitize_file_name(file.long_file_name(), file.file()));
        Some(path)
    }

    /// Picks the files whose long names appear in `names`.  Names that match
    /// no file are logged and returned in the second list.
    pub fn select<'a, S: AsRef<str>>(
        &'a self,
        names: &[S],
    ) -> (Vec<&'a MsiFile>, Vec<String>) {
        let mut sorted: Vec<&MsiFile> = self.files.iter().collect();
        sorted.sort_by(|a, b| a.long_file_name.cmp(&b.long_file_name));
        let mut selected = Vec::with_capacity(names.len());
        let mut missing = Vec::new();
        for name in names {
            let name = name.as_ref();
            match sorted
                .binary_search_by(|file| file.long_file_name.as_str().cmp(name))
            {
                Ok(index) => selected.push(sorted[index]),
                Err(_) => {
                    warn!("File {name} was not found in the msi.");
                    missing.push(name.to_string());
                }
            }
        }
        (selected, missing)
    }
}

fn resolve_directory(
    file: &MsiFile,
    components: &HashMap<String, &TableRow>,
    directories: &DirectoryTree,
) -> Option<String> {
    let component = match components.get(&file.component) {
        Some(component) => component,
        None => {
            warn!(
                "File {:?} has no component entry (component {:?})",
                file.long_file_name, file.component
            );
            return None;
        }
    };
    let directory = component.get_string("Directory_");
    if directories.get(&directory).is_none() {
        warn!(
            "Directory {directory:?} not found for file {:?}",
            file.long_file_name
        );
        return None;
    }
    Some(directory)
}

/// Makes a file name safe to join onto an extraction directory.
fn sanitize_file_name(name: &str, fallback: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|ch| if ch == '/' || ch == '\\' { '_' } else { ch })
        .collect();
    match cleaned.as_str() {
        "" | "." | ".." => {
            warn!("File {fallback:?} has unusable name {name:?}");
            fallback.replace(&['/', '\\'][..], "_")
        }
        _ => cleaned,
    }
}

// ========================================================================= //


// ========================================================================= //
