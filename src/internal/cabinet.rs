use crate::internal::error::{Error, Result};
use crate::internal::olestorage;
use crate::internal::tablerow;
use log::{debug, info, warn};
use msi::Package;
use std::fs;
use std::io::{self, Read, Seek, Write};
use std::path::{Path, PathBuf};

// ========================================================================= //

const EMBEDDED_PREFIX: char = '#';

// ========================================================================= //

/// One cabinet referenced by the package's `Media` table.
#[derive(Clone, Debug)]
pub struct CabinetSource {
    cabinet_name: String,
    is_embedded_stream: bool,
    local_path: Option<PathBuf>,
    must_delete_after_extraction: bool,
}

impl CabinetSource {
    /// Interprets a `Media.Cabinet` value.  A leading `#` means the cabinet
    /// is stored as a stream inside the package; otherwise it is a file next
    /// to the package.  Returns `None` for an empty value.
    pub fn from_reference(reference: &str) -> Option<CabinetSource> {
        let (cabinet_name, is_embedded_stream) =
            match reference.strip_prefix(EMBEDDED_PREFIX) {
                Some(name) => (name, true),
                None => (reference, false),
            };
        if cabinet_name.is_empty() {
            return None;
        }
        Some(CabinetSource {
            cabinet_name: cabinet_name.to_string(),
            is_embedded_stream,
            local_path: None,
            must_delete_after_extraction: false,
        })
    }

    /// Returns the cabinet name, without any `#` prefix.
    pub fn cabinet_name(&self) -> &str {
        &self.cabinet_name
    }

    /// Returns true if the cabinet is stored inside the package.
    pub fn is_embedded_stream(&self) -> bool {
        self.is_embedded_stream
    }

    /// Returns where the cabinet can be read from on disk, once it has been
    /// materialized.
    pub fn local_path(&self) -> Option<&Path> {
        self.local_path.as_deref()
    }

    /// Returns true if the local copy is a temporary file that should be
    /// removed once extraction is done.
    pub fn must_delete_after_extraction(&self) -> bool {
        self.must_delete_after_extraction
    }

    /// Makes the cabinet readable from disk.  Embedded cabinets are copied
    /// into `temp_dir`; external ones are read in place.
    pub(crate) fn materialize<F: Read + Seek>(
        &mut self,
        package: &mut Package<F>,
        package_path: &Path,
        temp_dir: &Path,
    ) -> Result<&Path> {
        let path = if self.is_embedded_stream {
            let path = temp_dir.join(local_file_name(&self.cabinet_name));
            self.copy_embedded(package, package_path, &path)?;
            self.must_delete_after_extraction = true;
            path
        } else {
            let folder = package_path
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_default();
            let path = folder.join(&self.cabinet_name);
            if !path.is_file() {
                return Err(Error::ExternalCabNotFound {
                    cabinet: self.cabinet_name.clone(),
                    folder,
                });
            }
            path
        };
        debug!("Cabinet {:?} is at {}", self.cabinet_name, path.display());
        Ok(self.local_path.insert(path).as_path())
    }

    fn copy_embedded<F: Read + Seek>(
        &self,
        package: &mut Package<F>,
        package_path: &Path,
        destination: &Path,
    ) -> io::Result<()> {
        match package.read_stream(&self.cabinet_name) {
            Ok(mut stream) => {
                let mut file = fs::File::create(destination)?;
                io::copy(&mut stream, &mut file)?;
                return file.flush();
            }
            Err(error) => {
                warn!(
                    "Could not read stream {:?} from the package ({error}); \
                     searching the compound file directly",
                    self.cabinet_name
                );
            }
        }
        let found = olestorage::find_cabinet_stream(
            fs::File::open(package_path)?,
            &self.cabinet_name,
        )?;
        match found {
            Some(stream) => fs::write(destination, stream.data()),
            None => not_found!(
                "Cabinet stream {:?} not found in the package",
                self.cabinet_name
            ),
        }
    }

    /// Removes the temporary local copy, if there is one.
    pub(crate) fn cleanup(&mut self) {
        if !self.must_delete_after_extraction {
            return;
        }
        if let Some(path) = self.local_path.take() {
            if let Err(error) = remove_file_forcefully(&path) {
                warn!("Could not delete {}: {error}", path.display());
            }
        }
    }
}

/// Reads the distinct cabinets listed in the `Media` table, in table order.
pub fn read_media<F: Read + Seek>(
    package: &mut Package<F>,
) -> io::Result<Vec<CabinetSource>> {
    let mut sources: Vec<CabinetSource> = Vec::new();
    for row in tablerow::read_rows(package, "Media")? {
        let reference = row.get_string("Cabinet");
        let Some(source) = CabinetSource::from_reference(&reference) else {
            info!(
                "Empty Cabinet value in Media table (DiskId {})",
                row.get_string("DiskId")
            );
            continue;
        };
        if sources.iter().any(|known| {
            known.cabinet_name == source.cabinet_name
                && known.is_embedded_stream == source.is_embedded_stream
        }) {
            debug!("Cabinet {reference:?} is listed more than once");
            continue;
        }
        sources.push(source);
    }
    Ok(sources)
}

fn local_file_name(cabinet_name: &str) -> String {
    cabinet_name.replace(&['/', '\\', ':'][..], "_")
}

/// Deletes a file even if it is marked read-only.
fn remove_file_forcefully(path: &Path) -> io::Result<()> {
    let mut permissions = fs::metadata(path)?.permissions();
    if permissions.readonly() {
        permissions.set_readonly(false);
        fs::set_permissions(path, permissions)?;
    }
    fs::remove_file(path)
}

// ========================================================================= //


// ========================================================================= //
