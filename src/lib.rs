//! A library for viewing and extracting the contents of [Windows
//! Installer](https://en.wikipedia.org/wiki/Windows_Installer) packages
//! (`.msi` and `.msp` files).
//!
//! An installer package describes where every file goes with three
//! database tables: `Directory`, `Component` and `File`.  The file data
//! itself lives in cabinet (`.cab`) archives, either embedded as streams in
//! the package or sitting next to it on disk, and listed in the `Media`
//! table.  This crate joins the tables into an [`InstallLayout`] and writes
//! the files out of the cabinets, merging cabinets that span several parts.
//!
//! ```no_run
//! use lessmsi::{ExtractOptions, ExtractionMode};
//!
//! let options =
//!     ExtractOptions::new().with_mode(ExtractionMode::PreserveDirectories);
//! let report = lessmsi::extract("setup.msi", "setup", &options)?;
//! println!("Extracted {} files", report.extracted().len());
//! # Ok::<(), lessmsi::Error>(())
//! ```

#![warn(missing_docs)]

mod internal;

pub use internal::cabinet::{read_media, CabinetSource};
pub use internal::cabset::{
    link_chains, merge_cabinets, CabinetChain, CabinetHeader, LinkedCabinet,
};
pub use internal::directory::{DefaultDir, DirectoryTree, MsiDirectory};
pub use internal::error::{Error, Result};
pub use internal::extract::{
    extract, extract_with_progress, ExtractOptions, ExtractionReport,
};
pub use internal::file::{InstallLayout, MsiFile};
pub use internal::mode::ExtractionMode;
pub use internal::olestorage::{find_cabinet_stream, OleStream};
pub use internal::progress::{ExtractionActivity, ExtractionProgress};
pub use internal::query::{
    open_package, product_version, summary_properties, write_table_csv,
};
pub use internal::streamname::StreamKind;
pub use internal::tablerow::{read_rows, TableRow};
pub use msi::Package;

/// Decodes a raw compound-file stream name into the name the database uses.
pub fn decode_stream_name(raw_name: &str) -> (String, StreamKind) {
    internal::streamname::decode(raw_name)
}
