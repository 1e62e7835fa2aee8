use std::io;
use std::path::PathBuf;

// ========================================================================= //

/// Errors that abort an extraction or query.
///
/// Problems confined to a single cabinet or a single file are not reported
/// through this type; they are logged and recorded in the
/// [`ExtractionReport`](crate::ExtractionReport) instead.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The package refers to a cabinet stored next to it on disk, but no
    /// such file exists.
    #[error(
        "This msi file references a CAB file that is not embedded inside of \
         the msi file itself. The cab file is named {cabinet} and was \
         expected to be in the following folder: {}",
        folder.display()
    )]
    ExternalCabNotFound {
        /// The cabinet name, as it appears in the `Media` table.
        cabinet: String,
        /// The folder that was searched (the package's parent directory).
        folder: PathBuf,
    },

    /// The file could not be opened as an installer database.
    #[error("Unable to open {} as an msi or msp file: {source}", path.display())]
    OpenPackage {
        /// The path of the package.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: io::Error,
    },

    /// Any other I/O failure.
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Shorthand for results whose error is [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

// ========================================================================= //


// ========================================================================= //
