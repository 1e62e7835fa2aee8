use std::fmt;
use std::str::FromStr;

// ========================================================================= //

/// How extracted files are laid out and how name collisions are handled.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum ExtractionMode {
    /// Mirror the package's directory tree.  A file whose target was
    /// already written earlier in the same extraction gets a
    /// `.duplicateN` suffix.
    #[default]
    PreserveDirectories,
    /// Mirror the package's directory tree, overwriting on collision.
    OverwriteDirectories,
    /// Put every file directly in the output directory, renaming colliding
    /// files to `name_N.ext`.
    RenameFlat,
    /// Put every file directly in the output directory, overwriting on
    /// collision.
    OverwriteFlat,
}

impl ExtractionMode {
    /// Returns true for the modes that drop the directory tree.
    pub fn is_flat(self) -> bool {
        matches!(self, ExtractionMode::RenameFlat | ExtractionMode::OverwriteFlat)
    }

    /// Returns the command-line verb that selects this mode.
    pub fn command(self) -> &'static str {
        match self {
            ExtractionMode::PreserveDirectories => "x",
            ExtractionMode::OverwriteDirectories => "xo",
            ExtractionMode::RenameFlat => "xfr",
            ExtractionMode::OverwriteFlat => "xfo",
        }
    }
}

impl fmt::Display for ExtractionMode {
    fn fmt(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        let name = match *self {
            ExtractionMode::PreserveDirectories => "preserve directories",
            ExtractionMode::OverwriteDirectories => "overwrite directories",
            ExtractionMode::RenameFlat => "flat, rename on collision",
            ExtractionMode::OverwriteFlat => "flat, overwrite on collision",
        };
        formatter.write_str(name)
    }
}

impl FromStr for ExtractionMode {
    type Err = String;

    fn from_str(command: &str) -> Result<ExtractionMode, String> {
        match command {
            "x" | "/x" => Ok(ExtractionMode::PreserveDirectories),
            "xo" => Ok(ExtractionMode::OverwriteDirectories),
            "xfr" => Ok(ExtractionMode::RenameFlat),
            "xfo" => Ok(ExtractionMode::OverwriteFlat),
            _ => Err(format!("{command:?} is not an extraction command")),
        }
    }
}

// ========================================================================= //


// ========================================================================= //
