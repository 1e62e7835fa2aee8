// ========================================================================= //

/// What an extraction is doing when it reports progress.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ExtractionActivity {
    /// Opening the package and reading its tables.
    Initializing,
    /// Preparing a cabinet (copying it out of the package, merging a set).
    Uncompressing,
    /// Writing one file.
    ExtractingFile,
    /// Done, successfully or not.
    Complete,
}

/// A progress snapshot passed to the extraction callback.
#[derive(Clone, Debug)]
pub struct ExtractionProgress {
    activity: ExtractionActivity,
    current_file_name: String,
    files_extracted_so_far: usize,
    total_file_count: usize,
}

impl ExtractionProgress {
    pub(crate) fn new(total_file_count: usize) -> ExtractionProgress {
        ExtractionProgress {
            activity: ExtractionActivity::Initializing,
            current_file_name: String::new(),
            files_extracted_so_far: 0,
            total_file_count,
        }
    }

    pub(crate) fn update(
        &mut self,
        activity: ExtractionActivity,
        current_file_name: &str,
        files_extracted_so_far: usize,
    ) {
        self.activity = activity;
        self.current_file_name.clear();
        self.current_file_name.push_str(current_file_name);
        self.files_extracted_so_far = files_extracted_so_far;
    }

    pub(crate) fn set_total_file_count(&mut self, total_file_count: usize) {
        self.total_file_count = total_file_count;
    }

    /// Returns the current activity.
    pub fn activity(&self) -> ExtractionActivity {
        self.activity
    }

    /// Returns the long name of the file being written, or the cabinet being
    /// prepared.  Empty when neither applies.
    pub fn current_file_name(&self) -> &str {
        &self.current_file_name
    }

    /// Returns how many files have been written so far.
    pub fn files_extracted_so_far(&self) -> usize {
        self.files_extracted_so_far
    }

    /// Returns how many files this extraction intends to write.
    pub fn total_file_count(&self) -> usize {
        self.total_file_count
    }

    /// Returns true once the extraction has finished.
    pub fn is_complete(&self) -> bool {
        self.activity == ExtractionActivity::Complete
    }
}

// ========================================================================= //
