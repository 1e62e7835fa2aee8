use crate::internal::tablerow::TableRow;
use log::warn;
use std::collections::HashMap;
use std::path::PathBuf;

// ========================================================================= //

/// One entry of the `Directory` table.
///
/// See the MSI documentation for the [Directory
/// table](https://learn.microsoft.com/en-us/windows/win32/msi/directory-table).
#[derive(Clone, Debug)]
pub struct MsiDirectory {
    index: usize,
    directory: String,
    directory_parent: Option<String>,
    default_dir: String,
    target_name: String,
    source_name: String,
    short_name: String,
    parent: Option<usize>,
    children: Vec<usize>,
}

impl MsiDirectory {
    /// Returns the `Directory` key of this entry.
    pub fn directory(&self) -> &str {
        &self.directory
    }

    /// Returns the raw `Directory_Parent` value, if not null.  This may name
    /// a directory that doesn't exist in the table.
    pub fn directory_parent(&self) -> Option<&str> {
        self.directory_parent.as_deref()
    }

    /// Returns the raw `DefaultDir` value.
    pub fn default_dir(&self) -> &str {
        &self.default_dir
    }

    /// The name of this directory on the target machine.
    pub fn target_name(&self) -> &str {
        &self.target_name
    }

    /// The name of this directory on the source media.
    pub fn source_name(&self) -> &str {
        &self.source_name
    }

    /// The short (8.3) alias of the target name.
    pub fn short_name(&self) -> &str {
        &self.short_name
    }

    /// Returns true if this directory has no parent in the tree.
    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }
}

// ========================================================================= //

/// The names encoded in a `DefaultDir` value.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct DefaultDir {
    /// The short alias of the target name (same as the target name when no
    /// short name is given).
    pub short_name: String,
    /// The target directory name.
    pub target_name: String,
    /// The source directory name (same as the target name when no source
    /// name is given).
    pub source_name: String,
}

impl DefaultDir {
    /// Decomposes a `DefaultDir` value of the form
    /// `[short|]target[:[short|]source]`.  Never fails; an empty value gives
    /// empty names.
    pub fn parse(value: &str) -> DefaultDir {
        let (target, source) = match value.split_once(':') {
            Some((target, source)) => (target, Some(source)),
            None => (value, None),
        };
        let (short_name, target_name) = split_short_long(target);
        let source_name = match source {
            Some(source) => split_short_long(source).1,
            None => target_name,
        };
        DefaultDir {
            short_name: short_name.to_string(),
            target_name: target_name.to_string(),
            source_name: source_name.to_string(),
        }
    }
}

/// Splits a `short|long` pair.  Without a `|`, both halves are the whole
/// string.
pub(crate) fn split_short_long(value: &str) -> (&str, &str) {
    value.split_once('|').unwrap_or((value, value))
}

// ========================================================================= //

/// The forest of directories described by a `Directory` table.
#[derive(Clone, Debug, Default)]
pub struct DirectoryTree {
    nodes: Vec<MsiDirectory>,
    by_id: HashMap<String, usize>,
    roots: Vec<usize>,
}

impl DirectoryTree {
    /// Builds the tree from the rows of a `Directory` table.
    pub fn from_rows(rows: &[TableRow]) -> DirectoryTree {
        let mut nodes: Vec<MsiDirectory> = Vec::with_capacity(rows.len());
        let mut by_id = HashMap::with_capacity(rows.len());
        for row in rows {
            let directory = row.get_string("Directory");
            let default_dir = row.get_string("DefaultDir");
            let names = DefaultDir::parse(&default_dir);
            let directory_parent = row
                .get_str("Directory_Parent")
                .filter(|parent| !parent.is_empty())
                .map(str::to_string);
            let mut node = MsiDirectory {
                index: nodes.len(),
                directory: directory.clone(),
                directory_parent,
                default_dir,
                target_name: names.target_name,
                source_name: names.source_name,
                short_name: names.short_name,
                parent: None,
                children: Vec::new(),
            };
            if let Some(&existing) = by_id.get(&directory) {
                warn!("Directory {directory:?} is defined more than once");
                node.index = existing;
                nodes[existing] = node;
            } else {
                by_id.insert(directory, node.index);
                nodes.push(node);
            }
        }

        let mut roots = Vec::new();
        for index in 0..nodes.len() {
            let parent_index = match nodes[index].directory_parent.as_deref() {
                None => None,
                Some(parent) if parent == nodes[index].directory => None,
                Some(parent) => match by_id.get(parent) {
                    Some(&parent_index) => Some(parent_index),
                    None => {
                        warn!(
                            "Parent {parent:?} of directory {:?} is not in \
                             the Directory table; treating it as a root",
                            nodes[index].directory
                        );
                        None
                    }
                },
            };
            match parent_index {
                Some(parent_index) => {
                    nodes[index].parent = Some(parent_index);
                    nodes[parent_index].children.push(index);
                }
                None => roots.push(index),
            }
        }
        DirectoryTree { nodes, by_id, roots }
    }

    /// Returns the number of directories.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns true if the table had no directories.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Looks up a directory by its `Directory` key.
    pub fn get(&self, directory: &str) -> Option<&MsiDirectory> {
        self.by_id.get(directory).map(|&index| &self.nodes[index])
    }

    /// Returns an iterator over all directories, in table order.
    pub fn iter(&self) -> impl Iterator<Item = &MsiDirectory> {
        self.nodes.iter()
    }

    /// Returns an iterator over the directories that have no parent.
    pub fn roots(&self) -> impl Iterator<Item = &MsiDirectory> {
        self.roots.iter().map(move |&index| &self.nodes[index])
    }

    /// Returns the parent of the given directory, if any.
    pub fn parent(&self, directory: &MsiDirectory) -> Option<&MsiDirectory> {
        directory.parent.map(|index| &self.nodes[index])
    }

    /// Returns an iterator over the direct children of the given directory.
    pub fn children<'a>(
        &'a self,
        directory: &'a MsiDirectory,
    ) -> impl Iterator<Item = &'a MsiDirectory> {
        directory.children.iter().map(move |&index| &self.nodes[index])
    }

    /// Returns the relative path of the given directory: the target names of
    /// its ancestors and itself, root first.  A `.` target name means "same
    /// directory as the parent" and contributes no path segment.
    pub fn path(&self, directory: &MsiDirectory) -> PathBuf {
        let mut segments: Vec<&str> = Vec::new();
        let mut visited = vec![false; self.nodes.len()];
        let mut current = Some(directory.index);
        while let Some(index) = current {
            if visited[index] {
                warn!(
                    "Directory {:?} has a cyclic parent chain",
                    directory.directory
                );
                break;
            }
            visited[index] = true;
            let node = &self.nodes[index];
            segments.push(&node.target_name);
            current = node.parent;
        }
        let mut path = PathBuf::new();
        for segment in segments.into_iter().rev() {
            match segment {
                "" | "." => {}
                ".." => warn!(
                    "Ignoring \"..\" in the path of directory {:?}",
                    directory.directory
                ),
                _ => path.push(segment),
            }
        }
        path
    }
}

// ========================================================================= //


// ========================================================================= //
