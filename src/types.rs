/*!
 * Core types and data structures for treedump
 */

use std::fmt;
use std::io;
use std::path::PathBuf;

/// An entry inside a [`Tree`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    /// A file leaf
    File,
    /// A directory, possibly empty
    Directory(Tree),
}

/// Hierarchical view of a scanned directory.
///
/// Entries keep the order in which they were inserted, which is the
/// walkers' discovery order at each level.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tree {
    entries: Vec<(String, Node)>,
}

impl Tree {
    /// Create an empty tree
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a file leaf
    pub fn insert_file(&mut self, name: impl Into<String>) {
        self.entries.push((name.into(), Node::File));
    }

    /// Append a directory node
    pub fn insert_dir(&mut self, name: impl Into<String>, subtree: Tree) {
        self.entries.push((name.into(), Node::Directory(subtree)));
    }

    /// Look up a direct child by name
    pub fn get(&self, name: &str) -> Option<&Node> {
        self.entries
            .iter()
            .find(|(entry, _)| entry == name)
            .map(|(_, node)| node)
    }

    /// Iterate over direct children in order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Node)> {
        self.entries.iter().map(|(name, node)| (name.as_str(), node))
    }

    /// Number of direct children
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the tree has no children
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Relative POSIX paths of every file leaf, depth-first
    pub fn file_paths(&self) -> Vec<String> {
        let mut paths = Vec::new();
        self.collect_files("", &mut paths);
        paths
    }

    /// Number of file leaves at any depth
    pub fn file_count(&self) -> usize {
        self.iter()
            .map(|(_, node)| match node {
                Node::File => 1,
                Node::Directory(sub) => sub.file_count(),
            })
            .sum()
    }

    fn collect_files(&self, prefix: &str, out: &mut Vec<String>) {
        for (name, node) in self.iter() {
            let path = if prefix.is_empty() {
                name.to_string()
            } else {
                format!("{}/{}", prefix, name)
            };
            match node {
                Node::File => out.push(path),
                Node::Directory(sub) => sub.collect_files(&path, out),
            }
        }
    }
}

/// A file whose content goes in the report
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct FileEntry {
    /// Root-relative POSIX path, as printed in the report
    pub rel: String,
    /// Path on disk; differs from `root/rel` for names that are not UTF-8
    pub path: PathBuf,
}

impl FileEntry {
    /// Create an entry from its display path and its path on disk
    pub fn new(rel: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            rel: rel.into(),
            path: path.into(),
        }
    }
}

/// Files whose content goes in the report, sorted by relative path
pub type FileList = Vec<FileEntry>;

/// Category of a non-fatal scan problem
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WarningKind {
    /// Directory could not be read for lack of permission
    PermissionDenied,
    /// Entry vanished while scanning
    NotFound,
    /// Symlink whose target does not exist
    BrokenSymlink,
    /// Entry resolves outside the scan root
    EscapesRoot,
    /// Any other OS-level error
    Io(String),
}

impl From<&io::Error> for WarningKind {
    fn from(err: &io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::PermissionDenied => Self::PermissionDenied,
            io::ErrorKind::NotFound => Self::NotFound,
            _ => Self::Io(err.to_string()),
        }
    }
}

/// A per-entry problem met during a scan; the scan carries on without it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanWarning {
    /// Path the problem is about
    pub path: PathBuf,
    /// What went wrong
    pub kind: WarningKind,
}

impl ScanWarning {
    /// Create a warning for a path
    pub fn new(path: impl Into<PathBuf>, kind: WarningKind) -> Self {
        Self {
            path: path.into(),
            kind,
        }
    }
}

impl fmt::Display for ScanWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let path = self.path.display();
        match &self.kind {
            WarningKind::PermissionDenied => write!(f, "Permission denied: '{}'", path),
            WarningKind::NotFound => write!(f, "Directory not found during scan: '{}'", path),
            WarningKind::BrokenSymlink => write!(f, "Skipping broken symlink: '{}'", path),
            WarningKind::EscapesRoot => write!(f, "Skipping item outside root: '{}'", path),
            WarningKind::Io(msg) => write!(f, "OS error scanning '{}': {}", path, msg),
        }
    }
}

/// Everything one scan produced.
///
/// `files` is `None` when the mode writes no content section.
#[derive(Debug, Clone, Default)]
pub struct ScanResult {
    /// Hierarchy view
    pub tree: Tree,
    /// Files whose content is written
    pub files: Option<FileList>,
    /// Non-fatal problems, in the order they were met
    pub warnings: Vec<ScanWarning>,
    /// Directories whose listing was read
    pub dirs_scanned: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Tree {
        let mut src = Tree::new();
        src.insert_file("main.py");
        src.insert_file("util.py");
        let mut tree = Tree::new();
        tree.insert_dir("src", src);
        tree.insert_dir(".git", Tree::new());
        tree.insert_file("README.md");
        tree
    }

    #[test]
    fn test_file_paths_skip_empty_dirs() {
        let tree = sample();
        assert_eq!(
            tree.file_paths(),
            vec!["src/main.py", "src/util.py", "README.md"]
        );
        assert_eq!(tree.file_count(), 3);
        assert_eq!(tree.len(), 3);
    }

    #[test]
    fn test_get_child() {
        let tree = sample();
        assert_eq!(tree.get("README.md"), Some(&Node::File));
        assert_eq!(tree.get(".git"), Some(&Node::Directory(Tree::new())));
        assert!(tree.get("missing").is_none());
    }

    #[test]
    fn test_warning_display() {
        let warning = ScanWarning::new("/tmp/x", WarningKind::EscapesRoot);
        assert_eq!(warning.to_string(), "Skipping item outside root: '/tmp/x'");

        let err = io::Error::new(io::ErrorKind::PermissionDenied, "nope");
        assert_eq!(WarningKind::from(&err), WarningKind::PermissionDenied);
    }
}
