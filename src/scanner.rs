/*!
 * Directory scanning
 *
 * One walker, two policies. [`ExcludePolicy`] drops whatever matches an
 * ignore set; [`IncludePolicy`] keeps only what matches a target set. Each
 * scan produces a hierarchical [`Tree`] (recursive pass) and, when content is
 * wanted, a flat [`FileList`] (iterative pass over `walkdir`). Both passes use
 * the same policy and the same entry classification so they agree on which
 * files are in.
 */

use std::fs::{self, FileType};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::cancel::{CancellationToken, Cancelled};
use crate::matcher::{FilterSet, TargetSet};
use crate::progress::ProgressSink;
use crate::types::{FileEntry, FileList, ScanResult, ScanWarning, Tree, WarningKind};

/// Directories between two "still scanning" progress messages
pub const PROGRESS_EVERY_DIRS: usize = 50;

/// What to do with a directory met during a walk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirVisit {
    /// Walk into it
    Descend,
    /// Show it as an empty node without reading it
    Stub,
    /// Leave it out entirely
    Skip,
}

/// Decisions that drive a walk
pub trait WalkPolicy {
    /// Decide how to treat a directory before reading it
    fn visit_dir(&self, name: &str, rel_path: &str) -> DirVisit;

    /// Decide whether a descended directory stays in the tree
    fn keep_dir(&self, name: &str, rel_path: &str, subtree: &Tree) -> bool;

    /// Decide whether a file is in
    fn include_file(&self, name: &str, rel_path: &str) -> bool;
}

/// Ignore-set semantics: matching directories become empty nodes, matching
/// files disappear
#[derive(Debug, Clone, Default)]
pub struct ExcludePolicy {
    ignore: FilterSet,
}

impl ExcludePolicy {
    /// Policy that leaves out whatever `ignore` matches
    pub fn new(ignore: FilterSet) -> Self {
        Self { ignore }
    }
}

impl WalkPolicy for ExcludePolicy {
    fn visit_dir(&self, name: &str, rel_path: &str) -> DirVisit {
        if self.ignore.matches(name, rel_path, true) {
            DirVisit::Stub
        } else {
            DirVisit::Descend
        }
    }

    fn keep_dir(&self, _name: &str, _rel_path: &str, _subtree: &Tree) -> bool {
        true
    }

    fn include_file(&self, name: &str, rel_path: &str) -> bool {
        !self.ignore.matches(name, rel_path, false)
    }
}

/// Target-set semantics: keep matching files and the directories leading to
/// them, plus explicitly targeted directories
#[derive(Debug, Clone, Default)]
pub struct IncludePolicy {
    targets: TargetSet,
    /// Relative directory paths pruned whatever the targets say
    skip: FilterSet,
}

impl IncludePolicy {
    /// Policy that keeps only what `targets` selects
    pub fn new(targets: TargetSet) -> Self {
        Self {
            targets,
            skip: FilterSet::new(),
        }
    }

    /// Never walk into the directory at `rel_path`
    pub fn skipping(mut self, rel_path: impl Into<String>) -> Self {
        self.skip.insert(rel_path);
        self
    }
}

impl WalkPolicy for IncludePolicy {
    fn visit_dir(&self, name: &str, rel_path: &str) -> DirVisit {
        if self.skip.contains(rel_path) {
            DirVisit::Skip
        } else if self.targets.should_descend(name, rel_path) {
            DirVisit::Descend
        } else {
            DirVisit::Skip
        }
    }

    fn keep_dir(&self, name: &str, rel_path: &str, subtree: &Tree) -> bool {
        self.targets.targets_dir(name, rel_path) || !subtree.is_empty()
    }

    fn include_file(&self, name: &str, rel_path: &str) -> bool {
        self.targets.includes_file(name, rel_path)
    }
}

/// What an entry turned out to be once symlinks are resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EntryKind {
    File,
    Dir { symlink: bool },
}

/// A directory entry ready to be walked
struct Listed {
    name: String,
    path: PathBuf,
    kind: EntryKind,
}

/// Walker over one root directory
pub struct Scanner<P: WalkPolicy> {
    /// Canonical scan root
    root: PathBuf,
    policy: P,
    token: CancellationToken,
    progress: Arc<dyn ProgressSink>,
    warnings: Vec<ScanWarning>,
    dirs_seen: usize,
}

/// Walker with ignore-set semantics
pub type ExclusionWalker = Scanner<ExcludePolicy>;

/// Walker with target-set semantics
pub type InclusionWalker = Scanner<IncludePolicy>;

impl<P: WalkPolicy> Scanner<P> {
    /// Create a scanner; the root is canonicalised here and must be readable
    /// as a path
    pub fn new(
        root: &Path,
        policy: P,
        token: CancellationToken,
        progress: Arc<dyn ProgressSink>,
    ) -> std::io::Result<Self> {
        Ok(Self {
            root: fs::canonicalize(root)?,
            policy,
            token,
            progress,
            warnings: Vec::new(),
            dirs_seen: 0,
        })
    }

    /// Canonical root this scanner walks
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Warnings gathered so far
    pub fn warnings(&self) -> &[ScanWarning] {
        &self.warnings
    }

    /// Run the tree pass and, when `with_files` is set, the flat-list pass
    pub fn scan(mut self, with_files: bool) -> Result<ScanResult, Cancelled> {
        let tree = self.scan_tree()?;
        let dirs_scanned = self.dirs_seen;
        let files = if with_files {
            Some(self.list_files()?)
        } else {
            None
        };

        Ok(ScanResult {
            tree,
            files,
            warnings: self.warnings,
            dirs_scanned,
        })
    }

    /// Build the hierarchical view of the root
    pub fn scan_tree(&mut self) -> Result<Tree, Cancelled> {
        self.token.check()?;
        self.dirs_seen = 0;
        self.progress.report("Building tree structure...");
        let root = self.root.clone();
        self.walk_dir(&root)
    }

    fn walk_dir(&mut self, dir: &Path) -> Result<Tree, Cancelled> {
        self.token.check()?;
        let mut tree = Tree::new();

        let Some(entries) = self.read_sorted(dir)? else {
            return Ok(tree);
        };
        if let Some(rel) = self.relative(dir) {
            self.note_dir(&rel, "Scanning");
        }

        for entry in entries {
            self.token.check()?;

            let Some(rel) = self.relative(&entry.path) else {
                self.warn(ScanWarning::new(&entry.path, WarningKind::EscapesRoot));
                continue;
            };

            match entry.kind {
                EntryKind::File => {
                    if self.policy.include_file(&entry.name, &rel) {
                        tree.insert_file(entry.name);
                    }
                }
                EntryKind::Dir { symlink } => match self.policy.visit_dir(&entry.name, &rel) {
                    DirVisit::Skip => {}
                    DirVisit::Stub => tree.insert_dir(entry.name, Tree::new()),
                    DirVisit::Descend => {
                        // linked directories are shown but never entered
                        let subtree = if symlink {
                            Tree::new()
                        } else {
                            self.walk_dir(&entry.path)?
                        };
                        if self.policy.keep_dir(&entry.name, &rel, &subtree) {
                            tree.insert_dir(entry.name, subtree);
                        }
                    }
                },
            }
        }

        Ok(tree)
    }

    /// Read a directory, classify its entries and order them directories
    /// first, then by lower-cased name. An unreadable directory yields
    /// `None` after recording a warning.
    fn read_sorted(&mut self, dir: &Path) -> Result<Option<Vec<Listed>>, Cancelled> {
        debug!("Reading directory {}", dir.display());
        let reader = match fs::read_dir(dir) {
            Ok(reader) => reader,
            Err(err) => {
                self.warn(ScanWarning::new(dir, WarningKind::from(&err)));
                return Ok(None);
            }
        };

        let mut listed = Vec::new();
        for entry in reader {
            self.token.check()?;
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    self.warn(ScanWarning::new(dir, WarningKind::from(&err)));
                    continue;
                }
            };
            let path = entry.path();
            let file_type = match entry.file_type() {
                Ok(file_type) => file_type,
                Err(err) => {
                    self.warn(ScanWarning::new(&path, WarningKind::from(&err)));
                    continue;
                }
            };
            if let Some(kind) = self.classify(&path, file_type) {
                listed.push(Listed {
                    name: entry.file_name().to_string_lossy().to_string(),
                    path,
                    kind,
                });
            }
        }

        listed.sort_by_cached_key(|e| (e.kind == EntryKind::File, e.name.to_lowercase()));
        Ok(Some(listed))
    }

    /// Collect the sorted relative paths of every file the policy lets in
    pub fn list_files(&mut self) -> Result<FileList, Cancelled> {
        self.token.check()?;
        self.dirs_seen = 0;
        self.progress.report("Starting file traversal...");

        let mut files = FileList::new();
        let mut walker = WalkDir::new(&self.root)
            .min_depth(1)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter();

        while let Some(next) = walker.next() {
            self.token.check()?;

            let entry = match next {
                Ok(entry) => entry,
                Err(err) => {
                    let kind = err
                        .io_error()
                        .map(WarningKind::from)
                        .unwrap_or_else(|| WarningKind::Io(err.to_string()));
                    let path = err.path().unwrap_or(&self.root).to_path_buf();
                    self.warn(ScanWarning::new(path, kind));
                    continue;
                }
            };

            let Some(rel) = self.relative(entry.path()) else {
                self.warn(ScanWarning::new(entry.path(), WarningKind::EscapesRoot));
                if entry.file_type().is_dir() {
                    walker.skip_current_dir();
                }
                continue;
            };
            let name = entry.file_name().to_string_lossy();

            if entry.file_type().is_dir() {
                if self.policy.visit_dir(&name, &rel) == DirVisit::Descend {
                    self.note_dir(&rel, "Collecting files in");
                } else {
                    walker.skip_current_dir();
                }
                continue;
            }

            if self.classify(entry.path(), entry.file_type()) == Some(EntryKind::File)
                && self.policy.include_file(&name, &rel)
            {
                files.push(FileEntry::new(rel, entry.path()));
            }
        }

        files.sort();
        self.progress.report(&format!(
            "Finished file traversal. Found {} files.",
            files.len()
        ));
        Ok(files)
    }

    /// Resolve what an entry is. Symlinks are resolved to decide between file
    /// and directory; dangling links and links leaving the root are dropped
    /// with a warning. Sockets, fifos and devices are dropped silently.
    fn classify(&mut self, path: &Path, file_type: FileType) -> Option<EntryKind> {
        if file_type.is_dir() {
            return Some(EntryKind::Dir { symlink: false });
        }
        if file_type.is_file() {
            return Some(EntryKind::File);
        }
        if !file_type.is_symlink() {
            return None;
        }

        let target = match fs::canonicalize(path) {
            Ok(target) => target,
            Err(err) => {
                let kind = match err.kind() {
                    std::io::ErrorKind::NotFound => WarningKind::BrokenSymlink,
                    _ => WarningKind::from(&err),
                };
                self.warn(ScanWarning::new(path, kind));
                return None;
            }
        };
        if !target.starts_with(&self.root) {
            self.warn(ScanWarning::new(path, WarningKind::EscapesRoot));
            return None;
        }

        match fs::metadata(&target) {
            Ok(meta) if meta.is_dir() => Some(EntryKind::Dir { symlink: true }),
            Ok(meta) if meta.is_file() => Some(EntryKind::File),
            Ok(_) => None,
            Err(err) => {
                self.warn(ScanWarning::new(path, WarningKind::from(&err)));
                None
            }
        }
    }

    /// Root-relative POSIX path; `None` when the path is not under the root
    fn relative(&self, path: &Path) -> Option<String> {
        let rel = path.strip_prefix(&self.root).ok()?;
        Some(
            rel.components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/"),
        )
    }

    fn note_dir(&mut self, rel: &str, label: &str) {
        self.dirs_seen += 1;
        if self.dirs_seen % PROGRESS_EVERY_DIRS == 0 {
            self.progress.report(&format!("{}: {}...", label, rel));
        }
    }

    fn warn(&mut self, warning: ScanWarning) {
        warn!("{}", warning);
        self.progress.report(&format!("Warning: {}", warning));
        self.warnings.push(warning);
    }
}
