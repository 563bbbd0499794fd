/*!
 * Filter tokens and path matching
 *
 * Matching is exact and case-sensitive. The only normalisation happens at
 * parse time, where `*.ext` tokens become `.ext`.
 */

use std::collections::BTreeSet;
use std::path::Path;

/// Extension of a file name including its leading dot (`"main.rs"` -> `".rs"`).
///
/// Dotfiles such as `.gitignore` and names ending in a dot have no extension.
pub fn suffix(name: &str) -> Option<String> {
    Path::new(name)
        .extension()
        .map(|ext| ext.to_string_lossy())
        .filter(|ext| !ext.is_empty())
        .map(|ext| format!(".{}", ext))
}

/// Whether `path` equals `prefix` or lies below it, segment-wise
fn is_path_prefix(prefix: &str, path: &str) -> bool {
    path.strip_prefix(prefix)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
}

/// Split a pipe-delimited filter string into trimmed, non-empty tokens
fn tokens(input: &str) -> impl Iterator<Item = &str> {
    input.split('|').map(str::trim).filter(|t| !t.is_empty())
}

/// Parse a pipe-delimited extension list (`"py|.MD| rs"`).
///
/// Tokens are lower-cased and given a leading dot when missing.
pub fn parse_extensions(input: &str) -> BTreeSet<String> {
    tokens(input)
        .map(|ext| {
            let ext = ext.to_lowercase();
            if ext.starts_with('.') {
                ext
            } else {
                format!(".{}", ext)
            }
        })
        .collect()
}

/// A set of filter tokens: bare names, relative POSIX paths or `.ext` tokens
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterSet {
    tokens: BTreeSet<String>,
}

impl FilterSet {
    /// Create an empty filter set
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a pipe-delimited filter string (`".git|node_modules|*.log"`)
    pub fn parse(input: &str) -> Self {
        tokens(input)
            .map(|token| match token.strip_prefix("*.") {
                Some(ext) => format!(".{}", ext),
                None => token.to_string(),
            })
            .collect()
    }

    /// Add a single token as-is
    pub fn insert(&mut self, token: impl Into<String>) {
        self.tokens.insert(token.into());
    }

    /// Merge another set into this one
    pub fn extend(&mut self, other: FilterSet) {
        self.tokens.extend(other.tokens);
    }

    /// Whether the token is present
    pub fn contains(&self, token: &str) -> bool {
        self.tokens.contains(token)
    }

    /// Whether the set has no tokens
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Number of tokens
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// Iterate over tokens in sorted order
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.tokens.iter().map(String::as_str)
    }

    /// Whether an entry matches this set.
    ///
    /// Checked in order: bare name, root-relative path, and for files the
    /// extension.
    pub fn matches(&self, name: &str, rel_path: &str, is_dir: bool) -> bool {
        if self.contains(name) {
            return true;
        }
        if !rel_path.is_empty() && rel_path != "." && self.contains(rel_path) {
            return true;
        }
        if !is_dir {
            if let Some(ext) = suffix(name) {
                return self.contains(&ext);
            }
        }
        false
    }
}

impl FromIterator<String> for FilterSet {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        Self {
            tokens: iter.into_iter().collect(),
        }
    }
}

impl<'a> FromIterator<&'a str> for FilterSet {
    fn from_iter<I: IntoIterator<Item = &'a str>>(iter: I) -> Self {
        iter.into_iter().map(str::to_string).collect()
    }
}

/// Include filters for "include" mode.
///
/// An empty category places no restriction on the scan.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TargetSet {
    /// Folder names or relative folder paths
    pub folders: FilterSet,
    /// File names or relative file paths
    pub files: FilterSet,
    /// Extensions with their leading dot
    pub extensions: FilterSet,
}

impl TargetSet {
    /// Parse the target item string and the target extension string.
    ///
    /// Items containing neither `/` nor `.` are folders; everything else is a
    /// file target.
    pub fn parse(items: &str, extensions: &str) -> Self {
        let (folders, files): (Vec<String>, Vec<String>) = FilterSet::parse(items)
            .tokens
            .into_iter()
            .partition(|item| !item.contains('/') && !item.contains('.'));

        Self {
            folders: folders.into_iter().collect(),
            files: files.into_iter().collect(),
            extensions: parse_extensions(extensions).into_iter().collect(),
        }
    }

    /// Whether the directory itself is named by a folder target
    pub fn targets_dir(&self, name: &str, rel_path: &str) -> bool {
        self.folders.contains(name) || self.folders.contains(rel_path)
    }

    /// Whether the directory sits at or below a targeted folder path
    pub fn is_under_target(&self, rel_path: &str) -> bool {
        self.folders
            .iter()
            .any(|target| is_path_prefix(target, rel_path))
    }

    /// Whether a targeted folder path lies below the directory
    pub fn leads_to_target(&self, rel_path: &str) -> bool {
        self.folders
            .iter()
            .any(|target| target != rel_path && is_path_prefix(rel_path, target))
    }

    /// Whether descending into a directory could still reach a match
    pub fn should_descend(&self, name: &str, rel_path: &str) -> bool {
        self.folders.is_empty()
            || self.targets_dir(name, rel_path)
            || self.is_under_target(rel_path)
            || self.leads_to_target(rel_path)
            || !self.files.is_empty()
            || !self.extensions.is_empty()
    }

    /// Whether a file's name, path or extension satisfies the file criteria
    pub fn file_matches(&self, name: &str, rel_path: &str) -> bool {
        if self.files.is_empty() && self.extensions.is_empty() {
            return true;
        }
        let by_extension = !self.extensions.is_empty()
            && suffix(name).is_some_and(|ext| self.extensions.contains(&ext));
        let by_name = !self.files.is_empty()
            && (self.files.contains(name) || self.files.contains(rel_path));
        by_extension || by_name
    }

    /// Whether a file lives where the folder targets allow.
    ///
    /// Either an ancestor directory name is targeted, or the parent's
    /// relative path is (or lies below) a targeted folder path. Files at the
    /// root are never eligible once folder targets exist.
    pub fn path_eligible(&self, rel_path: &str) -> bool {
        if self.folders.is_empty() {
            return true;
        }
        let Some((parent, _)) = rel_path.rsplit_once('/') else {
            return false;
        };

        parent.split('/').any(|part| self.folders.contains(part)) || self.is_under_target(parent)
    }

    /// Full file predicate: criteria match and path eligibility
    pub fn includes_file(&self, name: &str, rel_path: &str) -> bool {
        self.file_matches(name, rel_path) && self.path_eligible(rel_path)
    }
}
