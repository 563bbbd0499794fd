/*!
 * Configuration handling for treedump
 */

use std::fs;
use std::path::{Path, PathBuf};

use clap::{Parser, ValueEnum};
use clap_complete::Shell;
use serde::{Deserialize, Serialize};
use strum::Display;
use tracing::debug;

use crate::error::{Result, ResultExt};
use crate::matcher::{parse_extensions, FilterSet, TargetSet};
use crate::report::ReportFormat;
use crate::utils::{DEFAULT_IGNORE, DEFAULT_IGNORE_EXTS};
use crate::{ensure, error};

/// Which entries end up in the report
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Display, Serialize)]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum Mode {
    /// Everything except the ignore set, with file contents (default)
    #[default]
    Exclude,
    /// Only what matches the target set, with file contents
    Include,
    /// Everything except the ignore set, hierarchy only
    HierarchyOnly,
}

impl Mode {
    /// Whether the report gets a content section
    pub fn writes_content(self) -> bool {
        !matches!(self, Mode::HierarchyOnly)
    }
}

/// Command-line arguments for treedump
#[derive(Parser, Debug, Clone)]
#[clap(
    name = "treedump",
    version = env!("CARGO_PKG_VERSION"),
    about = "Snapshot a directory into a single text report",
    long_about = "Writes a text report with an ASCII tree of a directory and, depending on the mode, the fenced contents of its files."
)]
pub struct Args {
    /// Directory to snapshot
    #[clap(default_value = ".")]
    pub root: String,

    /// Filtering mode
    #[clap(long, value_enum, default_value_t = Mode::Exclude)]
    pub mode: Mode,

    /// Pipe-delimited names or relative paths to ignore (e.g. ".git|node_modules|*.log")
    #[clap(long, default_value = "")]
    pub ignore: String,

    /// Pipe-delimited extensions to ignore (e.g. "log|tmp|.bak")
    #[clap(long, default_value = "")]
    pub ignore_ext: String,

    /// Pipe-delimited folders, file names or relative paths to include (include mode)
    #[clap(long, default_value = "")]
    pub target: String,

    /// Pipe-delimited extensions to include (include mode)
    #[clap(long, default_value = "")]
    pub target_ext: String,

    /// Directory the report is written to
    #[clap(long, default_value = "outputs")]
    pub output_dir: String,

    /// Do not add the default ignore list
    #[clap(long)]
    pub no_default_ignores: bool,

    /// JSON file mapping extensions to code-fence tags
    #[clap(long)]
    pub lang_map: Option<String>,

    /// Format of the end-of-run summary
    #[clap(long, value_enum, default_value_t = ReportFormat::Table)]
    pub summary: ReportFormat,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[clap(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Disable logging
    #[clap(short, long)]
    pub quiet: bool,

    /// Generate shell completions
    #[clap(long = "generate", value_enum)]
    pub generate: Option<Shell>,
}

/// Default ignore entries, read from `<config dir>/treedump/defaults.json`
/// when present
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Defaults {
    #[serde(default)]
    pub ignore_items: Vec<String>,
    #[serde(default)]
    pub ignore_exts: Vec<String>,
}

impl Defaults {
    /// The built-in lists
    pub fn builtin() -> Self {
        Self {
            ignore_items: DEFAULT_IGNORE.iter().map(|s| s.to_string()).collect(),
            ignore_exts: DEFAULT_IGNORE_EXTS.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Location of the user defaults file
    pub fn user_file() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("treedump").join("defaults.json"))
    }

    /// User defaults if the file exists, built-in lists otherwise
    pub fn load() -> Result<Self> {
        match Self::user_file() {
            Some(path) if path.is_file() => Self::from_file(&path),
            _ => Ok(Self::builtin()),
        }
    }

    /// Read defaults from a JSON file
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading default ignores from {}", path.display());
        let raw = fs::read_to_string(path)
            .with_context(|| format!("reading defaults file {}", path.display()))?;
        serde_json::from_str(&raw)
            .map_err(|e| error!(Config, "invalid defaults file {}: {}", path.display(), e))
    }

    /// Ignore set made of these defaults
    pub fn filter_set(&self) -> FilterSet {
        let mut set = FilterSet::parse(&self.ignore_items.join("|"));
        set.extend(
            parse_extensions(&self.ignore_exts.join("|"))
                .into_iter()
                .collect(),
        );
        set
    }
}

/// Application configuration
#[derive(Clone, Debug)]
pub struct Config {
    /// Directory to snapshot
    pub root: PathBuf,

    /// Filtering mode
    pub mode: Mode,

    /// Ignore set (exclude and hierarchy-only modes)
    pub ignore: FilterSet,

    /// Target set (include mode)
    pub targets: TargetSet,

    /// Directory the report is written to
    pub output_dir: PathBuf,

    /// Optional extension to fence-tag overrides
    pub lang_map: Option<PathBuf>,
}

impl Config {
    /// Configuration with no filters
    pub fn new(root: impl Into<PathBuf>, mode: Mode, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            mode,
            ignore: FilterSet::new(),
            targets: TargetSet::default(),
            output_dir: output_dir.into(),
            lang_map: None,
        }
    }

    /// Create configuration from command-line arguments
    pub fn from_args(args: Args) -> Result<Self> {
        let mut ignore = FilterSet::parse(&args.ignore);
        ignore.extend(parse_extensions(&args.ignore_ext).into_iter().collect());
        if !args.no_default_ignores {
            ignore.extend(Defaults::load()?.filter_set());
        }

        Ok(Self {
            root: PathBuf::from(args.root),
            mode: args.mode,
            ignore,
            targets: TargetSet::parse(&args.target, &args.target_ext),
            output_dir: PathBuf::from(args.output_dir),
            lang_map: args.lang_map.map(PathBuf::from),
        })
    }

    /// Validate the configuration before anything is scanned
    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.root.is_dir(),
            Validation,
            "The path '{}' is not a valid directory",
            self.root.display()
        );

        if let Some(path) = &self.lang_map {
            ensure!(
                path.is_file(),
                Config,
                "Language map file not found: {}",
                path.display()
            );
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn parse(argv: &[&str]) -> Args {
        Args::parse_from(std::iter::once("treedump").chain(argv.iter().copied()))
    }

    #[test]
    fn test_args_defaults() {
        let args = parse(&[]);
        assert_eq!(args.root, ".");
        assert_eq!(args.mode, Mode::Exclude);
        assert_eq!(args.output_dir, "outputs");
        assert_eq!(args.summary, ReportFormat::Table);
    }

    #[test]
    fn test_from_args_builds_filters() -> Result<()> {
        let args = parse(&[
            "proj",
            "--mode",
            "include",
            "--ignore",
            "tmp|*.bak",
            "--ignore-ext",
            "log",
            "--target",
            "src|docs/readme.md",
            "--target-ext",
            "PY",
            "--no-default-ignores",
        ]);
        let config = Config::from_args(args)?;

        assert_eq!(config.mode, Mode::Include);
        assert!(config.ignore.contains("tmp"));
        assert!(config.ignore.contains(".bak"));
        assert!(config.ignore.contains(".log"));
        assert!(!config.ignore.contains(".git"));
        assert!(config.targets.folders.contains("src"));
        assert!(config.targets.files.contains("docs/readme.md"));
        assert!(config.targets.extensions.contains(".py"));
        Ok(())
    }

    #[test]
    fn test_mode_names() {
        assert_eq!(Mode::default(), Mode::Exclude);
        assert_eq!(Mode::HierarchyOnly.to_string(), "hierarchy-only");
        assert_eq!(parse(&["--mode", "hierarchy-only"]).mode, Mode::HierarchyOnly);
        assert!(!Mode::HierarchyOnly.writes_content());
        assert!(Mode::Include.writes_content());
    }

    #[test]
    fn test_validate_rejects_missing_root() {
        let config = Config::new("/no/such/dir/anywhere", Mode::Exclude, "outputs");
        let err = config.validate().unwrap_err();
        assert!(matches!(err, crate::error::TreeDumpError::Validation(_)));
    }

    #[test]
    fn test_validate_rejects_file_root() -> Result<()> {
        let dir = tempdir()?;
        let file = dir.path().join("plain.txt");
        fs::write(&file, "x")?;
        let config = Config::new(&file, Mode::Exclude, "outputs");
        assert!(config.validate().is_err());
        Ok(())
    }

    #[test]
    fn test_defaults_file() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("defaults.json");
        fs::write(
            &path,
            r#"{"ignore_items": [".git", "*.min.js"], "ignore_exts": ["log"]}"#,
        )?;

        let set = Defaults::from_file(&path)?.filter_set();
        assert!(set.contains(".git"));
        assert!(set.contains(".min.js"));
        assert!(set.contains(".log"));
        Ok(())
    }

    #[test]
    fn test_builtin_defaults_ignore_git() {
        assert!(Defaults::builtin().filter_set().contains(".git"));
    }
}
