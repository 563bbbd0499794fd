/*!
 * One generation run: validate, scan, name the output, write the report
 */

use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Local;
use tracing::{error, info, warn};

use crate::bail;
use crate::cancel::CancellationToken;
use crate::config::{Config, Mode};
use crate::error::{Result, ResultExt};
use crate::language::LanguageMap;
use crate::progress::{Phase, ProgressSink};
use crate::render::render;
use crate::report::RunSummary;
use crate::scanner::{ExcludePolicy, ExclusionWalker, IncludePolicy, InclusionWalker};
use crate::types::{ScanResult, ScanWarning};
use crate::utils::dir_display_name;
use crate::writer::{ReportWriter, WriteStatus};

/// Output names tried before giving up
pub const MAX_NAME_ATTEMPTS: usize = 20;

/// Appended to a report whose run was stopped after the file was created
pub const INTERRUPTED_MARKER: &str = "\n\n--- GENERATION INTERRUPTED ---\n";

/// How a run ended, short of a fatal error
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunStatus {
    /// The full report was written
    Completed(PathBuf),
    /// A stop request was honoured; the report, if any, is marked incomplete
    Stopped(Option<PathBuf>),
}

impl RunStatus {
    /// Report file, if one was created
    pub fn output(&self) -> Option<&Path> {
        match self {
            RunStatus::Completed(path) => Some(path),
            RunStatus::Stopped(path) => path.as_deref(),
        }
    }

    /// Short label for summaries
    pub fn label(&self) -> &'static str {
        match self {
            RunStatus::Completed(_) => "completed",
            RunStatus::Stopped(_) => "stopped",
        }
    }
}

/// Everything a finished run reports back
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub status: RunStatus,
    pub mode: Mode,
    pub warnings: Vec<ScanWarning>,
    pub dirs_scanned: usize,
    pub files_in_hierarchy: usize,
    pub files_written: usize,
    pub bytes_written: u64,
    pub duration: Duration,
}

impl RunOutcome {
    fn stopped_before_output(mode: Mode, started: Instant) -> Self {
        Self {
            status: RunStatus::Stopped(None),
            mode,
            warnings: Vec::new(),
            dirs_scanned: 0,
            files_in_hierarchy: 0,
            files_written: 0,
            bytes_written: 0,
            duration: started.elapsed(),
        }
    }

    /// Summary for the console or JSON reporter
    pub fn summary(&self) -> RunSummary {
        RunSummary {
            status: self.status.label().to_string(),
            mode: self.mode,
            output_file: self.status.output().map(|p| p.display().to_string()),
            duration: self.duration,
            dirs_scanned: self.dirs_scanned,
            files_in_hierarchy: self.files_in_hierarchy,
            files_written: self.files_written,
            bytes_written: self.bytes_written,
            warnings: self.warnings.iter().map(ToString::to_string).collect(),
        }
    }
}

/// Runs the scan and write pipeline for one configuration
pub struct Generator {
    config: Config,
    token: CancellationToken,
    progress: Arc<dyn ProgressSink>,
}

impl Generator {
    /// Create a new generator
    pub fn new(config: Config, token: CancellationToken, progress: Arc<dyn ProgressSink>) -> Self {
        Self {
            config,
            token,
            progress,
        }
    }

    /// Run once. Stops are reported through [`RunStatus::Stopped`]; only
    /// validation and output-level I/O problems come back as errors.
    pub fn run(&self) -> Result<RunOutcome> {
        let started = Instant::now();
        self.progress.phase(Phase::Idle);

        match self.execute(started) {
            Ok(outcome) => {
                let phase = match outcome.status {
                    RunStatus::Completed(_) => Phase::Completed,
                    RunStatus::Stopped(_) => Phase::Stopped,
                };
                self.progress.phase(phase);
                Ok(outcome)
            }
            Err(err) => {
                error!("Generation failed: {}", err);
                self.progress
                    .report(&format!("An error occurred during generation: {}", err));
                self.progress.phase(Phase::Failed);
                Err(err)
            }
        }
    }

    fn execute(&self, started: Instant) -> Result<RunOutcome> {
        let config = &self.config;
        config.validate()?;

        let languages = match &config.lang_map {
            Some(path) => LanguageMap::with_overrides_file(path)?,
            None => LanguageMap::new(),
        };
        let root = fs::canonicalize(&config.root).map_err(|e| {
            crate::error!(Validation, "Cannot resolve '{}': {}", config.root.display(), e)
        })?;
        let root_name = dir_display_name(&root);

        self.progress.phase(Phase::Scanning);
        info!("Starting generation for '{}' in {} mode", root_name, config.mode);
        self.progress.report(&format!(
            "Starting generation for '{}' in {} mode...",
            root_name, config.mode
        ));

        let scan = match self.scan(&root) {
            Ok(scan) => scan,
            Err(err) if err.is_cancelled() => {
                self.progress.report("Operation stopped by user.");
                return Ok(RunOutcome::stopped_before_output(config.mode, started));
            }
            Err(err) => return Err(err),
        };

        let no_files = scan.files.as_ref().map_or(true, Vec::is_empty);
        if scan.tree.is_empty() && no_files {
            warn!("No matching files or folders found based on filters");
            self.progress
                .report("Warning: No matching files or folders found based on filters.");
        }

        self.progress.phase(Phase::Writing);
        let output = resolve_output_path(&config.output_dir, &root_name, config.mode)?;
        self.progress
            .report(&format!("Writing output to: {}", output.display()));

        let writer = ReportWriter::new(languages, self.token.clone(), Arc::clone(&self.progress));
        let file = File::create(&output)
            .with_context(|| format!("creating report {}", output.display()))?;
        let mut out = BufWriter::new(file);

        writer.write_hierarchy(&mut out, &root_name, &render(&scan.tree))?;

        let mut files_written = 0;
        let mut stopped = self.token.is_cancelled();
        if !stopped {
            match &scan.files {
                Some(files) if config.mode.writes_content() => {
                    let outcome = writer.write_contents(&mut out, files)?;
                    files_written = outcome.files_written;
                    stopped = outcome.status == WriteStatus::Stopped;
                }
                _ => writer.write_content_skipped(&mut out, &config.mode.to_string())?,
            }
        }
        out.flush()?;
        drop(out);

        if stopped {
            mark_interrupted(&output);
            self.progress.report("Operation stopped by user.");
        } else {
            self.progress.report(&format!(
                "Generation complete! Output saved to: {}",
                output.display()
            ));
        }

        let bytes_written = fs::metadata(&output).map(|m| m.len()).unwrap_or(0);
        let status = if stopped {
            RunStatus::Stopped(Some(output))
        } else {
            RunStatus::Completed(output)
        };

        Ok(RunOutcome {
            status,
            mode: config.mode,
            files_in_hierarchy: scan.tree.file_count(),
            dirs_scanned: scan.dirs_scanned,
            warnings: scan.warnings,
            files_written,
            bytes_written,
            duration: started.elapsed(),
        })
    }

    /// Run the walker that matches the mode
    fn scan(&self, root: &Path) -> Result<ScanResult> {
        let config = &self.config;
        let token = self.token.clone();
        let progress = Arc::clone(&self.progress);
        let with_files = config.mode.writes_content();

        let result = match config.mode {
            Mode::Exclude | Mode::HierarchyOnly => {
                let mut ignore = config.ignore.clone();
                if let Some(rel) = self.output_dir_within(root) {
                    ignore.insert(rel);
                }
                self.progress
                    .report(&format!("Ignoring {} patterns.", ignore.len()));
                ExclusionWalker::new(root, ExcludePolicy::new(ignore), token, progress)?
                    .scan(with_files)?
            }
            Mode::Include => {
                let targets = &config.targets;
                self.progress.report(&format!(
                    "Targeting {} folders, {} files, {} extensions.",
                    targets.folders.len(),
                    targets.files.len(),
                    targets.extensions.len()
                ));
                let mut policy = IncludePolicy::new(targets.clone());
                if let Some(rel) = self.output_dir_within(root) {
                    policy = policy.skipping(rel);
                }
                InclusionWalker::new(root, policy, token, progress)?.scan(with_files)?
            }
        };

        Ok(result)
    }

    /// Relative path of the output directory when it lives inside the root,
    /// so earlier reports are not scanned back in
    fn output_dir_within(&self, root: &Path) -> Option<String> {
        let output = fs::canonicalize(&self.config.output_dir).ok()?;
        let rel = output.strip_prefix(root).ok()?;
        let rel = rel
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        (!rel.is_empty()).then_some(rel)
    }
}

/// Pick a free report path inside `dir`, creating the directory if needed
pub fn resolve_output_path(dir: &Path, root_name: &str, mode: Mode) -> Result<PathBuf> {
    fs::create_dir_all(dir)
        .with_context(|| format!("creating output directory {}", dir.display()))?;
    let base = format!("{}_hierarchy_{}", root_name, mode);
    let stamp = Local::now().format("%Y%m%d_%H%M%S").to_string();
    pick_free_name(dir, &base, &stamp)
}

/// `<base>.txt`, then `<base>_<stamp>.txt`, then `<base>_<stamp>_<n>.txt`
fn pick_free_name(dir: &Path, base: &str, stamp: &str) -> Result<PathBuf> {
    for attempt in 0..MAX_NAME_ATTEMPTS {
        let name = match attempt {
            0 => format!("{}.txt", base),
            1 => format!("{}_{}.txt", base, stamp),
            n => format!("{}_{}_{}.txt", base, stamp, n),
        };
        let candidate = dir.join(name);
        if !candidate.exists() {
            return Ok(candidate);
        }
    }
    bail!(
        OutputPath,
        "Could not create a unique output filename in {} after {} attempts",
        dir.display(),
        MAX_NAME_ATTEMPTS
    )
}

/// Append the interrupted marker; failing to do so only costs a log line
fn mark_interrupted(path: &Path) {
    let appended = OpenOptions::new()
        .append(true)
        .open(path)
        .and_then(|mut file| file.write_all(INTERRUPTED_MARKER.as_bytes()));
    match appended {
        Ok(()) => info!("Marked incomplete file: {}", path.display()),
        Err(e) => warn!("Could not mark incomplete file {}: {}", path.display(), e),
    }
}
