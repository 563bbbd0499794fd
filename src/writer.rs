/*!
 * Text report writer for treedump
 */

use std::fs::File;
use std::io::{self, Read, Write};
use std::path::Path;
use std::sync::Arc;

use tracing::debug;

use crate::cancel::CancellationToken;
use crate::language::LanguageMap;
use crate::progress::ProgressSink;
use crate::types::FileEntry;

/// Largest number of content bytes read from a single file
pub const CONTENT_CAP: usize = 1024 * 1024;

/// Appended when a file was cut at [`CONTENT_CAP`]
pub const TRUNCATION_NOTICE: &str = "\n... (file content truncated due to size)";

/// Appended when a file was not valid UTF-8 and was decoded as Latin-1
pub const FALLBACK_NOTICE: &str = "\n... (Note: Read using latin-1 encoding)";

/// Written when a stop request arrives between two files
pub const STOP_MARKER: &str = "\n--- OPERATION STOPPED ---\n";

pub const HIERARCHY_HEADER: &str = "Hierarchy of folders and files:";
pub const CONTENTS_HEADER: &str = "Contents of files:";
pub const NO_ITEMS: &str = "(No items to display based on filters)";
pub const NO_FILES: &str = "(No files selected or found to include content)";
pub const EMPTY_FILE: &str = "(empty file)";

/// How the content section ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteStatus {
    /// Every file was written
    Completed,
    /// A stop request cut the section short
    Stopped,
}

/// Result of writing the content section
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteOutcome {
    pub status: WriteStatus,
    /// Files whose block was written
    pub files_written: usize,
}

/// Writer for the hierarchy and content sections
pub struct ReportWriter {
    languages: LanguageMap,
    token: CancellationToken,
    progress: Arc<dyn ProgressSink>,
}

impl ReportWriter {
    /// Create a new report writer
    pub fn new(
        languages: LanguageMap,
        token: CancellationToken,
        progress: Arc<dyn ProgressSink>,
    ) -> Self {
        Self {
            languages,
            token,
            progress,
        }
    }

    /// Write the hierarchy section: header, root name, rendered lines
    pub fn write_hierarchy<W: Write>(
        &self,
        out: &mut W,
        root_name: &str,
        lines: &[String],
    ) -> io::Result<()> {
        self.progress.report("Writing hierarchy...");
        write!(out, "{}\n\n", HIERARCHY_HEADER)?;
        writeln!(out, "{}", root_name)?;
        if lines.is_empty() {
            writeln!(out, "{}", NO_ITEMS)?;
        }
        for line in lines {
            writeln!(out, "{}", line)?;
        }
        writeln!(out)?;
        Ok(())
    }

    /// Write the content section, one fenced block per file.
    ///
    /// The stop flag is checked before each file; on a stop the marker is
    /// written and the remaining files are left out.
    pub fn write_contents<W: Write>(
        &self,
        out: &mut W,
        files: &[FileEntry],
    ) -> io::Result<WriteOutcome> {
        if files.is_empty() {
            write!(out, "{}\n\n{}\n\n", CONTENTS_HEADER, NO_FILES)?;
            self.progress
                .report("Skipping file content writing (no files selected).");
            return Ok(WriteOutcome {
                status: WriteStatus::Completed,
                files_written: 0,
            });
        }

        self.progress.report("Writing file contents...");
        write!(out, "{}\n\n", CONTENTS_HEADER)?;

        let total = files.len();
        for (index, file) in files.iter().enumerate() {
            if self.token.is_cancelled() {
                self.progress.report("Operation stopped during file writing.");
                out.write_all(STOP_MARKER.as_bytes())?;
                return Ok(WriteOutcome {
                    status: WriteStatus::Stopped,
                    files_written: index,
                });
            }

            self.progress.report(&format!(
                "Writing content: {} ({}/{})",
                file.rel,
                index + 1,
                total
            ));
            let content = read_file_content(&file.path);
            let content = if content.is_empty() {
                EMPTY_FILE
            } else {
                content.as_str()
            };

            writeln!(out, "{}:", file.rel)?;
            writeln!(out, "```{}", self.languages.hint_for(&file.rel))?;
            out.write_all(content.as_bytes())?;
            write!(out, "\n```\n\n")?;
        }

        Ok(WriteOutcome {
            status: WriteStatus::Completed,
            files_written: total,
        })
    }

    /// Write the note that replaces the content section
    pub fn write_content_skipped<W: Write>(&self, out: &mut W, mode: &str) -> io::Result<()> {
        self.progress
            .report(&format!("Skipping file content writing ('{}' mode).", mode));
        writeln!(out, "File contents skipped in '{}' mode.", mode)
    }
}

/// Read up to [`CONTENT_CAP`] bytes of a file as text.
///
/// UTF-8 is tried first, Latin-1 after that. Read failures come back as an
/// inline error message instead of an error.
pub fn read_file_content(path: &Path) -> String {
    let mut bytes = Vec::new();
    let read = File::open(path)
        .and_then(|file| file.take(CONTENT_CAP as u64 + 1).read_to_end(&mut bytes));

    if let Err(err) = read {
        debug!("Failed to read {}: {}", path.display(), err);
        return match err.kind() {
            io::ErrorKind::NotFound => format!(
                "Error: File not found at path '{}' (maybe moved/deleted during scan?)",
                path.display()
            ),
            _ => format!("Error reading file: {}", err),
        };
    }

    let truncated = bytes.len() > CONTENT_CAP;
    bytes.truncate(CONTENT_CAP);

    let (mut content, fallback) = decode(bytes, truncated);
    if truncated {
        content.push_str(TRUNCATION_NOTICE);
    }
    if fallback {
        content.push_str(FALLBACK_NOTICE);
    }
    content
}

/// Decode bytes as UTF-8, falling back to Latin-1. Returns the text and
/// whether the fallback was used.
fn decode(bytes: Vec<u8>, truncated: bool) -> (String, bool) {
    match String::from_utf8(bytes) {
        Ok(text) => (text, false),
        Err(err) => {
            let utf8 = err.utf8_error();
            // a character split by the cap is not an encoding problem
            if truncated && utf8.error_len().is_none() {
                let valid = utf8.valid_up_to();
                let mut bytes = err.into_bytes();
                bytes.truncate(valid);
                return (String::from_utf8(bytes).unwrap_or_default(), false);
            }
            let text: String = err.into_bytes().into_iter().map(char::from).collect();
            (text, true)
        }
    }
}
