/*!
 * End-of-run summary for treedump
 *
 * Renders the outcome of a generation run as a console table (via `tabled`)
 * or as JSON.
 */

use std::time::Duration;

use clap::ValueEnum;
use serde::Serialize;
use tabled::{
    settings::{object::Columns, Alignment, Modify, Padding, Style},
    Table, Tabled,
};

use crate::config::Mode;
use crate::utils::format_file_size;

/// Summary of one generation run
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    /// `completed` or `stopped`
    pub status: String,
    /// Mode the run used
    pub mode: Mode,
    /// Report file, if one was created
    pub output_file: Option<String>,
    /// Wall time for scan and write
    #[serde(serialize_with = "serialize_duration")]
    pub duration: Duration,
    /// Directories read while building the hierarchy
    pub dirs_scanned: usize,
    /// File leaves in the hierarchy
    pub files_in_hierarchy: usize,
    /// Files whose content block was written
    pub files_written: usize,
    /// Size of the report file
    pub bytes_written: u64,
    /// Non-fatal warnings met during the scan
    pub warnings: Vec<String>,
}

fn serialize_duration<S: serde::Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_f64(d.as_secs_f64())
}

/// Format of the summary output
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    /// Console table output
    Table,
    /// JSON document
    Json,
}

/// Summary generator for run results
pub struct Reporter {
    format: ReportFormat,
}

impl Reporter {
    /// Create a new reporter
    pub fn new(format: ReportFormat) -> Self {
        Self { format }
    }

    /// Format a number with human-readable units
    fn format_number(&self, num: usize) -> String {
        if num >= 1_000_000 {
            format!("{:.1}M", num as f64 / 1_000_000.0)
        } else if num >= 1_000 {
            format!("{:.1}K", num as f64 / 1_000.0)
        } else {
            num.to_string()
        }
    }

    /// Generate the summary string
    pub fn generate_report(&self, summary: &RunSummary) -> String {
        match self.format {
            ReportFormat::Table => self.generate_console_report(summary),
            ReportFormat::Json => serde_json::to_string_pretty(summary)
                .unwrap_or_else(|e| format!("{{\"error\": \"{}\"}}", e)),
        }
    }

    /// Print the summary to stdout
    pub fn print_report(&self, summary: &RunSummary) {
        println!("\n{}", self.generate_report(summary));
    }

    fn create_summary_table(&self, summary: &RunSummary) -> String {
        #[derive(Tabled)]
        struct SummaryRow {
            #[tabled(rename = "Metric")]
            key: String,

            #[tabled(rename = "Value")]
            value: String,
        }

        let mut rows = vec![
            SummaryRow {
                key: "📂 Output File".to_string(),
                value: summary
                    .output_file
                    .clone()
                    .unwrap_or_else(|| "(none)".to_string()),
            },
            SummaryRow {
                key: "🔧 Mode".to_string(),
                value: summary.mode.to_string(),
            },
            SummaryRow {
                key: "⏱️ Process Time".to_string(),
                value: format!("{:.4?}", summary.duration),
            },
            SummaryRow {
                key: "📁 Directories Scanned".to_string(),
                value: self.format_number(summary.dirs_scanned),
            },
            SummaryRow {
                key: "🌳 Files In Hierarchy".to_string(),
                value: self.format_number(summary.files_in_hierarchy),
            },
            SummaryRow {
                key: "📄 Files Written".to_string(),
                value: self.format_number(summary.files_written),
            },
            SummaryRow {
                key: "📦 Report Size".to_string(),
                value: format_file_size(summary.bytes_written),
            },
        ];

        if !summary.warnings.is_empty() {
            rows.push(SummaryRow {
                key: "⚠️ Warnings".to_string(),
                value: self.format_number(summary.warnings.len()),
            });
        }

        let mut table = Table::new(rows);
        table
            .with(Style::rounded())
            .with(Padding::new(1, 1, 0, 0))
            .with(Modify::new(Columns::new(..)).with(Alignment::left()));

        table.to_string()
    }

    fn generate_console_report(&self, summary: &RunSummary) -> String {
        let title = match summary.status.as_str() {
            "completed" => "✅  GENERATION COMPLETE",
            _ => "🛑  GENERATION STOPPED",
        };
        let mut report = format!("{}\n{}", title, self.create_summary_table(summary));

        // only the first few warnings, the log has all of them
        for warning in summary.warnings.iter().take(10) {
            report.push_str(&format!("\n  ⚠️ {}", warning));
        }
        if summary.warnings.len() > 10 {
            report.push_str(&format!(
                "\n  ... and {} more",
                summary.warnings.len() - 10
            ));
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary() -> RunSummary {
        RunSummary {
            status: "completed".to_string(),
            mode: Mode::Exclude,
            output_file: Some("outputs/proj_hierarchy_exclude.txt".to_string()),
            duration: Duration::from_millis(1500),
            dirs_scanned: 12,
            files_in_hierarchy: 2_500,
            files_written: 40,
            bytes_written: 4096,
            warnings: vec!["Permission denied: '/x'".to_string()],
        }
    }

    #[test]
    fn test_table_report() {
        let text = Reporter::new(ReportFormat::Table).generate_report(&summary());
        assert!(text.starts_with("✅  GENERATION COMPLETE"));
        assert!(text.contains("proj_hierarchy_exclude.txt"));
        assert!(text.contains("2.5K"));
        assert!(text.contains("4.00 KB"));
        assert!(text.contains("Permission denied"));
    }

    #[test]
    fn test_json_report() {
        let text = Reporter::new(ReportFormat::Json).generate_report(&summary());
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["mode"], "exclude");
        assert_eq!(value["files_written"], 40);
        assert_eq!(value["duration"], 1.5);
    }
}
