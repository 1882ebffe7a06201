//! Plain-text report files.
//!
//! A report is a list of header lines, written with a `# ` prefix so
//! plotting tools skip them, followed by body lines written verbatim.

use std::fmt::Write as _;
use std::fs;
use std::io;
use std::path::Path;

use crate::models::Workload;
use crate::paes::{Objectives, RunSummary, ScheduleArchive};

/// Accumulates header and body lines for one output file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReportWriter {
    header: Vec<String>,
    lines: Vec<String>,
}

impl ReportWriter {
    /// Creates an empty report.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a header line (without the `# ` prefix).
    pub fn add_header_line(&mut self, line: impl Into<String>) {
        self.header.push(line.into());
    }

    /// Appends a body line.
    pub fn add_line(&mut self, line: impl Into<String>) {
        self.lines.push(line.into());
    }

    /// Appends every line of a multi-line block to the body.
    pub fn add_block(&mut self, block: &str) {
        self.lines.extend(block.lines().map(str::to_owned));
    }

    /// Header lines.
    pub fn header(&self) -> &[String] {
        &self.header
    }

    /// Body lines.
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Report text, one line per entry, header first.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for line in &self.header {
            let _ = writeln!(out, "# {line}");
        }
        for line in &self.lines {
            let _ = writeln!(out, "{line}");
        }
        out
    }

    /// Writes [`render`](Self::render) to `path`, replacing any existing file.
    pub fn write_to(&self, path: impl AsRef<Path>) -> io::Result<()> {
        let path = path.as_ref();
        tracing::debug!(path = %path.display(), lines = self.lines.len(), "writing report");
        fs::write(path, self.render())
    }

    /// Front report: one `queue_time price` line per archived schedule.
    ///
    /// ```
    /// use u_paes::paes::Objectives;
    /// use u_paes::report::ReportWriter;
    ///
    /// let report = ReportWriter::front("example", &[Objectives::new(3.0, 1.5)]);
    /// assert_eq!(report.render(), "# example\n# queue_time price\n3 1.5\n");
    /// ```
    pub fn front(title: &str, front: &[Objectives]) -> Self {
        let mut report = Self::new();
        report.add_header_line(title);
        report.add_header_line("queue_time price");
        for o in front {
            report.add_line(format!("{} {}", o.queue_time, o.price));
        }
        report
    }

    /// Absolute and per-job fronts of `archive` with a common header.
    pub fn front_pair(
        archive: &ScheduleArchive,
        workload: &Workload,
        summary: &RunSummary,
    ) -> (Self, Self) {
        let mut absolute = Self::front("Pareto front (totals)", &archive.front());
        let mut relative = Self::front(
            "Pareto front (per job)",
            &archive.relative_front(workload.len()),
        );
        for report in [&mut absolute, &mut relative] {
            report.add_header_line(workload.summary());
            report.add_header_line(archive.summary());
            report.add_header_line(format!(
                "iterations {}, seed {}, stop {:?}, distance {}",
                summary.iterations, summary.seed, summary.stop_reason, summary.distance
            ));
        }
        (absolute, relative)
    }
}
