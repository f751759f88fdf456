//! CLI output formatting for thumbnail progress.
//!
//! # Output Format
//!
//! One line per event, each naming its source so lines from parallel
//! workers stay readable when interleaved:
//!
//! ```text
//! photos/dawn.jpg → photos/thumbnail.dawn.jpg
//! photos/dusk.jpg → photos/thumbnail.dusk.jpg (exists, skipped)
//! photos/broken.jpg: acquire failed: Failed to decode image: ...
//!
//! Wrote 1 thumbnail, skipped 1, failed 1
//! ```
//!
//! With `--verbose`, start and phase events are shown too:
//!
//! ```text
//! photos/dawn.jpg: started
//! photos/dawn.jpg: acquire   0%
//! photos/dawn.jpg: acquire 100%
//! ```
//!
//! # Architecture
//!
//! Format functions return `Vec<String>` and do no I/O.
//! [`print_event`] is the thin wrapper that writes to stdout.
//! [`Report`] tallies the same events for the summary line and the
//! optional JSON report.

use crate::task::ProgressEvent;
use serde::Serialize;

/// Format one progress event as zero or more lines.
pub fn format_event(event: &ProgressEvent, verbose: bool) -> Vec<String> {
    match event {
        ProgressEvent::Started { source } if verbose => vec![format!("{source}: started")],
        ProgressEvent::Phase {
            source,
            phase,
            progress,
        } if verbose => vec![format!(
            "{source}: {phase} {:>3}%",
            (progress * 100.0).round() as u32
        )],
        ProgressEvent::Started { .. } | ProgressEvent::Phase { .. } => Vec::new(),
        ProgressEvent::Finished {
            source,
            destination,
        } => vec![format!("{source} → {destination}")],
        ProgressEvent::Skipped {
            source,
            destination,
        } => vec![format!("{source} → {destination} (exists, skipped)")],
        ProgressEvent::Failed {
            source,
            phase,
            message,
        } => vec![format!("{source}: {phase} failed: {message}")],
    }
}

pub fn print_event(event: &ProgressEvent, verbose: bool) {
    for line in format_event(event, verbose) {
        println!("{}", line);
    }
}

/// A source and the file written (or left alone) for it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportEntry {
    pub source: String,
    pub destination: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportFailure {
    pub source: String,
    pub phase: String,
    pub message: String,
}

/// Outcome of a whole run, built from the event stream.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Report {
    pub written: Vec<ReportEntry>,
    pub skipped: Vec<ReportEntry>,
    pub failed: Vec<ReportFailure>,
}

impl Report {
    pub fn record(&mut self, event: &ProgressEvent) {
        match event {
            ProgressEvent::Finished {
                source,
                destination,
            } => self.written.push(ReportEntry {
                source: source.clone(),
                destination: destination.clone(),
            }),
            ProgressEvent::Skipped {
                source,
                destination,
            } => self.skipped.push(ReportEntry {
                source: source.clone(),
                destination: destination.clone(),
            }),
            ProgressEvent::Failed {
                source,
                phase,
                message,
            } => self.failed.push(ReportFailure {
                source: source.clone(),
                phase: phase.to_string(),
                message: message.clone(),
            }),
            ProgressEvent::Started { .. } | ProgressEvent::Phase { .. } => {}
        }
    }

    /// Record a failure that happened before any task could start.
    pub fn record_error(&mut self, source: &str, message: String) {
        self.failed.push(ReportFailure {
            source: source.to_string(),
            phase: "configure".to_string(),
            message,
        });
    }
}

/// Format the closing summary line.
pub fn format_summary(report: &Report) -> String {
    let noun = if report.written.len() == 1 {
        "thumbnail"
    } else {
        "thumbnails"
    };
    format!(
        "Wrote {} {noun}, skipped {}, failed {}",
        report.written.len(),
        report.skipped.len(),
        report.failed.len()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::Phase;

    fn finished() -> ProgressEvent {
        ProgressEvent::Finished {
            source: "a.jpg".into(),
            destination: "thumbnail.a.jpg".into(),
        }
    }

    #[test]
    fn finished_line() {
        assert_eq!(format_event(&finished(), false), vec!["a.jpg → thumbnail.a.jpg"]);
    }

    #[test]
    fn skipped_line() {
        let event = ProgressEvent::Skipped {
            source: "a.jpg".into(),
            destination: "t.jpg".into(),
        };
        assert_eq!(
            format_event(&event, false),
            vec!["a.jpg → t.jpg (exists, skipped)"]
        );
    }

    #[test]
    fn failed_line_names_phase() {
        let event = ProgressEvent::Failed {
            source: "a.jpg".into(),
            phase: Phase::Output,
            message: "disk full".into(),
        };
        assert_eq!(
            format_event(&event, false),
            vec!["a.jpg: output failed: disk full"]
        );
    }

    #[test]
    fn phases_only_when_verbose() {
        let event = ProgressEvent::Phase {
            source: "a.jpg".into(),
            phase: Phase::Resize,
            progress: 0.5,
        };
        assert!(format_event(&event, false).is_empty());
        assert_eq!(format_event(&event, true), vec!["a.jpg: resize  50%"]);
        let started = ProgressEvent::Started {
            source: "a.jpg".into(),
        };
        assert!(format_event(&started, false).is_empty());
        assert_eq!(format_event(&started, true), vec!["a.jpg: started"]);
    }

    #[test]
    fn report_tallies_outcomes() {
        let mut report = Report::default();
        report.record(&ProgressEvent::Started {
            source: "a.jpg".into(),
        });
        report.record(&finished());
        report.record(&ProgressEvent::Failed {
            source: "b.jpg".into(),
            phase: Phase::Acquire,
            message: "bad".into(),
        });
        report.record_error("c.jpg", "no".into());

        assert_eq!(report.written.len(), 1);
        assert_eq!(report.failed.len(), 2);
        assert_eq!(report.failed[0].phase, "acquire");
        assert_eq!(format_summary(&report), "Wrote 1 thumbnail, skipped 0, failed 2");
    }

    #[test]
    fn report_serializes_to_json() {
        let mut report = Report::default();
        report.record(&finished());
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["written"][0]["destination"], "thumbnail.a.jpg");
        assert_eq!(json["failed"].as_array().unwrap().len(), 0);
    }
}
