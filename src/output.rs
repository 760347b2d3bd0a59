use std::io::{self, Write};

use serde::Serialize;

use crate::app::{ProgressSink, RowOutcome, RunSummary};

#[derive(Debug, Clone, Copy)]
pub enum OutputMode {
    Console,
    Json,
}

/// One human-readable line per row on stdout.
pub struct ConsoleOutput;

impl ConsoleOutput {
    pub fn format_outcome(outcome: &RowOutcome) -> String {
        match outcome {
            RowOutcome::Succeeded { filename, .. } => format!("✔  {filename}"),
            RowOutcome::Planned { filename, url, .. } => format!("→  {filename}  <- {url}"),
            RowOutcome::Failed {
                participant, error, ..
            } => format!("✘  {participant} – {error}"),
        }
    }

    pub fn write_outcome<W: Write>(out: &mut W, outcome: &RowOutcome) -> io::Result<()> {
        writeln!(out, "{}", Self::format_outcome(outcome))
    }

    pub fn print_summary(summary: &RunSummary) {
        eprintln!(
            "{} rows: {} ok, {} planned, {} failed (output: {})",
            summary.total,
            summary.succeeded,
            summary.planned,
            summary.failed,
            summary.output_dir
        );
    }
}

impl ProgressSink for ConsoleOutput {
    fn row(&self, outcome: &RowOutcome) {
        let mut stdout = io::stdout().lock();
        if let Err(err) = Self::write_outcome(&mut stdout, outcome) {
            tracing::warn!(error = %err, "failed to write row result to stdout");
        }
    }
}

/// Silent while running; prints the whole summary as JSON at the end.
pub struct JsonOutput;

impl JsonOutput {
    pub fn print_summary(summary: &RunSummary) -> io::Result<()> {
        Self::write_json(&mut io::stdout(), summary)
    }

    pub fn write_json<W: Write, T: Serialize>(out: &mut W, value: &T) -> io::Result<()> {
        let json = serde_json::to_string_pretty(value).map_err(io::Error::other)?;
        out.write_all(json.as_bytes())?;
        out.write_all(b"\n")?;
        Ok(())
    }
}

impl ProgressSink for JsonOutput {
    fn row(&self, _outcome: &RowOutcome) {}
}

#[cfg(test)]
mod tests {
    use serde_json::Value;

    use super::*;

    struct BrokenPipe;

    impl Write for BrokenPipe {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn mixed_summary() -> RunSummary {
        RunSummary {
            output_dir: "pics".to_string(),
            total: 3,
            succeeded: 1,
            planned: 1,
            failed: 1,
            outcomes: vec![
                RowOutcome::Succeeded {
                    line: 1,
                    filename: "P01_20240105_083000.jpg".to_string(),
                    bytes: 42,
                },
                RowOutcome::Planned {
                    line: 2,
                    filename: "P02_20240105_090000.jpg".to_string(),
                    url: "http://example.test/b.jpg".to_string(),
                },
                RowOutcome::Failed {
                    line: 3,
                    participant: "P03".to_string(),
                    error: "server returned status 404 for http://example.test/c.jpg".to_string(),
                },
            ],
        }
    }

    #[test]
    fn json_summary_tags_each_outcome() {
        let mut buffer = Vec::new();
        JsonOutput::write_json(&mut buffer, &mixed_summary()).unwrap();
        assert!(buffer.ends_with(b"\n"));

        let value: Value = serde_json::from_slice(&buffer).unwrap();
        assert_eq!(value["output_dir"], "pics");
        assert_eq!(value["total"], 3);
        assert_eq!(value["succeeded"], 1);
        assert_eq!(value["planned"], 1);
        assert_eq!(value["failed"], 1);

        let outcomes = value["outcomes"].as_array().unwrap();
        let statuses: Vec<_> = outcomes
            .iter()
            .map(|outcome| outcome["status"].as_str().unwrap())
            .collect();
        assert_eq!(statuses, vec!["succeeded", "planned", "failed"]);
        assert_eq!(outcomes[0]["bytes"], 42);
        assert_eq!(outcomes[1]["url"], "http://example.test/b.jpg");
        assert_eq!(outcomes[2]["participant"], "P03");
    }

    #[test]
    fn console_line_is_newline_terminated() {
        let summary = mixed_summary();
        let mut buffer = Vec::new();
        ConsoleOutput::write_outcome(&mut buffer, &summary.outcomes[0]).unwrap();
        assert_eq!(String::from_utf8(buffer).unwrap(), "✔  P01_20240105_083000.jpg\n");
    }

    #[test]
    fn console_write_errors_are_returned() {
        let summary = mixed_summary();
        let err = ConsoleOutput::write_outcome(&mut BrokenPipe, &summary.outcomes[0]).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
    }

    #[test]
    fn failure_line_names_participant() {
        let line = ConsoleOutput::format_outcome(&RowOutcome::Failed {
            line: 2,
            participant: "??".to_string(),
            error: "server returned status 404 for http://example.test/a.jpg".to_string(),
        });
        assert_eq!(
            line,
            "✘  ?? – server returned status 404 for http://example.test/a.jpg"
        );
    }
}
