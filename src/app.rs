use std::fs;

use camino::Utf8PathBuf;
use serde::Serialize;

use crate::config::ResolvedConfig;
use crate::dataset;
use crate::domain::PhotoRow;
use crate::error::GrabError;
use crate::fetch::PhotoFetcher;

#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    pub dry_run: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RowOutcome {
    Succeeded {
        line: u64,
        filename: String,
        bytes: u64,
    },
    Planned {
        line: u64,
        filename: String,
        url: String,
    },
    Failed {
        line: u64,
        participant: String,
        error: String,
    },
}

impl RowOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, RowOutcome::Failed { .. })
    }

    pub fn is_success(&self) -> bool {
        matches!(self, RowOutcome::Succeeded { .. })
    }

    pub fn is_planned(&self) -> bool {
        matches!(self, RowOutcome::Planned { .. })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub output_dir: String,
    pub total: usize,
    pub succeeded: usize,
    pub planned: usize,
    pub failed: usize,
    pub outcomes: Vec<RowOutcome>,
}

pub trait ProgressSink {
    fn row(&self, outcome: &RowOutcome);
}

pub struct App<F: PhotoFetcher> {
    config: ResolvedConfig,
    fetcher: F,
}

impl<F: PhotoFetcher> App<F> {
    pub fn new(config: ResolvedConfig, fetcher: F) -> Self {
        Self { config, fetcher }
    }

    /// Processes every row with a photo URL, one at a time.
    ///
    /// Only a missing output directory that cannot be created or an
    /// unreadable dataset fail the run; row errors become `Failed` outcomes.
    pub fn run(&self, options: RunOptions, sink: &dyn ProgressSink) -> Result<RunSummary, GrabError> {
        let output_dir = &self.config.output_dir;
        fs::create_dir_all(output_dir.as_std_path())
            .map_err(|err| GrabError::Filesystem(format!("create {output_dir}: {err}")))?;

        let rows = dataset::load_rows(&self.config.source_csv, &self.config.columns)?;
        tracing::info!(
            source = %self.config.source_csv,
            rows = rows.len(),
            dry_run = options.dry_run,
            "dataset loaded"
        );

        let mut outcomes = Vec::with_capacity(rows.len());
        for row in &rows {
            let outcome = match self.process_row(row, options) {
                Ok(outcome) => outcome,
                Err(err) => {
                    tracing::warn!(line = row.line, participant = row.display_id(), error = %err, "row failed");
                    RowOutcome::Failed {
                        line: row.line,
                        participant: row.display_id().to_string(),
                        error: err.to_string(),
                    }
                }
            };
            sink.row(&outcome);
            outcomes.push(outcome);
        }

        let count = |keep: fn(&RowOutcome) -> bool| {
            outcomes.iter().filter(|outcome| keep(outcome)).count()
        };
        let succeeded = count(RowOutcome::is_success);
        let planned = count(RowOutcome::is_planned);
        let failed = count(RowOutcome::is_failure);
        let summary = RunSummary {
            output_dir: output_dir.to_string(),
            total: outcomes.len(),
            succeeded,
            planned,
            failed,
            outcomes,
        };
        tracing::info!(
            total = summary.total,
            succeeded = summary.succeeded,
            planned = summary.planned,
            failed = summary.failed,
            "run finished"
        );
        Ok(summary)
    }

    fn process_row(&self, row: &PhotoRow, options: RunOptions) -> Result<RowOutcome, GrabError> {
        let filename = row.photo_filename()?;
        let destination: Utf8PathBuf = self.config.output_dir.join(&filename);

        if options.dry_run {
            return Ok(RowOutcome::Planned {
                line: row.line,
                filename,
                url: row.url.clone(),
            });
        }

        let bytes = self.fetcher.fetch(&row.url, &destination)?;
        Ok(RowOutcome::Succeeded {
            line: row.line,
            filename,
            bytes,
        })
    }
}
