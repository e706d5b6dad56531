//! Run summary and exit status.

use std::io::Write;
use std::process::ExitCode;

use crate::notification::DeliveryResult;
use crate::redact::Redactor;

/// Counts of successful and failed attempts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Summary {
    pub success_count: usize,
    pub failure_count: usize,
}

impl Summary {
    /// Total number of attempts.
    pub fn total(&self) -> usize {
        self.success_count + self.failure_count
    }

    /// `0` when nothing failed, `1` otherwise.
    pub fn exit_code(&self) -> u8 {
        u8::from(self.failure_count > 0)
    }

    pub fn to_exit_code(&self) -> ExitCode {
        ExitCode::from(self.exit_code())
    }
}

/// Count successes and failures.
pub fn summarize(results: &[DeliveryResult]) -> Summary {
    let success_count = results.iter().filter(|r| r.is_success()).count();
    Summary {
        success_count,
        failure_count: results.len() - success_count,
    }
}

/// Writes the operator-facing summary.
#[derive(Debug, Default)]
pub struct Reporter {
    verbose: bool,
    redactor: Redactor,
}

impl Reporter {
    pub fn new(verbose: bool, redactor: Redactor) -> Self {
        Self { verbose, redactor }
    }

    /// Print the summary for `results` and return it.
    ///
    /// Failure details are listed only in verbose mode, one line per failed
    /// attempt, with secrets redacted.
    pub fn report<W: Write>(&self, out: &mut W, results: &[DeliveryResult]) -> std::io::Result<Summary> {
        let summary = summarize(results);

        writeln!(out, "Sent {} notification(s) successfully", summary.success_count)?;
        if summary.failure_count > 0 {
            writeln!(out, "{} notification(s) failed", summary.failure_count)?;
            if self.verbose {
                for result in results {
                    if let Some(error) = &result.error {
                        let line = format!("  - {}: {}", result.channel, error);
                        writeln!(out, "{}", self.redactor.redact(&line))?;
                    }
                }
            }
        }
        out.flush()?;

        Ok(summary)
    }
}
