//! Interactive confirmation for recovery matches.

use crate::render::body_preview;
use remarks_core::{
    ConfirmMigration, Confirmation, RecoveryCandidate, RecoveryEntry, RecoveryResult,
};
use std::io::{BufRead, Write};

/// Asks `Migrate these remarks? [y/N]` for every candidate and prints each
/// orphan's result as soon as it is known.
///
/// Only `y`/`yes` accept; end of input declines.
pub struct PromptConfirm<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> PromptConfirm<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }
}

impl<R: BufRead, W: Write> ConfirmMigration for PromptConfirm<R, W> {
    fn confirm(&mut self, candidate: &RecoveryCandidate) -> std::io::Result<Confirmation> {
        writeln!(
            self.output,
            "Found match: {} → {}",
            candidate.orphan.short(),
            candidate.target.short()
        )?;
        for remark in &candidate.remarks {
            writeln!(
                self.output,
                "  [{}] {}: {}",
                remark.id,
                remark.kind,
                body_preview(&remark.body)
            )?;
        }
        write!(self.output, "Migrate these remarks? [y/N] ")?;
        self.output.flush()?;

        let mut answer = String::new();
        self.input.read_line(&mut answer)?;
        let confirmation = match answer.trim().to_ascii_lowercase().as_str() {
            "y" | "yes" => Confirmation::Accept,
            _ => Confirmation::Decline,
        };
        if confirmation == Confirmation::Decline {
            writeln!(self.output, "Skipped")?;
        }
        writeln!(self.output)?;
        Ok(confirmation)
    }

    fn observe(&mut self, entry: &RecoveryEntry) -> std::io::Result<()> {
        let short = entry.orphan.short();
        match &entry.result {
            RecoveryResult::Recovered { remarks, .. } => {
                writeln!(self.output, "✓ Migrated {remarks} remark(s) from {short}")?
            }
            RecoveryResult::Declined { .. } => {}
            RecoveryResult::NoFingerprint => {
                writeln!(self.output, "Cannot compute patch-id for {short}, skipping")?
            }
            RecoveryResult::NoMatch => {
                writeln!(self.output, "No matching commit found for {short}, skipping")?
            }
            RecoveryResult::Failed(err) => writeln!(self.output, "warning: {short}: {err}")?,
        }
        self.output.flush()
    }
}
