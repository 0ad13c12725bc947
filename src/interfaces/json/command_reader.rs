use serde::Deserialize;
use std::io::BufRead;

use crate::error::{Result, SettlementError};
use crate::interfaces::json::api::{RefundEscrowRequest, ReleaseEscrowRequest};

/// One settlement request, tagged by operation.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "op", rename_all = "lowercase")]
pub enum SettlementCommand {
    Release(ReleaseEscrowRequest),
    Refund(RefundEscrowRequest),
}

/// Reads settlement commands from a JSON Lines source.
///
/// Wraps any `BufRead` and yields `Result<SettlementCommand>` per line, so
/// large command files stream without loading into memory. Blank lines are
/// skipped; malformed lines surface as errors for the caller to report and
/// move past.
pub struct CommandReader<R: BufRead> {
    source: R,
}

impl<R: BufRead> CommandReader<R> {
    pub fn new(source: R) -> Self {
        Self { source }
    }

    pub fn commands(self) -> impl Iterator<Item = Result<SettlementCommand>> {
        self.source.lines().filter_map(|line| match line {
            Ok(line) if line.trim().is_empty() => None,
            Ok(line) => Some(serde_json::from_str(&line).map_err(SettlementError::from)),
            Err(err) => Some(Err(SettlementError::from(err))),
        })
    }
}
