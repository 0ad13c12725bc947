use rust_decimal::Decimal;
use tracing::{info, warn};

use crate::domain::escrow::ReleaseType;
use crate::domain::ledger::WalletTransaction;
use crate::domain::money::Amount;
use crate::domain::ports::{
    Clock, ClockBox, SettlementCommit, SettlementStoreRef, SystemClock, Versioned,
};
use crate::error::{Result, SettlementError};

/// Read-validate-commit cycles attempted before a conflict is surfaced as
/// an internal error. Logical precondition failures are never retried.
const MAX_COMMIT_ATTEMPTS: u32 = 5;

#[derive(Debug, Clone, PartialEq)]
pub struct ReleaseOutcome {
    pub escrow_id: String,
    pub vendor_id: String,
    pub amount: Decimal,
    pub balance_after: Decimal,
    pub reference: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RefundOutcome {
    pub escrow_id: String,
    pub order_id: String,
}

/// Settles a single order's escrow record to its terminal state.
///
/// Both operations are all-or-nothing: the status transition, the wallet
/// credit, the ledger append and the order update land in one store commit
/// or not at all. Concurrent attempts on the same records are resolved by
/// the store's version guards; the engine re-reads and retries on conflict,
/// so a lost race against another settlement of the same escrow resolves to
/// `PreconditionFailed` rather than a double apply.
pub struct SettlementEngine {
    store: SettlementStoreRef,
    clock: ClockBox,
}

impl SettlementEngine {
    pub fn new(store: SettlementStoreRef) -> Self {
        Self::with_clock(store, Box::new(SystemClock))
    }

    pub fn with_clock(store: SettlementStoreRef, clock: ClockBox) -> Self {
        Self { store, clock }
    }

    /// held -> released: credits the vendor wallet, appends the ledger entry
    /// and marks the order delivered.
    pub async fn release(
        &self,
        order_id: &str,
        release_type: ReleaseType,
        notes: Option<&str>,
        performed_by: Option<&str>,
    ) -> Result<ReleaseOutcome> {
        require_order_id(order_id)?;

        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.try_release(order_id, release_type, notes).await {
                Err(SettlementError::Conflict(record)) if attempt < MAX_COMMIT_ATTEMPTS => {
                    warn!(order_id, record, attempt, "release commit conflict, retrying");
                }
                Err(SettlementError::Conflict(record)) => {
                    return Err(conflict_exhausted(record));
                }
                Ok(outcome) => {
                    info!(
                        order_id,
                        escrow_id = %outcome.escrow_id,
                        vendor_id = %outcome.vendor_id,
                        amount = %outcome.amount,
                        performed_by,
                        "escrow released"
                    );
                    return Ok(outcome);
                }
                Err(err) => return Err(err),
            }
        }
    }

    /// held -> refunded: cancels the order. The vendor wallet is untouched;
    /// gateway-side money movement is someone else's workflow.
    pub async fn refund(
        &self,
        order_id: &str,
        reason: Option<&str>,
        performed_by: Option<&str>,
    ) -> Result<RefundOutcome> {
        require_order_id(order_id)?;

        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.try_refund(order_id, reason, performed_by).await {
                Err(SettlementError::Conflict(record)) if attempt < MAX_COMMIT_ATTEMPTS => {
                    warn!(order_id, record, attempt, "refund commit conflict, retrying");
                }
                Err(SettlementError::Conflict(record)) => {
                    return Err(conflict_exhausted(record));
                }
                Ok(outcome) => {
                    info!(
                        order_id,
                        escrow_id = %outcome.escrow_id,
                        performed_by,
                        "escrow refunded"
                    );
                    return Ok(outcome);
                }
                Err(err) => return Err(err),
            }
        }
    }

    async fn try_release(
        &self,
        order_id: &str,
        release_type: ReleaseType,
        notes: Option<&str>,
    ) -> Result<ReleaseOutcome> {
        let Versioned {
            record: mut escrow,
            version: escrow_version,
        } = self
            .store
            .find_escrow_by_order(order_id)
            .await?
            .ok_or(SettlementError::NotFound("Escrow transaction"))?;

        let now = self.clock.now();
        escrow.release(release_type, notes, now)?;

        // A held record with a non-positive amount is corrupt upstream data;
        // never credit zero or garbage.
        let amount = Amount::new(escrow.vendor_amount).map_err(|_| {
            SettlementError::Internal(format!(
                "escrow {} has a non-positive vendor amount: {}",
                escrow.id, escrow.vendor_amount
            ))
        })?;

        let Versioned {
            record: mut vendor,
            version: vendor_version,
        } = self
            .store
            .get_vendor(&escrow.vendor_id)
            .await?
            .ok_or(SettlementError::NotFound("Vendor"))?;

        let Versioned {
            record: mut order,
            version: order_version,
        } = self
            .store
            .get_order(order_id)
            .await?
            .ok_or(SettlementError::NotFound("Order"))?;

        let balance_after = vendor.credit_sale(amount);
        let entry = WalletTransaction::sale(
            &vendor.id,
            amount,
            balance_after,
            escrow.reference(),
            order_id,
            now,
        );
        order.mark_delivered(now);

        let outcome = ReleaseOutcome {
            escrow_id: escrow.id.clone(),
            vendor_id: vendor.id.clone(),
            amount: amount.value(),
            balance_after: balance_after.value(),
            reference: entry.reference.clone(),
        };

        self.store
            .commit(SettlementCommit {
                escrow: Versioned {
                    record: escrow,
                    version: escrow_version,
                },
                order: Versioned {
                    record: order,
                    version: order_version,
                },
                vendor: Some(Versioned {
                    record: vendor,
                    version: vendor_version,
                }),
                ledger_entry: Some(entry),
            })
            .await?;

        Ok(outcome)
    }

    async fn try_refund(
        &self,
        order_id: &str,
        reason: Option<&str>,
        performed_by: Option<&str>,
    ) -> Result<RefundOutcome> {
        let Versioned {
            record: mut escrow,
            version: escrow_version,
        } = self
            .store
            .find_escrow_by_order(order_id)
            .await?
            .ok_or(SettlementError::NotFound("Escrow transaction"))?;

        let now = self.clock.now();
        escrow.refund(reason, performed_by, now)?;

        let Versioned {
            record: mut order,
            version: order_version,
        } = self
            .store
            .get_order(order_id)
            .await?
            .ok_or(SettlementError::NotFound("Order"))?;

        order.mark_refunded(now);

        let outcome = RefundOutcome {
            escrow_id: escrow.id.clone(),
            order_id: order.id.clone(),
        };

        self.store
            .commit(SettlementCommit {
                escrow: Versioned {
                    record: escrow,
                    version: escrow_version,
                },
                order: Versioned {
                    record: order,
                    version: order_version,
                },
                vendor: None,
                ledger_entry: None,
            })
            .await?;

        Ok(outcome)
    }
}

fn require_order_id(order_id: &str) -> Result<()> {
    if order_id.trim().is_empty() {
        Err(SettlementError::InvalidArgument(
            "orderId is required".to_string(),
        ))
    } else {
        Ok(())
    }
}

fn conflict_exhausted(record: &'static str) -> SettlementError {
    SettlementError::Internal(format!(
        "commit conflict on {record} record persisted after {MAX_COMMIT_ATTEMPTS} attempts"
    ))
}
