use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::money::{Amount, Balance};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LedgerEntryKind {
    Sale,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LedgerEntryStatus {
    Completed,
}

/// Append-only audit record of a balance-affecting event.
///
/// `balance_after` snapshots the wallet balance immediately after the entry,
/// so the ledger stays meaningful independently of the mutable wallet field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WalletTransaction {
    pub id: Uuid,
    pub vendor_id: String,
    #[serde(rename = "type")]
    pub kind: LedgerEntryKind,
    pub amount: Decimal,
    pub balance_after: Decimal,
    pub reference: String,
    pub description: String,
    pub status: LedgerEntryStatus,
    pub created_at: DateTime<Utc>,
}

impl WalletTransaction {
    /// The one entry a successful release appends.
    pub fn sale(
        vendor_id: &str,
        amount: Amount,
        balance_after: Balance,
        reference: String,
        order_id: &str,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            vendor_id: vendor_id.to_owned(),
            kind: LedgerEntryKind::Sale,
            amount: amount.value(),
            balance_after: balance_after.value(),
            reference,
            description: format!("Sale settlement for order {order_id}"),
            status: LedgerEntryStatus::Completed,
            created_at: now,
        }
    }
}
