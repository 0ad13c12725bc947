use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::SettlementError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EscrowStatus {
    Held,
    Released,
    Refunded,
}

impl fmt::Display for EscrowStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Held => "held",
            Self::Released => "released",
            Self::Refunded => "refunded",
        };
        f.write_str(s)
    }
}

/// How a release was initiated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReleaseType {
    ManualBuyer,
    Auto,
    Admin,
}

/// Funds held by the platform between payment capture and settlement.
///
/// Created by the checkout flow once payment is captured; settled exactly
/// once by the engine (held -> released or held -> refunded); never deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EscrowTransaction {
    pub id: String,
    pub order_id: String,
    pub vendor_id: String,
    pub vendor_amount: Decimal,
    pub status: EscrowStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_type: Option<ReleaseType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refunded_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub released_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl EscrowTransaction {
    /// A fresh hold, as the checkout flow would create it.
    pub fn held(
        id: impl Into<String>,
        order_id: impl Into<String>,
        vendor_id: impl Into<String>,
        vendor_amount: Decimal,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            order_id: order_id.into(),
            vendor_id: vendor_id.into(),
            vendor_amount,
            status: EscrowStatus::Held,
            release_reason: None,
            release_type: None,
            refunded_by: None,
            released_at: None,
            created_at,
        }
    }

    /// Ledger reference for this escrow; unique per release since an escrow
    /// releases at most once.
    pub fn reference(&self) -> String {
        format!("ESCROW-{}", self.id)
    }

    fn ensure_held(&self, action: &'static str) -> Result<(), SettlementError> {
        if self.status == EscrowStatus::Held {
            Ok(())
        } else {
            Err(SettlementError::PreconditionFailed {
                current: self.status.to_string(),
                action,
            })
        }
    }

    /// held -> released. Fails if the escrow already reached a terminal state.
    pub fn release(
        &mut self,
        release_type: ReleaseType,
        notes: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<(), SettlementError> {
        self.ensure_held("release")?;
        self.status = EscrowStatus::Released;
        self.release_reason = Some(notes.unwrap_or("Delivery Confirmed").to_owned());
        self.release_type = Some(release_type);
        self.released_at = Some(now);
        Ok(())
    }

    /// held -> refunded. The vendor is not credited on this path.
    pub fn refund(
        &mut self,
        reason: Option<&str>,
        refunded_by: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<(), SettlementError> {
        self.ensure_held("refund")?;
        self.status = EscrowStatus::Refunded;
        self.release_reason = Some(reason.unwrap_or("Refunded").to_owned());
        self.refunded_by = refunded_by.map(str::to_owned);
        self.released_at = Some(now);
        Ok(())
    }
}
