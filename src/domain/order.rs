use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::escrow::EscrowStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Paid,
    Refunded,
}

/// The order fields the settlement engine is responsible for.
///
/// `escrow_status` mirrors the escrow record; after a successful settlement
/// the two always agree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: String,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub escrow_status: EscrowStatus,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    pub fn paid(id: impl Into<String>, updated_at: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            status: OrderStatus::Pending,
            payment_status: PaymentStatus::Paid,
            escrow_status: EscrowStatus::Held,
            updated_at,
        }
    }

    /// Applied on the release path.
    pub fn mark_delivered(&mut self, now: DateTime<Utc>) {
        self.status = OrderStatus::Delivered;
        self.escrow_status = EscrowStatus::Released;
        self.updated_at = now;
    }

    /// Applied on the refund path.
    pub fn mark_refunded(&mut self, now: DateTime<Utc>) {
        self.status = OrderStatus::Cancelled;
        self.payment_status = PaymentStatus::Refunded;
        self.escrow_status = EscrowStatus::Refunded;
        self.updated_at = now;
    }
}
