use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::domain::escrow::EscrowTransaction;
use crate::domain::ledger::WalletTransaction;
use crate::domain::order::Order;
use crate::domain::vendor::Vendor;
use crate::error::Result;

pub type Version = u64;

/// A record together with the store version it was read at. Commits carry
/// the observed version back as a guard; a mismatch fails the whole commit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Versioned<T> {
    pub record: T,
    pub version: Version,
}

impl<T> Versioned<T> {
    /// Version a freshly inserted record starts at.
    pub fn initial(record: T) -> Self {
        Self { record, version: 0 }
    }
}

/// One settlement's writes, applied as a single atomic unit.
///
/// The refund path carries no vendor update and no ledger entry.
#[derive(Debug, Clone)]
pub struct SettlementCommit {
    pub escrow: Versioned<EscrowTransaction>,
    pub order: Versioned<Order>,
    pub vendor: Option<Versioned<Vendor>>,
    pub ledger_entry: Option<WalletTransaction>,
}

/// Transactional storage for settlement records.
///
/// Reads return versioned snapshots; `commit` applies every write in the
/// batch or none, rejecting with `SettlementError::Conflict` when any
/// version guard is stale. The inserts exist for the upstream checkout
/// flow's output (seeding); they reject duplicates so at most one escrow
/// record exists per order and ledger references stay unique.
#[async_trait]
pub trait SettlementStore: Send + Sync {
    async fn insert_vendor(&self, vendor: Vendor) -> Result<()>;
    async fn insert_order(&self, order: Order) -> Result<()>;
    async fn insert_escrow(&self, escrow: EscrowTransaction) -> Result<()>;

    async fn find_escrow_by_order(
        &self,
        order_id: &str,
    ) -> Result<Option<Versioned<EscrowTransaction>>>;
    async fn get_vendor(&self, vendor_id: &str) -> Result<Option<Versioned<Vendor>>>;
    async fn get_order(&self, order_id: &str) -> Result<Option<Versioned<Order>>>;

    async fn commit(&self, commit: SettlementCommit) -> Result<()>;

    async fn ledger_for_vendor(&self, vendor_id: &str) -> Result<Vec<WalletTransaction>>;
    async fn all_vendors(&self) -> Result<Vec<Vendor>>;
}

pub type SettlementStoreRef = Arc<dyn SettlementStore>;

/// Server-side timestamp source, injected so tests can pin time.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

pub type ClockBox = Box<dyn Clock>;

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
