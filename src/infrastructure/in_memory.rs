use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::escrow::EscrowTransaction;
use crate::domain::ledger::WalletTransaction;
use crate::domain::order::Order;
use crate::domain::ports::{SettlementCommit, SettlementStore, Versioned};
use crate::domain::vendor::Vendor;
use crate::error::{Result, SettlementError};

#[derive(Default)]
struct Arena {
    // Keyed by order id: the store-level uniqueness constraint that at most
    // one escrow record exists per order.
    escrows: HashMap<String, Versioned<EscrowTransaction>>,
    vendors: HashMap<String, Versioned<Vendor>>,
    orders: HashMap<String, Versioned<Order>>,
    ledger: Vec<WalletTransaction>,
    references: HashSet<String>,
}

/// Lock-guarded in-memory settlement store.
///
/// Reads take snapshots; `commit` re-checks every version guard under the
/// write lock before applying, so an interleaved commit between a caller's
/// read and its commit surfaces as `Conflict` instead of a lost update.
/// `Clone` shares the underlying arena.
#[derive(Default, Clone)]
pub struct InMemoryStore {
    arena: Arc<RwLock<Arena>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SettlementStore for InMemoryStore {
    async fn insert_vendor(&self, vendor: Vendor) -> Result<()> {
        let mut arena = self.arena.write().await;
        if arena.vendors.contains_key(&vendor.id) {
            return Err(SettlementError::Internal(format!(
                "vendor {} already exists",
                vendor.id
            )));
        }
        arena
            .vendors
            .insert(vendor.id.clone(), Versioned::initial(vendor));
        Ok(())
    }

    async fn insert_order(&self, order: Order) -> Result<()> {
        let mut arena = self.arena.write().await;
        if arena.orders.contains_key(&order.id) {
            return Err(SettlementError::Internal(format!(
                "order {} already exists",
                order.id
            )));
        }
        arena
            .orders
            .insert(order.id.clone(), Versioned::initial(order));
        Ok(())
    }

    async fn insert_escrow(&self, escrow: EscrowTransaction) -> Result<()> {
        let mut arena = self.arena.write().await;
        if arena.escrows.contains_key(&escrow.order_id) {
            return Err(SettlementError::Internal(format!(
                "an escrow record already exists for order {}",
                escrow.order_id
            )));
        }
        arena
            .escrows
            .insert(escrow.order_id.clone(), Versioned::initial(escrow));
        Ok(())
    }

    async fn find_escrow_by_order(
        &self,
        order_id: &str,
    ) -> Result<Option<Versioned<EscrowTransaction>>> {
        let arena = self.arena.read().await;
        Ok(arena.escrows.get(order_id).cloned())
    }

    async fn get_vendor(&self, vendor_id: &str) -> Result<Option<Versioned<Vendor>>> {
        let arena = self.arena.read().await;
        Ok(arena.vendors.get(vendor_id).cloned())
    }

    async fn get_order(&self, order_id: &str) -> Result<Option<Versioned<Order>>> {
        let arena = self.arena.read().await;
        Ok(arena.orders.get(order_id).cloned())
    }

    async fn commit(&self, commit: SettlementCommit) -> Result<()> {
        let mut arena = self.arena.write().await;

        // Validate every guard before applying anything.
        let escrow_key = commit.escrow.record.order_id.clone();
        let current = arena
            .escrows
            .get(&escrow_key)
            .ok_or_else(|| SettlementError::Internal(format!("escrow for order {escrow_key} vanished during commit")))?;
        if current.version != commit.escrow.version {
            return Err(SettlementError::Conflict("escrow"));
        }

        let order_key = commit.order.record.id.clone();
        let current = arena
            .orders
            .get(&order_key)
            .ok_or_else(|| SettlementError::Internal(format!("order {order_key} vanished during commit")))?;
        if current.version != commit.order.version {
            return Err(SettlementError::Conflict("order"));
        }

        if let Some(vendor) = &commit.vendor {
            let current = arena.vendors.get(&vendor.record.id).ok_or_else(|| {
                SettlementError::Internal(format!(
                    "vendor {} vanished during commit",
                    vendor.record.id
                ))
            })?;
            if current.version != vendor.version {
                return Err(SettlementError::Conflict("vendor"));
            }
        }

        if let Some(entry) = &commit.ledger_entry {
            if arena.references.contains(&entry.reference) {
                return Err(SettlementError::Internal(format!(
                    "duplicate ledger reference {}",
                    entry.reference
                )));
            }
        }

        // All guards held; apply the batch.
        arena.escrows.insert(
            escrow_key,
            Versioned {
                version: commit.escrow.version + 1,
                record: commit.escrow.record,
            },
        );
        arena.orders.insert(
            order_key,
            Versioned {
                version: commit.order.version + 1,
                record: commit.order.record,
            },
        );
        if let Some(vendor) = commit.vendor {
            arena.vendors.insert(
                vendor.record.id.clone(),
                Versioned {
                    version: vendor.version + 1,
                    record: vendor.record,
                },
            );
        }
        if let Some(entry) = commit.ledger_entry {
            arena.references.insert(entry.reference.clone());
            arena.ledger.push(entry);
        }
        Ok(())
    }

    async fn ledger_for_vendor(&self, vendor_id: &str) -> Result<Vec<WalletTransaction>> {
        let arena = self.arena.read().await;
        Ok(arena
            .ledger
            .iter()
            .filter(|entry| entry.vendor_id == vendor_id)
            .cloned()
            .collect())
    }

    async fn all_vendors(&self) -> Result<Vec<Vendor>> {
        let arena = self.arena.read().await;
        let mut vendors: Vec<Vendor> = arena
            .vendors
            .values()
            .map(|v| v.record.clone())
            .collect();
        vendors.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(vendors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::money::Balance;
    use chrono::{DateTime, TimeZone, Utc};
    use rust_decimal_macros::dec;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn test_insert_and_lookup() {
        let store = InMemoryStore::new();
        store
            .insert_vendor(Vendor::new("V1", Balance::new(dec!(10000))))
            .await
            .unwrap();
        store
            .insert_escrow(EscrowTransaction::held("E1", "O1", "V1", dec!(5000), now()))
            .await
            .unwrap();

        let escrow = store.find_escrow_by_order("O1").await.unwrap().unwrap();
        assert_eq!(escrow.record.id, "E1");
        assert_eq!(escrow.version, 0);

        assert!(store.find_escrow_by_order("O2").await.unwrap().is_none());
        assert!(store.get_vendor("V2").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_one_escrow_per_order() {
        let store = InMemoryStore::new();
        store
            .insert_escrow(EscrowTransaction::held("E1", "O1", "V1", dec!(5000), now()))
            .await
            .unwrap();

        let err = store
            .insert_escrow(EscrowTransaction::held("E2", "O1", "V1", dec!(7000), now()))
            .await
            .unwrap_err();
        assert!(matches!(err, SettlementError::Internal(_)));
    }

    #[tokio::test]
    async fn test_stale_version_guard_rejects_commit() {
        let store = InMemoryStore::new();
        store.insert_order(Order::paid("O1", now())).await.unwrap();
        store
            .insert_escrow(EscrowTransaction::held("E1", "O1", "V1", dec!(5000), now()))
            .await
            .unwrap();

        let escrow = store.find_escrow_by_order("O1").await.unwrap().unwrap();
        let order = store.get_order("O1").await.unwrap().unwrap();

        // First committer wins.
        let mut first_escrow = escrow.record.clone();
        first_escrow.refund(None, None, now()).unwrap();
        let mut first_order = order.record.clone();
        first_order.mark_refunded(now());
        store
            .commit(SettlementCommit {
                escrow: Versioned {
                    record: first_escrow,
                    version: escrow.version,
                },
                order: Versioned {
                    record: first_order,
                    version: order.version,
                },
                vendor: None,
                ledger_entry: None,
            })
            .await
            .unwrap();

        // Second committer still holds the old versions.
        let err = store
            .commit(SettlementCommit {
                escrow: escrow.clone(),
                order: order.clone(),
                vendor: None,
                ledger_entry: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, SettlementError::Conflict("escrow")));

        // The winner's write stuck and its version advanced.
        let current = store.find_escrow_by_order("O1").await.unwrap().unwrap();
        assert_eq!(current.version, 1);
    }

    #[tokio::test]
    async fn test_all_vendors_sorted_by_id() {
        let store = InMemoryStore::new();
        store
            .insert_vendor(Vendor::new("V2", Balance::ZERO))
            .await
            .unwrap();
        store
            .insert_vendor(Vendor::new("V1", Balance::ZERO))
            .await
            .unwrap();

        let vendors = store.all_vendors().await.unwrap();
        let ids: Vec<&str> = vendors.iter().map(|v| v.id.as_str()).collect();
        assert_eq!(ids, vec!["V1", "V2"]);
    }
}
