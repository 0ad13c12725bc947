use async_trait::async_trait;
use rocksdb::{ColumnFamily, ColumnFamilyDescriptor, DB, IteratorMode, Options, WriteBatch};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::domain::escrow::EscrowTransaction;
use crate::domain::ledger::WalletTransaction;
use crate::domain::order::Order;
use crate::domain::ports::{SettlementCommit, SettlementStore, Versioned};
use crate::domain::vendor::Vendor;
use crate::error::{Result, SettlementError};

/// Column family for escrow records, keyed by order id. The key choice is
/// the uniqueness constraint: one escrow record per order.
pub const CF_ESCROWS: &str = "escrows";
/// Column family for vendor records, keyed by vendor id.
pub const CF_VENDORS: &str = "vendors";
/// Column family for order records, keyed by order id.
pub const CF_ORDERS: &str = "orders";
/// Column family for ledger entries, keyed by reference.
pub const CF_LEDGER: &str = "ledger";

/// Persistent settlement store backed by RocksDB.
///
/// Records are stored as JSON-encoded `Versioned<T>` values. Writers
/// serialize through a commit lock; each settlement's writes go into one
/// `WriteBatch`, so the batch lands atomically or not at all. Version
/// guards are re-checked under the lock, which gives the optimistic
/// conflict detection the engine retries on.
///
/// `Clone` shares the underlying `Arc<DB>`.
#[derive(Clone)]
pub struct RocksDbStore {
    db: Arc<DB>,
    write_lock: Arc<Mutex<()>>,
}

impl RocksDbStore {
    /// Opens or creates a RocksDB instance at the given path, ensuring the
    /// four column families exist.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let descriptors = [CF_ESCROWS, CF_VENDORS, CF_ORDERS, CF_LEDGER]
            .into_iter()
            .map(|name| ColumnFamilyDescriptor::new(name, Options::default()))
            .collect::<Vec<_>>();

        let db = DB::open_cf_descriptors(&opts, path, descriptors)?;

        Ok(Self {
            db: Arc::new(db),
            write_lock: Arc::new(Mutex::new(())),
        })
    }

    fn cf(&self, name: &'static str) -> Result<&ColumnFamily> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| SettlementError::Internal(format!("{name} column family not found")))
    }

    fn read<T: DeserializeOwned>(&self, cf_name: &'static str, key: &str) -> Result<Option<T>> {
        let cf = self.cf(cf_name)?;
        match self.db.get_cf(cf, key.as_bytes())? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    fn put<T: Serialize>(&self, cf_name: &'static str, key: &str, value: &T) -> Result<()> {
        let cf = self.cf(cf_name)?;
        self.db.put_cf(cf, key.as_bytes(), serde_json::to_vec(value)?)?;
        Ok(())
    }

    fn insert_unique<T: Serialize + DeserializeOwned>(
        &self,
        cf_name: &'static str,
        key: &str,
        record: T,
        what: &str,
    ) -> Result<()> {
        if self.read::<Versioned<T>>(cf_name, key)?.is_some() {
            return Err(SettlementError::Internal(format!(
                "{what} {key} already exists"
            )));
        }
        self.put(cf_name, key, &Versioned::initial(record))
    }
}

#[async_trait]
impl SettlementStore for RocksDbStore {
    async fn insert_vendor(&self, vendor: Vendor) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let key = vendor.id.clone();
        self.insert_unique(CF_VENDORS, &key, vendor, "vendor")
    }

    async fn insert_order(&self, order: Order) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let key = order.id.clone();
        self.insert_unique(CF_ORDERS, &key, order, "order")
    }

    async fn insert_escrow(&self, escrow: EscrowTransaction) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let key = escrow.order_id.clone();
        if self
            .read::<Versioned<EscrowTransaction>>(CF_ESCROWS, &key)?
            .is_some()
        {
            return Err(SettlementError::Internal(format!(
                "an escrow record already exists for order {key}"
            )));
        }
        self.put(CF_ESCROWS, &key, &Versioned::initial(escrow))
    }

    async fn find_escrow_by_order(
        &self,
        order_id: &str,
    ) -> Result<Option<Versioned<EscrowTransaction>>> {
        self.read(CF_ESCROWS, order_id)
    }

    async fn get_vendor(&self, vendor_id: &str) -> Result<Option<Versioned<Vendor>>> {
        self.read(CF_VENDORS, vendor_id)
    }

    async fn get_order(&self, order_id: &str) -> Result<Option<Versioned<Order>>> {
        self.read(CF_ORDERS, order_id)
    }

    async fn commit(&self, commit: SettlementCommit) -> Result<()> {
        let _guard = self.write_lock.lock().await;

        let escrow_key = commit.escrow.record.order_id.clone();
        let current: Versioned<EscrowTransaction> = self
            .read(CF_ESCROWS, &escrow_key)?
            .ok_or_else(|| {
                SettlementError::Internal(format!(
                    "escrow for order {escrow_key} vanished during commit"
                ))
            })?;
        if current.version != commit.escrow.version {
            return Err(SettlementError::Conflict("escrow"));
        }

        let order_key = commit.order.record.id.clone();
        let current: Versioned<Order> = self.read(CF_ORDERS, &order_key)?.ok_or_else(|| {
            SettlementError::Internal(format!("order {order_key} vanished during commit"))
        })?;
        if current.version != commit.order.version {
            return Err(SettlementError::Conflict("order"));
        }

        if let Some(vendor) = &commit.vendor {
            let current: Versioned<Vendor> =
                self.read(CF_VENDORS, &vendor.record.id)?.ok_or_else(|| {
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
            if self
                .read::<WalletTransaction>(CF_LEDGER, &entry.reference)?
                .is_some()
            {
                return Err(SettlementError::Internal(format!(
                    "duplicate ledger reference {}",
                    entry.reference
                )));
            }
        }

        let mut batch = WriteBatch::default();
        batch.put_cf(
            self.cf(CF_ESCROWS)?,
            escrow_key.as_bytes(),
            serde_json::to_vec(&Versioned {
                version: commit.escrow.version + 1,
                record: commit.escrow.record,
            })?,
        );
        batch.put_cf(
            self.cf(CF_ORDERS)?,
            order_key.as_bytes(),
            serde_json::to_vec(&Versioned {
                version: commit.order.version + 1,
                record: commit.order.record,
            })?,
        );
        if let Some(vendor) = commit.vendor {
            let vendor_key = vendor.record.id.clone();
            batch.put_cf(
                self.cf(CF_VENDORS)?,
                vendor_key.as_bytes(),
                serde_json::to_vec(&Versioned {
                    version: vendor.version + 1,
                    record: vendor.record,
                })?,
            );
        }
        if let Some(entry) = commit.ledger_entry {
            batch.put_cf(
                self.cf(CF_LEDGER)?,
                entry.reference.as_bytes(),
                serde_json::to_vec(&entry)?,
            );
        }

        self.db.write(batch)?;
        Ok(())
    }

    async fn ledger_for_vendor(&self, vendor_id: &str) -> Result<Vec<WalletTransaction>> {
        let cf = self.cf(CF_LEDGER)?;
        let mut entries = Vec::new();
        for item in self.db.iterator_cf(cf, IteratorMode::Start) {
            let (_key, value) = item?;
            let entry: WalletTransaction = serde_json::from_slice(&value)?;
            if entry.vendor_id == vendor_id {
                entries.push(entry);
            }
        }
        entries.sort_by_key(|entry| entry.created_at);
        Ok(entries)
    }

    async fn all_vendors(&self) -> Result<Vec<Vendor>> {
        let cf = self.cf(CF_VENDORS)?;
        let mut vendors = Vec::new();
        for item in self.db.iterator_cf(cf, IteratorMode::Start) {
            let (_key, value) = item?;
            let versioned: Versioned<Vendor> = serde_json::from_slice(&value)?;
            vendors.push(versioned.record);
        }
        vendors.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(vendors)
    }
}
