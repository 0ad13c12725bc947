use serde::Deserialize;
use std::io::Read;

use crate::domain::escrow::EscrowTransaction;
use crate::domain::order::Order;
use crate::domain::ports::SettlementStore;
use crate::domain::vendor::Vendor;
use crate::error::Result;

/// Initial state for a settlement run: the records the checkout flow would
/// have written before any settlement call arrives.
#[derive(Debug, Default, Deserialize)]
pub struct SeedFile {
    #[serde(default)]
    pub vendors: Vec<Vendor>,
    #[serde(default)]
    pub orders: Vec<Order>,
    #[serde(default)]
    pub escrows: Vec<EscrowTransaction>,
}

impl SeedFile {
    pub fn from_reader(source: impl Read) -> Result<Self> {
        Ok(serde_json::from_reader(source)?)
    }

    /// Inserts every seeded record through the store's uniqueness-checked
    /// insert primitives.
    pub async fn load_into(self, store: &dyn SettlementStore) -> Result<()> {
        for vendor in self.vendors {
            store.insert_vendor(vendor).await?;
        }
        for order in self.orders {
            store.insert_order(order).await?;
        }
        for escrow in self.escrows {
            store.insert_escrow(escrow).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::escrow::EscrowStatus;
    use crate::domain::money::Balance;
    use crate::infrastructure::in_memory::InMemoryStore;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn test_seed_round_trip() {
        let data = r#"{
            "vendors": [{"id": "V1", "wallet_balance": 10000, "total_sales": 0}],
            "orders": [{
                "id": "O1",
                "status": "pending",
                "payment_status": "paid",
                "escrow_status": "held",
                "updated_at": "2026-01-15T10:00:00Z"
            }],
            "escrows": [{
                "id": "E1",
                "order_id": "O1",
                "vendor_id": "V1",
                "vendor_amount": 5000,
                "status": "held",
                "created_at": "2026-01-15T10:00:00Z"
            }]
        }"#;

        let seed = SeedFile::from_reader(data.as_bytes()).unwrap();
        let store = InMemoryStore::new();
        seed.load_into(&store).await.unwrap();

        let vendor = store.get_vendor("V1").await.unwrap().unwrap();
        assert_eq!(vendor.record.wallet_balance, Balance::new(dec!(10000)));

        let escrow = store.find_escrow_by_order("O1").await.unwrap().unwrap();
        assert_eq!(escrow.record.status, EscrowStatus::Held);
        assert_eq!(escrow.record.vendor_amount, dec!(5000));
    }

    #[test]
    fn test_missing_sections_default_empty() {
        let seed = SeedFile::from_reader("{}".as_bytes()).unwrap();
        assert!(seed.vendors.is_empty());
        assert!(seed.orders.is_empty());
        assert!(seed.escrows.is_empty());
    }
}
