use serde::{Deserialize, Serialize};

use crate::domain::money::{Amount, Balance};

/// The slice of the vendor aggregate the settlement engine touches.
///
/// `wallet_balance` only grows through sale credits here; withdrawals are a
/// separate flow that never goes through this engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vendor {
    pub id: String,
    pub wallet_balance: Balance,
    #[serde(default)]
    pub total_sales: u64,
}

impl Vendor {
    pub fn new(id: impl Into<String>, wallet_balance: Balance) -> Self {
        Self {
            id: id.into(),
            wallet_balance,
            total_sales: 0,
        }
    }

    /// Credits one sale and returns the balance snapshot after the credit,
    /// which the caller records on the ledger entry.
    pub fn credit_sale(&mut self, amount: Amount) -> Balance {
        self.wallet_balance += amount.into();
        self.total_sales += 1;
        self.wallet_balance
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_credit_sale_adds_exactly_once() {
        let mut vendor = Vendor::new("V1", Balance::new(dec!(10000)));
        let after = vendor.credit_sale(Amount::new(dec!(5000)).unwrap());

        assert_eq!(after, Balance::new(dec!(15000)));
        assert_eq!(vendor.wallet_balance, Balance::new(dec!(15000)));
        assert_eq!(vendor.total_sales, 1);
    }

    #[test]
    fn test_credit_sale_accumulates() {
        let mut vendor = Vendor::new("V1", Balance::ZERO);
        vendor.credit_sale(Amount::new(dec!(5000)).unwrap());
        let after = vendor.credit_sale(Amount::new(dec!(7000)).unwrap());

        assert_eq!(after, Balance::new(dec!(12000)));
        assert_eq!(vendor.total_sales, 2);
    }
}
