pub mod escrow;
pub mod ledger;
pub mod money;
pub mod order;
pub mod ports;
pub mod vendor;
