use std::io::Write;
use tempfile::NamedTempFile;

/// One vendor (V1, balance 10000), one paid order (O1) and one held escrow
/// (E1, 5000): the state the checkout flow leaves behind.
pub const SEED: &str = r#"{
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

pub fn write_temp_file(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}
