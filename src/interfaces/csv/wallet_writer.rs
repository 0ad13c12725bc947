use std::io::Write;

use crate::domain::vendor::Vendor;
use crate::error::Result;

/// Writes the final vendor wallet state as CSV.
pub struct WalletWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> WalletWriter<W> {
    pub fn new(target: W) -> Self {
        Self {
            writer: csv::Writer::from_writer(target),
        }
    }

    pub fn write_wallets(&mut self, vendors: Vec<Vendor>) -> Result<()> {
        self.writer.write_record(["vendor", "balance", "total_sales"])?;
        for vendor in vendors {
            self.writer.write_record([
                vendor.id.as_str(),
                &vendor.wallet_balance.to_string(),
                &vendor.total_sales.to_string(),
            ])?;
        }
        self.writer.flush()?;
        Ok(())
    }
}
