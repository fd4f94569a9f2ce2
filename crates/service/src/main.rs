use anyhow::Context;
use serde_json::json;

use bloodbank_service::{BloodBank, BloodBankConfig};

fn main() -> anyhow::Result<()> {
    bloodbank_observability::init();

    let config = BloodBankConfig::from_env();
    let bank = BloodBank::new(config).context("failed to seed blood bank")?;

    let created = bank.ensure_all_groups()?;
    tracing::info!(created, "all blood groups tracked");

    let report = json!({
        "inventory": bank.inventory()?,
        "lowStockAlerts": bank.low_stock_alerts()?,
    });
    println!("{}", serde_json::to_string_pretty(&report)?);

    let summary = bank.shutdown()?;
    tracing::info!(total_units = summary.inventory.total_units(), "done");
    Ok(())
}
