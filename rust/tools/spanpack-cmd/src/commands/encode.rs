use anyhow::{Context, Result};

use spanpack_payload::{PayloadRecord, encode};

use crate::utils::read_input;

pub fn run(start: u64, record: Option<String>) -> Result<()> {
    let json = read_input(record)?;
    let record: PayloadRecord =
        serde_json::from_str(&json).context("Failed to parse payload record JSON")?;
    log::debug!("encoding record {} at start position {start}", record.id);

    let bytes = encode(&record, start)
        .with_context(|| format!("Failed to encode record {}", record.id))?;
    println!("{}", hex::encode(bytes));
    Ok(())
}
