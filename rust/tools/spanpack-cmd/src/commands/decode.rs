use anyhow::{Context, Result};

use spanpack_payload::decode;

use crate::utils::{parse_hex, read_input};

pub fn run(start: u64, payload: Option<String>) -> Result<()> {
    let bytes = parse_hex(&read_input(payload)?)?;
    log::debug!("decoding {} payload bytes at start position {start}", bytes.len());

    let record = decode(start, &bytes)
        .with_context(|| format!("Failed to decode payload at start position {start}"))?;
    println!("{}", serde_json::to_string_pretty(&record)?);
    Ok(())
}
