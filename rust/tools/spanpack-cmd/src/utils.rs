//! Common utilities for spanpack-cmd

use anyhow::{Context, Result};
use std::io::Read;

/// Returns the argument itself, or the whole of stdin when the argument is
/// missing or `-`.
pub fn read_input(arg: Option<String>) -> Result<String> {
    match arg {
        Some(value) if value != "-" => Ok(value),
        _ => {
            let mut input = String::new();
            std::io::stdin()
                .read_to_string(&mut input)
                .context("Failed to read stdin")?;
            Ok(input)
        }
    }
}

/// Parses hex text into bytes, ignoring whitespace and an optional `0x` prefix.
pub fn parse_hex(text: &str) -> Result<Vec<u8>> {
    let cleaned: String = text.split_whitespace().collect();
    let cleaned = cleaned.strip_prefix("0x").unwrap_or(&cleaned);
    hex::decode(cleaned).with_context(|| format!("Invalid hex payload: {text}"))
}
