//! Inspect command implementation

use anyhow::Result;
use serde::Serialize;
use serde_json::Value;

use spanpack_bits::{bitstream::BitReader, elias_gamma::EliasGammaRead};
use spanpack_payload::{PayloadHeader, PayloadRecord, ShapeTag, decode};

use crate::utils::{parse_hex, read_input};

#[derive(Serialize)]
struct InspectSummary {
    total_bytes: usize,
    total_bits_used: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    header: Option<HeaderInfo>,
    fields: Vec<FieldInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    record: Option<PayloadRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

#[derive(Serialize)]
struct HeaderInfo {
    shape: &'static str,
    has_offset: bool,
    has_real_offset: bool,
    has_parent: bool,
    has_payload: bool,
    value_kind: bool,
}

#[derive(Serialize)]
struct FieldInfo {
    name: String,
    bit_start: usize,
    bit_len: usize,
    value: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    bits: Option<String>,
}

pub fn run(verbose: u8, start: u64, payload: Option<String>) -> Result<()> {
    let bytes = parse_hex(&read_input(payload)?)?;
    let summary = inspect(&bytes, start, verbose);
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

fn inspect(bytes: &[u8], start: u64, verbose: u8) -> InspectSummary {
    let mut walker = FieldWalker {
        bytes,
        reader: BitReader::new(bytes),
        fields: Vec::new(),
        verbose,
    };

    let mut header_info = None;
    let error = match PayloadHeader::read(&mut walker.reader) {
        Ok(header) => {
            header_info = Some(create_header_info(&header));
            walker.push_field("header".to_string(), 0, Value::Null);
            walker.walk_fields(&header).err()
        }
        Err(e) => Some(e),
    };

    if let Some(e) = &error {
        log::debug!("payload layout walk stopped: {e}");
    }

    InspectSummary {
        total_bytes: bytes.len(),
        total_bits_used: walker.reader.bits_consumed(),
        header: header_info,
        fields: walker.fields,
        record: error.is_none().then(|| decode(start, bytes).ok()).flatten(),
        error: error.map(|e| e.to_string()),
    }
}

fn create_header_info(header: &PayloadHeader) -> HeaderInfo {
    HeaderInfo {
        shape: match header.shape {
            ShapeTag::None => "none",
            ShapeTag::Single => "single",
            ShapeTag::Range => "range",
            ShapeTag::Set => "set",
        },
        has_offset: header.has_offset(),
        has_real_offset: header.has_real_offset(),
        has_parent: header.has_parent(),
        has_payload: header.has_payload(),
        value_kind: header
            .flags
            .contains(spanpack_payload::PayloadFlags::VALUE_KIND),
    }
}

/// Walks the fields of a payload in wire order, recording where each one sits.
struct FieldWalker<'a> {
    bytes: &'a [u8],
    reader: BitReader<'a>,
    fields: Vec<FieldInfo>,
    verbose: u8,
}

impl<'a> FieldWalker<'a> {
    fn walk_fields(&mut self, header: &PayloadHeader) -> spanpack_common::Result<()> {
        self.step("id", |r| r.read_gamma_non_negative())?;

        match header.shape {
            ShapeTag::None | ShapeTag::Single => {}
            ShapeTag::Range => {
                self.step("range_length", |r| r.read_gamma_positive())?;
            }
            ShapeTag::Set => {
                let count = self.step("set_count", |r| r.read_gamma_positive())?;
                for i in 1..count {
                    self.step(&format!("set_gap[{i}]"), |r| r.read_gamma_positive())?;
                }
            }
        }

        if header.has_offset() {
            self.step("offset_start", |r| r.read_gamma_non_negative())?;
            self.step("offset_length", |r| r.read_gamma_positive())?;
            if header.has_real_offset() {
                self.step("real_offset_delta", |r| r.read_gamma_signed())?;
                self.step("real_offset_length", |r| r.read_gamma_positive())?;
            }
        } else if header.has_real_offset() {
            self.step("real_offset_start", |r| r.read_gamma_non_negative())?;
            self.step("real_offset_length", |r| r.read_gamma_positive())?;
        }

        if header.has_parent() {
            self.step("parent_delta", |r| r.read_gamma_signed())?;
        }

        if header.has_payload() {
            let bit_start = self.reader.cursor().byte_pos() * 8;
            let rest = self.reader.read_remaining_bytes()?;
            self.fields.push(FieldInfo {
                name: "payload".to_string(),
                bit_start,
                bit_len: rest.len() * 8,
                value: Value::String(hex::encode(rest)),
                bits: None,
            });
        }
        Ok(())
    }

    fn step<T>(
        &mut self,
        name: &str,
        read: impl FnOnce(&mut BitReader<'a>) -> spanpack_common::Result<T>,
    ) -> spanpack_common::Result<T>
    where
        T: Copy + Into<Value>,
    {
        let bit_start = self.reader.bits_consumed();
        let value = read(&mut self.reader)?;
        self.push_field(name.to_string(), bit_start, value.into());
        Ok(value)
    }

    fn push_field(&mut self, name: String, bit_start: usize, value: Value) {
        let bit_end = self.reader.bits_consumed();
        let bits = (self.verbose > 0).then(|| bit_string(self.bytes, bit_start, bit_end));
        self.fields.push(FieldInfo {
            name,
            bit_start,
            bit_len: bit_end - bit_start,
            value,
            bits,
        });
    }
}

/// Renders stream bits `start..end` in stream order.
fn bit_string(bytes: &[u8], start: usize, end: usize) -> String {
    (start..end)
        .map(|i| if (bytes[i / 8] >> (i % 8)) & 1 == 1 { '1' } else { '0' })
        .collect()
}
