//! GenLayer calldata codec.
//!
//! Intelligent contracts take their arguments and return their results in a
//! compact self-describing format. Every value starts with a ULEB128 header
//! whose low three bits are a type tag and whose remaining bits carry either
//! the integer itself or the length of what follows:
//!
//! | tag | meaning                                                   |
//! |-----|-----------------------------------------------------------|
//! | 0   | special: `null` (0), `false` (8), `true` (16), address (24) |
//! | 1   | non-negative integer `n`                                  |
//! | 2   | negative integer, stores `-n - 1`                         |
//! | 3   | bytes, followed by `len` raw bytes                        |
//! | 4   | UTF-8 string, followed by `len` bytes                     |
//! | 5   | array of `len` values                                     |
//! | 6   | map of `len` entries, keys sorted, each key a length-prefixed string |
//!
//! An address is the special header followed by 20 raw bytes.

use std::collections::BTreeMap;

use alloy::{hex, primitives::Address};
use serde_json::Value;

use crate::error::{AppError, Result};

const BITS_IN_TYPE: u32 = 3;

const TYPE_SPECIAL: u8 = 0;
const TYPE_PINT: u8 = 1;
const TYPE_NINT: u8 = 2;
const TYPE_BYTES: u8 = 3;
const TYPE_STR: u8 = 4;
const TYPE_ARR: u8 = 5;
const TYPE_MAP: u8 = 6;

const SPECIAL_NULL: u8 = TYPE_SPECIAL;
const SPECIAL_FALSE: u8 = (1 << BITS_IN_TYPE) | TYPE_SPECIAL;
const SPECIAL_TRUE: u8 = (2 << BITS_IN_TYPE) | TYPE_SPECIAL;
const SPECIAL_ADDR: u8 = (3 << BITS_IN_TYPE) | TYPE_SPECIAL;

/// A decoded calldata value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CalldataValue {
    Null,
    Bool(bool),
    Int(i128),
    Bytes(Vec<u8>),
    Str(String),
    Address(Address),
    Array(Vec<CalldataValue>),
    Map(BTreeMap<String, CalldataValue>),
}

impl CalldataValue {
    /// Build the `{method, args}` object a contract call is encoded from.
    pub fn call(method: &str, args: Vec<CalldataValue>) -> Self {
        let mut map = BTreeMap::new();
        map.insert("method".to_string(), CalldataValue::Str(method.to_string()));
        if !args.is_empty() {
            map.insert("args".to_string(), CalldataValue::Array(args));
        }
        CalldataValue::Map(map)
    }

    /// Numeric reading with the same leniency as the contract's JSON clients:
    /// null is 0, booleans are 0/1, numeric strings are parsed, anything
    /// else is 0.
    pub fn as_i64_lossy(&self) -> i64 {
        match self {
            CalldataValue::Null => 0,
            CalldataValue::Bool(b) => i64::from(*b),
            CalldataValue::Int(n) => (*n).clamp(i64::MIN as i128, i64::MAX as i128) as i64,
            CalldataValue::Str(s) => {
                let s = s.trim();
                s.parse::<i64>()
                    .ok()
                    .or_else(|| s.parse::<f64>().ok().filter(|f| f.is_finite()).map(|f| f as i64))
                    .unwrap_or(0)
            }
            _ => 0,
        }
    }

    /// Truthiness of a read result.
    pub fn is_truthy(&self) -> bool {
        match self {
            CalldataValue::Null => false,
            CalldataValue::Bool(b) => *b,
            CalldataValue::Int(n) => *n != 0,
            CalldataValue::Str(s) => !s.is_empty(),
            _ => true,
        }
    }

    pub fn as_array(&self) -> Option<&[CalldataValue]> {
        match self {
            CalldataValue::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&BTreeMap<String, CalldataValue>> {
        match self {
            CalldataValue::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Convert into JSON for display and tool output.
    ///
    /// Integers outside the `i64` range become decimal strings, bytes become
    /// `0x`-prefixed hex.
    pub fn to_json(&self) -> Value {
        match self {
            CalldataValue::Null => Value::Null,
            CalldataValue::Bool(b) => Value::Bool(*b),
            CalldataValue::Int(n) => match i64::try_from(*n) {
                Ok(n) => Value::from(n),
                Err(_) => Value::String(n.to_string()),
            },
            CalldataValue::Bytes(bytes) => Value::String(hex::encode_prefixed(bytes)),
            CalldataValue::Str(s) => Value::String(s.clone()),
            CalldataValue::Address(addr) => Value::String(addr.to_checksum(None)),
            CalldataValue::Array(items) => Value::Array(items.iter().map(Self::to_json).collect()),
            CalldataValue::Map(map) => {
                Value::Object(map.iter().map(|(k, v)| (k.clone(), v.to_json())).collect())
            }
        }
    }
}

impl From<&Value> for CalldataValue {
    fn from(value: &Value) -> Self {
        match value {
            Value::Null => CalldataValue::Null,
            Value::Bool(b) => CalldataValue::Bool(*b),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    CalldataValue::Int(i128::from(i))
                } else if let Some(u) = n.as_u64() {
                    CalldataValue::Int(i128::from(u))
                } else {
                    CalldataValue::Int(n.as_f64().map(|f| f as i128).unwrap_or(0))
                }
            }
            Value::String(s) => CalldataValue::Str(s.clone()),
            Value::Array(items) => CalldataValue::Array(items.iter().map(Self::from).collect()),
            Value::Object(map) => {
                CalldataValue::Map(map.iter().map(|(k, v)| (k.clone(), Self::from(v))).collect())
            }
        }
    }
}

impl From<bool> for CalldataValue {
    fn from(b: bool) -> Self {
        CalldataValue::Bool(b)
    }
}

impl From<i64> for CalldataValue {
    fn from(n: i64) -> Self {
        CalldataValue::Int(i128::from(n))
    }
}

impl From<u64> for CalldataValue {
    fn from(n: u64) -> Self {
        CalldataValue::Int(i128::from(n))
    }
}

impl From<&str> for CalldataValue {
    fn from(s: &str) -> Self {
        CalldataValue::Str(s.to_string())
    }
}

impl From<String> for CalldataValue {
    fn from(s: String) -> Self {
        CalldataValue::Str(s)
    }
}

impl From<Address> for CalldataValue {
    fn from(addr: Address) -> Self {
        CalldataValue::Address(addr)
    }
}

// ============================================================================
// Encoding
// ============================================================================

/// Encode a value into calldata bytes.
pub fn encode(value: &CalldataValue) -> Vec<u8> {
    let mut out = Vec::new();
    encode_into(&mut out, value);
    out
}

fn write_uleb(out: &mut Vec<u8>, mut n: u128) {
    loop {
        let byte = (n & 0x7f) as u8;
        n >>= 7;
        if n == 0 {
            out.push(byte);
            return;
        }
        out.push(byte | 0x80);
    }
}

fn write_header(out: &mut Vec<u8>, len: usize, tag: u8) {
    write_uleb(out, ((len as u128) << BITS_IN_TYPE) | u128::from(tag));
}

fn encode_into(out: &mut Vec<u8>, value: &CalldataValue) {
    match value {
        CalldataValue::Null => out.push(SPECIAL_NULL),
        CalldataValue::Bool(false) => out.push(SPECIAL_FALSE),
        CalldataValue::Bool(true) => out.push(SPECIAL_TRUE),
        CalldataValue::Address(addr) => {
            out.push(SPECIAL_ADDR);
            out.extend_from_slice(addr.as_slice());
        }
        CalldataValue::Int(n) if *n >= 0 => {
            write_uleb(out, ((*n as u128) << BITS_IN_TYPE) | u128::from(TYPE_PINT));
        }
        CalldataValue::Int(n) => {
            // -n - 1 never overflows for negative n
            let magnitude = (-(*n + 1)) as u128;
            write_uleb(out, (magnitude << BITS_IN_TYPE) | u128::from(TYPE_NINT));
        }
        CalldataValue::Bytes(bytes) => {
            write_header(out, bytes.len(), TYPE_BYTES);
            out.extend_from_slice(bytes);
        }
        CalldataValue::Str(s) => {
            write_header(out, s.len(), TYPE_STR);
            out.extend_from_slice(s.as_bytes());
        }
        CalldataValue::Array(items) => {
            write_header(out, items.len(), TYPE_ARR);
            for item in items {
                encode_into(out, item);
            }
        }
        CalldataValue::Map(map) => {
            write_header(out, map.len(), TYPE_MAP);
            for (key, item) in map {
                write_uleb(out, key.len() as u128);
                out.extend_from_slice(key.as_bytes());
                encode_into(out, item);
            }
        }
    }
}

// ============================================================================
// Decoding
// ============================================================================

/// Decode calldata bytes into a value. Trailing bytes are an error.
pub fn decode(bytes: &[u8]) -> Result<CalldataValue> {
    let mut reader = Reader { bytes, pos: 0 };
    let value = reader.value()?;
    if reader.pos != bytes.len() {
        return Err(AppError::Calldata(format!(
            "{} trailing bytes after value",
            bytes.len() - reader.pos
        )));
    }
    Ok(value)
}

/// Decode hex-encoded calldata, with or without a `0x` prefix.
pub fn decode_hex(s: &str) -> Result<CalldataValue> {
    let bytes = hex::decode(s.trim())?;
    decode(&bytes)
}

struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn take(&mut self, len: usize) -> Result<&'a [u8]> {
        let end = self
            .pos
            .checked_add(len)
            .filter(|end| *end <= self.bytes.len())
            .ok_or_else(|| AppError::Calldata("unexpected end of input".into()))?;
        let slice = &self.bytes[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    fn uleb(&mut self) -> Result<u128> {
        let mut result: u128 = 0;
        let mut shift = 0u32;
        loop {
            let byte = self.take(1)?[0];
            let chunk = u128::from(byte & 0x7f);
            if shift >= 128 || (shift > 0 && chunk.leading_zeros() < shift) {
                return Err(AppError::NumericOverflow("ULEB128 value exceeds 128 bits".into()));
            }
            result |= chunk << shift;
            if byte & 0x80 == 0 {
                return Ok(result);
            }
            shift += 7;
        }
    }

    fn len(header: u128) -> Result<usize> {
        usize::try_from(header >> BITS_IN_TYPE)
            .map_err(|_| AppError::NumericOverflow("length exceeds usize".into()))
    }

    fn value(&mut self) -> Result<CalldataValue> {
        let header = self.uleb()?;
        let tag = (header & 0b111) as u8;

        match tag {
            TYPE_SPECIAL => match u8::try_from(header) {
                Ok(SPECIAL_NULL) => Ok(CalldataValue::Null),
                Ok(SPECIAL_FALSE) => Ok(CalldataValue::Bool(false)),
                Ok(SPECIAL_TRUE) => Ok(CalldataValue::Bool(true)),
                Ok(SPECIAL_ADDR) => Ok(CalldataValue::Address(Address::from_slice(self.take(20)?))),
                _ => Err(AppError::Calldata(format!("unknown special value {header}"))),
            },
            TYPE_PINT => i128::try_from(header >> BITS_IN_TYPE)
                .map(CalldataValue::Int)
                .map_err(|_| AppError::NumericOverflow("integer exceeds i128".into())),
            TYPE_NINT => i128::try_from(header >> BITS_IN_TYPE)
                .map(|magnitude| CalldataValue::Int(-magnitude - 1))
                .map_err(|_| AppError::NumericOverflow("integer exceeds i128".into())),
            TYPE_BYTES => {
                let len = Self::len(header)?;
                Ok(CalldataValue::Bytes(self.take(len)?.to_vec()))
            }
            TYPE_STR => {
                let len = Self::len(header)?;
                let raw = self.take(len)?;
                String::from_utf8(raw.to_vec())
                    .map(CalldataValue::Str)
                    .map_err(|e| AppError::Calldata(format!("invalid utf-8 string: {e}")))
            }
            TYPE_ARR => {
                let len = Self::len(header)?;
                let mut items = Vec::with_capacity(len.min(1024));
                for _ in 0..len {
                    items.push(self.value()?);
                }
                Ok(CalldataValue::Array(items))
            }
            TYPE_MAP => {
                let len = Self::len(header)?;
                let mut map = BTreeMap::new();
                for _ in 0..len {
                    let key_len = usize::try_from(self.uleb()?)
                        .map_err(|_| AppError::NumericOverflow("key length exceeds usize".into()))?;
                    let key = String::from_utf8(self.take(key_len)?.to_vec())
                        .map_err(|e| AppError::Calldata(format!("invalid utf-8 key: {e}")))?;
                    let item = self.value()?;
                    map.insert(key, item);
                }
                Ok(CalldataValue::Map(map))
            }
            _ => Err(AppError::Calldata(format!("unknown type tag {tag}"))),
        }
    }
}
