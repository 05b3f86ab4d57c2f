//! Typed view of the corpus `metadata.json` opcode index.
//!
//! Iteration order of both the top-level opcode map and every `reg` map follows the source
//! document, which is what makes generated output deterministic.

use std::fmt;
use std::fs;
use std::path::Path;

use serde::de::{DeserializeOwned, Error as _};
use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};

use crate::error::{Result, TestgenError};

/// File name of the index inside the corpus.
pub const INDEX_FILE: &str = "metadata.json";

/// Mask used when an entry has no `flags-mask`: compare every flag bit.
pub const DEFAULT_FLAGS_MASK: u16 = 0xFFFF;

/// Testability classification of an opcode.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum Status {
    Undefined,
    Prefix,
    Fpu,
    Undocumented,
    Alias,
    /// Any other status (`normal` and friends); these are testable.
    Other(String),
}

impl Status {
    pub fn as_str(&self) -> &str {
        match self {
            Status::Undefined => "undefined",
            Status::Prefix => "prefix",
            Status::Fpu => "fpu",
            Status::Undocumented => "undocumented",
            Status::Alias => "alias",
            Status::Other(s) => s,
        }
    }

    pub fn is_testable(&self) -> bool {
        matches!(self, Status::Other(_))
    }
}

impl From<String> for Status {
    fn from(s: String) -> Self {
        match s.as_str() {
            "undefined" => Status::Undefined,
            "prefix" => Status::Prefix,
            "fpu" => Status::Fpu,
            "undocumented" => Status::Undocumented,
            "alias" => Status::Alias,
            _ => Status::Other(s),
        }
    }
}

impl From<&str> for Status {
    fn from(s: &str) -> Self {
        Status::from(s.to_string())
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An opcode (or opcode/reg pair) that maps to exactly one test-vector file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LeafEntry {
    pub status: Status,
    #[serde(rename = "flags-mask", default)]
    pub flags_mask: Option<u16>,
}

impl LeafEntry {
    pub fn new(status: impl Into<Status>, flags_mask: Option<u16>) -> Self {
        Self {
            status: status.into(),
            flags_mask,
        }
    }

    /// Effective flags mask, defaulting to [`DEFAULT_FLAGS_MASK`].
    pub fn flags_mask(&self) -> u16 {
        self.flags_mask.unwrap_or(DEFAULT_FLAGS_MASK)
    }
}

/// One top-level index entry.
///
/// The shape is decided by the presence of a `reg` field: entries that have one are split into
/// per-register sub-entries (group opcodes such as `F6`), everything else is a leaf. A `reg` map
/// that fails to parse is an error, never a fallback to the leaf shape.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "RawEntry")]
pub enum OpcodeEntry {
    Composite { reg: Vec<(String, LeafEntry)> },
    Leaf(LeafEntry),
}

#[derive(Deserialize)]
struct RawEntry {
    #[serde(default, deserialize_with = "ordered_entries_opt")]
    reg: Option<Vec<(String, LeafEntry)>>,
    status: Option<Status>,
    #[serde(rename = "flags-mask", default)]
    flags_mask: Option<u16>,
}

impl TryFrom<RawEntry> for OpcodeEntry {
    type Error = &'static str;

    fn try_from(raw: RawEntry) -> std::result::Result<Self, Self::Error> {
        match (raw.reg, raw.status) {
            (Some(reg), _) => Ok(OpcodeEntry::Composite { reg }),
            (None, Some(status)) => Ok(OpcodeEntry::Leaf(LeafEntry {
                status,
                flags_mask: raw.flags_mask,
            })),
            (None, None) => Err("opcode entry has neither `reg` nor `status`"),
        }
    }
}

impl OpcodeEntry {
    /// Sub-entry for register index `reg`, if this is a composite entry that has one.
    pub fn sub_entry(&self, reg: &str) -> Option<&LeafEntry> {
        match self {
            OpcodeEntry::Composite { reg: subs } => {
                subs.iter().find(|(r, _)| r == reg).map(|(_, entry)| entry)
            }
            OpcodeEntry::Leaf(_) => None,
        }
    }
}

/// The parsed `metadata.json` document.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct OpcodeIndex {
    #[serde(deserialize_with = "ordered_entries")]
    pub opcodes: Vec<(String, OpcodeEntry)>,
}

impl OpcodeIndex {
    pub fn from_slice(bytes: &[u8]) -> serde_json::Result<Self> {
        serde_json::from_slice(bytes)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let bytes = fs::read(path).map_err(|e| TestgenError::io(path, e))?;
        Self::from_slice(&bytes).map_err(|source| TestgenError::Json {
            path: path.to_path_buf(),
            source,
        })
    }
}

// `serde_json` is built with `preserve_order`, so the intermediate `Map` keeps document order.
fn ordered_entries<'de, D, T>(deserializer: D) -> std::result::Result<Vec<(String, T)>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let map = Map::<String, Value>::deserialize(deserializer)?;
    map.into_iter()
        .map(|(key, value)| {
            serde_json::from_value(value)
                .map(|entry| (key, entry))
                .map_err(D::Error::custom)
        })
        .collect()
}

fn ordered_entries_opt<'de, D, T>(
    deserializer: D,
) -> std::result::Result<Option<Vec<(String, T)>>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    ordered_entries(deserializer).map(Some)
}

/// `"{opcode}"` or `"{opcode}.{reg}"`, e.g. `04` or `f6.7`.
///
/// The text is kept verbatim for file and symbol names; the numeric parts are used for
/// skip-rule matching.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QualifiedName {
    text: String,
    opcode: u8,
    reg: Option<u8>,
}

impl QualifiedName {
    pub fn parse(text: &str) -> Result<Self> {
        let invalid = || TestgenError::InvalidQualifiedName(text.to_string());

        let (code, reg) = match text.split_once('.') {
            Some((code, reg)) => (code, Some(reg)),
            None => (text, None),
        };

        if code.len() != 2 || !code.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(invalid());
        }
        let opcode = u8::from_str_radix(code, 16).map_err(|_| invalid())?;

        let reg = match reg {
            Some(r) if !r.is_empty() && r.bytes().all(|b| b.is_ascii_digit()) => {
                Some(r.parse::<u8>().map_err(|_| invalid())?)
            }
            Some(_) => return Err(invalid()),
            None => None,
        };

        Ok(Self {
            text: text.to_string(),
            opcode,
            reg,
        })
    }

    pub fn sub(code: &str, reg: &str) -> Result<Self> {
        Self::parse(&format!("{code}.{reg}"))
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn opcode(&self) -> u8 {
        self.opcode
    }

    pub fn reg(&self) -> Option<u8> {
        self.reg
    }
}

impl fmt::Display for QualifiedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}
