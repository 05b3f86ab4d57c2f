//! Decides which index entries get a generated test.

use std::fmt;

use crate::error::{Result, TestgenError};
use crate::fetch::{Cache, Remote};
use crate::index::{LeafEntry, OpcodeEntry, OpcodeIndex, QualifiedName, Status};

/// A hard-coded exclusion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipRule {
    /// Every entry of this opcode, including all its register sub-entries.
    Opcode(u8),
    /// Exactly one register sub-entry.
    Reg(u8, u8),
}

impl SkipRule {
    pub fn matches(&self, name: &QualifiedName) -> bool {
        match *self {
            SkipRule::Opcode(op) => name.opcode() == op,
            SkipRule::Reg(op, reg) => name.opcode() == op && name.reg() == Some(reg),
        }
    }
}

impl fmt::Display for SkipRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipRule::Opcode(op) => write!(f, "{op:02X}"),
            SkipRule::Reg(op, reg) => write!(f, "{op:02X}.{reg}"),
        }
    }
}

pub const SKIP_RULES: &[SkipRule] = &[
    // POP CS / extended opcodes.
    SkipRule::Opcode(0x0F),
    // WAIT and HLT.
    SkipRule::Opcode(0x9B),
    SkipRule::Opcode(0xF4),
    // IDIV: known emulator bug.
    SkipRule::Reg(0xF6, 7),
    SkipRule::Reg(0xF7, 7),
];

/// Opcodes the corpus encodes as composite although they are plain leaves. Their real data sits
/// at `reg["0"]`.
pub const QUIRK_OPCODES: [&str; 3] = ["8F", "C6", "C7"];

pub fn is_quirk(code: &str) -> bool {
    QUIRK_OPCODES.iter().any(|q| q.eq_ignore_ascii_case(code))
}

/// Why an entry was not selected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Exclusion {
    Skipped(SkipRule),
    Status(Status),
}

pub fn exclusion(name: &QualifiedName, status: &Status) -> Option<Exclusion> {
    if let Some(rule) = SKIP_RULES.iter().find(|rule| rule.matches(name)) {
        return Some(Exclusion::Skipped(*rule));
    }
    if !status.is_testable() {
        return Some(Exclusion::Status(status.clone()));
    }
    None
}

pub fn is_eligible(name: &QualifiedName, status: &Status) -> bool {
    exclusion(name, status).is_none()
}

/// Flatten one top-level entry into its leaves, repairing the quirk opcodes first.
///
/// Quirk repair only applies at the top level and only to [`QUIRK_OPCODES`].
pub fn expand<'a>(
    code: &str,
    entry: &'a OpcodeEntry,
) -> Result<Vec<(QualifiedName, &'a LeafEntry)>> {
    if is_quirk(code) {
        if let OpcodeEntry::Composite { .. } = entry {
            let leaf = entry
                .sub_entry("0")
                .ok_or_else(|| TestgenError::MalformedQuirk {
                    opcode: code.to_string(),
                })?;
            tracing::debug!("treating quirk opcode {code} as leaf reg[\"0\"]");
            return Ok(vec![(QualifiedName::parse(code)?, leaf)]);
        }
    }

    match entry {
        OpcodeEntry::Composite { reg } => reg
            .iter()
            .map(|(r, leaf)| QualifiedName::sub(code, r).map(|name| (name, leaf)))
            .collect(),
        OpcodeEntry::Leaf(leaf) => Ok(vec![(QualifiedName::parse(code)?, leaf)]),
    }
}

/// Output of [`select`].
#[derive(Debug, Default)]
pub struct Selection {
    /// Entries handed to the callback, in index order.
    pub selected: Vec<QualifiedName>,
    /// Entries removed by a skip rule or a non-testable status.
    pub excluded: usize,
    /// Eligible entries whose test vectors could not be fetched.
    pub dropped: Vec<QualifiedName>,
}

/// Walk `index`, filter it and materialize the test vectors of every eligible entry.
///
/// `on_selected` runs for each entry as soon as its vectors are present, so work done for earlier
/// entries survives a fatal error on a later one.
pub fn select<R, F>(
    index: &OpcodeIndex,
    cache: &Cache<R>,
    mut on_selected: F,
) -> Result<Selection>
where
    R: Remote,
    F: FnMut(&QualifiedName, &LeafEntry) -> Result<()>,
{
    let mut selection = Selection::default();

    for (code, entry) in &index.opcodes {
        for (name, leaf) in expand(code, entry)? {
            if let Some(reason) = exclusion(&name, &leaf.status) {
                tracing::debug!(%name, ?reason, "excluded");
                selection.excluded += 1;
                continue;
            }

            if !cache.materialize(name.as_str())? {
                selection.dropped.push(name);
                continue;
            }

            on_selected(&name, leaf)?;
            selection.selected.push(name);
        }
    }

    Ok(selection)
}
