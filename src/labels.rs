use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::error::{AsmError, Result};
use crate::source::{Instruction, SourceLine};

/// Address of the first instruction.
pub const BASE_ADDRESS: u32 = 0x0040_0000;
pub const INSTRUCTION_BYTES: u32 = 4;

/// Byte address of the instruction at `index`.
pub fn address_of(base: u32, index: usize) -> u32 {
    base.wrapping_add((index as u32).wrapping_mul(INSTRUCTION_BYTES))
}

/// Label name to byte address. Names are unique; redefinition is an error.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LabelTable {
    entries: BTreeMap<String, u32>,
}

impl LabelTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn define(&mut self, name: &str, addr: u32) -> Result<()> {
        if self.entries.contains_key(name) {
            return Err(AsmError::DuplicateLabel {
                label: name.to_string(),
            });
        }
        self.entries.insert(name.to_string(), addr);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<u32> {
        self.entries.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u32)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), *v))
    }
}

/// Assign addresses from [`BASE_ADDRESS`], record labels and strip them.
pub fn resolve_labels(lines: &[SourceLine]) -> Result<(Vec<Instruction>, LabelTable)> {
    resolve_labels_at(lines, BASE_ADDRESS)
}

/// Like [`resolve_labels`] with an explicit base address.
///
/// Must run on the pseudo-expanded stream: indices here are final
/// machine-code slots. A label-only line binds to the next instruction's
/// address and does not take a slot itself.
pub fn resolve_labels_at(
    lines: &[SourceLine],
    base: u32,
) -> Result<(Vec<Instruction>, LabelTable)> {
    let mut labels = LabelTable::new();
    let mut code = Vec::with_capacity(lines.len());
    for line in lines {
        let addr = address_of(base, code.len());
        if let Some(name) = &line.label {
            labels
                .define(name, addr)
                .map_err(|e| e.at_line(line.line, line.to_string()))?;
            trace!(label = %name, addr, "label defined");
        }
        if let Some(instr) = &line.instruction {
            code.push(instr.clone());
        }
    }
    debug!(
        lines = lines.len(),
        instructions = code.len(),
        labels = labels.len(),
        "labels resolved"
    );
    Ok((code, labels))
}
