//! The three-stage pipeline: expand pseudos, resolve labels, encode.
//!
//! Order matters. Addresses are assigned only after every pseudo has been
//! expanded, since each one may grow into a different number of core
//! instructions and shift everything after it.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::encoder::Encoder;
use crate::error::Result;
use crate::labels::{address_of, resolve_labels_at, LabelTable, BASE_ADDRESS};
use crate::pseudo::{expand_pseudos, PSEUDOS};
use crate::source::{parse_source, Instruction};
use crate::word::MachineWord;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssemblerConfig {
    /// Address of the first instruction.
    pub base_address: u32,
}

impl Default for AssemblerConfig {
    fn default() -> Self {
        Self {
            base_address: BASE_ADDRESS,
        }
    }
}

/// One encoded instruction with where it lives and where it came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assembled {
    pub address: u32,
    pub word: MachineWord,
    pub instruction: Instruction,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Program {
    pub labels: LabelTable,
    pub code: Vec<Assembled>,
}

impl Program {
    pub fn words(&self) -> Vec<MachineWord> {
        self.code.iter().map(|a| a.word).collect()
    }
}

#[derive(Debug, Clone, Default)]
pub struct Assembler {
    pub cfg: AssemblerConfig,
}

impl Assembler {
    pub fn new(cfg: AssemblerConfig) -> Self {
        Self { cfg }
    }

    /// Assemble a whole translation unit. The first error aborts the run.
    pub fn assemble_program<I, S>(&self, lines: I) -> Result<Program>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let source = parse_source(lines);
        let expanded = expand_pseudos(&source, PSEUDOS)?;
        let (code, labels) = resolve_labels_at(&expanded, self.cfg.base_address)?;

        let encoder = Encoder::new(self.cfg.base_address, Some(&labels));
        let mut out = Vec::with_capacity(code.len());
        for (index, instr) in code.into_iter().enumerate() {
            let word = encoder
                .encode(&instr.mnemonic, &instr.operands, index)
                .map_err(|e| e.at_line(instr.source, instr.to_string()))?;
            out.push(Assembled {
                address: address_of(self.cfg.base_address, index),
                word,
                instruction: instr,
            });
        }
        debug!(
            base = self.cfg.base_address,
            words = out.len(),
            labels = labels.len(),
            "assembled"
        );
        Ok(Program { labels, code: out })
    }

    pub fn assemble<I, S>(&self, lines: I) -> Result<Vec<MachineWord>>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Ok(self.assemble_program(lines)?.words())
    }
}

/// Assemble with the default configuration.
pub fn assemble<I, S>(lines: I) -> Result<Vec<MachineWord>>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    Assembler::default().assemble(lines)
}
