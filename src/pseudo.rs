//! Pseudo-instruction expansion.
//!
//! Each [`PseudoDef`] is a fixed template over its caller's operands. Operand
//! count and kind are checked before anything is emitted, so a pseudo either
//! expands completely or not at all. Immediate ranges are left to the encoder.

use tracing::{debug, trace};

use crate::error::{AsmError, Result};
use crate::registers::{self, SCRATCH, SCRATCH_NAME};
use crate::source::{is_label_name, parse_num, Instruction, SourceLine};
use Slot::{Imm32, Reg, Target};

/// Operand kind a pseudo accepts at one position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    Reg,
    /// Integer that fits in 32 bits, signed or unsigned.
    Imm32,
    /// Integer displacement or label.
    Target,
}

pub type ExpandFn = fn(&[&str], usize) -> Result<Vec<Instruction>>;

pub struct PseudoDef {
    pub mnemonic: &'static str,
    pub slots: &'static [Slot],
    /// Writes the scratch register, so callers may not name it.
    pub uses_scratch: bool,
    pub expand: ExpandFn,
}

impl PseudoDef {
    /// Check the operands against this template, then expand.
    pub fn apply<S: AsRef<str>>(&self, operands: &[S], source: usize) -> Result<Vec<Instruction>> {
        let ops: Vec<&str> = operands.iter().map(|s| s.as_ref().trim()).collect();
        if ops.len() != self.slots.len() {
            return Err(AsmError::BadOperands {
                mnemonic: self.mnemonic.to_string(),
                expected: ARITY[self.slots.len().min(ARITY.len() - 1)],
                found: ops.len(),
            });
        }
        for (tok, slot) in ops.iter().zip(self.slots) {
            check_slot(tok, *slot, self.uses_scratch)?;
        }
        (self.expand)(&ops, source)
    }
}

const ARITY: &[&str] = &["0", "1", "2", "3", "4", "5"];

fn check_slot(tok: &str, slot: Slot, uses_scratch: bool) -> Result<()> {
    match slot {
        Slot::Reg => match registers::lookup(tok) {
            Some(SCRATCH) if uses_scratch => Err(AsmError::bad_register(
                tok,
                "reserved for pseudo-instruction expansion",
            )),
            Some(_) => Ok(()),
            None => Err(AsmError::bad_register(tok, "not a register")),
        },
        Slot::Imm32 => match parse_num(tok) {
            Some(v) if (i64::from(i32::MIN)..=i64::from(u32::MAX)).contains(&v) => Ok(()),
            Some(_) => Err(AsmError::bad_immediate(tok, "does not fit in 32 bits")),
            None => Err(AsmError::bad_immediate(tok, "not an integer")),
        },
        Slot::Target => {
            if parse_num(tok).is_some() {
                Ok(())
            } else if registers::is_register(tok) {
                Err(AsmError::bad_immediate(tok, "register where a branch target is expected"))
            } else if is_label_name(tok) {
                Ok(())
            } else {
                Err(AsmError::bad_immediate(tok, "not an integer or a label"))
            }
        }
    }
}

pub const PSEUDOS: &[PseudoDef] = &[
    PseudoDef {
        mnemonic: "double",
        slots: &[Reg, Reg],
        uses_scratch: false,
        expand: double,
    },
    PseudoDef {
        mnemonic: "diffsums",
        slots: &[Reg, Reg, Reg, Reg, Reg],
        uses_scratch: true,
        expand: diffsums,
    },
    PseudoDef {
        mnemonic: "push",
        slots: &[Reg],
        uses_scratch: false,
        expand: push,
    },
    PseudoDef {
        mnemonic: "pop",
        slots: &[Reg],
        uses_scratch: false,
        expand: pop,
    },
    PseudoDef {
        mnemonic: "li",
        slots: &[Reg, Imm32],
        uses_scratch: false,
        expand: li,
    },
    PseudoDef {
        mnemonic: "mv",
        slots: &[Reg, Reg],
        uses_scratch: false,
        expand: mv,
    },
    PseudoDef {
        mnemonic: "beqz",
        slots: &[Reg, Target],
        uses_scratch: false,
        expand: beqz,
    },
    PseudoDef {
        mnemonic: "bnez",
        slots: &[Reg, Target],
        uses_scratch: false,
        expand: bnez,
    },
    PseudoDef {
        mnemonic: "j",
        slots: &[Target],
        uses_scratch: false,
        expand: j,
    },
    PseudoDef {
        mnemonic: "jalif",
        slots: &[Reg, Reg, Target],
        uses_scratch: false,
        expand: jalif,
    },
];

pub fn lookup<'d>(defs: &'d [PseudoDef], mnemonic: &str) -> Option<&'d PseudoDef> {
    defs.iter().find(|d| d.mnemonic.eq_ignore_ascii_case(mnemonic))
}

pub fn is_pseudo(mnemonic: &str) -> bool {
    lookup(PSEUDOS, mnemonic).is_some()
}

/// Replace every pseudo line with its core expansion. The label, if any,
/// moves to the first emitted instruction; other lines pass through.
pub fn expand_pseudos(lines: &[SourceLine], defs: &[PseudoDef]) -> Result<Vec<SourceLine>> {
    let mut out = Vec::with_capacity(lines.len());
    for line in lines {
        let Some(instr) = &line.instruction else {
            out.push(line.clone());
            continue;
        };
        let Some(def) = lookup(defs, &instr.mnemonic) else {
            out.push(line.clone());
            continue;
        };
        let expanded = def
            .apply(&instr.operands, instr.source)
            .map_err(|e| e.at_line(line.line, line.to_string()))?;
        trace!(pseudo = def.mnemonic, line = line.line, count = expanded.len(), "expanded");
        if expanded.is_empty() {
            if let Some(label) = &line.label {
                out.push(SourceLine {
                    label: Some(label.clone()),
                    instruction: None,
                    line: line.line,
                });
            }
            continue;
        }
        let mut label = line.label.clone();
        for instr in expanded {
            out.push(SourceLine {
                label: label.take(),
                instruction: Some(instr),
                line: line.line,
            });
        }
    }
    debug!(lines_in = lines.len(), lines_out = out.len(), "pseudo-instructions expanded");
    Ok(out)
}

fn emit<const N: usize>(mnemonic: &str, operands: [&str; N], source: usize) -> Instruction {
    Instruction::new(mnemonic, operands, source)
}

/// Destructure the operand list of `mnemonic` into exactly `N` tokens.
fn take<'o, const N: usize>(mnemonic: &str, ops: &[&'o str]) -> Result<[&'o str; N]> {
    <[&str; N]>::try_from(ops)
        .map_err(|_| AsmError::bad_operands(mnemonic, ARITY[N.min(ARITY.len() - 1)], ops.len()))
}

fn double(ops: &[&str], src: usize) -> Result<Vec<Instruction>> {
    let [rd, rs]: [&str; 2] = take("double", ops)?;
    Ok(vec![emit("add", [rd, rs, rs], src)])
}

// rd = (r1 - r2) + (r3 - r4)
fn diffsums(ops: &[&str], src: usize) -> Result<Vec<Instruction>> {
    let [rd, r1, r2, r3, r4]: [&str; 5] = take("diffsums", ops)?;
    Ok(vec![
        emit("sub", [SCRATCH_NAME, r1, r2], src),
        emit("sub", [rd, r3, r4], src),
        emit("add", [rd, SCRATCH_NAME, rd], src),
    ])
}

fn push(ops: &[&str], src: usize) -> Result<Vec<Instruction>> {
    let [rs]: [&str; 1] = take("push", ops)?;
    Ok(vec![
        emit("addi", ["sp", "sp", "-4"], src),
        emit("sw", [rs, "0(sp)"], src),
    ])
}

fn pop(ops: &[&str], src: usize) -> Result<Vec<Instruction>> {
    let [rd]: [&str; 1] = take("pop", ops)?;
    Ok(vec![
        emit("lw", [rd, "0(sp)"], src),
        emit("addi", ["sp", "sp", "4"], src),
    ])
}

/// Split a 32-bit value into a `lui` upper part and a sign-extended 12-bit
/// remainder so that `(hi << 12) + lo` wraps to the value.
pub fn split_hi_lo(value: i64) -> (i64, i64) {
    let v = i64::from(value as u32 as i32);
    let hi = (v + 0x800) >> 12;
    (hi, v - (hi << 12))
}

// lui first so rd never depends on its old value
fn li(ops: &[&str], src: usize) -> Result<Vec<Instruction>> {
    let [rd, imm]: [&str; 2] = take("li", ops)?;
    let value = parse_num(imm).ok_or_else(|| AsmError::bad_immediate(imm, "not an integer"))?;
    let (hi, lo) = split_hi_lo(value);
    let hi = hi.to_string();
    let mut out = vec![emit("lui", [rd, hi.as_str()], src)];
    if lo != 0 {
        let lo = lo.to_string();
        out.push(emit("addi", [rd, rd, lo.as_str()], src));
    }
    Ok(out)
}

fn mv(ops: &[&str], src: usize) -> Result<Vec<Instruction>> {
    let [rd, rs]: [&str; 2] = take("mv", ops)?;
    Ok(vec![emit("addi", [rd, rs, "0"], src)])
}

fn beqz(ops: &[&str], src: usize) -> Result<Vec<Instruction>> {
    let [rs, target]: [&str; 2] = take("beqz", ops)?;
    Ok(vec![emit("beq", [rs, "zero", target], src)])
}

fn bnez(ops: &[&str], src: usize) -> Result<Vec<Instruction>> {
    let [rs, target]: [&str; 2] = take("bnez", ops)?;
    Ok(vec![emit("bne", [rs, "zero", target], src)])
}

fn j(ops: &[&str], src: usize) -> Result<Vec<Instruction>> {
    let [target]: [&str; 1] = take("j", ops)?;
    Ok(vec![emit("jal", ["zero", target], src)])
}

// skip the jal unless rs1 == rs2; a numeric target is relative to the jal
fn jalif(ops: &[&str], src: usize) -> Result<Vec<Instruction>> {
    let [rs1, rs2, target]: [&str; 3] = take("jalif", ops)?;
    Ok(vec![
        emit("bne", [rs1, rs2, "8"], src),
        emit("jal", ["ra", target], src),
    ])
}
