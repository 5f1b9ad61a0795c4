//! Core instruction encoder.
//!
//! ```text
//! R:   [funct7 | rs2 | rs1 | funct3 | rd        | opcode]
//! I:   [  imm[11:0]  | rs1 | funct3 | rd        | opcode]
//! S:   [imm[11:5]|rs2| rs1 | funct3 | imm[4:0]  | opcode]
//! SB:  [imm[12|10:5]|rs2|rs1|funct3 | imm[4:1|11]| opcode]
//! U:   [      imm[31:12]            | rd        | opcode]
//! UJ:  [imm[20|10:1|11|19:12]       | rd        | opcode]
//! ```
//!
//! Every operand is validated on every call; operand count is checked before
//! any operand content.

use tracing::trace;

use crate::error::{AsmError, Result};
use crate::instructions::{self, Format, InstrDesc};
use crate::labels::{address_of, LabelTable, BASE_ADDRESS};
use crate::registers;
use crate::source::{parse_base_offset, parse_num};
use crate::word::MachineWord;

const IMM12: (i64, i64) = (-2048, 2047);
const SHAMT: (i64, i64) = (0, 31);
const IMM20: (i64, i64) = (-(1 << 20), (1 << 20) - 1);
const BRANCH: (i64, i64) = (-4096, 4094);
const JUMP: (i64, i64) = (-1_048_576, 1_048_574);

/// Encode one core instruction at `index` with [`BASE_ADDRESS`].
///
/// Without a label table, any non-numeric immediate is an unresolved symbol.
pub fn encode_instruction<S: AsRef<str>>(
    mnemonic: &str,
    operands: &[S],
    index: usize,
    labels: Option<&LabelTable>,
) -> Result<MachineWord> {
    Encoder::new(BASE_ADDRESS, labels).encode(mnemonic, operands, index)
}

pub struct Encoder<'a> {
    base: u32,
    labels: Option<&'a LabelTable>,
}

impl<'a> Encoder<'a> {
    pub fn new(base: u32, labels: Option<&'a LabelTable>) -> Self {
        Self { base, labels }
    }

    pub fn encode<S: AsRef<str>>(
        &self,
        mnemonic: &str,
        operands: &[S],
        index: usize,
    ) -> Result<MachineWord> {
        let desc = instructions::lookup(mnemonic).ok_or_else(|| AsmError::UnknownMnemonic {
            mnemonic: mnemonic.to_string(),
        })?;
        let ops: Vec<&str> = operands.iter().map(|s| s.as_ref().trim()).collect();
        let pc = address_of(self.base, index);
        let raw = match desc.format {
            Format::R => self.encode_r(desc, &ops)?,
            Format::I => self.encode_i(desc, &ops)?,
            Format::S => self.encode_s(desc, &ops)?,
            Format::SB => self.encode_sb(desc, &ops, pc)?,
            Format::U => self.encode_u(desc, &ops)?,
            Format::UJ => self.encode_uj(desc, &ops, pc)?,
        };
        trace!(mnemonic = desc.mnemonic, pc, raw, "encoded");
        Ok(MachineWord(raw))
    }

    fn encode_r(&self, desc: &InstrDesc, ops: &[&str]) -> Result<u32> {
        arity(desc, ops, 3)?;
        let rd = reg(ops[0])?;
        let rs1 = reg(ops[1])?;
        let rs2 = reg(ops[2])?;
        Ok(r_type(desc.opcode, rd, funct3(desc), rs1, rs2, desc.funct7.unwrap_or(0)))
    }

    fn encode_i(&self, desc: &InstrDesc, ops: &[&str]) -> Result<u32> {
        let (rd, rs1, imm, token) = if desc.base_offset && ops.len() == 2 {
            let rd = reg(ops[0])?;
            let (off, rs1) = base_offset(ops[1])?;
            (rd, rs1, off, ops[1])
        } else {
            if ops.len() != 3 {
                let expected = if desc.base_offset { "2 or 3" } else { "3" };
                return Err(AsmError::bad_operands(desc.mnemonic, expected, ops.len()));
            }
            let rd = reg(ops[0])?;
            let rs1 = reg(ops[1])?;
            (rd, rs1, self.value(ops[2])?, ops[2])
        };
        let imm = match desc.funct7 {
            Some(f7) => {
                check_range(token, imm, SHAMT)?;
                ((f7 << 5) | imm as u32) as i32
            }
            None => {
                check_range(token, imm, IMM12)?;
                imm as i32
            }
        };
        Ok(i_type(desc.opcode, rd, funct3(desc), rs1, imm))
    }

    fn encode_s(&self, desc: &InstrDesc, ops: &[&str]) -> Result<u32> {
        arity(desc, ops, 2)?;
        let rs2 = reg(ops[0])?;
        let (imm, rs1) = base_offset(ops[1])?;
        check_range(ops[1], imm, IMM12)?;
        Ok(s_type(desc.opcode, funct3(desc), rs1, rs2, imm as i32))
    }

    fn encode_sb(&self, desc: &InstrDesc, ops: &[&str], pc: u32) -> Result<u32> {
        arity(desc, ops, 3)?;
        let rs1 = reg(ops[0])?;
        let rs2 = reg(ops[1])?;
        let disp = self.displacement(ops[2], pc)?;
        check_range(ops[2], disp, BRANCH)?;
        check_even(ops[2], disp)?;
        Ok(b_type(desc.opcode, funct3(desc), rs1, rs2, disp as i32))
    }

    fn encode_u(&self, desc: &InstrDesc, ops: &[&str]) -> Result<u32> {
        arity(desc, ops, 2)?;
        let rd = reg(ops[0])?;
        let imm = self.value(ops[1])?;
        check_range(ops[1], imm, IMM20)?;
        Ok(u_type(desc.opcode, rd, ((imm as u32) & 0xF_FFFF) << 12))
    }

    fn encode_uj(&self, desc: &InstrDesc, ops: &[&str], pc: u32) -> Result<u32> {
        arity(desc, ops, 2)?;
        let rd = reg(ops[0])?;
        let disp = self.displacement(ops[1], pc)?;
        check_range(ops[1], disp, JUMP)?;
        check_even(ops[1], disp)?;
        Ok(j_type(desc.opcode, rd, disp as i32))
    }

    /// Integer literal, or the absolute address of a known label.
    fn value(&self, token: &str) -> Result<i64> {
        if let Some(v) = parse_num(token) {
            return Ok(v);
        }
        self.label(token).map(i64::from)
    }

    /// Integer literal displacement, or `label - pc`.
    fn displacement(&self, token: &str, pc: u32) -> Result<i64> {
        if let Some(v) = parse_num(token) {
            return Ok(v);
        }
        Ok(i64::from(self.label(token)?) - i64::from(pc))
    }

    fn label(&self, token: &str) -> Result<u32> {
        match self.labels {
            Some(t) => t
                .get(token)
                .ok_or_else(|| AsmError::bad_immediate(token, "not an integer or a defined label")),
            None => Err(AsmError::bad_immediate(token, "unresolved symbol")),
        }
    }
}

fn arity(desc: &InstrDesc, ops: &[&str], n: usize) -> Result<()> {
    if ops.len() != n {
        let expected = match n {
            2 => "2",
            _ => "3",
        };
        return Err(AsmError::bad_operands(desc.mnemonic, expected, ops.len()));
    }
    Ok(())
}

fn reg(token: &str) -> Result<u32> {
    registers::lookup(token)
        .map(u32::from)
        .ok_or_else(|| AsmError::bad_register(token, "not a register"))
}

fn base_offset(token: &str) -> Result<(i64, u32)> {
    match parse_base_offset(token)? {
        Some((off, base)) => Ok((off, u32::from(base))),
        None => Err(AsmError::bad_immediate(token, "expected imm(reg)")),
    }
}

fn funct3(desc: &InstrDesc) -> u32 {
    desc.funct3.unwrap_or(0)
}

fn check_range(token: &str, v: i64, (min, max): (i64, i64)) -> Result<()> {
    if v < min || v > max {
        return Err(AsmError::bad_immediate(token, format!("{v} out of range [{min}, {max}]")));
    }
    Ok(())
}

fn check_even(token: &str, v: i64) -> Result<()> {
    if v % 2 != 0 {
        return Err(AsmError::bad_immediate(token, format!("offset {v} is not 2-byte aligned")));
    }
    Ok(())
}

#[inline]
fn r_type(opcode: u32, rd: u32, funct3: u32, rs1: u32, rs2: u32, funct7: u32) -> u32 {
    (funct7 << 25) | (rs2 << 20) | (rs1 << 15) | (funct3 << 12) | (rd << 7) | opcode
}

#[inline]
fn i_type(opcode: u32, rd: u32, funct3: u32, rs1: u32, imm: i32) -> u32 {
    let imm = (imm as u32) & 0xFFF;
    (imm << 20) | (rs1 << 15) | (funct3 << 12) | (rd << 7) | opcode
}

#[inline]
fn s_type(opcode: u32, funct3: u32, rs1: u32, rs2: u32, imm: i32) -> u32 {
    let imm = imm as u32;
    let imm_hi = (imm >> 5) & 0x7F;
    let imm_lo = imm & 0x1F;
    (imm_hi << 25) | (rs2 << 20) | (rs1 << 15) | (funct3 << 12) | (imm_lo << 7) | opcode
}

/// imm[0] is implicit.
#[inline]
fn b_type(opcode: u32, funct3: u32, rs1: u32, rs2: u32, imm: i32) -> u32 {
    let imm = imm as u32;
    let bit12 = (imm >> 12) & 1;
    let bit11 = (imm >> 11) & 1;
    let bits10_5 = (imm >> 5) & 0x3F;
    let bits4_1 = (imm >> 1) & 0xF;
    (bit12 << 31)
        | (bits10_5 << 25)
        | (rs2 << 20)
        | (rs1 << 15)
        | (funct3 << 12)
        | (bits4_1 << 8)
        | (bit11 << 7)
        | opcode
}

#[inline]
fn u_type(opcode: u32, rd: u32, imm: u32) -> u32 {
    (imm & 0xFFFF_F000) | (rd << 7) | opcode
}

/// imm[0] is implicit.
#[inline]
fn j_type(opcode: u32, rd: u32, imm: i32) -> u32 {
    let imm = imm as u32;
    let bit20 = (imm >> 20) & 1;
    let bits10_1 = (imm >> 1) & 0x3FF;
    let bit11 = (imm >> 11) & 1;
    let bits19_12 = (imm >> 12) & 0xFF;
    (bit20 << 31) | (bits10_1 << 21) | (bit11 << 20) | (bits19_12 << 12) | (rd << 7) | opcode
}
