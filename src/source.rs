//! Source text model: lines, instructions and operand tokens.
//!
//! A line is `[LABEL:] [mnemonic op, op, ...] [# comment]`. Operands stay
//! untyped strings until an encoder (or a pseudo definition) validates them.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{AsmError, Result};
use crate::registers;

/// A mnemonic, its operand tokens and the 1-based source line it came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instruction {
    pub mnemonic: String,
    pub operands: Vec<String>,
    pub source: usize,
}

impl Instruction {
    pub fn new<I, S>(mnemonic: &str, operands: I, source: usize) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            mnemonic: mnemonic.to_ascii_lowercase(),
            operands: operands.into_iter().map(Into::into).collect(),
            source,
        }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.mnemonic)?;
        if !self.operands.is_empty() {
            write!(f, " {}", self.operands.join(", "))?;
        }
        Ok(())
    }
}

/// One line of input: a label, an instruction, both, or neither.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceLine {
    pub label: Option<String>,
    pub instruction: Option<Instruction>,
    pub line: usize,
}

impl SourceLine {
    pub fn parse(text: &str, line: usize) -> Self {
        let code = match text.find('#') {
            Some(p) => &text[..p],
            None => text,
        };
        let (label, body) = split_label(code.trim());
        let body = body.trim();
        let instruction = if body.is_empty() {
            None
        } else {
            let (mn, rest) = match body.find(char::is_whitespace) {
                Some(p) => (&body[..p], &body[p..]),
                None => (body, ""),
            };
            let operands = rest
                .split(|c: char| c == ',' || c.is_whitespace())
                .filter(|t| !t.is_empty());
            Some(Instruction::new(mn, operands, line))
        };
        Self {
            label: label.map(str::to_string),
            instruction,
            line,
        }
    }

    pub fn is_blank(&self) -> bool {
        self.label.is_none() && self.instruction.is_none()
    }
}

impl fmt::Display for SourceLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.label, &self.instruction) {
            (Some(l), Some(i)) => write!(f, "{l}: {i}"),
            (Some(l), None) => write!(f, "{l}:"),
            (None, Some(i)) => write!(f, "{i}"),
            (None, None) => Ok(()),
        }
    }
}

/// Parse raw lines, numbering them from 1.
pub fn parse_source<I, S>(lines: I) -> Vec<SourceLine>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    lines
        .into_iter()
        .enumerate()
        .map(|(i, l)| SourceLine::parse(l.as_ref(), i + 1))
        .collect()
}

fn split_label(s: &str) -> (Option<&str>, &str) {
    if let Some(p) = s.find(':') {
        let name = s[..p].trim();
        if is_label_name(name) {
            return (Some(name), &s[p + 1..]);
        }
    }
    (None, s)
}

/// Identifier usable as a label: `[A-Za-z_.][A-Za-z0-9_.]*`.
pub fn is_label_name(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' || c == '.' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.')
}

/// Decimal or `0x` hex integer, optionally signed.
pub fn parse_num(s: &str) -> Option<i64> {
    let t = s.trim();
    let (neg, body) = match t.strip_prefix('-') {
        Some(r) => (true, r),
        None => (false, t.strip_prefix('+').unwrap_or(t)),
    };
    let v = if let Some(hex) = body.strip_prefix("0x").or_else(|| body.strip_prefix("0X")) {
        if hex.is_empty() || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return None;
        }
        i64::from_str_radix(hex, 16).ok()?
    } else {
        if body.is_empty() || !body.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        body.parse::<i64>().ok()?
    };
    Some(if neg { -v } else { v })
}

/// Split `imm(reg)` into offset and base register index.
/// `Ok(None)` means the token is not in base-offset shape at all.
pub fn parse_base_offset(token: &str) -> Result<Option<(i64, u8)>> {
    let t = token.trim();
    let Some(inner) = t.strip_suffix(')') else { return Ok(None) };
    let Some(open) = inner.find('(') else { return Ok(None) };
    let (off, reg) = (inner[..open].trim(), &inner[open + 1..]);
    let base = registers::lookup(reg)
        .ok_or_else(|| AsmError::bad_register(reg, "unknown base register"))?;
    let offset = if off.is_empty() {
        0
    } else {
        parse_num(off).ok_or_else(|| AsmError::bad_immediate(off, "offset is not an integer"))?
    };
    Ok(Some((offset, base)))
}

/// What a token looks like, before any position-specific validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operand<'a> {
    Register(u8),
    Immediate(i64),
    BaseOffset { offset: i64, base: u8 },
    Label(&'a str),
    Unknown(&'a str),
}

impl<'a> Operand<'a> {
    pub fn classify(token: &'a str) -> Self {
        if let Some(r) = registers::lookup(token) {
            Operand::Register(r)
        } else if let Some(v) = parse_num(token) {
            Operand::Immediate(v)
        } else if let Ok(Some((offset, base))) = parse_base_offset(token) {
            Operand::BaseOffset { offset, base }
        } else if is_label_name(token) {
            Operand::Label(token)
        } else {
            Operand::Unknown(token)
        }
    }
}
