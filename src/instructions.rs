use serde::{Deserialize, Serialize};

/// Bit layout / operand shape of a core instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Format {
    R,
    I,
    S,
    SB,
    U,
    UJ,
}

pub const OP_LUI: u32 = 0b011_0111;
pub const OP_AUIPC: u32 = 0b001_0111;
pub const OP_JAL: u32 = 0b110_1111;
pub const OP_JALR: u32 = 0b110_0111;
pub const OP_BRANCH: u32 = 0b110_0011;
pub const OP_LOAD: u32 = 0b000_0011;
pub const OP_STORE: u32 = 0b010_0011;
pub const OP_IMM: u32 = 0b001_0011;
pub const OP_REG: u32 = 0b011_0011;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct InstrDesc {
    pub mnemonic: &'static str,
    pub format: Format,
    pub opcode: u32,
    pub funct3: Option<u32>,
    pub funct7: Option<u32>,
    /// Accepts the `imm(reg)` operand form (loads, stores, jalr).
    pub base_offset: bool,
}

const fn r(mnemonic: &'static str, funct3: u32, funct7: u32) -> InstrDesc {
    InstrDesc {
        mnemonic,
        format: Format::R,
        opcode: OP_REG,
        funct3: Some(funct3),
        funct7: Some(funct7),
        base_offset: false,
    }
}

const fn i(mnemonic: &'static str, opcode: u32, funct3: u32) -> InstrDesc {
    InstrDesc {
        mnemonic,
        format: Format::I,
        opcode,
        funct3: Some(funct3),
        funct7: None,
        base_offset: opcode != OP_IMM,
    }
}

// shift-immediates: funct7 lives in imm[11:5], shamt in imm[4:0]
const fn shift(mnemonic: &'static str, funct3: u32, funct7: u32) -> InstrDesc {
    InstrDesc {
        mnemonic,
        format: Format::I,
        opcode: OP_IMM,
        funct3: Some(funct3),
        funct7: Some(funct7),
        base_offset: false,
    }
}

const fn s(mnemonic: &'static str, funct3: u32) -> InstrDesc {
    InstrDesc {
        mnemonic,
        format: Format::S,
        opcode: OP_STORE,
        funct3: Some(funct3),
        funct7: None,
        base_offset: true,
    }
}

const fn sb(mnemonic: &'static str, funct3: u32) -> InstrDesc {
    InstrDesc {
        mnemonic,
        format: Format::SB,
        opcode: OP_BRANCH,
        funct3: Some(funct3),
        funct7: None,
        base_offset: false,
    }
}

const fn u(mnemonic: &'static str, opcode: u32) -> InstrDesc {
    InstrDesc {
        mnemonic,
        format: Format::U,
        opcode,
        funct3: None,
        funct7: None,
        base_offset: false,
    }
}

pub const TABLE: &[InstrDesc] = &[
    // R
    r("add", 0b000, 0b000_0000),
    r("sub", 0b000, 0b010_0000),
    r("sll", 0b001, 0b000_0000),
    r("slt", 0b010, 0b000_0000),
    r("sltu", 0b011, 0b000_0000),
    r("xor", 0b100, 0b000_0000),
    r("srl", 0b101, 0b000_0000),
    r("sra", 0b101, 0b010_0000),
    r("or", 0b110, 0b000_0000),
    r("and", 0b111, 0b000_0000),
    // I
    i("addi", OP_IMM, 0b000),
    i("slti", OP_IMM, 0b010),
    i("sltiu", OP_IMM, 0b011),
    i("xori", OP_IMM, 0b100),
    i("ori", OP_IMM, 0b110),
    i("andi", OP_IMM, 0b111),
    shift("slli", 0b001, 0b000_0000),
    shift("srli", 0b101, 0b000_0000),
    shift("srai", 0b101, 0b010_0000),
    i("lb", OP_LOAD, 0b000),
    i("lh", OP_LOAD, 0b001),
    i("lw", OP_LOAD, 0b010),
    i("lbu", OP_LOAD, 0b100),
    i("lhu", OP_LOAD, 0b101),
    i("jalr", OP_JALR, 0b000),
    // S
    s("sb", 0b000),
    s("sh", 0b001),
    s("sw", 0b010),
    // SB
    sb("beq", 0b000),
    sb("bne", 0b001),
    sb("blt", 0b100),
    sb("bge", 0b101),
    sb("bltu", 0b110),
    sb("bgeu", 0b111),
    // U
    u("lui", OP_LUI),
    u("auipc", OP_AUIPC),
    // UJ
    InstrDesc {
        mnemonic: "jal",
        format: Format::UJ,
        opcode: OP_JAL,
        funct3: None,
        funct7: None,
        base_offset: false,
    },
];

pub fn lookup(mnemonic: &str) -> Option<&'static InstrDesc> {
    TABLE.iter().find(|d| d.mnemonic.eq_ignore_ascii_case(mnemonic))
}

pub fn is_core(mnemonic: &str) -> bool {
    lookup(mnemonic).is_some()
}
