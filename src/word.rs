use std::fmt;

use serde::{Deserialize, Serialize};

/// One encoded 32-bit instruction.
///
/// `Display` renders the reference text form: binary MSB first, grouped in
/// nibbles, e.g. `0000 0000 0000 0000 0000 0000 0110 1111`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MachineWord(pub u32);

impl MachineWord {
    pub fn bits(self) -> u32 {
        self.0
    }

    pub fn to_le_bytes(self) -> [u8; 4] {
        self.0.to_le_bytes()
    }

    /// Binary text without group separators.
    pub fn to_bit_string(self) -> String {
        format!("{:032b}", self.0)
    }
}

impl From<MachineWord> for u32 {
    fn from(w: MachineWord) -> u32 {
        w.0
    }
}

impl fmt::Display for MachineWord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for nibble in (0..8).rev() {
            let v = (self.0 >> (nibble * 4)) & 0xF;
            write!(f, "{v:04b}")?;
            if nibble != 0 {
                f.write_str(" ")?;
            }
        }
        Ok(())
    }
}

impl fmt::LowerHex for MachineWord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::LowerHex::fmt(&self.0, f)
    }
}
