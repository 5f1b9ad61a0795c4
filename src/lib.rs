pub mod assembler;
pub mod encoder;
pub mod error;
pub mod instructions;
pub mod labels;
pub mod pseudo;
pub mod registers;
pub mod source;
pub mod word;

pub use assembler::{assemble, Assembled, Assembler, AssemblerConfig, Program};
pub use encoder::{encode_instruction, Encoder};
pub use error::{AsmError, ErrorKind, Result};
pub use labels::{resolve_labels, resolve_labels_at, LabelTable, BASE_ADDRESS};
pub use pseudo::{expand_pseudos, PseudoDef, PSEUDOS};
pub use source::{parse_source, Instruction, SourceLine};
pub use word::MachineWord;
