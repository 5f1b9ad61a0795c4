use serde::Serialize;

/// Error category, independent of the line context an error was raised in.
///
/// Besides the four operand and label categories, `UnknownMnemonic` covers a
/// mnemonic that is neither a core instruction nor a pseudo-instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ErrorKind {
    DuplicateLabel,
    BadRegister,
    BadImmediate,
    BadOperands,
    UnknownMnemonic,
}

#[derive(thiserror::Error, Debug)]
pub enum AsmError {
    #[error("label `{label}` is defined more than once")]
    DuplicateLabel { label: String },
    #[error("bad register `{token}`: {reason}")]
    BadRegister { token: String, reason: &'static str },
    #[error("bad immediate `{token}`: {reason}")]
    BadImmediate { token: String, reason: String },
    #[error("`{mnemonic}` takes {expected} operand(s), found {found}")]
    BadOperands {
        mnemonic: String,
        expected: &'static str,
        found: usize,
    },
    #[error("unknown instruction `{mnemonic}`")]
    UnknownMnemonic { mnemonic: String },
    #[error("line {line} `{text}`: {source}")]
    Line {
        line: usize,
        text: String,
        #[source]
        source: Box<AsmError>,
    },
}

impl AsmError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AsmError::DuplicateLabel { .. } => ErrorKind::DuplicateLabel,
            AsmError::BadRegister { .. } => ErrorKind::BadRegister,
            AsmError::BadImmediate { .. } => ErrorKind::BadImmediate,
            AsmError::BadOperands { .. } => ErrorKind::BadOperands,
            AsmError::UnknownMnemonic { .. } => ErrorKind::UnknownMnemonic,
            AsmError::Line { source, .. } => source.kind(),
        }
    }

    /// Attach the 1-based source line and its text. Already-wrapped errors
    /// keep their original context.
    pub fn at_line(self, line: usize, text: impl Into<String>) -> Self {
        match self {
            AsmError::Line { .. } => self,
            other => AsmError::Line {
                line,
                text: text.into(),
                source: Box::new(other),
            },
        }
    }

    pub(crate) fn bad_register(token: &str, reason: &'static str) -> Self {
        AsmError::BadRegister {
            token: token.to_string(),
            reason,
        }
    }

    pub(crate) fn bad_immediate(token: &str, reason: impl Into<String>) -> Self {
        AsmError::BadImmediate {
            token: token.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn bad_operands(mnemonic: &str, expected: &'static str, found: usize) -> Self {
        AsmError::BadOperands {
            mnemonic: mnemonic.to_string(),
            expected,
            found,
        }
    }
}

pub type Result<T> = std::result::Result<T, AsmError>;
