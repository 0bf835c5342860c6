//! Runtime interpreter error implementation.

use dse_asm::{Command, PanicReason};

use thiserror::Error;

/// Interpreter runtime error variants.
///
/// Every executor fault is fatal to the running program; the variants
/// only differ in how much context was available at the failure site.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum InterpreterError {
    /// The execution faulted while running a decoded command.
    #[error("Execution error: {0}, command {1:?}")]
    PanicCommand(PanicReason, Command),
    /// The execution faulted outside any specific command.
    #[error("Execution error: {0}")]
    Panic(PanicReason),
    /// The supplied program length is not a multiple of the command
    /// word size.
    #[error("Program length {0} is not a whole number of command words")]
    ProgramNotWordAligned(usize),
    /// The program carries the data specification magic but an
    /// unsupported version word.
    #[error("Unsupported data specification version {0:#010x}")]
    VersionMismatch(u32),
    /// The host-supplied output area cannot hold the header and
    /// pointer table.
    #[error("Output area too small: {provided} bytes, {required} required")]
    OutputAreaTooSmall {
        /// Bytes available in the output area.
        provided: usize,
        /// Bytes the serialised output needs.
        required: usize,
    },
}

impl InterpreterError {
    /// Return the specified panic reason that caused this error, if
    /// applicable.
    pub const fn panic_reason(&self) -> Option<PanicReason> {
        match self {
            Self::PanicCommand(reason, _) | Self::Panic(reason) => Some(*reason),
            _ => None,
        }
    }

    /// Return the command that caused this error, if applicable.
    pub const fn command(&self) -> Option<&Command> {
        match self {
            Self::PanicCommand(_, command) => Some(command),
            _ => None,
        }
    }
}

impl From<PanicReason> for InterpreterError {
    fn from(reason: PanicReason) -> Self {
        Self::Panic(reason)
    }
}
