use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, Chip8Error>;

/// Fatal conditions raised by the engine.
///
/// Recoverable conditions (unknown opcodes, the end-of-program sentinel)
/// are reported through [`crate::StepOutcome`] instead.
#[derive(Debug, thiserror::Error)]
pub enum Chip8Error {
    #[error("memory access out of bounds at address {address:#06X}")]
    MemoryFault { address: usize },

    #[error("stack underflow: return from subroutine with an empty call stack")]
    StackUnderflow,

    #[error("invalid key index: {0:#04X}")]
    InvalidKey(u8),

    #[error("failed to load program image {}", path.display())]
    LoadFailure {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
