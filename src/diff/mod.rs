pub mod tokenizer;
pub mod types;

pub use tokenizer::file_blocks;
pub use types::{FileDiff, Hunk};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DiffError {
    /// A structurally broken file block. Fatal for that file only.
    #[error("malformed diff for {path} at line {line}: {reason}")]
    Malformed {
        path: String,
        line: usize,
        reason: String,
    },
}
