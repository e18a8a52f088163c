use std::io::Read;
use std::path::Path;

use thiserror::Error;

/// Problems that leave the run with nothing to work on.
#[derive(Debug, Error)]
pub enum InputError {
    #[error("Failed to read diff from stdin: {0}")]
    Read(#[from] std::io::Error),

    #[error("No diff on stdin; pipe a unified diff of the interface files to check")]
    Empty,

    #[error("Working tree root {0} is not a directory")]
    TreeRoot(String),
}

/// Read the whole diff. Invalid UTF-8 is replaced rather than rejected;
/// only the IDL grammar's ASCII matters.
pub fn read_diff<R: Read>(mut reader: R) -> Result<String, InputError> {
    let mut bytes = Vec::new();
    reader.read_to_end(&mut bytes)?;
    let text = String::from_utf8_lossy(&bytes).into_owned();
    if text.trim().is_empty() {
        return Err(InputError::Empty);
    }
    Ok(text)
}

pub fn check_tree_root(root: &Path) -> Result<(), InputError> {
    if root.is_dir() {
        Ok(())
    } else {
        Err(InputError::TreeRoot(root.display().to_string()))
    }
}
