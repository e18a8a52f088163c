//! Heuristic grammar for C++-style interface declarations.
//!
//! Not a real IDL parser: the scanner is line-oriented for the top level
//! and only switches to brace matching once an `interface` keyword is seen.

pub mod extract;
pub mod members;
pub mod normalize;
pub mod types;

pub use types::Interface;
#[cfg(test)]
pub use types::MemberKind;

use std::collections::HashSet;

use regex::Regex;
use thiserror::Error;
use tracing::debug;

use crate::config::DescriptorConfig;

#[derive(Debug, Error)]
pub enum GrammarError {
    #[error("invalid grammar pattern: {0}")]
    Pattern(#[from] regex::Error),
}

/// Compiled patterns plus the member descriptor policy.
///
/// Build once per run and share across files.
#[derive(Debug)]
pub struct Grammar {
    interface_keyword: Regex,
    declaration: Regex,
    uuid: Regex,
    spacing: Regex,
    method: Regex,
    attribute: Regex,
    constant: Regex,
    /// Member descriptors that do not change the binary layout.
    ignored_descriptors: HashSet<String>,
}

impl Grammar {
    pub fn new(descriptors: &[DescriptorConfig]) -> Result<Self, GrammarError> {
        let ignored_descriptors: HashSet<String> = descriptors
            .iter()
            .filter(|d| !d.affects_binary_compat)
            .map(|d| d.token.trim().to_string())
            .collect();
        debug!(ignored = ignored_descriptors.len(), "compiled interface grammar");

        Ok(Self {
            interface_keyword: Regex::new(r"^interface\b")?,
            declaration: Regex::new(
                r"^interface\s+(?P<name>[A-Za-z_]\w*)\s*(?::\s*(?P<base>[A-Za-z_][\w:]*))?\s*$",
            )?,
            uuid: Regex::new(r"\buuid\s*\(\s*(?P<uuid>[^)]*?)\s*\)")?,
            spacing: Regex::new(r"\s*([()\[\],=<>*&{}])\s*")?,
            method: Regex::new(
                r"^(?:[^(]+?)\s?(?P<name>[A-Za-z_]\w*)\(.*\)(?:\s?raises\(.*\))?$",
            )?,
            attribute: Regex::new(r"^(?:readonly\s)?attribute\s.*?(?P<name>[A-Za-z_]\w*)$")?,
            constant: Regex::new(r"^const\s.*?(?P<name>[A-Za-z_]\w*)=")?,
            ignored_descriptors,
        })
    }
}

#[cfg(test)]
pub(crate) fn test_grammar() -> Grammar {
    Grammar::new(&crate::config::default_descriptors()).unwrap()
}
