use serde::{Deserialize, Serialize};

/// Location of a declaration token in the concatenated model source.
///
/// `line` counts across all loaded files; the pipeline maps it back to a
/// single file once file indexing is available.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceSpan {
    pub line: u32,
    pub column: u32,
    pub token_text: String,
}

impl SourceSpan {
    pub fn new(line: u32, column: u32, token_text: impl Into<String>) -> Self {
        Self {
            line,
            column,
            token_text: token_text.into(),
        }
    }

    /// True for spans that were never attached to a token.
    pub fn is_unknown(&self) -> bool {
        self.line == 0 && self.token_text.is_empty()
    }
}
