use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrendInfo {
    pub description: String,
}

/// Structured answer for a fashion term or brand. Every field is required.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TermInfo {
    pub definition: String,
    pub examples: Vec<String>,
    pub brands: Vec<String>,
    pub related_terms: Vec<String>,
}

impl TermInfo {
    pub const REQUIRED_FIELDS: [&'static str; 4] =
        ["definition", "examples", "brands", "related_terms"];
}
