//! Static catalog entry types: named terms and situational rules.
//!
//! Both are loaded from JSON arrays and matched by their `index_regex`.

use serde::{Deserialize, Serialize};

/// Category a term belongs to. A term may carry several.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TermCategory {
    Person,
    Other,
}

/// A `name: value` attribute attached to a term.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TermAttribute {
    pub name: String,
    pub value: String,
}

/// A named entity the assistant should know about when it is mentioned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Term {
    /// Pattern searched for anywhere in the query text
    pub index_regex: String,

    pub name: String,

    #[serde(default)]
    pub categories: Vec<TermCategory>,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub alias: String,

    /// Opaque per-term flags, carried through untouched
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub flags: Vec<serde_json::Value>,

    #[serde(default)]
    pub attributes: Vec<TermAttribute>,
}

impl Term {
    /// Whether this term is tagged with `category`.
    pub fn has_category(&self, category: TermCategory) -> bool {
        self.categories.contains(&category)
    }
}

/// Behaviour rules that apply when their pattern appears in context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
    pub index_regex: String,

    #[serde(default)]
    pub rules: Vec<String>,
}
