//! This module provides the Gene struct, representing a gene
//!
//! Genes are not drawn, they are only carried so that a model read from JSON is written
//! back out unchanged.
use std::fmt::{Display, Formatter};

use derive_builder::Builder;
use serde_json::Value;

use crate::metabolic_model::map_info::Notes;

/// Structure Representing a Gene
#[derive(Builder, Clone, Debug, PartialEq)]
pub struct Gene {
    /// Used to identify the gene
    pub id: String,
    /// Human Readable Gene Name
    #[builder(default = "None")]
    pub name: Option<String>,
    /// Notes about the gene
    #[builder(default)]
    pub notes: Notes,
    /// Gene Annotations
    #[builder(default = "None")]
    pub annotation: Option<Value>,
}

impl Display for Gene {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.id)
    }
}
