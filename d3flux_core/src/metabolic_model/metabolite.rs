//! This module provides the metabolite struct representing a metabolite

use derive_builder::Builder;
use serde_json::Value;

use crate::metabolic_model::map_info::{Annotated, Notes};

/// Represents a metabolite
#[derive(Builder, Debug, Clone, PartialEq)]
pub struct Metabolite {
    /// Used to identify the metabolite (must be unique)
    pub id: String,
    /// Human Readable name of the metabolite
    #[builder(default = "None")]
    pub name: Option<String>,
    /// Which compartment the metabolite is in
    #[builder(default = "None")]
    pub compartment: Option<String>,
    /// Electrical charge of the Metabolite
    #[builder(default = "None")]
    pub charge: Option<i32>,
    /// Chemical Formula of the metabolite
    #[builder(default = "None")]
    pub formula: Option<String>,
    /// Notes about the metabolite, including its `map_info`
    #[builder(default)]
    pub notes: Notes,
    /// Metabolite annotations
    #[builder(default = "None")]
    pub annotation: Option<Value>,
}

impl Metabolite {
    /// Create a new metabolite with only an id
    pub fn new_id_only(id: &str) -> Metabolite {
        Metabolite {
            id: id.to_string(),
            name: None,
            compartment: None,
            charge: None,
            formula: None,
            notes: Notes::default(),
            annotation: None,
        }
    }
}

impl Annotated for Metabolite {
    fn notes(&self) -> &Notes {
        &self.notes
    }

    fn notes_mut(&mut self) -> &mut Notes {
        &mut self.notes
    }
}
