//! This module provides a struct for representing reactions
use crate::configuration;
use crate::metabolic_model::map_info::{Annotated, Notes};
use derive_builder::Builder;
use indexmap::IndexMap;
use serde_json::Value;

/// Represents a reaction in the metabolic model
#[derive(Builder, Debug, Clone, PartialEq)]
pub struct Reaction {
    /// Used to identify the reaction
    pub id: String,
    /// Metabolite stoichiometry of the reaction
    ///
    /// Reactants have negative coefficients, products positive ones.
    #[builder(default = "IndexMap::new()")]
    pub metabolites: IndexMap<String, f64>,
    /// Human-readable reaction name
    #[builder(default = "None")]
    pub name: Option<String>,
    /// Gene Protein Reaction rule, kept as written
    #[builder(default = "String::new()")]
    pub gene_reaction_rule: String,
    /// Lower flux bound
    #[builder(default = "crate::configuration::current().lower_bound")]
    pub lower_bound: f64,
    /// Upper flux bound
    #[builder(default = "crate::configuration::current().upper_bound")]
    pub upper_bound: f64,
    /// Coefficient of the reaction in the objective function
    #[builder(default = "None")]
    pub objective_coefficient: Option<f64>,
    /// Reaction subsystem
    #[builder(default = "None")]
    pub subsystem: Option<String>,
    /// Notes about the reaction, including its `map_info`
    #[builder(default)]
    pub notes: Notes,
    /// Reaction Annotations
    #[builder(default = "None")]
    pub annotation: Option<Value>,
}

impl Reaction {
    /// Create a new reaction with only an id, using the configured default bounds
    pub fn new_id_only(id: &str) -> Reaction {
        let config = configuration::current();
        Reaction {
            id: id.to_string(),
            metabolites: IndexMap::new(),
            name: None,
            gene_reaction_rule: String::new(),
            lower_bound: config.lower_bound,
            upper_bound: config.upper_bound,
            objective_coefficient: None,
            subsystem: None,
            notes: Notes::default(),
            annotation: None,
        }
    }

    /// The (lower, upper) flux bounds
    pub fn bounds(&self) -> (f64, f64) {
        (self.lower_bound, self.upper_bound)
    }

    pub fn set_bounds(&mut self, lower_bound: f64, upper_bound: f64) {
        self.lower_bound = lower_bound;
        self.upper_bound = upper_bound;
    }

    /// Whether the reaction can carry flux in both directions
    pub fn reversibility(&self) -> bool {
        self.lower_bound < 0. && 0. < self.upper_bound
    }

    /// Constrain the reaction to zero flux in both directions
    pub fn knock_out(&mut self) {
        self.set_bounds(0., 0.);
    }

    /// A reaction is knocked out when both bounds are zero
    pub fn is_knocked_out(&self) -> bool {
        self.lower_bound == 0. && self.upper_bound == 0.
    }

    /// Ids of the metabolites consumed by the reaction
    pub fn reactants(&self) -> impl Iterator<Item = &str> {
        self.metabolites
            .iter()
            .filter(|(_, coef)| **coef < 0.)
            .map(|(id, _)| id.as_str())
    }

    /// Ids of the metabolites produced by the reaction
    pub fn products(&self) -> impl Iterator<Item = &str> {
        self.metabolites
            .iter()
            .filter(|(_, coef)| **coef > 0.)
            .map(|(id, _)| id.as_str())
    }

    /// Stoichiometric coefficient of a metabolite, if it takes part in the reaction
    pub fn coefficient(&self, metabolite_id: &str) -> Option<f64> {
        self.metabolites.get(metabolite_id).copied()
    }
}

impl Annotated for Reaction {
    fn notes(&self) -> &Notes {
        &self.notes
    }

    fn notes_mut(&mut self) -> &mut Notes {
        &mut self.notes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pfk() -> Reaction {
        let mut metabolites = IndexMap::new();
        metabolites.insert("atp_c".to_string(), -1.0);
        metabolites.insert("f6p_c".to_string(), -1.0);
        metabolites.insert("adp_c".to_string(), 1.0);
        metabolites.insert("fdp_c".to_string(), 1.0);
        metabolites.insert("h_c".to_string(), 1.0);
        ReactionBuilder::default()
            .id("PFK".to_string())
            .metabolites(metabolites)
            .lower_bound(0.)
            .upper_bound(1000.)
            .build()
            .unwrap()
    }

    #[test]
    fn reactants_and_products() {
        let rxn = pfk();
        assert_eq!(rxn.reactants().collect::<Vec<_>>(), vec!["atp_c", "f6p_c"]);
        assert_eq!(
            rxn.products().collect::<Vec<_>>(),
            vec!["adp_c", "fdp_c", "h_c"]
        );
        assert_eq!(rxn.coefficient("atp_c"), Some(-1.0));
        assert_eq!(rxn.coefficient("glc__D_e"), None);
    }

    #[test]
    fn reversibility() {
        let mut rxn = pfk();
        assert!(!rxn.reversibility());
        rxn.set_bounds(-1000., 1000.);
        assert!(rxn.reversibility());
        rxn.set_bounds(-1000., 0.);
        assert!(!rxn.reversibility());
    }

    #[test]
    fn knock_out() {
        let mut rxn = pfk();
        assert!(!rxn.is_knocked_out());
        rxn.knock_out();
        assert!(rxn.is_knocked_out());
        assert_eq!(rxn.bounds(), (0., 0.));
    }

    #[test]
    fn builder_defaults() {
        let rxn = ReactionBuilder::default()
            .id("R1".to_string())
            .build()
            .unwrap();
        assert_eq!(rxn.bounds(), (-1000., 1000.));
        assert!(rxn.metabolites.is_empty());
        assert!(rxn.notes.is_empty());
    }
}
