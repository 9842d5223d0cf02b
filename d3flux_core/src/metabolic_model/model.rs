//! This module provides the Model struct for representing an entire metabolic model
use crate::metabolic_model::gene::Gene;
use crate::metabolic_model::map_info::{Annotated, Notes};
use crate::metabolic_model::metabolite::Metabolite;
use crate::metabolic_model::reaction::Reaction;
use crate::optimize::{FluxError, Solution};

use indexmap::{IndexMap, IndexSet};
use serde_json::Value;

/// Represents a Genome Scale Metabolic Model
#[derive(Clone, Debug, PartialEq)]
pub struct Model {
    /// Map of reaction ids to Reaction Objects
    pub reactions: IndexMap<String, Reaction>,
    /// Map of gene ids to Gene Objects
    pub genes: IndexMap<String, Gene>,
    /// Map of metabolite ids to Metabolite Objects
    pub metabolites: IndexMap<String, Metabolite>,
    /// Id associated with the Model
    pub id: Option<String>,
    /// Human readable name of the Model
    pub name: Option<String>,
    /// Compartments in the model
    ///
    /// An IndexMap<String, String> of {short name: long name}
    pub compartments: Option<IndexMap<String, String>>,
    /// A version identifier for the Model, stored as a string
    pub version: Option<String>,
    /// Notes about the model, its `map_info` can hold render options
    pub notes: Notes,
    /// Model annotations
    pub annotation: Option<Value>,
    /// Solved state of the model, if it has been optimized
    pub solution: Option<Solution>,
}

impl Model {
    pub fn new_empty() -> Self {
        Model {
            reactions: IndexMap::new(),
            genes: IndexMap::new(),
            metabolites: IndexMap::new(),
            id: None,
            name: None,
            compartments: None,
            version: None,
            notes: Notes::default(),
            annotation: None,
            solution: None,
        }
    }

    /// Create an empty model with an id
    pub fn new(id: &str) -> Self {
        Model {
            id: Some(id.to_string()),
            ..Model::new_empty()
        }
    }

    /// Add a reaction to the model
    ///
    /// # Parameters
    /// - reaction: Reaction to add
    ///
    /// # Examples
    /// ```rust
    /// use d3flux_core::metabolic_model::model::Model;
    /// use d3flux_core::metabolic_model::reaction::{Reaction, ReactionBuilder};
    /// let mut model = Model::new_empty();
    /// let new_reaction = ReactionBuilder::default().id("new_reaction".to_string()).build().unwrap();
    /// model.add_reaction(new_reaction);
    /// ```
    pub fn add_reaction(&mut self, reaction: Reaction) {
        let id = reaction.id.clone();
        self.reactions.insert(id, reaction);
    }

    /// Add a metabolite to the model
    ///
    /// # Examples
    /// ```rust
    /// use d3flux_core::metabolic_model::metabolite::Metabolite;
    /// use d3flux_core::metabolic_model::model::Model;
    /// let mut model = Model::new_empty();
    /// model.add_metabolite(Metabolite::new_id_only("atp_c"));
    /// assert!(model.metabolites.contains_key("atp_c"));
    /// ```
    pub fn add_metabolite(&mut self, metabolite: Metabolite) {
        let id = metabolite.id.clone();
        self.metabolites.insert(id, metabolite);
    }

    /// Add a gene to the model
    pub fn add_gene(&mut self, gene: Gene) {
        let id = gene.id.clone();
        self.genes.insert(id, gene);
    }

    /// Set of the compartments the metabolites of the model are in, in order of appearance
    pub fn metabolite_compartments(&self) -> IndexSet<&str> {
        self.metabolites
            .values()
            .filter_map(|met| met.compartment.as_deref())
            .collect()
    }

    /// Reactions a metabolite takes part in
    pub fn metabolite_reactions<'a>(
        &'a self,
        metabolite_id: &'a str,
    ) -> impl Iterator<Item = &'a Reaction> + 'a {
        self.reactions
            .values()
            .filter(move |rxn| rxn.metabolites.contains_key(metabolite_id))
    }

    /// Store the solved state of the model
    pub fn set_solution(&mut self, solution: Solution) {
        self.solution = Some(solution);
    }

    /// Flux through a reaction in the solved state of the model
    pub fn flux(&self, reaction_id: &str) -> Result<f64, FluxError> {
        match self.solution {
            Some(ref solution) => solution.flux(reaction_id),
            None => Err(FluxError::Unsolved),
        }
    }

    /// Whether a metabolite is hidden, unknown metabolites are not
    pub fn is_metabolite_hidden(&self, metabolite_id: &str) -> bool {
        self.metabolites
            .get(metabolite_id)
            .is_some_and(|met| met.is_hidden())
    }
}

impl Annotated for Model {
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
    use crate::metabolic_model::metabolite::MetaboliteBuilder;
    use crate::metabolic_model::reaction::ReactionBuilder;

    fn setup_model() -> Model {
        let mut model = Model::new("test");
        for (id, compartment) in [("atp_c", "c"), ("adp_c", "c"), ("glc__D_e", "e")] {
            model.add_metabolite(
                MetaboliteBuilder::default()
                    .id(id.to_string())
                    .compartment(Some(compartment.to_string()))
                    .build()
                    .unwrap(),
            );
        }
        model.add_metabolite(Metabolite::new_id_only("orphan"));
        let mut metabolites = IndexMap::new();
        metabolites.insert("atp_c".to_string(), -1.0);
        metabolites.insert("adp_c".to_string(), 1.0);
        model.add_reaction(
            ReactionBuilder::default()
                .id("ATPM".to_string())
                .metabolites(metabolites)
                .build()
                .unwrap(),
        );
        model
    }

    #[test]
    fn compartments() {
        let model = setup_model();
        assert_eq!(
            model.metabolite_compartments().into_iter().collect::<Vec<_>>(),
            vec!["c", "e"]
        );
    }

    #[test]
    fn metabolite_reactions() {
        let model = setup_model();
        let ids: Vec<&str> = model
            .metabolite_reactions("atp_c")
            .map(|r| r.id.as_str())
            .collect();
        assert_eq!(ids, vec!["ATPM"]);
        assert_eq!(model.metabolite_reactions("glc__D_e").count(), 0);
    }

    #[test]
    fn unsolved_flux() {
        let mut model = setup_model();
        assert_eq!(model.flux("ATPM"), Err(FluxError::Unsolved));
        let mut fluxes = IndexMap::new();
        fluxes.insert("ATPM".to_string(), 8.39);
        model.set_solution(Solution::optimal(fluxes));
        assert_eq!(model.flux("ATPM"), Ok(8.39));
    }

    #[test]
    fn hidden_lookup() {
        let mut model = setup_model();
        assert!(!model.is_metabolite_hidden("atp_c"));
        assert!(!model.is_metabolite_hidden("not_a_metabolite"));
        model.metabolites["atp_c"].map_info_mut().hidden = Some(true);
        assert!(model.is_metabolite_hidden("atp_c"));
    }
}
