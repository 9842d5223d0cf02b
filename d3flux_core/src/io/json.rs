//! Module providing JSON IO for d3flux Models
//!
//! The layout follows the COBRA JSON model format, so models exported by other COBRA
//! tools can be read, annotated, and written back.
use std::fs;
use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::metabolic_model::gene::Gene;
use crate::metabolic_model::map_info::Notes;
use crate::metabolic_model::metabolite::Metabolite;
use crate::metabolic_model::model::Model;
use crate::metabolic_model::reaction::Reaction;

// region JSON Model
/// Represents a JSON serialized model, used for reading and writing models in json format
#[derive(Serialize, Deserialize)]
struct JsonModel {
    metabolites: Vec<JsonMetabolite>,
    reactions: Vec<JsonReaction>,
    #[serde(default)]
    genes: Vec<JsonGene>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    compartments: Option<IndexMap<String, String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    version: Option<String>,
    #[serde(default, skip_serializing_if = "Notes::is_empty")]
    notes: Notes,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    annotation: Option<Value>,
}

#[derive(Serialize, Deserialize)]
struct JsonMetabolite {
    id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    compartment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    charge: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    formula: Option<String>,
    #[serde(default, skip_serializing_if = "Notes::is_empty")]
    notes: Notes,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    annotation: Option<Value>,
}

#[derive(Serialize, Deserialize)]
struct JsonReaction {
    id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    metabolites: IndexMap<String, f64>,
    lower_bound: f64,
    upper_bound: f64,
    #[serde(default)]
    gene_reaction_rule: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    objective_coefficient: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    subsystem: Option<String>,
    #[serde(default, skip_serializing_if = "Notes::is_empty")]
    notes: Notes,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    annotation: Option<Value>,
}

#[derive(Serialize, Deserialize)]
struct JsonGene {
    id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(default, skip_serializing_if = "Notes::is_empty")]
    notes: Notes,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    annotation: Option<Value>,
}
// endregion JSON Model

// region Conversions
impl From<JsonGene> for Gene {
    fn from(g: JsonGene) -> Self {
        Self {
            id: g.id,
            name: g.name,
            notes: g.notes,
            annotation: g.annotation,
        }
    }
}

impl From<JsonMetabolite> for Metabolite {
    fn from(m: JsonMetabolite) -> Self {
        Self {
            id: m.id,
            name: m.name,
            compartment: m.compartment,
            charge: m.charge,
            formula: m.formula,
            notes: m.notes,
            annotation: m.annotation,
        }
    }
}

impl From<JsonReaction> for Reaction {
    fn from(r: JsonReaction) -> Self {
        Self {
            id: r.id,
            metabolites: r.metabolites,
            name: r.name,
            gene_reaction_rule: r.gene_reaction_rule,
            lower_bound: r.lower_bound,
            upper_bound: r.upper_bound,
            objective_coefficient: r.objective_coefficient,
            subsystem: r.subsystem,
            notes: r.notes,
            annotation: r.annotation,
        }
    }
}

impl From<&Gene> for JsonGene {
    fn from(g: &Gene) -> Self {
        Self {
            id: g.id.clone(),
            name: g.name.clone(),
            notes: g.notes.clone(),
            annotation: g.annotation.clone(),
        }
    }
}

impl From<&Metabolite> for JsonMetabolite {
    fn from(m: &Metabolite) -> Self {
        Self {
            id: m.id.clone(),
            name: m.name.clone(),
            compartment: m.compartment.clone(),
            charge: m.charge,
            formula: m.formula.clone(),
            notes: m.notes.clone(),
            annotation: m.annotation.clone(),
        }
    }
}

impl TryFrom<&Reaction> for JsonReaction {
    type Error = JsonError;

    fn try_from(r: &Reaction) -> Result<Self, Self::Error> {
        // JSON has no representation for NaN or infinity
        if !r.lower_bound.is_finite() || !r.upper_bound.is_finite() {
            return Err(JsonError::NonFiniteValue(format!("bounds of {}", r.id)));
        }
        if let Some((met, _)) = r.metabolites.iter().find(|(_, coef)| !coef.is_finite()) {
            return Err(JsonError::NonFiniteValue(format!(
                "coefficient of {} in {}",
                met, r.id
            )));
        }
        Ok(Self {
            id: r.id.clone(),
            name: r.name.clone(),
            metabolites: r.metabolites.clone(),
            lower_bound: r.lower_bound,
            upper_bound: r.upper_bound,
            gene_reaction_rule: r.gene_reaction_rule.clone(),
            objective_coefficient: r.objective_coefficient.filter(|coef| *coef != 0.),
            subsystem: r.subsystem.clone(),
            notes: r.notes.clone(),
            annotation: r.annotation.clone(),
        })
    }
}

impl Model {
    pub fn read_json<P: AsRef<Path>>(path: P) -> Result<Model, JsonError> {
        let model_str = match fs::read_to_string(path) {
            Ok(data) => data,
            Err(err) => return Err(JsonError::UnableToRead(format!("{:?}", err))),
        };
        Model::from_json_str(&model_str)
    }

    /// Parse a model from a JSON string
    pub fn from_json_str(model_str: &str) -> Result<Model, JsonError> {
        let json_model = match serde_json::from_str::<JsonModel>(model_str) {
            Ok(model) => model,
            Err(err) => return Err(JsonError::UnableToParse(format!("{}", err))),
        };
        Ok(Model::from_json(json_model))
    }

    pub fn write_json<P: AsRef<Path>>(&self, path: P) -> Result<(), JsonError> {
        let model_string = self.to_json_string()?;
        fs::write(path, model_string)?;
        Ok(())
    }

    /// Serialize the model, including all notes and annotations, to a JSON string
    pub fn to_json_string(&self) -> Result<String, JsonError> {
        let json_model = self.to_json()?;
        Ok(serde_json::to_string(&json_model)?)
    }

    fn from_json(json_model: JsonModel) -> Self {
        let mut reactions: IndexMap<String, Reaction> = IndexMap::new();
        let mut genes: IndexMap<String, Gene> = IndexMap::new();
        let mut metabolites: IndexMap<String, Metabolite> = IndexMap::new();
        json_model.genes.into_iter().for_each(|g| {
            genes.insert(g.id.clone(), Gene::from(g));
        });
        json_model.metabolites.into_iter().for_each(|m| {
            metabolites.insert(m.id.clone(), Metabolite::from(m));
        });
        json_model.reactions.into_iter().for_each(|r| {
            reactions.insert(r.id.clone(), Reaction::from(r));
        });
        Model {
            reactions,
            genes,
            metabolites,
            id: json_model.id,
            name: json_model.name,
            compartments: json_model.compartments,
            version: json_model.version,
            notes: json_model.notes,
            annotation: json_model.annotation,
            solution: None,
        }
    }

    fn to_json(&self) -> Result<JsonModel, JsonError> {
        let json_genes: Vec<JsonGene> = self.genes.values().map(JsonGene::from).collect();
        let json_metabolites: Vec<JsonMetabolite> =
            self.metabolites.values().map(JsonMetabolite::from).collect();
        let json_reactions = self
            .reactions
            .values()
            .map(JsonReaction::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(JsonModel {
            metabolites: json_metabolites,
            reactions: json_reactions,
            genes: json_genes,
            id: self.id.clone(),
            name: self.name.clone(),
            compartments: self.compartments.clone(),
            version: self.version.clone(),
            notes: self.notes.clone(),
            annotation: self.annotation.clone(),
        })
    }
}
// endregion Conversions

/// Read a map of ids to flux values, e.g. `{"PFK": 7.48, "PGI": null}`
///
/// `null` entries are kept, and are treated as "no flux" when drawing.
pub fn read_flux_map<P: AsRef<Path>>(path: P) -> Result<IndexMap<String, Option<f64>>, JsonError> {
    let data = match fs::read_to_string(path) {
        Ok(data) => data,
        Err(err) => return Err(JsonError::UnableToRead(format!("{:?}", err))),
    };
    match serde_json::from_str(&data) {
        Ok(fluxes) => Ok(fluxes),
        Err(err) => Err(JsonError::UnableToParse(format!("{}", err))),
    }
}

#[derive(Error, Debug)]
pub enum JsonError {
    #[error("Unable to read file due to {0}")]
    UnableToRead(String),
    #[error("Unable to parse json due to {0}")]
    UnableToParse(String),
    #[error("Non finite value can't be written to json: {0}")]
    NonFiniteValue(String),
    #[error("Serde json parse error")]
    SerdeJsonParseError(#[from] serde_json::Error),
    #[error("Unable to write to file")]
    UnableToWrite(#[from] std::io::Error),
}

#[cfg(test)]
mod json_tests {
    use crate::io::json::{JsonMetabolite, JsonModel, JsonReaction};
    use std::collections::HashMap;
    use std::fs::read_to_string;
    use std::path::PathBuf;

    #[test]
    fn json_metabolite() {
        let data = r#"{
"id":"glc__D_e",
"name":"D-Glucose",
"compartment":"e",
"charge":0,
"formula":"C6H12O6",
"notes":{
"original_bigg_ids":[
"glc_D_e"
],
"map_info":{
"display_name":"Glucose",
"x":120.5,
"y":40.0
}
},
"annotation":{
"bigg.metabolite":[
"glc__D"
],
"kegg.compound":[
"C00031"
],
"sbo":"SBO:0000247"
}
}"#;
        let met: JsonMetabolite = serde_json::from_str(data).unwrap();
        assert_eq!(met.id, "glc__D_e");
        assert_eq!(met.name.unwrap(), "D-Glucose");
        assert_eq!(met.compartment.unwrap(), "e");
        assert_eq!(met.charge.unwrap(), 0);
        assert_eq!(met.formula.unwrap(), "C6H12O6");
        let map_info = met.notes.map_info.unwrap();
        assert_eq!(map_info.display_name.unwrap(), "Glucose");
        assert_eq!(map_info.x, Some(120.5));
        assert!(met.notes.other.contains_key("original_bigg_ids"));
    }

    #[test]
    fn json_reaction() {
        let data = r#"{
"id":"PFK",
"name":"Phosphofructokinase",
"metabolites":{
"adp_c":1.0,
"atp_c":-1.0,
"f6p_c":-1.0,
"fdp_c":1.0,
"h_c":1.0
},
"lower_bound":0.0,
"upper_bound":1000.0,
"gene_reaction_rule":"b3916 or b1723",
"subsystem":"Glycolysis/Gluconeogenesis",
"notes":{
"map_info":{
"cofactors":{"atp_c":{},"adp_c":{},"h_c":{}},
"group":"ko"
}
}
}"#;
        let reaction: JsonReaction = serde_json::from_str(data).unwrap();
        assert_eq!(reaction.id, "PFK");
        assert_eq!(reaction.name.unwrap(), "Phosphofructokinase");
        let mut expected_reactions: HashMap<String, f64> = HashMap::new();
        expected_reactions.insert("adp_c".to_string(), 1.0);
        expected_reactions.insert("atp_c".to_string(), -1.0);
        expected_reactions.insert("f6p_c".to_string(), -1.0);
        expected_reactions.insert("fdp_c".to_string(), 1.0);
        expected_reactions.insert("h_c".to_string(), 1.0);
        for (k, v) in reaction.metabolites {
            assert!((v - expected_reactions.get(&k).unwrap()).abs() < 1e-25);
        }
        assert!((reaction.lower_bound - 0.0).abs() < 1e-25);
        assert!((reaction.upper_bound - 1000.0).abs() < 1e-25);
        assert_eq!(reaction.gene_reaction_rule, "b3916 or b1723");
        assert_eq!(reaction.subsystem.unwrap(), "Glycolysis/Gluconeogenesis");
        let map_info = reaction.notes.map_info.unwrap();
        assert!(map_info.group.as_ref().unwrap().is_knockout());
        assert!(map_info.has_cofactor("atp_c"));
        assert!(!map_info.has_cofactor("f6p_c"));
    }

    #[test]
    fn json_model() {
        let data_path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("test_data")
            .join("test_models")
            .join("simple_model.json");
        let simple_model = read_to_string(data_path).unwrap();
        let model: JsonModel = serde_json::from_str(&simple_model).unwrap();
        let met = model.metabolites.first().unwrap();
        let reaction = model.reactions.first().unwrap();

        assert_eq!(met.id, "A");
        assert_eq!(reaction.id, "R1");
        assert_eq!(model.reactions.len(), 10);
        assert_eq!(model.metabolites.len(), 6);
        assert!(model.genes.is_empty());
    }
}
