//! Assign reaction fluxes and metabolite carried fluxes to the `map_info` of a model
//!
//! Fluxes come either from a caller supplied map of reaction id to flux, or from the solved
//! state of the model. Reactions whose flux can't be determined simply get no `flux` key,
//! which the rendered figure draws with the default line width.
use indexmap::IndexMap;
use tracing::{debug, info};

use crate::configuration;
use crate::metabolic_model::map_info::{Annotated, Group};
use crate::metabolic_model::model::Model;
use crate::optimize::FluxError;

/// Map of ids to flux values, `None` entries mean "no flux available"
pub type FluxMap = IndexMap<String, Option<f64>>;

/// Signed flux through each drawn reaction, computed by [`apply_fluxes`]
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FluxSummary {
    /// Flux for each reaction that was assigned one, in model order
    pub reactions: IndexMap<String, f64>,
    /// Carried flux for each metabolite that was assigned one
    pub metabolites: IndexMap<String, f64>,
}

impl FluxSummary {
    pub fn reaction_flux(&self, reaction_id: &str) -> Option<f64> {
        self.reactions.get(reaction_id).copied()
    }

    pub fn metabolite_flux(&self, metabolite_id: &str) -> Option<f64> {
        self.metabolites.get(metabolite_id).copied()
    }
}

/// Look up the flux of a reaction, preferring `flux_dict` over the model's solution
pub fn resolve_flux(
    model: &Model,
    flux_dict: Option<&FluxMap>,
    reaction_id: &str,
) -> Result<f64, FluxError> {
    match flux_dict {
        Some(fluxes) => lookup(fluxes, reaction_id),
        None => model.flux(reaction_id),
    }
}

fn lookup(fluxes: &FluxMap, id: &str) -> Result<f64, FluxError> {
    match fluxes.get(id) {
        Some(Some(flux)) if flux.is_finite() => Ok(*flux),
        Some(Some(_)) => Err(FluxError::NonFinite(id.to_string())),
        Some(None) | None => Err(FluxError::MissingReaction(id.to_string())),
    }
}

/// Write fluxes into the `map_info` of every reaction and metabolite
///
/// - Knocked out reactions (both bounds zero) are put in the `ko` group and lose their flux.
/// - Other reactions get their resolved flux, with values below the configured tolerance
///   set to exactly zero. A leftover `ko` group is removed.
/// - Metabolites get the flux they carry, either from `metabolite_dict` or as half the sum
///   of the absolute stoichiometry weighted fluxes of their reactions.
///
/// Lookup failures are not errors, the affected `flux` key is just left out.
pub fn apply_fluxes(
    model: &mut Model,
    flux_dict: Option<&FluxMap>,
    metabolite_dict: Option<&FluxMap>,
) -> FluxSummary {
    let tolerance = configuration::current().tolerance;
    let mut summary = FluxSummary::default();

    let resolved: IndexMap<String, Result<f64, FluxError>> = model
        .reactions
        .keys()
        .map(|id| (id.clone(), resolve_flux(model, flux_dict, id)))
        .collect();

    for reaction in model.reactions.values_mut() {
        let knocked_out = reaction.is_knocked_out();
        let id = reaction.id.clone();
        let map_info = reaction.map_info_mut();
        if knocked_out {
            map_info.group = Some(Group::knockout());
            map_info.flux = None;
            continue;
        }
        match &resolved[&id] {
            Ok(flux) => {
                let flux = if flux.abs() < tolerance { 0. } else { *flux };
                map_info.flux = Some(flux);
                summary.reactions.insert(id, flux);
            }
            Err(err) => {
                debug!(reaction = %id, "no flux assigned: {}", err);
                map_info.flux = None;
            }
        }
        if map_info.group.as_ref().is_some_and(Group::is_knockout) {
            map_info.group = None;
        }
    }

    let carried: IndexMap<String, Result<f64, FluxError>> = model
        .metabolites
        .keys()
        .map(|id| {
            let flux = match metabolite_dict {
                Some(fluxes) => lookup(fluxes, id),
                None => carried_flux(model, &resolved, id),
            };
            (id.clone(), flux)
        })
        .collect();

    for metabolite in model.metabolites.values_mut() {
        let id = metabolite.id.clone();
        let map_info = metabolite.map_info_mut();
        map_info.flux = None;
        match &carried[&id] {
            Ok(flux) => {
                let flux = if *flux > tolerance { *flux } else { 0. };
                map_info.flux = Some(flux);
                summary.metabolites.insert(id, flux);
            }
            Err(err) => debug!(metabolite = %id, "no carried flux assigned: {}", err),
        }
    }

    info!(
        reactions = summary.reactions.len(),
        metabolites = summary.metabolites.len(),
        "assigned fluxes"
    );
    summary
}

/// Half the total absolute flux through a metabolite, fails if any incident reaction has
/// no flux
fn carried_flux(
    model: &Model,
    resolved: &IndexMap<String, Result<f64, FluxError>>,
    metabolite_id: &str,
) -> Result<f64, FluxError> {
    let mut total = 0.;
    for reaction in model.metabolite_reactions(metabolite_id) {
        let flux = match resolved.get(&reaction.id) {
            Some(Ok(flux)) => *flux,
            Some(Err(err)) => return Err(err.clone()),
            None => return Err(FluxError::MissingReaction(reaction.id.clone())),
        };
        let coefficient = reaction.coefficient(metabolite_id).unwrap_or(0.);
        total += (flux * coefficient).abs();
    }
    Ok(total / 2.)
}
