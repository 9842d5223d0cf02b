//! Helpers for styling a model before it is drawn: redox coloring and cofactor nodes
use derive_builder::Builder;
use indexmap::IndexMap;
use tracing::{debug, info};

use crate::configuration;
use crate::metabolic_model::map_info::{Annotated, Group, MapInfo};
use crate::metabolic_model::model::Model;

/// Oxidized cofactors used by [`redox_summary`] when none are given
pub const COMMON_OX_COFACTORS: [&str; 3] = ["nad_c", "nadp_c", "q8_c"];

/// Cofactor ids without compartment suffix, suitable as metabolite exclusions
pub const COMMON_COFACTORS: [&str; 17] = [
    "coa", "nadh", "nad", "nadph", "nadp", "atp", "adp", "amp", "q8", "q8h2", "pi", "co2", "h2o",
    "h", "o2", "h2", "nh4",
];

/// Flux of a metabolite through each of its reactions, `flux * coefficient`
///
/// Reactions without a resolvable flux are skipped, and an unknown metabolite gives an
/// empty map.
pub fn metabolite_summary(model: &Model, metabolite_id: &str) -> IndexMap<String, f64> {
    model
        .metabolite_reactions(metabolite_id)
        .filter_map(|reaction| {
            let coefficient = reaction.coefficient(metabolite_id)?;
            match model.flux(&reaction.id) {
                Ok(flux) => Some((reaction.id.clone(), flux * coefficient)),
                Err(err) => {
                    debug!(reaction = %reaction.id, "skipped in summary: {}", err);
                    None
                }
            }
        })
        .collect()
}

/// Split reactions into oxidizing and reducing ones
///
/// The metabolite summaries of the oxidized cofactors are added up per reaction. Reactions
/// producing more than `tol` of them are oxidizing, those consuming more than `tol` are
/// reducing. `None` uses [`COMMON_OX_COFACTORS`], an empty slice gives two empty maps.
pub fn redox_summary<S: AsRef<str>>(
    model: &Model,
    tol: f64,
    ox_cofactors: Option<&[S]>,
) -> (IndexMap<String, f64>, IndexMap<String, f64>) {
    let cofactors: Vec<&str> = match ox_cofactors {
        Some(cofactors) => cofactors.iter().map(AsRef::as_ref).collect(),
        None => COMMON_OX_COFACTORS.to_vec(),
    };

    let mut total: IndexMap<String, f64> = IndexMap::new();
    for cofactor in cofactors {
        if !model.metabolites.contains_key(cofactor) {
            debug!(metabolite = %cofactor, "redox cofactor not in model");
            continue;
        }
        for (reaction, flux) in metabolite_summary(model, cofactor) {
            *total.entry(reaction).or_insert(0.) += flux;
        }
    }

    let (oxidizing, rest): (IndexMap<_, _>, IndexMap<_, _>) =
        total.into_iter().partition(|(_, flux)| *flux > tol);
    let reducing = rest.into_iter().filter(|(_, flux)| *flux < -tol).collect();
    (oxidizing, reducing)
}

/// Options for [`color_redox_rxns`]
#[derive(Builder, Clone, Debug)]
#[builder(default)]
pub struct ColorRedoxOptions {
    /// Remove all existing reaction groups first
    pub reset_groups: bool,
    /// Put knocked out reactions in the `ko` group
    pub color_knockouts: bool,
    /// Group of oxidizing reactions, reducing ones get the next group (colors go up to 8)
    pub starting_group: i64,
    /// Flux below which a reaction is not colored
    pub tol: f64,
    /// Oxidized cofactors, [`COMMON_OX_COFACTORS`] if not given
    pub ox_cofactors: Option<Vec<String>>,
}

impl Default for ColorRedoxOptions {
    fn default() -> Self {
        ColorRedoxOptions {
            reset_groups: true,
            color_knockouts: true,
            starting_group: 1,
            tol: configuration::current().tolerance,
            ox_cofactors: None,
        }
    }
}

/// Assign reaction color groups from the redox balance of the solved model
pub fn color_redox_rxns(model: &mut Model, options: &ColorRedoxOptions) {
    if options.reset_groups {
        for reaction in model.reactions.values_mut() {
            reaction.map_info_mut().group = None;
        }
    }

    if options.color_knockouts {
        for reaction in model.reactions.values_mut() {
            if reaction.is_knocked_out() {
                reaction.map_info_mut().group = Some(Group::knockout());
            }
        }
    }

    let (oxidizing, reducing) =
        redox_summary(model, options.tol, options.ox_cofactors.as_deref());
    for (id, group) in oxidizing
        .keys()
        .map(|id| (id, options.starting_group))
        .chain(reducing.keys().map(|id| (id, options.starting_group + 1)))
    {
        if let Some(reaction) = model.reactions.get_mut(id) {
            reaction.map_info_mut().group = Some(Group::Index(group));
        }
    }
    info!(
        oxidizing = oxidizing.len(),
        reducing = reducing.len(),
        "colored redox reactions"
    );
}

/// Draw the listed metabolites as separate cofactor nodes on every reaction they take part in
///
/// Existing cofactor entries are left as they are, unknown metabolite ids are skipped.
pub fn update_cofactors<S: AsRef<str>>(model: &mut Model, cofactors: &[S]) {
    for cofactor in cofactors.iter().map(AsRef::as_ref) {
        if !model.metabolites.contains_key(cofactor) {
            debug!(metabolite = %cofactor, "cofactor not in model");
            continue;
        }
        for reaction in model.reactions.values_mut() {
            if !reaction.metabolites.contains_key(cofactor) {
                continue;
            }
            reaction
                .map_info_mut()
                .cofactors
                .get_or_insert_with(IndexMap::new)
                .entry(cofactor.to_string())
                .or_insert_with(MapInfo::default);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimize::Solution;

    /// Two NAD reducing steps and one NAD oxidizing step
    fn redox_model() -> Model {
        let mut model = Model::new("redox");
        for (id, rxn) in [
            ("GAPD", "g3p_c + nad_c + pi_c <=> 13dpg_c + h_c + nadh_c"),
            ("PDH", "coa_c + nad_c + pyr_c --> accoa_c + co2_c + nadh_c"),
            ("LDH", "nadh_c + pyr_c + h_c --> lac_c + nad_c"),
            ("PGK", "13dpg_c + adp_c <=> 3pg_c + atp_c"),
            ("KO", "pyr_c --> ala_c"),
        ] {
            model.build_reaction_from_string(id, rxn).unwrap();
        }
        model.reactions["KO"].knock_out();
        let mut fluxes = IndexMap::new();
        for (id, flux) in [
            ("GAPD", 2.),
            ("PDH", 1.),
            ("LDH", 1.),
            ("PGK", -2.),
            ("KO", 0.),
        ] {
            fluxes.insert(id.to_string(), flux);
        }
        model.set_solution(Solution::optimal(fluxes));
        model
    }

    #[test]
    fn summary_of_metabolite() {
        let model = redox_model();
        let summary = metabolite_summary(&model, "nad_c");
        assert_eq!(summary.keys().collect::<Vec<_>>(), vec!["GAPD", "PDH", "LDH"]);
        assert_eq!(summary["GAPD"], -2.);
        assert_eq!(summary["LDH"], 1.);
        assert!(metabolite_summary(&model, "not_there").is_empty());
    }

    #[test]
    fn summary_skips_unsolved_reactions() {
        let mut model = redox_model();
        model.solution = None;
        assert!(metabolite_summary(&model, "nad_c").is_empty());
    }

    #[test]
    fn redox_split() {
        let model = redox_model();
        let (oxidizing, reducing) = redox_summary::<String>(&model, 1e-8, None);
        assert_eq!(oxidizing.keys().collect::<Vec<_>>(), vec!["LDH"]);
        assert_eq!(reducing.keys().collect::<Vec<_>>(), vec!["GAPD", "PDH"]);
    }

    #[test]
    fn redox_split_with_cofactor_list() {
        let model = redox_model();
        let (oxidizing, reducing) = redox_summary(&model, 1e-8, Some(&["nadh_c", "missing_c"][..]));
        assert_eq!(oxidizing.keys().collect::<Vec<_>>(), vec!["GAPD", "PDH"]);
        assert_eq!(reducing.keys().collect::<Vec<_>>(), vec!["LDH"]);

        let empty: [&str; 0] = [];
        let (oxidizing, reducing) = redox_summary(&model, 1e-8, Some(&empty[..]));
        assert!(oxidizing.is_empty());
        assert!(reducing.is_empty());
    }

    #[test]
    fn color_groups() {
        let mut model = redox_model();
        model.reactions["PGK"].map_info_mut().group = Some(Group::Index(7));
        color_redox_rxns(&mut model, &ColorRedoxOptions::default());
        let group = |id: &str| model.reactions[id].map_info().unwrap().group.clone();
        assert_eq!(group("LDH"), Some(Group::Index(1)));
        assert_eq!(group("GAPD"), Some(Group::Index(2)));
        assert_eq!(group("PDH"), Some(Group::Index(2)));
        assert_eq!(group("KO"), Some(Group::knockout()));
        assert_eq!(group("PGK"), None);
    }

    #[test]
    fn color_groups_without_reset() {
        let mut model = redox_model();
        model.reactions["PGK"].map_info_mut().group = Some(Group::Index(7));
        let options = ColorRedoxOptionsBuilder::default()
            .reset_groups(false)
            .color_knockouts(false)
            .starting_group(3)
            .build()
            .unwrap();
        color_redox_rxns(&mut model, &options);
        let group = |id: &str| model.reactions[id].map_info().unwrap().group.clone();
        assert_eq!(group("PGK"), Some(Group::Index(7)));
        assert_eq!(group("LDH"), Some(Group::Index(3)));
        assert_eq!(group("GAPD"), Some(Group::Index(4)));
        assert_eq!(model.reactions["KO"].map_info(), None);
    }

    #[test]
    fn cofactors_are_added() {
        let mut model = redox_model();
        let mut existing = IndexMap::new();
        existing.insert(
            "nad_c".to_string(),
            MapInfo {
                x: Some(5.),
                ..Default::default()
            },
        );
        model.reactions["LDH"].map_info_mut().cofactors = Some(existing);
        update_cofactors(&mut model, &["nad_c", "nadh_c", "not_a_metabolite"]);

        let cofactors = |id: &str| {
            model.reactions[id]
                .map_info()
                .map(|info| info.cofactor_ids().map(str::to_string).collect::<Vec<_>>())
                .unwrap_or_default()
        };
        assert_eq!(cofactors("GAPD"), vec!["nad_c", "nadh_c"]);
        assert_eq!(cofactors("LDH"), vec!["nad_c", "nadh_c"]);
        assert!(cofactors("PGK").is_empty());
        assert_eq!(
            model.reactions["LDH"].map_info().unwrap().cofactors.as_ref().unwrap()["nad_c"].x,
            Some(5.)
        );
    }

    #[test]
    fn common_cofactor_list() {
        assert!(COMMON_COFACTORS.contains(&"nadh"));
        assert!(COMMON_OX_COFACTORS.iter().all(|id| id.ends_with("_c")));
    }
}
