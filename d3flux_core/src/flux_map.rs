//! Annotate a model for drawing and render it as a flux map
//!
//! [`flux_map`] runs every step in order: it makes sure each object has a `map_info`,
//! hides excluded metabolites and reactions (and the reactions left dangling by them),
//! fills in display names, and renders the figure with the options stored in the model's
//! own `map_info` merged under the caller's options.
use std::fmt::{Debug, Formatter};
use std::sync::{Arc, LazyLock};

use derive_builder::Builder;
use indexmap::IndexSet;
use regex::Regex;
use tracing::{debug, info};

use crate::metabolic_model::map_info::Annotated;
use crate::metabolic_model::metabolite::Metabolite;
use crate::metabolic_model::model::Model;
use crate::render::{render_model, FluxMapHtml, RenderError, RenderOptions};

/// How metabolite labels are generated
#[derive(Clone, Default)]
pub enum DisplayNameFormat {
    /// Strip the compartment suffix and upper case the id (see [`default_display_name`])
    #[default]
    Default,
    /// Leave display names alone, the figure falls back on metabolite names
    Disabled,
    /// Use a custom formatter
    Custom(Arc<dyn Fn(&Metabolite) -> String + Send + Sync>),
}

impl DisplayNameFormat {
    pub fn custom<F>(formatter: F) -> Self
    where
        F: Fn(&Metabolite) -> String + Send + Sync + 'static,
    {
        DisplayNameFormat::Custom(Arc::new(formatter))
    }

    fn format(&self, metabolite: &Metabolite) -> Option<String> {
        match self {
            DisplayNameFormat::Default => Some(default_display_name(&metabolite.id)),
            DisplayNameFormat::Disabled => None,
            DisplayNameFormat::Custom(formatter) => Some(formatter(metabolite)),
        }
    }
}

impl Debug for DisplayNameFormat {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            DisplayNameFormat::Default => write!(f, "Default"),
            DisplayNameFormat::Disabled => write!(f, "Disabled"),
            DisplayNameFormat::Custom(_) => write!(f, "Custom(..)"),
        }
    }
}

/// Options for [`flux_map`]
#[derive(Builder, Clone, Debug)]
#[builder(default)]
pub struct FluxMapOptions {
    /// Metabolites to hide, either full ids or ids without the compartment suffix
    /// (`atp` hides `atp_c`, `atp_e`, ...)
    pub excluded_metabolites: Vec<String>,
    /// Reactions to hide
    pub excluded_reactions: Vec<String>,
    /// Compartments whose metabolites are hidden
    pub excluded_compartments: Vec<String>,
    /// How metabolite labels are generated
    pub display_name_format: DisplayNameFormat,
    /// Overwrite the `reversibility` key of each reaction with its actual reversibility
    pub overwrite_reversibility: bool,
    /// Options passed on to [`render_model`]
    pub render: RenderOptions,
}

impl Default for FluxMapOptions {
    fn default() -> Self {
        FluxMapOptions {
            excluded_metabolites: Vec::new(),
            excluded_reactions: Vec::new(),
            excluded_compartments: Vec::new(),
            display_name_format: DisplayNameFormat::Default,
            overwrite_reversibility: true,
            render: RenderOptions::default(),
        }
    }
}

/// Annotate `model` and render it as a flux map
///
/// # Examples
/// ```rust
/// use d3flux_core::flux_map::{flux_map, FluxMapOptionsBuilder};
/// use d3flux_core::metabolic_model::model::Model;
/// use d3flux_core::render::RenderOptionsBuilder;
///
/// let mut model = Model::new("example");
/// model.build_reaction_from_string("R1", "A --> B").unwrap();
/// let options = FluxMapOptionsBuilder::default()
///     .render(RenderOptionsBuilder::default().figure_id("example").build().unwrap())
///     .build()
///     .unwrap();
/// let html = flux_map(&mut model, options).unwrap();
/// assert!(html.as_str().contains(r#"id="example""#));
/// ```
pub fn flux_map(model: &mut Model, options: FluxMapOptions) -> Result<FluxMapHtml, RenderError> {
    annotate(model, &options);
    let render_options = options.render.merge(RenderOptions::from_model(model));
    render_model(model, render_options)
}

/// Run the annotation steps of [`flux_map`] without rendering
pub fn annotate(model: &mut Model, options: &FluxMapOptions) {
    initialize_map_info(model);
    apply_exclusions(
        model,
        &options.excluded_metabolites,
        &options.excluded_reactions,
        &options.excluded_compartments,
    );
    if options.overwrite_reversibility {
        update_reversibility(model);
    }
    hide_dangling_reactions(model);
    apply_display_names(model, &options.display_name_format);
}

/// Give the model, every metabolite, and every reaction an empty `map_info` if they lack one
pub fn initialize_map_info(model: &mut Model) {
    model.map_info_mut();
    for metabolite in model.metabolites.values_mut() {
        metabolite.map_info_mut();
    }
    for reaction in model.reactions.values_mut() {
        reaction.map_info_mut();
    }
}

/// Mark excluded metabolites and reactions as hidden
///
/// Each excluded metabolite id is also tried with every compartment suffix of the model.
/// Ids that don't match anything are ignored.
pub fn apply_exclusions<S: AsRef<str>>(
    model: &mut Model,
    excluded_metabolites: &[S],
    excluded_reactions: &[S],
    excluded_compartments: &[S],
) {
    let compartments: Vec<String> = model
        .metabolite_compartments()
        .into_iter()
        .map(str::to_string)
        .collect();

    let mut hidden_metabolites: IndexSet<String> = IndexSet::new();
    for base in excluded_metabolites.iter().map(AsRef::as_ref) {
        let candidates = compartments
            .iter()
            .map(|compartment| format!("{}_{}", base, compartment))
            .chain(std::iter::once(base.to_string()));
        for candidate in candidates {
            if model.metabolites.contains_key(&candidate) {
                hidden_metabolites.insert(candidate);
            } else {
                debug!(metabolite = %candidate, "excluded metabolite not in model");
            }
        }
    }

    let excluded_compartments: Vec<&str> =
        excluded_compartments.iter().map(AsRef::as_ref).collect();
    for metabolite in model.metabolites.values() {
        if let Some(ref compartment) = metabolite.compartment {
            if excluded_compartments.contains(&compartment.as_str()) {
                hidden_metabolites.insert(metabolite.id.clone());
            }
        }
    }

    for id in &hidden_metabolites {
        if let Some(metabolite) = model.metabolites.get_mut(id) {
            metabolite.map_info_mut().hidden = Some(true);
        }
    }

    let mut hidden_reactions = 0;
    for id in excluded_reactions.iter().map(AsRef::as_ref) {
        match model.reactions.get_mut(id) {
            Some(reaction) => {
                reaction.map_info_mut().hidden = Some(true);
                hidden_reactions += 1;
            }
            None => debug!(reaction = %id, "excluded reaction not in model"),
        }
    }

    info!(
        metabolites = hidden_metabolites.len(),
        reactions = hidden_reactions,
        "applied exclusions"
    );
}

/// Store the actual reversibility of each reaction in its `map_info`
pub fn update_reversibility(model: &mut Model) {
    for reaction in model.reactions.values_mut() {
        let reversibility = reaction.reversibility();
        reaction.map_info_mut().reversibility = Some(reversibility);
    }
}

/// Hide reactions whose reactants, or whose products, are all hidden
///
/// Cofactors registered in the reaction's `map_info` are left out of the check, and a side
/// with no metabolites counts as all hidden. Reactions with an explicit `hidden` key, even
/// `false`, are left alone. Hidden reactions don't hide anything further.
pub fn hide_dangling_reactions(model: &mut Model) {
    let to_hide: Vec<String> = model
        .reactions
        .values()
        .filter(|reaction| {
            let map_info = reaction.map_info();
            if map_info.is_some_and(|info| info.hidden.is_some()) {
                return false;
            }
            let reactants: Vec<&str> = reaction.reactants().collect();
            let products: Vec<&str> = reaction.products().collect();
            let all_hidden = |mets: &[&str]| {
                mets.iter().all(|met| {
                    map_info.is_some_and(|info| info.has_cofactor(met))
                        || model.is_metabolite_hidden(met)
                })
            };
            all_hidden(&reactants) || all_hidden(&products)
        })
        .map(|reaction| reaction.id.clone())
        .collect();

    debug!(count = to_hide.len(), "hiding dangling reactions");
    for id in to_hide {
        if let Some(reaction) = model.reactions.get_mut(&id) {
            reaction.map_info_mut().hidden = Some(true);
        }
    }
}

/// Set the `display_name` of every metabolite that doesn't have one yet
pub fn apply_display_names(model: &mut Model, format: &DisplayNameFormat) {
    for metabolite in model.metabolites.values_mut() {
        if metabolite
            .map_info()
            .is_some_and(|info| info.display_name.is_some())
        {
            continue;
        }
        if let Some(name) = format.format(metabolite) {
            metabolite.map_info_mut().display_name = Some(name);
        }
    }
}

static COMPARTMENT_SUFFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(.+)_[A-Za-z0-9]$").unwrap());
static STEREO_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"__[DL]").unwrap());

/// Default label for a metabolite id in BiGG style
///
/// The two character compartment suffix (`_c`, `_e`, ...) is stripped, the rest is upper
/// cased, and `__D`/`__L` stereo markers are removed.
///
/// # Examples
/// ```rust
/// use d3flux_core::flux_map::default_display_name;
/// assert_eq!(default_display_name("glc__D_e"), "GLC");
/// assert_eq!(default_display_name("atp_c"), "ATP");
/// assert_eq!(default_display_name("A"), "A");
/// ```
pub fn default_display_name(metabolite_id: &str) -> String {
    let base = match COMPARTMENT_SUFFIX.captures(metabolite_id) {
        Some(captures) => captures[1].to_string(),
        None => metabolite_id.to_string(),
    };
    STEREO_MARKER
        .replace_all(&base.to_uppercase(), "")
        .into_owned()
}
