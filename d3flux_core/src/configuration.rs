use std::sync::{LazyLock, RwLock};

pub static CONFIGURATION: LazyLock<RwLock<Configuration>> =
    LazyLock::new(|| RwLock::new(Configuration::default()));

/// Process wide defaults used when building reactions and rendering flux maps
#[derive(Clone, Debug)]
pub struct Configuration {
    /// Lower bound given to reversible reactions built from strings
    pub lower_bound: f64,
    /// Upper bound given to reactions built from strings
    pub upper_bound: f64,
    /// Fluxes with a magnitude below this are treated as exactly zero
    pub tolerance: f64,
    /// Default (width, height) of the SVG canvas in pixels
    pub figsize: (u32, u32),
    /// Default label size, in pt
    pub fontsize: f64,
    /// Arrow thickness used when a reaction has no flux
    pub default_flux_width: f64,
    /// Scale of the rendered SVG, in percent
    pub svg_scale: u32,
    /// Alpha used for reactions and nodes not carrying any flux
    pub inactive_alpha: f64,
}

impl Default for Configuration {
    fn default() -> Self {
        Configuration {
            lower_bound: -1000.,
            upper_bound: 1000.,
            tolerance: 1e-08,
            figsize: (1028, 768),
            fontsize: 12.,
            default_flux_width: 2.5,
            svg_scale: 100,
            inactive_alpha: 1.,
        }
    }
}

/// Get a copy of the current configuration
///
/// A poisoned lock still holds usable defaults, so its contents are returned as is.
pub fn current() -> Configuration {
    match CONFIGURATION.read() {
        Ok(config) => config.clone(),
        Err(poisoned) => poisoned.into_inner().clone(),
    }
}
