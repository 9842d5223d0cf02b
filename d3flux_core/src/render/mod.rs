//! Render an annotated model into an HTML fragment holding a d3 flux diagram
//!
//! The fragment is made from three embedded templates: a stylesheet, the figure script
//! (which carries the whole model as JSON), and an HTML shell with the canvas and the
//! figure buttons. The script expects require.js and jQuery on the page, see
//! [`FluxMapHtml::standalone_page`].
pub mod css;

use std::fmt::{Display, Formatter};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::LazyLock;

use derive_builder::Builder;
use minijinja::{context, AutoEscape, Environment};
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::configuration;
use crate::flux::{apply_fluxes, FluxMap};
use crate::io::json::JsonError;
use crate::metabolic_model::map_info::{Annotated, MapInfo};
use crate::metabolic_model::model::Model;
use css::compress_css;

const STYLE_TEMPLATE: &str = "network_style.css";
const SCRIPT_TEMPLATE: &str = "d3flux.js";
const HTML_TEMPLATE: &str = "output_template.html";

/// Number of figures rendered without an explicit id
static FIGURE_COUNTER: AtomicU32 = AtomicU32::new(0);

static FIGURE_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_$][A-Za-z0-9_$]*$").unwrap());

/// Options for [`render_model`]
///
/// Every option is optional. Missing options are taken from the model's own `map_info`
/// when going through [`crate::flux_map::flux_map`], and then from the
/// [configuration](crate::configuration::Configuration).
#[derive(Builder, Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[builder(default, setter(strip_option))]
#[serde(default)]
pub struct RenderOptions {
    /// SVG file drawn behind the figure
    #[builder(setter(into, strip_option))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background_template: Option<PathBuf>,
    /// Extra CSS appended to the figure stylesheet
    #[builder(setter(into, strip_option))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_css: Option<String>,
    /// Id of the figure element, must be a valid JavaScript identifier
    #[builder(setter(into, strip_option))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub figure_id: Option<String>,
    /// Don't draw metabolites and reactions without flux
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hide_unused: Option<bool>,
    /// Don't draw cofactor nodes of reactions without flux
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hide_unused_cofactors: Option<bool>,
    /// Opacity of reactions and metabolites without flux
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inactive_alpha: Option<f64>,
    /// (width, height) of the canvas, in pixels
    #[serde(skip_serializing_if = "Option::is_none")]
    pub figsize: Option<(u32, u32)>,
    /// Label size, in pt
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fontsize: Option<f64>,
    /// Arrow thickness for reactions without flux
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_flux_width: Option<f64>,
    /// Scale of the background SVG, in percent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub svg_scale: Option<u32>,
    /// Reaction fluxes to draw instead of the model's solution
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flux_dict: Option<FluxMap>,
    /// Carried metabolite fluxes to draw instead of the computed ones
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metabolite_dict: Option<FluxMap>,
}

impl RenderOptions {
    /// Fill the options missing here from `fallback`
    pub fn merge(self, fallback: RenderOptions) -> RenderOptions {
        RenderOptions {
            background_template: self.background_template.or(fallback.background_template),
            custom_css: self.custom_css.or(fallback.custom_css),
            figure_id: self.figure_id.or(fallback.figure_id),
            hide_unused: self.hide_unused.or(fallback.hide_unused),
            hide_unused_cofactors: self.hide_unused_cofactors.or(fallback.hide_unused_cofactors),
            inactive_alpha: self.inactive_alpha.or(fallback.inactive_alpha),
            figsize: self.figsize.or(fallback.figsize),
            fontsize: self.fontsize.or(fallback.fontsize),
            default_flux_width: self.default_flux_width.or(fallback.default_flux_width),
            svg_scale: self.svg_scale.or(fallback.svg_scale),
            flux_dict: self.flux_dict.or(fallback.flux_dict),
            metabolite_dict: self.metabolite_dict.or(fallback.metabolite_dict),
        }
    }

    /// Options stored in the model level `map_info`
    pub fn from_model(model: &Model) -> RenderOptions {
        model
            .map_info()
            .map(RenderOptions::from_map_info)
            .unwrap_or_default()
    }

    /// Read options from the uninterpreted keys of a `map_info`
    ///
    /// Keys that aren't render options are ignored. If an option has the wrong type, none of
    /// the options are used.
    pub fn from_map_info(map_info: &MapInfo) -> RenderOptions {
        let extra = serde_json::Value::Object(
            map_info
                .extra
                .iter()
                .map(|(key, value)| (key.clone(), value.clone()))
                .collect(),
        );
        match serde_json::from_value(extra) {
            Ok(options) => options,
            Err(err) => {
                debug!("ignoring render options stored in map_info: {}", err);
                RenderOptions::default()
            }
        }
    }
}

/// Rendered flux map
#[derive(Clone, Debug, PartialEq)]
pub struct FluxMapHtml {
    html: String,
    figure_id: String,
    model_json: String,
}

impl FluxMapHtml {
    /// The HTML fragment
    pub fn as_str(&self) -> &str {
        &self.html
    }

    pub fn into_string(self) -> String {
        self.html
    }

    pub fn figure_id(&self) -> &str {
        &self.figure_id
    }

    /// The model JSON embedded in the figure
    pub fn model_json(&self) -> &str {
        &self.model_json
    }

    /// A complete HTML page showing the figure, loading its script dependencies from CDNs
    pub fn standalone_page(&self) -> String {
        format!(
            r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<title>{title}</title>
<link rel="stylesheet" href="https://maxcdn.bootstrapcdn.com/bootstrap/3.3.7/css/bootstrap.min.css">
<script src="https://code.jquery.com/jquery-3.7.1.min.js"></script>
<script src="https://cdnjs.cloudflare.com/ajax/libs/require.js/2.3.6/require.min.js"></script>
</head>
<body>
{html}
</body>
</html>
"#,
            title = self.figure_id,
            html = self.html
        )
    }

    /// Write [`FluxMapHtml::standalone_page`] to a file
    pub fn write_standalone<P: AsRef<Path>>(&self, path: P) -> Result<(), RenderError> {
        let path = path.as_ref();
        fs::write(path, self.standalone_page()).map_err(|source| RenderError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}

impl Display for FluxMapHtml {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.html)
    }
}

/// Assign fluxes to the model and render it
///
/// Options not given fall back on the configured defaults. Without a `figure_id` a new
/// `d3fluxNNN` id is generated for each call.
pub fn render_model(model: &mut Model, options: RenderOptions) -> Result<FluxMapHtml, RenderError> {
    let config = configuration::current();

    let figure_id = match options.figure_id {
        Some(id) => id,
        None => next_figure_id(),
    };
    if !FIGURE_ID.is_match(&figure_id) {
        return Err(RenderError::InvalidFigureId(figure_id));
    }

    let background_svg = match options.background_template {
        Some(ref path) => Some(read_background(path)?),
        None => None,
    };

    let (figwidth, figheight) = options.figsize.unwrap_or(config.figsize);
    let fontsize = options.fontsize.unwrap_or(config.fontsize);
    let cf_fontsize = format_number("fontsize", 0.8 * fontsize)?;
    let fontsize = format_number("fontsize", fontsize)?;
    let inactive_alpha = format_number(
        "inactive_alpha",
        options.inactive_alpha.unwrap_or(config.inactive_alpha),
    )?;
    let default_flux_width = format_number(
        "default_flux_width",
        options
            .default_flux_width
            .unwrap_or(config.default_flux_width),
    )?;
    let svg_scale = options.svg_scale.unwrap_or(config.svg_scale);

    // The model is only touched once every option has been checked
    apply_fluxes(
        model,
        options.flux_dict.as_ref(),
        options.metabolite_dict.as_ref(),
    );
    let model_json = model.to_json_string()?;

    let env = environment()?;
    let style = env.get_template(STYLE_TEMPLATE)?.render(context! {
        inactive_alpha => inactive_alpha,
        fontsize => fontsize,
        cf_fontsize => cf_fontsize,
    })?;
    let mut stylesheet = style;
    if let Some(ref custom_css) = options.custom_css {
        stylesheet.push('\n');
        stylesheet.push_str(custom_css);
    }
    let css = serde_json::to_string(&compress_css(&stylesheet)).map_err(JsonError::from)?;

    let script = env.get_template(SCRIPT_TEMPLATE)?.render(context! {
        figure_id => &figure_id,
        modeljson => script_safe(&model_json),
        no_background => js_bool(background_svg.is_none()),
        hide_unused => js_bool(options.hide_unused.unwrap_or(false)),
        hide_unused_cofactors => js_bool(options.hide_unused_cofactors.unwrap_or(false)),
        figwidth => figwidth,
        figheight => figheight,
        css => script_safe(&css),
        default_flux_width => default_flux_width,
        svg_scale => svg_scale,
    })?;

    let html = env.get_template(HTML_TEMPLATE)?.render(context! {
        figure_id => &figure_id,
        background_svg => background_svg.unwrap_or_default(),
        javascript_source => script,
    })?;

    info!(figure_id = %figure_id, "rendered flux map");
    Ok(FluxMapHtml {
        html,
        figure_id,
        model_json,
    })
}

fn environment() -> Result<Environment<'static>, RenderError> {
    let mut env = Environment::new();
    env.set_auto_escape_callback(|_| AutoEscape::None);
    env.add_template(STYLE_TEMPLATE, include_str!("../../templates/network_style.css"))?;
    env.add_template(SCRIPT_TEMPLATE, include_str!("../../templates/d3flux.js"))?;
    env.add_template(HTML_TEMPLATE, include_str!("../../templates/output_template.html"))?;
    Ok(env)
}

fn next_figure_id() -> String {
    let number = FIGURE_COUNTER.fetch_add(1, Ordering::Relaxed) + 1;
    format!("d3flux{:03}", number)
}

/// SVG markup of a background file, starting at the `<svg` element
fn read_background(path: &Path) -> Result<String, RenderError> {
    let data = fs::read_to_string(path).map_err(|source| RenderError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    match data.find("<svg") {
        Some(start) => Ok(data[start..].to_string()),
        None => Err(RenderError::InvalidBackground(path.to_path_buf())),
    }
}

/// Make a JSON string safe to embed inside a `<script>` element
fn script_safe(json: &str) -> String {
    json.replace("</", r"<\/")
        .replace('\u{2028}', r"\u2028")
        .replace('\u{2029}', r"\u2029")
}

/// JavaScript literal of a flag; minijinja would print `True`/`False`
fn js_bool(value: bool) -> &'static str {
    if value {
        "true"
    } else {
        "false"
    }
}

/// Shortest decimal form of a number, `12` rather than `12.0`
///
/// `option` names the render option the number comes from, for the error on NaN or infinity.
fn format_number(option: &'static str, value: f64) -> Result<String, RenderError> {
    if !value.is_finite() {
        return Err(RenderError::InvalidOption { option, value });
    }
    let rounded = (value * 1e6).round() / 1e6;
    if rounded.is_finite() {
        Ok(format!("{}", rounded))
    } else {
        Ok(format!("{}", value))
    }
}

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Unable to serialize model: {0}")]
    Json(#[from] JsonError),
    #[error("Template error: {0}")]
    Template(#[from] minijinja::Error),
    #[error("Unable to access {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("{0} does not contain an <svg> element")]
    InvalidBackground(PathBuf),
    #[error("Figure id {0:?} is not a valid JavaScript identifier")]
    InvalidFigureId(String),
    #[error("Render option {option} must be a finite number, got {value}")]
    InvalidOption { option: &'static str, value: f64 },
}
