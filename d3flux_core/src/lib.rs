//! Core rust implementation of d3flux, a crate for drawing flux maps of metabolic models.
//!
//! Drawing instructions live in the `map_info` entry of the notes of each metabolite,
//! reaction, and of the model itself. [`flux_map::flux_map`] fills them in and renders the
//! model as an HTML fragment holding an interactive d3 figure.

pub mod configuration;
pub mod display_tools;
pub mod flux;
pub mod flux_map;
pub mod io;
pub mod metabolic_model;
pub mod optimize;
pub mod render;

pub use flux_map::{flux_map, FluxMapOptions, FluxMapOptionsBuilder};
pub use metabolic_model::model::Model;
pub use render::{render_model, FluxMapHtml, RenderError, RenderOptions, RenderOptionsBuilder};
