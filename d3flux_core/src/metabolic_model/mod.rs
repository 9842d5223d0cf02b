//! Module providing the Model struct for representing a metabolic model.

pub mod gene;
pub mod map_info;
pub mod metabolite;
pub mod model;
pub mod reaction;
