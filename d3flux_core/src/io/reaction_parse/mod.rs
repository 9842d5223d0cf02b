//! Module for parsing reaction strings such as `A + 2 B --> C` into reactions

use crate::configuration;
use crate::io::reaction_parse::lexer::LexerError;
use crate::io::reaction_parse::parser::{ParseError, ParsedReaction};
use crate::metabolic_model::metabolite::Metabolite;
use crate::metabolic_model::model::Model;
use crate::metabolic_model::reaction::Reaction;
use thiserror::Error;

mod lexer;
pub mod parser;
pub mod token;

pub use token::Direction;

/// Parse a reaction string into its reactants, products, and direction
///
/// # Parameters
/// - `input`: &str representing the reaction, e.g. `"2 h_c + o2_c --> 2 h2o_c"`
///
/// # Returns
/// Parse result which is
/// - `Ok`: The [`ParsedReaction`]
/// - `Err`: Returns the ReactionParseError describing the issue with the reaction string
///
/// # Examples
/// ```rust
/// use d3flux_core::io::reaction_parse::{parse_reaction, Direction};
/// let parsed = parse_reaction("A + 2 B <=> C").unwrap();
/// assert_eq!(parsed.reactants["B"], 2.0);
/// assert_eq!(parsed.direction, Direction::Reversible);
/// ```
pub fn parse_reaction(input: &str) -> Result<ParsedReaction, ReactionParseError> {
    let mut lexer = lexer::Lexer::new(input);
    let tokens = lexer.lex()?;

    let mut parser = parser::ReactionParser::new(tokens);
    let parsed = parser.parse()?;
    Ok(parsed)
}

impl Model {
    /// Set the stoichiometry and bounds of a reaction from a reaction string
    ///
    /// The reaction is created if it is not in the model yet, as is any metabolite that the
    /// string mentions. `-->` gives bounds of (0, upper), `<--` gives (lower, 0), and `<=>`
    /// gives (lower, upper), using the configured default bounds.
    ///
    /// # Examples
    /// ```rust
    /// use d3flux_core::metabolic_model::model::Model;
    /// let mut model = Model::new_empty();
    /// model.build_reaction_from_string("R10", "C + D --> E + P").unwrap();
    /// assert_eq!(model.metabolites.len(), 4);
    /// assert_eq!(model.reactions["R10"].bounds(), (0.0, 1000.0));
    /// ```
    pub fn build_reaction_from_string(
        &mut self,
        reaction_id: &str,
        reaction_str: &str,
    ) -> Result<(), ReactionParseError> {
        let parsed = parse_reaction(reaction_str)?;
        let stoichiometry = parsed.stoichiometry();
        for met_id in stoichiometry.keys() {
            if !self.metabolites.contains_key(met_id) {
                self.add_metabolite(Metabolite::new_id_only(met_id));
            }
        }

        let config = configuration::current();
        let (lower_bound, upper_bound) = match parsed.direction {
            Direction::Forward => (0., config.upper_bound),
            Direction::Reverse => (config.lower_bound, 0.),
            Direction::Reversible => (config.lower_bound, config.upper_bound),
        };

        let reaction = self
            .reactions
            .entry(reaction_id.to_string())
            .or_insert_with(|| Reaction::new_id_only(reaction_id));
        reaction.metabolites = stoichiometry;
        reaction.set_bounds(lower_bound, upper_bound);
        Ok(())
    }
}

/// Enum representing possible lex and parse errors
#[derive(Debug, Error)]
pub enum ReactionParseError {
    /// Lexing Error
    #[error("Error occurred during lexing (conversion of reaction string to tokens)")]
    LexingError(#[from] LexerError),
    /// Parsing Error
    #[error("Error occurred during parsing (conversion of tokens to a reaction)")]
    ParsingError(#[from] ParseError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metabolic_model::map_info::Annotated;

    #[test]
    fn build_simple_model() {
        let mut model = Model::new("simple_model");
        model.build_reaction_from_string("R1", "--> A").unwrap();
        model.build_reaction_from_string("R2", "<--> B").unwrap();
        model.build_reaction_from_string("R3", "P <--").unwrap();
        model.build_reaction_from_string("R8", "B <--> C").unwrap();

        assert_eq!(
            model.metabolites.keys().collect::<Vec<_>>(),
            vec!["A", "B", "P", "C"]
        );
        assert_eq!(model.reactions["R1"].bounds(), (0., 1000.));
        assert!(model.reactions["R2"].reversibility());
        assert_eq!(model.reactions["R3"].bounds(), (-1000., 0.));
        assert_eq!(model.reactions["R8"].coefficient("B"), Some(-1.));
        assert_eq!(model.reactions["R8"].coefficient("C"), Some(1.));
    }

    #[test]
    fn rebuild_existing_reaction() {
        let mut model = Model::new("m");
        model.build_reaction_from_string("R5", "A --> B").unwrap();
        model.reactions["R5"].map_info_mut().display_name = Some("kept".to_string());
        model.build_reaction_from_string("R5", "A <=> 2 C").unwrap();
        let r5 = &model.reactions["R5"];
        assert_eq!(r5.coefficient("B"), None);
        assert_eq!(r5.coefficient("C"), Some(2.));
        assert!(r5.reversibility());
        // Notes of an existing reaction are untouched
        assert_eq!(r5.notes.map_info.as_ref().unwrap().display_name.as_deref(), Some("kept"));
    }

    #[test]
    fn invalid_reaction_string() {
        let mut model = Model::new("m");
        match model.build_reaction_from_string("R1", "A B") {
            Err(ReactionParseError::ParsingError(ParseError::MissingArrow)) => {}
            _ => panic!("Expected a missing arrow error"),
        }
        assert!(model.reactions.is_empty());
        assert!(model.metabolites.is_empty());
    }
}
