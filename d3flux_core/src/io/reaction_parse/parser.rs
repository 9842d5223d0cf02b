use crate::io::reaction_parse::token::{Direction, Token};

use indexmap::IndexMap;
use thiserror::Error;
/*
Reaction Grammar:
reaction -> side ARROW side ;
side -> ( term ( "+" term )* )? ;
term -> NUMBER? METABOLITE ;

e.g. 2 h_c + o2_c --> 2 h2o_c
 */

/// A reaction string split into its two sides
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedReaction {
    /// Consumed metabolites with their (positive) coefficients
    pub reactants: IndexMap<String, f64>,
    /// Produced metabolites with their (positive) coefficients
    pub products: IndexMap<String, f64>,
    /// Direction given by the arrow
    pub direction: Direction,
}

impl ParsedReaction {
    /// Signed stoichiometry, reactants negative and products positive
    pub fn stoichiometry(&self) -> IndexMap<String, f64> {
        let mut stoichiometry: IndexMap<String, f64> = IndexMap::new();
        for (met, coef) in &self.reactants {
            *stoichiometry.entry(met.clone()).or_insert(0.) -= coef;
        }
        for (met, coef) in &self.products {
            *stoichiometry.entry(met.clone()).or_insert(0.) += coef;
        }
        stoichiometry
    }
}

/// Reaction string parser
pub struct ReactionParser {
    /// Vector of tokens from the reaction string
    tokens: Vec<Token>,
    /// Current token being processed
    current: usize,
}

impl ReactionParser {
    /// Create a new ReactionParser
    pub fn new(tokens: Vec<Token>) -> ReactionParser {
        ReactionParser { tokens, current: 0 }
    }

    // region Parsing Functions

    /// Parse the token vector into a [`ParsedReaction`]
    pub fn parse(&mut self) -> Result<ParsedReaction, ParseError> {
        let reactants = self.side()?;
        let direction = match self.peek() {
            Token::Arrow(direction) => {
                self.advance();
                direction
            }
            _ => return Err(ParseError::MissingArrow),
        };
        let products = self.side()?;
        if !self.is_at_end() {
            return Err(ParseError::EarlyTermination);
        }
        Ok(ParsedReaction {
            reactants,
            products,
            direction,
        })
    }

    fn side(&mut self) -> Result<IndexMap<String, f64>, ParseError> {
        let mut side: IndexMap<String, f64> = IndexMap::new();
        if self.at_side_end() {
            return Ok(side);
        }
        loop {
            let (met, coef) = self.term()?;
            *side.entry(met).or_insert(0.) += coef;
            if !self.match_token(Token::Plus) {
                break;
            }
        }
        Ok(side)
    }

    fn term(&mut self) -> Result<(String, f64), ParseError> {
        match self.peek() {
            Token::Number(coef) => {
                self.advance();
                if let Some(met) = self.match_identifier() {
                    return Ok((met, coef));
                }
                // A bare number is a metabolite id, e.g. `2 --> 3`
                if self.at_side_end() || self.check(&Token::Plus) {
                    return Ok((format_number_id(coef), 1.));
                }
                Err(ParseError::ExpectedMetabolite)
            }
            Token::Identifier(met) => {
                self.advance();
                Ok((met, 1.))
            }
            _ => Err(ParseError::ExpectedMetabolite),
        }
    }

    // endregion Parsing Functions

    // region parsing helper functions

    /// If the current token is `token`, advance past it and return true
    fn match_token(&mut self, token: Token) -> bool {
        if self.check(&token) {
            self.advance();
            return true;
        }
        false
    }

    /// If the current token is an identifier return `Some(id)` and advance, otherwise None
    fn match_identifier(&mut self) -> Option<String> {
        if let Token::Identifier(id) = self.peek() {
            self.advance();
            return Some(id);
        }
        None
    }

    fn check(&self, token: &Token) -> bool {
        &self.tokens[self.current] == token
    }

    /// Whether the current token closes a side of the reaction
    fn at_side_end(&self) -> bool {
        matches!(self.tokens[self.current], Token::Arrow(_) | Token::Eof)
    }

    fn advance(&mut self) {
        if !self.is_at_end() {
            self.current += 1;
        }
    }

    fn is_at_end(&self) -> bool {
        self.tokens[self.current] == Token::Eof
    }

    /// Get a copy of the current token
    fn peek(&self) -> Token {
        self.tokens[self.current].clone()
    }

    // endregion parsing helper functions
}

fn format_number_id(value: f64) -> String {
    if value.fract() == 0. {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}

/// Enum representing possible parse errors
#[derive(Debug, Error, PartialEq, Clone)]
pub enum ParseError {
    /// No reaction arrow was found
    #[error("Reaction string has no arrow (one of -->, <--, <=>)")]
    MissingArrow,
    /// A metabolite was expected (e.g. after a coefficient or a `+`)
    #[error("Expected a metabolite identifier")]
    ExpectedMetabolite,
    /// Tokens remain after the products
    #[error("Parsing terminated early, check for a second arrow or a missing `+`")]
    EarlyTermination,
}
