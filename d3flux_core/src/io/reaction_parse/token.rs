//! Module providing Token struct for lexing

/// Represents Tokens in a reaction string
#[derive(Debug, PartialEq, Clone)]
pub enum Token {
    Identifier(String),
    Number(f64),
    Plus,
    Arrow(Direction),
    Eof,
}

/// Direction of a reaction, set by the arrow used in the reaction string
#[derive(Debug, PartialEq, Clone, Copy, Eq, Hash)]
pub enum Direction {
    /// `-->`, `->` or `=>`
    Forward,
    /// `<--`, `<-` or `<=`
    Reverse,
    /// `<-->`, `<->` or `<=>`
    Reversible,
}
