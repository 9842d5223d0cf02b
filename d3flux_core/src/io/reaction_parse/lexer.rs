//! Lex a reaction string into a series of tokens for later parsing
//!
//! Tokens are separated by whitespace, so `A + B --> C` lexes, but `A+B-->C` is read as a
//! single identifier.

use thiserror::Error;

use crate::io::reaction_parse::token::{Direction, Token};

pub struct Lexer {
    source: Vec<char>,
    tokens: Vec<Token>,
    start: usize,
    current: usize,
}

impl Lexer {
    pub fn new(source: &str) -> Self {
        Lexer {
            source: source.chars().collect(),
            tokens: Vec::new(),
            start: 0,
            current: 0,
        }
    }

    /// Convert the source string into tokens, ending with [`Token::Eof`]
    pub fn lex(&mut self) -> Result<Vec<Token>, LexerError> {
        while !self.is_at_end() {
            self.start = self.current;
            self.scan_token()?;
        }

        self.tokens.push(Token::Eof);
        Ok(std::mem::take(&mut self.tokens))
    }

    fn scan_token(&mut self) -> Result<(), LexerError> {
        let c: char = self.advance();
        match c {
            ' ' | '\r' | '\n' | '\t' => {}
            _ => self.read_word()?,
        };
        Ok(())
    }

    fn advance(&mut self) -> char {
        let char_at_current = self.source[self.current];
        self.current += 1;
        char_at_current
    }

    fn read_word(&mut self) -> Result<(), LexerError> {
        while !self.is_at_end() && !self.peek().is_whitespace() {
            self.advance();
        }

        let text: String = self.source[self.start..self.current].iter().collect();

        let token = match text.as_str() {
            "+" => Token::Plus,
            "-->" | "->" | "=>" => Token::Arrow(Direction::Forward),
            "<--" | "<-" | "<=" => Token::Arrow(Direction::Reverse),
            "<-->" | "<->" | "<=>" => Token::Arrow(Direction::Reversible),
            word => match word.parse::<f64>() {
                Ok(value) if value.is_finite() => Token::Number(value),
                Ok(_) => return Err(LexerError::InvalidCoefficient(word.to_string())),
                Err(_) => {
                    if word.contains("-->") || word.contains("<--") || word.contains("<=>") {
                        return Err(LexerError::UnspacedArrow(word.to_string()));
                    }
                    Token::Identifier(word.to_string())
                }
            },
        };
        self.tokens.push(token);
        Ok(())
    }

    fn peek(&self) -> char {
        if self.is_at_end() {
            return '\0';
        }
        self.source[self.current]
    }

    fn is_at_end(&self) -> bool {
        self.current >= self.source.len()
    }
}

/// Enum representing possible lexing errors
#[derive(Debug, Error, PartialEq, Clone)]
pub enum LexerError {
    #[error("Coefficient `{0}` is not a finite number")]
    InvalidCoefficient(String),
    #[error("Arrow in `{0}` must be separated from metabolites by whitespace")]
    UnspacedArrow(String),
}

#[cfg(test)]
mod tests {
    use crate::io::reaction_parse::lexer::{Lexer, LexerError};
    use crate::io::reaction_parse::token::{Direction, Token};

    #[test]
    fn single_metabolite() {
        let mut lexer = Lexer::new("--> A");
        let tokens = lexer.lex().unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::Arrow(Direction::Forward),
                Token::Identifier("A".to_string()),
                Token::Eof
            ]
        );
    }

    #[test]
    fn coefficients_and_plus() {
        let mut lexer = Lexer::new("2 h_c + 0.5 o2_c <=>  h2o_c");
        let tokens = lexer.lex().unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::Number(2.0),
                Token::Identifier("h_c".to_string()),
                Token::Plus,
                Token::Number(0.5),
                Token::Identifier("o2_c".to_string()),
                Token::Arrow(Direction::Reversible),
                Token::Identifier("h2o_c".to_string()),
                Token::Eof
            ]
        );
    }

    #[test]
    fn identifiers_starting_with_digits() {
        let mut lexer = Lexer::new("13dpg_c <-- 3pg_c");
        let tokens = lexer.lex().unwrap();
        assert_eq!(tokens[0], Token::Identifier("13dpg_c".to_string()));
        assert_eq!(tokens[1], Token::Arrow(Direction::Reverse));
        assert_eq!(tokens[2], Token::Identifier("3pg_c".to_string()));
    }

    #[test]
    fn unspaced_arrow() {
        let mut lexer = Lexer::new("A-->B");
        assert_eq!(
            lexer.lex(),
            Err(LexerError::UnspacedArrow("A-->B".to_string()))
        );
    }
}
