//! Definitions of user macros.

use crate::error::ErrorKind;
use crate::error::ParseError;
use crate::token::Token;
use crate::token::Value;

/// A segment of a macro's replacement text.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Replacement {
    /// Literal tokens.
    Tokens(Vec<Token>),
    /// A parameter, to be replaced by the corresponding argument. Parameters
    /// are 0-indexed here even though TeX parameters are 1-indexed (`#1`).
    Parameter(usize),
}

/// A user-defined macro.
///
/// Macros are created by `\def`, `\edef`, `\let`, `\futurelet` and the
/// `\newcommand` family, and stored in the macro map.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MacroDef {
    num_args: usize,
    /// For macros with delimited parameters: `delimiters[0]` must match
    /// before the first argument and `delimiters[i]` after argument `i`.
    /// Always has length `num_args + 1` when present.
    delimiters: Option<Vec<Vec<Token>>>,
    replacement: Vec<Replacement>,
    /// Set on `\let` aliases of tokens that have no macro meaning. Such
    /// aliases still expand normally, but expandable-only expansion (as in
    /// the body of an `\edef`) leaves them untouched.
    unexpandable: bool,
}

impl MacroDef {
    pub fn new(
        num_args: usize,
        delimiters: Option<Vec<Vec<Token>>>,
        replacement: Vec<Replacement>,
    ) -> MacroDef {
        MacroDef {
            num_args,
            delimiters,
            replacement,
            unexpandable: false,
        }
    }

    /// A macro standing for a single frozen token, as created by `\let` when
    /// the target token has no macro meaning of its own. `target_expandable`
    /// tells whether the target would take part in expandable-only expansion.
    pub fn new_alias(token: Token, target_expandable: bool) -> MacroDef {
        MacroDef {
            num_args: 0,
            delimiters: None,
            replacement: vec![Replacement::Tokens(vec![token.with_noexpand()])],
            unexpandable: !target_expandable,
        }
    }

    #[inline]
    pub fn num_args(&self) -> usize {
        self.num_args
    }

    #[inline]
    pub fn delimiters(&self) -> Option<&[Vec<Token>]> {
        self.delimiters.as_deref()
    }

    #[inline]
    pub fn unexpandable(&self) -> bool {
        self.unexpandable
    }

    /// Parse raw replacement tokens into replacement segments.
    ///
    /// For macros with at least one parameter, `##` collapses to a literal
    /// `#` and `#n` becomes a parameter reference; any other use of `#` is
    /// an error. Macros with no parameters keep every token literally, `#`
    /// included.
    pub fn parse_replacement(
        tokens: Vec<Token>,
        num_args: usize,
    ) -> Result<Vec<Replacement>, ParseError> {
        if num_args == 0 {
            return Ok(vec![Replacement::Tokens(tokens)]);
        }
        let mut result = Vec::new();
        let mut literal: Vec<Token> = Vec::new();
        let mut iter = tokens.into_iter();
        while let Some(token) = iter.next() {
            if !matches!(token.value(), Value::Parameter(_)) {
                literal.push(token);
                continue;
            }
            let next = match iter.next() {
                None => {
                    return Err(ParseError::new(
                        ErrorKind::InvalidArgumentNumber,
                        "Incomplete placeholder at end of macro body",
                    )
                    .at_position(token.position()))
                }
                Some(next) => next,
            };
            match next.value() {
                // ## stands for a single literal #.
                Value::Parameter(_) => literal.push(token),
                _ => {
                    let index = match next.char().and_then(|c| c.to_digit(10)) {
                        Some(digit) if (1..=9).contains(&digit) => digit as usize - 1,
                        _ => {
                            return Err(ParseError::new(
                                ErrorKind::InvalidArgumentNumber,
                                "Not a valid argument number",
                            )
                            .at_position(next.position()))
                        }
                    };
                    if index >= num_args {
                        return Err(ParseError::new(
                            ErrorKind::InvalidArgumentNumber,
                            format!(
                                "Invalid argument number \"{}\": the macro has {} argument(s)",
                                index + 1,
                                num_args
                            ),
                        )
                        .at_position(next.position()));
                    }
                    if !literal.is_empty() {
                        result.push(Replacement::Tokens(std::mem::take(&mut literal)));
                    }
                    result.push(Replacement::Parameter(index));
                }
            }
        }
        if !literal.is_empty() {
            result.push(Replacement::Tokens(literal));
        }
        Ok(result)
    }

    /// Produce the replacement tokens for an invocation with the provided
    /// arguments, in reading order.
    pub fn perform_replacement(&self, args: &[Vec<Token>]) -> Vec<Token> {
        let mut capacity = 0;
        for segment in &self.replacement {
            match segment {
                Replacement::Tokens(tokens) => capacity += tokens.len(),
                Replacement::Parameter(i) => capacity += args[*i].len(),
            }
        }
        let mut result = Vec::with_capacity(capacity);
        for segment in &self.replacement {
            match segment {
                Replacement::Tokens(tokens) => result.extend_from_slice(tokens),
                Replacement::Parameter(i) => result.extend_from_slice(&args[*i]),
            }
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn letters(s: &str) -> Vec<Token> {
        s.chars().map(|c| Token::new_letter(c, 0)).collect()
    }

    #[test]
    fn parse_replacement_with_parameters() {
        let mut tokens = letters("a");
        tokens.push(Token::new_parameter('#', 1));
        tokens.push(Token::new_other('1', 2));
        tokens.extend(letters("b"));
        let replacement = MacroDef::parse_replacement(tokens, 1).unwrap();
        assert_eq!(
            replacement,
            vec![
                Replacement::Tokens(letters("a")),
                Replacement::Parameter(0),
                Replacement::Tokens(letters("b")),
            ]
        );
    }

    #[test]
    fn parse_replacement_double_hash_is_literal() {
        let tokens = vec![
            Token::new_parameter('#', 0),
            Token::new_parameter('#', 1),
        ];
        let replacement = MacroDef::parse_replacement(tokens, 1).unwrap();
        assert_eq!(
            replacement,
            vec![Replacement::Tokens(vec![Token::new_parameter('#', 0)])]
        );
    }

    #[test]
    fn parse_replacement_zero_args_keeps_hash_literal() {
        let tokens = vec![Token::new_parameter('#', 0), Token::new_other('3', 1)];
        let replacement = MacroDef::parse_replacement(tokens.clone(), 0).unwrap();
        assert_eq!(replacement, vec![Replacement::Tokens(tokens)]);
    }

    #[test]
    fn parse_replacement_bad_argument_number() {
        let tokens = vec![Token::new_parameter('#', 0), Token::new_letter('x', 1)];
        let err = MacroDef::parse_replacement(tokens, 1).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgumentNumber);
    }

    #[test]
    fn parse_replacement_out_of_range_argument() {
        let tokens = vec![Token::new_parameter('#', 0), Token::new_other('2', 1)];
        let err = MacroDef::parse_replacement(tokens, 1).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgumentNumber);
    }

    #[test]
    fn perform_replacement_substitutes_arguments() {
        let replacement = vec![
            Replacement::Parameter(1),
            Replacement::Tokens(letters("x")),
            Replacement::Parameter(0),
        ];
        let def = MacroDef::new(2, None, replacement);
        let got = def.perform_replacement(&[letters("A"), letters("BC")]);
        assert_eq!(got, letters("BCxA"));
    }
}
