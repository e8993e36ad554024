//! Tokens of the math source language.

mod interner;
pub mod lexer;

pub use interner::CsNameInterner;

use std::num;

/// String type used to represent control sequence names.
///
/// Names are interned in a [CsNameInterner] so that tokens stay `Copy` and
/// name comparisons are integer comparisons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CsName(num::NonZeroU32);

impl CsName {
    #[inline]
    pub fn to_usize(&self) -> usize {
        self.0.get() as usize
    }

    pub fn try_from_usize(u: usize) -> Option<CsName> {
        let u = match u32::try_from(u) {
            Ok(u) => u,
            Err(_) => return None,
        };
        num::NonZeroU32::new(u).map(CsName)
    }
}

/// The value of a token.
#[derive(Debug, Eq, PartialEq, Clone, Copy)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Value {
    BeginGroup(char),
    EndGroup(char),
    MathShift(char),
    AlignmentTab(char),
    Parameter(char),
    Superscript(char),
    Subscript(char),
    Space(char),
    Letter(char),
    Other(char),
    ControlSequence(CsName),
}

/// A token of math source.
///
/// Tokens are cheap `Copy` values: the token's value, the byte offset it was
/// read from, and the `noexpand` flag. The flag freezes the token against
/// future macro lookup; `\let` uses it to capture a snapshot of a token's
/// current meaning rather than a live alias.
#[derive(Debug, Eq, Clone, Copy)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Token {
    value: Value,
    position: u32,
    noexpand: bool,
}

impl PartialEq for Token {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

macro_rules! token_constructor {
    ($name: ident, $value: expr) => {
        pub fn $name(c: char, position: u32) -> Token {
            Token {
                value: $value(c),
                position,
                noexpand: false,
            }
        }
    };
}

impl Token {
    token_constructor!(new_begin_group, Value::BeginGroup);
    token_constructor!(new_end_group, Value::EndGroup);
    token_constructor!(new_math_shift, Value::MathShift);
    token_constructor!(new_alignment_tab, Value::AlignmentTab);
    token_constructor!(new_parameter, Value::Parameter);
    token_constructor!(new_superscript, Value::Superscript);
    token_constructor!(new_subscript, Value::Subscript);
    token_constructor!(new_space, Value::Space);
    token_constructor!(new_letter, Value::Letter);
    token_constructor!(new_other, Value::Other);

    pub fn new_control_sequence(name: CsName, position: u32) -> Token {
        Token {
            value: Value::ControlSequence(name),
            position,
            noexpand: false,
        }
    }

    #[inline]
    pub fn value(&self) -> Value {
        self.value
    }

    #[inline]
    pub fn position(&self) -> u32 {
        self.position
    }

    #[inline]
    pub fn noexpand(&self) -> bool {
        self.noexpand
    }

    /// Return a copy of this token frozen against macro lookup.
    pub fn with_noexpand(mut self) -> Token {
        self.noexpand = true;
        self
    }

    /// The character for character tokens, or `None` for control sequences.
    pub fn char(&self) -> Option<char> {
        match self.value {
            Value::BeginGroup(c)
            | Value::EndGroup(c)
            | Value::MathShift(c)
            | Value::AlignmentTab(c)
            | Value::Parameter(c)
            | Value::Superscript(c)
            | Value::Subscript(c)
            | Value::Space(c)
            | Value::Letter(c)
            | Value::Other(c) => Some(c),
            Value::ControlSequence(_) => None,
        }
    }

    /// The control sequence name, or `None` for character tokens.
    pub fn cs_name(&self) -> Option<CsName> {
        match self.value {
            Value::ControlSequence(name) => Some(name),
            _ => None,
        }
    }
}

/// Write a collection of tokens to a string, for diagnostics and test output.
pub fn write_tokens<'a, T>(tokens: T, interner: &CsNameInterner) -> String
where
    T: IntoIterator<Item = &'a Token>,
{
    let mut result = String::new();
    let mut after_cs = false;
    for token in tokens {
        match token.value() {
            Value::ControlSequence(name) => {
                result.push('\\');
                result.push_str(interner.resolve(name).unwrap_or("?"));
                after_cs = true;
            }
            _ => {
                let c = token.char().unwrap();
                // A letter directly after a multi-letter control sequence
                // would be absorbed into the name on re-read.
                if after_cs && c.is_ascii_alphabetic() {
                    result.push(' ');
                }
                result.push(c);
                after_cs = false;
            }
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_is_small() {
        assert!(std::mem::size_of::<Token>() <= 16);
    }

    #[test]
    fn equality_ignores_position() {
        let a = Token::new_letter('x', 0);
        let b = Token::new_letter('x', 7);
        assert_eq!(a, b);
    }

    #[test]
    fn write_tokens_separates_cs_from_letter() {
        let mut interner = CsNameInterner::default();
        let bf = interner.get_or_intern("bf");
        let tokens = vec![
            Token::new_control_sequence(bf, 0),
            Token::new_letter('x', 3),
        ];
        assert_eq!(write_tokens(&tokens, &interner), "\\bf x");
    }
}
