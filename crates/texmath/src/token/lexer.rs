//! The lexer, which reads math source and produces tokens.
//!
//! Math source uses a fixed category code assignment: there is no mechanism
//! for reassigning category codes, so the lexer can map characters to token
//! values directly.
//!
//! - `\` starts a control sequence. A letter after the backslash starts a
//!   control word: the name is the maximal run of ASCII letters and `@`
//!   characters, and whitespace after the name is consumed. Any other
//!   character after the backslash forms a one-character control sequence
//!   (`\\`, `\,`, `\{`). Permitting `@` follows the LaTeX convention for
//!   internal names; `\env@tag` and friends rely on it.
//! - `{ } $ & # ^ _` map to their usual token values.
//! - `%` starts a comment that runs to the end of the line.
//! - A run of whitespace produces a single space token.
//! - ASCII letters are letter tokens; everything else is an other token.

use crate::error::{ErrorKind, ParseError};
use crate::token::CsNameInterner;
use crate::token::Token;

/// The lexer.
pub struct Lexer {
    chars: Vec<char>,
    pos: usize,
}

impl Lexer {
    pub fn new(source: &str) -> Lexer {
        Lexer {
            chars: source.chars().collect(),
            pos: 0,
        }
    }

    /// Read the next token, or `None` at the end of the input.
    pub fn next(&mut self, interner: &mut CsNameInterner) -> Result<Option<Token>, ParseError> {
        loop {
            let position = self.pos as u32;
            let c = match self.chars.get(self.pos) {
                None => return Ok(None),
                Some(&c) => c,
            };
            self.pos += 1;
            return Ok(Some(match c {
                '\\' => self.control_sequence(position, interner)?,
                '{' => Token::new_begin_group(c, position),
                '}' => Token::new_end_group(c, position),
                '$' => Token::new_math_shift(c, position),
                '&' => Token::new_alignment_tab(c, position),
                '#' => Token::new_parameter(c, position),
                '^' => Token::new_superscript(c, position),
                '_' => Token::new_subscript(c, position),
                '%' => {
                    while let Some(&c) = self.chars.get(self.pos) {
                        self.pos += 1;
                        if c == '\n' {
                            break;
                        }
                    }
                    continue;
                }
                _ if is_whitespace(c) => {
                    self.skip_whitespace();
                    Token::new_space(' ', position)
                }
                _ if c.is_ascii_alphabetic() => Token::new_letter(c, position),
                _ => Token::new_other(c, position),
            }));
        }
    }

    fn control_sequence(
        &mut self,
        position: u32,
        interner: &mut CsNameInterner,
    ) -> Result<Token, ParseError> {
        let c = match self.chars.get(self.pos) {
            None => {
                return Err(ParseError::new(
                    ErrorKind::MalformedControlSequence,
                    "Expected a control sequence name after \\",
                )
                .at_position(position))
            }
            Some(&c) => c,
        };
        let name = if is_name_char(c) {
            let start = self.pos;
            while matches!(self.chars.get(self.pos), Some(&c) if is_name_char(c)) {
                self.pos += 1;
            }
            let name: String = self.chars[start..self.pos].iter().collect();
            // Whitespace after a control word is part of the name's ending.
            self.skip_whitespace();
            name
        } else {
            self.pos += 1;
            c.to_string()
        };
        Ok(Token::new_control_sequence(
            interner.get_or_intern(name),
            position,
        ))
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.chars.get(self.pos), Some(&c) if is_whitespace(c)) {
            self.pos += 1;
        }
    }
}

fn is_whitespace(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\r' | '\n')
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '@'
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::Value;

    enum TokenValue {
        Character(char),
        ControlSequence(&'static str),
    }
    use TokenValue::Character;
    use TokenValue::ControlSequence;

    impl TokenValue {
        fn convert(self, interner: &mut CsNameInterner) -> Value {
            match self {
                ControlSequence(name) => Value::ControlSequence(interner.get_or_intern(name)),
                Character(c) => match c {
                    '{' => Value::BeginGroup(c),
                    '}' => Value::EndGroup(c),
                    '$' => Value::MathShift(c),
                    '&' => Value::AlignmentTab(c),
                    '#' => Value::Parameter(c),
                    '^' => Value::Superscript(c),
                    '_' => Value::Subscript(c),
                    ' ' => Value::Space(c),
                    _ if c.is_ascii_alphabetic() => Value::Letter(c),
                    _ => Value::Other(c),
                },
            }
        }
    }

    macro_rules! lexer_test {
        ($name: ident, $input: expr, $( $expected_token: expr, )*) => {
            #[test]
            fn $name() {
                let mut lexer = Lexer::new($input);
                let mut interner = CsNameInterner::new();
                let mut got = Vec::new();
                while let Some(token) = lexer.next(&mut interner).unwrap() {
                    got.push(token.value());
                }
                let want: Vec<Value> = vec![$( $expected_token.convert(&mut interner), )*];
                assert_eq!(got, want);
            }
        };
    }

    lexer_test![
        control_word,
        r"\alpha+\beta",
        ControlSequence("alpha"),
        Character('+'),
        ControlSequence("beta"),
    ];

    lexer_test![
        at_sign_in_control_word,
        r"\env@tag x",
        ControlSequence("env@tag"),
        Character('x'),
    ];

    lexer_test![
        control_word_eats_trailing_whitespace,
        "\\alpha  \n x",
        ControlSequence("alpha"),
        Character('x'),
    ];

    lexer_test![
        one_character_control_sequences,
        r"\\\,\{\%",
        ControlSequence(r"\"),
        ControlSequence(","),
        ControlSequence("{"),
        ControlSequence("%"),
    ];

    lexer_test![
        specials,
        r"{}$&#^_",
        Character('{'),
        Character('}'),
        Character('$'),
        Character('&'),
        Character('#'),
        Character('^'),
        Character('_'),
    ];

    lexer_test![
        whitespace_run_is_one_token,
        "a \t\n b",
        Character('a'),
        Character(' '),
        Character('b'),
    ];

    lexer_test![
        comment_runs_to_end_of_line,
        "a% a comment {\nb",
        Character('a'),
        Character('b'),
    ];

    lexer_test![
        digits_and_punctuation_are_other,
        "1+,",
        Character('1'),
        Character('+'),
        Character(','),
    ];

    #[test]
    fn trailing_backslash_is_an_error() {
        let mut lexer = Lexer::new(r"x\");
        let mut interner = CsNameInterner::new();
        lexer.next(&mut interner).unwrap();
        let err = lexer.next(&mut interner).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedControlSequence);
    }
}
