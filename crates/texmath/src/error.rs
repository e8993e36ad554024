//! Error types for the converter.

use std::fmt;

/// Classification of parse errors.
///
/// Every error the converter reports carries one of these kinds, so callers
/// can react to a class of failure without matching on message text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ErrorKind {
    /// `\` at the end of the input, or a definition target that is not a
    /// control sequence.
    MalformedControlSequence,
    /// `#` followed by something other than a digit the macro declares.
    InvalidArgumentNumber,
    /// Macro parameters declared out of order (`#2` before `#1`).
    ArgumentOutOfOrder,
    /// `\newcommand` over an existing name, or `\renewcommand` over a
    /// missing one.
    RedefinitionConflict,
    /// An undefined control sequence was used.
    UndefinedMacro,
    /// The bracketed argument count of a `\newcommand` is not a single
    /// digit or is missing its closing bracket.
    InvalidNumberOfArguments,
    /// `\arraystretch` did not resolve to a positive number.
    InvalidStretch,
    /// A column descriptor character outside the recognized set.
    UnknownColumnAlignment,
    /// A row has more cells than the environment permits.
    TooManyColumns,
    /// An alignment row has more math fields than its column spec allows.
    TooManyMathInRow,
    /// An environment restricted to one column was given more.
    SingleColumnOnly,
    /// A token that cannot appear here.
    UnexpectedToken,
    /// An environment that requires display mode was used inline.
    DisplayModeRequired,
    /// `\hline` or `\hdashline` outside of an array environment.
    RuleOutsideArray,
    /// The input ended while more tokens were required.
    EndOfInput,
    /// The expansion limit was exceeded; almost always a macro loop.
    TooManyExpansions,
}

/// Error returned when converting math source fails.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ParseError {
    kind: ErrorKind,
    message: String,
    position: Option<u32>,
}

impl ParseError {
    pub fn new<T: Into<String>>(kind: ErrorKind, message: T) -> ParseError {
        ParseError {
            kind,
            message: message.into(),
            position: None,
        }
    }

    /// Attach the byte offset in the source where the error was detected.
    pub fn at_position(mut self, position: u32) -> ParseError {
        self.position = Some(position);
        self
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn position(&self) -> Option<u32> {
        self.position
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.position {
            None => write!(f, "{}", self.message),
            Some(position) => write!(f, "{} at position {}", self.message, position),
        }
    }
}

impl std::error::Error for ParseError {}

pub type Result<T> = std::result::Result<T, ParseError>;

/// Shorthand for the pervasive "input ended too soon" error.
pub fn end_of_input<T: Into<String>>(expected: T) -> ParseError {
    ParseError::new(
        ErrorKind::EndOfInput,
        format!("Unexpected end of input: expected {}", expected.into()),
    )
}
