//! Utilities for writing unit tests.

use colored::Colorize;

use crate::error::ErrorKind;
use crate::error::ParseError;
use crate::gullet::Gullet;
use crate::token::write_tokens;
use crate::token::Value;

/// Run the gullet over the provided source and return the fully expanded
/// token stream as text.
///
/// Brace tokens open and close macro scopes here, as they do in the parser.
pub fn expand_to_string(source: &str) -> Result<String, ParseError> {
    let mut gullet = Gullet::new(source, 1000, |_| false);
    let mut tokens = Vec::new();
    while let Some(token) = gullet.expand_next()? {
        match token.value() {
            Value::BeginGroup(_) => gullet.begin_group(),
            Value::EndGroup(_) => {
                gullet.end_group();
            }
            _ => (),
        }
        tokens.push(token);
    }
    Ok(write_tokens(&tokens, gullet.interner()))
}

/// Expand both inputs and require that they produce the same token stream.
pub fn run_expansion_equality_test(lhs: &str, rhs: &str) {
    let got = match expand_to_string(lhs) {
        Ok(got) => got,
        Err(err) => panic!("expansion of {} failed: {}", lhs, err),
    };
    let want = match expand_to_string(rhs) {
        Ok(want) => want,
        Err(err) => panic!("expansion of {} failed: {}", rhs, err),
    };
    if got != want {
        println!("{}", "Expansion outputs differ:".bold());
        println!("input: {}", lhs);
        println!("{}:   {}", "got".bright_red(), got);
        println!("{}:  {}", "want".bright_green(), want);
        panic!("expansion outputs differ");
    }
}

/// Require that expanding the input fails with the provided error kind.
pub fn run_failure_test(input: &str, kind: ErrorKind) {
    match expand_to_string(input) {
        Ok(got) => {
            println!("{}", "Expansion unexpectedly succeeded:".bold());
            println!("input: {}", input);
            println!("{}:   {}", "got".bright_red(), got);
            panic!("expected the expansion to fail");
        }
        Err(err) => {
            if err.kind() != kind {
                println!("{}", "Expansion failed with the wrong error:".bold());
                println!("input: {}", input);
                println!("{}:   {:?} ({})", "got".bright_red(), err.kind(), err);
                println!("{}:  {:?}", "want".bright_green(), kind);
                panic!("wrong error kind");
            }
        }
    }
}

/// Require that parsing the input fails with the provided error kind.
pub fn run_parse_failure_test(input: &str, display_mode: bool, kind: ErrorKind) {
    let settings = crate::Settings {
        display_mode,
        ..Default::default()
    };
    match crate::parse(input, &settings) {
        Ok(_) => {
            println!("{}", "Parse unexpectedly succeeded:".bold());
            println!("input: {}", input);
            panic!("expected the parse to fail");
        }
        Err(err) => {
            if err.kind() != kind {
                println!("{}", "Parse failed with the wrong error:".bold());
                println!("input: {}", input);
                println!("{}:   {:?} ({})", "got".bright_red(), err.kind(), err);
                println!("{}:  {:?}", "want".bright_green(), kind);
                panic!("wrong error kind");
            }
        }
    }
}

/// A test that two inputs expand to the same token stream.
#[macro_export]
macro_rules! expansion_test {
    ($name: ident, $lhs: expr, $rhs: expr) => {
        #[test]
        fn $name() {
            $crate::testing::run_expansion_equality_test($lhs, $rhs);
        }
    };
}

/// A test that expanding the input fails with the provided error kind.
#[macro_export]
macro_rules! failure_test {
    ($name: ident, $input: expr, $kind: expr) => {
        #[test]
        fn $name() {
            $crate::testing::run_failure_test($input, $kind);
        }
    };
}

/// A test that parsing the input in display mode fails with the provided
/// error kind.
#[macro_export]
macro_rules! parse_failure_test {
    ($name: ident, $input: expr, $kind: expr) => {
        #[test]
        fn $name() {
            $crate::testing::run_parse_failure_test($input, true, $kind);
        }
    };
    ($name: ident, $input: expr, $kind: expr, inline) => {
        #[test]
        fn $name() {
            $crate::testing::run_parse_failure_test($input, false, $kind);
        }
    };
}
