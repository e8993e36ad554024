//! The `{CD}` commutative-diagram environment.
//!
//! Cells alternate with arrow specifiers such as `@>>>` and `@VVV`. Arrow
//! labels are accepted but not rendered.

use mathml::{MathNode, MathNodeType};

use crate::error::end_of_input;
use crate::error::ErrorKind;
use crate::error::ParseError;
use crate::error::Result;
use crate::token::Value;

use super::array::{
    build_array, ArrayConfig, ColSeparation, ParsedArray, ScriptLevel,
};
use super::Parser;
use super::Stops;

pub(crate) fn parse_cd(parser: &mut Parser) -> Result<MathNode> {
    // Unwind the diagram and cell scopes on every exit path.
    let depth = parser.gullet().group_depth();
    let result = parse_cd_inner(parser);
    let gullet = parser.gullet_mut();
    while gullet.group_depth() > depth {
        if !gullet.end_group() {
            break;
        }
    }
    result
}

fn parse_cd_inner(parser: &mut Parser) -> Result<MathNode> {
    {
        let gullet = parser.gullet_mut();
        gullet.begin_group();
        gullet.set_text_macro("cr", "\\\\\\relax", 0)?;
        gullet.begin_group();
    }
    let stops = Stops {
        row_separator: true,
        at_sign: true,
    };
    let mut body: Vec<Vec<Vec<MathNode>>> = vec![Vec::new()];
    loop {
        let cell = parser.parse_expression(stops)?;
        {
            let gullet = parser.gullet_mut();
            gullet.end_group();
            gullet.begin_group();
        }
        body.last_mut().unwrap().push(cell);

        let token = match parser.fetch()? {
            None => return Err(end_of_input("\\end")),
            Some(token) => token,
        };
        if matches!(token.value(), Value::Other('@')) {
            parser.consume();
            let arrow = parse_arrow(parser)?;
            body.last_mut()
                .unwrap()
                .push(arrow.map_or_else(Vec::new, |node| vec![node]));
            continue;
        }
        let name = token.cs_name().map(|name| {
            parser
                .gullet()
                .interner()
                .resolve(name)
                .unwrap_or("?")
                .to_string()
        });
        match name.as_deref() {
            Some("end") => {
                let last_row = body.last().unwrap();
                if last_row.len() == 1 && last_row[0].is_empty() && body.len() > 1 {
                    body.pop();
                }
                break;
            }
            Some("\\") => {
                parser.consume();
                body.push(Vec::new());
            }
            _ => {
                return Err(ParseError::new(
                    ErrorKind::UnexpectedToken,
                    "Expected @ or \\\\ or \\end",
                )
                .at_position(token.position()))
            }
        }
    }

    let num_rows = body.len();
    let parsed = ParsedArray {
        body,
        tags: Vec::new(),
        row_gaps: Vec::new(),
        hlines_before_row: vec![Vec::new(); num_rows + 1],
        arraystretch: 1.0,
    };
    let cfg = ArrayConfig {
        hskip_before_and_after: false,
        add_jot: false,
        cols: Vec::new(),
        arraystretch: Some(1.0),
        col_separation: ColSeparation::Cd,
        add_eqn_num: false,
        single_row: false,
        empty_single_row: false,
        max_num_cols: None,
        script_level: ScriptLevel::Display,
    };
    Ok(build_array(parsed, &cfg, parser.settings()))
}

/// Parse one arrow specifier, with the leading `@` already consumed.
/// Returns `None` for `@.`, the empty cell.
fn parse_arrow(parser: &mut Parser) -> Result<Option<MathNode>> {
    let token = match parser.fetch()? {
        None => return Err(end_of_input("a CD arrow specifier")),
        Some(token) => token,
    };
    match token.char() {
        Some('>') => {
            parser.consume();
            read_arrow_rest(parser, '>')?;
            Ok(Some(horizontal_arrow("→")))
        }
        Some('<') => {
            parser.consume();
            read_arrow_rest(parser, '<')?;
            Ok(Some(horizontal_arrow("←")))
        }
        Some('V') => {
            parser.consume();
            read_arrow_rest(parser, 'V')?;
            Ok(Some(MathNode::text(MathNodeType::Mo, "↓")))
        }
        Some('A') => {
            parser.consume();
            read_arrow_rest(parser, 'A')?;
            Ok(Some(MathNode::text(MathNodeType::Mo, "↑")))
        }
        Some('=') => {
            parser.consume();
            Ok(Some(MathNode::text(MathNodeType::Mo, "=")))
        }
        Some('.') => {
            parser.consume();
            Ok(None)
        }
        _ => Err(ParseError::new(
            ErrorKind::UnexpectedToken,
            format!(
                "Expected a CD arrow specifier, got \"{}\"",
                parser.gullet().token_display(token)
            ),
        )
        .at_position(token.position())),
    }
}

/// Read the two remaining delimiters of an arrow specifier, discarding any
/// label tokens between them.
fn read_arrow_rest(parser: &mut Parser, delimiter: char) -> Result<()> {
    let mut labeled = false;
    for _ in 0..2 {
        loop {
            match parser.fetch()? {
                None => return Err(end_of_input(delimiter)),
                Some(token) if token.char() == Some(delimiter) => {
                    parser.consume();
                    break;
                }
                Some(_) => {
                    labeled = true;
                    parser.consume();
                }
            }
        }
    }
    if labeled {
        let message = "CD arrow labels are not rendered";
        if parser.settings().strict {
            return Err(ParseError::new(ErrorKind::UnexpectedToken, message));
        }
        parser.warn(message);
    }
    Ok(())
}

fn horizontal_arrow(text: &str) -> MathNode {
    let mut node = MathNode::text(MathNodeType::Mo, text);
    node.set_attribute("stretchy", "true");
    node
}

#[cfg(test)]
mod tests {
    use crate::error::ErrorKind;
    use crate::parse_failure_test;
    use crate::Settings;

    fn markup(input: &str) -> String {
        let settings = Settings {
            display_mode: true,
            ..Settings::default()
        };
        let nodes = crate::parse(input, &settings).expect("parse failed");
        nodes.iter().map(|n| n.to_markup()).collect()
    }

    #[test]
    fn horizontal_arrow() {
        let markup = markup(r"\begin{CD}A @>>> B\end{CD}");
        assert!(markup.contains("<mo stretchy=\"true\">→</mo>"));
        assert!(markup.contains("columnspacing=\"0.5em\""));
        assert!(markup.contains("class=\"tml-array tml-gather\""));
    }

    #[test]
    fn two_row_diagram() {
        let markup = markup(r"\begin{CD}A @>>> B\\@VVV @. @VVV\\C @<<< D\end{CD}");
        assert_eq!(markup.matches("<mtr>").count(), 3);
        assert!(markup.contains("<mo>↓</mo>"));
        assert!(markup.contains("<mo stretchy=\"true\">←</mo>"));
        // The @. cell is empty.
        assert!(markup.contains("<mtd><mrow></mrow></mtd>"));
    }

    #[test]
    fn equals_arrow() {
        let markup = markup(r"\begin{CD}A @= B\end{CD}");
        assert!(markup.contains("<mo>=</mo>"));
    }

    #[test]
    fn labels_are_dropped_with_a_warning() {
        let settings = Settings {
            display_mode: true,
            ..Settings::default()
        };
        let mut parser =
            crate::parse::Parser::new(r"\begin{CD}A @>f>> B\end{CD}", &settings);
        let nodes = parser.parse().expect("parse failed");
        assert_eq!(parser.warnings(), ["CD arrow labels are not rendered"]);
        let markup: String = nodes.iter().map(|n| n.to_markup()).collect();
        assert!(!markup.contains("<mi>f</mi>"));
    }

    #[test]
    fn labels_are_an_error_in_strict_mode() {
        let settings = Settings {
            display_mode: true,
            strict: true,
            ..Settings::default()
        };
        let result = crate::parse(r"\begin{CD}A @>f>> B\end{CD}", &settings);
        assert!(result.is_err());
    }

    parse_failure_test![
        cd_requires_display_mode,
        r"\begin{CD}A @>>> B\end{CD}",
        ErrorKind::DisplayModeRequired,
        inline
    ];
    parse_failure_test![
        bad_arrow_specifier,
        r"\begin{CD}A @? B\end{CD}",
        ErrorKind::UnexpectedToken
    ];
}
