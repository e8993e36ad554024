//! # texmath
//!
//! A converter from TeX math notation to presentation MathML.
//!
//! The conversion runs in three stages, mirroring the phases of a TeX
//! engine:
//!
//! - The [lexer](token::lexer) turns source text into [tokens](token::Token).
//! - The [gullet](gullet::Gullet) expands macros (`\def`, `\let`,
//!   `\newcommand` and friends) into a stream of unexpandable tokens.
//! - The [parser](parse::Parser) turns that stream into a tree of
//!   [MathNode](mathml::MathNode) values, including the tabular
//!   environments (`{matrix}`, `{align}`, `{cases}`, `{CD}`, ...).
//!
//! A final [line-breaking pass](linebreak::set_line_breaks) regroups the
//! top-level expression so renderers can break long inline formulas.
//!
//! ```
//! let settings = texmath::Settings::default();
//! let markup = texmath::render(r"x^2", &settings).unwrap();
//! assert_eq!(
//!     markup,
//!     "<math xmlns=\"http://www.w3.org/1998/Math/MathML\">\
//!      <mrow><msup><mi>x</mi><mn>2</mn></msup></mrow></math>",
//! );
//! ```

pub mod error;
pub mod gullet;
pub mod linebreak;
pub mod parse;
pub mod settings;
pub mod testing;
pub mod texmacro;
pub mod token;

pub use error::ErrorKind;
pub use error::ParseError;
pub use parse::Parser;
pub use settings::Settings;

use mathml::{MathNode, MathNodeType};

/// Parse math source into MathML nodes, without the enclosing `<math>`
/// element or line breaking.
pub fn parse(input: &str, settings: &Settings) -> error::Result<Vec<MathNode>> {
    let mut parser = Parser::new(input, settings);
    parser.parse()
}

/// Convert math source to a complete `<math>` element.
pub fn render(input: &str, settings: &Settings) -> error::Result<String> {
    let nodes = parse(input, settings)?;
    let nodes = linebreak::set_line_breaks(nodes, settings.display_mode, false);
    let mut math = MathNode::new(MathNodeType::Math, nodes);
    math.set_attribute("xmlns", "http://www.w3.org/1998/Math/MathML");
    if settings.display_mode {
        math.set_attribute("display", "block");
    }
    Ok(math.to_markup())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_inline() {
        let settings = Settings::default();
        assert_eq!(
            render("a", &settings).unwrap(),
            "<math xmlns=\"http://www.w3.org/1998/Math/MathML\">\
             <mrow><mi>a</mi></mrow></math>"
        );
    }

    #[test]
    fn render_display() {
        let settings = Settings {
            display_mode: true,
            ..Settings::default()
        };
        let markup = render("a", &settings).unwrap();
        assert!(markup.starts_with("<math display=\"block\" xmlns="));
    }

    #[test]
    fn render_breaks_inline_expression() {
        let settings = Settings::default();
        assert_eq!(
            render("a+b", &settings).unwrap(),
            "<math xmlns=\"http://www.w3.org/1998/Math/MathML\">\
             <mrow><mi>a</mi><mo>+</mo></mrow><mrow><mi>b</mi></mrow></math>"
        );
    }

    #[test]
    fn render_propagates_errors() {
        let settings = Settings::default();
        let err = render(r"\nope", &settings).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UndefinedMacro);
    }

    #[test]
    fn render_hard_break_as_table() {
        let settings = Settings::default();
        let markup = render(r"a\\b", &settings).unwrap();
        assert!(markup.contains("<mtable columnalign=\"left\" rowspacing=\"0em\">"));
    }
}
