//! The parser, which turns expanded tokens into MathML nodes.

pub mod array;
pub mod builtins;
pub mod cd;
pub mod environments;

use mathml::{em, MathNode, MathNodeType};

use crate::error::end_of_input;
use crate::error::ErrorKind;
use crate::error::ParseError;
use crate::error::Result;
use crate::gullet::Gullet;
use crate::settings::Settings;
use crate::token::CsName;
use crate::token::Token;
use crate::token::Value;

/// Tokens that end an expression in addition to the ever-present ones
/// (end of input, `}`, `&`, `$` and `\end`).
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct Stops {
    /// Stop at `\\`. Set while parsing the cells of a multi-row environment.
    pub row_separator: bool,
    /// Stop at `@`. Set while parsing the cells of a `{CD}` diagram.
    pub at_sign: bool,
}

/// A `\tag` or `\notag` seen while parsing a row.
#[derive(Debug, Clone)]
pub(crate) enum Tag {
    Tagged(Vec<MathNode>),
    NoTag,
}

/// The parser.
pub struct Parser<'a> {
    gullet: Gullet,
    settings: &'a Settings,
    /// One token of expanded lookahead.
    next_token: Option<Token>,
    pending_tag: Option<Tag>,
    warnings: Vec<String>,
}

impl<'a> Parser<'a> {
    pub fn new(source: &str, settings: &'a Settings) -> Parser<'a> {
        Parser {
            gullet: Gullet::new(source, settings.max_expand, builtins::is_builtin),
            settings,
            next_token: None,
            pending_tag: None,
            warnings: Vec::new(),
        }
    }

    /// Problems found in lenient mode.
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    /// Parse the whole input.
    pub fn parse(&mut self) -> Result<Vec<MathNode>> {
        let nodes = self.parse_expression(Stops::default())?;
        if let Some(token) = self.fetch()? {
            return Err(ParseError::new(
                ErrorKind::UnexpectedToken,
                format!("Unexpected token: \"{}\"", self.gullet.token_display(token)),
            )
            .at_position(token.position()));
        }
        Ok(nodes)
    }

    pub(crate) fn settings(&self) -> &Settings {
        self.settings
    }

    pub(crate) fn gullet(&self) -> &Gullet {
        &self.gullet
    }

    pub(crate) fn gullet_mut(&mut self) -> &mut Gullet {
        // Raw gullet reads bypass the lookahead slot, so drain it first.
        self.push_back_lookahead();
        &mut self.gullet
    }

    pub(crate) fn warn<T: Into<String>>(&mut self, message: T) {
        self.warnings.push(message.into());
    }

    pub(crate) fn take_pending_tag(&mut self) -> Option<Tag> {
        self.pending_tag.take()
    }

    /// Peek at the next expanded token.
    pub(crate) fn fetch(&mut self) -> Result<Option<Token>> {
        if self.next_token.is_none() {
            self.next_token = self.gullet.expand_next()?;
        }
        Ok(self.next_token)
    }

    /// Consume the token previously returned by [fetch](Parser::fetch).
    pub(crate) fn consume(&mut self) {
        self.next_token = None;
    }

    fn push_back_lookahead(&mut self) {
        if let Some(token) = self.next_token.take() {
            self.gullet.push_token(token);
        }
    }

    pub(crate) fn consume_spaces(&mut self) -> Result<()> {
        while let Some(token) = self.fetch()? {
            if !matches!(token.value(), Value::Space(_)) {
                break;
            }
            self.consume();
        }
        Ok(())
    }

    /// Run `f` inside a fresh macro scope. The scope is closed again on
    /// every exit path, including errors.
    pub(crate) fn with_group<T>(&mut self, f: impl FnOnce(&mut Parser<'a>) -> Result<T>) -> Result<T> {
        self.gullet.begin_group();
        let depth = self.gullet.group_depth();
        let result = f(self);
        while self.gullet.group_depth() >= depth {
            if !self.gullet.end_group() {
                break;
            }
        }
        result
    }

    fn cs_str(&self, name: CsName) -> String {
        self.gullet
            .interner()
            .resolve(name)
            .unwrap_or("?")
            .to_string()
    }

    fn is_stop(&self, token: Token, stops: Stops) -> bool {
        match token.value() {
            Value::EndGroup(_) | Value::AlignmentTab(_) | Value::MathShift(_) => true,
            Value::Other('@') => stops.at_sign,
            Value::ControlSequence(name) => {
                let name = self.gullet.interner().resolve(name).unwrap_or("");
                name == "end" || (stops.row_separator && name == "\\")
            }
            _ => false,
        }
    }

    /// Parse nodes until end of input or a stop token. The stop token is
    /// left unconsumed.
    pub(crate) fn parse_expression(&mut self, stops: Stops) -> Result<Vec<MathNode>> {
        let mut nodes: Vec<MathNode> = Vec::new();
        loop {
            let token = match self.fetch()? {
                None => break,
                Some(token) => token,
            };
            if self.is_stop(token, stops) {
                break;
            }
            if matches!(token.value(), Value::Superscript(_) | Value::Subscript(_)) {
                // A script with nothing before it gets an empty base.
                let node = self.parse_scripts(MathNode::empty(MathNodeType::Mrow))?;
                nodes.push(node);
                continue;
            }
            let base = match self.parse_atom()? {
                None => continue,
                Some(node) => node,
            };
            nodes.push(self.parse_scripts(base)?);
        }
        Ok(nodes)
    }

    /// Attach any `^` and `_` scripts to the base node.
    fn parse_scripts(&mut self, base: MathNode) -> Result<MathNode> {
        let mut superscript: Option<MathNode> = None;
        let mut subscript: Option<MathNode> = None;
        loop {
            match self.fetch()? {
                Some(token) if matches!(token.value(), Value::Superscript(_)) => {
                    if superscript.is_some() {
                        return Err(ParseError::new(
                            ErrorKind::UnexpectedToken,
                            "Double superscript",
                        )
                        .at_position(token.position()));
                    }
                    self.consume();
                    superscript = Some(self.parse_script_argument()?);
                }
                Some(token) if matches!(token.value(), Value::Subscript(_)) => {
                    if subscript.is_some() {
                        return Err(ParseError::new(
                            ErrorKind::UnexpectedToken,
                            "Double subscript",
                        )
                        .at_position(token.position()));
                    }
                    self.consume();
                    subscript = Some(self.parse_script_argument()?);
                }
                _ => break,
            }
        }
        Ok(match (subscript, superscript) {
            (None, None) => base,
            (Some(sub), None) => MathNode::new(MathNodeType::Msub, vec![base, sub]),
            (None, Some(sup)) => MathNode::new(MathNodeType::Msup, vec![base, sup]),
            (Some(sub), Some(sup)) => {
                MathNode::new(MathNodeType::Msubsup, vec![base, sub, sup])
            }
        })
    }

    fn parse_script_argument(&mut self) -> Result<MathNode> {
        self.consume_spaces()?;
        let token = match self.fetch()? {
            None => return Err(end_of_input("a superscript or subscript")),
            Some(token) => token,
        };
        if matches!(token.value(), Value::BeginGroup(_)) {
            return self.parse_group();
        }
        match self.parse_atom()? {
            Some(node) => Ok(node),
            None => Err(ParseError::new(
                ErrorKind::UnexpectedToken,
                format!(
                    "Expected a group or symbol, got \"{}\"",
                    self.gullet.token_display(token)
                ),
            )
            .at_position(token.position())),
        }
    }

    /// Parse `{ ... }`, including the braces, into an `<mrow>`.
    fn parse_group(&mut self) -> Result<MathNode> {
        self.consume(); // the {
        let nodes = self.with_group(|parser| {
            let nodes = parser.parse_expression(Stops::default())?;
            parser.expect_end_group()?;
            Ok(nodes)
        })?;
        Ok(MathNode::new(MathNodeType::Mrow, nodes))
    }

    fn expect_end_group(&mut self) -> Result<()> {
        match self.fetch()? {
            Some(token) if matches!(token.value(), Value::EndGroup(_)) => {
                self.consume();
                Ok(())
            }
            Some(token) => Err(ParseError::new(
                ErrorKind::UnexpectedToken,
                format!("Expected }}, got \"{}\"", self.gullet.token_display(token)),
            )
            .at_position(token.position())),
            None => Err(end_of_input("}")),
        }
    }

    /// Parse a required group appearing as math, as in `\textcolor{red}{x}`.
    pub(crate) fn parse_required_group(&mut self) -> Result<Vec<MathNode>> {
        self.consume_spaces()?;
        match self.fetch()? {
            Some(token) if matches!(token.value(), Value::BeginGroup(_)) => {
                self.consume();
                self.with_group(|parser| {
                    let nodes = parser.parse_expression(Stops::default())?;
                    parser.expect_end_group()?;
                    Ok(nodes)
                })
            }
            Some(token) => Err(ParseError::new(
                ErrorKind::UnexpectedToken,
                format!("Expected a group, got \"{}\"", self.gullet.token_display(token)),
            )
            .at_position(token.position())),
            None => Err(end_of_input("a group")),
        }
    }

    /// Read a required group as plain text, as in `\text{...}` or the first
    /// argument of `\textcolor`.
    fn parse_text_group(&mut self) -> Result<String> {
        self.push_back_lookahead();
        let tokens = self.gullet.consume_arg(None)?;
        let mut text = String::new();
        for token in tokens {
            match token.char() {
                Some(c) => text.push(c),
                None => {
                    return Err(ParseError::new(
                        ErrorKind::UnexpectedToken,
                        format!(
                            "Expected plain text, got \"{}\"",
                            self.gullet.token_display(token)
                        ),
                    )
                    .at_position(token.position()))
                }
            }
        }
        Ok(text)
    }

    /// Parse one atom. Returns `None` for tokens that produce no node, such
    /// as spaces and `\relax`.
    fn parse_atom(&mut self) -> Result<Option<MathNode>> {
        let token = match self.fetch()? {
            None => return Ok(None),
            Some(token) => token,
        };
        match token.value() {
            Value::Space(_) => {
                self.consume();
                Ok(None)
            }
            Value::Letter(c) => {
                self.consume();
                Ok(Some(MathNode::text(MathNodeType::Mi, c.to_string())))
            }
            Value::BeginGroup(_) => Ok(Some(self.parse_group()?)),
            Value::Parameter(_) => Err(ParseError::new(
                ErrorKind::UnexpectedToken,
                "Unexpected character: \"#\"",
            )
            .at_position(token.position())),
            Value::Other(c) if c.is_ascii_digit() || c == '.' => {
                Ok(Some(self.parse_number()?))
            }
            Value::Other(c) => {
                self.consume();
                Ok(Some(character_atom(c)))
            }
            Value::ControlSequence(name) => {
                let name = self.cs_str(name);
                self.parse_control_sequence(token, &name)
            }
            // Scripts and stop tokens are handled by the expression loop.
            _ => Ok(None),
        }
    }

    /// Collect a run of digits and decimal points into one `<mn>`.
    fn parse_number(&mut self) -> Result<MathNode> {
        let mut number = String::new();
        while let Some(token) = self.fetch()? {
            match token.value() {
                Value::Other(c) if c.is_ascii_digit() || c == '.' => {
                    number.push(c);
                    self.consume();
                }
                _ => break,
            }
        }
        Ok(MathNode::text(MathNodeType::Mn, number))
    }

    fn parse_control_sequence(&mut self, token: Token, name: &str) -> Result<Option<MathNode>> {
        self.consume();
        match name {
            "begin" => Ok(Some(self.parse_environment()?)),
            "relax" => Ok(None),
            "\\" => {
                let mut node = MathNode::empty(MathNodeType::Mspace);
                node.set_attribute("linebreak", "newline");
                Ok(Some(node))
            }
            " " => Ok(Some(MathNode::text(MathNodeType::Mtext, "\u{a0}"))),
            "env@tag" => {
                // The first tag wins; later tags still consume their
                // argument but are otherwise ignored.
                let body = self.parse_required_group()?;
                if self.pending_tag.is_none() {
                    self.pending_tag = Some(Tag::Tagged(body));
                }
                Ok(None)
            }
            "env@notag" => {
                if self.pending_tag.is_none() {
                    self.pending_tag = Some(Tag::NoTag);
                }
                Ok(None)
            }
            "hline" | "hdashline" => Err(ParseError::new(
                ErrorKind::RuleOutsideArray,
                format!("\\{} valid only within array environment", name),
            )
            .at_position(token.position())),
            "text" => {
                let text = self.parse_text_group()?;
                Ok(Some(MathNode::text(MathNodeType::Mtext, text)))
            }
            "textcolor" => {
                let color = self.parse_text_group()?.trim().to_string();
                let body = self.parse_required_group()?;
                let mut node = MathNode::new(MathNodeType::Mstyle, body);
                node.set_attribute("mathcolor", color);
                Ok(Some(node))
            }
            _ => match builtins::get(name) {
                Some(builtins::Builtin::Identifier(text)) => {
                    Ok(Some(MathNode::text(MathNodeType::Mi, text)))
                }
                Some(builtins::Builtin::Operator(text)) => Ok(Some(operator_atom(text))),
                Some(builtins::Builtin::Space(width)) => {
                    let mut node = MathNode::empty(MathNodeType::Mspace);
                    node.set_attribute("width", em(width));
                    Ok(Some(node))
                }
                None => Err(ParseError::new(
                    ErrorKind::UndefinedMacro,
                    format!("Undefined control sequence: \\{}", name),
                )
                .at_position(token.position())),
            },
        }
    }

    /// Parse `\begin{name}...\end{name}`, with `\begin` already consumed.
    fn parse_environment(&mut self) -> Result<MathNode> {
        let name = self.parse_environment_name()?;
        let spec = match environments::get(&name) {
            None => {
                return Err(ParseError::new(
                    ErrorKind::UndefinedMacro,
                    format!("No such environment: {}", name),
                ))
            }
            Some(spec) => spec,
        };
        let mut args = Vec::with_capacity(spec.num_args);
        for _ in 0..spec.num_args {
            self.push_back_lookahead();
            args.push(self.gullet.consume_arg(None)?);
        }
        let node = (spec.handler)(self, &name, args)?;

        self.consume_spaces()?;
        match self.fetch()? {
            Some(token)
                if token.cs_name().map(|n| self.cs_str(n)).as_deref() == Some("end") =>
            {
                self.consume();
                let end_name = self.parse_environment_name()?;
                if end_name != name {
                    return Err(ParseError::new(
                        ErrorKind::UnexpectedToken,
                        format!(
                            "Mismatch: \\begin{{{}}} matched by \\end{{{}}}",
                            name, end_name
                        ),
                    ));
                }
                Ok(node)
            }
            Some(token) => Err(ParseError::new(
                ErrorKind::UnexpectedToken,
                format!("Expected \\end, got \"{}\"", self.gullet.token_display(token)),
            )
            .at_position(token.position())),
            None => Err(end_of_input(&format!("\\end{{{}}}", name))),
        }
    }

    fn parse_environment_name(&mut self) -> Result<String> {
        self.push_back_lookahead();
        self.gullet.consume_spaces()?;
        let tokens = self.gullet.consume_arg(None)?;
        let mut name = String::new();
        for token in tokens {
            match token.char() {
                Some(c) if c.is_ascii_alphanumeric() || c == '*' => name.push(c),
                _ => {
                    return Err(ParseError::new(
                        ErrorKind::UnexpectedToken,
                        "Invalid environment name",
                    )
                    .at_position(token.position()))
                }
            }
        }
        if name.is_empty() {
            return Err(ParseError::new(
                ErrorKind::UnexpectedToken,
                "Invalid environment name",
            ));
        }
        Ok(name)
    }
}

/// Build the node for an ordinary character.
fn character_atom(c: char) -> MathNode {
    match c {
        '~' => {
            let mut node = MathNode::text(MathNodeType::Mtext, "\u{a0}");
            node.set_attribute("linebreak", "nobreak");
            node
        }
        ',' | ';' => {
            let mut node = MathNode::text(MathNodeType::Mo, c.to_string());
            node.set_attribute("separator", "true");
            node
        }
        '(' | '[' => {
            let mut node = MathNode::text(MathNodeType::Mo, c.to_string());
            node.set_attribute("form", "prefix");
            node
        }
        ')' | ']' => {
            let mut node = MathNode::text(MathNodeType::Mo, c.to_string());
            node.set_attribute("form", "postfix");
            node
        }
        // TeX sources write the hyphen-minus; math uses the minus sign.
        '-' => MathNode::text(MathNodeType::Mo, "−"),
        '\'' => MathNode::text(MathNodeType::Mo, "′"),
        _ => MathNode::text(MathNodeType::Mo, c.to_string()),
    }
}

/// Build an `<mo>` for a named operator, with form attributes on the
/// delimiters that always open or close.
fn operator_atom(text: &str) -> MathNode {
    let mut node = MathNode::text(MathNodeType::Mo, text);
    match text {
        "⟨" => node.set_attribute("form", "prefix"),
        "⟩" => node.set_attribute("form", "postfix"),
        _ => (),
    }
    node
}

#[cfg(test)]
mod tests {
    use crate::parse_failure_test;
    use crate::error::ErrorKind;
    use crate::Settings;

    fn markup(input: &str) -> String {
        let settings = Settings::default();
        let nodes = crate::parse(input, &settings).expect("parse failed");
        nodes.iter().map(|n| n.to_markup()).collect()
    }

    #[test]
    fn letters_and_operator() {
        assert_eq!(markup("a+b"), "<mi>a</mi><mo>+</mo><mi>b</mi>");
    }

    #[test]
    fn number_run_is_one_mn() {
        assert_eq!(markup("12.5x"), "<mn>12.5</mn><mi>x</mi>");
    }

    #[test]
    fn minus_becomes_minus_sign() {
        assert_eq!(markup("-x"), "<mo>−</mo><mi>x</mi>");
    }

    #[test]
    fn greek_letter() {
        assert_eq!(markup(r"\alpha"), "<mi>α</mi>");
    }

    #[test]
    fn named_operator() {
        assert_eq!(markup(r"a\pm b"), "<mi>a</mi><mo>±</mo><mi>b</mi>");
    }

    #[test]
    fn group_becomes_mrow() {
        assert_eq!(markup("{ab}"), "<mrow><mi>a</mi><mi>b</mi></mrow>");
    }

    #[test]
    fn subscript() {
        assert_eq!(markup("x_1"), "<msub><mi>x</mi><mn>1</mn></msub>");
    }

    #[test]
    fn superscript_with_group() {
        assert_eq!(
            markup("x^{ab}"),
            "<msup><mi>x</mi><mrow><mi>a</mi><mi>b</mi></mrow></msup>"
        );
    }

    #[test]
    fn subsup_in_either_order() {
        assert_eq!(
            markup("x_1^2"),
            "<msubsup><mi>x</mi><mn>1</mn><mn>2</mn></msubsup>"
        );
        assert_eq!(markup("x^2_1"), markup("x_1^2"));
    }

    #[test]
    fn spacing_command() {
        assert_eq!(markup(r"\quad"), "<mspace width=\"1em\"></mspace>");
        assert_eq!(markup(r"\,"), "<mspace width=\"0.1667em\"></mspace>");
    }

    #[test]
    fn tilde_is_nobreak_space() {
        assert_eq!(
            markup("~"),
            "<mtext linebreak=\"nobreak\">\u{a0}</mtext>"
        );
    }

    #[test]
    fn hard_break() {
        assert_eq!(
            markup(r"a\\b"),
            "<mi>a</mi><mspace linebreak=\"newline\"></mspace><mi>b</mi>"
        );
    }

    #[test]
    fn comma_is_separator() {
        assert_eq!(markup("a,b"), "<mi>a</mi><mo separator=\"true\">,</mo><mi>b</mi>");
    }

    #[test]
    fn textcolor_wraps_in_mstyle() {
        assert_eq!(
            markup(r"\textcolor{red}{ab}"),
            "<mstyle mathcolor=\"red\"><mi>a</mi><mi>b</mi></mstyle>"
        );
    }

    #[test]
    fn text_command() {
        assert_eq!(markup(r"\text{iff}"), "<mtext>iff</mtext>");
    }

    #[test]
    fn user_macro_feeds_parser() {
        assert_eq!(markup(r"\def\half{12}\half"), "<mn>12</mn>");
    }

    #[test]
    fn warnings_start_empty() {
        let settings = Settings::default();
        let mut parser = super::Parser::new("a", &settings);
        parser.parse().unwrap();
        assert!(parser.warnings().is_empty());
    }

    parse_failure_test![
        undefined_control_sequence,
        r"\nosuchthing",
        ErrorKind::UndefinedMacro
    ];
    parse_failure_test![double_superscript, "x^1^2", ErrorKind::UnexpectedToken];
    parse_failure_test![misplaced_hash, "#", ErrorKind::UnexpectedToken];
    parse_failure_test![
        stray_alignment_tab,
        "a&b",
        ErrorKind::UnexpectedToken,
        inline
    ];
    parse_failure_test![
        unmatched_close_brace,
        "a}",
        ErrorKind::UnexpectedToken,
        inline
    ];
    parse_failure_test![
        hline_outside_array,
        r"\hline",
        ErrorKind::RuleOutsideArray
    ];
    parse_failure_test![
        unknown_environment,
        r"\begin{nosuchenv}x\end{nosuchenv}",
        ErrorKind::UndefinedMacro
    ];
    parse_failure_test![
        environment_name_mismatch,
        r"\begin{matrix}x\end{pmatrix}",
        ErrorKind::UnexpectedToken
    ];
}
