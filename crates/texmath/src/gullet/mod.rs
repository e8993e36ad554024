//! The gullet, where macro expansion happens.
//!
//! The gullet sits between the lexer and the parser. The parser reads tokens
//! from the gullet, and every token it receives has already been fully
//! expanded: user macros have been replaced by their replacement text, and
//! the macro definition commands (`\def`, `\edef`, `\let`, `\futurelet` and
//! the `\newcommand` family) have been executed.
//!
//! The gullet also owns an explicit pushback stack. Tokens produced by an
//! expansion, or returned by the parser after a lookahead, are pushed onto
//! the stack and are read again before anything further from the lexer.

pub mod map;

use std::collections::HashMap;
use std::rc::Rc;

use crate::error::end_of_input;
use crate::error::ErrorKind;
use crate::error::ParseError;
use crate::error::Result;
use crate::texmacro::MacroDef;
use crate::token::lexer::Lexer;
use crate::token::CsName;
use crate::token::CsNameInterner;
use crate::token::Token;
use crate::token::Value;
use map::MacroMap;

/// The macro definition commands the gullet executes itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Primitive {
    Def,
    Edef,
    Let,
    FutureLet,
    Newcommand,
    Renewcommand,
    Providecommand,
}

const PRIMITIVE_NAMES: [(&str, Primitive); 7] = [
    ("def", Primitive::Def),
    ("edef", Primitive::Edef),
    ("let", Primitive::Let),
    ("futurelet", Primitive::FutureLet),
    ("newcommand", Primitive::Newcommand),
    ("renewcommand", Primitive::Renewcommand),
    ("providecommand", Primitive::Providecommand),
];

/// The gullet.
pub struct Gullet {
    lexer: Lexer,
    stack: Vec<Token>,
    interner: CsNameInterner,
    macros: MacroMap,
    primitives: HashMap<CsName, Primitive>,
    /// Tells whether a control sequence name has a built-in meaning in the
    /// parser. The gullet needs this to diagnose undefined control sequences
    /// during `\edef` expansion.
    is_builtin: fn(&str) -> bool,
    expansion_count: usize,
    max_expand: usize,
}

impl Gullet {
    pub fn new(source: &str, max_expand: usize, is_builtin: fn(&str) -> bool) -> Gullet {
        let mut interner = CsNameInterner::new();
        let mut primitives = HashMap::new();
        for (name, primitive) in PRIMITIVE_NAMES {
            primitives.insert(interner.get_or_intern(name), primitive);
        }
        Gullet {
            lexer: Lexer::new(source),
            stack: Vec::new(),
            interner,
            macros: MacroMap::new(),
            primitives,
            is_builtin,
            expansion_count: 0,
            max_expand,
        }
    }

    #[inline]
    pub fn interner(&self) -> &CsNameInterner {
        &self.interner
    }

    #[inline]
    pub fn interner_mut(&mut self) -> &mut CsNameInterner {
        &mut self.interner
    }

    /// Render a token for an error message.
    pub fn token_display(&self, token: Token) -> String {
        match token.value() {
            Value::ControlSequence(name) => {
                format!("\\{}", self.interner.resolve(name).unwrap_or("?"))
            }
            _ => token.char().unwrap().to_string(),
        }
    }

    /// Pop the next token without expanding it.
    pub fn pop_token(&mut self) -> Result<Option<Token>> {
        match self.stack.pop() {
            Some(token) => Ok(Some(token)),
            None => self.lexer.next(&mut self.interner),
        }
    }

    fn pop_token_expecting(&mut self, expected: &str) -> Result<Token> {
        match self.pop_token()? {
            None => Err(end_of_input(expected)),
            Some(token) => Ok(token),
        }
    }

    /// Peek at the next unexpanded token.
    pub fn future(&mut self) -> Result<Option<Token>> {
        if self.stack.is_empty() {
            match self.lexer.next(&mut self.interner)? {
                None => return Ok(None),
                Some(token) => self.stack.push(token),
            }
        }
        Ok(self.stack.last().copied())
    }

    /// Push a token back; it will be the next token read.
    #[inline]
    pub fn push_token(&mut self, token: Token) {
        self.stack.push(token);
    }

    /// Push a sequence of tokens back, in reading order.
    pub fn push_tokens(&mut self, tokens: Vec<Token>) {
        self.stack.extend(tokens.into_iter().rev());
    }

    pub fn consume_spaces(&mut self) -> Result<()> {
        while let Some(token) = self.future()? {
            if !matches!(token.value(), Value::Space(_)) {
                break;
            }
            self.stack.pop();
        }
        Ok(())
    }

    pub fn begin_group(&mut self) {
        self.macros.begin_group();
    }

    pub fn end_group(&mut self) -> bool {
        self.macros.end_group()
    }

    #[inline]
    pub fn group_depth(&self) -> usize {
        self.macros.group_depth()
    }

    /// Tells whether a name currently has any meaning: a user macro, one of
    /// the definition commands, or a built-in.
    pub fn is_defined(&self, name: CsName) -> bool {
        self.macros.is_defined(name)
            || self.primitives.contains_key(&name)
            || self.is_builtin_name(name)
    }

    fn is_builtin_name(&self, name: CsName) -> bool {
        match self.interner.resolve(name) {
            None => false,
            Some(name) => (self.is_builtin)(name),
        }
    }

    /// Define a macro from source text, bypassing the input stream. The
    /// parser uses this for environment-local bindings such as `\cr`.
    pub fn set_text_macro(&mut self, name: &str, replacement: &str, num_args: usize) -> Result<()> {
        let name = self.interner.get_or_intern(name);
        let mut lexer = Lexer::new(replacement);
        let mut tokens = Vec::new();
        while let Some(token) = lexer.next(&mut self.interner)? {
            tokens.push(token);
        }
        let replacement = MacroDef::parse_replacement(tokens, num_args)?;
        self.macros
            .insert(name, Rc::new(MacroDef::new(num_args, None, replacement)));
        Ok(())
    }

    /// Fully expand the named macro, off to the side of the input stream,
    /// and return the result as text. Returns `None` if no macro with this
    /// name is defined.
    pub fn expand_macro_as_text(&mut self, name: &str) -> Result<Option<String>> {
        let name = match self.interner.get(name) {
            None => return Ok(None),
            Some(name) => name,
        };
        if !self.macros.is_defined(name) {
            return Ok(None);
        }
        let token = Token::new_control_sequence(name, 0);
        let tokens = self.expand_tokens(vec![token])?;
        Ok(Some(crate::token::write_tokens(&tokens, &self.interner)))
    }

    /// Pop the next fully expanded token.
    ///
    /// Macro invocations are expanded in place and definition commands are
    /// executed; the first token with no expandable meaning is returned.
    pub fn expand_next(&mut self) -> Result<Option<Token>> {
        loop {
            let token = match self.pop_token()? {
                None => return Ok(None),
                Some(token) => token,
            };
            if let Value::ControlSequence(name) = token.value() {
                if !token.noexpand() {
                    if let Some(def) = self.macros.get(name).cloned() {
                        self.expand_macro(&def, token)?;
                        continue;
                    }
                }
                // The noexpand flag freezes macro lookup only; a frozen
                // \def token still acts as \def.
                if let Some(&primitive) = self.primitives.get(&name) {
                    self.execute_primitive(primitive)?;
                    continue;
                }
            }
            return Ok(Some(token));
        }
    }

    /// Peek at the next fully expanded token.
    pub fn future_expanded(&mut self) -> Result<Option<Token>> {
        match self.expand_next()? {
            None => Ok(None),
            Some(token) => {
                self.stack.push(token);
                Ok(Some(token))
            }
        }
    }

    /// Expand the provided tokens as far as possible without reading past
    /// them, leaving alone tokens with no expandable meaning. This is the
    /// expansion the body of an `\edef` receives.
    pub fn expand_tokens(&mut self, tokens: Vec<Token>) -> Result<Vec<Token>> {
        let mut output = Vec::new();
        let base_depth = self.stack.len();
        self.push_tokens(tokens);
        while self.stack.len() > base_depth {
            let token = match self.stack.pop() {
                None => break,
                Some(token) => token,
            };
            if let Value::ControlSequence(name) = token.value() {
                if !token.noexpand() {
                    if let Some(def) = self.macros.get(name).cloned() {
                        if !def.unexpandable() {
                            self.expand_macro(&def, token)?;
                            continue;
                        }
                        output.push(token);
                        continue;
                    }
                }
                if !token.noexpand()
                    && !self.primitives.contains_key(&name)
                    && !self.is_builtin_name(name)
                {
                    return Err(ParseError::new(
                        ErrorKind::UndefinedMacro,
                        format!(
                            "Undefined control sequence: {}",
                            self.token_display(token)
                        ),
                    )
                    .at_position(token.position()));
                }
            }
            output.push(token);
        }
        Ok(output)
    }

    fn count_expansion(&mut self) -> Result<()> {
        self.expansion_count += 1;
        if self.expansion_count > self.max_expand {
            return Err(ParseError::new(
                ErrorKind::TooManyExpansions,
                "Too many expansions: infinite loop or need to increase maxExpand setting",
            ));
        }
        Ok(())
    }

    fn expand_macro(&mut self, def: &MacroDef, invocation: Token) -> Result<()> {
        self.count_expansion()?;
        let args = self.consume_args(def, invocation)?;
        self.push_tokens(def.perform_replacement(&args));
        Ok(())
    }

    fn consume_args(&mut self, def: &MacroDef, invocation: Token) -> Result<Vec<Vec<Token>>> {
        let mut args = Vec::with_capacity(def.num_args());
        match def.delimiters() {
            Some(delimiters) => {
                for expected in &delimiters[0] {
                    let token = self.pop_token_expecting("a macro argument")?;
                    if token != *expected {
                        return Err(ParseError::new(
                            ErrorKind::UnexpectedToken,
                            format!(
                                "Use of {} doesn't match its definition",
                                self.token_display(invocation)
                            ),
                        )
                        .at_position(token.position()));
                    }
                }
                for i in 0..def.num_args() {
                    args.push(self.consume_arg(Some(&delimiters[i + 1]))?);
                }
            }
            None => {
                for _ in 0..def.num_args() {
                    args.push(self.consume_arg(None)?);
                }
            }
        }
        Ok(args)
    }

    /// Consume a single macro argument.
    ///
    /// An undelimited argument is the next token, or the next balanced group
    /// with the outer braces stripped; spaces before it are skipped. A
    /// delimited argument runs until the delimiter tokens appear at group
    /// depth zero; a delimiter ending in `{` matches at depth one, which
    /// implements the `#{` form of `\def`.
    pub fn consume_arg(&mut self, delimiter: Option<&[Token]>) -> Result<Vec<Token>> {
        let delimiter = match delimiter {
            Some(d) if !d.is_empty() => Some(d),
            _ => None,
        };
        if delimiter.is_none() {
            self.consume_spaces()?;
        }
        let mut tokens: Vec<Token> = Vec::new();
        let mut depth = 0i32;
        let mut matched = 0usize;
        loop {
            let token = match self.pop_token()? {
                None => {
                    return Err(ParseError::new(
                        ErrorKind::EndOfInput,
                        "Unexpected end of input in a macro argument",
                    ))
                }
                Some(token) => token,
            };
            tokens.push(token);
            match token.value() {
                Value::BeginGroup(_) => depth += 1,
                Value::EndGroup(_) => {
                    depth -= 1;
                    if depth == -1 {
                        return Err(ParseError::new(ErrorKind::UnexpectedToken, "Extra }")
                            .at_position(token.position()));
                    }
                }
                _ => (),
            }
            if let Some(delimiter) = delimiter {
                let expected = delimiter[matched];
                let at_delimiter_depth = depth == 0
                    || (depth == 1 && matches!(expected.value(), Value::BeginGroup(_)));
                if at_delimiter_depth && token == expected {
                    matched += 1;
                    if matched == delimiter.len() {
                        tokens.truncate(tokens.len() - matched);
                        break;
                    }
                } else {
                    matched = 0;
                }
            } else if depth == 0 {
                break;
            }
        }
        // Strip the outer braces from an argument that is a group.
        if tokens.len() >= 2
            && matches!(tokens.first().unwrap().value(), Value::BeginGroup(_))
            && matches!(tokens.last().unwrap().value(), Value::EndGroup(_))
        {
            tokens.pop();
            tokens.remove(0);
        }
        Ok(tokens)
    }

    fn execute_primitive(&mut self, primitive: Primitive) -> Result<()> {
        match primitive {
            Primitive::Def => self.execute_def(false),
            Primitive::Edef => self.execute_def(true),
            Primitive::Let => self.execute_let(),
            Primitive::FutureLet => self.execute_futurelet(),
            Primitive::Newcommand => self.execute_newcommand(Primitive::Newcommand),
            Primitive::Renewcommand => self.execute_newcommand(Primitive::Renewcommand),
            Primitive::Providecommand => self.execute_newcommand(Primitive::Providecommand),
        }
    }

    /// The target of an assignment must be a control sequence token.
    fn control_sequence_target(&self, token: Token) -> Result<CsName> {
        match token.cs_name() {
            Some(name) => Ok(name),
            None => Err(ParseError::new(
                ErrorKind::MalformedControlSequence,
                "Expected a control sequence",
            )
            .at_position(token.position())),
        }
    }

    fn execute_def(&mut self, expand_replacement: bool) -> Result<()> {
        let target = self.pop_token_expecting("a control sequence")?;
        let name = self.control_sequence_target(target)?;

        // The parameter text runs up to the opening brace of the replacement
        // text and contains no braces, except that a trailing `#` stands for
        // a `{` delimiter that also ends the replacement.
        let mut num_args: usize = 0;
        let mut delimiters: Vec<Vec<Token>> = vec![Vec::new()];
        let mut insert: Option<Token> = None;
        loop {
            let next = match self.future()? {
                None => return Err(end_of_input("a macro definition")),
                Some(next) => next,
            };
            if matches!(next.value(), Value::BeginGroup(_)) {
                break;
            }
            let token = self.pop_token_expecting("a macro definition")?;
            if !matches!(token.value(), Value::Parameter(_)) {
                delimiters[num_args].push(token);
                continue;
            }
            match self.future()? {
                None => return Err(end_of_input("a macro definition")),
                Some(next) if matches!(next.value(), Value::BeginGroup(_)) => {
                    insert = Some(next);
                    delimiters[num_args].push(next);
                    break;
                }
                _ => (),
            }
            let digit_token = self.pop_token_expecting("an argument number")?;
            match digit_token.char().and_then(|c| c.to_digit(10)) {
                Some(digit) if (1..=9).contains(&digit) => {
                    if digit as usize != num_args + 1 {
                        return Err(ParseError::new(
                            ErrorKind::ArgumentOutOfOrder,
                            format!("Argument number \"{}\" out of order", digit),
                        )
                        .at_position(digit_token.position()));
                    }
                    num_args += 1;
                    delimiters.push(Vec::new());
                }
                _ => {
                    return Err(ParseError::new(
                        ErrorKind::InvalidArgumentNumber,
                        format!(
                            "Invalid argument number \"{}\"",
                            self.token_display(digit_token)
                        ),
                    )
                    .at_position(digit_token.position()))
                }
            }
        }

        let mut tokens = self.consume_arg(None)?;
        if let Some(insert) = insert {
            // Behave as if `{` had been inserted at the right end of the
            // replacement text.
            tokens.push(insert);
        }
        if expand_replacement {
            tokens = self.expand_tokens(tokens)?;
        }

        let delimiters = if delimiters.iter().any(|d| !d.is_empty()) {
            Some(delimiters)
        } else {
            None
        };
        let replacement = MacroDef::parse_replacement(tokens, num_args)?;
        self.macros
            .insert(name, Rc::new(MacroDef::new(num_args, delimiters, replacement)));
        Ok(())
    }

    /// Read the right-hand side of a `\let`: an optional `=`, then one
    /// optional space, then the aliased token.
    fn let_rhs(&mut self) -> Result<Token> {
        let mut token = self.pop_token_expecting("a token to alias")?;
        if token.char() == Some('=') && matches!(token.value(), Value::Other(_)) {
            token = self.pop_token_expecting("a token to alias")?;
            if matches!(token.value(), Value::Space(_)) {
                token = self.pop_token_expecting("a token to alias")?;
            }
        }
        Ok(token)
    }

    fn alias(&mut self, name: CsName, token: Token) {
        let existing = token.cs_name().and_then(|n| self.macros.get(n)).cloned();
        match existing {
            // Share the definition: the alias keeps this meaning even if the
            // original name is redefined later.
            Some(def) => self.macros.insert(name, def),
            None => {
                let expandable = match token.cs_name() {
                    Some(n) => !self.primitives.contains_key(&n) && self.is_builtin_name(n),
                    None => false,
                };
                self.macros
                    .insert(name, Rc::new(MacroDef::new_alias(token, expandable)));
            }
        }
    }

    fn execute_let(&mut self) -> Result<()> {
        let target = self.pop_token_expecting("a control sequence")?;
        let name = self.control_sequence_target(target)?;
        self.consume_spaces()?;
        let token = self.let_rhs()?;
        self.alias(name, token);
        Ok(())
    }

    fn execute_futurelet(&mut self) -> Result<()> {
        let target = self.pop_token_expecting("a control sequence")?;
        let name = self.control_sequence_target(target)?;
        let middle = self.pop_token_expecting("a token")?;
        let token = self.pop_token_expecting("a token")?;
        self.alias(name, token);
        self.push_token(token);
        self.push_token(middle);
        Ok(())
    }

    fn execute_newcommand(&mut self, variant: Primitive) -> Result<()> {
        let first = self.pop_token_expecting("a control sequence")?;
        let name = if matches!(first.value(), Value::BeginGroup(_)) {
            let target = self.pop_token_expecting("a control sequence")?;
            let name = self.control_sequence_target(target)?;
            let close = self.pop_token_expecting("}")?;
            if !matches!(close.value(), Value::EndGroup(_)) {
                return Err(ParseError::new(
                    ErrorKind::UnexpectedToken,
                    format!("Invalid argument \"{}\"", self.token_display(close)),
                )
                .at_position(close.position()));
            }
            name
        } else {
            self.control_sequence_target(first)?
        };

        let exists = self.is_defined(name);
        let name_str = self.interner.resolve(name).unwrap_or("?").to_string();
        if exists && variant == Primitive::Newcommand {
            return Err(ParseError::new(
                ErrorKind::RedefinitionConflict,
                format!(
                    "\\newcommand{{\\{0}}} attempting to redefine \\{0}; use \\renewcommand",
                    name_str
                ),
            ));
        }
        if !exists && variant == Primitive::Renewcommand {
            return Err(ParseError::new(
                ErrorKind::UndefinedMacro,
                format!(
                    "\\renewcommand{{\\{0}}} when command \\{0} does not yet exist; use \\newcommand",
                    name_str
                ),
            ));
        }

        let mut num_args: usize = 0;
        if matches!(self.future()?, Some(token) if token.char() == Some('[')) {
            self.pop_token()?;
            let digit_token = self.pop_token_expecting("a number of arguments")?;
            num_args = match digit_token.char().and_then(|c| c.to_digit(10)) {
                Some(digit) => digit as usize,
                None => {
                    return Err(ParseError::new(
                        ErrorKind::InvalidNumberOfArguments,
                        format!(
                            "Invalid number of arguments: \"{}\"",
                            self.token_display(digit_token)
                        ),
                    )
                    .at_position(digit_token.position()))
                }
            };
            let close = self.pop_token_expecting("]")?;
            if close.char() != Some(']') {
                return Err(ParseError::new(
                    ErrorKind::InvalidNumberOfArguments,
                    format!(
                        "Invalid number of arguments: \"{}\"",
                        self.token_display(close)
                    ),
                )
                .at_position(close.position()));
            }
        }

        let tokens = self.consume_arg(None)?;
        let replacement = MacroDef::parse_replacement(tokens, num_args)?;
        self.macros
            .insert(name, Rc::new(MacroDef::new(num_args, None, replacement)));
        Ok(())
    }
}
