//! The environment registry.
//!
//! The set of environments is closed: `\begin{name}` looks the name up here
//! and nothing can extend the table at runtime.

use mathml::{MathNode, MathNodeType};

use crate::error::ErrorKind;
use crate::error::ParseError;
use crate::error::Result;
use crate::token::Token;

use super::array::{
    build_array, parse_array, ArrayConfig, ColDescriptor, ColSeparation, ScriptLevel,
};
use super::cd;
use super::Parser;
use crate::token::Value;

pub type Handler = fn(&mut Parser, &str, Vec<Vec<Token>>) -> Result<MathNode>;

pub struct EnvSpec {
    pub num_args: usize,
    pub handler: Handler,
}

/// Look up an environment by name.
pub fn get(name: &str) -> Option<EnvSpec> {
    let spec = |num_args: usize, handler: Handler| EnvSpec { num_args, handler };
    Some(match name {
        "array" | "darray" => spec(1, array_handler),
        "matrix" | "pmatrix" | "bmatrix" | "Bmatrix" | "vmatrix" | "Vmatrix" | "matrix*"
        | "pmatrix*" | "bmatrix*" | "Bmatrix*" | "vmatrix*" | "Vmatrix*" => {
            spec(0, matrix_handler)
        }
        "smallmatrix" => spec(0, smallmatrix_handler),
        "subarray" => spec(1, subarray_handler),
        "cases" | "dcases" | "rcases" | "drcases" => spec(0, cases_handler),
        "align" | "align*" | "aligned" | "split" => spec(0, aligned_handler),
        "alignat" | "alignat*" | "alignedat" => spec(1, aligned_handler),
        "gather" | "gather*" | "gathered" => spec(0, gather_handler),
        "equation" | "equation*" => spec(0, equation_handler),
        "multline" | "multline*" => spec(0, multline_handler),
        "CD" => spec(0, cd_handler),
        _ => return None,
    })
}

fn require_display_mode(parser: &Parser, name: &str) -> Result<()> {
    if !parser.settings().display_mode {
        return Err(ParseError::new(
            ErrorKind::DisplayModeRequired,
            format!("{{{}}} can be used only in display mode.", name),
        ));
    }
    Ok(())
}

/// Cells in environments named with a leading `d` are set in display style.
fn d_cell_style(name: &str) -> ScriptLevel {
    if name.starts_with('d') {
        ScriptLevel::Display
    } else {
        ScriptLevel::Text
    }
}

/// Turn a column specification such as `c|l` into column descriptors.
fn parse_col_descriptors(
    parser: &Parser,
    tokens: &[Token],
    allowed: &str,
    allow_separators: bool,
) -> Result<Vec<ColDescriptor>> {
    let mut cols = Vec::new();
    for token in tokens {
        if matches!(token.value(), Value::Space(_)) {
            continue;
        }
        match token.char() {
            Some(c) if allowed.contains(c) => cols.push(ColDescriptor::Align(c)),
            Some(c @ ('|' | ':')) if allow_separators => cols.push(ColDescriptor::Separator(c)),
            _ => {
                return Err(ParseError::new(
                    ErrorKind::UnknownColumnAlignment,
                    format!(
                        "Unknown column alignment: {}",
                        parser.gullet().token_display(*token)
                    ),
                )
                .at_position(token.position()))
            }
        }
    }
    Ok(cols)
}

fn array_handler(parser: &mut Parser, name: &str, args: Vec<Vec<Token>>) -> Result<MathNode> {
    let cols = parse_col_descriptors(parser, &args[0], "lcr", true)?;
    let cfg = ArrayConfig {
        hskip_before_and_after: true,
        add_jot: false,
        max_num_cols: Some(cols.len()),
        cols,
        arraystretch: None,
        col_separation: ColSeparation::Array,
        add_eqn_num: false,
        single_row: false,
        empty_single_row: false,
        script_level: d_cell_style(name),
    };
    let parsed = parse_array(parser, &cfg)?;
    Ok(build_array(parsed, &cfg, parser.settings()))
}

fn matrix_handler(parser: &mut Parser, name: &str, _args: Vec<Vec<Token>>) -> Result<MathNode> {
    let delimiters = match name.trim_end_matches('*') {
        "pmatrix" => Some(("(", ")")),
        "bmatrix" => Some(("[", "]")),
        "Bmatrix" => Some(("{", "}")),
        "vmatrix" => Some(("|", "|")),
        "Vmatrix" => Some(("‖", "‖")),
        _ => None,
    };

    let mut col_align = 'c';
    if name.ends_with('*') {
        // The starred mathtools variants take an optional [l|c|r].
        parser.consume_spaces()?;
        if matches!(parser.fetch()?, Some(t) if t.char() == Some('[')) {
            parser.consume();
            parser.consume_spaces()?;
            match parser.fetch()? {
                Some(token) if matches!(token.char(), Some('l' | 'c' | 'r')) => {
                    col_align = token.char().unwrap();
                    parser.consume();
                }
                Some(token) => {
                    return Err(ParseError::new(
                        ErrorKind::UnknownColumnAlignment,
                        "Expected l or c or r",
                    )
                    .at_position(token.position()))
                }
                None => return Err(crate::error::end_of_input("l or c or r")),
            }
            parser.consume_spaces()?;
            match parser.fetch()? {
                Some(token) if token.char() == Some(']') => parser.consume(),
                _ => {
                    return Err(ParseError::new(
                        ErrorKind::UnexpectedToken,
                        "Expected ] after the matrix alignment",
                    ))
                }
            }
        }
    }

    let mut cfg = ArrayConfig {
        hskip_before_and_after: false,
        add_jot: false,
        cols: vec![ColDescriptor::Align(col_align)],
        arraystretch: None,
        col_separation: ColSeparation::Matrix,
        add_eqn_num: false,
        single_row: false,
        empty_single_row: false,
        max_num_cols: None,
        script_level: ScriptLevel::Text,
    };
    let parsed = parse_array(parser, &cfg)?;
    // One alignment entry per column, however many columns showed up.
    let num_cols = parsed.body.iter().map(Vec::len).max().unwrap_or(0);
    cfg.cols = vec![ColDescriptor::Align(col_align); num_cols];
    let table = build_array(parsed, &cfg, parser.settings());

    Ok(match delimiters {
        None => table,
        Some((left, right)) => fenced(left, right, table),
    })
}

/// Wrap a table in stretchy fence delimiters. An empty delimiter string
/// stands for `.`: no fence on that side.
fn fenced(left: &str, right: &str, table: MathNode) -> MathNode {
    let mut children = Vec::with_capacity(3);
    if !left.is_empty() {
        let mut mo = MathNode::text(MathNodeType::Mo, left);
        mo.set_attribute("fence", "true");
        mo.set_attribute("stretchy", "true");
        mo.set_attribute("form", "prefix");
        children.push(mo);
    }
    children.push(table);
    if !right.is_empty() {
        let mut mo = MathNode::text(MathNodeType::Mo, right);
        mo.set_attribute("fence", "true");
        mo.set_attribute("stretchy", "true");
        mo.set_attribute("form", "postfix");
        children.push(mo);
    }
    MathNode::new(MathNodeType::Mrow, children)
}

fn smallmatrix_handler(parser: &mut Parser, _name: &str, _args: Vec<Vec<Token>>) -> Result<MathNode> {
    let cfg = ArrayConfig {
        hskip_before_and_after: false,
        add_jot: false,
        cols: Vec::new(),
        arraystretch: Some(0.5),
        col_separation: ColSeparation::Small,
        add_eqn_num: false,
        single_row: false,
        empty_single_row: false,
        max_num_cols: None,
        script_level: ScriptLevel::Script,
    };
    let parsed = parse_array(parser, &cfg)?;
    Ok(build_array(parsed, &cfg, parser.settings()))
}

fn subarray_handler(parser: &mut Parser, _name: &str, args: Vec<Vec<Token>>) -> Result<MathNode> {
    // {subarray} recognizes only "l" and "c", and only one column.
    let cols = parse_col_descriptors(parser, &args[0], "lc", false)?;
    if cols.len() > 1 {
        return Err(ParseError::new(
            ErrorKind::SingleColumnOnly,
            "{subarray} can contain only one column",
        ));
    }
    let cfg = ArrayConfig {
        hskip_before_and_after: false,
        add_jot: false,
        cols,
        arraystretch: Some(0.0),
        col_separation: ColSeparation::Array,
        add_eqn_num: false,
        single_row: false,
        empty_single_row: false,
        max_num_cols: None,
        script_level: ScriptLevel::Script,
    };
    let parsed = parse_array(parser, &cfg)?;
    if parsed.body.iter().any(|row| row.len() > 1) {
        return Err(ParseError::new(
            ErrorKind::SingleColumnOnly,
            "{subarray} can contain only one column",
        ));
    }
    Ok(build_array(parsed, &cfg, parser.settings()))
}

fn cases_handler(parser: &mut Parser, name: &str, _args: Vec<Vec<Token>>) -> Result<MathNode> {
    let cfg = ArrayConfig {
        hskip_before_and_after: false,
        add_jot: false,
        cols: vec![ColDescriptor::Align('l'), ColDescriptor::Align('l')],
        arraystretch: None,
        col_separation: ColSeparation::Cases,
        add_eqn_num: false,
        single_row: false,
        empty_single_row: false,
        max_num_cols: None,
        script_level: d_cell_style(name),
    };
    let parsed = parse_array(parser, &cfg)?;
    let table = build_array(parsed, &cfg, parser.settings());
    // {rcases} and {drcases} put the brace on the right.
    Ok(if name.contains('r') {
        fenced("", "}", table)
    } else {
        fenced("{", "", table)
    })
}

fn aligned_handler(parser: &mut Parser, name: &str, args: Vec<Vec<Token>>) -> Result<MathNode> {
    // The non-"-ed" variants are top-level display environments.
    if !name.contains("ed") {
        require_display_mode(parser, name)?;
    }
    let mut cfg = ArrayConfig {
        hskip_before_and_after: false,
        add_jot: true,
        cols: Vec::new(),
        arraystretch: None,
        col_separation: if name == "split" {
            ColSeparation::Split
        } else {
            ColSeparation::Align
        },
        add_eqn_num: name == "align" || name == "alignat",
        single_row: false,
        empty_single_row: true,
        max_num_cols: if name == "split" { Some(2) } else { None },
        script_level: ScriptLevel::Display,
    };
    let parsed = parse_array(parser, &cfg)?;

    // With an explicit column-count argument, each row is limited to that
    // many alignment pairs; otherwise the widest row decides.
    let num_maths: Option<usize> = match args.first() {
        None => None,
        Some(tokens) => {
            let mut digits = String::new();
            for token in tokens {
                match token.char() {
                    Some(c) if c.is_ascii_digit() => digits.push(c),
                    Some(c) if c.is_whitespace() => (),
                    _ => {
                        return Err(ParseError::new(
                            ErrorKind::UnexpectedToken,
                            format!("Invalid number of columns: \"{}\"", digits),
                        ))
                    }
                }
            }
            match digits.parse::<usize>() {
                Ok(n) => Some(n),
                Err(_) => {
                    return Err(ParseError::new(
                        ErrorKind::UnexpectedToken,
                        format!("Invalid number of columns: \"{}\"", digits),
                    ))
                }
            }
        }
    };
    let mut num_cols = num_maths.map_or(0, |n| n * 2);
    for row in &parsed.body {
        match num_maths {
            Some(n) => {
                let cur_maths = row.len() as f64 / 2.0;
                if (n as f64) < cur_maths {
                    return Err(ParseError::new(
                        ErrorKind::TooManyMathInRow,
                        format!(
                            "Too many math in a row: expected {}, but got {}",
                            n, cur_maths
                        ),
                    ));
                }
            }
            None => num_cols = num_cols.max(row.len()),
        }
    }

    // Columns alternate right- and left-aligned.
    cfg.cols = (0..num_cols)
        .map(|i| ColDescriptor::Align(if i % 2 == 1 { 'l' } else { 'r' }))
        .collect();
    cfg.col_separation = if num_maths.is_none() {
        ColSeparation::Align
    } else {
        ColSeparation::Alignat
    };
    if name == "split" {
        cfg.col_separation = ColSeparation::Split;
    }
    Ok(build_array(parsed, &cfg, parser.settings()))
}

fn gather_handler(parser: &mut Parser, name: &str, _args: Vec<Vec<Token>>) -> Result<MathNode> {
    if name != "gathered" {
        require_display_mode(parser, name)?;
    }
    let cfg = ArrayConfig {
        hskip_before_and_after: false,
        add_jot: true,
        cols: vec![ColDescriptor::Align('c')],
        arraystretch: None,
        col_separation: ColSeparation::Gather,
        add_eqn_num: name == "gather",
        single_row: false,
        empty_single_row: true,
        max_num_cols: None,
        script_level: ScriptLevel::Display,
    };
    let parsed = parse_array(parser, &cfg)?;
    Ok(build_array(parsed, &cfg, parser.settings()))
}

fn equation_handler(parser: &mut Parser, name: &str, _args: Vec<Vec<Token>>) -> Result<MathNode> {
    require_display_mode(parser, name)?;
    let cfg = ArrayConfig {
        hskip_before_and_after: false,
        add_jot: false,
        cols: vec![ColDescriptor::Align('c')],
        arraystretch: None,
        col_separation: ColSeparation::Gather,
        add_eqn_num: name == "equation",
        single_row: true,
        empty_single_row: true,
        max_num_cols: Some(1),
        script_level: ScriptLevel::Display,
    };
    let parsed = parse_array(parser, &cfg)?;
    Ok(build_array(parsed, &cfg, parser.settings()))
}

fn multline_handler(parser: &mut Parser, name: &str, _args: Vec<Vec<Token>>) -> Result<MathNode> {
    require_display_mode(parser, name)?;
    let cfg = ArrayConfig {
        hskip_before_and_after: false,
        add_jot: false,
        cols: Vec::new(),
        arraystretch: None,
        col_separation: ColSeparation::Multline,
        add_eqn_num: name == "multline",
        single_row: false,
        empty_single_row: false,
        max_num_cols: Some(1),
        script_level: ScriptLevel::Display,
    };
    let parsed = parse_array(parser, &cfg)?;
    Ok(build_array(parsed, &cfg, parser.settings()))
}

fn cd_handler(parser: &mut Parser, name: &str, _args: Vec<Vec<Token>>) -> Result<MathNode> {
    require_display_mode(parser, name)?;
    cd::parse_cd(parser)
}
