//! Parsing and building of tabular environments.
//!
//! Every environment except `{CD}` funnels through [parse_array] and
//! [build_array]; the per-environment handlers only differ in the
//! [ArrayConfig] they supply.

use mathml::{em, MathNode, MathNodeType};

use crate::error::end_of_input;
use crate::error::ErrorKind;
use crate::error::ParseError;
use crate::error::Result;
use crate::settings::Settings;
use crate::token::Token;
use crate::token::Value;

use super::Parser;
use super::Stops;
use super::Tag;

/// One entry in a column specification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColDescriptor {
    /// An aligned column: `l`, `c` or `r`.
    Align(char),
    /// A vertical rule between columns: `|` (solid) or `:` (dashed).
    Separator(char),
}

/// How the columns of an environment are spaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColSeparation {
    Array,
    Matrix,
    Cases,
    Small,
    Gather,
    Align,
    Alignat,
    Split,
    Cd,
    Multline,
}

/// The style cells are set in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptLevel {
    Display,
    Text,
    Script,
}

/// Everything that distinguishes one tabular environment from another.
pub struct ArrayConfig {
    pub hskip_before_and_after: bool,
    /// Add 3pt of `\jot` to the row spacing, as the AMS environments do.
    pub add_jot: bool,
    pub cols: Vec<ColDescriptor>,
    /// A fixed stretch. `None` means consult the `\arraystretch` macro.
    pub arraystretch: Option<f64>,
    pub col_separation: ColSeparation,
    /// Number the rows and bind `\tag`, `\notag` and `\nonumber`.
    pub add_eqn_num: bool,
    /// Do not treat `\\` as a row separator.
    pub single_row: bool,
    /// Keep a lone empty row instead of dropping it.
    pub empty_single_row: bool,
    pub max_num_cols: Option<usize>,
    pub script_level: ScriptLevel,
}

/// The body of a parsed environment.
pub struct ParsedArray {
    /// Rows of cells, each cell a list of nodes.
    pub body: Vec<Vec<Vec<MathNode>>>,
    /// The `\tag` seen in each row, if any.
    pub tags: Vec<Option<Tag>>,
    /// The optional `[size]` after each `\\`.
    pub row_gaps: Vec<Option<String>>,
    /// The `\hline`s found before each row; `true` marks a dashed line.
    /// Has one more entry than `body` for lines after the final row.
    pub hlines_before_row: Vec<Vec<bool>>,
    pub arraystretch: f64,
}

/// Parse the body of a tabular environment, up to but not including the
/// closing `\end`.
pub(crate) fn parse_array(parser: &mut Parser, cfg: &ArrayConfig) -> Result<ParsedArray> {
    // The environment and cell scopes below are unwound here on every exit
    // path, so an error part way through a row cannot leak bindings.
    let depth = parser.gullet().group_depth();
    let result = parse_array_inner(parser, cfg);
    let gullet = parser.gullet_mut();
    while gullet.group_depth() > depth {
        if !gullet.end_group() {
            break;
        }
    }
    result
}

fn parse_array_inner(parser: &mut Parser, cfg: &ArrayConfig) -> Result<ParsedArray> {
    {
        // The environment scope, holding the row-level bindings.
        let gullet = parser.gullet_mut();
        gullet.begin_group();
        if !cfg.single_row {
            gullet.set_text_macro("cr", "\\\\\\relax", 0)?;
        }
        if cfg.add_eqn_num {
            gullet.set_text_macro("tag", "\\env@tag{#1}", 1)?;
            gullet.set_text_macro("notag", "\\env@notag", 0)?;
            gullet.set_text_macro("nonumber", "\\env@notag", 0)?;
        }
    }
    let arraystretch = match cfg.arraystretch {
        Some(value) => value,
        None => resolve_arraystretch(parser)?,
    };
    // The scope of the first cell.
    parser.gullet_mut().begin_group();

    let stops = Stops {
        row_separator: !cfg.single_row,
        at_sign: false,
    };
    let mut body: Vec<Vec<Vec<MathNode>>> = vec![Vec::new()];
    let mut tags: Vec<Option<Tag>> = Vec::new();
    let mut row_gaps: Vec<Option<String>> = Vec::new();
    let mut hlines_before_row = vec![get_hlines(parser)?];
    let mut row_tag: Option<Tag> = None;

    loop {
        let cell = parser.parse_expression(stops)?;
        // Only the first tag in a row counts; later ones are discarded so
        // they cannot spill over into the next row.
        let pending = parser.take_pending_tag();
        if row_tag.is_none() {
            row_tag = pending;
        }
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
        if matches!(token.value(), Value::AlignmentTab(_)) {
            if cfg.max_num_cols == Some(body.last().unwrap().len()) {
                column_limit_error(parser, cfg)?;
            }
            parser.consume();
            continue;
        }
        match cs_of(parser, token).as_deref() {
            Some("end") => {
                // A trailing \\ leaves an empty row behind; drop it unless
                // this environment keeps a lone empty row.
                let last_row = body.last().unwrap();
                if last_row.len() == 1
                    && last_row[0].is_empty()
                    && (body.len() > 1 || !cfg.empty_single_row)
                {
                    body.pop();
                }
                while hlines_before_row.len() < body.len() + 1 {
                    hlines_before_row.push(Vec::new());
                }
                break;
            }
            Some("\\") => {
                parser.consume();
                row_gaps.push(parse_row_gap(parser)?);
                tags.push(row_tag.take());
                hlines_before_row.push(get_hlines(parser)?);
                body.push(Vec::new());
            }
            _ => {
                return Err(ParseError::new(
                    ErrorKind::UnexpectedToken,
                    "Expected & or \\\\ or \\cr or \\end",
                )
                .at_position(token.position()))
            }
        }
    }
    tags.push(row_tag.take());
    // When the trailing empty row was dropped, drop its tag slot with it.
    tags.truncate(body.len());

    Ok(ParsedArray {
        body,
        tags,
        row_gaps,
        hlines_before_row,
        arraystretch,
    })
}

fn cs_of(parser: &Parser, token: Token) -> Option<String> {
    token.cs_name().map(|name| {
        parser
            .gullet()
            .interner()
            .resolve(name)
            .unwrap_or("?")
            .to_string()
    })
}

fn resolve_arraystretch(parser: &mut Parser) -> Result<f64> {
    match parser.gullet_mut().expand_macro_as_text("arraystretch")? {
        None => Ok(1.0),
        Some(text) => {
            let text = text.trim().to_string();
            match text.parse::<f64>() {
                Ok(value) if value > 0.0 => Ok(value),
                _ => Err(ParseError::new(
                    ErrorKind::InvalidStretch,
                    format!("Invalid \\arraystretch: {}", text),
                )),
            }
        }
    }
}

fn column_limit_error(parser: &mut Parser, cfg: &ArrayConfig) -> Result<()> {
    match cfg.col_separation {
        ColSeparation::Split => Err(ParseError::new(
            ErrorKind::TooManyColumns,
            "The split environment accepts no more than two columns",
        )),
        ColSeparation::Array => {
            let message = "Too few columns specified in the {array} column argument.";
            if parser.settings().strict {
                Err(ParseError::new(ErrorKind::TooManyColumns, message))
            } else {
                parser.warn(message);
                Ok(())
            }
        }
        _ => Err(ParseError::new(
            ErrorKind::TooManyColumns,
            "The equation environment accepts only one column",
        )),
    }
}

/// Collect a run of `\hline` and `\hdashline`. `true` marks a dashed line.
fn get_hlines(parser: &mut Parser) -> Result<Vec<bool>> {
    let mut hlines = Vec::new();
    loop {
        parser.consume_spaces()?;
        let token = match parser.fetch()? {
            None => break,
            Some(token) => token,
        };
        match cs_of(parser, token).as_deref() {
            Some("hline") => {
                hlines.push(false);
                parser.consume();
            }
            Some("hdashline") => {
                hlines.push(true);
                parser.consume();
            }
            _ => break,
        }
    }
    Ok(hlines)
}

/// Read the optional `[size]` after `\\`.
fn parse_row_gap(parser: &mut Parser) -> Result<Option<String>> {
    // \cr expands to \\\relax; the \relax keeps a following [ from being
    // read as a size. A space does the same for \\.
    if let Some(token) = parser.gullet_mut().future()? {
        if matches!(token.value(), Value::Space(_)) {
            return Ok(None);
        }
    }
    match parser.fetch()? {
        Some(token) if matches!(token.value(), Value::Other('[')) => {
            parser.consume();
            let mut size = String::new();
            loop {
                match parser.fetch()? {
                    None => return Err(end_of_input("]")),
                    Some(token) if matches!(token.value(), Value::Other(']')) => {
                        parser.consume();
                        break;
                    }
                    Some(token) => match token.char() {
                        Some(c) => {
                            size.push(c);
                            parser.consume();
                        }
                        None => {
                            return Err(ParseError::new(
                                ErrorKind::UnexpectedToken,
                                format!("Invalid size: \"{}\"", size),
                            )
                            .at_position(token.position()))
                        }
                    },
                }
            }
            let size = size.trim().to_string();
            if !valid_size(&size) {
                return Err(ParseError::new(
                    ErrorKind::UnexpectedToken,
                    format!("Invalid size: \"{}\"", size),
                ));
            }
            Ok(Some(size))
        }
        _ => Ok(None),
    }
}

/// A number followed by a TeX unit of measure.
fn valid_size(text: &str) -> bool {
    const UNITS: [&str; 9] = ["em", "ex", "pt", "pc", "in", "bp", "cm", "mm", "mu"];
    for unit in UNITS {
        if let Some(number) = text.strip_suffix(unit) {
            let number = number.trim();
            let number = number.strip_prefix(['+', '-']).unwrap_or(number);
            return number.chars().any(|c| c.is_ascii_digit())
                && number.chars().all(|c| c.is_ascii_digit() || c == '.')
                && number.chars().filter(|c| *c == '.').count() <= 1;
        }
    }
    false
}

fn round4(value: f64) -> f64 {
    (value * 10000.0).round() / 10000.0
}

fn separator_line(c: char) -> &'static str {
    if c == '|' {
        "0.06em solid"
    } else {
        "0.06em dashed"
    }
}

fn glue_cell(multline: bool) -> MathNode {
    let mut mtd = MathNode::empty(MathNodeType::Mtd);
    mtd.set_style("padding", "0");
    mtd.set_style("width", if multline { "7.5%" } else { "50%" });
    mtd
}

fn build_tag(tag: Option<Tag>, multline: bool, leqno: bool, i: usize, num_rows: usize) -> MathNode {
    match tag {
        Some(Tag::Tagged(nodes)) => {
            let mut node = MathNode::new(MathNodeType::Mrow, nodes);
            node.classes.push("tml-tag".to_string());
            node
        }
        Some(Tag::NoTag) => MathNode::empty(MathNodeType::Mtext),
        None => {
            // multline gets its number only on the last row, or the first
            // with \leqno.
            if multline && ((leqno && i != 0) || (!leqno && i + 1 != num_rows)) {
                MathNode::empty(MathNodeType::Mtext)
            } else {
                let mut node = MathNode::empty(MathNodeType::Mtext);
                node.classes.push("tml-eqn".to_string());
                node
            }
        }
    }
}

/// Build the `<mtable>` for a parsed environment.
pub(crate) fn build_array(parsed: ParsedArray, cfg: &ArrayConfig, settings: &Settings) -> MathNode {
    let ParsedArray {
        body,
        mut tags,
        row_gaps: _,
        hlines_before_row,
        arraystretch,
    } = parsed;
    let multline = cfg.col_separation == ColSeparation::Multline;
    let num_rows = body.len();
    let leqno = settings.leqno;

    let mut table_rows: Vec<MathNode> = Vec::with_capacity(num_rows);
    for (i, row) in body.into_iter().enumerate() {
        let mut cells: Vec<MathNode> = Vec::with_capacity(row.len() + 2);
        for cell in row {
            let mut mtd = MathNode::new(
                MathNodeType::Mtd,
                vec![MathNode::new(MathNodeType::Mrow, cell)],
            );
            if multline {
                let align = if i == 0 {
                    "left"
                } else if i + 1 == num_rows {
                    "right"
                } else {
                    "center"
                };
                mtd.set_attribute("columnalign", align);
                if align != "center" {
                    mtd.set_style("text-align", format!("-webkit-{}", align));
                }
            }
            cells.push(mtd);
        }
        if cfg.add_eqn_num {
            let tag = tags.get_mut(i).and_then(Option::take);
            let tag_node = build_tag(tag, multline, leqno, i, num_rows);
            cells.insert(0, glue_cell(multline));
            cells.push(glue_cell(multline));
            if leqno {
                cells[0].children.push(tag_node);
                cells[0].set_style("text-align", "-webkit-left");
            } else {
                let last = cells.len() - 1;
                cells[last].children.push(tag_node);
                cells[last].set_style("text-align", "-webkit-right");
            }
        }
        let mut mtr = MathNode::new(MathNodeType::Mtr, cells);
        if i == 0 {
            if let Some(first) = hlines_before_row.first() {
                if !first.is_empty() {
                    let class = if first[0] { "tml-top-dashed" } else { "tml-top-solid" };
                    mtr.classes.push(class.to_string());
                }
            }
        }
        if let Some(after) = hlines_before_row.get(i + 1) {
            if !after.is_empty() {
                let class = if after[0] { "hline-dashed" } else { "hline-solid" };
                mtr.classes.push(class.to_string());
            }
        }
        table_rows.push(mtr);
    }

    let mut table = MathNode::new(MathNodeType::Mtable, table_rows);
    if !cfg.add_eqn_num {
        table.classes.push("tml-array".to_string());
    }
    if cfg.script_level == ScriptLevel::Display {
        table.set_attribute("displaystyle", "true");
    }
    let gap = if arraystretch == 0.5 {
        // {smallmatrix}
        0.1
    } else if arraystretch == 0.0 {
        0.0
    } else {
        0.16 + arraystretch - 1.0 + if cfg.add_jot { 0.09 } else { 0.0 }
    };
    table.set_attribute("rowspacing", em(gap));
    if arraystretch > 1.0 {
        let padding = format!("calc({}em + 0.5ex) 0.4em", round4((arraystretch - 1.0) / 2.0));
        for row in &mut table.children {
            for cell in &mut row.children {
                cell.set_style("padding", padding.clone());
            }
        }
    }
    if cfg.add_eqn_num || multline {
        table.set_attribute("width", "100%");
    }

    let mut align = String::new();
    let mut column_lines = String::new();
    let cols = &cfg.cols;
    if !cols.is_empty() {
        let mut i_start = 0;
        while i_start < cols.len() && matches!(cols[i_start], ColDescriptor::Separator(_)) {
            i_start += 1;
        }
        let mut i_end = cols.len();
        while i_end > i_start && matches!(cols[i_end - 1], ColDescriptor::Separator(_)) {
            i_end -= 1;
        }
        if i_start > 0 {
            if let ColDescriptor::Separator(c) = cols[0] {
                let line = separator_line(c);
                for row in &mut table.children {
                    if let Some(first) = row.children.first_mut() {
                        first.set_style("border-left", line);
                        first.set_style("padding-left", "0.4em");
                    }
                }
            }
        }

        // With an equation number the glue cell occupies index 0.
        let mut i_col: isize = if cfg.add_eqn_num { 0 } else { -1 };
        let mut prev_was_align = false;
        for descriptor in &cols[i_start..i_end] {
            match *descriptor {
                ColDescriptor::Align(a) => {
                    let col_align = match a {
                        'l' => "left",
                        'r' => "right",
                        _ => "center",
                    };
                    if prev_was_align {
                        column_lines.push_str("none ");
                    }
                    align.push_str(col_align);
                    align.push(' ');
                    i_col += 1;
                    if col_align != "center" {
                        for row in &mut table.children {
                            if let Some(cell) = row.children.get_mut(i_col as usize) {
                                cell.set_style("text-align", format!("-webkit-{}", col_align));
                            }
                        }
                    }
                    prev_was_align = true;
                }
                ColDescriptor::Separator(c) => {
                    // MathML draws a single line between two columns, so
                    // consecutive separators collapse to the first.
                    if prev_was_align {
                        let line = separator_line(c);
                        column_lines.push_str(line);
                        column_lines.push(' ');
                        if i_col >= 0 {
                            for row in &mut table.children {
                                if let Some(cell) = row.children.get_mut(i_col as usize) {
                                    cell.set_style("border-right", line);
                                }
                            }
                        }
                        prev_was_align = false;
                    }
                }
            }
        }
        if i_end < cols.len() {
            if let ColDescriptor::Separator(c) = cols[i_end] {
                let line = separator_line(c);
                for row in &mut table.children {
                    if let Some(last) = row.children.last_mut() {
                        last.set_style("border-right", line);
                        last.set_style("padding-right", "0.4em");
                    }
                }
            }
        }
    }
    if cfg.add_eqn_num {
        let inner = format!("left {}right ", align);
        align = if leqno {
            format!("left {}", inner)
        } else {
            format!("{}right", inner)
        };
    }
    if !align.trim().is_empty() {
        table.set_attribute("columnalign", align.trim());
    }
    if column_lines.contains("solid") || column_lines.contains("dashed") {
        table.set_attribute("columnlines", column_lines.trim());
    }

    match cfg.col_separation {
        ColSeparation::Gather | ColSeparation::Alignat | ColSeparation::Split => {
            table.set_attribute("columnspacing", "0em");
            table.classes.push("tml-gather".to_string());
        }
        ColSeparation::Small => {
            table.set_attribute("columnspacing", "0.2778em");
            table.classes.push("tml-small".to_string());
        }
        ColSeparation::Cd => {
            table.set_attribute("columnspacing", "0.5em");
            table.classes.push("tml-gather".to_string());
        }
        ColSeparation::Align => {
            table.classes.push("tml-gather".to_string());
            let mut spacing = if cfg.add_eqn_num {
                String::from("0em ")
            } else {
                String::new()
            };
            for i in 1..cols_len_for_spacing(cfg) {
                spacing.push_str(if i % 2 == 1 { "0em " } else { "1em " });
            }
            if cfg.add_eqn_num {
                spacing.push_str("0em");
            }
            if !spacing.trim().is_empty() {
                table.set_attribute("columnspacing", spacing.trim());
            }
        }
        _ => table.set_attribute("columnspacing", "1em"),
    }

    if arraystretch < 1.0 {
        // Sub-unit stretch marks a script-size environment.
        let mut style = MathNode::new(MathNodeType::Mstyle, vec![table]);
        style.set_attribute("scriptlevel", "1");
        return style;
    }
    table
}

fn cols_len_for_spacing(cfg: &ArrayConfig) -> usize {
    cfg.cols
        .iter()
        .filter(|d| matches!(d, ColDescriptor::Align(_)))
        .count()
}

#[cfg(test)]
mod tests {
    use super::{parse_array, ArrayConfig, ColSeparation, ScriptLevel};
    use crate::error::ErrorKind;
    use crate::parse_failure_test;
    use crate::Settings;

    fn markup(input: &str, display_mode: bool) -> String {
        let settings = Settings {
            display_mode,
            ..Settings::default()
        };
        let nodes = crate::parse(input, &settings).expect("parse failed");
        nodes.iter().map(|n| n.to_markup()).collect()
    }

    #[test]
    fn simple_matrix() {
        assert_eq!(
            markup(r"\begin{matrix}a\end{matrix}", false),
            "<mtable columnalign=\"center\" columnspacing=\"1em\" rowspacing=\"0.16em\" \
             class=\"tml-array\"><mtr><mtd><mrow><mi>a</mi></mrow></mtd></mtr></mtable>"
        );
    }

    #[test]
    fn pmatrix_is_fenced() {
        let markup = markup(r"\begin{pmatrix}a&b\\c&d\end{pmatrix}", false);
        assert!(markup.starts_with(
            "<mrow><mo fence=\"true\" form=\"prefix\" stretchy=\"true\">(</mo><mtable"
        ));
        assert!(markup.ends_with(
            "</mtable><mo fence=\"true\" form=\"postfix\" stretchy=\"true\">)</mo></mrow>"
        ));
        assert!(markup.contains("columnalign=\"center center\""));
    }

    #[test]
    fn matrix_star_takes_alignment() {
        let markup = markup(r"\begin{pmatrix*}[r]a&b\end{pmatrix*}", false);
        assert!(markup.contains("columnalign=\"right right\""));
        assert!(markup.contains("text-align:-webkit-right;"));
    }

    #[test]
    fn smallmatrix_is_scriptsize() {
        let markup = markup(r"\begin{smallmatrix}a\\b\end{smallmatrix}", false);
        assert!(markup.starts_with("<mstyle scriptlevel=\"1\">"));
        assert!(markup.contains("rowspacing=\"0.1em\""));
        assert!(markup.contains("columnspacing=\"0.2778em\""));
        assert!(markup.contains("class=\"tml-array tml-small\""));
    }

    #[test]
    fn array_column_separator() {
        let markup = markup(r"\begin{array}{c|c}a&b\end{array}", false);
        assert!(markup.contains("columnlines=\"0.06em solid\""));
        assert!(markup.contains("style=\"border-right:0.06em solid;\""));
    }

    #[test]
    fn array_dashed_edge_separator() {
        let markup = markup(r"\begin{array}{:c}a\end{array}", false);
        assert!(markup.contains("border-left:0.06em dashed;"));
        assert!(markup.contains("padding-left:0.4em;"));
        assert!(!markup.contains("columnlines"));
    }

    #[test]
    fn trailing_empty_row_is_dropped() {
        let markup = markup(r"\begin{matrix}a\\\end{matrix}", false);
        assert_eq!(markup.matches("<mtr>").count(), 1);
    }

    #[test]
    fn row_gap_is_consumed() {
        let markup = markup(r"\begin{matrix}a\\[2em]b\end{matrix}", false);
        assert_eq!(markup.matches("<mtr>").count(), 2);
    }

    #[test]
    fn hlines_become_classes() {
        let markup = markup(r"\begin{matrix}\hline a\\\hdashline b\end{matrix}", false);
        assert!(markup.contains("<mtr class=\"tml-top-solid hline-dashed\">"));
    }

    #[test]
    fn arraystretch_macro_sets_spacing() {
        let markup = markup(r"\def\arraystretch{2}\begin{matrix}a\end{matrix}", false);
        assert!(markup.contains("rowspacing=\"1.16em\""));
        assert!(markup.contains("padding:calc(0.5em + 0.5ex) 0.4em;"));
    }

    #[test]
    fn equation_is_numbered() {
        let markup = markup(r"\begin{equation}E=mc^2\end{equation}", true);
        assert!(markup.contains("class=\"tml-eqn\""));
        assert!(markup.contains("width=\"100%\""));
        assert!(markup.contains("width:50%;"));
        assert!(markup.contains("displaystyle=\"true\""));
        assert!(!markup.contains("tml-array"));
    }

    #[test]
    fn equation_keeps_lone_empty_row() {
        let markup = markup(r"\begin{equation}\end{equation}", true);
        assert_eq!(markup.matches("<mtr").count(), 1);
    }

    #[test]
    fn align_rows_and_spacing() {
        let markup = markup(r"\begin{align}a&=b\\c&=d\end{align}", true);
        assert!(markup.contains("rowspacing=\"0.25em\""));
        assert!(markup.contains("columnspacing=\"0em 0em 0em\""));
        assert!(markup.contains("class=\"tml-gather\""));
        assert_eq!(markup.matches("class=\"tml-eqn\"").count(), 2);
    }

    #[test]
    fn tag_replaces_equation_number() {
        let markup = markup(r"\begin{align}a&=b\tag{7}\end{align}", true);
        assert!(markup.contains("class=\"tml-tag\""));
        assert!(markup.contains("<mn>7</mn>"));
        assert!(!markup.contains("tml-eqn"));
    }

    #[test]
    fn first_tag_in_a_row_wins() {
        let markup = markup(r"\begin{align}a\tag{A}\tag{B}\\c\end{align}", true);
        assert!(markup.contains("<mi>A</mi>"));
        assert!(!markup.contains("<mi>B</mi>"));
    }

    #[test]
    fn extra_tag_does_not_spill_into_the_next_row() {
        let markup = markup(r"\begin{align}a\tag{A}&b\tag{B}\\c&d\end{align}", true);
        // The second row keeps its automatic number.
        assert!(markup.contains("tml-eqn"));
        assert!(!markup.contains("<mi>B</mi>"));
    }

    #[test]
    fn dropped_trailing_row_drops_its_tag_slot() {
        let settings = Settings::default();
        let mut parser = crate::Parser::new(r"a\\b\\\end{matrix}", &settings);
        let cfg = ArrayConfig {
            hskip_before_and_after: false,
            add_jot: false,
            cols: Vec::new(),
            arraystretch: Some(1.0),
            col_separation: ColSeparation::Matrix,
            add_eqn_num: false,
            single_row: false,
            empty_single_row: false,
            max_num_cols: None,
            script_level: ScriptLevel::Text,
        };
        let parsed = parse_array(&mut parser, &cfg).expect("parse failed");
        assert_eq!(parsed.body.len(), 2);
        assert_eq!(parsed.tags.len(), parsed.body.len());
    }

    #[test]
    fn notag_suppresses_equation_number() {
        let markup = markup(r"\begin{align}a&=b\notag\end{align}", true);
        assert!(!markup.contains("tml-eqn"));
        assert!(!markup.contains("tml-tag"));
    }

    #[test]
    fn multline_aligns_first_and_last_rows() {
        let markup = markup(r"\begin{multline*}a\\b\\c\end{multline*}", true);
        assert!(markup.contains("<mtd columnalign=\"left\""));
        assert!(markup.contains("<mtd columnalign=\"center\">"));
        assert!(markup.contains("<mtd columnalign=\"right\""));
        assert!(markup.contains("width=\"100%\""));
    }

    #[test]
    fn cases_has_left_brace_only() {
        let markup = markup(r"\begin{cases}a&b\\c&d\end{cases}", false);
        assert!(markup.starts_with(
            "<mrow><mo fence=\"true\" form=\"prefix\" stretchy=\"true\">{</mo><mtable"
        ));
        assert!(markup.ends_with("</mtable></mrow>"));
    }

    #[test]
    fn rcases_has_right_brace_only() {
        let markup = markup(r"\begin{rcases}a&b\end{rcases}", false);
        assert!(markup.starts_with("<mrow><mtable"));
        assert!(markup.ends_with(
            "<mo fence=\"true\" form=\"postfix\" stretchy=\"true\">}</mo></mrow>"
        ));
    }

    #[test]
    fn subarray_is_tight() {
        let markup = markup(r"\begin{subarray}{c}a\\b\end{subarray}", false);
        assert!(markup.starts_with("<mstyle scriptlevel=\"1\">"));
        assert!(markup.contains("rowspacing=\"0em\""));
    }

    #[test]
    fn lenient_array_overflow_warns() {
        let settings = Settings::default();
        let mut parser = crate::parse::Parser::new(r"\begin{array}{c}a&b\end{array}", &settings);
        parser.parse().expect("parse failed");
        assert_eq!(
            parser.warnings(),
            ["Too few columns specified in the {array} column argument."]
        );
    }

    parse_failure_test![
        unknown_column_alignment,
        r"\begin{array}{q}a\end{array}",
        ErrorKind::UnknownColumnAlignment
    ];
    parse_failure_test![
        invalid_arraystretch,
        r"\def\arraystretch{-1}\begin{matrix}a\end{matrix}",
        ErrorKind::InvalidStretch
    ];
    parse_failure_test![
        split_three_columns,
        r"\begin{split}a&b&c\end{split}",
        ErrorKind::TooManyColumns
    ];
    parse_failure_test![
        equation_two_columns,
        r"\begin{equation}a&b\end{equation}",
        ErrorKind::TooManyColumns
    ];
    parse_failure_test![
        alignat_row_too_wide,
        r"\begin{alignat}{1}a&=b&+c\end{alignat}",
        ErrorKind::TooManyMathInRow
    ];
    parse_failure_test![
        subarray_two_columns,
        r"\begin{subarray}{cc}a&b\end{subarray}",
        ErrorKind::SingleColumnOnly
    ];
    parse_failure_test![
        gather_requires_display_mode,
        r"\begin{gather}a\end{gather}",
        ErrorKind::DisplayModeRequired,
        inline
    ];
    parse_failure_test![
        matrix_star_bad_alignment,
        r"\begin{pmatrix*}[q]a\end{pmatrix*}",
        ErrorKind::UnknownColumnAlignment
    ];
    parse_failure_test![
        invalid_row_gap,
        r"\begin{matrix}a\\[2qq]b\end{matrix}",
        ErrorKind::UnexpectedToken
    ];
    parse_failure_test![
        missing_row_separator,
        r"\begin{matrix}a$b\end{matrix}",
        ErrorKind::UnexpectedToken
    ];
}
