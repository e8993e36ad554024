//! Soft and hard line breaks.
//!
//! MathML renderers do not reliably break long lines on their own, so the
//! top-level expression is chopped into `<mrow>` chunks at the points TeX
//! would consider: after a binary or relational operator and any glue that
//! follows it. A hard break (`\\`) turns the whole expression into a
//! one-column `<mtable>` instead.

use std::collections::VecDeque;

use mathml::{MathNode, MathNodeType};

/// Apply line breaking to a top-level expression.
///
/// Returns the children of the eventual `<math>` element: either the
/// original nodes regrouped into breakable `<mrow>` chunks, or a single
/// `<mtable>` when the expression contains a hard break. Breaking is
/// suppressed in display mode and in annotated expressions.
pub fn set_line_breaks(
    expression: Vec<MathNode>,
    display_mode: bool,
    annotated: bool,
) -> Vec<MathNode> {
    match break_expression(expression, display_mode, annotated, None) {
        Broken::Table(table) => vec![table],
        Broken::Rows(rows) => rows,
    }
}

enum Broken {
    Table(MathNode),
    Rows(Vec<MathNode>),
}

fn is_color_wrapper(node: &MathNode) -> bool {
    node.node_type == MathNodeType::Mstyle && node.get_attribute("mathcolor").is_some()
}

fn break_expression(
    mut expression: Vec<MathNode>,
    display_mode: bool,
    annotated: bool,
    color: Option<&str>,
) -> Broken {
    if color.is_none() {
        // Pre-pass: split the contents of \textcolor wrappers into
        // top-level chunks so breaks can happen inside them. A wrapper
        // whose contents hold a hard break is left alone.
        let mut i = expression.len();
        while i > 0 {
            i -= 1;
            if !is_color_wrapper(&expression[i]) {
                continue;
            }
            let node_color = expression[i]
                .get_attribute("mathcolor")
                .unwrap_or_default()
                .to_string();
            let children = expression[i].children.clone();
            if let Broken::Rows(rows) =
                break_expression(children, display_mode, annotated, Some(&node_color))
            {
                expression.splice(i..=i, rows);
            }
        }
    }

    // Colored chunks keep their color on the replacement <mstyle>.
    let chunk_type = if color.is_some() {
        MathNodeType::Mstyle
    } else {
        MathNodeType::Mrow
    };
    let close_chunk = |chunk: Vec<MathNode>| -> MathNode {
        let mut node = MathNode::new(chunk_type, chunk);
        if let Some(color) = color {
            node.set_attribute("mathcolor", color);
        }
        node
    };

    let mut table_rows: Vec<MathNode> = Vec::new();
    let mut chunks: Vec<MathNode> = Vec::new();
    let mut chunk: Vec<MathNode> = Vec::new();
    let mut can_be_bin = false;

    let mut queue: VecDeque<MathNode> = expression.into();
    while let Some(node) = queue.pop_front() {
        if is_color_wrapper(&node) {
            // Already split by the pre-pass; emit it as its own chunk.
            chunks.push(close_chunk(std::mem::take(&mut chunk)));
            chunks.push(node);
            continue;
        }
        if node.get_attribute("linebreak") == Some("newline") {
            // Hard break: everything since the last break becomes a table
            // row.
            if !chunk.is_empty() {
                chunks.push(close_chunk(std::mem::take(&mut chunk)));
            }
            chunks.push(node);
            let mtd = MathNode::new(MathNodeType::Mtd, std::mem::take(&mut chunks));
            table_rows.push(MathNode::new(MathNodeType::Mtr, vec![mtd]));
            continue;
        }

        let is_mo = node.node_type == MathNodeType::Mo;
        let has_form = node.get_attribute("form").is_some();
        let is_open_delimiter = node.get_attribute("form") == Some("prefix");
        let is_separator = node.get_attribute("separator").is_some();
        chunk.push(node);

        if is_mo && !display_mode && !annotated {
            if can_be_bin && !has_form {
                // A soft break can go after this operator, unless nobreak
                // glue or a nobreak text node follows.
                let mut glue_is_free_of_nobreak = true;
                let next_is_nobreak_text = queue.front().map_or(false, |next| {
                    next.node_type == MathNodeType::Mtext
                        && next.get_attribute("linebreak") == Some("nobreak")
                });
                if next_is_nobreak_text {
                    glue_is_free_of_nobreak = false;
                } else {
                    // Trailing glue stays on this line.
                    while let Some(next) = queue.front() {
                        if next.node_type != MathNodeType::Mspace
                            || next.get_attribute("linebreak") == Some("newline")
                        {
                            break;
                        }
                        if next.get_attribute("linebreak") == Some("nobreak") {
                            glue_is_free_of_nobreak = false;
                        }
                        chunk.push(queue.pop_front().unwrap());
                    }
                }
                if glue_is_free_of_nobreak {
                    chunks.push(close_chunk(std::mem::take(&mut chunk)));
                }
            }
            // No break after an opening delimiter or a separator comma.
            can_be_bin = !(is_separator || is_open_delimiter);
        } else {
            can_be_bin = true;
        }
    }

    if !chunk.is_empty() {
        chunks.push(close_chunk(chunk));
    }
    if !table_rows.is_empty() {
        let mtd = MathNode::new(MathNodeType::Mtd, chunks);
        table_rows.push(MathNode::new(MathNodeType::Mtr, vec![mtd]));
        let mut table = MathNode::new(MathNodeType::Mtable, table_rows);
        if !display_mode {
            table.set_attribute("columnalign", "left");
            table.set_attribute("rowspacing", "0em");
        }
        return Broken::Table(table);
    }
    Broken::Rows(chunks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mathml::{MathNode, MathNodeType};

    fn mi(text: &str) -> MathNode {
        MathNode::text(MathNodeType::Mi, text)
    }

    fn mo(text: &str) -> MathNode {
        MathNode::text(MathNodeType::Mo, text)
    }

    fn glue() -> MathNode {
        let mut node = MathNode::empty(MathNodeType::Mspace);
        node.set_attribute("width", "1em");
        node
    }

    fn newline() -> MathNode {
        let mut node = MathNode::empty(MathNodeType::Mspace);
        node.set_attribute("linebreak", "newline");
        node
    }

    fn markup(nodes: &[MathNode]) -> String {
        nodes.iter().map(|n| n.to_markup()).collect()
    }

    #[test]
    fn breaks_after_binary_operator() {
        let result = set_line_breaks(vec![mi("a"), mo("+"), mi("b")], false, false);
        assert_eq!(
            markup(&result),
            "<mrow><mi>a</mi><mo>+</mo></mrow><mrow><mi>b</mi></mrow>"
        );
    }

    #[test]
    fn no_breaks_in_display_mode() {
        let result = set_line_breaks(vec![mi("a"), mo("+"), mi("b")], true, false);
        assert_eq!(
            markup(&result),
            "<mrow><mi>a</mi><mo>+</mo><mi>b</mi></mrow>"
        );
    }

    #[test]
    fn no_break_after_opening_delimiter() {
        let mut open = mo("(");
        open.set_attribute("form", "prefix");
        // ( is not a break candidate itself, and - right after it is unary.
        let result = set_line_breaks(vec![open, mo("−"), mi("b")], false, false);
        assert_eq!(markup(&result).matches("<mrow>").count(), 1);
    }

    #[test]
    fn operator_after_separator_is_unary() {
        let mut comma = mo(",");
        comma.set_attribute("separator", "true");
        let result = set_line_breaks(vec![mi("a"), comma, mo("+"), mi("b")], false, false);
        // The break goes after the comma; the + following it is a sign, not
        // a binary operator, so no second break appears.
        assert_eq!(
            markup(&result),
            "<mrow><mi>a</mi><mo separator=\"true\">,</mo></mrow>\
             <mrow><mo>+</mo><mi>b</mi></mrow>"
        );
    }

    #[test]
    fn glue_stays_on_the_broken_line() {
        let result = set_line_breaks(vec![mi("a"), mo("+"), glue(), mi("b")], false, false);
        assert_eq!(
            markup(&result),
            "<mrow><mi>a</mi><mo>+</mo><mspace width=\"1em\"></mspace></mrow>\
             <mrow><mi>b</mi></mrow>"
        );
    }

    #[test]
    fn nobreak_glue_suppresses_the_break() {
        let mut nobreak = MathNode::empty(MathNodeType::Mspace);
        nobreak.set_attribute("linebreak", "nobreak");
        let result = set_line_breaks(vec![mi("a"), mo("+"), nobreak, mi("b")], false, false);
        assert_eq!(markup(&result).matches("<mrow>").count(), 1);
    }

    #[test]
    fn nobreak_text_suppresses_the_break() {
        let mut tie = MathNode::text(MathNodeType::Mtext, "\u{a0}");
        tie.set_attribute("linebreak", "nobreak");
        let result = set_line_breaks(vec![mi("a"), mo("+"), tie, mi("b")], false, false);
        assert_eq!(markup(&result).matches("<mrow>").count(), 1);
    }

    #[test]
    fn hard_break_builds_a_table() {
        let result = set_line_breaks(vec![mi("a"), newline(), mi("b")], false, false);
        assert_eq!(result.len(), 1);
        let table = &result[0];
        assert_eq!(table.node_type, MathNodeType::Mtable);
        assert_eq!(table.get_attribute("columnalign"), Some("left"));
        assert_eq!(table.get_attribute("rowspacing"), Some("0em"));
        assert_eq!(table.children.len(), 2);
    }

    #[test]
    fn hard_break_in_display_mode_keeps_default_alignment() {
        let result = set_line_breaks(vec![mi("a"), newline(), mi("b")], true, false);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].get_attribute("columnalign"), None);
    }

    #[test]
    fn color_wrapper_is_split_into_chunks() {
        let mut colored = MathNode::new(
            MathNodeType::Mstyle,
            vec![mi("x"), mo("+"), mi("y")],
        );
        colored.set_attribute("mathcolor", "red");
        let result = set_line_breaks(vec![colored], false, false);
        let markup = markup(&result);
        // Both chunks carry the color, and a break sits between them.
        assert_eq!(
            markup.matches("<mstyle mathcolor=\"red\">").count(),
            2
        );
    }

    #[test]
    fn color_wrapper_with_hard_break_is_left_alone() {
        let mut colored =
            MathNode::new(MathNodeType::Mstyle, vec![mi("x"), newline(), mi("y")]);
        colored.set_attribute("mathcolor", "red");
        let result = set_line_breaks(vec![mi("a"), colored], false, false);
        let markup = markup(&result);
        assert!(markup.contains("<mstyle mathcolor=\"red\">"));
        assert!(markup.contains("linebreak=\"newline\""));
        assert!(!markup.contains("<mtable"));
    }
}
