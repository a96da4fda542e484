//! # Table Expander
//!
//! Converts a table's column/row model into positioned text and frame
//! primitives. The column block defines widths, alignment, and border
//! flags; each data row contributes one cell per column, matched by
//! position. Rows that would cross the printable height get a page break
//! first, and every continuation page repeats the header — the feature the
//! whole expander exists for.
//!
//! All emitted primitives are inserted immediately before the table node;
//! the table itself is removed once the last row is out.

use log::warn;

use crate::error::{FolioError, Result};
use crate::model::{DocumentTree, NodeId, NodeKind};
use crate::style::TextAlign;
use crate::transform::{line_node, TransformEngine};

/// Hard wrap length for cell text: a break lands after every complete run
/// of this many characters.
const WRAP_RUN: usize = 41;

/// Characters-per-line assumption behind the row auto-height heuristic.
const CHARS_PER_LINE: usize = 40;

pub(crate) fn expand(engine: &mut TransformEngine, table: NodeId) -> Result<()> {
    let line_height = engine.tree.required_f64(table, "lineheight")?;

    let columns_block = child_of_kind(engine.tree, table, NodeKind::Columns).ok_or_else(|| {
        FolioError::MalformedDocument("table without a columns block".to_string())
    })?;
    let data_block = child_of_kind(engine.tree, table, NodeKind::Data)
        .ok_or_else(|| FolioError::MalformedDocument("table without a data block".to_string()))?;

    let columns: Vec<NodeId> = children_of_kind(engine.tree, columns_block, NodeKind::Column);
    if columns.is_empty() {
        return Err(FolioError::MalformedDocument(
            "table columns block defines no columns".to_string(),
        ));
    }
    let rows: Vec<NodeId> = children_of_kind(engine.tree, data_block, NodeKind::Row);

    let header_line_height = engine
        .tree
        .optional_f64(columns_block, "lineheight")?
        .unwrap_or(line_height);

    // Reserve room for at least the header plus one row; otherwise the
    // table starts on a fresh page.
    if engine.cursor.y + 2.0 * line_height > engine.geometry.printable_height() {
        engine.insert_page_break_before(table);
    }

    emit_header(engine, table, columns_block, &columns, header_line_height)?;

    for &row in &rows {
        let cells: Vec<NodeId> = children_of_kind(engine.tree, row, NodeKind::Cell);
        if cells.len() > columns.len() {
            warn!(
                "row has {} cells but the table has {} columns; extras ignored",
                cells.len(),
                columns.len()
            );
        }

        let row_height = match engine.tree.optional_f64(row, "lineheight")? {
            Some(explicit) => explicit,
            None => line_height * auto_line_count(engine.tree, &cells) as f64,
        };

        if engine.cursor.y + row_height > engine.geometry.printable_height() {
            engine.insert_page_break_before(table);
            emit_header(engine, table, columns_block, &columns, header_line_height)?;
        }

        let mut x = 0.0;
        for (&cell, &column) in cells.iter().zip(columns.iter()) {
            let width = engine.tree.required_f64(column, "width")?;
            // Cell alignment wins over the column's.
            let align = engine
                .tree
                .attr(cell, "align")
                .or_else(|| engine.tree.attr(column, "align"))
                .map(str::to_string);
            let content = wrap_text(engine.tree.text(cell));
            emit_cell_text(engine.tree, table, &content, align.as_deref(), x, width);
            emit_frame(engine.tree, column, table, x, 0.0, x + width, row_height);
            x += width;
        }

        emit_frame(engine.tree, row, table, 0.0, 0.0, x, row_height);
        emit_row_advance(engine, table, row_height);
    }

    engine.tree.detach(table);
    Ok(())
}

/// Emit the header: one label and frame per column, an outer frame from the
/// columns block's own border flags, and the row advance.
fn emit_header(
    engine: &mut TransformEngine,
    table: NodeId,
    columns_block: NodeId,
    columns: &[NodeId],
    header_line_height: f64,
) -> Result<()> {
    let mut x = 0.0;
    for &column in columns {
        let width = engine.tree.required_f64(column, "width")?;
        let label = engine.tree.text(column).to_string();
        let align = engine.tree.attr(column, "align").map(str::to_string);
        emit_cell_text(engine.tree, table, &label, align.as_deref(), x, width);
        emit_frame(engine.tree, column, table, x, 0.0, x + width, header_line_height);
        x += width;
    }
    emit_frame(engine.tree, columns_block, table, 0.0, 0.0, x, header_line_height);
    emit_row_advance(engine, table, header_line_height);
    Ok(())
}

/// Insert a positioned text primitive before the table. The x offset is
/// shifted by the full column width for right alignment and half of it for
/// center, so the device's own alignment anchors at the right edge.
fn emit_cell_text(
    tree: &mut DocumentTree,
    table: NodeId,
    content: &str,
    align: Option<&str>,
    x: f64,
    width: f64,
) {
    let adjust = match TextAlign::from_attr(align) {
        TextAlign::Left => 0.0,
        TextAlign::Center => width / 2.0,
        TextAlign::Right => width,
    };
    let text = tree.create(NodeKind::Text);
    tree.set_text(text, content);
    if let Some(align) = align {
        tree.set_attr(text, "align", align);
    }
    tree.set_attr(text, "relX", (x + adjust).to_string());
    tree.insert_before(table, text);
}

/// Frame rule: one line per side whose border flag is `"1"`, each side
/// independent, inserted before `position`.
fn emit_frame(
    tree: &mut DocumentTree,
    reference: NodeId,
    position: NodeId,
    x1: f64,
    y1: f64,
    x2: f64,
    y2: f64,
) {
    if tree.attr(reference, "leftline") == Some("1") {
        let line = line_node(tree, x1, y1, x1, y2);
        tree.insert_before(position, line);
    }
    if tree.attr(reference, "rightline") == Some("1") {
        let line = line_node(tree, x2, y1, x2, y2);
        tree.insert_before(position, line);
    }
    if tree.attr(reference, "topline") == Some("1") {
        let line = line_node(tree, x1, y1, x2, y1);
        tree.insert_before(position, line);
    }
    if tree.attr(reference, "bottomline") == Some("1") {
        let line = line_node(tree, x1, y2, x2, y2);
        tree.insert_before(position, line);
    }
}

/// Close out a header or data row: advance both the document (via a move
/// primitive) and the transform cursor by the row height.
fn emit_row_advance(engine: &mut TransformEngine, table: NodeId, height: f64) {
    let mv = engine.tree.create(NodeKind::Move);
    engine.tree.set_attr(mv, "relY", height.to_string());
    engine.tree.insert_before(table, mv);
    engine.cursor.y += height;
}

/// Auto-grow heuristic: rows get one extra line per full 40 characters in
/// their longest cell.
fn auto_line_count(tree: &DocumentTree, cells: &[NodeId]) -> usize {
    let longest = cells
        .iter()
        .map(|&cell| tree.text(cell).chars().count())
        .max()
        .unwrap_or(0);
    1 + longest / CHARS_PER_LINE
}

/// Hard-wrap cell text: a line break after every complete 41-character run.
/// Character-count wrap, not word-aware.
fn wrap_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + text.len() / WRAP_RUN + 1);
    for (i, ch) in text.chars().enumerate() {
        out.push(ch);
        if (i + 1) % WRAP_RUN == 0 {
            out.push('\n');
        }
    }
    out
}

fn child_of_kind(tree: &DocumentTree, parent: NodeId, kind: NodeKind) -> Option<NodeId> {
    tree.children(parent)
        .iter()
        .copied()
        .find(|&c| tree.kind(c) == &kind)
}

fn children_of_kind(tree: &DocumentTree, parent: NodeId, kind: NodeKind) -> Vec<NodeId> {
    tree.children(parent)
        .iter()
        .copied()
        .filter(|&c| tree.kind(c) == &kind)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrap_breaks_after_each_full_run() {
        let text: String = "x".repeat(82);
        let wrapped = wrap_text(&text);
        // 82 characters is exactly two 41-character runs, so breaks land at
        // positions 41 and 82 — not at 40.
        let breaks: Vec<usize> = wrapped
            .char_indices()
            .filter(|&(_, c)| c == '\n')
            .map(|(i, _)| i)
            .collect();
        assert_eq!(breaks, vec![41, 83]);
        assert_eq!(wrapped.lines().next().unwrap().chars().count(), 41);
        assert_eq!(wrapped.lines().nth(1).unwrap().chars().count(), 41);
    }

    #[test]
    fn test_wrap_leaves_short_text_alone() {
        assert_eq!(wrap_text("short"), "short");
        assert_eq!(wrap_text(""), "");
        let exactly_41: String = "y".repeat(41);
        assert_eq!(wrap_text(&exactly_41), format!("{exactly_41}\n"));
    }

    #[test]
    fn test_auto_line_count_uses_longest_cell() {
        let mut tree = DocumentTree::new();
        let short = tree.create(NodeKind::Cell);
        tree.set_text(short, "a");
        let long = tree.create(NodeKind::Cell);
        tree.set_text(long, "b".repeat(85));

        assert_eq!(auto_line_count(&tree, &[short]), 1);
        // 85 chars at 40 per line adds two extra lines.
        assert_eq!(auto_line_count(&tree, &[short, long]), 3);
        assert_eq!(auto_line_count(&tree, &[]), 1);
    }
}
