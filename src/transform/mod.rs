//! # Transform Pass
//!
//! This is the heart of Folio and the reason it exists.
//!
//! The input tree describes a report in structural terms: tables, rectangles,
//! cursor movements. The output device understands none of that — it draws
//! text, lines, and ellipses at coordinates. The transform pass bridges the
//! two by rewriting the tree in place until only primitive drawing elements
//! remain, and it decides pagination while doing so: a running content-height
//! cursor tracks how far down the page each element lands, and a `newpage`
//! marker is inserted the moment the cursor passes the printable height.
//!
//! Page breaks are therefore a side effect of content accumulation, not an
//! author directive — although explicit `newpage` nodes are honored too.
//!
//! ## Mutating the tree being traversed
//!
//! Expanding a node inserts new siblings before it and then removes it,
//! which would corrupt a naive child iteration. The walk captures each
//! node's next-sibling handle *before* the node's effect runs; arena handles
//! stay valid across insertions and removals, so the captured handle is
//! always the right place to continue.

pub mod table;

use log::{debug, info};

use crate::error::Result;
use crate::geometry::{apply_move, Cursor, PageGeometry};
use crate::model::{DocumentTree, NodeId, NodeKind};

/// Expand the tree in place so only primitive drawing elements remain in
/// the body, inserting page-break markers as content accumulates.
///
/// Runs exactly once per job, before any page is drawn.
pub fn transform(tree: &mut DocumentTree, geometry: &PageGeometry) -> Result<()> {
    let mut engine = TransformEngine {
        tree,
        geometry,
        cursor: geometry.initial_cursor(),
    };
    let first = engine.tree.first_child(engine.tree.root());
    engine.transform_nodes(first)?;
    info!(
        "transform complete: {} nodes in document order",
        engine.tree.flatten().len()
    );
    Ok(())
}

pub(crate) struct TransformEngine<'a> {
    pub(crate) tree: &'a mut DocumentTree,
    pub(crate) geometry: &'a PageGeometry,
    /// The transform-time overflow cursor. Independent from the print
    /// pass's rendering cursor; the two passes run over differently shaped
    /// trees and must re-derive their positions.
    pub(crate) cursor: Cursor,
}

impl<'a> TransformEngine<'a> {
    fn transform_nodes(&mut self, first: Option<NodeId>) -> Result<()> {
        let mut next = first;
        while let Some(current) = next {
            // Captured before the node's effect runs: expansion may insert
            // siblings before `current` or remove it entirely.
            next = self.tree.next_sibling(current);

            match self.tree.kind(current).clone() {
                NodeKind::Move => {
                    apply_move(self.tree, self.geometry, current, &mut self.cursor)?;
                }
                NodeKind::Rectangle => {
                    self.expand_rectangle(current)?;
                    // Replaced and removed; nothing left to recurse into.
                    continue;
                }
                NodeKind::Table => {
                    table::expand(self, current)?;
                    continue;
                }
                NodeKind::NewPage => {
                    self.cursor.y = self.geometry.top_margin;
                }
                _ => {}
            }

            self.transform_nodes(self.tree.first_child(current))?;

            if self.cursor.y >= self.geometry.printable_height() {
                self.insert_page_break_before(current);
            }
        }
        Ok(())
    }

    /// Replace a rectangle with four lines tracing its relative bounding
    /// box, in fixed edge order: top, right, bottom, left.
    fn expand_rectangle(&mut self, rect: NodeId) -> Result<()> {
        let x1 = self.tree.required_f64(rect, "relFromX")?;
        let y1 = self.tree.required_f64(rect, "relFromY")?;
        let x2 = self.tree.required_f64(rect, "relToX")?;
        let y2 = self.tree.required_f64(rect, "relToY")?;

        let edges = [
            (x1, y1, x2, y1),
            (x2, y1, x2, y2),
            (x2, y2, x1, y2),
            (x1, y2, x1, y1),
        ];
        for (ax, ay, bx, by) in edges {
            let line = line_node(self.tree, ax, ay, bx, by);
            self.tree.insert_before(rect, line);
        }
        self.tree.detach(rect);
        Ok(())
    }

    /// Insert a page-break marker before `node` and reset the overflow
    /// cursor to the top of the content area.
    pub(crate) fn insert_page_break_before(&mut self, node: NodeId) {
        debug!("page break at y={:.1}", self.cursor.y);
        let newpage = self.tree.create(NodeKind::NewPage);
        self.tree.insert_before(node, newpage);
        self.cursor.y = self.geometry.top_margin;
    }
}

/// Allocate a detached line primitive with relative start and end points.
pub(crate) fn line_node(tree: &mut DocumentTree, x1: f64, y1: f64, x2: f64, y2: f64) -> NodeId {
    let line = tree.create(NodeKind::Line);
    tree.set_attr(line, "relFromX", x1.to_string());
    tree.set_attr(line, "relFromY", y1.to_string());
    tree.set_attr(line, "relToX", x2.to_string());
    tree.set_attr(line, "relToY", y2.to_string());
    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FolioError;

    fn a4_geometry(tree: &DocumentTree) -> PageGeometry {
        PageGeometry::resolve(tree).unwrap()
    }

    fn make_move(tree: &mut DocumentTree, attrs: &[(&str, &str)]) -> NodeId {
        let node = tree.create(NodeKind::Move);
        for (name, value) in attrs {
            tree.set_attr(node, name, *value);
        }
        node
    }

    #[test]
    fn test_rectangle_expands_to_four_lines_in_edge_order() {
        let mut tree = DocumentTree::new();
        let rect = tree.create(NodeKind::Rectangle);
        tree.set_attr(rect, "relFromX", "0");
        tree.set_attr(rect, "relFromY", "0");
        tree.set_attr(rect, "relToX", "50");
        tree.set_attr(rect, "relToY", "20");
        tree.append_child(tree.root(), rect);

        let geometry = a4_geometry(&tree);
        transform(&mut tree, &geometry).unwrap();

        let children = tree.children(tree.root()).to_vec();
        assert_eq!(children.len(), 4);
        for &child in &children {
            assert_eq!(tree.kind(child), &NodeKind::Line);
        }
        // Top, right, bottom, left.
        let ends: Vec<(&str, &str, &str, &str)> = children
            .iter()
            .map(|&c| {
                (
                    tree.attr(c, "relFromX").unwrap(),
                    tree.attr(c, "relFromY").unwrap(),
                    tree.attr(c, "relToX").unwrap(),
                    tree.attr(c, "relToY").unwrap(),
                )
            })
            .collect();
        assert_eq!(ends[0], ("0", "0", "50", "0"));
        assert_eq!(ends[1], ("50", "0", "50", "20"));
        assert_eq!(ends[2], ("50", "20", "0", "20"));
        assert_eq!(ends[3], ("0", "20", "0", "0"));
    }

    #[test]
    fn test_rectangle_missing_corner_is_fatal() {
        let mut tree = DocumentTree::new();
        let rect = tree.create(NodeKind::Rectangle);
        tree.set_attr(rect, "relFromX", "0");
        tree.set_attr(rect, "relFromY", "0");
        tree.set_attr(rect, "relToX", "50");
        tree.append_child(tree.root(), rect);

        let geometry = a4_geometry(&tree);
        let err = transform(&mut tree, &geometry).unwrap_err();
        assert!(matches!(
            err,
            FolioError::MissingAttribute { ref attr, .. } if attr == "relToY"
        ));
    }

    #[test]
    fn test_move_abs_applies_before_rel() {
        let mut tree = DocumentTree::new();
        tree.set_attr(tree.root(), "left", "10");
        tree.set_attr(tree.root(), "top", "20");
        let mv = make_move(
            &mut tree,
            &[("absX", "5"), ("relX", "3"), ("absY", "0"), ("relY", "7")],
        );
        tree.append_child(tree.root(), mv);

        let geometry = a4_geometry(&tree);
        let mut cursor = geometry.initial_cursor();
        apply_move(&tree, &geometry, mv, &mut cursor).unwrap();
        // abs is margin-based and overrides, rel adds on top.
        assert_eq!(cursor.x, 10.0 + 5.0 + 3.0);
        assert_eq!(cursor.y, 20.0 + 0.0 + 7.0);
    }

    #[test]
    fn test_overflow_inserts_newpage_before_offending_node() {
        let mut tree = DocumentTree::new();
        tree.set_attr(tree.root(), "height", "100");
        tree.set_attr(tree.root(), "bottom", "10");
        let early = make_move(&mut tree, &[("relY", "50")]);
        let late = make_move(&mut tree, &[("relY", "60")]);
        tree.append_child(tree.root(), early);
        tree.append_child(tree.root(), late);

        let geometry = a4_geometry(&tree);
        transform(&mut tree, &geometry).unwrap();

        let kinds: Vec<NodeKind> = tree.flatten().into_iter().map(|(k, _)| k).collect();
        // The second move crossed 90, so the break lands before it.
        assert_eq!(kinds, vec![NodeKind::Move, NodeKind::NewPage, NodeKind::Move]);
    }

    #[test]
    fn test_explicit_newpage_resets_transform_cursor() {
        let mut tree = DocumentTree::new();
        tree.set_attr(tree.root(), "height", "100");
        let push = make_move(&mut tree, &[("relY", "80")]);
        let newpage = tree.create(NodeKind::NewPage);
        let push_again = make_move(&mut tree, &[("relY", "80")]);
        tree.append_child(tree.root(), push);
        tree.append_child(tree.root(), newpage);
        tree.append_child(tree.root(), push_again);

        let geometry = a4_geometry(&tree);
        transform(&mut tree, &geometry).unwrap();

        // The explicit newpage reset the cursor, and 80 < 100, so no
        // automatic break was added anywhere.
        let kinds: Vec<NodeKind> = tree.flatten().into_iter().map(|(k, _)| k).collect();
        assert_eq!(kinds, vec![NodeKind::Move, NodeKind::NewPage, NodeKind::Move]);
    }
}
