//! # Page Geometry
//!
//! Resolves the document root's attributes into an immutable [`PageGeometry`]
//! shared by the transform pass (overflow decisions) and the print pass
//! (coordinate scaling). Resolution happens exactly once per job.
//!
//! Document units are millimetres; devices draw in hundredths of an inch,
//! hence the fixed conversion constant.

use log::debug;

use crate::error::Result;
use crate::model::{DocumentTree, NodeId};

/// Device units per document unit before user scaling.
pub const UNITS_PER_MM: f64 = 100.0 / 25.4;

/// Standard paper sizes known to the output device family, in millimetres.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaperSize {
    A3,
    A4,
    A5,
    Letter,
    Legal,
}

impl PaperSize {
    /// Look up a size by name, case-insensitively.
    pub fn from_name(name: &str) -> Option<PaperSize> {
        match name.to_ascii_lowercase().as_str() {
            "a3" => Some(PaperSize::A3),
            "a4" => Some(PaperSize::A4),
            "a5" => Some(PaperSize::A5),
            "letter" => Some(PaperSize::Letter),
            "legal" => Some(PaperSize::Legal),
            _ => None,
        }
    }

    /// Returns (width, height) in document units, portrait orientation.
    pub fn dimensions(&self) -> (f64, f64) {
        match self {
            PaperSize::A3 => (297.0, 420.0),
            PaperSize::A4 => (210.0, 297.0),
            PaperSize::A5 => (148.0, 210.0),
            PaperSize::Letter => (216.0, 279.0),
            PaperSize::Legal => (216.0, 356.0),
        }
    }
}

/// Page dimensions, margins, orientation, and the document-unit-to-device-
/// unit resolution factor. Computed once, immutable afterwards.
#[derive(Debug, Clone, Copy)]
pub struct PageGeometry {
    pub width: f64,
    pub height: f64,
    pub left_margin: f64,
    pub right_margin: f64,
    pub top_margin: f64,
    pub bottom_margin: f64,
    pub landscape: bool,
    pub res_factor: f64,
}

impl PageGeometry {
    /// Read the root-level attributes of `tree` and establish the page setup.
    ///
    /// A `papersize` naming a known standard size wins over explicit
    /// `width`/`height`/`scale`; `landscape="1"` swaps the axes after either
    /// path. Margins default to 0.
    pub fn resolve(tree: &DocumentTree) -> Result<PageGeometry> {
        let root = tree.root();

        let named = tree.attr(root, "papersize").and_then(PaperSize::from_name);
        let (mut width, mut height, res_factor) = match named {
            Some(size) => {
                let (w, h) = size.dimensions();
                (w, h, UNITS_PER_MM)
            }
            None => {
                let w = tree.optional_f64(root, "width")?.unwrap_or(210.0);
                let h = tree.optional_f64(root, "height")?.unwrap_or(297.0);
                let scale = tree.optional_f64(root, "scale")?.unwrap_or(1.0);
                (w, h, UNITS_PER_MM * scale)
            }
        };

        let landscape = tree.attr(root, "landscape") == Some("1");
        if landscape {
            std::mem::swap(&mut width, &mut height);
        }

        let geometry = PageGeometry {
            width,
            height,
            left_margin: tree.optional_f64(root, "left")?.unwrap_or(0.0),
            right_margin: tree.optional_f64(root, "right")?.unwrap_or(0.0),
            top_margin: tree.optional_f64(root, "top")?.unwrap_or(0.0),
            bottom_margin: tree.optional_f64(root, "bottom")?.unwrap_or(0.0),
            landscape,
            res_factor,
        };
        debug!(
            "page setup: {}x{} (landscape: {}), res factor {:.3}",
            geometry.width, geometry.height, geometry.landscape, geometry.res_factor
        );
        Ok(geometry)
    }

    /// The Y coordinate content may not reach: page height minus the bottom
    /// margin. Both passes break pages against this limit.
    pub fn printable_height(&self) -> f64 {
        self.height - self.bottom_margin
    }

    /// Starting cursor for either pass: the top-left content corner.
    pub fn initial_cursor(&self) -> Cursor {
        Cursor {
            x: self.left_margin,
            y: self.top_margin,
        }
    }

    /// Convert a document-unit length to device units.
    pub fn to_device(&self, v: f64) -> f64 {
        v * self.res_factor
    }
}

/// A mutable position in document units.
///
/// Two logically independent instances exist per job: one drives the
/// transform pass's overflow estimation, one drives the print pass's actual
/// drawing. They follow the same update rules but are never shared, because
/// the tree changes shape between the passes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cursor {
    pub x: f64,
    pub y: f64,
}

/// Resolve a point from a node's position attributes against a base
/// position. Absolute attributes are margin-relative and override the base;
/// relative attributes add on top; abs applies before rel. Each axis
/// defaults to the base when neither attribute is present.
///
/// The attribute names are parameters because lines carry two points
/// (`absFromX`…`relToY`) under the same rules.
pub(crate) fn resolve_position(
    tree: &DocumentTree,
    geometry: &PageGeometry,
    node: NodeId,
    base: Cursor,
    abs_x: &str,
    abs_y: &str,
    rel_x: &str,
    rel_y: &str,
) -> Result<(f64, f64)> {
    let mut x = base.x;
    let mut y = base.y;
    if let Some(v) = tree.optional_f64(node, abs_x)? {
        x = geometry.left_margin + v;
    }
    if let Some(v) = tree.optional_f64(node, abs_y)? {
        y = geometry.top_margin + v;
    }
    if let Some(v) = tree.optional_f64(node, rel_x)? {
        x += v;
    }
    if let Some(v) = tree.optional_f64(node, rel_y)? {
        y += v;
    }
    Ok((x, y))
}

/// Apply a `move` node to a cursor. Both passes use this same rule on
/// their own cursor instance.
pub(crate) fn apply_move(
    tree: &DocumentTree,
    geometry: &PageGeometry,
    node: NodeId,
    cursor: &mut Cursor,
) -> Result<()> {
    let (x, y) = resolve_position(tree, geometry, node, *cursor, "absX", "absY", "relX", "relY")?;
    cursor.x = x;
    cursor.y = y;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::DocumentTree;

    fn tree_with_root_attrs(attrs: &[(&str, &str)]) -> DocumentTree {
        let mut tree = DocumentTree::new();
        for (name, value) in attrs {
            tree.set_attr(tree.root(), name, *value);
        }
        tree
    }

    #[test]
    fn test_defaults_are_a4_portrait() {
        let geometry = PageGeometry::resolve(&tree_with_root_attrs(&[])).unwrap();
        assert_eq!(geometry.width, 210.0);
        assert_eq!(geometry.height, 297.0);
        assert_eq!(geometry.left_margin, 0.0);
        assert!((geometry.res_factor - UNITS_PER_MM).abs() < 1e-9);
    }

    #[test]
    fn test_papersize_overrides_width_height() {
        let geometry = PageGeometry::resolve(&tree_with_root_attrs(&[
            ("papersize", "Letter"),
            ("width", "50"),
            ("height", "50"),
        ]))
        .unwrap();
        assert_eq!(geometry.width, 216.0);
        assert_eq!(geometry.height, 279.0);
    }

    #[test]
    fn test_unknown_papersize_falls_back_to_explicit_size() {
        let geometry = PageGeometry::resolve(&tree_with_root_attrs(&[
            ("papersize", "Imperial Octavo"),
            ("width", "120"),
            ("height", "180"),
            ("scale", "2"),
        ]))
        .unwrap();
        assert_eq!(geometry.width, 120.0);
        assert_eq!(geometry.height, 180.0);
        assert!((geometry.res_factor - UNITS_PER_MM * 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_landscape_swaps_axes() {
        let geometry = PageGeometry::resolve(&tree_with_root_attrs(&[
            ("papersize", "a4"),
            ("landscape", "1"),
        ]))
        .unwrap();
        assert_eq!(geometry.width, 297.0);
        assert_eq!(geometry.height, 210.0);
        assert!(geometry.landscape);
    }

    #[test]
    fn test_margins_and_cursor() {
        let geometry = PageGeometry::resolve(&tree_with_root_attrs(&[
            ("left", "20"),
            ("top", "10"),
            ("bottom", "15"),
        ]))
        .unwrap();
        assert_eq!(geometry.printable_height(), 297.0 - 15.0);
        let cursor = geometry.initial_cursor();
        assert_eq!(cursor.x, 20.0);
        assert_eq!(cursor.y, 10.0);
    }

    #[test]
    fn test_non_numeric_dimension_is_fatal() {
        let err = PageGeometry::resolve(&tree_with_root_attrs(&[("width", "wide")]));
        assert!(err.is_err());
    }
}
