//! # Folio
//!
//! A page-native report rendering engine.
//!
//! Folio takes a declarative, tree-structured document description —
//! tables, rectangles, lines, styled text — and renders it onto a paginated
//! output device. Pagination is not an afterthought: page breaks are decided
//! while the document is being expanded, driven by a running content-height
//! cursor, so a table that grows by one row moves its break by exactly one
//! row and repeats its header on the continuation page.
//!
//! ## Architecture
//!
//! ```text
//! Input (XML/JSON/API)
//!       ↓
//!   [model]      — Document tree: typed nodes, attributes, children
//!       ↓
//!   [geometry]   — Page size, margins, orientation, resolution factor
//!       ↓
//!   [transform]  — Expand tables/rectangles into primitives,
//!                  insert page breaks (mutates the tree in place)
//!       ↓
//!   [render]     — Resumable per-page walk emitting device draw calls
//! ```
//!
//! The render pass is cooperative: the device asks for one page at a time,
//! and the walker suspends at each page boundary, carrying only a resume
//! pointer between invocations.

pub mod error;
pub mod geometry;
pub mod model;
pub mod render;
pub mod style;
pub mod transform;
pub mod xml;

use log::info;

use error::Result;
use geometry::PageGeometry;
use model::DocumentTree;
use render::device::RenderDevice;
use render::PageWalker;

/// A prepared print job: geometry resolved, tree transformed, ready to
/// be driven one page at a time.
///
/// Dropping the job releases the document tree and all style state; that is
/// the only way to abort a partially rendered job.
#[derive(Debug)]
pub struct PrintJob {
    tree: DocumentTree,
    geometry: PageGeometry,
}

impl PrintJob {
    /// Resolve page geometry from the root attributes and run the
    /// transform pass. Both happen exactly once, before any page is drawn.
    pub fn new(mut tree: DocumentTree) -> Result<PrintJob> {
        let geometry = PageGeometry::resolve(&tree)?;
        transform::transform(&mut tree, &geometry)?;
        Ok(PrintJob { tree, geometry })
    }

    pub fn geometry(&self) -> &PageGeometry {
        &self.geometry
    }

    /// The transformed tree. Read-only; the print pass never mutates it.
    pub fn tree(&self) -> &DocumentTree {
        &self.tree
    }

    /// Drive the full page-by-page protocol against `device`.
    /// Returns the number of pages produced.
    pub fn run(&self, device: &mut dyn RenderDevice) -> Result<usize> {
        let mut walker = PageWalker::new(&self.tree, &self.geometry);
        let mut pages = 0;
        while walker.has_more_pages() {
            device.begin_page();
            walker.draw_page(device)?;
            pages += 1;
            device.end_page(walker.has_more_pages());
        }
        info!("job finished: {pages} page(s)");
        Ok(pages)
    }
}

/// Render an XML report document to `device`. Returns the page count.
///
/// This is the primary entry point.
pub fn render_xml(xml: &str, device: &mut dyn RenderDevice) -> Result<usize> {
    let tree = xml::parse_document(xml)?;
    PrintJob::new(tree)?.run(device)
}

/// Render a document described as JSON (the [`model::NodeSpec`] form) to
/// `device`. Returns the page count.
pub fn render_json(json: &str, device: &mut dyn RenderDevice) -> Result<usize> {
    let tree = DocumentTree::from_json(json)?;
    PrintJob::new(tree)?.run(device)
}
