//! # Print Pass (Page Walker)
//!
//! The second half of the engine: a read-only, depth-first walk over the
//! transformed tree that emits draw calls to the output device, one page
//! per invocation.
//!
//! The walk is cooperative. The output subsystem asks for one page; the
//! walker fills it until it reaches a `newpage` marker (suspend) or runs
//! out of tree (finish), then returns control. The only state carried
//! between invocations is the resume pointer — a handle to the next
//! unvisited node. Everything else (cursor, style stacks) is rebuilt at the
//! start of every page, which is what makes the output identical whether a
//! document spans one page or fifty.
//!
//! ## Style scopes across page boundaries
//!
//! A font or color node with children scopes its style to its subtree. When
//! a page break lands inside such a subtree, this walker reconstructs the
//! enclosing scopes at the next page's start by replaying the resume node's
//! font/color ancestors onto the fresh stacks, so the scoped style is still
//! in effect mid-subtree. (A flat reset here would silently drop nested
//! styles at every page boundary; see DESIGN.md for the decision record.)

pub mod device;

use log::debug;

use crate::error::Result;
use crate::geometry::{apply_move, resolve_position, Cursor, PageGeometry};
use crate::model::{DocumentTree, NodeId, NodeKind};
use crate::style::{Color, StyleChange, StyleStacks, TextAlign};
use device::RenderDevice;

/// The two states of the page walker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalkState {
    /// Walking the tree and emitting draw calls.
    Rendering,
    /// Suspended at a page boundary, or finished when no resume position
    /// remains.
    PageComplete,
}

/// Walks the transformed tree page by page.
pub struct PageWalker<'a> {
    tree: &'a DocumentTree,
    geometry: &'a PageGeometry,
    /// The next unvisited node; `None` once the walk ascended past the
    /// document root.
    resume: Option<NodeId>,
    state: WalkState,
}

impl<'a> PageWalker<'a> {
    pub fn new(tree: &'a DocumentTree, geometry: &'a PageGeometry) -> Self {
        PageWalker {
            resume: tree.first_child(tree.root()),
            state: WalkState::Rendering,
            tree,
            geometry,
        }
    }

    /// Whether another `draw_page` call would produce output.
    pub fn has_more_pages(&self) -> bool {
        self.resume.is_some()
    }

    pub fn state(&self) -> WalkState {
        self.state
    }

    /// Render one page worth of primitives to `device`.
    ///
    /// Resets the rendering cursor and style stacks, reconstructs any
    /// font/color scopes enclosing the resume position, then walks forward
    /// until a page boundary or the end of the document.
    pub fn draw_page(&mut self, device: &mut dyn RenderDevice) -> Result<WalkState> {
        let Some(start) = self.resume else {
            self.state = WalkState::PageComplete;
            return Ok(self.state);
        };
        self.state = WalkState::Rendering;

        let mut cursor = self.geometry.initial_cursor();
        let mut styles = StyleStacks::default();
        self.rebuild_scopes(start, &mut styles)?;

        let mut current = Some(start);
        while let Some(node) = current {
            match self.tree.kind(node) {
                NodeKind::Move => {
                    apply_move(self.tree, self.geometry, node, &mut cursor)?;
                }
                NodeKind::Text => self.draw_text(node, cursor, &styles, device)?,
                NodeKind::Line => self.draw_line(node, cursor, &styles, device)?,
                NodeKind::Circle => self.draw_circle(node, cursor, &styles, device)?,
                NodeKind::Font => {
                    let font = self.effective_font(node, &styles)?;
                    match StyleChange::classify(self.tree.has_children(node)) {
                        StyleChange::Scoped => {
                            styles.push_font(font);
                            current = self.tree.first_child(node);
                            continue;
                        }
                        StyleChange::Persistent => styles.replace_font(font),
                    }
                }
                NodeKind::Color => {
                    let (pen, fill) = self.effective_colors(node, &styles);
                    match StyleChange::classify(self.tree.has_children(node)) {
                        StyleChange::Scoped => {
                            styles.push_colors(pen, fill);
                            current = self.tree.first_child(node);
                            continue;
                        }
                        StyleChange::Persistent => styles.replace_colors(pen, fill),
                    }
                }
                NodeKind::NewPage => {
                    // The only legal suspension point. Resume at the
                    // structural successor on the next invocation.
                    self.resume = self.successor(node);
                    self.state = WalkState::PageComplete;
                    debug!("page complete, more pages: {}", self.resume.is_some());
                    return Ok(self.state);
                }
                _ => {
                    // Not drawable, but the subtree is still walked so
                    // structural or unknown nodes never block traversal.
                    if let Some(child) = self.tree.first_child(node) {
                        current = Some(child);
                        continue;
                    }
                }
            }
            current = self.ascend(node, &mut styles);
        }

        self.resume = None;
        self.state = WalkState::PageComplete;
        debug!("document exhausted");
        Ok(self.state)
    }

    /// Successor with scope maintenance: next sibling if one exists,
    /// otherwise ascend toward the root, popping the style of every scoped
    /// font/color node the walk leaves on the way up.
    fn ascend(&self, node: NodeId, styles: &mut StyleStacks) -> Option<NodeId> {
        let mut n = node;
        loop {
            if let Some(sibling) = self.tree.next_sibling(n) {
                return Some(sibling);
            }
            let parent = self.tree.parent(n)?;
            if parent == self.tree.root() {
                return None;
            }
            match self.tree.kind(parent) {
                NodeKind::Font => styles.pop_font(),
                NodeKind::Color => styles.pop_colors(),
                _ => {}
            }
            n = parent;
        }
    }

    /// Plain structural successor, used for the resume pointer where the
    /// stacks are about to be discarded anyway.
    fn successor(&self, node: NodeId) -> Option<NodeId> {
        let mut n = node;
        loop {
            if let Some(sibling) = self.tree.next_sibling(n) {
                return Some(sibling);
            }
            let parent = self.tree.parent(n)?;
            if parent == self.tree.root() {
                return None;
            }
            n = parent;
        }
    }

    /// Replay the resume node's font/color ancestors (root downward) onto
    /// fresh stacks, so a walk resuming mid-scope still renders with the
    /// enclosing styles.
    fn rebuild_scopes(&self, start: NodeId, styles: &mut StyleStacks) -> Result<()> {
        let mut chain = Vec::new();
        let mut current = self.tree.parent(start);
        while let Some(node) = current {
            if node == self.tree.root() {
                break;
            }
            chain.push(node);
            current = self.tree.parent(node);
        }
        for &ancestor in chain.iter().rev() {
            match self.tree.kind(ancestor) {
                NodeKind::Font => {
                    let font = self.effective_font(ancestor, styles)?;
                    styles.push_font(font);
                }
                NodeKind::Color => {
                    let (pen, fill) = self.effective_colors(ancestor, styles);
                    styles.push_colors(pen, fill);
                }
                _ => {}
            }
        }
        Ok(())
    }

    fn draw_text(
        &self,
        node: NodeId,
        cursor: Cursor,
        styles: &StyleStacks,
        device: &mut dyn RenderDevice,
    ) -> Result<()> {
        let (x, y) = resolve_position(
            self.tree,
            self.geometry,
            node,
            cursor,
            "absX",
            "absY",
            "relX",
            "relY",
        )?;
        let align = TextAlign::from_attr(self.tree.attr(node, "align"));
        device.draw_text(
            self.tree.text(node),
            styles.font(),
            styles.fill(),
            self.geometry.to_device(x),
            self.geometry.to_device(y),
            align,
        );
        Ok(())
    }

    fn draw_line(
        &self,
        node: NodeId,
        cursor: Cursor,
        styles: &StyleStacks,
        device: &mut dyn RenderDevice,
    ) -> Result<()> {
        let (x1, y1) = resolve_position(
            self.tree,
            self.geometry,
            node,
            cursor,
            "absFromX",
            "absFromY",
            "relFromX",
            "relFromY",
        )?;
        let (x2, y2) = resolve_position(
            self.tree,
            self.geometry,
            node,
            cursor,
            "absToX",
            "absToY",
            "relToX",
            "relToY",
        )?;
        device.draw_line(
            styles.pen(),
            self.geometry.to_device(x1),
            self.geometry.to_device(y1),
            self.geometry.to_device(x2),
            self.geometry.to_device(y2),
        );
        Ok(())
    }

    fn draw_circle(
        &self,
        node: NodeId,
        cursor: Cursor,
        styles: &StyleStacks,
        device: &mut dyn RenderDevice,
    ) -> Result<()> {
        let (cx, cy) = resolve_position(
            self.tree,
            self.geometry,
            node,
            cursor,
            "absX",
            "absY",
            "relX",
            "relY",
        )?;
        let rad_x = self.tree.required_f64(node, "radX")?;
        let rad_y = self.tree.required_f64(node, "radY")?;
        device.draw_ellipse(
            styles.pen(),
            self.geometry.to_device(cx - rad_x),
            self.geometry.to_device(cy - rad_y),
            self.geometry.to_device(rad_x * 2.0),
            self.geometry.to_device(rad_y * 2.0),
        );
        Ok(())
    }

    fn effective_font(&self, node: NodeId, styles: &StyleStacks) -> Result<crate::style::FontSpec> {
        let name = self.tree.attr(node, "name");
        let size = self.tree.optional_f64(node, "size")?;
        let bold = self.tree.attr(node, "bold");
        Ok(styles.font().with_overrides(name, size, bold))
    }

    /// A color node sets pen and fill as a pair. `rgb` (hex) wins over
    /// `name`; with neither, the current colors carry over unchanged.
    fn effective_colors(&self, node: NodeId, styles: &StyleStacks) -> (Color, Color) {
        let mut color = None;
        if let Some(name) = self.tree.attr(node, "name") {
            color = Some(Color::from_name(name));
        }
        if let Some(rgb) = self.tree.attr(node, "rgb") {
            color = Some(Color::hex(rgb));
        }
        match color {
            Some(c) => (c, c),
            None => (styles.pen(), styles.fill()),
        }
    }
}
