//! # Output Devices
//!
//! The engine draws through the [`RenderDevice`] trait and never learns
//! what is on the other side — a printer, a preview surface, or the
//! in-memory [`RecordingDevice`] used by tests and the CLI.
//!
//! All coordinates arriving here are already scaled to device units. Text
//! may contain `\n`; multi-line placement is the device's concern.

use serde::Serialize;

use crate::style::{Color, FontSpec, TextAlign};

/// An abstract paginated output surface.
///
/// The engine calls `begin_page` once per logical page, a sequence of draw
/// calls, then `end_page` with whether more pages follow.
pub trait RenderDevice {
    /// A fresh page is starting.
    fn begin_page(&mut self);

    /// Draw a string at (x, y) with the given font, fill color, and
    /// horizontal alignment anchor.
    fn draw_text(
        &mut self,
        text: &str,
        font: &FontSpec,
        color: Color,
        x: f64,
        y: f64,
        align: TextAlign,
    );

    /// Draw a straight line between two points with the pen color.
    fn draw_line(&mut self, color: Color, x1: f64, y1: f64, x2: f64, y2: f64);

    /// Draw an ellipse inscribed in the bounding box at (x, y) with the
    /// given extent, with the pen color.
    fn draw_ellipse(&mut self, color: Color, x: f64, y: f64, width: f64, height: f64);

    /// The current page is complete. `has_more` signals whether another
    /// `begin_page` will follow.
    fn end_page(&mut self, has_more: bool);
}

/// A single recorded draw call.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum DrawOp {
    Text {
        text: String,
        font: FontSpec,
        color: Color,
        x: f64,
        y: f64,
        align: TextAlign,
    },
    Line {
        color: Color,
        x1: f64,
        y1: f64,
        x2: f64,
        y2: f64,
    },
    Ellipse {
        color: Color,
        x: f64,
        y: f64,
        width: f64,
        height: f64,
    },
}

/// A device that records every draw call, one op vector per page.
///
/// This is what tests assert against and what the CLI dumps.
#[derive(Debug, Default)]
pub struct RecordingDevice {
    pages: Vec<Vec<DrawOp>>,
}

impl RecordingDevice {
    pub fn new() -> Self {
        Self::default()
    }

    /// The recorded pages, in order.
    pub fn pages(&self) -> &[Vec<DrawOp>] {
        &self.pages
    }

    fn current_page(&mut self) -> &mut Vec<DrawOp> {
        // Tolerate draws without an explicit begin_page, e.g. when a
        // walker is driven directly in tests.
        if self.pages.is_empty() {
            self.pages.push(Vec::new());
        }
        self.pages.last_mut().unwrap()
    }
}

impl RenderDevice for RecordingDevice {
    fn begin_page(&mut self) {
        self.pages.push(Vec::new());
    }

    fn draw_text(
        &mut self,
        text: &str,
        font: &FontSpec,
        color: Color,
        x: f64,
        y: f64,
        align: TextAlign,
    ) {
        let op = DrawOp::Text {
            text: text.to_string(),
            font: font.clone(),
            color,
            x,
            y,
            align,
        };
        self.current_page().push(op);
    }

    fn draw_line(&mut self, color: Color, x1: f64, y1: f64, x2: f64, y2: f64) {
        self.current_page().push(DrawOp::Line { color, x1, y1, x2, y2 });
    }

    fn draw_ellipse(&mut self, color: Color, x: f64, y: f64, width: f64, height: f64) {
        self.current_page().push(DrawOp::Ellipse {
            color,
            x,
            y,
            width,
            height,
        });
    }

    fn end_page(&mut self, _has_more: bool) {}
}
