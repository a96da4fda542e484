//! # Style System
//!
//! Colors, fonts, and the per-page style stacks the print pass draws with.
//!
//! Font and color nodes exhibit two distinct behaviors: a scoped push/pop
//! around their subtree when they have children, and an in-place replacement
//! of the current top entry when leafless. That duality is modelled
//! explicitly as [`StyleChange`] so call sites dispatch on a tagged variant
//! instead of inferring intent from stack depths.

use serde::{Deserialize, Serialize};

/// An RGBA color.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f64, // 0.0 - 1.0
    pub g: f64,
    pub b: f64,
    pub a: f64,
}

impl Color {
    pub const BLACK: Color = Color {
        r: 0.0,
        g: 0.0,
        b: 0.0,
        a: 1.0,
    };
    pub const WHITE: Color = Color {
        r: 1.0,
        g: 1.0,
        b: 1.0,
        a: 1.0,
    };

    pub fn rgb(r: f64, g: f64, b: f64) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    /// Resolve a color name. Unknown names fall back to black; a wrong
    /// color never fails a report.
    pub fn from_name(name: &str) -> Self {
        match name.to_ascii_lowercase().as_str() {
            "black" => Color::BLACK,
            "white" => Color::WHITE,
            "red" => Color::rgb(1.0, 0.0, 0.0),
            "green" => Color::rgb(0.0, 0.5, 0.0),
            "lime" => Color::rgb(0.0, 1.0, 0.0),
            "blue" => Color::rgb(0.0, 0.0, 1.0),
            "yellow" => Color::rgb(1.0, 1.0, 0.0),
            "orange" => Color::rgb(1.0, 0.65, 0.0),
            "purple" => Color::rgb(0.5, 0.0, 0.5),
            "brown" => Color::rgb(0.65, 0.16, 0.16),
            "gray" | "grey" => Color::rgb(0.5, 0.5, 0.5),
            "silver" => Color::rgb(0.75, 0.75, 0.75),
            "maroon" => Color::rgb(0.5, 0.0, 0.0),
            "navy" => Color::rgb(0.0, 0.0, 0.5),
            "teal" => Color::rgb(0.0, 0.5, 0.5),
            "olive" => Color::rgb(0.5, 0.5, 0.0),
            "cyan" | "aqua" => Color::rgb(0.0, 1.0, 1.0),
            "magenta" | "fuchsia" => Color::rgb(1.0, 0.0, 1.0),
            other => {
                log::warn!("unknown color name '{other}', using black");
                Color::BLACK
            }
        }
    }

    /// Parse a `#rgb` / `#rrggbb` hex color.
    pub fn hex(hex: &str) -> Self {
        let hex = hex.trim_start_matches('#');
        let (r, g, b) = match hex.len() {
            3 => {
                let r = u8::from_str_radix(&hex[0..1].repeat(2), 16).unwrap_or(0);
                let g = u8::from_str_radix(&hex[1..2].repeat(2), 16).unwrap_or(0);
                let b = u8::from_str_radix(&hex[2..3].repeat(2), 16).unwrap_or(0);
                (r, g, b)
            }
            6 => {
                let r = u8::from_str_radix(&hex[0..2], 16).unwrap_or(0);
                let g = u8::from_str_radix(&hex[2..4], 16).unwrap_or(0);
                let b = u8::from_str_radix(&hex[4..6], 16).unwrap_or(0);
                (r, g, b)
            }
            _ => (0, 0, 0),
        };
        Self {
            r: r as f64 / 255.0,
            g: g as f64 / 255.0,
            b: b as f64 / 255.0,
            a: 1.0,
        }
    }
}

impl Default for Color {
    fn default() -> Self {
        Color::BLACK
    }
}

/// A concrete font selection: family name, size in points, bold flag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FontSpec {
    pub name: String,
    pub size: f64,
    pub bold: bool,
}

impl Default for FontSpec {
    /// The document default body font.
    fn default() -> Self {
        FontSpec {
            name: "Arial".to_string(),
            size: 10.0,
            bold: false,
        }
    }
}

impl FontSpec {
    /// Layer overrides onto this font. `bold` follows the attribute
    /// convention: `"1"` sets the flag, any other present value clears it,
    /// absence inherits.
    pub fn with_overrides(
        &self,
        name: Option<&str>,
        size: Option<f64>,
        bold: Option<&str>,
    ) -> FontSpec {
        FontSpec {
            name: name.map(str::to_string).unwrap_or_else(|| self.name.clone()),
            size: size.unwrap_or(self.size),
            bold: match bold {
                Some(flag) => flag == "1",
                None => self.bold,
            },
        }
    }
}

/// Horizontal text alignment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TextAlign {
    #[default]
    Left,
    Center,
    Right,
}

impl TextAlign {
    pub fn from_attr(value: Option<&str>) -> TextAlign {
        match value {
            Some("center") => TextAlign::Center,
            Some("right") => TextAlign::Right,
            _ => TextAlign::Left,
        }
    }
}

/// How a font/color node applies its effective style.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StyleChange {
    /// The node has children: push for the subtree, pop on return.
    Scoped,
    /// Leafless: replace the current top entry, affecting later siblings.
    Persistent,
}

impl StyleChange {
    pub fn classify(has_children: bool) -> StyleChange {
        if has_children {
            StyleChange::Scoped
        } else {
            StyleChange::Persistent
        }
    }
}

/// The pen-color, fill-color, and font stacks of the print pass.
///
/// One entry is always present on each stack. The walker rebuilds the
/// stacks from defaults at the start of every page.
#[derive(Debug, Clone)]
pub struct StyleStacks {
    pen: Vec<Color>,
    fill: Vec<Color>,
    font: Vec<FontSpec>,
}

impl Default for StyleStacks {
    fn default() -> Self {
        StyleStacks {
            pen: vec![Color::BLACK],
            fill: vec![Color::BLACK],
            font: vec![FontSpec::default()],
        }
    }
}

impl StyleStacks {
    pub fn pen(&self) -> Color {
        *self.pen.last().expect("pen stack never empty")
    }

    pub fn fill(&self) -> Color {
        *self.fill.last().expect("fill stack never empty")
    }

    pub fn font(&self) -> &FontSpec {
        self.font.last().expect("font stack never empty")
    }

    pub fn push_font(&mut self, font: FontSpec) {
        self.font.push(font);
    }

    pub fn pop_font(&mut self) {
        debug_assert!(self.font.len() > 1, "popping the default font");
        self.font.pop();
    }

    pub fn replace_font(&mut self, font: FontSpec) {
        *self.font.last_mut().expect("font stack never empty") = font;
    }

    pub fn push_colors(&mut self, pen: Color, fill: Color) {
        self.pen.push(pen);
        self.fill.push(fill);
    }

    pub fn pop_colors(&mut self) {
        debug_assert!(self.pen.len() > 1, "popping the default pen");
        self.pen.pop();
        self.fill.pop();
    }

    pub fn replace_colors(&mut self, pen: Color, fill: Color) {
        *self.pen.last_mut().expect("pen stack never empty") = pen;
        *self.fill.last_mut().expect("fill stack never empty") = fill;
    }

    /// Current font stack depth; tests assert scopes balance.
    pub fn font_depth(&self) -> usize {
        self.font.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_named_colors() {
        assert_eq!(Color::from_name("Red"), Color::rgb(1.0, 0.0, 0.0));
        assert_eq!(Color::from_name("grey"), Color::from_name("gray"));
        // Unknown names degrade to black rather than failing the job.
        assert_eq!(Color::from_name("heliotrope"), Color::BLACK);
    }

    #[test]
    fn test_hex_colors() {
        assert_eq!(Color::hex("#ff0000"), Color::rgb(1.0, 0.0, 0.0));
        assert_eq!(Color::hex("fff"), Color::WHITE);
    }

    #[test]
    fn test_font_overrides() {
        let base = FontSpec::default();
        let headline = base.with_overrides(Some("Times New Roman"), Some(16.0), Some("1"));
        assert_eq!(headline.name, "Times New Roman");
        assert_eq!(headline.size, 16.0);
        assert!(headline.bold);

        // A present-but-non-"1" bold flag clears; absence inherits.
        let cleared = headline.with_overrides(None, None, Some("0"));
        assert!(!cleared.bold);
        let inherited = headline.with_overrides(None, Some(12.0), None);
        assert!(inherited.bold);
        assert_eq!(inherited.name, "Times New Roman");
    }

    #[test]
    fn test_style_change_classification() {
        assert_eq!(StyleChange::classify(true), StyleChange::Scoped);
        assert_eq!(StyleChange::classify(false), StyleChange::Persistent);
    }

    #[test]
    fn test_stacks_replace_vs_push() {
        let mut stacks = StyleStacks::default();
        let bold = FontSpec {
            bold: true,
            ..FontSpec::default()
        };

        stacks.replace_font(bold.clone());
        assert_eq!(stacks.font_depth(), 1);
        assert!(stacks.font().bold);

        stacks.push_font(FontSpec::default());
        assert_eq!(stacks.font_depth(), 2);
        assert!(!stacks.font().bold);
        stacks.pop_font();
        assert!(stacks.font().bold);
    }
}
