//! Page geometry, text styles and the flow cursor that places wrapped lines.

mod cursor;
pub mod metrics;

pub use cursor::{wrap_text, PageLayoutState, TextFlowCursor};

use serde::Serialize;

/// Line pitch as a multiple of the font size.
pub const LINE_SPACING: f32 = 1.4;

const MM: f32 = 72.0 / 25.4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PageSize {
    A4,
    Letter,
}

impl PageSize {
    pub fn from_name(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "a4" => Some(Self::A4),
            "letter" | "carta" => Some(Self::Letter),
            _ => None,
        }
    }

    /// Width and height in points.
    pub const fn dimensions(self) -> (f32, f32) {
        match self {
            Self::A4 => (595.28, 841.89),
            Self::Letter => (612.0, 792.0),
        }
    }
}

/// Fixed page box for one document.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PageGeometry {
    pub width: f32,
    pub height: f32,
    pub margin_x: f32,
    pub margin_y: f32,
}

impl PageGeometry {
    pub fn for_size(size: PageSize) -> Self {
        let (width, height) = size.dimensions();
        Self {
            width,
            height,
            margin_x: 20.0 * MM,
            margin_y: 20.0 * MM,
        }
    }

    pub fn content_width(&self) -> f32 {
        self.width - 2.0 * self.margin_x
    }

    /// Lowest baseline allowed on a page, measured from the top edge.
    pub fn bottom(&self) -> f32 {
        self.height - self.margin_y
    }
}

impl Default for PageGeometry {
    fn default() -> Self {
        Self::for_size(PageSize::A4)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FontWeight {
    Regular,
    Bold,
}

impl FontWeight {
    /// Resource name of the font inside the PDF page dictionary.
    pub const fn resource_name(self) -> &'static [u8] {
        match self {
            Self::Regular => b"F1",
            Self::Bold => b"F2",
        }
    }

    pub const fn base_font(self) -> &'static [u8] {
        match self {
            Self::Regular => b"Helvetica",
            Self::Bold => b"Helvetica-Bold",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Color {
    pub const BLACK: Self = Self::rgb(0.0, 0.0, 0.0);
    pub const AMBER: Self = Self::rgb(0.706, 0.325, 0.035);

    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TextStyle {
    pub size: f32,
    pub weight: FontWeight,
    pub color: Color,
}

impl TextStyle {
    pub const BODY: Self = Self::new(11.0, FontWeight::Regular, Color::BLACK);
    pub const HEADING: Self = Self::new(12.0, FontWeight::Bold, Color::BLACK);
    pub const TITLE: Self = Self::new(13.0, FontWeight::Bold, Color::BLACK);
    pub const NOTE: Self = Self::new(9.0, FontWeight::Regular, Color::AMBER);

    pub const fn new(size: f32, weight: FontWeight, color: Color) -> Self {
        Self {
            size,
            weight,
            color,
        }
    }

    pub fn line_height(&self) -> f32 {
        self.size * LINE_SPACING
    }
}

/// One line of text at its final position. `baseline` is measured from the
/// top edge of the page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlacedLine {
    pub text: String,
    pub x: f32,
    pub baseline: f32,
    pub style: TextStyle,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LaidOutPage {
    pub lines: Vec<PlacedLine>,
}

/// Output of a layout pass, ready to be serialized to PDF.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LaidOutDocument {
    pub geometry: PageGeometry,
    pub pages: Vec<LaidOutPage>,
}

impl LaidOutDocument {
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn lines(&self) -> impl Iterator<Item = &PlacedLine> {
        self.pages.iter().flat_map(|page| page.lines.iter())
    }

    /// All drawn text, one line per row, pages in order.
    pub fn plain_text(&self) -> String {
        self.lines()
            .map(|line| line.text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LayoutError {
    #[error("invalid page geometry: {0}")]
    InvalidGeometry(&'static str),
}
