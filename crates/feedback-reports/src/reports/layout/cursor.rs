use super::metrics::text_width;
use super::{
    FontWeight, LaidOutDocument, LaidOutPage, LayoutError, PageGeometry, PlacedLine, TextStyle,
};
use tracing::debug;

const WIDTH_TOLERANCE: f32 = 1e-3;

/// Mutable drawing state for one document. Never shared between documents.
#[derive(Debug, Clone, PartialEq)]
pub struct PageLayoutState {
    pub cursor_y: f32,
    pub page_width: f32,
    pub page_height: f32,
    pub margin_x: f32,
    pub margin_y: f32,
    pub line_height: f32,
    pub style: TextStyle,
}

impl PageLayoutState {
    fn new(geometry: PageGeometry, style: TextStyle) -> Self {
        Self {
            cursor_y: geometry.margin_y,
            page_width: geometry.width,
            page_height: geometry.height,
            margin_x: geometry.margin_x,
            margin_y: geometry.margin_y,
            line_height: style.line_height(),
            style,
        }
    }

    pub fn bottom(&self) -> f32 {
        self.page_height - self.margin_y
    }

    pub fn content_width(&self) -> f32 {
        self.page_width - 2.0 * self.margin_x
    }

    /// Vertical space between the top and bottom margins.
    pub fn usable_height(&self) -> f32 {
        self.bottom() - self.margin_y
    }

    fn at_top(&self) -> bool {
        self.cursor_y <= self.margin_y
    }
}

/// Places wrapped text top to bottom, breaking pages when a block would cross
/// the bottom margin.
#[derive(Debug)]
pub struct TextFlowCursor {
    geometry: PageGeometry,
    state: PageLayoutState,
    pages: Vec<LaidOutPage>,
}

impl TextFlowCursor {
    pub fn new(geometry: PageGeometry, style: TextStyle) -> Result<Self, LayoutError> {
        let values = [
            geometry.width,
            geometry.height,
            geometry.margin_x,
            geometry.margin_y,
            style.size,
        ];
        if values.iter().any(|value| !value.is_finite()) {
            return Err(LayoutError::InvalidGeometry("non-finite dimension"));
        }
        if style.size <= 0.0 || geometry.margin_x < 0.0 || geometry.margin_y < 0.0 {
            return Err(LayoutError::InvalidGeometry("negative margin or font size"));
        }
        if geometry.content_width() <= 0.0 {
            return Err(LayoutError::InvalidGeometry("margins leave no horizontal space"));
        }
        if geometry.bottom() - geometry.margin_y < TextStyle::TITLE.line_height() {
            return Err(LayoutError::InvalidGeometry("page cannot hold a single line"));
        }

        Ok(Self {
            geometry,
            state: PageLayoutState::new(geometry, style),
            pages: vec![LaidOutPage::default()],
        })
    }

    pub fn state(&self) -> &PageLayoutState {
        &self.state
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn set_style(&mut self, style: TextStyle) {
        self.state.style = style;
        self.state.line_height = style.line_height();
    }

    /// Runs `draw` with `style` active and restores the previous style after.
    pub fn with_style<T>(&mut self, style: TextStyle, draw: impl FnOnce(&mut Self) -> T) -> T {
        let previous = self.state.style;
        self.set_style(style);
        let output = draw(self);
        self.set_style(previous);
        output
    }

    pub fn wrap(&self, text: &str, max_width: f32) -> Vec<String> {
        wrap_text(text, max_width, self.state.style.size, self.state.style.weight)
    }

    /// Starts a new page when `line_count` lines at the current line height
    /// would cross the bottom margin. Returns whether a page was started.
    pub fn ensure_space(&mut self, line_count: usize) -> bool {
        self.ensure_height(line_count as f32 * self.state.line_height)
    }

    /// Height-based variant of [`Self::ensure_space`] for blocks mixing styles.
    pub fn ensure_height(&mut self, height: f32) -> bool {
        if self.state.cursor_y + height <= self.state.bottom() || self.state.at_top() {
            return false;
        }
        self.new_page();
        true
    }

    pub fn advance(&mut self, line_count: usize, extra: f32) {
        self.state.cursor_y += line_count as f32 * self.state.line_height + extra;
    }

    /// Adds one blank line's worth of vertical space at the current style.
    pub fn skip_line(&mut self) {
        self.advance(0, self.state.line_height);
    }

    pub fn new_page(&mut self) {
        self.pages.push(LaidOutPage::default());
        self.state.cursor_y = self.state.margin_y;
        debug!(page = self.pages.len(), "page break");
    }

    /// Lines that fit between the margins of an empty page at the current style.
    pub fn lines_per_page(&self) -> usize {
        (self.state.usable_height() / self.state.line_height).floor() as usize
    }

    /// Height a block of `text` would take at `style` across the content width.
    pub fn measure(&self, text: &str, style: TextStyle) -> f32 {
        let lines = wrap_text(text, self.state.content_width(), style.size, style.weight);
        lines.len() as f32 * style.line_height()
    }

    /// Wraps `text` to the content width and draws it. A block that fits on a
    /// page is kept together; a longer one flows line by line. Returns the
    /// number of lines drawn.
    pub fn draw_block(&mut self, text: &str) -> usize {
        let lines = self.wrap(text, self.state.content_width());
        if lines.len() <= self.lines_per_page() {
            self.ensure_space(lines.len());
        }
        for line in &lines {
            self.draw_line(line);
        }
        lines.len()
    }

    fn draw_line(&mut self, text: &str) {
        self.ensure_space(1);
        let baseline = self.state.cursor_y + self.state.style.size;
        let line = PlacedLine {
            text: text.to_string(),
            x: self.state.margin_x,
            baseline,
            style: self.state.style,
        };
        if let Some(page) = self.pages.last_mut() {
            page.lines.push(line);
        }
        self.advance(1, 0.0);
    }

    pub fn finish(self) -> LaidOutDocument {
        LaidOutDocument {
            geometry: self.geometry,
            pages: self.pages,
        }
    }
}

/// Greedy word wrap. Words are never split; a word wider than `max_width`
/// gets a line of its own. Explicit newlines start new lines.
pub fn wrap_text(text: &str, max_width: f32, size: f32, weight: FontWeight) -> Vec<String> {
    let space = text_width(" ", size, weight);
    let mut lines = Vec::new();

    for paragraph in text.trim_end().split('\n') {
        let mut current = String::new();
        let mut current_width = 0.0_f32;

        for word in paragraph.split_whitespace() {
            let word_width = text_width(word, size, weight);
            if current.is_empty() {
                current.push_str(word);
                current_width = word_width;
            } else if current_width + space + word_width <= max_width + WIDTH_TOLERANCE {
                current.push(' ');
                current.push_str(word);
                current_width += space + word_width;
            } else {
                lines.push(std::mem::take(&mut current));
                current.push_str(word);
                current_width = word_width;
            }
        }

        lines.push(current);
    }

    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    fn narrow_geometry() -> PageGeometry {
        PageGeometry {
            width: 200.0,
            height: 300.0,
            margin_x: 20.0,
            margin_y: 20.0,
        }
    }

    #[test]
    fn wrap_never_splits_words() {
        let text = "el estudiante demuestra trazabilidad consistente en el pipeline";
        let lines = wrap_text(text, 80.0, 11.0, FontWeight::Regular);
        assert!(lines.len() > 1);
        let rejoined: Vec<&str> = lines.iter().flat_map(|line| line.split(' ')).collect();
        let original: Vec<&str> = text.split(' ').collect();
        assert_eq!(rejoined, original);
        for line in &lines {
            let fits = text_width(line, 11.0, FontWeight::Regular) <= 80.0 + WIDTH_TOLERANCE;
            assert!(fits || !line.contains(' '), "line overflows: {line}");
        }
    }

    #[test]
    fn wrap_puts_long_word_on_its_own_line() {
        let lines = wrap_text("a supercalifragilisticoespialidoso b", 40.0, 11.0, FontWeight::Regular);
        assert_eq!(lines, vec!["a", "supercalifragilisticoespialidoso", "b"]);
    }

    #[test]
    fn wrap_keeps_explicit_breaks_and_blank_lines() {
        let lines = wrap_text("uno\n\ndos  tres\n", 500.0, 11.0, FontWeight::Regular);
        assert_eq!(lines, vec!["uno", "", "dos tres"]);
    }

    #[test]
    fn wrap_of_empty_text_is_one_empty_line() {
        assert_eq!(wrap_text("", 100.0, 11.0, FontWeight::Regular), vec![String::new()]);
    }

    #[test]
    fn ensure_space_breaks_only_when_needed() {
        let mut cursor = TextFlowCursor::new(narrow_geometry(), TextStyle::BODY).expect("cursor");
        let capacity = cursor.lines_per_page();
        assert!(!cursor.ensure_space(capacity));
        cursor.advance(capacity - 1, 0.0);
        assert!(!cursor.ensure_space(1));
        assert!(cursor.ensure_space(2));
        assert_eq!(cursor.page_count(), 2);
        assert_eq!(cursor.state().cursor_y, cursor.state().margin_y);
    }

    #[test]
    fn ensure_space_at_top_of_page_does_not_loop() {
        let mut cursor = TextFlowCursor::new(narrow_geometry(), TextStyle::BODY).expect("cursor");
        assert!(!cursor.ensure_space(1_000));
        assert_eq!(cursor.page_count(), 1);
    }

    #[test]
    fn with_style_restores_previous_style() {
        let mut cursor = TextFlowCursor::new(narrow_geometry(), TextStyle::BODY).expect("cursor");
        let drawn = cursor.with_style(TextStyle::NOTE, |cursor| {
            assert_eq!(cursor.state().style, TextStyle::NOTE);
            cursor.draw_block("Nota: revisar")
        });
        assert_eq!(drawn, 1);
        assert_eq!(cursor.state().style, TextStyle::BODY);
        assert_eq!(cursor.state().line_height, TextStyle::BODY.line_height());
    }

    #[test]
    fn long_block_flows_with_minimal_page_breaks() {
        let mut cursor = TextFlowCursor::new(narrow_geometry(), TextStyle::BODY).expect("cursor");
        cursor.draw_block("encabezado");
        let capacity = cursor.lines_per_page();
        let text = "palabra ".repeat(400);
        let expected_lines = cursor.wrap(&text, cursor.state().content_width()).len();
        assert!(expected_lines > capacity);

        let drawn = cursor.draw_block(&text);
        assert_eq!(drawn, expected_lines);

        let total = expected_lines + 1;
        let expected_pages = (total + capacity - 1) / capacity;
        let document = cursor.finish();
        assert_eq!(document.page_count(), expected_pages);

        let bottom = document.geometry.bottom();
        for page in &document.pages {
            for pair in page.lines.windows(2) {
                assert!(pair[1].baseline - pair[0].baseline >= pair[0].style.line_height() - 1e-3);
            }
            assert!(page.lines.iter().all(|line| line.baseline <= bottom));
        }
    }

    #[test]
    fn short_block_moves_to_next_page_whole() {
        let mut cursor = TextFlowCursor::new(narrow_geometry(), TextStyle::BODY).expect("cursor");
        let capacity = cursor.lines_per_page();
        cursor.advance(capacity - 1, 0.0);
        cursor.draw_block("uno\ndos\ntres");
        let document = cursor.finish();
        assert_eq!(document.page_count(), 2);
        assert!(document.pages[0].lines.is_empty());
        assert_eq!(document.pages[1].lines.len(), 3);
    }

    #[test]
    fn rejects_degenerate_geometry() {
        let geometry = PageGeometry {
            width: 30.0,
            height: 300.0,
            margin_x: 20.0,
            margin_y: 20.0,
        };
        assert!(TextFlowCursor::new(geometry, TextStyle::BODY).is_err());
        let geometry = PageGeometry {
            height: f32::NAN,
            ..narrow_geometry()
        };
        assert!(TextFlowCursor::new(geometry, TextStyle::BODY).is_err());
    }
}
