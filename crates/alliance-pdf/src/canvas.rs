//! Minimal text canvas over `pdf-writer`.

use pdf_writer::{Content, Finish, Name, Pdf, Rect, Ref, Str};

use crate::text::encode_win_ansi;

/// A4 width in points.
pub const PAGE_WIDTH: f32 = 595.0;

/// A4 height in points.
pub const PAGE_HEIGHT: f32 = 842.0;

/// Base-14 fonts available on the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Font {
    /// Helvetica
    Regular,
    /// Helvetica-Bold
    Bold,
}

impl Font {
    fn resource_name(self) -> Name<'static> {
        match self {
            Font::Regular => Name(b"F1"),
            Font::Bold => Name(b"F2"),
        }
    }

    fn base_font(self) -> Name<'static> {
        match self {
            Font::Regular => Name(b"Helvetica"),
            Font::Bold => Name(b"Helvetica-Bold"),
        }
    }
}

/// Collects text pages and serializes them as a PDF document.
///
/// Coordinates are in points from the bottom-left corner.
pub struct Canvas {
    pages: Vec<Vec<u8>>,
    current: Content,
    dirty: bool,
    font: Font,
    size: f32,
}

impl std::fmt::Debug for Canvas {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Canvas")
            .field("pages", &self.pages.len())
            .field("font", &self.font)
            .field("size", &self.size)
            .finish_non_exhaustive()
    }
}

impl Default for Canvas {
    fn default() -> Self {
        Self::new()
    }
}

impl Canvas {
    /// An empty canvas, Helvetica 10 pt.
    pub fn new() -> Self {
        Self {
            pages: Vec::new(),
            current: Content::new(),
            dirty: false,
            font: Font::Regular,
            size: 10.0,
        }
    }

    /// Font used by subsequent [`draw_string`](Self::draw_string) calls.
    pub fn set_font(&mut self, font: Font, size: f32) {
        self.font = font;
        self.size = size;
    }

    /// Draws one line of text with its baseline at `(x, y)`.
    pub fn draw_string(&mut self, x: f32, y: f32, text: &str) {
        let encoded = encode_win_ansi(text);
        self.current.begin_text();
        self.current.set_font(self.font.resource_name(), self.size);
        self.current.next_line(x, y);
        self.current.show(Str(&encoded));
        self.current.end_text();
        self.dirty = true;
    }

    /// Closes the current page and starts a new one.
    pub fn show_page(&mut self) {
        let page = std::mem::replace(&mut self.current, Content::new());
        self.pages.push(page.finish());
        self.dirty = false;
    }

    /// Pages closed so far.
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Serializes the document. A pending page is closed first.
    pub fn finish(mut self) -> Vec<u8> {
        if self.dirty || self.pages.is_empty() {
            self.show_page();
        }

        let catalog_id = Ref::new(1);
        let tree_id = Ref::new(2);
        let regular_id = Ref::new(3);
        let bold_id = Ref::new(4);
        let first_page = 5;

        // Each page takes two refs: the page object, then its content stream.
        let page_ids: Vec<Ref> = (0..self.pages.len())
            .map(|i| Ref::new(first_page + 2 * i as i32))
            .collect();

        let mut pdf = Pdf::new();
        pdf.catalog(catalog_id).pages(tree_id);
        pdf.pages(tree_id)
            .kids(page_ids.iter().copied())
            .count(page_ids.len() as i32);

        for (font, id) in [(Font::Regular, regular_id), (Font::Bold, bold_id)] {
            pdf.type1_font(id)
                .base_font(font.base_font())
                .encoding_predefined(Name(b"WinAnsiEncoding"));
        }

        for (page_id, content) in page_ids.iter().zip(&self.pages) {
            let content_id = Ref::new(page_id.get() + 1);
            let mut page = pdf.page(*page_id);
            page.media_box(Rect::new(0.0, 0.0, PAGE_WIDTH, PAGE_HEIGHT));
            page.parent(tree_id);
            page.contents(content_id);
            {
                let mut resources = page.resources();
                let mut fonts = resources.fonts();
                fonts.pair(Font::Regular.resource_name(), regular_id);
                fonts.pair(Font::Bold.resource_name(), bold_id);
            }
            page.finish();
            pdf.stream(content_id, content);
        }

        tracing::debug!(pages = page_ids.len(), "Rendered PDF");
        pdf.finish()
    }
}
