//! Serializes a [`LaidOutDocument`] into PDF bytes using the two standard
//! Helvetica faces, so no font program is embedded.

use super::layout::{FontWeight, LaidOutDocument};
use chrono::{Datelike, Timelike, Utc};
use pdf_writer::{Content, Date, Filter, Finish, Name, Pdf, Rect, Ref, Str, TextStr};
use tracing::debug;

const PRODUCER: &str = "feedback-reports";

#[derive(Debug, Clone)]
pub struct PdfOptions {
    pub title: String,
    pub compress: bool,
}

impl PdfOptions {
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            compress: true,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PdfError {
    #[error("document has no pages")]
    NoPages,
    #[error("line on page {page} has a non-finite position")]
    InvalidPosition { page: usize },
}

pub fn write_pdf(document: &LaidOutDocument, options: &PdfOptions) -> Result<Vec<u8>, PdfError> {
    if document.pages.is_empty() {
        return Err(PdfError::NoPages);
    }

    let geometry = document.geometry;
    let mut alloc = Ref::new(1);
    let catalog_id = alloc.bump();
    let page_tree_id = alloc.bump();
    let regular_id = alloc.bump();
    let bold_id = alloc.bump();
    let info_id = alloc.bump();

    let mut pdf = Pdf::new();
    let mut page_ids = Vec::with_capacity(document.pages.len());

    for (index, page) in document.pages.iter().enumerate() {
        let page_id = alloc.bump();
        let content_id = alloc.bump();
        page_ids.push(page_id);

        let mut content = Content::new();
        for line in page.lines.iter().filter(|line| !line.text.is_empty()) {
            let y = geometry.height - line.baseline;
            if !y.is_finite() || !line.x.is_finite() {
                return Err(PdfError::InvalidPosition { page: index + 1 });
            }
            let color = line.style.color;
            content.set_fill_rgb(color.r, color.g, color.b);
            content.begin_text();
            content.set_font(Name(line.style.weight.resource_name()), line.style.size);
            content.next_line(line.x, y);
            content.show(Str(&encode_win_ansi(&line.text)));
            content.end_text();
        }
        let data = content.finish();

        if options.compress {
            let compressed = miniz_oxide::deflate::compress_to_vec_zlib(&data, 6);
            pdf.stream(content_id, &compressed).filter(Filter::FlateDecode);
        } else {
            pdf.stream(content_id, &data);
        }

        let mut pdf_page = pdf.page(page_id);
        pdf_page
            .media_box(Rect::new(0.0, 0.0, geometry.width, geometry.height))
            .parent(page_tree_id)
            .contents(content_id);
        {
            let mut resources = pdf_page.resources();
            let mut fonts = resources.fonts();
            fonts.pair(Name(FontWeight::Regular.resource_name()), regular_id);
            fonts.pair(Name(FontWeight::Bold.resource_name()), bold_id);
        }
        pdf_page.finish();
    }

    pdf.catalog(catalog_id).pages(page_tree_id);
    pdf.pages(page_tree_id)
        .kids(page_ids.iter().copied())
        .count(page_ids.len() as i32);

    for (font_id, weight) in [(regular_id, FontWeight::Regular), (bold_id, FontWeight::Bold)] {
        pdf.type1_font(font_id)
            .base_font(Name(weight.base_font()))
            .encoding_predefined(Name(b"WinAnsiEncoding"));
    }

    let now = Utc::now();
    let created = Date::new(now.year() as u16)
        .month(now.month() as u8)
        .day(now.day() as u8)
        .hour(now.hour() as u8)
        .minute(now.minute() as u8)
        .second(now.second() as u8);
    pdf.document_info(info_id)
        .title(TextStr(&options.title))
        .producer(TextStr(PRODUCER))
        .creation_date(created);

    debug!(pages = page_ids.len(), compress = options.compress, "pdf serialized");
    Ok(pdf.finish())
}

/// Maps text onto WinAnsiEncoding. Characters outside it become `?`.
pub fn encode_win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|ch| match ch {
            '\u{20}'..='\u{7E}' | '\u{A0}'..='\u{FF}' => ch as u32 as u8,
            '\t' => b' ',
            '€' => 0x80,
            '\u{2026}' => 0x85,
            '\u{2018}' => 0x91,
            '\u{2019}' => 0x92,
            '\u{201C}' => 0x93,
            '\u{201D}' => 0x94,
            '\u{2022}' => 0x95,
            '\u{2013}' => 0x96,
            '\u{2014}' => 0x97,
            _ => b'?',
        })
        .collect()
}
