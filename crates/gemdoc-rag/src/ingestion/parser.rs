//! Text extraction for PDF and DOCX uploads

use once_cell::sync::Lazy;
use regex::Regex;
use std::panic::{self, AssertUnwindSafe};

use crate::error::{Error, Result};
use crate::types::{Document, FileType};

/// Separator placed between PDF pages
pub const PAGE_BREAK: &str = "\n";

static HORIZONTAL_WS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[ \t\u{00A0}\u{2002}\u{2003}\u{2009}]+").unwrap());

/// Glyphs pdf text layers commonly emit, mapped to plain ASCII
const GLYPH_REPLACEMENTS: &[(char, &str)] = &[
    ('\u{2010}', "-"),
    ('\u{2011}', "-"),
    ('\u{2013}', "-"),
    ('\u{2014}', "--"),
    ('\u{2018}', "'"),
    ('\u{2019}', "'"),
    ('\u{201C}', "\""),
    ('\u{201D}', "\""),
    ('\u{2022}', "* "),
    ('\u{2026}', "..."),
    ('\u{FB00}', "ff"),
    ('\u{FB01}', "fi"),
    ('\u{FB02}', "fl"),
    ('\u{FB03}', "ffi"),
    ('\u{FB04}', "ffl"),
];

/// Text extracted from one upload
#[derive(Debug, Clone)]
pub struct ExtractedText {
    /// Normalized plain text
    pub text: String,
    /// Pages (PDF) or paragraphs (DOCX) seen
    pub units: usize,
    /// Pages that yielded no text (scanned images, empty pages)
    pub empty_units: usize,
}

impl ExtractedText {
    /// True when nothing but whitespace was recovered
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// Converts raw PDF/DOCX bytes into plain text
pub struct TextExtractor;

impl TextExtractor {
    /// Extract text from raw bytes of a known type
    pub fn extract(data: &[u8], file_type: FileType) -> Result<String> {
        let placeholder = match file_type {
            FileType::Pdf => "document.pdf",
            FileType::Docx => "document.docx",
        };
        Self::extract_named(placeholder, data, file_type).map(|e| e.text)
    }

    /// Extract text from an uploaded document
    pub fn extract_document(doc: &Document) -> Result<ExtractedText> {
        Self::extract_named(&doc.filename, &doc.data, doc.file_type)
    }

    fn extract_named(filename: &str, data: &[u8], file_type: FileType) -> Result<ExtractedText> {
        if data.is_empty() {
            return Err(Error::extraction(filename, "file is empty"));
        }

        match file_type {
            FileType::Pdf => Self::parse_pdf(filename, data),
            FileType::Docx => Self::parse_docx(filename, data),
        }
    }

    /// Parse PDF page by page, joining pages with `PAGE_BREAK`.
    ///
    /// lopdf decodes each page's text operators. When that yields nothing
    /// (unusual font encodings) pdf-extract reads the whole document instead.
    fn parse_pdf(filename: &str, data: &[u8]) -> Result<ExtractedText> {
        let pages = match Self::pdf_pages_with_lopdf(data) {
            Ok(pages) if pages.iter().any(|p| !p.trim().is_empty()) => pages,
            Ok(pages) => {
                tracing::debug!("lopdf found no text in '{}', trying pdf-extract", filename);
                return Self::parse_pdf_whole(filename, data, pages.len());
            }
            Err(e) => {
                tracing::debug!("lopdf could not read '{}': {}, trying pdf-extract", filename, e);
                return Self::parse_pdf_whole(filename, data, 1);
            }
        };

        let cleaned: Vec<String> = pages.iter().map(|p| normalize_text(p)).collect();
        let empty_units = cleaned.iter().filter(|p| p.is_empty()).count();

        tracing::debug!("'{}': {} pages, {} without text", filename, cleaned.len(), empty_units);

        Ok(ExtractedText {
            text: cleaned.join(PAGE_BREAK),
            units: cleaned.len(),
            empty_units,
        })
    }

    /// Whole-document extraction through pdf-extract, reported as `pages` units
    fn parse_pdf_whole(filename: &str, data: &[u8], pages: usize) -> Result<ExtractedText> {
        let text = Self::pdf_text_with_pdf_extract(data)
            .map(|text| normalize_text(&text))
            .map_err(|message| Error::extraction(filename, message))?;

        let units = pages.max(1);
        let empty_units = if text.is_empty() { units } else { 0 };
        Ok(ExtractedText {
            text,
            units,
            empty_units,
        })
    }

    /// pdf-extract can panic on malformed fonts; contain it and report as a failure
    fn pdf_text_with_pdf_extract(data: &[u8]) -> std::result::Result<String, String> {
        let outcome =
            panic::catch_unwind(AssertUnwindSafe(|| pdf_extract::extract_text_from_mem(data)));

        match outcome {
            Ok(Ok(text)) => Ok(text),
            Ok(Err(e)) => Err(format!("Failed to read PDF: {}", e)),
            Err(_) => Err("Failed to read PDF: extractor panicked".to_string()),
        }
    }

    /// Per-page text in page order; unreadable pages come back empty
    fn pdf_pages_with_lopdf(data: &[u8]) -> std::result::Result<Vec<String>, lopdf::Error> {
        let doc = lopdf::Document::load_mem(data)?;

        let pages = doc
            .get_pages()
            .keys()
            .map(|&n| match doc.extract_text(&[n]) {
                Ok(text) => text,
                Err(e) => {
                    tracing::debug!("Could not extract text of page {}: {}", n, e);
                    String::new()
                }
            })
            .collect();

        Ok(pages)
    }

    /// Parse DOCX paragraphs in document order
    fn parse_docx(filename: &str, data: &[u8]) -> Result<ExtractedText> {
        let docx =
            docx_rs::read_docx(data).map_err(|e| Error::extraction(filename, e.to_string()))?;

        let mut paragraphs: Vec<String> = Vec::new();
        for child in &docx.document.children {
            match child {
                docx_rs::DocumentChild::Paragraph(p) => paragraphs.push(paragraph_text(p)),
                docx_rs::DocumentChild::Table(table) => collect_table_text(table, &mut paragraphs),
                _ => {}
            }
        }

        let units = paragraphs.len();
        let text = paragraphs
            .iter()
            .map(|p| normalize_text(p))
            .collect::<Vec<_>>()
            .join("\n");
        let empty_units = paragraphs.iter().filter(|p| p.trim().is_empty()).count();

        Ok(ExtractedText {
            text,
            units,
            empty_units,
        })
    }
}

fn paragraph_text(paragraph: &docx_rs::Paragraph) -> String {
    let mut text = String::new();
    for child in &paragraph.children {
        if let docx_rs::ParagraphChild::Run(run) = child {
            for run_child in &run.children {
                match run_child {
                    docx_rs::RunChild::Text(t) => text.push_str(&t.text),
                    docx_rs::RunChild::Tab(_) => text.push('\t'),
                    docx_rs::RunChild::Break(_) => text.push('\n'),
                    _ => {}
                }
            }
        }
    }
    text
}

/// Table cells become one line each, row by row
fn collect_table_text(table: &docx_rs::Table, out: &mut Vec<String>) {
    for row in &table.rows {
        let docx_rs::TableChild::TableRow(row) = row;
        for cell in &row.cells {
            let docx_rs::TableRowChild::TableCell(cell) = cell;
            for content in &cell.children {
                if let docx_rs::TableCellContent::Paragraph(p) = content {
                    let text = paragraph_text(p);
                    if !text.trim().is_empty() {
                        out.push(text);
                    }
                }
            }
        }
    }
}

/// Clean extracted text: glyph artefacts, NULs, runs of spaces, trailing whitespace
pub fn normalize_text(raw: &str) -> String {
    let mut text = raw.replace('\0', "").replace("\r\n", "\n").replace('\r', "\n");
    for (glyph, replacement) in GLYPH_REPLACEMENTS {
        if text.contains(*glyph) {
            text = text.replace(*glyph, replacement);
        }
    }

    text.lines()
        .map(|line| HORIZONTAL_WS.replace_all(line, " ").trim().to_string())
        .collect::<Vec<_>>()
        .join("\n")
        .trim_matches('\n')
        .to_string()
}
