//! Plain paginated PDF output.
//!
//! A4 portrait, one bold title, then every paragraph split on blank lines into
//! flowed blocks. Lines are laid out first and drawn afterwards, so the page
//! geometry can be checked without parsing PDF bytes.

use anyhow::{anyhow, Result};
use printpdf::{BuiltinFont, Mm, PdfDocument};
use std::io::BufWriter;
use std::path::Path;

const PAGE_WIDTH: f32 = 210.0;
const PAGE_HEIGHT: f32 = 297.0;
const MARGIN_LEFT: f32 = 10.0;
const MARGIN_TOP: f32 = 10.0;
const MARGIN_BOTTOM: f32 = 15.0;

const PRINTABLE_WIDTH: f32 = PAGE_WIDTH - 2.0 * MARGIN_LEFT;
const PT_TO_MM: f32 = 25.4 / 72.0;

const TITLE_SIZE: f32 = 16.0;
const TITLE_LINE_HEIGHT: f32 = 10.0;
const TITLE_GAP: f32 = 4.0;

const BODY_SIZE: f32 = 11.0;
const BODY_LINE_HEIGHT: f32 = 7.0;
const BLOCK_GAP: f32 = 2.0;

/// Baseline sits this fraction of the line height below the line's top.
const BASELINE_RATIO: f32 = 0.7;

#[derive(Debug, Clone, PartialEq)]
pub struct PlacedLine {
    pub page: usize,
    /// Distance of the line's top edge from the top of the page, in mm.
    pub top: f32,
    pub height: f32,
    pub bold: bool,
    pub text: String,
}

struct Cursor {
    page: usize,
    top: f32,
    lines: Vec<PlacedLine>,
}

impl Cursor {
    fn place(&mut self, text: String, height: f32, bold: bool) {
        if self.top + height > PAGE_HEIGHT - MARGIN_BOTTOM {
            self.page += 1;
            self.top = MARGIN_TOP;
        }
        self.lines.push(PlacedLine {
            page: self.page,
            top: self.top,
            height,
            bold,
            text,
        });
        self.top += height;
    }

    fn gap(&mut self, mm: f32) {
        self.top += mm;
    }
}

/// Lay out the title and paragraphs into positioned lines.
pub fn layout(title: &str, paragraphs: &[String]) -> Vec<PlacedLine> {
    let mut cursor = Cursor {
        page: 0,
        top: MARGIN_TOP,
        lines: Vec::new(),
    };

    for line in wrap_block(title, TITLE_SIZE, true) {
        cursor.place(line, TITLE_LINE_HEIGHT, true);
    }
    cursor.gap(TITLE_GAP);

    for paragraph in paragraphs {
        for block in paragraph.split("\n\n") {
            for line in wrap_block(block, BODY_SIZE, false) {
                cursor.place(line, BODY_LINE_HEIGHT, false);
            }
            cursor.gap(BLOCK_GAP);
        }
    }

    cursor.lines
}

/// Render a document to PDF bytes.
pub fn render(title: &str, paragraphs: &[String]) -> Result<Vec<u8>> {
    let lines = layout(title, paragraphs);
    let page_count = lines.last().map(|l| l.page + 1).unwrap_or(1);

    let (doc, first_page, first_layer) =
        PdfDocument::new(title, Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1");
    let font = doc
        .add_builtin_font(BuiltinFont::Helvetica)
        .map_err(|e| anyhow!("PDF font error: {e}"))?;
    let bold = doc
        .add_builtin_font(BuiltinFont::HelveticaBold)
        .map_err(|e| anyhow!("PDF font error: {e}"))?;

    let mut layers = vec![doc.get_page(first_page).get_layer(first_layer)];
    for _ in 1..page_count {
        let (page, layer) = doc.add_page(Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1");
        layers.push(doc.get_page(page).get_layer(layer));
    }

    for line in &lines {
        if line.text.is_empty() {
            continue;
        }
        let baseline = PAGE_HEIGHT - line.top - line.height * BASELINE_RATIO;
        let (size, font_ref) = if line.bold {
            (TITLE_SIZE, &bold)
        } else {
            (BODY_SIZE, &font)
        };
        layers[line.page].use_text(
            line.text.as_str(),
            size,
            Mm(MARGIN_LEFT),
            Mm(baseline),
            font_ref,
        );
    }

    let mut buf = BufWriter::new(Vec::new());
    doc.save(&mut buf)
        .map_err(|e| anyhow!("PDF save error: {e}"))?;
    buf.into_inner()
        .map_err(|e| anyhow!("PDF buffer error: {e}"))
}

/// Render a document straight to a file.
pub fn render_to_path(path: &Path, title: &str, paragraphs: &[String]) -> Result<()> {
    let bytes = render(title, paragraphs)?;
    std::fs::write(path, bytes)?;
    Ok(())
}

/// Approximate Helvetica advance width, in thousandths of an em.
fn glyph_width(c: char, bold: bool) -> u32 {
    let regular = match c {
        'i' | 'j' | 'l' | '\'' | '|' => 222,
        ' ' | '.' | ',' | ':' | ';' | '!' | 'I' | 'f' | 't' | '/' | '[' | ']' => 278,
        'r' | '-' | '(' | ')' | '"' => 333,
        'm' | 'M' => 833,
        'W' => 944,
        '%' => 889,
        'w' | 'C' | 'D' | 'G' | 'H' | 'N' | 'O' | 'Q' | 'R' | 'U' => 722,
        'A'..='Z' => 667,
        c if c.is_uppercase() => 722,
        _ => 556,
    };
    // Bold glyphs run roughly a tenth wider.
    if bold {
        regular + regular / 10
    } else {
        regular
    }
}

/// Width of `text` in mm at `size` points.
fn text_width(text: &str, size: f32, bold: bool) -> f32 {
    let units: u32 = text.chars().map(|c| glyph_width(c, bold)).sum();
    units as f32 / 1000.0 * size * PT_TO_MM
}

/// Word-wrap a block to the printable width, keeping its explicit line
/// breaks. Words wider than a line are split.
fn wrap_block(text: &str, size: f32, bold: bool) -> Vec<String> {
    let mut lines = Vec::new();

    for raw_line in text.lines() {
        let mut current = String::new();

        for word in raw_line.split_whitespace() {
            for piece in split_long_word(word, size, bold) {
                let candidate = if current.is_empty() {
                    piece.clone()
                } else {
                    format!("{current} {piece}")
                };
                if !current.is_empty() && text_width(&candidate, size, bold) > PRINTABLE_WIDTH {
                    lines.push(std::mem::replace(&mut current, piece));
                } else {
                    current = candidate;
                }
            }
        }
        lines.push(current);
    }

    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}

fn split_long_word(word: &str, size: f32, bold: bool) -> Vec<String> {
    if text_width(word, size, bold) <= PRINTABLE_WIDTH {
        return vec![word.to_string()];
    }
    let mut pieces = Vec::new();
    let mut current = String::new();
    for c in word.chars() {
        current.push(c);
        if current.chars().count() > 1 && text_width(&current, size, bold) > PRINTABLE_WIDTH {
            current.pop();
            pieces.push(std::mem::replace(&mut current, c.to_string()));
        }
    }
    if !current.is_empty() {
        pieces.push(current);
    }
    pieces
}
