//! Minimal PDF 1.4 writer for tabular reports.
//!
//! Coordinates are millimetres measured from the top-left corner of an A4
//! page, matching how report layouts are described. Text uses the standard
//! Helvetica faces with WinAnsi encoding, so no fonts are embedded.

use super::metrics::advance;

pub const PAGE_WIDTH_MM: f32 = 210.0;
pub const PAGE_HEIGHT_MM: f32 = 297.0;
const PT_PER_MM: f32 = 72.0 / 25.4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Font {
    Regular,
    Bold,
}

impl Font {
    const fn resource(self) -> &'static str {
        match self {
            Self::Regular => "F1",
            Self::Bold => "F2",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub const BLACK: Rgb = Rgb(0, 0, 0);
    pub const WHITE: Rgb = Rgb(255, 255, 255);

    pub const fn gray(level: u8) -> Rgb {
        Rgb(level, level, level)
    }

    fn components(self) -> String {
        format!(
            "{:.3} {:.3} {:.3}",
            f32::from(self.0) / 255.0,
            f32::from(self.1) / 255.0,
            f32::from(self.2) / 255.0
        )
    }
}

/// Drawing operations for a single page.
#[derive(Debug, Default, Clone)]
pub struct Page {
    content: String,
}

impl Page {
    /// Draw `text` with its baseline at `y`.
    pub fn text(&mut self, x: f32, y: f32, font: Font, size: f32, color: Rgb, text: &str) {
        let (px, py) = to_points(x, y);
        self.content.push_str(&format!(
            "BT /{} {:.1} Tf {} rg {:.2} {:.2} Td ({}) Tj ET\n",
            font.resource(),
            size,
            color.components(),
            px,
            py,
            escape_text(text)
        ));
    }

    pub fn text_centered(
        &mut self,
        center_x: f32,
        y: f32,
        font: Font,
        size: f32,
        color: Rgb,
        text: &str,
    ) {
        let width = text_width_mm(text, font, size);
        self.text(center_x - width / 2.0, y, font, size, color, text);
    }

    /// Filled rectangle whose top-left corner is at (`x`, `y`).
    pub fn fill_rect(&mut self, x: f32, y: f32, width: f32, height: f32, color: Rgb) {
        let (px, py) = to_points(x, y + height);
        self.content.push_str(&format!(
            "{} rg {:.2} {:.2} {:.2} {:.2} re f\n",
            color.components(),
            px,
            py,
            width * PT_PER_MM,
            height * PT_PER_MM
        ));
    }

    pub fn stroke_rect(&mut self, x: f32, y: f32, width: f32, height: f32, color: Rgb) {
        let (px, py) = to_points(x, y + height);
        self.content.push_str(&format!(
            "{} RG 0.3 w {:.2} {:.2} {:.2} {:.2} re S\n",
            color.components(),
            px,
            py,
            width * PT_PER_MM,
            height * PT_PER_MM
        ));
    }
}

/// An ordered set of pages plus document metadata.
#[derive(Debug, Clone)]
pub struct PdfDocument {
    title: String,
    pages: Vec<Page>,
}

impl PdfDocument {
    /// Starts with one blank page.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            pages: vec![Page::default()],
        }
    }

    pub fn add_page(&mut self) -> &mut Page {
        self.pages.push(Page::default());
        self.current_page()
    }

    pub fn current_page(&mut self) -> &mut Page {
        if self.pages.is_empty() {
            self.pages.push(Page::default());
        }
        let last = self.pages.len() - 1;
        &mut self.pages[last]
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn pages_mut(&mut self) -> impl Iterator<Item = &mut Page> {
        self.pages.iter_mut()
    }

    /// Serialize with a classic cross-reference table.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut objects: Vec<String> = Vec::with_capacity(5 + self.pages.len() * 2);

        let kids = (0..self.pages.len())
            .map(|index| format!("{} 0 R", page_object_id(index)))
            .collect::<Vec<_>>()
            .join(" ");

        objects.push("<< /Type /Catalog /Pages 2 0 R >>".to_string());
        objects.push(format!(
            "<< /Type /Pages /Kids [{}] /Count {} >>",
            kids,
            self.pages.len()
        ));
        objects.push(font_object("Helvetica"));
        objects.push(font_object("Helvetica-Bold"));
        objects.push(format!(
            "<< /Title ({}) /Producer (election-poll) >>",
            escape_text(&self.title)
        ));

        for (index, page) in self.pages.iter().enumerate() {
            objects.push(format!(
                "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {:.2} {:.2}] \
                 /Resources << /Font << /F1 3 0 R /F2 4 0 R >> >> /Contents {} 0 R >>",
                PAGE_WIDTH_MM * PT_PER_MM,
                PAGE_HEIGHT_MM * PT_PER_MM,
                page_object_id(index) + 1
            ));
            objects.push(format!(
                "<< /Length {} >>\nstream\n{}\nendstream",
                page.content.len(),
                page.content
            ));
        }

        let mut out: Vec<u8> = Vec::new();
        out.extend_from_slice(b"%PDF-1.4\n%\xE2\xE3\xCF\xD3\n");

        let mut offsets = Vec::with_capacity(objects.len());
        for (index, body) in objects.iter().enumerate() {
            offsets.push(out.len());
            out.extend_from_slice(format!("{} 0 obj\n{}\nendobj\n", index + 1, body).as_bytes());
        }

        let xref_offset = out.len();
        let mut xref = format!("xref\n0 {}\n0000000000 65535 f \n", objects.len() + 1);
        for offset in offsets {
            xref.push_str(&format!("{:010} 00000 n \n", offset));
        }
        xref.push_str(&format!(
            "trailer\n<< /Size {} /Root 1 0 R /Info 5 0 R >>\nstartxref\n{}\n%%EOF\n",
            objects.len() + 1,
            xref_offset
        ));
        out.extend_from_slice(xref.as_bytes());
        out
    }
}

fn page_object_id(index: usize) -> usize {
    6 + index * 2
}

fn font_object(base_font: &str) -> String {
    format!(
        "<< /Type /Font /Subtype /Type1 /BaseFont /{} /Encoding /WinAnsiEncoding >>",
        base_font
    )
}

fn to_points(x: f32, y: f32) -> (f32, f32) {
    (x * PT_PER_MM, (PAGE_HEIGHT_MM - y) * PT_PER_MM)
}

/// Escape a string literal; characters outside Latin-1 become `?`.
fn escape_text(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '(' | ')' | '\\' => {
                escaped.push('\\');
                escaped.push(c);
            }
            ' '..='~' => escaped.push(c),
            '\u{a0}'..='\u{ff}' => escaped.push_str(&format!("\\{:03o}", c as u32)),
            _ => escaped.push('?'),
        }
    }
    escaped
}

const ELLIPSIS: &str = "...";

/// Helvetica advance width of `text` in millimetres.
pub fn text_width_mm(text: &str, font: Font, size: f32) -> f32 {
    units_to_mm(text_units(text, font), size)
}

fn text_units(text: &str, font: Font) -> u32 {
    text.chars().map(|c| u32::from(advance(font, c))).sum()
}

fn units_to_mm(units: u32, size: f32) -> f32 {
    units as f32 * size / 1000.0 / PT_PER_MM
}

/// Cut `text` to the longest prefix that still fits in `max_width`
/// millimetres with a trailing `...`.
pub fn fit_text(text: &str, font: Font, size: f32, max_width: f32) -> String {
    let fits = |units: u32| units_to_mm(units, size) <= max_width;
    if fits(text_units(text, font)) {
        return text.to_string();
    }

    let mut used = text_units(ELLIPSIS, font);
    if !fits(used) {
        return String::new();
    }
    let mut end = 0;
    for (offset, c) in text.char_indices() {
        used += u32::from(advance(font, c));
        if !fits(used) {
            break;
        }
        end = offset + c.len_utf8();
    }
    format!("{}{ELLIPSIS}", text[..end].trim_end())
}
