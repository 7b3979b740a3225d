//! Minimal in-process renderer.
//!
//! Walks the document body with scraper and lays block elements (headings,
//! paragraphs, list items, table rows) out as wrapped Helvetica text. No CSS,
//! images or remote assets; each of those produces a warning instead.

use chrono::Utc;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, ObjectId, Stream, StringFormat};
use scraper::{ElementRef, Html, Node, Selector};

use super::{css, RenderBackend};
use crate::backend::BackendId;
use crate::error::BackendError;
use crate::process::run_bounded;
use crate::types::{ConversionOptions, HtmlDocument, RenderOutput};

const BODY_SIZE: i64 = 11;
/// Average Helvetica advance width as a fraction of the font size.
const AVG_CHAR_WIDTH: f64 = 0.52;
const PRODUCER: &str = "pdfparse builtin renderer";

/// In-process HTML to PDF backend.
pub struct BuiltinBackend;

impl BuiltinBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for BuiltinBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderBackend for BuiltinBackend {
    fn id(&self) -> BackendId {
        BackendId::Builtin
    }

    fn render(
        &self,
        document: &HtmlDocument,
        options: &ConversionOptions,
    ) -> Result<RenderOutput, BackendError> {
        let html = document.html.clone();
        let options = options.clone();
        let timeout = options.timeout;
        run_bounded("builtin", timeout, move || render_html(&html, &options))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Block {
    Heading(u8, String),
    Paragraph(String),
    ListItem(String),
    Row(Vec<String>),
}

#[derive(Debug, Default)]
struct Walk {
    blocks: Vec<Block>,
    pending: String,
    saw_images: bool,
    saw_styles: bool,
}

impl Walk {
    fn flush(&mut self) {
        let text = collapse_whitespace(&self.pending);
        if !text.is_empty() {
            self.blocks.push(Block::Paragraph(text));
        }
        self.pending.clear();
    }

    fn visit(&mut self, element: ElementRef<'_>) {
        for child in element.children() {
            match child.value() {
                Node::Text(text) => self.pending.push_str(text),
                Node::Element(_) => {
                    if let Some(el) = ElementRef::wrap(child) {
                        self.visit_element(el);
                    }
                }
                _ => {}
            }
        }
    }

    fn visit_element(&mut self, el: ElementRef<'_>) {
        let name = el.value().name();
        match name {
            "script" | "noscript" | "template" | "head" | "title" | "meta" => {}
            "style" | "link" => self.saw_styles = true,
            "img" | "svg" | "picture" | "video" | "canvas" => self.saw_images = true,
            "br" => self.pending.push(' '),
            "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
                self.flush();
                let level = name.as_bytes()[1] - b'0';
                let text = element_text(el);
                if !text.is_empty() {
                    self.blocks.push(Block::Heading(level, text));
                }
            }
            "p" | "pre" | "blockquote" | "dt" | "dd" | "figcaption" | "caption" => {
                self.flush();
                let text = element_text(el);
                if !text.is_empty() {
                    self.blocks.push(Block::Paragraph(text));
                }
                self.note_media(el);
            }
            "li" => {
                self.flush();
                let text = element_text(el);
                if !text.is_empty() {
                    self.blocks.push(Block::ListItem(text));
                }
                self.note_media(el);
            }
            "tr" => {
                self.flush();
                let cells: Vec<String> = el
                    .children()
                    .filter_map(ElementRef::wrap)
                    .filter(|c| matches!(c.value().name(), "td" | "th"))
                    .map(element_text)
                    .collect();
                if cells.iter().any(|c| !c.is_empty()) {
                    self.blocks.push(Block::Row(cells));
                }
            }
            "div" | "section" | "article" | "main" | "header" | "footer" | "nav" | "aside"
            | "ul" | "ol" | "dl" | "table" | "thead" | "tbody" | "tfoot" | "figure" | "form"
            | "body" | "html" => {
                self.flush();
                self.visit(el);
                self.flush();
            }
            _ => self.visit(el),
        }
    }

    fn note_media(&mut self, el: ElementRef<'_>) {
        if el
            .descendants()
            .filter_map(ElementRef::wrap)
            .any(|d| matches!(d.value().name(), "img" | "svg" | "picture"))
        {
            self.saw_images = true;
        }
    }
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn element_text(el: ElementRef<'_>) -> String {
    collapse_whitespace(&el.text().collect::<String>())
}

/// Document title from `<title>`, if any.
fn document_title(html: &Html) -> Option<String> {
    let selector = Selector::parse("title").ok()?;
    html.select(&selector)
        .next()
        .map(element_text)
        .filter(|t| !t.is_empty())
}

fn collect_blocks(html: &Html) -> Walk {
    let mut walk = Walk::default();
    let root = Selector::parse("body")
        .ok()
        .and_then(|s| html.select(&s).next())
        .unwrap_or_else(|| html.root_element());
    walk.visit(root);
    walk.flush();

    if let Ok(links) = Selector::parse("head style, head link[rel=stylesheet]") {
        if html.select(&links).next().is_some() {
            walk.saw_styles = true;
        }
    }
    walk
}

/// Map a char to its WinAnsiEncoding byte.
fn win_ansi(c: char) -> Option<u8> {
    let code = c as u32;
    match code {
        0x20..=0x7e | 0xa0..=0xff => Some(code as u8),
        _ => Some(match c {
            '€' => 0x80,
            '‚' => 0x82,
            'ƒ' => 0x83,
            '„' => 0x84,
            '…' => 0x85,
            '†' => 0x86,
            '‡' => 0x87,
            'ˆ' => 0x88,
            '‰' => 0x89,
            'Š' => 0x8a,
            '‹' => 0x8b,
            'Œ' => 0x8c,
            'Ž' => 0x8e,
            '‘' => 0x91,
            '’' => 0x92,
            '“' => 0x93,
            '”' => 0x94,
            '•' => 0x95,
            '–' => 0x96,
            '—' => 0x97,
            '˜' => 0x98,
            '™' => 0x99,
            'š' => 0x9a,
            '›' => 0x9b,
            'œ' => 0x9c,
            'ž' => 0x9e,
            'Ÿ' => 0x9f,
            _ => return None,
        }),
    }
}

/// Encode a line for a simple WinAnsi font, counting replaced characters.
fn encode_line(line: &str, replaced: &mut usize) -> Vec<u8> {
    line.chars()
        .map(|c| {
            win_ansi(c).unwrap_or_else(|| {
                *replaced += 1;
                b'?'
            })
        })
        .collect()
}

/// Greedy word wrap to at most `max_chars` per line.
fn wrap(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut lines = Vec::new();
    let mut line = String::new();
    let mut line_len = 0;

    for word in text.split_whitespace() {
        let mut word: Vec<char> = word.chars().collect();
        while word.len() > max_chars {
            if line_len > 0 {
                lines.push(std::mem::take(&mut line));
                line_len = 0;
            }
            let rest = word.split_off(max_chars);
            lines.push(word.into_iter().collect());
            word = rest;
        }
        let extra = if line_len == 0 { word.len() } else { word.len() + 1 };
        if line_len + extra > max_chars && line_len > 0 {
            lines.push(std::mem::take(&mut line));
            line_len = 0;
        }
        if line_len > 0 {
            line.push(' ');
            line_len += 1;
        }
        line.extend(word.iter());
        line_len += word.len();
    }
    if line_len > 0 {
        lines.push(line);
    }
    lines
}

struct Line {
    font: &'static str,
    size: i64,
    indent: f64,
    text: String,
    space_after: f64,
}

fn layout_lines(blocks: &[Block], content_width: f64) -> Vec<Line> {
    let mut lines = Vec::new();
    for block in blocks {
        let (font, size, indent, text) = match block {
            Block::Heading(level, text) => {
                let size = match level {
                    1 => 24,
                    2 => 20,
                    3 => 16,
                    4 => 14,
                    5 => 12,
                    _ => BODY_SIZE,
                };
                ("F2", size, 0.0, text.clone())
            }
            Block::Paragraph(text) => ("F1", BODY_SIZE, 0.0, text.clone()),
            Block::ListItem(text) => ("F1", BODY_SIZE, 14.0, format!("• {}", text)),
            Block::Row(cells) => ("F1", BODY_SIZE, 0.0, cells.join(" | ")),
        };
        let max_chars = ((content_width - indent) / (size as f64 * AVG_CHAR_WIDTH)) as usize;
        let wrapped = wrap(&text, max_chars);
        let count = wrapped.len();
        for (i, text) in wrapped.into_iter().enumerate() {
            lines.push(Line {
                font,
                size,
                indent,
                text,
                space_after: if i + 1 == count { size as f64 * 0.5 } else { 0.0 },
            });
        }
    }
    lines
}

fn to_lopdf_err(e: lopdf::Error) -> BackendError {
    BackendError::Failed(format!("builtin renderer: {}", e))
}

/// A PDF text string: literal when ASCII, UTF-16BE with BOM otherwise.
fn text_string(value: &str) -> Object {
    if value.is_ascii() {
        Object::string_literal(value)
    } else {
        let mut bytes = vec![0xfe, 0xff];
        for unit in value.encode_utf16() {
            bytes.extend_from_slice(&unit.to_be_bytes());
        }
        Object::String(bytes, StringFormat::Hexadecimal)
    }
}

fn render_html(html: &str, options: &ConversionOptions) -> Result<RenderOutput, BackendError> {
    let parsed = Html::parse_document(html);
    let walk = collect_blocks(&parsed);
    let title = document_title(&parsed);

    let mut warnings = Vec::new();
    if options.extra_css.is_some() || walk.saw_styles {
        warnings.push("builtin renderer ignores CSS styling".to_string());
    }
    if walk.saw_images {
        warnings.push("builtin renderer does not load images or other assets".to_string());
    }

    let (page_width, page_height) = options.page_size.dimensions();
    let margin = |value: &str| css::length_to_pt(value).unwrap_or(54.0);
    let (top, right, bottom, left) = (
        margin(&options.margins.top),
        margin(&options.margins.right),
        margin(&options.margins.bottom),
        margin(&options.margins.left),
    );
    let content_width = page_width - left - right;
    if content_width <= 0.0 || page_height - top - bottom <= 0.0 {
        return Err(BackendError::InvalidInput(
            "margins leave no room for content".to_string(),
        ));
    }

    let lines = layout_lines(&walk.blocks, content_width);

    // Paginate: each page is a list of (x, y, line index).
    let mut pages: Vec<Vec<(i64, i64, usize)>> = vec![Vec::new()];
    let mut y = page_height - top;
    for (idx, line) in lines.iter().enumerate() {
        let leading = line.size as f64 * 1.25;
        if y - leading < bottom {
            if let Some(last) = pages.last() {
                if !last.is_empty() {
                    pages.push(Vec::new());
                }
            }
            y = page_height - top;
        }
        y -= leading;
        let x = left + line.indent;
        if let Some(page) = pages.last_mut() {
            page.push((x.round() as i64, y.round() as i64, idx));
        }
        y -= line.space_after;
    }

    let mut replaced = 0usize;
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let regular = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    });
    let bold = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica-Bold",
        "Encoding" => "WinAnsiEncoding",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => regular,
            "F2" => bold,
        },
    });

    let media_box: Vec<Object> = vec![
        0.into(),
        0.into(),
        (page_width.round() as i64).into(),
        (page_height.round() as i64).into(),
    ];

    let mut kids: Vec<Object> = Vec::with_capacity(pages.len());
    for placed in &pages {
        let mut operations = Vec::with_capacity(placed.len() * 5);
        for &(x, y, idx) in placed {
            let line = &lines[idx];
            operations.push(Operation::new("BT", vec![]));
            operations.push(Operation::new("Tf", vec![line.font.into(), line.size.into()]));
            operations.push(Operation::new("Td", vec![x.into(), y.into()]));
            operations.push(Operation::new(
                "Tj",
                vec![Object::string_literal(encode_line(&line.text, &mut replaced))],
            ));
            operations.push(Operation::new("ET", vec![]));
        }
        let content = Content { operations };
        let content_id = doc.add_object(Stream::new(
            dictionary! {},
            content.encode().map_err(to_lopdf_err)?,
        ));
        let page_id: ObjectId = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => resources_id,
            "MediaBox" => media_box.clone(),
        });
        kids.push(page_id.into());
    }

    let page_count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => page_count,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });

    let mut info = dictionary! {
        "Producer" => Object::string_literal(PRODUCER),
        "CreationDate" => Object::string_literal(
            Utc::now().format("D:%Y%m%d%H%M%SZ").to_string()
        ),
    };
    if let Some(title) = &title {
        info.set("Title", text_string(title));
    }
    let info_id = doc.add_object(info);

    doc.trailer.set("Root", catalog_id);
    doc.trailer.set("Info", info_id);
    doc.compress();

    let mut pdf = Vec::new();
    doc.save_to(&mut pdf)
        .map_err(|e| BackendError::Failed(format!("builtin renderer: {}", e)))?;

    if replaced > 0 {
        warnings.push(format!(
            "{} characters outside WinAnsi were replaced with '?'",
            replaced
        ));
    }

    Ok(RenderOutput { pdf, warnings })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blocks(html: &str) -> Vec<Block> {
        collect_blocks(&Html::parse_document(html)).blocks
    }

    #[test]
    fn test_collects_block_structure() {
        let found = blocks(
            "<html><body><h1>Title</h1><p>First  para</p>\
             <ul><li>one</li><li>two</li></ul>\
             <table><tr><th>a</th><td>b</td></tr></table>\
             <div>loose <b>text</b></div></body></html>",
        );
        assert_eq!(
            found,
            vec![
                Block::Heading(1, "Title".into()),
                Block::Paragraph("First para".into()),
                Block::ListItem("one".into()),
                Block::ListItem("two".into()),
                Block::Row(vec!["a".into(), "b".into()]),
                Block::Paragraph("loose text".into()),
            ]
        );
    }

    #[test]
    fn test_skips_scripts_and_flags_assets() {
        let walk = collect_blocks(&Html::parse_document(
            "<html><head><style>p{}</style></head><body>\
             <script>var x = 1;</script><p>kept</p><img src=\"a.png\"></body></html>",
        ));
        assert_eq!(walk.blocks, vec![Block::Paragraph("kept".into())]);
        assert!(walk.saw_styles);
        assert!(walk.saw_images);
    }

    #[test]
    fn test_wrap() {
        assert_eq!(wrap("aa bb cc", 5), vec!["aa bb", "cc"]);
        assert_eq!(wrap("abcdefgh", 3), vec!["abc", "def", "gh"]);
        assert!(wrap("   ", 10).is_empty());
    }

    #[test]
    fn test_encode_line_replaces_unmapped() {
        let mut replaced = 0;
        let bytes = encode_line("a€✓é", &mut replaced);
        assert_eq!(bytes, vec![b'a', 0x80, b'?', 0xe9]);
        assert_eq!(replaced, 1);
    }

    #[test]
    fn test_renders_pdf_bytes() {
        let options = ConversionOptions::default();
        let out = render_html("<h1>Hello</h1><p>World</p>", &options).unwrap();
        assert!(out.pdf.starts_with(b"%PDF-"));
        assert!(out.warnings.is_empty());
    }

    #[test]
    fn test_long_document_spans_pages() {
        let body: String = (0..200).map(|i| format!("<p>paragraph {}</p>", i)).collect();
        let out = render_html(&body, &ConversionOptions::default()).unwrap();
        let doc = Document::load_mem(&out.pdf).unwrap();
        assert!(doc.get_pages().len() > 1);
    }

    #[test]
    fn test_css_warning() {
        let options = ConversionOptions {
            extra_css: Some("body { color: red }".into()),
            ..Default::default()
        };
        let out = render_html("<p>x</p>", &options).unwrap();
        assert_eq!(out.warnings, vec!["builtin renderer ignores CSS styling"]);
    }
}
