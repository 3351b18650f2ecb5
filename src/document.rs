//! PDF and DOCX text extraction, and PDF rendering of translated text.
//!
//! Everything here is blocking; callers on the async runtime should go
//! through `tokio::task::spawn_blocking`.

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use anyhow::{anyhow, bail, Context, Result};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, ObjectId, Stream, StringFormat};
use quick_xml::events::Event;
use quick_xml::Reader;
use thiserror::Error;
use ttf_parser::{name_id, Face, GlyphId};

/// Document formats accepted for translation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Pdf,
    Docx,
}

impl DocumentFormat {
    /// Format for a file name, by extension (case-insensitive).
    pub fn from_file_name(file_name: &str) -> Option<Self> {
        let extension = Path::new(file_name).extension()?.to_str()?;
        match extension.to_ascii_lowercase().as_str() {
            "pdf" => Some(Self::Pdf),
            "docx" => Some(Self::Docx),
            _ => None,
        }
    }
}

/// Extract the plain text of a document, paragraphs separated by a blank line.
pub fn extract_text(path: &Path, format: DocumentFormat) -> Result<String> {
    match format {
        DocumentFormat::Pdf => extract_pdf_text(path),
        DocumentFormat::Docx => extract_docx_text(path),
    }
}

fn extract_pdf_text(path: &Path) -> Result<String> {
    let document = Document::load(path)
        .with_context(|| format!("Failed to open PDF {}", path.display()))?;

    let mut pages = Vec::new();
    for page_number in document.get_pages().keys() {
        let text = document
            .extract_text(&[*page_number])
            .with_context(|| format!("Failed to read text of page {}", page_number))?;
        let text = text.trim();
        if !text.is_empty() {
            pages.push(text.to_string());
        }
    }

    Ok(pages.join("\n\n"))
}

fn extract_docx_text(path: &Path) -> Result<String> {
    let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    let mut archive = zip::ZipArchive::new(file).context("Not a valid DOCX archive")?;

    let mut xml = String::new();
    archive
        .by_name("word/document.xml")
        .context("DOCX archive has no word/document.xml")?
        .read_to_string(&mut xml)
        .context("Failed to read word/document.xml")?;

    paragraphs_from_document_xml(&xml).map(|paragraphs| paragraphs.join("\n\n"))
}

/// Non-empty paragraph texts of a WordprocessingML body, in order.
fn paragraphs_from_document_xml(xml: &str) -> Result<Vec<String>> {
    let mut reader = Reader::from_str(xml);
    let mut paragraphs = Vec::new();
    let mut current = String::new();
    let mut in_text = false;

    loop {
        match reader.read_event().context("Malformed document.xml")? {
            Event::Start(e) if e.name().as_ref() == b"w:t" => in_text = true,
            Event::Text(t) if in_text => {
                current.push_str(&t.unescape().context("Bad text run in document.xml")?);
            }
            Event::Empty(e) => match e.name().as_ref() {
                b"w:tab" => current.push('\t'),
                b"w:br" => current.push('\n'),
                _ => {}
            },
            Event::End(e) => match e.name().as_ref() {
                b"w:t" => in_text = false,
                b"w:p" => {
                    let paragraph = current.trim();
                    if !paragraph.is_empty() {
                        paragraphs.push(paragraph.to_string());
                    }
                    current.clear();
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(paragraphs)
}

// ==================== Rendering ====================

const PAGE_WIDTH: i64 = 595;
const PAGE_HEIGHT: i64 = 842;
const MARGIN: i64 = 50;
const FONT_SIZE: i64 = 12;
const LINE_HEIGHT: i64 = 15;
const TEXT_WIDTH: f64 = (PAGE_WIDTH - 2 * MARGIN) as f64;
const LINES_PER_PAGE: usize = ((PAGE_HEIGHT - 2 * MARGIN) / LINE_HEIGHT) as usize;
/// ToUnicode `bfchar` blocks hold at most 100 entries
const CMAP_BLOCK: usize = 100;

static BUNDLED_FONT: &[u8] = include_bytes!("../fonts/DejaVuSans.ttf");

/// Why a PDF could not be rendered.
#[derive(Debug, Error)]
pub enum RenderError {
    /// Characters with no glyph in the font, in order of first use
    #[error("font has no glyphs for {}", describe_chars(.0))]
    MissingGlyphs(Vec<char>),

    #[error(transparent)]
    Pdf(#[from] anyhow::Error),
}

fn describe_chars(chars: &[char]) -> String {
    chars
        .iter()
        .map(|c| format!("'{}' (U+{:04X})", c, *c as u32))
        .collect::<Vec<_>>()
        .join(", ")
}

/// TrueType font embedded into every rendered PDF.
#[derive(Clone)]
pub struct PdfFont {
    data: Cow<'static, [u8]>,
}

impl PdfFont {
    /// DejaVu Sans, shipped with the gateway. Covers Latin, Greek, Cyrillic,
    /// Armenian, Georgian and Hebrew but no Indic or CJK scripts.
    pub fn bundled() -> Self {
        Self {
            data: Cow::Borrowed(BUNDLED_FONT),
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let data = std::fs::read(path)
            .with_context(|| format!("Failed to read font {}", path.display()))?;
        Self::from_bytes(data).with_context(|| format!("Unusable font {}", path.display()))
    }

    pub fn from_bytes(data: Vec<u8>) -> Result<Self> {
        let font = Self {
            data: Cow::Owned(data),
        };
        font.face()?;
        Ok(font)
    }

    fn face(&self) -> Result<Face<'_>> {
        let face = Face::parse(&self.data, 0).map_err(|e| anyhow!("Invalid TrueType font: {}", e))?;
        if face.tables().glyf.is_none() {
            bail!("Font has no TrueType outlines");
        }
        Ok(face)
    }
}

/// Glyph lookups and metrics for one render.
struct Glyphs<'a> {
    face: Face<'a>,
    units_per_em: f64,
}

impl<'a> Glyphs<'a> {
    fn new(face: Face<'a>) -> Self {
        let units_per_em = f64::from(face.units_per_em());
        Self { face, units_per_em }
    }

    fn id(&self, c: char) -> Option<GlyphId> {
        self.face.glyph_index(c).filter(|glyph| glyph.0 != 0)
    }

    /// Advance in 1/1000 text space units, as PDF widths are given.
    fn width(&self, glyph: GlyphId) -> i64 {
        let advance = self.face.glyph_hor_advance(glyph).unwrap_or(0);
        self.scaled(i64::from(advance))
    }

    /// Advance of `c` in points at the body font size.
    fn advance(&self, c: char) -> f64 {
        self.id(c)
            .map(|glyph| self.width(glyph) as f64 * FONT_SIZE as f64 / 1000.0)
            .unwrap_or(0.0)
    }

    fn scaled(&self, units: i64) -> i64 {
        (units as f64 * 1000.0 / self.units_per_em).round() as i64
    }

    fn base_font(&self) -> String {
        self.face
            .names()
            .into_iter()
            .filter(|name| name.name_id == name_id::POST_SCRIPT_NAME)
            .find_map(|name| name.to_string())
            .map(|name| {
                name.chars()
                    .filter(|c| c.is_ascii_alphanumeric() || *c == '-')
                    .collect::<String>()
            })
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| "EmbeddedFont".to_string())
    }
}

/// Render text as an A4 PDF, one paragraph per input line.
///
/// The font is embedded as a CID-keyed TrueType font with a ToUnicode map,
/// so the text can be extracted again. Text the font cannot draw is refused
/// with [`RenderError::MissingGlyphs`].
pub fn render_pdf(text: &str, font: &PdfFont) -> Result<Vec<u8>, RenderError> {
    let glyphs = Glyphs::new(font.face()?);

    let paragraphs: Vec<String> = text.lines().map(printable).collect();
    let mut missing = Vec::new();
    for c in paragraphs.iter().flat_map(|p| p.chars()) {
        if glyphs.id(c).is_none() && !missing.contains(&c) {
            missing.push(c);
        }
    }
    if !missing.is_empty() {
        return Err(RenderError::MissingGlyphs(missing));
    }

    let lines: Vec<String> = paragraphs
        .iter()
        .flat_map(|p| wrap_line(p, TEXT_WIDTH, |c| glyphs.advance(c)))
        .collect();
    let pages: Vec<&[String]> = if lines.is_empty() {
        vec![&lines[..]]
    } else {
        lines.chunks(LINES_PER_PAGE).collect()
    };

    let mut used: BTreeMap<u16, char> = BTreeMap::new();
    for c in lines.iter().flat_map(|l| l.chars()) {
        if let Some(glyph) = glyphs.id(c) {
            used.entry(glyph.0).or_insert(c);
        }
    }

    let mut document = Document::with_version("1.5");
    let pages_id = document.new_object_id();
    let font_id = add_font(&mut document, &font.data, &glyphs, &used);
    let resources_id = document.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => font_id,
        },
    });

    let mut kids = Vec::with_capacity(pages.len());
    for page_lines in &pages {
        let page_id = add_page(&mut document, pages_id, resources_id, &glyphs, page_lines)?;
        kids.push(Object::Reference(page_id));
    }

    let page_count = kids.len() as i64;
    document.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => Object::Integer(page_count),
            "Resources" => resources_id,
            "MediaBox" => vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Integer(PAGE_WIDTH),
                Object::Integer(PAGE_HEIGHT),
            ],
        }),
    );
    let catalog_id = document.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    document.trailer.set("Root", catalog_id);
    document.compress();

    let mut bytes = Vec::new();
    document
        .save_to(&mut bytes)
        .context("Failed to serialize PDF")?;
    Ok(bytes)
}

/// Type0 font over the whole TrueType program, glyph ids used as CIDs.
fn add_font(
    document: &mut Document,
    data: &[u8],
    glyphs: &Glyphs,
    used: &BTreeMap<u16, char>,
) -> ObjectId {
    let base_font = glyphs.base_font();
    let face = &glyphs.face;

    let font_file_id = document.add_object(Stream::new(
        dictionary! { "Length1" => data.len() as i64 },
        data.to_vec(),
    ));

    let bbox = face.global_bounding_box();
    let ascent = glyphs.scaled(i64::from(face.ascender()));
    let descriptor_id = document.add_object(dictionary! {
        "Type" => "FontDescriptor",
        "FontName" => Object::Name(base_font.clone().into_bytes()),
        "Flags" => 32,
        "FontBBox" => vec![
            Object::Integer(glyphs.scaled(i64::from(bbox.x_min))),
            Object::Integer(glyphs.scaled(i64::from(bbox.y_min))),
            Object::Integer(glyphs.scaled(i64::from(bbox.x_max))),
            Object::Integer(glyphs.scaled(i64::from(bbox.y_max))),
        ],
        "ItalicAngle" => 0,
        "Ascent" => ascent,
        "Descent" => glyphs.scaled(i64::from(face.descender())),
        "CapHeight" => face
            .capital_height()
            .map(|h| glyphs.scaled(i64::from(h)))
            .unwrap_or(ascent),
        "StemV" => 80,
        "FontFile2" => font_file_id,
    });

    let mut widths = Vec::with_capacity(used.len() * 2);
    for glyph in used.keys() {
        widths.push(Object::Integer(i64::from(*glyph)));
        widths.push(Object::Array(vec![Object::Integer(
            glyphs.width(GlyphId(*glyph)),
        )]));
    }

    let cid_font_id = document.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "CIDFontType2",
        "BaseFont" => Object::Name(base_font.clone().into_bytes()),
        "CIDSystemInfo" => dictionary! {
            "Registry" => Object::string_literal("Adobe"),
            "Ordering" => Object::string_literal("Identity"),
            "Supplement" => 0,
        },
        "FontDescriptor" => descriptor_id,
        "CIDToGIDMap" => "Identity",
        "W" => widths,
    });

    let to_unicode_id = document.add_object(Stream::new(dictionary! {}, to_unicode_cmap(used)));

    document.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type0",
        "BaseFont" => Object::Name(base_font.into_bytes()),
        "Encoding" => "Identity-H",
        "DescendantFonts" => vec![Object::Reference(cid_font_id)],
        "ToUnicode" => to_unicode_id,
    })
}

/// CMap from glyph ids back to the characters they were drawn for.
fn to_unicode_cmap(used: &BTreeMap<u16, char>) -> Vec<u8> {
    let mut cmap = String::from(
        "/CIDInit /ProcSet findresource begin\n\
         12 dict begin\n\
         begincmap\n\
         /CIDSystemInfo << /Registry (Adobe) /Ordering (UCS) /Supplement 0 >> def\n\
         /CMapName /Adobe-Identity-UCS def\n\
         /CMapType 2 def\n\
         1 begincodespacerange\n\
         <0000> <FFFF>\n\
         endcodespacerange\n",
    );

    let entries: Vec<(&u16, &char)> = used.iter().collect();
    for block in entries.chunks(CMAP_BLOCK) {
        cmap.push_str(&format!("{} beginbfchar\n", block.len()));
        for (glyph, c) in block {
            let mut units = [0u16; 2];
            let target: String = c
                .encode_utf16(&mut units)
                .iter()
                .map(|unit| format!("{:04X}", unit))
                .collect();
            cmap.push_str(&format!("<{:04X}> <{}>\n", glyph, target));
        }
        cmap.push_str("endbfchar\n");
    }

    cmap.push_str(
        "endcmap\n\
         CMapName currentdict /CMap defineresource pop\n\
         end\n\
         end\n",
    );
    cmap.into_bytes()
}

fn add_page(
    document: &mut Document,
    parent: ObjectId,
    resources: ObjectId,
    glyphs: &Glyphs,
    lines: &[String],
) -> Result<ObjectId> {
    let mut operations = Vec::new();
    for (index, line) in lines.iter().enumerate() {
        if line.is_empty() {
            continue;
        }
        let baseline = PAGE_HEIGHT - MARGIN - FONT_SIZE - index as i64 * LINE_HEIGHT;
        let encoded: Vec<u8> = line
            .chars()
            .filter_map(|c| glyphs.id(c))
            .flat_map(|glyph| glyph.0.to_be_bytes())
            .collect();
        operations.extend([
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec!["F1".into(), Object::Integer(FONT_SIZE)]),
            Operation::new("Td", vec![Object::Integer(MARGIN), Object::Integer(baseline)]),
            Operation::new(
                "Tj",
                vec![Object::String(encoded, StringFormat::Hexadecimal)],
            ),
            Operation::new("ET", vec![]),
        ]);
    }

    let content = Content { operations }
        .encode()
        .context("Failed to encode page content")?;
    let content_id = document.add_object(Stream::new(dictionary! {}, content));

    Ok(document.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => parent,
        "Contents" => content_id,
        "Resources" => resources,
    }))
}

/// Tabs become spaces, other control characters are dropped.
fn printable(paragraph: &str) -> String {
    paragraph
        .chars()
        .filter_map(|c| match c {
            '\t' => Some(' '),
            c if c.is_control() => None,
            c => Some(c),
        })
        .collect()
}

/// Word-wrap one paragraph to `max_width` points; an empty paragraph stays
/// as one blank line.
fn wrap_line(paragraph: &str, max_width: f64, advance: impl Fn(char) -> f64) -> Vec<String> {
    let width_of = |text: &str| -> f64 { text.chars().map(&advance).sum() };
    let space = advance(' ');
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut current_width = 0.0;

    for word in paragraph.split_whitespace() {
        let mut word = word.to_string();
        let mut word_width = width_of(&word);

        // Hard-split words that cannot fit on a line at all
        while word_width > max_width {
            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
                current_width = 0.0;
            }
            let rest = split_at_width(&mut word, max_width, &advance);
            lines.push(std::mem::replace(&mut word, rest));
            word_width = width_of(&word);
        }
        if word.is_empty() {
            continue;
        }

        let needed = if current.is_empty() {
            word_width
        } else {
            word_width + space
        };
        if !current.is_empty() && current_width + needed > max_width {
            lines.push(std::mem::take(&mut current));
            current_width = 0.0;
        }
        if !current.is_empty() {
            current.push(' ');
            current_width += space;
        }
        current_width += word_width;
        current.push_str(&word);
    }

    if !current.is_empty() || lines.is_empty() {
        lines.push(current);
    }
    lines
}

/// Cut `word` after the last character that fits, returning the remainder.
/// At least one character always stays in `word`.
fn split_at_width(word: &mut String, max_width: f64, advance: impl Fn(char) -> f64) -> String {
    let mut width = 0.0;
    let mut cut = word.len();
    for (index, c) in word.char_indices() {
        let w = advance(c);
        if index > 0 && width + w > max_width {
            cut = index;
            break;
        }
        width += w;
    }
    word.split_off(cut)
}
