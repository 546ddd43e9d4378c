use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};

use usvg::fontdb;

use crate::foundation::color::Rgba8;
use crate::foundation::error::{CardError, CardResult};

/// Horizontal placement of laid-out lines within the text box.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TextAlign {
    #[default]
    Start,
    Center,
    End,
}

impl TextAlign {
    pub fn parse(s: Option<&str>) -> Self {
        match s {
            Some("center" | "middle") => Self::Center,
            Some("end" | "right") => Self::End,
            _ => Self::Start,
        }
    }
}

/// Font face bytes resolved from the font book.
#[derive(Clone)]
pub struct FontFace {
    /// Stable key for this face (family + weight as requested).
    pub key: String,
    /// Raw font file bytes.
    pub bytes: Arc<Vec<u8>>,
    /// Face index within the file.
    pub index: u32,
    /// Paint-side font handle.
    pub font: vello_cpu::peniko::FontData,
}

impl std::fmt::Debug for FontFace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontFace")
            .field("key", &self.key)
            .field("index", &self.index)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// System and user font lookup backed by `fontdb`.
///
/// Faces are resolved from a CSS-like family list (`"Inter, sans-serif"`) and a numeric weight,
/// then memoized.
pub struct FontBook {
    db: fontdb::Database,
    faces: Mutex<HashMap<String, Option<FontFace>>>,
}

impl std::fmt::Debug for FontBook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontBook")
            .field("faces", &self.db.len())
            .finish_non_exhaustive()
    }
}

impl FontBook {
    /// Load system fonts plus every font under `extra_dirs`.
    pub fn new(extra_dirs: &[PathBuf]) -> Self {
        let mut db = fontdb::Database::new();
        db.load_system_fonts();
        for dir in extra_dirs {
            db.load_fonts_dir(dir);
        }
        tracing::debug!(faces = db.len(), "loaded font database");
        Self::from_database(db)
    }

    /// Font book over a prepared database.
    pub fn from_database(db: fontdb::Database) -> Self {
        Self {
            db,
            faces: Mutex::new(HashMap::new()),
        }
    }

    /// Font book with no faces; every text draw fails with `FONT_UNAVAILABLE`.
    pub fn empty() -> Self {
        Self::from_database(fontdb::Database::new())
    }

    /// Register a font file from memory.
    pub fn load_font_data(&mut self, bytes: Vec<u8>) {
        self.db.load_font_data(bytes);
        self.faces
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    pub fn is_empty(&self) -> bool {
        self.db.is_empty()
    }

    /// Resolve a face for `families` at `weight`.
    pub fn resolve(&self, families: &str, weight: u16) -> CardResult<FontFace> {
        let key = format!("{families}#{weight}");
        let mut faces = self.faces.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(hit) = faces.get(&key) {
            return hit.clone().ok_or_else(|| font_unavailable(families));
        }

        let face = self.query(families, weight).and_then(|id| {
            self.db.with_face_data(id, |data, index| FontFace {
                key: key.clone(),
                bytes: Arc::new(data.to_vec()),
                index,
                font: vello_cpu::peniko::FontData::new(
                    vello_cpu::peniko::Blob::from(data.to_vec()),
                    index,
                ),
            })
        });
        faces.insert(key, face.clone());
        face.ok_or_else(|| font_unavailable(families))
    }

    fn query(&self, families: &str, weight: u16) -> Option<fontdb::ID> {
        let mut names: Vec<fontdb::Family<'_>> = families
            .split(',')
            .map(|f| f.trim().trim_matches(|c| c == '"' || c == '\''))
            .filter(|f| !f.is_empty())
            .map(|f| match f.to_ascii_lowercase().as_str() {
                "sans-serif" | "system-ui" => fontdb::Family::SansSerif,
                "serif" => fontdb::Family::Serif,
                "monospace" => fontdb::Family::Monospace,
                "cursive" => fontdb::Family::Cursive,
                "fantasy" => fontdb::Family::Fantasy,
                _ => fontdb::Family::Name(f),
            })
            .collect();
        names.push(fontdb::Family::SansSerif);

        let q = fontdb::Query {
            families: &names,
            weight: fontdb::Weight(weight),
            stretch: fontdb::Stretch::Normal,
            style: fontdb::Style::Normal,
        };
        // Generic families may be unmapped on minimal systems; fall back to any face.
        self.db
            .query(&q)
            .or_else(|| self.db.faces().next().map(|f| f.id))
    }
}

fn font_unavailable(families: &str) -> CardError {
    CardError::render(
        "FONT_UNAVAILABLE",
        format!("no font face available for '{families}'"),
    )
    .with_context(serde_json::json!({ "family": families }))
}

/// Stateful helper for building Parley text layouts from font bytes.
pub struct TextEngine {
    font_ctx: parley::FontContext,
    layout_ctx: parley::LayoutContext<Rgba8>,
    // Face key -> family name registered in `font_ctx`.
    families: HashMap<String, String>,
}

impl Default for TextEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// Laid-out text plus the face it was shaped with.
pub struct TextBlock {
    pub layout: parley::Layout<Rgba8>,
    pub font: vello_cpu::peniko::FontData,
    pub align: TextAlign,
    /// Width lines are aligned within, if constrained.
    pub max_width: Option<f32>,
}

impl TextBlock {
    pub fn width(&self) -> f32 {
        self.layout.width()
    }

    pub fn height(&self) -> f32 {
        self.layout.height()
    }
}

impl TextEngine {
    pub fn new() -> Self {
        Self {
            font_ctx: parley::FontContext::default(),
            layout_ctx: parley::LayoutContext::new(),
            families: HashMap::new(),
        }
    }

    /// Shape and break plain text.
    pub fn layout(
        &mut self,
        face: &FontFace,
        text: &str,
        size_px: f32,
        color: Rgba8,
        max_width: Option<f32>,
        align: TextAlign,
    ) -> CardResult<TextBlock> {
        if !size_px.is_finite() || size_px <= 0.0 {
            return Err(CardError::validation("font size must be finite and > 0"));
        }
        let family = self.family_for(face)?;

        let mut builder = self
            .layout_ctx
            .ranged_builder(&mut self.font_ctx, text, 1.0, true);
        builder.push_default(parley::style::StyleProperty::FontStack(
            parley::style::FontStack::Source(std::borrow::Cow::Owned(family)),
        ));
        builder.push_default(parley::style::StyleProperty::FontSize(size_px));
        builder.push_default(parley::style::StyleProperty::Brush(color));

        let mut layout: parley::Layout<Rgba8> = builder.build(text);
        layout.break_all_lines(max_width);
        Ok(TextBlock {
            layout,
            font: face.font.clone(),
            align,
            max_width,
        })
    }

    fn family_for(&mut self, face: &FontFace) -> CardResult<String> {
        if let Some(name) = self.families.get(&face.key) {
            return Ok(name.clone());
        }
        let registered = self.font_ctx.collection.register_fonts(
            parley::fontique::Blob::from(face.bytes.as_ref().clone()),
            None,
        );
        let family_id = registered
            .first()
            .map(|(id, _)| *id)
            .ok_or_else(|| CardError::render("FONT_UNAVAILABLE", "font bytes register no family"))?;
        let name = self
            .font_ctx
            .collection
            .family_name(family_id)
            .ok_or_else(|| CardError::render("FONT_UNAVAILABLE", "registered family has no name"))?
            .to_owned();
        self.families.insert(face.key.clone(), name.clone());
        Ok(name)
    }
}

/// Fill every glyph run of `block` with its top-left corner at `origin` (device transform).
pub(crate) fn draw_text_block(
    ctx: &mut vello_cpu::RenderContext,
    block: &TextBlock,
    origin: vello_cpu::kurbo::Affine,
) {
    let box_w = block.max_width.unwrap_or_else(|| block.width());
    for line in block.layout.lines() {
        let slack = (box_w - line.metrics().advance).max(0.0);
        let dx = match block.align {
            TextAlign::Start => 0.0,
            TextAlign::Center => slack * 0.5,
            TextAlign::End => slack,
        };
        ctx.set_transform(origin * vello_cpu::kurbo::Affine::translate((f64::from(dx), 0.0)));
        for item in line.items() {
            let parley::layout::PositionedLayoutItem::GlyphRun(run) = item else {
                continue;
            };
            let brush = run.style().brush;
            ctx.set_paint(brush.to_paint());
            let glyphs = run.positioned_glyphs().map(|g| vello_cpu::Glyph {
                id: g.id,
                x: g.x,
                y: g.y,
            });
            ctx.glyph_run(&block.font)
                .font_size(run.run().font_size())
                .fill_glyphs(glyphs);
        }
    }
    ctx.set_transform(origin);
}

#[cfg(test)]
#[path = "../../tests/unit/render/text.rs"]
mod tests;
