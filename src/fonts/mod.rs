// Font resolution with the fallback chain: requested file, system font, built-in bitmap.
mod bitmap;

pub use bitmap::BitmapFont;

use image::{Rgb, RgbImage};
use rusttype::{point, Font, Scale};
use std::path::{Path, PathBuf};
use tracing::{error, warn};

use crate::error::{CertError, Result};

const BUILTIN_NAME: &str = "builtin-5x7";

// Common locations of a plain sans font, tried in order when the requested one is missing.
const SYSTEM_FONTS: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Bold.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "/Library/Fonts/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

#[derive(Debug, Clone)]
pub struct FontConfig {
    pub fonts_dir: PathBuf,
    pub system_fallbacks: Vec<PathBuf>,
    pub builtin_fallback: bool,
}

impl FontConfig {
    pub fn new(fonts_dir: impl Into<PathBuf>) -> Self {
        Self {
            fonts_dir: fonts_dir.into(),
            system_fallbacks: SYSTEM_FONTS.iter().map(PathBuf::from).collect(),
            builtin_fallback: true,
        }
    }

    /// Resolves `name` at `size`.
    ///
    /// A missing file falls back to the first available system font (warning).
    /// Unreadable font data falls back to the built-in bitmap font (error).
    /// Fails only when nothing is usable and the built-in font is disabled.
    pub fn resolve(&self, name: &str, size: f32) -> Result<LoadedFont> {
        let requested = self.fonts_dir.join(name);
        let path = if requested.is_file() {
            Some(requested)
        } else {
            let fallback = self.system_fallbacks.iter().find(|p| p.is_file()).cloned();
            match &fallback {
                Some(p) => warn!("Font {} not found, using {} as fallback", name, p.display()),
                None => warn!("Font {} not found and no system font is available", name),
            }
            fallback
        };

        if let Some(path) = path {
            match load_face(&path) {
                Ok(font) => {
                    return Ok(LoadedFont::Scalable {
                        name: path.display().to_string(),
                        font,
                        scale: Scale::uniform(size),
                    })
                }
                Err(e) => error!("Failed to load font {}: {}", path.display(), e),
            }
        }

        if self.builtin_fallback {
            let bitmap = BitmapFont::new(size);
            warn!("Using built-in bitmap font for {} at scale {}", name, bitmap.scale());
            return Ok(LoadedFont::Bitmap(bitmap));
        }
        Err(CertError::FontUnavailable(name.to_string()))
    }

    /// Resolves once for a whole run. A failure is logged here and reported
    /// again by [`ResolvedFont::get`] for every certificate that needs the font.
    pub fn resolve_for_run(&self, name: &str, size: f32) -> ResolvedFont {
        let font = self
            .resolve(name, size)
            .inspect_err(|e| error!("Font {} is unusable: {}", name, e))
            .ok();
        ResolvedFont {
            requested: name.to_string(),
            font,
        }
    }
}

pub struct ResolvedFont {
    requested: String,
    font: Option<LoadedFont>,
}

impl ResolvedFont {
    pub fn get(&self) -> Result<&LoadedFont> {
        self.font
            .as_ref()
            .ok_or_else(|| CertError::FontUnavailable(self.requested.clone()))
    }
}

fn load_face(path: &Path) -> Result<Font<'static>> {
    let bytes = std::fs::read(path)?;
    Font::try_from_vec(bytes).ok_or_else(|| CertError::FontUnavailable(path.display().to_string()))
}

/// A font ready for per-glyph measuring and drawing.
pub enum LoadedFont {
    Scalable {
        name: String,
        font: Font<'static>,
        scale: Scale,
    },
    Bitmap(BitmapFont),
}

impl LoadedFont {
    pub fn name(&self) -> &str {
        match self {
            LoadedFont::Scalable { name, .. } => name,
            LoadedFont::Bitmap(_) => BUILTIN_NAME,
        }
    }

    /// Ink width of `ch` in pixels. Glyphs without ink (spaces) report their advance.
    pub fn glyph_width(&self, ch: char) -> Result<i32> {
        match self {
            LoadedFont::Scalable { font, scale, .. } => {
                let glyph = font.glyph(ch).scaled(*scale);
                let advance = glyph.h_metrics().advance_width.round() as i32;
                let positioned = glyph.positioned(point(0.0, font.v_metrics(*scale).ascent));
                Ok(positioned
                    .pixel_bounding_box()
                    .map(|bb| bb.width())
                    .unwrap_or(advance))
            }
            LoadedFont::Bitmap(bitmap) => bitmap
                .glyph_width(ch)
                .ok_or_else(|| CertError::GlyphUnavailable(ch, self.name().to_string())),
        }
    }

    /// Draws `ch` with its ink left edge at `x` and the top of the em box at `y`.
    pub fn draw_glyph(&self, surface: &mut RgbImage, ch: char, x: i32, y: i32, color: Rgb<u8>) -> Result<()> {
        match self {
            LoadedFont::Scalable { font, scale, .. } => {
                let ascent = font.v_metrics(*scale).ascent;
                let glyph = font.glyph(ch).scaled(*scale).positioned(point(0.0, ascent));
                if let Some(bb) = glyph.pixel_bounding_box() {
                    glyph.draw(|gx, gy, coverage| {
                        let px = x.saturating_add(gx as i32);
                        let py = y.saturating_add(bb.min.y + gy as i32);
                        blend(surface, px, py, color, coverage);
                    });
                }
                Ok(())
            }
            LoadedFont::Bitmap(bitmap) => {
                if bitmap.draw_glyph(surface, ch, x, y, color) {
                    Ok(())
                } else {
                    Err(CertError::GlyphUnavailable(ch, self.name().to_string()))
                }
            }
        }
    }
}

/// Mixes `color` into the pixel at (`x`, `y`) by `coverage`; pixels off the surface are skipped.
pub(crate) fn blend(surface: &mut RgbImage, x: i32, y: i32, color: Rgb<u8>, coverage: f32) {
    if x < 0 || y < 0 || x >= surface.width() as i32 || y >= surface.height() as i32 {
        return;
    }
    let coverage = coverage.clamp(0.0, 1.0);
    let pixel = surface.get_pixel_mut(x as u32, y as u32);
    for i in 0..3 {
        pixel[i] = (color[i] as f32 * coverage + pixel[i] as f32 * (1.0 - coverage)).round() as u8;
    }
}
