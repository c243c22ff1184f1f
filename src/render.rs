//! Letter-spaced text rendering.
//!
//! Every code point is measured and placed on its own, using the glyph's
//! ink box instead of the font's advance, so that the gap between letters
//! is exactly `spacing` pixels and centering follows the drawn pixels.

use image::RgbImage;
use tracing::debug;

use crate::error::{CertError, Result};
use crate::fonts::LoadedFont;
use crate::style::TextStyle;

pub struct RenderRequest<'a> {
    pub text: &'a str,
    pub style: &'a TextStyle,
    pub surface_width: u32,
    pub centered: bool,
}

/// Total ink width of `text`: glyph widths plus `spacing` for each gap between two glyphs.
/// Saturates instead of overflowing for extreme spacings.
pub fn measure(font: &LoadedFont, text: &str, spacing: i32) -> Result<i32> {
    let mut total: i32 = 0;
    let mut glyphs: i32 = 0;
    for ch in text.chars() {
        total = total.saturating_add(font.glyph_width(ch)?);
        glyphs = glyphs.saturating_add(1);
    }
    if glyphs > 1 {
        total = total.saturating_add(spacing.saturating_mul(glyphs - 1));
    }
    Ok(total.max(0))
}

/// Left edge of the first glyph.
pub fn start_x(total_width: i32, request: &RenderRequest<'_>) -> Result<i32> {
    if request.centered {
        let surface_width = i32::try_from(request.surface_width).unwrap_or(i32::MAX);
        Ok(surface_width.saturating_sub(total_width).div_euclid(2))
    } else {
        request.style.fixed_x.ok_or(CertError::MissingFixedX)
    }
}

/// Draws the request's text onto `surface` with `font`, one glyph at a time.
pub fn render(surface: &mut RgbImage, request: &RenderRequest<'_>, font: &LoadedFont) -> Result<()> {
    let style = request.style;
    let total_width = measure(font, request.text, style.spacing)?;
    let mut x = start_x(total_width, request)?;
    debug!(
        "Rendering {:?} with {} at x={} y={} width={}",
        request.text,
        font.name(),
        x,
        style.baseline_y,
        total_width
    );

    for ch in request.text.chars() {
        let width = font.glyph_width(ch)?;
        font.draw_glyph(surface, ch, x, style.baseline_y, style.color)?;
        x = x.saturating_add(width).saturating_add(style.spacing);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fonts::BitmapFont;
    use image::Rgb;

    const WHITE: Rgb<u8> = Rgb([255, 255, 255]);

    fn bitmap() -> LoadedFont {
        LoadedFont::Bitmap(BitmapFont::new(16.0))
    }

    fn style(spacing: i32) -> TextStyle {
        TextStyle {
            font: "RobotoMono-Bold.ttf".to_string(),
            size: 16.0,
            color: Rgb([0x28, 0x03, 0x84]),
            baseline_y: 10,
            fixed_x: Some(30),
            spacing,
        }
    }

    fn ink_columns(surface: &RgbImage) -> Option<(u32, u32)> {
        let inked: Vec<u32> = (0..surface.width())
            .filter(|&x| (0..surface.height()).any(|y| surface.get_pixel(x, y) != &WHITE))
            .collect();
        Some((*inked.first()?, *inked.last()?))
    }

    #[test]
    fn test_measure_empty_is_zero() {
        let font = LoadedFont::Bitmap(BitmapFont::new(16.0));
        assert_eq!(measure(&font, "", 0).unwrap(), 0);
        assert_eq!(measure(&font, "", -7).unwrap(), 0);
        assert_eq!(measure(&font, "", 12).unwrap(), 0);
    }

    #[test]
    fn test_single_glyph_has_no_gap() {
        let font = LoadedFont::Bitmap(BitmapFont::new(16.0));
        assert_eq!(measure(&font, "A", 9).unwrap(), measure(&font, "A", 0).unwrap());
    }

    #[test]
    fn test_spacing_is_additive() {
        let font = LoadedFont::Bitmap(BitmapFont::new(16.0));
        for text in ["Ana Ruiz", "123", "Wm"] {
            let base = measure(&font, text, 0).unwrap();
            let gaps = text.chars().count() as i32 - 1;
            for spacing in [-3, -1, 2, 5] {
                assert_eq!(measure(&font, text, spacing).unwrap(), base + spacing * gaps);
            }
        }
    }

    #[test]
    fn test_spacing_sign_changes_width() {
        let font = LoadedFont::Bitmap(BitmapFont::new(16.0));
        let base = measure(&font, "Ruiz", 0).unwrap();
        assert!(measure(&font, "Ruiz", -2).unwrap() < base);
        assert!(measure(&font, "Ruiz", 2).unwrap() > base);
    }

    #[test]
    fn test_measure_uses_ink_box() {
        let font = LoadedFont::Bitmap(BitmapFont::new(8.0));
        // '1' and '.' have empty side columns in their 5-column cell.
        assert_eq!(measure(&font, "1.", 0).unwrap(), 3 + 2);
    }

    #[test]
    fn test_extreme_spacing_saturates() {
        let font = bitmap();
        assert_eq!(measure(&font, "Ana Ruiz", i32::MAX).unwrap(), i32::MAX);
        assert_eq!(measure(&font, "Ana Ruiz", i32::MIN).unwrap(), 0);
        assert_eq!(measure(&font, "AB", 4).unwrap(), 10 + 10 + 4);

        let mut surface = RgbImage::from_pixel(50, 40, WHITE);
        let style = style(i32::MAX);
        let request = RenderRequest {
            text: "Ana",
            style: &style,
            surface_width: 50,
            centered: true,
        };
        render(&mut surface, &request, &font).unwrap();
    }

    #[test]
    fn test_accented_name_renders_with_builtin_font() {
        let font = bitmap();
        let mut surface = RgbImage::from_pixel(301, 60, WHITE);
        let style = style(-1);
        let request = RenderRequest {
            text: "José Núñez",
            style: &style,
            surface_width: surface.width(),
            centered: true,
        };
        render(&mut surface, &request, &font).unwrap();

        let (left, right) = ink_columns(&surface).unwrap();
        assert_eq!((right + 1 - left) as i32, measure(&font, "José Núñez", -1).unwrap());
    }

    #[test]
    fn test_centered_ink_midpoint() {
        let font = bitmap();
        for (text, spacing) in [("Ana Ruiz", -3), ("Ana Ruiz", 0), ("Maria", 4), ("X", 0)] {
            let mut surface = RgbImage::from_pixel(301, 40, WHITE);
            let style = style(spacing);
            let request = RenderRequest {
                text,
                style: &style,
                surface_width: surface.width(),
                centered: true,
            };
            render(&mut surface, &request, &font).unwrap();

            let (left, right) = ink_columns(&surface).unwrap();
            let mid = (left + right + 1) as f32 / 2.0;
            let target = (surface.width() / 2) as f32;
            assert!((mid - target).abs() <= 1.0, "{text}: mid {mid} target {target}");
        }
    }

    #[test]
    fn test_fixed_position_starts_at_fixed_x() {
        let font = bitmap();
        let mut surface = RgbImage::from_pixel(200, 40, WHITE);
        let style = style(-3);
        let request = RenderRequest {
            text: "123",
            style: &style,
            surface_width: surface.width(),
            centered: false,
        };
        render(&mut surface, &request, &font).unwrap();

        let (left, right) = ink_columns(&surface).unwrap();
        assert_eq!(left, 30);
        let width = measure(&font, "123", style.spacing).unwrap();
        assert_eq!(right + 1 - left, width as u32);
    }

    #[test]
    fn test_fixed_position_requires_fixed_x() {
        let font = bitmap();
        let mut surface = RgbImage::from_pixel(100, 40, WHITE);
        let mut style = style(0);
        style.fixed_x = None;
        let request = RenderRequest {
            text: "7",
            style: &style,
            surface_width: 100,
            centered: false,
        };
        let result = render(&mut surface, &request, &font);
        assert!(matches!(result, Err(CertError::MissingFixedX)));
    }

    #[test]
    fn test_render_is_idempotent_from_fresh_copy() {
        let font = bitmap();
        let template = RgbImage::from_pixel(240, 60, Rgb([250, 245, 230]));
        let style = style(-1);
        let draw = || {
            let mut surface = template.clone();
            let request = RenderRequest {
                text: "Ana Ruiz",
                style: &style,
                surface_width: surface.width(),
                centered: true,
            };
            render(&mut surface, &request, &font).unwrap();
            surface.into_raw()
        };
        assert_eq!(draw(), draw());
        assert_ne!(draw(), template.clone().into_raw());
    }

    #[test]
    fn test_unavailable_glyph_fails() {
        let font = bitmap();
        let mut surface = RgbImage::from_pixel(200, 40, WHITE);
        let style = style(0);
        let request = RenderRequest {
            text: "Łucja",
            style: &style,
            surface_width: 200,
            centered: true,
        };
        let result = render(&mut surface, &request, &font);
        assert!(matches!(result, Err(CertError::GlyphUnavailable('Ł', _))));
    }

    #[test]
    fn test_start_x_floors_negative_overflow() {
        let style = style(0);
        let request = RenderRequest {
            text: "",
            style: &style,
            surface_width: 10,
            centered: true,
        };
        assert_eq!(start_x(15, &request).unwrap(), -3);
        assert_eq!(start_x(3, &request).unwrap(), 3);
    }
}
