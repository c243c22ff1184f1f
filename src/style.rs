use image::Rgb;

use crate::error::{CertError, Result};

/// How one text field is drawn: font, size, colour, position and letter spacing.
#[derive(Debug, Clone, PartialEq)]
pub struct TextStyle {
    pub font: String,
    pub size: f32,
    pub color: Rgb<u8>,
    /// Top of the text box, in pixels from the top of the template.
    pub baseline_y: i32,
    pub fixed_x: Option<i32>,
    /// Extra pixels between consecutive glyphs. Negative values pull letters together.
    pub spacing: i32,
}

impl TextStyle {
    pub fn with_spacing(&self, spacing: i32) -> Self {
        Self {
            spacing,
            ..self.clone()
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldStyle {
    pub style: TextStyle,
    pub centered: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Name,
    Identification,
}

impl Field {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "nombre" | "name" => Some(Field::Name),
            "identificacion" | "identificación" | "identification" | "id" => {
                Some(Field::Identification)
            }
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Field::Name => "nombre",
            Field::Identification => "identificacion",
        }
    }
}

/// The two-field certificate layout.
#[derive(Debug, Clone, PartialEq)]
pub struct CertificateLayout {
    pub name: FieldStyle,
    pub identification: FieldStyle,
}

impl Default for CertificateLayout {
    fn default() -> Self {
        let color = Rgb([0x28, 0x03, 0x84]);
        Self {
            name: FieldStyle {
                style: TextStyle {
                    font: "RobotoMono-Bold.ttf".to_string(),
                    size: 50.0,
                    color,
                    baseline_y: 250,
                    fixed_x: None,
                    spacing: -3,
                },
                centered: true,
            },
            identification: FieldStyle {
                style: TextStyle {
                    font: "RobotoMono-Bold.ttf".to_string(),
                    size: 39.0,
                    color,
                    baseline_y: 342,
                    fixed_x: Some(610),
                    spacing: -3,
                },
                centered: false,
            },
        }
    }
}

impl CertificateLayout {
    pub fn field(&self, field: Field) -> &FieldStyle {
        match field {
            Field::Name => &self.name,
            Field::Identification => &self.identification,
        }
    }

    /// Returns a copy of the layout with `field` rebound to `spacing`.
    pub fn with_spacing(&self, field: Field, spacing: i32) -> Self {
        let mut layout = self.clone();
        let target = match field {
            Field::Name => &mut layout.name,
            Field::Identification => &mut layout.identification,
        };
        target.style = target.style.with_spacing(spacing);
        layout
    }
}

pub fn parse_hex_color(s: &str) -> Result<Rgb<u8>> {
    let hex = s.trim().trim_start_matches('#');
    if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(CertError::InvalidColor(s.to_string()));
    }
    let channel = |i: usize| {
        u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| CertError::InvalidColor(s.to_string()))
    };
    Ok(Rgb([channel(0)?, channel(2)?, channel(4)?]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_layout_matches_certificate() {
        let layout = CertificateLayout::default();
        assert!(layout.name.centered);
        assert_eq!(layout.name.style.baseline_y, 250);
        assert!(!layout.identification.centered);
        assert_eq!(layout.identification.style.fixed_x, Some(610));
        assert_eq!(layout.identification.style.baseline_y, 342);
        assert_eq!(layout.name.style.color, Rgb([0x28, 0x03, 0x84]));
    }

    #[test]
    fn test_with_spacing_leaves_original_untouched() {
        let layout = CertificateLayout::default();
        let adjusted = layout.with_spacing(Field::Name, 4);
        assert_eq!(adjusted.name.style.spacing, 4);
        assert_eq!(adjusted.identification.style.spacing, -3);
        assert_eq!(layout.name.style.spacing, -3);
    }

    #[test]
    fn test_field_parse() {
        assert_eq!(Field::parse("nombre"), Some(Field::Name));
        assert_eq!(Field::parse(" Identificacion "), Some(Field::Identification));
        assert_eq!(Field::parse("fecha"), None);
    }

    #[test]
    fn test_parse_hex_color() {
        assert_eq!(parse_hex_color("#280384").unwrap(), Rgb([0x28, 0x03, 0x84]));
        assert_eq!(parse_hex_color("ffffff").unwrap(), Rgb([255, 255, 255]));
        assert!(parse_hex_color("#12345").is_err());
        assert!(parse_hex_color("#zzzzzz").is_err());
    }
}
