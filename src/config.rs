use std::path::PathBuf;

use crate::error::{CertError, Result};
use crate::style::{parse_hex_color, CertificateLayout, Field};

#[derive(Debug, Clone)]
pub struct Config {
    pub roster_path: PathBuf,
    pub template_path: PathBuf,
    pub output_folder: PathBuf,
    pub fonts_folder: PathBuf,
    pub name_column: String,
    pub id_column: String,
    pub builtin_font_fallback: bool,
    /// Spacing overrides applied before the run starts.
    pub spacing_overrides: Vec<(Field, i32)>,
    /// `SPACING=nombre:-2,identificacion:1`, applied by field name after `spacing_overrides`.
    pub named_spacing: Vec<(String, i32)>,
    pub text_color: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let base_dir = base_dir();
        let path = |key: &str, default: &str| base_dir.join(var(key).unwrap_or_else(|| default.to_string()));

        let mut spacing_overrides = Vec::new();
        for (key, field) in [("NAME_SPACING", Field::Name), ("ID_SPACING", Field::Identification)] {
            if let Some(raw) = var(key) {
                spacing_overrides.push((field, parse_spacing(key, &raw)?));
            }
        }

        let mut named_spacing = Vec::new();
        if let Some(raw) = var("SPACING") {
            for entry in raw.split(',').map(str::trim).filter(|e| !e.is_empty()) {
                let (field, spacing) = entry.split_once(':').ok_or_else(|| {
                    CertError::Config(format!("SPACING entries look like field:pixels, got '{}'", entry))
                })?;
                named_spacing.push((field.trim().to_string(), parse_spacing("SPACING", spacing)?));
            }
        }

        let builtin_font_fallback = match var("BUILTIN_FONT_FALLBACK") {
            None => true,
            Some(raw) => parse_bool(&raw)
                .ok_or_else(|| CertError::Config(format!("BUILTIN_FONT_FALLBACK must be true or false, got '{}'", raw)))?,
        };

        let text_color = var("TEXT_COLOR");
        if let Some(color) = &text_color {
            parse_hex_color(color)?;
        }

        Ok(Self {
            roster_path: path("ROSTER_PATH", "datos/estudiantes.xlsx"),
            template_path: path("TEMPLATE_PATH", "plantillas/plantilla.png"),
            output_folder: path("OUTPUT_FOLDER", "certificados_generados"),
            fonts_folder: path("FONTS_FOLDER", "fonts"),
            name_column: var("NAME_COLUMN").unwrap_or_else(|| "nombre_completo".to_string()),
            id_column: var("ID_COLUMN").unwrap_or_else(|| "identificacion".to_string()),
            builtin_font_fallback,
            spacing_overrides,
            named_spacing,
            text_color,
        })
    }

    /// The default certificate layout with this configuration's colour applied.
    pub fn layout(&self) -> Result<CertificateLayout> {
        let mut layout = CertificateLayout::default();
        if let Some(color) = &self.text_color {
            let color = parse_hex_color(color)?;
            layout.name.style.color = color;
            layout.identification.style.color = color;
        }
        Ok(layout)
    }

    /// Folders the generator expects to exist: output, fonts, and the roster and template folders.
    pub fn folders(&self) -> Vec<PathBuf> {
        let mut folders = vec![self.output_folder.clone(), self.fonts_folder.clone()];
        for file in [&self.roster_path, &self.template_path] {
            if let Some(parent) = file.parent() {
                if !folders.iter().any(|f| f == parent) {
                    folders.push(parent.to_path_buf());
                }
            }
        }
        folders
    }
}

fn base_dir() -> PathBuf {
    std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
}

/// Where the log goes. Read on its own so logging can start before the rest
/// of the configuration is validated.
pub fn log_file_path(var: impl Fn(&str) -> Option<String>) -> PathBuf {
    base_dir().join(var("LOG_FILE").unwrap_or_else(|| DEFAULT_LOG_FILE.to_string()))
}

const DEFAULT_LOG_FILE: &str = "generador_certificados.log";

/// Letter spacing in pixels, bounded so widths stay far from `i32` limits.
fn parse_spacing(key: &str, raw: &str) -> Result<i32> {
    raw.trim()
        .parse::<i32>()
        .ok()
        .filter(|s| (-MAX_SPACING..=MAX_SPACING).contains(s))
        .ok_or_else(|| {
            CertError::Config(format!(
                "{} must be an integer between -{} and {}, got '{}'",
                key, MAX_SPACING, MAX_SPACING, raw
            ))
        })
}

const MAX_SPACING: i32 = 10_000;

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
