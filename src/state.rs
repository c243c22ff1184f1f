use crate::config::Config;
use crate::error::Result;
use crate::fonts::{FontConfig, LoadedFont, ResolvedFont};
use crate::style::{CertificateLayout, Field};
use std::sync::Arc;
use tracing::{info, info_span, warn, Span};

/// Everything one batch run needs, passed explicitly to each operation.
pub struct RunContext {
    pub config: Arc<Config>,
    pub layout: CertificateLayout,
    pub fonts: FontConfig,
    pub span: Span,
}

impl RunContext {
    pub fn new(config: Config) -> Result<Self> {
        let layout = config.layout()?;
        let overrides = config.spacing_overrides.clone();
        let named = config.named_spacing.clone();
        let mut fonts = FontConfig::new(&config.fonts_folder);
        fonts.builtin_fallback = config.builtin_font_fallback;
        let span = info_span!("run", output = %config.output_folder.display());

        let mut ctx = Self {
            config: Arc::new(config),
            layout,
            fonts,
            span,
        };
        for (field, spacing) in overrides {
            ctx.set_spacing(field, spacing);
        }
        for (field, spacing) in named {
            ctx.set_spacing_by_name(&field, spacing);
        }
        Ok(ctx)
    }

    /// Resolves the font of each field once, for every certificate of a run.
    pub fn resolve_fonts(&self) -> FieldFonts {
        let resolve = |field: Field| {
            let style = &self.layout.field(field).style;
            self.fonts.resolve_for_run(&style.font, style.size)
        };
        FieldFonts {
            name: resolve(Field::Name),
            identification: resolve(Field::Identification),
        }
    }

    /// Rebinds the letter spacing of `field` for every later render.
    pub fn set_spacing(&mut self, field: Field, spacing: i32) {
        self.layout = self.layout.with_spacing(field, spacing);
        info!("Spacing of {} set to {}px", field.as_str(), spacing);
    }

    /// Same as [`set_spacing`](Self::set_spacing) with the field given by name.
    /// Returns `false` and changes nothing when the name is unknown.
    pub fn set_spacing_by_name(&mut self, field: &str, spacing: i32) -> bool {
        match Field::parse(field) {
            Some(field) => {
                self.set_spacing(field, spacing);
                true
            }
            None => {
                warn!("Unknown field '{}', spacing unchanged", field);
                false
            }
        }
    }
}

pub struct FieldFonts {
    name: ResolvedFont,
    identification: ResolvedFont,
}

impl FieldFonts {
    pub fn field(&self, field: Field) -> Result<&LoadedFont> {
        match field {
            Field::Name => self.name.get(),
            Field::Identification => self.identification.get(),
        }
    }
}
