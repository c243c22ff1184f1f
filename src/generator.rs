use chrono::Local;
use image::{ImageFormat, RgbImage};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{error, info, info_span};

use crate::error::Result;
use crate::pdf;
use crate::render::{render, RenderRequest};
use crate::roster::{Row, RowSource};
use crate::state::{FieldFonts, RunContext};
use crate::storage::{certificate_stem, intermediate_raster, UniqueStems};
use crate::style::Field;

/// Decoded template image. Never drawn on directly; each certificate gets its own copy.
pub struct Template {
    image: RgbImage,
}

impl Template {
    pub fn open(path: &Path) -> Result<Self> {
        let image = image::open(path)?.to_rgb8();
        info!("Template {} loaded ({}x{})", path.display(), image.width(), image.height());
        Ok(Self { image })
    }

    pub fn fresh(&self) -> RgbImage {
        self.image.clone()
    }
}

#[derive(Debug, Default, Serialize)]
pub struct RunSummary {
    pub attempted: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub outputs: Vec<PathBuf>,
}

/// Renders both fields of `row` onto a fresh template copy and packages it
/// as `<stem>.pdf` in the output folder.
pub fn generate_certificate(
    ctx: &RunContext,
    fonts: &FieldFonts,
    template: &Template,
    row: &Row,
    stem: &str,
) -> Result<PathBuf> {
    let mut surface = template.fresh();
    let surface_width = surface.width();

    for (field, text) in [
        (Field::Name, row.name.as_str()),
        (Field::Identification, row.identification.as_str()),
    ] {
        let field_style = ctx.layout.field(field);
        let request = RenderRequest {
            text,
            style: &field_style.style,
            surface_width,
            centered: field_style.centered,
        };
        render(&mut surface, &request, fonts.field(field)?)?;
    }

    let output_folder = &ctx.config.output_folder;
    let raster = intermediate_raster(output_folder)?;
    surface.save_with_format(raster.path(), ImageFormat::Png)?;
    let rendered = image::open(raster.path())?.to_rgb8();

    let pdf_path = output_folder.join(format!("{}.pdf", stem));
    pdf::package(&rendered, &pdf_path)?;

    info!("Certificate generated for {} - {}", row.name, row.identification);
    Ok(pdf_path)
}

/// Generates one certificate per row. A failing row is logged and counted,
/// never fatal; an unreadable roster or template aborts the run.
pub fn generate_all(ctx: &RunContext, source: &dyn RowSource) -> Result<RunSummary> {
    let _run = ctx.span.enter();

    let rows = source
        .rows()
        .inspect_err(|e| error!("Failed to load roster: {}", e))?;
    let template = Template::open(&ctx.config.template_path)
        .inspect_err(|e| error!("Failed to load template {}: {}", ctx.config.template_path.display(), e))?;
    let fonts = ctx.resolve_fonts();
    let date = Local::now().date_naive();

    info!("Starting generation of {} certificates", rows.len());
    let mut summary = RunSummary::default();
    let mut stems = UniqueStems::default();
    for row in &rows {
        summary.attempted += 1;
        let _row = info_span!("certificate", id = %row.identification).entered();
        let stem = stems.available(&certificate_stem(date, &row.name));
        match generate_certificate(ctx, &fonts, &template, row, &stem) {
            Ok(path) => {
                stems.claim(stem);
                summary.succeeded += 1;
                summary.outputs.push(path);
            }
            Err(e) => {
                summary.failed += 1;
                error!("Error in certificate {}: {}", row.identification, e);
            }
        }
    }

    info!(
        "Finished: {} attempted, {} generated, {} errors",
        summary.attempted, summary.succeeded, summary.failed
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::error::CertError;
    use crate::render::measure;
    use crate::roster::ExcelRoster;
    use image::Rgb;
    use lopdf::Document;
    use tempfile::TempDir;

    struct Workspace {
        dir: TempDir,
        ctx: RunContext,
    }

    fn workspace(builtin_fallback: bool) -> Workspace {
        let dir = TempDir::new().unwrap();
        let root = dir.path().to_path_buf();
        let template = root.join("plantilla.png");
        RgbImage::from_pixel(1000, 400, Rgb([255, 255, 255]))
            .save(&template)
            .unwrap();

        let config = Config::from_lookup(|key| {
            let value = match key {
                "TEMPLATE_PATH" => template.clone(),
                "OUTPUT_FOLDER" => root.join("out"),
                "FONTS_FOLDER" => root.join("fonts"),
                "BUILTIN_FONT_FALLBACK" => return Some(builtin_fallback.to_string()),
                _ => return None,
            };
            Some(value.display().to_string())
        })
        .unwrap();
        std::fs::create_dir_all(&config.output_folder).unwrap();

        let mut ctx = RunContext::new(config).unwrap();
        ctx.fonts.system_fallbacks.clear();
        Workspace { dir, ctx }
    }

    fn output_files(ctx: &RunContext) -> Vec<PathBuf> {
        let mut files: Vec<PathBuf> = std::fs::read_dir(&ctx.config.output_folder)
            .unwrap()
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .collect();
        files.sort();
        files
    }

    fn page_size(path: &Path) -> (i64, i64) {
        let doc = Document::load(path).unwrap();
        let page_id = *doc.get_pages().values().next().unwrap();
        let media_box = doc
            .get_object(page_id)
            .unwrap()
            .as_dict()
            .unwrap()
            .get(b"MediaBox")
            .unwrap()
            .as_array()
            .unwrap()
            .clone();
        (media_box[2].as_i64().unwrap(), media_box[3].as_i64().unwrap())
    }

    #[test]
    fn test_single_row_produces_one_document() {
        let ws = workspace(true);
        let rows = vec![Row::new("Ana Ruiz", "123")];
        let summary = generate_all(&ws.ctx, &rows).unwrap();

        assert_eq!(summary.attempted, 1);
        assert_eq!(summary.succeeded, 1);
        assert_eq!(summary.failed, 0);

        let files = output_files(&ws.ctx);
        assert_eq!(files, summary.outputs);
        let name = files[0].file_name().unwrap().to_str().unwrap();
        assert!(name.ends_with(" ANA RUIZ.pdf"), "{name}");
        assert_eq!(page_size(&files[0]), (1000, 400));
    }

    #[test]
    fn test_failing_row_does_not_stop_batch() {
        let ws = workspace(true);
        let rows = vec![
            Row::new("Ana Ruiz", "123"),
            Row::new("Łucja Żak", "456"),
            Row::new("Luis Gil", "789"),
        ];
        let summary = generate_all(&ws.ctx, &rows).unwrap();

        assert_eq!(summary.attempted, 3);
        assert_eq!(summary.succeeded, 2);
        assert_eq!(summary.failed, 1);

        let files = output_files(&ws.ctx);
        assert_eq!(files.len(), 2);
        for file in &files {
            let name = file.file_name().unwrap().to_str().unwrap();
            assert!(name.ends_with(" ANA RUIZ.pdf") || name.ends_with(" LUIS GIL.pdf"), "{name}");
            assert_eq!(page_size(file), (1000, 400));
        }
    }

    #[test]
    fn test_same_name_rows_keep_separate_documents() {
        let ws = workspace(true);
        let rows = vec![
            Row::new("Ana Ruiz", "123"),
            Row::new("Ana Ruiz", "456"),
            Row::new("ana ruiz", "789"),
        ];
        let summary = generate_all(&ws.ctx, &rows).unwrap();

        assert_eq!(summary.succeeded, 3);
        let files = output_files(&ws.ctx);
        assert_eq!(files.len(), 3);
        let mut outputs = summary.outputs.clone();
        outputs.sort();
        assert_eq!(files, outputs);

        let names: Vec<&str> = summary
            .outputs
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap())
            .collect();
        assert!(names[0].ends_with(" ANA RUIZ.pdf"), "{names:?}");
        assert!(names[1].ends_with(" ANA RUIZ (2).pdf"), "{names:?}");
        assert!(names[2].ends_with(" ANA RUIZ (3).pdf"), "{names:?}");
    }

    #[test]
    fn test_failed_row_does_not_take_a_name() {
        let ws = workspace(true);
        let rows = vec![Row::new("Ana Ruiz", "Ł-1"), Row::new("Ana Ruiz", "456")];
        let summary = generate_all(&ws.ctx, &rows).unwrap();

        assert_eq!(summary.failed, 1);
        assert_eq!(summary.succeeded, 1);
        let name = summary.outputs[0].file_name().unwrap().to_str().unwrap();
        assert!(name.ends_with(" ANA RUIZ.pdf"), "{name}");
    }

    #[test]
    fn test_no_font_at_all_fails_every_row() {
        let ws = workspace(false);
        let rows = vec![Row::new("Ana Ruiz", "123"), Row::new("Luis Gil", "789")];
        let summary = generate_all(&ws.ctx, &rows).unwrap();

        assert_eq!(summary.succeeded, 0);
        assert_eq!(summary.failed, 2);
        assert!(output_files(&ws.ctx).is_empty());
    }

    #[test]
    fn test_unreadable_template_is_fatal() {
        let ws = workspace(true);
        std::fs::remove_file(&ws.ctx.config.template_path).unwrap();
        let rows = vec![Row::new("Ana Ruiz", "123")];
        assert!(matches!(generate_all(&ws.ctx, &rows), Err(CertError::Image(_))));
    }

    #[test]
    fn test_unreadable_roster_is_fatal() {
        let ws = workspace(true);
        let roster = ExcelRoster::new(ws.dir.path().join("estudiantes.xlsx"), "nombre_completo", "identificacion");
        assert!(generate_all(&ws.ctx, &roster).is_err());
        assert!(output_files(&ws.ctx).is_empty());
    }

    #[test]
    fn test_template_is_not_mutated() {
        let ws = workspace(true);
        let template = Template::open(&ws.ctx.config.template_path).unwrap();
        let fonts = ws.ctx.resolve_fonts();
        let path = generate_certificate(&ws.ctx, &fonts, &template, &Row::new("Ana", "1"), "20261017 ANA").unwrap();

        assert!(path.ends_with("20261017 ANA.pdf"));
        let copy = template.fresh();
        assert_eq!(copy.dimensions(), (1000, 400));
        assert!(copy.pixels().all(|p| *p == Rgb([255, 255, 255])));
    }

    #[test]
    fn test_spacing_change_applies_to_later_renders() {
        let mut ws = workspace(true);
        let width = |ctx: &RunContext| {
            let fonts = ctx.resolve_fonts();
            let font = fonts.field(Field::Name).unwrap();
            measure(font, "Ana Ruiz", ctx.layout.name.style.spacing).unwrap()
        };
        let before = width(&ws.ctx);
        ws.ctx.set_spacing(Field::Name, 2);
        let after = width(&ws.ctx);
        assert_eq!(after - before, 5 * 7);
    }
}
