use chrono::NaiveDate;
use regex::Regex;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tempfile::NamedTempFile;
use tracing::info;

static UNSAFE_CHARS: OnceLock<Regex> = OnceLock::new();

/// File stem for a certificate: `YYYYMMDD NAME IN CAPITALS`.
pub fn certificate_stem(date: NaiveDate, name: &str) -> String {
    let unsafe_chars = UNSAFE_CHARS.get_or_init(|| Regex::new(r#"[/\\:*?"<>|\x00-\x1f]"#).unwrap());
    let upper = name.trim().to_uppercase();
    format!("{} {}", date.format("%Y%m%d"), unsafe_chars.replace_all(&upper, "_"))
}

/// Stems already given to documents of one run. Repeated names get
/// ` (2)`, ` (3)`, ... so no document replaces another.
#[derive(Debug, Default)]
pub struct UniqueStems {
    used: HashSet<String>,
}

impl UniqueStems {
    /// First free variant of `stem`; nothing is reserved until [`claim`](Self::claim).
    pub fn available(&self, stem: &str) -> String {
        let mut candidate = stem.to_string();
        let mut n = 1;
        while self.used.contains(&candidate) {
            n += 1;
            candidate = format!("{} ({})", stem, n);
        }
        candidate
    }

    pub fn claim(&mut self, stem: String) {
        self.used.insert(stem);
    }
}

pub fn ensure_dirs(dirs: &[PathBuf]) -> std::io::Result<()> {
    for dir in dirs {
        if !dir.exists() {
            std::fs::create_dir_all(dir)?;
            info!("Created folder: {}", dir.display());
        }
    }
    Ok(())
}

/// Scratch PNG for one certificate. Removed when dropped.
pub fn intermediate_raster(output_folder: &Path) -> std::io::Result<NamedTempFile> {
    tempfile::Builder::new()
        .prefix(".raster-")
        .suffix(".png")
        .tempfile_in(output_folder)
}
