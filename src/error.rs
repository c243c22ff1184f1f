use thiserror::Error;

#[derive(Error, Debug)]
pub enum CertError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("PDF error: {0}")]
    Pdf(String),

    #[error("Roster error: {0}")]
    Roster(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("No usable font for '{0}'")]
    FontUnavailable(String),

    #[error("Glyph {0:?} is not available in font '{1}'")]
    GlyphUnavailable(char, String),

    #[error("Field is not centered and has no fixed x position")]
    MissingFixedX,

    #[error("Invalid color '{0}', expected #RRGGBB")]
    InvalidColor(String),
}

pub type Result<T> = std::result::Result<T, CertError>;

impl From<lopdf::Error> for CertError {
    fn from(e: lopdf::Error) -> Self {
        CertError::Pdf(e.to_string())
    }
}

impl From<calamine::Error> for CertError {
    fn from(e: calamine::Error) -> Self {
        CertError::Roster(e.to_string())
    }
}
