use ab_glyph::InvalidFont;
use image::ImageError;
use thiserror::Error;

use std::error::Error;
use std::fmt;
use std::io::Error as IOError;

#[derive(Debug)]
pub struct LprError(LprErrorKind);

#[derive(Debug, Error)]
pub enum LprErrorKind {
    #[error(transparent)]
    IOError(#[from] IOError),
    #[error(transparent)]
    ImageError(#[from] ImageError),
    #[error("invalid config: {0}")]
    ConfigError(#[from] toml::de::Error),
    #[error(transparent)]
    FontError(#[from] InvalidFont),
    /// The source image has no pixels.
    #[error("input image is empty")]
    EmptyInput,
    /// A candidate box collapsed or its vertices are collinear.
    #[error("degenerate geometry: {0}")]
    DegenerateGeometry(String),
    /// `recognize()` was called before any image was set.
    #[error("no image set on the recognizer")]
    NoImage,
    #[error("text recognition failed: {0}")]
    Recognition(String),
}

impl LprError {
    pub fn kind(&self) -> &LprErrorKind {
        &self.0
    }

    pub(crate) fn degenerate(msg: impl Into<String>) -> Self {
        Self(LprErrorKind::DegenerateGeometry(msg.into()))
    }

    pub(crate) fn recognition(msg: impl Into<String>) -> Self {
        Self(LprErrorKind::Recognition(msg.into()))
    }

    /// Errors that only affect one plate candidate and never fail a whole detection.
    pub fn is_per_candidate(&self) -> bool {
        matches!(
            self.kind(),
            LprErrorKind::DegenerateGeometry(_) | LprErrorKind::Recognition(_) | LprErrorKind::NoImage
        )
    }
}

impl<T> From<T> for LprError
where T: Into<LprErrorKind>
{
    fn from(e: T) -> Self {
        Self(e.into())
    }
}

impl fmt::Display for LprError {

    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self.kind(), f)
    }
}

impl Error for LprError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.kind().source()
    }
}
