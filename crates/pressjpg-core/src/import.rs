//! Image URL validation for the paste-a-link import path.
//!
//! Fetching happens in the presentation layer. Once the bytes are in hand,
//! [`ImageUrl::into_source`] turns them into a [`SourceImage`] that is treated
//! exactly like a dropped file.

use std::sync::LazyLock;

use regex::{Regex, RegexBuilder};

use crate::source::{ImageFormat, SourceImage, ValidationError};

static IMAGE_URL: LazyLock<Regex> = LazyLock::new(|| {
    RegexBuilder::new(r"^https?://.+\.(jpg|jpeg|png|webp|heic)$")
        .case_insensitive(true)
        .build()
        .expect("image URL pattern compiles")
});

/// A URL that points at a supported image, by extension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageUrl {
    url: String,
    extension: String,
    format: ImageFormat,
}

impl ImageUrl {
    /// Validate a user supplied URL.
    ///
    /// The URL must use `http` or `https`, have at least one character after
    /// the scheme, and end in `.jpg`, `.jpeg`, `.png`, `.webp` or `.heic`
    /// (case-insensitive). The input is matched as given: surrounding
    /// whitespace and line breaks are rejected, and query strings and
    /// fragments are not stripped, so `photo.jpg?w=100` is rejected.
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        let invalid = || ValidationError::InvalidUrl(input.to_string());

        let captures = IMAGE_URL.captures(input).ok_or_else(invalid)?;
        let extension = captures
            .get(1)
            .map(|m| m.as_str().to_ascii_lowercase())
            .ok_or_else(invalid)?;
        let format = ImageFormat::from_extension(&extension).ok_or_else(invalid)?;

        Ok(Self {
            url: input.to_string(),
            extension,
            format,
        })
    }

    /// The URL as given.
    pub fn as_str(&self) -> &str {
        &self.url
    }

    /// Format inferred from the extension.
    pub fn format(&self) -> ImageFormat {
        self.format
    }

    /// MIME type inferred from the extension.
    pub fn mime_type(&self) -> &'static str {
        self.format.mime_type()
    }

    /// Display name given to fetched images: `image.{ext}`.
    pub fn file_name(&self) -> String {
        format!("image.{}", self.extension)
    }

    /// Wrap fetched bytes as a source image.
    pub fn into_source(self, bytes: impl Into<std::sync::Arc<[u8]>>) -> SourceImage {
        SourceImage::new(self.file_name(), self.mime_type(), bytes)
    }
}

impl std::str::FromStr for ImageUrl {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
