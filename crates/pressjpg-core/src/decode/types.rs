//! Bitmap, orientation and error types shared by the decode path.

use image::DynamicImage;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Why an input could not be turned into a bitmap.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// Neither the content nor the declared type matched a decoder.
    #[error("Invalid or unsupported image format")]
    InvalidFormat,

    #[error("Image data is empty")]
    Empty,

    /// A decoder was found but rejected the data.
    #[error("Corrupted or incomplete image file: {0}")]
    CorruptedFile(String),

    #[error("Image has no pixels ({width}x{height})")]
    ZeroSized { width: u32, height: u32 },
}

/// How stored pixels must be turned to display upright, per the EXIF
/// orientation tag (values 1-8).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum Orientation {
    #[default]
    Upright = 1,
    Mirrored = 2,
    UpsideDown = 3,
    MirroredUpsideDown = 4,
    MirroredTurnedLeft = 5,
    TurnedRight = 6,
    MirroredTurnedRight = 7,
    TurnedLeft = 8,
}

impl Orientation {
    /// Map an EXIF tag value; anything outside 1-8 is treated as upright.
    pub fn from_exif(value: u32) -> Self {
        match value {
            2 => Orientation::Mirrored,
            3 => Orientation::UpsideDown,
            4 => Orientation::MirroredUpsideDown,
            5 => Orientation::MirroredTurnedLeft,
            6 => Orientation::TurnedRight,
            7 => Orientation::MirroredTurnedRight,
            8 => Orientation::TurnedLeft,
            _ => Orientation::Upright,
        }
    }

    /// True when correcting swaps width and height.
    pub fn swaps_dimensions(self) -> bool {
        matches!(
            self,
            Orientation::MirroredTurnedLeft
                | Orientation::TurnedRight
                | Orientation::MirroredTurnedRight
                | Orientation::TurnedLeft
        )
    }

    /// Turn `image` so it displays upright.
    pub(crate) fn correct(self, image: DynamicImage) -> DynamicImage {
        match self {
            Orientation::Upright => image,
            Orientation::Mirrored => image.fliph(),
            Orientation::UpsideDown => image.rotate180(),
            Orientation::MirroredUpsideDown => image.flipv(),
            Orientation::MirroredTurnedLeft => image.rotate90().fliph(),
            Orientation::TurnedRight => image.rotate90(),
            Orientation::MirroredTurnedRight => image.rotate270().fliph(),
            Orientation::TurnedLeft => image.rotate270(),
        }
    }
}

/// An upright RGB bitmap, 3 bytes per pixel in row-major order.
///
/// Decoded once per compression run and re-encoded at every quality step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedImage {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl DecodedImage {
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> Self {
        debug_assert_eq!(
            pixels.len(),
            (width as usize) * (height as usize) * 3,
            "RGB buffer does not match {}x{}",
            width,
            height
        );
        Self {
            width,
            height,
            pixels,
        }
    }

    pub fn from_rgb8(bitmap: image::RgbImage) -> Self {
        let (width, height) = bitmap.dimensions();
        Self {
            width,
            height,
            pixels: bitmap.into_raw(),
        }
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}
