//! JPEG, PNG and WebP decoding through the `image` crate.

use std::io::Cursor;

use exif::{In, Reader, Tag};
use image::DynamicImage;

use super::{DecodeError, DecodedImage, Orientation};
use crate::source::ImageFormat;

/// Decode `bytes` into an upright RGB bitmap.
///
/// The decoder is picked from the magic bytes; `declared` is only used when
/// they are not recognised. EXIF orientation, when present, is applied
/// so the re-encoded JPEG (which carries no EXIF) still displays upright.
///
/// # Errors
///
/// - `Empty` for a zero-length buffer
/// - `InvalidFormat` when no decoder matches, including HEIC content that
///   was not converted first
/// - `CorruptedFile` when the chosen decoder fails
/// - `ZeroSized` when the image has no pixels
pub fn decode_image(bytes: &[u8], declared: Option<ImageFormat>) -> Result<DecodedImage, DecodeError> {
    if bytes.is_empty() {
        return Err(DecodeError::Empty);
    }

    let orientation = read_orientation(bytes);
    let bitmap = orientation.correct(read_pixels(bytes, declared)?).into_rgb8();
    match bitmap.dimensions() {
        (0, _) | (_, 0) => Err(DecodeError::ZeroSized {
            width: bitmap.width(),
            height: bitmap.height(),
        }),
        _ => Ok(DecodedImage::from_rgb8(bitmap)),
    }
}

fn read_pixels(bytes: &[u8], declared: Option<ImageFormat>) -> Result<DynamicImage, DecodeError> {
    let format = ImageFormat::sniff(bytes)
        .or(declared)
        .and_then(ImageFormat::to_image_format)
        .ok_or(DecodeError::InvalidFormat)?;

    image::load_from_memory_with_format(bytes, format)
        .map_err(|e| DecodeError::CorruptedFile(e.to_string()))
}

/// EXIF orientation of the primary image; `Upright` when there is no EXIF
/// block or no orientation tag.
pub fn read_orientation(bytes: &[u8]) -> Orientation {
    Reader::new()
        .read_from_container(&mut Cursor::new(bytes))
        .ok()
        .and_then(|exif| {
            exif.get_field(Tag::Orientation, In::PRIMARY)
                .and_then(|field| field.value.get_uint(0))
        })
        .map(Orientation::from_exif)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encode::encode_jpeg;

    /// Left half red, right half blue.
    fn split_bitmap(width: u32, height: u32) -> image::RgbImage {
        image::RgbImage::from_fn(width, height, |x, _| {
            if x < width / 2 {
                image::Rgb([230, 20, 20])
            } else {
                image::Rgb([20, 20, 230])
            }
        })
    }

    fn jpeg(width: u32, height: u32) -> Vec<u8> {
        let bitmap = split_bitmap(width, height);
        encode_jpeg(bitmap.as_raw(), width, height, 95).unwrap()
    }

    fn png(width: u32, height: u32) -> Vec<u8> {
        let mut out = Cursor::new(Vec::new());
        DynamicImage::ImageRgb8(split_bitmap(width, height))
            .write_to(&mut out, image::ImageFormat::Png)
            .unwrap();
        out.into_inner()
    }

    /// Splice a big-endian EXIF APP1 segment carrying only the orientation
    /// tag right after the JPEG SOI marker.
    fn with_orientation(jpeg: &[u8], orientation: u16) -> Vec<u8> {
        let mut tiff = vec![b'M', b'M', 0x00, 0x2A, 0x00, 0x00, 0x00, 0x08];
        tiff.extend_from_slice(&[0x00, 0x01]); // one IFD entry
        tiff.extend_from_slice(&[0x01, 0x12, 0x00, 0x03, 0x00, 0x00, 0x00, 0x01]);
        tiff.extend_from_slice(&orientation.to_be_bytes());
        tiff.extend_from_slice(&[0x00, 0x00, 0x00, 0x00, 0x00, 0x00]);

        let mut payload = b"Exif\0\0".to_vec();
        payload.extend_from_slice(&tiff);
        let segment_len = (payload.len() + 2) as u16;

        let mut out = jpeg[0..2].to_vec();
        out.extend_from_slice(&[0xFF, 0xE1]);
        out.extend_from_slice(&segment_len.to_be_bytes());
        out.extend_from_slice(&payload);
        out.extend_from_slice(&jpeg[2..]);
        out
    }

    #[test]
    fn test_decode_jpeg() {
        let img = decode_image(&jpeg(16, 8), Some(ImageFormat::Jpeg)).unwrap();
        assert_eq!(img.dimensions(), (16, 8));
        assert_eq!(img.pixels.len(), 16 * 8 * 3);
    }

    #[test]
    fn test_content_wins_over_declared_type() {
        let img = decode_image(&png(4, 3), Some(ImageFormat::Jpeg)).unwrap();
        assert_eq!(img.dimensions(), (4, 3));
        assert_eq!(&img.pixels[0..3], &[230, 20, 20]);
    }

    #[test]
    fn test_unrecognised_bytes() {
        assert_eq!(decode_image(&[0x00, 0x01, 0x02, 0x03], None), Err(DecodeError::InvalidFormat));
    }

    #[test]
    fn test_unconverted_heic_is_invalid_format() {
        let heic = b"\x00\x00\x00\x18ftypheic\x00\x00\x00\x00mif1heic";
        assert_eq!(decode_image(heic, Some(ImageFormat::Jpeg)), Err(DecodeError::InvalidFormat));
    }

    #[test]
    fn test_declared_format_used_when_unrecognised() {
        let result = decode_image(b"not an image", Some(ImageFormat::Png));
        assert!(matches!(result, Err(DecodeError::CorruptedFile(_))), "{:?}", result);
    }

    #[test]
    fn test_empty_bytes() {
        assert_eq!(decode_image(&[], Some(ImageFormat::Png)), Err(DecodeError::Empty));
    }

    #[test]
    fn test_truncated_jpeg() {
        let jpeg = jpeg(16, 16);
        let result = decode_image(&jpeg[0..40], Some(ImageFormat::Jpeg));
        assert!(matches!(result, Err(DecodeError::CorruptedFile(_))), "{:?}", result);
    }

    #[test]
    fn test_no_exif_is_upright() {
        assert_eq!(read_orientation(&jpeg(4, 4)), Orientation::Upright);
        assert_eq!(read_orientation(&png(4, 4)), Orientation::Upright);
        assert_eq!(read_orientation(&[0x00, 0x01]), Orientation::Upright);
    }

    #[test]
    fn test_exif_orientation_is_applied() {
        let rotated = with_orientation(&jpeg(16, 8), 6);
        assert_eq!(read_orientation(&rotated), Orientation::TurnedRight);

        let img = decode_image(&rotated, Some(ImageFormat::Jpeg)).unwrap();
        assert_eq!(img.dimensions(), (8, 16));
    }
}
