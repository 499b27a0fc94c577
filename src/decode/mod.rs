use crate::error::try_alloc;
use crate::{FormatError, ImageFormat, Size, Surface, VtfError};

pub(crate) mod bc;
pub(crate) mod convert;
mod uncompressed;

/// Verifies that a buffer of the given format is exactly as long as a
/// surface of the given size requires.
pub(crate) fn check_buffer_len(
    format: ImageFormat,
    size: Size,
    actual: usize,
) -> Result<(), FormatError> {
    let expected = format
        .pixel_info()
        .surface_bytes(size)
        .and_then(|len| usize::try_from(len).ok())
        .unwrap_or(usize::MAX);
    if expected != actual {
        return Err(FormatError::BufferSizeMismatch { expected, actual });
    }
    Ok(())
}

/// Fails with [`FormatError::UnsupportedFormat`] for formats without a
/// converter.
pub(crate) fn check_convertible(format: ImageFormat) -> Result<(), FormatError> {
    if format.is_convertible() {
        Ok(())
    } else {
        Err(FormatError::UnsupportedFormat(format))
    }
}

/// Decodes a surface of the given format into RGBA8888.
///
/// `data` must be exactly as long as the format requires for the size of the
/// surface.
pub(crate) fn decode_surface(
    data: &[u8],
    format: ImageFormat,
    size: Size,
) -> Result<Surface, VtfError> {
    check_convertible(format)?;
    check_buffer_len(format, size, data.len())?;

    let len = size.rgba_bytes().ok_or(VtfError::OutOfMemory(usize::MAX))?;
    let mut output = try_alloc(len)?;
    if len == 0 {
        return Ok(Surface::from_parts(size, output));
    }

    let descriptor = format.descriptor();
    if descriptor.is_compressed() {
        bc::decode_bc(descriptor, data, size.width, size.height, &mut output);
    } else {
        uncompressed::decode_uncompressed(descriptor, data, &mut output);
    }
    Ok(Surface::from_parts(size, output))
}

/// Decodes the pixels of a `width` x `height` surface of the given format
/// into an RGBA8888 buffer.
///
/// The returned buffer is row-major, starts at the top-left pixel, and uses
/// straight alpha. Formats without alpha decode with an alpha of 255.
///
/// ## Errors
///
/// - [`FormatError::UnsupportedFormat`] for palette and depth formats.
/// - [`FormatError::BufferSizeMismatch`] if `data` is not exactly
///   as long as the format requires.
/// - [`VtfError::OutOfMemory`] if the output cannot be allocated.
pub fn decode_to_rgba(
    data: &[u8],
    format: ImageFormat,
    width: u32,
    height: u32,
) -> Result<Vec<u8>, VtfError> {
    decode_surface(data, format, Size::new(width, height)).map(Surface::into_data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;

    #[test]
    fn length_is_checked() {
        let error = decode_to_rgba(&[0; 15], ImageFormat::RGBA8888, 2, 2).unwrap_err();
        assert_eq!(error.kind(), ErrorKind::BufferSizeMismatch);
        // a 5x5 DXT1 surface needs 2x2 blocks
        assert!(decode_to_rgba(&[0; 32], ImageFormat::DXT1, 5, 5).is_ok());
        assert!(decode_to_rgba(&[0; 8], ImageFormat::DXT1, 5, 5).is_err());
    }

    #[test]
    fn unconvertible_formats() {
        for format in [ImageFormat::P8, ImageFormat::NV_INTZ, ImageFormat::ATI_DST16] {
            let len = format.pixel_info().surface_bytes(Size::new(4, 4)).unwrap() as usize;
            let error = decode_to_rgba(&vec![0; len], format, 4, 4).unwrap_err();
            assert_eq!(error.kind(), ErrorKind::UnsupportedFormat);
        }
    }

    #[test]
    fn partial_blocks_are_cropped() {
        // 2x2 DXT1 red block
        let rgba = decode_to_rgba(&[0x00, 0xF8, 0x00, 0xF8, 0, 0, 0, 0], ImageFormat::DXT1, 2, 2)
            .unwrap();
        assert_eq!(rgba, [255, 0, 0, 255].repeat(4));

        // 5x1 DXT1 surface with a green second block
        let data = [0x00, 0xF8, 0x00, 0xF8, 0, 0, 0, 0, 0xE0, 0x07, 0xE0, 0x07, 0, 0, 0, 0];
        let rgba = decode_to_rgba(&data, ImageFormat::DXT1, 5, 1).unwrap();
        assert_eq!(&rgba[12..16], &[255, 0, 0, 255]);
        assert_eq!(&rgba[16..20], &[0, 255, 0, 255]);
    }

    #[test]
    fn empty_surfaces() {
        assert!(decode_to_rgba(&[], ImageFormat::RGBA8888, 0, 4)
            .unwrap()
            .is_empty());
    }
}
