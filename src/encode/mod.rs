use crate::decode::{check_buffer_len, check_convertible};
use crate::error::try_alloc;
use crate::{ImageFormat, Size, VtfError};

mod bc;
mod bc1;
mod bc4;
mod encoder;
mod uncompressed;

pub(crate) use encoder::write_vtf;
pub use encoder::{EncodeOptions, LOW_RES_FORMAT};

/// Encodes an RGBA8888 surface into the given format.
///
/// The output is exactly as long as the format requires for the size of the
/// surface.
pub(crate) fn encode_surface(
    rgba: &[u8],
    format: ImageFormat,
    size: Size,
) -> Result<Vec<u8>, VtfError> {
    check_convertible(format)?;
    check_buffer_len(ImageFormat::RGBA8888, size, rgba.len())?;

    let len = format
        .pixel_info()
        .surface_bytes(size)
        .and_then(|len| usize::try_from(len).ok())
        .ok_or(VtfError::OutOfMemory(usize::MAX))?;
    let mut output = try_alloc(len)?;
    if len == 0 || rgba.is_empty() {
        return Ok(output);
    }

    let descriptor = format.descriptor();
    if descriptor.is_compressed() {
        bc::encode_bc(descriptor, rgba, size.width, size.height, &mut output);
    } else {
        uncompressed::encode_uncompressed(descriptor, rgba, &mut output);
    }
    Ok(output)
}

/// Encodes a `width` x `height` RGBA8888 buffer into the given format.
///
/// The buffer is row-major, starts at the top-left pixel, and uses straight
/// alpha. Block-compressed formats pad partial blocks by repeating the edge
/// pixels.
///
/// ## Errors
///
/// - [`FormatError::UnsupportedFormat`](crate::FormatError::UnsupportedFormat)
///   for palette and depth formats.
/// - [`FormatError::BufferSizeMismatch`](crate::FormatError::BufferSizeMismatch)
///   if `rgba` is not exactly `width * height * 4` bytes long.
/// - [`VtfError::OutOfMemory`] if the output cannot be allocated.
pub fn encode_from_rgba(
    rgba: &[u8],
    format: ImageFormat,
    width: u32,
    height: u32,
) -> Result<Vec<u8>, VtfError> {
    encode_surface(rgba, format, Size::new(width, height))
}
