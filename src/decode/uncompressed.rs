use super::convert::{f32_to_n8, unorm_to_n8};
use crate::{ChannelKind, Encoding, PixelFormatDescriptor};

/// Reads up to 16 bytes as a little-endian integer.
#[inline(always)]
fn read_word(bytes: &[u8]) -> u128 {
    debug_assert!(bytes.len() <= 16);
    let mut buffer = [0_u8; 16];
    buffer[..bytes.len()].copy_from_slice(bytes);
    u128::from_le_bytes(buffer)
}

#[inline(always)]
fn channel_mask(bits: u8) -> u128 {
    (1_u128 << bits) - 1
}

#[inline(always)]
fn store(rgba: &mut [u8; 4], kind: ChannelKind, value: u8) {
    match kind {
        ChannelKind::Red => rgba[0] = value,
        ChannelKind::Green => rgba[1] = value,
        ChannelKind::Blue => rgba[2] = value,
        ChannelKind::Alpha => rgba[3] = value,
        ChannelKind::Luminance => {
            rgba[0] = value;
            rgba[1] = value;
            rgba[2] = value;
        }
        ChannelKind::Index | ChannelKind::Depth | ChannelKind::Unused => {}
    }
}

/// Decodes one pixel of a format with one bit field per channel.
///
/// Channels missing from the format are 0, except alpha, which is 255.
fn decode_pixel(format: &PixelFormatDescriptor, pixel: &[u8]) -> [u8; 4] {
    let word = read_word(pixel);
    let float = format.encoding == Encoding::Float;

    let mut rgba = [0, 0, 0, u8::MAX];
    let mut shift = 0;
    for channel in format.channels {
        let x = (word >> shift) & channel_mask(channel.bits);
        shift += channel.bits as u32;

        let value = if float {
            match channel.bits {
                16 => f32_to_n8(half::f16::from_bits(x as u16).to_f32()),
                _ => f32_to_n8(f32::from_bits(x as u32)),
            }
        } else {
            unorm_to_n8(x as u64, channel.bits)
        };
        store(&mut rgba, channel.kind, value);
    }

    if format.encoding == Encoding::BlueScreen && rgba == [0, 0, u8::MAX, u8::MAX] {
        rgba = [0; 4];
    }
    rgba
}

/// Decodes the pixels of an uncompressed format into RGBA8888.
///
/// `data` and `output` must hold the same number of pixels.
pub(crate) fn decode_uncompressed(format: &PixelFormatDescriptor, data: &[u8], output: &mut [u8]) {
    let bytes_per_pixel = format.bytes_per_block() as usize;
    debug_assert!(!format.is_compressed());
    debug_assert_eq!(data.len() / bytes_per_pixel, output.len() / 4);

    for (pixel, out) in data
        .chunks_exact(bytes_per_pixel)
        .zip(output.chunks_exact_mut(4))
    {
        out.copy_from_slice(&decode_pixel(format, pixel));
    }
}
