use crate::decode::convert::{luma, n8_to_f32, n8_to_unorm};
use crate::{ChannelKind, Encoding, PixelFormatDescriptor};

#[inline(always)]
fn channel_value(rgba: [u8; 4], kind: ChannelKind) -> u8 {
    match kind {
        ChannelKind::Red => rgba[0],
        ChannelKind::Green => rgba[1],
        ChannelKind::Blue => rgba[2],
        ChannelKind::Alpha => rgba[3],
        ChannelKind::Luminance => luma(rgba),
        ChannelKind::Index | ChannelKind::Depth | ChannelKind::Unused => 0,
    }
}

/// Packs one RGBA8888 pixel into the little-endian word of a format.
fn encode_pixel(format: &PixelFormatDescriptor, mut rgba: [u8; 4]) -> u128 {
    if format.encoding == Encoding::BlueScreen && rgba[3] < 128 {
        rgba = [0, 0, u8::MAX, u8::MAX];
    }
    let float = format.encoding == Encoding::Float;

    let mut word: u128 = 0;
    let mut shift = 0;
    for channel in format.channels {
        let value = channel_value(rgba, channel.kind);
        let x: u128 = if channel.kind == ChannelKind::Unused {
            0
        } else if float {
            match channel.bits {
                16 => half::f16::from_f32(n8_to_f32(value)).to_bits() as u128,
                _ => n8_to_f32(value).to_bits() as u128,
            }
        } else {
            n8_to_unorm(value, channel.bits) as u128
        };
        word |= x << shift;
        shift += channel.bits as u32;
    }
    word
}

/// Encodes RGBA8888 pixels into an uncompressed format.
///
/// `output` must hold exactly as many pixels as `rgba`.
pub(crate) fn encode_uncompressed(format: &PixelFormatDescriptor, rgba: &[u8], output: &mut [u8]) {
    let bytes_per_pixel = format.bytes_per_block() as usize;
    debug_assert!(!format.is_compressed());
    debug_assert_eq!(rgba.len() / 4, output.len() / bytes_per_pixel);

    for (pixel, out) in rgba
        .chunks_exact(4)
        .zip(output.chunks_exact_mut(bytes_per_pixel))
    {
        let word = encode_pixel(format, [pixel[0], pixel[1], pixel[2], pixel[3]]);
        out.copy_from_slice(&word.to_le_bytes()[..bytes_per_pixel]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ImageFormat;

    fn encode(format: ImageFormat, rgba: [u8; 4]) -> Vec<u8> {
        let descriptor = format.descriptor();
        let mut output = vec![0; descriptor.bytes_per_block() as usize];
        encode_uncompressed(descriptor, &rgba, &mut output);
        output
    }

    #[test]
    fn byte_orders() {
        let rgba = [1, 2, 3, 4];
        assert_eq!(encode(ImageFormat::RGBA8888, rgba), [1, 2, 3, 4]);
        assert_eq!(encode(ImageFormat::ABGR8888, rgba), [4, 3, 2, 1]);
        assert_eq!(encode(ImageFormat::BGRA8888, rgba), [3, 2, 1, 4]);
        assert_eq!(encode(ImageFormat::BGRX8888, rgba), [3, 2, 1, 0]);
        assert_eq!(encode(ImageFormat::RGB888, rgba), [1, 2, 3]);
    }

    #[test]
    fn packed_formats() {
        assert_eq!(encode(ImageFormat::RGB565, [255, 0, 0, 255]), [0x1F, 0x00]);
        assert_eq!(encode(ImageFormat::BGR565, [255, 0, 0, 255]), [0x00, 0xF8]);
        assert_eq!(encode(ImageFormat::BGRA5551, [255, 0, 0, 255]), [0x00, 0xFC]);
        assert_eq!(encode(ImageFormat::BGRX5551, [255, 0, 0, 255]), [0x00, 0x7C]);
        assert_eq!(encode(ImageFormat::BGRA4444, [136, 0, 255, 17]), [0x0F, 0x18]);
    }

    #[test]
    fn luminance_uses_luma() {
        assert_eq!(encode(ImageFormat::I8, [50, 50, 50, 0]), [50]);
        assert_eq!(encode(ImageFormat::I8, [255, 0, 0, 255]), [77]);
        assert_eq!(encode(ImageFormat::IA88, [9, 9, 9, 7]), [9, 7]);
    }

    #[test]
    fn blue_screen_marks_transparent_pixels() {
        assert_eq!(encode(ImageFormat::RGB888_BLUESCREEN, [10, 20, 30, 0]), [0, 0, 255]);
        assert_eq!(encode(ImageFormat::BGR888_BLUESCREEN, [10, 20, 30, 127]), [255, 0, 0]);
        assert_eq!(encode(ImageFormat::RGB888_BLUESCREEN, [10, 20, 30, 128]), [10, 20, 30]);
    }

    #[test]
    fn floats() {
        let bytes = encode(ImageFormat::RGBA32323232F, [255, 0, 0, 255]);
        assert_eq!(&bytes[0..4], &1.0_f32.to_le_bytes());
        assert_eq!(&bytes[4..8], &0.0_f32.to_le_bytes());
        assert_eq!(&bytes[12..16], &1.0_f32.to_le_bytes());

        let bytes = encode(ImageFormat::RGBA16161616F, [255, 0, 0, 255]);
        assert_eq!(&bytes[0..2], &half::f16::ONE.to_le_bytes());
    }
}
