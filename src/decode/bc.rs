use crate::util::div_ceil;
use crate::{Encoding, PixelFormatDescriptor};

/// Calls `f` for every block of a block-compressed surface and copies the
/// in-bounds pixels of the decoded block into `output`.
///
/// `data` must hold exactly the blocks of a `width` x `height` surface, and
/// `output` must hold `width * height` RGBA8888 pixels.
fn process_4x4_blocks<const N: usize>(
    data: &[u8],
    output: &mut [u8],
    width: u32,
    height: u32,
    f: impl Fn([u8; N]) -> [[u8; 4]; 16],
) {
    let width = width as usize;
    let height = height as usize;
    let blocks_x = div_ceil(width, 4);
    debug_assert_eq!(data.len(), blocks_x * div_ceil(height, 4) * N);
    debug_assert_eq!(output.len(), width * height * 4);

    for (block_index, block) in data.chunks_exact(N).enumerate() {
        let mut block_bytes = [0_u8; N];
        block_bytes.copy_from_slice(block);
        let pixels = f(block_bytes);

        let x0 = (block_index % blocks_x) * 4;
        let y0 = (block_index / blocks_x) * 4;
        let w = (width - x0).min(4);
        let h = (height - y0).min(4);
        for y in 0..h {
            let row = (y0 + y) * width + x0;
            for x in 0..w {
                let i = (row + x) * 4;
                output[i..i + 4].copy_from_slice(&pixels[y * 4 + x]);
            }
        }
    }
}

/// Decodes a DXT1, DXT3, DXT5, ATI1N, or ATI2N surface into RGBA8888.
pub(crate) fn decode_bc(
    format: &PixelFormatDescriptor,
    data: &[u8],
    width: u32,
    height: u32,
    output: &mut [u8],
) {
    match format.encoding {
        Encoding::Bc1 => process_4x4_blocks(data, output, width, height, blocks::bc1_opaque),
        Encoding::Bc1Alpha => process_4x4_blocks(data, output, width, height, blocks::bc1),
        Encoding::Bc2 => process_4x4_blocks(data, output, width, height, blocks::bc2),
        Encoding::Bc3 => process_4x4_blocks(data, output, width, height, blocks::bc3),
        Encoding::Bc4 => process_4x4_blocks(data, output, width, height, blocks::bc4_luminance),
        Encoding::Bc5 => process_4x4_blocks(data, output, width, height, blocks::bc5),
        _ => debug_assert!(false, "{:?} is not block-compressed", format.format),
    }
}

/// Internal module for the underlying logic of decoding DXT blocks.
pub(crate) mod blocks {
    use crate::decode::convert::{n4, ToRgba, B5G6R5};

    /// The 4 colors of a DXT1 block. Blocks with `color0 <= color1` use
    /// three-color mode, where index 3 is `default`.
    pub(crate) fn bc1_palette(color0_u16: u16, color1_u16: u16, default: [u8; 4]) -> [[u8; 4]; 4] {
        let c0_bgr = B5G6R5::from_u16(color0_u16);
        let c1_bgr = B5G6R5::from_u16(color1_u16);

        let c0 = c0_bgr.to_n8().to_rgba();
        let c1 = c1_bgr.to_n8().to_rgba();

        let (c2, c3) = if color0_u16 > color1_u16 {
            (
                c0_bgr.one_third_color_rgb8(c1_bgr).to_rgba(),
                c1_bgr.one_third_color_rgb8(c0_bgr).to_rgba(),
            )
        } else {
            (c0_bgr.mid_color_rgb8(c1_bgr).to_rgba(), default)
        };
        [c0, c1, c2, c3]
    }
    /// The 4 colors of the color part of DXT3 and DXT5 blocks, which always
    /// use four-color mode.
    pub(crate) fn four_color_palette(color0_u16: u16, color1_u16: u16) -> [[u8; 4]; 4] {
        let c0_bgr = B5G6R5::from_u16(color0_u16);
        let c1_bgr = B5G6R5::from_u16(color1_u16);
        [
            c0_bgr.to_n8().to_rgba(),
            c1_bgr.to_n8().to_rgba(),
            c0_bgr.one_third_color_rgb8(c1_bgr).to_rgba(),
            c1_bgr.one_third_color_rgb8(c0_bgr).to_rgba(),
        ]
    }

    fn endpoints(block_bytes: &[u8; 8]) -> (u16, u16) {
        (
            u16::from_le_bytes([block_bytes[0], block_bytes[1]]),
            u16::from_le_bytes([block_bytes[2], block_bytes[3]]),
        )
    }

    fn decode_indexes(lut: [[u8; 4]; 4], index_bytes: &[u8]) -> [[u8; 4]; 16] {
        let indexes = u32::from_le_bytes([
            index_bytes[0],
            index_bytes[1],
            index_bytes[2],
            index_bytes[3],
        ]);
        let mut pixels: [[u8; 4]; 16] = Default::default();
        for (i, pixel) in pixels.iter_mut().enumerate() {
            let index = (indexes >> (i * 2)) & 0b11;
            *pixel = lut[index as usize];
        }
        pixels
    }

    /// Decodes a DXT1 block with one bit of alpha. Index 3 of a block in
    /// three-color mode is transparent black.
    pub(crate) fn bc1(block_bytes: [u8; 8]) -> [[u8; 4]; 16] {
        let (c0, c1) = endpoints(&block_bytes);
        decode_indexes(bc1_palette(c0, c1, [0, 0, 0, 0]), &block_bytes[4..8])
    }
    /// Decodes a DXT1 block of an opaque texture. Index 3 of a block in
    /// three-color mode is opaque black.
    pub(crate) fn bc1_opaque(block_bytes: [u8; 8]) -> [[u8; 4]; 16] {
        let (c0, c1) = endpoints(&block_bytes);
        decode_indexes(bc1_palette(c0, c1, [0, 0, 0, u8::MAX]), &block_bytes[4..8])
    }

    fn bc1_no_default(block_bytes: [u8; 8]) -> [[u8; 4]; 16] {
        let (c0, c1) = endpoints(&block_bytes);
        decode_indexes(four_color_palette(c0, c1), &block_bytes[4..8])
    }

    pub(crate) fn split_16(x: [u8; 16]) -> ([u8; 8], [u8; 8]) {
        let lower = [x[0], x[1], x[2], x[3], x[4], x[5], x[6], x[7]];
        let upper = [x[8], x[9], x[10], x[11], x[12], x[13], x[14], x[15]];
        (lower, upper)
    }

    /// Decodes a DXT3 block: explicit 4-bit alpha followed by a color block.
    pub(crate) fn bc2(block_bytes: [u8; 16]) -> [[u8; 4]; 16] {
        let (alpha_bytes, bc1_bytes) = split_16(block_bytes);
        let mut pixels = bc1_no_default(bc1_bytes);

        for i in 0..4 {
            let alpha_byte_high = alpha_bytes[i * 2];
            let alpha_byte_low = alpha_bytes[i * 2 + 1];
            let alpha = [
                alpha_byte_high & 0xF,
                alpha_byte_high >> 4,
                alpha_byte_low & 0xF,
                alpha_byte_low >> 4,
            ]
            .map(n4::n8);

            for (j, &alpha) in alpha.iter().enumerate() {
                pixels[i * 4 + j][3] = alpha;
            }
        }

        pixels
    }

    /// Decodes a DXT5 block: interpolated alpha followed by a color block.
    pub(crate) fn bc3(block_bytes: [u8; 16]) -> [[u8; 4]; 16] {
        let (alpha_bytes, bc1_bytes) = split_16(block_bytes);

        let mut pixels = bc1_no_default(bc1_bytes);
        let alpha = bc4(alpha_bytes);
        for (pixel, alpha) in pixels.iter_mut().zip(alpha) {
            pixel[3] = alpha;
        }

        pixels
    }

    /// Given a UNORM in the range `0..=255*7`, convert to 8 bits.
    fn from_interpolation_6(interpolation: u16) -> u8 {
        debug_assert!(interpolation <= 1785);
        ((interpolation as u32 * 9360 + 32160) >> 16) as u8
    }
    /// Given a UNORM in the range `0..=255*5`, convert to 8 bits.
    fn from_interpolation_4(interpolation: u16) -> u8 {
        debug_assert!(interpolation <= 1275);
        ((interpolation as u32 * 13104 + 30288) >> 16) as u8
    }

    /// The 8 values of a single-channel block. Blocks with `c0 > c1`
    /// interpolate 6 values, others interpolate 4 and add 0 and 255.
    pub(crate) fn bc4_palette(c0_u8: u8, c1_u8: u8) -> [u8; 8] {
        let c0 = c0_u8 as u16;
        let c1 = c1_u8 as u16;

        let (c2, c3, c4, c5, c6, c7) = if c0_u8 > c1_u8 {
            // 6 interpolated values
            (
                from_interpolation_6(c0 * 6 + c1),
                from_interpolation_6(c0 * 5 + c1 * 2),
                from_interpolation_6(c0 * 4 + c1 * 3),
                from_interpolation_6(c0 * 3 + c1 * 4),
                from_interpolation_6(c0 * 2 + c1 * 5),
                from_interpolation_6(c0 + c1 * 6),
            )
        } else {
            // 4 interpolated values
            (
                from_interpolation_4(c0 * 4 + c1),
                from_interpolation_4(c0 * 3 + c1 * 2),
                from_interpolation_4(c0 * 2 + c1 * 3),
                from_interpolation_4(c0 + c1 * 4),
                0,
                u8::MAX,
            )
        };
        [c0_u8, c1_u8, c2, c3, c4, c5, c6, c7]
    }

    /// Decodes a single-channel interpolated block, as used by DXT5 alpha,
    /// ATI1N, and both halves of ATI2N.
    pub(crate) fn bc4(block_bytes: [u8; 8]) -> [u8; 16] {
        let lut = bc4_palette(block_bytes[0], block_bytes[1]);
        let mut values = [0_u8; 16];
        let indexes0 = u32::from_le_bytes([block_bytes[2], block_bytes[3], block_bytes[4], 0]);
        let indexes1 = u32::from_le_bytes([block_bytes[5], block_bytes[6], block_bytes[7], 0]);
        for (i, indexes) in [indexes0, indexes1].into_iter().enumerate() {
            for j in 0..8 {
                let index = (indexes >> (j * 3)) & 0b111;
                values[i * 8 + j] = lut[index as usize];
            }
        }

        values
    }

    /// Decodes an ATI1N block as luminance.
    pub(crate) fn bc4_luminance(block_bytes: [u8; 8]) -> [[u8; 4]; 16] {
        bc4(block_bytes).map(|l| [l, l, l, u8::MAX])
    }

    /// Decodes an ATI2N block: red block, then green block.
    pub(crate) fn bc5(block_bytes: [u8; 16]) -> [[u8; 4]; 16] {
        let (red_bytes, green_bytes) = split_16(block_bytes);
        let red = bc4(red_bytes);
        let green = bc4(green_bytes);

        let mut pixels: [[u8; 4]; 16] = Default::default();
        for (i, pixel) in pixels.iter_mut().enumerate() {
            *pixel = [red[i], green[i], 0, u8::MAX];
        }
        pixels
    }
}
