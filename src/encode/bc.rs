use super::bc1::{compress_bc1_block, Bc1Mode};
use super::bc4::{compress_bc2_alpha, compress_bc4_block};
use crate::decode::convert::luma;
use crate::util::div_ceil;
use crate::{Encoding, PixelFormatDescriptor};

/// Gathers the 4x4 block at the given block coordinates. Pixels outside the
/// surface repeat the nearest edge pixel.
fn get_block(rgba: &[u8], width: usize, height: usize, block_x: usize, block_y: usize) -> [[u8; 4]; 16] {
    let mut block = [[0_u8; 4]; 16];
    for (i, pixel) in block.iter_mut().enumerate() {
        let x = (block_x * 4 + i % 4).min(width - 1);
        let y = (block_y * 4 + i / 4).min(height - 1);
        let index = (y * width + x) * 4;
        pixel.copy_from_slice(&rgba[index..index + 4]);
    }
    block
}

fn channel(block: &[[u8; 4]; 16], c: usize) -> [u8; 16] {
    block.map(|pixel| pixel[c])
}

/// Compresses a `width` x `height` RGBA8888 surface into DXT blocks.
///
/// `output` must hold exactly the blocks of the surface.
pub(crate) fn encode_bc(
    format: &PixelFormatDescriptor,
    rgba: &[u8],
    width: u32,
    height: u32,
    output: &mut [u8],
) {
    let width = width as usize;
    let height = height as usize;
    let bytes_per_block = format.bytes_per_block() as usize;
    let blocks_x = div_ceil(width, 4);
    debug_assert_eq!(rgba.len(), width * height * 4);
    debug_assert_eq!(
        output.len(),
        blocks_x * div_ceil(height, 4) * bytes_per_block
    );

    for (block_index, out) in output.chunks_exact_mut(bytes_per_block).enumerate() {
        let block = get_block(
            rgba,
            width,
            height,
            block_index % blocks_x,
            block_index / blocks_x,
        );

        match format.encoding {
            Encoding::Bc1 => out.copy_from_slice(&compress_bc1_block(block, Bc1Mode::Opaque)),
            Encoding::Bc1Alpha => {
                out.copy_from_slice(&compress_bc1_block(block, Bc1Mode::OneBitAlpha))
            }
            Encoding::Bc2 => {
                out[..8].copy_from_slice(&compress_bc2_alpha(channel(&block, 3)));
                out[8..].copy_from_slice(&compress_bc1_block(block, Bc1Mode::Opaque));
            }
            Encoding::Bc3 => {
                out[..8].copy_from_slice(&compress_bc4_block(channel(&block, 3)));
                out[8..].copy_from_slice(&compress_bc1_block(block, Bc1Mode::Opaque));
            }
            Encoding::Bc4 => out.copy_from_slice(&compress_bc4_block(block.map(luma))),
            Encoding::Bc5 => {
                out[..8].copy_from_slice(&compress_bc4_block(channel(&block, 0)));
                out[8..].copy_from_slice(&compress_bc4_block(channel(&block, 1)));
            }
            _ => debug_assert!(false, "{:?} is not block-compressed", format.format),
        }
    }
}
