//! Mipmap generation by box filtering.

use glam::Vec4;
use resize::{Filter, Resizer};

use crate::error::try_alloc;
use crate::{LayoutError, Size, Surface, VtfError};

/// Halves a surface with a 2x2 box filter.
///
/// Sides of length 1 stay 1. Every channel, including alpha, is averaged
/// independently with rounding.
pub fn downsample(surface: &Surface) -> Result<Surface, VtfError> {
    let size = surface.size().mip(1);
    let src: Vec<[u8; 4]> = surface.pixels().collect();
    let mut dst = vec![[0_u8; 4]; size.pixels() as usize];

    // A box of radius 0.5 covers exactly two source pixels per output pixel
    // when halving, and one when a side stays the same.
    let mut resizer: Resizer<Rgba8> = Resizer::new(
        surface.width() as usize,
        surface.height() as usize,
        size.width as usize,
        size.height as usize,
        Rgba8,
        resize::Type::Custom(Filter::box_filter(0.5)),
    )
    .map_err(|error| resize_error(error, size))?;
    resizer
        .resize(&src, &mut dst)
        .map_err(|error| resize_error(error, size))?;

    let mut data = try_alloc(dst.len() * 4)?;
    for (out, pixel) in data.chunks_exact_mut(4).zip(dst) {
        out.copy_from_slice(&pixel);
    }
    Ok(Surface::from_parts(size, data))
}

/// Halves a volume with a 2x2x2 box filter.
///
/// The output has `max(1, slices.len() / 2)` slices. Slice `k` of the output
/// averages slices `2k` and `2k + 1` of the input. All slices must have the
/// same size.
pub fn downsample_volume(slices: &[&Surface]) -> Result<Vec<Surface>, VtfError> {
    debug_assert!(slices.iter().all(|s| s.size() == slices[0].size()));

    let halved = slices
        .iter()
        .map(|slice| downsample(slice))
        .collect::<Result<Vec<_>, _>>()?;
    if halved.len() < 2 {
        return Ok(halved);
    }

    Ok(halved
        .chunks(2)
        .take(halved.len() / 2)
        .map(|pair| match pair {
            [a, b] => {
                let data = a
                    .data()
                    .iter()
                    .zip(b.data())
                    .map(|(&a, &b)| ((a as u16 + b as u16 + 1) / 2) as u8)
                    .collect();
                Surface::from_parts(a.size(), data)
            }
            _ => pair[0].clone(),
        })
        .collect())
}

fn resize_error(error: resize::Error, size: Size) -> VtfError {
    if matches!(error, resize::Error::OutOfMemory) {
        VtfError::OutOfMemory(size.rgba_bytes().unwrap_or(usize::MAX))
    } else {
        LayoutError::ZeroDimension.into()
    }
}

/// Straight RGBA8 pixels whose channels are averaged independently.
#[derive(Debug, Clone, Copy)]
struct Rgba8;

impl resize::PixelFormat for Rgba8 {
    type InputPixel = [u8; 4];
    type OutputPixel = [u8; 4];
    type Accumulator = Vec4;

    fn new() -> Self::Accumulator {
        Vec4::ZERO
    }
    fn add(&self, acc: &mut Self::Accumulator, inp: Self::InputPixel, coeff: f32) {
        *acc += Vec4::from_array(inp.map(|c| c as f32)) * coeff;
    }
    fn add_acc(acc: &mut Self::Accumulator, inp: Self::Accumulator, coeff: f32) {
        *acc += inp * coeff;
    }
    fn into_pixel(&self, acc: Self::Accumulator) -> Self::OutputPixel {
        (acc + 0.5).to_array().map(|c| c as u8)
    }
}

/// Generates `levels` mip levels below the given surface, each half the size
/// of the previous one.
pub fn mip_chain(surface: &Surface, levels: u8) -> Result<Vec<Surface>, VtfError> {
    let mut chain: Vec<Surface> = Vec::with_capacity(levels as usize);
    for _ in 0..levels {
        let next = downsample(chain.last().unwrap_or(surface))?;
        chain.push(next);
    }
    Ok(chain)
}

/// The size of the low-resolution thumbnail of a texture: the largest mip
/// level whose sides are both at most 16 pixels.
pub fn thumbnail_size(size: Size) -> Size {
    const MAX: u32 = 16;
    let mut level = 0;
    loop {
        let mip = size.mip(level);
        if mip.width <= MAX && mip.height <= MAX {
            return mip;
        }
        level += 1;
    }
}
