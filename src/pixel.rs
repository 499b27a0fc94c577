use crate::util::div_ceil;

/// The width and height of a surface in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}
impl Size {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Returns the number of pixels.
    pub const fn pixels(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    /// Returns the size of the given mip level of a surface of this size.
    ///
    /// Each side is halved per level and never drops below 1.
    pub fn mip(&self, level: u8) -> Self {
        Self::new(mip_side(self.width, level), mip_side(self.height, level))
    }

    /// The number of bytes of an RGBA8888 buffer of this size.
    pub fn rgba_bytes(&self) -> Option<usize> {
        let bytes = self.pixels().checked_mul(4)?;
        usize::try_from(bytes).ok()
    }
}
impl From<(u32, u32)> for Size {
    fn from((width, height): (u32, u32)) -> Self {
        Self::new(width, height)
    }
}

pub(crate) fn mip_side(side: u32, level: u8) -> u32 {
    side.checked_shr(level as u32).unwrap_or(0).max(1)
}

/// This describes the number of bytes per pixel and the layout of pixels
/// within a surface.
///
/// VTF formats are either simple uncompressed formats with a fixed number of
/// bytes per pixel (e.g. `RGBA8888` or `BGR565`), or block-compressed formats
/// that store 4x4 pixel blocks in a fixed number of bytes (e.g. `DXT1`).
///
/// The main purpose of this enum is to calculate the byte size of surfaces to
/// create the [`DataLayout`](crate::DataLayout) of a VTF file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PixelInfo {
    /// Each pixel has a fixed number of bytes, regardless of the dimensions of
    /// the surface.
    Fixed { bytes_per_pixel: u8 },
    /// Pixels are grouped into blocks of constant byte size.
    ///
    /// `DXT1` has 8 bytes per 4x4 block, `DXT5` has 16 bytes per 4x4 block.
    Block(BlockPixelInfo),
}

/// See [`PixelInfo::Block`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlockPixelInfo {
    bytes_per_block: u8,
    width: u8,
    height: u8,
}
impl BlockPixelInfo {
    pub const fn bytes_per_block(&self) -> u8 {
        self.bytes_per_block
    }
    /// Returns the `(width, height)` of a block.
    pub const fn size(&self) -> (u8, u8) {
        (self.width, self.height)
    }
    /// Returns the number of pixels in a block.
    pub const fn pixels(&self) -> u8 {
        self.width * self.height
    }
}

impl PixelInfo {
    pub const fn fixed(bytes_per_pixel: u8) -> Self {
        Self::Fixed { bytes_per_pixel }
    }
    pub const fn block(bytes_per_block: u8, block_size: (u8, u8)) -> Self {
        Self::Block(BlockPixelInfo {
            bytes_per_block,
            width: block_size.0,
            height: block_size.1,
        })
    }

    /// Returns the `(width, height)` of a block, `(1, 1)` for uncompressed
    /// formats.
    pub const fn block_size(&self) -> (u8, u8) {
        match self {
            Self::Fixed { .. } => (1, 1),
            Self::Block(block) => block.size(),
        }
    }
    /// Returns the number of bytes of one block, or one pixel for
    /// uncompressed formats.
    pub const fn bytes_per_block(&self) -> u8 {
        match self {
            Self::Fixed { bytes_per_pixel } => *bytes_per_pixel,
            Self::Block(block) => block.bytes_per_block(),
        }
    }

    /// Returns the number of bits per pixel.
    ///
    /// If the number of bits per pixel is not an integer, the result is rounded
    /// up to the nearest integer.
    pub fn bits_per_pixel(&self) -> u32 {
        match *self {
            Self::Fixed { bytes_per_pixel } => bytes_per_pixel as u32 * 8,
            Self::Block(block) => {
                let bits_per_block = block.bytes_per_block() as u32 * 8;
                div_ceil(bits_per_block, block.pixels() as u32)
            }
        }
    }

    /// Returns the number of bytes a surface with the given dimensions takes
    /// up in the data section of a VTF file.
    ///
    /// If an overflow occurs, `None` is returned. This typically happens when
    /// the surface is unrealistically large, hinting at a modified, corrupted,
    /// or otherwise invalid VTF file.
    pub fn surface_bytes(&self, size: Size) -> Option<u64> {
        match *self {
            Self::Fixed { bytes_per_pixel } => size.pixels().checked_mul(bytes_per_pixel as u64),
            Self::Block(block) => {
                let blocks_x = div_ceil(size.width, block.width as u32);
                let blocks_y = div_ceil(size.height, block.height as u32);
                // This cannot overflow, because both factors are u32.
                let blocks = blocks_x as u64 * blocks_y as u64;
                blocks.checked_mul(block.bytes_per_block() as u64)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn block_surfaces_round_up_to_whole_blocks() {
        let dxt1 = PixelInfo::block(8, (4, 4));
        assert_eq!(dxt1.surface_bytes(Size::new(1, 1)), Some(8));
        assert_eq!(dxt1.surface_bytes(Size::new(4, 4)), Some(8));
        assert_eq!(dxt1.surface_bytes(Size::new(5, 4)), Some(16));
        assert_eq!(dxt1.surface_bytes(Size::new(8, 8)), Some(32));
        assert_eq!(dxt1.bits_per_pixel(), 4);
    }

    #[test]
    fn mip_sizes_clamp_to_one() {
        let size = Size::new(16, 4);
        assert_eq!(size.mip(0), Size::new(16, 4));
        assert_eq!(size.mip(2), Size::new(4, 1));
        assert_eq!(size.mip(4), Size::new(1, 1));
        assert_eq!(size.mip(40), Size::new(1, 1));
    }
}
