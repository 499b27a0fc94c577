use num_enum::{IntoPrimitive, TryFromPrimitive};

use crate::{FormatError, PixelInfo};

/// The image formats of the VTF container.
///
/// The discriminant of each variant is the id stored in VTF headers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, TryFromPrimitive, IntoPrimitive)]
#[repr(i32)]
#[allow(non_camel_case_types)]
pub enum ImageFormat {
    RGBA8888 = 0,
    ABGR8888 = 1,
    RGB888 = 2,
    BGR888 = 3,
    RGB565 = 4,
    I8 = 5,
    IA88 = 6,
    P8 = 7,
    A8 = 8,
    RGB888_BLUESCREEN = 9,
    BGR888_BLUESCREEN = 10,
    ARGB8888 = 11,
    BGRA8888 = 12,
    DXT1 = 13,
    DXT3 = 14,
    DXT5 = 15,
    BGRX8888 = 16,
    BGR565 = 17,
    BGRX5551 = 18,
    BGRA4444 = 19,
    DXT1_ONEBITALPHA = 20,
    BGRA5551 = 21,
    UV88 = 22,
    UVWQ8888 = 23,
    RGBA16161616F = 24,
    RGBA16161616 = 25,
    UVLX8888 = 26,
    R32F = 27,
    RGB323232F = 28,
    RGBA32323232F = 29,
    NV_DST16 = 30,
    NV_DST24 = 31,
    NV_INTZ = 32,
    NV_RAWZ = 33,
    ATI_DST16 = 34,
    ATI_DST24 = 35,
    NV_NULL = 36,
    ATI2N = 37,
    ATI1N = 38,
}

impl ImageFormat {
    /// The id stored in headers for "no image", used by VTF files without a
    /// low-resolution thumbnail.
    pub const NONE_ID: i32 = -1;

    /// Looks up a format by its header id.
    pub fn from_id(id: i32) -> Result<Self, FormatError> {
        Self::try_from(id).map_err(|_| FormatError::UnknownFormat(id))
    }
    pub fn id(self) -> i32 {
        self.into()
    }

    /// Returns the registry entry of this format.
    pub fn descriptor(self) -> &'static PixelFormatDescriptor {
        // The registry is indexed by id. See the `registry_is_indexed_by_id` test.
        &REGISTRY[self.id() as usize]
    }
    pub fn pixel_info(self) -> PixelInfo {
        self.descriptor().pixels
    }
    pub fn has_alpha(self) -> bool {
        self.descriptor().has_alpha()
    }
    pub fn is_compressed(self) -> bool {
        self.descriptor().is_compressed()
    }
    /// Whether pixels of this format can be converted to and from RGBA8888.
    pub fn is_convertible(self) -> bool {
        self.descriptor().encoding.is_convertible()
    }
}

/// The meaning of one bit field of a pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelKind {
    /// Red, or U for bump map formats.
    Red,
    /// Green, or V for bump map formats.
    Green,
    /// Blue, or W/L for bump map formats.
    Blue,
    /// Alpha, or Q for bump map formats.
    Alpha,
    /// A single value used for the red, green, and blue channels.
    Luminance,
    /// An index into a palette.
    Index,
    Depth,
    /// Padding bits.
    Unused,
}

/// A channel of a pixel format, listed from the least significant bits up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Channel {
    pub kind: ChannelKind,
    pub bits: u8,
}
impl Channel {
    pub const fn new(kind: ChannelKind, bits: u8) -> Self {
        Self { kind, bits }
    }
}

/// How the channels of a format are stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Encoding {
    /// Unsigned normalized integers packed into a little-endian word.
    Unorm,
    /// IEEE floats, 16 or 32 bits per channel.
    Float,
    /// 8-bit RGB where pure blue marks transparent pixels.
    BlueScreen,
    /// Palette indices. The palette is not part of the VTF format.
    Palette,
    /// Depth buffers and null formats of render targets.
    Depth,
    /// DXT1 without alpha.
    Bc1,
    /// DXT1 where the 3-colour mode marks transparent pixels.
    Bc1Alpha,
    /// DXT3.
    Bc2,
    /// DXT5.
    Bc3,
    /// ATI1N, one channel.
    Bc4,
    /// ATI2N, two channels.
    Bc5,
}
impl Encoding {
    pub const fn is_convertible(self) -> bool {
        !matches!(self, Encoding::Palette | Encoding::Depth)
    }
}

/// Static description of a pixel format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PixelFormatDescriptor {
    pub format: ImageFormat,
    pub name: &'static str,
    pub pixels: PixelInfo,
    /// The channels of one pixel. For block-compressed formats, these are the
    /// precisions of the block endpoints.
    pub channels: &'static [Channel],
    /// The number of bits of alpha precision.
    ///
    /// This is 1 for blue screen formats, since their key colour acts as a
    /// 1-bit alpha channel.
    pub alpha_bits: u8,
    pub encoding: Encoding,
}
impl PixelFormatDescriptor {
    pub const fn has_alpha(&self) -> bool {
        self.alpha_bits > 0
    }
    pub const fn is_compressed(&self) -> bool {
        matches!(self.pixels, PixelInfo::Block(_))
    }
    /// `(width, height)` of one block, `(1, 1)` for uncompressed formats.
    pub const fn block_size(&self) -> (u8, u8) {
        self.pixels.block_size()
    }
    pub const fn bytes_per_block(&self) -> u8 {
        self.pixels.bytes_per_block()
    }
    /// Returns the channel of the given kind, if any.
    pub fn channel(&self, kind: ChannelKind) -> Option<Channel> {
        self.channels.iter().copied().find(|c| c.kind == kind)
    }
}

/// Returns the registry entry of the format with the given header id.
pub fn describe(id: i32) -> Result<&'static PixelFormatDescriptor, FormatError> {
    ImageFormat::from_id(id).map(ImageFormat::descriptor)
}
pub fn has_alpha(id: i32) -> Result<bool, FormatError> {
    describe(id).map(PixelFormatDescriptor::has_alpha)
}
pub fn is_compressed(id: i32) -> Result<bool, FormatError> {
    describe(id).map(PixelFormatDescriptor::is_compressed)
}

/// All registered formats, ordered by id.
pub fn all_formats() -> impl Iterator<Item = &'static PixelFormatDescriptor> {
    REGISTRY.iter()
}

use ChannelKind::*;

const fn c(kind: ChannelKind, bits: u8) -> Channel {
    Channel::new(kind, bits)
}
const fn fixed(
    format: ImageFormat,
    name: &'static str,
    bytes_per_pixel: u8,
    channels: &'static [Channel],
    alpha_bits: u8,
    encoding: Encoding,
) -> PixelFormatDescriptor {
    PixelFormatDescriptor {
        format,
        name,
        pixels: PixelInfo::fixed(bytes_per_pixel),
        channels,
        alpha_bits,
        encoding,
    }
}
const fn block(
    format: ImageFormat,
    name: &'static str,
    bytes_per_block: u8,
    channels: &'static [Channel],
    alpha_bits: u8,
    encoding: Encoding,
) -> PixelFormatDescriptor {
    PixelFormatDescriptor {
        format,
        name,
        pixels: PixelInfo::block(bytes_per_block, (4, 4)),
        channels,
        alpha_bits,
        encoding,
    }
}

const RGBA_8: &[Channel] = &[c(Red, 8), c(Green, 8), c(Blue, 8), c(Alpha, 8)];
const ABGR_8: &[Channel] = &[c(Alpha, 8), c(Blue, 8), c(Green, 8), c(Red, 8)];
const ARGB_8: &[Channel] = &[c(Alpha, 8), c(Red, 8), c(Green, 8), c(Blue, 8)];
const BGRA_8: &[Channel] = &[c(Blue, 8), c(Green, 8), c(Red, 8), c(Alpha, 8)];
const BGRX_8: &[Channel] = &[c(Blue, 8), c(Green, 8), c(Red, 8), c(Unused, 8)];
const RGB_8: &[Channel] = &[c(Red, 8), c(Green, 8), c(Blue, 8)];
const BGR_8: &[Channel] = &[c(Blue, 8), c(Green, 8), c(Red, 8)];
const RG_8: &[Channel] = &[c(Red, 8), c(Green, 8)];
const RGB_565: &[Channel] = &[c(Red, 5), c(Green, 6), c(Blue, 5)];
const BGR_565: &[Channel] = &[c(Blue, 5), c(Green, 6), c(Red, 5)];
const BGRX_5551: &[Channel] = &[c(Blue, 5), c(Green, 5), c(Red, 5), c(Unused, 1)];
const BGRA_5551: &[Channel] = &[c(Blue, 5), c(Green, 5), c(Red, 5), c(Alpha, 1)];
const BGRA_4444: &[Channel] = &[c(Blue, 4), c(Green, 4), c(Red, 4), c(Alpha, 4)];
const L_8: &[Channel] = &[c(Luminance, 8)];
const LA_8: &[Channel] = &[c(Luminance, 8), c(Alpha, 8)];
const P_8: &[Channel] = &[c(Index, 8)];
const A_8: &[Channel] = &[c(Alpha, 8)];
const RGBA_16: &[Channel] = &[c(Red, 16), c(Green, 16), c(Blue, 16), c(Alpha, 16)];
const L_32: &[Channel] = &[c(Luminance, 32)];
const RGB_32: &[Channel] = &[c(Red, 32), c(Green, 32), c(Blue, 32)];
const RGBA_32: &[Channel] = &[c(Red, 32), c(Green, 32), c(Blue, 32), c(Alpha, 32)];
const D_16: &[Channel] = &[c(Depth, 16)];
const D_24: &[Channel] = &[c(Depth, 24), c(Unused, 8)];
const NULL: &[Channel] = &[c(Unused, 32)];
const BC1: &[Channel] = &[c(Red, 5), c(Green, 6), c(Blue, 5)];
const BC1_A: &[Channel] = &[c(Red, 5), c(Green, 6), c(Blue, 5), c(Alpha, 1)];
const BC2: &[Channel] = &[c(Red, 5), c(Green, 6), c(Blue, 5), c(Alpha, 4)];
const BC3: &[Channel] = &[c(Red, 5), c(Green, 6), c(Blue, 5), c(Alpha, 8)];

#[rustfmt::skip]
static REGISTRY: [PixelFormatDescriptor; 39] = {
    use Encoding::*;
    use ImageFormat as F;
    [
        fixed(F::RGBA8888, "RGBA8888", 4, RGBA_8, 8, Unorm),
        fixed(F::ABGR8888, "ABGR8888", 4, ABGR_8, 8, Unorm),
        fixed(F::RGB888, "RGB888", 3, RGB_8, 0, Unorm),
        fixed(F::BGR888, "BGR888", 3, BGR_8, 0, Unorm),
        fixed(F::RGB565, "RGB565", 2, RGB_565, 0, Unorm),
        fixed(F::I8, "I8", 1, L_8, 0, Unorm),
        fixed(F::IA88, "IA88", 2, LA_8, 8, Unorm),
        fixed(F::P8, "P8", 1, P_8, 0, Palette),
        fixed(F::A8, "A8", 1, A_8, 8, Unorm),
        fixed(F::RGB888_BLUESCREEN, "RGB888 Bluescreen", 3, RGB_8, 1, BlueScreen),
        fixed(F::BGR888_BLUESCREEN, "BGR888 Bluescreen", 3, BGR_8, 1, BlueScreen),
        fixed(F::ARGB8888, "ARGB8888", 4, ARGB_8, 8, Unorm),
        fixed(F::BGRA8888, "BGRA8888", 4, BGRA_8, 8, Unorm),
        block(F::DXT1, "DXT1", 8, BC1, 0, Bc1),
        block(F::DXT3, "DXT3", 16, BC2, 4, Bc2),
        block(F::DXT5, "DXT5", 16, BC3, 8, Bc3),
        fixed(F::BGRX8888, "BGRX8888", 4, BGRX_8, 0, Unorm),
        fixed(F::BGR565, "BGR565", 2, BGR_565, 0, Unorm),
        fixed(F::BGRX5551, "BGRX5551", 2, BGRX_5551, 0, Unorm),
        fixed(F::BGRA4444, "BGRA4444", 2, BGRA_4444, 4, Unorm),
        block(F::DXT1_ONEBITALPHA, "DXT1 One Bit Alpha", 8, BC1_A, 1, Bc1Alpha),
        fixed(F::BGRA5551, "BGRA5551", 2, BGRA_5551, 1, Unorm),
        fixed(F::UV88, "UV88", 2, RG_8, 0, Unorm),
        fixed(F::UVWQ8888, "UVWQ8888", 4, RGBA_8, 8, Unorm),
        fixed(F::RGBA16161616F, "RGBA16161616F", 8, RGBA_16, 16, Float),
        fixed(F::RGBA16161616, "RGBA16161616", 8, RGBA_16, 16, Unorm),
        fixed(F::UVLX8888, "UVLX8888", 4, RGBA_8, 8, Unorm),
        fixed(F::R32F, "R32F", 4, L_32, 0, Float),
        fixed(F::RGB323232F, "RGB323232F", 12, RGB_32, 0, Float),
        fixed(F::RGBA32323232F, "RGBA32323232F", 16, RGBA_32, 32, Float),
        fixed(F::NV_DST16, "nVidia DST16", 2, D_16, 0, Encoding::Depth),
        fixed(F::NV_DST24, "nVidia DST24", 4, D_24, 0, Encoding::Depth),
        fixed(F::NV_INTZ, "nVidia INTZ", 4, D_24, 0, Encoding::Depth),
        fixed(F::NV_RAWZ, "nVidia RAWZ", 4, D_24, 0, Encoding::Depth),
        fixed(F::ATI_DST16, "ATI DST16", 2, D_16, 0, Encoding::Depth),
        fixed(F::ATI_DST24, "ATI DST24", 4, D_24, 0, Encoding::Depth),
        fixed(F::NV_NULL, "nVidia NULL", 4, NULL, 0, Encoding::Depth),
        block(F::ATI2N, "ATI2N", 16, RG_8, 0, Bc5),
        block(F::ATI1N, "ATI1N", 8, L_8, 0, Bc4),
    ]
};
