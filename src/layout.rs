use std::ops::Range;

use crate::pixel::mip_side;
use crate::util::power_of_two_bracket;
use crate::{Header, ImageFormat, LayoutError, PixelInfo, ResourceTag, Size};

pub trait DataRegion {
    /// The number of bytes this object occupies in a VTF file.
    ///
    /// It is guaranteed that `self.offset() + self.len() <= u64::MAX`.
    fn data_len(&self) -> u64;
    /// The byte offset of this object in a VTF file.
    fn data_offset(&self) -> u64;
    /// The byte offset of the byte after this object in a VTF file.
    ///
    /// This is equivalent to `self.offset() + self.len()`.
    fn data_end(&self) -> u64 {
        self.data_offset() + self.data_len()
    }
    /// The byte range of this object in a VTF file.
    fn data_range(&self) -> Range<u64> {
        self.data_offset()..self.data_end()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SurfaceDescriptor {
    width: u32,
    height: u32,
    offset: u64,
    len: u64,
}
impl SurfaceDescriptor {
    /// Internal constructor.
    ///
    /// This **assumes** that the arguments are valid and only performs checks
    /// in debug.
    fn new(size: Size, offset: u64, len: u64) -> Self {
        debug_assert!(size.width > 0);
        debug_assert!(size.height > 0);
        debug_assert!(len > 0);
        debug_assert!(offset.checked_add(len).is_some());

        Self {
            width: size.width,
            height: size.height,
            offset,
            len,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }
    pub fn height(&self) -> u32 {
        self.height
    }
    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }
}
impl DataRegion for SurfaceDescriptor {
    fn data_len(&self) -> u64 {
        self.len
    }
    fn data_offset(&self) -> u64 {
        self.offset
    }
}

/// Identifies one surface of a texture: a single mip level of a single
/// frame, face, and depth slice.
///
/// Mip level 0 is always the full-resolution level, regardless of the order
/// in which levels are stored in the file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct UnitIndex {
    pub mip: u8,
    pub frame: u16,
    pub face: u8,
    pub slice: u16,
}
impl UnitIndex {
    pub const fn new(mip: u8, frame: u16, face: u8, slice: u16) -> Self {
        Self {
            mip,
            frame,
            face,
            slice,
        }
    }
    /// The full-resolution unit of the given frame, face, and slice.
    pub const fn layer(frame: u16, face: u8, slice: u16) -> Self {
        Self::new(0, frame, face, slice)
    }
    pub const fn with_mip(self, mip: u8) -> Self {
        Self { mip, ..self }
    }
}

/// The dimensions of a texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ImageShape {
    pub width: u32,
    pub height: u32,
    /// The number of slices of a volume texture, 1 otherwise.
    pub depth: u16,
    pub frames: u16,
    /// 6 for cube maps, 7 for sphere maps, 1 otherwise.
    pub faces: u8,
    /// The number of mip levels including the full-resolution one.
    pub mipmaps: u8,
}

impl ImageShape {
    /// A single 2D texture without mipmaps.
    pub const fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            depth: 1,
            frames: 1,
            faces: 1,
            mipmaps: 1,
        }
    }
    /// Sets the mipmap count to the full chain down to 1x1.
    pub fn with_full_mip_chain(self) -> Self {
        Self {
            mipmaps: full_mip_count(self.width, self.height, self.depth),
            ..self
        }
    }

    /// Reads the shape of the texture described by the header.
    ///
    /// If `permissive` is `false`, the texture must have power-of-two sides
    /// and a mip count of at most [`full_mip_count`]. Otherwise, these are
    /// accepted or repaired with a warning.
    pub fn from_header(header: &Header, permissive: bool) -> Result<Self, LayoutError> {
        let width = header.width as u32;
        let height = header.height as u32;
        if width == 0 || height == 0 {
            return Err(LayoutError::ZeroDimension);
        }

        let mut frames = header.frames;
        let mut depth = header.depth;
        if frames == 0 || depth == 0 {
            if !permissive {
                return Err(LayoutError::ZeroDimension);
            }
            log::warn!("treating zero frame count or depth as 1");
            frames = frames.max(1);
            depth = depth.max(1);
        }

        if let Err(error) = validate_dimensions(width, height) {
            if !permissive {
                return Err(error);
            }
            log::warn!("accepting non-power-of-two size {}x{}", width, height);
        }

        let max = full_mip_count(width, height, depth);
        let mut mipmaps = header.mipmap_count;
        if mipmaps == 0 || mipmaps > max {
            if !permissive {
                return Err(LayoutError::InvalidMipmapCount {
                    mipmaps: mipmaps as u32,
                    max: max as u32,
                });
            }
            log::warn!("clamping mipmap count {} to 1..={}", mipmaps, max);
            mipmaps = mipmaps.clamp(1, max);
        }

        Ok(Self {
            width,
            height,
            depth,
            frames,
            faces: header.faces(),
            mipmaps,
        })
    }

    /// Checks that no dimension is zero and that the mip count fits the size.
    pub fn validate(&self) -> Result<(), LayoutError> {
        if self.width == 0
            || self.height == 0
            || self.depth == 0
            || self.frames == 0
            || self.faces == 0
        {
            return Err(LayoutError::ZeroDimension);
        }
        let max = full_mip_count(self.width, self.height, self.depth);
        if self.mipmaps == 0 || self.mipmaps > max {
            return Err(LayoutError::InvalidMipmapCount {
                mipmaps: self.mipmaps as u32,
                max: max as u32,
            });
        }
        Ok(())
    }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }
    pub fn mip_size(&self, mip: u8) -> Size {
        self.size().mip(mip)
    }
    /// The number of slices at the given mip level. Volumes halve their depth
    /// with every level.
    pub fn mip_depth(&self, mip: u8) -> u16 {
        mip_side(self.depth as u32, mip) as u16
    }

    /// The number of full-resolution units (frames x faces x slices).
    pub fn layer_count(&self) -> u64 {
        self.frames as u64 * self.faces as u64 * self.depth as u64
    }
    /// The number of units of one mip level.
    pub fn units_in_mip(&self, mip: u8) -> u64 {
        self.frames as u64 * self.faces as u64 * self.mip_depth(mip) as u64
    }

    pub fn contains(&self, index: UnitIndex) -> bool {
        index.mip < self.mipmaps
            && index.frame < self.frames
            && index.face < self.faces
            && index.slice < self.mip_depth(index.mip)
    }

    /// Iterates over all units of the given mip level, frame-major with
    /// slices innermost.
    pub fn iter_mip(&self, mip: u8) -> impl Iterator<Item = UnitIndex> {
        let faces = self.faces;
        let depth = self.mip_depth(mip);
        (0..self.frames).flat_map(move |frame| {
            (0..faces).flat_map(move |face| {
                (0..depth).map(move |slice| UnitIndex::new(mip, frame, face, slice))
            })
        })
    }
    /// Iterates over all units, starting with the full-resolution level.
    pub fn iter_units(&self) -> impl Iterator<Item = UnitIndex> {
        let shape = *self;
        (0..self.mipmaps).flat_map(move |mip| shape.iter_mip(mip))
    }
}

/// The number of mip levels from the given size down to 1x1x1.
pub fn full_mip_count(width: u32, height: u32, depth: u16) -> u8 {
    let largest = width.max(height).max(depth as u32).max(1);
    (32 - largest.leading_zeros()) as u8
}

/// The nearest power-of-two sizes around a size that is not a power of two.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PowerOfTwoSuggestion {
    /// The nearest power of two at or below the width, and at or above it.
    pub width: (u32, u32),
    pub height: (u32, u32),
}
impl PowerOfTwoSuggestion {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width: power_of_two_bracket(width),
            height: power_of_two_bracket(height),
        }
    }
    pub fn smaller(&self) -> Size {
        Size::new(self.width.0, self.height.0)
    }
    pub fn larger(&self) -> Size {
        Size::new(self.width.1, self.height.1)
    }
}
impl std::fmt::Display for PowerOfTwoSuggestion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let (smaller, larger) = (self.smaller(), self.larger());
        write!(
            f,
            "{}x{} and {}x{}",
            smaller.width, smaller.height, larger.width, larger.height
        )
    }
}

/// Fails with [`LayoutError::DimensionNotPowerOfTwo`] unless both sides are
/// powers of two.
pub fn validate_dimensions(width: u32, height: u32) -> Result<(), LayoutError> {
    if width.is_power_of_two() && height.is_power_of_two() {
        Ok(())
    } else {
        Err(LayoutError::DimensionNotPowerOfTwo {
            width,
            height,
            suggestion: PowerOfTwoSuggestion::new(width, height),
        })
    }
}

/// Which of the three layer axes of a texture a list of layers fills.
///
/// VTF files can have frames, faces, and slices at once, but an image made
/// from a flat list of layers uses at most one of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LayerUse {
    /// A single layer.
    #[default]
    Single,
    /// Each layer is an animation frame.
    Animation,
    /// Each layer is a face of an environment map.
    EnvMap,
    /// Each layer is a slice of a volume texture.
    Volume,
}
impl LayerUse {
    /// The layer use of an existing texture: animation if it has multiple
    /// frames, environment map if it has multiple faces, volume if it has
    /// multiple slices.
    pub fn from_shape(shape: &ImageShape) -> Self {
        if shape.frames > 1 {
            Self::Animation
        } else if shape.faces > 1 {
            Self::EnvMap
        } else if shape.depth > 1 {
            Self::Volume
        } else {
            Self::Single
        }
    }
    pub fn from_header(header: &Header) -> Self {
        if header.frames > 1 {
            Self::Animation
        } else if header.faces() > 1 {
            Self::EnvMap
        } else if header.depth > 1 {
            Self::Volume
        } else {
            Self::Single
        }
    }

    /// Returns `(frames, faces, depth)` for the given number of layers.
    ///
    /// `None` if the number of layers cannot be represented.
    pub fn counts(self, layers: usize) -> Option<(u16, u8, u16)> {
        match self {
            Self::Single => (layers == 1).then_some((1, 1, 1)),
            Self::Animation => Some((u16::try_from(layers).ok()?, 1, 1)),
            Self::EnvMap => Some((1, u8::try_from(layers).ok()?, 1)),
            Self::Volume => Some((1, 1, u16::try_from(layers).ok()?)),
        }
        .filter(|_| layers > 0)
    }

    /// The full-resolution unit of the `i`th layer.
    pub fn unit(self, i: usize) -> UnitIndex {
        match self {
            Self::Single => UnitIndex::layer(0, 0, 0),
            Self::Animation => UnitIndex::layer(i as u16, 0, 0),
            Self::EnvMap => UnitIndex::layer(0, i as u8, 0),
            Self::Volume => UnitIndex::layer(0, 0, i as u16),
        }
    }
}

/// The byte layout of all image data of a VTF file.
///
/// The high-resolution data stores mip levels from the smallest to the
/// largest. Within one level, units are ordered by frame, then face, then
/// slice.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DataLayout {
    shape: ImageShape,
    format: ImageFormat,
    pixels: PixelInfo,
    offset: u64,
    len: u64,
    /// Indexed by mip level: the byte length of one unit and the offset of
    /// the level relative to `offset`.
    mips: Vec<MipLayout>,
    low_res: Option<(ImageFormat, SurfaceDescriptor)>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct MipLayout {
    unit_len: u64,
    offset: u64,
}

impl DataLayout {
    /// Computes the layout of the high-resolution data starting at `offset`.
    pub fn new(shape: ImageShape, format: ImageFormat, offset: u64) -> Result<Self, LayoutError> {
        shape.validate()?;
        let pixels = format.pixel_info();

        let mut mips = Vec::with_capacity(shape.mipmaps as usize);
        for mip in 0..shape.mipmaps {
            let unit_len = pixels
                .surface_bytes(shape.mip_size(mip))
                .ok_or(LayoutError::DataLayoutTooBig)?;
            mips.push(MipLayout {
                unit_len,
                offset: 0,
            });
        }

        // smallest level first
        let mut len: u64 = 0;
        for mip in (0..shape.mipmaps).rev() {
            let level = &mut mips[mip as usize];
            level.offset = len;
            let mip_len = level
                .unit_len
                .checked_mul(shape.units_in_mip(mip))
                .ok_or(LayoutError::DataLayoutTooBig)?;
            len = len.checked_add(mip_len).ok_or(LayoutError::DataLayoutTooBig)?;
        }
        if offset.checked_add(len).is_none() {
            return Err(LayoutError::DataLayoutTooBig);
        }

        Ok(Self {
            shape,
            format,
            pixels,
            offset,
            len,
            mips,
            low_res: None,
        })
    }

    /// Computes the layout of a file from its header.
    ///
    /// Before 7.3, the low-resolution image directly follows the header and
    /// the high-resolution data follows the low-resolution image. Later
    /// versions locate both through the resource directory.
    pub fn from_header(header: &Header, shape: ImageShape) -> Result<Self, LayoutError> {
        let low_res = match (header.low_res_format, header.low_res_size()) {
            (Some(format), Some(size)) => {
                let len = format
                    .pixel_info()
                    .surface_bytes(size)
                    .ok_or(LayoutError::DataLayoutTooBig)?;
                Some((format, size, len))
            }
            _ => None,
        };
        let low_res_len = low_res.map_or(0, |(_, _, len)| len);

        let header_end = header.header_size as u64;
        let resource_offset = |tag: ResourceTag| {
            if header.version.has_resources() {
                header.resource(tag).map(|entry| entry.data as u64)
            } else {
                None
            }
        };
        let low_res_offset = resource_offset(ResourceTag::LOW_RES_IMAGE).unwrap_or(header_end);
        let high_res_offset = resource_offset(ResourceTag::HIGH_RES_IMAGE)
            .unwrap_or(header_end + low_res_len);

        let mut layout = Self::new(shape, header.format, high_res_offset)?;
        layout.low_res = match low_res {
            Some((format, size, len)) => {
                if low_res_offset.checked_add(len).is_none() {
                    return Err(LayoutError::DataLayoutTooBig);
                }
                Some((format, SurfaceDescriptor::new(size, low_res_offset, len)))
            }
            None => None,
        };
        Ok(layout)
    }

    pub fn shape(&self) -> &ImageShape {
        &self.shape
    }
    pub fn format(&self) -> ImageFormat {
        self.format
    }
    pub fn pixel_info(&self) -> PixelInfo {
        self.pixels
    }

    /// The byte length of one unit of the given mip level.
    pub fn unit_len(&self, mip: u8) -> Option<u64> {
        self.mips.get(mip as usize).map(|level| level.unit_len)
    }

    /// The location of a unit in the file.
    pub fn unit(&self, index: UnitIndex) -> Result<SurfaceDescriptor, LayoutError> {
        if !self.shape.contains(index) {
            return Err(LayoutError::UnitOutOfBounds(index));
        }
        let level = self.mips[index.mip as usize];
        let faces = self.shape.faces as u64;
        let depth = self.shape.mip_depth(index.mip) as u64;
        let position = (index.frame as u64 * faces + index.face as u64) * depth + index.slice as u64;
        // Cannot overflow, the whole level was checked in the constructor.
        let offset = self.offset + level.offset + position * level.unit_len;
        Ok(SurfaceDescriptor::new(
            self.shape.mip_size(index.mip),
            offset,
            level.unit_len,
        ))
    }
    /// The byte range of a unit in the file.
    pub fn unit_at(
        &self,
        mip: u8,
        frame: u16,
        face: u8,
        slice: u16,
    ) -> Result<Range<u64>, LayoutError> {
        self.unit(UnitIndex::new(mip, frame, face, slice))
            .map(|surface| surface.data_range())
    }

    /// Iterates over all units, starting with the full-resolution level.
    pub fn iter_units(&self) -> impl Iterator<Item = (UnitIndex, SurfaceDescriptor)> + '_ {
        self.shape
            .iter_units()
            .filter_map(move |index| Some((index, self.unit(index).ok()?)))
    }

    /// The format and location of the low-resolution thumbnail.
    pub fn low_res(&self) -> Option<(ImageFormat, SurfaceDescriptor)> {
        self.low_res
    }

    /// The minimum length of a file containing all image data.
    pub fn required_file_len(&self) -> u64 {
        let low_res_end = self.low_res.map_or(0, |(_, surface)| surface.data_end());
        self.data_end().max(low_res_end)
    }
}
impl DataRegion for DataLayout {
    fn data_len(&self) -> u64 {
        self.len
    }
    fn data_offset(&self) -> u64 {
        self.offset
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mip_counts() {
        assert_eq!(full_mip_count(1, 1, 1), 1);
        assert_eq!(full_mip_count(4, 4, 1), 3);
        assert_eq!(full_mip_count(256, 16, 1), 9);
        assert_eq!(full_mip_count(4, 4, 32), 6);
    }

    #[test]
    fn smallest_mip_is_stored_first() {
        let shape = ImageShape::new(8, 8).with_full_mip_chain();
        let layout = DataLayout::new(shape, ImageFormat::RGBA8888, 100).unwrap();

        assert_eq!(layout.data_len(), (64 + 16 + 4 + 1) * 4);
        assert_eq!(layout.unit_at(3, 0, 0, 0).unwrap(), 100..104);
        assert_eq!(layout.unit_at(2, 0, 0, 0).unwrap(), 104..120);
        assert_eq!(layout.unit_at(1, 0, 0, 0).unwrap(), 120..184);
        assert_eq!(layout.unit_at(0, 0, 0, 0).unwrap(), 184..440);
    }

    #[test]
    fn frames_faces_and_slices_nest_within_a_mip() {
        let shape = ImageShape {
            frames: 2,
            faces: 6,
            ..ImageShape::new(4, 4)
        };
        let layout = DataLayout::new(shape, ImageFormat::DXT1, 0).unwrap();
        assert_eq!(layout.unit_at(0, 0, 1, 0).unwrap(), 8..16);
        assert_eq!(layout.unit_at(0, 1, 0, 0).unwrap(), 48..56);
        assert_eq!(layout.unit_at(0, 1, 5, 0).unwrap(), 88..96);
        assert!(matches!(
            layout.unit_at(0, 2, 0, 0),
            Err(LayoutError::UnitOutOfBounds(_))
        ));
    }

    #[test]
    fn volume_depth_halves_per_mip() {
        let shape = ImageShape {
            depth: 4,
            ..ImageShape::new(4, 4)
        }
        .with_full_mip_chain();
        assert_eq!(shape.mipmaps, 3);
        let layout = DataLayout::new(shape, ImageFormat::I8, 0).unwrap();
        // mip 2: 1x1x1, mip 1: 2x2x2, mip 0: 4x4x4
        assert_eq!(layout.data_len(), 1 + 8 + 64);
        assert_eq!(layout.unit_at(1, 0, 0, 1).unwrap(), 5..9);
        assert!(layout.unit_at(1, 0, 0, 2).is_err());
        assert_eq!(layout.unit_at(0, 0, 0, 3).unwrap(), 57..73);
    }

    #[test]
    fn non_power_of_two_suggestion() {
        let error = validate_dimensions(100, 256).unwrap_err();
        match error {
            LayoutError::DimensionNotPowerOfTwo {
                width,
                height,
                suggestion,
            } => {
                assert_eq!((width, height), (100, 256));
                assert_eq!(suggestion.width, (64, 128));
                assert_eq!(suggestion.height, (256, 256));
                assert_eq!(suggestion.to_string(), "64x256 and 128x256");
            }
            _ => panic!("unexpected error {error:?}"),
        }
    }

    #[test]
    fn layer_use_counts() {
        assert_eq!(LayerUse::Single.counts(1), Some((1, 1, 1)));
        assert_eq!(LayerUse::Single.counts(2), None);
        assert_eq!(LayerUse::EnvMap.counts(6), Some((1, 6, 1)));
        assert_eq!(LayerUse::Volume.counts(0), None);
        assert_eq!(LayerUse::Animation.unit(3), UnitIndex::layer(3, 0, 0));
    }
}
