use std::borrow::Cow;
use std::collections::BTreeMap;

use glam::DVec3;

use crate::decode::check_convertible;
use crate::encode::encode_surface;
use crate::error::try_alloc;
use crate::layout::DataRegion;
use crate::mip::{downsample, downsample_volume, thumbnail_size};
use crate::{
    full_mip_count, validate_dimensions, DataLayout, DecodedImage, Header, HeaderError,
    ImageFormat, ImageShape, LayoutError, LodControl, ResourceData, ResourceEntry, ResourceFlags,
    ResourceTag, Resources, Size, Surface, TextureFlags, TextureOptions, UnitIndex, Version,
    VtfDecoder, VtfError,
};

/// The format of the low-resolution thumbnail written by the encoder.
pub const LOW_RES_FORMAT: ImageFormat = ImageFormat::DXT1;

/// Flags the encoder sets itself. They are ignored in
/// [`EncodeOptions::extra_flags`].
const MANAGED_FLAGS: TextureFlags = TextureOptions::FLAGS
    .union(TextureFlags::ENVMAP)
    .union(TextureFlags::ONEBITALPHA)
    .union(TextureFlags::EIGHTBITALPHA);

/// Options for writing VTF files.
///
/// ## See also
///
/// - [`encode`](crate::encode)
/// - [`EncodeOptions::from_decoder`]
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub struct EncodeOptions {
    /// The version of the written file.
    ///
    /// Volume textures require 7.2 or later, resources (including LOD
    /// control) require 7.3 or later.
    ///
    /// Default: [`Version::V7_2`]
    pub version: Version,
    /// The pixel format of the high-resolution image data.
    ///
    /// Default: [`ImageFormat::RGBA8888`]
    pub format: ImageFormat,
    /// The texture flags with a named option.
    ///
    /// Default: `TextureOptions::default()`
    pub options: TextureOptions,
    /// Additional flags to write as is.
    ///
    /// Flags covered by [`TextureOptions`] and flags the encoder derives from
    /// the image (`ENVMAP`, `ONEBITALPHA`, `EIGHTBITALPHA`) are ignored.
    ///
    /// Default: `TextureFlags::empty()`
    pub extra_flags: TextureFlags,
    /// Whether to write a full mip chain down to 1x1.
    ///
    /// Mip levels the image already holds are written as they are, all other
    /// levels are generated with a box filter. This does not change the
    /// `NOMIP` flag, see [`TextureOptions::no_mip`].
    ///
    /// Default: `true`
    pub mipmaps: bool,
    /// Whether to write a low-resolution DXT1 thumbnail.
    ///
    /// Default: `true`
    pub thumbnail: bool,
    /// The LOD control resource. Only written for 7.3 and later.
    ///
    /// If set, this replaces any LOD control in [`Self::resources`].
    ///
    /// Default: `None`
    pub lod_control: Option<LodControl>,
    /// Additional resources, written in tag order. Only written for 7.3 and
    /// later.
    ///
    /// Default: `Resources::new()`
    pub resources: Resources,
    /// The reflectivity vector of the header.
    ///
    /// If `None`, the reflectivity is computed as the average linear color of
    /// all full-resolution surfaces.
    ///
    /// Default: `None`
    pub reflectivity: Option<[f32; 3]>,
    /// Default: `1.0`
    pub bumpmap_scale: f32,
    /// The first frame of an animation.
    ///
    /// Sphere maps (7 faces) always write `0xFFFF`.
    ///
    /// Default: `0`
    pub first_frame: u16,
    /// Whether to use rayon to encode surfaces in parallel.
    ///
    /// Only has an effect if the `rayon` feature is enabled.
    ///
    /// Default: `true`
    pub parallel: bool,
}
impl Default for EncodeOptions {
    fn default() -> Self {
        Self {
            version: Version::V7_2,
            format: ImageFormat::RGBA8888,
            options: TextureOptions::default(),
            extra_flags: TextureFlags::empty(),
            mipmaps: true,
            thumbnail: true,
            lod_control: None,
            resources: Resources::new(),
            reflectivity: None,
            bumpmap_scale: 1.0,
            first_frame: 0,
            parallel: true,
        }
    }
}
impl EncodeOptions {
    /// The options that write a texture back the way it was read.
    ///
    /// Version, format, flags, mipmaps, thumbnail, resources, and the header
    /// scalars are taken from the decoded file. The LOD control stays part of
    /// [`Self::resources`] and [`Self::lod_control`] is left `None`, so the
    /// raw entry is written back unchanged. The reflectivity is kept as
    /// is, so set [`Self::reflectivity`] to `None` if the pixels change.
    pub fn from_decoder(decoder: &VtfDecoder<'_>) -> Self {
        let header = decoder.header();
        Self {
            version: header.version,
            format: header.format,
            options: TextureOptions::from_flags(header.flags),
            extra_flags: header.flags.difference(MANAGED_FLAGS),
            mipmaps: decoder.shape().mipmaps > 1,
            thumbnail: header.low_res_size().is_some(),
            resources: decoder.resources().clone(),
            reflectivity: Some(header.reflectivity),
            bumpmap_scale: header.bumpmap_scale,
            first_frame: if header.faces() == 7 {
                0
            } else {
                header.first_frame
            },
            ..Self::default()
        }
    }
}

/// The surface of every unit of the written file, borrowed from the input
/// where it has one.
type Surfaces<'a> = BTreeMap<UnitIndex, Cow<'a, Surface>>;

/// A resource in the order it is written to the file.
enum Payload<'a> {
    Image(u64),
    Inline(ResourceFlags, u32),
    Chunk(ResourceFlags, &'a [u8]),
}

/// Writes a complete VTF file.
pub(crate) fn write_vtf(image: &DecodedImage, options: &EncodeOptions) -> Result<Vec<u8>, VtfError> {
    let version = options.version;
    if !version.is_supported() {
        return Err(HeaderError::UnsupportedVersion {
            major: version.major,
            minor: version.minor,
        }
        .into());
    }
    check_convertible(options.format)?;

    let input = image.shape();
    let shape = ImageShape {
        mipmaps: if options.mipmaps {
            full_mip_count(input.width, input.height, input.depth)
        } else {
            1
        },
        ..input
    };
    check_shape(&shape, version)?;

    log::debug!(
        "encoding VTF {}: {}x{}x{} {:?}, {} mipmaps, {} frames, {} faces",
        version,
        shape.width,
        shape.height,
        shape.depth,
        options.format,
        shape.mipmaps,
        shape.frames,
        shape.faces
    );

    let surfaces = complete_mip_chain(image, &shape)?;

    let low_res = if options.thumbnail {
        Some(low_res_image(&surfaces, &shape)?)
    } else {
        None
    };
    let low_res_len = low_res.as_ref().map_or(0, |(_, data)| data.len() as u64);
    let high_res_len = DataLayout::new(shape, options.format, 0)?.data_len();

    let mut resources = if version.has_resources() {
        options.resources.clone()
    } else {
        Resources::new()
    };
    if let Some(lod) = options.lod_control {
        if version.has_resources() {
            resources.set_lod_control(Some(lod));
        }
    }
    if !version.has_resources() && (!options.resources.is_empty() || options.lod_control.is_some()) {
        log::warn!("version {} has no resource directory, resources are not written", version);
    }

    // file offsets of every part
    let mut directory = Vec::new();
    let mut chunks = Vec::new();
    let (header_size, low_res_offset, high_res_offset, file_len) = if version.has_resources() {
        let mut payloads: BTreeMap<ResourceTag, Payload> = BTreeMap::new();
        if low_res.is_some() {
            payloads.insert(ResourceTag::LOW_RES_IMAGE, Payload::Image(low_res_len));
        }
        payloads.insert(ResourceTag::HIGH_RES_IMAGE, Payload::Image(high_res_len));
        for (tag, data) in resources.iter() {
            let flags = resources.flags(tag).unwrap_or(ResourceFlags::empty());
            let payload = match data {
                ResourceData::Inline(value) => Payload::Inline(flags, *value),
                ResourceData::Chunk(bytes) => Payload::Chunk(flags, bytes),
            };
            payloads.insert(tag, payload);
        }

        let count = payloads.len() as u32;
        if count > Header::MAX_RESOURCES {
            return Err(HeaderError::TooManyResources(count).into());
        }
        let header_size = version.header_size(count);

        let mut offset = header_size as u64;
        let mut low_res_offset = offset;
        let mut high_res_offset = offset;
        for (tag, payload) in payloads {
            let position = u32::try_from(offset).map_err(|_| LayoutError::DataLayoutTooBig)?;
            let (flags, data) = match payload {
                Payload::Image(len) => {
                    if tag == ResourceTag::LOW_RES_IMAGE {
                        low_res_offset = offset;
                    } else {
                        high_res_offset = offset;
                    }
                    offset += len;
                    (ResourceFlags::empty(), position)
                }
                Payload::Inline(flags, value) => (flags | ResourceFlags::NO_DATA_CHUNK, value),
                Payload::Chunk(flags, bytes) => {
                    chunks.push((offset, bytes));
                    offset += 4 + bytes.len() as u64;
                    (flags - ResourceFlags::NO_DATA_CHUNK, position)
                }
            };
            directory.push(ResourceEntry { tag, flags, data });
        }
        (header_size, low_res_offset, high_res_offset, offset)
    } else {
        let header_size = version.header_size(0);
        let low_res_offset = header_size as u64;
        let high_res_offset = low_res_offset + low_res_len;
        (header_size, low_res_offset, high_res_offset, high_res_offset + high_res_len)
    };
    let layout = DataLayout::new(shape, options.format, high_res_offset)?;

    let reflectivity = match options.reflectivity {
        Some(reflectivity) => reflectivity,
        None => average_reflectivity(
            surfaces
                .iter()
                .filter(|(index, _)| index.mip == 0)
                .map(|(_, surface)| &**surface),
        ),
    };

    let descriptor = options.format.descriptor();
    let mut flags = options.options.to_flags() | options.extra_flags.difference(MANAGED_FLAGS);
    flags.set(TextureFlags::ENVMAP, shape.faces > 1);
    flags.set(TextureFlags::ONEBITALPHA, descriptor.alpha_bits == 1);
    flags.set(TextureFlags::EIGHTBITALPHA, descriptor.alpha_bits > 1);

    let first_frame = match shape.faces {
        7 => 0xFFFF,
        // would turn a cube map into a sphere map
        6 if options.first_frame == 0xFFFF => 0,
        _ => options.first_frame,
    };

    let header = Header {
        version,
        header_size,
        width: shape.width as u16,
        height: shape.height as u16,
        flags,
        frames: shape.frames,
        first_frame,
        reflectivity,
        bumpmap_scale: options.bumpmap_scale,
        format: options.format,
        mipmap_count: shape.mipmaps,
        low_res_format: low_res.as_ref().map(|_| LOW_RES_FORMAT),
        low_res_width: low_res.as_ref().map_or(0, |(size, _)| size.width as u8),
        low_res_height: low_res.as_ref().map_or(0, |(size, _)| size.height as u8),
        depth: shape.depth,
        resources: directory,
    };

    let units: Vec<(UnitIndex, &Surface)> = surfaces
        .iter()
        .map(|(index, surface)| (*index, &**surface))
        .collect();
    let encoded = encode_units(&units, options.format, options.parallel)?;

    let file_len = usize::try_from(file_len).map_err(|_| VtfError::OutOfMemory(usize::MAX))?;
    let mut file = try_alloc(file_len)?;
    let header_bytes = header.to_bytes();
    file[..header_bytes.len()].copy_from_slice(&header_bytes);
    if let Some((_, data)) = &low_res {
        copy_at(&mut file, low_res_offset, data);
    }
    for (offset, bytes) in chunks {
        copy_at(&mut file, offset, &(bytes.len() as u32).to_le_bytes());
        copy_at(&mut file, offset + 4, bytes);
    }
    for ((index, _), data) in units.iter().zip(encoded) {
        let surface = layout.unit(*index)?;
        copy_at(&mut file, surface.data_offset(), &data);
    }

    Ok(file)
}

fn copy_at(file: &mut [u8], offset: u64, data: &[u8]) {
    let start = offset as usize;
    file[start..start + data.len()].copy_from_slice(data);
}

/// Checks that the texture can be stored in a file of the given version.
fn check_shape(shape: &ImageShape, version: Version) -> Result<(), LayoutError> {
    validate_dimensions(shape.width, shape.height)?;
    if shape.width > u16::MAX as u32 || shape.height > u16::MAX as u32 {
        return Err(LayoutError::DimensionTooLarge {
            width: shape.width,
            height: shape.height,
        });
    }
    let faces_supported = match shape.faces {
        1 | 6 => true,
        7 => version.has_sphere_map(),
        _ => false,
    };
    if !faces_supported {
        return Err(LayoutError::InvalidFaceCount {
            faces: shape.faces as u32,
            minor: version.minor,
        });
    }
    if shape.depth > 1 && !version.has_depth() {
        return Err(LayoutError::DepthNotSupported {
            depth: shape.depth,
            minor: version.minor,
        });
    }
    shape.validate()
}

/// Collects the surfaces of all units of `shape`. Surfaces the image does not
/// have are generated from the level above.
fn complete_mip_chain<'a>(image: &'a DecodedImage, shape: &ImageShape) -> Result<Surfaces<'a>, VtfError> {
    let mut surfaces = Surfaces::new();
    for index in shape.iter_mip(0) {
        let surface = image.get(index).ok_or(LayoutError::MissingSurface(index))?;
        surfaces.insert(index, Cow::Borrowed(surface));
    }

    for mip in 1..shape.mipmaps {
        for frame in 0..shape.frames {
            for face in 0..shape.faces {
                let depth = shape.mip_depth(mip);
                let complete = (0..depth)
                    .all(|slice| image.get(UnitIndex::new(mip, frame, face, slice)).is_some());

                let generated = if complete {
                    Vec::new()
                } else {
                    let previous = (0..shape.mip_depth(mip - 1))
                        .map(|slice| {
                            let index = UnitIndex::new(mip - 1, frame, face, slice);
                            surfaces
                                .get(&index)
                                .map(|surface| &**surface)
                                .ok_or(LayoutError::MissingSurface(index))
                        })
                        .collect::<Result<Vec<&Surface>, _>>()?;
                    downsample_volume(&previous)?
                };

                let mut generated = generated.into_iter();
                for slice in 0..depth {
                    let index = UnitIndex::new(mip, frame, face, slice);
                    let next = generated.next();
                    let surface = match image.get(index) {
                        Some(surface) => Cow::Borrowed(surface),
                        None => Cow::Owned(next.ok_or(LayoutError::MissingSurface(index))?),
                    };
                    surfaces.insert(index, surface);
                }
            }
        }
    }
    Ok(surfaces)
}

/// Creates the DXT1 thumbnail from the first frame, face, and slice.
fn low_res_image(surfaces: &Surfaces, shape: &ImageShape) -> Result<(Size, Vec<u8>), VtfError> {
    let size = thumbnail_size(shape.size());
    let mut level = 0;
    while shape.mip_size(level) != size {
        level += 1;
    }

    let available = level.min(shape.mipmaps - 1);
    let index = UnitIndex::new(available, 0, 0, 0);
    let mut thumbnail: Cow<Surface> = Cow::Borrowed(
        surfaces
            .get(&index)
            .ok_or(LayoutError::MissingSurface(index))?,
    );
    for _ in available..level {
        thumbnail = Cow::Owned(downsample(&thumbnail)?);
    }

    let data = encode_surface(thumbnail.data(), LOW_RES_FORMAT, size)?;
    Ok((size, data))
}

/// The average color of all pixels after gamma 2.2 linearization.
fn average_reflectivity<'a>(surfaces: impl Iterator<Item = &'a Surface>) -> [f32; 3] {
    let linear: [f64; 256] = std::array::from_fn(|v| (v as f64 / 255.0).powf(2.2));

    let mut sum = DVec3::ZERO;
    let mut count: u64 = 0;
    for surface in surfaces {
        for [r, g, b, _] in surface.pixels() {
            sum += DVec3::new(linear[r as usize], linear[g as usize], linear[b as usize]);
            count += 1;
        }
    }
    if count == 0 {
        return [0.0; 3];
    }
    (sum / count as f64).as_vec3().to_array()
}

fn encode_unit(index: UnitIndex, surface: &Surface, format: ImageFormat) -> Result<Vec<u8>, VtfError> {
    log::trace!(
        "encoding {:?} ({}x{}) as {:?}",
        index,
        surface.width(),
        surface.height(),
        format
    );
    encode_surface(surface.data(), format, surface.size())
}

#[cfg_attr(not(feature = "rayon"), allow(unused_variables))]
fn encode_units(
    units: &[(UnitIndex, &Surface)],
    format: ImageFormat,
    parallel: bool,
) -> Result<Vec<Vec<u8>>, VtfError> {
    #[cfg(feature = "rayon")]
    if parallel && units.len() > 1 {
        use rayon::iter::{IntoParallelRefIterator, ParallelIterator};

        return units
            .par_iter()
            .map(|(index, surface)| encode_unit(*index, surface, format))
            .collect();
    }

    units
        .iter()
        .map(|(index, surface)| encode_unit(*index, surface, format))
        .collect()
}
