#![forbid(unsafe_code)]

mod decode;
mod encode;
mod error;
mod flags;
mod format;
mod header;
#[cfg(feature = "image")]
mod image_integration;
mod layout;
mod mip;
mod pixel;
mod resources;
mod surface;
mod util;

pub use decode::decode_to_rgba;
pub use encode::{encode_from_rgba, EncodeOptions, LOW_RES_FORMAT};
pub use error::*;
pub use flags::*;
pub use format::*;
pub use header::*;
pub use layout::*;
pub use mip::*;
pub use pixel::*;
pub use resources::*;
pub use surface::*;

use decode::decode_surface;

/// Additional options for the VTF decoder specifying how strictly to read the
/// header and how much memory decoding may use.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct Options {
    /// Whether to accept files that violate the format's constraints.
    ///
    /// VTF textures must have power-of-two sides and at most as many mipmaps
    /// as halving the largest side down to 1 takes. By default, the decoder
    /// rejects files that break these rules.
    ///
    /// If this is set to `true`, non-power-of-two sizes are accepted, invalid
    /// mipmap counts are clamped, and resources that point outside of the file
    /// are skipped. Every repair is logged as a warning.
    ///
    /// Defaults to `false`.
    pub permissive: bool,

    /// The maximum number of bytes of RGBA8888 output a single decode call may
    /// allocate.
    ///
    /// The size of the decoded data is defined by the file, so a malicious or
    /// corrupted file can declare a huge texture with very little data. This
    /// limit is checked before any pixels are decoded and exceeding it returns
    /// [`VtfError::OutOfMemory`].
    ///
    /// To disable this limit, set this to `usize::MAX`.
    ///
    /// Defaults to 1 GiB.
    pub memory_limit: usize,
}
impl Default for Options {
    fn default() -> Self {
        Self {
            permissive: false,
            memory_limit: 1 << 30,
        }
    }
}

/// A decoder for VTF files held in memory.
///
/// Creating a decoder reads the header and the resources and computes the
/// layout of the image data. Pixels are only decoded when a unit is requested,
/// so reading a single mip level of a large texture is cheap.
pub struct VtfDecoder<'a> {
    data: &'a [u8],
    header: Header,
    layout: DataLayout,
    resources: Resources,
    options: Options,
}

impl<'a> VtfDecoder<'a> {
    /// Creates a new decoder for the given file.
    ///
    /// This is equivalent to calling `VtfDecoder::new_with(data, Options::default())`.
    /// See [`Self::new_with`] for more details.
    pub fn new(data: &'a [u8]) -> Result<Self, VtfError> {
        Self::new_with(data, Options::default())
    }
    /// Creates a new decoder with the given options.
    ///
    /// Fails if the header is invalid, the texture breaks the format's
    /// constraints (see [`Options::permissive`]), or the file is shorter than
    /// the image data it describes.
    pub fn new_with(data: &'a [u8], options: Options) -> Result<Self, VtfError> {
        let header = Header::parse(data)?;
        let shape = ImageShape::from_header(&header, options.permissive)?;
        let layout = DataLayout::from_header(&header, shape)?;

        let required = layout.required_file_len();
        if (data.len() as u64) < required {
            return Err(LayoutError::TruncatedData {
                required,
                available: data.len() as u64,
            }
            .into());
        }

        let resources = Resources::read(&header, data, options.permissive)?;

        Ok(Self {
            data,
            header,
            layout,
            resources,
            options,
        })
    }

    pub fn header(&self) -> &Header {
        &self.header
    }
    pub fn format(&self) -> ImageFormat {
        self.header.format
    }
    pub fn shape(&self) -> ImageShape {
        *self.layout.shape()
    }
    pub fn layout(&self) -> &DataLayout {
        &self.layout
    }
    /// The non-image resources of the file. Empty before 7.3.
    pub fn resources(&self) -> &Resources {
        &self.resources
    }

    /// The encoded bytes of a unit.
    pub fn read_unit_raw(&self, index: UnitIndex) -> Result<&'a [u8], VtfError> {
        let surface = self.layout.unit(index)?;
        Ok(self.slice(&surface)?)
    }

    /// Decodes a single unit into RGBA8888.
    pub fn read_unit(&self, index: UnitIndex) -> Result<Surface, VtfError> {
        let raw = self.read_unit_raw(index)?;
        let size = self.layout.shape().mip_size(index.mip);
        self.check_memory(size.pixels().saturating_mul(4))?;

        log::trace!(
            "decoding {:?} ({}x{}) from {:?}",
            index,
            size.width,
            size.height,
            self.format()
        );
        decode_surface(raw, self.format(), size)
    }

    /// Decodes the low-resolution thumbnail. `None` if the file has none.
    pub fn read_low_res(&self) -> Result<Option<Surface>, VtfError> {
        let Some((format, surface)) = self.layout.low_res() else {
            return Ok(None);
        };
        let raw = self.slice(&surface)?;
        decode_surface(raw, format, surface.size()).map(Some)
    }

    /// Decodes every unit of the texture.
    ///
    /// Fails with [`VtfError::OutOfMemory`] before decoding anything if the
    /// output would exceed [`Options::memory_limit`].
    pub fn decode_all(&self) -> Result<DecodedImage, VtfError> {
        let shape = self.shape();
        let total = (0..shape.mipmaps).fold(0_u64, |total, mip| {
            let unit = shape.mip_size(mip).pixels().saturating_mul(4);
            total.saturating_add(unit.saturating_mul(shape.units_in_mip(mip)))
        });
        self.check_memory(total)?;

        let mut image = DecodedImage::new(shape)?;
        for index in shape.iter_units() {
            image.insert(index, self.read_unit(index)?)?;
        }
        Ok(image)
    }

    fn check_memory(&self, bytes: u64) -> Result<(), VtfError> {
        if bytes > self.options.memory_limit as u64 {
            return Err(VtfError::OutOfMemory(
                usize::try_from(bytes).unwrap_or(usize::MAX),
            ));
        }
        Ok(())
    }

    fn slice(&self, surface: &SurfaceDescriptor) -> Result<&'a [u8], LayoutError> {
        util::sub_slice(self.data, surface.data_offset(), surface.data_len()).ok_or(
            LayoutError::TruncatedData {
                required: surface.data_end(),
                available: self.data.len() as u64,
            },
        )
    }
}

/// Decodes every unit of a VTF file.
///
/// This is equivalent to `VtfDecoder::new(bytes)?.decode_all()`.
pub fn decode(bytes: &[u8]) -> Result<DecodedImage, VtfError> {
    VtfDecoder::new(bytes)?.decode_all()
}

/// Writes a texture as a VTF file.
///
/// The image must hold the full-resolution surface of every frame, face, and
/// slice of its shape. Missing mip levels are generated if
/// [`EncodeOptions::mipmaps`] is set. The output only depends on the inputs.
///
/// ## Errors
///
/// - [`LayoutError::DimensionNotPowerOfTwo`] if the sides of the texture are
///   not powers of two, before anything is encoded.
/// - [`LayoutError::MissingSurface`] if a full-resolution surface is missing.
/// - [`FormatError::UnsupportedFormat`] for palette and depth formats.
/// - Other [`LayoutError`]s if the shape cannot be stored in the chosen
///   version.
pub fn encode(image: &DecodedImage, options: &EncodeOptions) -> Result<Vec<u8>, VtfError> {
    encode::write_vtf(image, options)
}

/// A small preview of a texture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Thumbnail {
    /// The decoded mip level.
    pub surface: Surface,
    /// The mip level the preview was decoded from.
    pub mip: u8,
    /// The size of the full-resolution texture.
    pub full_size: Size,
    /// Whether the pixel format of the texture has an alpha channel.
    pub has_alpha: bool,
}
impl Thumbnail {
    /// Makes every pixel opaque.
    pub fn strip_alpha(&mut self) {
        for pixel in self.surface.data_mut().chunks_exact_mut(4) {
            pixel[3] = u8::MAX;
        }
    }
}

/// Decodes a single preview surface of a VTF file.
///
/// The preview shows the middle frame, face, and slice of the texture. Its mip
/// level is the first one whose width is at most `max_size`, or the smallest
/// level of the file if no level is small enough. Only that one unit is
/// decoded.
pub fn probe_thumbnail(bytes: &[u8], max_size: u32) -> Result<Thumbnail, VtfError> {
    let decoder = VtfDecoder::new(bytes)?;
    let shape = decoder.shape();

    let mip = (0..shape.mipmaps)
        .find(|&mip| shape.mip_size(mip).width <= max_size)
        .unwrap_or(shape.mipmaps - 1);
    let index = UnitIndex::new(
        mip,
        shape.frames / 2,
        shape.faces / 2,
        shape.mip_depth(mip) / 2,
    );

    Ok(Thumbnail {
        surface: decoder.read_unit(index)?,
        mip,
        full_size: shape.size(),
        has_alpha: decoder.format().has_alpha(),
    })
}
