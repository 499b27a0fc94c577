use bitflags::bitflags;
use zerocopy::byteorder::little_endian::{F32, I32, U16, U32};
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned};

use crate::{HeaderError, ImageFormat, ResourceTag, Size};

/// The version of a VTF file.
///
/// Only major version 7 exists. Minor versions 0 to 5 are supported.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Version {
    pub major: u32,
    pub minor: u32,
}
impl Version {
    pub const V7_0: Self = Self::new(7, 0);
    pub const V7_1: Self = Self::new(7, 1);
    pub const V7_2: Self = Self::new(7, 2);
    pub const V7_3: Self = Self::new(7, 3);
    pub const V7_4: Self = Self::new(7, 4);
    pub const V7_5: Self = Self::new(7, 5);

    pub const fn new(major: u32, minor: u32) -> Self {
        Self { major, minor }
    }

    pub const fn is_supported(&self) -> bool {
        self.major == 7 && self.minor <= 5
    }
    /// Whether the header stores a depth (slice count). Since 7.2.
    pub const fn has_depth(&self) -> bool {
        self.minor >= 2
    }
    /// Whether the header is followed by a resource directory. Since 7.3.
    pub const fn has_resources(&self) -> bool {
        self.minor >= 3
    }
    /// Whether a first frame of `0xFFFF` marks a spherical environment map.
    /// Sphere maps were removed in 7.5.
    pub const fn has_sphere_map(&self) -> bool {
        self.minor < 5
    }

    /// The size of a header of this version with the given number of
    /// resource entries, including alignment padding.
    pub const fn header_size(&self, resources: u32) -> u32 {
        match self.minor {
            0 | 1 => 64,
            2 => 80,
            _ => 80 + resources * ResourceEntry::SIZE,
        }
    }
}
impl Default for Version {
    fn default() -> Self {
        Self::V7_2
    }
}
impl std::fmt::Display for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

bitflags! {
    /// The flags field of a VTF header.
    ///
    /// Bits without a name are retained when reading and written back as is.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    pub struct TextureFlags: u32 {
        const POINTSAMPLE = 0x1;
        const TRILINEAR = 0x2;
        const CLAMPS = 0x4;
        const CLAMPT = 0x8;
        const ANISOTROPIC = 0x10;
        const HINT_DXT5 = 0x20;
        /// Deprecated. Shares its bit with `SRGB` in later engine branches.
        const PWL_CORRECTED = 0x40;
        const NORMAL = 0x80;
        const NOMIP = 0x100;
        const NOLOD = 0x200;
        const ALL_MIPS = 0x400;
        const PROCEDURAL = 0x800;
        /// Set by the encoder for formats with 1-bit alpha.
        const ONEBITALPHA = 0x1000;
        /// Set by the encoder for formats with more than 1 bit of alpha.
        const EIGHTBITALPHA = 0x2000;
        /// The texture is a cube map (6 faces) or sphere map (7 faces).
        const ENVMAP = 0x4000;
        const RENDERTARGET = 0x8000;
        const DEPTHRENDERTARGET = 0x10000;
        const NODEBUGOVERRIDE = 0x20000;
        const SINGLECOPY = 0x40000;
        const PRE_SRGB = 0x80000;
        const NODEPTHBUFFER = 0x800000;
        const CLAMPU = 0x2000000;
        const VERTEXTEXTURE = 0x4000000;
        /// Self-shadowed bump map.
        const SSBUMP = 0x8000000;
        const BORDER = 0x20000000;

        const _ = !0;
    }

    /// The flags byte of a resource directory entry.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    pub struct ResourceFlags: u8 {
        /// The entry's value is the resource data itself, not an offset.
        const NO_DATA_CHUNK = 0x02;

        const _ = !0;
    }
}

/// An entry of the resource directory of a 7.3+ header.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ResourceEntry {
    pub tag: ResourceTag,
    pub flags: ResourceFlags,
    /// A file offset, or inline data if [`ResourceFlags::NO_DATA_CHUNK`] is set.
    pub data: u32,
}
impl ResourceEntry {
    pub const SIZE: u32 = 8;

    pub fn is_inline(&self) -> bool {
        self.flags.contains(ResourceFlags::NO_DATA_CHUNK)
    }
}

/// The header of a VTF file.
#[derive(Clone, Debug, PartialEq)]
pub struct Header {
    pub version: Version,
    /// The header size declared by the file. Image data and resources start
    /// at or after this offset.
    pub header_size: u32,
    pub width: u16,
    pub height: u16,
    pub flags: TextureFlags,
    pub frames: u16,
    /// The first frame of an animation, or `0xFFFF` for a sphere map.
    pub first_frame: u16,
    pub reflectivity: [f32; 3],
    pub bumpmap_scale: f32,
    pub format: ImageFormat,
    pub mipmap_count: u8,
    /// The format of the low-resolution thumbnail. `None` if the file has no
    /// thumbnail.
    pub low_res_format: Option<ImageFormat>,
    pub low_res_width: u8,
    pub low_res_height: u8,
    /// The number of slices of a volume texture. Always 1 before 7.2.
    pub depth: u16,
    /// The resource directory. Always empty before 7.3.
    pub resources: Vec<ResourceEntry>,
}

impl Header {
    pub const MAGIC: [u8; 4] = *b"VTF\0";
    /// The maximum number of resource directory entries.
    pub const MAX_RESOURCES: u32 = 32;

    /// Creates the header of a single 2D texture without mipmaps.
    pub fn new(version: Version, width: u16, height: u16, format: ImageFormat) -> Self {
        Self {
            version,
            header_size: version.header_size(0),
            width,
            height,
            flags: TextureFlags::empty(),
            frames: 1,
            first_frame: 0,
            reflectivity: [0.0; 3],
            bumpmap_scale: 1.0,
            format,
            mipmap_count: 1,
            low_res_format: None,
            low_res_width: 0,
            low_res_height: 0,
            depth: 1,
            resources: Vec::new(),
        }
    }

    pub fn size(&self) -> Size {
        Size::new(self.width as u32, self.height as u32)
    }

    /// The number of faces, derived from the flags.
    ///
    /// Environment maps have 6 faces, or 7 if they are sphere maps (only
    /// before 7.5). All other textures have 1 face.
    pub fn faces(&self) -> u8 {
        if !self.flags.contains(TextureFlags::ENVMAP) {
            1
        } else if self.version.has_sphere_map() && self.first_frame == 0xFFFF {
            7
        } else {
            6
        }
    }

    /// The size of the low-resolution thumbnail, if the file has one.
    pub fn low_res_size(&self) -> Option<Size> {
        self.low_res_format?;
        if self.low_res_width == 0 || self.low_res_height == 0 {
            return None;
        }
        Some(Size::new(
            self.low_res_width as u32,
            self.low_res_height as u32,
        ))
    }

    /// Returns the resource entry with the given tag.
    pub fn resource(&self, tag: ResourceTag) -> Option<&ResourceEntry> {
        self.resources.iter().find(|e| e.tag == tag)
    }

    /// The number of bytes required to read the header of a file whose first
    /// 16 bytes are given. `None` if `bytes` is too short to tell.
    fn required_len(bytes: &[u8]) -> Option<usize> {
        crate::util::read_u32_le(bytes, 12).map(|size| size as usize)
    }

    /// Parses the header at the start of a VTF file.
    ///
    /// The slice may contain the rest of the file as well. Only the header
    /// and the resource directory are read.
    pub fn parse(bytes: &[u8]) -> Result<Self, HeaderError> {
        const PREFIX: usize = 16;
        if bytes.len() < 4 {
            return Err(HeaderError::TruncatedHeader {
                required: PREFIX,
                available: bytes.len(),
            });
        }
        let signature = [bytes[0], bytes[1], bytes[2], bytes[3]];
        if signature != Self::MAGIC {
            return Err(HeaderError::BadSignature(signature));
        }
        let header_size = Self::required_len(bytes).ok_or(HeaderError::TruncatedHeader {
            required: PREFIX,
            available: bytes.len(),
        })?;

        let mut buffer = [0_u8; RawHeader::SIZE];
        let copied = bytes.len().min(RawHeader::SIZE);
        buffer[..copied].copy_from_slice(&bytes[..copied]);
        let raw: RawHeader = zerocopy::transmute!(buffer);

        let version = Version::new(raw.major.get(), raw.minor.get());
        if !version.is_supported() {
            return Err(HeaderError::UnsupportedVersion {
                major: version.major,
                minor: version.minor,
            });
        }

        let minimum = version.header_size(0);
        if (header_size as u64) < minimum as u64 {
            return Err(HeaderError::InvalidHeaderSize {
                size: header_size as u32,
                minor: version.minor,
                minimum,
            });
        }
        if bytes.len() < header_size {
            return Err(HeaderError::TruncatedHeader {
                required: header_size,
                available: bytes.len(),
            });
        }

        let depth = if version.has_depth() {
            raw.depth.get()
        } else {
            1
        };

        let mut resources = Vec::new();
        if version.has_resources() {
            let count = raw.resource_count.get();
            if count > Self::MAX_RESOURCES {
                return Err(HeaderError::TooManyResources(count));
            }
            let directory_end = version.header_size(count) as usize;
            let directory = bytes.get(RawHeader::SIZE..directory_end).ok_or(
                HeaderError::TruncatedHeader {
                    required: directory_end,
                    available: bytes.len(),
                },
            )?;
            let entries = <[RawResourceEntry]>::ref_from_bytes(directory).map_err(|_| {
                HeaderError::TruncatedHeader {
                    required: directory_end,
                    available: bytes.len(),
                }
            })?;
            resources.extend(entries.iter().map(|entry| ResourceEntry {
                tag: ResourceTag(entry.tag),
                flags: ResourceFlags::from_bits_retain(entry.flags),
                data: entry.data.get(),
            }));
        }

        let format = ImageFormat::from_id(raw.format.get())?;
        let low_res_format = match raw.low_res_format.get() {
            ImageFormat::NONE_ID => None,
            id => Some(ImageFormat::from_id(id)?),
        };

        let header = Self {
            version,
            header_size: header_size as u32,
            width: raw.width.get(),
            height: raw.height.get(),
            flags: TextureFlags::from_bits_retain(raw.flags.get()),
            frames: raw.frames.get(),
            first_frame: raw.first_frame.get(),
            reflectivity: raw.reflectivity.map(|r| r.get()),
            bumpmap_scale: raw.bumpmap_scale.get(),
            format,
            mipmap_count: raw.mipmap_count,
            low_res_format,
            low_res_width: raw.low_res_width,
            low_res_height: raw.low_res_height,
            depth,
            resources,
        };
        log::debug!(
            "VTF {} header: {}x{}x{} {:?}, {} mipmaps, {} frames, {} faces, {} resources",
            header.version,
            header.width,
            header.height,
            header.depth,
            header.format,
            header.mipmap_count,
            header.frames,
            header.faces(),
            header.resources.len()
        );
        Ok(header)
    }

    /// Serializes the header and its resource directory.
    ///
    /// The output is `header_size` bytes long, or longer if the resource
    /// directory does not fit into `header_size`. Fields the version does not
    /// have (depth before 7.2, resources before 7.3) are not written.
    pub fn to_bytes(&self) -> Vec<u8> {
        let resource_count = if self.version.has_resources() {
            self.resources.len() as u32
        } else {
            0
        };
        let raw = RawHeader {
            signature: Self::MAGIC,
            major: U32::new(self.version.major),
            minor: U32::new(self.version.minor),
            header_size: U32::new(self.header_size),
            width: U16::new(self.width),
            height: U16::new(self.height),
            flags: U32::new(self.flags.bits()),
            frames: U16::new(self.frames),
            first_frame: U16::new(self.first_frame),
            _pad0: [0; 4],
            reflectivity: self.reflectivity.map(F32::new),
            _pad1: [0; 4],
            bumpmap_scale: F32::new(self.bumpmap_scale),
            format: I32::new(self.format.id()),
            mipmap_count: self.mipmap_count,
            low_res_format: I32::new(self.low_res_format.map_or(ImageFormat::NONE_ID, ImageFormat::id)),
            low_res_width: self.low_res_width,
            low_res_height: self.low_res_height,
            depth: U16::new(if self.version.has_depth() { self.depth } else { 0 }),
            _pad2: [0; 3],
            resource_count: U32::new(resource_count),
            _pad3: [0; 8],
        };

        let len = self
            .header_size
            .max(self.version.header_size(resource_count)) as usize;
        let mut bytes = Vec::with_capacity(len);
        bytes.extend_from_slice(raw.as_bytes());
        if self.version.has_resources() {
            for entry in &self.resources {
                let raw = RawResourceEntry {
                    tag: entry.tag.0,
                    flags: entry.flags.bits(),
                    data: U32::new(entry.data),
                };
                bytes.extend_from_slice(raw.as_bytes());
            }
        }
        // 7.0 and 7.1 headers are shorter than the raw header
        bytes.resize(len, 0);
        bytes
    }
}

/// The on-disk layout of the fixed part of a VTF header.
#[derive(FromBytes, IntoBytes, Immutable, KnownLayout, Unaligned)]
#[repr(C)]
struct RawHeader {
    signature: [u8; 4],
    major: U32,
    minor: U32,
    header_size: U32,
    width: U16,
    height: U16,
    flags: U32,
    frames: U16,
    first_frame: U16,
    _pad0: [u8; 4],
    reflectivity: [F32; 3],
    _pad1: [u8; 4],
    bumpmap_scale: F32,
    format: I32,
    mipmap_count: u8,
    low_res_format: I32,
    low_res_width: u8,
    low_res_height: u8,
    /// 7.2+
    depth: U16,
    _pad2: [u8; 3],
    /// 7.3+
    resource_count: U32,
    _pad3: [u8; 8],
}
impl RawHeader {
    const SIZE: usize = 80;
}

#[derive(FromBytes, IntoBytes, Immutable, KnownLayout, Unaligned)]
#[repr(C)]
struct RawResourceEntry {
    tag: [u8; 3],
    flags: u8,
    data: U32,
}
