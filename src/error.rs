use thiserror::Error;

use crate::{ImageFormat, PowerOfTwoSuggestion, UnitIndex};

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum HeaderError {
    #[error("invalid signature {0:?}, expected \"VTF\\0\"")]
    BadSignature([u8; 4]),
    #[error("unsupported version {major}.{minor}, only 7.0 to 7.5 are supported")]
    UnsupportedVersion { major: u32, minor: u32 },
    /// Fewer bytes are available than the header requires.
    #[error("truncated header: {required} bytes are required, but only {available} are present")]
    TruncatedHeader { required: usize, available: usize },
    /// The declared header size is smaller than the fixed header of its version.
    #[error("invalid header size {size} for version 7.{minor}, expected at least {minimum}")]
    InvalidHeaderSize { size: u32, minor: u32, minimum: u32 },
    #[error("too many resources ({0}), the maximum supported is 32")]
    TooManyResources(u32),

    #[error(transparent)]
    Format(#[from] FormatError),
}

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum FormatError {
    /// The id is not part of the VTF image format enumeration.
    #[error("unknown image format id {0}")]
    UnknownFormat(i32),
    /// The format is known, but pixels of this format cannot be converted.
    #[error("image format {0:?} is not supported for conversion")]
    UnsupportedFormat(ImageFormat),
    /// A pixel buffer does not have the size its dimensions and format require.
    #[error("buffer size mismatch: expected {expected} bytes, got {actual}")]
    BufferSizeMismatch { expected: usize, actual: usize },
}

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LayoutError {
    /// VTF textures must have power-of-two sides.
    #[error("{width}x{height} is not a power-of-two size, the nearest valid sizes are {suggestion}")]
    DimensionNotPowerOfTwo {
        width: u32,
        height: u32,
        suggestion: PowerOfTwoSuggestion,
    },
    /// One of the dimensions or counts of the texture is zero.
    #[error("the texture has a zero dimension or count")]
    ZeroDimension,
    #[error("invalid mipmap count {mipmaps}, expected 1 to {max}")]
    InvalidMipmapCount { mipmaps: u32, max: u32 },
    /// Faces are implied by the environment map flag, so only 1, 6 and
    /// (before 7.5) 7 faces can be stored.
    #[error("{faces} faces cannot be stored in a version 7.{minor} texture")]
    InvalidFaceCount { faces: u32, minor: u32 },
    #[error("volume textures require version 7.2 or later, got 7.{minor}")]
    DepthNotSupported { depth: u16, minor: u32 },
    /// The header stores sides as 16-bit integers.
    #[error("{width}x{height} is too large, sides must be at most 65535 pixels")]
    DimensionTooLarge { width: u32, height: u32 },
    /// The header describes a data section that does not fit into memory
    /// addresses.
    #[error("data layout described by the header is too large")]
    DataLayoutTooBig,
    #[error("truncated data: {required} bytes are required, but only {available} are present")]
    TruncatedData { required: u64, available: u64 },
    #[error("{0:?} is outside of the texture")]
    UnitOutOfBounds(UnitIndex),
    /// The image handed to the encoder lacks the full-resolution surface of a unit.
    #[error("missing surface for {0:?}")]
    MissingSurface(UnitIndex),
    #[error("surface {index:?} is {actual:?}, but {expected:?} is required")]
    SurfaceSizeMismatch {
        index: UnitIndex,
        expected: (u32, u32),
        actual: (u32, u32),
    },
}

/// The error type of all public operations of this crate.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum VtfError {
    #[error("header error: {0}")]
    Header(#[from] HeaderError),
    #[error(transparent)]
    Format(#[from] FormatError),
    #[error(transparent)]
    Layout(#[from] LayoutError),
    /// An output buffer could not be allocated, or the allocation would exceed
    /// [`Options::memory_limit`](crate::Options::memory_limit).
    #[error("out of memory: cannot allocate {0} bytes")]
    OutOfMemory(usize),
}

/// A flat classification of [`VtfError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum ErrorKind {
    BadSignature,
    UnsupportedVersion,
    TruncatedHeader,
    TruncatedData,
    DimensionNotPowerOfTwo,
    UnknownFormat,
    UnsupportedFormat,
    BufferSizeMismatch,
    /// Also covers header fields that contradict the version, like a header
    /// size below its minimum or an oversized resource directory.
    InvalidLayout,
    OutOfMemory,
}

impl FormatError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            FormatError::UnknownFormat(_) => ErrorKind::UnknownFormat,
            FormatError::UnsupportedFormat(_) => ErrorKind::UnsupportedFormat,
            FormatError::BufferSizeMismatch { .. } => ErrorKind::BufferSizeMismatch,
        }
    }
}
impl HeaderError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            HeaderError::BadSignature(_) => ErrorKind::BadSignature,
            HeaderError::UnsupportedVersion { .. } => ErrorKind::UnsupportedVersion,
            HeaderError::TruncatedHeader { .. } => ErrorKind::TruncatedHeader,
            HeaderError::InvalidHeaderSize { .. } | HeaderError::TooManyResources(_) => {
                ErrorKind::InvalidLayout
            }
            HeaderError::Format(error) => error.kind(),
        }
    }
}
impl LayoutError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            LayoutError::DimensionNotPowerOfTwo { .. } => ErrorKind::DimensionNotPowerOfTwo,
            LayoutError::TruncatedData { .. } => ErrorKind::TruncatedData,
            LayoutError::SurfaceSizeMismatch { .. } => ErrorKind::BufferSizeMismatch,
            _ => ErrorKind::InvalidLayout,
        }
    }
}
impl VtfError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            VtfError::Header(error) => error.kind(),
            VtfError::Format(error) => error.kind(),
            VtfError::Layout(error) => error.kind(),
            VtfError::OutOfMemory(_) => ErrorKind::OutOfMemory,
        }
    }
}

/// Allocates a zeroed buffer without aborting the process if memory runs out.
pub(crate) fn try_alloc(len: usize) -> Result<Vec<u8>, VtfError> {
    let mut buffer = Vec::new();
    buffer
        .try_reserve_exact(len)
        .map_err(|_| VtfError::OutOfMemory(len))?;
    buffer.resize(len, 0);
    Ok(buffer)
}
