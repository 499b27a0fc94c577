use std::collections::BTreeMap;

use crate::{FormatError, ImageShape, LayerUse, LayoutError, Size, UnitIndex, VtfError};

/// A single RGBA8888 image.
///
/// Pixels are stored row-major starting at the top-left corner, 4 bytes per
/// pixel, with straight (not premultiplied) alpha.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Surface {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl Surface {
    /// Wraps an RGBA8888 buffer.
    ///
    /// Fails with [`FormatError::BufferSizeMismatch`] if `data` is not exactly
    /// `width * height * 4` bytes long.
    pub fn new(width: u32, height: u32, data: Vec<u8>) -> Result<Self, FormatError> {
        let expected = Size::new(width, height)
            .rgba_bytes()
            .ok_or(FormatError::BufferSizeMismatch {
                expected: usize::MAX,
                actual: data.len(),
            })?;
        if data.len() != expected {
            return Err(FormatError::BufferSizeMismatch {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }
    /// Internal constructor. The length of `data` is only checked in debug.
    pub(crate) fn from_parts(size: Size, data: Vec<u8>) -> Self {
        debug_assert_eq!(Some(data.len()), size.rgba_bytes());
        Self {
            width: size.width,
            height: size.height,
            data,
        }
    }
    /// A surface where every pixel has the given colour.
    pub fn filled(width: u32, height: u32, color: [u8; 4]) -> Self {
        let pixels = width as usize * height as usize;
        Self {
            width,
            height,
            data: color.repeat(pixels),
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
    pub fn data(&self) -> &[u8] {
        &self.data
    }
    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }
    pub fn into_data(self) -> Vec<u8> {
        self.data
    }

    /// Returns the pixel at the given position.
    ///
    /// # Panics
    ///
    /// If the position is outside the surface.
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        assert!(x < self.width && y < self.height);
        let i = (y as usize * self.width as usize + x as usize) * 4;
        [
            self.data[i],
            self.data[i + 1],
            self.data[i + 2],
            self.data[i + 3],
        ]
    }
    pub fn pixels(&self) -> impl Iterator<Item = [u8; 4]> + '_ {
        self.data.chunks_exact(4).map(|p| [p[0], p[1], p[2], p[3]])
    }
}

/// A texture with an RGBA8888 surface for every unit it holds.
///
/// Decoded images hold every unit of their shape. Images passed to the
/// encoder need only hold the full-resolution units; missing mip levels are
/// generated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedImage {
    shape: ImageShape,
    surfaces: BTreeMap<UnitIndex, Surface>,
}

impl DecodedImage {
    /// Creates an image without any surfaces.
    pub fn new(shape: ImageShape) -> Result<Self, LayoutError> {
        shape.validate()?;
        Ok(Self {
            shape,
            surfaces: BTreeMap::new(),
        })
    }

    /// Creates an image from a list of full-resolution layers.
    ///
    /// The layers fill the axis selected by `layer_use`. All layers must have
    /// the same size.
    pub fn from_layers(layer_use: LayerUse, layers: Vec<Surface>) -> Result<Self, VtfError> {
        let (frames, faces, depth) = layer_use
            .counts(layers.len())
            .ok_or(LayoutError::ZeroDimension)?;
        let first = layers.first().ok_or(LayoutError::ZeroDimension)?;
        let shape = ImageShape {
            depth,
            frames,
            faces,
            ..ImageShape::new(first.width(), first.height())
        };

        let mut image = Self::new(shape)?;
        for (i, surface) in layers.into_iter().enumerate() {
            image.insert(layer_use.unit(i), surface)?;
        }
        Ok(image)
    }

    /// A single 2D texture.
    pub fn from_surface(surface: Surface) -> Result<Self, VtfError> {
        Self::from_layers(LayerUse::Single, vec![surface])
    }

    pub fn shape(&self) -> ImageShape {
        self.shape
    }
    pub fn width(&self) -> u32 {
        self.shape().width
    }
    pub fn height(&self) -> u32 {
        self.shape().height
    }
    /// The size of the given mip level.
    pub fn mip_size(&self, mip: u8) -> Size {
        self.shape().mip_size(mip)
    }

    /// Adds or replaces the surface of a unit.
    ///
    /// The unit must be part of the shape and the surface must have the size
    /// of its mip level.
    pub fn insert(&mut self, index: UnitIndex, surface: Surface) -> Result<(), LayoutError> {
        let shape = self.shape();
        if !shape.contains(index) {
            return Err(LayoutError::UnitOutOfBounds(index));
        }
        let expected = shape.mip_size(index.mip);
        if surface.size() != expected {
            return Err(LayoutError::SurfaceSizeMismatch {
                index,
                expected: (expected.width, expected.height),
                actual: (surface.width(), surface.height()),
            });
        }
        self.surfaces.insert(index, surface);
        Ok(())
    }
    pub fn get(&self, index: UnitIndex) -> Option<&Surface> {
        self.surfaces.get(&index)
    }
    pub fn get_mut(&mut self, index: UnitIndex) -> Option<&mut Surface> {
        self.surfaces.get_mut(&index)
    }
    /// The full-resolution surface of the first frame, face, and slice.
    pub fn main(&self) -> Option<&Surface> {
        self.get(UnitIndex::default())
    }

    /// Iterates over all surfaces ordered by mip level, frame, face, and
    /// slice.
    pub fn iter(&self) -> impl Iterator<Item = (UnitIndex, &Surface)> {
        self.surfaces.iter().map(|(index, surface)| (*index, surface))
    }
    pub fn len(&self) -> usize {
        self.surfaces.len()
    }
    pub fn is_empty(&self) -> bool {
        self.surfaces.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn surface_size_is_checked() {
        assert!(Surface::new(2, 2, vec![0; 16]).is_ok());
        assert!(matches!(
            Surface::new(2, 2, vec![0; 15]),
            Err(FormatError::BufferSizeMismatch {
                expected: 16,
                actual: 15
            })
        ));
    }

    #[test]
    fn layers_fill_one_axis() {
        let layers = (0..6).map(|i| Surface::filled(4, 4, [i, 0, 0, 255])).collect();
        let image = DecodedImage::from_layers(LayerUse::EnvMap, layers).unwrap();
        assert_eq!(image.shape().faces, 6);
        assert_eq!(image.shape().frames, 1);
        assert_eq!(image.len(), 6);
        assert_eq!(image.get(UnitIndex::layer(0, 5, 0)).unwrap().pixel(3, 3), [5, 0, 0, 255]);
    }

    #[test]
    fn mismatched_layers_are_rejected() {
        let layers = vec![Surface::filled(4, 4, [0; 4]), Surface::filled(2, 4, [0; 4])];
        let error = DecodedImage::from_layers(LayerUse::Animation, layers).unwrap_err();
        assert!(matches!(
            error,
            VtfError::Layout(LayoutError::SurfaceSizeMismatch { .. })
        ));
    }
}
