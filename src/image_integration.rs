use image::{DynamicImage, Rgba, RgbaImage};

use crate::Surface;

impl From<&Surface> for RgbaImage {
    fn from(surface: &Surface) -> Self {
        RgbaImage::from_fn(surface.width(), surface.height(), |x, y| {
            Rgba(surface.pixel(x, y))
        })
    }
}

impl From<RgbaImage> for Surface {
    /// Takes over the buffer of an `image::RgbaImage`.
    ///
    /// `image`'s buffers may be longer than their pixels require, so the
    /// buffer is truncated to the exact length.
    fn from(image: RgbaImage) -> Self {
        let size = crate::Size::new(image.width(), image.height());
        let mut data = image.into_raw();
        data.truncate(size.rgba_bytes().unwrap_or(usize::MAX));
        Surface::from_parts(size, data)
    }
}

impl From<&DynamicImage> for Surface {
    /// Converts any `image` color type to RGBA8888.
    fn from(image: &DynamicImage) -> Self {
        Surface::from(image.to_rgba8())
    }
}

impl From<&Surface> for DynamicImage {
    fn from(surface: &Surface) -> Self {
        DynamicImage::ImageRgba8(surface.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip() {
        let mut image = RgbaImage::new(3, 2);
        image.put_pixel(2, 1, Rgba([1, 2, 3, 4]));

        let surface = Surface::from(image.clone());
        assert_eq!(surface.size(), crate::Size::new(3, 2));
        assert_eq!(surface.pixel(2, 1), [1, 2, 3, 4]);
        assert_eq!(RgbaImage::from(&surface), image);
    }

    #[test]
    fn gray_images_become_opaque_rgba() {
        let gray = DynamicImage::ImageLuma8(image::GrayImage::from_pixel(1, 1, image::Luma([9])));
        assert_eq!(Surface::from(&gray).pixel(0, 0), [9, 9, 9, 255]);
    }
}
