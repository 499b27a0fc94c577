#![allow(unused)]

use rand::{rngs::StdRng, Rng, SeedableRng};
use vtf::*;

pub fn create_rng() -> StdRng {
    StdRng::seed_from_u64(123456789)
}

pub fn random_surface(rng: &mut impl Rng, width: u32, height: u32) -> Surface {
    let mut data = vec![0_u8; width as usize * height as usize * 4];
    rng.fill(&mut data[..]);
    Surface::new(width, height, data).unwrap()
}

/// A random value that a channel of the given precision stores exactly. Low
/// precision values are widened the same way the decoder widens them.
fn representable_value(rng: &mut impl Rng, channel: Channel, float: bool) -> u8 {
    if float || channel.bits >= 8 {
        return rng.gen();
    }
    let max = (1_u32 << channel.bits) - 1;
    let value = rng.gen_range(0..=max);
    ((value * 255 + max / 2) / max) as u8
}

/// A random pixel that survives encoding in the given uncompressed format
/// unchanged.
pub fn representable_pixel(rng: &mut impl Rng, format: ImageFormat) -> [u8; 4] {
    let descriptor = format.descriptor();
    let float = descriptor.encoding == Encoding::Float;

    let mut rgba = [0, 0, 0, 255];
    for &channel in descriptor.channels {
        let value = representable_value(rng, channel, float);
        match channel.kind {
            ChannelKind::Red => rgba[0] = value,
            ChannelKind::Green => rgba[1] = value,
            ChannelKind::Blue => rgba[2] = value,
            ChannelKind::Alpha => rgba[3] = value,
            ChannelKind::Luminance => {
                rgba[0] = value;
                rgba[1] = value;
                rgba[2] = value;
            }
            ChannelKind::Index | ChannelKind::Depth | ChannelKind::Unused => {}
        }
    }
    // pure blue is the transparent key colour
    if descriptor.encoding == Encoding::BlueScreen && rgba == [0, 0, 255, 255] {
        rgba[0] = 1;
    }
    rgba
}

pub fn representable_surface(
    rng: &mut impl Rng,
    format: ImageFormat,
    width: u32,
    height: u32,
) -> Surface {
    let mut data = Vec::with_capacity(width as usize * height as usize * 4);
    for _ in 0..width * height {
        data.extend_from_slice(&representable_pixel(rng, format));
    }
    Surface::new(width, height, data).unwrap()
}

/// All formats that can be converted to and from RGBA8888.
pub fn convertible_formats() -> impl Iterator<Item = ImageFormat> {
    all_formats()
        .map(|descriptor| descriptor.format)
        .filter(|format| format.is_convertible())
}

/// The largest difference of any channel of any pixel.
pub fn max_difference(a: &Surface, b: &Surface) -> u8 {
    assert_eq!(a.size(), b.size());
    a.data()
        .iter()
        .zip(b.data())
        .map(|(a, b)| a.abs_diff(*b))
        .max()
        .unwrap_or(0)
}

/// Concatenates a serialized header and the data behind it.
pub fn file_with(header: &Header, data: &[u8]) -> Vec<u8> {
    let mut file = header.to_bytes();
    file.extend_from_slice(data);
    file
}

pub fn encode_options(format: ImageFormat) -> EncodeOptions {
    let mut options = EncodeOptions::default();
    options.format = format;
    options
}
