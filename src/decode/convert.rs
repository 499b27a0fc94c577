//! Channel conversions shared by the decoders and encoders.

/// Rescales an `bits`-bit UNORM value to 8 bits with rounding.
///
/// This is exact for the maximum value, e.g. 4-bit 15 becomes 255.
#[inline(always)]
pub(crate) fn unorm_to_n8(x: u64, bits: u8) -> u8 {
    debug_assert!((1..=32).contains(&bits));
    let max = (1_u64 << bits) - 1;
    debug_assert!(x <= max);
    ((x * 255 + max / 2) / max) as u8
}
/// Rescales an 8-bit UNORM value to `bits` bits with rounding.
#[inline(always)]
pub(crate) fn n8_to_unorm(v: u8, bits: u8) -> u64 {
    debug_assert!((1..=32).contains(&bits));
    let max = (1_u64 << bits) - 1;
    (v as u64 * max + 127) / 255
}

/// Maps `[0, 1]` to `[0, 255]` with rounding. Values outside the range
/// saturate and NaN becomes 0.
#[inline(always)]
pub(crate) fn f32_to_n8(f: f32) -> u8 {
    if f.is_nan() {
        0
    } else {
        (f.clamp(0.0, 1.0) * 255.0 + 0.5) as u8
    }
}
#[inline(always)]
pub(crate) fn n8_to_f32(v: u8) -> f32 {
    const F: f32 = 1.0 / 255.0;
    v as f32 * F
}

/// Integer Rec. 601 luma. Exact for grey pixels.
#[inline(always)]
pub(crate) fn luma([r, g, b, _]: [u8; 4]) -> u8 {
    ((77 * r as u32 + 150 * g as u32 + 29 * b as u32 + 128) >> 8) as u8
}

/// Functions for converting **FROM Unorm4** values to other formats.
pub(crate) mod n4 {
    #[inline(always)]
    pub fn n8(x: u8) -> u8 {
        debug_assert!(x <= 15);
        x * 17
    }
}
pub(crate) mod n5 {
    #[inline(always)]
    pub fn n8(x: u8) -> u8 {
        debug_assert!(x <= 31);
        ((x as u16 * 2108 + 92) >> 8) as u8
    }
}
pub(crate) mod n6 {
    #[inline(always)]
    pub fn n8(x: u8) -> u8 {
        debug_assert!(x <= 63);
        ((x as u16 * 1036 + 132) >> 8) as u8
    }
}

/// A DXT endpoint colour. Red is stored in the high bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct B5G6R5 {
    pub r5: u16,
    pub g6: u16,
    pub b5: u16,
}
impl B5G6R5 {
    #[inline(always)]
    pub fn from_u16(u: u16) -> Self {
        Self {
            b5: u & 0x1F,
            g6: (u >> 5) & 0x3F,
            r5: (u >> 11) & 0x1F,
        }
    }
    #[inline(always)]
    pub fn to_u16(self) -> u16 {
        (self.r5 << 11) | (self.g6 << 5) | self.b5
    }
    /// The nearest 565 colour of an RGB8 colour.
    #[inline(always)]
    pub fn from_n8([r, g, b]: [u8; 3]) -> Self {
        Self {
            r5: n8_to_unorm(r, 5) as u16,
            g6: n8_to_unorm(g, 6) as u16,
            b5: n8_to_unorm(b, 5) as u16,
        }
    }
    #[inline(always)]
    pub fn to_n8(self) -> [u8; 3] {
        [
            n5::n8(self.r5 as u8),
            n6::n8(self.g6 as u8),
            n5::n8(self.b5 as u8),
        ]
    }

    /// The nearest RGB8 color that represents `self * 2/3 + color * 1/3`.
    #[inline(always)]
    pub fn one_third_color_rgb8(self, color: Self) -> [u8; 3] {
        [
            third_n5(self.r5, color.r5),
            third_n6(self.g6, color.g6),
            third_n5(self.b5, color.b5),
        ]
    }
    /// The nearest RGB8 color that represents `self * 1/2 + color * 1/2`.
    #[inline(always)]
    pub fn mid_color_rgb8(self, color: Self) -> [u8; 3] {
        let r = self.r5 + color.r5;
        let g = self.g6 + color.g6;
        let b = self.b5 + color.b5;

        let r = ((r * 1053 + 125) >> 8) as u8;
        let g = ((g as u32 * 4145 + 1019) >> 11) as u8;
        let b = ((b * 1053 + 125) >> 8) as u8;
        [r, g, b]
    }
}

/// `a * 2/3 + b * 1/3` of two 5-bit values as RGB8.
#[inline(always)]
pub(crate) fn third_n5(a: u16, b: u16) -> u8 {
    (((a * 2 + b) * 351 + 61) >> 7) as u8
}
/// `a * 2/3 + b * 1/3` of two 6-bit values as RGB8.
#[inline(always)]
pub(crate) fn third_n6(a: u16, b: u16) -> u8 {
    (((a * 2 + b) as u32 * 2763 + 1039) >> 11) as u8
}

pub(crate) trait ToRgba {
    type Channel;
    fn to_rgba(self) -> [Self::Channel; 4];
}
impl ToRgba for [u8; 3] {
    type Channel = u8;

    #[inline(always)]
    fn to_rgba(self) -> [Self::Channel; 4] {
        let [r, g, b] = self;
        [r, g, b, u8::MAX]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unorm_scaling_is_exact_at_the_ends() {
        for bits in [1, 4, 5, 6, 8, 16, 24] {
            let max = (1_u64 << bits) - 1;
            assert_eq!(unorm_to_n8(0, bits), 0);
            assert_eq!(unorm_to_n8(max, bits), 255);
            assert_eq!(n8_to_unorm(255, bits), max);
        }
        assert_eq!(unorm_to_n8(11, 5), n5::n8(11));
        assert_eq!(unorm_to_n8(7, 4), n4::n8(7));
        assert_eq!(n8_to_unorm(10, 16), 10 * 257);
    }

    #[test]
    fn unorm_values_survive_a_round_trip() {
        for bits in [1_u8, 4, 5, 6] {
            for x in 0..(1_u64 << bits) {
                assert_eq!(n8_to_unorm(unorm_to_n8(x, bits), bits), x);
            }
        }
    }

    #[test]
    fn thirds_match_endpoints_for_equal_inputs() {
        for x in 0..32 {
            assert_eq!(third_n5(x, x), n5::n8(x as u8));
        }
        for x in 0..64 {
            assert_eq!(third_n6(x, x), n6::n8(x as u8));
        }
    }

    #[test]
    fn floats() {
        assert_eq!(f32_to_n8(f32::NAN), 0);
        assert_eq!(f32_to_n8(-1.0), 0);
        assert_eq!(f32_to_n8(2.0), 255);
        for v in 0..=255 {
            assert_eq!(f32_to_n8(n8_to_f32(v)), v);
        }
    }

    #[test]
    fn luma_is_exact_for_grey() {
        for v in 0..=255 {
            assert_eq!(luma([v, v, v, 0]), v);
        }
    }
}
