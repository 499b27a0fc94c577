use std::sync::OnceLock;

use glam::Vec3A;

use crate::decode::bc::blocks::{bc1_palette, four_color_palette};
use crate::decode::convert::{third_n5, third_n6, B5G6R5};

/// This is a completely transparent DXT1 block in three-color mode.
///
/// While the last 4 bytes have to be 0xFF, we can chose any u16 values for the
/// endpoints such that c0 < c1. c0 = 0 and c1 = 0xFFFF compress well.
const TRANSPARENT_BLOCK: [u8; 8] = [0, 0, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF];

/// Alpha values at or above this are opaque in one-bit alpha blocks.
const ALPHA_THRESHOLD: u8 = 128;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Bc1Mode {
    /// Only four-color mode is used and alpha is ignored. This is used for
    /// DXT1 and the color part of DXT3 and DXT5.
    Opaque,
    /// Transparent pixels are stored as index 3 of three-color mode.
    OneBitAlpha,
}

pub(crate) fn compress_bc1_block(block: [[u8; 4]; 16], mode: Bc1Mode) -> [u8; 8] {
    let mut alpha_map: u16 = u16::MAX;
    if mode == Bc1Mode::OneBitAlpha {
        for (i, pixel) in block.iter().enumerate() {
            if pixel[3] < ALPHA_THRESHOLD {
                alpha_map &= !(1 << i);
            }
        }
        if alpha_map == 0 {
            return TRANSPARENT_BLOCK;
        }
    }
    let is_opaque = |i: usize| alpha_map & (1 << i) != 0;

    let mut colors = [Vec3A::ZERO; 16];
    let mut count = 0;
    for (i, [r, g, b, _]) in block.iter().copied().enumerate() {
        if is_opaque(i) {
            colors[count] = Vec3A::new(r as f32, g as f32, b as f32);
            count += 1;
        }
    }
    let colors = &colors[..count];

    let rgb = block.map(|[r, g, b, _]| [r, g, b]);
    let first = rgb
        .iter()
        .enumerate()
        .find(|(i, _)| is_opaque(*i))
        .map_or([0; 3], |(_, c)| *c);
    let single_color = rgb
        .iter()
        .enumerate()
        .all(|(i, c)| !is_opaque(i) || *c == first);

    if alpha_map == u16::MAX {
        if single_color {
            return compress_single_color(first);
        }
        let (c0, c1) = fit_endpoints(colors);
        let candidate = EndPoints::new_p4(c0, c1).encode(&block, alpha_map);
        refine(candidate, &block, alpha_map, Palette::P4)
    } else {
        let (c0, c1) = if single_color {
            let color = B5G6R5::from_n8(first);
            (color, color)
        } else {
            fit_endpoints(colors)
        };
        let candidate = EndPoints::new_p3(c0, c1).encode(&block, alpha_map);
        refine(candidate, &block, alpha_map, Palette::P3)
    }
}

/// Encodes a single opaque color in four-color mode.
fn compress_single_color(color: [u8; 3]) -> [u8; 8] {
    let nearest = B5G6R5::from_n8(color);
    if nearest.to_n8() == color {
        // Lucky. The color can be represented exactly by a RGB565 color.
        let c = nearest.to_u16().to_le_bytes();
        return [c[0], c[1], c[0], c[1], 0, 0, 0, 0];
    }

    // Interpolating 2/3 of one endpoint with 1/3 of the other is often closer
    // than the nearest endpoint.
    let tables = single_color_tables();
    let [r, g, b] = color;
    let (r_a, r_b) = tables.n5[r as usize];
    let (g_a, g_b) = tables.n6[g as usize];
    let (b_a, b_b) = tables.n5[b as usize];
    let a = B5G6R5 {
        r5: r_a as u16,
        g6: g_a as u16,
        b5: b_a as u16,
    };
    let b = B5G6R5 {
        r5: r_b as u16,
        g6: g_b as u16,
        b5: b_b as u16,
    };
    let interpolated = a.one_third_color_rgb8(b);
    let (a_u16, b_u16) = (a.to_u16(), b.to_u16());
    if a_u16 == b_u16 || color_error(interpolated, color) >= color_error(nearest.to_n8(), color) {
        let c = nearest.to_u16().to_le_bytes();
        return [c[0], c[1], c[0], c[1], 0, 0, 0, 0];
    }

    let (c0, c1, index) = if a_u16 > b_u16 {
        (a_u16, b_u16, 0b10_u8)
    } else {
        // index 3 is 2/3 of c1 and 1/3 of c0
        (b_u16, a_u16, 0b11_u8)
    };
    let indexes = index | index << 2 | index << 4 | index << 6;
    let c0 = c0.to_le_bytes();
    let c1 = c1.to_le_bytes();
    [c0[0], c0[1], c1[0], c1[1], indexes, indexes, indexes, indexes]
}

struct SingleColorTables {
    n5: [(u8, u8); 256],
    n6: [(u8, u8); 256],
}

/// For every 8-bit value, the endpoints `(a, b)` for which
/// `a * 2/3 + b * 1/3` is closest to the value.
fn single_color_tables() -> &'static SingleColorTables {
    fn build(max: u8, third: fn(u16, u16) -> u8) -> [(u8, u8); 256] {
        let mut table = [(0, 0); 256];
        let mut best_error = [u8::MAX; 256];
        for a in 0..=max {
            for b in 0..=max {
                let value = third(a as u16, b as u16);
                for (v, best) in best_error.iter_mut().enumerate() {
                    let error = value.abs_diff(v as u8);
                    if error < *best {
                        *best = error;
                        table[v] = (a, b);
                    }
                }
            }
        }
        table
    }

    static TABLES: OnceLock<SingleColorTables> = OnceLock::new();
    TABLES.get_or_init(|| SingleColorTables {
        n5: build(31, third_n5),
        n6: build(63, third_n6),
    })
}

fn color_error(a: [u8; 3], b: [u8; 3]) -> u32 {
    a.iter()
        .zip(b)
        .map(|(&x, y)| {
            let d = x as i32 - y as i32;
            (d * d) as u32
        })
        .sum()
}

/// Finds the endpoints of a line through the colors along their principal
/// axis.
fn fit_endpoints(colors: &[Vec3A]) -> (B5G6R5, B5G6R5) {
    debug_assert!(!colors.is_empty());
    let line = ColorLine::new(colors);

    let mut t_min = f32::INFINITY;
    let mut t_max = f32::NEG_INFINITY;
    for &color in colors {
        let t = line.project(color);
        t_min = t_min.min(t);
        t_max = t_max.max(t);
    }

    (quantize(line.at(t_max)), quantize(line.at(t_min)))
}

fn quantize(color: Vec3A) -> B5G6R5 {
    let c = color.clamp(Vec3A::ZERO, Vec3A::splat(255.0)).round();
    B5G6R5::from_n8([c.x as u8, c.y as u8, c.z as u8])
}

struct ColorLine {
    centroid: Vec3A,
    /// normalized
    axis: Vec3A,
}
impl ColorLine {
    fn new(colors: &[Vec3A]) -> Self {
        let centroid = colors.iter().copied().sum::<Vec3A>() / colors.len() as f32;

        let mut covariance = [Vec3A::ZERO; 3];
        for &color in colors {
            let d = color - centroid;
            covariance[0] += d * d.x;
            covariance[1] += d * d.y;
            covariance[2] += d * d.z;
        }

        // power iteration, starting from the row with the most variance
        let mut axis = covariance
            .into_iter()
            .max_by(|a, b| a.length_squared().total_cmp(&b.length_squared()))
            .unwrap_or(Vec3A::ZERO);
        for _ in 0..8 {
            let next = covariance[0] * axis.x + covariance[1] * axis.y + covariance[2] * axis.z;
            let length = next.length();
            if length < 1e-6 || !length.is_finite() {
                break;
            }
            axis = next / length;
        }
        let axis = axis.try_normalize().unwrap_or(Vec3A::ZERO);

        Self { centroid, axis }
    }
    fn at(&self, t: f32) -> Vec3A {
        self.centroid + self.axis * t
    }
    fn project(&self, color: Vec3A) -> f32 {
        (color - self.centroid).dot(self.axis)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Palette {
    /// Four-color mode, `c0 > c1`.
    P4,
    /// Three-color mode, `c0 <= c1`, with index 3 for transparent pixels.
    P3,
}

#[derive(Debug, Clone, Copy)]
struct EndPoints {
    c0: u16,
    c1: u16,
    palette: Palette,
}
impl EndPoints {
    fn new_p4(c0: B5G6R5, c1: B5G6R5) -> Self {
        let (mut c0, mut c1) = (c0.to_u16(), c1.to_u16());
        if c0 < c1 {
            std::mem::swap(&mut c0, &mut c1);
        }
        // c0 == c1 selects three-color mode. Only index 0 is used then, which
        // is the same in both modes.
        Self {
            c0,
            c1,
            palette: Palette::P4,
        }
    }
    fn new_p3(c0: B5G6R5, c1: B5G6R5) -> Self {
        let (mut c0, mut c1) = (c0.to_u16(), c1.to_u16());
        if c0 > c1 {
            std::mem::swap(&mut c0, &mut c1);
        }
        Self {
            c0,
            c1,
            palette: Palette::P3,
        }
    }

    /// The decoded colors of the usable palette entries.
    fn colors(&self) -> ([[u8; 3]; 4], usize) {
        let colors = match self.palette {
            Palette::P4 => four_color_palette(self.c0, self.c1),
            Palette::P3 => bc1_palette(self.c0, self.c1, [0; 4]),
        };
        let usable = match self.palette {
            Palette::P4 if self.c0 == self.c1 => 1,
            Palette::P4 => 4,
            Palette::P3 => 3,
        };
        (colors.map(|[r, g, b, _]| [r, g, b]), usable)
    }

    /// Picks the closest palette entry for every pixel. Returns the block and
    /// its total squared error.
    fn encode(&self, block: &[[u8; 4]; 16], alpha_map: u16) -> Candidate {
        let (colors, usable) = self.colors();

        let mut indexes: u32 = 0;
        let mut error = 0;
        for (i, [r, g, b, _]) in block.iter().copied().enumerate() {
            let index = if alpha_map & (1 << i) == 0 {
                3
            } else {
                let mut best = (u32::MAX, 0);
                for (index, &color) in colors[..usable].iter().enumerate() {
                    let e = color_error(color, [r, g, b]);
                    if e < best.0 {
                        best = (e, index);
                    }
                }
                error += best.0;
                best.1 as u32
            };
            indexes |= index << (i * 2);
        }

        let c0 = self.c0.to_le_bytes();
        let c1 = self.c1.to_le_bytes();
        let i = indexes.to_le_bytes();
        Candidate {
            data: [c0[0], c0[1], c1[0], c1[1], i[0], i[1], i[2], i[3]],
            error,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Candidate {
    data: [u8; 8],
    error: u32,
}

/// Refits the endpoints to the chosen indexes with least squares and keeps
/// the result if it is better.
fn refine(candidate: Candidate, block: &[[u8; 4]; 16], alpha_map: u16, palette: Palette) -> [u8; 8] {
    if candidate.error == 0 {
        return candidate.data;
    }

    let indexes = u32::from_le_bytes([
        candidate.data[4],
        candidate.data[5],
        candidate.data[6],
        candidate.data[7],
    ]);
    // the weight of c0 for each index
    let weights: [f32; 4] = match palette {
        Palette::P4 => [1.0, 0.0, 2.0 / 3.0, 1.0 / 3.0],
        Palette::P3 => [1.0, 0.0, 0.5, 0.0],
    };

    let mut aa = 0.0;
    let mut ab = 0.0;
    let mut bb = 0.0;
    let mut ax = Vec3A::ZERO;
    let mut bx = Vec3A::ZERO;
    for (i, [r, g, b, _]) in block.iter().copied().enumerate() {
        let index = ((indexes >> (i * 2)) & 0b11) as usize;
        if alpha_map & (1 << i) == 0 {
            continue;
        }
        let w0 = weights[index];
        let w1 = 1.0 - w0;
        let x = Vec3A::new(r as f32, g as f32, b as f32);
        aa += w0 * w0;
        ab += w0 * w1;
        bb += w1 * w1;
        ax += x * w0;
        bx += x * w1;
    }

    let det = aa * bb - ab * ab;
    if det.abs() < 1e-6 {
        return candidate.data;
    }
    let c0 = (ax * bb - bx * ab) / det;
    let c1 = (bx * aa - ax * ab) / det;

    let endpoints = match palette {
        Palette::P4 => EndPoints::new_p4(quantize(c0), quantize(c1)),
        Palette::P3 => EndPoints::new_p3(quantize(c0), quantize(c1)),
    };
    let refined = endpoints.encode(block, alpha_map);
    if refined.error < candidate.error {
        refined.data
    } else {
        candidate.data
    }
}
