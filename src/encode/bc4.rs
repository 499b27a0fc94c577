use crate::decode::bc::blocks::bc4_palette;

/// Compresses 16 single-channel values into an interpolated block, as used
/// for DXT5 alpha and the channels of ATI1N and ATI2N.
///
/// Both the 6-interpolation and the 4-interpolation palette are tried and the
/// one with the lower squared error wins.
pub(crate) fn compress_bc4_block(block: [u8; 16]) -> [u8; 8] {
    let min = block.iter().copied().min().unwrap_or(0);
    let max = block.iter().copied().max().unwrap_or(0);

    // single value
    if min == max {
        return EndPoints { c0: min, c1: min }.with_indexes(0);
    }

    // c0 > c1 selects 6 interpolated values
    let (inter6, error6) = EndPoints { c0: max, c1: min }.closest(&block);
    if error6 == 0 {
        return inter6;
    }

    // c0 <= c1 selects 4 interpolated values plus 0 and 255, so the endpoints
    // only need to span the values in between
    let inner = block.iter().copied().filter(|&v| v != 0 && v != u8::MAX);
    let inner_min = inner.clone().min();
    let inner_max = inner.max();
    let (inter4, error4) = match (inner_min, inner_max) {
        (Some(c0), Some(c1)) => EndPoints { c0, c1 }.closest(&block),
        // only 0 and 255
        _ => EndPoints { c0: 0, c1: 0 }.closest(&block),
    };

    if error4 < error6 {
        inter4
    } else {
        inter6
    }
}

#[derive(Debug, Clone, Copy)]
struct EndPoints {
    c0: u8,
    c1: u8,
}
impl EndPoints {
    /// Picks the closest palette entry for every value. Returns the block and
    /// its total squared error.
    fn closest(&self, block: &[u8; 16]) -> ([u8; 8], u32) {
        let palette = bc4_palette(self.c0, self.c1);

        let mut indexes: u64 = 0;
        let mut total_error = 0;
        for (i, &value) in block.iter().enumerate() {
            let mut best = (u32::MAX, 0);
            for (index, &entry) in palette.iter().enumerate() {
                let error = value.abs_diff(entry) as u32;
                if error < best.0 {
                    best = (error, index);
                }
            }
            total_error += best.0 * best.0;
            indexes |= (best.1 as u64) << (i * 3);
        }

        (self.with_indexes(indexes), total_error)
    }

    fn with_indexes(&self, indexes: u64) -> [u8; 8] {
        let i = indexes.to_le_bytes();
        [self.c0, self.c1, i[0], i[1], i[2], i[3], i[4], i[5]]
    }
}

/// Compresses 4-bit explicit alpha, as used by DXT3.
pub(crate) fn compress_bc2_alpha(alpha: [u8; 16]) -> [u8; 8] {
    use crate::decode::convert::n8_to_unorm;

    let mut out = [0_u8; 8];
    for (i, pair) in alpha.chunks_exact(2).enumerate() {
        let low = n8_to_unorm(pair[0], 4) as u8;
        let high = n8_to_unorm(pair[1], 4) as u8;
        out[i] = low | (high << 4);
    }
    out
}
