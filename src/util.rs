/// An implementation of div_ceil to lower MSRV.
pub(crate) fn div_ceil<T>(a: T, b: T) -> T
where
    T: Copy
        + PartialEq
        + PartialOrd
        + From<u8>
        + std::ops::Div<Output = T>
        + std::ops::Rem<Output = T>
        + std::ops::Add<Output = T>,
{
    debug_assert!(a >= T::from(0));
    debug_assert!(b > T::from(0));

    let d = a / b;
    if a % b != T::from(0) {
        d + T::from(1)
    } else {
        d
    }
}

/// Reads a little-endian `u32` at the given offset, if the bytes exist.
pub(crate) fn read_u32_le(bytes: &[u8], offset: usize) -> Option<u32> {
    let end = offset.checked_add(4)?;
    let chunk = bytes.get(offset..end)?;
    Some(u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
}

/// Returns `bytes[offset..offset + len]` with all arithmetic checked.
pub(crate) fn sub_slice(bytes: &[u8], offset: u64, len: u64) -> Option<&[u8]> {
    let start = usize::try_from(offset).ok()?;
    let len = usize::try_from(len).ok()?;
    bytes.get(start..start.checked_add(len)?)
}

/// The nearest powers of two below and above `value`.
///
/// `value` itself is returned twice if it already is a power of two. Values
/// above 2^31 have no power of two above them in `u32` and are clamped to
/// 2^31.
pub(crate) fn power_of_two_bracket(value: u32) -> (u32, u32) {
    let value = value.min(1 << 31);
    if value == 0 {
        return (1, 1);
    }
    if value.is_power_of_two() {
        return (value, value);
    }
    let above = value.next_power_of_two();
    let below = 1u32 << (31 - value.leading_zeros());
    (below, above)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn brackets() {
        assert_eq!(power_of_two_bracket(100), (64, 128));
        assert_eq!(power_of_two_bracket(256), (256, 256));
        assert_eq!(power_of_two_bracket(3), (2, 4));
        assert_eq!(power_of_two_bracket(1), (1, 1));
    }

    #[test]
    fn brackets_near_the_top_of_u32() {
        assert_eq!(power_of_two_bracket(u32::MAX), (1 << 31, 1 << 31));
        assert_eq!(power_of_two_bracket((1 << 31) + 1), (1 << 31, 1 << 31));
        assert_eq!(power_of_two_bracket((1 << 31) - 1), (1 << 30, 1 << 31));
        for value in [(1 << 31) - 1, 1 << 31, (1 << 31) + 1, u32::MAX] {
            let (below, above) = power_of_two_bracket(value);
            assert!(below <= above);
            assert!(below <= value);
        }
    }

    #[test]
    fn le_reads_are_bounds_checked() {
        let bytes = [1, 0, 0, 0, 2];
        assert_eq!(read_u32_le(&bytes, 0), Some(1));
        assert_eq!(read_u32_le(&bytes, 2), None);
        assert_eq!(read_u32_le(&bytes, usize::MAX), None);
        assert_eq!(sub_slice(&bytes, 4, 1), Some(&[2u8][..]));
        assert_eq!(sub_slice(&bytes, 4, 2), None);
    }
}
