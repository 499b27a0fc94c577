use crate::TextureFlags;

/// The kind of bump map a texture is.
///
/// A texture is either a normal map or a self-shadowed bump map, never both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BumpType {
    #[default]
    None,
    /// A tangent-space normal map (`NORMAL`).
    Normal,
    /// A self-shadowed bump map (`SSBUMP`).
    SelfShadowed,
}

/// The user-facing subset of [`TextureFlags`] as named booleans.
///
/// Converting flags to options and back preserves every flag in
/// [`TextureOptions::FLAGS`]. Other flags are not represented here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct TextureOptions {
    pub point_sample: bool,
    pub trilinear: bool,
    pub anisotropic: bool,
    pub clamp_s: bool,
    pub clamp_t: bool,
    pub clamp_u: bool,
    /// Disables mipmapping in the engine. This does not affect whether the
    /// encoder writes mipmaps.
    pub no_mip: bool,
    pub no_lod: bool,
    pub all_mips: bool,
    pub bump: BumpType,
}

impl TextureOptions {
    /// All flags represented by this struct.
    pub const FLAGS: TextureFlags = TextureFlags::POINTSAMPLE
        .union(TextureFlags::TRILINEAR)
        .union(TextureFlags::ANISOTROPIC)
        .union(TextureFlags::CLAMPS)
        .union(TextureFlags::CLAMPT)
        .union(TextureFlags::CLAMPU)
        .union(TextureFlags::NOMIP)
        .union(TextureFlags::NOLOD)
        .union(TextureFlags::ALL_MIPS)
        .union(TextureFlags::NORMAL)
        .union(TextureFlags::SSBUMP);

    pub fn from_flags(flags: TextureFlags) -> Self {
        let bump = if flags.contains(TextureFlags::NORMAL) {
            BumpType::Normal
        } else if flags.contains(TextureFlags::SSBUMP) {
            BumpType::SelfShadowed
        } else {
            BumpType::None
        };

        Self {
            point_sample: flags.contains(TextureFlags::POINTSAMPLE),
            trilinear: flags.contains(TextureFlags::TRILINEAR),
            anisotropic: flags.contains(TextureFlags::ANISOTROPIC),
            clamp_s: flags.contains(TextureFlags::CLAMPS),
            clamp_t: flags.contains(TextureFlags::CLAMPT),
            clamp_u: flags.contains(TextureFlags::CLAMPU),
            no_mip: flags.contains(TextureFlags::NOMIP),
            no_lod: flags.contains(TextureFlags::NOLOD),
            all_mips: flags.contains(TextureFlags::ALL_MIPS),
            bump,
        }
    }

    pub fn to_flags(&self) -> TextureFlags {
        let mut flags = TextureFlags::empty();
        flags.set(TextureFlags::POINTSAMPLE, self.point_sample);
        flags.set(TextureFlags::TRILINEAR, self.trilinear);
        flags.set(TextureFlags::ANISOTROPIC, self.anisotropic);
        flags.set(TextureFlags::CLAMPS, self.clamp_s);
        flags.set(TextureFlags::CLAMPT, self.clamp_t);
        flags.set(TextureFlags::CLAMPU, self.clamp_u);
        flags.set(TextureFlags::NOMIP, self.no_mip);
        flags.set(TextureFlags::NOLOD, self.no_lod);
        flags.set(TextureFlags::ALL_MIPS, self.all_mips);
        match self.bump {
            BumpType::None => {}
            BumpType::Normal => flags |= TextureFlags::NORMAL,
            BumpType::SelfShadowed => flags |= TextureFlags::SSBUMP,
        }
        flags
    }
}
impl From<TextureFlags> for TextureOptions {
    fn from(flags: TextureFlags) -> Self {
        Self::from_flags(flags)
    }
}

/// The preferred mip size of a texture, as stored in the `LOD` resource.
///
/// `u` and `v` are the clamp sizes of the horizontal and vertical axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct LodControl {
    pub u: u8,
    pub v: u8,
}
impl LodControl {
    pub const fn new(u: u8, v: u8) -> Self {
        Self { u, v }
    }

    /// Reads the inline value of a `LOD` resource entry. The two upper bytes
    /// are padding.
    pub const fn from_resource_data(data: u32) -> Self {
        let [u, v, _, _] = data.to_le_bytes();
        Self { u, v }
    }
    pub const fn to_resource_data(self) -> u32 {
        u32::from_le_bytes([self.u, self.v, 0, 0])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normal_wins_over_ssbump() {
        let options = TextureOptions::from_flags(TextureFlags::NORMAL | TextureFlags::SSBUMP);
        assert_eq!(options.bump, BumpType::Normal);
        assert_eq!(options.to_flags(), TextureFlags::NORMAL);
    }

    #[test]
    fn options_round_trip() {
        let flags = TextureFlags::CLAMPS | TextureFlags::CLAMPT | TextureFlags::NOLOD | TextureFlags::SSBUMP;
        let options = TextureOptions::from(flags | TextureFlags::ENVMAP);
        assert!(options.clamp_s && options.clamp_t && options.no_lod);
        assert!(!options.no_mip);
        assert_eq!(options.to_flags(), flags);
    }

    #[test]
    fn lod_resource_data() {
        let lod = LodControl::new(8, 9);
        assert_eq!(lod.to_resource_data(), 0x0908);
        assert_eq!(LodControl::from_resource_data(0xABCD_0908), lod);
    }
}
