use std::collections::BTreeMap;

use crate::util::{read_u32_le, sub_slice};
use crate::{Header, LayoutError, LodControl, ResourceFlags};

/// The 3-byte tag of a resource directory entry.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceTag(pub [u8; 3]);

impl ResourceTag {
    /// The low-resolution thumbnail. The entry points at raw image data.
    pub const LOW_RES_IMAGE: Self = Self([0x01, 0, 0]);
    /// The main image data. The entry points at raw image data.
    pub const HIGH_RES_IMAGE: Self = Self([0x30, 0, 0]);
    pub const PARTICLE_SHEET: Self = Self([0x10, 0, 0]);
    pub const CRC: Self = Self(*b"CRC");
    /// Inline [`LodControl`].
    pub const LOD_CONTROL: Self = Self(*b"LOD");
    /// Inline extended texture flags.
    pub const EXTENDED_FLAGS: Self = Self(*b"TSO");
    pub const KEY_VALUES: Self = Self(*b"KVD");

    /// Whether the entry of this tag points at image data instead of a
    /// length-prefixed chunk.
    pub fn is_image(&self) -> bool {
        *self == Self::LOW_RES_IMAGE || *self == Self::HIGH_RES_IMAGE
    }
}
impl std::fmt::Debug for ResourceTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.0.iter().all(|b| b.is_ascii_graphic()) {
            let [a, b, c] = self.0;
            write!(f, "ResourceTag({}{}{})", a as char, b as char, c as char)
        } else {
            write!(f, "ResourceTag({:?})", self.0)
        }
    }
}

/// The payload of a resource.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ResourceData {
    /// 4 bytes stored directly in the directory entry.
    Inline(u32),
    /// A chunk stored after the header.
    Chunk(Vec<u8>),
}

/// The non-image resources of a VTF file, keyed by tag.
///
/// Resources this crate does not interpret are kept as opaque blobs, so that
/// they can be written back when re-saving a texture. Iteration is ordered by
/// tag.
///
/// The flags byte of every entry is kept as read. The writer only adjusts
/// [`ResourceFlags::NO_DATA_CHUNK`] to match the payload.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Resources {
    entries: BTreeMap<ResourceTag, Entry>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Entry {
    flags: ResourceFlags,
    data: ResourceData,
}

impl Resources {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads all non-image resources listed in the header.
    ///
    /// In permissive mode, chunks that point outside of the file are skipped
    /// with a warning instead of failing.
    pub(crate) fn read(header: &Header, file: &[u8], permissive: bool) -> Result<Self, LayoutError> {
        let mut resources = Self::new();
        for entry in &header.resources {
            if entry.tag.is_image() {
                continue;
            }
            if entry.is_inline() {
                resources.insert_with_flags(entry.tag, entry.flags, ResourceData::Inline(entry.data));
                continue;
            }

            let offset = entry.data as usize;
            let chunk = read_u32_le(file, offset).and_then(|len| {
                sub_slice(file, offset as u64 + 4, len as u64)
            });
            match chunk {
                Some(chunk) => {
                    resources.insert_with_flags(
                        entry.tag,
                        entry.flags,
                        ResourceData::Chunk(chunk.to_vec()),
                    );
                }
                None if permissive => {
                    log::warn!(
                        "skipping resource {:?}: chunk at offset {} is outside the file",
                        entry.tag,
                        offset
                    );
                }
                None => {
                    let len = read_u32_le(file, offset).unwrap_or(0) as u64;
                    return Err(LayoutError::TruncatedData {
                        required: offset as u64 + 4 + len,
                        available: file.len() as u64,
                    });
                }
            }
        }
        Ok(resources)
    }

    pub fn get(&self, tag: ResourceTag) -> Option<&ResourceData> {
        self.entries.get(&tag).map(|entry| &entry.data)
    }
    /// The flags byte of the directory entry of a resource.
    pub fn flags(&self, tag: ResourceTag) -> Option<ResourceFlags> {
        self.entries.get(&tag).map(|entry| entry.flags)
    }
    /// Inserts a resource and returns the previous one of the same tag.
    ///
    /// A replaced resource keeps its flags. New resources have no flags.
    /// Image tags are managed by the encoder and cannot be inserted.
    pub fn insert(&mut self, tag: ResourceTag, data: ResourceData) -> Option<ResourceData> {
        let flags = self.flags(tag).unwrap_or(ResourceFlags::empty());
        self.insert_with_flags(tag, flags, data)
    }
    /// Inserts a resource with the given flags byte.
    pub fn insert_with_flags(
        &mut self,
        tag: ResourceTag,
        flags: ResourceFlags,
        data: ResourceData,
    ) -> Option<ResourceData> {
        if tag.is_image() {
            return None;
        }
        self.entries
            .insert(tag, Entry { flags, data })
            .map(|previous| previous.data)
    }
    pub fn remove(&mut self, tag: ResourceTag) -> Option<ResourceData> {
        self.entries.remove(&tag).map(|entry| entry.data)
    }
    pub fn iter(&self) -> impl Iterator<Item = (ResourceTag, &ResourceData)> {
        self.entries.iter().map(|(tag, entry)| (*tag, &entry.data))
    }
    pub fn len(&self) -> usize {
        self.entries.len()
    }
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn lod_control(&self) -> Option<LodControl> {
        match self.get(ResourceTag::LOD_CONTROL)? {
            ResourceData::Inline(data) => Some(LodControl::from_resource_data(*data)),
            ResourceData::Chunk(_) => None,
        }
    }
    /// Sets or removes the LOD control resource.
    ///
    /// The upper two bytes of an existing inline value are kept.
    pub fn set_lod_control(&mut self, lod: Option<LodControl>) {
        match lod {
            Some(lod) => {
                let upper = match self.get(ResourceTag::LOD_CONTROL) {
                    Some(ResourceData::Inline(data)) => data & 0xFFFF_0000,
                    _ => 0,
                };
                self.insert(
                    ResourceTag::LOD_CONTROL,
                    ResourceData::Inline(upper | lod.to_resource_data()),
                );
            }
            None => {
                self.remove(ResourceTag::LOD_CONTROL);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ImageFormat, ResourceEntry, Version};

    #[test]
    fn reads_inline_and_chunked_resources() {
        let mut header = Header::new(Version::V7_3, 4, 4, ImageFormat::RGBA8888);
        header.resources = vec![
            ResourceEntry {
                tag: ResourceTag::HIGH_RES_IMAGE,
                flags: ResourceFlags::empty(),
                data: 200,
            },
            ResourceEntry {
                tag: ResourceTag::LOD_CONTROL,
                flags: ResourceFlags::NO_DATA_CHUNK,
                data: 0x0506,
            },
            ResourceEntry {
                tag: ResourceTag::KEY_VALUES,
                flags: ResourceFlags::empty(),
                data: 4,
            },
        ];
        let file = [0, 0, 0, 0, 3, 0, 0, 0, b'a', b'b', b'c'];

        let resources = Resources::read(&header, &file, false).unwrap();
        assert_eq!(resources.len(), 2);
        assert_eq!(resources.lod_control(), Some(LodControl::new(6, 5)));
        assert_eq!(
            resources.get(ResourceTag::KEY_VALUES),
            Some(&ResourceData::Chunk(b"abc".to_vec()))
        );
    }

    #[test]
    fn chunks_outside_the_file() {
        let mut header = Header::new(Version::V7_3, 4, 4, ImageFormat::RGBA8888);
        header.resources = vec![ResourceEntry {
            tag: ResourceTag::KEY_VALUES,
            flags: ResourceFlags::empty(),
            data: 2,
        }];
        let file = [0, 0, 10, 0, 0, 0, 1];

        assert!(matches!(
            Resources::read(&header, &file, false),
            Err(LayoutError::TruncatedData { .. })
        ));
        assert!(Resources::read(&header, &file, true).unwrap().is_empty());
    }

    #[test]
    fn image_tags_are_rejected() {
        let mut resources = Resources::new();
        resources.insert(ResourceTag::HIGH_RES_IMAGE, ResourceData::Inline(0));
        assert!(resources.is_empty());
    }

    #[test]
    fn lod_control_keeps_the_upper_bytes() {
        let mut resources = Resources::new();
        resources.insert_with_flags(
            ResourceTag::LOD_CONTROL,
            ResourceFlags::from_bits_retain(0x06),
            ResourceData::Inline(0xBEEF_0504),
        );
        assert_eq!(resources.lod_control(), Some(LodControl::new(4, 5)));

        resources.set_lod_control(Some(LodControl::new(1, 2)));
        assert_eq!(
            resources.get(ResourceTag::LOD_CONTROL),
            Some(&ResourceData::Inline(0xBEEF_0201))
        );
        assert_eq!(
            resources.flags(ResourceTag::LOD_CONTROL),
            Some(ResourceFlags::from_bits_retain(0x06))
        );
    }
}
