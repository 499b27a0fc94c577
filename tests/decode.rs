use vtf::*;

mod util;
use util::*;

fn rgba_file(version: Version, width: u16, height: u16) -> (Vec<u8>, Vec<u8>) {
    let header = Header::new(version, width, height, ImageFormat::RGBA8888);
    let data: Vec<u8> = (0..width as usize * height as usize * 4)
        .map(|i| (i * 7) as u8)
        .collect();
    (file_with(&header, &data), data)
}

#[test]
fn single_surface() {
    for version in [Version::V7_0, Version::V7_1, Version::V7_2] {
        let (file, data) = rgba_file(version, 4, 4);

        let decoder = VtfDecoder::new(&file).unwrap();
        assert_eq!(decoder.format(), ImageFormat::RGBA8888);
        assert_eq!(decoder.shape(), ImageShape::new(4, 4));
        assert!(decoder.resources().is_empty());
        assert_eq!(decoder.read_low_res().unwrap(), None);
        assert_eq!(
            decoder.read_unit_raw(UnitIndex::default()).unwrap(),
            &data[..]
        );

        let image = decode(&file).unwrap();
        assert_eq!(image.len(), 1);
        assert_eq!(image.main().unwrap().data(), &data[..]);
    }
}

#[test]
fn mips_and_low_res_image() {
    let mut header = Header::new(Version::V7_2, 2, 2, ImageFormat::BGR888);
    header.mipmap_count = 2;
    header.low_res_format = Some(ImageFormat::DXT1);
    header.low_res_width = 2;
    header.low_res_height = 2;

    let mut data = Vec::new();
    // low-res: a solid red DXT1 block
    data.extend_from_slice(&[0x00, 0xF8, 0x00, 0x00, 0, 0, 0, 0]);
    // mip 1, 1x1
    data.extend_from_slice(&[3, 2, 1]);
    // mip 0, 2x2
    data.extend_from_slice(&[10, 20, 30, 40, 50, 60, 70, 80, 90, 100, 110, 120]);
    let file = file_with(&header, &data);

    let decoder = VtfDecoder::new(&file).unwrap();
    assert_eq!(decoder.shape().mipmaps, 2);

    let low_res = decoder.read_low_res().unwrap().unwrap();
    assert_eq!(low_res.size(), Size::new(2, 2));
    assert!(low_res.pixels().all(|p| p == [255, 0, 0, 255]));

    let mip1 = decoder.read_unit(UnitIndex::new(1, 0, 0, 0)).unwrap();
    assert_eq!(mip1.data(), &[1, 2, 3, 255]);

    let mip0 = decoder.read_unit(UnitIndex::default()).unwrap();
    assert_eq!(mip0.pixel(0, 0), [30, 20, 10, 255]);
    assert_eq!(mip0.pixel(1, 1), [120, 110, 100, 255]);

    let image = decoder.decode_all().unwrap();
    assert_eq!(image.len(), 2);
    assert_eq!(image.get(UnitIndex::new(1, 0, 0, 0)), Some(&mip1));
}

/// A 7.2 DXT1 8x8 texture with 4 mipmaps, 2 frames, and a 1x1 thumbnail,
/// written field by field.
fn dxt1_animation_file() -> Vec<u8> {
    let mut file = vec![0_u8; 80];
    file[0..4].copy_from_slice(b"VTF\0");
    file[4..8].copy_from_slice(&7_u32.to_le_bytes());
    file[8..12].copy_from_slice(&2_u32.to_le_bytes());
    file[12..16].copy_from_slice(&80_u32.to_le_bytes());
    file[16..18].copy_from_slice(&8_u16.to_le_bytes());
    file[18..20].copy_from_slice(&8_u16.to_le_bytes());
    file[24..26].copy_from_slice(&2_u16.to_le_bytes());
    file[48..52].copy_from_slice(&1.0_f32.to_le_bytes());
    file[52..56].copy_from_slice(&13_i32.to_le_bytes());
    file[56] = 4;
    file[57..61].copy_from_slice(&13_i32.to_le_bytes());
    file[61] = 1;
    file[62] = 1;
    file[63..65].copy_from_slice(&1_u16.to_le_bytes());

    file.extend_from_slice(&[0xAA; 8]);
    for (mip, len) in [(3_u8, 8), (2, 8), (1, 8), (0, 32)] {
        for frame in 0..2_u8 {
            file.extend(std::iter::repeat(0x10 * (mip + 1) + frame).take(len));
        }
    }
    file
}

#[test]
fn dxt1_animation_offsets() {
    let file = dxt1_animation_file();
    assert_eq!(file.len(), 200);

    let mut header = Header::new(Version::V7_2, 8, 8, ImageFormat::DXT1);
    header.frames = 2;
    header.mipmap_count = 4;
    header.low_res_format = Some(ImageFormat::DXT1);
    header.low_res_width = 1;
    header.low_res_height = 1;
    assert_eq!(header.to_bytes(), &file[..80]);

    let decoder = VtfDecoder::new(&file).unwrap();
    assert_eq!(Header::parse(&file).unwrap(), header);
    let layout = decoder.layout();
    let (format, low_res) = layout.low_res().unwrap();
    assert_eq!(format, ImageFormat::DXT1);
    assert_eq!(low_res.data_range(), 80..88);

    let expected = [
        ((3, 0), 88..96),
        ((3, 1), 96..104),
        ((2, 0), 104..112),
        ((2, 1), 112..120),
        ((1, 0), 120..128),
        ((1, 1), 128..136),
        ((0, 0), 136..168),
        ((0, 1), 168..200),
    ];
    for ((mip, frame), range) in expected {
        assert_eq!(layout.unit_at(mip, frame, 0, 0).unwrap(), range, "{mip} {frame}");
        let raw = decoder.read_unit_raw(UnitIndex::new(mip, frame, 0, 0)).unwrap();
        assert!(raw.iter().all(|&b| b == 0x10 * (mip + 1) + frame as u8));
    }
    assert_eq!(layout.required_file_len(), 200);

    let error = VtfDecoder::new(&file[..199]).err().unwrap();
    assert_eq!(error.kind(), ErrorKind::TruncatedData);
}

#[test]
fn truncated_data() {
    let (file, _) = rgba_file(Version::V7_2, 4, 4);
    let error = VtfDecoder::new(&file[..file.len() - 1]).err().unwrap();
    assert_eq!(error.kind(), ErrorKind::TruncatedData);

    let error = VtfDecoder::new(&file[..40]).err().unwrap();
    assert_eq!(error.kind(), ErrorKind::TruncatedHeader);
}

#[test]
fn bad_signature() {
    let (mut file, _) = rgba_file(Version::V7_2, 4, 4);
    file[0] = b'X';
    let error = decode(&file).unwrap_err();
    assert_eq!(error.kind(), ErrorKind::BadSignature);
}

#[test]
fn non_power_of_two() {
    let (file, data) = rgba_file(Version::V7_2, 100, 64);

    let error = VtfDecoder::new(&file).err().unwrap();
    assert_eq!(error.kind(), ErrorKind::DimensionNotPowerOfTwo);

    let mut options = Options::default();
    options.permissive = true;
    let decoder = VtfDecoder::new_with(&file, options).unwrap();
    let surface = decoder.read_unit(UnitIndex::default()).unwrap();
    assert_eq!(surface.size(), Size::new(100, 64));
    assert_eq!(surface.data(), &data[..]);
}

#[test]
fn invalid_mipmap_count() {
    let mut header = Header::new(Version::V7_2, 4, 4, ImageFormat::RGBA8888);
    header.mipmap_count = 5;
    let file = file_with(&header, &[0; 84]);

    let error = VtfDecoder::new(&file).err().unwrap();
    assert_eq!(error.kind(), ErrorKind::InvalidLayout);

    let mut options = Options::default();
    options.permissive = true;
    let decoder = VtfDecoder::new_with(&file, options).unwrap();
    assert_eq!(decoder.shape().mipmaps, 3);
}

#[test]
fn memory_limit() {
    let (file, _) = rgba_file(Version::V7_2, 4, 4);

    let mut options = Options::default();
    options.memory_limit = 32;
    let decoder = VtfDecoder::new_with(&file, options).unwrap();
    let error = decoder.read_unit(UnitIndex::default()).unwrap_err();
    assert_eq!(error.kind(), ErrorKind::OutOfMemory);
    let error = decoder.decode_all().unwrap_err();
    assert_eq!(error.kind(), ErrorKind::OutOfMemory);

    let mut options = Options::default();
    options.memory_limit = 64;
    let decoder = VtfDecoder::new_with(&file, options).unwrap();
    assert!(decoder.decode_all().is_ok());
}

#[test]
fn resources() {
    let mut header = Header::new(Version::V7_3, 4, 4, ImageFormat::RGBA8888);
    header.header_size = Version::V7_3.header_size(3);
    let kvd_offset = header.header_size;
    let high_res_offset = kvd_offset + 4 + 5;
    header.resources = vec![
        ResourceEntry {
            tag: ResourceTag::HIGH_RES_IMAGE,
            flags: ResourceFlags::empty(),
            data: high_res_offset,
        },
        ResourceEntry {
            tag: ResourceTag::LOD_CONTROL,
            flags: ResourceFlags::NO_DATA_CHUNK,
            data: LodControl::new(3, 4).to_resource_data(),
        },
        ResourceEntry {
            tag: ResourceTag::KEY_VALUES,
            flags: ResourceFlags::empty(),
            data: kvd_offset,
        },
    ];

    let pixels: Vec<u8> = (0..64).collect();
    let mut data = Vec::new();
    data.extend_from_slice(&5_u32.to_le_bytes());
    data.extend_from_slice(b"hello");
    data.extend_from_slice(&pixels);
    let file = file_with(&header, &data);

    let decoder = VtfDecoder::new(&file).unwrap();
    let resources = decoder.resources();
    assert_eq!(resources.len(), 2);
    assert_eq!(resources.lod_control(), Some(LodControl::new(3, 4)));
    assert_eq!(
        resources.get(ResourceTag::KEY_VALUES),
        Some(&ResourceData::Chunk(b"hello".to_vec()))
    );
    assert_eq!(
        decoder.read_unit(UnitIndex::default()).unwrap().data(),
        &pixels[..]
    );

    // chunk length points past the end of the file
    let mut broken = file.clone();
    let offset = kvd_offset as usize;
    broken[offset..offset + 4].copy_from_slice(&1000_u32.to_le_bytes());
    let error = VtfDecoder::new(&broken).err().unwrap();
    assert_eq!(error.kind(), ErrorKind::TruncatedData);

    let mut options = Options::default();
    options.permissive = true;
    let decoder = VtfDecoder::new_with(&broken, options).unwrap();
    assert_eq!(decoder.resources().get(ResourceTag::KEY_VALUES), None);
    assert_eq!(decoder.resources().lod_control(), Some(LodControl::new(3, 4)));
}

#[test]
fn environment_maps() {
    for (version, first_frame, faces) in [
        (Version::V7_2, 0, 6),
        (Version::V7_4, 0xFFFF, 7),
        (Version::V7_5, 0xFFFF, 6),
    ] {
        let mut header = Header::new(version, 4, 4, ImageFormat::RGBA8888);
        header.flags = TextureFlags::ENVMAP;
        header.first_frame = first_frame;
        let data: Vec<u8> = (0..7 * 64).map(|i| (i / 64) as u8).collect();
        let file = file_with(&header, &data);

        let decoder = VtfDecoder::new(&file).unwrap();
        assert_eq!(decoder.shape().faces, faces, "{version}");
        let last = decoder
            .read_unit(UnitIndex::new(0, 0, faces - 1, 0))
            .unwrap();
        assert_eq!(last.pixel(0, 0)[0], faces - 1);
        assert!(decoder.read_unit(UnitIndex::new(0, 0, faces, 0)).is_err());
    }
}

#[test]
fn volume_slices() {
    let mut header = Header::new(Version::V7_2, 2, 2, ImageFormat::I8);
    header.depth = 2;
    header.mipmap_count = 2;
    // mip 1 is 1x1x1, mip 0 is 2x2x2
    let data = [9, 1, 1, 1, 1, 2, 2, 2, 2];
    let file = file_with(&header, &data);

    let image = decode(&file).unwrap();
    assert_eq!(image.len(), 3);
    assert_eq!(
        image.get(UnitIndex::new(1, 0, 0, 0)).unwrap().pixel(0, 0),
        [9, 9, 9, 255]
    );
    assert_eq!(
        image.get(UnitIndex::new(0, 0, 0, 1)).unwrap().pixel(1, 1),
        [2, 2, 2, 255]
    );
}

#[test]
fn unsupported_formats_fail_lazily() {
    let header = Header::new(Version::V7_2, 4, 4, ImageFormat::P8);
    let file = file_with(&header, &[0; 16]);

    let decoder = VtfDecoder::new(&file).unwrap();
    assert_eq!(decoder.read_unit_raw(UnitIndex::default()).unwrap().len(), 16);
    let error = decoder.read_unit(UnitIndex::default()).unwrap_err();
    assert_eq!(error.kind(), ErrorKind::UnsupportedFormat);
}

#[test]
fn random_files_do_not_panic() {
    use rand::Rng;

    let mut rng = create_rng();
    let (file, _) = rgba_file(Version::V7_3, 8, 8);
    let mut options = Options::default();
    options.permissive = true;
    options.memory_limit = 1 << 20;

    for _ in 0..200 {
        let mut corrupted = file.clone();
        for _ in 0..4 {
            let i = rng.gen_range(0..corrupted.len());
            corrupted[i] = rng.gen();
        }
        if let Ok(decoder) = VtfDecoder::new_with(&corrupted, options.clone()) {
            let _ = decoder.decode_all();
            let _ = decoder.read_low_res();
        }
    }
}
