#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Just no panic
    let mut options = vtf::Options::default();
    options.permissive = true;
    options.memory_limit = 1 << 20;
    if let Ok(decoder) = vtf::VtfDecoder::new_with(data, options) {
        let layout = decoder.layout();
        for (index, _) in layout.iter_units().take(64) {
            _ = decoder.read_unit(index);
        }
        _ = decoder.read_low_res();

        if let Ok(image) = decoder.decode_all() {
            let options = vtf::EncodeOptions::from_decoder(&decoder);
            _ = vtf::encode(&image, &options);
        }
    }
});
