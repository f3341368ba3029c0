#![no_main]

use featstream::format::ByteOrderSetting;
use featstream::io::FrameFile;
use featstream::spro4::SPro4;
use featstream::stream::FeatureCodec;
use libfuzzer_sys::fuzz_target;
use std::io::Cursor;

fuzz_target!(|data: &[u8]| {
    // Header parsing must reject malformed input with an error, never panic
    for setting in [
        ByteOrderSetting::Auto,
        ByteOrderSetting::Big,
        ByteOrderSetting::Little,
    ] {
        let Ok(mut file) = FrameFile::new(Cursor::new(data)) else {
            return;
        };
        if let Ok(descriptor) = SPro4::read_header(&mut file, setting, "fuzz") {
            // Every frame addressed by the descriptor lies inside the input
            let end = descriptor.frame_offset(descriptor.feature_count);
            assert!(end <= data.len() as u64);
            assert_eq!(descriptor.sources.total(), descriptor.feature_count);
        }
    }
});
