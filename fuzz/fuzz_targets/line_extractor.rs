#![no_main]

use chartscan_manifest::{ImageExtractor, LineImageExtractor};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(text) = std::str::from_utf8(data) {
        let extractor = LineImageExtractor::new();
        let images = extractor.extract(text).expect("line extraction never fails");

        for image in &images {
            assert!(!image.as_str().contains('\n'));
        }
        let again = extractor.extract(text).expect("line extraction never fails");
        assert!(images.iter().eq(again.iter()));
    }
});
