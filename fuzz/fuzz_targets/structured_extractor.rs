#![no_main]

use chartscan_manifest::{ImageExtractor, StructuredImageExtractor};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(text) = std::str::from_utf8(data) {
        // 입력 크기 제한 (YAML alias 폭증 방지)
        if text.len() > 64 * 1024 {
            return;
        }
        let _ = StructuredImageExtractor::new().extract(text);
    }
});
