#![no_main]

use chartscan_manifest::ChartDescriptor;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(text) = std::str::from_utf8(data) {
        if let Ok(chart) = ChartDescriptor::parse_yaml(text, "fuzz/Chart.yaml") {
            assert!(!chart.name.is_empty());
            assert!(!chart.version.is_empty());
            assert_eq!(chart.label(), format!("{}@{}", chart.name, chart.version));
        }
    }
});
