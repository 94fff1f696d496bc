//! 메트릭 상수 및 설명 등록
//!
//! 모든 메트릭의 이름과 설명을 중앙에서 정의합니다.
//! 레코더(exporter)는 설치하지 않으며, 레코더가 없으면 매크로 호출은 no-op입니다.
//! 라이브러리 사용자가 원하는 레코더를 설치하면 그대로 수집됩니다.
//!
//! # 네이밍 컨벤션
//!
//! - 접두어: `chartscan_`
//! - 접미어: `_total` (counter), `_seconds` (histogram/latency)
//!
//! # 사용 예시
//!
//! ```ignore
//! use metrics::counter;
//!
//! counter!(chartscan_core::metrics::IMAGES_DISCOVERED_TOTAL).increment(3);
//! ```

// ─── 레이블 키 상수 ────────────────────────────────────────────────

/// 결과 레이블 키 (success, failure)
pub const LABEL_RESULT: &str = "result";

/// 실패 단계 레이블 키 (pull, run, parse, timeout)
pub const LABEL_STAGE: &str = "stage";

// ─── 메트릭 이름 ──────────────────────────────────────────────────

/// 렌더링된 매니페스트에서 발견한 고유 이미지 수 (counter)
pub const IMAGES_DISCOVERED_TOTAL: &str = "chartscan_images_discovered_total";

/// 이미지 pull 시도 수 (counter, label: result)
pub const IMAGE_PULLS_TOTAL: &str = "chartscan_image_pulls_total";

/// 이미지 스캔 시도 수 (counter, label: result)
pub const SCANS_TOTAL: &str = "chartscan_scans_total";

/// 리포트에서 제외된 이미지 수 (counter, label: stage)
pub const IMAGES_DROPPED_TOTAL: &str = "chartscan_images_dropped_total";

/// 이미지 한 개의 pull + 스캔 소요 시간 (histogram, 초)
pub const SCAN_DURATION_SECONDS: &str = "chartscan_scan_duration_seconds";

/// 모든 메트릭의 설명을 등록합니다.
///
/// 레코더 설치 직후 한 번 호출합니다.
pub fn describe_all() {
    use metrics::{describe_counter, describe_histogram};

    describe_counter!(
        IMAGES_DISCOVERED_TOTAL,
        "Unique image references found in rendered manifests"
    );
    describe_counter!(IMAGE_PULLS_TOTAL, "Image pull attempts by result");
    describe_counter!(SCANS_TOTAL, "Vulnerability scan attempts by result");
    describe_counter!(
        IMAGES_DROPPED_TOTAL,
        "Images left out of the report, by failure stage"
    );
    describe_histogram!(
        SCAN_DURATION_SECONDS,
        "Time spent pulling and scanning one image"
    );
}
