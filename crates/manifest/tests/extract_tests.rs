//! 추출 전략 통합 테스트
//!
//! - 실제 `helm template` 출력 형태의 픽스처에서 두 전략 비교
//! - 템플릿 잔여물이 섞인 출력에서 라인 전략만 동작하는지 확인
//! - 파일 렌더러 + 추출기 + 차트 디스크립터 연결

use std::path::PathBuf;

use chartscan_core::types::{ExtractorKind, FailurePolicy};
use chartscan_manifest::{
    ChartDescriptor, FilesRenderer, ManifestError, ManifestRenderer, extractor_for,
};

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn names(kind: ExtractorKind, text: &str) -> Result<Vec<String>, ManifestError> {
    Ok(extractor_for(kind)
        .extract(text)?
        .into_iter()
        .map(|i| i.to_string())
        .collect())
}

#[test]
fn line_strategy_on_rendered_chart() {
    let text = std::fs::read_to_string(fixture("rendered.yaml")).unwrap();
    let images = names(ExtractorKind::Line, &text).unwrap();
    assert_eq!(
        images,
        vec![
            "ghcr.io/example/migrate:0.4.1",
            "ghcr.io/example/web:1.8.0",
            "prom/statsd-exporter:v0.26.0",
            "registry.example.com:5000/tools/cleanup@sha256:0123abcd",
        ]
    );
}

#[test]
fn structured_strategy_on_rendered_chart() {
    let text = std::fs::read_to_string(fixture("rendered.yaml")).unwrap();
    let mut images = names(ExtractorKind::Structured, &text).unwrap();
    images.sort();

    let mut expected = names(ExtractorKind::Line, &text).unwrap();
    expected.sort();
    assert_eq!(images, expected);
}

#[test]
fn line_strategy_survives_template_noise() {
    let text = std::fs::read_to_string(fixture("noisy.txt")).unwrap();
    let images = names(ExtractorKind::Line, &text).unwrap();
    assert_eq!(
        images,
        vec![
            "{{ .Values.image | quote }}",
            "sidecar:2",
            "a:1",
            "from-notes:9",
        ]
    );
}

#[test]
fn structured_strategy_rejects_template_noise() {
    let text = std::fs::read_to_string(fixture("noisy.txt")).unwrap();
    let err = names(ExtractorKind::Structured, &text).unwrap_err();
    assert!(matches!(err, ManifestError::Extract { .. }));
}

#[tokio::test]
async fn files_renderer_feeds_extractor() {
    let dir = fixture("chart");
    let output = FilesRenderer::new(1024 * 1024).render(&dir).await.unwrap();
    let text = output.enforce(FailurePolicy::FailFast).unwrap();

    assert!(!text.contains("appVersion"), "Chart.yaml must not be rendered");
    assert_eq!(names(ExtractorKind::Line, &text).unwrap(), vec!["a:1", "b:2"]);

    let chart = ChartDescriptor::load(&dir).await.unwrap();
    assert_eq!(chart.label(), "demo@0.3.0");
}
