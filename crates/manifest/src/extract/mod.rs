//! 이미지 참조 추출 -- 렌더링된 매니페스트 텍스트에서 컨테이너 이미지 참조를 찾습니다.
//!
//! [`ImageExtractor`] trait은 추출 전략이 구현해야 하는 인터페이스입니다.
//! 오케스트레이터는 이 trait에만 의존하므로 전략을 바꿔도 영향을 받지 않습니다.
//!
//! # 지원 전략
//!
//! - 라인 스캔 ([`LineImageExtractor`]): 깨진 YAML, 템플릿 잔여물에도 동작하는 기본 전략
//! - 구조화 파싱 ([`StructuredImageExtractor`]): 모든 문서가 유효한 YAML이어야 하지만 오탐이 없음
//!
//! 두 전략 모두 첫 등장 순서를 유지하며 완전 일치 문자열 기준으로 중복을 제거합니다.

pub mod line;
pub mod structured;

pub use line::LineImageExtractor;
pub use structured::StructuredImageExtractor;

use chartscan_core::types::{ExtractorKind, ImageReference};
use indexmap::IndexSet;

use crate::error::ManifestError;

/// 발견 순서를 유지하는 이미지 참조 집합
pub type ImageSet = IndexSet<ImageReference>;

/// 이미지 참조 추출 trait
pub trait ImageExtractor: Send + Sync {
    /// 전략 이름 (로그용)
    fn name(&self) -> &str;

    /// 매니페스트 텍스트에서 이미지 참조를 추출합니다.
    ///
    /// 같은 입력에 대해 항상 같은 순서의 결과를 반환해야 합니다.
    fn extract(&self, manifest: &str) -> Result<ImageSet, ManifestError>;
}

/// 설정된 종류에 맞는 추출기를 생성합니다.
pub fn extractor_for(kind: ExtractorKind) -> Box<dyn ImageExtractor> {
    match kind {
        ExtractorKind::Line => Box::new(LineImageExtractor::new()),
        ExtractorKind::Structured => Box::new(StructuredImageExtractor::new()),
    }
}

/// 값 양끝의 공백을 제거하고, 짝이 맞는 따옴표 한 겹을 벗겨냅니다.
pub(crate) fn normalize_value(raw: &str) -> &str {
    let value = raw.trim();
    let bytes = value.as_bytes();
    if bytes.len() >= 2 {
        let (first, last) = (bytes[0], bytes[bytes.len() - 1]);
        if first == last && (first == b'"' || first == b'\'') {
            return &value[1..value.len() - 1];
        }
    }
    value
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_strips_one_layer_of_matching_quotes() {
        assert_eq!(normalize_value("\"repo/img:tag\""), "repo/img:tag");
        assert_eq!(normalize_value("'repo/img:tag'"), "repo/img:tag");
        assert_eq!(normalize_value("  repo/img:tag  "), "repo/img:tag");
        assert_eq!(normalize_value("\"'nested'\""), "'nested'");
    }

    #[test]
    fn normalize_keeps_unbalanced_quotes() {
        assert_eq!(normalize_value("\"repo/img"), "\"repo/img");
        assert_eq!(normalize_value("'repo/img\""), "'repo/img\"");
        assert_eq!(normalize_value("\""), "\"");
    }

    #[test]
    fn extractor_for_selects_strategy() {
        assert_eq!(extractor_for(ExtractorKind::Line).name(), "line");
        assert_eq!(extractor_for(ExtractorKind::Structured).name(), "structured");
    }

    #[test]
    fn strategies_agree_on_well_formed_manifest() {
        let manifest = r#"
apiVersion: v1
kind: Pod
metadata:
  name: demo
spec:
  containers:
    - name: app
      image: a:1
    - name: sidecar
      image: "b:2"
"#;
        let line = extractor_for(ExtractorKind::Line).extract(manifest).unwrap();
        let structured = extractor_for(ExtractorKind::Structured)
            .extract(manifest)
            .unwrap();
        assert_eq!(line, structured);
    }
}
