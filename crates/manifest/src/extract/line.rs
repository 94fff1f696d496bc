//! 라인 스캔 추출기
//!
//! 각 줄을 trim한 뒤 `image:`로 시작하면 첫 번째 `": "`에서 키와 값을 나눕니다.
//! 레지스트리 포트나 태그처럼 값 안의 콜론은 그대로 보존됩니다.
//!
//! 주석이나 매니페스트가 아닌 텍스트 안의 `image:` 줄도 포함됩니다 (오탐 허용).
//! `- image: x`처럼 리스트 항목 접두어가 붙은 줄은 매칭하지 않습니다.

use chartscan_core::types::ImageReference;

use super::{ImageExtractor, ImageSet, normalize_value};
use crate::error::ManifestError;

const IMAGE_KEY_PREFIX: &str = "image:";
const KEY_VALUE_SEPARATOR: &str = ": ";

/// 라인 스캔 추출기
#[derive(Debug, Clone, Copy, Default)]
pub struct LineImageExtractor;

impl LineImageExtractor {
    /// 새 추출기를 생성합니다.
    pub fn new() -> Self {
        Self
    }

    /// 한 줄에서 이미지 참조를 꺼냅니다. 매칭되지 않으면 `None`.
    ///
    /// 값이 따옴표 한 쌍뿐이면 빈 문자열을 그대로 돌려줍니다.
    pub fn parse_line(line: &str) -> Option<&str> {
        let trimmed = line.trim();
        if !trimmed.starts_with(IMAGE_KEY_PREFIX) {
            return None;
        }

        let (_, value) = trimmed.split_once(KEY_VALUE_SEPARATOR)?;
        Some(normalize_value(value))
    }
}

impl ImageExtractor for LineImageExtractor {
    fn name(&self) -> &str {
        "line"
    }

    fn extract(&self, manifest: &str) -> Result<ImageSet, ManifestError> {
        let images = manifest
            .lines()
            .filter_map(Self::parse_line)
            .map(ImageReference::from)
            .collect();
        Ok(images)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extract(text: &str) -> Vec<String> {
        LineImageExtractor::new()
            .extract(text)
            .unwrap()
            .into_iter()
            .map(|i| i.to_string())
            .collect()
    }

    #[test]
    fn preserves_discovery_order() {
        assert_eq!(extract("image: b\nimage: a\n"), vec!["b", "a"]);
    }

    #[test]
    fn deduplicates_exact_matches() {
        assert_eq!(
            extract("  image: nginx:1.25\n---\n    image: nginx:1.25\n"),
            vec!["nginx:1.25"]
        );
    }

    #[test]
    fn equivalent_spellings_are_not_normalized() {
        assert_eq!(
            extract("image: nginx\nimage: nginx:latest\n"),
            vec!["nginx", "nginx:latest"]
        );
    }

    #[test]
    fn quoting_variants_yield_same_reference() {
        assert_eq!(
            extract("image: \"repo/img:tag\"\nimage: 'repo/img:tag'\nimage: repo/img:tag\n"),
            vec!["repo/img:tag"]
        );
    }

    #[test]
    fn colons_in_value_are_preserved() {
        assert_eq!(
            extract("image: registry:5000/repo:tag"),
            vec!["registry:5000/repo:tag"]
        );
        assert_eq!(
            extract("image: repo@sha256:abcd: ef"),
            vec!["repo@sha256:abcd: ef"]
        );
    }

    #[test]
    fn similar_keys_are_ignored() {
        assert!(extract("imageTag: something\nimagePullPolicy: Always\n").is_empty());
    }

    #[test]
    fn key_without_value_is_ignored() {
        assert!(extract("image:\nimage:   \nimage:nginx\n").is_empty());
    }

    #[test]
    fn quoted_empty_value_is_kept_once() {
        assert_eq!(
            extract("image: \"\"\nimage: ''\nimage: a:1\n"),
            vec!["", "a:1"]
        );
    }

    #[test]
    fn list_item_prefix_is_not_matched() {
        assert!(extract("- image: nginx\n").is_empty());
    }

    #[test]
    fn comment_lines_starting_with_key_are_included() {
        // 라인 스캔은 문맥을 보지 않음
        assert_eq!(extract("image: from-notes\n"), vec!["from-notes"]);
        assert!(extract("# image: commented\n").is_empty());
    }

    #[test]
    fn tolerates_non_yaml_noise() {
        let text = "WARNING: {{ broken template\n  image: a:1\n%%%\n\timage: b:2\r\n";
        assert_eq!(extract(text), vec!["a:1", "b:2"]);
    }

    #[test]
    fn extraction_is_deterministic() {
        let text = "image: c\nimage: a\nimage: c\nimage: b\n";
        assert_eq!(extract(text), extract(text));
    }

    #[test]
    fn empty_input_yields_nothing() {
        assert!(extract("").is_empty());
    }
}
