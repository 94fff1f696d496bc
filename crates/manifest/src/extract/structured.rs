//! 구조화 추출기
//!
//! 매니페스트를 멀티 문서 YAML로 파싱하고 파드 스펙 위치에서
//! `containers[].image`와 `initContainers[].image`를 수집합니다.
//!
//! # 탐색 위치
//!
//! - `spec` (Pod)
//! - `spec.template.spec` (Deployment, StatefulSet, DaemonSet, Job, ReplicaSet)
//! - `spec.jobTemplate.spec.template.spec` (CronJob)
//!
//! `kind: List` 문서는 `items`의 각 항목을 같은 규칙으로 탐색합니다.
//! 빈 문서는 건너뛰고, 유효하지 않은 문서가 하나라도 있으면 에러입니다.

use chartscan_core::types::ImageReference;
use serde::Deserialize;
use serde_yaml::Value;

use super::{ImageExtractor, ImageSet, normalize_value};
use crate::error::ManifestError;

/// 파드 스펙까지의 경로 목록
const POD_SPEC_PATHS: &[&[&str]] = &[
    &["spec"],
    &["spec", "template", "spec"],
    &["spec", "jobTemplate", "spec", "template", "spec"],
];

/// 파드 스펙 안의 컨테이너 목록 키
const CONTAINER_KEYS: &[&str] = &["containers", "initContainers"];

/// 구조화 추출기
#[derive(Debug, Clone, Copy, Default)]
pub struct StructuredImageExtractor;

impl StructuredImageExtractor {
    /// 새 추출기를 생성합니다.
    pub fn new() -> Self {
        Self
    }

    fn collect_resource(resource: &Value, images: &mut ImageSet) {
        if let Some(items) = resource.get("items").and_then(Value::as_sequence) {
            for item in items {
                Self::collect_resource(item, images);
            }
        }

        for path in POD_SPEC_PATHS {
            let Some(pod_spec) = lookup(resource, path) else {
                continue;
            };
            for key in CONTAINER_KEYS {
                let Some(containers) = pod_spec.get(*key).and_then(Value::as_sequence) else {
                    continue;
                };
                for container in containers {
                    if let Some(image) = container.get("image").and_then(Value::as_str) {
                        images.insert(ImageReference::from(normalize_value(image)));
                    }
                }
            }
        }
    }
}

impl ImageExtractor for StructuredImageExtractor {
    fn name(&self) -> &str {
        "structured"
    }

    fn extract(&self, manifest: &str) -> Result<ImageSet, ManifestError> {
        let mut images = ImageSet::new();

        for (index, document) in serde_yaml::Deserializer::from_str(manifest).enumerate() {
            let value = Value::deserialize(document).map_err(|e| ManifestError::Extract {
                document: index,
                reason: e.to_string(),
            })?;

            if value.is_null() {
                continue;
            }
            Self::collect_resource(&value, &mut images);
        }

        Ok(images)
    }
}

fn lookup<'a>(value: &'a Value, path: &[&str]) -> Option<&'a Value> {
    path.iter().try_fold(value, |current, key| current.get(*key))
}
