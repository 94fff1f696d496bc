//! 차트 디스크립터 -- `Chart.yaml`에서 차트 식별 레이블을 만듭니다.
//!
//! 디스크립터를 읽지 못하거나 `name`/`version`이 없으면 실행 전체가 중단되어야 하므로
//! 모든 실패는 [`ManifestError::ChartDescriptor`]로 반환됩니다.

use std::path::Path;

use serde::Deserialize;
use serde_yaml::Value;

use crate::error::ManifestError;

/// 차트 디스크립터 파일명
pub const CHART_DESCRIPTOR_FILE: &str = "Chart.yaml";

/// 디스크립터 파일 최대 크기
const MAX_DESCRIPTOR_SIZE: u64 = 1024 * 1024; // 1MB

/// 차트 식별 정보
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartDescriptor {
    /// 차트 이름
    pub name: String,
    /// 차트 버전
    pub version: String,
}

/// YAML 역직렬화용 원시 구조. 숫자 버전(`version: 1.0`)도 받아들이기 위해 `Value`로 받습니다.
#[derive(Debug, Deserialize)]
struct RawDescriptor {
    name: Option<Value>,
    version: Option<Value>,
}

impl ChartDescriptor {
    /// `name@version` 형식의 레이블을 반환합니다.
    pub fn label(&self) -> String {
        format!("{}@{}", self.name, self.version)
    }

    /// 입력 디렉토리의 `Chart.yaml`을 로드합니다.
    ///
    /// # Errors
    ///
    /// 파일이 없거나, 너무 크거나, YAML이 아니거나, `name`/`version`이 없으면
    /// `ManifestError::ChartDescriptor`를 반환합니다.
    pub async fn load(input_dir: impl AsRef<Path>) -> Result<Self, ManifestError> {
        let path = input_dir.as_ref().join(CHART_DESCRIPTOR_FILE);
        let source = path.display().to_string();

        let metadata =
            tokio::fs::metadata(&path)
                .await
                .map_err(|e| ManifestError::ChartDescriptor {
                    path: source.clone(),
                    reason: format!("failed to read file metadata: {e}"),
                })?;

        if metadata.len() > MAX_DESCRIPTOR_SIZE {
            return Err(ManifestError::ChartDescriptor {
                path: source,
                reason: format!(
                    "file too large: {} bytes (max: {MAX_DESCRIPTOR_SIZE})",
                    metadata.len()
                ),
            });
        }

        let content =
            tokio::fs::read_to_string(&path)
                .await
                .map_err(|e| ManifestError::ChartDescriptor {
                    path: source.clone(),
                    reason: format!("failed to read file: {e}"),
                })?;

        Self::parse_yaml(&content, &source)
    }

    /// YAML 문자열에서 디스크립터를 파싱합니다.
    pub fn parse_yaml(yaml_str: &str, source: &str) -> Result<Self, ManifestError> {
        let raw: RawDescriptor =
            serde_yaml::from_str(yaml_str).map_err(|e| ManifestError::ChartDescriptor {
                path: source.to_owned(),
                reason: format!("YAML parse error: {e}"),
            })?;

        let name = required_scalar(raw.name, "name", source)?;
        let version = required_scalar(raw.version, "version", source)?;

        Ok(Self { name, version })
    }
}

/// 스칼라 값을 문자열로 꺼냅니다. 비어 있거나 매핑/시퀀스이면 에러입니다.
fn required_scalar(value: Option<Value>, field: &str, source: &str) -> Result<String, ManifestError> {
    let text = match value {
        Some(Value::String(s)) => s,
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        Some(Value::Null) | None => String::new(),
        Some(_) => {
            return Err(ManifestError::ChartDescriptor {
                path: source.to_owned(),
                reason: format!("field '{field}' must be a scalar"),
            });
        }
    };

    let text = text.trim().to_owned();
    if text.is_empty() {
        return Err(ManifestError::ChartDescriptor {
            path: source.to_owned(),
            reason: format!("missing required field '{field}'"),
        });
    }
    Ok(text)
}
