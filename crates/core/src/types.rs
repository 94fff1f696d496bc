//! 도메인 타입: 시스템 전역에서 사용되는 공통 타입
//!
//! 이미지 참조, 스캔 결과, 최종 리포트, 인증 토큰 등
//! 모든 크레이트가 공유하는 데이터 구조를 정의합니다.

use std::fmt;
use std::str::FromStr;

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

use crate::error::ConfigError;

/// 컨테이너 이미지 참조 (registry/repository:tag 또는 digest)
///
/// 공백 제거와 따옴표 제거 외에는 어떠한 파싱이나 정규화도 하지 않습니다.
/// 동일성은 문자열 완전 일치로 판단합니다 (`nginx`와 `nginx:latest`는 서로 다른 이미지).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImageReference(String);

impl ImageReference {
    /// 문자열로부터 이미지 참조를 생성합니다.
    pub fn new(reference: impl Into<String>) -> Self {
        Self(reference.into())
    }

    /// 원본 문자열을 반환합니다.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ImageReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ImageReference {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl From<String> for ImageReference {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// 이미지 한 개의 스캔 결과
///
/// 스캔에 실패한 이미지는 리포트에서 제외되므로 여기에는 실패 상태가 없습니다.
#[derive(Debug, Clone, PartialEq)]
pub enum ScanOutcome {
    /// 스캐너가 출력한 구조화 데이터 (스키마를 해석하지 않고 그대로 전달)
    Findings(serde_json::Value),
    /// 스캔 비활성화 시 빈 객체(`{}`)로 직렬화되는 자리표시자
    Skipped,
}

impl Serialize for ScanOutcome {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Findings(value) => value.serialize(serializer),
            Self::Skipped => serializer.serialize_map(Some(0))?.end(),
        }
    }
}

/// 리포트의 이미지 항목
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageEntry {
    /// 이미지 참조
    pub image_name: ImageReference,
    /// 스캔 결과
    pub results: ScanOutcome,
}

/// 최종 리포트
///
/// `images`는 추출기가 이미지를 발견한 순서를 그대로 유지합니다.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    /// 차트 식별 레이블 (`name@version`)
    pub chart_label: String,
    /// 이미지별 스캔 결과
    pub images: Vec<ImageEntry>,
}

impl Report {
    /// 이미지 항목이 비어 있는 리포트를 생성합니다.
    pub fn new(chart_label: impl Into<String>) -> Self {
        Self {
            chart_label: chart_label.into(),
            images: Vec::new(),
        }
    }

    /// 리포트에 포함된 이미지 참조 목록을 순서대로 반환합니다.
    pub fn image_names(&self) -> Vec<&str> {
        self.images.iter().map(|e| e.image_name.as_str()).collect()
    }
}

/// 스캐너 인증 토큰
///
/// `Debug`/`Display` 출력에서 값이 노출되지 않으며 직렬화할 수 없습니다.
/// 컨테이너 실행 시 환경변수로만 전달되어야 합니다.
#[derive(Clone, PartialEq, Eq)]
pub struct ScanToken(String);

impl ScanToken {
    /// 토큰을 생성합니다. 비어 있거나 공백뿐인 값은 거부합니다.
    ///
    /// # Errors
    ///
    /// 값이 비어 있으면 `ConfigError::MissingToken`을 반환합니다.
    pub fn new(value: impl Into<String>, env_var: &str) -> Result<Self, ConfigError> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(ConfigError::MissingToken {
                env_var: env_var.to_owned(),
            });
        }
        Ok(Self(value))
    }

    /// 환경변수에서 토큰을 읽습니다.
    ///
    /// # Errors
    ///
    /// 환경변수가 없거나 비어 있으면 `ConfigError::MissingToken`을 반환합니다.
    pub fn from_env(env_var: &str) -> Result<Self, ConfigError> {
        let value = std::env::var(env_var).unwrap_or_default();
        Self::new(value, env_var)
    }

    /// 토큰 원문을 반환합니다. 컨테이너 환경변수 구성에만 사용합니다.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ScanToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ScanToken(***)")
    }
}

/// 외부 협력자(렌더러, 스캐너 이미지 pull) 실패 시 처리 정책
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FailurePolicy {
    /// 경고 로그만 남기고 계속 진행
    #[default]
    BestEffort,
    /// 즉시 실행 중단
    FailFast,
}

impl FailurePolicy {
    /// 실패 시 실행을 중단해야 하는지 반환합니다.
    pub fn is_fail_fast(self) -> bool {
        self == Self::FailFast
    }
}

impl FromStr for FailurePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "best-effort" | "best_effort" => Ok(Self::BestEffort),
            "fail-fast" | "fail_fast" => Ok(Self::FailFast),
            other => Err(format!(
                "unknown failure policy '{other}' (expected: best-effort, fail-fast)"
            )),
        }
    }
}

/// 매니페스트 렌더러 종류
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RendererKind {
    /// `helm template <dir>` 실행
    #[default]
    Helm,
    /// 디렉토리 내 렌더링 완료된 YAML 파일을 그대로 연결
    Files,
}

impl FromStr for RendererKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "helm" => Ok(Self::Helm),
            "files" => Ok(Self::Files),
            other => Err(format!("unknown renderer '{other}' (expected: helm, files)")),
        }
    }
}

/// 이미지 추출 전략
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtractorKind {
    /// 라인 단위 `image:` 키 탐색 (깨진 YAML에도 동작)
    #[default]
    Line,
    /// YAML 문서 파싱 후 컨테이너 스펙 탐색
    Structured,
}

impl FromStr for ExtractorKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "line" => Ok(Self::Line),
            "structured" => Ok(Self::Structured),
            other => Err(format!(
                "unknown extractor '{other}' (expected: line, structured)"
            )),
        }
    }
}
