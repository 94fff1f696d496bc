//! 이미지 스캐너 에러 타입
//!
//! [`ScannerError`]는 오케스트레이터와 컨테이너 런타임 경계에서 발생하는 에러를 나타냅니다.
//! `From<ScannerError> for ChartscanError` 구현을 통해 `?` 연산자로 전파됩니다.
//!
//! # 에러 카테고리
//!
//! - **매니페스트**: `Manifest` (렌더링, 추출, 차트 디스크립터)
//! - **컨테이너 런타임**: `Pull`, `Run`, `DockerConnection`
//! - **스캔 결과**: `OutputParse`, `Timeout`
//! - **설정**: `Config`, `MissingToken`

use chartscan_core::error::{ChartscanError, ConfigError};
use chartscan_manifest::ManifestError;

/// 이미지 스캐너 도메인 에러
#[derive(Debug, thiserror::Error)]
pub enum ScannerError {
    /// 렌더링/추출/차트 디스크립터 에러
    #[error(transparent)]
    Manifest(#[from] ManifestError),

    /// 이미지 pull 실패
    #[error("failed to pull image '{image}': {reason}")]
    Pull {
        /// 대상 이미지
        image: String,
        /// 실패 사유
        reason: String,
    },

    /// 스캐너 컨테이너 실행 실패
    #[error("failed to run scanner for '{image}': {reason}")]
    Run {
        /// 스캔 대상 이미지
        image: String,
        /// 실패 사유
        reason: String,
    },

    /// 스캐너 출력이 JSON이 아님
    #[error("failed to parse scanner output for '{image}': {reason}")]
    OutputParse {
        /// 스캔 대상 이미지
        image: String,
        /// 파싱 실패 사유
        reason: String,
    },

    /// 외부 호출 시간 초과
    #[error("{operation} of '{image}' timed out after {secs}s")]
    Timeout {
        /// 작업 종류 (pull, scan)
        operation: String,
        /// 대상 이미지
        image: String,
        /// 제한 시간 (초)
        secs: u64,
    },

    /// Docker 데몬 연결 실패
    #[error("docker connection error: {0}")]
    DockerConnection(String),

    /// 설정 에러
    #[error("config error: {field}: {reason}")]
    Config {
        /// 설정 필드명
        field: String,
        /// 에러 사유
        reason: String,
    },

    /// 스캔이 활성화되었지만 인증 토큰이 없음
    #[error("scan token is missing: environment variable '{env_var}' is not set or empty")]
    MissingToken {
        /// 토큰 환경변수 이름
        env_var: String,
    },
}

impl From<ScannerError> for ChartscanError {
    fn from(err: ScannerError) -> Self {
        match err {
            ScannerError::Manifest(inner) => inner.into(),
            ScannerError::Pull { .. }
            | ScannerError::Run { .. }
            | ScannerError::DockerConnection(_) => ChartscanError::Runtime(err.to_string()),
            ScannerError::OutputParse { .. } | ScannerError::Timeout { .. } => {
                ChartscanError::Scan(err.to_string())
            }
            ScannerError::Config { field, reason } => {
                ChartscanError::Config(ConfigError::InvalidValue { field, reason })
            }
            ScannerError::MissingToken { env_var } => {
                ChartscanError::Config(ConfigError::MissingToken { env_var })
            }
        }
    }
}
