//! 에러 타입: 도메인별 에러 정의
//!
//! 각 크레이트는 자기 도메인 에러(`ManifestError`, `ScannerError`)를 정의하고
//! `From` 구현으로 [`ChartscanError`]로 변환합니다.

/// chartscan 최상위 에러 타입
#[derive(Debug, thiserror::Error)]
pub enum ChartscanError {
    /// 설정 관련 에러
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// 차트 디스크립터(Chart.yaml) 읽기/파싱 실패
    #[error("chart descriptor error: {0}")]
    Chart(String),

    /// 매니페스트 렌더링 실패
    #[error("render error: {0}")]
    Render(String),

    /// 이미지 추출 실패
    #[error("extract error: {0}")]
    Extract(String),

    /// 컨테이너 런타임 호출 실패
    #[error("container runtime error: {0}")]
    Runtime(String),

    /// 스캔 실행 실패
    #[error("scan error: {0}")]
    Scan(String),

    /// I/O 에러
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// 설정 관련 에러
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// 설정 파일을 찾을 수 없음
    #[error("config file not found: {path}")]
    FileNotFound { path: String },

    /// 설정 파싱 실패
    #[error("failed to parse config: {reason}")]
    ParseFailed { reason: String },

    /// 유효하지 않은 설정 값
    #[error("invalid config value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },

    /// 스캔 인증 토큰 누락
    #[error("scan token is missing: environment variable '{env_var}' is not set or empty")]
    MissingToken { env_var: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_converts_into_top_level() {
        let err: ChartscanError = ConfigError::InvalidValue {
            field: "scanner.image".to_owned(),
            reason: "must not be empty".to_owned(),
        }
        .into();
        assert!(matches!(err, ChartscanError::Config(_)));
        assert!(err.to_string().contains("scanner.image"));
    }

    #[test]
    fn missing_token_names_env_var() {
        let err = ConfigError::MissingToken {
            env_var: "SNYK_TOKEN".to_owned(),
        };
        assert!(err.to_string().contains("SNYK_TOKEN"));
    }

    #[test]
    fn io_error_converts_into_top_level() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: ChartscanError = io.into();
        assert!(matches!(err, ChartscanError::Io(_)));
    }
}
