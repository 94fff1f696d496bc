//! 이미지 스캐너 설정
//!
//! [`ScannerConfig`]는 core의 [`ScannerSection`](chartscan_core::config::ScannerSection)과
//! 렌더링 실패 정책을 합쳐 오케스트레이터가 필요로 하는 값만 담습니다.
//!
//! # 사용 예시
//!
//! ```
//! use chartscan_image_scanner::ScannerConfigBuilder;
//!
//! let config = ScannerConfigBuilder::new()
//!     .enabled(true)
//!     .max_concurrent_scans(4)
//!     .build()
//!     .unwrap();
//! assert_eq!(config.scanner_image, "snyk/snyk:docker");
//! ```

use std::time::Duration;

use chartscan_core::config::{ChartscanConfig, IMAGE_PLACEHOLDER, ScannerSection};
use chartscan_core::types::FailurePolicy;
use serde::{Deserialize, Serialize};

use crate::error::ScannerError;

/// 설정 상한값 상수
const MAX_TIMEOUT_SECS: u64 = 86_400; // 24 hours
const MAX_CONCURRENT_SCANS: usize = 16;

/// 이미지 스캐너 설정
///
/// # 필드
///
/// - **enabled**: 스캔 활성화 여부 (비활성화 시 컨테이너 런타임을 호출하지 않음)
/// - **scanner_image**: 스캐너 런타임 이미지
/// - **token_env**: 스캐너 컨테이너에 주입할 토큰 환경변수 이름
/// - **socket_binds**: 스캐너 컨테이너 바인드 마운트
/// - **command**: 스캔 명령 (`{image}` 자리표시자 포함)
/// - **on_render_error** / **on_pull_error**: 외부 협력자 실패 정책
/// - **pull_timeout_secs** / **scan_timeout_secs**: 0이면 무제한
/// - **max_concurrent_scans**: 동시 스캔 수
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScannerConfig {
    /// 스캔 활성화 여부
    pub enabled: bool,
    /// 스캐너 런타임 이미지
    pub scanner_image: String,
    /// 토큰 환경변수 이름
    pub token_env: String,
    /// 스캐너 컨테이너 바인드 마운트 (`host:container`)
    pub socket_binds: Vec<String>,
    /// 스캔 명령
    pub command: Vec<String>,
    /// 렌더러 실패 정책
    pub on_render_error: FailurePolicy,
    /// 스캐너 이미지 pull 실패 정책
    pub on_pull_error: FailurePolicy,
    /// pull 타임아웃 (초)
    pub pull_timeout_secs: u64,
    /// 스캔 타임아웃 (초)
    pub scan_timeout_secs: u64,
    /// 동시 스캔 수
    pub max_concurrent_scans: usize,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        let section = ScannerSection::default();
        Self {
            enabled: section.enabled,
            scanner_image: section.image,
            token_env: section.token_env,
            socket_binds: section.socket_binds,
            command: section.command,
            on_render_error: FailurePolicy::BestEffort,
            on_pull_error: section.on_pull_error,
            pull_timeout_secs: section.pull_timeout_secs,
            scan_timeout_secs: section.scan_timeout_secs,
            max_concurrent_scans: section.max_concurrent_scans,
        }
    }
}

impl ScannerConfig {
    /// core 설정에서 스캐너 설정을 생성합니다.
    pub fn from_core(core: &ChartscanConfig) -> Self {
        let section = &core.scanner;
        Self {
            enabled: section.enabled,
            scanner_image: section.image.clone(),
            token_env: section.token_env.clone(),
            socket_binds: section.socket_binds.clone(),
            command: section.command.clone(),
            on_render_error: core.render.on_error,
            on_pull_error: section.on_pull_error,
            pull_timeout_secs: section.pull_timeout_secs,
            scan_timeout_secs: section.scan_timeout_secs,
            max_concurrent_scans: section.max_concurrent_scans,
        }
    }

    /// pull 타임아웃. 0이면 `None`
    pub fn pull_timeout(&self) -> Option<Duration> {
        (self.pull_timeout_secs > 0).then(|| Duration::from_secs(self.pull_timeout_secs))
    }

    /// 스캔 타임아웃. 0이면 `None`
    pub fn scan_timeout(&self) -> Option<Duration> {
        (self.scan_timeout_secs > 0).then(|| Duration::from_secs(self.scan_timeout_secs))
    }

    /// 대상 이미지로 자리표시자를 치환한 스캔 명령을 반환합니다.
    pub fn command_for(&self, image: &str) -> Vec<String> {
        self.command
            .iter()
            .map(|arg| arg.replace(IMAGE_PLACEHOLDER, image))
            .collect()
    }

    /// 설정 값의 유효성을 검증합니다.
    ///
    /// # 검증 규칙
    ///
    /// - `scanner_image`, `token_env`, `command`: 비어 있으면 안 됨
    /// - `token_env`: `=` 포함 불가
    /// - `command`: `{image}` 자리표시자 필수
    /// - `socket_binds`: 각 항목은 `host:container`
    /// - 타임아웃: 0-86400
    /// - `max_concurrent_scans`: 1-16
    pub fn validate(&self) -> Result<(), ScannerError> {
        if self.scanner_image.trim().is_empty() {
            return Err(config_error("scanner_image", "must not be empty"));
        }

        if self.token_env.trim().is_empty() || self.token_env.contains('=') {
            return Err(config_error(
                "token_env",
                "must be a non-empty environment variable name without '='",
            ));
        }

        if !self.command.iter().any(|arg| arg.contains(IMAGE_PLACEHOLDER)) {
            return Err(config_error(
                "command",
                format!("must contain the '{IMAGE_PLACEHOLDER}' placeholder"),
            ));
        }

        for bind in &self.socket_binds {
            let valid = bind
                .split_once(':')
                .is_some_and(|(host, container)| !host.is_empty() && !container.is_empty());
            if !valid {
                return Err(config_error(
                    "socket_binds",
                    format!("'{bind}' must have the form host:container"),
                ));
            }
        }

        if self.pull_timeout_secs > MAX_TIMEOUT_SECS {
            return Err(config_error(
                "pull_timeout_secs",
                format!("must be 0-{MAX_TIMEOUT_SECS}"),
            ));
        }

        if self.scan_timeout_secs > MAX_TIMEOUT_SECS {
            return Err(config_error(
                "scan_timeout_secs",
                format!("must be 0-{MAX_TIMEOUT_SECS}"),
            ));
        }

        if self.max_concurrent_scans == 0 || self.max_concurrent_scans > MAX_CONCURRENT_SCANS {
            return Err(config_error(
                "max_concurrent_scans",
                format!("must be 1-{MAX_CONCURRENT_SCANS}"),
            ));
        }

        Ok(())
    }
}

fn config_error(field: &str, reason: impl Into<String>) -> ScannerError {
    ScannerError::Config {
        field: field.to_owned(),
        reason: reason.into(),
    }
}

/// [`ScannerConfig`] 빌더
///
/// 빌드 시 유효성 검증을 수행합니다.
#[derive(Default)]
pub struct ScannerConfigBuilder {
    config: ScannerConfig,
}

impl ScannerConfigBuilder {
    /// 기본값을 가진 새 빌더를 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// 활성화 여부를 설정합니다.
    pub fn enabled(mut self, enabled: bool) -> Self {
        self.config.enabled = enabled;
        self
    }

    /// 스캐너 런타임 이미지를 설정합니다.
    pub fn scanner_image(mut self, image: impl Into<String>) -> Self {
        self.config.scanner_image = image.into();
        self
    }

    /// 토큰 환경변수 이름을 설정합니다.
    pub fn token_env(mut self, name: impl Into<String>) -> Self {
        self.config.token_env = name.into();
        self
    }

    /// 바인드 마운트 목록을 설정합니다.
    pub fn socket_binds(mut self, binds: Vec<String>) -> Self {
        self.config.socket_binds = binds;
        self
    }

    /// 스캔 명령을 설정합니다.
    pub fn command(mut self, command: Vec<String>) -> Self {
        self.config.command = command;
        self
    }

    /// 렌더러 실패 정책을 설정합니다.
    pub fn on_render_error(mut self, policy: FailurePolicy) -> Self {
        self.config.on_render_error = policy;
        self
    }

    /// 스캐너 이미지 pull 실패 정책을 설정합니다.
    pub fn on_pull_error(mut self, policy: FailurePolicy) -> Self {
        self.config.on_pull_error = policy;
        self
    }

    /// pull 타임아웃(초)을 설정합니다.
    pub fn pull_timeout_secs(mut self, secs: u64) -> Self {
        self.config.pull_timeout_secs = secs;
        self
    }

    /// 스캔 타임아웃(초)을 설정합니다.
    pub fn scan_timeout_secs(mut self, secs: u64) -> Self {
        self.config.scan_timeout_secs = secs;
        self
    }

    /// 동시 스캔 수를 설정합니다.
    pub fn max_concurrent_scans(mut self, max: usize) -> Self {
        self.config.max_concurrent_scans = max;
        self
    }

    /// 설정을 검증하고 빌드합니다.
    ///
    /// # Errors
    ///
    /// 유효성 검증 실패 시 `ScannerError::Config` 반환
    pub fn build(self) -> Result<ScannerConfig, ScannerError> {
        self.config.validate()?;
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        ScannerConfig::default().validate().unwrap();
    }

    #[test]
    fn from_core_copies_sections() {
        let mut core = ChartscanConfig::default();
        core.scanner.max_concurrent_scans = 3;
        core.scanner.on_pull_error = FailurePolicy::FailFast;
        core.render.on_error = FailurePolicy::FailFast;

        let config = ScannerConfig::from_core(&core);
        assert_eq!(config.max_concurrent_scans, 3);
        assert_eq!(config.on_pull_error, FailurePolicy::FailFast);
        assert_eq!(config.on_render_error, FailurePolicy::FailFast);
        assert_eq!(config.scanner_image, "snyk/snyk:docker");
    }

    #[test]
    fn command_for_substitutes_placeholder() {
        let config = ScannerConfig::default();
        assert_eq!(
            config.command_for("registry:5000/app:1"),
            vec!["snyk", "test", "--docker", "registry:5000/app:1", "--json"]
        );
    }

    #[test]
    fn command_for_substitutes_inside_argument() {
        let config = ScannerConfigBuilder::new()
            .command(vec!["scan".to_owned(), "--target={image}".to_owned()])
            .build()
            .unwrap();
        assert_eq!(config.command_for("a:1"), vec!["scan", "--target=a:1"]);
    }

    #[test]
    fn zero_timeouts_disable_limits() {
        let config = ScannerConfigBuilder::new()
            .pull_timeout_secs(0)
            .scan_timeout_secs(0)
            .build()
            .unwrap();
        assert!(config.pull_timeout().is_none());
        assert!(config.scan_timeout().is_none());
    }

    #[test]
    fn builder_rejects_missing_placeholder() {
        let result = ScannerConfigBuilder::new()
            .command(vec!["snyk".to_owned(), "test".to_owned()])
            .build();
        assert!(matches!(result, Err(ScannerError::Config { .. })));
    }

    #[test]
    fn builder_rejects_bad_bind() {
        let result = ScannerConfigBuilder::new()
            .socket_binds(vec!["/var/run/docker.sock:".to_owned()])
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn builder_rejects_concurrency_out_of_range() {
        assert!(ScannerConfigBuilder::new().max_concurrent_scans(0).build().is_err());
        assert!(ScannerConfigBuilder::new().max_concurrent_scans(17).build().is_err());
        assert!(ScannerConfigBuilder::new().max_concurrent_scans(16).build().is_ok());
    }

    #[test]
    fn builder_rejects_excessive_timeout() {
        assert!(ScannerConfigBuilder::new().scan_timeout_secs(86_401).build().is_err());
    }
}
