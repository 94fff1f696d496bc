//! 설정 관리: chartscan.toml 파싱 및 런타임 설정
//!
//! [`ChartscanConfig`]는 모든 크레이트의 설정을 담는 최상위 구조체입니다.
//!
//! # 설정 로딩 우선순위
//! 1. CLI 인자 (최고 우선)
//! 2. 환경변수 (`CHARTSCAN_SCANNER_IMAGE=snyk/snyk:docker` 형식)
//! 3. 설정 파일 (`chartscan.toml`, 선택)
//! 4. 기본값 (`Default` 구현)
//!
//! # 사용 예시
//! ```no_run
//! # async fn example() -> Result<(), chartscan_core::error::ChartscanError> {
//! use chartscan_core::config::ChartscanConfig;
//!
//! // 파일에서 로드 + 환경변수 오버라이드
//! let config = ChartscanConfig::load("chartscan.toml").await?;
//!
//! // TOML 문자열에서 직접 파싱
//! let config = ChartscanConfig::parse("[general]\nlog_level = \"debug\"")?;
//! # Ok(())
//! # }
//! ```

use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{ChartscanError, ConfigError};
use crate::types::{ExtractorKind, FailurePolicy, RendererKind};

/// 이미지 인자 자리표시자. 스캔 명령의 인자 중 하나에 반드시 포함되어야 합니다.
pub const IMAGE_PLACEHOLDER: &str = "{image}";

/// 설정 상한값 상수
const MAX_TIMEOUT_SECS: u64 = 86_400; // 24 hours
const MAX_CONCURRENT_SCANS: usize = 16;
const MAX_MANIFEST_SIZE: usize = 512 * 1024 * 1024; // 512 MB

/// chartscan 통합 설정
///
/// `chartscan.toml` 파일의 최상위 구조를 나타냅니다.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChartscanConfig {
    /// 일반 설정
    #[serde(default)]
    pub general: GeneralConfig,
    /// 렌더링/추출 설정
    #[serde(default)]
    pub render: RenderConfig,
    /// 스캐너 설정
    #[serde(default)]
    pub scanner: ScannerSection,
}

impl ChartscanConfig {
    /// TOML 파일에서 설정을 로드하고 환경변수 오버라이드를 적용합니다.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, ChartscanError> {
        let mut config = Self::from_file(path).await?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// 기본값에 환경변수 오버라이드만 적용합니다 (설정 파일 없이 실행할 때).
    pub fn from_env() -> Result<Self, ChartscanError> {
        let mut config = Self::default();
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// TOML 파일에서 설정을 로드합니다 (환경변수 오버라이드 없음).
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, ChartscanError> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ChartscanError::Config(ConfigError::FileNotFound {
                    path: path.display().to_string(),
                })
            } else {
                ChartscanError::Io(e)
            }
        })?;
        Self::parse(&content)
    }

    /// TOML 문자열에서 설정을 파싱합니다.
    pub fn parse(toml_str: &str) -> Result<Self, ChartscanError> {
        toml::from_str(toml_str).map_err(|e| {
            ChartscanError::Config(ConfigError::ParseFailed {
                reason: e.to_string(),
            })
        })
    }

    /// 환경변수로 설정값을 오버라이드합니다.
    ///
    /// 환경변수 네이밍 규칙: `CHARTSCAN_{SECTION}_{FIELD}`
    /// 예: `CHARTSCAN_RENDER_EXTRACTOR=structured`
    pub fn apply_env_overrides(&mut self) {
        // General
        override_string(&mut self.general.log_level, "CHARTSCAN_GENERAL_LOG_LEVEL");
        override_string(&mut self.general.log_format, "CHARTSCAN_GENERAL_LOG_FORMAT");

        // Render
        override_parsed(&mut self.render.renderer, "CHARTSCAN_RENDER_RENDERER");
        override_string(&mut self.render.helm_binary, "CHARTSCAN_RENDER_HELM_BINARY");
        override_csv(&mut self.render.helm_args, "CHARTSCAN_RENDER_HELM_ARGS");
        override_parsed(&mut self.render.extractor, "CHARTSCAN_RENDER_EXTRACTOR");
        override_parsed(&mut self.render.on_error, "CHARTSCAN_RENDER_ON_ERROR");
        override_parsed(
            &mut self.render.max_manifest_size,
            "CHARTSCAN_RENDER_MAX_MANIFEST_SIZE",
        );

        // Scanner
        override_parsed(&mut self.scanner.enabled, "CHARTSCAN_SCANNER_ENABLED");
        override_string(&mut self.scanner.image, "CHARTSCAN_SCANNER_IMAGE");
        override_string(&mut self.scanner.token_env, "CHARTSCAN_SCANNER_TOKEN_ENV");
        override_string(
            &mut self.scanner.docker_socket,
            "CHARTSCAN_SCANNER_DOCKER_SOCKET",
        );
        override_csv(
            &mut self.scanner.socket_binds,
            "CHARTSCAN_SCANNER_SOCKET_BINDS",
        );
        override_parsed(
            &mut self.scanner.on_pull_error,
            "CHARTSCAN_SCANNER_ON_PULL_ERROR",
        );
        override_parsed(
            &mut self.scanner.pull_timeout_secs,
            "CHARTSCAN_SCANNER_PULL_TIMEOUT_SECS",
        );
        override_parsed(
            &mut self.scanner.scan_timeout_secs,
            "CHARTSCAN_SCANNER_SCAN_TIMEOUT_SECS",
        );
        override_parsed(
            &mut self.scanner.max_concurrent_scans,
            "CHARTSCAN_SCANNER_MAX_CONCURRENT_SCANS",
        );
    }

    /// 설정값의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), ChartscanError> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.general.log_level.as_str()) {
            return Err(invalid(
                "general.log_level",
                format!("must be one of: {}", valid_levels.join(", ")),
            ));
        }

        let valid_formats = ["json", "pretty"];
        if !valid_formats.contains(&self.general.log_format.as_str()) {
            return Err(invalid(
                "general.log_format",
                format!("must be one of: {}", valid_formats.join(", ")),
            ));
        }

        if self.render.renderer == RendererKind::Helm && self.render.helm_binary.trim().is_empty()
        {
            return Err(invalid("render.helm_binary", "must not be empty"));
        }

        if self.render.max_manifest_size == 0 || self.render.max_manifest_size > MAX_MANIFEST_SIZE
        {
            return Err(invalid(
                "render.max_manifest_size",
                format!("must be 1-{MAX_MANIFEST_SIZE}"),
            ));
        }

        self.scanner.validate()
    }
}

/// 일반 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// 로그 레벨 (trace, debug, info, warn, error)
    pub log_level: String,
    /// 로그 형식 (json, pretty)
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_owned(),
            log_format: "json".to_owned(),
        }
    }
}

/// 렌더링 및 이미지 추출 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// 렌더러 종류
    pub renderer: RendererKind,
    /// helm 실행 파일 경로
    pub helm_binary: String,
    /// `template`과 입력 디렉토리 사이에 추가할 helm 인자
    pub helm_args: Vec<String>,
    /// 이미지 추출 전략
    pub extractor: ExtractorKind,
    /// 렌더러가 0이 아닌 종료 코드를 반환했을 때의 처리 정책
    pub on_error: FailurePolicy,
    /// 렌더링 결과 최대 크기 (바이트)
    pub max_manifest_size: usize,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            renderer: RendererKind::Helm,
            helm_binary: "helm".to_owned(),
            helm_args: Vec::new(),
            extractor: ExtractorKind::Line,
            on_error: FailurePolicy::BestEffort,
            max_manifest_size: 50 * 1024 * 1024, // 50 MB
        }
    }
}

/// 스캐너 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScannerSection {
    /// 스캔 활성화 여부 (비활성화 시 이미지 목록만 리포트)
    pub enabled: bool,
    /// 스캐너 런타임 이미지
    pub image: String,
    /// 인증 토큰 환경변수 이름 (호스트에서 읽고 스캐너 컨테이너에 같은 이름으로 주입)
    pub token_env: String,
    /// Docker 소켓 경로
    pub docker_socket: String,
    /// 스캐너 컨테이너에 마운트할 바인드 (`host:container`)
    pub socket_binds: Vec<String>,
    /// 스캔 명령 (`{image}` 자리표시자 포함)
    pub command: Vec<String>,
    /// 스캐너 이미지 pull 실패 시 처리 정책
    pub on_pull_error: FailurePolicy,
    /// 이미지 pull 타임아웃 (초). 0이면 무제한
    pub pull_timeout_secs: u64,
    /// 이미지 스캔 타임아웃 (초). 0이면 무제한
    pub scan_timeout_secs: u64,
    /// 동시 스캔 수. 1이면 순차 실행
    pub max_concurrent_scans: usize,
}

impl Default for ScannerSection {
    fn default() -> Self {
        Self {
            enabled: true,
            image: "snyk/snyk:docker".to_owned(),
            token_env: "SNYK_TOKEN".to_owned(),
            docker_socket: "/var/run/docker.sock".to_owned(),
            socket_binds: vec!["/var/run/docker.sock:/var/run/docker.sock".to_owned()],
            command: vec![
                "snyk".to_owned(),
                "test".to_owned(),
                "--docker".to_owned(),
                IMAGE_PLACEHOLDER.to_owned(),
                "--json".to_owned(),
            ],
            on_pull_error: FailurePolicy::BestEffort,
            pull_timeout_secs: 600,
            scan_timeout_secs: 1800,
            max_concurrent_scans: 1,
        }
    }
}

impl ScannerSection {
    /// 스캐너 섹션의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), ChartscanError> {
        if self.image.trim().is_empty() {
            return Err(invalid("scanner.image", "must not be empty"));
        }

        if self.token_env.trim().is_empty() || self.token_env.contains('=') {
            return Err(invalid(
                "scanner.token_env",
                "must be a non-empty environment variable name without '='",
            ));
        }

        if self.command.is_empty() {
            return Err(invalid("scanner.command", "must not be empty"));
        }

        if !self.command.iter().any(|arg| arg.contains(IMAGE_PLACEHOLDER)) {
            return Err(invalid(
                "scanner.command",
                format!("must contain the '{IMAGE_PLACEHOLDER}' placeholder"),
            ));
        }

        for bind in &self.socket_binds {
            let valid = bind
                .split_once(':')
                .is_some_and(|(host, container)| !host.is_empty() && !container.is_empty());
            if !valid {
                return Err(invalid(
                    "scanner.socket_binds",
                    format!("'{bind}' must have the form host:container"),
                ));
            }
        }

        if self.pull_timeout_secs > MAX_TIMEOUT_SECS {
            return Err(invalid(
                "scanner.pull_timeout_secs",
                format!("must be 0 (no timeout) or at most {MAX_TIMEOUT_SECS}"),
            ));
        }

        if self.scan_timeout_secs > MAX_TIMEOUT_SECS {
            return Err(invalid(
                "scanner.scan_timeout_secs",
                format!("must be 0 (no timeout) or at most {MAX_TIMEOUT_SECS}"),
            ));
        }

        if self.max_concurrent_scans == 0 || self.max_concurrent_scans > MAX_CONCURRENT_SCANS {
            return Err(invalid(
                "scanner.max_concurrent_scans",
                format!("must be 1-{MAX_CONCURRENT_SCANS}"),
            ));
        }

        Ok(())
    }
}

fn invalid(field: &str, reason: impl Into<String>) -> ChartscanError {
    ConfigError::InvalidValue {
        field: field.to_owned(),
        reason: reason.into(),
    }
    .into()
}

// --- 환경변수 오버라이드 헬퍼 ---

fn override_string(target: &mut String, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = val;
    }
}

fn override_parsed<T: FromStr>(target: &mut T, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<T>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse value from env var, ignoring"
            ),
        }
    }
}

fn override_csv(target: &mut Vec<String>, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = val
            .split(',')
            .map(|s| s.trim().to_owned())
            .filter(|s| !s.is_empty())
            .collect();
    }
}
