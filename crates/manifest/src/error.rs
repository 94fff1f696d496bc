//! 매니페스트 에러 타입
//!
//! [`ManifestError`]는 렌더링, 차트 디스크립터 로딩, 이미지 추출 과정의 에러를 나타냅니다.
//! `From<ManifestError> for ChartscanError` 구현을 통해 `?` 연산자로 전파됩니다.

use chartscan_core::error::{ChartscanError, ConfigError};

/// 매니페스트 도메인 에러
#[derive(Debug, thiserror::Error)]
pub enum ManifestError {
    /// Chart.yaml 읽기/파싱 실패 또는 필수 필드 누락
    #[error("chart descriptor error: {path}: {reason}")]
    ChartDescriptor {
        /// 디스크립터 파일 경로
        path: String,
        /// 실패 사유
        reason: String,
    },

    /// 렌더러 프로세스 실행 실패 (바이너리 없음, 권한 없음 등)
    #[error("failed to spawn renderer '{program}': {source}")]
    RenderSpawn {
        /// 실행하려던 프로그램
        program: String,
        /// 원본 I/O 에러
        source: std::io::Error,
    },

    /// 렌더러가 0이 아닌 종료 코드로 끝남 (fail-fast 정책일 때만)
    #[error("renderer exited with {status}: {stderr}")]
    RenderFailed {
        /// 종료 상태 설명
        status: String,
        /// 렌더러 stderr
        stderr: String,
    },

    /// 구조화 추출기의 YAML 문서 파싱 실패
    #[error("failed to parse manifest document #{document}: {reason}")]
    Extract {
        /// 0부터 시작하는 문서 인덱스
        document: usize,
        /// 파싱 실패 사유
        reason: String,
    },

    /// 파일 I/O 에러
    #[error("io error: {path}: {source}")]
    Io {
        /// 관련 파일 경로
        path: String,
        /// 원본 I/O 에러
        source: std::io::Error,
    },

    /// 파일 또는 렌더링 결과 크기 초과
    #[error("manifest too large: {path}: {size} bytes (max: {max})")]
    FileTooBig {
        /// 파일 경로 또는 렌더러 이름
        path: String,
        /// 실제 크기 (바이트)
        size: usize,
        /// 최대 허용 크기 (바이트)
        max: usize,
    },

    /// 설정 에러
    #[error("config error: {field}: {reason}")]
    Config {
        /// 설정 필드명
        field: String,
        /// 에러 사유
        reason: String,
    },
}

impl From<ManifestError> for ChartscanError {
    fn from(err: ManifestError) -> Self {
        match err {
            ManifestError::ChartDescriptor { .. } => ChartscanError::Chart(err.to_string()),
            ManifestError::RenderSpawn { .. }
            | ManifestError::RenderFailed { .. }
            | ManifestError::FileTooBig { .. } => ChartscanError::Render(err.to_string()),
            ManifestError::Extract { .. } => ChartscanError::Extract(err.to_string()),
            ManifestError::Io { source, .. } => ChartscanError::Io(source),
            ManifestError::Config { field, reason } => {
                ChartscanError::Config(ConfigError::InvalidValue { field, reason })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chart_descriptor_error_display() {
        let err = ManifestError::ChartDescriptor {
            path: "/charts/foo/Chart.yaml".to_owned(),
            reason: "missing field 'version'".to_owned(),
        };
        let msg = err.to_string();
        assert!(msg.contains("Chart.yaml"));
        assert!(msg.contains("version"));
    }

    #[test]
    fn chart_descriptor_converts_to_chart_category() {
        let err: ChartscanError = ManifestError::ChartDescriptor {
            path: "Chart.yaml".to_owned(),
            reason: "not found".to_owned(),
        }
        .into();
        assert!(matches!(err, ChartscanError::Chart(_)));
    }

    #[test]
    fn render_errors_convert_to_render_category() {
        let spawn: ChartscanError = ManifestError::RenderSpawn {
            program: "helm".to_owned(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "no such file"),
        }
        .into();
        assert!(matches!(spawn, ChartscanError::Render(_)));

        let failed: ChartscanError = ManifestError::RenderFailed {
            status: "exit status: 1".to_owned(),
            stderr: "Error: Chart.yaml file is missing".to_owned(),
        }
        .into();
        assert!(matches!(failed, ChartscanError::Render(_)));
    }

    #[test]
    fn extract_error_converts_to_extract_category() {
        let err: ChartscanError = ManifestError::Extract {
            document: 2,
            reason: "bad indentation".to_owned(),
        }
        .into();
        assert!(matches!(err, ChartscanError::Extract(_)));
        assert!(err.to_string().contains("#2"));
    }

    #[test]
    fn io_error_keeps_source() {
        let err: ChartscanError = ManifestError::Io {
            path: "/tmp/x.yaml".to_owned(),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        }
        .into();
        assert!(matches!(err, ChartscanError::Io(_)));
    }
}
