//! 매니페스트 렌더링 -- 차트 디렉토리를 평문 YAML 매니페스트로 변환합니다.
//!
//! [`ManifestRenderer`] trait 뒤에 두 가지 구현이 있습니다.
//!
//! - [`HelmRenderer`]: `<helm> template [args..] <dir>` 실행
//! - [`FilesRenderer`]: 이미 렌더링된 `*.yaml`/`*.yml` 파일을 정렬 순서대로 연결
//!
//! 렌더러가 0이 아닌 종료 코드를 반환해도 stdout은 그대로 보존됩니다.
//! 실패로 볼지는 호출자가 [`RenderOutput::enforce`]에 정책을 넘겨 결정합니다.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use chartscan_core::config::RenderConfig;
use chartscan_core::types::{FailurePolicy, RendererKind};
use tracing::{debug, warn};

use crate::chart::CHART_DESCRIPTOR_FILE;
use crate::error::ManifestError;

/// 렌더링된 매니페스트 문서 구분자
const DOCUMENT_SEPARATOR: &str = "---\n";

/// 렌더링 결과
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderOutput {
    /// 렌더링된 매니페스트 텍스트 (stdout)
    pub text: String,
    /// 렌더러 진단 출력 (stderr)
    pub stderr: String,
    /// 종료 코드. 시그널로 종료된 경우 `None`
    pub status: Option<i32>,
}

impl RenderOutput {
    /// 렌더러가 성공적으로 종료했는지 반환합니다.
    pub fn success(&self) -> bool {
        self.status == Some(0)
    }

    /// 실패 정책을 적용하고 매니페스트 텍스트를 돌려줍니다.
    ///
    /// `BestEffort`이면 실패해도 경고만 남기고 부분 출력을 사용합니다.
    ///
    /// # Errors
    ///
    /// `FailFast` 정책에서 렌더러가 실패했으면 `ManifestError::RenderFailed`를 반환합니다.
    pub fn enforce(self, policy: FailurePolicy) -> Result<String, ManifestError> {
        if self.success() {
            return Ok(self.text);
        }

        let status = match self.status {
            Some(code) => format!("exit code {code}"),
            None => "signal".to_owned(),
        };

        if policy.is_fail_fast() {
            return Err(ManifestError::RenderFailed {
                status,
                stderr: self.stderr.trim().to_owned(),
            });
        }

        warn!(
            status = %status,
            stderr = %self.stderr.trim(),
            "renderer reported failure, continuing with partial output"
        );
        Ok(self.text)
    }
}

/// 매니페스트 렌더러 trait
///
/// 입력 디렉토리를 받아 렌더링된 매니페스트 텍스트를 반환합니다.
pub trait ManifestRenderer: Send + Sync + 'static {
    /// 렌더러 이름 (로그용)
    fn name(&self) -> &str;

    /// 입력 디렉토리를 렌더링합니다.
    ///
    /// # Errors
    ///
    /// 렌더러를 실행조차 할 수 없거나(출력이 전혀 없음) 출력이 크기 제한을 넘으면 에러입니다.
    /// 렌더러의 0이 아닌 종료 코드는 에러가 아니라 [`RenderOutput::status`]로 전달됩니다.
    fn render(
        &self,
        input_dir: &Path,
    ) -> impl Future<Output = Result<RenderOutput, ManifestError>> + Send;
}

/// `helm template` 렌더러
#[derive(Debug, Clone)]
pub struct HelmRenderer {
    binary: String,
    args: Vec<String>,
    max_output_size: usize,
}

impl HelmRenderer {
    /// 새 helm 렌더러를 생성합니다.
    pub fn new(binary: impl Into<String>, args: Vec<String>, max_output_size: usize) -> Self {
        Self {
            binary: binary.into(),
            args,
            max_output_size,
        }
    }

    /// 실행할 인자 목록을 반환합니다 (`template`, 추가 인자, 디렉토리 순).
    pub fn command_args(&self, input_dir: &Path) -> Vec<String> {
        let mut args = Vec::with_capacity(self.args.len() + 2);
        args.push("template".to_owned());
        args.extend(self.args.iter().cloned());
        args.push(input_dir.display().to_string());
        args
    }
}

impl ManifestRenderer for HelmRenderer {
    fn name(&self) -> &str {
        "helm"
    }

    async fn render(&self, input_dir: &Path) -> Result<RenderOutput, ManifestError> {
        let args = self.command_args(input_dir);
        debug!(program = %self.binary, ?args, "running renderer");

        let output = tokio::process::Command::new(&self.binary)
            .args(&args)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| ManifestError::RenderSpawn {
                program: self.binary.clone(),
                source: e,
            })?;

        if output.stdout.len() > self.max_output_size {
            return Err(ManifestError::FileTooBig {
                path: format!("{} output", self.binary),
                size: output.stdout.len(),
                max: self.max_output_size,
            });
        }

        Ok(RenderOutput {
            text: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            status: output.status.code(),
        })
    }
}

/// 이미 렌더링된 매니페스트 파일을 연결하는 렌더러
///
/// 하위 디렉토리까지 `*.yaml`/`*.yml` 파일을 찾아 경로 순으로 정렬한 뒤
/// `---` 구분자로 연결합니다. `Chart.yaml`은 제외합니다.
#[derive(Debug, Clone)]
pub struct FilesRenderer {
    max_output_size: usize,
}

impl FilesRenderer {
    /// 새 파일 렌더러를 생성합니다.
    pub fn new(max_output_size: usize) -> Self {
        Self { max_output_size }
    }

    /// 디렉토리를 재귀적으로 순회하며 매니페스트 파일 경로를 정렬해서 반환합니다.
    pub async fn collect_files(input_dir: &Path) -> Result<Vec<PathBuf>, ManifestError> {
        let mut pending = vec![input_dir.to_path_buf()];
        let mut files = Vec::new();

        while let Some(dir) = pending.pop() {
            let mut entries = tokio::fs::read_dir(&dir)
                .await
                .map_err(|e| io_error(&dir, e))?;

            while let Some(entry) = entries.next_entry().await.map_err(|e| io_error(&dir, e))? {
                let path = entry.path();
                let file_type = entry.file_type().await.map_err(|e| io_error(&path, e))?;

                if file_type.is_dir() {
                    pending.push(path);
                    continue;
                }

                let is_yaml = path
                    .extension()
                    .is_some_and(|ext| ext == "yml" || ext == "yaml");
                let is_descriptor = path
                    .file_name()
                    .is_some_and(|name| name == CHART_DESCRIPTOR_FILE);

                if file_type.is_file() && is_yaml && !is_descriptor {
                    files.push(path);
                }
            }
        }

        files.sort();
        Ok(files)
    }
}

impl ManifestRenderer for FilesRenderer {
    fn name(&self) -> &str {
        "files"
    }

    async fn render(&self, input_dir: &Path) -> Result<RenderOutput, ManifestError> {
        let files = Self::collect_files(input_dir).await?;
        debug!(dir = %input_dir.display(), count = files.len(), "concatenating manifest files");

        let mut text = String::new();
        for path in &files {
            let metadata = tokio::fs::metadata(path)
                .await
                .map_err(|e| io_error(path, e))?;
            let size = usize::try_from(metadata.len()).unwrap_or(usize::MAX);
            if size > self.max_output_size || text.len() + size > self.max_output_size {
                return Err(ManifestError::FileTooBig {
                    path: path.display().to_string(),
                    size: text.len().saturating_add(size),
                    max: self.max_output_size,
                });
            }

            let content = tokio::fs::read_to_string(path)
                .await
                .map_err(|e| io_error(path, e))?;

            if !text.is_empty() {
                if !text.ends_with('\n') {
                    text.push('\n');
                }
                text.push_str(DOCUMENT_SEPARATOR);
            }
            text.push_str(&content);
        }

        Ok(RenderOutput {
            text,
            stderr: String::new(),
            status: Some(0),
        })
    }
}

/// 설정에 따라 선택되는 렌더러
#[derive(Debug, Clone)]
pub enum ConfiguredRenderer {
    /// `helm template`
    Helm(HelmRenderer),
    /// 렌더링 완료된 파일 연결
    Files(FilesRenderer),
}

impl ConfiguredRenderer {
    /// 렌더 설정으로부터 렌더러를 생성합니다.
    pub fn from_config(config: &RenderConfig) -> Self {
        match config.renderer {
            RendererKind::Helm => Self::Helm(HelmRenderer::new(
                config.helm_binary.clone(),
                config.helm_args.clone(),
                config.max_manifest_size,
            )),
            RendererKind::Files => Self::Files(FilesRenderer::new(config.max_manifest_size)),
        }
    }
}

impl ManifestRenderer for ConfiguredRenderer {
    fn name(&self) -> &str {
        match self {
            Self::Helm(r) => r.name(),
            Self::Files(r) => r.name(),
        }
    }

    async fn render(&self, input_dir: &Path) -> Result<RenderOutput, ManifestError> {
        match self {
            Self::Helm(r) => r.render(input_dir).await,
            Self::Files(r) => r.render(input_dir).await,
        }
    }
}

fn io_error(path: &Path, source: std::io::Error) -> ManifestError {
    ManifestError::Io {
        path: path.display().to_string(),
        source,
    }
}
