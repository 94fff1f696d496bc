//! Container runtime abstraction for testability.
//!
//! The [`ContainerRuntime`] trait covers the two capabilities the orchestrator
//! needs: pulling an image by reference and running a named image to completion
//! with arguments, environment and bind mounts. Production code uses
//! [`BollardRuntime`]; unit tests use `MockContainerRuntime`.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────┐
//! │ ScanOrchestrator │
//! └────────┬─────────┘
//!          │
//!          ▼
//!  ┌────────────────┐
//!  │ContainerRuntime│ (trait)
//!  └────────────────┘
//!        │     │
//!        ▼     ▼
//!  ┌───────┐ ┌────┐
//!  │Bollard│ │Mock│
//!  └───┬───┘ └────┘
//!      │
//!      ▼
//!  Docker Daemon
//! ```
//!
//! # Secrets
//!
//! The scanner token travels only in [`RunSpec::env`]. It is never placed in the
//! command line, and `RunSpec`'s `Debug` output redacts every env value.

use std::collections::BTreeMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use bollard::container::LogOutput;
use futures_util::StreamExt;
use tracing::{debug, trace, warn};

use crate::error::ScannerError;

/// Docker connection timeout in seconds.
const DOCKER_CONNECT_TIMEOUT_SECS: u64 = 120;

/// Everything needed to run one scanner container.
#[derive(Clone)]
pub struct RunSpec {
    /// Image to run (the scanner runtime image).
    pub image: String,
    /// Command and arguments passed to the container.
    pub command: Vec<String>,
    /// Environment variables injected into the container.
    pub env: BTreeMap<String, String>,
    /// Bind mounts in `host:container` form.
    pub binds: Vec<String>,
    /// Unique container name.
    pub name: String,
    /// Upper bound on the container's run time. `None` waits forever.
    pub timeout: Option<Duration>,
    /// Image being scanned, for error messages.
    pub target: String,
}

impl fmt::Debug for RunSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let env_keys: Vec<&str> = self.env.keys().map(String::as_str).collect();
        f.debug_struct("RunSpec")
            .field("image", &self.image)
            .field("command", &self.command)
            .field("env", &format_args!("{env_keys:?} (values redacted)"))
            .field("binds", &self.binds)
            .field("name", &self.name)
            .field("timeout", &self.timeout)
            .field("target", &self.target)
            .finish()
    }
}

impl RunSpec {
    /// Formats env entries as `KEY=value` for the Docker API.
    pub fn env_list(&self) -> Vec<String> {
        self.env.iter().map(|(k, v)| format!("{k}={v}")).collect()
    }
}

/// Captured result of a finished container.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RunOutput {
    /// Container exit code.
    pub exit_code: i64,
    /// Everything written to stdout.
    pub stdout: String,
    /// Everything written to stderr.
    pub stderr: String,
}

/// Trait abstracting container runtime operations.
///
/// The trait is `Send + Sync + 'static`, allowing safe sharing across async contexts.
///
/// # Implementations
///
/// - [`BollardRuntime`]: Production implementation using the `bollard` library
/// - `MockContainerRuntime`: Test implementation with configurable responses (available in tests only)
pub trait ContainerRuntime: Send + Sync + 'static {
    /// Pulls an image by reference, waiting until the pull completes.
    ///
    /// # Errors
    ///
    /// Returns `ScannerError::Pull` if the registry or daemon rejects the pull.
    fn pull_image(&self, image: &str) -> impl Future<Output = Result<(), ScannerError>> + Send;

    /// Creates, starts and waits for a container, then collects its output.
    ///
    /// The container is removed afterwards regardless of outcome. A non-zero
    /// exit code is not an error; it is reported in [`RunOutput::exit_code`].
    ///
    /// # Errors
    ///
    /// - `ScannerError::Run`: the container could not be created, started or waited on
    /// - `ScannerError::Timeout`: the container outlived [`RunSpec::timeout`] and was killed
    fn run_container(
        &self,
        spec: &RunSpec,
    ) -> impl Future<Output = Result<RunOutput, ScannerError>> + Send;
}

/// Splits an image reference into the `fromImage` and `tag` parameters of the
/// Docker pull API.
///
/// Digest references split at `@`. A reference without a tag gets `latest`,
/// because an empty tag makes the daemon pull every tag of the repository.
pub fn split_reference(image: &str) -> (&str, &str) {
    if let Some((repo, digest)) = image.split_once('@') {
        return (repo, digest);
    }

    let name_start = image.rfind('/').map_or(0, |i| i + 1);
    match image[name_start..].rfind(':') {
        Some(i) => {
            let colon = name_start + i;
            (&image[..colon], &image[colon + 1..])
        }
        None => (image, "latest"),
    }
}

/// Raw container output, decoded once after the stream ends.
///
/// Docker splits large writes across frames, so a multi-byte character may
/// straddle two frames.
#[derive(Debug, Default)]
struct LogBuffers {
    stdout: Vec<u8>,
    stderr: Vec<u8>,
}

impl LogBuffers {
    fn push(&mut self, frame: LogOutput) {
        match frame {
            LogOutput::StdOut { message } | LogOutput::Console { message } => {
                self.stdout.extend_from_slice(&message);
            }
            LogOutput::StdErr { message } => self.stderr.extend_from_slice(&message),
            LogOutput::StdIn { .. } => {}
        }
    }

    fn into_strings(self) -> (String, String) {
        (
            String::from_utf8_lossy(&self.stdout).into_owned(),
            String::from_utf8_lossy(&self.stderr).into_owned(),
        )
    }
}

/// Production container runtime using `bollard`.
///
/// Communicates with the Docker daemon via a Unix socket.
/// Internally uses `Arc<bollard::Docker>` for safe sharing across async tasks.
///
/// # Examples
///
/// ```ignore
/// use chartscan_image_scanner::BollardRuntime;
///
/// let runtime = BollardRuntime::connect_with_socket("/var/run/docker.sock")?;
/// runtime.pull_image("snyk/snyk:docker").await?;
/// # Ok::<(), chartscan_image_scanner::ScannerError>(())
/// ```
pub struct BollardRuntime {
    docker: Arc<bollard::Docker>,
}

impl BollardRuntime {
    /// Connects to Docker using a specific socket path.
    ///
    /// # Errors
    ///
    /// Returns `ScannerError::DockerConnection` if the connection fails.
    pub fn connect_with_socket(socket_path: &str) -> Result<Self, ScannerError> {
        let docker = bollard::Docker::connect_with_socket(
            socket_path,
            DOCKER_CONNECT_TIMEOUT_SECS,
            bollard::API_DEFAULT_VERSION,
        )
        .map_err(|e| {
            ScannerError::DockerConnection(format!(
                "failed to connect to docker at {socket_path}: {e}"
            ))
        })?;
        Ok(Self {
            docker: Arc::new(docker),
        })
    }

    /// Waits for the container to exit and returns its exit code.
    async fn wait_for_exit(&self, id: &str, target: &str) -> Result<i64, ScannerError> {
        use bollard::container::WaitContainerOptions;

        let mut stream = self
            .docker
            .wait_container(id, None::<WaitContainerOptions<String>>);

        match stream.next().await {
            Some(Ok(response)) => Ok(response.status_code),
            // bollard reports non-zero exits as an error carrying the code
            Some(Err(bollard::errors::Error::DockerContainerWaitError { code, .. })) => Ok(code),
            Some(Err(e)) => Err(ScannerError::Run {
                image: target.to_owned(),
                reason: format!("wait failed: {e}"),
            }),
            None => Err(ScannerError::Run {
                image: target.to_owned(),
                reason: "wait stream ended without a status".to_owned(),
            }),
        }
    }

    /// Collects stdout and stderr of a stopped container.
    async fn collect_logs(&self, id: &str, target: &str) -> Result<(String, String), ScannerError> {
        use bollard::container::LogsOptions;

        let options = LogsOptions::<String> {
            stdout: true,
            stderr: true,
            follow: false,
            ..Default::default()
        };

        let mut buffers = LogBuffers::default();
        let mut stream = self.docker.logs(id, Some(options));

        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| ScannerError::Run {
                image: target.to_owned(),
                reason: format!("failed to read logs: {e}"),
            })?;
            buffers.push(chunk);
        }

        Ok(buffers.into_strings())
    }

    /// Force-removes a container, logging failures.
    async fn remove(&self, id: &str) {
        use bollard::container::RemoveContainerOptions;

        let options = RemoveContainerOptions {
            force: true,
            ..Default::default()
        };
        if let Err(e) = self.docker.remove_container(id, Some(options)).await {
            warn!(container_id = %id, error = %e, "failed to remove scanner container");
        }
    }

    /// Starts a created container and collects its output, honouring the timeout.
    async fn start_and_collect(&self, id: &str, spec: &RunSpec) -> Result<RunOutput, ScannerError> {
        use bollard::container::StartContainerOptions;

        self.docker
            .start_container(id, None::<StartContainerOptions<String>>)
            .await
            .map_err(|e| ScannerError::Run {
                image: spec.target.clone(),
                reason: format!("start failed: {e}"),
            })?;

        let exit_code = match spec.timeout {
            Some(limit) => tokio::time::timeout(limit, self.wait_for_exit(id, &spec.target))
                .await
                .map_err(|_| ScannerError::Timeout {
                    operation: "scan".to_owned(),
                    image: spec.target.clone(),
                    secs: limit.as_secs(),
                })??,
            None => self.wait_for_exit(id, &spec.target).await?,
        };

        let (stdout, stderr) = self.collect_logs(id, &spec.target).await?;
        Ok(RunOutput {
            exit_code,
            stdout,
            stderr,
        })
    }
}

impl ContainerRuntime for BollardRuntime {
    async fn pull_image(&self, image: &str) -> Result<(), ScannerError> {
        use bollard::image::CreateImageOptions;

        let (from_image, tag) = split_reference(image);
        let options = CreateImageOptions {
            from_image,
            tag,
            ..Default::default()
        };

        let mut stream = self.docker.create_image(Some(options), None, None);
        while let Some(progress) = stream.next().await {
            let info = progress.map_err(|e| ScannerError::Pull {
                image: image.to_owned(),
                reason: e.to_string(),
            })?;
            if let Some(status) = info.status {
                trace!(image = %image, status = %status, "pull progress");
            }
        }

        debug!(image = %image, "image pulled");
        Ok(())
    }

    async fn run_container(&self, spec: &RunSpec) -> Result<RunOutput, ScannerError> {
        use bollard::container::{Config, CreateContainerOptions};
        use bollard::models::HostConfig;

        let options = CreateContainerOptions {
            name: spec.name.clone(),
            platform: None,
        };
        let config = Config {
            image: Some(spec.image.clone()),
            cmd: Some(spec.command.clone()),
            env: Some(spec.env_list()),
            tty: Some(false),
            attach_stdout: Some(true),
            attach_stderr: Some(true),
            host_config: Some(HostConfig {
                binds: Some(spec.binds.clone()),
                ..Default::default()
            }),
            ..Default::default()
        };

        let created = self
            .docker
            .create_container(Some(options), config)
            .await
            .map_err(|e| ScannerError::Run {
                image: spec.target.clone(),
                reason: format!("create failed: {e}"),
            })?;

        debug!(container = %spec.name, target = %spec.target, "scanner container created");

        let result = self.start_and_collect(&created.id, spec).await;
        self.remove(&created.id).await;
        result
    }
}

/// 테스트용 Mock 컨테이너 런타임
///
/// 이미지별 실패와 스캐너 출력을 설정할 수 있고, 호출 기록을 남깁니다.
#[cfg(test)]
#[derive(Default)]
pub struct MockContainerRuntime {
    /// pull 실패를 시뮬레이션할 이미지
    pub failing_pulls: Vec<String>,
    /// 대상 이미지별 스캐너 stdout (없으면 `{"ok":true}`)
    pub outputs: std::collections::HashMap<String, String>,
    /// 실행 실패를 시뮬레이션할 대상 이미지
    pub failing_runs: Vec<String>,
    /// 호출 기록 (`pull:<image>`, `run:<target>`)
    pub calls: std::sync::Mutex<Vec<String>>,
    /// 마지막으로 받은 RunSpec 목록
    pub specs: std::sync::Mutex<Vec<RunSpec>>,
}

#[cfg(test)]
impl MockContainerRuntime {
    /// 모든 호출이 성공하는 mock 런타임을 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// 해당 이미지의 pull이 실패하도록 설정합니다.
    pub fn with_failing_pull(mut self, image: &str) -> Self {
        self.failing_pulls.push(image.to_owned());
        self
    }

    /// 해당 대상 이미지의 스캐너 출력을 설정합니다.
    pub fn with_output(mut self, target: &str, stdout: &str) -> Self {
        self.outputs.insert(target.to_owned(), stdout.to_owned());
        self
    }

    /// 해당 대상 이미지의 스캐너 실행이 실패하도록 설정합니다.
    pub fn with_failing_run(mut self, target: &str) -> Self {
        self.failing_runs.push(target.to_owned());
        self
    }

    /// 호출 기록을 반환합니다.
    pub fn recorded_calls(&self) -> Vec<String> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    fn record(&self, call: String) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call);
        }
    }
}

#[cfg(test)]
impl ContainerRuntime for MockContainerRuntime {
    async fn pull_image(&self, image: &str) -> Result<(), ScannerError> {
        self.record(format!("pull:{image}"));
        if self.failing_pulls.iter().any(|i| i == image) {
            return Err(ScannerError::Pull {
                image: image.to_owned(),
                reason: "mock failure".to_owned(),
            });
        }
        Ok(())
    }

    async fn run_container(&self, spec: &RunSpec) -> Result<RunOutput, ScannerError> {
        self.record(format!("run:{}", spec.target));
        if let Ok(mut specs) = self.specs.lock() {
            specs.push(spec.clone());
        }
        if self.failing_runs.iter().any(|i| i == &spec.target) {
            return Err(ScannerError::Run {
                image: spec.target.clone(),
                reason: "mock failure".to_owned(),
            });
        }
        let stdout = self
            .outputs
            .get(&spec.target)
            .cloned()
            .unwrap_or_else(|| r#"{"ok":true}"#.to_owned());
        Ok(RunOutput {
            exit_code: 0,
            stdout,
            stderr: String::new(),
        })
    }
}
