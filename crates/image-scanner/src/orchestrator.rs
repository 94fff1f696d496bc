//! 스캔 오케스트레이터 -- 렌더링부터 리포트까지의 전체 흐름을 구동합니다.
//!
//! [`ScanOrchestrator`]는 다음 순서로 동작합니다.
//!
//! 1. 입력 디렉토리 렌더링 ([`ManifestRenderer`]) 후 렌더러 실패 정책 적용
//! 2. 이미지 참조 추출 ([`ImageExtractor`])
//! 3. 차트 디스크립터에서 레이블 생성 (실패 시 즉시 중단)
//! 4. 스캔 활성화 시 스캐너 이미지를 한 번 pull (pull 실패 정책 적용)
//! 5. 이미지마다 pull, 스캐너 실행, JSON 파싱
//!
//! 5단계의 실패는 해당 이미지만 리포트에서 제외하고 나머지는 계속 진행합니다.
//! 동시 스캔 수가 1보다 커도 결과는 발견 순서대로 누적됩니다.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use chartscan_core::metrics::{
    IMAGE_PULLS_TOTAL, IMAGES_DISCOVERED_TOTAL, IMAGES_DROPPED_TOTAL, LABEL_RESULT, LABEL_STAGE,
    SCAN_DURATION_SECONDS, SCANS_TOTAL,
};
use chartscan_core::types::{ImageReference, ScanOutcome, ScanToken};
use chartscan_manifest::{ChartDescriptor, ImageExtractor, LineImageExtractor, ManifestRenderer};
use futures_util::StreamExt;
use futures_util::stream;
use metrics::{counter, histogram};
use tracing::{debug, info, warn};

use crate::config::ScannerConfig;
use crate::error::ScannerError;
use crate::report::{FailureStage, ImageFailure, ReportAccumulator, ScanRun};
use crate::runtime::{ContainerRuntime, RunOutput, RunSpec};

/// 스캐너 컨테이너 이름 접두어
const CONTAINER_NAME_PREFIX: &str = "chartscan-scan-";

/// 스캔 오케스트레이터
///
/// 런타임과 렌더러는 trait으로 주입되므로 테스트에서 가짜 구현으로 바꿀 수 있습니다.
/// 스캔이 비활성화된 경우 런타임 없이 만들 수 있습니다.
pub struct ScanOrchestrator<R: ContainerRuntime, M: ManifestRenderer> {
    config: ScannerConfig,
    runtime: Option<Arc<R>>,
    renderer: M,
    extractor: Box<dyn ImageExtractor>,
    token: Option<ScanToken>,
}

impl<R: ContainerRuntime, M: ManifestRenderer> ScanOrchestrator<R, M> {
    /// 렌더링과 추출만 수행하여 발견된 이미지를 반환합니다.
    ///
    /// 컨테이너 런타임은 호출하지 않습니다.
    pub async fn discover(&self, input_dir: &Path) -> Result<Vec<ImageReference>, ScannerError> {
        debug!(
            renderer = self.renderer.name(),
            dir = %input_dir.display(),
            "rendering manifests"
        );
        let output = self.renderer.render(input_dir).await?;
        let text = output.enforce(self.config.on_render_error)?;

        let images = self.extractor.extract(&text)?;
        info!(
            extractor = self.extractor.name(),
            count = images.len(),
            "images discovered"
        );
        counter!(IMAGES_DISCOVERED_TOTAL).increment(images.len() as u64);

        Ok(images.into_iter().collect())
    }

    /// 전체 오케스트레이션을 실행합니다.
    ///
    /// # Errors
    ///
    /// - 렌더러 실행 불가, 또는 fail-fast 정책에서 렌더러 실패
    /// - 구조화 추출기의 문서 파싱 실패
    /// - 차트 디스크립터 읽기/파싱 실패
    /// - fail-fast 정책에서 스캐너 이미지 pull 실패
    ///
    /// 이미지 단위 실패는 에러가 아니라 [`ScanRun::failures`]로 보고됩니다.
    pub async fn run(&self, input_dir: &Path) -> Result<ScanRun, ScannerError> {
        let images = self.discover(input_dir).await?;

        let chart = ChartDescriptor::load(input_dir).await?;
        let mut accumulator = ReportAccumulator::new(chart.label());

        if !self.config.enabled {
            info!(count = images.len(), "scanning disabled, reporting images only");
            for image in images {
                accumulator.record(image, Ok(ScanOutcome::Skipped));
            }
            return Ok(accumulator.finish());
        }

        self.prepare_scanner().await?;

        let results: Vec<_> = stream::iter(images)
            .map(|image| self.scan_image(image))
            .buffered(self.config.max_concurrent_scans.max(1))
            .collect()
            .await;

        for (image, outcome) in results {
            accumulator.record(image, outcome);
        }

        let run = accumulator.finish();
        info!(
            chart = %run.report.chart_label,
            scanned = run.report.images.len(),
            dropped = run.failures.len(),
            "scan run finished"
        );
        Ok(run)
    }

    /// 스캔 활성화 시 빌더가 보장하는 런타임
    fn runtime(&self) -> Result<&R, ScannerError> {
        self.runtime.as_deref().ok_or_else(|| ScannerError::Config {
            field: "runtime".to_owned(),
            reason: "container runtime is required when scanning is enabled".to_owned(),
        })
    }

    /// 스캐너 런타임 이미지를 pull합니다.
    async fn prepare_scanner(&self) -> Result<(), ScannerError> {
        let image = self.config.scanner_image.as_str();
        match self.pull(image).await {
            Ok(()) => {
                debug!(image = %image, "scanner image ready");
                Ok(())
            }
            Err(e) if self.config.on_pull_error.is_fail_fast() => Err(e),
            Err(e) => {
                warn!(
                    image = %image,
                    error = %e,
                    "failed to pull scanner image, continuing with local copy if any"
                );
                Ok(())
            }
        }
    }

    /// 타임아웃을 적용하여 이미지를 pull합니다.
    async fn pull(&self, image: &str) -> Result<(), ScannerError> {
        let runtime = self.runtime()?;
        let result = match self.config.pull_timeout() {
            Some(limit) => tokio::time::timeout(limit, runtime.pull_image(image))
                .await
                .map_err(|_| ScannerError::Timeout {
                    operation: "pull".to_owned(),
                    image: image.to_owned(),
                    secs: limit.as_secs(),
                })
                .and_then(|r| r),
            None => runtime.pull_image(image).await,
        };

        let label = if result.is_ok() { "success" } else { "failure" };
        counter!(IMAGE_PULLS_TOTAL, LABEL_RESULT => label).increment(1);
        result
    }

    /// 대상 이미지용 스캐너 실행 명세를 만듭니다.
    fn run_spec_for(&self, image: &ImageReference) -> RunSpec {
        let mut env = BTreeMap::new();
        if let Some(token) = &self.token {
            env.insert(self.config.token_env.clone(), token.expose().to_owned());
        }

        RunSpec {
            image: self.config.scanner_image.clone(),
            command: self.config.command_for(image.as_str()),
            env,
            binds: self.config.socket_binds.clone(),
            name: format!("{CONTAINER_NAME_PREFIX}{}", uuid::Uuid::new_v4()),
            timeout: self.config.scan_timeout(),
            target: image.to_string(),
        }
    }

    /// 이미지 한 개를 pull, 스캔, 파싱합니다.
    async fn scan_image(
        &self,
        image: ImageReference,
    ) -> (ImageReference, Result<ScanOutcome, ImageFailure>) {
        let started = Instant::now();
        let outcome = self.try_scan_image(&image).await;
        let elapsed = started.elapsed();

        histogram!(SCAN_DURATION_SECONDS).record(elapsed.as_secs_f64());
        match &outcome {
            Ok(_) => {
                counter!(SCANS_TOTAL, LABEL_RESULT => "success").increment(1);
                debug!(
                    image = %image,
                    duration_ms = elapsed.as_millis() as u64,
                    "image scanned"
                );
            }
            Err(failure) => {
                counter!(SCANS_TOTAL, LABEL_RESULT => "failure").increment(1);
                counter!(IMAGES_DROPPED_TOTAL, LABEL_STAGE => failure.stage.as_str()).increment(1);
                warn!(
                    image = %image,
                    stage = %failure.stage,
                    error = %failure.message,
                    "image dropped from report"
                );
            }
        }

        (image, outcome)
    }

    async fn run_scanner(&self, spec: &RunSpec) -> Result<RunOutput, ScannerError> {
        self.runtime()?.run_container(spec).await
    }

    async fn try_scan_image(&self, image: &ImageReference) -> Result<ScanOutcome, ImageFailure> {
        self.pull(image.as_str())
            .await
            .map_err(|e| ImageFailure::new(image.clone(), FailureStage::Pull, &e))?;

        let spec = self.run_spec_for(image);
        debug!(image = %image, container = %spec.name, "running scanner");
        let output = self
            .run_scanner(&spec)
            .await
            .map_err(|e| ImageFailure::new(image.clone(), FailureStage::Run, &e))?;

        if output.exit_code != 0 {
            // 0: 취약점 없음, 1: 취약점 발견, 그 외: 스캐너 오류. 출력은 항상 파싱을 시도
            debug!(image = %image, exit_code = output.exit_code, "scanner exited non-zero");
        }

        let findings = serde_json::from_str::<serde_json::Value>(output.stdout.trim())
            .map_err(|e| {
                let error = ScannerError::OutputParse {
                    image: image.to_string(),
                    reason: e.to_string(),
                };
                ImageFailure::new(image.clone(), FailureStage::Parse, &error)
            })?;

        Ok(ScanOutcome::Findings(findings))
    }
}

/// [`ScanOrchestrator`] 빌더
pub struct ScanOrchestratorBuilder<R: ContainerRuntime, M: ManifestRenderer> {
    config: ScannerConfig,
    runtime: Option<Arc<R>>,
    renderer: Option<M>,
    extractor: Option<Box<dyn ImageExtractor>>,
    token: Option<ScanToken>,
}

impl<R: ContainerRuntime, M: ManifestRenderer> ScanOrchestratorBuilder<R, M> {
    /// 새 빌더를 생성합니다.
    pub fn new() -> Self {
        Self {
            config: ScannerConfig::default(),
            runtime: None,
            renderer: None,
            extractor: None,
            token: None,
        }
    }

    /// 스캐너 설정을 지정합니다.
    pub fn config(mut self, config: ScannerConfig) -> Self {
        self.config = config;
        self
    }

    /// 컨테이너 런타임을 지정합니다.
    pub fn runtime(mut self, runtime: Arc<R>) -> Self {
        self.runtime = Some(runtime);
        self
    }

    /// 매니페스트 렌더러를 지정합니다.
    pub fn renderer(mut self, renderer: M) -> Self {
        self.renderer = Some(renderer);
        self
    }

    /// 이미지 추출기를 지정합니다. 지정하지 않으면 라인 스캔 추출기를 사용합니다.
    pub fn extractor(mut self, extractor: Box<dyn ImageExtractor>) -> Self {
        self.extractor = Some(extractor);
        self
    }

    /// 스캐너 인증 토큰을 지정합니다.
    pub fn token(mut self, token: ScanToken) -> Self {
        self.token = Some(token);
        self
    }

    /// 오케스트레이터를 빌드합니다.
    ///
    /// # Errors
    ///
    /// - 설정 검증 실패
    /// - 렌더러 미지정
    /// - 스캔이 활성화되었는데 런타임 또는 토큰이 없음
    pub fn build(self) -> Result<ScanOrchestrator<R, M>, ScannerError> {
        self.config.validate()?;

        if self.config.enabled && self.runtime.is_none() {
            return Err(ScannerError::Config {
                field: "runtime".to_owned(),
                reason: "container runtime is required when scanning is enabled".to_owned(),
            });
        }
        let renderer = self.renderer.ok_or_else(|| ScannerError::Config {
            field: "renderer".to_owned(),
            reason: "manifest renderer is required".to_owned(),
        })?;

        if self.config.enabled && self.token.is_none() {
            return Err(ScannerError::MissingToken {
                env_var: self.config.token_env.clone(),
            });
        }

        Ok(ScanOrchestrator {
            config: self.config,
            runtime: self.runtime,
            renderer,
            extractor: self
                .extractor
                .unwrap_or_else(|| Box::new(LineImageExtractor::new())),
            token: self.token,
        })
    }
}

impl<R: ContainerRuntime, M: ManifestRenderer> Default for ScanOrchestratorBuilder<R, M> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ScannerConfigBuilder;
    use crate::runtime::MockContainerRuntime;
    use chartscan_core::types::FailurePolicy;
    use chartscan_manifest::FilesRenderer;

    const POD: &str = "kind: Pod\nspec:\n  containers:\n    - name: a\n      image: a:1\n    - name: b\n      image: b:2\n    - name: c\n      image: c:3\n";

    fn chart_dir() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("Chart.yaml"), "name: foo\nversion: 1.2.3\n").unwrap();
        std::fs::write(dir.path().join("pod.yaml"), POD).unwrap();
        dir
    }

    fn token() -> ScanToken {
        ScanToken::new("secret-token", "SNYK_TOKEN").unwrap()
    }

    fn orchestrator(
        runtime: Arc<MockContainerRuntime>,
        config: ScannerConfig,
    ) -> ScanOrchestrator<MockContainerRuntime, FilesRenderer> {
        ScanOrchestratorBuilder::new()
            .config(config)
            .runtime(runtime)
            .renderer(FilesRenderer::new(1024 * 1024))
            .token(token())
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn scans_every_image_in_order() {
        let dir = chart_dir();
        let runtime = Arc::new(MockContainerRuntime::new());
        let run = orchestrator(Arc::clone(&runtime), ScannerConfig::default())
            .run(dir.path())
            .await
            .unwrap();

        assert_eq!(run.report.chart_label, "foo@1.2.3");
        assert_eq!(run.report.image_names(), vec!["a:1", "b:2", "c:3"]);
        assert!(run.is_complete());
        assert_eq!(
            runtime.recorded_calls(),
            vec![
                "pull:snyk/snyk:docker",
                "pull:a:1",
                "run:a:1",
                "pull:b:2",
                "run:b:2",
                "pull:c:3",
                "run:c:3",
            ]
        );
    }

    #[tokio::test]
    async fn failed_scan_drops_only_that_image() {
        let dir = chart_dir();
        let runtime = Arc::new(MockContainerRuntime::new().with_failing_run("b:2"));
        let run = orchestrator(runtime, ScannerConfig::default())
            .run(dir.path())
            .await
            .unwrap();

        assert_eq!(run.report.image_names(), vec!["a:1", "c:3"]);
        assert_eq!(run.failures.len(), 1);
        assert_eq!(run.failures[0].stage, FailureStage::Run);
    }

    #[tokio::test]
    async fn failed_pull_drops_image_with_pull_stage() {
        let dir = chart_dir();
        let runtime = Arc::new(MockContainerRuntime::new().with_failing_pull("a:1"));
        let run = orchestrator(runtime, ScannerConfig::default())
            .run(dir.path())
            .await
            .unwrap();

        assert_eq!(run.report.image_names(), vec!["b:2", "c:3"]);
        assert_eq!(run.failures[0].stage, FailureStage::Pull);
    }

    #[tokio::test]
    async fn unparsable_output_drops_image() {
        let dir = chart_dir();
        let runtime = Arc::new(MockContainerRuntime::new().with_output("c:3", "not json"));
        let run = orchestrator(runtime, ScannerConfig::default())
            .run(dir.path())
            .await
            .unwrap();

        assert_eq!(run.report.image_names(), vec!["a:1", "b:2"]);
        assert_eq!(run.failures[0].stage, FailureStage::Parse);
    }

    #[tokio::test]
    async fn disabled_scanning_never_touches_runtime() {
        let dir = chart_dir();
        let runtime = Arc::new(MockContainerRuntime::new());
        let config = ScannerConfigBuilder::new().enabled(false).build().unwrap();
        let run = orchestrator(Arc::clone(&runtime), config)
            .run(dir.path())
            .await
            .unwrap();

        assert_eq!(run.report.image_names(), vec!["a:1", "b:2", "c:3"]);
        assert!(
            run.report
                .images
                .iter()
                .all(|e| e.results == ScanOutcome::Skipped)
        );
        assert!(runtime.recorded_calls().is_empty());
    }

    #[tokio::test]
    async fn scanner_pull_failure_is_tolerated_by_default() {
        let dir = chart_dir();
        let runtime = Arc::new(MockContainerRuntime::new().with_failing_pull("snyk/snyk:docker"));
        let run = orchestrator(runtime, ScannerConfig::default())
            .run(dir.path())
            .await
            .unwrap();
        assert_eq!(run.report.images.len(), 3);
    }

    #[tokio::test]
    async fn scanner_pull_failure_aborts_when_fail_fast() {
        let dir = chart_dir();
        let runtime = Arc::new(MockContainerRuntime::new().with_failing_pull("snyk/snyk:docker"));
        let config = ScannerConfigBuilder::new()
            .on_pull_error(FailurePolicy::FailFast)
            .build()
            .unwrap();
        let err = orchestrator(Arc::clone(&runtime), config)
            .run(dir.path())
            .await
            .unwrap_err();

        assert!(matches!(err, ScannerError::Pull { .. }));
        assert_eq!(runtime.recorded_calls(), vec!["pull:snyk/snyk:docker"]);
    }

    #[tokio::test]
    async fn missing_chart_descriptor_aborts_before_image_work() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("pod.yaml"), POD).unwrap();
        let runtime = Arc::new(MockContainerRuntime::new());

        let err = orchestrator(Arc::clone(&runtime), ScannerConfig::default())
            .run(dir.path())
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            ScannerError::Manifest(chartscan_manifest::ManifestError::ChartDescriptor { .. })
        ));
        assert!(runtime.recorded_calls().is_empty());
    }

    #[tokio::test]
    async fn token_is_passed_only_through_env() {
        let dir = chart_dir();
        let runtime = Arc::new(MockContainerRuntime::new());
        orchestrator(Arc::clone(&runtime), ScannerConfig::default())
            .run(dir.path())
            .await
            .unwrap();

        let specs = runtime.specs.lock().unwrap().clone();
        assert_eq!(specs.len(), 3);
        for spec in &specs {
            assert_eq!(
                spec.env.get("SNYK_TOKEN").map(String::as_str),
                Some("secret-token")
            );
            assert!(spec.command.iter().all(|arg| !arg.contains("secret-token")));
            assert!(spec.name.starts_with(CONTAINER_NAME_PREFIX));
            assert_eq!(
                spec.binds,
                vec!["/var/run/docker.sock:/var/run/docker.sock"]
            );
        }
        // 컨테이너 이름은 스캔마다 고유
        assert_ne!(specs[0].name, specs[1].name);
    }

    #[tokio::test]
    async fn concurrent_scans_keep_discovery_order() {
        let dir = chart_dir();
        let runtime = Arc::new(MockContainerRuntime::new().with_failing_run("a:1"));
        let config = ScannerConfigBuilder::new()
            .max_concurrent_scans(3)
            .build()
            .unwrap();
        let run = orchestrator(runtime, config).run(dir.path()).await.unwrap();

        assert_eq!(run.report.image_names(), vec!["b:2", "c:3"]);
    }

    #[test]
    fn build_requires_token_when_enabled() {
        let result = ScanOrchestratorBuilder::<MockContainerRuntime, FilesRenderer>::new()
            .runtime(Arc::new(MockContainerRuntime::new()))
            .renderer(FilesRenderer::new(1024))
            .build();
        assert!(matches!(result, Err(ScannerError::MissingToken { .. })));
    }

    #[test]
    fn build_without_token_is_fine_when_disabled() {
        let config = ScannerConfigBuilder::new().enabled(false).build().unwrap();
        let result = ScanOrchestratorBuilder::<MockContainerRuntime, FilesRenderer>::new()
            .config(config)
            .runtime(Arc::new(MockContainerRuntime::new()))
            .renderer(FilesRenderer::new(1024))
            .build();
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn disabled_scanning_needs_no_runtime() {
        let dir = chart_dir();
        let config = ScannerConfigBuilder::new().enabled(false).build().unwrap();
        let orchestrator = ScanOrchestratorBuilder::<MockContainerRuntime, FilesRenderer>::new()
            .config(config)
            .renderer(FilesRenderer::new(1024 * 1024))
            .build()
            .unwrap();

        let run = orchestrator.run(dir.path()).await.unwrap();
        assert_eq!(run.report.image_names(), vec!["a:1", "b:2", "c:3"]);
        assert!(
            run.report
                .images
                .iter()
                .all(|entry| entry.results == ScanOutcome::Skipped)
        );
    }

    #[test]
    fn build_requires_runtime() {
        let result = ScanOrchestratorBuilder::<MockContainerRuntime, FilesRenderer>::new()
            .renderer(FilesRenderer::new(1024))
            .token(token())
            .build();
        assert!(matches!(result, Err(ScannerError::Config { .. })));
    }
}
