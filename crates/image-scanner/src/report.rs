//! 리포트 누적 -- 이미지별 결과를 발견 순서대로 모읍니다.
//!
//! 실패한 이미지는 리포트에 넣지 않고 [`ImageFailure`]로 따로 기록합니다.
//! 최종 결과는 [`ScanRun`]으로 반환되며, 직렬화되는 것은 `report`뿐입니다.

use std::fmt;

use chartscan_core::types::{ImageEntry, ImageReference, Report, ScanOutcome};
use serde::Serialize;

use crate::error::ScannerError;

/// 이미지 처리 실패 단계
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FailureStage {
    /// 대상 이미지 pull
    Pull,
    /// 스캐너 컨테이너 실행
    Run,
    /// 스캐너 출력 파싱
    Parse,
    /// pull 또는 스캔 시간 초과
    Timeout,
}

impl FailureStage {
    /// 메트릭 레이블용 문자열
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pull => "pull",
            Self::Run => "run",
            Self::Parse => "parse",
            Self::Timeout => "timeout",
        }
    }
}

impl fmt::Display for FailureStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 리포트에서 제외된 이미지
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageFailure {
    /// 대상 이미지
    pub image: ImageReference,
    /// 실패 단계
    pub stage: FailureStage,
    /// 에러 메시지
    pub message: String,
}

impl ImageFailure {
    /// 단계와 에러로 실패 기록을 만듭니다. 타임아웃 에러는 단계와 관계없이 `Timeout`입니다.
    pub fn new(image: ImageReference, stage: FailureStage, error: &ScannerError) -> Self {
        let stage = match error {
            ScannerError::Timeout { .. } => FailureStage::Timeout,
            _ => stage,
        };
        Self {
            image,
            stage,
            message: error.to_string(),
        }
    }
}

/// 오케스트레이션 한 번의 결과
#[derive(Debug, Clone, PartialEq)]
pub struct ScanRun {
    /// 출력할 리포트
    pub report: Report,
    /// 리포트에서 제외된 이미지 목록 (발견 순서)
    pub failures: Vec<ImageFailure>,
}

impl ScanRun {
    /// 모든 이미지가 리포트에 포함되었는지 반환합니다.
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// 리포트 누적기
///
/// 결과는 호출 순서대로 쌓이므로 호출자가 발견 순서를 지켜야 합니다.
#[derive(Debug)]
pub struct ReportAccumulator {
    report: Report,
    failures: Vec<ImageFailure>,
}

impl ReportAccumulator {
    /// 차트 레이블로 누적기를 생성합니다.
    pub fn new(chart_label: impl Into<String>) -> Self {
        Self {
            report: Report::new(chart_label),
            failures: Vec::new(),
        }
    }

    /// 이미지 한 개의 결과를 기록합니다.
    pub fn record(&mut self, image: ImageReference, outcome: Result<ScanOutcome, ImageFailure>) {
        match outcome {
            Ok(results) => self.report.images.push(ImageEntry {
                image_name: image,
                results,
            }),
            Err(failure) => self.failures.push(failure),
        }
    }

    /// 지금까지 리포트에 들어간 이미지 수
    pub fn len(&self) -> usize {
        self.report.images.len()
    }

    /// 리포트가 비어 있는지 반환합니다.
    pub fn is_empty(&self) -> bool {
        self.report.images.is_empty()
    }

    /// 누적을 끝내고 결과를 반환합니다.
    pub fn finish(self) -> ScanRun {
        ScanRun {
            report: self.report,
            failures: self.failures,
        }
    }
}
