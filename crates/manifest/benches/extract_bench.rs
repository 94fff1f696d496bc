//! 이미지 추출 벤치마크
//!
//! 라인 스캔 전략과 구조화 파싱 전략의 처리량을 비교합니다.

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use chartscan_core::types::ExtractorKind;
use chartscan_manifest::extractor_for;

/// 컨테이너 두 개짜리 Deployment 문서
const DEPLOYMENT_DOC: &str = r#"---
apiVersion: apps/v1
kind: Deployment
metadata:
  name: web-{n}
  labels:
    app.kubernetes.io/name: web
spec:
  replicas: 3
  template:
    metadata:
      annotations:
        checksum/config: 0123456789abcdef
    spec:
      initContainers:
        - name: init
          image: "busybox:1.36"
      containers:
        - name: web
          image: "ghcr.io/example/web-{n}:1.0.0"
          ports:
            - containerPort: 8080
        - name: proxy
          image: envoyproxy/envoy:v1.29.0
"#;

/// 문서 `count`개로 이루어진 매니페스트를 생성합니다.
fn manifest(count: usize) -> String {
    (0..count)
        .map(|n| DEPLOYMENT_DOC.replace("{n}", &n.to_string()))
        .collect()
}

fn bench_extractors(c: &mut Criterion) {
    let mut group = c.benchmark_group("extract");

    for count in [1usize, 50, 500] {
        let text = manifest(count);
        group.throughput(Throughput::Bytes(text.len() as u64));

        for kind in [ExtractorKind::Line, ExtractorKind::Structured] {
            let extractor = extractor_for(kind);
            group.bench_with_input(
                BenchmarkId::new(extractor.name().to_owned(), count),
                &text,
                |b, text| b.iter(|| extractor.extract(black_box(text)).unwrap()),
            );
        }
    }

    group.finish();
}

criterion_group!(benches, bench_extractors);
criterion_main!(benches);
