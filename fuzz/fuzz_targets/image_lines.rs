#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;

use chartscan_manifest::{ImageExtractor, LineImageExtractor};

/// 퍼저용 구조적 `image:` 라인 입력
#[derive(Arbitrary, Debug)]
struct FuzzLine {
    indent: u8,
    quote: FuzzQuote,
    value: String,
}

#[derive(Arbitrary, Debug)]
enum FuzzQuote {
    None,
    Single,
    Double,
}

fuzz_target!(|lines: Vec<FuzzLine>| {
    // 라인 수 제한 (퍼징 성능)
    let lines: Vec<&FuzzLine> = lines.iter().take(64).collect();

    let mut text = String::new();
    let mut expected = Vec::new();
    for line in &lines {
        // 값 안의 줄바꿈과 따옴표는 라인 구조를 깨뜨리므로 제외
        let value: String = line
            .value
            .chars()
            .filter(|c| !matches!(c, '\n' | '\r' | '"' | '\''))
            .collect();
        let value = value.trim().to_owned();

        let quoted = match line.quote {
            FuzzQuote::None => value.clone(),
            FuzzQuote::Single => format!("'{value}'"),
            FuzzQuote::Double => format!("\"{value}\""),
        };
        let indent = " ".repeat(usize::from(line.indent % 16));
        text.push_str(&format!("{indent}image: {quoted}\n"));

        // 따옴표 없는 빈 값은 키만 있는 줄이 되어 무시됨
        let keyed = !value.is_empty() || !matches!(line.quote, FuzzQuote::None);
        if keyed && !expected.contains(&value) {
            expected.push(value);
        }
    }

    let images = LineImageExtractor::new()
        .extract(&text)
        .expect("line extraction never fails");
    let found: Vec<&str> = images.iter().map(|i| i.as_str()).collect();
    assert_eq!(found, expected.iter().map(String::as_str).collect::<Vec<_>>());
});
