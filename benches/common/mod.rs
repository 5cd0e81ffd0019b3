#![allow(dead_code)]
use std::path::Path;

use plc::ast::Source;
use test_support::load_cases;

/// `(case name, program text)` for every fixture benched under `tag`.
pub fn workloads(tag: &str) -> Vec<(String, String)> {
    let cases = load_cases(Path::new("tests/programs")).expect("load fixture cases");
    cases
        .into_iter()
        .filter(|case| case.is_benched(tag))
        .map(|case| {
            let source = case.read_program().expect("read fixture program");
            (case.name, source)
        })
        .collect()
}

pub fn load_source(label: &str, input: &str) -> Source {
    plc::parse(input).unwrap_or_else(|err| panic!("parse {label}: {err:#}"))
}
