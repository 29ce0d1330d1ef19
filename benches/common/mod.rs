#![allow(dead_code)]
use std::fs;

use chi2lang::ast::Node;
use chi2lang::token::OperatorTable;
use chi2lang::{lexer, parser};

pub const WORKLOADS: [(&str, &str); 2] = [
    ("countdown", "tests/programs/countdown/program.chi"),
    ("nested_loops", "tests/programs/nested_loops/program.chi"),
];

pub fn load_source(path: &str) -> String {
    fs::read_to_string(path).unwrap_or_else(|err| panic!("read {path}: {err}"))
}

/// Fixture workloads plus a long generated one.
pub fn workloads() -> Vec<(String, String)> {
    let mut out: Vec<(String, String)> = WORKLOADS
        .iter()
        .map(|(label, path)| (label.to_string(), load_source(path)))
        .collect();
    out.push(("long".to_string(), long_source(200)));
    out
}

/// `copies` independent counting loops, each over its own variables.
pub fn long_source(copies: usize) -> String {
    let mut source = String::new();
    for index in 0..copies {
        source.push_str(&format!(
            "var i{index};\nvar s{index};\n\
             while (i{index} < 50) {{\n\
             \x20   if (i{index} % 3 = 0) {{ s{index} := s{index} + i{index} * 2; }} else {{ s{index} := s{index} ^ i{index}; }}\n\
             \x20   i{index} := i{index} + 1;\n\
             }}\n\
             print(s{index});\n"
        ));
    }
    source
}

pub fn load_tree(source: &str) -> Node {
    let table = OperatorTable::new();
    let tokens = lexer::tokenize(source, &table).unwrap_or_else(|err| panic!("tokenize: {err}"));
    parser::parse_tokens(tokens, &table)
        .unwrap_or_else(|err| panic!("parse: {err}"))
        .root
        .expect("workload has statements")
}
