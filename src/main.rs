use std::fs;
use std::io::{self, Read};

use anyhow::{Context, Result, bail};

use chi2lang::token::OperatorTable;
use chi2lang::vm::VM;

fn main() -> Result<()> {
    let mut args = std::env::args().skip(1);
    let mut run = false;
    let mut output_path: Option<String> = None;
    let mut input_path: Option<String> = None;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--run" | "-r" => run = true,
            "--output" | "-o" => {
                output_path = Some(
                    args.next()
                        .ok_or_else(|| anyhow::anyhow!("Missing output path after {arg}"))?,
                );
            }
            _ => {
                if input_path.is_some() {
                    bail!("Only one input file is supported");
                }
                input_path = Some(arg);
            }
        }
    }

    let source = if let Some(path) = &input_path {
        fs::read_to_string(path).with_context(|| format!("Reading {path}"))?
    } else {
        let mut buffer = String::new();
        io::stdin()
            .read_to_string(&mut buffer)
            .context("Reading stdin")?;
        buffer
    };

    let table = OperatorTable::new();
    let name = input_path.as_deref().unwrap_or("<stdin>");
    let assembly = chi2lang::compile_source_with(&source, &table)
        .with_context(|| format!("Compiling {name}"))?;

    if let Some(path) = &output_path {
        fs::write(path, format!("{assembly}\n")).with_context(|| format!("Writing {path}"))?;
    }

    if run {
        let state = VM::new()
            .run_assembly(&assembly)
            .with_context(|| format!("Running {name}"))?;
        let output = state.output_text();
        if !output.is_empty() {
            println!("{output}");
        }
    } else if output_path.is_none() && !assembly.is_empty() {
        println!("{assembly}");
    }
    Ok(())
}
