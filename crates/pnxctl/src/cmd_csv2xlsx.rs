use std::path::PathBuf;

use anyhow::{Context, Result};
use pnx::{remerge_file, RemergeOptions, RemergeSummary};
use serde::Serialize;
use tracing::info;

use crate::common;

#[derive(Debug, Clone)]
pub struct Csv2XlsxArgs {
    pub input: PathBuf,
    pub output: Option<PathBuf>,
    pub options: RemergeOptions,
}

#[derive(Serialize)]
struct Csv2XlsxReport {
    input: String,
    output: String,
    #[serde(flatten)]
    summary: RemergeSummary,
}

pub fn run(args: Csv2XlsxArgs, json: bool) -> Result<()> {
    let output = args
        .output
        .clone()
        .unwrap_or_else(|| args.input.with_extension("xlsx"));
    let summary = remerge_file(&args.input, &output, &args.options)
        .with_context(|| format!("re-merge {}", args.input.display()))?;
    info!(
        input = %args.input.display(),
        output = %output.display(),
        rows = summary.rows,
        runs = summary.merge_runs,
        "re-merged"
    );

    if json {
        return common::print_json(&Csv2XlsxReport {
            input: args.input.display().to_string(),
            output: output.display().to_string(),
            summary,
        });
    }
    println!(
        "{} -> {} ({} rows, {} merged runs)",
        args.input.display(),
        output.display(),
        summary.rows,
        summary.merge_runs
    );
    Ok(())
}
