use std::path::PathBuf;

use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand};
use pnx::{ConvertOptions, RemergeOptions};
use tracing_subscriber::EnvFilter;

mod cmd_batch;
mod cmd_convert;
mod cmd_csv2xlsx;
mod cmd_inspect;
mod common;

use cmd_batch::BatchArgs;
use cmd_convert::ConvertArgs;
use cmd_csv2xlsx::Csv2XlsxArgs;
use common::TableArgs;

#[derive(Parser, Debug)]
#[command(name = "pnxctl", version, about = "PROFINET topology export converter")]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
    /// Output JSON where applicable
    #[arg(long)]
    json: bool,
    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Convert one export to CSV or XLSX
    Convert {
        input: PathBuf,
        /// Output file; defaults to the input path with the format's extension
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Force csv or xlsx instead of deriving it from the output extension
        #[arg(long)]
        format: Option<String>,
        #[command(flatten)]
        table: TableArgs,
    },
    /// Convert every export below a directory
    Batch {
        input: PathBuf,
        output: PathBuf,
        #[arg(long, default_value = "csv")]
        format: String,
        /// Replace outputs that already exist
        #[arg(long)]
        overwrite: bool,
        #[command(flatten)]
        table: TableArgs,
    },
    /// Re-merge a flat CSV table into an XLSX workbook
    #[command(name = "csv2xlsx")]
    Csv2xlsx {
        input: PathBuf,
        /// Output file; defaults to the input path with an .xlsx extension
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Leading columns that identify a device
        #[arg(long, default_value_t = 2)]
        key_columns: usize,
        /// Leading columns spanned over each run
        #[arg(long, default_value_t = 6)]
        merge_columns: usize,
    },
    /// Summarise devices, ports and table sizes of one export
    Inspect {
        input: PathBuf,
        #[arg(long, default_value = "3")]
        modules: String,
    },
}

fn main() -> Result<()> {
    let Cli { verbose, json, cmd } = Cli::parse();

    let level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| level.into()),
        ))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cmd {
        Cmd::Convert {
            input,
            output,
            format,
            table,
        } => {
            let args = ConvertArgs {
                input,
                output,
                format: format.as_deref().map(common::parse_format).transpose()?,
                options: table.options()?,
            };
            cmd_convert::run(args, json)?
        }
        Cmd::Batch {
            input,
            output,
            format,
            overwrite,
            table,
        } => {
            let args = BatchArgs {
                input,
                output,
                format: common::parse_format(&format)?,
                overwrite,
                options: table.options()?,
            };
            cmd_batch::run(args, json)?
        }
        Cmd::Csv2xlsx {
            input,
            output,
            key_columns,
            merge_columns,
        } => {
            let args = Csv2XlsxArgs {
                input,
                output,
                options: RemergeOptions {
                    key_columns,
                    merge_columns,
                },
            };
            cmd_csv2xlsx::run(args, json)?
        }
        Cmd::Inspect { input, modules } => {
            let options =
                ConvertOptions::default().with_module_limit(common::parse_module_limit(&modules)?);
            cmd_inspect::run(&input, &options, json)?
        }
    };

    Ok(())
}
