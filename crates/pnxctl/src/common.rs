use std::time::SystemTime;

use anyhow::{anyhow, bail, Context, Result};
use clap::Args;
use pnx::{ConvertOptions, OutputFormat, Shape};
use serde::Serialize;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

/// Table options shared by `convert` and `batch`.
#[derive(Args, Debug, Clone)]
pub struct TableArgs {
    /// Column layout: wide, device, compact or report
    #[arg(long, default_value = "wide")]
    pub shape: String,
    /// Module slots kept per device, or "all"
    #[arg(long, default_value = "3")]
    pub modules: String,
    /// Repeat parent values on every row instead of merging cells
    #[arg(long)]
    pub no_merge: bool,
    /// Omit the UTF-8 byte order mark from CSV output
    #[arg(long)]
    pub no_bom: bool,
}

impl TableArgs {
    pub fn options(&self) -> Result<ConvertOptions> {
        let shape: Shape = self.shape.parse().map_err(|err: String| anyhow!(err))?;
        Ok(ConvertOptions::default()
            .with_shape(shape)
            .with_module_limit(parse_module_limit(&self.modules)?)
            .with_merge(!self.no_merge)
            .with_bom(!self.no_bom))
    }
}

pub fn parse_module_limit(value: &str) -> Result<Option<usize>> {
    let value = value.trim();
    if value.eq_ignore_ascii_case("all") {
        return Ok(None);
    }
    match value.parse::<usize>() {
        Ok(limit) => Ok(Some(limit)),
        Err(_) => bail!("invalid module limit '{value}' (expected a number or 'all')"),
    }
}

pub fn parse_format(value: &str) -> Result<OutputFormat> {
    value.parse().map_err(|err: String| anyhow!(err))
}

pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let text = serde_json::to_string_pretty(value).context("serialise JSON output")?;
    println!("{text}");
    Ok(())
}

pub fn format_system_time(ts: SystemTime) -> Result<String> {
    let dt: OffsetDateTime = ts
        .try_into()
        .map_err(|err| anyhow!("convert time: {err}"))?;
    dt.format(&Rfc3339).context("format timestamp")
}
