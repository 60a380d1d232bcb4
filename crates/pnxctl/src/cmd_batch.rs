use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use anyhow::{Context, Result};
use pnx::{convert_file, ConvertOptions, OutputFormat};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::common;

#[derive(Debug, Clone)]
pub struct BatchArgs {
    pub input: PathBuf,
    pub output: PathBuf,
    pub format: OutputFormat,
    pub overwrite: bool,
    pub options: ConvertOptions,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum Outcome {
    Converted { rows: usize },
    Skipped { reason: String },
    Failed { error: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct FileReport {
    pub input: String,
    pub output: Option<String>,
    #[serde(flatten)]
    pub outcome: Outcome,
}

#[derive(Debug, Serialize)]
pub struct BatchReport {
    pub finished_at: String,
    pub total: usize,
    pub converted: usize,
    pub skipped: usize,
    pub failed: usize,
    pub files: Vec<FileReport>,
}

impl BatchReport {
    fn new(files: Vec<FileReport>, finished_at: String) -> Self {
        let count = |f: fn(&Outcome) -> bool| files.iter().filter(|r| f(&r.outcome)).count();
        BatchReport {
            finished_at,
            total: files.len(),
            converted: count(|o| matches!(o, Outcome::Converted { .. })),
            skipped: count(|o| matches!(o, Outcome::Skipped { .. })),
            failed: count(|o| matches!(o, Outcome::Failed { .. })),
            files,
        }
    }
}

/// Every `*.xml` file below `root`, sorted. Symlinked directories are not
/// descended into.
pub fn collect_inputs(root: &Path) -> Result<Vec<PathBuf>> {
    let mut found = Vec::new();
    let mut pending = vec![root.to_path_buf()];
    while let Some(dir) = pending.pop() {
        let entries =
            fs::read_dir(&dir).with_context(|| format!("read directory {}", dir.display()))?;
        for entry in entries {
            let entry = entry?;
            let path = entry.path();
            if entry.file_type()?.is_dir() {
                pending.push(path);
            } else if is_xml(&path) {
                found.push(path);
            }
        }
    }
    found.sort();
    Ok(found)
}

fn is_xml(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("xml"))
}

fn is_copy(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| name.to_ascii_lowercase().contains("copy"))
}

/// Target path of one input.
///
/// Only the first directory level below `root` is kept. A file alone in its
/// directory, or one with a digit in the first two characters of its stem
/// (date-stamped exports), is named after that directory.
pub fn target_path(
    root: &Path,
    input: &Path,
    out_root: &Path,
    format: OutputFormat,
    siblings: usize,
) -> PathBuf {
    let parent = input.parent().unwrap_or(root);
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let dir_name = parent
        .file_name()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| stem.clone());
    let dated = stem.chars().take(2).any(|c| c.is_ascii_digit());
    let name = if siblings == 1 || dated { dir_name } else { stem };

    let mut dir = out_root.to_path_buf();
    if let Ok(rel) = parent.strip_prefix(root) {
        if let Some(first) = rel.components().next() {
            dir.push(first);
        }
    }
    dir.join(format!("{name}.{}", format.extension()))
}

fn sibling_counts(inputs: &[PathBuf]) -> BTreeMap<PathBuf, usize> {
    let mut counts = BTreeMap::new();
    for input in inputs {
        if let Some(parent) = input.parent() {
            *counts.entry(parent.to_path_buf()).or_insert(0) += 1;
        }
    }
    counts
}

pub fn convert_all(args: &BatchArgs) -> Result<Vec<FileReport>> {
    let inputs = collect_inputs(&args.input)?;
    info!(root = %args.input.display(), files = inputs.len(), "batch started");
    let counts = sibling_counts(&inputs);
    let options = args.options.with_format(args.format);
    let mut produced = HashSet::new();
    let mut reports = Vec::with_capacity(inputs.len());

    for input in &inputs {
        let siblings = input
            .parent()
            .and_then(|p| counts.get(p))
            .copied()
            .unwrap_or(1);
        let target = target_path(&args.input, input, &args.output, args.format, siblings);
        let outcome = convert_one(input, &target, &options, args.overwrite, &mut produced);
        match &outcome {
            Outcome::Converted { rows } => {
                info!(input = %input.display(), output = %target.display(), rows, "converted")
            }
            Outcome::Skipped { reason } => {
                debug!(input = %input.display(), %reason, "skipped")
            }
            Outcome::Failed { error } => {
                warn!(input = %input.display(), %error, "conversion failed")
            }
        }
        let output = match outcome {
            Outcome::Converted { .. } => Some(target.display().to_string()),
            _ => None,
        };
        reports.push(FileReport {
            input: input.display().to_string(),
            output,
            outcome,
        });
    }
    Ok(reports)
}

fn convert_one(
    input: &Path,
    target: &Path,
    options: &ConvertOptions,
    overwrite: bool,
    produced: &mut HashSet<PathBuf>,
) -> Outcome {
    if is_copy(input) {
        return Outcome::Skipped {
            reason: "copy".into(),
        };
    }
    if produced.contains(target) {
        return Outcome::Skipped {
            reason: format!("{} already produced in this run", target.display()),
        };
    }
    if target.exists() && !overwrite {
        return Outcome::Skipped {
            reason: format!("{} exists", target.display()),
        };
    }
    if let Some(dir) = target.parent() {
        if let Err(err) = fs::create_dir_all(dir) {
            return Outcome::Failed {
                error: format!("create {}: {err}", dir.display()),
            };
        }
    }
    match convert_file(input, target, options) {
        Ok(summary) => {
            produced.insert(target.to_path_buf());
            Outcome::Converted { rows: summary.rows }
        }
        Err(err) => Outcome::Failed {
            error: err.to_string(),
        },
    }
}

pub fn run(args: BatchArgs, json: bool) -> Result<()> {
    let files = convert_all(&args)?;
    let report = BatchReport::new(files, common::format_system_time(SystemTime::now())?);
    if json {
        return common::print_json(&report);
    }
    println!(
        "{} files: {} converted, {} skipped, {} failed",
        report.total, report.converted, report.skipped, report.failed
    );
    for file in &report.files {
        if let Outcome::Failed { error } = &file.outcome {
            println!("  FAILED {}: {error}", file.input);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const EXPORT: &str = "<Export><DeviceCollection><Device>\
        <NameOfStation>io-1</NameOfStation>\
        </Device></DeviceCollection></Export>";

    fn touch(path: &Path, text: &str) {
        fs::create_dir_all(path.parent().expect("parent")).expect("mkdir");
        fs::write(path, text).expect("write");
    }

    #[test]
    fn naming_follows_directory_rules() {
        let root = Path::new("/in");
        let out = Path::new("/out");
        let csv = OutputFormat::Csv;
        assert_eq!(
            target_path(root, Path::new("/in/line-a/plant.xml"), out, csv, 1),
            PathBuf::from("/out/line-a/line-a.csv")
        );
        assert_eq!(
            target_path(root, Path::new("/in/line-a/plant.xml"), out, csv, 2),
            PathBuf::from("/out/line-a/plant.csv")
        );
        assert_eq!(
            target_path(root, Path::new("/in/line-a/20240101.xml"), out, csv, 3),
            PathBuf::from("/out/line-a/line-a.csv")
        );
        assert_eq!(
            target_path(root, Path::new("/in/line-a/v2-plant.xml"), out, csv, 2),
            PathBuf::from("/out/line-a/line-a.csv")
        );
        assert_eq!(
            target_path(root, Path::new("/in/a/b/c/cell.xml"), out, OutputFormat::Xlsx, 2),
            PathBuf::from("/out/a/cell.xlsx")
        );
    }

    #[test]
    fn inputs_are_found_recursively_and_sorted() {
        let dir = TempDir::new().expect("tempdir");
        touch(&dir.path().join("b/two.XML"), EXPORT);
        touch(&dir.path().join("a/one.xml"), EXPORT);
        touch(&dir.path().join("a/notes.txt"), "skip");
        let found = collect_inputs(dir.path()).expect("collect");
        assert_eq!(
            found,
            vec![dir.path().join("a/one.xml"), dir.path().join("b/two.XML")]
        );
    }

    #[cfg(unix)]
    #[test]
    fn symlinked_directory_cycles_are_not_followed() {
        let dir = TempDir::new().expect("tempdir");
        touch(&dir.path().join("a/one.xml"), EXPORT);
        std::os::unix::fs::symlink(dir.path(), dir.path().join("a/loop")).expect("symlink");
        let found = collect_inputs(dir.path()).expect("collect");
        assert_eq!(found, vec![dir.path().join("a/one.xml")]);
    }

    #[test]
    fn failures_and_skips_do_not_stop_the_batch() {
        let input = TempDir::new().expect("tempdir");
        let output = TempDir::new().expect("tempdir");
        touch(&input.path().join("a/good.xml"), EXPORT);
        touch(&input.path().join("a/bad.xml"), "<Export/>");
        touch(&input.path().join("a/good - Copy.xml"), EXPORT);
        touch(&input.path().join("b/1.xml"), EXPORT);
        touch(&input.path().join("b/2.xml"), EXPORT);

        let args = BatchArgs {
            input: input.path().to_path_buf(),
            output: output.path().to_path_buf(),
            format: OutputFormat::Csv,
            overwrite: false,
            options: ConvertOptions::default(),
        };
        let files = convert_all(&args).expect("batch");
        let report = BatchReport::new(files, "now".into());
        assert_eq!(report.total, 5);
        assert_eq!(report.converted, 2);
        assert_eq!(report.failed, 1);
        assert_eq!(report.skipped, 2);
        assert!(output.path().join("a/good.csv").exists());
        assert!(output.path().join("b/b.csv").exists());

        let again = convert_all(&args).expect("batch again");
        assert!(again
            .iter()
            .all(|r| !matches!(r.outcome, Outcome::Converted { .. })));
    }

    #[test]
    fn outcomes_serialize_with_status_tag() {
        let report = FileReport {
            input: "a.xml".into(),
            output: None,
            outcome: Outcome::Skipped {
                reason: "copy".into(),
            },
        };
        let value = serde_json::to_value(&report).expect("json");
        assert_eq!(value["status"], "skipped");
        assert_eq!(value["reason"], "copy");
    }
}
