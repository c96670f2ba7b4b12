use anyhow::Context;
use clap::{Parser, ValueEnum};
use glob::glob;
use ignore::WalkBuilder;
use netlint_core::config::{
    config_from_env_path_or_default, discover_config_or_default, NetlintConfig,
};
use netlint_core::linter::{lint, Level, RuleResult};
use netlint_core::parser::{parse_with_options, ParserOptions, Source};
use netlint_core::rules::rule_by_id;
use rayon::prelude::*;
use serde_json::json;
use std::cmp::min;
use std::env;
use std::path::{Path, PathBuf};
use std::{fs, process::exit};

/// File extensions treated as device configuration exports.
const CONFIG_EXTENSIONS: &[&str] = &["cfg", "conf", "ios"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
    Sarif,
}

#[derive(Parser, Debug)]
#[command(version, about = "netlint: a permissive linter for network device configurations")]
struct Cli {
    /// Files, directories, or glob patterns to check
    #[arg(help = "Files, directories, or glob patterns to check [default: .]")]
    files: Vec<PathBuf>,

    /// Report format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    /// Dump the parsed forest as JSON instead of linting
    #[arg(long)]
    ast: bool,

    /// Parse inputs as ad-hoc snippets instead of full configurations
    #[arg(long)]
    snippet: bool,

    /// Include passing results in JSON output
    #[arg(long)]
    report_passes: bool,
}

/// Lint results for one input file.
struct FileReport {
    path: PathBuf,
    results: Vec<RuleResult>,
}

/// Check if a path looks like a device configuration export
fn is_config_file(path: &Path) -> bool {
    path.extension()
        .map(|extension| extension.to_string_lossy().to_lowercase())
        .is_some_and(|ext| CONFIG_EXTENSIONS.contains(&ext.as_str()))
}

/// Resolve the argument list into concrete configuration files. Files are
/// taken as given, directories are walked (honoring ignore files), and
/// anything else is retried as a glob pattern.
fn collect_input_files(args: &[PathBuf]) -> anyhow::Result<Vec<PathBuf>> {
    let search_paths = if args.is_empty() {
        vec![PathBuf::from(".")]
    } else {
        args.to_vec()
    };

    let mut files = Vec::new();
    for path in search_paths {
        if path.is_file() {
            if is_config_file(&path) {
                files.push(path);
            }
        } else if path.is_dir() {
            let walker = WalkBuilder::new(&path)
                .hidden(false)
                .git_ignore(true)
                .git_exclude(true)
                .git_global(true)
                .build();
            for entry in walker.flatten() {
                let entry_path = entry.path();
                if entry_path.is_file() && is_config_file(entry_path) {
                    files.push(entry_path.to_path_buf());
                }
            }
        } else {
            let pattern = path.to_string_lossy();
            for entry in glob(&pattern)? {
                let file_path = entry?;
                if file_path.is_file() && is_config_file(&file_path) {
                    files.push(file_path);
                }
            }
        }
    }
    Ok(files)
}

fn parser_options(cli_snippet: bool) -> ParserOptions {
    ParserOptions {
        source: if cli_snippet {
            Source::Snippet
        } else {
            Source::Base
        },
        ..ParserOptions::default()
    }
}

/// Read one file and run the scan against the given configuration.
fn lint_one(
    path: &Path,
    config: &NetlintConfig,
    options: &ParserOptions,
) -> anyhow::Result<Vec<RuleResult>> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("can't read {}", path.display()))?;
    Ok(lint(&text, config, options))
}

/// Print failing results with 1-based line numbering for CLI display
fn print_cli_errors(reports: &[FileReport]) -> (i32, i32, i32) {
    let mut errs = 0;
    let mut warns = 0;
    let mut infos = 0;
    for report in reports {
        for result in report.results.iter().filter(|r| !r.passed) {
            let prefix = match result.level {
                Level::Error => {
                    errs += 1;
                    "ERR"
                }
                Level::Warning => {
                    warns += 1;
                    "WARN"
                }
                Level::Info => {
                    infos += 1;
                    "INFO"
                }
            };
            let alias = rule_by_id(&result.rule_id).map_or("unknown", |r| r.alias);
            // Convert 0-based line numbers to 1-based for CLI display
            eprintln!(
                "{}: {}:{} {}/{} {}",
                prefix,
                report.path.to_string_lossy(),
                result.loc.start_line + 1,
                result.rule_id,
                alias,
                result.message
            );
        }
    }

    println!("\nErrors: {errs}");
    println!("Warnings: {warns}");
    if infos > 0 {
        println!("Infos: {infos}");
    }
    (errs, warns, infos)
}

fn print_json_report(reports: &[FileReport], report_passes: bool) -> anyhow::Result<()> {
    let files: Vec<serde_json::Value> = reports
        .iter()
        .map(|report| {
            let results: Vec<&RuleResult> = report
                .results
                .iter()
                .filter(|r| report_passes || !r.passed)
                .collect();
            Ok(json!({
                "path": report.path.to_string_lossy(),
                "results": serde_json::to_value(results)?,
            }))
        })
        .collect::<anyhow::Result<_>>()?;
    println!("{}", serde_json::to_string_pretty(&files)?);
    Ok(())
}

fn sarif_level(level: Level) -> &'static str {
    match level {
        Level::Error => "error",
        Level::Warning => "warning",
        Level::Info => "note",
    }
}

/// Emit a SARIF 2.1.0 log. SARIF regions are 1-based.
fn print_sarif_report(reports: &[FileReport]) -> anyhow::Result<()> {
    let rules: Vec<serde_json::Value> = netlint_core::rules::ALL_RULES
        .iter()
        .map(|rule| {
            json!({
                "id": rule.id,
                "name": rule.alias,
                "shortDescription": { "text": rule.description },
                "properties": {
                    "obu": rule.metadata.obu,
                    "owner": rule.metadata.owner,
                },
            })
        })
        .collect();

    let results: Vec<serde_json::Value> = reports
        .iter()
        .flat_map(|report| {
            report.results.iter().filter(|r| !r.passed).map(|result| {
                let mut entry = json!({
                    "ruleId": result.rule_id,
                    "level": sarif_level(result.level),
                    "message": { "text": result.message },
                    "locations": [{
                        "physicalLocation": {
                            "artifactLocation": { "uri": report.path.to_string_lossy() },
                            "region": {
                                "startLine": result.loc.start_line + 1,
                                "endLine": result.loc.end_line + 1,
                            },
                        },
                    }],
                });
                if let Some(remediation) = &result.remediation {
                    entry["fixes"] = json!([{ "description": { "text": remediation } }]);
                }
                entry
            })
        })
        .collect();

    let sarif = json!({
        "$schema": "https://raw.githubusercontent.com/oasis-tcs/sarif-spec/master/Schemata/sarif-schema-2.1.0.json",
        "version": "2.1.0",
        "runs": [{
            "tool": {
                "driver": {
                    "name": "netlint",
                    "version": env!("CARGO_PKG_VERSION"),
                    "rules": rules,
                },
            },
            "results": results,
        }],
    });
    println!("{}", serde_json::to_string_pretty(&sarif)?);
    Ok(())
}

fn print_ast_dump(files: &[PathBuf], options: &ParserOptions) -> anyhow::Result<()> {
    let dumps: Vec<serde_json::Value> = files
        .iter()
        .map(|path| {
            let content = fs::read_to_string(path)
                .with_context(|| format!("can't read {}", path.display()))?;
            let forest = parse_with_options(&content, options);
            Ok(json!({
                "path": path.to_string_lossy(),
                "ast": serde_json::to_value(forest)?,
            }))
        })
        .collect::<anyhow::Result<_>>()?;
    println!("{}", serde_json::to_string_pretty(&dumps)?);
    Ok(())
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let options = parser_options(cli.snippet);

    let files = collect_input_files(&cli.files)?;
    if files.is_empty() {
        eprintln!("No configuration files found to lint.");
        exit(0);
    }

    if cli.ast {
        print_ast_dump(&files, &options)?;
        exit(0);
    }

    // NETLINT_CONFIG pins one configuration for the whole run; otherwise
    // each file discovers the nearest netlint.toml above it.
    let pinned = if env::var_os("NETLINT_CONFIG").is_some() {
        Some(config_from_env_path_or_default(&env::current_dir()?)?)
    } else {
        None
    };

    let reports: Vec<FileReport> = files
        .par_iter()
        .map(|path| {
            let results = match &pinned {
                Some(config) => lint_one(path, config, &options),
                None => discover_config_or_default(path)
                    .and_then(|config| lint_one(path, &config, &options)),
            }
            .unwrap_or_else(|e| {
                eprintln!("Error linting {}: {e}", path.display());
                Vec::new()
            });
            FileReport {
                path: path.clone(),
                results,
            }
        })
        .collect();

    let errs = match cli.format {
        OutputFormat::Text => print_cli_errors(&reports).0,
        OutputFormat::Json => {
            print_json_report(&reports, cli.report_passes)?;
            count_errors(&reports)
        }
        OutputFormat::Sarif => {
            print_sarif_report(&reports)?;
            count_errors(&reports)
        }
    };

    exit(min(errs, 1));
}

fn count_errors(reports: &[FileReport]) -> i32 {
    reports
        .iter()
        .flat_map(|r| &r.results)
        .filter(|r| !r.passed && r.level == Level::Error)
        .count() as i32
}
