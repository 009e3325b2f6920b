// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! `amaro-lsp check`: analyze files once and report.

use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use amaro_analysis::analyze;
use amaro_diagnostics::formatter::DiagnosticFormatter;
use amaro_diagnostics::json::{to_json_report, DiagnosticReport};
use colored::Colorize;

use crate::Format;

/// Respect NO_COLOR and FORCE_COLOR on top of `colored`'s tty detection.
fn init_color() {
    if std::env::var_os("NO_COLOR").is_some() {
        colored::control::set_override(false);
    } else if std::env::var_os("FORCE_COLOR").is_some() {
        colored::control::set_override(true);
    }
}

/// Totals over every checked file.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Summary {
    pub errors: usize,
    pub warnings: usize,
    pub unreadable: usize,
}

impl Summary {
    pub fn exit_code(&self) -> ExitCode {
        if self.errors > 0 || self.unreadable > 0 {
            ExitCode::FAILURE
        } else {
            ExitCode::SUCCESS
        }
    }
}

pub fn run(files: &[PathBuf], format: Format) -> Summary {
    init_color();

    let mut reports: Vec<DiagnosticReport> = Vec::new();
    let mut summary = Summary::default();

    for path in files {
        let name = path.display().to_string();
        let source = match fs::read_to_string(path) {
            Ok(s) => s,
            Err(e) => {
                eprintln!("{}: reading {}: {}", "error".red().bold(), name, e);
                summary.unreadable += 1;
                continue;
            }
        };

        let analysis = analyze(&source);
        let file_errors = analysis.error_count();
        summary.errors += file_errors;
        summary.warnings += analysis.diagnostics.len() - file_errors;

        match format {
            Format::Human => {
                if !analysis.diagnostics.is_empty() {
                    let formatter = DiagnosticFormatter::new(&source).with_file_name(&name);
                    eprintln!("{}", formatter.format_all(&analysis.diagnostics));
                }
            }
            Format::Json => reports.push(to_json_report(&analysis.diagnostics, &source, &name)),
        }
    }

    match format {
        Format::Json => match serde_json::to_string_pretty(&reports) {
            Ok(json) => println!("{}", json),
            Err(e) => eprintln!("{}: {}", "error".red().bold(), e),
        },
        Format::Human if summary == Summary::default() => {
            println!("{} {} file(s) checked, no problems", "ok".green().bold(), files.len());
        }
        Format::Human => {
            eprintln!(
                "{} {} error(s), {} warning(s)",
                "failed".red().bold(),
                summary.errors,
                summary.warnings
            );
        }
    }

    summary
}
