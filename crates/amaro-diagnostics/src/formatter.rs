// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Terminal formatter for diagnostics.
//!
//! ```text
//! error[IndexTypeMismatch]: index type mismatch: expected Int, found Bool
//!   --> route.amaro:2:30
//!    |
//!  2 |     realize_gate = State.map[true]
//!    |                              ^^^^ expected an index of type Int
//!    |
//!    = note: Qubit and Int are interchangeable as index types
//! ```

use std::collections::BTreeMap;

use colored::Colorize;

use amaro_ast::LineMap;

use crate::{Diagnostic, Help, LabelStyle, Severity};

/// Formats diagnostics for terminal output.
pub struct DiagnosticFormatter<'a> {
    source: &'a str,
    file_name: Option<&'a str>,
    line_map: LineMap,
}

/// A source line with its labels.
struct AnnotatedLine {
    line_num: usize,
    text: String,
    annotations: Vec<Annotation>,
}

struct Annotation {
    col_start: usize,
    col_end: usize,
    style: LabelStyle,
    message: Option<String>,
}

impl<'a> DiagnosticFormatter<'a> {
    pub fn new(source: &'a str) -> Self {
        Self { source, file_name: None, line_map: LineMap::new(source) }
    }

    pub fn with_file_name(mut self, name: &'a str) -> Self {
        self.file_name = Some(name);
        self
    }

    pub fn format(&self, diagnostic: &Diagnostic) -> String {
        let mut out = String::new();
        self.format_header(&mut out, diagnostic);

        let annotated = self.collect_annotated_lines(diagnostic);
        let Some(primary) = diagnostic.primary_span() else {
            self.format_footer(&mut out, diagnostic, 2);
            return out;
        };

        let (line, col) = self.offset_to_line_col(primary.start);
        out.push_str(&format!(
            "  {} {}:{}:{}\n",
            "-->".blue(),
            self.file_name.unwrap_or("<source>"),
            line,
            col
        ));

        let max_line = annotated.last().map(|a| a.line_num).unwrap_or(1);
        let gutter_width = max_line.to_string().len().max(2);

        out.push_str(&format!("{} {}\n", " ".repeat(gutter_width + 1), "|".blue()));

        let mut prev_line_num: Option<usize> = None;
        for annotated_line in &annotated {
            if let Some(prev) = prev_line_num {
                if annotated_line.line_num > prev + 1 {
                    out.push_str(&format!("{} {}\n", " ".repeat(gutter_width), "...".blue()));
                }
            }

            out.push_str(&format!(
                "{:>width$} {} {}\n",
                annotated_line.line_num.to_string().blue().bold(),
                "|".blue(),
                annotated_line.text,
                width = gutter_width + 1,
            ));

            self.format_annotations(&mut out, annotated_line, gutter_width);
            prev_line_num = Some(annotated_line.line_num);
        }

        if !diagnostic.notes.is_empty() || diagnostic.help.is_some() {
            out.push_str(&format!("{} {}\n", " ".repeat(gutter_width + 1), "|".blue()));
        }
        self.format_footer(&mut out, diagnostic, gutter_width);

        out
    }

    /// Format every diagnostic, separated by blank lines.
    pub fn format_all(&self, diagnostics: &[Diagnostic]) -> String {
        diagnostics.iter().map(|d| self.format(d)).collect::<Vec<_>>().join("\n")
    }

    fn format_header(&self, out: &mut String, diagnostic: &Diagnostic) {
        let severity_str = match diagnostic.severity {
            Severity::Error => "error".red().bold(),
            Severity::Warning => "warning".yellow().bold(),
        };

        match diagnostic.code_str() {
            Some(code) => out.push_str(&format!(
                "{}[{}]: {}\n",
                severity_str,
                code.red().bold(),
                diagnostic.message.bold()
            )),
            None => out.push_str(&format!("{}: {}\n", severity_str, diagnostic.message.bold())),
        }
    }

    fn format_footer(&self, out: &mut String, diagnostic: &Diagnostic, gutter_width: usize) {
        for note in &diagnostic.notes {
            out.push_str(&format!(
                "{} {} {}: {}\n",
                " ".repeat(gutter_width + 1),
                "=".cyan(),
                "note".cyan().bold(),
                note
            ));
        }

        if let Some(ref help) = diagnostic.help {
            self.format_help(out, help, gutter_width);
        }
    }

    fn format_help(&self, out: &mut String, help: &Help, gutter_width: usize) {
        out.push_str(&format!(
            "{} {} {}: {}\n",
            " ".repeat(gutter_width + 1),
            "=".cyan(),
            "help".cyan().bold(),
            help.message
        ));

        let Some(ref suggestion) = help.suggestion else { return };
        let (line, col) = self.offset_to_line_col(suggestion.span.start);
        let Some(source_line) = self.get_line(line) else { return };

        let split = (col - 1).min(source_line.len());
        let suffix_start = (split + suggestion.span.len()).min(source_line.len());
        let (Some(prefix), Some(suffix)) = (source_line.get(..split), source_line.get(suffix_start..)) else {
            return;
        };

        out.push_str(&format!(
            "{:>width$} {} {}{}{}\n",
            line.to_string().blue().bold(),
            "|".blue(),
            prefix,
            suggestion.replacement.green(),
            suffix,
            width = gutter_width + 1,
        ));
        out.push_str(&format!(
            "{} {} {}{}\n",
            " ".repeat(gutter_width + 1),
            "|".blue(),
            " ".repeat(prefix.chars().count()),
            "~".repeat(suggestion.replacement.chars().count()).green(),
        ));
    }

    fn collect_annotated_lines(&self, diagnostic: &Diagnostic) -> Vec<AnnotatedLine> {
        let mut lines_map: BTreeMap<usize, AnnotatedLine> = BTreeMap::new();

        for label in &diagnostic.labels {
            let (line_num, col_start) = self.offset_to_line_col(label.span.start);
            let (end_line, col_end) = self.offset_to_line_col(label.span.end);

            // Multi-line spans annotate their first line only.
            let effective_col_end = if end_line == line_num {
                col_end
            } else {
                self.get_line(line_num).map(str::len).unwrap_or(0) + 1
            };

            let entry = lines_map.entry(line_num).or_insert_with(|| AnnotatedLine {
                line_num,
                text: self.get_line(line_num).unwrap_or("").to_string(),
                annotations: Vec::new(),
            });

            entry.annotations.push(Annotation {
                col_start,
                col_end: effective_col_end.max(col_start + 1),
                style: label.style,
                message: label.message.clone(),
            });
        }

        lines_map.into_values().collect()
    }

    fn format_annotations(&self, out: &mut String, annotated_line: &AnnotatedLine, gutter_width: usize) {
        let mut sorted: Vec<&Annotation> = annotated_line.annotations.iter().collect();
        sorted.sort_by(|a, b| {
            a.style.cmp_priority().cmp(&b.style.cmp_priority()).then(a.col_start.cmp(&b.col_start))
        });

        let line_len = annotated_line.text.len() + 2;
        let mut underline = vec![' '; line_len];
        let mut messages: Vec<(usize, LabelStyle, &str)> = Vec::new();

        for ann in &sorted {
            let ch = match ann.style {
                LabelStyle::Primary => '^',
                LabelStyle::Secondary => '-',
            };
            let start = ann.col_start.saturating_sub(1).min(line_len);
            let end = ann.col_end.saturating_sub(1).min(line_len);
            for slot in &mut underline[start..end] {
                *slot = ch;
            }
            if let Some(ref msg) = ann.message {
                messages.push((start, ann.style, msg));
            }
        }

        let underline_str: String = underline.iter().collect::<String>().trim_end().to_string();
        if underline_str.is_empty() {
            return;
        }
        let colored_underline = color_underline(&underline_str);
        let gutter = format!("{} {}", " ".repeat(gutter_width + 1), "|".blue());

        match messages.as_slice() {
            [] => out.push_str(&format!("{} {}\n", gutter, colored_underline)),
            [(_, style, msg)] => {
                out.push_str(&format!("{} {} {}\n", gutter, colored_underline, styled(*style, msg)));
            }
            _ => {
                out.push_str(&format!("{} {}\n", gutter, colored_underline));
                for (col, style, msg) in messages.iter().rev() {
                    let pipe = match style {
                        LabelStyle::Primary => "|".red().bold().to_string(),
                        LabelStyle::Secondary => "|".blue().to_string(),
                    };
                    out.push_str(&format!("{} {}{} {}\n", gutter, " ".repeat(*col), pipe, styled(*style, msg)));
                }
            }
        }
    }

    /// Convert byte offset to (line, col), both 1-based.
    fn offset_to_line_col(&self, offset: usize) -> (usize, usize) {
        let (line, col) = self.line_map.offset_to_line_col(offset);
        (line as usize, col as usize)
    }

    /// Get source line text by 1-based line number.
    fn get_line(&self, line_num: usize) -> Option<&str> {
        self.line_map.line_text(self.source, line_num as u32)
    }
}

impl LabelStyle {
    fn cmp_priority(&self) -> u8 {
        match self {
            LabelStyle::Primary => 0,
            LabelStyle::Secondary => 1,
        }
    }
}

fn styled(style: LabelStyle, msg: &str) -> String {
    match style {
        LabelStyle::Primary => msg.red().bold().to_string(),
        LabelStyle::Secondary => msg.blue().to_string(),
    }
}

/// Color runs of `^` red and runs of `-` blue.
fn color_underline(s: &str) -> String {
    let mut result = String::new();
    let mut current = None;
    let mut run = String::new();

    for ch in s.chars() {
        let kind = matches!(ch, '^' | '-').then_some(ch);
        if kind != current && !run.is_empty() {
            result.push_str(&flush_run(&run, current));
            run.clear();
        }
        run.push(ch);
        current = kind;
    }
    if !run.is_empty() {
        result.push_str(&flush_run(&run, current));
    }

    result
}

fn flush_run(run: &str, kind: Option<char>) -> String {
    match kind {
        Some('^') => run.red().bold().to_string(),
        Some('-') => run.blue().to_string(),
        _ => run.to_string(),
    }
}
