//! Rendering of tagging results for the terminal.

use clap::ValueEnum;
use colored::Colorize;
use serde::Serialize;

use ontotag_engine::{TagResult, TagRun};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
}

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Left-aligned columns sized to their widest cell.
pub fn render_table(header: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = header.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            if let Some(w) = widths.get_mut(i) {
                *w = (*w).max(cell.chars().count());
            }
        }
    }

    let line = |cells: Vec<String>| -> String {
        cells
            .iter()
            .zip(&widths)
            .map(|(cell, w)| format!("{cell:<w$}", w = *w))
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    let mut out = Vec::with_capacity(rows.len() + 1);
    out.push(line(header.iter().map(|h| h.to_string()).collect()));
    for row in rows {
        out.push(line(row.clone()));
    }
    out.join("\n")
}

pub fn print_results(results: &[TagResult], format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json if results.len() == 1 => print_json(&results[0]),
        OutputFormat::Json => print_json(results),
        OutputFormat::Table => {
            let rows: Vec<Vec<String>> = results
                .iter()
                .flat_map(|r| r.rows())
                .map(|row| {
                    vec![
                        row.input_text,
                        row.normalized_text,
                        row.tag,
                        format!("{:.2}", row.confidence),
                    ]
                })
                .collect();
            print_table(&["InputText", "NormalizedText", "Tag", "Confidence"], &rows);
            Ok(())
        }
    }
}

pub fn print_runs(runs: &[TagRun], format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json if runs.len() == 1 => print_json(&runs[0]),
        OutputFormat::Json => print_json(runs),
        OutputFormat::Table => {
            let rows: Vec<Vec<String>> = runs
                .iter()
                .flat_map(|run| {
                    run.tags.iter().map(move |tag| {
                        vec![
                            run.normalized.clone(),
                            tag.entity.clone(),
                            format!("{:.2}", tag.confidence),
                            tag.match_type.to_string(),
                            tag.match_subtype.to_string(),
                        ]
                    })
                })
                .collect();
            print_table(&["NormalizedText", "Tag", "Confidence", "Type", "Subtype"], &rows);
            Ok(())
        }
    }
}

pub fn print_list(items: &[&str], format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => print_json(items),
        OutputFormat::Table => {
            for item in items {
                println!("{item}");
            }
            Ok(())
        }
    }
}

fn print_table(header: &[&str], rows: &[Vec<String>]) {
    if rows.is_empty() {
        eprintln!("{}", "no tags".yellow());
        return;
    }
    let table = render_table(header, rows);
    let mut lines = table.lines();
    if let Some(head) = lines.next() {
        println!("{}", head.bold());
    }
    for line in lines {
        println!("{line}");
    }
}
