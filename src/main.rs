//! Command-line inspector for wizard-annotated headers.

use std::fs;
use std::path::PathBuf;

use anyhow::{Result, bail};
use clap::Parser;
use colored::Colorize;

use cfgwizard::{ConfigItem, ItemKind, ItemStyle, WizardParser, rewrite};

/// Inspect CMSIS Configuration Wizard annotations in a C header.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Header file to parse.
    file: PathBuf,

    /// Dump the parsed tree as pretty JSON.
    #[arg(long)]
    json: bool,

    /// Rewrite with no edits and verify the file text is reproduced.
    #[arg(long)]
    check: bool,

    /// Override the start marker substring.
    #[arg(long)]
    start_marker: Option<String>,

    /// Override the end marker substring.
    #[arg(long)]
    end_marker: Option<String>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let text = fs::read_to_string(&args.file)?;
    let lines: Vec<&str> = text.lines().map(str::trim_end).collect();

    let parser = match (&args.start_marker, &args.end_marker) {
        (None, None) => WizardParser::new(),
        (start, end) => WizardParser::with_markers(
            start
                .clone()
                .unwrap_or_else(|| cfgwizard::DEFAULT_START_MARKER.to_string()),
            end.clone()
                .or_else(|| Some(cfgwizard::DEFAULT_END_MARKER.to_string())),
        ),
    };

    let Some(tree) = parser.parse(&lines) else {
        println!("{}: no configuration wizard section", args.file.display());
        return Ok(());
    };

    if args.check {
        let out = rewrite::apply(&tree, &lines);
        if out != lines {
            for (index, (before, after)) in lines.iter().zip(&out).enumerate() {
                if *before != after.as_str() {
                    eprintln!("line {}: `{}` -> `{}`", index + 1, before, after);
                }
            }
            bail!("rewrite does not reproduce {}", args.file.display());
        }
        println!("{} {}", "ok".green().bold(), args.file.display());
        return Ok(());
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&tree)?);
        return Ok(());
    }

    for item in &tree.items {
        print_item(item, 0);
    }
    Ok(())
}

fn print_item(item: &ConfigItem, depth: usize) {
    let indent = "  ".repeat(depth);
    let label = kind_label(&item.kind);
    let name = if item.style == ItemStyle::Error {
        item.name.red().bold()
    } else if matches!(item.kind, ItemKind::Group | ItemKind::Section { .. }) {
        item.name.bold()
    } else {
        item.name.normal()
    };

    match &item.display_value {
        Some(value) => println!("{indent}{} {} = {}", label.dimmed(), name, value.green()),
        None => println!("{indent}{} {}", label.dimmed(), name),
    }
    for line in &item.detail {
        println!("{indent}    {}", line.dimmed());
    }
    for child in &item.children {
        print_item(child, depth + 1);
    }
}

fn kind_label(kind: &ItemKind) -> &'static str {
    match kind {
        ItemKind::Group => "[h]",
        ItemKind::Section { .. } => "[e]",
        ItemKind::Code { .. } => "[c]",
        ItemKind::Bool => "[q]",
        ItemKind::Option(_) => "[o]",
        ItemKind::Text { .. } => "[s]",
        ItemKind::Notice => "[n]",
    }
}
