//! Output formatting for hookscope results.
//!
//! Supports three output formats:
//! - Pretty: colored terminal output for human readability
//! - JSON: structured output for programmatic consumption
//! - Markdown: a hook reference document, actions and filters sorted by name

use colored::*;
use serde::{Deserialize, Serialize};
use std::io::Write;

use crate::analysis::{HookKind, ParseFailure};
use crate::relate::HookDeclaration;
use crate::scan::{ResultSet, ScanSummary};

/// Output format selected on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Pretty,
    Json,
    Markdown,
}

// =============================================================================
// JSON Format
// =============================================================================

/// Top-level JSON report.
#[derive(Serialize, Deserialize)]
pub struct JsonReport {
    pub version: String,
    pub path: String,
    pub summary: ScanSummary,
    pub files_scanned: usize,
    pub parse_failures: Vec<ParseFailure>,
    pub hooks: Vec<HookDeclaration>,
}

impl JsonReport {
    pub fn new(path: &str, result: &ResultSet) -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            path: path.to_string(),
            summary: result.summary,
            files_scanned: result.files_scanned,
            parse_failures: result.parse_failures.clone(),
            hooks: result.hooks.clone(),
        }
    }
}

/// Write results in JSON format.
pub fn write_json<W: Write>(out: &mut W, path: &str, result: &ResultSet) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(&JsonReport::new(path, result))?;
    writeln!(out, "{}", json)?;
    Ok(())
}

// =============================================================================
// Markdown Format
// =============================================================================

/// Write results as a Markdown hook reference.
pub fn write_markdown<W: Write>(out: &mut W, title: &str, result: &ResultSet) -> anyhow::Result<()> {
    writeln!(out, "# Hooks for {}", title)?;
    writeln!(out)?;
    writeln!(
        out,
        "This document lists all hooks (actions and filters) found in {}.",
        title
    )?;
    writeln!(out)?;

    let s = &result.summary;
    writeln!(out, "## Summary")?;
    writeln!(out)?;
    writeln!(out, "- Total Hooks: {}", s.total)?;
    writeln!(out, "- Actions: {}", s.actions)?;
    writeln!(out, "- Filters: {}", s.filters)?;
    writeln!(out, "- With Listeners: {}", s.with_subscribers)?;
    writeln!(out, "- Files Scanned: {}", result.files_scanned)?;
    writeln!(out)?;

    for (kind, heading) in [(HookKind::Action, "Actions"), (HookKind::Filter, "Filters")] {
        let hooks = result.sorted_by_name(kind);
        if hooks.is_empty() {
            continue;
        }
        writeln!(out, "## {}", heading)?;
        writeln!(out)?;
        for hook in hooks {
            write_hook_markdown(out, hook)?;
        }
    }

    if !result.parse_failures.is_empty() {
        writeln!(out, "## Skipped Files")?;
        writeln!(out)?;
        for failure in &result.parse_failures {
            writeln!(out, "- `{}`: {}", failure.file, failure.reason)?;
        }
        writeln!(out)?;
    }

    Ok(())
}

fn write_hook_markdown<W: Write>(out: &mut W, hook: &HookDeclaration) -> anyhow::Result<()> {
    writeln!(out, "### `{}`", hook.name)?;
    writeln!(out)?;
    writeln!(out, "- **File:** `{}`", hook.file)?;
    writeln!(out, "- **Line:** {}", hook.line)?;
    writeln!(out, "- **Function:** `{}`", hook.function_call)?;
    writeln!(
        out,
        "- **Source:** {}",
        if hook.is_platform_hook { "platform" } else { "custom" }
    )?;

    if let Some(doc) = hook.doc_comment.as_deref().filter(|d| !d.is_empty()) {
        writeln!(out, "- **DocBlock:**")?;
        writeln!(out)?;
        writeln!(out, "```php")?;
        writeln!(out, "{}", doc)?;
        writeln!(out, "```")?;
        writeln!(out)?;
    }

    if !hook.subscribers.is_empty() {
        writeln!(out, "- **Listeners:**")?;
        for sub in &hook.subscribers {
            writeln!(
                out,
                "  - `{}` (priority {}, {} arg{}) in `{}:{}`",
                sub.callback,
                sub.priority,
                sub.accepted_args,
                if sub.accepted_args == 1 { "" } else { "s" },
                sub.file,
                sub.line
            )?;
        }
    }

    if !hook.related.is_empty() {
        writeln!(out, "- **Related Hooks:**")?;
        for edge in &hook.related {
            writeln!(out, "  - `{}` ({}, {})", edge.name, edge.kind, edge.basis)?;
        }
    }

    writeln!(out)?;
    Ok(())
}

// =============================================================================
// Pretty Format
// =============================================================================

/// Write results in pretty (human-readable) format.
pub fn write_pretty<W: Write>(out: &mut W, path: &str, result: &ResultSet) -> anyhow::Result<()> {
    // Header
    writeln!(out)?;
    writeln!(
        out,
        "  {} v{}",
        "hookscope".cyan().bold(),
        env!("CARGO_PKG_VERSION")
    )?;
    writeln!(out)?;
    writeln!(out, "  {}{}", "Scanning: ".dimmed(), path)?;
    writeln!(out)?;

    write_summary(out, result)?;
    writeln!(out)?;

    for hook in &result.hooks {
        write_hook(out, hook)?;
        writeln!(out)?;
    }

    if !result.parse_failures.is_empty() {
        write_failures(out, &result.parse_failures)?;
        writeln!(out)?;
    }

    Ok(())
}

fn write_summary<W: Write>(out: &mut W, result: &ResultSet) -> anyhow::Result<()> {
    let s = &result.summary;
    writeln!(
        out,
        "  {} hooks  {} actions  {} filters  {} with listeners  {}",
        s.total.to_string().bold(),
        s.actions.to_string().blue(),
        s.filters.to_string().magenta(),
        s.with_subscribers.to_string().green(),
        format!("({} files)", result.files_scanned).dimmed()
    )?;
    Ok(())
}

fn write_kind_tag<W: Write>(out: &mut W, kind: HookKind) -> anyhow::Result<()> {
    match kind {
        HookKind::Action => write!(out, "    {} ", "ACTION".blue())?,
        HookKind::Filter => write!(out, "    {} ", "FILTER".magenta())?,
    }
    Ok(())
}

fn write_hook<W: Write>(out: &mut W, hook: &HookDeclaration) -> anyhow::Result<()> {
    write_kind_tag(out, hook.kind)?;
    write!(out, "{}", hook.name.bold())?;
    if hook.is_platform_hook {
        write!(out, " {}", "[platform]".dimmed())?;
    }
    writeln!(
        out,
        "  {}{}",
        hook.file.blue(),
        format!(":{}", hook.line).dimmed()
    )?;

    for line in &hook.context {
        let gutter = format!("{:>6} |", line.number);
        if line.highlighted {
            writeln!(out, "    {} {}", gutter.yellow(), line.text.yellow())?;
        } else {
            writeln!(out, "    {} {}", gutter.dimmed(), line.text.dimmed())?;
        }
    }

    for sub in &hook.subscribers {
        writeln!(
            out,
            "           {} {} {}",
            "<-".green(),
            sub.callback,
            format!("(priority {}, {}:{})", sub.priority, sub.file, sub.line).dimmed()
        )?;
    }

    for edge in &hook.related {
        writeln!(
            out,
            "           {} {} {}",
            "~".cyan(),
            edge.name,
            format!("({})", edge.basis).dimmed()
        )?;
    }

    Ok(())
}

fn write_failures<W: Write>(out: &mut W, failures: &[ParseFailure]) -> anyhow::Result<()> {
    writeln!(out, "  {} ({}):", "Skipped".yellow(), failures.len())?;
    for f in failures {
        writeln!(out, "    {}  {}", f.file.blue(), f.reason.dimmed())?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::SourceFile;
    use crate::scan::Scanner;

    fn result() -> ResultSet {
        let sources = vec![SourceFile::new(
            "/plugin/plugin.php",
            r#"<?php
/**
 * Fires before an order is saved.
 */
do_action( 'shop_before_save', $order );
$total = apply_filters( 'shop_total', $total );
add_action( 'shop_before_save', 'audit_order', 5, 2 );
"#,
        )];
        Scanner::new("/plugin")
            .include_doc_comments(true)
            .run_sources(sources)
            .unwrap()
            .result_set()
            .cloned()
            .unwrap()
    }

    #[test]
    fn test_json_report_shape() {
        let mut buf = Vec::new();
        write_json(&mut buf, "/plugin", &result()).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&buf).unwrap();

        assert_eq!(value["path"], "/plugin");
        assert_eq!(value["summary"]["total"], 2);
        let hook = &value["hooks"][0];
        assert_eq!(hook["name"], "shop_before_save");
        assert_eq!(hook["kind"], "action");
        assert_eq!(hook["subscribers"][0]["callback"], "audit_order");
        assert_eq!(hook["subscribers"][0]["accepted_args"], 2);
        assert_eq!(hook["related"][0]["basis"], "proximity_and_naming");
        assert!(hook["doc_comment"].as_str().unwrap().starts_with("/**"));
        assert_eq!(value["hooks"][1]["doc_comment"], serde_json::Value::Null);
    }

    #[test]
    fn test_markdown_sections() {
        let mut buf = Vec::new();
        write_markdown(&mut buf, "plugin", &result()).unwrap();
        let md = String::from_utf8(buf).unwrap();

        assert!(md.starts_with("# Hooks for plugin\n"));
        assert!(md.contains("- Total Hooks: 2\n"));
        assert!(md.contains("## Actions\n"));
        assert!(md.contains("## Filters\n"));
        assert!(md.find("## Actions").unwrap() < md.find("## Filters").unwrap());
        assert!(md.contains("### `shop_before_save`"));
        assert!(md.contains("```php\n/**"));
        assert!(md.contains("`audit_order` (priority 5, 2 args)"));
        assert!(md.contains("`shop_total` (filter, proximity and naming)"));
        assert!(!md.contains("## Skipped Files"));
    }

    #[test]
    fn test_pretty_mentions_every_hook() {
        colored::control::set_override(false);
        let mut buf = Vec::new();
        write_pretty(&mut buf, "/plugin", &result()).unwrap();
        let text = String::from_utf8(buf).unwrap();

        assert!(text.contains("shop_before_save"));
        assert!(text.contains("shop_total"));
        assert!(text.contains("plugin.php:5"));
        assert!(text.contains("<- audit_order"));
    }
}
