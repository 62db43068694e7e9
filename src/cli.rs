//! CLI command definitions and handlers.

use clap::{Parser, Subcommand};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::config::{self, ScanConfig};
use crate::report::{self, OutputFormat};
use crate::scan::{HookTypeFilter, ResultSet, ScanOutcome, Scanner};

/// Exit codes.
pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_NO_HOOKS: i32 = 1;
pub const EXIT_ERROR: i32 = 2;

/// Default configuration written by `init`.
const DEFAULT_CONFIG: &str = include_str!("templates/hookscope.yaml");

/// Discover WordPress hooks in a PHP code base.
///
/// Hookscope finds every action and filter a plugin or theme fires, the
/// callbacks registered against them, and hooks that look related by name
/// or position.
#[derive(Parser)]
#[command(name = "hookscope")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable debug logging (same as RUST_LOG=debug)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Scan a file or directory for hooks
    Scan(ScanArgs),
    /// Write a default hookscope.yaml
    Init(InitArgs),
}

/// Arguments for the scan command.
#[derive(Parser)]
pub struct ScanArgs {
    /// Path to scan (file or directory)
    pub path: PathBuf,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Pretty)]
    pub format: OutputFormat,

    /// Only report declarations of this type: all, action or filter
    #[arg(short = 't', long)]
    pub hook_type: Option<HookTypeFilter>,

    /// Capture doc comments above declarations
    #[arg(long)]
    pub include_doc_comments: bool,

    /// Platform hook prefix; repeat to give several (replaces the configured list)
    #[arg(short, long = "platform-prefix", value_name = "PREFIX")]
    pub platform_prefixes: Vec<String>,

    /// Path to config YAML file (default: auto-discover)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Write the report to a file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Parse files in parallel
    #[arg(long)]
    pub parallel: bool,
}

/// Arguments for the init command.
#[derive(Parser)]
pub struct InitArgs {
    /// Output file path
    #[arg(short, long, default_value = "hookscope.yaml")]
    pub output: PathBuf,
}

/// Load the config file (explicit or discovered) and apply CLI overrides.
fn resolve_config(args: &ScanArgs) -> anyhow::Result<ScanConfig> {
    let path = match &args.config {
        Some(p) => Some(p.clone()),
        None => ScanConfig::discover(&args.path),
    };

    let mut config = match path {
        Some(p) => {
            tracing::debug!(config = %p.display(), "loading config");
            ScanConfig::parse_file(&p)
                .map_err(|e| anyhow::anyhow!("parsing config {}: {}", p.display(), e))?
        }
        None => ScanConfig::default(),
    };

    if let Some(filter) = args.hook_type {
        config.hook_type = filter;
    }
    if args.include_doc_comments {
        config.include_doc_comments = true;
    }
    if !args.platform_prefixes.is_empty() {
        config.platform_prefixes = args.platform_prefixes.clone();
    }
    if args.parallel {
        config.parallel = true;
    }

    config::validate(&config)?;
    Ok(config)
}

/// Name used in report titles: the scanned directory or file name.
fn scan_title(path: &Path) -> String {
    path.canonicalize()
        .ok()
        .as_deref()
        .and_then(|p| p.file_name())
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

fn render<W: Write>(
    out: &mut W,
    format: OutputFormat,
    path: &Path,
    result: &ResultSet,
) -> anyhow::Result<()> {
    let path_str = path.to_string_lossy().to_string();
    match format {
        OutputFormat::Json => report::write_json(out, &path_str, result)?,
        OutputFormat::Markdown => report::write_markdown(out, &scan_title(path), result)?,
        OutputFormat::Pretty => report::write_pretty(out, &path_str, result)?,
    }
    out.flush()?;
    Ok(())
}

/// Run the scan command.
pub fn run_scan(args: &ScanArgs) -> anyhow::Result<i32> {
    let config = match resolve_config(args) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: invalid config: {}", e);
            return Ok(EXIT_ERROR);
        }
    };

    let outcome = match Scanner::new(&args.path).config(config).run() {
        Ok(o) => o,
        Err(e) => {
            eprintln!("Error: {}", e);
            return Ok(EXIT_ERROR);
        }
    };

    for failure in outcome.parse_failures() {
        eprintln!("Warning: {}", failure);
    }

    let result = match outcome {
        ScanOutcome::Found(result) => result,
        ScanOutcome::Empty { files_scanned, .. } => {
            eprintln!(
                "Warning: no hooks found in {} ({} files scanned)",
                args.path.display(),
                files_scanned
            );
            return Ok(EXIT_NO_HOOKS);
        }
    };

    match &args.output {
        Some(output) => {
            colored::control::set_override(false);
            let mut file = BufWriter::new(File::create(output)?);
            render(&mut file, args.format, &args.path, &result)?;
            eprintln!(
                "Wrote {} hooks to {}",
                result.summary.total,
                output.display()
            );
        }
        None => {
            let stdout = io::stdout();
            let mut lock = stdout.lock();
            render(&mut lock, args.format, &args.path, &result)?;
        }
    }

    Ok(EXIT_SUCCESS)
}

/// Run the init command.
pub fn run_init(args: &InitArgs) -> anyhow::Result<i32> {
    // Check if output already exists
    if args.output.exists() {
        eprintln!("Error: file already exists: {}", args.output.display());
        eprintln!("Remove it or use --output to specify a different path");
        return Ok(EXIT_ERROR);
    }

    // Create output directory if needed
    if let Some(parent) = args.output.parent() {
        if !parent.as_os_str().is_empty() && parent != Path::new(".") {
            if let Err(e) = std::fs::create_dir_all(parent) {
                eprintln!("Error: failed to create directory: {}", e);
                return Ok(EXIT_ERROR);
            }
        }
    }

    if let Err(e) = std::fs::write(&args.output, DEFAULT_CONFIG) {
        eprintln!("Error: failed to write config: {}", e);
        return Ok(EXIT_ERROR);
    }

    println!("Created {}", args.output.display());
    println!();
    println!("Next steps:");
    println!("  1. Edit {} to customize for your project", args.output.display());
    println!("  2. Run: hookscope scan . --config {}", args.output.display());

    Ok(EXIT_SUCCESS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_template_is_valid() {
        let config = ScanConfig::parse_str(DEFAULT_CONFIG).unwrap();
        config::validate(&config).unwrap();
        let defaults = ScanConfig::default();
        assert_eq!(config.platform_prefixes, defaults.platform_prefixes);
        assert_eq!(config.relationships, defaults.relationships);
        assert_eq!(config.excluded_paths, defaults.excluded_paths);
    }

    #[test]
    fn test_cli_overrides_config_file() {
        let temp = TempDir::new().unwrap();
        let config_path = temp.path().join("custom.yaml");
        std::fs::write(&config_path, "hook_type: action\nplatform_prefixes: [\"wp_\"]\n").unwrap();

        let args = Cli::parse_from([
            "hookscope",
            "scan",
            temp.path().to_str().unwrap(),
            "--config",
            config_path.to_str().unwrap(),
            "--hook-type",
            "filter",
            "--platform-prefix",
            "acme_",
            "--platform-prefix",
            "shop_",
        ]);
        let Commands::Scan(scan) = args.command else {
            panic!("expected scan command");
        };

        let config = resolve_config(&scan).unwrap();
        assert_eq!(config.hook_type, HookTypeFilter::Filter);
        assert_eq!(config.platform_prefixes, vec!["acme_", "shop_"]);
    }

    #[test]
    fn test_scan_exit_codes() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("a.php"), "<?php echo 1;\n").unwrap();

        let scan = |path: &Path, output: Option<PathBuf>| ScanArgs {
            path: path.to_path_buf(),
            format: OutputFormat::Json,
            hook_type: None,
            include_doc_comments: false,
            platform_prefixes: Vec::new(),
            config: None,
            output,
            parallel: false,
        };

        assert_eq!(run_scan(&scan(temp.path(), None)).unwrap(), EXIT_NO_HOOKS);
        assert_eq!(
            run_scan(&scan(&temp.path().join("missing"), None)).unwrap(),
            EXIT_ERROR
        );

        std::fs::write(temp.path().join("b.php"), "<?php do_action( 'acme_ready' );\n").unwrap();
        let report = temp.path().join("out/report.json");
        std::fs::create_dir_all(report.parent().unwrap()).unwrap();
        assert_eq!(
            run_scan(&scan(temp.path(), Some(report.clone()))).unwrap(),
            EXIT_SUCCESS
        );
        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&report).unwrap()).unwrap();
        assert_eq!(json["hooks"][0]["name"], "acme_ready");
    }

    #[test]
    fn test_init_writes_template_once() {
        let temp = TempDir::new().unwrap();
        let args = InitArgs {
            output: temp.path().join("conf/hookscope.yaml"),
        };
        assert_eq!(run_init(&args).unwrap(), EXIT_SUCCESS);
        assert!(args.output.exists());
        assert_eq!(run_init(&args).unwrap(), EXIT_ERROR);
    }
}
