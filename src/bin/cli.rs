//! Binary entry point for the `cactus-link` command line.
#![forbid(unsafe_code)]

#[path = "cli/config.rs"]
mod config;
#[path = "cli/ui.rs"]
mod ui;

use std::error::Error;
use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use cactus_link::admin::{
    inspect_flower_bytes, verify_file, write_flower_file, FlowerContext, FlowerFileDump,
    FlowerWriteSummary, VerifyReport,
};
use cactus_link::CodecOptions;
use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use config::CliConfig;
pub(crate) use ui::Theme;
use ui::{format_elapsed, Ui};

#[derive(Parser, Debug)]
#[command(
    name = "cactus-link",
    version,
    about = "Build, inspect, and verify cactus flower link files",
    disable_help_subcommand = true
)]
struct Cli {
    #[arg(
        long,
        global = true,
        value_name = "FILE",
        env = "CACTUS_LINK_CONFIG",
        help = "Path to cli.toml"
    )]
    config: Option<PathBuf>,

    #[arg(
        long,
        global = true,
        value_enum,
        help = "Output format for structured responses"
    )]
    format: Option<OutputFormat>,

    #[arg(long, global = true, value_enum, help = "Color theme for text output")]
    theme: Option<Theme>,

    #[arg(long, global = true, help = "Print plain text without decorations")]
    quiet: bool,

    #[arg(
        long,
        global = true,
        value_name = "FILTER",
        help = "Log filter (overrides RUST_LOG), e.g. debug or cactus_link=trace"
    )]
    log_level: Option<String>,

    #[command(flatten)]
    codec: CodecArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug)]
struct CodecArgs {
    #[arg(long, global = true, value_name = "N", help = "Reject chains longer than N links")]
    max_links: Option<usize>,

    #[arg(long, global = true, help = "Write flower files without a CRC32 footer")]
    no_checksum: bool,

    #[arg(long, global = true, help = "Skip the chain invariant check after loading")]
    skip_load_check: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Build a flower from a JSON context and write it as a flower file.
    Build(BuildCmd),
    /// Print the header and raw link records of a flower file.
    Inspect(InspectCmd),
    /// Load a flower file against a JSON context and verify every chain.
    Verify(VerifyCmd),
}

#[derive(Args, Debug)]
struct BuildCmd {
    #[arg(value_name = "CONTEXT")]
    context: PathBuf,

    #[arg(long, value_name = "FILE", help = "Destination flower file")]
    out: PathBuf,
}

#[derive(Args, Debug)]
struct InspectCmd {
    #[arg(value_name = "FILE")]
    path: PathBuf,
}

#[derive(Args, Debug)]
struct VerifyCmd {
    #[arg(value_name = "FILE")]
    path: PathBuf,

    #[arg(
        long,
        value_name = "CONTEXT",
        help = "JSON context supplying the flower's Ends and Groups"
    )]
    context: PathBuf,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

fn main() {
    match run() {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(1);
        }
    }
}

fn run() -> Result<i32, Box<dyn Error>> {
    let cli = Cli::parse();
    let config = CliConfig::load(cli.config.clone())?;
    init_tracing(cli.log_level.as_deref(), config.log_level());
    if let Some(path) = config.path() {
        tracing::debug!(path = %path.display(), "cli.config");
    }

    let format = cli.format.or(config.format()).unwrap_or(OutputFormat::Text);
    let theme = cli.theme.or(config.theme()).unwrap_or(Theme::Auto);
    let ui = Ui::new(theme, cli.quiet);
    let opts = codec_options(&cli.codec, &config);

    match &cli.command {
        Command::Build(cmd) => {
            let started = Instant::now();
            let context = FlowerContext::from_path(&cmd.context)?;
            let flower = context.build()?;
            let summary = write_flower_file(&cmd.out, &flower, &opts)?;
            let elapsed = format_elapsed(started.elapsed());
            emit(format, &summary, || print_build_text(&ui, cmd, &summary, &elapsed))?;
            Ok(0)
        }
        Command::Inspect(cmd) => {
            let bytes = fs::read(&cmd.path)?;
            let dump = inspect_flower_bytes(&bytes, &opts)?;
            emit(format, &dump, || print_inspect_text(&ui, &dump))?;
            Ok(0)
        }
        Command::Verify(cmd) => {
            let context = FlowerContext::from_path(&cmd.context)?;
            let report = verify_file(&cmd.path, &context, &opts)?;
            emit(format, &report, || print_verify_text(&ui, &report))?;
            Ok(if report.success { 0 } else { 2 })
        }
    }
}

fn init_tracing(flag: Option<&str>, configured: Option<&str>) {
    let filter = match flag {
        Some(directive) => EnvFilter::new(directive),
        None => EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(configured.unwrap_or("warn"))),
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn codec_options(args: &CodecArgs, config: &CliConfig) -> CodecOptions {
    let mut opts = config.codec_options();
    if let Some(limit) = args.max_links {
        opts = opts.max_links(limit);
    }
    if args.no_checksum {
        opts = opts.checksum(false);
    }
    if args.skip_load_check {
        opts = opts.verify_after_load(false);
    }
    opts
}

fn emit<T, F>(format: OutputFormat, value: &T, printer: F) -> Result<(), Box<dyn Error>>
where
    T: Serialize,
    F: FnOnce(),
{
    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(value)?;
            println!("{json}");
        }
        OutputFormat::Text => printer(),
    }
    Ok(())
}

fn print_build_text(ui: &Ui, cmd: &BuildCmd, summary: &FlowerWriteSummary, elapsed: &str) {
    let checksum = summary
        .checksum
        .map(|crc| format!("{crc:#010x}"))
        .unwrap_or_else(|| "none".to_string());
    ui.fields(
        "Flower file",
        &[
            ("path", cmd.out.display().to_string()),
            ("chains", summary.chains.to_string()),
            ("links", summary.links.to_string()),
            ("checksum", checksum),
        ],
    );
    ui.status(true, &format!("wrote {} in {elapsed}", cmd.out.display()));
}

fn print_inspect_text(ui: &Ui, dump: &FlowerFileDump) {
    let checksum = match (dump.checksum, dump.checksum_ok) {
        (Some(crc), Some(true)) => format!("{crc:#010x} (ok)"),
        (Some(crc), _) => format!("{crc:#010x} (MISMATCH)"),
        (None, _) => "none".to_string(),
    };
    ui.fields(
        "Header",
        &[
            ("version", dump.header.version.to_string()),
            ("flower", dump.header.flower.0.to_string()),
            ("chains", dump.header.chain_count.to_string()),
            ("checksum", checksum),
        ],
    );
    for chain in &dump.chains {
        ui.link_table(
            &format!("Chain {} ({} links)", chain.id.0, chain.links.len()),
            &chain.links,
        );
    }
    if dump.checksum_ok == Some(false) {
        ui.status(false, "stored checksum does not match the file contents");
    }
}

fn print_verify_text(ui: &Ui, report: &VerifyReport) {
    ui.fields(
        "Verify",
        &[
            ("chains", report.counts.chains.to_string()),
            ("links", report.counts.links.to_string()),
            ("orphan links", report.counts.orphan_links.to_string()),
            ("ends", report.counts.ends.to_string()),
            ("groups", report.counts.groups.to_string()),
        ],
    );
    ui.findings(&report.findings);
    if report.success {
        ui.status(true, "flower verified");
    } else {
        ui.status(false, "verification failed");
    }
}
