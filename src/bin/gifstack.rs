use std::path::PathBuf;

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "gifstack", version)]
struct Cli {
    /// Log pipeline stages to stderr (overridden by `RUST_LOG`).
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Layer images into one output (animated if one input is a GIF).
    Composite(CompositeArgs),
    /// Print the size, format and page layout of an image.
    Probe(ProbeArgs),
}

#[derive(Parser, Debug)]
struct CompositeArgs {
    /// Input images, bottom layer first. At most one may be a GIF.
    #[arg(required = true, num_args = 1..)]
    inputs: Vec<PathBuf>,

    /// Output path.
    #[arg(short, long)]
    out: PathBuf,

    /// Compose animation frames in parallel.
    #[arg(long, default_value_t = false)]
    parallel: bool,

    /// Override rayon worker threads (parallel mode only).
    #[arg(long)]
    threads: Option<usize>,

    /// Fail instead of replacing an existing output file.
    #[arg(long, default_value_t = false)]
    no_clobber: bool,

    /// Print a JSON summary to stdout.
    #[arg(long, default_value_t = false)]
    json: bool,
}

#[derive(Parser, Debug)]
struct ProbeArgs {
    /// Image to inspect.
    path: PathBuf,

    /// Print JSON instead of text.
    #[arg(long, default_value_t = false)]
    json: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    match cli.cmd {
        Command::Composite(args) => cmd_composite(args),
        Command::Probe(args) => cmd_probe(args),
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "gifstack=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn cmd_composite(args: CompositeArgs) -> anyhow::Result<()> {
    let opts = gifstack::CompositeOpts {
        parallel: args.parallel,
        threads: args.threads,
        overwrite: !args.no_clobber,
    };

    let backend = gifstack::RasterBackend::new();
    let summary = gifstack::composite_files_with(&backend, &args.inputs, &args.out, &opts)
        .with_context(|| format!("composite into '{}'", args.out.display()))?;

    if args.json {
        let json = serde_json::to_string_pretty(&summary).context("serialize summary")?;
        println!("{json}");
    } else {
        eprintln!("wrote {}", summary.out_path.display());
    }
    Ok(())
}

fn cmd_probe(args: ProbeArgs) -> anyhow::Result<()> {
    let probe = gifstack::probe_image(&args.path)
        .with_context(|| format!("probe '{}'", args.path.display()))?;

    if args.json {
        let json = serde_json::to_string_pretty(&probe).context("serialize probe")?;
        println!("{json}");
        return Ok(());
    }

    println!("{}:", probe.path.display());
    println!("  format:      {}", probe.format);
    println!("  width:       {}", probe.width);
    println!("  page_height: {}", probe.page_height);
    println!("  pages:       {}", probe.pages);
    if !probe.delays_ms.is_empty() {
        let delays = probe
            .delays_ms
            .iter()
            .map(i64::to_string)
            .collect::<Vec<_>>()
            .join(", ");
        println!("  delays_ms:   [{delays}]");
    }
    Ok(())
}
