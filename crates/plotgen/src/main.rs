//! `plotgen` - generate typed chart bindings from a plot schema.

mod config;

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use config::{ConflictMode, PlotgenConfig};
use plotgen_typegen::{
    Backend, DirSink, Generator, GeneratorOptions, RenderOptions, Schema, Target, backend_names,
    backends, get_backend,
};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "plotgen", version, about = "Generate typed chart bindings from a plot schema")]
struct Cli {
    /// Increase verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Config file (defaults to ./plotgen.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Generate source files for some or all targets
    Generate(GenerateArgs),
    /// List every target of a schema
    List {
        /// plot-schema.json file
        #[arg(short, long)]
        input: Option<PathBuf>,
    },
    /// Print the assembled type graph of one target as JSON
    Ir {
        /// Trace name, `layout`, `config` or `decoder`
        target: String,

        /// plot-schema.json file
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// How to handle conflicting field types
        #[arg(long, value_enum)]
        conflict_policy: Option<ConflictMode>,
    },
    /// List registered backends
    Backends,
}

#[derive(Args)]
struct GenerateArgs {
    /// Trace names, `layout`, `config` or `decoder` (all targets if empty)
    targets: Vec<String>,

    /// plot-schema.json file
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Output directory
    #[arg(short, long)]
    out_dir: Option<PathBuf>,

    /// Output backend
    #[arg(short, long)]
    backend: Option<String>,

    /// How to handle conflicting field types
    #[arg(long, value_enum)]
    conflict_policy: Option<ConflictMode>,
}

/// `plotgen --schema` prints the JSON Schema of the config file.
fn handle_schema_flag() -> Result<bool> {
    if std::env::args().nth(1).as_deref() != Some("--schema") {
        return Ok(false);
    }
    let response = serde_json::json!({
        "config_path": config::CONFIG_FILE,
        "format": "toml",
        "schema": schemars::schema_for!(PlotgenConfig)
    });
    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(true)
}

fn init_tracing(verbose: u8) {
    // Logs go to stderr so `ir` output stays pipeable.
    let filter = match verbose {
        0 => EnvFilter::new("plotgen=info,plotgen_typegen=info"),
        1 => EnvFilter::new("plotgen=debug,plotgen_typegen=debug"),
        _ => EnvFilter::new("plotgen=trace,plotgen_typegen=trace"),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    if handle_schema_flag()? {
        return Ok(());
    }

    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let config = PlotgenConfig::discover(cli.config.as_deref())?;

    match cli.command {
        Command::Generate(args) => run_generate(&config, args),
        Command::List { input } => run_list(&config, input),
        Command::Ir {
            target,
            input,
            conflict_policy,
        } => run_ir(&config, &target, input, conflict_policy),
        Command::Backends => {
            for backend in backends() {
                println!(
                    "{}\t{}\t.{}",
                    backend.name(),
                    backend.language(),
                    backend.extension()
                );
            }
            Ok(())
        }
    }
}

fn load_schema(config: &PlotgenConfig, input: Option<PathBuf>) -> Result<Schema> {
    let Some(path) = input.or_else(|| config.schema.clone()) else {
        bail!("no schema given: pass --input or set `schema` in {}", config::CONFIG_FILE);
    };
    let schema = Schema::from_path(&path)
        .with_context(|| format!("failed to load schema {}", path.display()))?;
    info!(path = %path.display(), traces = schema.traces.len(), "loaded schema");
    Ok(schema)
}

fn resolve_backend(name: &str) -> Result<&'static dyn Backend> {
    get_backend(name).with_context(|| {
        format!(
            "unknown backend `{}` (available: {})",
            name,
            backend_names().join(", ")
        )
    })
}

fn generator_options(config: &PlotgenConfig, policy: Option<ConflictMode>) -> GeneratorOptions {
    GeneratorOptions {
        policy: policy.unwrap_or(config.conflict_policy).into(),
        render: RenderOptions {
            generator: config.generator.clone(),
        },
        ..Default::default()
    }
}

fn run_generate(config: &PlotgenConfig, args: GenerateArgs) -> Result<()> {
    let schema = load_schema(config, args.input)?;
    let backend = resolve_backend(args.backend.as_deref().unwrap_or(&config.backend))?;
    let generator = Generator::new(&schema, backend)
        .with_options(generator_options(config, args.conflict_policy));

    let names = if args.targets.is_empty() {
        &config.targets
    } else {
        &args.targets
    };
    let targets: Vec<Target> = if names.is_empty() {
        generator.targets()
    } else {
        names.iter().map(|name| Target::from_name(name)).collect()
    };

    let out_dir = args.out_dir.unwrap_or_else(|| config.out_dir.clone());
    let sink = DirSink::new(&out_dir);
    let paths = generator
        .create_targets(&sink, Path::new(""), &targets)
        .with_context(|| format!("generation into {} failed", out_dir.display()))?;

    for path in paths {
        eprintln!("Generated {}", out_dir.join(path).display());
    }
    Ok(())
}

fn run_list(config: &PlotgenConfig, input: Option<PathBuf>) -> Result<()> {
    let schema = load_schema(config, input)?;
    let backend = resolve_backend(&config.backend)?;
    for target in Generator::new(&schema, backend).targets() {
        println!("{}", target);
    }
    Ok(())
}

fn run_ir(
    config: &PlotgenConfig,
    target: &str,
    input: Option<PathBuf>,
    policy: Option<ConflictMode>,
) -> Result<()> {
    let schema = load_schema(config, input)?;
    let backend = resolve_backend(&config.backend)?;
    let generator =
        Generator::new(&schema, backend).with_options(generator_options(config, policy));

    let artifact = generator
        .artifact(&Target::from_name(target))
        .with_context(|| format!("failed to build `{}`", target))?;
    println!("{}", serde_json::to_string_pretty(&artifact)?);
    Ok(())
}
