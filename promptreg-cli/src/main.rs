mod config;

use crate::config::prompts_dir;
use anyhow::{anyhow, Context};
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use promptreg_core::prompt::CompiledPrompt;
use promptreg_core::registry::Registry;
use serde_json::{Map, Value};
use std::io;
use std::path::PathBuf;
use tracing::{debug, Level};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(version,
display_name = "promptreg",
bin_name = "promptreg",
about="A versioned prompt registry",
long_about="Loads versioned system/user prompt templates from a directory and renders them with data", )]
struct Args {
    #[arg(short = 'p', long)]
    prompts_dir: Option<PathBuf>,

    #[arg(short = 'v', long)]
    verbose: bool,

    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand, Debug, Clone)]
enum Commands {
    /// Validate every prompt file
    Check,
    /// List ids and their versions, the default marked with `*`
    List,
    /// Show one prompt without rendering it
    Show {
        #[arg(short = 'i', long)]
        id: String,
        #[arg(long)]
        version: Option<String>,
    },
    /// Render one prompt with data
    Render {
        #[arg(short = 'i', long)]
        id: String,
        #[arg(long)]
        version: Option<String>,
        /// JSON object with the render data
        #[arg(short = 'd', long)]
        data: Option<String>,
        /// `key=value` pairs, applied over `--data`
        #[arg(short = 'a', long = "var")]
        vars: Vec<String>,
        /// Copy the rendered user prompt to the clipboard
        #[arg(short = 'c', long)]
        copy: bool,
    },
    /// Print shell completions
    Completions {
        shell: Shell,
    },
}

/// An error together with the process exit code it maps to.
struct Failure {
    code: exitcode::ExitCode,
    error: anyhow::Error,
}

trait ExitWith<T> {
    fn exit_with(self, code: exitcode::ExitCode) -> Result<T, Failure>;
}

impl<T, E: Into<anyhow::Error>> ExitWith<T> for Result<T, E> {
    fn exit_with(self, code: exitcode::ExitCode) -> Result<T, Failure> {
        self.map_err(|e| Failure { code, error: e.into() })
    }
}

fn main() {
    let args = Args::parse();
    init_tracing(args.verbose);

    if let Err(failure) = run(args) {
        eprintln!("Error: {:#}", failure.error);
        std::process::exit(failure.code);
    }
}

fn init_tracing(verbose: bool) {
    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();

    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_target(false)
        .with_env_filter(log_filter(verbose, rust_log.as_deref()))
        .init();
}

/// `RUST_LOG` directives when present, else `debug` with `--verbose` and `warn` without.
fn log_filter(verbose: bool, directives: Option<&str>) -> EnvFilter {
    let level = if verbose { Level::DEBUG } else { Level::WARN };

    EnvFilter::builder()
        .with_default_directive(level.into())
        .parse_lossy(directives.unwrap_or_default())
}

fn run(args: Args) -> Result<(), Failure> {
    match args.cmd {
        Commands::Completions { shell } => {
            clap_complete::generate(shell, &mut Args::command(), "promptreg", &mut io::stdout());
        }
        Commands::Check => {
            let registry = load_registry(args.prompts_dir)?;
            println!("{} prompts across {} ids are valid", registry.len(), registry.ids().len());
        }
        Commands::List => list(&load_registry(args.prompts_dir)?),
        Commands::Show { id, version } => {
            let registry = load_registry(args.prompts_dir)?;
            let prompt = registry.resolve(&id, version.as_deref()).exit_with(exitcode::DATAERR)?;
            show(prompt);
        }
        Commands::Render { id, version, data, vars, copy } => {
            let data = render_data(data.as_deref(), &vars).exit_with(exitcode::USAGE)?;
            let registry = load_registry(args.prompts_dir)?;
            let prompt = registry.resolve(&id, version.as_deref()).exit_with(exitcode::DATAERR)?;
            let rendered = prompt.render(&data).exit_with(exitcode::DATAERR)?;

            println!("{}\n\n{}", rendered.system_prompt, rendered.user_prompt);

            if copy {
                copy_to_clipboard(&rendered.user_prompt).exit_with(exitcode::UNAVAILABLE)?;
            }
        }
    }

    Ok(())
}

fn load_registry(cli_override: Option<PathBuf>) -> Result<Registry, Failure> {
    let dir = prompts_dir(cli_override).exit_with(exitcode::CONFIG)?;
    debug!(path = %dir.display(), "loading prompts");
    Registry::from_dir(&dir)
        .with_context(|| format!("Failed to load prompts from {}", dir.display()))
        .exit_with(exitcode::CONFIG)
}

fn list(registry: &Registry) {
    for id in registry.ids() {
        let default = registry.get(id).map(|p| p.version()).unwrap_or_default();
        let versions: Vec<String> = registry
            .versions(id)
            .unwrap_or_default()
            .into_iter()
            .map(|v| if v == default { format!("{}*", v) } else { v.to_string() })
            .collect();
        println!("{}: {}", id, versions.join(", "));
    }
}

fn show(prompt: &CompiledPrompt) {
    println!("id: {}", prompt.id());
    println!("version: {}", prompt.version());
    println!("default: {}", prompt.is_default());
    println!("description: {}", prompt.description());
    let fields: Vec<String> = prompt.fields().iter().map(|f| f.to_string()).collect();
    println!("fields: {}", fields.join(", "));
    println!("\n[system]\n{}", prompt.system_prompt());
    println!("\n[user]\n{}", prompt.user_prompt());
}

/// Builds the render data from an optional JSON object and `key=value` overrides.
fn render_data(data: Option<&str>, vars: &[String]) -> anyhow::Result<Value> {
    let mut object = match data {
        Some(json) => match serde_json::from_str::<Value>(json).context("--data is not valid JSON")? {
            Value::Object(object) => object,
            _ => return Err(anyhow!("--data must be a JSON object")),
        },
        None => Map::new(),
    };

    for var in vars {
        let (key, value) = var
            .split_once('=')
            .ok_or_else(|| anyhow!("--var must look like key=value, got `{}`", var))?;
        object.insert(key.to_string(), Value::String(value.to_string()));
    }

    Ok(Value::Object(object))
}

fn copy_to_clipboard(text: &str) -> anyhow::Result<()> {
    let mut clipboard = arboard::Clipboard::new().context("Clipboard unavailable")?;
    clipboard.set_text(text).context("Failed to copy to clipboard")?;
    Ok(())
}
