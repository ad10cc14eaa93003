//! lazycommit -- AI-assisted git commit messages and PR titles.
//!
//! Entry point: parses the subcommand, initializes logging, loads
//! configuration and dispatches to the command implementations.

use tracing_subscriber::EnvFilter;

use lazycommit::commands;
use lazycommit::config::{self, Config, CONFIG_FILE_NAME};

// ---------------------------------------------------------------------------
// CLI argument parsing (minimal, no clap dependency)
// ---------------------------------------------------------------------------

enum CliCommand {
    Commit,
    Pr { target_branch: String },
    ConfigGet,
    ConfigSet { key: String, value: String },
}

fn parse_args() -> CliCommand {
    let args: Vec<String> = std::env::args().skip(1).collect();

    match args.first().map(String::as_str) {
        Some("commit") => CliCommand::Commit,
        Some("pr") => match args.len() {
            1 => usage_error("missing required argument: <target-branch>"),
            2 => CliCommand::Pr {
                target_branch: args[1].clone(),
            },
            n => usage_error(&format!("too many arguments, expected 1 but got {}", n - 1)),
        },
        Some("config") => match args.get(1).map(String::as_str) {
            Some("get") => CliCommand::ConfigGet,
            Some("set") => match (args.get(2), args.get(3)) {
                (Some(key), Some(value)) => CliCommand::ConfigSet {
                    key: key.clone(),
                    value: value.clone(),
                },
                _ => usage_error("usage: lazycommit config set <key> <value>"),
            },
            _ => usage_error("usage: lazycommit config <get|set>"),
        },
        Some("--help") | Some("-h") | None => {
            print_usage();
            std::process::exit(0);
        }
        Some("--version") | Some("-V") => {
            println!("lazycommit {}", env!("CARGO_PKG_VERSION"));
            std::process::exit(0);
        }
        Some(other) => {
            eprintln!("Unknown command: {other}");
            eprintln!("Run with --help for usage information.");
            std::process::exit(1);
        }
    }
}

fn usage_error(message: &str) -> ! {
    eprintln!("Error: {message}");
    eprintln!("Run with --help for usage information.");
    std::process::exit(1);
}

fn print_usage() {
    println!(
        "\
lazycommit {version} -- AI-assisted git commit messages and PR titles

USAGE:
    lazycommit <COMMAND>

COMMANDS:
    commit                    Generate commit message suggestions for staged changes
    pr <target-branch>        Generate PR title suggestions against a target branch
    config get                Print the active provider, model and endpoint
    config set <key> <value>  Update configuration (keys: provider, model,
                              api-key, endpoint, num-suggestions, language)

OPTIONS:
    -h, --help                Print this help message
    -V, --version             Print version information

ENVIRONMENT:
    RUST_LOG                  Override log level (e.g. RUST_LOG=debug)
    GITHUB_TOKEN              Fallback GitHub credential for the Copilot provider
",
        version = env!("CARGO_PKG_VERSION")
    );
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> anyhow::Result<()> {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .expect("Failed to build Tokio runtime")
        .block_on(async_main())
}

async fn async_main() -> anyhow::Result<()> {
    init_tracing();

    let command = parse_args();

    let config_path = config::config_dir().join(CONFIG_FILE_NAME);
    let mut cfg = Config::load_or_init(&config_path).await?;
    tracing::debug!(path = %config_path.display(), provider = cfg.provider_name(), "config loaded");

    match command {
        CliCommand::Commit => commands::commit::run(&cfg).await,
        CliCommand::Pr { target_branch } => commands::pr::run(&cfg, &target_branch).await,
        CliCommand::ConfigGet => commands::config::get(&cfg),
        CliCommand::ConfigSet { key, value } => commands::config::set(&mut cfg, &key, &value),
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
