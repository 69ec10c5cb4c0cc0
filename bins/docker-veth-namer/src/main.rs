//! docker-veth-namer - rename host-side veth links of Docker containers.

use anyhow::Context;
use clap::{Parser, Subcommand};
use veth_namer::config::DEFAULT_CONFIG_PATH;
use veth_namer::netlink::Connection;
use veth_namer::{Config, DockerClient, LinkNamer, Reconciler, ReexecEnumerator, reexec};

#[derive(Parser)]
#[command(
    name = "docker-veth-namer",
    version,
    about = "Tool for automatic renaming of Docker-created veth links"
)]
struct Cli {
    /// Use verbose logging.
    #[arg(long, visible_alias = "vv", global = true)]
    verbose: bool,

    /// Display the expected link name changes, but do not rename.
    #[arg(short = 'n', long, global = true)]
    dry_run: bool,

    /// Configuration file; an empty value uses the defaults.
    #[arg(short, long, global = true, default_value = DEFAULT_CONFIG_PATH)]
    config: String,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Clone, Copy, PartialEq, Eq)]
enum Command {
    /// Print program version.
    Version,

    /// Update veth links of the running containers and exit.
    Oneshot,

    /// Update veth links of the running containers, then follow Docker
    /// network events (default).
    Listen,
}

fn init_tracing(level: tracing::Level) {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()),
        )
        .init();
}

fn main() -> anyhow::Result<()> {
    // Re-executed helper: no CLI, no config, stdout carries the answer.
    if reexec::requested() {
        init_tracing(tracing::Level::WARN);
        std::process::exit(reexec::run_child());
    }

    let cli = Cli::parse();

    init_tracing(if cli.verbose {
        tracing::Level::TRACE
    } else {
        tracing::Level::INFO
    });

    let command = cli.command.unwrap_or(Command::Listen);
    if command == Command::Version {
        println!("{}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    let config = Config::load(&cli.config)
        .with_context(|| format!("loading configuration from {:?}", cli.config))?;
    tracing::debug!("configuration: {:?}", config);

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    runtime.block_on(async move {
        let docker = DockerClient::connect_from_env()
            .await
            .context("connecting to docker")?;
        let links = Connection::new().context("opening netlink socket")?;

        let reconciler = Reconciler::new(
            docker,
            ReexecEnumerator::new(),
            links,
            LinkNamer::new(config),
            cli.dry_run,
        );

        if command == Command::Oneshot {
            reconciler.sweep().await;
            return Ok(());
        }

        // Only returns once the event stream is gone; exiting lets the
        // service manager restart us.
        reconciler
            .listen()
            .await
            .context("listening to docker events")
    })
}
