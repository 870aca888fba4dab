//! linekv server entry point.
//!
//! Parses the command line, sets up logging and serves until Ctrl+C.

use linekv::{Server, DEFAULT_HOST, DEFAULT_PORT};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Server configuration
#[derive(Debug, Clone, PartialEq, Eq)]
struct Config {
    /// Host to bind to
    host: String,
    /// Port to listen on
    port: u16,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
        }
    }
}

/// What the command line asked for.
#[derive(Debug, PartialEq, Eq)]
enum Invocation {
    Serve(Config),
    Help,
    Version,
}

impl Config {
    /// Parse configuration from command-line arguments
    fn from_args<I>(args: I) -> anyhow::Result<Invocation>
    where
        I: IntoIterator<Item = String>,
    {
        let mut config = Config::default();
        let mut args = args.into_iter();

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--host" | "-h" => {
                    config.host = args
                        .next()
                        .ok_or_else(|| anyhow::anyhow!("--host requires a value"))?;
                }
                "--port" | "-p" => {
                    let raw = args
                        .next()
                        .ok_or_else(|| anyhow::anyhow!("--port requires a value"))?;
                    config.port = raw
                        .parse()
                        .map_err(|_| anyhow::anyhow!("invalid port number: {raw}"))?;
                }
                "--help" => return Ok(Invocation::Help),
                "--version" | "-v" => return Ok(Invocation::Version),
                other => anyhow::bail!("unknown argument: {other}"),
            }
        }

        Ok(Invocation::Serve(config))
    }

    /// Returns the bind address as a string
    fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn print_help() {
    println!(
        r#"
linekv - An In-Memory Key-Value Store over a Line Protocol

USAGE:
    linekv [OPTIONS]

OPTIONS:
    -h, --host <HOST>    Host to bind to (default: {DEFAULT_HOST})
    -p, --port <PORT>    Port to listen on (default: {DEFAULT_PORT})
    -v, --version        Print version information
        --help           Print this help message

ENVIRONMENT:
    RUST_LOG             Log filter (default: info)

CONNECTING:
    Any line-oriented TCP client works:
    $ nc 127.0.0.1 {DEFAULT_PORT}
    PUT;name;"Ariz"
    true;Key [name] set to value [Ariz]
    GET;name
    true;Ariz
"#
    );
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = match Config::from_args(std::env::args().skip(1)) {
        Ok(Invocation::Serve(config)) => config,
        Ok(Invocation::Help) => {
            print_help();
            return Ok(());
        }
        Ok(Invocation::Version) => {
            println!("linekv version {}", linekv::VERSION);
            return Ok(());
        }
        Err(e) => {
            eprintln!("Error: {e}");
            print_help();
            std::process::exit(1);
        }
    };

    // Set up logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    info!(version = linekv::VERSION, "Starting linekv");

    let server = Server::bind(&config.bind_address()).await?;
    server.run_until_ctrl_c().await?;

    info!("Server shutdown complete");
    Ok(())
}
