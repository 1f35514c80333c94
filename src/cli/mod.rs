//! CLI module for geoip-rs
//!
//! This module handles command line argument parsing for the `server` and
//! `lookup` subcommands.

pub mod formatter;

use crate::config::{DEFAULT_DATABASE_FILE, Overrides, ServerConfig};
use crate::database::DatabaseManager;
use crate::error::{GeoIpError, Result};
use crate::server;
use crate::utils::path;
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::io::{self, Write};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "geoip-rs")]
#[command(version, about = "IP geolocation lookups against a local MaxMind database")]
#[command(long_about = "geoip-rs answers \"where is this IP located\" from a MaxMind\n\
    GeoIP2/GeoLite2 City database, either once from the command line or as a\n\
    caching HTTP service.\n\n\
    Examples:\n  \
    $ geoip-rs lookup 8.8.8.8 2001:4860:4860::8888\n  \
    $ geoip-rs lookup -o json 1.1.1.1\n  \
    $ geoip-rs server -c /etc/geoip-rs.json -p 9100\n  \
    $ curl localhost:8000/ip/8.8.8.8")]
pub struct Cli {
    /// Show debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run as a caching HTTP server, answering /ip/:ip and /ping
    Server(ServerArgs),
    /// Look up one or more IPs and exit
    Lookup(LookupArgs),
}

/// Options of the `server` subcommand; each overrides the config file when given
#[derive(Args, Debug, Default)]
pub struct ServerArgs {
    /// File containing configuration (JSON, or YAML with a .yaml/.yml extension)
    #[arg(short = 'c', long = "config-file", visible_alias = "config.file", value_name = "FILE")]
    pub config_file: Option<PathBuf>,

    /// IP address to bind to; empty binds all interfaces [default: 127.0.0.1]
    #[arg(short = 'i', long = "ip", visible_alias = "server.ip", value_name = "IP")]
    pub ip: Option<String>,

    /// Port to bind to [default: 8000]
    #[arg(short = 'p', long = "port", visible_alias = "server.port", value_name = "PORT")]
    pub port: Option<u16>,

    /// Path to the MaxMind City database [default: /var/lib/maxminddb/GeoLite2-City.mmdb]
    #[arg(short = 'f', long = "database-file", visible_alias = "database.file", value_name = "FILE")]
    pub database_file: Option<PathBuf>,

    /// Seconds to cache responses before refetching them; 0 disables caching [default: 3600]
    #[arg(short = 't', long = "cache-ttl", visible_alias = "cache.ttl", value_name = "SECONDS")]
    pub cache_ttl: Option<f64>,

    /// Number of worker threads handling requests [default: number of cores]
    #[arg(short = 'T', long = "worker-threads", visible_alias = "worker.threads", value_name = "N")]
    pub worker_threads: Option<usize>,
}

#[derive(Args, Debug)]
pub struct LookupArgs {
    /// Path to the MaxMind City database
    #[arg(short = 'f', long = "database-file", visible_alias = "database.file", value_name = "FILE", default_value = DEFAULT_DATABASE_FILE)]
    pub database_file: PathBuf,

    /// Output format
    #[arg(short = 'o', long = "output-type", visible_alias = "output.type", value_enum, default_value_t = OutputType::Table)]
    pub output_type: OutputType,

    /// IP addresses to look up
    #[arg(value_name = "IP", required = true)]
    pub ips: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputType {
    Json,
    Table,
}

impl ServerArgs {
    pub fn overrides(&self) -> Overrides {
        Overrides {
            ip: self.ip.clone(),
            port: self.port,
            database_file: self.database_file.clone(),
            worker_threads: self.worker_threads,
            cache_ttl: self.cache_ttl,
        }
    }

    /// Resolve the final server configuration: defaults, config file, then flags
    pub fn resolve_config(&self) -> Result<ServerConfig> {
        let mut config = ServerConfig::load(self.config_file.as_deref())?;
        config.apply_overrides(&self.overrides());
        config.validate()?;
        Ok(config)
    }
}

impl Cli {
    pub fn run(self) -> Result<()> {
        match self.command {
            Command::Server(args) => run_server(&args),
            Command::Lookup(args) => run_lookup(&args),
        }
    }
}

/// Start the HTTP service on a runtime sized by `worker_threads`
fn run_server(args: &ServerArgs) -> Result<()> {
    let config = args.resolve_config()?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(config.worker_threads)
        .enable_all()
        .build()
        .map_err(|e| GeoIpError::startup(format!("Failed to start runtime: {}", e)))?;

    runtime.block_on(server::serve(&config))
}

/// Look up every IP on the command line and print the records
fn run_lookup(args: &LookupArgs) -> Result<()> {
    let database_file = path::real_path(&args.database_file)?;
    let manager = DatabaseManager::new(database_file);
    manager.handle()?;

    let use_color = atty::is(atty::Stream::Stdout);
    let stdout = io::stdout();
    let result = lookup_all(&manager, &args.ips, args.output_type, use_color, &mut stdout.lock());

    manager.close();
    result
}

/// Write one record per IP to `out`
///
/// An address the database knows nothing about is not a failure: the table
/// prints a notice and JSON an empty record. Any other error is logged, the
/// remaining IPs are still printed and the first error is returned.
pub fn lookup_all<W: Write>(
    manager: &DatabaseManager,
    ips: &[String],
    output_type: OutputType,
    use_color: bool,
    out: &mut W,
) -> Result<()> {
    let mut failed = None;

    for ip in ips {
        let record = match manager.lookup(ip) {
            Ok(record) => Some(record),
            Err(GeoIpError::NotFound(reason)) => {
                log::debug!("{}: {}", ip, reason);
                None
            }
            Err(e) => {
                log::error!("{}: {}", ip, e);
                failed.get_or_insert(e);
                continue;
            }
        };

        match output_type {
            OutputType::Json => {
                let record = record.unwrap_or_default();
                writeln!(out, "{}", formatter::format_json(&record)?)?;
            }
            OutputType::Table => write!(out, "{}", formatter::format_table(ip, record.as_ref(), use_color))?,
        }
    }

    out.flush()?;

    match failed {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
