use kebab::config::{load_config, Config};
use kebab::core::db::{ConnectionDescriptor, QueryOutcome, TypedQueryClient};
use kebab::core::{KebabError, Result};
use serde::Serialize;
use serde_json::{json, Value};
use std::path::PathBuf;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

const USAGE: &str = "Usage: kebab [--config PATH | --dsn DSN] <int|string|row|rows|count|exec> <SQL or table>";

/// Parsed command line.
#[derive(Debug)]
struct Cli {
    config: Option<String>,
    dsn: Option<String>,
    command: String,
    argument: String,
}

fn parse_args(args: &[String]) -> std::result::Result<Cli, String> {
    let mut config = None;
    let mut dsn = None;
    let mut positional = Vec::new();
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--config" => config = Some(iter.next().ok_or("--config needs a path")?.clone()),
            "--dsn" => dsn = Some(iter.next().ok_or("--dsn needs a value")?.clone()),
            "-h" | "--help" => return Err(USAGE.to_string()),
            _ => positional.push(arg.clone()),
        }
    }
    match positional.as_slice() {
        [command, argument] => Ok(Cli {
            config,
            dsn,
            command: command.clone(),
            argument: argument.clone(),
        }),
        _ => Err(USAGE.to_string()),
    }
}

fn resolve_descriptor(cli: &Cli) -> Result<ConnectionDescriptor> {
    if let Some(dsn) = &cli.dsn {
        return ConnectionDescriptor::from_dsn(dsn);
    }
    let path: PathBuf = match &cli.config {
        Some(path) => path.into(),
        None => Config::locate()
            .ok_or_else(|| KebabError::Config("No configuration found; pass --config or --dsn".to_string()))?,
    };
    debug!("Loading configuration from {:?}", path);
    let config = load_config(&path)?;
    info!("Environment: {}", config.environment());
    Ok(config.descriptor())
}

fn outcome_to_json<T: Serialize>(outcome: QueryOutcome<T>) -> Result<Value> {
    Ok(match outcome {
        QueryOutcome::Fetched(value) => serde_json::to_value(value)?,
        QueryOutcome::NotPrepared => Value::Null,
        QueryOutcome::FetchFailed => json!(-1),
    })
}

fn run(client: &mut TypedQueryClient, cli: &Cli) -> Result<Value> {
    let sql = cli.argument.as_str();
    match cli.command.as_str() {
        "int" => Ok(json!(client.get_integer(sql, 0))),
        "string" => Ok(json!(client.get_string(sql, ""))),
        "row" => outcome_to_json(client.get_row_associative(sql)),
        "rows" => outcome_to_json(client.get_array_associative(sql)),
        "count" => Ok(json!(client.get_table_count(sql))),
        "exec" => {
            let affected = client.exec(sql);
            Ok(json!({
                "affected": affected,
                "last_insert_id": client.get_last_insert_id(),
            }))
        }
        other => Err(KebabError::Query(format!("Unknown command '{}'", other))),
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let cli = match parse_args(&args) {
        Ok(cli) => cli,
        Err(message) => {
            eprintln!("{}", message);
            std::process::exit(2);
        }
    };

    let descriptor = match resolve_descriptor(&cli) {
        Ok(descriptor) => descriptor,
        Err(e) => {
            eprintln!("Error!: {}", e);
            std::process::exit(2);
        }
    };

    let mut client = TypedQueryClient::connect_or_exit(&descriptor);
    match run(&mut client, &cli) {
        Ok(value) => println!("{}", value),
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(2);
        }
    }

    if let Some(last_error) = client.get_last_error() {
        eprintln!("last error: {}", last_error);
    }
}
