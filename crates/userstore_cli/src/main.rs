//! Command-line transport for the user record store.
//!
//! # Responsibility
//! - Map subcommands onto `RecordStore`/`UserService` calls.
//! - Own process lifecycle: logging init, connection open, explicit close.
//!
//! # Invariants
//! - Every command prints one JSON document on success.
//! - Any store error exits non-zero after the connection is closed.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::info;
use rusqlite::Connection;
use std::path::PathBuf;
use userstore_core::db::close_db;
use userstore_core::{
    init_logging, Fields, NewUser, RecordStore, SqliteRecordBackend, StoreConfig, UserService,
};

const DEFAULT_DB_FILE: &str = "userstore.db";

/// Flags override the `USERSTORE_DB_PATH`, `USERSTORE_LOG_LEVEL` and
/// `USERSTORE_LOG_DIR` environment variables.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// SQLite database file [default: ./userstore.db]
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Absolute directory for rolling log files; logging is off when omitted
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a user if the username is free
    Create {
        username: String,
        #[arg(long)]
        firstname: Option<String>,
        #[arg(long)]
        lastname: Option<String>,
    },
    /// Show a user by username
    User { username: String },
    /// Store arbitrary fields under a key if the key is free
    Put {
        key: String,
        /// Field as name=value; may be repeated
        #[arg(long = "field", value_parser = parse_field)]
        fields: Vec<(String, String)>,
    },
    /// Show the record stored under a key
    Get { key: String },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = resolve_config(StoreConfig::from_env(), &cli);

    if let Some(log_dir) = &config.log_dir {
        init_logging(&config.log_level, log_dir).context("failed to initialize logging")?;
    }

    let conn = config
        .open_connection()
        .context("failed to open record database")?;
    let outcome = run(&conn, cli.command);
    close_db(conn).context("failed to close record database")?;

    let output = outcome?;
    println!("{output}");
    Ok(())
}

/// Layers non-blank flags over `base`; the database falls back to a file in
/// the working directory so consecutive runs share state.
fn resolve_config(base: StoreConfig, cli: &Cli) -> StoreConfig {
    let non_blank_path = |path: &Option<PathBuf>| {
        path.clone()
            .filter(|path| !path.as_os_str().is_empty())
    };

    let db_path = non_blank_path(&cli.db)
        .or(base.db_path)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DB_FILE));
    let log_level = cli
        .log_level
        .as_deref()
        .map(str::trim)
        .filter(|level| !level.is_empty())
        .map(str::to_string)
        .unwrap_or(base.log_level);

    StoreConfig {
        db_path: Some(db_path),
        log_level,
        log_dir: non_blank_path(&cli.log_dir).or(base.log_dir),
    }
}

fn run(conn: &Connection, command: Commands) -> Result<String> {
    let store = RecordStore::new(SqliteRecordBackend::try_new(conn)?);

    let output = match command {
        Commands::Create {
            username,
            firstname,
            lastname,
        } => {
            let service = UserService::new(store);
            let user = service.create(&NewUser {
                username,
                firstname,
                lastname,
            })?;
            info!("event=cli_create module=cli status=ok");
            serde_json::to_string_pretty(&user)?
        }
        Commands::User { username } => {
            let user = UserService::new(store).get(&username)?;
            serde_json::to_string_pretty(&user)?
        }
        Commands::Put { key, fields } => {
            let fields: Fields = fields.into_iter().collect();
            let record = store.create_if_absent(&key, fields)?;
            info!("event=cli_put module=cli status=ok");
            serde_json::to_string_pretty(&record)?
        }
        Commands::Get { key } => serde_json::to_string_pretty(&store.get(&key)?)?,
    };

    Ok(output)
}

fn parse_field(raw: &str) -> Result<(String, String), String> {
    let (name, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected name=value, got `{raw}`"))?;
    Ok((name.to_string(), value.to_string()))
}

#[cfg(test)]
mod tests {
    use super::{parse_field, resolve_config, run, Cli, Commands, DEFAULT_DB_FILE};
    use clap::{CommandFactory, Parser};
    use std::path::PathBuf;
    use userstore_core::db::open_db_in_memory;
    use userstore_core::StoreConfig;

    #[test]
    fn put_then_get_prints_stored_record() {
        let conn = open_db_in_memory().unwrap();

        let created = run(
            &conn,
            Commands::Put {
                key: "alice".to_string(),
                fields: vec![("firstname".to_string(), "Alice".to_string())],
            },
        )
        .unwrap();
        let fetched = run(
            &conn,
            Commands::Get {
                key: "alice".to_string(),
            },
        )
        .unwrap();

        let expected = serde_json::json!({"key": "alice", "fields": {"firstname": "Alice"}});
        assert_eq!(serde_json::from_str::<serde_json::Value>(&created).unwrap(), expected);
        assert_eq!(serde_json::from_str::<serde_json::Value>(&fetched).unwrap(), expected);
    }

    #[test]
    fn duplicate_create_and_unknown_user_fail() {
        let conn = open_db_in_memory().unwrap();
        let create = || Commands::Create {
            username: "bob".to_string(),
            firstname: Some("Bob".to_string()),
            lastname: None,
        };

        run(&conn, create()).unwrap();
        let err = run(&conn, create()).unwrap_err();
        assert!(err.to_string().contains("user already exists"));

        let err = run(
            &conn,
            Commands::User {
                username: "ghost".to_string(),
            },
        )
        .unwrap_err();
        assert!(err.to_string().contains("user not found"));
    }

    #[test]
    fn flags_override_environment_and_db_defaults_to_file() {
        let base = StoreConfig {
            db_path: Some(PathBuf::from("/srv/env.db")),
            log_level: "warn".to_string(),
            log_dir: Some(PathBuf::from("/var/log/userstore")),
        };

        let cli = Cli::parse_from(["userstore", "--log-level", "error", "get", "k"]);
        let config = resolve_config(base, &cli);
        assert_eq!(config.db_path, Some(PathBuf::from("/srv/env.db")));
        assert_eq!(config.log_level, "error");
        assert_eq!(config.log_dir, Some(PathBuf::from("/var/log/userstore")));

        let cli = Cli::parse_from(["userstore", "--log-level", " ", "get", "k"]);
        let config = resolve_config(StoreConfig::default(), &cli);
        assert_eq!(config.db_path, Some(PathBuf::from(DEFAULT_DB_FILE)));
        assert_eq!(config.log_level, StoreConfig::default().log_level);
    }

    #[test]
    fn parse_field_splits_on_first_equals() {
        assert_eq!(
            parse_field("note=a=b").unwrap(),
            ("note".to_string(), "a=b".to_string())
        );
        assert!(parse_field("novalue").is_err());
    }

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }
}
