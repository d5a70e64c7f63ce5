//! Subcommand handlers

use clap::Args;
use snapmig_core::config::SnapConfig;
use snapmig_core::errors::Result;
use snapmig_core::freshness;
use snapmig_core::{
    ConnectionParameters, ConnectionResolver, Freshness, MigrationCommands, MigrationSource,
    ShellCommands, SnapMigrations,
};
use snapmig_store::{SqlMigrator, SqliteConnector};
use std::path::Path;

const DEFAULT_CONFIG: &str = "snapmig.toml";

#[derive(Debug, Args)]
pub struct PrepareArgs {
    /// Run the seeders before snapshotting
    #[arg(long)]
    pub seed: bool,
}

/// Explicit path must exist; the default path is optional
pub fn load_config(path: Option<&Path>) -> Result<SnapConfig> {
    let config = match path {
        Some(path) => SnapConfig::from_file(path)?,
        None if Path::new(DEFAULT_CONFIG).exists() => SnapConfig::from_file(DEFAULT_CONFIG)?,
        None => SnapConfig::default(),
    };
    Ok(config.with_env())
}

/// Configured shell commands, or the built-in SQL migrator
enum Runner {
    Shell(ShellCommands),
    Sql(SqlMigrator),
}

impl MigrationCommands for Runner {
    fn migrate_fresh(&mut self, params: &ConnectionParameters) -> Result<()> {
        match self {
            Runner::Shell(shell) => shell.migrate_fresh(params),
            Runner::Sql(sql) => sql.migrate_fresh(params),
        }
    }

    fn seed(&mut self, params: &ConnectionParameters) -> Result<()> {
        match self {
            Runner::Shell(shell) => shell.seed(params),
            Runner::Sql(sql) => sql.seed(params),
        }
    }
}

fn build(config: SnapConfig) -> SnapMigrations<SqliteConnector, Runner> {
    let runner = match &config.commands {
        Some(commands) => Runner::Shell(ShellCommands::from_settings(commands)),
        None => Runner::Sql(
            SqlMigrator::new(&config.migrations.dir, &config.migrations.seeds_dir)
                .with_extension(&config.migrations.extension),
        ),
    };
    SnapMigrations::new(config, SqliteConnector, runner)
}

pub fn status(config: SnapConfig) -> Result<()> {
    let source = MigrationSource::from_settings(&config.migrations);
    match freshness::check(&config.snapshot_location(), &source) {
        Freshness::Fresh => println!("fresh"),
        Freshness::Missing => println!("missing"),
        Freshness::Stale { newer } => println!("stale ({})", newer.display()),
    }
    Ok(())
}

pub fn prepare(config: SnapConfig, args: PrepareArgs) -> Result<()> {
    let mut snap = build(config);
    let path = snap.prepare_database(args.seed)?;
    println!("{}", path.as_str());
    Ok(())
}

pub fn resolve(config: SnapConfig) -> Result<()> {
    let params = ConnectionResolver::new().resolve(&config.database);
    let show = |v: Option<String>| v.unwrap_or_else(|| "<unset>".to_string());
    println!("host: {}", show(params.host));
    println!("username: {}", show(params.username));
    println!("password: {}", show(params.password.map(|p| p.to_string())));
    println!("database: {}", show(params.database));
    Ok(())
}
