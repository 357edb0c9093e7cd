use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug)]
#[command(
    name = "sower",
    about = "Sow referentially-consistent synthetic rows into relational databases",
    version,
    after_help = "Examples:\n  sower init --db postgres://localhost/myapp\n  sower build                              # merge newly created tables into sower.toml\n  sower seed                               # uses sower.toml and .env\n  sower seed --db sqlite://dev.db --table-rows users=50,orders=200\n  sower order --db mysql://localhost/myapp"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Inspect a database and write a starter sower.toml
    Init(InitArgs),

    /// Re-inspect the database and merge new tables into sower.toml
    Build(BuildArgs),

    /// Insert synthetic rows per the configured row counts
    Seed(SeedArgs),

    /// Show the dependency-resolved insertion order
    Order(OrderArgs),
}

#[derive(Parser, Debug)]
pub struct InitArgs {
    /// Database connection URL (postgres://, mysql://, sqlite://)
    /// Falls back to DATABASE_URL env var or .env file
    #[arg(long, env = "DATABASE_URL")]
    pub db: Option<String>,

    /// Output file path
    #[arg(short, long, default_value = "sower.toml")]
    pub output: PathBuf,

    /// Default number of rows per table
    #[arg(short, long, default_value = "10")]
    pub rows: i64,

    /// Overwrite an existing config file
    #[arg(long)]
    pub force: bool,
}

#[derive(Parser, Debug)]
pub struct BuildArgs {
    /// Database connection URL
    /// Falls back to DATABASE_URL, then the sower.toml [database] section
    #[arg(long, env = "DATABASE_URL")]
    pub db: Option<String>,

    /// Path to the configuration file
    #[arg(long, default_value = "sower.toml")]
    pub config: PathBuf,

    /// Row count for newly discovered tables
    #[arg(short, long)]
    pub rows: Option<i64>,
}

#[derive(Parser, Debug)]
pub struct SeedArgs {
    /// Database connection URL
    /// Falls back to DATABASE_URL, then the sower.toml [database] section
    #[arg(long, env = "DATABASE_URL")]
    pub db: Option<String>,

    /// Path to the configuration file
    #[arg(long, default_value = "sower.toml")]
    pub config: PathBuf,

    /// Per-table row count overrides (e.g., users=500,orders=2000)
    #[arg(long, value_delimiter = ',')]
    pub table_rows: Vec<String>,

    /// Random seed for reproducible runs
    #[arg(long)]
    pub seed: Option<u64>,
}

#[derive(Parser, Debug)]
pub struct OrderArgs {
    /// Database connection URL
    #[arg(long, env = "DATABASE_URL")]
    pub db: Option<String>,

    /// Output format
    #[arg(long, value_enum, default_value = "text")]
    pub format: OrderFormat,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum OrderFormat {
    Text,
    Json,
}

impl SeedArgs {
    /// Parse overrides like "users=500,orders=2000". Malformed entries are
    /// rejected rather than silently dropped.
    pub fn parse_table_rows(&self) -> anyhow::Result<Vec<(String, i64)>> {
        self.table_rows
            .iter()
            .map(|entry| {
                entry
                    .split_once('=')
                    .and_then(|(table, count)| {
                        count.parse::<i64>().ok().map(|n| (table.to_string(), n))
                    })
                    .ok_or_else(|| {
                        anyhow::anyhow!(
                            "invalid --table-rows entry '{}', expected table=count",
                            entry
                        )
                    })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_table_rows() {
        let args = SeedArgs {
            db: None,
            config: PathBuf::from("sower.toml"),
            table_rows: vec!["users=500".to_string(), "orders=2000".to_string()],
            seed: None,
        };
        let parsed = args.parse_table_rows().unwrap();
        assert_eq!(parsed[0], ("users".to_string(), 500));
        assert_eq!(parsed[1], ("orders".to_string(), 2000));
    }

    #[test]
    fn test_parse_table_rows_rejects_malformed() {
        let args = SeedArgs {
            db: None,
            config: PathBuf::from("sower.toml"),
            table_rows: vec!["users".to_string()],
            seed: None,
        };
        assert!(args.parse_table_rows().is_err());
    }
}
