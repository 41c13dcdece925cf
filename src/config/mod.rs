use crate::adapters::auth::DEFAULT_METADATA_HOST;
use crate::core::query::DEFAULT_TABLE;
use crate::core::redact::RedactionPolicy;
use crate::core::report::OutputFormat;
use crate::utils::error::Result;
use crate::utils::validation::{
    validate_existing_file, validate_non_empty_string, validate_positive_number,
    validate_required_field, validate_url, Validate,
};
use clap::{ArgAction, Parser};
use std::path::PathBuf;

pub const DEFAULT_API_URL: &str = "https://bigquery.googleapis.com";

#[derive(Debug, Clone, Parser)]
#[command(name = "bank-mart-report")]
#[command(about = "Top 5 customers by net balance from the bank mart, with PII masking")]
pub struct Cli {
    /// GCP project that runs the query
    #[arg(long, env = "PROJECT_ID")]
    pub project_id: Option<String>,

    /// Credentials file (authorized_user or service_account JSON)
    #[arg(long, env = "BIGQUERY_KEYFILE")]
    pub keyfile: Option<PathBuf>,

    /// Show full customer names; only the literal value `true` enables it
    #[arg(
        long,
        env = "ALLOW_PII",
        action = ArgAction::Set,
        num_args = 0..=1,
        default_value = "false",
        default_missing_value = "true",
        value_parser = parse_allow_pii
    )]
    pub allow_pii: bool,

    #[arg(long, env = "BIGQUERY_TABLE", default_value = DEFAULT_TABLE)]
    pub table: String,

    #[arg(long, env = "BIGQUERY_API_URL", default_value = DEFAULT_API_URL)]
    pub api_url: String,

    /// Pre-issued OAuth access token; skips the keyfile
    #[arg(long, env = "BIGQUERY_ACCESS_TOKEN", hide_env_values = true)]
    pub access_token: Option<String>,

    /// How long BigQuery may hold each request open while the job runs
    #[arg(long, default_value_t = 10_000)]
    pub timeout_ms: u64,

    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Print the query and exit without connecting
    #[arg(long)]
    pub dry_run: bool,

    /// Emit logs as JSON lines
    #[arg(long)]
    pub log_json: bool,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,
}

fn parse_allow_pii(value: &str) -> std::result::Result<bool, String> {
    Ok(value == "true")
}

/// Everything the BigQuery adapter needs to authenticate and run queries.
#[derive(Debug, Clone, PartialEq)]
pub struct WarehouseSettings {
    pub project_id: String,
    pub keyfile: Option<PathBuf>,
    pub access_token: Option<String>,
    pub api_url: String,
    pub metadata_host: String,
    pub timeout_ms: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub warehouse: WarehouseSettings,
    pub table: String,
    pub policy: RedactionPolicy,
    pub format: OutputFormat,
}

impl Settings {
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        Self::resolve(cli, |name| std::env::var(name).ok())
    }

    /// Fills the legacy variable names in when the primary ones are unset, then validates.
    pub fn resolve<F>(cli: &Cli, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |name: &str| lookup(name).filter(|v| !v.is_empty());

        let project_id = cli
            .project_id
            .clone()
            .or_else(|| non_empty("BIGQUERY_PROJECT_ID"));
        let project_id = validate_required_field("PROJECT_ID", &project_id)?.clone();

        let keyfile = cli
            .keyfile
            .clone()
            .or_else(|| non_empty("GOOGLE_APPLICATION_CREDENTIALS").map(PathBuf::from));

        let settings = Self {
            warehouse: WarehouseSettings {
                project_id,
                keyfile,
                access_token: cli.access_token.clone(),
                api_url: cli.api_url.clone(),
                metadata_host: non_empty("GCE_METADATA_HOST")
                    .unwrap_or_else(|| DEFAULT_METADATA_HOST.to_string()),
                timeout_ms: cli.timeout_ms,
            },
            table: cli.table.clone(),
            policy: RedactionPolicy::from_allow_pii(cli.allow_pii),
            format: cli.format,
        };

        settings.validate()?;
        Ok(settings)
    }
}

impl Validate for Settings {
    fn validate(&self) -> Result<()> {
        validate_non_empty_string("PROJECT_ID", &self.warehouse.project_id)?;

        if let Some(keyfile) = &self.warehouse.keyfile {
            validate_existing_file("BIGQUERY_KEYFILE/GOOGLE_APPLICATION_CREDENTIALS", keyfile)?;
        }

        validate_url("BIGQUERY_API_URL", &self.warehouse.api_url)?;
        validate_non_empty_string("BIGQUERY_TABLE", &self.table)?;
        validate_positive_number("timeout_ms", self.warehouse.timeout_ms, 1)?;
        Ok(())
    }
}
