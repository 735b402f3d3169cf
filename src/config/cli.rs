use crate::config::toml_config::TomlConfig;
use crate::config::{JobKind, Settings};
use crate::utils::error::Result;
use clap::{Parser, Subcommand};

#[derive(Clone, Parser)]
#[command(name = "confluence-snapshot", version)]
#[command(about = "Export Confluence Cloud activity, spaces, permissions and watchers as JSON snapshots")]
pub struct CliConfig {
    /// Optional TOML configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Wiki base URL, e.g. https://example.atlassian.net/wiki
    #[arg(long, env = "CONFLUENCE_BASE_URL", global = true)]
    pub base_url: Option<String>,

    /// GraphQL endpoint (defaults to <site>/cgraphql)
    #[arg(long, env = "CONFLUENCE_GRAPHQL_URL", global = true)]
    pub graphql_url: Option<String>,

    #[arg(long, env = "CONFLUENCE_USERNAME", global = true)]
    pub username: Option<String>,

    #[arg(long, env = "CONFLUENCE_API_TOKEN", hide_env_values = true, global = true)]
    pub api_token: Option<String>,

    #[arg(long, env = "ATLASSIAN_ADMIN_URL", global = true)]
    pub admin_url: Option<String>,

    #[arg(long, env = "ATLASSIAN_ADMIN_TOKEN", hide_env_values = true, global = true)]
    pub admin_token: Option<String>,

    #[arg(long, env = "ATLASSIAN_ORG_ID", global = true)]
    pub org_id: Option<String>,

    /// Directory the snapshot is written to
    #[arg(long, global = true)]
    pub output_path: Option<String>,

    /// Items requested per page
    #[arg(long, global = true)]
    pub page_limit: Option<usize>,

    #[arg(long, global = true)]
    pub timeout_seconds: Option<u64>,

    #[arg(short, long, global = true, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, global = true, help = "Emit logs as JSON lines")]
    pub json_logs: bool,

    #[command(subcommand)]
    pub job: JobCommand,
}

#[derive(Debug, Clone, Subcommand)]
pub enum JobCommand {
    /// Managed accounts: active users, Confluence users and recent activity by email domain
    UserUsage,
    /// Inventory of every visible space
    Spaces,
    /// Space permissions and page restrictions
    Permissions {
        /// Space names to skip (repeatable); replaces the configured list
        #[arg(long = "exclude-space")]
        exclude_spaces: Vec<String>,

        /// Audit personal spaces too
        #[arg(long)]
        include_personal: bool,
    },
    /// Space and page watchers
    Watchers,
    /// Remove every page restriction in one space
    RemoveRestrictions {
        #[arg(long)]
        space_key: String,

        /// List the pages that would be cleared without deleting anything
        #[arg(long)]
        dry_run: bool,
    },
}

impl JobCommand {
    pub fn kind(&self) -> JobKind {
        match self {
            JobCommand::UserUsage => JobKind::UserUsage,
            JobCommand::Spaces => JobKind::Spaces,
            JobCommand::Permissions { .. } => JobKind::Permissions,
            JobCommand::Watchers => JobKind::Watchers,
            JobCommand::RemoveRestrictions { .. } => JobKind::RemoveRestrictions,
        }
    }
}

impl CliConfig {
    /// CLI / 環境變數 > TOML 檔 > 預設值
    pub fn resolve_settings(&self) -> Result<Settings> {
        let mut settings = match &self.config {
            Some(path) => {
                tracing::info!("📁 Loading configuration from: {}", path);
                Settings::from_toml(&TomlConfig::from_file(path)?)
            }
            None => Settings::default(),
        };

        override_opt(&mut settings.base_url, &self.base_url);
        override_opt(&mut settings.graphql_url, &self.graphql_url);
        override_opt(&mut settings.username, &self.username);
        override_opt(&mut settings.api_token, &self.api_token);
        override_opt(&mut settings.admin_token, &self.admin_token);
        override_opt(&mut settings.org_id, &self.org_id);

        if let Some(admin_url) = &self.admin_url {
            settings.admin_url = admin_url.clone();
        }
        if let Some(output_path) = &self.output_path {
            settings.output_path = output_path.clone();
        }
        if let Some(page_limit) = self.page_limit {
            settings.page_limit = page_limit;
        }
        if let Some(timeout_seconds) = self.timeout_seconds {
            settings.timeout_seconds = timeout_seconds;
        }

        if let JobCommand::Permissions {
            exclude_spaces,
            include_personal,
        } = &self.job
        {
            if !exclude_spaces.is_empty() {
                settings.excluded_space_names = exclude_spaces.clone();
            }
            if *include_personal {
                settings.include_personal_spaces = true;
            }
        }

        Ok(settings)
    }
}

fn override_opt(target: &mut Option<String>, value: &Option<String>) {
    if let Some(value) = value {
        *target = Some(value.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_flags_override_config_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file
            .write_all(
                br#"
[site]
base_url = "https://file.atlassian.net/wiki"

[fetch]
page_limit = 25
"#,
            )
            .unwrap();
        let config_path = temp_file.path().to_str().unwrap().to_string();

        let cli = CliConfig::try_parse_from([
            "confluence-snapshot",
            "--config",
            &config_path,
            "--base-url",
            "https://flag.atlassian.net/wiki",
            "permissions",
            "--exclude-space",
            "Sandbox",
            "--include-personal",
        ])
        .unwrap();
        let settings = cli.resolve_settings().unwrap();

        assert_eq!(
            settings.base_url.as_deref(),
            Some("https://flag.atlassian.net/wiki")
        );
        assert_eq!(settings.page_limit, 25);
        assert_eq!(settings.excluded_space_names, vec!["Sandbox"]);
        assert!(settings.include_personal_spaces);
        assert_eq!(cli.job.kind(), JobKind::Permissions);
    }

    #[test]
    fn test_remove_restrictions_requires_space_key() {
        assert!(CliConfig::try_parse_from(["confluence-snapshot", "remove-restrictions"]).is_err());

        let cli = CliConfig::try_parse_from([
            "confluence-snapshot",
            "remove-restrictions",
            "--space-key",
            "ENG",
            "--dry-run",
        ])
        .unwrap();
        match cli.job {
            JobCommand::RemoveRestrictions { space_key, dry_run } => {
                assert_eq!(space_key, "ENG");
                assert!(dry_run);
            }
            other => panic!("unexpected job: {other:?}"),
        }
    }
}
