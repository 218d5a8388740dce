use anyhow::{Context, anyhow};
use serde::Deserialize;
use std::path::{Path, PathBuf};

mod authorize_config;
mod guard_config;
mod logs_config;
mod server_config;
mod storage_config;

pub use authorize_config::AuthorizeConfig;
pub use guard_config::GuardConfig;
pub use logs_config::LogsConfig;
pub use server_config::ServerConfig;
pub use storage_config::StorageConfig;

#[derive(Deserialize, Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    #[serde(default)]
    pub logs: LogsConfig,
    pub authorize: AuthorizeConfig,
    #[serde(default)]
    pub guard: GuardConfig,
}

impl std::str::FromStr for Config {
    type Err = anyhow::Error;
    fn from_str(content: &str) -> Result<Self, Self::Err> {
        toml::from_str(content).with_context(|| {
            "Error: Failed to parse configuration file.\n\
        Please check the file syntax is valid TOML syntax"
        })
    }
}

/// Base for relative paths in the configuration.
pub(crate) fn root_dir() -> PathBuf {
    std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
}

/// Picks the value of `-c <file>` / `--config <file>` out of `args`.
pub fn parse_config_path<I>(args: I) -> anyhow::Result<PathBuf>
where
    I: IntoIterator<Item = String>,
{
    let mut args = args.into_iter();
    while let Some(arg) = args.next() {
        if arg == "-c" || arg == "--config" {
            return args
                .next()
                .map(PathBuf::from)
                .ok_or_else(|| anyhow!("Error: Please specify path string for -c argument."));
        }
    }
    Err(anyhow!(
        "Error: Please specify configuration file argument. Usage: -c <config_file>"
    ))
}

pub fn load(path: &Path) -> anyhow::Result<Config> {
    if !path.is_file() {
        return Err(anyhow!(
            "Error: Configuration file not found or invalid.\n\
        Please make sure that the configuration file exists and is a valid TOML file.\n\
        Expected file path: {:?}",
            path
        ));
    }
    let content = std::fs::read_to_string(path).with_context(|| {
        "Error: Failed to read configuration file.\n\
        Please check the file path and file permissions, and make sure the file is valid accessible"
    })?;
    content.parse()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing::Level;

    const MINIMAL: &str = r#"
        [server]
        host = "127.0.0.1"
        port = 8080

        [storage]
        storage_path = "data/doorstep.db"

        [authorize]
        secret = "s3cret"
    "#;

    #[test]
    fn optional_sections_fall_back_to_defaults() {
        let config: Config = MINIMAL.parse().unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.logs.level, Level::INFO);
        assert_eq!(config.guard.login_path, "/login");
        assert_eq!(config.authorize.issuer, "doorstep");
        assert!(
            config
                .storage
                .database_location()
                .ends_with("doorstep.db")
        );
    }

    #[test]
    fn log_level_is_case_insensitive() {
        let content = format!("{MINIMAL}\n[logs]\nlevel = \"DEBUG\"\n");
        let config: Config = content.parse().unwrap();
        assert_eq!(config.logs.level, Level::DEBUG);

        let content = format!("{MINIMAL}\n[logs]\nlevel = \"loud\"\n");
        assert!(content.parse::<Config>().is_err());
    }

    #[test]
    fn in_memory_storage_is_kept_verbatim() {
        let content = MINIMAL.replace("data/doorstep.db", ":memory:");
        let config: Config = content.parse().unwrap();
        assert_eq!(config.storage.database_location(), ":memory:");
    }

    #[test]
    fn config_path_comes_from_either_flag() {
        let args = |list: &[&str]| list.iter().map(|it| it.to_string()).collect::<Vec<_>>();
        assert_eq!(
            parse_config_path(args(&["doorstep", "-c", "a.toml"])).unwrap(),
            PathBuf::from("a.toml")
        );
        assert_eq!(
            parse_config_path(args(&["doorstep", "--config", "b.toml"])).unwrap(),
            PathBuf::from("b.toml")
        );
        assert!(parse_config_path(args(&["doorstep", "-c"])).is_err());
        assert!(parse_config_path(args(&["doorstep"])).is_err());
    }

    #[test]
    fn missing_file_is_reported() {
        assert!(load(Path::new("does/not/exist.toml")).is_err());
    }
}
