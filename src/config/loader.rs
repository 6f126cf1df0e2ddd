use std::{fs, fs::File, io::Write, path::Path};

use anyhow::{Context, Result};
use config::{Config, Environment};
use log::info;

use super::defaults::ClientConfig;

const ENV_PREFIX: &str = "BACKEND_CLIENT";
const CLIENT_KEY: &str = "client";

pub fn get_default_config() -> &'static str {
    include_str!("../../config/config.toml")
}

/// Loads the configuration file, creating it from the embedded defaults if missing.
///
/// Environment variables override file values, e.g.
/// `BACKEND_CLIENT_CLIENT__BASE_URL` sets `client.base_url`.
pub fn load_configuration(path: &Path) -> Result<Config> {
    if !path.exists() {
        let sources = get_default_config();
        write_config_to(path, sources).context("Could not create default config")?;
        info!(path:% = path.display(); "Created new configuration file");
    }

    let filename = path.to_str().context("Invalid config file path")?;

    Config::builder()
        .add_source(config::File::with_name(filename))
        .add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        )
        .build()
        .context("Could not build config")
}

pub fn load_client_config(path: &Path) -> Result<ClientConfig> {
    let cfg = load_configuration(path)?;
    match cfg.get::<ClientConfig>(CLIENT_KEY) {
        Ok(client) => Ok(client),
        Err(config::ConfigError::NotFound(_)) => Ok(ClientConfig::default()),
        Err(e) => Err(e).context("Could not read client configuration"),
    }
}

pub fn write_config_to(path: &Path, source: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("Failed to create parent directories")?;
    };

    let mut file = File::create(path).context("Failed to create config file")?;
    file.write_all(source.as_bytes())
        .context("Failed to write config content")?;
    file.write_all(b"\n").context("Failed to write newline")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tempfile::tempdir;

    #[test]
    #[serial]
    fn creates_default_file_when_missing() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested/config.toml");

        let config = load_client_config(&path).unwrap();

        assert!(path.exists());
        assert_eq!(config, ClientConfig::default());
    }

    #[test]
    #[serial]
    fn reads_values_from_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        write_config_to(
            &path,
            "[client]\nbase_url = \"http://example.onion/\"\nstatus_retry_attempts = 4\n",
        )
        .unwrap();

        let config = load_client_config(&path).unwrap();

        assert_eq!(config.base_url, "http://example.onion/");
        assert_eq!(config.status_retry_attempts, 4);
        assert_eq!(config.timeout_secs, ClientConfig::default().timeout_secs);
    }

    #[test]
    #[serial]
    fn environment_overrides_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        write_config_to(&path, get_default_config()).unwrap();

        // SAFETY: serialized with the other tests touching the environment.
        unsafe { std::env::set_var("BACKEND_CLIENT_CLIENT__MAX_RETRIES", "7") };
        let config = load_client_config(&path);
        unsafe { std::env::remove_var("BACKEND_CLIENT_CLIENT__MAX_RETRIES") };

        assert_eq!(config.unwrap().max_retries, 7);
    }

    #[test]
    #[serial]
    fn missing_client_table_uses_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        write_config_to(&path, "[other]\nkey = 1\n").unwrap();

        assert_eq!(load_client_config(&path).unwrap(), ClientConfig::default());
    }
}
