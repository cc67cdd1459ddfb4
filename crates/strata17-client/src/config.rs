use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize)]
pub struct ClientConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_username")]
    pub username: String,
    #[serde(default = "default_tick_millis")]
    pub tick_millis: u64,
}

fn default_host() -> String {
    "127.0.0.1".into()
}

fn default_port() -> u16 {
    25565
}

fn default_username() -> String {
    "player".into()
}

fn default_tick_millis() -> u64 {
    50
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            username: default_username(),
            tick_millis: default_tick_millis(),
        }
    }
}

impl ClientConfig {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)?;
            let config: ClientConfig = toml::from_str(&contents)?;
            Ok(config)
        } else {
            tracing::info!("no config file found at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let config = ClientConfig::load(Path::new("/nonexistent/strata17-client.toml")).unwrap();
        assert_eq!(config.host, default_host());
        assert_eq!(config.port, default_port());
    }

    #[test]
    fn partial_toml_fills_in_the_rest_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("strata17-client.toml");
        std::fs::write(&path, "username = \"Notch\"\n").unwrap();
        let config = ClientConfig::load(&path).unwrap();
        assert_eq!(config.username, "Notch");
        assert_eq!(config.host, default_host());
        assert_eq!(config.tick_millis, default_tick_millis());
    }
}
