use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Persisted device configuration.
///
/// `ip` and `mask` are only meaningful when `dhcp` is false; in DHCP
/// mode they keep whatever value was last written.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct DeviceConfig {
    #[serde(default)]
    pub ssid: String,
    #[serde(default)]
    pub password: String,
    #[serde(default = "default_dhcp")]
    pub dhcp: bool,
    #[serde(default)]
    pub ip: String,
    #[serde(default)]
    pub mask: String,
}

fn default_dhcp() -> bool {
    true
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            ssid: String::new(),
            password: String::new(),
            dhcp: true,
            ip: String::new(),
            mask: String::new(),
        }
    }
}

/// TOML-backed configuration store.
///
/// Every setter persists the whole document immediately; there is no
/// transaction spanning multiple setter calls, so a later save can fail
/// after an earlier one succeeded.
pub struct ConfigStore {
    path: PathBuf,
    config: DeviceConfig,
}

impl ConfigStore {
    pub fn load(path: PathBuf) -> Result<Self> {
        if !path.exists() {
            return Ok(Self {
                path,
                config: DeviceConfig::default(),
            });
        }

        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(Self { path, config })
    }

    pub fn config(&self) -> &DeviceConfig {
        &self.config
    }

    /// Set and persist the WiFi credentials.
    pub fn set_auth(&mut self, ssid: &str, password: &str) -> Result<()> {
        self.config.ssid = ssid.to_string();
        self.config.password = password.to_string();
        self.save()
    }

    /// Set and persist the address mode. `ip` and `mask` are written
    /// only when `dhcp` is false.
    pub fn set_ip_mode(&mut self, dhcp: bool, ip: &str, mask: &str) -> Result<()> {
        self.config.dhcp = dhcp;

        if !dhcp {
            self.config.ip = ip.to_string();
            self.config.mask = mask.to_string();
        }

        self.save()
    }

    fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let content = toml::to_string_pretty(&self.config).context("Failed to serialize config")?;

        fs::write(&self.path, content)
            .with_context(|| format!("Failed to write config file: {}", self.path.display()))?;

        Ok(())
    }
}

/// Default location of the config file.
pub fn config_path() -> Result<PathBuf> {
    let config_dir = dirs::config_dir().context("Could not determine config directory")?;
    Ok(config_dir.join("wifi-configurator").join("config.toml"))
}

/// Shared configuration capability handed to the HTTP handlers.
///
/// Owns the store plus the serialized current-config response. The
/// response is built on first read and reused byte-identical afterwards;
/// only [`ConfigService::invalidate`] drops it, and only the config-write
/// handler calls that.
pub struct ConfigService {
    store: Mutex<ConfigStore>,
    current_json: Mutex<Option<String>>,
}

impl ConfigService {
    pub fn new(store: ConfigStore) -> Self {
        Self {
            store: Mutex::new(store),
            current_json: Mutex::new(None),
        }
    }

    pub fn open(path: &Path) -> Result<Self> {
        Ok(Self::new(ConfigStore::load(path.to_path_buf())?))
    }

    /// Serialized current-config JSON, cached across calls.
    pub fn current_response(&self) -> String {
        let mut cached = self.current_json.lock().unwrap();

        if let Some(response) = cached.as_ref() {
            return response.clone();
        }

        let store = self.store.lock().unwrap();
        let config = store.config();
        let response = serde_json::json!({
            "ssid": config.ssid,
            "password": config.password,
            "mode": if config.dhcp { "dhcp" } else { "static" },
            "static_ip": config.ip,
            "static_mask": config.mask,
        })
        .to_string();

        *cached = Some(response.clone());
        response
    }

    pub fn invalidate(&self) {
        *self.current_json.lock().unwrap() = None;
    }

    pub fn set_auth(&self, ssid: &str, password: &str) -> Result<()> {
        self.store.lock().unwrap().set_auth(ssid, password)
    }

    pub fn set_ip_mode(&self, dhcp: bool, ip: &str, mask: &str) -> Result<()> {
        self.store.lock().unwrap().set_ip_mode(dhcp, ip, mask)
    }

    /// Direct access for startup logging and tests.
    pub fn snapshot(&self) -> DeviceConfig {
        self.store.lock().unwrap().config().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_in(dir: &tempfile::TempDir) -> ConfigStore {
        ConfigStore::load(dir.path().join("config.toml")).unwrap()
    }

    #[test]
    fn missing_file_loads_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);

        assert_eq!(store.config().ssid, "");
        assert!(store.config().dhcp);
    }

    #[test]
    fn setters_persist_immediately() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let mut store = ConfigStore::load(path.clone()).unwrap();
        store.set_auth("HomeNet", "hunter2").unwrap();

        // A fresh load sees the credentials without any further save.
        let reloaded = ConfigStore::load(path).unwrap();
        assert_eq!(reloaded.config().ssid, "HomeNet");
        assert_eq!(reloaded.config().password, "hunter2");
    }

    #[test]
    fn dhcp_mode_leaves_address_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = store_in(&dir);

        store.set_ip_mode(false, "10.0.0.5", "255.255.255.0").unwrap();
        store.set_ip_mode(true, "192.168.9.9", "255.0.0.0").unwrap();

        assert!(store.config().dhcp);
        assert_eq!(store.config().ip, "10.0.0.5");
        assert_eq!(store.config().mask, "255.255.255.0");
    }

    #[test]
    fn static_mode_writes_address() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = store_in(&dir);

        store.set_ip_mode(false, "10.0.0.5", "255.255.255.0").unwrap();

        assert!(!store.config().dhcp);
        assert_eq!(store.config().ip, "10.0.0.5");
        assert_eq!(store.config().mask, "255.255.255.0");
    }

    #[test]
    fn current_response_is_cached_until_invalidated() {
        let dir = tempfile::tempdir().unwrap();
        let service = ConfigService::new(store_in(&dir));

        let first = service.current_response();
        service.set_auth("Changed", "pw").unwrap();

        // Mutation without invalidation does not change the response.
        assert_eq!(service.current_response(), first);

        service.invalidate();
        let rebuilt = service.current_response();
        assert_ne!(rebuilt, first);
        assert!(rebuilt.contains("Changed"));
    }
}
