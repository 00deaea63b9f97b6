//! Node configuration loaded from a `key=value` conf file.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use rivd_log::{Format, Level, LogConfig};
use rivd_storage::fjall::FjallOptions;
use thiserror::Error;

use crate::txpool::PoolConfig;

pub const CONF_FILE_NAME: &str = "rivd.conf";

/// Raw conf entries; keys are lower-cased, repeated keys keep every value.
pub type ConfMap = HashMap<String, Vec<String>>;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io { path: PathBuf, source: io::Error },
    #[error("invalid value '{value}' for {key}")]
    InvalidValue { key: String, value: String },
}

#[derive(Clone, Debug)]
pub struct NodeConfig {
    pub data_dir: PathBuf,
    pub log_level: Level,
    pub log_format: Format,
    pub log_timestamps: bool,
    pub pool: PoolConfig,
    pub db_cache_bytes: Option<u64>,
    /// Fsync the journal on every batch commit.
    pub db_fsync: bool,
}

impl Default for NodeConfig {
    fn default() -> Self {
        let log = LogConfig::default();
        Self {
            data_dir: default_data_dir(),
            log_level: log.level,
            log_format: log.format,
            log_timestamps: log.timestamps,
            pool: PoolConfig::default(),
            db_cache_bytes: None,
            db_fsync: false,
        }
    }
}

pub fn default_data_dir() -> PathBuf {
    match std::env::var_os("HOME") {
        Some(home) => PathBuf::from(home).join(".rivd"),
        None => PathBuf::from("data"),
    }
}

/// Reads a conf file. A missing file is `Ok(None)`.
pub fn load_conf(path: &Path) -> Result<Option<ConfMap>, ConfigError> {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(ConfigError::Io {
                path: path.to_path_buf(),
                source,
            })
        }
    };
    Ok(Some(parse_conf(&contents)))
}

pub fn parse_conf(contents: &str) -> ConfMap {
    let mut out = ConfMap::new();
    for raw_line in contents.lines() {
        let mut line = raw_line.trim();
        if let Some(idx) = line.find(|c: char| c == '#' || c == ';') {
            line = &line[..idx];
        }
        line = line.trim();
        if line.is_empty() {
            continue;
        }
        let (key, value) = match line.split_once('=') {
            Some((key, value)) => (key.trim(), value.trim()),
            None => (line, "1"),
        };
        if key.is_empty() {
            continue;
        }
        out.entry(key.to_ascii_lowercase())
            .or_default()
            .push(value.to_string());
    }
    out
}

fn parse_conf_bool(value: &str) -> Option<bool> {
    let value = value.trim();
    if value.is_empty() {
        return Some(true);
    }
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => Some(true),
        "0" | "false" | "no" => Some(false),
        _ => None,
    }
}

fn last<'a>(conf: &'a ConfMap, key: &str) -> Option<&'a str> {
    conf.get(key)
        .and_then(|values| values.last())
        .map(String::as_str)
}

fn invalid(key: &str, value: &str) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
    }
}

fn parse_with<T>(
    conf: &ConfMap,
    key: &str,
    parse: impl Fn(&str) -> Option<T>,
) -> Result<Option<T>, ConfigError> {
    match last(conf, key) {
        Some(raw) => parse(raw).map(Some).ok_or_else(|| invalid(key, raw)),
        None => Ok(None),
    }
}

fn parse_count(raw: &str) -> Option<usize> {
    raw.parse::<usize>().ok().filter(|value| *value > 0)
}

impl NodeConfig {
    /// Defaults overlaid with the conf file at `path`, if it exists.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        if let Some(conf) = load_conf(path)? {
            config.apply_conf(&conf)?;
        }
        Ok(config)
    }

    pub fn apply_conf(&mut self, conf: &ConfMap) -> Result<(), ConfigError> {
        if let Some(dir) = last(conf, "data_dir").filter(|dir| !dir.is_empty()) {
            self.data_dir = PathBuf::from(dir);
        }
        if let Some(level) = parse_with(conf, "loglevel", Level::parse)? {
            self.log_level = level;
        }
        if let Some(format) = parse_with(conf, "logformat", Format::parse)? {
            self.log_format = format;
        }
        if let Some(timestamps) = parse_with(conf, "logtimestamps", parse_conf_bool)? {
            self.log_timestamps = timestamps;
        }
        if let Some(bytes) = parse_with(conf, "txpool_max_bytes", parse_count)? {
            self.pool.max_pool_bytes = bytes;
        }
        if let Some(bytes) = parse_with(conf, "txpool_max_set_bytes", parse_count)? {
            self.pool.max_set_bytes = bytes;
        }
        if let Some(workers) = parse_with(conf, "relay_workers", parse_count)? {
            self.pool.relay_workers = workers;
        }
        if let Some(queue) = parse_with(conf, "relay_queue", parse_count)? {
            self.pool.relay_queue = queue;
        }
        if let Some(bytes) = parse_with(conf, "db_cache_bytes", |raw| raw.parse::<u64>().ok())? {
            self.db_cache_bytes = Some(bytes);
        }
        if let Some(fsync) = parse_with(conf, "db_fsync", parse_conf_bool)? {
            self.db_fsync = fsync;
        }
        Ok(())
    }

    pub fn log_config(&self) -> LogConfig {
        LogConfig {
            level: self.log_level,
            format: self.log_format,
            timestamps: self.log_timestamps,
        }
    }

    pub fn fjall_options(&self) -> FjallOptions {
        FjallOptions {
            cache_bytes: self.db_cache_bytes,
            sync_batches: self.db_fsync,
            ..FjallOptions::default()
        }
    }

    pub fn consensus_db_path(&self) -> PathBuf {
        self.data_dir.join("consensus")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn comments_and_bare_keys() {
        let conf = parse_conf(
            "# node settings\n\
             LogLevel = debug ; trailing\n\
             db_fsync\n\
             relay_workers=2\n\
             relay_workers=6\n\
             =ignored\n",
        );
        assert_eq!(conf.get("loglevel"), Some(&vec!["debug".to_string()]));
        assert_eq!(conf.get("db_fsync"), Some(&vec!["1".to_string()]));
        assert_eq!(conf.get("relay_workers").map(Vec::len), Some(2));
        assert!(!conf.contains_key(""));
    }

    #[test]
    fn last_value_wins_over_defaults() {
        let mut config = NodeConfig::default();
        let conf = parse_conf(
            "data_dir=/var/lib/rivd\nlogformat=json\nlogtimestamps=no\nrelay_workers=2\nrelay_workers=6\ntxpool_max_bytes=1000\ndb_cache_bytes=4096\ndb_fsync=yes\n",
        );
        config.apply_conf(&conf).expect("apply");
        assert_eq!(config.data_dir, PathBuf::from("/var/lib/rivd"));
        assert_eq!(config.log_format, Format::Json);
        assert!(!config.log_timestamps);
        assert_eq!(config.pool.relay_workers, 6);
        assert_eq!(config.pool.max_pool_bytes, 1000);
        assert_eq!(config.fjall_options().cache_bytes, Some(4096));
        assert!(config.fjall_options().sync_batches);
        assert_eq!(
            config.consensus_db_path(),
            PathBuf::from("/var/lib/rivd/consensus")
        );
    }

    #[test]
    fn invalid_values_name_their_key() {
        let mut config = NodeConfig::default();
        for raw in ["loglevel=loud", "relay_queue=0", "db_fsync=maybe"] {
            let err = config
                .apply_conf(&parse_conf(raw))
                .expect_err("invalid value");
            assert!(matches!(err, ConfigError::InvalidValue { .. }), "{raw}");
        }
    }

    #[test]
    fn missing_file_keeps_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        assert!(load_conf(&dir.path().join(CONF_FILE_NAME))
            .expect("load")
            .is_none());

        let path = dir.path().join(CONF_FILE_NAME);
        fs::write(&path, "txpool_max_set_bytes=512\n").expect("write");
        let config = NodeConfig::load(&path).expect("load");
        assert_eq!(config.pool.max_set_bytes, 512);
        assert_eq!(config.log_level, Level::Info);
    }
}
