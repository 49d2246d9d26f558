use serde::Deserialize;

use crate::error::Result;
use crate::storage::StorageType;

#[derive(Debug, PartialEq, Deserialize)]
pub enum LogLevel {
    Debug,
    Info,
}

/// Buffer pool construction parameters plus process-level knobs, loaded
/// from defaults, an optional config file, and PAGEBOX-prefixed environment
/// variables, in that order of precedence.
#[derive(Debug, PartialEq, Deserialize)]
pub struct Config {
    pub log_level: LogLevel,
    pub storage_type: StorageType,
    pub pool_size: usize,
    pub replacer_k: usize,
    pub path: String,
}

impl Config {
    pub fn new(file: &str) -> Result<Config> {
        let mut cfg = config::Config::builder()
            .set_default("log_level", "debug")?
            .set_default("storage_type", "memory")?
            .set_default("pool_size", 64)?
            .set_default("replacer_k", 2)?
            .set_default("path", "pagebox.db")?;
        if !file.is_empty() {
            cfg = cfg.add_source(config::File::with_name(file))
        }
        cfg = cfg.add_source(config::Environment::with_prefix("PAGEBOX"));
        Ok(cfg.build()?.try_deserialize()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() -> Result<()> {
        let cfg = Config::new("")?;
        assert_eq!(LogLevel::Debug, cfg.log_level);
        assert_eq!(StorageType::Memory, cfg.storage_type);
        assert_eq!(64, cfg.pool_size);
        assert_eq!(2, cfg.replacer_k);
        assert_eq!("pagebox.db", cfg.path);
        Ok(())
    }
}
