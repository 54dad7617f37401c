use serde::Deserialize;

use crate::error::Result;
use crate::storage::StorageType;

#[derive(Debug, PartialEq, Deserialize)]
pub enum LogLevel {
    Debug,
    Info,
}

#[derive(Debug, PartialEq, Deserialize)]
pub struct Config {
    pub log_level: LogLevel,
    pub storage_type: StorageType,
    /// Number of frames in the buffer pool.
    pub pool_size: usize,
    /// The k for the LRU-K replacement policy, k = 1 degenerates
    /// to classical LRU.
    pub replacer_k: usize,
    /// Entry capacity of each page table bucket.
    pub bucket_size: usize,
}

impl Config {
    #[allow(dead_code)]
    fn new(file: &str) -> Result<Config> {
        let mut cfg = config::Config::builder()
            .set_default("storage_type", "memory")?
            .set_default("log_level", "debug")?
            .set_default("pool_size", 64)?
            .set_default("replacer_k", 2)?
            .set_default("bucket_size", 8)?;
        if !file.is_empty() {
            cfg = cfg.add_source(config::File::with_name(file))
        }
        cfg = cfg.add_source(config::Environment::with_prefix("FRAMEDB"));
        Ok(cfg.build()?.try_deserialize()?)
    }
}
