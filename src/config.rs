use serde_derive::Deserialize;
use serde_derive::Serialize;

use log::{error, warn};
use std::fs;

use crate::exception::Exception;
use crate::settings::Settings;

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Config {
    port: u16,
    #[serde(default)]
    worker_threads: usize,
    #[serde(default = "default_local")]
    local: bool,
    #[serde(default = "default_max_request_size")]
    max_request_size: usize,
    // 原样注入给控制器的全局设置
    #[serde(default)]
    settings: toml::Table,
}

fn default_local() -> bool {
    true
}

fn default_max_request_size() -> usize {
    65536 // 64KB
}

impl Config {
    pub fn new() -> Self {
        Self {
            port: 7878,
            worker_threads: num_cpus::get(),
            local: default_local(),
            max_request_size: default_max_request_size(),
            settings: toml::Table::new(),
        }
    }

    /// 从 TOML 文件读取配置。文件读不到时返回错误，内容不合法时退回默认配置。
    pub fn from_toml(filename: &str) -> Result<Self, Exception> {
        let str_val = match fs::read_to_string(filename) {
            Ok(s) => s,
            Err(e) => {
                error!("无法读取配置文件{}：{}", filename, e);
                return Err(Exception::ConfigUnreadable(filename.to_string()));
            }
        };

        let mut raw_config = match Self::parse(&str_val) {
            Ok(c) => c,
            Err(e) => {
                error!("无法成功从配置文件构建配置对象，使用默认配置：{}", e);
                Config::new()
            }
        };
        if raw_config.worker_threads == 0 {
            raw_config.worker_threads = num_cpus::get();
        }
        if raw_config.max_request_size < 1024 {
            warn!("max_request_size过小，将被改为1024。");
            raw_config.max_request_size = 1024;
        }
        Ok(raw_config)
    }

    /// 解析 TOML 文本，不做默认值修正
    pub fn parse(content: &str) -> Result<Self, Exception> {
        toml::from_str(content).map_err(|e| Exception::ConfigInvalid(e.to_string()))
    }

    /// 由 `[settings]` 段构建只读的全局设置
    pub fn build_settings(&self) -> Settings {
        Settings::builder().extend_from_toml(&self.settings).build()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn worker_threads(&self) -> usize {
        self.worker_threads
    }

    pub fn local(&self) -> bool {
        self.local
    }

    pub fn max_request_size(&self) -> usize {
        self.max_request_size
    }

    pub fn settings(&self) -> &toml::Table {
        &self.settings
    }
}
