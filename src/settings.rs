// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # 全局设置
//!
//! 应用启动时构建一次、之后只读的键值表，通过 `Arc<Settings>` 注入到每个控制器。
//! 值可以是任意 `Send + Sync` 类型（数据库连接池、客户端句柄等），
//! 配置文件 `[settings]` 段中的条目以 `toml::Value` 形式存入。

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use log::debug;

type Value = Arc<dyn Any + Send + Sync>;

/// 只读设置表。构建后不再提供任何修改接口。
#[derive(Clone, Default)]
pub struct Settings {
    values: HashMap<String, Value>,
}

impl Settings {
    pub fn builder() -> SettingsBuilder {
        SettingsBuilder::default()
    }

    /// 按类型取值；键不存在或类型不符时返回 `None`
    pub fn get<T: Any + Send + Sync>(&self, key: &str) -> Option<&T> {
        self.values.get(key).and_then(|v| v.downcast_ref::<T>())
    }

    /// 取字符串值，兼容 `String`、`&'static str` 与 TOML 字符串
    pub fn get_str(&self, key: &str) -> Option<&str> {
        if let Some(s) = self.get::<String>(key) {
            return Some(s.as_str());
        }
        if let Some(s) = self.get::<&'static str>(key) {
            return Some(*s);
        }
        self.get::<toml::Value>(key).and_then(toml::Value::as_str)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<&str> = self.keys().collect();
        keys.sort_unstable();
        f.debug_struct("Settings").field("keys", &keys).finish()
    }
}

/// `Settings` 的构建器，只在应用启动阶段使用。
#[derive(Default)]
pub struct SettingsBuilder {
    values: HashMap<String, Value>,
}

impl SettingsBuilder {
    /// 写入一个值，同名键会被覆盖
    pub fn insert<T: Any + Send + Sync>(mut self, key: &str, value: T) -> Self {
        self.values.insert(key.to_string(), Arc::new(value));
        self
    }

    /// 将 TOML 表中的每个条目以 `toml::Value` 写入
    pub fn extend_from_toml(mut self, table: &toml::Table) -> Self {
        for (key, value) in table {
            debug!("载入设置项：{}", key);
            self.values.insert(key.clone(), Arc::new(value.clone()));
        }
        self
    }

    pub fn build(self) -> Settings {
        Settings {
            values: self.values,
        }
    }
}
