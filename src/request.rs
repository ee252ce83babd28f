// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # HTTP 请求处理模块
//!
//! 负责将 TCP 流中读取的原始字节解析为强类型的 `Request` 结构体。
//! 分发层只依赖其中的方法与路径，其余字段（查询串、标头、请求体）
//! 原样提供给控制器使用。

use std::collections::HashMap;

use log::error;

use crate::{exception::Exception, param::*};

/// 表示一个完整的 HTTP 请求。
#[derive(Debug, Clone, Default)]
pub struct Request {
    /// HTTP 请求方法
    method: HttpRequestMethod,
    /// 请求路径（不含查询字符串）
    path: String,
    /// `?` 之后的查询字符串
    query: Option<String>,
    /// HTTP 协议版本
    version: HttpVersion,
    /// 标头，键统一转为小写
    headers: HashMap<String, String>,
    /// 请求体
    body: String,
}

impl Request {
    /// 从原始字节缓冲区尝试构建 `Request` 实例。
    ///
    /// # 逻辑步骤
    /// 1. 验证编码：确保请求数据是合法的 UTF-8 字符串。
    /// 2. 解析请求行：提取方法、路径和协议版本。
    /// 3. 迭代解析标头，直到空行。
    /// 4. 空行之后的内容作为请求体。
    ///
    /// # 参数
    /// * `buffer` - 从网络 Socket 读取的原始数据。
    /// * `id` - 全局请求 ID，用于在多线程环境下追踪日志。
    pub fn try_from(buffer: &[u8], id: u128) -> Result<Self, Exception> {
        let request_string = match std::str::from_utf8(buffer) {
            Ok(string) => string.trim_end_matches('\0'),
            Err(_) => {
                error!("[ID{}]无法解析HTTP请求", id);
                return Err(Exception::RequestIsNotUtf8);
            }
        };

        let (head, body) = match request_string.split_once("\r\n\r\n") {
            Some((head, body)) => (head, body),
            None => (request_string, ""),
        };
        let mut lines = head.split(CRLF);

        // 请求行 (e.g., "GET /index.html HTTP/1.1")
        let first_line = lines.next().unwrap_or_default();
        let first_line_parts: Vec<&str> = first_line.split(' ').collect();
        if first_line_parts.len() < 3 {
            error!("[ID{}]HTTP请求行格式不正确：{}", id, first_line);
            return Err(Exception::MalformedRequest);
        }

        let method = match first_line_parts[0].parse::<HttpRequestMethod>() {
            Ok(method) => method,
            Err(e) => {
                error!("[ID{}]不支持的HTTP请求方法：{}", id, first_line_parts[0]);
                return Err(e);
            }
        };

        let version_str = first_line_parts[first_line_parts.len() - 1].to_uppercase();
        let version = match version_str.as_str() {
            "HTTP/1.1" => HttpVersion::V1_1,
            _ => {
                error!("[ID{}]不支持的HTTP协议版本：{}", id, &version_str);
                return Err(Exception::UnsupportedHttpVersion);
            }
        };

        // 路径中可能包含空格（不规范），通过 join 尝试恢复
        let target = first_line_parts[1..first_line_parts.len() - 1].join(" ");
        let (path, query) = match target.split_once('?') {
            Some((path, query)) => (path.to_string(), Some(query.to_string())),
            None => (target, None),
        };

        let mut headers = HashMap::new();
        for line in lines {
            if let Some((name, value)) = line.split_once(':') {
                headers.insert(name.trim().to_lowercase(), value.trim().to_string());
            }
        }

        Ok(Self {
            method,
            path,
            query,
            version,
            headers,
            body: body.to_string(),
        })
    }

    /// 直接以方法与路径构造请求，主要供测试与基准使用。
    pub fn new(method: HttpRequestMethod, path: &str) -> Self {
        let (path, query) = match path.split_once('?') {
            Some((path, query)) => (path.to_string(), Some(query.to_string())),
            None => (path.to_string(), None),
        };
        Self {
            method,
            path,
            query,
            ..Default::default()
        }
    }

    /// 附加请求体
    pub fn with_body(mut self, body: &str) -> Self {
        self.body = body.to_string();
        self
    }

    /// 附加一个标头
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.insert(name.to_lowercase(), value.to_string());
        self
    }
}

// --- Getter 访问器实现 ---

impl Request {
    /// 获取 HTTP 协议版本
    pub fn version(&self) -> &HttpVersion {
        &self.version
    }

    /// 获取请求路径（不含查询参数）
    pub fn path(&self) -> &str {
        &self.path
    }

    /// 获取查询字符串
    pub fn query(&self) -> Option<&str> {
        self.query.as_deref()
    }

    /// 获取请求方法
    pub fn method(&self) -> HttpRequestMethod {
        self.method
    }

    /// 按名字获取标头，名字大小写不敏感
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_lowercase()).map(String::as_str)
    }

    /// 获取用户代理字符串
    pub fn user_agent(&self) -> &str {
        self.header("user-agent").unwrap_or_default()
    }

    /// 声明的请求体长度
    pub fn content_length(&self) -> Option<usize> {
        self.header("content-length").and_then(|v| v.parse().ok())
    }

    /// 获取请求体
    pub fn body(&self) -> &str {
        &self.body
    }
}
