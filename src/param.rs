// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # 协议参数与常量模块
//!
//! 该模块定义了分发层遵循的 HTTP 协议相关常量和数据结构，包括：
//! - 常见的 HTTP 状态码及其原因短语（Reason Phrase）。
//! - 路由表所使用的固定 HTTP 方法集合。
//! - 兜底路由使用的哨兵路径。

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use lazy_static::lazy_static;

use crate::exception::Exception;

/// 服务器名称标识，用于 HTTP 响应头的 `Server` 字段
pub const SERVER_NAME: &str = "webdispatch";

/// HTTP 协议规定的换行符（Carriage Return Line Feed）
pub const CRLF: &str = "\r\n";

/// 兜底（404）路由注册时使用的路径键。
///
/// 查找时兜底路由通过索引直接定位，不依赖请求路径与该值相等。
pub const NOT_FOUND_PATH: &str = "notfound";

/// 内置错误控制器在注册表中的名字
pub const ERROR_CONTROLLER: &str = "ErrorController";

/// 内置错误控制器处理 404 的动作名
pub const NOT_FOUND_ACTION: &str = "not_found";

/// 控制器未声明类型时使用的默认 `Content-Type`
pub const DEFAULT_CONTENT_TYPE: &str = "application/json";

lazy_static! {
    /// HTTP 状态码与其对应的标准原因短语映射表。
    ///
    /// 参考标准：[RFC 9110: HTTP Semantics](https://www.rfc-editor.org/rfc/rfc9110.html)。
    pub static ref STATUS_CODES: HashMap<u16, &'static str> = {
        let mut map = HashMap::new();
        // 1xx: 信息响应 (Informational)
        map.insert(100, "Continue");
        map.insert(101, "Switching Protocols");

        // 2xx: 成功响应 (Successful)
        map.insert(200, "OK");
        map.insert(201, "Created");
        map.insert(202, "Accepted");
        map.insert(204, "No Content");

        // 3xx: 重定向 (Redirection)
        map.insert(301, "Moved Permanently");
        map.insert(302, "Found");
        map.insert(303, "See Other");
        map.insert(304, "Not Modified");
        map.insert(307, "Temporary Redirect");
        map.insert(308, "Permanent Redirect");

        // 4xx: 客户端错误 (Client Error)
        map.insert(400, "Bad Request");
        map.insert(401, "Unauthorized");
        map.insert(403, "Forbidden");
        map.insert(404, "Not Found");
        map.insert(405, "Method Not Allowed");
        map.insert(406, "Not Acceptable");
        map.insert(409, "Conflict");
        map.insert(410, "Gone");
        map.insert(413, "Content Too Large");
        map.insert(415, "Unsupported Media Type");
        map.insert(422, "Unprocessable Content");
        map.insert(429, "Too Many Requests");

        // 5xx: 服务端错误 (Server Error)
        map.insert(500, "Internal Server Error");
        map.insert(501, "Not Implemented");
        map.insert(502, "Bad Gateway");
        map.insert(503, "Service Unavailable");
        map.insert(505, "HTTP Version Not Supported");
        map
    };
}

/// 返回状态码的原因短语，未知状态码返回空串。
pub fn reason_phrase(code: u16) -> &'static str {
    STATUS_CODES.get(&code).copied().unwrap_or("")
}

/// 支持的 HTTP 协议版本
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum HttpVersion {
    /// HTTP/1.1 版本
    #[default]
    V1_1,
}

/// 路由表认可的 HTTP 请求方法。
///
/// 集合是封闭的：每个方法在路由表中恰好有一条兜底路由。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum HttpRequestMethod {
    /// 获取资源
    #[default]
    Get,
    /// 提交数据或执行操作
    Post,
    /// 删除资源
    Delete,
    /// 替换资源
    Put,
}

impl HttpRequestMethod {
    /// 全部方法，顺序即 `add_route_for_all_verbs` 的展开顺序。
    pub const ALL: [HttpRequestMethod; 4] = [
        HttpRequestMethod::Get,
        HttpRequestMethod::Post,
        HttpRequestMethod::Delete,
        HttpRequestMethod::Put,
    ];

    /// 方法在 `ALL` 中的位置，用于按方法索引兜底路由。
    pub fn index(self) -> usize {
        match self {
            HttpRequestMethod::Get => 0,
            HttpRequestMethod::Post => 1,
            HttpRequestMethod::Delete => 2,
            HttpRequestMethod::Put => 3,
        }
    }
}

impl FromStr for HttpRequestMethod {
    type Err = Exception;

    /// 方法名大小写不敏感
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "GET" => Ok(HttpRequestMethod::Get),
            "POST" => Ok(HttpRequestMethod::Post),
            "DELETE" => Ok(HttpRequestMethod::Delete),
            "PUT" => Ok(HttpRequestMethod::Put),
            _ => Err(Exception::UnSupportedRequestMethod),
        }
    }
}

impl fmt::Display for HttpVersion {
    /// 将枚举格式化为 HTTP 报文中的版本字符串
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            HttpVersion::V1_1 => write!(f, "1.1"),
        }
    }
}

impl fmt::Display for HttpRequestMethod {
    /// 将枚举格式化为 HTTP 标准大写方法名
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            HttpRequestMethod::Get => write!(f, "GET"),
            HttpRequestMethod::Post => write!(f, "POST"),
            HttpRequestMethod::Delete => write!(f, "DELETE"),
            HttpRequestMethod::Put => write!(f, "PUT"),
        }
    }
}
