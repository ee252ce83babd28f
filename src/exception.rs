// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # Exception 模块
//!
//! 该模块定义了请求在解析、分发与执行过程中可能出现的各类异常情况。
//!
//! ## 分类
//! - **报文错误**：请求字节流无法解析，传输层应以 `400 Bad Request` 回应。
//! - **配置缺陷**：路由引用了不存在的控制器或动作。这是注册代码的编程错误，
//!   应在启动时由 `Dispatcher::validate` 暴露出来，而不是当作请求级别的情况处理。
//! - **执行失败**：`before` 钩子或动作本身返回的错误，原样传递到传输层边界。
//!
//! 找不到路由**不是**异常：它由兜底路由吸收，产生一个普通的 404 响应。

use std::fmt;

/// 分发层处理请求过程中发生的异常类型。
#[derive(Debug, Clone, PartialEq)]
pub enum Exception {
    /// 客户端发送的请求字节流无法解析为合法的 UTF-8 字符串。
    RequestIsNotUtf8,
    /// 请求行缺失或结构不完整（例如少于三段）。
    MalformedRequest,
    /// 客户端使用了路由表不认可的 HTTP 方法（固定集合为 GET/POST/PUT/DELETE）。
    UnSupportedRequestMethod,
    /// 客户端使用了不支持的 HTTP 协议版本。
    UnsupportedHttpVersion,
    /// 路由引用的控制器名在注册表中不存在。
    UnresolvableController(String),
    /// 控制器存在，但没有路由所指定的动作。
    UnknownAction { controller: String, action: String },
    /// `before` 钩子或动作执行失败，附带失败描述。
    ActionFailed(String),
    /// 配置文件无法读取。
    ConfigUnreadable(String),
    /// 配置文件内容不合法。
    ConfigInvalid(String),
}

use Exception::*;

impl fmt::Display for Exception {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestIsNotUtf8 => write!(f, "Request bytes can't be parsed in UTF-8"),
            MalformedRequest => write!(f, "Malformed request line"),
            UnSupportedRequestMethod => write!(f, "Unsupported request method"),
            UnsupportedHttpVersion => write!(f, "Unsupported HTTP version"),
            UnresolvableController(name) => write!(f, "No controller registered as '{}'", name),
            UnknownAction { controller, action } => {
                write!(f, "Controller '{}' has no action '{}'", controller, action)
            }
            ActionFailed(message) => write!(f, "Action failed: {}", message),
            ConfigUnreadable(path) => write!(f, "Couldn't read config file {}", path),
            ConfigInvalid(message) => write!(f, "Invalid config: {}", message),
        }
    }
}

impl std::error::Error for Exception {}

impl Exception {
    /// 是否属于请求报文层面的错误（传输层以 400 回应）。
    pub fn is_bad_request(&self) -> bool {
        matches!(
            self,
            RequestIsNotUtf8 | MalformedRequest | UnSupportedRequestMethod | UnsupportedHttpVersion
        )
    }
}
