//! # 响应模块
//!
//! 包含两层结构：
//! - `ResponseDeclaration`：控制器在动作中填写的响应声明（内容、状态码、标头、类型）。
//! - `Response`：交给传输层序列化的 HTTP 响应，正文以字节块序列保存。

use std::collections::BTreeMap;

use bytes::Bytes;
use chrono::prelude::*;

use crate::param::*;

/// 标头表。键保留调用方给出的大小写，查找与覆盖时大小写不敏感。
pub type Headers = BTreeMap<String, String>;

/// 以大小写不敏感的方式写入标头，已有的同名标头（任意大小写）会被移除。
pub fn set_header(headers: &mut Headers, name: &str, value: &str) {
    headers.retain(|k, _| !k.eq_ignore_ascii_case(name));
    headers.insert(name.to_string(), value.to_string());
}

/// 以大小写不敏感的方式读取标头
pub fn get_header<'a>(headers: &'a Headers, name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(name))
        .map(|(_, v)| v.as_str())
}

/// 控制器声明的响应。
///
/// 动作通过修改这里的字段描述要返回的内容；`content_type` 会在分发结束时
/// 覆盖写入 `Content-Type` 标头，因此动作应修改 `content_type` 而不是直接改标头。
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseDeclaration {
    pub content: String,
    pub http_status: u16,
    pub headers: Headers,
    pub content_type: String,
}

impl Default for ResponseDeclaration {
    fn default() -> Self {
        Self {
            content: String::new(),
            http_status: 200,
            headers: Headers::new(),
            content_type: DEFAULT_CONTENT_TYPE.to_string(),
        }
    }
}

impl ResponseDeclaration {
    /// 302 重定向到给定地址
    pub fn redirect_to(&mut self, address: &str) {
        self.http_status = 302;
        set_header(&mut self.headers, "Location", address);
    }
}

/// 传输层响应。
#[derive(Debug, Clone)]
pub struct Response {
    status_code: u16,
    headers: Headers,
    body: Vec<Bytes>,
    date: DateTime<Utc>,
}

impl Response {
    pub fn new() -> Self {
        Self {
            status_code: 200,
            headers: Headers::new(),
            body: Vec::new(),
            date: Utc::now(),
        }
    }

    /// 由 `(content, status, headers)` 三元组构造响应
    pub fn from_parts(content: impl Into<String>, status_code: u16, headers: Headers) -> Self {
        let mut response = Self::new();
        response.status_code = status_code;
        response.headers = headers;
        response.set_body(content);
        response
    }

    /// 以纯文本页面回应的错误响应，供传输层在分发之外使用
    pub fn from_status_code(code: u16) -> Self {
        let mut response = Self::new();
        response.status_code = code;
        response.set_content_type("text/plain;charset=utf-8");
        response.set_body(format!("{} {}", code, reason_phrase(code)));
        response
    }

    pub fn response_400() -> Self {
        Self::from_status_code(400)
    }

    pub fn response_500() -> Self {
        Self::from_status_code(500)
    }

    /// 接收一个字符串正文，统一转换为单元素的字节块序列
    pub fn set_body(&mut self, body: impl Into<String>) -> &mut Self {
        self.body = vec![Bytes::from(body.into())];
        self
    }

    /// 直接设置字节块序列
    pub fn set_body_chunks(&mut self, chunks: Vec<Bytes>) -> &mut Self {
        self.body = chunks;
        self
    }

    pub fn set_header(&mut self, name: &str, value: &str) -> &mut Self {
        set_header(&mut self.headers, name, value);
        self
    }

    pub fn content_type(&self) -> Option<&str> {
        get_header(&self.headers, "Content-Type")
    }

    pub fn set_content_type(&mut self, value: &str) -> &mut Self {
        self.set_header("Content-Type", value)
    }

    /// 302 重定向到给定地址
    pub fn redirect_to(&mut self, address: &str) -> &mut Self {
        self.status_code = 302;
        self.set_header("Location", address)
    }

    /// 序列化为 HTTP/1.1 报文。
    ///
    /// 控制器未设置的 `Content-Length`、`Date`、`Server` 会自动补上。
    pub fn as_bytes(&self) -> Vec<u8> {
        let mut head = format!(
            "HTTP/1.1 {} {}{}",
            self.status_code,
            self.information(),
            CRLF
        );
        for (name, value) in &self.headers {
            head.push_str(&[name.as_str(), ": ", value.as_str(), CRLF].concat());
        }
        if get_header(&self.headers, "Content-Length").is_none() {
            head.push_str(&format!("Content-Length: {}{}", self.content_length(), CRLF));
        }
        if get_header(&self.headers, "Date").is_none() {
            head.push_str(&format!("Date: {}{}", format_date(&self.date), CRLF));
        }
        if get_header(&self.headers, "Server").is_none() {
            head.push_str(&format!("Server: {}{}", SERVER_NAME, CRLF));
        }
        head.push_str(CRLF);

        let mut bytes = head.into_bytes();
        for chunk in &self.body {
            bytes.extend_from_slice(chunk);
        }
        bytes
    }
}

impl Default for Response {
    fn default() -> Self {
        Self::new()
    }
}

impl From<ResponseDeclaration> for Response {
    fn from(declaration: ResponseDeclaration) -> Self {
        Self::from_parts(declaration.content, declaration.http_status, declaration.headers)
    }
}

impl Response {
    pub fn status_code(&self) -> u16 {
        self.status_code
    }

    pub fn information(&self) -> &str {
        reason_phrase(self.status_code)
    }

    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        get_header(&self.headers, name)
    }

    pub fn body(&self) -> &[Bytes] {
        &self.body
    }

    /// 正文拼接后的文本形式，非 UTF-8 部分以替换字符呈现
    pub fn body_string(&self) -> String {
        let joined: Vec<u8> = self.body.iter().flat_map(|c| c.iter().copied()).collect();
        String::from_utf8_lossy(&joined).into_owned()
    }

    pub fn content_length(&self) -> usize {
        self.body.iter().map(Bytes::len).sum()
    }
}

fn format_date(date: &DateTime<Utc>) -> String {
    date.to_rfc2822()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_date() {
        let formatted = format_date(&Utc::now());
        assert!(formatted.contains("+0000") || formatted.contains("GMT"));
    }

    #[test]
    fn test_declaration_default() {
        let declaration = ResponseDeclaration::default();
        assert_eq!(declaration.http_status, 200);
        assert_eq!(declaration.content, "");
        assert_eq!(declaration.content_type, DEFAULT_CONTENT_TYPE);
        assert!(declaration.headers.is_empty());
    }

    #[test]
    fn test_declaration_redirect() {
        let mut declaration = ResponseDeclaration::default();
        declaration.redirect_to("/login");
        assert_eq!(declaration.http_status, 302);
        assert_eq!(get_header(&declaration.headers, "location"), Some("/login"));
    }

    #[test]
    fn test_set_header_replaces_any_case() {
        let mut headers = Headers::new();
        headers.insert("content-type".to_string(), "text/html".to_string());
        set_header(&mut headers, "Content-Type", "text/plain");

        assert_eq!(headers.len(), 1);
        assert_eq!(headers.get("Content-Type"), Some(&"text/plain".to_string()));
    }

    #[test]
    fn test_string_body_becomes_single_chunk() {
        let mut response = Response::new();
        response.set_body("hello");

        assert_eq!(response.body().len(), 1);
        assert_eq!(response.body()[0], Bytes::from("hello"));
        assert_eq!(response.content_length(), 5);
    }

    #[test]
    fn test_body_chunks_concatenate() {
        let mut response = Response::new();
        response.set_body_chunks(vec![Bytes::from("he"), Bytes::from("llo")]);

        assert_eq!(response.body_string(), "hello");
        assert_eq!(response.content_length(), 5);
    }

    #[test]
    fn test_redirect_to() {
        let mut response = Response::new();
        response.redirect_to("https://example.com/");

        assert_eq!(response.status_code(), 302);
        assert_eq!(response.information(), "Found");
        assert_eq!(response.header("Location"), Some("https://example.com/"));
    }

    #[test]
    fn test_content_type_helpers() {
        let mut response = Response::new();
        assert_eq!(response.content_type(), None);
        response.set_content_type("text/plain");
        assert_eq!(response.content_type(), Some("text/plain"));
        assert_eq!(response.header("content-type"), Some("text/plain"));
    }

    #[test]
    fn test_from_declaration() {
        let mut declaration = ResponseDeclaration::default();
        declaration.content = "ok".to_string();
        declaration.http_status = 201;
        declaration.headers.insert("X-Trace".to_string(), "1".to_string());

        let response = Response::from(declaration);
        assert_eq!(response.status_code(), 201);
        assert_eq!(response.body_string(), "ok");
        assert_eq!(response.header("X-Trace"), Some("1"));
    }

    #[test]
    fn test_response_as_bytes_basic() {
        let response = Response::new();
        let bytes = response.as_bytes();
        let response_str = String::from_utf8_lossy(&bytes);

        assert!(response_str.starts_with("HTTP/1.1 200 OK\r\n"));
        assert!(response_str.contains("Content-Length: 0"));
        assert!(response_str.contains("Server: webdispatch"));
        assert!(response_str.contains("Date: "));
        assert!(response_str.ends_with("\r\n\r\n"));
    }

    #[test]
    fn test_response_as_bytes_with_content() {
        let mut headers = Headers::new();
        headers.insert("Content-Type".to_string(), "text/plain".to_string());
        let response = Response::from_parts("Hello", 200, headers);

        let bytes = response.as_bytes();
        let response_str = String::from_utf8_lossy(&bytes);

        assert!(response_str.contains("Content-Type: text/plain\r\n"));
        assert!(response_str.contains("Content-Length: 5\r\n"));
        assert!(response_str.ends_with("\r\n\r\nHello"));
    }

    #[test]
    fn test_explicit_server_header_not_duplicated() {
        let mut response = Response::new();
        response.set_header("Server", "custom");
        let response_str = String::from_utf8_lossy(&response.as_bytes()).into_owned();

        assert!(response_str.contains("Server: custom"));
        assert!(!response_str.contains("Server: webdispatch"));
    }

    #[test]
    fn test_from_status_code() {
        for (code, expected_info) in [
            (400, "Bad Request"),
            (404, "Not Found"),
            (500, "Internal Server Error"),
        ] {
            let response = Response::from_status_code(code);
            assert_eq!(response.status_code(), code);
            assert_eq!(response.information(), expected_info);
            assert!(response.body_string().contains(expected_info));
        }
    }
}
