// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # 控制器分发服务器
//!
//! 基于 Tokio 运行时的多线程 HTTP 服务器，每个请求交给 `Dispatcher`
//! 按 `(方法, 路径)` 找到控制器与动作并执行。
//! 核心功能包括：
//! - 启动时注册并校验全部路由
//! - 每个连接一个轻量任务
//! - 后台管理控制台（CLI 指令交互）

mod demo;

use log::{debug, error, info, warn};
use tokio::{
    io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader},
    net::{TcpListener, TcpStream},
    runtime::Builder,
    sync::Notify,
};

use std::{
    net::{Ipv4Addr, SocketAddrV4},
    sync::{
        atomic::{AtomicBool, AtomicU32, Ordering},
        Arc,
    },
    time::Instant,
};

use webdispatch::{Config, Dispatcher, Request, Response};

fn main() {
    // 1. 初始化日志系统：通过外部 YAML 配置级别与输出目的地
    if let Err(e) = log4rs::init_file("config/log4rs.yaml", Default::default()) {
        eprintln!("无法初始化日志系统：{}", e);
    }

    // 2. 环境配置加载
    let config = match Config::from_toml("config/development.toml") {
        Ok(c) => {
            info!("配置文件已载入");
            c
        }
        Err(e) => {
            warn!("{}，使用默认配置", e);
            Config::new()
        }
    };

    // 3. 注册路由，并在开始服务前确认每条路由都能解析
    let mut dispatcher = Dispatcher::new(config.build_settings());
    demo::register(&mut dispatcher);
    if let Err(e) = dispatcher.validate() {
        error!("路由配置有误：{}", e);
        std::process::exit(1);
    }
    info!("已注册{}条路由", dispatcher.routes().len());
    let dispatcher = Arc::new(dispatcher);

    // 4. 根据配置文件分配工作线程数
    let runtime = match Builder::new_multi_thread()
        .worker_threads(config.worker_threads())
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            error!("无法创建Tokio运行时：{}", e);
            std::process::exit(1);
        }
    };

    runtime.block_on(serve(config, dispatcher));
}

async fn serve(config: Config, dispatcher: Arc<Dispatcher>) {
    let port: u16 = config.port();
    let address = match config.local() {
        true => Ipv4Addr::new(127, 0, 0, 1),
        false => Ipv4Addr::new(0, 0, 0, 0),
    };
    info!("服务端将在{}:{}上监听Socket连接", address, port);
    let socket = SocketAddrV4::new(address, port);

    let listener = match TcpListener::bind(socket).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("无法绑定端口：{}，错误：{}", port, e);
            return;
        }
    };
    info!("端口{}绑定完成", port);

    // shutdown_flag: 停机标志；active_connection: 当前并发连接数
    let shutdown_flag = Arc::new(AtomicBool::new(false));
    let shutdown_notify = Arc::new(Notify::new());
    let active_connection = Arc::new(AtomicU32::new(0));

    tokio::spawn(console(
        Arc::clone(&shutdown_flag),
        Arc::clone(&shutdown_notify),
        Arc::clone(&active_connection),
    ));

    let max_request_size = config.max_request_size();
    let mut id: u128 = 0;

    loop {
        if shutdown_flag.load(Ordering::SeqCst) {
            info!("主循环接收到停机指令，正在退出...");
            break;
        }

        let (mut stream, addr) = tokio::select! {
            accepted = listener.accept() => match accepted {
                Ok(pair) => pair,
                Err(e) => {
                    error!("接受连接失败：{}", e);
                    continue;
                }
            },
            _ = shutdown_notify.notified() => continue,
        };
        debug!("[ID{}]新的连接：{}", id, addr);

        let active_connection = Arc::clone(&active_connection);
        let dispatcher = Arc::clone(&dispatcher);

        tokio::spawn(async move {
            let _guard = ConnectionGuard::new(active_connection);
            handle_connection(&mut stream, id, &dispatcher, max_request_size).await;
        });
        id += 1;
    }
}

/// 后台管理控制台：`stop` 发出停机信号，`status` 查看活跃连接数
async fn console(
    shutdown_flag: Arc<AtomicBool>,
    shutdown_notify: Arc<Notify>,
    active_connection: Arc<AtomicU32>,
) {
    let mut reader = BufReader::new(tokio::io::stdin());
    let mut input = String::new();
    loop {
        input.clear();
        match reader.read_line(&mut input).await {
            Ok(0) | Err(_) => break,
            Ok(_) => {}
        }
        match input.trim() {
            "stop" => {
                shutdown_flag.store(true, Ordering::SeqCst);
                shutdown_notify.notify_one();
                println!("停机指令已激活，服务器将停止接受新连接...");
                break;
            }
            "help" => {
                println!("== Webdispatch Help ==");
                println!("stop   - 发出停机信号");
                println!("status - 查看当前服务器运行状态");
                println!("help   - 显示此帮助信息");
                println!("======================");
            }
            "status" => {
                println!("== Webdispatch 状态 ==");
                println!("当前活跃连接数: {}", active_connection.load(Ordering::SeqCst));
                println!("======================");
            }
            cmd => println!("无效的命令：{}", cmd),
        }
    }
}

/// 一次读取的结果
#[derive(Debug, PartialEq)]
enum RequestRead {
    /// 完整的请求：标头与 `Content-Length` 声明的请求体都已到达
    Complete(Vec<u8>),
    /// 标头或声明的请求体超过上限，应回应 413
    TooLarge,
    /// 客户端未发送任何数据便关闭了连接
    Closed,
}

/// 读取一个完整请求：标头读完后再按 `Content-Length` 读取请求体，总量不超过 `limit`。
async fn read_request(stream: &mut TcpStream, limit: usize) -> std::io::Result<RequestRead> {
    let mut buffer = Vec::with_capacity(4096);
    let mut chunk = [0u8; 4096];
    loop {
        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            return Ok(match buffer.is_empty() {
                true => RequestRead::Closed,
                false => RequestRead::Complete(buffer),
            });
        }
        buffer.extend_from_slice(&chunk[..n]);
        match find_header_end(&buffer) {
            Some(header_end) => {
                // Content-Length 由客户端给出，可能接近 usize::MAX
                let expected = header_end.saturating_add(declared_length(&buffer[..header_end]));
                if expected > limit {
                    return Ok(RequestRead::TooLarge);
                }
                if buffer.len() >= expected {
                    return Ok(RequestRead::Complete(buffer));
                }
            }
            None if buffer.len() >= limit => return Ok(RequestRead::TooLarge),
            None => {}
        }
    }
}

/// 活跃连接计数守卫，任务结束（包括 panic）时归还计数
struct ConnectionGuard(Arc<AtomicU32>);

impl ConnectionGuard {
    fn new(counter: Arc<AtomicU32>) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// 空行之后第一个字节的位置
fn find_header_end(buffer: &[u8]) -> Option<usize> {
    buffer.windows(4).position(|w| w == b"\r\n\r\n").map(|p| p + 4)
}

fn declared_length(head: &[u8]) -> usize {
    String::from_utf8_lossy(head)
        .split("\r\n")
        .filter_map(|line| line.split_once(':'))
        .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
        .and_then(|(_, value)| value.trim().parse().ok())
        .unwrap_or(0)
}

/// 连接处理器：读取并解析请求，交给分发器，写回响应。
async fn handle_connection(
    stream: &mut TcpStream,
    id: u128,
    dispatcher: &Dispatcher,
    max_request_size: usize,
) {
    let buffer = match read_request(stream, max_request_size).await {
        Ok(RequestRead::Complete(b)) => b,
        Ok(RequestRead::Closed) => return, // 客户端主动关闭连接
        Ok(RequestRead::TooLarge) => {
            warn!("[ID{}]请求超过{}字节上限", id, max_request_size);
            let _ = stream.write_all(&Response::from_status_code(413).as_bytes()).await;
            return;
        }
        Err(e) => {
            error!("[ID{}]读取TCPStream时遇到错误: {}", id, e);
            return;
        }
    };
    debug!("[ID{}]HTTP请求接收完毕", id);

    let start_time = Instant::now();

    let request = match Request::try_from(&buffer, id) {
        Ok(req) => req,
        Err(e) => {
            error!("[ID{}]解析HTTP请求失败: {}", id, e);
            let _ = stream.write_all(&Response::response_400().as_bytes()).await;
            return;
        }
    };
    let version = *request.version();
    let method = request.method();
    let path = request.path().to_string();

    let response = match dispatcher.handle(request, id) {
        Ok(response) => response,
        Err(e) => {
            error!("[ID{}]分发请求时发生异常: {}", id, e);
            Response::response_500()
        }
    };

    debug!(
        "[ID{}]HTTP响应构建完成，服务端用时{}ms。",
        id,
        start_time.elapsed().as_millis()
    );
    info!(
        "[ID{}] {}, {}, {}, {}, {}",
        id,
        version,
        path,
        method,
        response.status_code(),
        response.information(),
    );

    let response_bytes = response.as_bytes();
    if let Err(e) = stream.write_all(&response_bytes).await {
        error!("[ID{}]发送响应失败: {}", id, e);
        return;
    }
    let _ = stream.flush().await;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_header_end() {
        assert_eq!(find_header_end(b"GET / HTTP/1.1\r\n\r\nbody"), Some(18));
        assert_eq!(find_header_end(b"GET / HTTP/1.1\r\n"), None);
    }

    #[test]
    fn test_declared_length() {
        assert_eq!(declared_length(b"POST / HTTP/1.1\r\ncontent-length: 12\r\n\r\n"), 12);
        assert_eq!(declared_length(b"POST / HTTP/1.1\r\nContent-Length:7\r\n\r\n"), 7);
        assert_eq!(declared_length(b"GET / HTTP/1.1\r\nHost: x\r\n\r\n"), 0);
    }

    async fn read_from(raw: Vec<u8>, limit: usize) -> RequestRead {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        // 写完即关闭写端，服务端读到 EOF
        let client = tokio::spawn(async move {
            let mut client = TcpStream::connect(addr).await.unwrap();
            let _ = client.write_all(&raw).await;
        });
        let (mut stream, _) = listener.accept().await.unwrap();
        let outcome = read_request(&mut stream, limit).await.unwrap();
        client.await.unwrap();
        outcome
    }

    #[tokio::test]
    async fn test_read_request_complete_body() {
        let raw = b"POST /echo HTTP/1.1\r\nContent-Length: 5\r\n\r\nhello".to_vec();
        assert_eq!(read_from(raw.clone(), 65536).await, RequestRead::Complete(raw));
    }

    #[tokio::test]
    async fn test_read_request_huge_content_length() {
        let raw = b"POST /echo HTTP/1.1\r\nContent-Length: 18446744073709551615\r\n\r\nx".to_vec();
        assert_eq!(read_from(raw, 65536).await, RequestRead::TooLarge);
    }

    #[tokio::test]
    async fn test_read_request_body_over_limit() {
        let raw = b"POST /echo HTTP/1.1\r\nContent-Length: 2000\r\n\r\nx".to_vec();
        assert_eq!(read_from(raw, 1024).await, RequestRead::TooLarge);
    }

    #[tokio::test]
    async fn test_read_request_headers_over_limit() {
        let mut raw = b"GET /ping HTTP/1.1\r\nX-Filler: ".to_vec();
        raw.extend(std::iter::repeat(b'a').take(2048));
        assert_eq!(read_from(raw, 1024).await, RequestRead::TooLarge);
    }

    #[tokio::test]
    async fn test_read_request_closed_without_data() {
        assert_eq!(read_from(Vec::new(), 65536).await, RequestRead::Closed);
    }

    #[test]
    fn test_connection_guard_releases_on_panic() {
        let counter = Arc::new(AtomicU32::new(0));
        let inner = Arc::clone(&counter);
        let result = std::panic::catch_unwind(move || {
            let _guard = ConnectionGuard::new(inner);
            panic!("连接任务异常");
        });

        assert!(result.is_err());
        assert_eq!(counter.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_demo_routes_validate() {
        let mut dispatcher = Dispatcher::new(webdispatch::Settings::default());
        demo::register(&mut dispatcher);
        assert!(dispatcher.validate().is_ok());

        let response = dispatcher
            .handle(Request::new(webdispatch::HttpRequestMethod::Get, "/"), 0)
            .unwrap();
        assert_eq!(response.status_code(), 302);
        assert_eq!(response.header("Location"), Some("/ping"));
    }
}
