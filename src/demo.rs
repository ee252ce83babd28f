// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! 随服务器一起提供的示例控制器与路由。

use serde_json::json;

use webdispatch::{
    Action, Controller, ControllerBase, Dispatcher, Exception, HttpRequestMethod,
};

/// `GET /ping` → `ok`
#[derive(Default)]
pub struct PingController {
    base: ControllerBase,
}

impl PingController {
    fn pong(&mut self) -> Result<(), Exception> {
        let response = self.response_mut();
        response.content = "ok".to_string();
        response.http_status = 200;
        response.content_type = "text/plain".to_string();
        Ok(())
    }
}

impl Controller for PingController {
    fn base(&self) -> &ControllerBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ControllerBase {
        &mut self.base
    }

    fn actions() -> Vec<(&'static str, Action<Self>)> {
        vec![("pong", Self::pong as Action<Self>)]
    }
}

/// `POST /echo` 以 JSON 回显请求体与查询串
#[derive(Default)]
pub struct EchoController {
    base: ControllerBase,
}

impl EchoController {
    fn echo(&mut self) -> Result<(), Exception> {
        let request = self.request();
        let body = json!({
            "method": request.method().to_string(),
            "path": request.path(),
            "query": request.query(),
            "body": request.body(),
            "app": self.settings().get_str("app_name"),
        });
        let response = self.response_mut();
        response.content = body.to_string();
        response.content_type = "application/json".to_string();
        Ok(())
    }
}

impl Controller for EchoController {
    fn base(&self) -> &ControllerBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ControllerBase {
        &mut self.base
    }

    fn actions() -> Vec<(&'static str, Action<Self>)> {
        vec![("echo", Self::echo as Action<Self>)]
    }
}

/// `GET /` 重定向到 `/ping`
#[derive(Default)]
pub struct HomeController {
    base: ControllerBase,
}

impl HomeController {
    fn index(&mut self) -> Result<(), Exception> {
        self.response_mut().redirect_to("/ping");
        Ok(())
    }
}

impl Controller for HomeController {
    fn base(&self) -> &ControllerBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ControllerBase {
        &mut self.base
    }

    fn actions() -> Vec<(&'static str, Action<Self>)> {
        vec![("index", Self::index as Action<Self>)]
    }
}

/// 注册示例控制器与路由
pub fn register(dispatcher: &mut Dispatcher) {
    dispatcher
        .register_controller::<PingController>("PingController")
        .register_controller::<EchoController>("EchoController")
        .register_controller::<HomeController>("HomeController")
        .add_route(HttpRequestMethod::Get, "/", "HomeController", "index")
        .add_route(HttpRequestMethod::Get, "/ping", "PingController", "pong")
        .add_route(HttpRequestMethod::Post, "/echo", "EchoController", "echo");
}
