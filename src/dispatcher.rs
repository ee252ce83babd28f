// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # 请求分发器
//!
//! 驱动单个请求从"方法 + 路径"走到传输层响应：
//!
//! ```text
//! Request
//!     → RouteTable::find_route   （总能得到一条路由，未命中时为兜底路由）
//!     → ControllerRegistry::resolve
//!     → 实例化控制器 → 注入请求与设置
//!     → before 钩子 → 动作
//!     → 读取响应声明 → 用 content_type 覆盖 Content-Type
//!     → Response
//! ```
//!
//! 注册阶段需要 `&mut Dispatcher`，服务阶段只需要 `&Dispatcher`，
//! 因此放进 `Arc` 之后路由表与注册表就不会再被修改。

use std::sync::Arc;

use log::{debug, error, warn};

use crate::{
    controller::{Controller, ControllerRegistry, ErrorController},
    exception::Exception,
    param::{HttpRequestMethod, ERROR_CONTROLLER, NOT_FOUND_ACTION},
    request::Request,
    response::{set_header, Response},
    router::RouteTable,
    settings::Settings,
};

pub struct Dispatcher {
    routes: RouteTable,
    controllers: ControllerRegistry,
    settings: Arc<Settings>,
}

impl Dispatcher {
    /// 创建分发器：建立带兜底路由的路由表，注册内置错误控制器，保存全局设置。
    pub fn new(settings: Settings) -> Self {
        let mut controllers = ControllerRegistry::new();
        controllers.register::<ErrorController>(ERROR_CONTROLLER);
        Self {
            routes: RouteTable::new(ERROR_CONTROLLER, NOT_FOUND_ACTION),
            controllers,
            settings: Arc::new(settings),
        }
    }

    /// 以名字注册一个控制器类型，供路由引用
    pub fn register_controller<C: Controller>(&mut self, name: &str) -> &mut Self {
        self.controllers.register::<C>(name);
        self
    }

    pub fn add_route(
        &mut self,
        verb: HttpRequestMethod,
        path: &str,
        controller: &str,
        action: &str,
    ) -> &mut Self {
        self.routes.add_route(verb, path, controller, action);
        self
    }

    pub fn add_route_for_all_verbs(
        &mut self,
        path: &str,
        controller: &str,
        action: &str,
    ) -> &mut Self {
        self.routes.add_route_for_all_verbs(path, controller, action);
        self
    }

    /// 检查每条路由引用的控制器与动作都已注册。
    ///
    /// 应在开始服务前调用一次；失败说明路由注册代码有误。
    pub fn validate(&self) -> Result<(), Exception> {
        for route in self.routes.routes() {
            let factory = self.controllers.resolve(route.controller())?;
            if !factory.has_action(route.action()) {
                return Err(Exception::UnknownAction {
                    controller: route.controller().to_string(),
                    action: route.action().to_string(),
                });
            }
        }
        Ok(())
    }

    /// 处理一个请求。
    ///
    /// 找不到路由不是错误（返回 404 响应）。返回的错误只有：控制器或动作无法解析、
    /// `before` 钩子或动作执行失败。钩子失败时动作不会被执行。
    pub fn handle(&self, request: Request, id: u128) -> Result<Response, Exception> {
        let verb = request.method();
        let found = self.routes.find_route(request.path(), verb);
        let route = found.route();
        if found.is_fallback() {
            warn!("[ID{}]没有匹配 {} {} 的路由，使用兜底路由", id, verb, request.path());
        } else {
            debug!(
                "[ID{}]{} {} -> {}#{}",
                id,
                verb,
                request.path(),
                route.controller(),
                route.action()
            );
        }

        let factory = match self.controllers.resolve(route.controller()) {
            Ok(f) => f,
            Err(e) => {
                error!("[ID{}]路由引用了未注册的控制器：{}", id, route.controller());
                return Err(e);
            }
        };

        let mut controller = factory.instantiate();
        controller.inject(request, Arc::clone(&self.settings));

        if let Err(e) = controller.before() {
            error!("[ID{}]{}的before钩子执行失败：{}", id, route.controller(), e);
            return Err(e);
        }
        if let Err(e) = controller.run(route.action()) {
            error!("[ID{}]{}#{}执行失败：{}", id, route.controller(), route.action(), e);
            return Err(e);
        }

        let mut declaration = controller.into_declaration();
        let content_type = declaration.content_type.clone();
        set_header(&mut declaration.headers, "Content-Type", &content_type);

        Ok(Response::from(declaration))
    }

    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }
}
