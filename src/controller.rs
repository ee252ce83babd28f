// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # 控制器
//!
//! 每个请求由某个控制器的某个动作处理。控制器实例按请求创建、用后即弃，
//! 分发器在调用动作之前向其注入请求与全局设置，并先调用 `before` 钩子。
//!
//! 控制器通过名字注册到 `ControllerRegistry`，注册时保存其工厂与动作表，
//! 分发时不再做任何运行期的类型查找。

use std::collections::HashMap;
use std::sync::Arc;

use log::debug;

use crate::{
    exception::Exception,
    param::NOT_FOUND_ACTION,
    request::Request,
    response::ResponseDeclaration,
    settings::Settings,
};

/// 动作：修改控制器内部的响应声明，不返回值。
pub type Action<C> = fn(&mut C) -> Result<(), Exception>;

/// 所有控制器共有的状态：注入的请求、全局设置，以及待填写的响应声明。
#[derive(Debug, Default)]
pub struct ControllerBase {
    pub request: Request,
    pub settings: Arc<Settings>,
    pub response: ResponseDeclaration,
}

/// 控制器约定。
///
/// 实现者需要：无参构造（`Default`）、暴露 `ControllerBase`、提供动作表。
/// `before` 在每个动作之前运行，默认什么也不做；返回错误时动作不会被执行。
pub trait Controller: Default + Send + 'static {
    fn base(&self) -> &ControllerBase;

    fn base_mut(&mut self) -> &mut ControllerBase;

    /// 动作名到动作函数的映射
    fn actions() -> Vec<(&'static str, Action<Self>)>;

    fn before(&mut self) -> Result<(), Exception> {
        Ok(())
    }

    fn request(&self) -> &Request {
        &self.base().request
    }

    fn settings(&self) -> &Settings {
        &self.base().settings
    }

    fn response(&self) -> &ResponseDeclaration {
        &self.base().response
    }

    fn response_mut(&mut self) -> &mut ResponseDeclaration {
        &mut self.base_mut().response
    }
}

/// 一次请求中的控制器实例，已擦除具体类型。
pub trait ControllerInstance {
    fn inject(&mut self, request: Request, settings: Arc<Settings>);
    fn before(&mut self) -> Result<(), Exception>;
    fn run(&mut self, action: &str) -> Result<(), Exception>;
    fn into_declaration(self: Box<Self>) -> ResponseDeclaration;
}

/// 注册表中的一项：能创建实例，并知道自己有哪些动作。
pub trait ControllerFactory: Send + Sync {
    fn name(&self) -> &str;
    fn has_action(&self, action: &str) -> bool;
    fn instantiate(&self) -> Box<dyn ControllerInstance + '_>;
}

struct TypedFactory<C: Controller> {
    name: String,
    actions: HashMap<&'static str, Action<C>>,
}

struct TypedInstance<'a, C: Controller> {
    name: &'a str,
    controller: C,
    actions: &'a HashMap<&'static str, Action<C>>,
}

impl<C: Controller> ControllerFactory for TypedFactory<C> {
    fn name(&self) -> &str {
        &self.name
    }

    fn has_action(&self, action: &str) -> bool {
        self.actions.contains_key(action)
    }

    fn instantiate(&self) -> Box<dyn ControllerInstance + '_> {
        Box::new(TypedInstance {
            name: &self.name,
            controller: C::default(),
            actions: &self.actions,
        })
    }
}

impl<C: Controller> ControllerInstance for TypedInstance<'_, C> {
    fn inject(&mut self, request: Request, settings: Arc<Settings>) {
        let base = self.controller.base_mut();
        base.request = request;
        base.settings = settings;
    }

    fn before(&mut self) -> Result<(), Exception> {
        self.controller.before()
    }

    fn run(&mut self, action: &str) -> Result<(), Exception> {
        match self.actions.get(action) {
            Some(f) => f(&mut self.controller),
            None => Err(Exception::UnknownAction {
                controller: self.name.to_string(),
                action: action.to_string(),
            }),
        }
    }

    fn into_declaration(self: Box<Self>) -> ResponseDeclaration {
        let mut controller = self.controller;
        std::mem::take(&mut controller.base_mut().response)
    }
}

/// 控制器名到工厂的映射，只在启动阶段写入。
#[derive(Default)]
pub struct ControllerRegistry {
    factories: HashMap<String, Box<dyn ControllerFactory>>,
}

impl ControllerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 以给定名字注册控制器类型，同名注册会覆盖之前的条目
    pub fn register<C: Controller>(&mut self, name: &str) {
        let actions: HashMap<&'static str, Action<C>> = C::actions().into_iter().collect();
        debug!("注册控制器：{}（{}个动作）", name, actions.len());
        self.factories.insert(
            name.to_string(),
            Box::new(TypedFactory::<C> {
                name: name.to_string(),
                actions,
            }),
        );
    }

    pub fn resolve(&self, name: &str) -> Result<&dyn ControllerFactory, Exception> {
        self.factories
            .get(name)
            .map(|f| f.as_ref())
            .ok_or_else(|| Exception::UnresolvableController(name.to_string()))
    }
}

/// 内置错误控制器，兜底路由都指向它的 `not_found` 动作。
#[derive(Debug, Default)]
pub struct ErrorController {
    base: ControllerBase,
}

impl ErrorController {
    fn not_found(&mut self) -> Result<(), Exception> {
        let response = self.response_mut();
        response.http_status = 404;
        response.content_type = "text/plain".to_string();
        response.content = "404 - Page not found".to_string();
        Ok(())
    }
}

impl Controller for ErrorController {
    fn base(&self) -> &ControllerBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ControllerBase {
        &mut self.base
    }

    fn actions() -> Vec<(&'static str, Action<Self>)> {
        vec![(NOT_FOUND_ACTION, Self::not_found as Action<Self>)]
    }
}
