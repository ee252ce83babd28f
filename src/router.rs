// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # 路由表
//!
//! 保存按注册顺序排列的路由条目，将 `(方法, 路径)` 映射到 `(控制器名, 动作名)`。
//!
//! ## 匹配规则
//! - 方法必须相等，路径按字符串精确比较（不做参数提取，查询串由 `Request` 预先剥离）。
//! - 存在多条相同注册时，先注册者胜出。
//! - 没有用户路由命中时返回该方法的兜底路由。兜底路由在路由表创建时为每个方法各注册一条，
//!   因此查找永远不会失败，分发器也不需要"找不到路由"的分支。

use log::debug;

use crate::param::{HttpRequestMethod, NOT_FOUND_PATH};

/// 一条不可变的路由记录。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    verb: HttpRequestMethod,
    path: String,
    controller: String,
    action: String,
}

impl Route {
    pub fn new(verb: HttpRequestMethod, path: &str, controller: &str, action: &str) -> Self {
        Self {
            verb,
            path: path.to_string(),
            controller: controller.to_string(),
            action: action.to_string(),
        }
    }

    pub fn verb(&self) -> HttpRequestMethod {
        self.verb
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn controller(&self) -> &str {
        &self.controller
    }

    pub fn action(&self) -> &str {
        &self.action
    }

    fn matches(&self, path: &str, verb: HttpRequestMethod) -> bool {
        self.verb == verb && self.path == path
    }
}

/// 路由查找结果。两种情况都携带一条可直接分发的路由。
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RouteMatch<'a> {
    /// 命中了用户注册的路由
    Matched(&'a Route),
    /// 未命中，返回该方法的兜底路由
    Fallback(&'a Route),
}

impl<'a> RouteMatch<'a> {
    pub fn route(&self) -> &'a Route {
        match *self {
            RouteMatch::Matched(route) | RouteMatch::Fallback(route) => route,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, RouteMatch::Fallback(_))
    }
}

/// 有序路由表。只追加，不删除、不修改已有条目。
#[derive(Debug, Clone)]
pub struct RouteTable {
    routes: Vec<Route>,
    /// 每个方法的兜底路由在 `routes` 中的下标，按 `HttpRequestMethod::index` 排列
    fallbacks: [usize; 4],
}

impl RouteTable {
    /// 创建路由表，并立即为每个方法注册指向 `controller#action` 的兜底路由。
    pub fn new(fallback_controller: &str, fallback_action: &str) -> Self {
        let mut table = Self {
            routes: Vec::new(),
            fallbacks: [0; 4],
        };
        for verb in HttpRequestMethod::ALL {
            table.fallbacks[verb.index()] = table.routes.len();
            table.add_route(verb, NOT_FOUND_PATH, fallback_controller, fallback_action);
        }
        table
    }

    /// 追加一条路由。不检查重复，总是成功。
    pub fn add_route(
        &mut self,
        verb: HttpRequestMethod,
        path: &str,
        controller: &str,
        action: &str,
    ) {
        debug!("注册路由：{} {} -> {}#{}", verb, path, controller, action);
        self.routes.push(Route::new(verb, path, controller, action));
    }

    /// 为固定方法集合中的每个方法各追加一条路由（GET、POST、DELETE、PUT）。
    pub fn add_route_for_all_verbs(&mut self, path: &str, controller: &str, action: &str) {
        for verb in HttpRequestMethod::ALL {
            self.add_route(verb, path, controller, action);
        }
    }

    /// 查找路由，找不到时返回该方法的兜底路由。
    pub fn find_route(&self, path: &str, verb: HttpRequestMethod) -> RouteMatch<'_> {
        let fallback = self.fallbacks[verb.index()];
        match self
            .routes
            .iter()
            .enumerate()
            .find(|(i, route)| *i != fallback && route.matches(path, verb))
        {
            Some((_, route)) => RouteMatch::Matched(route),
            None => RouteMatch::Fallback(&self.routes[fallback]),
        }
    }

    /// 全部路由（含兜底路由），按注册顺序
    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}
