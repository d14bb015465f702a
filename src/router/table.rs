//! 运行时路由表
//!
//! `LiveRouter` 是注册表与导航器依赖的路由器接口，`RouteTable` 为其内存实现。

use std::cell::RefCell;
use std::collections::BTreeMap;

use tracing::debug;

use super::route::{ComponentRef, RouteDefinition, RouteMeta};
use super::transform::resolve_full_path;

// =========================================================
// 抽象接口
// =========================================================

/// 运行时路由器
///
/// 方法均为 `&self`：路由器在 store 与导航器之间共享，由实现自行处理内部可变性。
pub trait LiveRouter {
    /// 注册一棵顶层路由（含全部子路由）；同名路由被替换
    fn add_route(&self, route: &RouteDefinition);
    /// 按名称卸载路由及其子树，返回是否存在
    fn remove_route(&self, name: &str) -> bool;
    fn has_route(&self, name: &str) -> bool;
    /// 解析路径，返回从根到叶子的匹配链
    fn resolve(&self, path: &str) -> Option<Vec<MatchedRoute>>;
}

/// 匹配链中的一项
#[derive(Debug, Clone, PartialEq)]
pub struct MatchedRoute {
    pub name: String,
    pub full_path: String,
    pub component: Option<ComponentRef>,
    pub redirect: Option<String>,
    pub meta: Option<RouteMeta>,
    /// `:param` 段捕获的参数
    pub params: BTreeMap<String, String>,
}

// =========================================================
// 内存实现
// =========================================================

/// 内存路由表，顶层路由按注册顺序匹配
#[derive(Debug, Default)]
pub struct RouteTable {
    routes: RefCell<Vec<RouteDefinition>>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// 当前已注册的全部路由名称（前序）
    pub fn names(&self) -> Vec<String> {
        let routes = self.routes.borrow();
        let mut names = Vec::new();
        for route in routes.iter() {
            route.walk(&mut |r| names.push(r.name.clone()));
        }
        names
    }

    pub fn len(&self) -> usize {
        self.names().len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.borrow().is_empty()
    }
}

impl LiveRouter for RouteTable {
    fn add_route(&self, route: &RouteDefinition) {
        let mut routes = self.routes.borrow_mut();
        let mut names = Vec::new();
        route.walk(&mut |r| names.push(r.name.clone()));
        for name in &names {
            remove_named(&mut routes, name);
        }
        routes.push(route.clone());
        debug!(name = %route.name, path = %route.path, "route added");
    }

    fn remove_route(&self, name: &str) -> bool {
        let removed = remove_named(&mut self.routes.borrow_mut(), name);
        if removed {
            debug!(name, "route removed");
        }
        removed
    }

    fn has_route(&self, name: &str) -> bool {
        let routes = self.routes.borrow();
        let mut found = false;
        for route in routes.iter() {
            route.walk(&mut |r| found |= r.name == name);
        }
        found
    }

    fn resolve(&self, path: &str) -> Option<Vec<MatchedRoute>> {
        let target: Vec<&str> = segments(path).collect();
        let routes = self.routes.borrow();
        match_routes(&routes, "", &target)
    }
}

fn remove_named(routes: &mut Vec<RouteDefinition>, name: &str) -> bool {
    if let Some(index) = routes.iter().position(|r| r.name == name) {
        routes.remove(index);
        return true;
    }
    routes
        .iter_mut()
        .any(|r| remove_named(&mut r.children, name))
}

fn segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty())
}

/// 子路由优先匹配，保证空 path 的索引子路由先于父路由命中
fn match_routes(
    routes: &[RouteDefinition],
    parent_path: &str,
    target: &[&str],
) -> Option<Vec<MatchedRoute>> {
    for route in routes {
        let full_path = resolve_full_path(parent_path, &route.path);

        if let Some(mut chain) = match_routes(&route.children, &full_path, target) {
            let params = chain.first().map(|m| m.params.clone()).unwrap_or_default();
            chain.insert(0, matched(route, &full_path, params));
            return Some(chain);
        }

        if let Some(params) = match_pattern(&full_path, target) {
            return Some(vec![matched(route, &full_path, params)]);
        }
    }
    None
}

fn match_pattern(pattern: &str, target: &[&str]) -> Option<BTreeMap<String, String>> {
    let pattern: Vec<&str> = segments(pattern).collect();
    if pattern.len() != target.len() {
        return None;
    }
    let mut params = BTreeMap::new();
    for (expected, actual) in pattern.iter().zip(target) {
        match expected.strip_prefix(':') {
            Some(param) => {
                params.insert(param.to_string(), actual.to_string());
            }
            None if expected == actual => {}
            None => return None,
        }
    }
    Some(params)
}

fn matched(route: &RouteDefinition, full_path: &str, params: BTreeMap<String, String>) -> MatchedRoute {
    MatchedRoute {
        name: route.name.clone(),
        full_path: full_path.to_string(),
        component: route.component.clone(),
        redirect: route.redirect.clone(),
        meta: route.meta.clone(),
        params,
    }
}
