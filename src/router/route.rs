//! 路由定义模块 - 领域模型
//!
//! 纯数据层：由后端菜单树转换而来的可导航路由，以及免登录的基础路由。

use serde::{Deserialize, Serialize};

use crate::config::{LOGIN_PATH, NO_PERMISSION_PATH, NOT_FOUND_PATH, SERVER_ERROR_PATH};

/// 路由绑定的视图
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "key")]
pub enum ComponentRef {
    /// 共享主布局（头部 / 侧边栏 / 内容区）
    Layout,
    /// 视图目录中的某个视图
    View(String),
    /// 组件无法解析时的兜底 404 视图
    NotFound,
}

/// 路由元信息，缺省字段不输出
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteMeta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hidden: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keep_alive: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub affix: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iframe: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub perms: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scrollable: Option<bool>,
}

impl RouteMeta {
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == RouteMeta::default()
    }
}

/// 可导航路由定义
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteDefinition {
    pub path: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub component: Option<ComponentRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redirect: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<RouteDefinition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<RouteMeta>,
}

impl RouteDefinition {
    pub fn new(path: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            name: name.into(),
            component: None,
            redirect: None,
            children: Vec::new(),
            meta: None,
        }
    }

    pub fn with_component(mut self, component: ComponentRef) -> Self {
        self.component = Some(component);
        self
    }

    pub fn with_redirect(mut self, redirect: impl Into<String>) -> Self {
        self.redirect = Some(redirect.into());
        self
    }

    pub fn with_children(mut self, children: Vec<RouteDefinition>) -> Self {
        self.children = children;
        self
    }

    pub fn with_meta(mut self, meta: RouteMeta) -> Self {
        self.meta = Some(meta);
        self
    }

    pub fn title(&self) -> Option<&str> {
        self.meta.as_ref().and_then(|m| m.title.as_deref())
    }

    /// 前序遍历：先自身，再按兄弟顺序遍历子树
    pub fn walk<'a>(&'a self, visit: &mut impl FnMut(&'a RouteDefinition)) {
        visit(self);
        for child in &self.children {
            child.walk(visit);
        }
    }
}

fn hidden_page(path: &str, name: &str, view: &str, title: &str) -> RouteDefinition {
    RouteDefinition::new(path, name)
        .with_component(ComponentRef::View(view.to_string()))
        .with_meta(RouteMeta {
            hidden: Some(true),
            ..RouteMeta::titled(title)
        })
}

/// 基础路由：不需要登录即可访问，或者属于布局之外的页面
pub fn basic_routes() -> Vec<RouteDefinition> {
    vec![
        hidden_page(LOGIN_PATH, "Login", "login/index.view", "登录"),
        hidden_page(NO_PERMISSION_PATH, "NoPermission", "error/403.view", "无权限"),
        hidden_page(NOT_FOUND_PATH, "NotFound", "error/404.view", "页面未找到"),
        hidden_page(SERVER_ERROR_PATH, "ServerError", "error/500.view", "服务器错误"),
    ]
}
