use serde::{Deserialize, Serialize};

pub mod date;
pub mod protocol;

pub use date::Timestamp;

// =========================================================
// 常量定义 (Constants)
// =========================================================

pub const HEADER_AUTHORIZATION: &str = "Authorization";
pub const DEFAULT_TOKEN_TYPE: &str = "Bearer";

/// 后端 component 字段的哨兵值：使用主布局
pub const LAYOUT_COMPONENT: &str = "Layout";
/// 主布局路由的名称
pub const LAYOUT_ROUTE_NAME: &str = "Layout";

// =========================================================
// 菜单模型 (Menu Models)
// =========================================================

/// 菜单类型：1 目录 2 页面 3 按钮
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum MenuType {
    Directory,
    Page,
    Button,
}

impl MenuType {
    /// 按钮节点只携带权限码，永远不会成为可导航路由
    pub fn is_navigable(&self) -> bool {
        !matches!(self, MenuType::Button)
    }
}

impl TryFrom<u8> for MenuType {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(MenuType::Directory),
            2 => Ok(MenuType::Page),
            3 => Ok(MenuType::Button),
            other => Err(format!("unknown menu type: {}", other)),
        }
    }
}

impl From<MenuType> for u8 {
    fn from(value: MenuType) -> Self {
        match value {
            MenuType::Directory => 1,
            MenuType::Page => 2,
            MenuType::Button => 3,
        }
    }
}

/// 菜单元信息
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetaMenu {
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
    /// 页面级权限编码
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub perms: Option<String>,
    /// 内容区是否允许纵向滚动
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scrollable: Option<bool>,
}

/// 后端返回的菜单节点（目录 / 页面 / 按钮）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuRecord {
    pub id: String,
    #[serde(default)]
    pub parent_id: Option<String>,
    #[serde(rename = "type")]
    pub menu_type: MenuType,
    #[serde(default)]
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub component: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redirect: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_num: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta_menu: Option<MetaMenu>,
    #[serde(default)]
    pub children: Vec<MenuRecord>,
}

impl MenuRecord {
    pub fn new(id: impl Into<String>, menu_type: MenuType, path: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            parent_id: None,
            menu_type,
            path: path.into(),
            name: None,
            component: None,
            redirect: None,
            order_num: None,
            meta_menu: None,
            children: Vec::new(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_component(mut self, component: impl Into<String>) -> Self {
        self.component = Some(component.into());
        self
    }

    pub fn with_redirect(mut self, redirect: impl Into<String>) -> Self {
        self.redirect = Some(redirect.into());
        self
    }

    pub fn with_order(mut self, order: i64) -> Self {
        self.order_num = Some(order);
        self
    }

    pub fn with_meta(mut self, meta: MetaMenu) -> Self {
        self.meta_menu = Some(meta);
        self
    }

    pub fn with_children(mut self, children: Vec<MenuRecord>) -> Self {
        self.children = children;
        self
    }
}

// =========================================================
// 认证模型 (Auth Models)
// =========================================================

/// 登录请求参数
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginParams {
    pub username: String,
    pub password: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub captcha: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub captcha_uuid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remember: Option<bool>,
}

impl LoginParams {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            ..Default::default()
        }
    }
}

/// 当前用户快照
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserInfo {
    pub user_id: String,
    pub username: String,
    #[serde(default)]
    pub nickname: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
}

/// 登录接口返回数据
///
/// `expires_in` 为秒数，缺省视为 0（立即过期）。
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginPayload {
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_in: Option<i64>,
    #[serde(default)]
    pub roles: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<UserInfo>,
}
