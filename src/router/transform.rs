//! 菜单树 -> 路由树转换
//!
//! 纯函数：不持有状态，每次拉取菜单后整体重建路由树。

use admin_router_shared::{LAYOUT_COMPONENT, LAYOUT_ROUTE_NAME, MenuRecord, MenuType};
use tracing::warn;

use super::catalog::ViewCatalog;
use super::route::{ComponentRef, RouteDefinition, RouteMeta};

/// 批量转换后端菜单记录
///
/// - 过滤按钮节点
/// - 兄弟节点按 `order_num` 稳定升序，缺省值排在最后
/// - `is_root` 为 true 且结果中没有 `/` 或布局路由时，包一层合成的布局根路由
pub fn transform(records: &[MenuRecord], is_root: bool, catalog: &ViewCatalog) -> Vec<RouteDefinition> {
    if records.is_empty() {
        return Vec::new();
    }

    let mut sorted: Vec<&MenuRecord> = records.iter().collect();
    sorted.sort_by_key(|r| r.order_num.unwrap_or(i64::MAX));

    let routes: Vec<RouteDefinition> = sorted
        .into_iter()
        .filter(|r| r.menu_type.is_navigable())
        .map(|r| transform_single(r, catalog))
        .collect();

    if !is_root || routes.iter().any(is_layout_root) {
        return routes;
    }
    if routes.is_empty() {
        return routes;
    }

    let redirect = find_first_navigable_path(&routes, "");
    let mut layout = RouteDefinition::new("/", LAYOUT_ROUTE_NAME)
        .with_component(ComponentRef::Layout)
        .with_children(routes);
    layout.redirect = redirect;
    vec![layout]
}

fn is_layout_root(route: &RouteDefinition) -> bool {
    route.path == "/" || route.name == LAYOUT_ROUTE_NAME
}

fn transform_single(record: &MenuRecord, catalog: &ViewCatalog) -> RouteDefinition {
    let children = transform(&record.children, false, catalog);

    RouteDefinition {
        path: record.path.clone(),
        // 未提供 name 时退回 id，保证每条路由都能按名称精确卸载
        name: record.name.clone().unwrap_or_else(|| record.id.clone()),
        component: resolve_component(record, catalog),
        redirect: record.redirect.clone().filter(|r| !r.is_empty()),
        children,
        meta: build_meta(record),
    }
}

/// 解析路由组件
///
/// - `Layout` 哨兵强制使用主布局
/// - 其它字符串依次匹配 `<component>.view`、`<component>/index.view`
/// - 目录且未指定组件时使用主布局
/// - 未命中时降级到 404 视图
fn resolve_component(record: &MenuRecord, catalog: &ViewCatalog) -> Option<ComponentRef> {
    match record.component.as_deref().filter(|c| !c.is_empty()) {
        Some(LAYOUT_COMPONENT) => Some(ComponentRef::Layout),
        Some(component) => match catalog.lookup(component) {
            Some(key) => Some(ComponentRef::View(key)),
            None => {
                warn!(
                    component,
                    menu_id = %record.id,
                    "view not found, falling back to 404 view"
                );
                Some(ComponentRef::NotFound)
            }
        },
        None if record.menu_type == MenuType::Directory => Some(ComponentRef::Layout),
        None => None,
    }
}

fn build_meta(record: &MenuRecord) -> Option<RouteMeta> {
    let mut meta = RouteMeta::default();

    if let Some(menu) = &record.meta_menu {
        meta.title = menu.title.clone().filter(|t| !t.is_empty());
        meta.icon = menu.icon.clone().filter(|i| !i.is_empty());
        meta.hidden = menu.hidden;
        meta.keep_alive = menu.keep_alive;
        meta.affix = menu.affix;
        meta.iframe = menu.iframe;
        meta.external_url = menu.external_url.clone().filter(|u| !u.is_empty());
        meta.perms = menu.perms.clone().filter(|p| !p.is_empty());
        meta.scrollable = menu.scrollable;
    }
    meta.order = record.order_num;

    if meta.is_empty() { None } else { Some(meta) }
}

/// 深度优先寻找首个可导航路径
///
/// 按兄弟顺序遍历：遇到字面 redirect 直接采用；遇到有组件的叶子返回其完整路径；
/// 否则进入子树继续查找。
pub fn find_first_navigable_path(routes: &[RouteDefinition], parent_path: &str) -> Option<String> {
    for route in routes {
        if let Some(redirect) = &route.redirect {
            return Some(redirect.clone());
        }
        let current = resolve_full_path(parent_path, &route.path);
        if route.children.is_empty() {
            if route.component.is_some() {
                return Some(current);
            }
        } else if let Some(found) = find_first_navigable_path(&route.children, &current) {
            return Some(found);
        }
    }
    None
}

/// 侧边栏使用的一级路由：布局路由的 children，不存在时返回原数组
pub fn resolve_sidebar_routes(routes: &[RouteDefinition]) -> Vec<RouteDefinition> {
    match routes.iter().find(|r| is_layout_root(r)) {
        Some(layout) if !layout.children.is_empty() => layout.children.clone(),
        _ => routes.to_vec(),
    }
}

/// 前序收集全部路由名称，去重并保留首次出现的顺序
pub fn collect_route_names(routes: &[RouteDefinition]) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for route in routes {
        route.walk(&mut |r| {
            if !r.name.is_empty() && !names.iter().any(|n| n == &r.name) {
                names.push(r.name.clone());
            }
        });
    }
    names
}

/// 拼接父子路由的 path
pub fn resolve_full_path(base: &str, path: &str) -> String {
    if path.is_empty() {
        return if base.is_empty() { "/".to_string() } else { base.to_string() };
    }
    if path.starts_with('/') {
        return path.to_string();
    }
    let cleaned_base = base.strip_suffix('/').unwrap_or(base);
    let joined = format!("{}/{}", cleaned_base, path);

    let mut out = String::with_capacity(joined.len());
    for ch in joined.chars() {
        if ch == '/' && out.ends_with('/') {
            continue;
        }
        out.push(ch);
    }
    out
}
