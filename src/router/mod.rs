//! 路由层：路由模型、导航目标、视图目录、菜单转换与运行时路由表

pub mod catalog;
pub mod location;
pub mod route;
pub mod table;
pub mod transform;

pub use catalog::ViewCatalog;
pub use location::Location;
pub use route::{ComponentRef, RouteDefinition, RouteMeta, basic_routes};
pub use table::{LiveRouter, MatchedRoute, RouteTable};
pub use transform::{
    collect_route_names, find_first_navigable_path, resolve_full_path, resolve_sidebar_routes,
    transform,
};
