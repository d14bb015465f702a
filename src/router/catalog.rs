//! 视图目录
//!
//! 把后端 component 字符串映射到已注册的视图键，相当于构建期对 views 目录的预扫描。

use std::collections::BTreeSet;
use std::path::Path;

use tracing::debug;
use walkdir::WalkDir;

use crate::error::{RouteError, RouteResult};

/// 视图文件扩展名
pub const VIEW_EXTENSION: &str = "view";

/// 已注册视图的集合，键形如 `system/user/index.view`
#[derive(Debug, Clone, Default)]
pub struct ViewCatalog {
    views: BTreeSet<String>,
}

impl ViewCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// 由显式键列表构建
    pub fn from_keys<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            views: keys.into_iter().map(Into::into).collect(),
        }
    }

    /// 递归扫描视图目录，收集扩展名为 `extension` 的文件
    ///
    /// 文件 `<root>/system/user/index.vue` 以 `system/user/index.view` 注册，
    /// 即统一换成 [`VIEW_EXTENSION`] 作为目录内的键后缀。
    pub fn scan(root: &Path, extension: &str) -> RouteResult<Self> {
        let mut views = BTreeSet::new();
        for entry in WalkDir::new(root) {
            let entry = entry.map_err(|e| RouteError::Storage(e.to_string()))?;
            let path = entry.path();
            if !entry.file_type().is_file()
                || path.extension().and_then(|e| e.to_str()) != Some(extension)
            {
                continue;
            }
            let Ok(relative) = path.strip_prefix(root) else {
                continue;
            };
            let stem = relative.with_extension("");
            let key = stem
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");
            views.insert(format!("{}.{}", key, VIEW_EXTENSION));
        }
        debug!(root = %root.display(), count = views.len(), "scanned view catalog");
        Ok(Self { views })
    }

    pub fn register(&mut self, key: impl Into<String>) {
        self.views.insert(key.into());
    }

    pub fn contains(&self, key: &str) -> bool {
        self.views.contains(key)
    }

    pub fn len(&self) -> usize {
        self.views.len()
    }

    pub fn is_empty(&self) -> bool {
        self.views.is_empty()
    }

    /// 依次尝试 `<component>.view` 与 `<component>/index.view`，首个命中者胜出
    pub fn lookup(&self, component: &str) -> Option<String> {
        let normalized = component.strip_prefix('/').unwrap_or(component);
        let candidates = [
            format!("{}.{}", normalized, VIEW_EXTENSION),
            format!("{}/index.{}", normalized, VIEW_EXTENSION),
        ];
        candidates.into_iter().find(|key| self.views.contains(key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_lookup_order() {
        let catalog = ViewCatalog::from_keys([
            "dashboard/index.view",
            "system/user.view",
            "system/user/index.view",
        ]);

        assert_eq!(catalog.lookup("system/user").as_deref(), Some("system/user.view"));
        assert_eq!(catalog.lookup("/dashboard").as_deref(), Some("dashboard/index.view"));
        assert_eq!(catalog.lookup("missing"), None);
    }

    #[test]
    fn test_scan_directory() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("system/role")).unwrap();
        fs::write(root.join("system/role/index.vue"), "").unwrap();
        fs::write(root.join("about.vue"), "").unwrap();
        fs::write(root.join("notes.md"), "").unwrap();

        let catalog = ViewCatalog::scan(root, "vue").unwrap();
        assert_eq!(catalog.len(), 2);
        assert!(catalog.contains("system/role/index.view"));
        assert_eq!(catalog.lookup("about").as_deref(), Some("about.view"));
        assert_eq!(catalog.lookup("system/role").as_deref(), Some("system/role/index.view"));
    }
}
