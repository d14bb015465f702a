//! 导航目标
//!
//! `path?query` 形式的位置，query 值按百分号编码。

use std::collections::BTreeMap;
use std::fmt;

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, percent_decode_str, utf8_percent_encode};

/// 导航目标位置
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Location {
    pub path: String,
    pub query: BTreeMap<String, String>,
    /// true 表示替换当前历史记录而不是压栈
    pub replace: bool,
}

impl Location {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Default::default()
        }
    }

    /// 解析 `path?k=v&k2=v2`
    pub fn parse(raw: &str) -> Self {
        let (path, query) = match raw.split_once('?') {
            Some((path, query)) => (path, Some(query)),
            None => (raw, None),
        };
        let path = if path.is_empty() { "/" } else { path };

        let mut location = Self::new(path);
        for pair in query.into_iter().flat_map(|q| q.split('&')) {
            if pair.is_empty() {
                continue;
            }
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            location.query.insert(decode(key), decode(value));
        }
        location
    }

    pub fn with_query(mut self, key: &str, value: impl Into<String>) -> Self {
        self.query.insert(key.to_string(), value.into());
        self
    }

    pub fn replaced(mut self) -> Self {
        self.replace = true;
        self
    }

    pub fn query_value(&self, key: &str) -> Option<&str> {
        self.query.get(key).map(String::as_str)
    }

    /// 完整路径（含编码后的 query）
    pub fn full_path(&self) -> String {
        if self.query.is_empty() {
            return self.path.clone();
        }
        let query = self
            .query
            .iter()
            .map(|(k, v)| format!("{}={}", encode(k), encode(v)))
            .collect::<Vec<_>>()
            .join("&");
        format!("{}?{}", self.path, query)
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.full_path())
    }
}

impl From<&str> for Location {
    fn from(raw: &str) -> Self {
        Self::parse(raw)
    }
}

impl From<String> for Location {
    fn from(raw: String) -> Self {
        Self::parse(&raw)
    }
}

/// 未保留字符与 `/` 原样保留，其余全部编码
const QUERY_VALUE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~')
    .remove(b'/');

fn encode(raw: &str) -> String {
    utf8_percent_encode(raw, QUERY_VALUE).to_string()
}

/// `+` 视为空格；非法的 `%` 序列原样保留
fn decode(raw: &str) -> String {
    percent_decode_str(&raw.replace('+', " "))
        .decode_utf8_lossy()
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_full_path() {
        let location = Location::parse("/users?page=2&keyword=a%20b");
        assert_eq!(location.path, "/users");
        assert_eq!(location.query_value("page"), Some("2"));
        assert_eq!(location.query_value("keyword"), Some("a b"));
        assert_eq!(location.full_path(), "/users?keyword=a%20b&page=2");
    }

    #[test]
    fn test_nested_redirect_survives_encoding() {
        let target = Location::parse("/settings/menu?tab=1&x=y");
        let login = Location::new("/login").with_query("redirect", target.full_path());
        assert_eq!(login.full_path(), "/login?redirect=/settings/menu%3Ftab%3D1%26x%3Dy");

        let parsed = Location::parse(&login.full_path());
        assert_eq!(parsed.query_value("redirect"), Some("/settings/menu?tab=1&x=y"));
    }

    #[test]
    fn test_edge_inputs() {
        assert_eq!(Location::parse("").path, "/");
        assert_eq!(Location::parse("/a?").full_path(), "/a");
        assert_eq!(Location::parse("/a?flag").query_value("flag"), Some(""));
        assert_eq!(Location::parse("/a?bad=%zz%").query_value("bad"), Some("%zz%"));
        assert_eq!(Location::parse("/a?q=a+b%2Bc").query_value("q"), Some("a b+c"));
        assert_eq!(Location::new("/a").with_query("q", "中 文").full_path(), "/a?q=%E4%B8%AD%20%E6%96%87");
    }
}
