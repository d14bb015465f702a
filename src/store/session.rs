//! 会话状态
//!
//! token、过期时间、角色与当前用户快照；可通过 `Persistence` 跨刷新恢复。

use std::cell::RefCell;
use std::collections::BTreeSet;
use std::rc::Rc;

use admin_router_shared::{DEFAULT_TOKEN_TYPE, LoginPayload, Timestamp, UserInfo};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::clock::Clock;
use crate::storage::Persistence;

/// 会话快照
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionState {
    pub access_token: String,
    pub token_type: String,
    /// 绝对过期时间（毫秒）
    pub expires_at: Timestamp,
    #[serde(default)]
    pub roles: BTreeSet<String>,
    #[serde(default)]
    pub principal: Option<UserInfo>,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            access_token: String::new(),
            token_type: DEFAULT_TOKEN_TYPE.to_string(),
            expires_at: Timestamp::default(),
            roles: BTreeSet::new(),
            principal: None,
        }
    }
}

impl SessionState {
    /// 由登录返回构建会话，`expires_in` 缺省按 0 秒处理
    pub fn from_login(payload: LoginPayload, now: Timestamp) -> Self {
        let token_type = payload
            .token_type
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| DEFAULT_TOKEN_TYPE.to_string());
        Self {
            access_token: payload.access_token,
            token_type,
            expires_at: now.add_secs(payload.expires_in.unwrap_or(0)),
            roles: payload.roles.into_iter().collect(),
            principal: payload.user,
        }
    }

    pub fn is_logged_in(&self, now: Timestamp) -> bool {
        !self.access_token.is_empty() && now < self.expires_at
    }
}

/// 会话存储句柄，克隆后共享同一份状态
#[derive(Clone)]
pub struct SessionStore {
    state: Rc<RefCell<SessionState>>,
    persistence: Rc<dyn Persistence>,
    clock: Rc<dyn Clock>,
    key: String,
}

impl SessionStore {
    /// 创建并尝试从持久化中恢复
    pub fn new(persistence: Rc<dyn Persistence>, clock: Rc<dyn Clock>, key: impl Into<String>) -> Self {
        let store = Self {
            state: Rc::new(RefCell::new(SessionState::default())),
            persistence,
            clock,
            key: key.into(),
        };
        store.restore();
        store
    }

    pub fn now(&self) -> Timestamp {
        self.clock.now()
    }

    pub fn is_logged_in(&self) -> bool {
        self.state.borrow().is_logged_in(self.clock.now())
    }

    /// `Authorization` 请求头的值，没有 token 时为 `None`
    pub fn auth_header(&self) -> Option<String> {
        let state = self.state.borrow();
        if state.access_token.is_empty() {
            return None;
        }
        let token_type = if state.token_type.is_empty() {
            DEFAULT_TOKEN_TYPE
        } else {
            state.token_type.as_str()
        };
        Some(format!("{} {}", token_type, state.access_token))
    }

    pub fn snapshot(&self) -> SessionState {
        self.state.borrow().clone()
    }

    pub fn roles(&self) -> BTreeSet<String> {
        self.state.borrow().roles.clone()
    }

    pub fn principal(&self) -> Option<UserInfo> {
        self.state.borrow().principal.clone()
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.state.borrow().roles.contains(role)
    }

    /// 整体替换会话并持久化
    pub fn replace(&self, next: SessionState) {
        *self.state.borrow_mut() = next;
        self.persist();
    }

    /// 从持久化恢复；读不到或格式不符时保持空会话
    pub fn restore(&self) {
        let Some(value) = self.persistence.get(&self.key) else {
            return;
        };
        match serde_json::from_value::<SessionState>(value) {
            Ok(state) => {
                debug!(key = %self.key, "session restored");
                *self.state.borrow_mut() = state;
            }
            Err(e) => {
                debug!(key = %self.key, error = %e, "discarding unreadable session");
                self.persistence.remove(&self.key);
            }
        }
    }

    /// 以剩余有效期作为过期时间写入持久化
    pub fn persist(&self) {
        let state = self.state.borrow();
        if state.access_token.is_empty() {
            self.persistence.remove(&self.key);
            return;
        }
        let lifetime = state.expires_at - self.clock.now();
        match serde_json::to_value(&*state) {
            Ok(value) => self.persistence.set(&self.key, value, Some(lifetime)),
            Err(e) => debug!(key = %self.key, error = %e, "failed to encode session"),
        }
    }

    /// 清空会话（含持久化）
    pub fn clear(&self) {
        *self.state.borrow_mut() = SessionState::default();
        self.persistence.remove(&self.key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::storage::{ExpiringStorage, MemoryStorage, StorageBackend};

    const NOW: i64 = 1_700_000_000_000;

    fn setup() -> (SessionStore, MemoryStorage, Rc<ManualClock>) {
        let backend = MemoryStorage::new();
        let clock = Rc::new(ManualClock::new(NOW));
        let persistence = Rc::new(ExpiringStorage::new(backend.clone(), "", clock.clone()));
        let store = SessionStore::new(persistence, clock.clone(), "auth");
        (store, backend, clock)
    }

    fn session(expires_at: i64) -> SessionState {
        SessionState {
            access_token: "token".into(),
            expires_at: Timestamp::new(expires_at),
            ..Default::default()
        }
    }

    #[test]
    fn test_expiry_boundary() {
        let now = Timestamp::new(NOW);
        assert!(!session(NOW - 1).is_logged_in(now));
        assert!(session(NOW + 60_000).is_logged_in(now));
        assert!(!session(NOW).is_logged_in(now));
        assert!(!SessionState::default().is_logged_in(now));
    }

    #[test]
    fn test_from_login_defaults() {
        let payload = LoginPayload {
            access_token: "abc".into(),
            roles: vec!["admin".into(), "admin".into()],
            ..Default::default()
        };
        let state = SessionState::from_login(payload, Timestamp::new(NOW));
        assert_eq!(state.token_type, "Bearer");
        assert_eq!(state.expires_at, Timestamp::new(NOW));
        assert!(!state.is_logged_in(Timestamp::new(NOW)));
        assert_eq!(state.roles.len(), 1);
    }

    #[test]
    fn test_auth_header() {
        let (store, _, _) = setup();
        assert_eq!(store.auth_header(), None);

        store.replace(SessionState {
            token_type: "Token".into(),
            ..session(NOW + 1_000)
        });
        assert_eq!(store.auth_header().as_deref(), Some("Token token"));
    }

    #[test]
    fn test_persisted_session_survives_reload_until_expiry() {
        let (store, backend, clock) = setup();
        store.replace(session(NOW + 60_000));
        assert_eq!(backend.keys(), vec!["AUTH".to_string()]);

        let persistence = Rc::new(ExpiringStorage::new(backend.clone(), "", clock.clone()));
        let reloaded = SessionStore::new(persistence.clone(), clock.clone(), "auth");
        assert!(reloaded.is_logged_in());

        clock.advance_secs(61);
        let expired = SessionStore::new(persistence, clock.clone(), "auth");
        assert!(!expired.is_logged_in());
        assert!(backend.is_empty());
    }

    #[test]
    fn test_clear_removes_persisted_entry() {
        let (store, backend, _) = setup();
        store.replace(session(NOW + 60_000));
        store.clear();
        assert!(!store.is_logged_in());
        assert!(backend.is_empty());
        // 空会话再次清理不报错
        store.clear();
    }

    #[test]
    fn test_garbage_is_discarded_on_restore() {
        let backend = MemoryStorage::new();
        let clock = Rc::new(ManualClock::new(NOW));
        let persistence = Rc::new(ExpiringStorage::new(backend.clone(), "", clock.clone()));
        persistence.set("auth", serde_json::json!({"unexpected": true}), None);

        let store = SessionStore::new(persistence, clock, "auth");
        assert!(!store.is_logged_in());
        assert!(backend.is_empty());
    }
}
