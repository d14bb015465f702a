use std::cell::Cell;

use admin_router_shared::Timestamp;

/// 时间来源
pub trait Clock {
    fn now(&self) -> Timestamp;
}

/// 系统时钟
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Timestamp::now()
    }
}

/// 手动推进的时钟，用于测试过期边界
#[derive(Debug, Default)]
pub struct ManualClock {
    now: Cell<i64>,
}

impl ManualClock {
    pub fn new(ms: i64) -> Self {
        Self { now: Cell::new(ms) }
    }

    pub fn set(&self, ms: i64) {
        self.now.set(ms);
    }

    pub fn advance_secs(&self, secs: i64) {
        self.now.set(self.now.get() + secs * 1000);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        Timestamp::new(self.now.get())
    }
}
