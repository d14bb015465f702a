//! 用户反馈接口：加载进度条与消息提示
//!
//! 宿主 UI 提供具体实现；库内默认实现只输出 tracing 日志。

use tracing::{debug, info, warn};

/// 导航期间的加载进度条
pub trait ProgressIndicator {
    fn start(&self);
    fn finish(&self);
    fn error(&self);
}

/// 面向用户的消息提示
pub trait MessageSink {
    fn error(&self, message: &str);
    fn success(&self, message: &str);
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TracingProgress;

impl ProgressIndicator for TracingProgress {
    fn start(&self) {
        debug!("progress start");
    }

    fn finish(&self) {
        debug!("progress finish");
    }

    fn error(&self) {
        debug!("progress error");
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TracingMessages;

impl MessageSink for TracingMessages {
    fn error(&self, message: &str) {
        warn!(message, "user-facing error");
    }

    fn success(&self, message: &str) {
        info!(message, "user-facing success");
    }
}

/// 记录全部反馈事件，供测试断言调用顺序
#[cfg(test)]
#[derive(Debug, Default)]
pub struct RecordingFeedback {
    pub events: std::cell::RefCell<Vec<String>>,
}

#[cfg(test)]
impl RecordingFeedback {
    pub fn events(&self) -> Vec<String> {
        self.events.borrow().clone()
    }

    fn push(&self, event: String) {
        self.events.borrow_mut().push(event);
    }
}

#[cfg(test)]
impl ProgressIndicator for RecordingFeedback {
    fn start(&self) {
        self.push("progress:start".into());
    }

    fn finish(&self) {
        self.push("progress:finish".into());
    }

    fn error(&self) {
        self.push("progress:error".into());
    }
}

#[cfg(test)]
impl MessageSink for RecordingFeedback {
    fn error(&self, message: &str) {
        self.push(format!("message:error:{}", message));
    }

    fn success(&self, message: &str) {
        self.push(format!("message:success:{}", message));
    }
}
