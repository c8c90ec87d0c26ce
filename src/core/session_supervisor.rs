//! 会话监管：生命周期、中断管理
//!
//! 持有会话级 CancellationToken；每个任务拿到一个子 token，用户 Ctrl+C 时只取消当前任务，
//! 会话关闭时取消全部。

use std::sync::Mutex;

use tokio_util::sync::CancellationToken;

/// 会话级生命周期管理
#[derive(Debug, Default)]
pub struct SessionSupervisor {
    root: CancellationToken,
    /// 当前在途任务的 token
    current: Mutex<Option<CancellationToken>>,
}

impl SessionSupervisor {
    pub fn new() -> Self {
        Self::default()
    }

    /// 开始一个任务：创建并登记子 token
    pub fn begin_task(&self) -> CancellationToken {
        let token = self.root.child_token();
        *self.current.lock().unwrap_or_else(|e| e.into_inner()) = Some(token.clone());
        token
    }

    pub fn finish_task(&self) {
        self.current.lock().unwrap_or_else(|e| e.into_inner()).take();
    }

    /// 取消当前任务（用户 Ctrl+C）；没有在途任务时返回 false
    pub fn cancel_current(&self) -> bool {
        match self.current.lock().unwrap_or_else(|e| e.into_inner()).take() {
            Some(token) => {
                token.cancel();
                true
            }
            None => false,
        }
    }

    /// 关闭会话：取消所有任务
    pub fn shutdown(&self) {
        self.root.cancel();
    }

    /// 会话级 token，会话关闭时触发
    pub fn session_token(&self) -> CancellationToken {
        self.root.clone()
    }

    pub fn is_shutdown(&self) -> bool {
        self.root.is_cancelled()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancel_only_current_task() {
        let supervisor = SessionSupervisor::new();
        assert!(!supervisor.cancel_current());

        let first = supervisor.begin_task();
        assert!(supervisor.cancel_current());
        assert!(first.is_cancelled());

        let second = supervisor.begin_task();
        assert!(!second.is_cancelled());
        supervisor.finish_task();
        assert!(!supervisor.cancel_current());
        assert!(!supervisor.is_shutdown());
    }

    #[test]
    fn test_shutdown_cancels_running_task() {
        let supervisor = SessionSupervisor::new();
        let token = supervisor.begin_task();
        let session = supervisor.session_token();
        supervisor.shutdown();
        assert!(token.is_cancelled());
        assert!(session.is_cancelled());
        assert!(supervisor.is_shutdown());
    }
}
