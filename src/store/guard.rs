use std::sync::atomic::{AtomicU64, Ordering};

/// 请求序号守卫
///
/// 每次发起会替换当前数据的请求前调用 [`RequestGuard::issue`]，
/// 响应返回后用 [`RequestGuard::is_current`] 判断是否已被更新的请求取代。
#[derive(Debug, Default)]
pub struct RequestGuard {
    latest: AtomicU64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestToken(u64);

impl RequestGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// 发起新请求，之前的令牌全部失效
    pub fn issue(&self) -> RequestToken {
        RequestToken(self.latest.fetch_add(1, Ordering::SeqCst) + 1)
    }

    /// 当前令牌，不使之前的请求失效（用于加载更多）
    pub fn current(&self) -> RequestToken {
        RequestToken(self.latest.load(Ordering::SeqCst))
    }

    pub fn is_current(&self, token: RequestToken) -> bool {
        self.latest.load(Ordering::SeqCst) == token.0
    }

    /// 使所有进行中的请求失效
    pub fn invalidate(&self) {
        self.latest.fetch_add(1, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_newer_token_supersedes_older() {
        let guard = RequestGuard::new();
        let first = guard.issue();
        assert!(guard.is_current(first));

        let second = guard.issue();
        assert!(!guard.is_current(first));
        assert!(guard.is_current(second));
        assert_eq!(guard.current(), second);

        guard.invalidate();
        assert!(!guard.is_current(second));
    }
}
