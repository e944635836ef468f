// DoorAccessMobile/src/ws_client/reconnect.rs

//! 重连策略。
//!
//! 连接管理器有两条互不相同的重连路径：
//! - **退避重连**：连接从未成功打开时使用，延迟按 `base * 2^attempt` 增长，并受 `max_delay` 封顶，
//!   累计尝试次数达到 `max_attempts` 后停止自动重连。
//! - **立即重连**：已建立的连接被非用户原因关闭时使用，固定的极短延迟，不经过退避阶梯。

use std::time::Duration;

use serde::Deserialize;

/// 重连策略参数。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectPolicy {
    pub base_delay: Duration,
    pub max_delay: Duration,
    pub max_attempts: u32,
    pub immediate_delay: Duration,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            base_delay: Duration::from_millis(1_000),
            max_delay: Duration::from_millis(30_000),
            max_attempts: 5,
            immediate_delay: Duration::from_millis(10),
        }
    }
}

impl ReconnectPolicy {
    /// 第 `attempt` 次退避重连的延迟：`min(base * 2^attempt, max_delay)`。
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        let multiplier = 1_u32.checked_shl(attempt).unwrap_or(u32::MAX);
        self.base_delay.saturating_mul(multiplier).min(self.max_delay)
    }

    /// 在已经失败 `attempts_so_far` 次之后，计算下一次退避重连。
    ///
    /// 返回 `(新的尝试序号, 延迟)`；尝试次数已达上限时返回 `None`。
    /// 序号先自增再计算延迟，因此第一次退避重连的延迟是 `base * 2`。
    pub fn next_backoff(&self, attempts_so_far: u32) -> Option<(u32, Duration)> {
        if attempts_so_far >= self.max_attempts {
            return None;
        }
        let attempt = attempts_so_far + 1;
        Some((attempt, self.backoff_delay(attempt)))
    }
}

/// 配置文件中的重连参数 (毫秒)。
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct ReconnectSettings {
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
    pub max_attempts: u32,
    pub immediate_delay_ms: u64,
}

impl Default for ReconnectSettings {
    fn default() -> Self {
        let policy = ReconnectPolicy::default();
        Self {
            base_delay_ms: policy.base_delay.as_millis() as u64,
            max_delay_ms: policy.max_delay.as_millis() as u64,
            max_attempts: policy.max_attempts,
            immediate_delay_ms: policy.immediate_delay.as_millis() as u64,
        }
    }
}

impl From<&ReconnectSettings> for ReconnectPolicy {
    fn from(settings: &ReconnectSettings) -> Self {
        Self {
            base_delay: Duration::from_millis(settings.base_delay_ms),
            max_delay: Duration::from_millis(settings.max_delay_ms),
            max_attempts: settings.max_attempts,
            immediate_delay: Duration::from_millis(settings.immediate_delay_ms),
        }
    }
}

/// 已排定的重连的种类。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconnectKind {
    /// 打开失败后的退避重连，携带尝试序号。
    Backoff { attempt: u32 },
    /// 连接被关闭后的立即重连。
    Immediate,
}

/// 一次已排定但尚未触发的重连 (用于诊断与测试)。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectPlan {
    pub kind: ReconnectKind,
    pub delay: Duration,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_delay_doubles_from_base() {
        let policy = ReconnectPolicy::default();
        assert_eq!(policy.backoff_delay(0), Duration::from_millis(1_000));
        assert_eq!(policy.backoff_delay(1), Duration::from_millis(2_000));
        assert_eq!(policy.backoff_delay(3), Duration::from_millis(8_000));
    }

    #[test]
    fn test_backoff_delay_is_capped() {
        let policy = ReconnectPolicy::default();
        assert_eq!(policy.backoff_delay(5), Duration::from_millis(30_000));
        assert_eq!(policy.backoff_delay(40), Duration::from_millis(30_000), "移位溢出时也应封顶");
    }

    #[test]
    /// 退避序列单调不减、受封顶约束，且不会超过最大尝试次数。
    fn test_next_backoff_sequence_stops_at_ceiling() {
        let policy = ReconnectPolicy::default();
        let mut attempts = 0;
        let mut delays = Vec::new();
        while let Some((attempt, delay)) = policy.next_backoff(attempts) {
            assert_eq!(attempt, attempts + 1);
            attempts = attempt;
            delays.push(delay.as_millis() as u64);
        }
        assert_eq!(delays, vec![2_000, 4_000, 8_000, 16_000, 30_000]);
        assert_eq!(attempts, policy.max_attempts);
        assert!(delays.windows(2).all(|w| w[0] <= w[1]), "退避延迟应单调不减");
    }

    #[test]
    fn test_settings_convert_to_policy() {
        let settings = ReconnectSettings { base_delay_ms: 100, max_delay_ms: 500, max_attempts: 2, immediate_delay_ms: 5 };
        let policy = ReconnectPolicy::from(&settings);
        assert_eq!(policy.base_delay, Duration::from_millis(100));
        assert_eq!(policy.next_backoff(0), Some((1, Duration::from_millis(200))));
        assert_eq!(policy.next_backoff(1), Some((2, Duration::from_millis(400))));
        assert_eq!(policy.next_backoff(2), None);
        assert_eq!(ReconnectPolicy::from(&ReconnectSettings::default()), ReconnectPolicy::default());
    }
}
