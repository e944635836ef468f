//! 通用枚举模块。
//!
//! 定义门禁客户端与后端之间共享的枚举类型。线上表示使用后端约定的字符串
//! (例如 `"OPEN"` / `"CLOSED"`、`"mobile"`)。

use serde::{Deserialize, Serialize};
use std::fmt;

/// 门的状态。
///
/// 同时用于逻辑状态 (`status`) 与物理状态 (`physical_state`)：硬件只上报
/// 开/关两种机械状态，逻辑锁状态不在本客户端的建模范围内。
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DoorState {
    /// 门已打开。线上表示为 `"OPEN"`。
    Open,
    /// 门已关闭。线上表示为 `"CLOSED"`。
    Closed,
}

impl DoorState {
    /// 将硬件上报的状态字符串映射为 `DoorState`。
    ///
    /// 只有精确的 `"OPEN"` 被视为打开，其余任何值 (包括 `"OPENED"`、小写、空串) 一律视为关闭。
    pub fn from_wire(status: &str) -> Self {
        if status == "OPEN" {
            DoorState::Open
        } else {
            DoorState::Closed
        }
    }

    pub fn as_wire(&self) -> &'static str {
        match self {
            DoorState::Open => "OPEN",
            DoorState::Closed => "CLOSED",
        }
    }
}

impl fmt::Display for DoorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_wire())
    }
}

/// 连接 URL 中 `client_type` 查询参数所标识的客户端角色。
///
/// 后端依据该参数区分移动端与门禁硬件端的连接；本客户端只以移动端身份连接。
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum ClientType {
    /// 移动端 App (本客户端)。
    #[default]
    Mobile,
}

impl ClientType {
    /// 返回写入 `client_type` 查询参数的值。
    pub fn as_query_value(&self) -> &'static str {
        match self {
            ClientType::Mobile => "mobile",
        }
    }
}

impl fmt::Display for ClientType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_query_value())
    }
}
