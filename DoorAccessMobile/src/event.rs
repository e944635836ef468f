// DoorAccessMobile/src/event.rs

//! 定义客户端内部的事件分类。
//!
//! 服务端消息形态各异，经过 `MessageNormalizer` 归一化后只会以下列固定的事件出现在事件总线上。
//! UI 组件与通知转发器按 `EventKind` 订阅。

use std::fmt;

use door_models::DoorState;
use serde::{Deserialize, Serialize};

/// 连接状态事件的名称。
pub const CONNECTION_STATUS_EVENT: &str = "connection_status";
/// 门状态变化事件的名称。
pub const DOOR_STATUS_CHANGED_EVENT: &str = "door_status_changed";
pub const ACCESS_GRANTED_EVENT: &str = "access_granted";
pub const ACCESS_DENIED_EVENT: &str = "access_denied";
pub const NOTIFICATION_EVENT: &str = "notification";

/// 事件类型，作为事件总线的订阅键。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    ConnectionStatus,
    DoorStatusChanged,
    AccessGranted,
    AccessDenied,
    Notification,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::ConnectionStatus => CONNECTION_STATUS_EVENT,
            EventKind::DoorStatusChanged => DOOR_STATUS_CHANGED_EVENT,
            EventKind::AccessGranted => ACCESS_GRANTED_EVENT,
            EventKind::AccessDenied => ACCESS_DENIED_EVENT,
            EventKind::Notification => NOTIFICATION_EVENT,
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 门状态变化的来源。目前只有硬件通过 `door_command` 上报这一种显式来源。
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DoorEventSource {
    HardwareCommand,
}

/// 归一化后的事件。不持久化。
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum DoorEvent {
    /// 连接状态变化。`error` 只在连接失败时携带。
    ConnectionStatus { connected: bool, error: Option<String> },
    /// 门状态变化。`status` 为逻辑状态，`physical_state` 为硬件上报的机械状态，两者当前总是一致。
    DoorStatusChanged {
        status: DoorState,
        door_id: String,
        /// ISO-8601 时间戳；帧中没有时取归一化时刻。
        timestamp: String,
        physical_state: DoorState,
        source: Option<DoorEventSource>,
        command_id: Option<String>,
    },
    AccessGranted { user: Option<String>, timestamp: String },
    AccessDenied { reason: Option<String>, user: Option<String>, timestamp: Option<String> },
    /// 服务端推送的通知。缺失的标题/正文为空串。
    Notification { title: String, message: String, priority: Option<String> },
}

impl DoorEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            DoorEvent::ConnectionStatus { .. } => EventKind::ConnectionStatus,
            DoorEvent::DoorStatusChanged { .. } => EventKind::DoorStatusChanged,
            DoorEvent::AccessGranted { .. } => EventKind::AccessGranted,
            DoorEvent::AccessDenied { .. } => EventKind::AccessDenied,
            DoorEvent::Notification { .. } => EventKind::Notification,
        }
    }

    pub fn connected() -> Self {
        DoorEvent::ConnectionStatus { connected: true, error: None }
    }

    pub fn disconnected(error: Option<String>) -> Self {
        DoorEvent::ConnectionStatus { connected: false, error }
    }
}

/// 连接故障对订阅者的可见性策略，在构造客户端时选定。
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ErrorVisibility {
    /// 默认：连接被关闭时不发出 `connected: false`；一轮连续打开失败中只报告第一次。
    #[default]
    SuppressTransient,
    /// 每次打开失败、每次非用户原因的关闭都发出 `connected: false`。
    Surface,
}
