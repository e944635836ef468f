// DoorAccessMobile/src/ws_client/normalizer.rs

//! 入站帧归一化。
//!
//! 把服务端形态各异的文本帧映射为固定的 `DoorEvent` 集合。除"缺失时间戳时取当前时间"外，
//! 映射结果只取决于输入帧与配置的门 ID；`normalize_frame_at` 把当前时间作为参数传入，
//! 便于在测试中得到确定的结果。

use chrono::{DateTime, Utc};
use door_models::ws_payloads::{iso_timestamp, InboundFrame, DOOR_STATUS_MESSAGE_TYPE, SET_STATUS_COMMAND};
use door_models::DoorState;
use log::{debug, info, warn};

use crate::event::{DoorEvent, DoorEventSource};

/// 入站帧归一化器。
#[derive(Debug, Clone)]
pub struct MessageNormalizer {
    door_id: String,
}

impl MessageNormalizer {
    /// # 参数
    /// * `door_id` - 配置的门 ID。`door_status` 帧总是报告该 ID，`door_command` 帧缺少 `door_id` 时也用它补齐。
    pub fn new(door_id: impl Into<String>) -> Self {
        Self { door_id: door_id.into() }
    }

    pub fn door_id(&self) -> &str {
        &self.door_id
    }

    /// 以当前时间归一化一条文本帧。
    pub fn normalize_frame(&self, raw: &str) -> Option<DoorEvent> {
        self.normalize_frame_at(raw, Utc::now())
    }

    /// 归一化一条文本帧。
    ///
    /// # Returns
    /// * `Some(event)` - 帧映射为一个对外事件。
    /// * `None` - 帧格式错误、仅供内部消费 (心跳回复、连接确认) 或类型无法识别；均已记录日志。
    pub fn normalize_frame_at(&self, raw: &str, now: DateTime<Utc>) -> Option<DoorEvent> {
        let decoded = match InboundFrame::decode(raw) {
            Ok(decoded) => decoded,
            Err(e) => {
                warn!("[DoorAccessMobile] 丢弃格式错误的入站帧: {} (原始内容: '{}')", e, raw);
                return None;
            }
        };

        // door_status 推送频繁，不在 info 级别记录
        if decoded.frame_type == DOOR_STATUS_MESSAGE_TYPE {
            debug!("[DoorAccessMobile] 收到消息: {}", raw);
        } else {
            info!("[DoorAccessMobile] 收到消息 (type: {}): {}", decoded.frame_type, raw);
        }

        match decoded.frame {
            InboundFrame::HeartbeatResponse => {
                debug!("[DoorAccessMobile] 收到心跳回复。");
                None
            }
            InboundFrame::ConnectionEstablished { client_id, message } => {
                info!(
                    "[DoorAccessMobile] 服务端确认连接建立。客户端ID: {:?}, 消息: {:?}",
                    client_id, message
                );
                None
            }
            InboundFrame::DoorStatus { status, timestamp } => {
                let state = DoorState::from_wire(&status);
                Some(DoorEvent::DoorStatusChanged {
                    status: state,
                    door_id: self.door_id.clone(),
                    timestamp: timestamp.unwrap_or_else(|| iso_timestamp(now)),
                    physical_state: state,
                    source: None,
                    command_id: None,
                })
            }
            InboundFrame::DoorCommand { command, status, door_id, command_id, timestamp } => {
                if command != SET_STATUS_COMMAND {
                    info!("[DoorAccessMobile] 忽略未处理的门命令: '{}'", command);
                    return None;
                }
                let state = DoorState::from_wire(&status);
                info!("[DoorAccessMobile] 硬件上报门状态: {} (command_id: {:?})", state, command_id);
                Some(DoorEvent::DoorStatusChanged {
                    status: state,
                    door_id: door_id.unwrap_or_else(|| self.door_id.clone()),
                    timestamp: timestamp.unwrap_or_else(|| iso_timestamp(now)),
                    physical_state: state,
                    source: Some(DoorEventSource::HardwareCommand),
                    command_id,
                })
            }
            InboundFrame::AccessGranted { user, timestamp } => Some(DoorEvent::AccessGranted {
                user,
                timestamp: timestamp.unwrap_or_else(|| iso_timestamp(now)),
            }),
            InboundFrame::AccessDenied { reason, user, timestamp } => {
                Some(DoorEvent::AccessDenied { reason, user, timestamp })
            }
            InboundFrame::Notification { title, message, priority } => Some(DoorEvent::Notification {
                title: title.unwrap_or_default(),
                message: message.unwrap_or_default(),
                priority,
            }),
            InboundFrame::Unrecognized => {
                info!("[DoorAccessMobile] 未处理的消息类型: '{}'", decoded.frame_type);
                None
            }
        }
    }
}
