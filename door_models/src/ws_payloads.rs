// door_models/src/ws_payloads.rs

//! WebSocket 通信中使用的入站帧与出站命令定义。
//!
//! 门禁后端的消息没有统一的信封结构，而是以顶层 `type` 字段作为判别字段的扁平 JSON 对象。
//! 入站方向在此解码为封闭的 `InboundFrame` 枚举；出站方向由 `OutboundCommand` 负责构造，
//! 并在构造时生成关联 ID (UUID v4) 与 ISO-8601 时间戳。

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use thiserror::Error;
use uuid::Uuid;

use crate::enums::DoorState;

// --- 入站消息类型 ---
pub const DOOR_STATUS_MESSAGE_TYPE: &str = "door_status";
pub const DOOR_COMMAND_MESSAGE_TYPE: &str = "door_command";
pub const ACCESS_GRANTED_MESSAGE_TYPE: &str = "access_granted";
pub const ACCESS_DENIED_MESSAGE_TYPE: &str = "access_denied";
pub const NOTIFICATION_MESSAGE_TYPE: &str = "notification";
pub const HEARTBEAT_RESPONSE_MESSAGE_TYPE: &str = "heartbeat_response";
pub const CONNECTION_ESTABLISHED_MESSAGE_TYPE: &str = "connection_established";

/// `door_command` 帧中表示"硬件上报状态"的命令值。
pub const SET_STATUS_COMMAND: &str = "set_status";

// --- 出站消息类型 ---
pub const STATUS_UPDATE_MESSAGE_TYPE: &str = "status_update";
pub const FACE_RECOGNITION_REQUEST_MESSAGE_TYPE: &str = "face_recognition_request";
pub const FACE_VECTOR_DELETE_MESSAGE_TYPE: &str = "face_vector_delete";

/// 后端期望的图片字段只包含裸 base64 数据，data URI 前缀需要在发送前剥离。
const DATA_URI_BASE64_MARKER: &str = "base64,";

/// 生成 `toISOString()` 风格的 UTC 时间戳，例如 `2024-05-01T08:30:00.123Z`。
pub fn iso_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// 以当前时间生成 ISO-8601 时间戳。
pub fn iso_timestamp_now() -> String {
    iso_timestamp(Utc::now())
}

/// 生成一个新的关联 ID (UUID v4 字符串)。每条出站命令一个，绝不复用。
pub fn new_correlation_id() -> String {
    Uuid::new_v4().to_string()
}

/// 宽松读取一个字符串字段：`null` 或其他 JSON 类型一律视为缺失。
fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(text)) => Some(text),
        _ => None,
    })
}

/// 同 `lenient_string`，缺失时为空串。
fn lenient_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(lenient_string(deserializer)?.unwrap_or_default())
}

/// 从后端收到的、按 `type` 字段判别的入站帧。
///
/// 辅助字段缺失、为 `null` 或类型不符时都不会导致解码失败，而是按缺失处理；
/// 只有非 JSON、非对象或缺少 `type` 字段的帧才会被视为格式错误。未知的 `type` 解码为 `Unrecognized`。
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InboundFrame {
    /// 门状态广播。
    DoorStatus {
        #[serde(default, deserialize_with = "lenient_text")]
        status: String,
        #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
        timestamp: Option<String>,
    },
    /// 硬件发出的门命令。只有 `command == "set_status"` 会被当作状态上报处理。
    DoorCommand {
        #[serde(default, deserialize_with = "lenient_text")]
        command: String,
        #[serde(default, deserialize_with = "lenient_text")]
        status: String,
        #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
        door_id: Option<String>,
        #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
        command_id: Option<String>,
        #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
        timestamp: Option<String>,
    },
    AccessGranted {
        #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
        user: Option<String>,
        #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
        timestamp: Option<String>,
    },
    AccessDenied {
        #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
        reason: Option<String>,
        #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
        user: Option<String>,
        #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
        timestamp: Option<String>,
    },
    Notification {
        #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
        title: Option<String>,
        #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
        message: Option<String>,
        #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
        priority: Option<String>,
    },
    /// 服务端心跳回复，仅在客户端内部消费。
    HeartbeatResponse,
    /// 服务端确认连接建立，携带其分配的客户端 ID。仅在客户端内部消费。
    ConnectionEstablished {
        #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
        client_id: Option<String>,
        #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
    /// 任何未知的 `type`。
    #[serde(other)]
    Unrecognized,
}

/// 一次入站帧解码的结果：解码后的帧以及原始的 `type` 字符串 (用于日志)。
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedFrame {
    pub frame_type: String,
    pub frame: InboundFrame,
}

impl InboundFrame {
    /// 将一条文本帧解码为 `InboundFrame`。
    ///
    /// # Returns
    /// * `Ok(DecodedFrame)` - 帧是带有字符串 `type` 字段的 JSON 对象 (未知类型也算成功)。
    /// * `Err(serde_json::Error)` - 帧不是合法 JSON，或缺少 `type` 字段。
    pub fn decode(raw: &str) -> Result<DecodedFrame, serde_json::Error> {
        let value: serde_json::Value = serde_json::from_str(raw)?;
        let frame_type = value
            .get("type")
            .and_then(serde_json::Value::as_str)
            .unwrap_or_default()
            .to_string();
        let frame = serde_json::from_value::<InboundFrame>(value)?;
        Ok(DecodedFrame { frame_type, frame })
    }

    /// 序列化为发送到线上的 JSON 文本 (供开发用门禁模拟中心使用)。
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// 出站命令构造失败的原因。
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    /// 人脸图片数据为空 (或剥离 data URI 前缀后为空)。
    #[error("人脸图片数据为空")]
    EmptyImage,
    /// 姓名为空或只包含空白字符。姓名是硬性前置条件。
    #[error("姓名不能为空")]
    MissingName,
}

/// 客户端发送给后端的命令。
///
/// 序列化后即为线上格式，例如：
/// `{"type":"status_update","status":"OPEN","door_id":"...","command_id":"...","timestamp":"..."}`
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutboundCommand {
    /// 开门命令。线上类型名沿用后端的 `status_update`，状态恒为 `OPEN`。
    #[serde(rename = "status_update")]
    OpenDoor {
        status: DoorState,
        door_id: String,
        command_id: String,
        timestamp: String,
    },
    /// 人脸注册/识别请求。
    FaceRecognitionRequest {
        face_image_base64: String,
        request_id: String,
        timestamp: String,
        name: String,
    },
    /// 删除指定姓名已登记的人脸向量。
    FaceVectorDelete { name: String },
}

impl OutboundCommand {
    /// 构造开门命令。
    ///
    /// 不考虑任何本地缓存的门状态，总是生成一条"打开"意图的命令；本客户端不存在关门命令。
    pub fn open_door(door_id: &str) -> Self {
        OutboundCommand::OpenDoor {
            status: DoorState::Open,
            door_id: door_id.to_string(),
            command_id: new_correlation_id(),
            timestamp: iso_timestamp_now(),
        }
    }

    /// 构造人脸识别请求。
    ///
    /// 图片为空或姓名为空/空白时返回错误，调用方不应发送任何内容。
    /// 图片数据中如带有 data URI 前缀 (`data:image/jpeg;base64,`)，会在此处剥离。
    pub fn face_recognition_request(image_base64: &str, name: &str) -> Result<Self, CommandError> {
        if image_base64.is_empty() {
            return Err(CommandError::EmptyImage);
        }
        if name.trim().is_empty() {
            return Err(CommandError::MissingName);
        }
        let raw_base64 = strip_data_uri_prefix(image_base64);
        if raw_base64.is_empty() {
            return Err(CommandError::EmptyImage);
        }
        Ok(OutboundCommand::FaceRecognitionRequest {
            face_image_base64: raw_base64.to_string(),
            request_id: new_correlation_id(),
            timestamp: iso_timestamp_now(),
            name: name.to_string(),
        })
    }

    /// 构造人脸向量删除命令。姓名为空/空白时返回错误。
    pub fn face_vector_delete(name: &str) -> Result<Self, CommandError> {
        if name.trim().is_empty() {
            return Err(CommandError::MissingName);
        }
        Ok(OutboundCommand::FaceVectorDelete { name: name.to_string() })
    }

    /// 命令在线上的 `type` 字段值。
    pub fn message_type(&self) -> &'static str {
        match self {
            OutboundCommand::OpenDoor { .. } => STATUS_UPDATE_MESSAGE_TYPE,
            OutboundCommand::FaceRecognitionRequest { .. } => FACE_RECOGNITION_REQUEST_MESSAGE_TYPE,
            OutboundCommand::FaceVectorDelete { .. } => FACE_VECTOR_DELETE_MESSAGE_TYPE,
        }
    }

    /// 命令携带的关联 ID (`command_id` / `request_id`)，删除命令没有关联 ID。
    pub fn correlation_id(&self) -> Option<&str> {
        match self {
            OutboundCommand::OpenDoor { command_id, .. } => Some(command_id),
            OutboundCommand::FaceRecognitionRequest { request_id, .. } => Some(request_id),
            OutboundCommand::FaceVectorDelete { .. } => None,
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// 剥离 `"...base64,"` 之前的 data URI 前缀；没有前缀时原样返回。
pub fn strip_data_uri_prefix(image_base64: &str) -> &str {
    match image_base64.split_once(DATA_URI_BASE64_MARKER) {
        Some((_, raw)) => raw,
        None => image_base64,
    }
}
