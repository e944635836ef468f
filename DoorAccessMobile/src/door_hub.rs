// DoorAccessMobile/src/door_hub.rs

//! 本地门禁中枢模拟器。
//!
//! 在没有真实后端与门禁硬件时用于联调：扮演后端的 `/ws/doors/{door_id}/` 端点，
//! 对客户端发出的命令给出与硬件一致的回复。基于 `rust_websocket_utils::server`。

use std::net::SocketAddr;

use door_models::ws_payloads::{iso_timestamp_now, HEARTBEAT_RESPONSE_MESSAGE_TYPE, SET_STATUS_COMMAND};
use door_models::{DoorState, InboundFrame, OutboundCommand};
use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use log::{debug, info, warn};
use rust_websocket_utils::error::WsError;
use rust_websocket_utils::server::transport::{ServerTransport, WsStream};
use serde_json::Value;
use tokio::net::TcpListener;
use tokio_tungstenite::tungstenite::Message;
use uuid::Uuid;

/// 客户端发送的心跳帧类型。
pub const HEARTBEAT_MESSAGE_TYPE: &str = "heartbeat";

/// 门禁中枢模拟器。
pub struct DoorHub;

impl DoorHub {
    /// 绑定到 `addr` 并无限期运行。
    pub async fn start(addr: SocketAddr) -> Result<(), WsError> {
        info!("[DoorHub] 启动门禁中枢模拟器: {}", addr);
        ServerTransport::start(addr, handle_connection).await
    }

    /// 在已绑定的监听器上运行。
    pub async fn serve(listener: TcpListener) -> Result<(), WsError> {
        ServerTransport::serve(listener, handle_connection).await
    }
}

/// 连接建立后依次发送的帧：连接确认与初始门状态 (关闭)。
pub fn greeting_frames(client_id: &str) -> Vec<InboundFrame> {
    vec![
        InboundFrame::ConnectionEstablished {
            client_id: Some(client_id.to_string()),
            message: Some("Connected to door hub".to_string()),
        },
        InboundFrame::DoorStatus {
            status: DoorState::Closed.as_wire().to_string(),
            timestamp: Some(iso_timestamp_now()),
        },
    ]
}

/// 计算对一条客户端文本帧的回复。
///
/// 无法解析或无需回复的帧返回 `None`。
pub fn reply_for(raw: &str) -> Option<InboundFrame> {
    let value: Value = match serde_json::from_str(raw) {
        Ok(value) => value,
        Err(e) => {
            warn!("[DoorHub] 收到非 JSON 消息: {} ({})", raw, e);
            return None;
        }
    };

    if value.get("type").and_then(Value::as_str) == Some(HEARTBEAT_MESSAGE_TYPE) {
        debug!("[DoorHub] 回复 {}", HEARTBEAT_RESPONSE_MESSAGE_TYPE);
        return Some(InboundFrame::HeartbeatResponse);
    }

    let command: OutboundCommand = match serde_json::from_value(value) {
        Ok(command) => command,
        Err(e) => {
            info!("[DoorHub] 忽略无法识别的消息: {} ({})", raw, e);
            return None;
        }
    };

    info!("[DoorHub] 收到命令: {}", command.message_type());
    match command {
        // 硬件执行后以 set_status 上报实际状态
        OutboundCommand::OpenDoor { status, door_id, command_id, .. } => Some(InboundFrame::DoorCommand {
            command: SET_STATUS_COMMAND.to_string(),
            status: status.as_wire().to_string(),
            door_id: Some(door_id),
            command_id: Some(command_id),
            timestamp: Some(iso_timestamp_now()),
        }),
        OutboundCommand::FaceRecognitionRequest { name, .. } => Some(InboundFrame::Notification {
            title: Some("Face registered".to_string()),
            message: Some(format!("Face data received for {}", name)),
            priority: None,
        }),
        OutboundCommand::FaceVectorDelete { name } => Some(InboundFrame::Notification {
            title: Some("Face removed".to_string()),
            message: Some(format!("Face data deleted for {}", name)),
            priority: None,
        }),
    }
}

async fn send_frame(sender: &mut SplitSink<WsStream, Message>, frame: &InboundFrame) -> Result<(), WsError> {
    let json = frame
        .to_json()
        .map_err(|e| WsError::SerializationError(e.to_string()))?;
    debug!("[DoorHub] 发送: {}", json);
    sender.send(Message::Text(json)).await?;
    Ok(())
}

async fn handle_connection(stream: WsStream, peer: SocketAddr) {
    let client_id = Uuid::new_v4().to_string();
    info!("[DoorHub] 客户端 {} 已连接 (client_id: {})", peer, client_id);
    let (mut sender, mut receiver) = stream.split();

    for frame in greeting_frames(&client_id) {
        if let Err(e) = send_frame(&mut sender, &frame).await {
            warn!("[DoorHub] 向 {} 发送初始帧失败: {}", peer, e);
            return;
        }
    }

    while let Some(message) = receiver.next().await {
        match message {
            Ok(Message::Text(raw)) => {
                info!("[DoorHub] 收到 {} 的消息: {}", peer, raw);
                let Some(reply) = reply_for(&raw) else {
                    continue;
                };
                if let Err(e) = send_frame(&mut sender, &reply).await {
                    warn!("[DoorHub] 向 {} 发送回复失败: {}", peer, e);
                    break;
                }
            }
            // 继续读取，让 tungstenite 完成关闭握手
            Ok(Message::Close(frame)) => {
                info!("[DoorHub] 客户端 {} 请求关闭连接: {:?}", peer, frame);
            }
            Ok(_) => {}
            Err(e) => {
                debug!("[DoorHub] 与 {} 的连接结束: {}", peer, e);
                break;
            }
        }
    }
    info!("[DoorHub] 客户端 {} 已断开", peer);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    /// 开门命令得到 set_status 回复，并回显 command_id 与门 ID。
    fn test_open_door_is_answered_with_set_status() {
        let raw = OutboundCommand::open_door("front").to_json().unwrap();
        let command_id = match serde_json::from_str::<OutboundCommand>(&raw).unwrap() {
            OutboundCommand::OpenDoor { command_id, .. } => command_id,
            other => panic!("预期 OpenDoor，实际为 {:?}", other),
        };

        match reply_for(&raw) {
            Some(InboundFrame::DoorCommand { command, status, door_id, command_id: echoed, .. }) => {
                assert_eq!(command, SET_STATUS_COMMAND);
                assert_eq!(status, "OPEN");
                assert_eq!(door_id.as_deref(), Some("front"));
                assert_eq!(echoed, Some(command_id));
            }
            other => panic!("预期 DoorCommand，实际为 {:?}", other),
        }
    }

    #[test]
    fn test_face_commands_are_acknowledged() {
        let request = OutboundCommand::face_recognition_request("QUJDRA==", "Alice").unwrap();
        match reply_for(&request.to_json().unwrap()) {
            Some(InboundFrame::Notification { title, message, .. }) => {
                assert_eq!(title.as_deref(), Some("Face registered"));
                assert!(message.unwrap().contains("Alice"));
            }
            other => panic!("预期 Notification，实际为 {:?}", other),
        }

        let delete = OutboundCommand::face_vector_delete("Alice").unwrap();
        assert!(matches!(
            reply_for(&delete.to_json().unwrap()),
            Some(InboundFrame::Notification { .. })
        ));
    }

    #[test]
    fn test_heartbeat_and_unknown_frames() {
        assert_eq!(reply_for(r#"{"type":"heartbeat"}"#), Some(InboundFrame::HeartbeatResponse));
        assert_eq!(reply_for(r#"{"type":"reboot"}"#), None);
        assert_eq!(reply_for("hello"), None);
    }

    #[test]
    /// 初始帧：先确认连接，再报告门处于关闭状态。
    fn test_greeting_frames() {
        let frames = greeting_frames("abc");
        assert_eq!(frames.len(), 2);
        assert!(matches!(
            &frames[0],
            InboundFrame::ConnectionEstablished { client_id: Some(id), .. } if id == "abc"
        ));
        assert!(matches!(&frames[1], InboundFrame::DoorStatus { status, .. } if status == "CLOSED"));
    }
}
