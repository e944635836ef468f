// DoorAccessMobile/src/error.rs

//! `DoorAccessMobile` 客户端的错误类型。
//!
//! 传输层错误 (`WsError`) 不会直接抛给调用方：连接故障通过 `ConnectionStatus` 事件报告并自动重试。
//! 这里只定义调用方同步可见的失败，例如发送时未连接、命令前置条件不满足等。

use door_models::CommandError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClientError {
    /// 当前未连接。发送操作会顺带触发一次 `connect()`，但本次发送失败。
    #[error("WebSocket 未连接，已触发重新连接")]
    NotConnected,

    #[error("消息序列化失败: {0}")]
    Serialization(#[from] serde_json::Error),

    /// 传输层拒绝了发送 (例如写任务已结束)。
    #[error("消息发送失败: {0}")]
    Transport(String),

    /// 命令前置条件不满足，未发送任何内容。
    #[error("无效的命令: {0}")]
    InvalidCommand(#[from] CommandError),

    /// 配置的服务端地址无法组成合法的 WebSocket URL。
    #[error("无效的 WebSocket 端点 '{endpoint}': {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },
}
