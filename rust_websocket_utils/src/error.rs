// rust_websocket_utils/src/error.rs

//! 定义 WebSocket 工具库相关的错误类型。

use thiserror::Error;
use tokio_tungstenite::tungstenite::Error as TungsteniteError;

use crate::message::NORMAL_CLOSURE;

/// WebSocket 工具库的统一错误类型。
#[derive(Error, Debug)]
pub enum WsError {
    /// 帧内容序列化失败时返回。
    #[error("序列化错误: {0}")]
    SerializationError(String),

    /// WebSocket 协议相关的错误，例如握手失败、连接被拒绝、帧格式不正确等。
    #[error("WebSocket协议错误: {0}")]
    WebSocketProtocolError(#[from] TungsteniteError),

    /// 底层 I/O 错误。
    #[error("I/O错误: {0}")]
    IoError(#[from] std::io::Error),

    /// 连接在建立过程中或建立后被关闭，携带关闭码与原因。
    #[error("连接已关闭 (code: {code}, reason: '{reason}')")]
    ConnectionClosed { code: u16, reason: String },

    /// 无效的 URL 格式。
    #[error("无效的URL: {0}")]
    InvalidUrl(String),

    /// 通用消息错误，用于其他未明确分类的错误。
    #[error("消息错误: {0}")]
    Message(String),
}

impl WsError {
    /// 如果该错误对应一次 WebSocket 关闭，返回其关闭码。
    ///
    /// tungstenite 的 `ConnectionClosed` 表示连接已被正常关闭，视为 1000。
    pub fn close_code(&self) -> Option<u16> {
        match self {
            WsError::ConnectionClosed { code, .. } => Some(*code),
            WsError::WebSocketProtocolError(TungsteniteError::ConnectionClosed) => Some(NORMAL_CLOSURE),
            _ => None,
        }
    }

    /// 是否为正常关闭 (关闭码 1000)。这类错误不应作为连接故障展示给用户。
    pub fn is_normal_closure(&self) -> bool {
        self.close_code() == Some(NORMAL_CLOSURE)
    }
}
