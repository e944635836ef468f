//! `rust_websocket_utils` 是一个提供 WebSocket 通信实用功能的 Rust Crate。
//! 它封装了 `tokio-tungstenite` 的细节，为门禁移动端客户端以及本地开发用的门禁模拟中心
//! 提供统一的传输层。
//!
//! 主要模块包括：
//! - `message`: 定义传输层与上层之间交换的帧/信号类型 (`OutboundFrame`、`InboundSignal`) 以及关闭码常量。
//! - `error`: 定义库中使用的统一错误类型 `WsError`。
//! - `server`: 提供 WebSocket 服务器端的监听与连接接受。
//! - `client`: 提供 WebSocket 客户端的连接建立、收发与通道化封装。

pub mod client;
pub mod error;
pub mod message;
pub mod server;
