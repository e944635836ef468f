// rust_websocket_utils/src/client/mod.rs

//! WebSocket 客户端模块。
//!
//! 主要职责包括：
//! - **连接建立**: 连接到远程 WebSocket 服务器 (`transport::connect_client`)。
//! - **消息传输**: 发送文本/JSON 帧，接收并归类对端信号 (`transport::receive_message`)。
//! - **通道化**: 把连接交给后台读写任务，上层通过 mpsc 通道收发 (`ClientConnection::into_channels`)。

pub mod transport;
