// DoorAccessMobile/src/ws_client/mod.rs

//! WebSocket 客户端模块。
//!
//! - `service`: 连接管理器 `DoorSocketClient` (连接、重连、断开、发送)。
//! - `commands`: 开门、人脸识别请求等出站命令。
//! - `normalizer`: 入站帧到 `DoorEvent` 的归一化。
//! - `reconnect`: 重连策略。
//! - `connector`: 打开连接的抽象及其 tokio-tungstenite 实现。

pub mod commands;
pub mod connector;
pub mod normalizer;
pub mod reconnect;
pub mod service;

pub use connector::{SocketConnector, SocketLink, TungsteniteConnector};
pub use normalizer::MessageNormalizer;
pub use reconnect::{ReconnectKind, ReconnectPlan, ReconnectPolicy};
pub use service::{ConnectionState, DoorSocketClient};
