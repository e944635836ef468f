//! `door_models` 公共模型库 crate。
//!
//! 本 crate 集中定义了门禁移动端 (`DoorAccessMobile`) 与门禁后端之间通过 WebSocket
//! 交换的线上 (wire) 数据结构，同时也被本地开发用的门禁模拟中心 (`door_hub`) 共享使用。
//!
//! 主要包含：
//! - **通用枚举 (`enums`)**: 门的状态 (`DoorState`)、客户端类型 (`ClientType`) 等。
//! - **WebSocket 消息负载 (`ws_payloads`)**: 入站帧 (`InboundFrame`) 的封闭标签联合解码，
//!   以及出站命令 (`OutboundCommand`) 的构造与序列化。
//!
//! 设计原则：
//! - 所有模型派生 `serde::Serialize` / `serde::Deserialize`，字段名与后端 JSON 契约保持一致。
//! - 入站帧在系统边界处一次性解码为封闭的枚举，未知的 `type` 被显式归入 `Unrecognized`，
//!   而不是在后续逻辑中默默落空。

pub mod enums;
pub mod ws_payloads;

pub use enums::{ClientType, DoorState};
pub use ws_payloads::{CommandError, DecodedFrame, InboundFrame, OutboundCommand};
