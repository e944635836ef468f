//! `DoorAccessMobile` 门禁移动端核心逻辑。
//!
//! 负责与门禁后端之间的 WebSocket 通信：连接管理与自动重连、入站帧归一化、
//! 事件分发以及出站命令。

pub mod config;
pub mod door_hub;
pub mod error;
pub mod event;
pub mod event_bus;
pub mod notification;
pub mod ws_client;
