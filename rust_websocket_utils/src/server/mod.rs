// rust_websocket_utils/src/server/mod.rs

//! WebSocket 服务端模块。
//!
//! 负责在指定地址上监听、完成 WebSocket 握手，并为每个连接调用上层提供的异步回调。
//! 门禁模拟中心 (`door_hub`) 与本库自身的测试都基于此模块搭建本地服务端。

pub mod transport;
