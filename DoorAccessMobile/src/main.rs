// DoorAccessMobile/src/main.rs

use std::sync::Arc;

use anyhow::{Context, Result};
use door_access_mobile::config::DoorClientConfig;
use door_access_mobile::event::{DoorEvent, EventKind};
use door_access_mobile::event_bus::EventBus;
use door_access_mobile::notification::{LogNotificationSink, NotificationRelay};
use door_access_mobile::ws_client::DoorSocketClient;
use log::{info, warn, LevelFilter};

/// 门禁移动端的入口。
///
/// 加载配置，组装事件总线、连接管理器与通知转发器，连接后端并运行到 Ctrl-C。
#[tokio::main]
async fn main() -> Result<()> {
    // 默认 Info，本应用与共享模型为 Debug
    env_logger::Builder::new()
        .filter_level(LevelFilter::Info)
        .filter_module("door_access_mobile", LevelFilter::Debug)
        .filter_module("door_models", LevelFilter::Debug)
        .try_init()
        .context("初始化 env_logger 日志服务失败 (DoorAccessMobile)")?;

    info!("[DoorAccessMobile] 门禁移动端正在启动...");

    let config = DoorClientConfig::load()?;
    let bus = EventBus::new();

    let relay = NotificationRelay::new(bus.clone(), Arc::new(LogNotificationSink));
    relay.initialize();

    let _connection_log = bus.add_event_listener(EventKind::ConnectionStatus, |event| {
        if let DoorEvent::ConnectionStatus { connected, error } = event {
            match error {
                Some(error) => warn!("[DoorAccessMobile] 连接状态: connected={}, 错误: {}", connected, error),
                None => info!("[DoorAccessMobile] 连接状态: connected={}", connected),
            }
        }
    });

    let client = DoorSocketClient::new(&config, bus.clone()).context("创建 WebSocket 客户端失败")?;
    info!("[DoorAccessMobile] 连接端点: {}", client.endpoint());
    client.connect();

    tokio::signal::ctrl_c().await.context("等待 Ctrl-C 信号失败")?;

    info!("[DoorAccessMobile] 收到退出信号，正在断开连接...");
    client.disconnect();
    relay.cleanup();
    info!("[DoorAccessMobile] 已退出。");
    Ok(())
}
