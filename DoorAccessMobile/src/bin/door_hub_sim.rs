// DoorAccessMobile/src/bin/door_hub_sim.rs

//! 本地门禁中枢模拟器。
//!
//! 用法: `door-hub-sim [地址]`，地址也可由 `DOOR_HUB_ADDR` 环境变量指定，默认 `127.0.0.1:8000`。

use std::net::SocketAddr;

use anyhow::{Context, Result};
use door_access_mobile::door_hub::DoorHub;
use log::{info, LevelFilter};

const HUB_ADDR_ENV: &str = "DOOR_HUB_ADDR";
const DEFAULT_HUB_ADDR: &str = "127.0.0.1:8000";

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::new()
        .filter_level(LevelFilter::Info)
        .filter_module("door_access_mobile", LevelFilter::Debug)
        .try_init()
        .context("初始化 env_logger 日志服务失败 (door-hub-sim)")?;

    let raw_addr = std::env::args()
        .nth(1)
        .or_else(|| std::env::var(HUB_ADDR_ENV).ok())
        .unwrap_or_else(|| DEFAULT_HUB_ADDR.to_string());
    let addr: SocketAddr = raw_addr
        .parse()
        .with_context(|| format!("无效的监听地址: '{}'", raw_addr))?;

    info!("[DoorHub] 客户端可连接 ws://{}/ws/doors/<door_id>/", addr);
    DoorHub::start(addr).await.context("门禁中枢模拟器运行失败")?;
    Ok(())
}
