// DoorAccessMobile/src/config.rs

//! `DoorAccessMobile` 的配置管理模块。
//!
//! 配置以 JSON 文件的形式存放，默认位于 `config/door_client_config.json`，
//! 可通过环境变量 `DOOR_CLIENT_CONFIG` 指定其他路径。文件不存在时回退到内置默认值。

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use door_models::ClientType;
use serde::Deserialize;
use url::Url;

use crate::error::ClientError;
use crate::event::ErrorVisibility;
use crate::ws_client::reconnect::{ReconnectPolicy, ReconnectSettings};

/// 覆盖配置文件路径的环境变量。
pub const CONFIG_PATH_ENV: &str = "DOOR_CLIENT_CONFIG";
const DEFAULT_CONFIG_DIR: &str = "config";
const DEFAULT_CONFIG_FILE: &str = "door_client_config.json";

/// 门禁 WebSocket 客户端配置。
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct DoorClientConfig {
    /// 后端 WebSocket 服务的基础地址，例如 `"ws://127.0.0.1:8000"`。
    pub ws_base_url: String,
    /// 本 App 绑定的门 ID。`door_status` 事件总是报告此 ID。
    pub door_id: String,
    /// 写入 URL 查询参数 `client_type` 的客户端角色。
    pub client_type: ClientType,
    pub reconnect: ReconnectSettings,
    pub error_visibility: ErrorVisibility,
}

impl Default for DoorClientConfig {
    fn default() -> Self {
        Self {
            ws_base_url: "ws://127.0.0.1:8000".to_string(),
            door_id: "e43b48ac-6cce-430e-a119-5c5ff5d62967".to_string(),
            client_type: ClientType::Mobile,
            reconnect: ReconnectSettings::default(),
            error_visibility: ErrorVisibility::default(),
        }
    }
}

impl DoorClientConfig {
    /// 加载配置。
    ///
    /// 路径取自环境变量 `DOOR_CLIENT_CONFIG`，未设置时使用 `config/door_client_config.json`。
    /// 文件不存在时记录警告并返回默认配置；文件存在但无法读取或解析时返回错误。
    pub fn load() -> Result<Self> {
        let config_path = std::env::var_os(CONFIG_PATH_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_DIR).join(DEFAULT_CONFIG_FILE));

        if !config_path.exists() {
            log::warn!(
                "[DoorAccessMobile] 配置文件 '{}' 未找到，使用内置默认配置。",
                config_path.display()
            );
            return Ok(Self::default());
        }
        Self::load_from(&config_path)
    }

    /// 从指定路径加载配置。
    pub fn load_from(config_path: &Path) -> Result<Self> {
        let config_str = fs::read_to_string(config_path)
            .with_context(|| format!("无法读取配置文件 '{}' 的内容。", config_path.display()))?;

        let config: DoorClientConfig = serde_json::from_str(&config_str).with_context(|| {
            format!(
                "解析配置文件 '{}' 失败。请确保文件内容是有效的 JSON 格式且符合 {} 结构。",
                config_path.display(),
                std::any::type_name::<DoorClientConfig>()
            )
        })?;

        log::info!(
            "[DoorAccessMobile] 已从 '{}' 加载客户端配置。服务地址: {}, 门 ID: {}",
            config_path.display(),
            config.ws_base_url,
            config.door_id
        );
        Ok(config)
    }

    /// 构建连接端点：`{ws_base_url}/ws/doors/{door_id}/?client_type={client_type}`。
    pub fn endpoint_url(&self) -> Result<Url, ClientError> {
        let endpoint = format!(
            "{}/ws/doors/{}/?client_type={}",
            self.ws_base_url.trim_end_matches('/'),
            self.door_id,
            self.client_type.as_query_value()
        );
        let url = Url::parse(&endpoint).map_err(|e| ClientError::InvalidEndpoint {
            endpoint: endpoint.clone(),
            reason: e.to_string(),
        })?;
        match url.scheme() {
            "ws" | "wss" => Ok(url),
            other => Err(ClientError::InvalidEndpoint {
                endpoint,
                reason: format!("不支持的协议 '{}'，只允许 ws / wss", other),
            }),
        }
    }

    pub fn reconnect_policy(&self) -> ReconnectPolicy {
        ReconnectPolicy::from(&self.reconnect)
    }
}
