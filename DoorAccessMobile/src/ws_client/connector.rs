// DoorAccessMobile/src/ws_client/connector.rs

//! 建立 WebSocket 连接的抽象。
//!
//! 连接管理器只通过 `SocketConnector` 打开连接，拿到的是一对 mpsc 通道 (`SocketLink`)，
//! 不直接接触 tungstenite 的流类型。生产环境使用 `TungsteniteConnector`；
//! 单元测试使用可手动控制打开结果的 `MockConnector`。

use futures_util::future::{BoxFuture, FutureExt};
use rust_websocket_utils::client::transport::connect_client;
use rust_websocket_utils::error::WsError;
use rust_websocket_utils::message::{InboundSignal, OutboundFrame};
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};
use url::Url;

/// 一条已打开的连接。
#[derive(Debug)]
pub struct SocketLink {
    /// 发往服务端的帧。发送 `OutboundFrame::Close` 后写端结束。
    pub outbound: UnboundedSender<OutboundFrame>,
    /// 来自服务端的信号，`InboundSignal::Closed` 总是最后一个。
    pub inbound: UnboundedReceiver<InboundSignal>,
}

/// 打开 WebSocket 连接的能力。
pub trait SocketConnector: Send + Sync + 'static {
    /// 发起一次打开。返回的 future 在握手成功或失败时完成。
    fn open(&self, url: &Url) -> BoxFuture<'static, Result<SocketLink, WsError>>;
}

/// 基于 `rust_websocket_utils` (tokio-tungstenite) 的连接器。
#[derive(Debug, Clone, Copy, Default)]
pub struct TungsteniteConnector;

impl SocketConnector for TungsteniteConnector {
    fn open(&self, url: &Url) -> BoxFuture<'static, Result<SocketLink, WsError>> {
        let url = url.to_string();
        async move {
            let connection = connect_client(&url).await?;
            let (outbound, inbound) = connection.into_channels();
            Ok(SocketLink { outbound, inbound })
        }
        .boxed()
    }
}
