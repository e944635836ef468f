// rust_websocket_utils/src/server/transport.rs

//! 包含服务端 WebSocket 监听、接受连接和通信逻辑。

use crate::error::WsError;
use log::{error, info};
use std::net::SocketAddr;
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::{accept_async, WebSocketStream};

/// 经过 WebSocket 握手后的 TCP 流。
pub type WsStream = WebSocketStream<TcpStream>;

/// `ServerTransport` 负责处理 WebSocket 服务端的监听和连接接受。
pub struct ServerTransport;

impl ServerTransport {
    /// 绑定到指定地址并开始提供服务。
    ///
    /// # Arguments
    /// * `addr`: 服务器监听的地址 (例如 "127.0.0.1:8000")。
    /// * `on_connect`: 新的 WebSocket 连接建立时调用的异步回调，参数为握手后的流与对端地址。
    ///   回调在独立的 Tokio 任务中为每个连接执行。
    ///
    /// # Returns
    /// * `Result<(), WsError>`: 监听器绑定失败时返回错误；否则无限期运行。
    pub async fn start<F, Fut>(addr: SocketAddr, on_connect: F) -> Result<(), WsError>
    where
        F: Fn(WsStream, SocketAddr) -> Fut + Send + Sync + Clone + 'static,
        Fut: std::future::Future<Output = ()> + Send + 'static,
    {
        let listener = TcpListener::bind(&addr).await?;
        Self::serve(listener, on_connect).await
    }

    /// 在一个已经绑定好的监听器上提供服务。
    ///
    /// 测试中先绑定 `127.0.0.1:0` 再调用本函数，可以避免"先探测端口再绑定"的竞争。
    pub async fn serve<F, Fut>(listener: TcpListener, on_connect: F) -> Result<(), WsError>
    where
        F: Fn(WsStream, SocketAddr) -> Fut + Send + Sync + Clone + 'static,
        Fut: std::future::Future<Output = ()> + Send + 'static,
    {
        info!("WebSocket 服务器正在监听地址: {}", listener.local_addr()?);

        loop {
            match listener.accept().await {
                Ok((tcp_stream, peer_addr)) => {
                    info!("从 {} 接受了新的 TCP 连接", peer_addr);
                    let on_connect_callback = on_connect.clone();

                    tokio::spawn(async move {
                        match accept_async(tcp_stream).await {
                            Ok(ws_stream) => {
                                info!("与 {} 的 WebSocket 握手成功", peer_addr);
                                on_connect_callback(ws_stream, peer_addr).await;
                            }
                            Err(e) => {
                                // 握手失败只影响这一条连接
                                error!("与 {} 的 WebSocket 握手失败: {}", peer_addr, e);
                            }
                        }
                    });
                }
                Err(e) => {
                    error!("接受 TCP 连接失败: {}。服务器将继续运行。", e);
                }
            }
        }
    }
}
