// rust_websocket_utils/src/client/transport.rs

//! 客户端 WebSocket 传输层核心逻辑。
//!
//! 提供建立连接以及接收信号的功能。
//! `ClientConnection::into_channels` 把一条连接拆成两个后台任务 (写任务与读任务)，
//! 上层只需通过 tokio mpsc 通道收发 `OutboundFrame` / `InboundSignal`。

use futures_util::{
    stream::{SplitSink, SplitStream},
    SinkExt,
    StreamExt,
};
use log::{debug, error, info, warn};
use tokio::sync::mpsc;
use tokio_tungstenite::{
    connect_async,
    tungstenite::protocol::Message,
    tungstenite::Error as TungsteniteError,
    WebSocketStream,
};
use url::Url;

use crate::error::WsError;
use crate::message::{InboundSignal, OutboundFrame};

/// 可能经过 TLS 加密的客户端 WebSocket 流。
pub type ClientWsStream = WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>>;

/// 一条活动的客户端 WebSocket 连接。
pub struct ClientConnection {
    ws_sender: SplitSink<ClientWsStream, Message>,
    ws_receiver: SplitStream<ClientWsStream>,
}

impl ClientConnection {
    /// 把连接交给两个后台任务，返回 (出站发送端, 入站接收端)。
    ///
    /// - 写任务按顺序发送 `OutboundFrame`；发送 `Close` 后或出站发送端全部被丢弃后结束。
    /// - 读任务把收到的内容转换为 `InboundSignal`；`Closed` 总是最后一个信号，
    ///   入站接收端被丢弃后读任务也会结束。
    pub fn into_channels(self) -> (mpsc::UnboundedSender<OutboundFrame>, mpsc::UnboundedReceiver<InboundSignal>) {
        let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel::<OutboundFrame>();
        let (inbound_tx, inbound_rx) = mpsc::unbounded_channel::<InboundSignal>();
        let ClientConnection { mut ws_sender, mut ws_receiver } = self;

        tokio::spawn(async move {
            while let Some(frame) = outbound_rx.recv().await {
                let is_close = matches!(frame, OutboundFrame::Close { .. });
                if let Err(e) = ws_sender.send(frame.into_message()).await {
                    warn!("客户端：写任务发送帧失败，写任务结束: {}", e);
                    break;
                }
                if is_close {
                    debug!("客户端：关闭帧已发送，写任务结束。");
                    break;
                }
            }
        });

        tokio::spawn(async move {
            loop {
                let signal = receive_message(&mut ws_receiver).await;
                let is_closed = signal.is_closed();
                if inbound_tx.send(signal).is_err() {
                    debug!("客户端：入站接收端已丢弃，读任务结束。");
                    break;
                }
                if is_closed {
                    break;
                }
            }
        });

        (outbound_tx, inbound_rx)
    }
}

/// 异步连接到指定的 WebSocket 服务器。
///
/// # Arguments
/// * `url_str` - 完整的 WebSocket URL (例如 "ws://127.0.0.1:8000/ws/doors/xxx/?client_type=mobile")。
///
/// # Returns
/// * `Result<ClientConnection, WsError>` - 握手成功时返回连接；URL 无效、连接被拒绝或握手失败时返回错误。
pub async fn connect_client(url_str: &str) -> Result<ClientConnection, WsError> {
    info!("客户端：开始尝试连接到 WebSocket 服务器，URL: {}", url_str);
    let parsed_url = Url::parse(url_str)
        .map_err(|e| WsError::InvalidUrl(format!("无效的 WebSocket URL '{}': {}", url_str, e)))?;

    match connect_async(parsed_url.as_str()).await {
        Ok((ws_stream, response)) => {
            info!("客户端：已成功连接到 {} (HTTP 状态码: {})", url_str, response.status());
            debug!("客户端：WebSocket 连接响应头: {:?}", response.headers());
            let (ws_sender, ws_receiver) = ws_stream.split();
            Ok(ClientConnection { ws_sender, ws_receiver })
        }
        Err(e) => {
            error!("客户端：连接到 {} 失败，错误: {}", url_str, e);
            Err(WsError::WebSocketProtocolError(e))
        }
    }
}

/// 从接收流中读取下一个对上层有意义的信号。
///
/// Ping/Pong 与原始 Frame 被跳过 (由 tokio-tungstenite 自动应答)。
/// 对端关闭帧转换为带关闭码的 `Closed`；流结束或底层报告连接已关闭时返回关闭码 1006 的 `Closed`。
pub async fn receive_message(ws_receiver: &mut SplitStream<ClientWsStream>) -> InboundSignal {
    loop {
        match ws_receiver.next().await {
            Some(Ok(Message::Text(text))) => break InboundSignal::Frame(text),
            Some(Ok(Message::Binary(bin))) => {
                debug!("客户端：收到非预期的二进制消息，长度: {} 字节", bin.len());
                break InboundSignal::Error("客户端收到了非预期的 WebSocket 二进制消息".to_string());
            }
            Some(Ok(Message::Ping(_))) | Some(Ok(Message::Pong(_))) | Some(Ok(Message::Frame(_))) => {
                // 控制帧由底层库处理，继续等待
            }
            Some(Ok(Message::Close(close_frame))) => {
                debug!("客户端：收到 Close 控制帧，详细信息: {:?}", close_frame);
                break InboundSignal::from_close_frame(close_frame);
            }
            Some(Err(TungsteniteError::ConnectionClosed)) | Some(Err(TungsteniteError::AlreadyClosed)) => {
                debug!("客户端：连接已关闭 (ConnectionClosed / AlreadyClosed)。");
                break InboundSignal::abnormal("连接已关闭");
            }
            Some(Err(e)) => {
                error!("客户端：从 WebSocket 流接收消息时发生底层错误: {}", e);
                break InboundSignal::abnormal(e.to_string());
            }
            None => {
                debug!("客户端：WebSocket 接收流已结束。");
                break InboundSignal::abnormal("接收流已结束");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::NORMAL_CLOSURE;
    use crate::server::transport::{ServerTransport, WsStream};
    use std::borrow::Cow;
    use std::net::SocketAddr;
    use tokio::net::TcpListener;
    use tokio::time::{timeout, Duration};
    use tokio_tungstenite::tungstenite::protocol::{frame::coding::CloseCode, CloseFrame};

    /// 回显服务端：把收到的文本帧原样发回；收到 "kick" 时以 4001 关闭连接。
    async fn echo_handler(mut ws_stream: WsStream, peer_addr: SocketAddr) {
        info!("[测试回显服务端]：新客户端已连接: {}", peer_addr);
        while let Some(Ok(msg)) = ws_stream.next().await {
            match msg {
                Message::Text(text) if text == "kick" => {
                    let frame = CloseFrame { code: CloseCode::from(4001), reason: Cow::Borrowed("kicked") };
                    let _ = ws_stream.send(Message::Close(Some(frame))).await;
                }
                Message::Text(text) => {
                    if ws_stream.send(Message::Text(text)).await.is_err() {
                        break;
                    }
                }
                _ => {}
            }
        }
    }

    async fn start_echo_server() -> (String, tokio::task::JoinHandle<Result<(), WsError>>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("无法绑定到随机端口");
        let addr = listener.local_addr().expect("无法获取本地监听地址");
        let handle = tokio::spawn(ServerTransport::serve(listener, echo_handler));
        (format!("ws://{}", addr), handle)
    }

    #[tokio::test]
    /// 通道化的连接应能发送文本帧并收到回显，主动关闭后收到关闭码 1000。
    async fn test_client_channels_echo_and_normal_close() {
        let _ = env_logger::builder().is_test(true).try_init();
        let (url, server_handle) = start_echo_server().await;

        let connection = connect_client(&url).await.expect("连接本地回显服务端失败");
        let (outbound, mut inbound) = connection.into_channels();
        for text in ["{\"type\":\"hello\"}", "{\"type\":\"again\"}"] {
            outbound.send(OutboundFrame::Text(text.to_string())).expect("出站通道不应已关闭");
            let echoed = timeout(Duration::from_secs(5), inbound.recv()).await.expect("等待回显超时");
            assert_eq!(echoed, Some(InboundSignal::Frame(text.to_string())));
        }

        outbound
            .send(OutboundFrame::Close { code: NORMAL_CLOSURE, reason: "User disconnected".to_string() })
            .expect("出站通道不应已关闭");
        let closed = timeout(Duration::from_secs(5), inbound.recv()).await.expect("等待关闭超时");
        match closed {
            Some(InboundSignal::Closed { code, .. }) => assert_eq!(code, NORMAL_CLOSURE),
            other => panic!("预期 Closed 信号，实际为 {:?}", other),
        }
        // Closed 之后读任务结束，通道随之关闭
        assert_eq!(timeout(Duration::from_secs(5), inbound.recv()).await.expect("等待通道关闭超时"), None);

        server_handle.abort();
    }

    #[tokio::test]
    /// 服务端以自定义关闭码关闭时，客户端应收到相同的关闭码。
    async fn test_client_receives_server_close_code() {
        let _ = env_logger::builder().is_test(true).try_init();
        let (url, server_handle) = start_echo_server().await;

        let connection = connect_client(&url).await.expect("连接本地回显服务端失败");
        let (outbound, mut inbound) = connection.into_channels();
        outbound.send(OutboundFrame::Text("kick".to_string())).expect("出站通道不应已关闭");

        let signal = timeout(Duration::from_secs(5), async {
            loop {
                match inbound.recv().await {
                    Some(InboundSignal::Frame(_)) => continue,
                    other => break other,
                }
            }
        })
        .await
        .expect("等待关闭超时");
        assert_eq!(signal, Some(InboundSignal::Closed { code: 4001, reason: "kicked".to_string() }));

        server_handle.abort();
    }

    #[tokio::test]
    async fn test_connect_client_failures() {
        let invalid = connect_client("not a url").await;
        assert!(matches!(invalid, Err(WsError::InvalidUrl(_))), "无效 URL 应返回 InvalidUrl");

        // 绑定后立即释放，得到一个大概率无人监听的端口
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("无法绑定到随机端口");
        let addr = listener.local_addr().expect("无法获取本地监听地址");
        drop(listener);
        let refused = connect_client(&format!("ws://{}", addr)).await;
        assert!(refused.is_err(), "连接无人监听的端口应失败");
    }
}
