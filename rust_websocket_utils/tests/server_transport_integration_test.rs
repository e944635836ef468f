// rust_websocket_utils/tests/server_transport_integration_test.rs

use futures_util::{SinkExt, StreamExt};
use log::{info, warn, LevelFilter};
use rust_websocket_utils::client::transport::connect_client;
use rust_websocket_utils::error::WsError;
use rust_websocket_utils::message::{InboundSignal, OutboundFrame, NORMAL_CLOSURE};
use rust_websocket_utils::server::transport::{ServerTransport, WsStream};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::protocol::Message as TungsteniteMessage;

// 辅助函数：初始化日志，仅用于测试，避免多次初始化
fn init_test_logger() {
    let _ = env_logger::builder().filter_level(LevelFilter::Info).is_test(true).try_init();
}

// on_connect 回调：回显第一条文本消息，然后以 1000 关闭连接并通知主测试任务
async fn test_on_connect_handler(
    mut ws_stream: WsStream,
    peer_addr: SocketAddr,
    connection_processed_tx: mpsc::UnboundedSender<String>,
) {
    info!("[Test Server] on_connect: 新的 WebSocket 连接来自 {}", peer_addr);

    if let Some(Ok(TungsteniteMessage::Text(text))) = ws_stream.next().await {
        info!("[Test Server] 从 {} 收到文本消息: {}", peer_addr, text);
        let echo_response = format!("Server received: {}", text);
        if ws_stream.send(TungsteniteMessage::Text(echo_response)).await.is_err() {
            warn!("[Test Server] 向 {} 发送回显失败", peer_addr);
        }
        let _ = connection_processed_tx.send(text);
    }

    let _ = ws_stream
        .send(OutboundFrame::Close { code: NORMAL_CLOSURE, reason: "test done".to_string() }.into_message())
        .await;
    // 继续读取直到对端完成关闭握手
    while let Some(Ok(_)) = ws_stream.next().await {}
    info!("[Test Server] test_on_connect_handler for {} 完成", peer_addr);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_server_accepts_connection_and_client_sees_close_code() {
    init_test_logger();

    let listener = TcpListener::bind("127.0.0.1:0").await.expect("无法绑定到随机端口");
    let addr = listener.local_addr().expect("无法获取本地监听地址");
    let (tx, mut rx) = mpsc::unbounded_channel::<String>();

    let server_handle = tokio::spawn(ServerTransport::serve(listener, move |ws_stream: WsStream, peer_addr| {
        test_on_connect_handler(ws_stream, peer_addr, tx.clone())
    }));

    let connection = connect_client(&format!("ws://{}", addr)).await.expect("[Test Main] 客户端连接失败");
    let (outbound, mut inbound) = connection.into_channels();
    outbound
        .send(OutboundFrame::Text("Hello from client!".to_string()))
        .expect("[Test Main] 客户端发送消息失败");

    let processed = timeout(Duration::from_secs(5), rx.recv()).await.expect("[Test Main] 等待服务器处理连接超时");
    assert_eq!(processed.as_deref(), Some("Hello from client!"));

    let echoed = timeout(Duration::from_secs(5), inbound.recv()).await.expect("[Test Main] 等待回显超时");
    assert_eq!(echoed, Some(InboundSignal::Frame("Server received: Hello from client!".to_string())));

    let closed = timeout(Duration::from_secs(5), inbound.recv()).await.expect("[Test Main] 等待关闭超时");
    assert_eq!(
        closed,
        Some(InboundSignal::Closed { code: NORMAL_CLOSURE, reason: "test done".to_string() }),
        "客户端应收到服务端发出的关闭码与原因"
    );

    server_handle.abort();
    let _ = server_handle.await;
}

#[tokio::test]
async fn test_server_start_reports_bind_failure() {
    init_test_logger();

    let occupied = TcpListener::bind("127.0.0.1:0").await.expect("无法绑定到随机端口");
    let addr = occupied.local_addr().expect("无法获取本地监听地址");

    let result = ServerTransport::start(addr, |_ws_stream: WsStream, _peer_addr: SocketAddr| async {}).await;
    assert!(matches!(result, Err(WsError::IoError(_))), "端口被占用时应返回 IoError，实际为 {:?}", result);
}
