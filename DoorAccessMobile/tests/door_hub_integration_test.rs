// DoorAccessMobile/tests/door_hub_integration_test.rs

//! 使用真实的 tokio-tungstenite 连接器，对本地门禁中枢模拟器进行端到端测试。

use std::net::SocketAddr;
use std::time::Duration;

use door_access_mobile::config::DoorClientConfig;
use door_access_mobile::door_hub::DoorHub;
use door_access_mobile::event::{DoorEvent, DoorEventSource, EventKind};
use door_access_mobile::event_bus::{EventBus, Subscription};
use door_access_mobile::ws_client::{ConnectionState, DoorSocketClient, ReconnectKind};
use door_models::DoorState;
use tokio::net::TcpListener;
use tokio::sync::mpsc;

const DOOR: &str = "front-door";
const EVENT_TIMEOUT: Duration = Duration::from_secs(5);

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

async fn start_hub() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("绑定测试端口失败");
    let addr = listener.local_addr().expect("获取监听地址失败");
    tokio::spawn(DoorHub::serve(listener));
    addr
}

fn config_for(addr: SocketAddr) -> DoorClientConfig {
    DoorClientConfig {
        ws_base_url: format!("ws://{}", addr),
        door_id: DOOR.to_string(),
        ..DoorClientConfig::default()
    }
}

/// 把总线上的全部对外事件转发到一个通道中。
fn capture(bus: &EventBus) -> (mpsc::UnboundedReceiver<DoorEvent>, Vec<Subscription>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let subscriptions = [
        EventKind::ConnectionStatus,
        EventKind::DoorStatusChanged,
        EventKind::AccessGranted,
        EventKind::AccessDenied,
        EventKind::Notification,
    ]
    .into_iter()
    .map(|kind| {
        let tx = tx.clone();
        bus.add_event_listener(kind, move |event| {
            let _ = tx.send(event.clone());
        })
    })
    .collect();
    (rx, subscriptions)
}

async fn next_event(rx: &mut mpsc::UnboundedReceiver<DoorEvent>) -> DoorEvent {
    tokio::time::timeout(EVENT_TIMEOUT, rx.recv())
        .await
        .expect("等待事件超时")
        .expect("事件通道已关闭")
}

#[tokio::test]
/// 连接、收到初始门状态、开门并收到硬件回报、发送人脸请求、断开。
async fn test_client_round_trip_with_door_hub() {
    init_logger();
    let addr = start_hub().await;
    let bus = EventBus::new();
    let (mut events, _subscriptions) = capture(&bus);
    let client = DoorSocketClient::new(&config_for(addr), bus).expect("创建客户端失败");

    client.connect();
    assert_eq!(next_event(&mut events).await, DoorEvent::connected());

    match next_event(&mut events).await {
        DoorEvent::DoorStatusChanged { status, door_id, source, .. } => {
            assert_eq!(status, DoorState::Closed);
            assert_eq!(door_id, DOOR);
            assert_eq!(source, None);
        }
        other => panic!("预期初始门状态，实际为 {:?}", other),
    }
    assert!(client.is_connected());

    client.open_door(DOOR).expect("已连接时开门命令应发送成功");
    match next_event(&mut events).await {
        DoorEvent::DoorStatusChanged { status, physical_state, source, command_id, .. } => {
            assert_eq!(status, DoorState::Open);
            assert_eq!(physical_state, DoorState::Open);
            assert_eq!(source, Some(DoorEventSource::HardwareCommand));
            assert!(command_id.is_some(), "硬件回报应回显 command_id");
        }
        other => panic!("预期硬件门状态，实际为 {:?}", other),
    }

    client
        .send_face_recognition_request("data:image/png;base64,QUJDRA==", "Alice")
        .expect("人脸识别请求应发送成功");
    match next_event(&mut events).await {
        DoorEvent::Notification { title, message, .. } => {
            assert_eq!(title, "Face registered");
            assert!(message.contains("Alice"));
        }
        other => panic!("预期通知，实际为 {:?}", other),
    }

    client.disconnect();
    assert_eq!(client.state(), ConnectionState::Disconnected);
    assert_eq!(client.pending_reconnect(), None, "用户断开后不应安排重连");
}

#[tokio::test]
/// 后端不可达：首次失败被报告，并安排退避重连。
async fn test_unreachable_hub_reports_first_failure() {
    init_logger();
    // 绑定后立即释放，得到一个大概率无人监听的端口
    let addr = {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("绑定测试端口失败");
        listener.local_addr().expect("获取监听地址失败")
    };
    let bus = EventBus::new();
    let (mut events, _subscriptions) = capture(&bus);
    let client = DoorSocketClient::new(&config_for(addr), bus).expect("创建客户端失败");

    client.connect();
    match next_event(&mut events).await {
        DoorEvent::ConnectionStatus { connected, error } => {
            assert!(!connected);
            assert!(error.is_some(), "失败事件应携带错误描述");
        }
        other => panic!("预期连接失败事件，实际为 {:?}", other),
    }
    assert_eq!(client.state(), ConnectionState::Disconnected);

    // 失败事件先于退避定时器发出，稍等片刻
    let plan = tokio::time::timeout(EVENT_TIMEOUT, async {
        loop {
            if let Some(plan) = client.pending_reconnect() {
                return plan;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("失败后应安排退避重连");
    assert_eq!(plan.kind, ReconnectKind::Backoff { attempt: 1 });
    assert_eq!(plan.delay, Duration::from_millis(2000));

    client.disconnect();
    assert_eq!(client.pending_reconnect(), None);
}
