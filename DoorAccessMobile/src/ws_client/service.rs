// DoorAccessMobile/src/ws_client/service.rs

//! 门禁 WebSocket 客户端服务：连接生命周期管理。
//!
//! - `connect()`：仅在 `Disconnected` 时发起打开，其余状态下为空操作，保证同一时刻至多一条活动连接。
//! - 打开失败：按退避策略重连，累计次数达到上限后停止，直到外部再次调用 `connect()`。
//! - 已建立的连接被非用户原因关闭：以固定的极短延迟立即重连，不经过退避阶梯。
//! - `disconnect()`：取消待执行的重连，以关闭码 1000 关闭连接，并在下一次 `connect()` 之前禁止自动重连。
//!
//! 所有状态变更都在 `ConnectionCore` 的一个短临界区内完成，临界区内不 `.await`、不发出事件。
//! 每次 `connect()` / `disconnect()` 都会递增代数 (generation)；旧连接和旧定时器的回调因代数不符而被忽略。

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use log::{debug, info, warn};
use rust_websocket_utils::error::WsError;
use rust_websocket_utils::message::{InboundSignal, OutboundFrame, ABNORMAL_CLOSURE, NORMAL_CLOSURE};
use serde::Serialize;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use url::Url;

use crate::config::DoorClientConfig;
use crate::error::ClientError;
use crate::event::{DoorEvent, ErrorVisibility};
use crate::event_bus::EventBus;
use crate::ws_client::connector::{SocketConnector, SocketLink, TungsteniteConnector};
use crate::ws_client::normalizer::MessageNormalizer;
use crate::ws_client::reconnect::{ReconnectKind, ReconnectPlan, ReconnectPolicy};

/// 用户主动断开时发送的关闭原因。
pub const USER_DISCONNECT_REASON: &str = "User disconnected";
/// 过期连接 (在 `disconnect()` 或新的 `connect()` 之后才打开成功) 被立即关闭时使用的原因。
const SUPERSEDED_REASON: &str = "Superseded";

/// 连接状态，由连接管理器独占。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
}

struct ReconnectTimer {
    handle: JoinHandle<()>,
    plan: ReconnectPlan,
}

#[derive(Default)]
struct ConnectionCore {
    state: ConnectionState,
    /// 当前这一轮连续打开失败已经排定的退避重连次数。
    attempts: u32,
    generation: u64,
    user_closed: bool,
    reconnect: Option<ReconnectTimer>,
    outbound: Option<UnboundedSender<OutboundFrame>>,
}

impl ConnectionCore {
    fn cancel_reconnect(&mut self) {
        if let Some(timer) = self.reconnect.take() {
            timer.handle.abort();
        }
    }

    fn is_current(&self, generation: u64) -> bool {
        self.generation == generation && !self.user_closed
    }
}

struct ClientShared {
    endpoint: Url,
    connector: Arc<dyn SocketConnector>,
    policy: ReconnectPolicy,
    visibility: ErrorVisibility,
    bus: EventBus,
    normalizer: MessageNormalizer,
    core: Mutex<ConnectionCore>,
}

/// 门禁 WebSocket 客户端。
///
/// 由组合根显式构造；克隆得到的是指向同一连接的廉价句柄。
#[derive(Clone)]
pub struct DoorSocketClient {
    shared: Arc<ClientShared>,
}

impl DoorSocketClient {
    /// 使用真实的 tokio-tungstenite 连接器构造客户端。
    pub fn new(config: &DoorClientConfig, bus: EventBus) -> Result<Self, ClientError> {
        Self::with_connector(config, bus, Arc::new(TungsteniteConnector))
    }

    /// 使用指定的连接器构造客户端。
    pub fn with_connector(
        config: &DoorClientConfig,
        bus: EventBus,
        connector: Arc<dyn SocketConnector>,
    ) -> Result<Self, ClientError> {
        let endpoint = config.endpoint_url()?;
        info!("[DoorAccessMobile] WebSocket 客户端初始化，端点: {}", endpoint);
        Ok(Self {
            shared: Arc::new(ClientShared {
                endpoint,
                connector,
                policy: config.reconnect_policy(),
                visibility: config.error_visibility,
                bus,
                normalizer: MessageNormalizer::new(config.door_id.clone()),
                core: Mutex::new(ConnectionCore::default()),
            }),
        })
    }

    fn lock_core(&self) -> MutexGuard<'_, ConnectionCore> {
        self.shared.core.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn endpoint(&self) -> &Url {
        &self.shared.endpoint
    }

    pub fn door_id(&self) -> &str {
        self.shared.normalizer.door_id()
    }

    pub fn event_bus(&self) -> &EventBus {
        &self.shared.bus
    }

    pub fn state(&self) -> ConnectionState {
        self.lock_core().state
    }

    pub fn is_connected(&self) -> bool {
        self.state() == ConnectionState::Connected
    }

    /// 当前这一轮连续失败中已排定的退避重连次数。
    pub fn reconnect_attempts(&self) -> u32 {
        self.lock_core().attempts
    }

    /// 已排定但尚未触发的重连。
    pub fn pending_reconnect(&self) -> Option<ReconnectPlan> {
        self.lock_core().reconnect.as_ref().map(|timer| timer.plan)
    }

    /// 发起连接。已在连接中或已连接时为空操作。立即返回，结果通过 `ConnectionStatus` 事件报告。
    ///
    /// 自动重连次数已耗尽时，显式调用会开始新的一轮：计数归零，下一次失败会再次报告并重新退避。
    ///
    /// 必须在 tokio 运行时中调用。
    pub fn connect(&self) {
        self.begin_connect(true);
    }

    fn begin_connect(&self, explicit: bool) {
        let generation = {
            let mut core = self.lock_core();
            if core.state != ConnectionState::Disconnected {
                debug!("[DoorAccessMobile] 已在连接中或已连接 ({:?})，忽略 connect()", core.state);
                return;
            }
            if explicit && core.attempts >= self.shared.policy.max_attempts {
                debug!("[DoorAccessMobile] 自动重连次数已耗尽，显式 connect() 开始新一轮重连。");
                core.attempts = 0;
            }
            core.state = ConnectionState::Connecting;
            core.user_closed = false;
            core.generation += 1;
            core.cancel_reconnect();
            core.generation
        };

        info!("[DoorAccessMobile] 正在连接 {}", self.shared.endpoint);
        let opening = self.shared.connector.open(&self.shared.endpoint);
        let client = self.clone();
        tokio::spawn(async move {
            match opening.await {
                Ok(link) => client.handle_open(generation, link),
                Err(e) => client.handle_connect_failure(generation, e),
            }
        });
    }

    /// 用户主动断开。取消待执行的重连，以 1000 关闭连接，之后不再自动重连。
    pub fn disconnect(&self) {
        let outbound = {
            let mut core = self.lock_core();
            core.cancel_reconnect();
            core.user_closed = true;
            core.generation += 1;
            core.attempts = 0;
            core.state = ConnectionState::Disconnected;
            core.outbound.take()
        };

        if let Some(outbound) = outbound {
            let _ = outbound.send(OutboundFrame::Close {
                code: NORMAL_CLOSURE,
                reason: USER_DISCONNECT_REASON.to_string(),
            });
        }
        info!("[DoorAccessMobile] 已断开 WebSocket 连接 (用户操作)。");
    }

    /// 序列化并发送一条消息。
    ///
    /// 未连接时顺带触发一次 `connect()`，并返回 `ClientError::NotConnected`。
    pub fn send_raw<T: Serialize + ?Sized>(&self, message: &T) -> Result<(), ClientError> {
        let outbound = {
            let core = self.lock_core();
            match (&core.state, &core.outbound) {
                (ConnectionState::Connected, Some(outbound)) => Some(outbound.clone()),
                _ => None,
            }
        };

        let Some(outbound) = outbound else {
            warn!("[DoorAccessMobile] WebSocket 未连接，无法发送消息，正在尝试重新连接。");
            self.connect();
            return Err(ClientError::NotConnected);
        };

        let text = serde_json::to_string(message)?;
        debug!("[DoorAccessMobile] 发送消息: {}", text);
        outbound.send(OutboundFrame::Text(text)).map_err(|e| {
            warn!("[DoorAccessMobile] 发送消息失败: 写通道已关闭");
            ClientError::Transport(e.to_string())
        })
    }

    fn handle_open(&self, generation: u64, link: SocketLink) {
        let SocketLink { outbound, inbound } = link;
        {
            let mut core = self.lock_core();
            if !core.is_current(generation) {
                drop(core);
                debug!("[DoorAccessMobile] 过期的连接在打开后被立即关闭 (generation {})", generation);
                let _ = outbound.send(OutboundFrame::Close {
                    code: NORMAL_CLOSURE,
                    reason: SUPERSEDED_REASON.to_string(),
                });
                return;
            }
            core.state = ConnectionState::Connected;
            core.attempts = 0;
            core.outbound = Some(outbound);
        }

        info!("[DoorAccessMobile] WebSocket 已连接。");
        self.shared.bus.emit(&DoorEvent::connected());

        let client = self.clone();
        tokio::spawn(async move { client.read_loop(generation, inbound).await });
    }

    async fn read_loop(self, generation: u64, mut inbound: UnboundedReceiver<InboundSignal>) {
        while let Some(signal) = inbound.recv().await {
            match signal {
                InboundSignal::Frame(raw) => {
                    if !self.lock_core().is_current(generation) {
                        debug!("[DoorAccessMobile] 过期连接上的帧被丢弃。");
                        return;
                    }
                    if let Some(event) = self.shared.normalizer.normalize_frame(&raw) {
                        self.shared.bus.emit(&event);
                    }
                }
                InboundSignal::Error(message) => {
                    // 连接本身仍然存活，只记录日志
                    debug!("[DoorAccessMobile] WebSocket 接收出现问题，将自动恢复: {}", message);
                }
                InboundSignal::Closed { code, reason } => {
                    self.handle_close(generation, code, &reason);
                    return;
                }
            }
        }
        self.handle_close(generation, ABNORMAL_CLOSURE, "连接通道已结束");
    }

    fn handle_close(&self, generation: u64, code: u16, reason: &str) {
        {
            let mut core = self.lock_core();
            if !core.is_current(generation) {
                debug!("[DoorAccessMobile] 忽略过期连接或用户断开产生的关闭 (code: {})", code);
                return;
            }
            core.state = ConnectionState::Disconnected;
            core.outbound = None;
        }

        warn!(
            "[DoorAccessMobile] WebSocket 已关闭 (code: {}, reason: '{}')，立即重连。",
            code, reason
        );
        if self.shared.visibility == ErrorVisibility::Surface {
            self.shared.bus.emit(&DoorEvent::disconnected(Some(format!(
                "连接已关闭 (code: {}, reason: '{}')",
                code, reason
            ))));
        }
        self.schedule_reconnect(
            generation,
            ReconnectPlan { kind: ReconnectKind::Immediate, delay: self.shared.policy.immediate_delay },
        );
    }

    fn handle_connect_failure(&self, generation: u64, err: WsError) {
        let (report, next) = {
            let mut core = self.lock_core();
            if !core.is_current(generation) {
                debug!("[DoorAccessMobile] 忽略过期连接的打开失败: {}", err);
                return;
            }
            core.state = ConnectionState::Disconnected;
            core.outbound = None;

            let first_in_streak = core.attempts == 0;
            let report = !err.is_normal_closure()
                && (self.shared.visibility == ErrorVisibility::Surface || first_in_streak);
            let next = self.shared.policy.next_backoff(core.attempts);
            if let Some((attempt, _)) = next {
                core.attempts = attempt;
            }
            (report, next)
        };

        warn!("[DoorAccessMobile] WebSocket 连接失败: {}", err);
        if report {
            self.shared.bus.emit(&DoorEvent::disconnected(Some(err.to_string())));
        }

        match next {
            Some((attempt, delay)) => {
                info!("[DoorAccessMobile] {}ms 后进行第 {} 次重连。", delay.as_millis(), attempt);
                self.schedule_reconnect(
                    generation,
                    ReconnectPlan { kind: ReconnectKind::Backoff { attempt }, delay },
                );
            }
            None => {
                warn!(
                    "[DoorAccessMobile] 已达到最大重连次数 ({})，停止自动重连。",
                    self.shared.policy.max_attempts
                );
            }
        }
    }

    fn schedule_reconnect(&self, generation: u64, plan: ReconnectPlan) {
        let mut core = self.lock_core();
        if !core.is_current(generation) || core.state != ConnectionState::Disconnected {
            return;
        }
        let client = self.clone();
        // 在持锁期间创建定时任务，任务触发时需要先取得同一把锁
        let handle = tokio::spawn(async move {
            tokio::time::sleep(plan.delay).await;
            client.fire_reconnect(generation, plan.kind);
        });
        core.cancel_reconnect();
        core.reconnect = Some(ReconnectTimer { handle, plan });
    }

    fn fire_reconnect(&self, generation: u64, kind: ReconnectKind) {
        {
            let mut core = self.lock_core();
            if !core.is_current(generation) || core.state != ConnectionState::Disconnected {
                return;
            }
            core.reconnect = None;
            if kind == ReconnectKind::Immediate {
                core.attempts = 0;
            }
        }
        debug!("[DoorAccessMobile] 重连定时器触发 ({:?})。", kind);
        self.begin_connect(false);
    }
}
