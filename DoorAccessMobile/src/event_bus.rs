// DoorAccessMobile/src/event_bus.rs

//! 按事件类型分组的发布/订阅注册表。
//!
//! - 同一类型的订阅者按注册顺序依次同步调用。
//! - 某个订阅者 panic 时在总线边界被捕获并记录日志，不影响其后的订阅者和其他事件。
//! - 不缓存事件：晚注册的订阅者不会收到注册之前发出的事件。
//! - 每个类型的订阅列表采用写时复制；发送时先取快照再释放锁，因此回调中注册/注销是安全的，
//!   新的变更只对下一次发送生效。

use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use log::{debug, error};

use crate::event::{DoorEvent, EventKind};

/// 订阅回调。
pub type Listener = Arc<dyn Fn(&DoorEvent) + Send + Sync>;

#[derive(Clone)]
struct Registration {
    id: u64,
    listener: Listener,
}

#[derive(Default)]
struct BusInner {
    next_id: u64,
    listeners: HashMap<EventKind, Arc<Vec<Registration>>>,
}

/// 事件总线。克隆得到的是指向同一注册表的句柄。
#[derive(Clone, Default)]
pub struct EventBus {
    inner: Arc<Mutex<BusInner>>,
}

/// 一次订阅的句柄。调用 `unsubscribe` 移除且仅移除这一次注册。
///
/// 句柄被丢弃时不会自动注销。
#[must_use = "丢弃 Subscription 后将无法注销该订阅"]
#[derive(Debug)]
pub struct Subscription {
    id: u64,
    kind: EventKind,
    bus: Weak<Mutex<BusInner>>,
}

impl Subscription {
    pub fn kind(&self) -> EventKind {
        self.kind
    }

    /// 注销此订阅。重复调用或总线已被释放时不做任何事。
    pub fn unsubscribe(&self) {
        let Some(inner) = self.bus.upgrade() else {
            return;
        };
        let mut guard = lock_inner(&inner);
        if let Some(current) = guard.listeners.get(&self.kind) {
            if current.iter().any(|r| r.id == self.id) {
                let remaining: Vec<Registration> = current.iter().filter(|r| r.id != self.id).cloned().collect();
                guard.listeners.insert(self.kind, Arc::new(remaining));
                debug!("[DoorAccessMobile] 事件总线：已注销订阅 #{} ({})", self.id, self.kind);
            }
        }
    }
}

fn lock_inner(inner: &Mutex<BusInner>) -> MutexGuard<'_, BusInner> {
    inner.lock().unwrap_or_else(PoisonError::into_inner)
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// 为指定事件类型注册订阅者。同一回调可重复注册，每次注册相互独立。
    pub fn add_event_listener<F>(&self, kind: EventKind, listener: F) -> Subscription
    where
        F: Fn(&DoorEvent) + Send + Sync + 'static,
    {
        let mut guard = lock_inner(&self.inner);
        guard.next_id += 1;
        let id = guard.next_id;

        let mut updated: Vec<Registration> =
            guard.listeners.get(&kind).map(|current| current.to_vec()).unwrap_or_default();
        updated.push(Registration { id, listener: Arc::new(listener) });
        guard.listeners.insert(kind, Arc::new(updated));

        Subscription { id, kind, bus: Arc::downgrade(&self.inner) }
    }

    /// 把事件同步地交给该类型当前的所有订阅者。
    pub fn emit(&self, event: &DoorEvent) {
        let kind = event.kind();
        let snapshot = {
            let guard = lock_inner(&self.inner);
            match guard.listeners.get(&kind) {
                Some(list) => Arc::clone(list),
                None => return,
            }
        };

        for registration in snapshot.iter() {
            let listener = &registration.listener;
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| listener(event)));
            if let Err(payload) = outcome {
                let message = payload
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| payload.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "未知 panic".to_string());
                error!(
                    "[DoorAccessMobile] 事件总线：{} 的订阅者 #{} 执行时 panic: {}",
                    kind, registration.id, message
                );
            }
        }
    }

    /// 指定类型当前的订阅者数量。
    pub fn listener_count(&self, kind: EventKind) -> usize {
        lock_inner(&self.inner).listeners.get(&kind).map_or(0, |list| list.len())
    }
}
