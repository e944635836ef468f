// DoorAccessMobile/src/notification.rs

//! 通知转发器。
//!
//! 订阅事件总线，把门禁相关事件转换为面向用户的通知，交给 `NotificationSink` 展示。
//! 展示方式 (系统通知、弹窗等) 由具体的 sink 决定；默认的 `LogNotificationSink` 只写日志。

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::DateTime;
use log::{debug, info, warn};

use crate::event::{DoorEvent, EventKind};
use crate::event_bus::{EventBus, Subscription};

/// 一条面向用户的通知。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserNotice {
    pub title: String,
    pub message: String,
    pub high_priority: bool,
}

/// 通知的展示端。
pub trait NotificationSink: Send + Sync + 'static {
    fn show(&self, notice: &UserNotice);
}

/// 只把通知写入日志的 sink。
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotificationSink;

impl NotificationSink for LogNotificationSink {
    fn show(&self, notice: &UserNotice) {
        if notice.high_priority {
            warn!("[DoorAccessMobile] 通知 (高优先级): {} - {}", notice.title, notice.message);
        } else {
            info!("[DoorAccessMobile] 通知: {} - {}", notice.title, notice.message);
        }
    }
}

/// 把时间戳格式化为 `HH:MM`；无法解析时返回空串。
fn format_time(timestamp: &str) -> String {
    DateTime::parse_from_rfc3339(timestamp)
        .map(|at| at.format("%H:%M").to_string())
        .unwrap_or_default()
}

/// 事件到用户通知的映射。门状态变化只记录日志，不产生通知。
pub fn notice_for(event: &DoorEvent) -> Option<UserNotice> {
    match event {
        DoorEvent::AccessGranted { user, timestamp } => Some(UserNotice {
            title: "Access Granted".to_string(),
            message: format!(
                "{} has accessed the door at {}",
                user.as_deref().unwrap_or("Someone"),
                format_time(timestamp)
            ),
            high_priority: false,
        }),
        DoorEvent::AccessDenied { .. } => Some(UserNotice {
            title: "Security Alert".to_string(),
            message: "Unauthorized access attempt detected".to_string(),
            high_priority: true,
        }),
        DoorEvent::Notification { title, message, priority } => {
            if title.is_empty() || message.is_empty() {
                return None;
            }
            Some(UserNotice {
                title: title.clone(),
                message: message.clone(),
                high_priority: priority.as_deref() == Some("high"),
            })
        }
        DoorEvent::DoorStatusChanged { .. } | DoorEvent::ConnectionStatus { .. } => None,
    }
}

/// 订阅事件总线并转发通知。
pub struct NotificationRelay {
    bus: EventBus,
    sink: Arc<dyn NotificationSink>,
    subscriptions: Mutex<Vec<Subscription>>,
}

impl NotificationRelay {
    pub fn new(bus: EventBus, sink: Arc<dyn NotificationSink>) -> Self {
        Self { bus, sink, subscriptions: Mutex::new(Vec::new()) }
    }

    fn lock_subscriptions(&self) -> MutexGuard<'_, Vec<Subscription>> {
        self.subscriptions.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// 注册订阅。重复调用不会重复注册。
    pub fn initialize(&self) {
        let mut subscriptions = self.lock_subscriptions();
        if !subscriptions.is_empty() {
            return;
        }
        info!("[DoorAccessMobile] 初始化通知转发器。");

        subscriptions.push(self.bus.add_event_listener(EventKind::DoorStatusChanged, |event| {
            debug!("[DoorAccessMobile] 门状态通知: {:?}", event);
        }));
        for kind in [EventKind::AccessGranted, EventKind::AccessDenied, EventKind::Notification] {
            let sink = Arc::clone(&self.sink);
            subscriptions.push(self.bus.add_event_listener(kind, move |event| {
                if let Some(notice) = notice_for(event) {
                    sink.show(&notice);
                }
            }));
        }
    }

    pub fn is_initialized(&self) -> bool {
        !self.lock_subscriptions().is_empty()
    }

    /// 注销全部订阅。之后可以再次 `initialize()`。
    pub fn cleanup(&self) {
        let mut subscriptions = self.lock_subscriptions();
        if subscriptions.is_empty() {
            return;
        }
        info!("[DoorAccessMobile] 清理通知转发器。");
        for subscription in subscriptions.drain(..) {
            subscription.unsubscribe();
        }
    }
}
