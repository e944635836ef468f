// rust_websocket_utils/src/message.rs

//! 定义传输层与上层逻辑之间交换的帧与信号。
//!
//! 上层 (例如门禁客户端的连接管理器) 不直接接触 `tungstenite::Message`：
//! - 发送方向使用 `OutboundFrame`，只有文本帧与带关闭码的关闭帧两种；
//! - 接收方向使用 `InboundSignal`，把 Ping/Pong 等控制帧吸收掉，只保留文本帧、关闭与错误。

use std::borrow::Cow;

use tokio_tungstenite::tungstenite::protocol::{frame::coding::CloseCode, CloseFrame, Message};

/// 正常关闭。用户主动断开时使用。
pub const NORMAL_CLOSURE: u16 = 1000;
/// 对方发送了不带关闭码的关闭帧。
pub const NO_STATUS_RECEIVED: u16 = 1005;
/// 连接在没有关闭握手的情况下中断 (例如网络断开)。
pub const ABNORMAL_CLOSURE: u16 = 1006;

/// 发往对端的帧。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboundFrame {
    /// JSON 文本帧。
    Text(String),
    /// 以指定关闭码和原因发起关闭握手。发出后写端即结束。
    Close { code: u16, reason: String },
}

impl OutboundFrame {
    /// 转换为底层 tungstenite 消息。
    pub fn into_message(self) -> Message {
        match self {
            OutboundFrame::Text(text) => Message::Text(text),
            OutboundFrame::Close { code, reason } => Message::Close(Some(CloseFrame {
                code: CloseCode::from(code),
                reason: Cow::Owned(reason),
            })),
        }
    }
}

/// 从对端收到的信号。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundSignal {
    /// 一条文本帧的原始内容。
    Frame(String),
    /// 连接已关闭。这是一条连接上的最后一个信号。
    Closed { code: u16, reason: String },
    /// 非致命的接收错误 (例如收到二进制帧)，连接可能仍然存活。
    Error(String),
}

impl InboundSignal {
    /// 根据对端的关闭帧构造 `Closed` 信号；没有关闭码时使用 1005。
    pub fn from_close_frame(frame: Option<CloseFrame<'_>>) -> Self {
        match frame {
            Some(frame) => InboundSignal::Closed {
                code: u16::from(frame.code),
                reason: frame.reason.into_owned(),
            },
            None => InboundSignal::Closed { code: NO_STATUS_RECEIVED, reason: String::new() },
        }
    }

    /// 连接在没有关闭握手的情况下结束。
    pub fn abnormal(reason: impl Into<String>) -> Self {
        InboundSignal::Closed { code: ABNORMAL_CLOSURE, reason: reason.into() }
    }

    pub fn is_closed(&self) -> bool {
        matches!(self, InboundSignal::Closed { .. })
    }
}
