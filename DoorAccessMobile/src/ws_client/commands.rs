// DoorAccessMobile/src/ws_client/commands.rs

//! 出站命令：开门、人脸识别请求、删除人脸向量。
//!
//! 命令由 `door_models::OutboundCommand` 构造 (生成关联 ID 与时间戳、检查前置条件)，
//! 再经连接管理器的 `send_raw` 发出。前置条件不满足时不会发送任何内容。

use door_models::OutboundCommand;
use log::info;

use crate::error::ClientError;
use crate::ws_client::service::DoorSocketClient;

impl DoorSocketClient {
    /// 发送开门命令。不参考任何本地缓存的门状态；不存在关门命令。
    ///
    /// 未连接时触发重连并返回 `ClientError::NotConnected`。
    pub fn open_door(&self, door_id: &str) -> Result<(), ClientError> {
        let command = OutboundCommand::open_door(door_id);
        info!(
            "[DoorAccessMobile] 发送开门命令，门 ID: {}, command_id: {:?}",
            door_id,
            command.correlation_id()
        );
        self.send_raw(&command)
    }

    /// 发送人脸识别 (注册) 请求。
    ///
    /// 图片为空或姓名为空/空白时返回 `ClientError::InvalidCommand`，不发送任何内容。
    pub fn send_face_recognition_request(&self, image_base64: &str, name: &str) -> Result<(), ClientError> {
        let command = OutboundCommand::face_recognition_request(image_base64, name)?;
        info!(
            "[DoorAccessMobile] 发送人脸识别请求，姓名: {}, request_id: {:?}",
            name,
            command.correlation_id()
        );
        self.send_raw(&command)
    }

    /// 请求后端删除指定姓名登记的人脸向量。
    pub fn delete_face_vector(&self, name: &str) -> Result<(), ClientError> {
        let command = OutboundCommand::face_vector_delete(name)?;
        info!("[DoorAccessMobile] 发送人脸向量删除请求，姓名: {}", name);
        self.send_raw(&command)
    }
}
