// 错误处理模块

use thiserror::Error;
use serde::Serialize;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("IO 错误: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON 解析错误: {0}")]
    Json(#[from] serde_json::Error),

    #[error("未知模型: {0}")]
    InvalidModel(String),

    #[error("分离引擎不可用: {0}")]
    EngineNotAvailable(String),

    #[error("分离引擎执行失败: {0}")]
    EngineExecution(String),

    #[error("未找到分离输出: {0}")]
    OutputNotFound(String),

    #[error("分离超时: 超过 {0} 秒未完成")]
    Timeout(u64),

    #[error("配置错误: {0}")]
    Config(String),

    #[error("未找到: {0}")]
    NotFound(String),

    #[error("无效参数: {0}")]
    InvalidArgument(String),
}

// 实现 Serialize 以便通过请求/响应边界传递错误文本
impl Serialize for AppError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

pub type AppResult<T> = Result<T, AppError>;
