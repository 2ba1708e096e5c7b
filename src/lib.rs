// VocalCut - AI 人声分离工具
//
// 将音频内容交给外部 AI 分离引擎（audio-separator / demucs），
// 在独占的临时工作目录中执行，按文件名分类输出轨道并以字节形式返回。
// 库入口暴露 separate 调用面，二进制入口提供命令行。

pub mod audio;
pub mod cli;
pub mod config;
pub mod engine;
pub mod error;
pub mod logging;
pub mod models;
pub mod utils;

pub use audio::classify::TrackRole;
pub use audio::separator::{
    separate, separate_with_engine, SeparatedTrack, SeparationRequest, SeparationResult,
};
pub use config::{AppConfig, SeparationConfig};
pub use engine::{create_engine, SeparationEngine};
pub use error::{AppError, AppResult};
pub use models::{get_available_models, get_model_by_id, EngineKind, ModelInfo};
