// 配置管理模块

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::fs;
use crate::error::{AppError, AppResult};
use once_cell::sync::OnceCell;
use parking_lot::RwLock;
use tracing::info;

static CONFIG: OnceCell<RwLock<AppConfig>> = OnceCell::new();
static CONFIG_PATH: OnceCell<PathBuf> = OnceCell::new();

/// 日志级别
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl Default for LogLevel {
    fn default() -> Self {
        Self::Info
    }
}

impl LogLevel {
    /// 转换为 tracing 过滤器字符串
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

/// 人声分离配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeparationConfig {
    /// 默认模型 ID（未显式指定模型时使用）
    #[serde(default = "default_model_id")]
    pub default_model_id: String,
    /// 输出格式
    #[serde(default = "default_output_format")]
    pub output_format: String,
    /// 引擎超时 (秒)，0 表示不限制
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// demucs 两轨模式：仅输出人声+伴奏；关闭后输出四轨
    #[serde(default = "default_demucs_two_stems")]
    pub demucs_two_stems: bool,
    /// audio-separator 模型缓存目录，未设置时由引擎自行决定
    #[serde(default)]
    pub model_cache_dir: Option<String>,
}

fn default_model_id() -> String {
    "mdx-inst-hq3".to_string()
}

fn default_output_format() -> String {
    "mp3".to_string()
}

fn default_timeout_secs() -> u64 {
    // 长音频 + CPU 推理可能很慢，默认放宽到 30 分钟
    1800
}

fn default_demucs_two_stems() -> bool {
    true
}

impl Default for SeparationConfig {
    fn default() -> Self {
        Self {
            default_model_id: default_model_id(),
            output_format: default_output_format(),
            timeout_secs: default_timeout_secs(),
            demucs_two_stems: default_demucs_two_stems(),
            model_cache_dir: None,
        }
    }
}

/// 应用配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// 人声分离配置
    #[serde(default)]
    pub separation: SeparationConfig,
    /// 日志级别
    #[serde(default)]
    pub log_level: LogLevel,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            separation: SeparationConfig::default(),
            log_level: LogLevel::default(),
        }
    }
}

/// 初始化配置
pub fn init_config(config_path: &Path) -> AppResult<()> {
    CONFIG_PATH.set(config_path.to_path_buf())
        .map_err(|_| AppError::Config("配置路径已初始化".to_string()))?;

    let config = if config_path.exists() {
        let content = fs::read_to_string(config_path)?;
        serde_json::from_str(&content).unwrap_or_else(|e| {
            tracing::warn!("配置文件 JSON 解析失败: {}，使用默认配置", e);
            AppConfig::default()
        })
    } else {
        let config = AppConfig::default();
        let content = serde_json::to_string_pretty(&config)?;
        fs::write(config_path, content)?;
        config
    };

    info!("[CONFIG] 配置已加载");

    CONFIG.set(RwLock::new(config))
        .map_err(|_| AppError::Config("配置已初始化".to_string()))?;

    Ok(())
}

/// 获取配置
pub fn get_config() -> AppConfig {
    CONFIG.get()
        .map(|c| c.read().clone())
        .unwrap_or_default()
}

/// 更新配置
pub fn update_config(config: AppConfig) -> AppResult<()> {
    info!("[CONFIG] 配置更新");

    // 先写入文件，成功后再更新内存，避免文件写入失败导致内存与文件不一致
    if let Some(path) = CONFIG_PATH.get() {
        let content = serde_json::to_string_pretty(&config)?;
        fs::write(path, content)?;
    }

    if let Some(lock) = CONFIG.get() {
        let mut current = lock.write();
        *current = config;
    }

    Ok(())
}

/// 配置文件路径（未初始化时为 None）
pub fn config_file_path() -> Option<PathBuf> {
    CONFIG_PATH.get().cloned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_separation_config_defaults() {
        let config = SeparationConfig::default();
        assert_eq!(config.default_model_id, "mdx-inst-hq3");
        assert_eq!(config.output_format, "mp3");
        assert_eq!(config.timeout_secs, 1800);
        assert!(config.demucs_two_stems);
        assert!(config.model_cache_dir.is_none());
    }

    #[test]
    fn test_empty_json_uses_defaults() {
        let config: AppConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.separation.default_model_id, "mdx-inst-hq3");
        assert_eq!(config.log_level, LogLevel::Info);
    }

    #[test]
    fn test_partial_json_keeps_other_defaults() {
        let json = r#"{"separation": {"output_format": "wav", "timeout_secs": 0}}"#;
        let config: AppConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.separation.output_format, "wav");
        assert_eq!(config.separation.timeout_secs, 0);
        assert_eq!(config.separation.default_model_id, "mdx-inst-hq3");
        assert!(config.separation.demucs_two_stems);
    }

    #[test]
    fn test_config_round_trip() {
        let mut config = AppConfig::default();
        config.separation.default_model_id = "htdemucs".to_string();
        config.separation.demucs_two_stems = false;
        config.log_level = LogLevel::Debug;

        let json = serde_json::to_string(&config).unwrap();
        let parsed: AppConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.separation.default_model_id, "htdemucs");
        assert!(!parsed.separation.demucs_two_stems);
        assert_eq!(parsed.log_level, LogLevel::Debug);
    }

    // 全局配置只能初始化一次，涉及 init_config 的用例必须集中在这一个测试里
    #[test]
    fn test_update_config_persists_to_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        init_config(&path).unwrap();

        let mut config = get_config();
        config.separation.default_model_id = "htdemucs".to_string();
        config.separation.timeout_secs = 60;
        update_config(config).unwrap();

        // 内存与文件都要反映更新
        assert_eq!(get_config().separation.default_model_id, "htdemucs");
        let reloaded: AppConfig =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(reloaded.separation.default_model_id, "htdemucs");
        assert_eq!(reloaded.separation.timeout_secs, 60);
        assert_eq!(config_file_path(), Some(path));
    }
}
