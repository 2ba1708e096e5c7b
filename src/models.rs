// 模型管理模块

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

const MODELS_DIR_ENV: &str = "VOCALCUT_MODELS_DIR";

/// 分离引擎类型
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum EngineKind {
    /// audio-separator 命令行工具 (UVR/MDX 系列模型)
    Uvr,
    /// demucs 命令行工具
    Demucs,
}

impl EngineKind {
    /// 引擎对应的命令行工具名
    pub fn as_str(&self) -> &'static str {
        match self {
            EngineKind::Uvr => "audio-separator",
            EngineKind::Demucs => "demucs",
        }
    }
}

/// 模型信息
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelInfo {
    /// 模型唯一标识
    pub id: String,
    /// 显示名称
    pub name: String,
    /// 所属引擎
    pub engine: EngineKind,
    /// 传给引擎的模型名 (audio-separator 为模型文件名, demucs 为 -n 参数)
    pub engine_model: String,
    /// 模型描述
    pub description: String,
    /// 输出轨道数 (2=人声+伴奏, 4=人声+鼓+贝斯+其他)
    pub stems: u8,
    /// 速度评分 (1-5, 5最快)
    pub speed_rating: u8,
    /// 质量评分 (1-5, 5最高)
    pub quality_rating: u8,
    /// 模型文件大小 (bytes)
    pub file_size: u64,
}

/// 获取所有可用模型列表
pub fn get_available_models() -> Vec<ModelInfo> {
    vec![
        // audio-separator (UVR/MDX) 模型
        ModelInfo {
            id: "mdx23c-instvoc-hq".to_string(),
            name: "MDX23C InstVoc HQ".to_string(),
            engine: EngineKind::Uvr,
            engine_model: "MDX23C-8KFFT-InstVoc_HQ.ckpt".to_string(),
            description: "高质量（推荐）".to_string(),
            stems: 2,
            speed_rating: 2,
            quality_rating: 5,
            file_size: 220_000_000, // ~220MB
        },
        ModelInfo {
            id: "mdx-inst-hq3".to_string(),
            name: "MDX-Net Inst HQ3".to_string(),
            engine: EngineKind::Uvr,
            engine_model: "UVR-MDX-NET-Inst_HQ_3.onnx".to_string(),
            description: "快速高质量，适合大多数场景".to_string(),
            stems: 2,
            speed_rating: 5,
            quality_rating: 3,
            file_size: 67_000_000, // ~67MB
        },
        ModelInfo {
            id: "kim-vocal-2".to_string(),
            name: "Kim Vocal 2".to_string(),
            engine: EngineKind::Uvr,
            engine_model: "Kim_Vocal_2.onnx".to_string(),
            description: "备选人声模型".to_string(),
            stems: 2,
            speed_rating: 4,
            quality_rating: 4,
            file_size: 67_000_000, // ~67MB
        },
        ModelInfo {
            id: "mdx-kara-2".to_string(),
            name: "MDX-Net Karaoke 2".to_string(),
            engine: EngineKind::Uvr,
            engine_model: "UVR_MDXNET_KARA_2.onnx".to_string(),
            description: "卡拉OK 优化，保留和声".to_string(),
            stems: 2,
            speed_rating: 4,
            quality_rating: 3,
            file_size: 67_000_000, // ~67MB
        },
        // demucs 模型
        ModelInfo {
            id: "htdemucs".to_string(),
            name: "HT Demucs".to_string(),
            engine: EngineKind::Demucs,
            engine_model: "htdemucs".to_string(),
            description: "Hybrid Transformer 模型，支持四轨分离".to_string(),
            stems: 4,
            speed_rating: 2,
            quality_rating: 5,
            file_size: 84_000_000, // ~84MB
        },
        ModelInfo {
            id: "mdx-extra".to_string(),
            name: "Demucs MDX Extra".to_string(),
            engine: EngineKind::Demucs,
            engine_model: "mdx_extra".to_string(),
            description: "MDX 竞赛增强训练版本".to_string(),
            stems: 4,
            speed_rating: 3,
            quality_rating: 4,
            file_size: 670_000_000, // ~670MB
        },
        ModelInfo {
            id: "mdx-q".to_string(),
            name: "Demucs MDX Quantized".to_string(),
            engine: EngineKind::Demucs,
            engine_model: "mdx_q".to_string(),
            description: "量化版本，体积小速度快".to_string(),
            stems: 4,
            speed_rating: 4,
            quality_rating: 3,
            file_size: 170_000_000, // ~170MB
        },
    ]
}

/// 根据 ID 获取模型信息
pub fn get_model_by_id(model_id: &str) -> Option<ModelInfo> {
    get_available_models().into_iter().find(|m| m.id == model_id)
}

/// 获取 audio-separator 模型缓存目录
/// 优先使用环境变量 VOCALCUT_MODELS_DIR（打包时指向资源目录），
/// 其次使用配置中的 model_cache_dir，均未设置时由引擎自行决定
pub fn resolve_model_cache_dir(configured: Option<&str>) -> Option<PathBuf> {
    if let Some(dir) = std::env::var_os(MODELS_DIR_ENV) {
        if !dir.is_empty() {
            return Some(PathBuf::from(dir));
        }
    }
    configured
        .filter(|s| !s.trim().is_empty())
        .map(PathBuf::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Mutex;

    // 两个缓存目录测试都读写 VOCALCUT_MODELS_DIR，串行执行避免互相干扰
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn test_model_ids_unique() {
        let models = get_available_models();
        let ids: HashSet<String> = models.iter().map(|m| m.id.clone()).collect();
        assert_eq!(ids.len(), models.len());
    }

    #[test]
    fn test_get_model_by_id() {
        let model = get_model_by_id("mdx-inst-hq3").unwrap();
        assert_eq!(model.engine, EngineKind::Uvr);
        assert_eq!(model.engine_model, "UVR-MDX-NET-Inst_HQ_3.onnx");

        let model = get_model_by_id("htdemucs").unwrap();
        assert_eq!(model.engine, EngineKind::Demucs);
        assert_eq!(model.stems, 4);

        assert!(get_model_by_id("no-such-model").is_none());
    }

    #[test]
    fn test_stems_consistent_with_engine() {
        // UVR 系列均为两轨模型，demucs 系列均为四轨
        for model in get_available_models() {
            match model.engine {
                EngineKind::Uvr => assert_eq!(model.stems, 2, "{}", model.id),
                EngineKind::Demucs => assert_eq!(model.stems, 4, "{}", model.id),
            }
        }
    }

    #[test]
    fn test_resolve_model_cache_dir_from_config() {
        let _guard = ENV_LOCK.lock().unwrap();
        std::env::remove_var(MODELS_DIR_ENV);
        assert_eq!(
            resolve_model_cache_dir(Some("/tmp/models")),
            Some(PathBuf::from("/tmp/models"))
        );
        assert_eq!(resolve_model_cache_dir(Some("  ")), None);
        assert_eq!(resolve_model_cache_dir(None), None);
    }

    #[test]
    fn test_models_dir_env_override() {
        let _guard = ENV_LOCK.lock().unwrap();
        std::env::set_var(MODELS_DIR_ENV, "/opt/vocalcut-models");
        let resolved = resolve_model_cache_dir(Some("/tmp/ignored"));
        std::env::remove_var(MODELS_DIR_ENV);
        assert_eq!(resolved, Some(PathBuf::from("/opt/vocalcut-models")));
    }
}
