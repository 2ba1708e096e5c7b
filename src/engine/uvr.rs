// audio-separator 引擎
//
// 调用 audio-separator 命令行工具执行人声/伴奏分离 (UVR/MDX 系列模型)。
// 输出写入 output_dir 顶层，文件名形如
// {输入名}_(Vocals)_{模型名}.{格式} / {输入名}_(Instrumental)_{模型名}.{格式}。

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::config::SeparationConfig;
use crate::engine::runner::run_engine_command;
use crate::engine::{collect_audio_outputs, SeparationEngine};
use crate::error::AppResult;
use crate::models::{resolve_model_cache_dir, EngineKind, ModelInfo};
use crate::utils::{hidden_command, resolve_tool_path};

/// audio-separator 命令名
const UVR_COMMAND: &str = "audio-separator";

pub struct UvrEngine;

impl UvrEngine {
    pub fn new() -> Self {
        Self
    }
}

impl Default for UvrEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// 构建 audio-separator 命令行参数
fn build_args(
    input_path: &Path,
    workdir: &Path,
    model: &ModelInfo,
    config: &SeparationConfig,
    model_cache_dir: Option<&Path>,
) -> Vec<String> {
    // 不使用 --single_stem，同时输出人声和伴奏
    let mut args = vec![
        input_path.to_string_lossy().to_string(),
        "--model_filename".to_string(),
        model.engine_model.clone(),
        "--output_dir".to_string(),
        workdir.to_string_lossy().to_string(),
        "--output_format".to_string(),
        config.output_format.clone(),
    ];

    if let Some(model_dir) = model_cache_dir {
        args.push("--model_file_dir".to_string());
        args.push(model_dir.to_string_lossy().to_string());
    }

    args
}

impl SeparationEngine for UvrEngine {
    fn kind(&self) -> EngineKind {
        EngineKind::Uvr
    }

    fn is_available(&self) -> bool {
        hidden_command(&resolve_tool_path(UVR_COMMAND))
            .arg("--version")
            .output()
            .map(|o| o.status.success())
            .unwrap_or(false)
    }

    fn separate(
        &self,
        input_path: &Path,
        workdir: &Path,
        model: &ModelInfo,
        config: &SeparationConfig,
    ) -> AppResult<Vec<PathBuf>> {
        // 模型缓存目录（可选），由环境变量或配置指定
        let model_dir = resolve_model_cache_dir(config.model_cache_dir.as_deref());
        let args = build_args(input_path, workdir, model, config, model_dir.as_deref());

        let command_path = resolve_tool_path(UVR_COMMAND);
        info!("[UVR] 命令: {} {}", command_path, args.join(" "));

        let mut cmd = hidden_command(&command_path);
        cmd.args(&args);
        run_engine_command(UVR_COMMAND, cmd, config.timeout_secs)?;

        let outputs = collect_audio_outputs(workdir, input_path, &config.output_format);
        debug!("[UVR] 输出文件: {:?}", outputs);
        Ok(outputs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::get_model_by_id;

    #[test]
    fn test_build_args_basic() {
        let model = get_model_by_id("mdx-inst-hq3").unwrap();
        let config = SeparationConfig::default();
        let args = build_args(
            Path::new("/work/song.mp3"),
            Path::new("/work"),
            &model,
            &config,
            None,
        );
        assert_eq!(
            args,
            vec![
                "/work/song.mp3",
                "--model_filename",
                "UVR-MDX-NET-Inst_HQ_3.onnx",
                "--output_dir",
                "/work",
                "--output_format",
                "mp3",
            ]
        );
    }

    #[test]
    fn test_build_args_with_model_cache_dir() {
        let model = get_model_by_id("kim-vocal-2").unwrap();
        let config = SeparationConfig::default();
        let args = build_args(
            Path::new("/work/song.mp3"),
            Path::new("/work"),
            &model,
            &config,
            Some(Path::new("/opt/models")),
        );
        let pos = args.iter().position(|a| a == "--model_file_dir").unwrap();
        assert_eq!(args[pos + 1], "/opt/models");
    }
}
