// demucs 引擎
//
// 调用 demucs 命令行工具执行分离。
// 两轨模式 (--two-stems=vocals) 输出 vocals + no_vocals，
// 四轨模式输出 vocals/drums/bass/other。
// 输出位于 {workdir}/{模型名}/{输入名}/ 子目录。

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::config::SeparationConfig;
use crate::engine::runner::run_engine_command;
use crate::engine::{collect_audio_outputs, SeparationEngine};
use crate::error::AppResult;
use crate::models::{EngineKind, ModelInfo};
use crate::utils::{hidden_command, resolve_tool_path};

/// demucs 命令名
const DEMUCS_COMMAND: &str = "demucs";

pub struct DemucsEngine;

impl DemucsEngine {
    pub fn new() -> Self {
        Self
    }
}

impl Default for DemucsEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// 构建 demucs 命令行参数，返回参数与实际输出扩展名
///
/// demucs 只支持重编码为 mp3，其他配置格式回退 wav 输出。
fn build_args(
    input_path: &Path,
    workdir: &Path,
    model: &ModelInfo,
    config: &SeparationConfig,
) -> (Vec<String>, &'static str) {
    let mut args: Vec<String> = Vec::new();

    // 两轨模式：人声 + 伴奏（no_vocals 是真实的伴奏混音，不是单轨乐器）
    if config.demucs_two_stems {
        args.push("--two-stems=vocals".to_string());
    }

    args.push("-n".to_string());
    args.push(model.engine_model.clone());

    let output_ext = if config.output_format.eq_ignore_ascii_case("mp3") {
        args.push("--mp3".to_string());
        "mp3"
    } else {
        "wav"
    };

    args.push("-o".to_string());
    args.push(workdir.to_string_lossy().to_string());
    args.push(input_path.to_string_lossy().to_string());

    (args, output_ext)
}

impl SeparationEngine for DemucsEngine {
    fn kind(&self) -> EngineKind {
        EngineKind::Demucs
    }

    fn is_available(&self) -> bool {
        hidden_command(&resolve_tool_path(DEMUCS_COMMAND))
            .arg("--help")
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
        let (args, output_ext) = build_args(input_path, workdir, model, config);

        let command_path = resolve_tool_path(DEMUCS_COMMAND);
        info!("[DEMUCS] 命令: {} {}", command_path, args.join(" "));

        let mut cmd = hidden_command(&command_path);
        cmd.args(&args);
        run_engine_command(DEMUCS_COMMAND, cmd, config.timeout_secs)?;

        let outputs = collect_audio_outputs(workdir, input_path, output_ext);
        debug!("[DEMUCS] 输出文件: {:?}", outputs);
        Ok(outputs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::get_model_by_id;

    #[test]
    fn test_build_args_two_stem_mp3() {
        let model = get_model_by_id("htdemucs").unwrap();
        let config = SeparationConfig::default();
        let (args, ext) = build_args(
            Path::new("/work/song.mp3"),
            Path::new("/work"),
            &model,
            &config,
        );
        assert_eq!(
            args,
            vec![
                "--two-stems=vocals",
                "-n",
                "htdemucs",
                "--mp3",
                "-o",
                "/work",
                "/work/song.mp3",
            ]
        );
        assert_eq!(ext, "mp3");
    }

    #[test]
    fn test_build_args_four_stem_wav_fallback() {
        let model = get_model_by_id("mdx-extra").unwrap();
        let mut config = SeparationConfig::default();
        config.demucs_two_stems = false;
        config.output_format = "flac".to_string();

        let (args, ext) = build_args(
            Path::new("/work/song.flac"),
            Path::new("/work"),
            &model,
            &config,
        );
        assert!(!args.iter().any(|a| a.starts_with("--two-stems")));
        assert!(!args.contains(&"--mp3".to_string()));
        assert_eq!(args[args.len() - 3..], ["-o", "/work", "/work/song.flac"]);
        assert_eq!(ext, "wav");
    }
}
