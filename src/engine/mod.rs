// 分离引擎模块
//
// 子模块：
// - uvr: audio-separator 命令行引擎 (UVR/MDX 系列模型)
// - demucs: demucs 命令行引擎
// - runner: 子进程执行与超时控制

pub mod demucs;
pub mod runner;
pub mod uvr;

use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::config::SeparationConfig;
use crate::error::AppResult;
use crate::models::{EngineKind, ModelInfo};
use crate::utils::{hidden_command, resolve_tool_path, DependencyCheck};

/// 分离引擎接口
///
/// 两种引擎统一在该接口之后，调用方只依赖模型目录里声明的引擎类型。
pub trait SeparationEngine: Send + Sync {
    /// 引擎类型
    fn kind(&self) -> EngineKind;

    /// 检查引擎命令行工具是否可用
    fn is_available(&self) -> bool;

    /// 执行分离，返回引擎产生的输出文件路径
    ///
    /// input_path 是已写入工作目录的音频文件，workdir 同时作为输出根目录。
    /// 调用同步阻塞直到引擎进程结束。
    fn separate(
        &self,
        input_path: &Path,
        workdir: &Path,
        model: &ModelInfo,
        config: &SeparationConfig,
    ) -> AppResult<Vec<PathBuf>>;
}

/// 根据引擎类型构建引擎实例
pub fn create_engine(kind: EngineKind) -> Box<dyn SeparationEngine> {
    match kind {
        EngineKind::Uvr => Box::new(uvr::UvrEngine::new()),
        EngineKind::Demucs => Box::new(demucs::DemucsEngine::new()),
    }
}

/// 递归扫描工作目录，收集引擎产生的输出音频文件
///
/// 排除暂存的输入文件本身；按路径排序保证结果顺序稳定。
pub fn collect_audio_outputs(workdir: &Path, exclude: &Path, output_ext: &str) -> Vec<PathBuf> {
    let ext = output_ext.to_lowercase();
    let mut outputs = Vec::new();

    for entry in WalkDir::new(workdir).into_iter().filter_map(|e| e.ok()) {
        let path = entry.path();
        if !entry.file_type().is_file() || path == exclude {
            continue;
        }
        let matches_ext = path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase() == ext)
            .unwrap_or(false);
        if matches_ext {
            outputs.push(path.to_path_buf());
        }
    }

    outputs.sort();
    outputs
}

/// 检查所有外部依赖
pub fn check_dependencies() -> Vec<DependencyCheck> {
    let mut checks = Vec::new();

    checks.push(probe_tool(
        "audio-separator",
        &["--version"],
        "UVR/MDX 系列模型需要 (pip install audio-separator)",
    ));
    checks.push(probe_tool(
        "demucs",
        &["--help"],
        "demucs 系列模型需要 (pip install demucs)",
    ));
    checks.push(probe_tool(
        "ffmpeg",
        &["-version"],
        "读写部分音频格式需要",
    ));

    checks
}

/// 探测单个命令行工具，取输出首行作为版本信息
fn probe_tool(tool_name: &str, args: &[&str], message: &str) -> DependencyCheck {
    let path = resolve_tool_path(tool_name);
    let output = hidden_command(&path).args(args).output();

    match output {
        Ok(out) if out.status.success() => {
            let stdout = String::from_utf8_lossy(&out.stdout);
            let version = stdout.lines().next().map(|l| l.trim().to_string());
            DependencyCheck {
                name: tool_name.to_string(),
                available: true,
                version,
                path: Some(path),
                message: message.to_string(),
            }
        }
        _ => DependencyCheck {
            name: tool_name.to_string(),
            available: false,
            version: None,
            path: None,
            message: message.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_collect_audio_outputs_recursive_sorted() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("song.mp3");
        fs::write(&input, b"in").unwrap();

        let nested = dir.path().join("htdemucs").join("song");
        fs::create_dir_all(&nested).unwrap();
        fs::write(nested.join("vocals.mp3"), b"v").unwrap();
        fs::write(dir.path().join("song_(Vocals)_x.mp3"), b"v2").unwrap();
        fs::write(dir.path().join("readme.txt"), b"skip").unwrap();

        let outputs = collect_audio_outputs(dir.path(), &input, "mp3");
        assert_eq!(outputs.len(), 2);
        // 排除输入文件与非目标扩展名文件，结果已排序
        assert!(outputs.windows(2).all(|w| w[0] < w[1]));
        assert!(outputs.iter().all(|p| p != &input));
    }

    #[test]
    fn test_collect_audio_outputs_extension_case_insensitive() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("song.wav");
        fs::write(&input, b"in").unwrap();
        fs::write(dir.path().join("out.WAV"), b"o").unwrap();

        let outputs = collect_audio_outputs(dir.path(), &input, "wav");
        assert_eq!(outputs.len(), 1);
    }

    #[test]
    fn test_create_engine_kind_matches() {
        assert_eq!(create_engine(EngineKind::Uvr).kind(), EngineKind::Uvr);
        assert_eq!(create_engine(EngineKind::Demucs).kind(), EngineKind::Demucs);
    }
}
