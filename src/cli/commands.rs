// 命令实现模块

use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::audio::classify::TrackRole;
use crate::audio::separator::{separate, SeparationRequest};
use crate::config;
use crate::engine::{check_dependencies, create_engine};
use crate::error::{AppError, AppResult};
use crate::models::{self, EngineKind};
use crate::utils::{is_audio_file, AUDIO_EXTENSIONS};

/// 分离命令
pub fn run_separate(
    input: &Path,
    model: Option<String>,
    output_dir: Option<PathBuf>,
    format: Option<String>,
    timeout: Option<u64>,
) -> AppResult<()> {
    if !input.exists() {
        return Err(AppError::NotFound(format!(
            "输入文件不存在: {}",
            input.display()
        )));
    }
    if !is_audio_file(input) {
        return Err(AppError::InvalidArgument(format!(
            "不支持的音频格式: {}，支持: {}",
            input.display(),
            AUDIO_EXTENSIONS.join(", ")
        )));
    }

    // 命令行参数覆盖配置
    let mut separation = config::get_config().separation;
    if let Some(fmt) = format {
        separation.output_format = fmt;
    }
    if let Some(secs) = timeout {
        separation.timeout_secs = secs;
    }
    let model_id = model.unwrap_or_else(|| separation.default_model_id.clone());

    let audio = fs::read(input)?;
    let file_name = input
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "input".to_string());

    println!("正在分离: {} (模型: {})", file_name, model_id);
    println!("处理时间取决于音频长度与模型，可能需要几分钟...");

    let request = SeparationRequest {
        audio,
        file_name: file_name.clone(),
        model_id,
    };
    let result = match separate(request, &separation) {
        Ok(result) => result,
        Err(e) => {
            eprintln!("分离失败: {}", e);
            eprintln!("建议: 尝试其他音频文件或更换模型。");
            return Err(e);
        }
    };

    let out_dir = output_dir.unwrap_or_else(|| PathBuf::from("."));
    fs::create_dir_all(&out_dir)?;

    println!(
        "分离完成 ({}, 耗时 {:.1} 秒):",
        result.engine, result.elapsed_secs
    );
    for track in result.tracks.values() {
        let out_name = output_track_name(track.role, &file_name, &track.source_name);
        let out_path = out_dir.join(&out_name);
        fs::write(&out_path, &track.data)?;
        info!(
            "[CLI] 轨道已写出: {} <- {} ({} bytes)",
            out_path.display(),
            track.source_name,
            track.data.len()
        );
        println!(
            "  {:<12} {} -> {} ({} bytes, sha256 {})",
            track.role,
            track.source_name,
            out_path.display(),
            track.data.len(),
            &track.sha256[..16]
        );
    }

    Ok(())
}

/// 推导输出文件名: {轨道}_{原始文件主干}.{实际扩展名}
///
/// 扩展名取引擎输出文件的扩展名，配置格式引擎不支持时会回退（如 demucs 回退 wav）。
fn output_track_name(role: TrackRole, original_name: &str, source_name: &str) -> String {
    let stem = Path::new(original_name)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("output");
    let ext = Path::new(source_name)
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or("mp3");
    format!("{}_{}.{}", role.as_str(), stem, ext)
}

/// 列出可用模型
pub fn run_models() -> AppResult<()> {
    let available = models::get_available_models();

    // 每种引擎只探测一次
    let uvr_ok = create_engine(EngineKind::Uvr).is_available();
    let demucs_ok = create_engine(EngineKind::Demucs).is_available();

    println!("可用模型 ({}):", available.len());
    for model in available {
        let engine_ok = match model.engine {
            EngineKind::Uvr => uvr_ok,
            EngineKind::Demucs => demucs_ok,
        };
        let marker = if engine_ok { "可用" } else { "引擎未安装" };
        println!(
            "  {:<18} {:<22} 引擎: {:<15} 轨道: {}  速度: {}/5  质量: {}/5  [{}]",
            model.id,
            model.name,
            model.engine.as_str(),
            model.stems,
            model.speed_rating,
            model.quality_rating,
            marker
        );
        println!("      {}", model.description);
    }

    Ok(())
}

/// 检查外部依赖
pub fn run_check() -> AppResult<()> {
    let checks = check_dependencies();

    for check in &checks {
        let status = if check.available { " OK " } else { "缺失" };
        println!("[{}] {:<18} {}", status, check.name, check.message);
        if let Some(version) = &check.version {
            println!("       版本: {}", version);
        }
        if let Some(path) = &check.path {
            println!("       路径: {}", path);
        }
    }

    if checks.iter().any(|c| !c.available) {
        println!();
        println!("提示: 安装任意一种分离引擎（audio-separator 或 demucs）即可使用对应模型。");
    }

    Ok(())
}

/// 查看或修改配置
///
/// 不带参数时打印当前配置；带参数时更新对应字段并写回配置文件。
/// 可设置的三项与 separate 命令的单次覆盖参数一一对应。
pub fn run_config(
    model: Option<String>,
    format: Option<String>,
    timeout: Option<u64>,
) -> AppResult<()> {
    let mut config = config::get_config();
    let mut changed = false;

    if let Some(model_id) = model {
        // 只接受模型目录中存在的 ID
        if models::get_model_by_id(&model_id).is_none() {
            return Err(AppError::InvalidModel(model_id));
        }
        config.separation.default_model_id = model_id;
        changed = true;
    }
    if let Some(fmt) = format {
        config.separation.output_format = fmt;
        changed = true;
    }
    if let Some(secs) = timeout {
        config.separation.timeout_secs = secs;
        changed = true;
    }

    if changed {
        config::update_config(config.clone())?;
        info!("[CLI] 配置已保存");
        println!("配置已保存。");
    }

    println!("{}", serde_json::to_string_pretty(&config)?);
    if let Some(path) = config::config_file_path() {
        println!("配置文件: {}", path.display());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_track_name_uses_source_extension() {
        assert_eq!(
            output_track_name(TrackRole::Vocals, "song.mp3", "song_(Vocals)_x.mp3"),
            "vocals_song.mp3"
        );
        // demucs 非 mp3 配置回退 wav，输出扩展名必须跟随实际文件
        assert_eq!(
            output_track_name(TrackRole::Instrumental, "song.flac", "no_vocals.wav"),
            "instrumental_song.wav"
        );
        assert_eq!(
            output_track_name(TrackRole::Drums, "song.mp3", "drums.mp3"),
            "drums_song.mp3"
        );
    }
}
