// 人声分离编排模块
//
// 接收音频字节与模型选择，暂存到独占的临时工作目录，调用外部分离引擎，
// 按文件名分类输出轨道并读回内存。临时目录在所有退出路径上整体删除，
// 磁盘上不留任何中间文件。

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{info, warn};

use crate::audio::classify::{classify_output, TrackRole};
use crate::config::SeparationConfig;
use crate::engine::{create_engine, SeparationEngine};
use crate::error::{AppError, AppResult};
use crate::models;
use crate::utils::{generate_id, sanitize_file_name};

/// 分离请求
#[derive(Debug, Clone)]
pub struct SeparationRequest {
    /// 原始音频内容
    pub audio: Vec<u8>,
    /// 原始文件名，仅用于推导扩展名与输出命名
    pub file_name: String,
    /// 模型 ID，必须在模型目录中
    pub model_id: String,
}

/// 单条分离输出轨道
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeparatedTrack {
    /// 轨道类型
    pub role: TrackRole,
    /// 引擎输出文件名（分类依据）
    pub source_name: String,
    /// 音频内容
    #[serde(skip)]
    pub data: Vec<u8>,
    /// 内容 SHA256 十六进制，便于核对两次运行是否一致
    pub sha256: String,
}

/// 分离结果：轨道类型 → 轨道内容
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeparationResult {
    /// 请求 ID
    pub request_id: String,
    /// 使用的模型 ID
    pub model_id: String,
    /// 使用的引擎命令名
    pub engine: String,
    /// 开始时间
    pub started_at: String,
    /// 总耗时 (秒)
    pub elapsed_secs: f64,
    /// 分离出的轨道
    pub tracks: BTreeMap<TrackRole, SeparatedTrack>,
}

impl SeparationResult {
    /// 按轨道类型取轨道
    pub fn track(&self, role: TrackRole) -> Option<&SeparatedTrack> {
        self.tracks.get(&role)
    }
}

/// 执行人声分离
///
/// 引擎由模型目录项决定，阻塞直至引擎结束。
pub fn separate(request: SeparationRequest, config: &SeparationConfig) -> AppResult<SeparationResult> {
    let model = models::get_model_by_id(&request.model_id)
        .ok_or_else(|| AppError::InvalidModel(request.model_id.clone()))?;
    let engine = create_engine(model.engine);
    separate_with_engine(request, engine.as_ref(), config)
}

/// 使用指定引擎执行分离（也是测试注入点）
pub fn separate_with_engine(
    request: SeparationRequest,
    engine: &dyn SeparationEngine,
    config: &SeparationConfig,
) -> AppResult<SeparationResult> {
    // 入参校验先于引擎调用与任何文件操作
    if request.audio.is_empty() {
        return Err(AppError::InvalidArgument("音频内容为空".to_string()));
    }
    let model = models::get_model_by_id(&request.model_id)
        .ok_or_else(|| AppError::InvalidModel(request.model_id.clone()))?;

    let request_id = generate_id();
    let started = Instant::now();
    let started_at = chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string();

    info!("[SEPARATOR] === 开始人声分离 ===");
    info!(
        "[SEPARATOR] 请求: id={}, 文件={}, 模型={}, 引擎={}",
        request_id,
        request.file_name,
        model.id,
        engine.kind().as_str()
    );

    // 独占临时工作目录，TempDir 守卫保证所有退出路径（含错误提前返回）递归删除
    let workdir = tempfile::Builder::new().prefix("vocalcut-").tempdir()?;
    info!("[SEPARATOR] 工作目录: {}", workdir.path().display());

    let staged_name = staged_input_name(&request.file_name);
    let input_path = workdir.path().join(&staged_name);
    fs::write(&input_path, &request.audio)?;

    let outputs = engine.separate(&input_path, workdir.path(), &model, config)?;

    if outputs.is_empty() {
        warn!("[SEPARATOR] 引擎正常结束但没有输出文件");
        return Err(AppError::OutputNotFound(
            "引擎执行成功但未找到输出文件".to_string(),
        ));
    }

    let tracks = collect_tracks(engine.kind(), &outputs)?;
    if tracks.is_empty() {
        return Err(AppError::OutputNotFound(
            "引擎输出文件均无法识别轨道类型".to_string(),
        ));
    }

    let elapsed_secs = started.elapsed().as_secs_f64();
    info!(
        "[SEPARATOR] 分离完成: {} 条轨道, 耗时 {:.1} 秒",
        tracks.len(),
        elapsed_secs
    );

    // 成功路径上显式删除并上报失败，错误路径由 Drop 兜底
    if let Err(e) = workdir.close() {
        warn!("[SEPARATOR] 删除工作目录失败: {}", e);
    }

    Ok(SeparationResult {
        request_id,
        model_id: model.id,
        engine: engine.kind().as_str().to_string(),
        started_at,
        elapsed_secs,
        tracks,
    })
}

/// 从输出文件构建轨道映射
///
/// 输出已按路径排序；同一轨道出现多个文件时保留先出现的并告警。
fn collect_tracks(
    engine: crate::models::EngineKind,
    outputs: &[PathBuf],
) -> AppResult<BTreeMap<TrackRole, SeparatedTrack>> {
    let mut tracks = BTreeMap::new();

    for path in outputs {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        let role = match classify_output(engine, path) {
            Some(role) => role,
            None => {
                warn!("[SEPARATOR] 无法识别的输出文件，跳过: {}", file_name);
                continue;
            }
        };
        if tracks.contains_key(&role) {
            warn!(
                "[SEPARATOR] 轨道 {} 有多个输出，保留先出现的，忽略: {}",
                role, file_name
            );
            continue;
        }

        let data = fs::read(path)?;
        let sha256 = content_hash(&data);
        info!(
            "[SEPARATOR] 轨道 {}: {} ({} bytes, sha256={})",
            role,
            file_name,
            data.len(),
            &sha256[..16]
        );
        tracks.insert(
            role,
            SeparatedTrack {
                role,
                source_name: file_name,
                data,
                sha256,
            },
        );
    }

    Ok(tracks)
}

/// 计算内容 SHA256 十六进制
pub fn content_hash(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// 推导暂存输入文件名：清理路径成分，缺扩展名时补 .mp3
fn staged_input_name(file_name: &str) -> String {
    let name = sanitize_file_name(file_name);
    if Path::new(&name).extension().is_none() {
        format!("{}.mp3", name)
    } else {
        name
    }
}
