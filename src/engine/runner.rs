// 子进程执行模块
//
// 统一封装引擎子进程的启动、等待与超时终止。
// stderr 在独立线程读取，防止管道缓冲区写满后子进程阻塞。

use std::io::Read;
use std::process::{Child, Command, Stdio};
use std::time::{Duration, Instant};

use tracing::{debug, error, info};

use crate::error::{AppError, AppResult};

/// 失败时保留的 stderr 末尾字符数，错误信息通常在输出末尾
const STDERR_KEEP_CHARS: usize = 500;

/// 进程状态轮询间隔
const POLL_INTERVAL_MS: u64 = 100;

/// 运行引擎子进程并等待结束
///
/// timeout_secs 为 0 时不限制。超时后终止引擎及其派生的子进程并返回 Timeout。
/// 命令不存在时返回 EngineNotAvailable，非零退出码返回 EngineExecution。
pub fn run_engine_command(engine_name: &str, mut cmd: Command, timeout_secs: u64) -> AppResult<()> {
    // stdout 重定向到 null，避免管道阻塞；stderr 留给读取线程
    cmd.stdout(Stdio::null()).stderr(Stdio::piped());

    // Unix 上让引擎跑在独立进程组，超时终止时能连同派生的子进程一起清理
    #[cfg(unix)]
    {
        use std::os::unix::process::CommandExt;
        cmd.process_group(0);
    }

    let mut child = cmd.spawn().map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            error!("[ENGINE] 未找到 {} 命令", engine_name);
            AppError::EngineNotAvailable(format!(
                "未找到 {} 命令，请确认已安装并加入 PATH",
                engine_name
            ))
        } else {
            error!("[ENGINE] 启动 {} 失败: {}", engine_name, e);
            AppError::EngineExecution(format!("启动 {} 失败: {}", engine_name, e))
        }
    })?;

    let stderr = child.stderr.take().ok_or_else(|| {
        AppError::EngineExecution(format!("无法获取 {} 错误输出流", engine_name))
    })?;
    let stderr_reader = std::thread::spawn(move || {
        let mut stderr = stderr;
        let mut buf = String::new();
        let _ = stderr.read_to_string(&mut buf);
        buf
    });

    let started = Instant::now();
    let status = loop {
        match child.try_wait() {
            Ok(Some(status)) => break status,
            Ok(None) => {
                if timeout_secs > 0 && started.elapsed() >= Duration::from_secs(timeout_secs) {
                    error!("[ENGINE] {} 超时 ({} 秒)，终止进程", engine_name, timeout_secs);
                    kill_engine_tree(&mut child);
                    let _ = child.wait();
                    // 不等读取线程：残留的派生进程可能仍持有 stderr 写端，
                    // 线程会在管道全部关闭后自行退出
                    drop(stderr_reader);
                    return Err(AppError::Timeout(timeout_secs));
                }
                std::thread::sleep(Duration::from_millis(POLL_INTERVAL_MS));
            }
            Err(e) => {
                error!("[ENGINE] 检查 {} 进程状态失败: {}", engine_name, e);
                kill_engine_tree(&mut child);
                let _ = child.wait();
                drop(stderr_reader);
                return Err(AppError::EngineExecution(format!(
                    "检查 {} 进程状态失败: {}",
                    engine_name, e
                )));
            }
        }
    };

    // 引擎已退出，清掉同组残留的派生进程，否则它们持有的 stderr 写端会卡住 join
    kill_engine_tree(&mut child);

    let stderr_output = stderr_reader.join().unwrap_or_default();
    debug!("[ENGINE] {} 退出码: {:?}", engine_name, status.code());

    if !status.success() {
        let message = if stderr_output.trim().is_empty() {
            format!("{} 处理失败（无详细错误信息）", engine_name)
        } else {
            format!("{} 处理失败: {}", engine_name, tail_chars(&stderr_output))
        };
        error!("[ENGINE] {}", message);
        return Err(AppError::EngineExecution(message));
    }

    if !stderr_output.trim().is_empty() {
        debug!("[ENGINE] {} stderr: {}", engine_name, tail_chars(&stderr_output));
    }
    info!(
        "[ENGINE] {} 处理成功，耗时 {:.1} 秒",
        engine_name,
        started.elapsed().as_secs_f64()
    );
    Ok(())
}

/// 终止引擎及其派生的全部子进程
///
/// 引擎自己还会派生子进程（demucs 的推理 worker、audio-separator 调用的
/// ffmpeg），它们继承了 stderr 管道写端；只杀直接子进程的话管道不会关闭，
/// 读取线程会一直阻塞到整棵进程树退出。
fn kill_engine_tree(child: &mut Child) {
    #[cfg(unix)]
    {
        // SAFETY: 对引擎自己的进程组发送 SIGKILL
        // - 进程组由 process_group(0) 创建，组 ID 即引擎进程 PID
        // - 组内只有引擎及其派生进程，不会波及本进程
        // - 组已不存在时 killpg 返回 ESRCH，忽略即可
        unsafe {
            libc::killpg(child.id() as i32, libc::SIGKILL);
        }
    }
    let _ = child.kill();
}

/// 截取 stderr 末尾，避免超长 Python 回溯撑爆错误信息
fn tail_chars(stderr: &str) -> String {
    let trimmed = stderr.trim();
    let chars: Vec<char> = trimmed.chars().collect();
    if chars.len() <= STDERR_KEEP_CHARS {
        trimmed.to_string()
    } else {
        chars[chars.len() - STDERR_KEEP_CHARS..].iter().collect()
    }
}
