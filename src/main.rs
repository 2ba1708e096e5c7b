// VocalCut - AI 人声分离工具
// 主入口文件

use std::path::PathBuf;

use clap::Parser;
use tracing::{error, info, warn};

use vocalcut::cli::{commands, Cli, Commands};
use vocalcut::{config, logging};

/// 获取应用数据目录（日志与配置）
/// 优先使用环境变量 VOCALCUT_DATA_DIR，其次使用系统用户数据目录
fn get_app_data_dir() -> PathBuf {
    if let Some(dir) = std::env::var_os("VOCALCUT_DATA_DIR") {
        if !dir.is_empty() {
            return PathBuf::from(dir);
        }
    }

    if let Some(data_dir) = dirs::data_local_dir() {
        return data_dir.join("vocalcut");
    }

    // 回退到当前工作目录
    std::env::current_dir()
        .unwrap_or_else(|_| PathBuf::from("."))
        .join(".vocalcut")
}

fn main() {
    let cli = Cli::parse();

    let app_dir = get_app_data_dir();

    // 初始化日志系统 - guard 必须保持存活，否则异步日志线程会退出
    let _log_guard = logging::init_logging(&app_dir);

    info!("VocalCut 启动，数据目录: {}", app_dir.display());

    if let Err(e) = std::fs::create_dir_all(&app_dir) {
        warn!("创建应用数据目录失败: {}", e);
    }

    let config_path = app_dir.join("config.json");
    if let Err(e) = config::init_config(&config_path) {
        error!("配置初始化失败: {}", e);
        eprintln!("配置初始化失败: {}，请检查磁盘空间和写入权限。", e);
        std::process::exit(1);
    }

    let result = match cli.command {
        Commands::Separate {
            input,
            model,
            output_dir,
            format,
            timeout,
        } => commands::run_separate(&input, model, output_dir, format, timeout),
        Commands::Models => commands::run_models(),
        Commands::Check => commands::run_check(),
        Commands::Config {
            model,
            format,
            timeout,
        } => commands::run_config(model, format, timeout),
    };

    if let Err(e) = result {
        error!("命令执行失败: {}", e);
        eprintln!("错误: {}", e);
        std::process::exit(1);
    }
}
