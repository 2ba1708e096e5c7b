// 命令行接口模块

pub mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// VocalCut - AI 人声分离工具
#[derive(Parser, Debug)]
#[command(name = "vocalcut", version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// 分离音频文件的人声与伴奏
    Separate {
        /// 输入音频文件
        input: PathBuf,

        /// 模型 ID，未指定时使用配置的默认模型（见 models 子命令）
        #[arg(short, long)]
        model: Option<String>,

        /// 输出目录，默认当前目录
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        /// 输出格式，默认取配置（初始为 mp3）
        #[arg(short, long)]
        format: Option<String>,

        /// 引擎超时 (秒)，0 表示不限制
        #[arg(long)]
        timeout: Option<u64>,
    },

    /// 列出可用模型
    Models,

    /// 检查外部依赖
    Check,

    /// 查看或修改配置
    Config {
        /// 设置默认模型 ID（见 models 子命令）
        #[arg(long)]
        model: Option<String>,

        /// 设置默认输出格式
        #[arg(long)]
        format: Option<String>,

        /// 设置默认引擎超时 (秒)，0 表示不限制
        #[arg(long)]
        timeout: Option<u64>,
    },
}
