//! CLI 定义模块：仅负责命令行参数结构体与解析
//! 将 clap 的声明与业务逻辑解耦，默认值在 commands 中结合环境变量计算。

use clap::Parser;
use std::path::PathBuf;

/// 顶层 CLI 入口
#[derive(Parser, Debug)]
#[command(name = "nyaice", about = "Serve a Scratch project to a local Scratch runtime", version)]
pub(crate) struct Cli {
    /// project id | project url | .sb3 | .zip | project dir
    #[arg(value_name = "SELECTOR")]
    pub(crate) selector: Option<String>,
    /// 服务端口，默认 3000（环境变量 NYAICE_PORT）
    #[arg(long, value_name = "PORT")]
    pub(crate) port: Option<u16>,
    /// 监听地址，默认 127.0.0.1（环境变量 NYAICE_HOST）
    #[arg(long, value_name = "HOST")]
    pub(crate) host: Option<String>,
    /// 打印的地址带上 `?editor=true`，以编辑器模式打开
    #[arg(long)]
    pub(crate) editor: bool,
    /// 启动后自动在浏览器打开
    #[arg(long)]
    pub(crate) open: bool,
    /// 前端静态资源目录，默认安装目录下的 build/
    #[arg(long, value_name = "DIR")]
    pub(crate) static_dir: Option<PathBuf>,
    /// 压缩包解压目录，默认安装目录下的 tmp/（每次运行都会清空）
    #[arg(long, value_name = "DIR")]
    pub(crate) staging_dir: Option<PathBuf>,
    /// 远程请求超时秒数，默认 30
    #[arg(long, value_name = "SECS")]
    pub(crate) timeout: Option<u64>,
    /// 输出调试日志
    #[arg(short, long)]
    pub(crate) verbose: bool,
}
