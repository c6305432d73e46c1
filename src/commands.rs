//! 命令调度模块：
//! - 接收解析好的 CLI 参数，结合环境变量计算“有效参数”
//! - 依次执行：分类选择器 → 解析项目（压缩包才使用暂存目录）→ 启动桥接服务

use anyhow::{Context, Result};
use std::time::Duration;

use crate::{
    bridge::{self, Bridge},
    cli::Cli,
    config::{self, Endpoints, Settings, DEFAULT_HOST, DEFAULT_PORT, DEFAULT_TIMEOUT_SECS},
    error::ResolveError,
    output,
    resolver,
    selector::Selector,
    utils::{env_opt_path, env_opt_string, env_opt_u16, env_opt_u64},
};

/// 计算有效配置（CLI > 环境变量 > 默认值）
pub(crate) fn effective_settings(cli: &Cli) -> Settings {
    let env_port = env_opt_u16("NYAICE_PORT");
    let env_host = env_opt_string("NYAICE_HOST");
    let env_static = env_opt_path("NYAICE_STATIC_DIR");
    let env_staging = env_opt_path("NYAICE_STAGING_DIR");
    let env_timeout = env_opt_u64("NYAICE_TIMEOUT");

    Settings {
        host: cli.host.clone().or(env_host).unwrap_or_else(|| DEFAULT_HOST.to_string()),
        port: cli.port.or(env_port).unwrap_or(DEFAULT_PORT),
        editor: cli.editor,
        open: cli.open,
        static_dir: cli.static_dir.clone().or(env_static).unwrap_or_else(config::default_static_dir),
        staging_dir: cli.staging_dir.clone().or(env_staging).unwrap_or_else(config::default_staging_dir),
        timeout: Duration::from_secs(cli.timeout.or(env_timeout).unwrap_or(DEFAULT_TIMEOUT_SECS)),
        endpoints: Endpoints::from_env(),
    }
}

/// 运行：解析项目并阻塞服务
pub(crate) fn run(cli: Cli) -> Result<()> {
    let settings = effective_settings(&cli);
    let raw = cli.selector.as_deref().ok_or(ResolveError::NoSelector)?;

    println!("{}", output::banner(&format!("===== nyaice v{} =====", env!("CARGO_PKG_VERSION"))));
    tracing::debug!(?settings, "effective settings");

    let selector = Selector::classify(raw)?;
    let resolved = resolver::resolve(&selector, &settings)?;

    if !settings.static_dir.is_dir() {
        tracing::warn!(dir = %settings.static_dir.display(), "static bundle directory not found, only project routes are served");
    }

    let addr = settings.bind_addr();
    let server = bridge::listen(&addr)?;
    let bridge = Bridge::new(resolved.descriptor, resolved.strategy, settings.static_dir.clone());

    let url = settings.launch_url().context("invalid launch url")?;
    let descriptor = bridge.descriptor();
    println!("{}", output::success(&format!("project loaded: {}", descriptor.title)));
    if let Some(n) = descriptor.manifest.target_count() {
        tracing::info!(targets = n, id = ?descriptor.id, "manifest ready");
    }
    println!("{}", output::step(&format!("server started at {}", url)));
    if settings.open {
        if let Err(e) = webbrowser::open(url.as_str()) {
            tracing::warn!(error = %e, "cannot open browser");
        }
    }

    bridge.serve(&server);
    Ok(())
}
