//! 运行配置模块：
//! - 定义 `Settings`（监听、目录、超时）与上游 `Endpoints`
//! - 默认值、环境变量覆盖与安装目录推导
//! - 生成启动后打印/打开的访问地址

use std::{env, path::PathBuf, time::Duration};
use url::Url;

use crate::utils::{env_opt_string, trim_base};

pub(crate) const DEFAULT_PORT: u16 = 3000;
pub(crate) const DEFAULT_HOST: &str = "127.0.0.1";
pub(crate) const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// 项目元数据代理（返回 title / project_token）
pub(crate) const METADATA_URL: &str = "https://trampoline.turbowarp.org/proxy/projects";
/// 项目 JSON 下载地址
pub(crate) const PROJECT_URL: &str = "https://projects.scratch.mit.edu";
/// 公共资源 CDN
pub(crate) const ASSET_URL: &str = "https://assets.scratch.mit.edu";

/// 上游服务地址，可用环境变量覆盖（便于自建镜像或测试）
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Endpoints {
    pub(crate) metadata: String,
    pub(crate) project: String,
    pub(crate) asset: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            metadata: METADATA_URL.to_string(),
            project: PROJECT_URL.to_string(),
            asset: ASSET_URL.to_string(),
        }
    }
}

impl Endpoints {
    /// 读取 NYAICE_METADATA_URL / NYAICE_PROJECT_URL / NYAICE_ASSET_URL
    pub(crate) fn from_env() -> Self {
        let d = Self::default();
        Self {
            metadata: env_opt_string("NYAICE_METADATA_URL").unwrap_or(d.metadata),
            project: env_opt_string("NYAICE_PROJECT_URL").unwrap_or(d.project),
            asset: env_opt_string("NYAICE_ASSET_URL").unwrap_or(d.asset),
        }
    }

    pub(crate) fn metadata_url(&self, id: &str) -> String {
        format!("{}/{}", trim_base(&self.metadata), id)
    }

    pub(crate) fn project_url(&self, id: &str, token: &str) -> String {
        format!("{}/{}/?token={}", trim_base(&self.project), id, token)
    }
}

/// `<cdn>/internalapi/asset/<id>/get/`
pub(crate) fn asset_url(cdn_base: &str, asset_id: &str) -> String {
    format!("{}/internalapi/asset/{}/get/", trim_base(cdn_base), asset_id)
}

/// 本次运行的有效配置（CLI > 环境变量 > 默认值）
#[derive(Debug, Clone)]
pub(crate) struct Settings {
    pub(crate) host: String,
    pub(crate) port: u16,
    pub(crate) editor: bool,
    pub(crate) open: bool,
    pub(crate) static_dir: PathBuf,
    pub(crate) staging_dir: PathBuf,
    pub(crate) timeout: Duration,
    pub(crate) endpoints: Endpoints,
}

impl Settings {
    /// tiny_http 监听地址
    pub(crate) fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// 打印给用户的访问地址；`--editor` 只影响查询串
    pub(crate) fn launch_url(&self) -> Result<Url, url::ParseError> {
        let shown = match self.host.as_str() {
            "0.0.0.0" | "127.0.0.1" => "localhost",
            h => h,
        };
        let mut url = Url::parse(&format!("http://{}:{}", shown, self.port))?;
        if self.editor {
            url.set_query(Some("editor=true"));
        }
        Ok(url)
    }
}

/// 可执行文件所在目录；取不到时使用当前目录
pub(crate) fn install_dir() -> PathBuf {
    env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(|d| d.to_path_buf()))
        .unwrap_or_else(|| PathBuf::from("."))
}

/// 默认解压目录：安装目录下的 tmp/
pub(crate) fn default_staging_dir() -> PathBuf {
    install_dir().join("tmp")
}

/// 默认前端静态资源目录：安装目录下的 build/
pub(crate) fn default_static_dir() -> PathBuf {
    install_dir().join("build")
}
