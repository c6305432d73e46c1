//! 资源桥接 HTTP 服务：
//! - `GET /projects/server` 原样返回 project.json
//! - `GET /assets/internalapi/asset/:id/get/` 按策略重定向到 CDN 或读取本地文件
//! - 其余路径作为前端静态资源目录服务

use once_cell::sync::Lazy;
use std::{fs, io::{self, Cursor}, path::{Path, PathBuf}};
use tiny_http::{Header, Method, Response, Server};
use url::Url;

use crate::{
    config::asset_url,
    error::AssetError,
    resolver::ProjectDescriptor,
    utils::is_safe_asset_id,
};

static REQUEST_BASE: Lazy<Url> = Lazy::new(|| Url::parse("http://localhost/").expect("valid base url"));

/// 资源查询策略，每次运行恰好一种
#[derive(Debug, Clone)]
pub(crate) enum AssetStrategy {
    /// 重定向到公共 CDN
    Remote { cdn_base: String },
    /// 从目录（解压目录或项目目录）读取 `<base_path>/<id>`
    Local { base_path: PathBuf },
}

/// 资源查询结果
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum AssetReply {
    Redirect(String),
    Bytes(Vec<u8>),
}

impl AssetStrategy {
    pub(crate) fn resolve_asset(&self, id: &str) -> Result<AssetReply, AssetError> {
        if !is_safe_asset_id(id) {
            return Err(AssetError::InvalidId(id.to_string()));
        }
        match self {
            AssetStrategy::Remote { cdn_base } => Ok(AssetReply::Redirect(asset_url(cdn_base, id))),
            AssetStrategy::Local { base_path } => match fs::read(base_path.join(id)) {
                Ok(bytes) => Ok(AssetReply::Bytes(bytes)),
                Err(e) if e.kind() == io::ErrorKind::NotFound => Err(AssetError::NotFound(id.to_string())),
                Err(source) => Err(AssetError::Io { id: id.to_string(), source }),
            },
        }
    }
}

/// 与 tiny_http 解耦的响应描述，便于测试
#[derive(Debug)]
pub(crate) struct Reply {
    pub(crate) status: u16,
    pub(crate) content_type: Option<String>,
    pub(crate) location: Option<String>,
    pub(crate) body: Vec<u8>,
}

impl Reply {
    fn ok(content_type: &str, body: Vec<u8>) -> Self {
        Self { status: 200, content_type: Some(content_type.to_string()), location: None, body }
    }

    fn redirect(location: String) -> Self {
        Self { status: 302, content_type: None, location: Some(location), body: Vec::new() }
    }

    fn text(status: u16, msg: &str) -> Self {
        Self {
            status,
            content_type: Some("text/plain; charset=utf-8".to_string()),
            location: None,
            body: msg.as_bytes().to_vec(),
        }
    }

    fn into_response(self) -> Response<Cursor<Vec<u8>>> {
        let mut resp = Response::from_data(self.body).with_status_code(self.status);
        let mut headers = vec![("Access-Control-Allow-Origin".to_string(), "*".to_string())];
        if let Some(ct) = self.content_type {
            headers.push(("Content-Type".to_string(), ct));
        }
        if let Some(loc) = self.location {
            headers.push(("Location".to_string(), loc));
        }
        for (k, v) in headers {
            match Header::from_bytes(k.as_bytes(), v.as_bytes()) {
                Ok(h) => resp.add_header(h),
                Err(_) => tracing::warn!(header = %k, "invalid header value dropped"),
            }
        }
        resp
    }
}

/// 已解析的路由
#[derive(Debug, PartialEq, Eq)]
enum Route<'a> {
    Manifest,
    Asset(&'a str),
    Static(Vec<&'a str>),
}

fn route<'a>(segments: &[&'a str]) -> Route<'a> {
    // 允许末尾的 `/`（产生空片段）
    let trimmed: &[&'a str] = match segments.split_last() {
        Some((last, rest)) if last.is_empty() => rest,
        _ => segments,
    };
    match trimmed {
        ["projects", "server"] => Route::Manifest,
        ["assets", "internalapi", "asset", id, "get"] => Route::Asset(*id),
        _ => Route::Static(
            segments
                .iter()
                .copied()
                .map(str::trim)
                .filter(|s| !s.is_empty() && *s != "." && *s != "..")
                .collect(),
        ),
    }
}

/// 桥接服务：持有解析结果，只读
#[derive(Debug)]
pub(crate) struct Bridge {
    descriptor: ProjectDescriptor,
    strategy: AssetStrategy,
    static_dir: PathBuf,
}

impl Bridge {
    pub(crate) fn new(descriptor: ProjectDescriptor, strategy: AssetStrategy, static_dir: PathBuf) -> Self {
        Self { descriptor, strategy, static_dir }
    }

    pub(crate) fn descriptor(&self) -> &ProjectDescriptor {
        &self.descriptor
    }

    /// 处理单个请求（方法 + 原始请求目标）
    pub(crate) fn handle(&self, method: &Method, raw_url: &str) -> Reply {
        if !matches!(method, Method::Get | Method::Head) {
            return Reply::text(405, "Method Not Allowed");
        }
        let url = match REQUEST_BASE.join(raw_url) {
            Ok(u) => u,
            Err(_) => return Reply::text(400, "Bad Request"),
        };
        let segments: Vec<&str> = url.path_segments().map(|s| s.collect()).unwrap_or_default();

        match route(&segments) {
            Route::Manifest => Reply::ok("application/json; charset=utf-8", self.descriptor.manifest.bytes().to_vec()),
            Route::Asset(id) => match self.strategy.resolve_asset(id) {
                Ok(AssetReply::Redirect(location)) => Reply::redirect(location),
                Ok(AssetReply::Bytes(bytes)) => Reply::ok(&content_type_for_path(Path::new(id)), bytes),
                Err(e) => {
                    tracing::warn!(asset = %id, error = %e, "asset request failed");
                    Reply::text(e.status_code(), &e.to_string())
                }
            },
            Route::Static(segs) => self.static_file(&segs, url.path().ends_with('/')),
        }
    }

    fn static_file(&self, segs: &[&str], dir_request: bool) -> Reply {
        let mut fpath = self.static_dir.clone();
        for s in segs {
            fpath.push(s);
        }
        if dir_request || segs.is_empty() || fpath.is_dir() {
            fpath.push("index.html");
        }
        if !fpath.is_file() {
            return Reply::text(404, "Not Found");
        }
        match fs::read(&fpath) {
            Ok(bytes) => Reply::ok(&content_type_for_path(&fpath), bytes),
            Err(e) => {
                tracing::warn!(path = %fpath.display(), error = %e, "static file read failed");
                Reply::text(500, "Internal Server Error")
            }
        }
    }

    /// 阻塞处理请求，直到进程结束
    pub(crate) fn serve(&self, server: &Server) {
        for rq in server.incoming_requests() {
            let reply = self.handle(rq.method(), rq.url());
            tracing::debug!(method = %rq.method(), url = %rq.url(), status = reply.status, "request");
            if let Err(e) = rq.respond(reply.into_response()) {
                tracing::debug!(error = %e, "client went away");
            }
        }
    }
}

/// 绑定监听地址
pub(crate) fn listen(addr: &str) -> anyhow::Result<Server> {
    Server::http(addr).map_err(|e| anyhow::anyhow!("cannot bind {}: {}", addr, e))
}

fn content_type_for_path(p: &Path) -> String {
    match p.extension().and_then(|e| e.to_str()).unwrap_or("").to_ascii_lowercase().as_str() {
        "html" => "text/html; charset=utf-8".into(),
        "css" => "text/css; charset=utf-8".into(),
        "js" | "mjs" => "application/javascript; charset=utf-8".into(),
        "map" | "json" => "application/json; charset=utf-8".into(),
        "txt" => "text/plain; charset=utf-8".into(),
        "svg" => "image/svg+xml".into(),
        "png" => "image/png".into(),
        "jpg" | "jpeg" => "image/jpeg".into(),
        "gif" => "image/gif".into(),
        "bmp" => "image/bmp".into(),
        "webp" => "image/webp".into(),
        "ico" => "image/x-icon".into(),
        "wav" => "audio/wav".into(),
        "mp3" => "audio/mpeg".into(),
        "ogg" => "audio/ogg".into(),
        "woff" => "font/woff".into(),
        "woff2" => "font/woff2".into(),
        "ttf" => "font/ttf".into(),
        "wasm" => "application/wasm".into(),
        _ => "application/octet-stream".into(),
    }
}
