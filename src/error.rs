//! 错误类型：
//! - `ResolveError`：解析阶段（致命，进程以 1 退出）
//! - `AssetError`：服务阶段（仅影响单个请求，映射为 HTTP 状态码）

use std::{io, path::PathBuf};
use thiserror::Error;

/// 解析项目来源时的错误
#[derive(Error, Debug)]
pub(crate) enum ResolveError {
    #[error("no project specified (use --help for help)")]
    NoSelector,

    #[error("cannot find project: {0}")]
    PathNotFound(PathBuf),

    #[error("cannot unzip file: {path}")]
    Unzip {
        path: PathBuf,
        #[source]
        source: zip::result::ZipError,
    },

    #[error("cannot prepare staging directory {path}")]
    Staging {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("staging directory {staging} would delete {path}")]
    StagingConflict { staging: PathBuf, path: PathBuf },

    #[error("cannot find project.json in {0}")]
    ManifestMissing(PathBuf),

    #[error("project.json from {origin} is not valid JSON")]
    InvalidManifest {
        origin: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid project metadata for {id}: {reason}")]
    InvalidMetadata { id: String, reason: String },

    #[error("request failed {url}: {reason}")]
    Fetch { url: String, reason: String },

    #[error("project {0} is remote, but this build has no `remote` feature")]
    RemoteDisabled(String),
}

impl ResolveError {
    /// 诊断输出的标签，与进度行一致
    pub(crate) fn tag(&self) -> &'static str {
        match self {
            ResolveError::Unzip { .. } | ResolveError::Staging { .. } | ResolveError::StagingConflict { .. } => "unzip",
            ResolveError::ManifestMissing(_) | ResolveError::InvalidManifest { .. } => "project.json",
            ResolveError::InvalidMetadata { .. } | ResolveError::Fetch { .. } | ResolveError::RemoteDisabled(_) => "fetch",
            ResolveError::NoSelector | ResolveError::PathNotFound(_) => "error",
        }
    }
}

/// 单个资源请求的错误
#[derive(Error, Debug)]
pub(crate) enum AssetError {
    #[error("invalid asset id: {0}")]
    InvalidId(String),

    #[error("asset not found: {0}")]
    NotFound(String),

    #[error("cannot read asset {id}")]
    Io {
        id: String,
        #[source]
        source: io::Error,
    },
}

impl AssetError {
    /// 对应的 HTTP 状态码
    pub(crate) fn status_code(&self) -> u16 {
        match self {
            AssetError::InvalidId(_) => 400,
            AssetError::NotFound(_) => 404,
            AssetError::Io { .. } => 500,
        }
    }
}
