//! 项目解析模块：
//! - 远程：元数据代理取 token，再下载 project.json，资源重定向到 CDN
//! - 本地：压缩包解压到暂存目录 / 目录原样使用，资源从磁盘读取
//! 解析完成后得到不可变的 `ProjectDescriptor` 与唯一的 `AssetStrategy`

use serde_json::Value;
use std::{fs, path::Path};

use crate::{
    bridge::AssetStrategy,
    config::Settings,
    error::ResolveError,
    output,
    selector::Selector,
    staging::StagingArea,
    utils::display_name,
};

pub(crate) const DEFAULT_TITLE: &str = "unknown";
pub(crate) const MANIFEST_FILE: &str = "project.json";

/// 项目 JSON：保存原始字节（原样返回）与解析后的值
#[derive(Debug, Clone)]
pub(crate) struct Manifest {
    raw: Vec<u8>,
    value: Value,
}

impl Manifest {
    /// 校验并包装；`origin` 只用于错误信息
    pub(crate) fn parse(raw: Vec<u8>, origin: &str) -> Result<Self, ResolveError> {
        let value = serde_json::from_slice(&raw)
            .map_err(|source| ResolveError::InvalidManifest { origin: origin.to_string(), source })?;
        Ok(Self { raw, value })
    }

    pub(crate) fn bytes(&self) -> &[u8] {
        &self.raw
    }

    pub(crate) fn value(&self) -> &Value {
        &self.value
    }

    /// 舞台 + 角色数量（sb3 的 `targets`），旧格式返回 None
    pub(crate) fn target_count(&self) -> Option<usize> {
        self.value().get("targets").and_then(|t| t.as_array()).map(|t| t.len())
    }
}

#[derive(Debug, Clone)]
pub(crate) struct ProjectDescriptor {
    /// 仅远程项目有 id
    pub(crate) id: Option<String>,
    pub(crate) title: String,
    pub(crate) manifest: Manifest,
}

/// 解析结果：描述 + 资源策略
#[derive(Debug, Clone)]
pub(crate) struct Resolved {
    pub(crate) descriptor: ProjectDescriptor,
    pub(crate) strategy: AssetStrategy,
}

/// 按选择器类型解析项目
pub(crate) fn resolve(
    selector: &Selector,
    settings: &Settings,
) -> Result<Resolved, ResolveError> {
    tracing::debug!(source = %selector.describe(), "resolving");
    match selector {
        Selector::RemoteById(id) => resolve_remote(id, settings),
        Selector::LocalArchive(path) => {
            output::progress("unzip", format!("found file {}", path.display()));
            output::progress("unzip", "trying to unzip");
            // 只有压缩包才清空暂存目录
            let staging = StagingArea::for_archive(&settings.staging_dir, path)?;
            staging.extract(path)?;
            output::progress("unzip", format!("unzipped to {}", staging.path().display()));
            resolve_local(path, staging.path())
        }
        Selector::LocalDirectory(path) => {
            output::progress("directory", format!("found directory {}", path.display()));
            resolve_local(path, path)
        }
    }
}

/// 从 `base_path` 读取 project.json；标题取选择器的基本名
pub(crate) fn resolve_local(selector_path: &Path, base_path: &Path) -> Result<Resolved, ResolveError> {
    output::progress("project.json", "trying to read project.json");
    let manifest_path = base_path.join(MANIFEST_FILE);
    let raw = fs::read(&manifest_path).map_err(|e| {
        tracing::debug!(path = %manifest_path.display(), error = %e, "manifest read failed");
        ResolveError::ManifestMissing(base_path.to_path_buf())
    })?;
    let manifest = Manifest::parse(raw, &manifest_path.display().to_string())?;
    output::progress("project.json", "read project.json");

    Ok(Resolved {
        descriptor: ProjectDescriptor {
            id: None,
            title: display_name(selector_path),
            manifest,
        },
        strategy: AssetStrategy::Local { base_path: base_path.to_path_buf() },
    })
}

#[cfg(feature = "remote")]
pub(crate) fn resolve_remote(id: &str, settings: &Settings) -> Result<Resolved, ResolveError> {
    output::progress("fetch", format!("fetching project {}", id));
    let agent = remote::agent(settings);
    let endpoints = &settings.endpoints;

    let meta = remote::fetch_metadata(&agent, &endpoints.metadata_url(id), id)?;
    let token = meta.project_token.ok_or_else(|| ResolveError::InvalidMetadata {
        id: id.to_string(),
        reason: "missing project_token".to_string(),
    })?;
    let project_url = endpoints.project_url(id, &token);
    let raw = remote::get_bytes(&agent, &project_url)?;
    let manifest = Manifest::parse(raw, &endpoints.project_url(id, "<token>"))?;
    output::progress("fetch", "fetched");

    Ok(Resolved {
        descriptor: ProjectDescriptor {
            id: Some(id.to_string()),
            title: meta.title.filter(|t| !t.is_empty()).unwrap_or_else(|| DEFAULT_TITLE.to_string()),
            manifest,
        },
        strategy: AssetStrategy::Remote { cdn_base: endpoints.asset.clone() },
    })
}

#[cfg(not(feature = "remote"))]
pub(crate) fn resolve_remote(id: &str, _settings: &Settings) -> Result<Resolved, ResolveError> {
    Err(ResolveError::RemoteDisabled(id.to_string()))
}

#[cfg(feature = "remote")]
mod remote {
    use serde::Deserialize;
    use std::io::Read;

    use crate::{config::Settings, error::ResolveError};

    /// 元数据代理返回的字段（其余忽略）
    #[derive(Debug, Deserialize)]
    pub(super) struct ProjectMeta {
        #[serde(default)]
        pub(super) title: Option<String>,
        #[serde(default)]
        pub(super) project_token: Option<String>,
    }

    pub(super) fn agent(settings: &Settings) -> ureq::Agent {
        ureq::AgentBuilder::new()
            .timeout(settings.timeout)
            .user_agent(concat!("nyaice/", env!("CARGO_PKG_VERSION")))
            .build()
    }

    pub(super) fn get_bytes(agent: &ureq::Agent, url: &str) -> Result<Vec<u8>, ResolveError> {
        tracing::debug!(%url, "GET");
        let resp = agent.get(url).call().map_err(|e| ResolveError::Fetch {
            url: url.to_string(),
            reason: e.to_string(),
        })?;
        let mut buf = Vec::new();
        resp.into_reader().read_to_end(&mut buf).map_err(|e| ResolveError::Fetch {
            url: url.to_string(),
            reason: format!("cannot read response body: {}", e),
        })?;
        Ok(buf)
    }

    pub(super) fn fetch_metadata(agent: &ureq::Agent, url: &str, id: &str) -> Result<ProjectMeta, ResolveError> {
        let raw = get_bytes(agent, url)?;
        serde_json::from_slice(&raw).map_err(|e| ResolveError::InvalidMetadata {
            id: id.to_string(),
            reason: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Endpoints, DEFAULT_TIMEOUT_SECS};
    use crate::staging::tests::write_zip;
    use std::{path::PathBuf, time::Duration};

    const MANIFEST: &str = r#"{"targets":[{"isStage":true},{"isStage":false}],"meta":{"semver":"3.0.0"}}"#;

    fn settings_with(endpoints: Endpoints, staging_dir: PathBuf) -> Settings {
        Settings {
            host: "127.0.0.1".into(),
            port: 0,
            editor: false,
            open: false,
            static_dir: PathBuf::from("build"),
            staging_dir,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            endpoints,
        }
    }

    #[test]
    fn manifest_keeps_exact_bytes() {
        let raw = b"{ \"targets\" : [] ,\n \"z\":1, \"a\":2 }".to_vec();
        let m = Manifest::parse(raw.clone(), "inline").unwrap();
        assert_eq!(m.bytes(), raw.as_slice());
        assert_eq!(m.target_count(), Some(0));
        assert_eq!(m.value()["a"], 2);
    }

    #[test]
    fn manifest_rejects_invalid_json() {
        let err = Manifest::parse(b"{not json".to_vec(), "inline").unwrap_err();
        assert!(matches!(err, ResolveError::InvalidManifest { .. }));
    }

    #[test]
    fn directory_is_used_in_place() {
        let root = tempfile::tempdir().unwrap();
        let project = root.path().join("my-game");
        fs::create_dir_all(&project).unwrap();
        fs::write(project.join(MANIFEST_FILE), MANIFEST).unwrap();
        let staging_dir = root.path().join("tmp");

        let settings = settings_with(Endpoints::default(), staging_dir.clone());
        let resolved = resolve(&Selector::LocalDirectory(project.clone()), &settings).unwrap();

        assert_eq!(resolved.descriptor.title, "my-game");
        assert_eq!(resolved.descriptor.id, None);
        assert_eq!(resolved.descriptor.manifest.bytes(), MANIFEST.as_bytes());
        assert!(matches!(resolved.strategy, AssetStrategy::Local { ref base_path } if *base_path == project));
        assert!(!staging_dir.exists());
    }

    #[test]
    fn directory_survives_staging_dir_pointing_at_it() {
        let root = tempfile::tempdir().unwrap();
        let project = root.path().join("proj");
        fs::create_dir_all(&project).unwrap();
        fs::write(project.join(MANIFEST_FILE), MANIFEST).unwrap();
        fs::write(project.join("a.png"), b"png").unwrap();

        for staging_dir in [project.clone(), root.path().to_path_buf()] {
            let settings = settings_with(Endpoints::default(), staging_dir);
            let resolved = resolve(&Selector::LocalDirectory(project.clone()), &settings).unwrap();
            assert_eq!(resolved.strategy.resolve_asset("a.png").unwrap(), crate::bridge::AssetReply::Bytes(b"png".to_vec()));
        }
        assert!(project.join(MANIFEST_FILE).is_file());
    }

    #[test]
    fn archive_inside_staging_dir_is_refused() {
        let root = tempfile::tempdir().unwrap();
        let archive = root.path().join("cat.sb3");
        write_zip(&archive, &[(MANIFEST_FILE, MANIFEST.as_bytes())]);

        let settings = settings_with(Endpoints::default(), root.path().to_path_buf());
        let err = resolve(&Selector::LocalArchive(archive.clone()), &settings).unwrap_err();
        assert!(matches!(err, ResolveError::StagingConflict { .. }));
        assert!(archive.is_file());
    }

    #[test]
    fn archive_is_extracted_into_staging() {
        let root = tempfile::tempdir().unwrap();
        let archive = root.path().join("cat.sb3");
        write_zip(&archive, &[(MANIFEST_FILE, MANIFEST.as_bytes()), ("a1.png", b"png")]);
        let staging_dir = root.path().join("tmp");

        let settings = settings_with(Endpoints::default(), staging_dir.clone());
        let resolved = resolve(&Selector::LocalArchive(archive), &settings).unwrap();

        assert_eq!(resolved.descriptor.title, "cat.sb3");
        assert_eq!(resolved.descriptor.manifest.target_count(), Some(2));
        match resolved.strategy {
            AssetStrategy::Local { base_path } => assert_eq!(base_path, staging_dir),
            other => panic!("unexpected strategy: {:?}", other),
        }
    }

    #[test]
    fn archive_without_top_level_manifest_fails() {
        let root = tempfile::tempdir().unwrap();
        let archive = root.path().join("nested.zip");
        write_zip(&archive, &[("inner/project.json", MANIFEST.as_bytes())]);
        let staging_dir = root.path().join("tmp");

        let settings = settings_with(Endpoints::default(), staging_dir.clone());
        let err = resolve(&Selector::LocalArchive(archive), &settings).unwrap_err();
        assert!(matches!(err, ResolveError::ManifestMissing(p) if p == staging_dir));
    }

    #[test]
    fn corrupt_archive_reports_unzip_error() {
        let root = tempfile::tempdir().unwrap();
        let archive = root.path().join("broken.sb3");
        fs::write(&archive, b"nope").unwrap();
        let settings = settings_with(Endpoints::default(), root.path().join("tmp"));
        let err = resolve(&Selector::LocalArchive(archive), &settings).unwrap_err();
        assert!(matches!(err, ResolveError::Unzip { .. }));
    }

    #[test]
    fn invalid_local_manifest_is_reported() {
        let root = tempfile::tempdir().unwrap();
        fs::write(root.path().join(MANIFEST_FILE), "{oops").unwrap();
        let err = resolve_local(root.path(), root.path()).unwrap_err();
        assert!(matches!(err, ResolveError::InvalidManifest { .. }));
    }

    #[test]
    fn rerun_does_not_expose_previous_staging_files() {
        let root = tempfile::tempdir().unwrap();
        let staging_dir = root.path().join("tmp");
        let first = root.path().join("first.sb3");
        write_zip(&first, &[(MANIFEST_FILE, MANIFEST.as_bytes()), ("old.png", b"old")]);
        let second = root.path().join("second.sb3");
        write_zip(&second, &[(MANIFEST_FILE, MANIFEST.as_bytes())]);
        let settings = settings_with(Endpoints::default(), staging_dir.clone());

        resolve(&Selector::LocalArchive(first), &settings).unwrap();
        assert!(staging_dir.join("old.png").exists());

        let resolved = resolve(&Selector::LocalArchive(second), &settings).unwrap();
        assert!(!staging_dir.join("old.png").exists());
        assert!(matches!(
            resolved.strategy.resolve_asset("old.png"),
            Err(crate::error::AssetError::NotFound(_))
        ));
    }

    #[cfg(feature = "remote")]
    mod remote_tests {
        use super::*;
        use std::{io::Cursor, thread};
        use tiny_http::{Response, Server};

        /// 启动一个模拟上游：按路径前缀返回元数据或项目 JSON
        fn mock_upstream(meta: &'static str, manifest: &'static str) -> String {
            let server = Server::http("127.0.0.1:0").unwrap();
            let addr = server.server_addr().to_ip().unwrap();
            thread::spawn(move || {
                for rq in server.incoming_requests() {
                    let url = rq.url().to_string();
                    let body: Response<Cursor<Vec<u8>>> = if url.starts_with("/meta/") {
                        Response::from_data(meta.as_bytes().to_vec())
                    } else if url.starts_with("/project/10128407/?token=tok-1") {
                        Response::from_data(manifest.as_bytes().to_vec())
                    } else {
                        Response::from_data(b"missing".to_vec()).with_status_code(404)
                    };
                    let _ = rq.respond(body);
                }
            });
            format!("http://{}", addr)
        }

        fn endpoints(base: &str) -> Endpoints {
            Endpoints {
                metadata: format!("{}/meta", base),
                project: format!("{}/project", base),
                asset: "https://assets.example.test".into(),
            }
        }

        #[test]
        fn fetches_metadata_then_manifest() {
            let base = mock_upstream(r#"{"title":"Pong","project_token":"tok-1"}"#, MANIFEST);
            let root = tempfile::tempdir().unwrap();
            let settings = settings_with(endpoints(&base), root.path().join("tmp"));

            let resolved = resolve_remote("10128407", &settings).unwrap();
            assert_eq!(resolved.descriptor.id.as_deref(), Some("10128407"));
            assert_eq!(resolved.descriptor.title, "Pong");
            assert_eq!(resolved.descriptor.manifest.bytes(), MANIFEST.as_bytes());
            assert!(matches!(
                resolved.strategy,
                AssetStrategy::Remote { ref cdn_base } if cdn_base == "https://assets.example.test"
            ));
        }

        #[test]
        fn missing_token_is_invalid_metadata() {
            let base = mock_upstream(r#"{"title":"Pong"}"#, MANIFEST);
            let root = tempfile::tempdir().unwrap();
            let settings = settings_with(endpoints(&base), root.path().join("tmp"));

            let err = resolve_remote("10128407", &settings).unwrap_err();
            assert!(matches!(err, ResolveError::InvalidMetadata { .. }));
        }

        #[test]
        fn upstream_error_status_is_a_fetch_error() {
            let base = mock_upstream(r#"{"title":"Pong","project_token":"wrong"}"#, MANIFEST);
            let root = tempfile::tempdir().unwrap();
            let settings = settings_with(endpoints(&base), root.path().join("tmp"));

            let err = resolve_remote("10128407", &settings).unwrap_err();
            assert!(matches!(err, ResolveError::Fetch { .. }));
        }

        #[test]
        fn invalid_remote_manifest_is_reported() {
            let base = mock_upstream(r#"{"title":"","project_token":"tok-1"}"#, "<html>");
            let root = tempfile::tempdir().unwrap();
            let settings = settings_with(endpoints(&base), root.path().join("tmp"));

            let err = resolve_remote("10128407", &settings).unwrap_err();
            assert!(matches!(err, ResolveError::InvalidManifest { .. }));
        }
    }
}
