// ============================================================
// Layer 6 — Artifact Storage
// ============================================================
// The destination of a run is parsed once into a Location:
//
//   gs://bucket/some/prefix  → Location::Gcs
//   anything else            → Location::Local
//
// Artifacts are always written to a local directory first. For a
// GCS destination the finished file is then copied to the bucket
// and the local copy is kept:
//
//   trainer/report ──write──▶ local dir ──publish──▶ gs://bucket/prefix
//
// GcsStore talks to the Cloud Storage JSON API:
//   upload   POST {endpoint}/upload/storage/v1/b/{bucket}/o?uploadType=media&name={object}
//   download GET  {endpoint}/storage/v1/b/{bucket}/o/{object}?alt=media
//   exists   GET  {endpoint}/storage/v1/b/{bucket}/o/{object}
//
// STORAGE_EMULATOR_HOST replaces the endpoint (fake-gcs-server and
// friends); GOOGLE_OAUTH_ACCESS_TOKEN, when set, is sent as a
// bearer token.

use anyhow::{anyhow, bail, Context, Result};
use reqwest::{blocking::Client, StatusCode, Url};
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::domain::error::ConfigError;
use crate::domain::traits::ArtifactStore;

const GCS_SCHEME:       &str = "gs://";
const GCS_ENDPOINT:     &str = "https://storage.googleapis.com";
const EMULATOR_ENV:     &str = "STORAGE_EMULATOR_HOST";
const ACCESS_TOKEN_ENV: &str = "GOOGLE_OAUTH_ACCESS_TOKEN";

// ─── Location ─────────────────────────────────────────────────────────────────
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Location {
    Local(PathBuf),
    Gcs { bucket: String, prefix: String },
}

impl Location {
    pub fn parse(raw: &str) -> Result<Self, ConfigError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(ConfigError::InvalidLocation(raw.to_string()));
        }

        let Some(rest) = raw.strip_prefix(GCS_SCHEME) else {
            return Ok(Self::Local(PathBuf::from(raw)));
        };

        let (bucket, prefix) = rest.split_once('/').unwrap_or((rest, ""));
        if bucket.is_empty() {
            return Err(ConfigError::InvalidLocation(raw.to_string()));
        }
        Ok(Self::Gcs {
            bucket: bucket.to_string(),
            prefix: prefix.trim_matches('/').to_string(),
        })
    }

    pub fn is_remote(&self) -> bool {
        matches!(self, Self::Gcs { .. })
    }

    /// Treat the location as a single object: returns the store
    /// holding it and the object's name inside that store.
    pub fn open_object(&self) -> Result<(Box<dyn ArtifactStore>, String)> {
        match self {
            Self::Local(path) => {
                let name = path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .ok_or_else(|| anyhow!("'{}' does not name a file", path.display()))?
                    .to_string();
                let dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
                Ok((Box::new(LocalStore::new(dir)), name))
            }
            Self::Gcs { bucket, prefix } => {
                if prefix.is_empty() {
                    bail!("'gs://{bucket}' does not name an object");
                }
                Ok((Box::new(GcsStore::from_env(bucket, "")), prefix.clone()))
            }
        }
    }
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Local(path) => write!(f, "{}", path.display()),
            Self::Gcs { bucket, prefix } if prefix.is_empty() => write!(f, "gs://{bucket}"),
            Self::Gcs { bucket, prefix } => write!(f, "gs://{bucket}/{prefix}"),
        }
    }
}

// ─── LocalStore ───────────────────────────────────────────────────────────────
/// A directory on the local filesystem.
#[derive(Debug, Clone)]
pub struct LocalStore {
    root: PathBuf,
}

impl LocalStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }
}

impl ArtifactStore for LocalStore {
    fn put(&self, name: &str, bytes: &[u8]) -> Result<()> {
        let path = self.path(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Cannot create directory '{}'", parent.display()))?;
        }
        fs::write(&path, bytes).with_context(|| format!("Cannot write '{}'", path.display()))?;
        tracing::debug!("Wrote {} bytes to '{}'", bytes.len(), path.display());
        Ok(())
    }

    fn get(&self, name: &str) -> Result<Vec<u8>> {
        let path = self.path(name);
        fs::read(&path).with_context(|| format!("Cannot read '{}'", path.display()))
    }

    fn exists(&self, name: &str) -> Result<bool> {
        Ok(self.path(name).is_file())
    }

    fn describe(&self, name: &str) -> String {
        self.path(name).display().to_string()
    }
}

// ─── GcsStore ─────────────────────────────────────────────────────────────────
/// A bucket prefix in Google Cloud Storage.
pub struct GcsStore {
    client:   Client,
    endpoint: String,
    bucket:   String,
    prefix:   String,
    token:    Option<String>,
}

impl GcsStore {
    pub fn new(
        endpoint: impl Into<String>,
        bucket:   impl Into<String>,
        prefix:   impl Into<String>,
        token:    Option<String>,
    ) -> Self {
        Self {
            client:   Client::new(),
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            bucket:   bucket.into(),
            prefix:   prefix.into(),
            token,
        }
    }

    /// Endpoint and credentials from the environment.
    pub fn from_env(bucket: &str, prefix: &str) -> Self {
        let endpoint = std::env::var(EMULATOR_ENV)
            .map(|host| {
                if host.starts_with("http") { host } else { format!("http://{host}") }
            })
            .unwrap_or_else(|_| GCS_ENDPOINT.to_string());
        let token = std::env::var(ACCESS_TOKEN_ENV).ok().filter(|t| !t.is_empty());
        Self::new(endpoint, bucket, prefix, token)
    }

    pub fn object_name(&self, name: &str) -> String {
        if self.prefix.is_empty() {
            name.to_string()
        } else {
            format!("{}/{}", self.prefix, name)
        }
    }

    fn object_url(&self, name: &str) -> Result<Url> {
        let object  = self.object_name(name);
        let mut url = Url::parse(&self.endpoint)
            .with_context(|| format!("Invalid storage endpoint '{}'", self.endpoint))?;
        url.path_segments_mut()
            .map_err(|_| anyhow!("Storage endpoint '{}' cannot take a path", self.endpoint))?
            .pop_if_empty()
            .extend(["storage", "v1", "b", self.bucket.as_str(), "o", object.as_str()]);
        Ok(url)
    }

    fn upload_url(&self, name: &str) -> Result<Url> {
        let mut url = Url::parse(&self.endpoint)
            .with_context(|| format!("Invalid storage endpoint '{}'", self.endpoint))?;
        url.path_segments_mut()
            .map_err(|_| anyhow!("Storage endpoint '{}' cannot take a path", self.endpoint))?
            .pop_if_empty()
            .extend(["upload", "storage", "v1", "b", self.bucket.as_str(), "o"]);
        url.query_pairs_mut()
            .append_pair("uploadType", "media")
            .append_pair("name", &self.object_name(name));
        Ok(url)
    }

    fn authorize(
        &self,
        request: reqwest::blocking::RequestBuilder,
    ) -> reqwest::blocking::RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None        => request,
        }
    }
}

impl ArtifactStore for GcsStore {
    fn put(&self, name: &str, bytes: &[u8]) -> Result<()> {
        let url = self.upload_url(name)?;
        self.authorize(self.client.post(url))
            .header(reqwest::header::CONTENT_TYPE, "application/octet-stream")
            .body(bytes.to_vec())
            .send()
            .and_then(|r| r.error_for_status())
            .with_context(|| format!("Upload to '{}' failed", self.describe(name)))?;
        tracing::debug!("Uploaded {} bytes to '{}'", bytes.len(), self.describe(name));
        Ok(())
    }

    fn get(&self, name: &str) -> Result<Vec<u8>> {
        let mut url = self.object_url(name)?;
        url.query_pairs_mut().append_pair("alt", "media");
        let response = self
            .authorize(self.client.get(url))
            .send()
            .and_then(|r| r.error_for_status())
            .with_context(|| format!("Download of '{}' failed", self.describe(name)))?;
        Ok(response.bytes()?.to_vec())
    }

    fn exists(&self, name: &str) -> Result<bool> {
        let url      = self.object_url(name)?;
        let response = self
            .authorize(self.client.get(url))
            .send()
            .with_context(|| format!("Lookup of '{}' failed", self.describe(name)))?;
        match response.status() {
            StatusCode::NOT_FOUND => Ok(false),
            status if status.is_success() => Ok(true),
            status => bail!("Lookup of '{}' returned {status}", self.describe(name)),
        }
    }

    fn describe(&self, name: &str) -> String {
        format!("gs://{}/{}", self.bucket, self.object_name(name))
    }
}

// ─── OutputDir ────────────────────────────────────────────────────────────────
/// Where a run's artifacts go: always a local directory, plus a
/// remote copy when the destination is a bucket.
pub struct OutputDir {
    local:  LocalStore,
    remote: Option<Box<dyn ArtifactStore>>,
}

impl OutputDir {
    /// `local_dir` is only used when the destination is remote.
    pub fn new(destination: &Location, local_dir: &Path) -> Result<Self> {
        let (root, remote): (PathBuf, Option<Box<dyn ArtifactStore>>) = match destination {
            Location::Local(path) => (path.clone(), None),
            Location::Gcs { bucket, prefix } => (
                local_dir.to_path_buf(),
                Some(Box::new(GcsStore::from_env(bucket, prefix))),
            ),
        };
        fs::create_dir_all(&root)
            .with_context(|| format!("Cannot create output directory '{}'", root.display()))?;
        Ok(Self { local: LocalStore::new(root), remote })
    }

    pub fn local(&self) -> &LocalStore {
        &self.local
    }

    pub fn local_path(&self, name: &str) -> PathBuf {
        self.local.path(name)
    }

    /// Copy a finished local artifact to the remote destination.
    /// Does nothing for a local destination.
    pub fn publish(&self, name: &str) -> Result<()> {
        let Some(remote) = &self.remote else {
            return Ok(());
        };
        let bytes = self.local.get(name)?;
        remote.put(name, &bytes)?;
        tracing::info!("Copied '{}' to '{}'", self.local.describe(name), remote.describe(name));
        Ok(())
    }

    /// Publish every artifact that was actually written and return
    /// their names. Missing files are skipped with a warning.
    pub fn publish_all(&self, names: &[String]) -> Result<Vec<String>> {
        let mut published = Vec::with_capacity(names.len());
        for name in names {
            if !self.local.exists(name)? {
                tracing::warn!("Skipping '{}': it was never written", self.local.describe(name));
                continue;
            }
            self.publish(name)?;
            published.push(name.clone());
        }
        Ok(published)
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_local_and_remote() {
        assert_eq!(Location::parse("out/run1").unwrap(), Location::Local("out/run1".into()));
        assert_eq!(
            Location::parse("gs://bucket/jobs/run1/").unwrap(),
            Location::Gcs { bucket: "bucket".into(), prefix: "jobs/run1".into() }
        );
        assert_eq!(
            Location::parse("gs://bucket").unwrap(),
            Location::Gcs { bucket: "bucket".into(), prefix: String::new() }
        );
        assert!(Location::parse("gs://bucket").unwrap().is_remote());
    }

    #[test]
    fn test_parse_rejects_empty_and_bucketless() {
        assert!(matches!(Location::parse("  "), Err(ConfigError::InvalidLocation(_))));
        assert!(matches!(Location::parse("gs://"), Err(ConfigError::InvalidLocation(_))));
        assert!(matches!(Location::parse("gs:///x"), Err(ConfigError::InvalidLocation(_))));
    }

    #[test]
    fn test_display_round_trips() {
        for raw in ["gs://b/p/q", "gs://b", "some/dir"] {
            assert_eq!(Location::parse(raw).unwrap().to_string(), raw);
        }
    }

    #[test]
    fn test_local_store_put_get_exists() {
        let dir   = tempfile::tempdir().unwrap();
        let store = LocalStore::new(dir.path().join("nested"));
        assert!(!store.exists("a.bin").unwrap());
        store.put("a.bin", b"abc").unwrap();
        assert!(store.exists("a.bin").unwrap());
        assert_eq!(store.get("a.bin").unwrap(), b"abc");
        assert!(store.get("missing").is_err());
    }

    #[test]
    fn test_gcs_urls_escape_object_names() {
        let store = GcsStore::new("http://localhost:4443/", "bkt", "jobs/run 1", None);
        assert_eq!(store.object_name("lr.png"), "jobs/run 1/lr.png");
        assert_eq!(store.describe("lr.png"), "gs://bkt/jobs/run 1/lr.png");

        let url = store.object_url("lr.png").unwrap();
        assert_eq!(url.as_str(), "http://localhost:4443/storage/v1/b/bkt/o/jobs%2Frun%201%2Flr.png");

        let upload = store.upload_url("lr.png").unwrap();
        assert!(upload.as_str().starts_with("http://localhost:4443/upload/storage/v1/b/bkt/o?"));
        assert!(upload.query_pairs().any(|(k, v)| k == "name" && v == "jobs/run 1/lr.png"));
    }

    #[test]
    fn test_open_local_object() {
        let dir  = tempfile::tempdir().unwrap();
        let file = dir.path().join("params.yaml");
        fs::write(&file, "n_epochs: 3").unwrap();

        let (store, name) = Location::Local(file).open_object().unwrap();
        assert_eq!(name, "params.yaml");
        assert_eq!(store.get(&name).unwrap(), b"n_epochs: 3");
    }

    #[test]
    fn test_local_output_dir_publish_is_noop() {
        let dir = tempfile::tempdir().unwrap();
        let out = OutputDir::new(&Location::Local(dir.path().join("job")), Path::new("unused")).unwrap();
        out.local().put("x.txt", b"1").unwrap();
        out.publish("x.txt").unwrap();
        assert!(out.local_path("x.txt").is_file());
    }

    /// An output dir whose "remote" is a second local directory.
    fn mirrored(root: &Path) -> OutputDir {
        OutputDir {
            local:  LocalStore::new(root.join("local")),
            remote: Some(Box::new(LocalStore::new(root.join("remote")))),
        }
    }

    #[test]
    fn test_publish_copies_to_remote_and_keeps_local() {
        let dir = tempfile::tempdir().unwrap();
        let out = mirrored(dir.path());
        out.local().put("ckpt.mpk.gz", b"weights").unwrap();

        out.publish("ckpt.mpk.gz").unwrap();

        assert_eq!(fs::read(dir.path().join("remote/ckpt.mpk.gz")).unwrap(), b"weights");
        assert_eq!(out.local().get("ckpt.mpk.gz").unwrap(), b"weights");
    }

    #[test]
    fn test_publish_of_unwritten_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let out = mirrored(dir.path());
        assert!(out.publish("missing.png").is_err());
        assert!(!dir.path().join("remote/missing.png").exists());
    }

    #[test]
    fn test_publish_all_skips_unwritten_files() {
        let dir = tempfile::tempdir().unwrap();
        let out = mirrored(dir.path());
        out.local().put("log_run.csv", b"epoch").unwrap();
        out.local().put("lr_run.png", b"png").unwrap();

        let names: Vec<String> = ["run.mpk.gz", "best_epoch.json", "log_run.csv", "lr_run.png"]
            .map(String::from)
            .to_vec();
        let published = out.publish_all(&names).unwrap();

        assert_eq!(published, vec!["log_run.csv".to_string(), "lr_run.png".to_string()]);
        assert!(dir.path().join("remote/log_run.csv").is_file());
        assert!(dir.path().join("remote/lr_run.png").is_file());
        assert!(!dir.path().join("remote/run.mpk.gz").exists());
    }
}
