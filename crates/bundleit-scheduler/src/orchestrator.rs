//! Pipeline orchestrator - runs the publish steps strictly in order.
//!
//! fetch -> resolve version -> build -> hash -> upload -> register.
//! The first error ends the run; nothing is retried or rolled back.

use bundleit_config::PipelineConfig;
use bundleit_core::artifact::{ArtifactUploader, BuildArtifact, UploadedArtifact};
use bundleit_core::bundle::{BundleRecord, BundleRegistry};
use bundleit_core::executor::{BuildRunner, package_manager_steps};
use bundleit_core::manifest::ProjectManifest;
use bundleit_core::pipeline::{PipelineRun, PipelineState};
use bundleit_core::repository::SourceControl;
use bundleit_core::{Error, Result};
use std::sync::Arc;
use tracing::{error, info, warn};

/// What a successful run published.
#[derive(Debug, Clone)]
pub struct PublishedBundle {
    pub record: BundleRecord,
    pub upload: UploadedArtifact,
    /// `data` returned by the registry.
    pub registration: serde_json::Value,
}

/// Result of a pipeline execution.
#[derive(Debug)]
pub struct PipelineResult {
    pub run: PipelineRun,
    pub outcome: Result<PublishedBundle>,
}

impl PipelineResult {
    pub fn success(&self) -> bool {
        self.outcome.is_ok()
    }

    pub fn into_result(self) -> Result<PublishedBundle> {
        self.outcome
    }
}

/// Drives one pipeline run through the backends.
pub struct PipelineOrchestrator {
    source: Arc<dyn SourceControl>,
    builder: Arc<dyn BuildRunner>,
    uploader: Arc<dyn ArtifactUploader>,
    registry: Arc<dyn BundleRegistry>,
}

impl PipelineOrchestrator {
    pub fn new(
        source: Arc<dyn SourceControl>,
        builder: Arc<dyn BuildRunner>,
        uploader: Arc<dyn ArtifactUploader>,
        registry: Arc<dyn BundleRegistry>,
    ) -> Self {
        Self {
            source,
            builder,
            uploader,
            registry,
        }
    }

    /// Execute the pipeline once.
    pub async fn execute(&self, config: &PipelineConfig) -> PipelineResult {
        let mut run = PipelineRun::new();
        info!(
            run_id = %run.id,
            repo = %config.source.url,
            revision = %config.source.revision_label(),
            "Starting pipeline run"
        );

        let mut outcome = self.execute_inner(config, &mut run).await;
        if outcome.is_ok() {
            if let Err(e) = run.advance(PipelineState::Done) {
                outcome = Err(e.into());
            }
        }

        match &outcome {
            Ok(published) => info!(
                run_id = %run.id,
                version = %published.record.version_name,
                commit = %published.record.commit_hash,
                download_url = %published.upload.download_url,
                "Pipeline completed successfully"
            ),
            Err(e) => {
                run.fail(e.to_string());
                error!(run_id = %run.id, state = %run.state(), error = %e, "Pipeline failed");
            }
        }

        PipelineResult { run, outcome }
    }

    async fn execute_inner(
        &self,
        config: &PipelineConfig,
        run: &mut PipelineRun,
    ) -> Result<PublishedBundle> {
        let repo = self
            .source
            .fetch(&config.source, &config.checkout_dir)
            .await?;
        run.advance(PipelineState::Fetched)?;

        let project_dir = repo.project_dir(&config.project_path);
        let manifest = ProjectManifest::load(&project_dir).await?;
        let version = manifest.project_version()?;
        info!(version = %version, code = version.code(), "Project version");
        let commit = self.source.head_commit(&repo).await?;
        info!(commit = %commit, "Current commit hash");
        run.advance(PipelineState::VersionResolved)?;

        for step in package_manager_steps(&config.package_manager) {
            self.builder.run(&step, &project_dir).await?;
        }
        run.advance(PipelineState::Built)?;

        let artifact = BuildArtifact::read(&project_dir.join(&config.dist_path)).await?;
        info!(
            path = %artifact.path().display(),
            sha256 = %artifact.sha256(),
            size = artifact.size(),
            "Bundle hashed"
        );
        run.advance(PipelineState::Hashed)?;

        let upload = self.uploader.upload(&artifact).await?;
        run.advance(PipelineState::Uploaded)?;

        let record = BundleRecord {
            app_name: config.app.app_name.clone(),
            version_code: version.code(),
            version_name: version.name.clone(),
            min_app_version: config.app.min_app_version,
            max_app_version: config.app.max_app_version,
            bundle_name: manifest.bundle_name().to_string(),
            commit_hash: commit,
            bundle_sha256: artifact.sha256().to_string(),
            download_url: upload.download_url.clone(),
            is_preset: manifest.is_preset(),
        };
        let registration = self
            .registry
            .register(&record)
            .await
            .inspect_err(|_| {
                // not reconciled; surfaced so the orphan can be removed by hand
                warn!(
                    download_url = %upload.download_url,
                    "Uploaded bundle was not registered"
                );
            })?;
        run.advance(PipelineState::Registered)?;

        Ok(PublishedBundle {
            record,
            upload,
            registration,
        })
    }
}

/// Short name for the kind of failure, used in run summaries.
pub fn failure_kind(error: &Error) -> &'static str {
    match error {
        Error::SourceFetch { .. } => "source-fetch",
        Error::VersionParse { .. } => "version-parse",
        Error::Build { .. } => "build",
        Error::ArtifactNotFound(_) => "artifact-not-found",
        Error::Upload { .. } => "upload",
        Error::MalformedUploadResponse { .. } => "malformed-upload-response",
        Error::Registration { .. } => "registration",
        Error::Manifest { .. } => "manifest",
        Error::Transport { .. } => "transport",
        Error::Transition(_) => "transition",
        Error::Io(_) => "io",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bundleit_config::{ConfigFile, Overrides};
    use bundleit_core::executor::BuildStep;
    use bundleit_core::repository::{CheckedOutRepository, SourceSpec};
    use std::path::Path;
    use std::sync::Mutex;

    const HEAD: &str = "0123456789abcdef0123456789abcdef01234567";

    type Calls = Arc<Mutex<Vec<String>>>;

    fn record_call(calls: &Calls, call: impl Into<String>) {
        calls.lock().unwrap().push(call.into());
    }

    struct FakeSource {
        calls: Calls,
        head: String,
        manifest: String,
    }

    #[async_trait]
    impl SourceControl for FakeSource {
        async fn fetch(&self, source: &SourceSpec, dest: &Path) -> Result<CheckedOutRepository> {
            record_call(&self.calls, format!("fetch {}", source.revision_label()));
            let project = dest.join("app");
            std::fs::create_dir_all(&project)?;
            std::fs::write(project.join("package.json"), &self.manifest)?;
            Ok(CheckedOutRepository::new(dest))
        }

        async fn head_commit(&self, _repo: &CheckedOutRepository) -> Result<String> {
            record_call(&self.calls, "head");
            Ok(self.head.clone())
        }
    }

    struct FakeBuilder {
        calls: Calls,
        fail_on: Option<&'static str>,
        produce_artifact: bool,
    }

    #[async_trait]
    impl BuildRunner for FakeBuilder {
        async fn run(&self, step: &BuildStep, working_dir: &Path) -> Result<()> {
            let command = step.command_line();
            record_call(&self.calls, command.clone());
            if self.fail_on == Some(step.args[0].as_str()) {
                return Err(Error::Build {
                    command,
                    exit_code: Some(1),
                });
            }
            if step.args[0] == "build" && self.produce_artifact {
                let dist = working_dir.join("dist");
                std::fs::create_dir_all(&dist)?;
                std::fs::write(dist.join("main.lynx.bundle"), b"bundle contents")?;
            }
            Ok(())
        }
    }

    struct FakeUploader {
        calls: Calls,
        malformed: bool,
    }

    #[async_trait]
    impl ArtifactUploader for FakeUploader {
        async fn upload(&self, artifact: &BuildArtifact) -> Result<UploadedArtifact> {
            record_call(&self.calls, format!("upload {}", artifact.upload_path()));
            if self.malformed {
                return Err(Error::MalformedUploadResponse {
                    body: "{}".to_string(),
                });
            }
            Ok(UploadedArtifact {
                sha256: artifact.sha256().to_string(),
                upload_path: artifact.upload_path(),
                download_url: format!("https://cdn.example.com/{}", artifact.upload_path()),
            })
        }
    }

    struct FakeRegistry {
        calls: Calls,
        records: Mutex<Vec<BundleRecord>>,
    }

    #[async_trait]
    impl BundleRegistry for FakeRegistry {
        async fn register(&self, record: &BundleRecord) -> Result<serde_json::Value> {
            record_call(&self.calls, "register");
            self.records.lock().unwrap().push(record.clone());
            Ok(serde_json::json!({ "id": 1 }))
        }
    }

    struct Harness {
        calls: Calls,
        registry: Arc<FakeRegistry>,
        orchestrator: PipelineOrchestrator,
    }

    #[derive(Default)]
    struct Scenario {
        head: Option<&'static str>,
        version: Option<&'static str>,
        fail_on: Option<&'static str>,
        no_artifact: bool,
        malformed_upload: bool,
    }

    fn harness(scenario: Scenario) -> Harness {
        let calls: Calls = Arc::default();
        let manifest = match scenario.version {
            Some(v) => format!(
                r#"{{ "version": "{v}", "bundleConfig": {{ "bundleName": "shop.lynx.bundle" }} }}"#
            ),
            None => "{}".to_string(),
        };
        let registry = Arc::new(FakeRegistry {
            calls: calls.clone(),
            records: Mutex::default(),
        });
        let orchestrator = PipelineOrchestrator::new(
            Arc::new(FakeSource {
                calls: calls.clone(),
                head: scenario.head.unwrap_or(HEAD).to_string(),
                manifest,
            }),
            Arc::new(FakeBuilder {
                calls: calls.clone(),
                fail_on: scenario.fail_on,
                produce_artifact: !scenario.no_artifact,
            }),
            Arc::new(FakeUploader {
                calls: calls.clone(),
                malformed: scenario.malformed_upload,
            }),
            registry.clone(),
        );
        Harness {
            calls,
            registry,
            orchestrator,
        }
    }

    fn config(checkout: &Path, revision: Option<&str>) -> PipelineConfig {
        let file = ConfigFile::parse(
            r#"{
                "projectPath": "app",
                "repo": "git@github.com:org/shop.git",
                "distPath": "dist/main.lynx.bundle",
                "assetsUploadUrl": "https://assets.example.com/upload",
                "assetsUploadToken": "a",
                "bundleUploadUrl": "https://api.example.com/bundles",
                "bundleUploadToken": "b"
            }"#,
        )
        .unwrap();
        let mut overrides = Overrides::new()
            .with_checkout_dir(checkout)
            .with_app_name("shop");
        if let Some(revision) = revision {
            overrides = overrides.with_build_commit(revision);
        }
        PipelineConfig::resolve(file, overrides).unwrap()
    }

    fn calls(harness: &Harness) -> Vec<String> {
        harness.calls.lock().unwrap().clone()
    }

    #[tokio::test]
    async fn test_successful_run_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let h = harness(Scenario {
            version: Some("2.0.10"),
            ..Default::default()
        });

        let result = h.orchestrator.execute(&config(dir.path(), None)).await;
        assert!(result.success(), "{:?}", result.outcome);
        assert!(result.run.state().is_success());

        let sha = bundleit_core::artifact::sha256_hex(b"bundle contents");
        assert_eq!(
            calls(&h),
            [
                "fetch latest".to_string(),
                "head".to_string(),
                "pnpm install".to_string(),
                "pnpm build".to_string(),
                format!("upload lynxbundles/{sha}.bundle"),
                "register".to_string(),
            ]
        );

        let published = result.into_result().unwrap();
        assert_eq!(published.record.version_code, 2_000_010);
        assert_eq!(published.record.version_name, "2.0.10");
        assert_eq!(published.record.app_name, "shop");
        assert_eq!(published.record.bundle_name, "shop.lynx.bundle");
        assert_eq!(published.record.bundle_sha256, sha);
        assert_eq!(published.record.download_url, published.upload.download_url);
        assert!(!published.record.is_preset);
        assert_eq!(published.registration, serde_json::json!({ "id": 1 }));
    }

    #[tokio::test]
    async fn test_records_checked_out_commit_not_requested_ref() {
        let dir = tempfile::tempdir().unwrap();
        let h = harness(Scenario {
            head: Some("abc123"),
            ..Default::default()
        });

        let result = h
            .orchestrator
            .execute(&config(dir.path(), Some("release-2024")))
            .await;

        assert!(result.success());
        assert_eq!(calls(&h)[0], "fetch release-2024");
        let records = h.registry.records.lock().unwrap();
        assert_eq!(records[0].commit_hash, "abc123");
        assert_eq!(records[0].version_name, "0.0.0");
        assert_eq!(records[0].version_code, 0);
    }

    #[tokio::test]
    async fn test_build_failure_stops_before_hashing() {
        let dir = tempfile::tempdir().unwrap();
        let h = harness(Scenario {
            fail_on: Some("build"),
            ..Default::default()
        });

        let result = h.orchestrator.execute(&config(dir.path(), None)).await;

        assert!(matches!(result.outcome, Err(Error::Build { .. })));
        assert_eq!(
            result.run.state(),
            &PipelineState::Failed {
                after: Box::new(PipelineState::VersionResolved),
                message: "build failed: `pnpm build` exited with code 1".to_string(),
            }
        );
        assert_eq!(calls(&h), ["fetch latest", "head", "pnpm install", "pnpm build"]);
    }

    #[tokio::test]
    async fn test_install_failure_skips_build() {
        let dir = tempfile::tempdir().unwrap();
        let h = harness(Scenario {
            fail_on: Some("install"),
            ..Default::default()
        });

        let result = h.orchestrator.execute(&config(dir.path(), None)).await;

        assert!(!result.success());
        assert_eq!(calls(&h), ["fetch latest", "head", "pnpm install"]);
    }

    #[tokio::test]
    async fn test_missing_artifact_fails_before_network() {
        let dir = tempfile::tempdir().unwrap();
        let h = harness(Scenario {
            no_artifact: true,
            ..Default::default()
        });

        let result = h.orchestrator.execute(&config(dir.path(), None)).await;

        match &result.outcome {
            Err(Error::ArtifactNotFound(path)) => {
                assert!(path.ends_with("app/dist/main.lynx.bundle"));
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert!(!calls(&h).iter().any(|c| c.starts_with("upload") || c == "register"));
    }

    #[tokio::test]
    async fn test_malformed_upload_skips_registration() {
        let dir = tempfile::tempdir().unwrap();
        let h = harness(Scenario {
            malformed_upload: true,
            ..Default::default()
        });

        let result = h.orchestrator.execute(&config(dir.path(), None)).await;

        assert!(matches!(
            result.outcome,
            Err(Error::MalformedUploadResponse { .. })
        ));
        assert!(!calls(&h).contains(&"register".to_string()));
        assert!(h.registry.records.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_invalid_version_stops_before_build() {
        let dir = tempfile::tempdir().unwrap();
        let h = harness(Scenario {
            version: Some("1.2.3.4"),
            ..Default::default()
        });

        let result = h.orchestrator.execute(&config(dir.path(), None)).await;

        assert!(matches!(result.outcome, Err(Error::VersionParse { .. })));
        assert_eq!(calls(&h), ["fetch latest"]);
        assert_eq!(failure_kind(result.outcome.as_ref().unwrap_err()), "version-parse");
    }
}
