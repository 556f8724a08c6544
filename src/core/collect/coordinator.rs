//! Collect coordinator - main orchestrator for a run
//!
//! Walks the planned targets in order. For each one it logs in, fetches the
//! array identity (multi-array only) and the audit records after the stored
//! marker, appends them to the CSV sink and checkpoints the last record.
//! A failing step skips the target; the remaining targets still run.

use crate::adapters::flashblade::{AuditApi, FlashBladeClient};
use crate::config::{plan_run, resolve_target, ConfigStore, RunMode, RunPlan, TargetConfig, TargetSection};
use crate::core::collect::summary::{
    FailureStage, RunSummary, TargetFailure, TargetOutcome, TargetResult,
};
use crate::core::output::{append_records, CsvLayout};
use crate::core::state::StateManager;
use crate::domain::{FbAuditError, Result};
use crate::{log_entries_loaded, log_target_failure};
use std::sync::Arc;
use std::time::Instant;

/// Collect coordinator
pub struct CollectCoordinator {
    plan: RunPlan,
    state: StateManager,
    api: Arc<dyn AuditApi>,
    layout: CsvLayout,
    /// Shared sink still owes its header this run
    shared_header_pending: bool,
}

impl CollectCoordinator {
    /// Create a coordinator backed by the FlashBlade REST client
    ///
    /// Runs the pre-flight checks; no HTTP call is made here.
    ///
    /// # Errors
    ///
    /// Returns an error if pre-flight validation fails or the HTTP client
    /// cannot be built. Both abort the run.
    pub fn new(store: ConfigStore) -> Result<Self> {
        let plan = plan_run(&store)?;
        let api = Arc::new(FlashBladeClient::new(&plan.http)?);
        Ok(Self::with_api(plan, store, api))
    }

    /// Create a coordinator over any [`AuditApi`] implementation
    pub fn with_api(plan: RunPlan, store: ConfigStore, api: Arc<dyn AuditApi>) -> Self {
        let layout = CsvLayout::for_mode(plan.mode);
        let shared_header_pending = plan
            .shared_sink
            .as_ref()
            .is_some_and(|sink| sink.header_due);

        Self {
            plan,
            state: StateManager::new(store),
            api,
            layout,
            shared_header_pending,
        }
    }

    /// The configuration store, including checkpoints written so far
    pub fn store(&self) -> &ConfigStore {
        self.state.store()
    }

    /// Execute the run
    ///
    /// Every target is attempted; failures are logged and recorded in the
    /// summary rather than returned.
    pub async fn execute(&mut self) -> RunSummary {
        let start_time = Instant::now();
        let mut summary = RunSummary::new();

        tracing::debug!(
            mode = ?self.plan.mode,
            targets = self.plan.targets.len(),
            shared_sink = self.plan.shared_sink.is_some(),
            "Starting collection"
        );

        let targets = self.plan.targets.clone();
        for section in &targets {
            let result = self.process_target(section).await;
            if let Err(failure) = &result {
                log_target_failure!(failure);
            }
            summary.record(result);
        }

        summary.with_duration(start_time.elapsed())
    }

    /// Run one target cycle
    async fn process_target(&mut self, section: &TargetSection) -> TargetResult {
        let fail = |stage: FailureStage| {
            let name = section.name.clone();
            move |e: FbAuditError| TargetFailure::new(name, stage, e.to_string())
        };

        let target = resolve_target(
            self.state.store(),
            self.plan.mode,
            section,
            self.plan.shared_sink.as_ref(),
        )
        .map_err(fail(FailureStage::Configuration))?;

        tracing::info!("Processing {}", target.name);

        let session = self
            .api
            .authenticate(&target.base_url, &target.api_token)
            .await
            .map_err(fail(FailureStage::Authentication))?;

        let identity = match self.plan.mode {
            RunMode::MultiArray => Some(
                self.api
                    .array_identity(&target.base_url, &session)
                    .await
                    .map_err(fail(FailureStage::Fetch))?,
            ),
            RunMode::Legacy => None,
        };

        let records = self
            .api
            .audits_since(&target.base_url, &session, &target.marker)
            .await
            .map_err(fail(FailureStage::Fetch))?;

        let Some(last) = records.last() else {
            tracing::info!(array = %target.name, "No new audit entries");
            return Ok(TargetOutcome::NoNewEntries {
                target: target.name,
            });
        };
        let marker = last.sequence_marker();

        let with_header = self.header_due(&target);
        let written = append_records(
            &target.outfile,
            self.layout,
            with_header,
            &records,
            identity.as_ref(),
        )
        .map_err(fail(FailureStage::Output))?;

        if self.plan.shared_sink.is_some() {
            self.shared_header_pending = false;
        }

        self.state
            .checkpoint(&target.name, &target.checkpoint, &marker)
            .map_err(fail(FailureStage::Checkpoint))?;

        log_entries_loaded!(target.name, written, marker);

        Ok(TargetOutcome::Collected {
            target: target.name,
            records: written,
            marker,
        })
    }

    /// Whether the header row goes in front of this target's rows
    fn header_due(&self, target: &TargetConfig) -> bool {
        match self.plan.shared_sink {
            Some(_) => self.shared_header_pending,
            None => target.marker.is_initial(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::flashblade::SessionToken;
    use crate::config::{secret_string, SecretString};
    use crate::domain::audit::fixtures::record;
    use crate::domain::{ArrayApiError, ArrayIdentity, AuditRecord, SequenceMarker};
    use async_trait::async_trait;
    use secrecy::ExposeSecret;
    use std::collections::HashMap;
    use std::fs;
    use std::path::Path;
    use std::sync::Mutex;
    use tempfile::TempDir;

    #[derive(Clone, Default)]
    struct FakeArray {
        reject_login: bool,
        records: Vec<AuditRecord>,
    }

    /// In-memory arrays keyed by base URL
    #[derive(Default)]
    struct FakeApi {
        arrays: HashMap<String, FakeArray>,
        calls: Mutex<Vec<String>>,
    }

    impl FakeApi {
        fn with_array(mut self, base_url: &str, array: FakeArray) -> Self {
            self.arrays.insert(base_url.to_string(), array);
            self
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        fn array(&self, base_url: &str) -> Result<&FakeArray> {
            self.arrays.get(base_url).ok_or_else(|| {
                ArrayApiError::ConnectionFailed(format!("{base_url} unreachable")).into()
            })
        }
    }

    #[async_trait]
    impl AuditApi for FakeApi {
        async fn authenticate(
            &self,
            base_url: &str,
            api_token: &SecretString,
        ) -> Result<SessionToken> {
            self.calls.lock().unwrap().push(format!("login {base_url}"));
            if self.array(base_url)?.reject_login {
                return Err(ArrayApiError::AuthenticationFailed("401".to_string()).into());
            }
            let token: &str = api_token.expose_secret().as_ref();
            Ok(SessionToken::new(secret_string(format!("session-{token}"))))
        }

        async fn array_identity(
            &self,
            base_url: &str,
            _session: &SessionToken,
        ) -> Result<ArrayIdentity> {
            self.calls.lock().unwrap().push(format!("arrays {base_url}"));
            self.array(base_url)?;
            Ok(ArrayIdentity {
                name: base_url.trim_start_matches("https://").to_string(),
                id: "id-1".to_string(),
                version: "3.0.3".to_string(),
            })
        }

        async fn audits_since(
            &self,
            base_url: &str,
            _session: &SessionToken,
            marker: &SequenceMarker,
        ) -> Result<Vec<AuditRecord>> {
            self.calls
                .lock()
                .unwrap()
                .push(format!("audits {base_url} start={marker}"));
            Ok(self.array(base_url)?.records.clone())
        }
    }

    fn records(names: &[&str]) -> Vec<AuditRecord> {
        names.iter().map(|name| record(name)).collect()
    }

    fn coordinator(dir: &TempDir, config: &str, api: Arc<FakeApi>) -> CollectCoordinator {
        let path = dir.path().join("fbaudit.toml");
        fs::write(&path, config).unwrap();
        let store = ConfigStore::load(&path).unwrap();
        let plan = plan_run(&store).unwrap();
        CollectCoordinator::with_api(plan, store, api)
    }

    fn reload(dir: &TempDir) -> ConfigStore {
        ConfigStore::load(dir.path().join("fbaudit.toml")).unwrap()
    }

    fn lines(path: &Path) -> Vec<String> {
        fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect()
    }

    fn legacy_config(dir: &TempDir, sequence: Option<&str>) -> String {
        let mut config = format!(
            "[FlashBlade]\narray_address = \"https://fb1\"\napi-token = \"T-1\"\n\n\
             [Output]\nfile = \"{}\"\n",
            dir.path().join("audit.csv").display()
        );
        if let Some(sequence) = sequence {
            config.push_str(&format!("\n[lastrun]\nsequence = \"{sequence}\"\n"));
        }
        config
    }

    #[tokio::test]
    async fn test_legacy_run_writes_header_rows_and_checkpoint() {
        let dir = TempDir::new().unwrap();
        let api = Arc::new(FakeApi::default().with_array(
            "https://fb1",
            FakeArray {
                records: records(&["a1", "a2", "a3"]),
                ..Default::default()
            },
        ));
        let mut coordinator = coordinator(&dir, &legacy_config(&dir, None), api.clone());

        let summary = coordinator.execute().await;

        assert_eq!(summary.succeeded(), 1);
        assert_eq!(summary.records_written(), 3);

        let rows = lines(&dir.path().join("audit.csv"));
        assert_eq!(rows.len(), 4);
        assert_eq!(rows[0], CsvLayout::Legacy.header());
        assert!(rows[1].ends_with("CLI, No_user_agent"));

        assert_eq!(
            reload(&dir).get("lastrun", "sequence").unwrap(),
            Some("a3".to_string())
        );
        assert_eq!(
            api.calls(),
            vec!["login https://fb1", "audits https://fb1 start=0"]
        );
    }

    #[tokio::test]
    async fn test_legacy_run_with_marker_omits_header() {
        let dir = TempDir::new().unwrap();
        let api = Arc::new(FakeApi::default().with_array(
            "https://fb1",
            FakeArray {
                records: records(&["a4"]),
                ..Default::default()
            },
        ));
        let mut coordinator = coordinator(&dir, &legacy_config(&dir, Some("a3")), api.clone());

        coordinator.execute().await;

        let rows = lines(&dir.path().join("audit.csv"));
        assert_eq!(rows.len(), 1);
        assert_eq!(api.calls()[1], "audits https://fb1 start=a3");
        assert_eq!(
            coordinator.store().get("lastrun", "sequence").unwrap(),
            Some("a4".to_string())
        );
    }

    #[tokio::test]
    async fn test_zero_records_leaves_sink_and_marker() {
        let dir = TempDir::new().unwrap();
        let api = Arc::new(FakeApi::default().with_array("https://fb1", FakeArray::default()));
        let mut coordinator = coordinator(&dir, &legacy_config(&dir, Some("a3")), api);

        let summary = coordinator.execute().await;

        assert_eq!(summary.empty(), 1);
        assert!(summary.is_successful());
        assert!(!dir.path().join("audit.csv").exists());
        assert_eq!(
            reload(&dir).get("lastrun", "sequence").unwrap(),
            Some("a3".to_string())
        );
    }

    fn multi_config(dir: &TempDir, shared: bool, second_outfile: bool) -> String {
        let mut config = String::from("[default]\nfbcount = 2\n");
        if shared {
            config.push_str(&format!(
                "outfile = \"{}\"\n",
                dir.path().join("shared.csv").display()
            ));
        }
        config.push_str(&format!(
            "\n[FlashBlade-1]\narray_address = \"https://fb1\"\napi-token = \"T-1\"\n\
             lastrun = \"0\"\noutfile = \"{}\"\n",
            dir.path().join("fb1.csv").display()
        ));
        config.push_str("\n[FlashBlade-2]\narray_address = \"https://fb2\"\napi-token = \"T-2\"\n");
        if second_outfile {
            config.push_str(&format!(
                "outfile = \"{}\"\n",
                dir.path().join("fb2.csv").display()
            ));
        }
        config
    }

    fn two_arrays(first: FakeArray, second: FakeArray) -> Arc<FakeApi> {
        Arc::new(
            FakeApi::default()
                .with_array("https://fb1", first)
                .with_array("https://fb2", second),
        )
    }

    #[tokio::test]
    async fn test_auth_failure_skips_only_that_target() {
        let dir = TempDir::new().unwrap();
        let api = two_arrays(
            FakeArray {
                records: records(&["a1", "a2"]),
                ..Default::default()
            },
            FakeArray {
                reject_login: true,
                records: records(&["b1"]),
            },
        );
        let mut coordinator = coordinator(&dir, &multi_config(&dir, false, true), api.clone());

        let summary = coordinator.execute().await;

        assert_eq!(summary.succeeded(), 1);
        assert_eq!(summary.failed(), 1);
        let failure = summary.failures().next().unwrap();
        assert_eq!(failure.target, "FlashBlade-2");
        assert_eq!(failure.stage, FailureStage::Authentication);

        let store = reload(&dir);
        assert_eq!(
            store.get("FlashBlade-1", "lastrun").unwrap(),
            Some("a2".to_string())
        );
        assert!(!store.has("FlashBlade-2", "lastrun"));
        assert!(!dir.path().join("fb2.csv").exists());

        let rows = lines(&dir.path().join("fb1.csv"));
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0], CsvLayout::Annotated.header());
        assert!(rows[1].contains(", fb1, id-1, 3.0.3, pureuser, "));
    }

    #[tokio::test]
    async fn test_missing_outfile_is_a_configuration_failure() {
        let dir = TempDir::new().unwrap();
        let api = two_arrays(
            FakeArray {
                records: records(&["a1"]),
                ..Default::default()
            },
            FakeArray {
                records: records(&["b1"]),
                ..Default::default()
            },
        );
        let mut coordinator = coordinator(&dir, &multi_config(&dir, false, false), api.clone());

        let summary = coordinator.execute().await;

        assert_eq!(summary.succeeded(), 1);
        let failure = summary.failures().next().unwrap();
        assert_eq!(failure.target, "FlashBlade-2");
        assert_eq!(failure.stage, FailureStage::Configuration);
        assert!(failure.message.contains("outfile"));
        assert!(!api.calls().iter().any(|call| call.contains("fb2")));
    }

    #[tokio::test]
    async fn test_shared_sink_header_written_once() {
        let dir = TempDir::new().unwrap();
        let api = two_arrays(
            FakeArray {
                records: records(&["a1", "a2"]),
                ..Default::default()
            },
            FakeArray {
                records: records(&["b1"]),
                ..Default::default()
            },
        );
        let mut coordinator = coordinator(&dir, &multi_config(&dir, true, false), api);

        let summary = coordinator.execute().await;
        assert_eq!(summary.succeeded(), 2);

        let rows = lines(&dir.path().join("shared.csv"));
        assert_eq!(rows.len(), 4);
        let headers = rows
            .iter()
            .filter(|row| row.as_str() == CsvLayout::Annotated.header())
            .count();
        assert_eq!(headers, 1);
        assert_eq!(rows[0], CsvLayout::Annotated.header());
        assert!(rows[3].contains(", fb2, "));
        assert!(!dir.path().join("fb1.csv").exists());
    }

    #[tokio::test]
    async fn test_shared_sink_header_follows_first_written_target() {
        let dir = TempDir::new().unwrap();
        let api = two_arrays(
            FakeArray {
                reject_login: true,
                ..Default::default()
            },
            FakeArray {
                records: records(&["b1"]),
                ..Default::default()
            },
        );
        let mut coordinator = coordinator(&dir, &multi_config(&dir, true, false), api);

        coordinator.execute().await;

        let rows = lines(&dir.path().join("shared.csv"));
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0], CsvLayout::Annotated.header());
    }

    fn shared_config(dir: &TempDir, first_lastrun: &str, second_lastrun: &str) -> String {
        format!(
            "[default]\nfbcount = 2\noutfile = \"{}\"\n\n\
             [FlashBlade-1]\narray_address = \"https://fb1\"\napi-token = \"T-1\"\n\
             lastrun = \"{first_lastrun}\"\n\n\
             [FlashBlade-2]\narray_address = \"https://fb2\"\napi-token = \"T-2\"\n\
             lastrun = \"{second_lastrun}\"\n",
            dir.path().join("shared.csv").display()
        )
    }

    fn header_count(rows: &[String]) -> usize {
        rows.iter()
            .filter(|row| row.as_str() == CsvLayout::Annotated.header())
            .count()
    }

    #[tokio::test]
    async fn test_shared_sink_header_when_only_first_target_is_new() {
        let dir = TempDir::new().unwrap();
        let api = two_arrays(
            FakeArray {
                records: records(&["a1"]),
                ..Default::default()
            },
            FakeArray {
                records: records(&["b8"]),
                ..Default::default()
            },
        );
        let mut coordinator = coordinator(&dir, &shared_config(&dir, "0", "b7"), api.clone());

        let summary = coordinator.execute().await;
        assert_eq!(summary.succeeded(), 2);
        assert!(api.calls().contains(&"audits https://fb2 start=b7".to_string()));

        let rows = lines(&dir.path().join("shared.csv"));
        assert_eq!(rows.len(), 3);
        assert_eq!(header_count(&rows), 1);
        assert_eq!(rows[0], CsvLayout::Annotated.header());
        assert!(rows[1].contains(", fb1, "));
        assert!(rows[2].contains(", fb2, "));
    }

    #[tokio::test]
    async fn test_shared_sink_no_header_when_first_target_resumes() {
        let dir = TempDir::new().unwrap();
        let api = two_arrays(
            FakeArray {
                records: records(&["a4"]),
                ..Default::default()
            },
            FakeArray {
                records: records(&["b1"]),
                ..Default::default()
            },
        );
        let mut coordinator = coordinator(&dir, &shared_config(&dir, "a3", "0"), api.clone());

        let summary = coordinator.execute().await;
        assert_eq!(summary.succeeded(), 2);
        assert!(api.calls().contains(&"audits https://fb1 start=a3".to_string()));

        let rows = lines(&dir.path().join("shared.csv"));
        assert_eq!(rows.len(), 2);
        assert_eq!(header_count(&rows), 0);
        assert!(rows[0].contains(", fb1, "));
        assert!(rows[1].contains(", fb2, "));

        let store = reload(&dir);
        assert_eq!(store.get_raw("FlashBlade-1", "lastrun").as_deref(), Some("a4"));
        assert_eq!(store.get_raw("FlashBlade-2", "lastrun").as_deref(), Some("b1"));
    }

    #[tokio::test]
    async fn test_checkpoint_failure_keeps_written_rows() {
        let dir = TempDir::new().unwrap();
        let api = Arc::new(FakeApi::default().with_array(
            "https://fb1",
            FakeArray {
                records: records(&["a1"]),
                ..Default::default()
            },
        ));
        let config = legacy_config(&dir, None);
        let store = ConfigStore::parse(dir.path().join("gone").join("fbaudit.toml"), &config)
            .unwrap();
        let plan = plan_run(&store).unwrap();
        let mut coordinator = CollectCoordinator::with_api(plan, store, api);

        let summary = coordinator.execute().await;

        let failure = summary.failures().next().unwrap();
        assert_eq!(failure.stage, FailureStage::Checkpoint);
        assert_eq!(lines(&dir.path().join("audit.csv")).len(), 2);
    }
}
