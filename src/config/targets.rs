//! Target enumeration and per-target settings
//!
//! Two configuration layouts are supported.
//!
//! **Legacy single-array** (no `[default]` section):
//!
//! ```toml
//! [FlashBlade]
//! array_address = "https://10.20.10.21"
//! api-token = "T-xxxxxxxx"
//!
//! [Output]
//! file = "/data/splunk/fb-audit.csv"
//!
//! [Log]
//! file = "/var/log/fb-audit.log"
//!
//! [lastrun]
//! sequence = "0"
//! ```
//!
//! **Multi-array** (a `[default]` section is present):
//!
//! ```toml
//! [default]
//! fbcount = 2
//! logfile = "/var/log/fb-audit.log"
//! outfile = "/data/splunk/fb-audit.csv"   # optional shared sink
//!
//! [FlashBlade-1]
//! array_address = "https://10.20.10.21"
//! api-token = "T-xxxxxxxx"
//! lastrun = "0"
//!
//! [FlashBlade-2]
//! array_address = "https://10.20.10.22"
//! api-token = "T-yyyyyyyy"
//! outfile = "/data/splunk/fb2-audit.csv"  # ignored when a shared sink is set
//! ```
//!
//! [`plan_run`] performs the fail-fast checks that abort a whole run.
//! [`resolve_target`] reads one target's settings and is called inside the
//! per-target loop, so its errors only skip that target.

use super::secret::{secret_string, SecretString};
use super::store::ConfigStore;
use crate::domain::errors::FbAuditError;
use crate::domain::ids::SequenceMarker;
use crate::domain::result::Result;
use secrecy::ExposeSecret;
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

/// Section that switches a config into multi-array mode
pub const DEFAULT_SECTION: &str = "default";

/// Section holding the only target in legacy mode
pub const LEGACY_SECTION: &str = "FlashBlade";

/// Prefix of the numbered target sections in multi-array mode
pub const TARGET_SECTION_PREFIX: &str = "FlashBlade-";

/// Run log used when the config names none
pub const DEFAULT_LOG_FILE: &str = "./audit-fb.log";

/// HTTP request timeout used when the config names none
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

const LEGACY_OUTPUT_SECTION: &str = "Output";
const LEGACY_LOG_SECTION: &str = "Log";
const LEGACY_LASTRUN_SECTION: &str = "lastrun";
const LEGACY_LASTRUN_KEY: &str = "sequence";
const LASTRUN_KEY: &str = "lastrun";

/// Configuration layout of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// One implicit `[FlashBlade]` target, no array metadata in the output
    Legacy,
    /// `fbcount` numbered `[FlashBlade-<n>]` targets, rows annotated with array metadata
    MultiArray,
}

impl RunMode {
    /// Picks the layout from the sections present in the store
    pub fn detect(store: &ConfigStore) -> Self {
        if store.has_section(DEFAULT_SECTION) {
            Self::MultiArray
        } else {
            Self::Legacy
        }
    }

    /// Section holding run-wide settings (log file, timeout, TLS)
    fn settings_section(self) -> &'static str {
        match self {
            Self::Legacy => LEGACY_SECTION,
            Self::MultiArray => DEFAULT_SECTION,
        }
    }
}

/// Path of the run log, read before logging is initialized
///
/// Falls back to [`DEFAULT_LOG_FILE`] when the key is missing or cannot be
/// resolved; the unresolvable case resurfaces as a fatal error in
/// [`plan_run`].
pub fn log_file_path(store: &ConfigStore) -> PathBuf {
    PathBuf::from(
        configured_log_file(store)
            .ok()
            .flatten()
            .unwrap_or_else(|| DEFAULT_LOG_FILE.to_string()),
    )
}

fn configured_log_file(store: &ConfigStore) -> Result<Option<String>> {
    match RunMode::detect(store) {
        RunMode::Legacy => store.get(LEGACY_LOG_SECTION, "file"),
        RunMode::MultiArray => store.get(DEFAULT_SECTION, "logfile"),
    }
}

/// HTTP client settings shared by every target of a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpSettings {
    /// Per-request timeout
    pub timeout: Duration,

    /// Verify the array's TLS certificate (off unless configured)
    pub verify_tls: bool,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            verify_tls: false,
        }
    }
}

/// Output file shared by every target of a multi-array run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SharedSink {
    /// CSV file path
    pub path: PathBuf,

    /// Header is owed this run (target 1's marker was initial at start)
    pub header_due: bool,
}

/// A target section that passed pre-flight
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetSection {
    /// 1-based position in the run
    pub index: usize,

    /// Section name, which is also the target's identity
    pub name: String,
}

/// Result of the fail-fast pre-flight checks
#[derive(Debug, Clone)]
pub struct RunPlan {
    /// Layout in effect
    pub mode: RunMode,

    /// Targets to process, in order
    pub targets: Vec<TargetSection>,

    /// Shared output file, when `[default] outfile` is set
    pub shared_sink: Option<SharedSink>,

    /// HTTP client settings
    pub http: HttpSettings,
}

/// Where a target's checkpoint marker lives in the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckpointKey {
    /// Section name
    pub section: String,

    /// Key name
    pub key: String,
}

/// Everything needed to collect one target
#[derive(Debug, Clone)]
pub struct TargetConfig {
    /// Section name
    pub name: String,

    /// 1-based position in the run
    pub index: usize,

    /// Array base URL without a trailing slash
    pub base_url: String,

    /// Long-lived API token exchanged for a session at login
    pub api_token: SecretString,

    /// Marker of the last record fetched in an earlier run
    pub marker: SequenceMarker,

    /// CSV file for this target (the shared sink when one is set)
    pub outfile: PathBuf,

    /// Store location of the marker
    pub checkpoint: CheckpointKey,
}

/// Runs the fail-fast pre-flight checks
///
/// Multi-array mode requires every `FlashBlade-1..FlashBlade-<fbcount>`
/// section; legacy mode requires `array_address`, `api-token` and the output
/// file. No HTTP call is made before this succeeds.
///
/// # Errors
///
/// Returns a configuration error describing every missing section, or the
/// first missing/invalid key in legacy mode.
pub fn plan_run(store: &ConfigStore) -> Result<RunPlan> {
    let mode = RunMode::detect(store);
    configured_log_file(store)?;
    let http = http_settings(store, mode)?;

    match mode {
        RunMode::Legacy => {
            let section = TargetSection {
                index: 1,
                name: LEGACY_SECTION.to_string(),
            };
            resolve_target(store, mode, &section, None)?;

            Ok(RunPlan {
                mode,
                targets: vec![section],
                shared_sink: None,
                http,
            })
        }
        RunMode::MultiArray => {
            let count = target_count(store)?;
            let targets: Vec<TargetSection> = (1..=count)
                .map(|index| TargetSection {
                    index,
                    name: format!("{TARGET_SECTION_PREFIX}{index}"),
                })
                .collect();

            let missing: Vec<&str> = targets
                .iter()
                .filter(|t| !store.has_section(&t.name))
                .map(|t| t.name.as_str())
                .collect();
            if !missing.is_empty() {
                return Err(FbAuditError::Configuration(format!(
                    "Missing array sections in config (fbcount = {count}): {}",
                    missing.join(", ")
                )));
            }

            let shared_sink = match store.get(DEFAULT_SECTION, "outfile")? {
                Some(path) => {
                    let first_marker =
                        SequenceMarker::from_stored(store.get_raw(&targets[0].name, LASTRUN_KEY));
                    Some(SharedSink {
                        path: PathBuf::from(path),
                        header_due: first_marker.is_initial(),
                    })
                }
                None => None,
            };

            Ok(RunPlan {
                mode,
                targets,
                shared_sink,
                http,
            })
        }
    }
}

/// Reads one target's settings
///
/// # Errors
///
/// Returns a configuration error for a missing or invalid `array_address`, a
/// missing or blank `api-token`, or a missing output file.
pub fn resolve_target(
    store: &ConfigStore,
    mode: RunMode,
    section: &TargetSection,
    shared_sink: Option<&SharedSink>,
) -> Result<TargetConfig> {
    let name = section.name.as_str();

    let address = store.get(name, "array_address")?.ok_or_else(|| {
        FbAuditError::Configuration(format!("{name} array_address not specified in the config file"))
    })?;
    let base_url = normalize_base_url(name, &address)?;

    let api_token = store
        .get(name, "api-token")?
        .map(secret_string)
        .filter(|token| !token.expose_secret().is_blank())
        .ok_or_else(|| {
            FbAuditError::Configuration(format!(
                "{name} api-token option not specified in the config file"
            ))
        })?;

    let (outfile, checkpoint) = match mode {
        RunMode::Legacy => {
            let outfile = store.get(LEGACY_OUTPUT_SECTION, "file")?.ok_or_else(|| {
                FbAuditError::Configuration("Output file not specified in the config file".to_string())
            })?;
            let checkpoint = CheckpointKey {
                section: LEGACY_LASTRUN_SECTION.to_string(),
                key: LEGACY_LASTRUN_KEY.to_string(),
            };
            (PathBuf::from(outfile), checkpoint)
        }
        RunMode::MultiArray => {
            let outfile = match shared_sink {
                Some(sink) => sink.path.clone(),
                None => PathBuf::from(store.get(name, "outfile")?.ok_or_else(|| {
                    FbAuditError::Configuration(format!(
                        "{name} outfile not specified in the config file"
                    ))
                })?),
            };
            let checkpoint = CheckpointKey {
                section: name.to_string(),
                key: LASTRUN_KEY.to_string(),
            };
            (outfile, checkpoint)
        }
    };

    let marker = SequenceMarker::from_stored(store.get_raw(&checkpoint.section, &checkpoint.key));

    Ok(TargetConfig {
        name: name.to_string(),
        index: section.index,
        base_url,
        api_token,
        marker,
        outfile,
        checkpoint,
    })
}

fn target_count(store: &ConfigStore) -> Result<usize> {
    let raw = store.get_or(DEFAULT_SECTION, "fbcount", "1")?;
    match raw.trim().parse::<usize>() {
        Ok(count) if count > 0 => Ok(count),
        _ => Err(FbAuditError::Configuration(format!(
            "fbcount must be a positive integer, got '{raw}'"
        ))),
    }
}

fn http_settings(store: &ConfigStore, mode: RunMode) -> Result<HttpSettings> {
    let section = mode.settings_section();
    let mut settings = HttpSettings::default();

    if let Some(raw) = store.get(section, "timeout")? {
        match raw.trim().parse::<u64>() {
            Ok(secs) if secs > 0 => settings.timeout = Duration::from_secs(secs),
            _ => {
                return Err(FbAuditError::Configuration(format!(
                    "[{section}] timeout must be a positive number of seconds, got '{raw}'"
                )));
            }
        }
    }

    if let Some(raw) = store.get(section, "verify_tls")? {
        settings.verify_tls = parse_bool(&raw).ok_or_else(|| {
            FbAuditError::Configuration(format!(
                "[{section}] verify_tls must be true or false, got '{raw}'"
            ))
        })?;
    }

    Ok(settings)
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Some(true),
        "false" | "no" | "off" | "0" => Some(false),
        _ => None,
    }
}

fn normalize_base_url(section: &str, address: &str) -> Result<String> {
    let trimmed = address.trim().trim_end_matches('/');
    Url::parse(trimmed).map_err(|e| {
        FbAuditError::Configuration(format!(
            "{section} array_address '{address}' is not a valid URL: {e}"
        ))
    })?;
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn store(contents: &str) -> ConfigStore {
        ConfigStore::parse("unused.toml", contents).unwrap()
    }

    const LEGACY: &str = r#"
[FlashBlade]
array_address = "https://10.20.10.21/"
api-token = "T-legacy"

[Output]
file = "/tmp/fb-audit.csv"
"#;

    const MULTI: &str = r#"
[default]
fbcount = 2
logfile = "/tmp/fb-multi.log"

[FlashBlade-1]
array_address = "https://10.20.10.21"
api-token = "T-1"
outfile = "/tmp/fb1.csv"

[FlashBlade-2]
array_address = "https://10.20.10.22"
api-token = "T-2"
outfile = "/tmp/fb2.csv"
lastrun = "b7"
"#;

    #[test]
    fn test_detect_mode() {
        assert_eq!(RunMode::detect(&store(LEGACY)), RunMode::Legacy);
        assert_eq!(RunMode::detect(&store(MULTI)), RunMode::MultiArray);
    }

    #[test]
    fn test_log_file_path() {
        assert_eq!(log_file_path(&store(LEGACY)), PathBuf::from(DEFAULT_LOG_FILE));
        assert_eq!(
            log_file_path(&store(MULTI)),
            PathBuf::from("/tmp/fb-multi.log")
        );

        let with_log = format!("{LEGACY}\n[Log]\nfile = \"/tmp/legacy.log\"\n");
        assert_eq!(
            log_file_path(&store(&with_log)),
            PathBuf::from("/tmp/legacy.log")
        );
    }

    #[test]
    fn test_plan_legacy() {
        let plan = plan_run(&store(LEGACY)).unwrap();
        assert_eq!(plan.mode, RunMode::Legacy);
        assert_eq!(plan.targets.len(), 1);
        assert_eq!(plan.targets[0].name, "FlashBlade");
        assert!(plan.shared_sink.is_none());
        assert_eq!(plan.http, HttpSettings::default());
    }

    #[test_case("array_address" ; "missing address")]
    #[test_case("api-token" ; "missing token")]
    fn test_plan_legacy_missing_key_is_fatal(key: &str) {
        let contents: String = LEGACY
            .lines()
            .filter(|line| !line.starts_with(key))
            .map(|line| format!("{line}\n"))
            .collect();
        let err = plan_run(&store(&contents)).unwrap_err();
        assert!(err.to_string().contains(key));
    }

    #[test]
    fn test_plan_legacy_missing_output_is_fatal() {
        let contents = LEGACY.replace("[Output]\nfile = \"/tmp/fb-audit.csv\"\n", "");
        let err = plan_run(&store(&contents)).unwrap_err();
        assert!(err.to_string().contains("Output file"));
    }

    #[test]
    fn test_plan_multi() {
        let plan = plan_run(&store(MULTI)).unwrap();
        assert_eq!(plan.mode, RunMode::MultiArray);
        let names: Vec<&str> = plan.targets.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["FlashBlade-1", "FlashBlade-2"]);
        assert_eq!(plan.targets[1].index, 2);
        assert!(plan.shared_sink.is_none());
    }

    #[test]
    fn test_plan_multi_missing_sections_names_all_of_them() {
        let contents = MULTI.replace("fbcount = 2", "fbcount = 4");
        let err = plan_run(&store(&contents)).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("FlashBlade-3"));
        assert!(message.contains("FlashBlade-4"));
        assert!(!message.contains("FlashBlade-1,"));
    }

    #[test]
    fn test_plan_multi_fbcount_defaults_to_one() {
        let contents = MULTI.replace("fbcount = 2\n", "");
        let plan = plan_run(&store(&contents)).unwrap();
        assert_eq!(plan.targets.len(), 1);
    }

    #[test_case("0" ; "zero")]
    #[test_case("\"two\"" ; "not a number")]
    #[test_case("-1" ; "negative")]
    fn test_plan_multi_bad_fbcount(value: &str) {
        let contents = MULTI.replace("fbcount = 2", &format!("fbcount = {value}"));
        assert!(plan_run(&store(&contents)).is_err());
    }

    #[test]
    fn test_shared_sink_header_due_follows_first_target() {
        let shared = MULTI.replace(
            "logfile = \"/tmp/fb-multi.log\"",
            "logfile = \"/tmp/fb-multi.log\"\noutfile = \"/tmp/shared.csv\"",
        );
        let plan = plan_run(&store(&shared)).unwrap();
        let sink = plan.shared_sink.unwrap();
        assert_eq!(sink.path, PathBuf::from("/tmp/shared.csv"));
        assert!(sink.header_due);

        let first_done = shared.replace(
            "api-token = \"T-1\"",
            "api-token = \"T-1\"\nlastrun = \"a3\"",
        );
        let plan = plan_run(&store(&first_done)).unwrap();
        assert!(!plan.shared_sink.unwrap().header_due);
    }

    #[test]
    fn test_http_settings_from_config() {
        let contents = MULTI.replace(
            "fbcount = 2",
            "fbcount = 2\ntimeout = 15\nverify_tls = true",
        );
        let plan = plan_run(&store(&contents)).unwrap();
        assert_eq!(plan.http.timeout, Duration::from_secs(15));
        assert!(plan.http.verify_tls);
    }

    #[test_case("\"soon\"" ; "not a number")]
    #[test_case("0" ; "zero")]
    #[test_case("-5" ; "negative")]
    fn test_http_settings_invalid_timeout(value: &str) {
        let contents = MULTI.replace("fbcount = 2", &format!("fbcount = 2\ntimeout = {value}"));
        let err = plan_run(&store(&contents)).unwrap_err();
        assert!(err.to_string().contains("timeout must be a positive number"));
    }

    #[test]
    fn test_markers_are_read_verbatim() {
        std::env::remove_var("FBAUDIT_TARGETS_TEST_UNSET");
        let contents = MULTI
            .replace("lastrun = \"b7\"", "lastrun = \"b${FBAUDIT_TARGETS_TEST_UNSET}7\"")
            .replace(
                "logfile = \"/tmp/fb-multi.log\"",
                "logfile = \"/tmp/fb-multi.log\"\noutfile = \"/tmp/shared.csv\"",
            )
            .replace(
                "api-token = \"T-1\"",
                "api-token = \"T-1\"\nlastrun = \"${FBAUDIT_TARGETS_TEST_UNSET}\"",
            );
        let store = store(&contents);

        let plan = plan_run(&store).unwrap();
        assert!(!plan.shared_sink.as_ref().unwrap().header_due);

        let target = resolve_target(&store, plan.mode, &plan.targets[1], None).unwrap();
        assert_eq!(target.marker.as_str(), "b${FBAUDIT_TARGETS_TEST_UNSET}7");
    }

    #[test]
    fn test_resolve_multi_target() {
        let store = store(MULTI);
        let plan = plan_run(&store).unwrap();
        let target = resolve_target(&store, plan.mode, &plan.targets[1], None).unwrap();

        assert_eq!(target.name, "FlashBlade-2");
        assert_eq!(target.base_url, "https://10.20.10.22");
        assert_eq!(target.marker.as_str(), "b7");
        assert_eq!(target.outfile, PathBuf::from("/tmp/fb2.csv"));
        assert_eq!(target.checkpoint.section, "FlashBlade-2");
        assert_eq!(target.checkpoint.key, "lastrun");
    }

    #[test]
    fn test_resolve_legacy_target() {
        let store = store(LEGACY);
        let plan = plan_run(&store).unwrap();
        let target = resolve_target(&store, plan.mode, &plan.targets[0], None).unwrap();

        assert_eq!(target.base_url, "https://10.20.10.21");
        assert!(target.marker.is_initial());
        assert_eq!(target.checkpoint.section, "lastrun");
        assert_eq!(target.checkpoint.key, "sequence");
    }

    #[test]
    fn test_resolve_missing_outfile_is_target_error() {
        let contents = MULTI.replace("outfile = \"/tmp/fb2.csv\"\n", "");
        let store = store(&contents);
        let plan = plan_run(&store).unwrap();

        assert!(resolve_target(&store, plan.mode, &plan.targets[0], None).is_ok());
        let err = resolve_target(&store, plan.mode, &plan.targets[1], None).unwrap_err();
        assert!(err.to_string().contains("FlashBlade-2 outfile"));
    }

    #[test]
    fn test_resolve_shared_sink_overrides_outfile() {
        let store = store(MULTI);
        let plan = plan_run(&store).unwrap();
        let sink = SharedSink {
            path: PathBuf::from("/tmp/shared.csv"),
            header_due: true,
        };
        let target = resolve_target(&store, plan.mode, &plan.targets[0], Some(&sink)).unwrap();
        assert_eq!(target.outfile, PathBuf::from("/tmp/shared.csv"));
    }

    #[test]
    fn test_resolve_invalid_address() {
        let contents = MULTI.replace("https://10.20.10.22", "not a url");
        let store = store(&contents);
        let plan = plan_run(&store).unwrap();
        assert!(resolve_target(&store, plan.mode, &plan.targets[1], None).is_err());
    }
}
