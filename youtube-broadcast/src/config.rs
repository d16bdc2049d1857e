//! Operator configuration: loading, validation with defaults, and write-back.
//!
//! The configuration is a JSON document with four sections:
//!
//! ```json
//! {
//!   "logger": "info",
//!   "email": { "enable_email": false },
//!   "stream_settings": {
//!     "stream_id": "abc123",
//!     "title": "Live vom Bienenbaum",
//!     "description": "",
//!     "privacy": "private",
//!     "tags": [],
//!     "category": 1
//!   },
//!   "youtube_settings": { "credentials_file": "client_secret.json" }
//! }
//! ```
//!
//! Validation works on the raw JSON first so that failures can name the exact key that is
//! missing, and so that absent optional stream settings can be back-filled from defaults.
//! Only then is the document turned into the typed [`Config`].
//!
//! `stream_settings.broadcast_id` is written by this tool after a broadcast is created, so that a
//! later invocation can stop it.

use crate::youtube_api::BroadcastPrivacyStatus;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::future::Future;
use std::io;
use std::path::{Path, PathBuf};
use tracing::level_filters::LevelFilter;

const LOGGER: &str = "logger";
const EMAIL: &str = "email";
const ENABLE_EMAIL: &str = "enable_email";
const SENDER_PASSWORD: &str = "sender_password";
const STREAM_SETTINGS: &str = "stream_settings";
const PRIVACY: &str = "privacy";
const YOUTUBE_SETTINGS: &str = "youtube_settings";
const CREDENTIALS_FILE: &str = "credentials_file";

/// Keys that must all be present under `email` when e-mail is enabled, in check order.
pub const EMAIL_KEYS: [&str; 7] = [
    ENABLE_EMAIL,
    "smtp_server",
    "smtp_port",
    "sender_email",
    SENDER_PASSWORD,
    "recipient_email",
    "subject",
];

/// Broadcast title used when `stream_settings.title` is absent.
pub const DEFAULT_TITLE: &str = "Live vom Bienenbaum";

/// Video category used when `stream_settings.category` is absent.
pub const DEFAULT_CATEGORY: u64 = 1;

/// Stream settings that are filled in when absent, in check order.
fn stream_setting_defaults() -> [(&'static str, Value); 6] {
    [
        ("stream_id", Value::Null),
        ("title", Value::from(DEFAULT_TITLE)),
        ("description", Value::from("")),
        (PRIVACY, Value::from(Privacy::Private.as_str())),
        ("tags", Value::Array(Vec::new())),
        ("category", Value::from(DEFAULT_CATEGORY)),
    ]
}

/// Why a configuration could not be loaded, validated or written.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config file `{}` not found", path.display())]
    NotFound { path: PathBuf },

    #[error("could not read config file `{}`", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("config file `{}` is not valid JSON", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("`{section}` must be a JSON object")]
    NotAnObject { section: &'static str },

    #[error("no `{section}` section is provided")]
    MissingSection { section: &'static str },

    #[error("`{key}` is required under `{section}`")]
    MissingKey {
        section: &'static str,
        key: &'static str,
    },

    #[error("wrong `{key}` value {value}; valid options are: {}", accepted.join(", "))]
    InvalidChoice {
        key: &'static str,
        value: String,
        accepted: &'static [&'static str],
    },

    #[error("`{section}` is malformed")]
    Malformed {
        section: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("could not serialize config")]
    Serialize(#[source] serde_json::Error),

    #[error("could not write config file `{}`", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Logging verbosity selected by the `logger` key.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    #[default]
    Info,
    Debug,
}

impl LogLevel {
    pub const ACCEPTED: &'static [&'static str] = &["info", "debug"];

    pub fn level_filter(self) -> LevelFilter {
        match self {
            Self::Info => LevelFilter::INFO,
            Self::Debug => LevelFilter::DEBUG,
        }
    }
}

/// Privacy of created broadcasts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Privacy {
    #[default]
    Private,
    Public,
}

impl Privacy {
    pub const ACCEPTED: &'static [&'static str] = &["private", "public"];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Private => "private",
            Self::Public => "public",
        }
    }
}

impl From<Privacy> for BroadcastPrivacyStatus {
    fn from(privacy: Privacy) -> Self {
        match privacy {
            Privacy::Private => Self::Private,
            Privacy::Public => Self::Public,
        }
    }
}

/// A YouTube video category id.
///
/// YouTube uses numeric strings, but configs commonly hold a bare number. Whichever form was read
/// is written back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CategoryId {
    Number(u64),
    Text(String),
}

impl fmt::Display for CategoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

/// Validated configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub logger: LogLevel,
    #[serde(default)]
    pub email: EmailSettings,
    pub stream_settings: StreamSettings,
    pub youtube_settings: YouTubeSettings,
    /// Keys this tool does not know about, kept so that write-back does not drop them.
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

/// The `email` block, kept as written.
///
/// No sender is wired to it. Only an enabled block is checked for completeness; a disabled one
/// may hold placeholders of any type.
#[derive(Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EmailSettings(Map<String, Value>);

impl EmailSettings {
    pub fn enabled(&self) -> bool {
        email_enabled(&self.0)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }
}

impl fmt::Debug for EmailSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for (key, value) in &self.0 {
            if key == SENDER_PASSWORD {
                map.entry(key, &"<redacted>");
            } else {
                map.entry(key, value);
            }
        }
        map.finish()
    }
}

fn email_enabled(email: &Map<String, Value>) -> bool {
    matches!(email.get(ENABLE_EMAIL), Some(Value::Bool(true)))
}

/// The `stream_settings` block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamSettings {
    /// Id of the ingest stream that new broadcasts are bound to.
    pub stream_id: Option<String>,
    /// Id of the last broadcast created by this tool.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub broadcast_id: Option<String>,
    pub title: String,
    pub description: String,
    pub privacy: Privacy,
    pub tags: Vec<String>,
    pub category: CategoryId,
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

impl StreamSettings {
    pub fn stream_id(&self) -> Option<&str> {
        self.stream_id.as_deref().filter(|id| !id.is_empty())
    }

    pub fn broadcast_id(&self) -> Option<&str> {
        self.broadcast_id.as_deref().filter(|id| !id.is_empty())
    }
}

/// The `youtube_settings` block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YouTubeSettings {
    /// OAuth client secret file downloaded from the Google Cloud console.
    pub credentials_file: PathBuf,
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

/// Validates a raw configuration document and fills in defaults.
///
/// Checks run in a fixed order and stop at the first failure:
///
/// 1. `logger`, if present, is one of [`LogLevel::ACCEPTED`];
/// 2. `email` is optional (absent means disabled), but if `enable_email` is true every key in
///    [`EMAIL_KEYS`] must be present;
/// 3. `stream_settings` must exist; a present `privacy` must be one of [`Privacy::ACCEPTED`] and
///    every other absent stream setting is filled in from its default;
/// 4. `youtube_settings` must exist with a non-empty `credentials_file`.
pub fn validate(raw: Value) -> Result<Config, ConfigError> {
    let Value::Object(mut root) = raw else {
        return Err(ConfigError::NotAnObject { section: "config" });
    };

    if let Some(level) = root.get(LOGGER).filter(|v| !v.is_null()) {
        check_choice(LOGGER, level, LogLevel::ACCEPTED)?;
    }

    match root.get(EMAIL) {
        None | Some(Value::Null) => {
            tracing::info!("no email config is provided");
            let mut disabled = Map::new();
            disabled.insert(ENABLE_EMAIL.to_string(), Value::Bool(false));
            root.insert(EMAIL.to_string(), Value::Object(disabled));
        }
        Some(Value::Object(email)) => {
            if email_enabled(email) {
                if let Some(&key) = EMAIL_KEYS.iter().find(|&&key| !is_set(email, key)) {
                    return Err(ConfigError::MissingKey {
                        section: EMAIL,
                        key,
                    });
                }
            }
        }
        Some(_) => return Err(ConfigError::NotAnObject { section: EMAIL }),
    }

    let stream = match root.get_mut(STREAM_SETTINGS) {
        None | Some(Value::Null) => {
            return Err(ConfigError::MissingSection {
                section: STREAM_SETTINGS,
            });
        }
        Some(Value::Object(stream)) => stream,
        Some(_) => {
            return Err(ConfigError::NotAnObject {
                section: STREAM_SETTINGS,
            });
        }
    };
    for (key, default) in stream_setting_defaults() {
        if key == PRIVACY {
            if let Some(privacy) = stream.get(key).filter(|v| !v.is_null()) {
                check_choice(PRIVACY, privacy, Privacy::ACCEPTED)?;
            }
        }
        if !is_set(stream, key) {
            tracing::debug!(key, "using default stream setting");
            stream.insert(key.to_string(), default);
        }
    }

    match root.get(YOUTUBE_SETTINGS) {
        None | Some(Value::Null) => {
            return Err(ConfigError::MissingSection {
                section: YOUTUBE_SETTINGS,
            });
        }
        Some(Value::Object(youtube)) => match youtube.get(CREDENTIALS_FILE) {
            Some(Value::String(path)) if !path.trim().is_empty() => {}
            _ => {
                return Err(ConfigError::MissingKey {
                    section: YOUTUBE_SETTINGS,
                    key: CREDENTIALS_FILE,
                });
            }
        },
        Some(_) => {
            return Err(ConfigError::NotAnObject {
                section: YOUTUBE_SETTINGS,
            });
        }
    }

    let logger = match root.remove(LOGGER) {
        Some(Value::Null) | None => LogLevel::default(),
        Some(level) => parse_section(LOGGER, level)?,
    };
    let email = take_section(&mut root, EMAIL)?;
    let stream_settings = take_section(&mut root, STREAM_SETTINGS)?;
    let youtube_settings = take_section(&mut root, YOUTUBE_SETTINGS)?;

    Ok(Config {
        logger,
        email,
        stream_settings,
        youtube_settings,
        other: root,
    })
}

fn is_set(section: &Map<String, Value>, key: &str) -> bool {
    section.get(key).is_some_and(|v| !v.is_null())
}

fn check_choice(
    key: &'static str,
    value: &Value,
    accepted: &'static [&'static str],
) -> Result<(), ConfigError> {
    match value {
        Value::String(s) if accepted.contains(&s.as_str()) => Ok(()),
        _ => Err(ConfigError::InvalidChoice {
            key,
            value: value.to_string(),
            accepted,
        }),
    }
}

fn take_section<T: DeserializeOwned>(
    root: &mut Map<String, Value>,
    section: &'static str,
) -> Result<T, ConfigError> {
    parse_section(section, root.remove(section).unwrap_or(Value::Null))
}

fn parse_section<T: DeserializeOwned>(
    section: &'static str,
    value: Value,
) -> Result<T, ConfigError> {
    serde_json::from_value(value).map_err(|source| ConfigError::Malformed { section, source })
}

/// Somewhere a [`Config`] can be written back to.
pub trait ConfigStore {
    /// Persists the whole configuration, replacing what was there.
    fn save(&self, config: &Config) -> impl Future<Output = Result<(), ConfigError>> + Send;
}

/// The JSON file a [`Config`] was loaded from.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    path: PathBuf,
}

impl ConfigFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Resolves a path found in the configuration relative to the directory holding the file.
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            return path.to_path_buf();
        }
        match self.path.parent() {
            Some(dir) => dir.join(path),
            None => path.to_path_buf(),
        }
    }

    /// Reads and validates the configuration.
    ///
    /// A missing file is reported as [`ConfigError::NotFound`]; the caller must not go on
    /// without a configuration.
    pub async fn load(&self) -> Result<Config, ConfigError> {
        let contents = match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(ConfigError::NotFound {
                    path: self.path.clone(),
                });
            }
            Err(source) => {
                return Err(ConfigError::Read {
                    path: self.path.clone(),
                    source,
                });
            }
        };
        let raw: Value = serde_json::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: self.path.clone(),
            source,
        })?;
        tracing::info!(path = %self.path.display(), "loaded configuration");
        validate(raw)
    }
}

impl ConfigStore for ConfigFile {
    async fn save(&self, config: &Config) -> Result<(), ConfigError> {
        let mut json = serde_json::to_string_pretty(config).map_err(ConfigError::Serialize)?;
        json.push('\n');
        tokio::fs::write(&self.path, json)
            .await
            .map_err(|source| ConfigError::Write {
                path: self.path.clone(),
                source,
            })?;
        tracing::debug!(path = %self.path.display(), "wrote configuration");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn full_config() -> Value {
        json!({
            "logger": "debug",
            "email": { "enable_email": false },
            "stream_settings": {
                "stream_id": "stream-1",
                "title": "Live",
                "description": "Bees at work",
                "privacy": "public",
                "tags": ["bees", "nature"],
                "category": "15"
            },
            "youtube_settings": { "credentials_file": "client_secret.json" }
        })
    }

    fn enabled_email() -> Value {
        json!({
            "enable_email": true,
            "smtp_server": "smtp.example.org",
            "smtp_port": 587,
            "sender_email": "bees@example.org",
            "sender_password": "hunter2",
            "recipient_email": "keeper@example.org",
            "subject": "Broadcast started"
        })
    }

    #[test]
    fn accepts_complete_config() {
        let config = validate(full_config()).unwrap();
        assert_eq!(config.logger, LogLevel::Debug);
        assert!(!config.email.enabled());
        assert_eq!(config.stream_settings.stream_id(), Some("stream-1"));
        assert_eq!(config.stream_settings.broadcast_id(), None);
        assert_eq!(config.stream_settings.privacy, Privacy::Public);
        assert_eq!(config.stream_settings.tags, vec!["bees", "nature"]);
        assert_eq!(
            config.stream_settings.category,
            CategoryId::Text("15".to_string())
        );
        assert_eq!(
            config.youtube_settings.credentials_file,
            PathBuf::from("client_secret.json")
        );
    }

    #[test]
    fn missing_credentials_file_is_named() {
        for youtube_settings in [
            json!({}),
            json!({ "credentials_file": null }),
            json!({ "credentials_file": "" }),
        ] {
            let mut raw = full_config();
            raw["youtube_settings"] = youtube_settings;
            let err = validate(raw).unwrap_err();
            assert!(
                matches!(
                    err,
                    ConfigError::MissingKey {
                        section: "youtube_settings",
                        key: "credentials_file"
                    }
                ),
                "{err:?}"
            );
            assert!(err.to_string().contains("credentials_file"));
        }
    }

    #[test]
    fn missing_youtube_settings_is_fatal() {
        let mut raw = full_config();
        raw.as_object_mut().unwrap().remove("youtube_settings");
        let err = validate(raw).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::MissingSection {
                section: "youtube_settings"
            }
        ));
    }

    #[test]
    fn missing_stream_settings_is_fatal() {
        let mut raw = full_config();
        raw.as_object_mut().unwrap().remove("stream_settings");
        let err = validate(raw).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::MissingSection {
                section: "stream_settings"
            }
        ));
    }

    #[test]
    fn enabled_email_requires_every_key() {
        for key in EMAIL_KEYS.iter().skip(1) {
            let mut email = enabled_email();
            email.as_object_mut().unwrap().remove(*key);
            let mut raw = full_config();
            raw["email"] = email;

            let err = validate(raw).unwrap_err();
            match err {
                ConfigError::MissingKey { section, key: missing } => {
                    assert_eq!(section, "email");
                    assert_eq!(missing, *key);
                }
                other => panic!("expected missing key, got {other:?}"),
            }
        }
    }

    #[test]
    fn enabled_email_reports_first_missing_key_in_order() {
        let mut email = enabled_email();
        let fields = email.as_object_mut().unwrap();
        fields.remove("subject");
        fields.remove("sender_email");
        fields.remove("recipient_email");
        let mut raw = full_config();
        raw["email"] = email;

        let err = validate(raw).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::MissingKey {
                section: "email",
                key: "sender_email"
            }
        ));
    }

    #[test]
    fn complete_email_block_is_accepted() {
        let mut raw = full_config();
        raw["email"] = enabled_email();
        let config = validate(raw).unwrap();
        assert!(config.email.enabled());
        assert_eq!(config.email.get("smtp_port"), Some(&json!(587)));
        assert!(!format!("{:?}", config.email).contains("hunter2"));
    }

    #[test]
    fn disabled_email_tolerates_missing_keys() {
        let mut raw = full_config();
        raw["email"] = json!({ "enable_email": false, "smtp_server": "smtp.example.org" });
        let config = validate(raw).unwrap();
        assert!(!config.email.enabled());
    }

    #[test]
    fn disabled_email_placeholders_are_not_type_checked() {
        for email in [
            json!({ "enable_email": false, "smtp_port": "587" }),
            json!({ "enable_email": false, "smtp_server": "", "smtp_port": "" }),
            json!({ "enable_email": 0 }),
        ] {
            let mut raw = full_config();
            raw["email"] = email.clone();
            let config = validate(raw).unwrap();
            assert!(!config.email.enabled(), "{email}");
            assert_eq!(serde_json::to_value(&config.email).unwrap(), email);
        }
    }

    #[test]
    fn absent_email_is_disabled() {
        let mut raw = full_config();
        raw.as_object_mut().unwrap().remove("email");
        let config = validate(raw).unwrap();
        assert!(!config.email.enabled());
        assert_eq!(
            serde_json::to_value(&config).unwrap()["email"],
            json!({ "enable_email": false })
        );
    }

    #[test]
    fn missing_stream_settings_are_defaulted() {
        let expected = [
            ("title", json!(DEFAULT_TITLE)),
            ("description", json!("")),
            ("privacy", json!("private")),
            ("tags", json!([])),
            ("category", json!(DEFAULT_CATEGORY)),
            ("stream_id", Value::Null),
        ];
        for (key, default) in expected {
            let mut raw = full_config();
            raw["stream_settings"].as_object_mut().unwrap().remove(key);

            let config = validate(raw).unwrap();
            let written = serde_json::to_value(&config).unwrap();
            assert_eq!(written["stream_settings"][key], default, "default for {key}");
        }
    }

    #[test]
    fn empty_stream_settings_get_all_defaults() {
        let mut raw = full_config();
        raw["stream_settings"] = json!({});
        let settings = validate(raw).unwrap().stream_settings;
        assert_eq!(settings.stream_id(), None);
        assert_eq!(settings.title, DEFAULT_TITLE);
        assert_eq!(settings.description, "");
        assert_eq!(settings.privacy, Privacy::Private);
        assert!(settings.tags.is_empty());
        assert_eq!(settings.category, CategoryId::Number(DEFAULT_CATEGORY));
    }

    #[test]
    fn invalid_privacy_is_rejected() {
        let mut raw = full_config();
        raw["stream_settings"]["privacy"] = json!("unlisted");
        let err = validate(raw).unwrap_err();
        match &err {
            ConfigError::InvalidChoice {
                key,
                value,
                accepted,
            } => {
                assert_eq!(*key, "privacy");
                assert_eq!(value, "\"unlisted\"");
                assert_eq!(*accepted, Privacy::ACCEPTED);
            }
            other => panic!("expected invalid choice, got {other:?}"),
        }
        assert!(err.to_string().contains("private, public"));
    }

    #[test]
    fn invalid_log_level_is_rejected() {
        let mut raw = full_config();
        raw["logger"] = json!("trace");
        let err = validate(raw).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidChoice { key: "logger", .. }
        ));
    }

    #[test]
    fn log_level_check_runs_before_section_checks() {
        let raw = json!({ "logger": "verbose" });
        let err = validate(raw).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidChoice { key: "logger", .. }
        ));
    }

    #[test]
    fn absent_log_level_defaults_to_info() {
        let mut raw = full_config();
        raw.as_object_mut().unwrap().remove("logger");
        assert_eq!(validate(raw).unwrap().logger, LogLevel::Info);
    }

    #[test]
    fn wrongly_typed_setting_is_malformed() {
        let mut raw = full_config();
        raw["stream_settings"]["tags"] = json!("bees");
        let err = validate(raw).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Malformed {
                section: "stream_settings",
                ..
            }
        ));
    }

    #[test]
    fn unknown_keys_survive_write_back() {
        let mut raw = full_config();
        raw["notes"] = json!("hive 3");
        raw["stream_settings"]["camera"] = json!("north");
        raw["email"]["reply_to"] = json!("keeper@example.org");
        let config = validate(raw).unwrap();
        let written = serde_json::to_value(&config).unwrap();
        assert_eq!(written["notes"], json!("hive 3"));
        assert_eq!(written["stream_settings"]["camera"], json!("north"));
        assert_eq!(written["email"]["reply_to"], json!("keeper@example.org"));
    }

    #[test]
    fn relative_paths_resolve_next_to_config() {
        let file = ConfigFile::new("/etc/bees/config.json");
        assert_eq!(
            file.resolve(Path::new("client_secret.json")),
            PathBuf::from("/etc/bees/client_secret.json")
        );
        assert_eq!(
            file.resolve(Path::new("/secrets/client.json")),
            PathBuf::from("/secrets/client.json")
        );
        assert_eq!(
            ConfigFile::new("config.json").resolve(Path::new("token.secret")),
            PathBuf::from("token.secret")
        );
    }

    #[tokio::test]
    async fn missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let file = ConfigFile::new(dir.path().join("config.json"));
        let err = file.load().await.unwrap_err();
        assert!(matches!(err, ConfigError::NotFound { .. }));
    }

    #[tokio::test]
    async fn invalid_json_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();
        let err = ConfigFile::new(path).load().await.unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[tokio::test]
    async fn saved_broadcast_id_is_loaded_again() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        let mut raw = full_config();
        raw["stream_settings"]["category"] = json!(22);
        std::fs::write(&path, raw.to_string()).unwrap();

        let file = ConfigFile::new(&path);
        let mut config = file.load().await.unwrap();
        config.stream_settings.broadcast_id = Some("broadcast-9".to_string());
        file.save(&config).await.unwrap();

        let reloaded = file.load().await.unwrap();
        assert_eq!(reloaded, config);
        assert_eq!(reloaded.stream_settings.broadcast_id(), Some("broadcast-9"));
        let on_disk: Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(on_disk["stream_settings"]["category"], json!(22));
    }
}
