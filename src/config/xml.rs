//! XML configuration support.
//! - Loads settings from config.xml (quick_xml).
//! - Creates a secure template if the default location is empty.
//!
//! Notes:
//! - Every field is validated here; any malformed value is a hard error so the
//!   service never starts with a partial configuration.
//! - Unknown XML fields are rejected (`deny_unknown_fields`).

use anyhow::{Context, Result, anyhow, bail};
use quick_xml::de::from_str as from_xml_str;
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;
use url::Url;

use super::paths::{CONFIG_ENV_VAR, default_config_path, default_log_path, path_has_symlink_ancestor};
use super::{COMPLETED_DIR_DEFAULT, FAILED_DIR_DEFAULT, SOURCE_DIR_DEFAULT, UPLOAD_URL_DEFAULT};

use crate::config::types::{Config, LogLevel};
use crate::platform::{set_dir_mode_0700, set_file_mode_0600, write_config_secure_new_0600};

/// Struct mirroring the XML config for deserialization.
#[derive(Debug, Deserialize)]
#[serde(rename = "config")]
#[serde(deny_unknown_fields)]
struct XmlConfig {
    source_dir: Option<String>,
    completed_dir: Option<String>,
    failed_dir: Option<String>,
    upload_url: Option<String>,
    log_level: Option<String>,
    log_file: Option<String>,
    watch: Option<bool>,
    #[serde(default, deserialize_with = "de_u64_trimmed_opt")]
    scan_interval_seconds: Option<u64>,
    #[serde(default, deserialize_with = "de_u64_trimmed_opt")]
    upload_timeout_seconds: Option<u64>,
}

/// Outcome of locating and loading the config file.
#[derive(Debug)]
pub enum LoadResult {
    /// A config was found and parsed.
    Loaded(Box<Config>),
    /// No config existed at the default location; a template was written here.
    CreatedTemplate(PathBuf),
}

// Optional u64 with surrounding whitespace trimmed; garbage is an error.
fn de_u64_trimmed_opt<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::Error;
    let opt: Option<String> = Option::deserialize(deserializer)?;
    match opt.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => s
            .parse::<u64>()
            .map(Some)
            .map_err(|e| D::Error::custom(format!("invalid number '{s}': {e}"))),
    }
}

fn required(field: Option<String>, name: &str) -> Result<String> {
    match field.as_deref().map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v.to_string()),
        _ => bail!("missing required config field <{name}>"),
    }
}

/// Parse and check the upload URL; only http(s) endpoints are accepted.
pub fn parse_upload_url(raw: &str) -> Result<Url> {
    let url = Url::parse(raw.trim()).with_context(|| format!("invalid upload_url '{raw}'"))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => bail!("upload_url '{raw}' has unsupported scheme '{other}'"),
    }
}

// Map XmlConfig -> Config.
fn xml_to_config(parsed: XmlConfig) -> Result<Config> {
    let source_dir = PathBuf::from(required(parsed.source_dir, "source_dir")?);
    let completed_dir = PathBuf::from(required(parsed.completed_dir, "completed_dir")?);
    let failed_dir = PathBuf::from(required(parsed.failed_dir, "failed_dir")?);
    let upload_url = parse_upload_url(&required(parsed.upload_url, "upload_url")?)?;

    let mut cfg = Config::new(source_dir, completed_dir, failed_dir, upload_url);

    if let Some(s) = parsed.log_level.as_deref() {
        cfg.log_level = s
            .trim()
            .parse::<LogLevel>()
            .map_err(|e| anyhow!(e))?;
    }
    if let Some(s) = parsed.log_file.as_deref() {
        let trimmed = s.trim();
        if !trimmed.is_empty() {
            cfg.log_file = Some(PathBuf::from(trimmed));
        }
    }
    cfg.watch = parsed.watch.unwrap_or(true);
    cfg.scan_interval = parsed.scan_interval_seconds.map(Duration::from_secs);
    cfg.upload_timeout = parsed
        .upload_timeout_seconds
        .filter(|s| *s > 0)
        .map(Duration::from_secs);

    Ok(cfg)
}

/// Load a Config from a specific XML file path (quick_xml).
pub fn load_config_from_xml_path(path: &Path) -> Result<Config> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("read config xml '{}'", path.display()))?;
    let parsed: XmlConfig = from_xml_str(&contents)
        .with_context(|| format!("parse config xml '{}'", path.display()))?;
    xml_to_config(parsed).with_context(|| format!("invalid config '{}'", path.display()))
}

/// Locate and load the config.
///
/// Precedence: `explicit` path, then $FILE_UPLOADER_CONFIG, then the OS default.
/// Explicit and env-provided paths must exist. A missing default config is
/// replaced by a template and reported as `CreatedTemplate`.
pub fn load_or_init(explicit: Option<&Path>) -> Result<LoadResult> {
    if let Some(p) = explicit {
        return Ok(LoadResult::Loaded(Box::new(load_config_from_xml_path(p)?)));
    }
    let from_env = env::var_os(CONFIG_ENV_VAR).is_some();
    let path = default_config_path()?;
    if !path.exists() {
        if from_env {
            bail!("{CONFIG_ENV_VAR} points to a missing file: {}", path.display());
        }
        create_template_config(&path)?;
        return Ok(LoadResult::CreatedTemplate(path));
    }
    info!(path = %path.display(), "Loading config");
    Ok(LoadResult::Loaded(Box::new(load_config_from_xml_path(&path)?)))
}

/// Create default template config file and parent directory (best-effort permissions).
/// Uses secure creation to avoid following attacker-controlled symlinks on Unix.
pub fn create_template_config(path: &Path) -> Result<()> {
    if path_has_symlink_ancestor(path)? {
        bail!(
            "Refusing to create config: ancestor of {} is a symlink",
            path.display()
        );
    }

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
        let _ = set_dir_mode_0700(parent);
    }

    let suggested_log = default_log_path()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|_| "/path/to/file_uploader.log".into());

    let content = format!(
        "<!--\n  file_uploader configuration (XML)\n\n  Required:\n    source_dir             -> directory watched for new files\n    completed_dir          -> files land here after a successful upload\n    failed_dir             -> files land here after a failed upload\n    upload_url             -> http(s) endpoint receiving a multipart POST (field `file`)\n\n  Optional:\n    log_level              -> quiet | normal | info | debug\n    log_file               -> path to log file (stdout is always used)\n    watch                  -> true/false; subscribe to filesystem create-events\n    scan_interval_seconds  -> directory scan cadence (default 5, or 1 when watch=false)\n    upload_timeout_seconds -> per-upload timeout (default: none)\n-->\n<config>\n  <source_dir>{}</source_dir>\n  <completed_dir>{}</completed_dir>\n  <failed_dir>{}</failed_dir>\n  <upload_url>{}</upload_url>\n  <log_level>normal</log_level>\n  <log_file>{}</log_file>\n  <watch>true</watch>\n</config>\n",
        SOURCE_DIR_DEFAULT, COMPLETED_DIR_DEFAULT, FAILED_DIR_DEFAULT, UPLOAD_URL_DEFAULT, suggested_log
    );

    // Atomic, secure write (O_NOFOLLOW + create_new on Unix), then tighten perms.
    write_config_secure_new_0600(path, content.as_bytes())?;
    let _ = set_file_mode_0600(path);

    info!("Created template config at {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(dir: &Path, body: &str) -> PathBuf {
        let p = dir.join("config.xml");
        fs::write(&p, body).unwrap();
        p
    }

    #[test]
    fn template_round_trips_through_loader() {
        let td = tempfile::tempdir().unwrap();
        let p = td.path().join("nested").join("config.xml");
        if path_has_symlink_ancestor(&p).unwrap() {
            eprintln!("Skipping: temp dir has a symlinked ancestor");
            return;
        }
        create_template_config(&p).unwrap();
        let cfg = load_config_from_xml_path(&p).unwrap();
        assert_eq!(cfg.source_dir, PathBuf::from(SOURCE_DIR_DEFAULT));
        assert_eq!(cfg.upload_url.as_str(), UPLOAD_URL_DEFAULT);
        assert!(cfg.watch);
    }

    #[test]
    fn missing_required_field_is_fatal() {
        let td = tempfile::tempdir().unwrap();
        let p = write(
            td.path(),
            "<config><source_dir>/a</source_dir><completed_dir>/b</completed_dir><upload_url>http://x/</upload_url></config>",
        );
        let err = load_config_from_xml_path(&p).unwrap_err();
        assert!(format!("{err:#}").contains("failed_dir"));
    }

    #[test]
    fn non_http_url_is_rejected() {
        assert!(parse_upload_url("ftp://host/upload").is_err());
        assert!(parse_upload_url("not a url").is_err());
        assert!(parse_upload_url(" https://host/upload ").is_ok());
    }

    #[test]
    fn garbage_interval_is_fatal() {
        let td = tempfile::tempdir().unwrap();
        let p = write(
            td.path(),
            "<config><source_dir>/a</source_dir><completed_dir>/b</completed_dir><failed_dir>/c</failed_dir><upload_url>http://x/</upload_url><scan_interval_seconds>soon</scan_interval_seconds></config>",
        );
        assert!(load_config_from_xml_path(&p).is_err());
    }

    #[test]
    fn explicit_path_wins() {
        let td = tempfile::tempdir().unwrap();
        let p = write(
            td.path(),
            "<config><source_dir>/a</source_dir><completed_dir>/b</completed_dir><failed_dir>/c</failed_dir><upload_url>http://x/up</upload_url><watch>false</watch><scan_interval_seconds> 2 </scan_interval_seconds></config>",
        );
        match load_or_init(Some(&p)).unwrap() {
            LoadResult::Loaded(cfg) => {
                assert!(!cfg.watch);
                assert_eq!(cfg.scan_interval, Some(Duration::from_secs(2)));
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
