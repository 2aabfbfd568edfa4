// hoist-common/src/config.rs
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::UserDirs;
use serde::Deserialize;
use tracing::debug;

use super::error::{HoistError, Result};

const DEFAULT_REPO_URL: &str = "https://github.com/Ivan-Shevliakov/ReprortsApp";
const DEFAULT_RAW_BASE_URL: &str = "https://raw.githubusercontent.com/Ivan-Shevliakov/ReprortsApp";
const DEFAULT_BRANCH: &str = "main";
const DEFAULT_APP_DIR_NAME: &str = "ReportsApp";
const DEFAULT_EXECUTABLE: &str = "Raports.exe";
#[cfg(windows)]
const DEFAULT_LAUNCHER_NAME: &str = "ReportsAppLauncher.exe";
#[cfg(not(windows))]
const DEFAULT_LAUNCHER_NAME: &str = "ReportsAppLauncher";
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;
const DEFAULT_DOWNLOAD_TIMEOUT_SECS: u64 = 300;
const VERSION_FILE_NAME: &str = "version.txt";
const CONFIG_FILE_NAME: &str = "hoist.toml";

/// What a run does when the update step failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UpdateFailurePolicy {
    /// Launch whatever is on disk anyway.
    #[default]
    Launch,
    /// Report the failure and do not launch.
    Abort,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub repo_archive_url: String,
    pub remote_version_url: String,
    pub install_root: PathBuf,
    pub staging_path: PathBuf,
    /// Executable location relative to `install_root`.
    pub executable_relative_path: PathBuf,
    /// Nested build directories looked up under the archive's wrapper
    /// directory, most specific first.
    pub payload_candidates: Vec<PathBuf>,
    /// Directory names never copied into an install (VCS metadata).
    pub excluded_dirs: Vec<String>,
    /// Total time allowed for the version lookup.
    pub http_timeout_secs: u64,
    /// Total time allowed for the archive download, body included.
    pub download_timeout_secs: u64,
    pub on_update_failure: UpdateFailurePolicy,
    pub launcher_dir: PathBuf,
    pub launcher_name: String,
    pub shortcut_name: String,
}

// Every key is optional; present keys replace the defaults.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct ConfigFile {
    repo_archive_url: Option<String>,
    remote_version_url: Option<String>,
    install_root: Option<PathBuf>,
    staging_path: Option<PathBuf>,
    executable_relative_path: Option<PathBuf>,
    payload_candidates: Option<Vec<PathBuf>>,
    excluded_dirs: Option<Vec<String>>,
    http_timeout_secs: Option<u64>,
    download_timeout_secs: Option<u64>,
    on_update_failure: Option<UpdateFailurePolicy>,
    launcher_dir: Option<PathBuf>,
    launcher_name: Option<String>,
    shortcut_name: Option<String>,
}

/// Archive endpoint of a branch snapshot on a source-control host.
pub fn archive_url_for(repo_url: &str, branch: &str) -> String {
    format!(
        "{}/archive/refs/heads/{}.zip",
        repo_url.trim_end_matches('/'),
        branch
    )
}

/// Version endpoint under a raw-content base URL.
pub fn version_url_for(raw_base_url: &str) -> String {
    format!("{}/{}", raw_base_url.trim_end_matches('/'), VERSION_FILE_NAME)
}

impl Config {
    /// Built-in defaults, rooted in the user's Documents directory.
    pub fn defaults() -> Self {
        let documents = documents_dir();
        let app_dir = documents.join(DEFAULT_APP_DIR_NAME);
        Self {
            repo_archive_url: archive_url_for(DEFAULT_REPO_URL, DEFAULT_BRANCH),
            remote_version_url: version_url_for(&format!("{DEFAULT_RAW_BASE_URL}/{DEFAULT_BRANCH}")),
            install_root: app_dir.join("report"),
            staging_path: env::temp_dir().join(format!("{DEFAULT_APP_DIR_NAME}_update")),
            executable_relative_path: PathBuf::from(DEFAULT_EXECUTABLE),
            payload_candidates: vec![PathBuf::from("Builds").join("Windows"), PathBuf::from("Windows")],
            excluded_dirs: vec![".git".to_string(), ".hg".to_string(), ".svn".to_string()],
            http_timeout_secs: DEFAULT_HTTP_TIMEOUT_SECS,
            download_timeout_secs: DEFAULT_DOWNLOAD_TIMEOUT_SECS,
            on_update_failure: UpdateFailurePolicy::default(),
            launcher_dir: app_dir,
            launcher_name: DEFAULT_LAUNCHER_NAME.to_string(),
            shortcut_name: DEFAULT_APP_DIR_NAME.to_string(),
        }
    }

    /// Defaults, then the TOML file (explicit path, `HOIST_CONFIG`, or
    /// `hoist.toml` in the launcher directory), then `HOIST_*` variables.
    pub fn load(explicit_file: Option<&Path>) -> Result<Self> {
        debug!("Loading hoist configuration");
        let mut config = Self::defaults();

        let file = explicit_file
            .map(Path::to_path_buf)
            .or_else(|| env::var_os("HOIST_CONFIG").map(PathBuf::from))
            .or_else(|| {
                let candidate = config.default_config_file();
                candidate.is_file().then_some(candidate)
            });
        if let Some(path) = file {
            config.apply_file(&path)?;
        }

        config.apply_overrides(|key| env::var(key).ok())?;
        config.validate()?;
        debug!("Configuration loaded successfully.");
        Ok(config)
    }

    pub fn apply_file(&mut self, path: &Path) -> Result<()> {
        debug!("Reading config file {}", path.display());
        let raw = fs::read_to_string(path).map_err(|e| {
            HoistError::Config(format!("Cannot read config file {}: {}", path.display(), e))
        })?;
        let file: ConfigFile = toml::from_str(&raw)?;

        if let Some(v) = file.repo_archive_url {
            self.repo_archive_url = v;
        }
        if let Some(v) = file.remote_version_url {
            self.remote_version_url = v;
        }
        if let Some(v) = file.install_root {
            self.install_root = v;
        }
        if let Some(v) = file.staging_path {
            self.staging_path = v;
        }
        if let Some(v) = file.executable_relative_path {
            self.executable_relative_path = v;
        }
        if let Some(v) = file.payload_candidates {
            self.payload_candidates = v;
        }
        if let Some(v) = file.excluded_dirs {
            self.excluded_dirs = v;
        }
        if let Some(v) = file.http_timeout_secs {
            self.http_timeout_secs = v;
        }
        if let Some(v) = file.download_timeout_secs {
            self.download_timeout_secs = v;
        }
        if let Some(v) = file.on_update_failure {
            self.on_update_failure = v;
        }
        if let Some(v) = file.launcher_dir {
            self.launcher_dir = v;
        }
        if let Some(v) = file.launcher_name {
            self.launcher_name = v;
        }
        if let Some(v) = file.shortcut_name {
            self.shortcut_name = v;
        }
        Ok(())
    }

    /// Applies `HOIST_*` overrides read through `lookup`. Empty values are
    /// ignored.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = get("HOIST_INSTALL_ROOT") {
            self.install_root = PathBuf::from(v);
        }
        if let Some(v) = get("HOIST_STAGING_PATH") {
            self.staging_path = PathBuf::from(v);
        }
        if let Some(v) = get("HOIST_ARCHIVE_URL") {
            self.repo_archive_url = v;
        }
        if let Some(v) = get("HOIST_VERSION_URL") {
            self.remote_version_url = v;
        }
        if let Some(v) = get("HOIST_EXECUTABLE") {
            self.executable_relative_path = PathBuf::from(v);
        }
        if let Some(v) = get("HOIST_HTTP_TIMEOUT_SECS") {
            self.http_timeout_secs = parse_secs("HOIST_HTTP_TIMEOUT_SECS", &v)?;
        }
        if let Some(v) = get("HOIST_DOWNLOAD_TIMEOUT_SECS") {
            self.download_timeout_secs = parse_secs("HOIST_DOWNLOAD_TIMEOUT_SECS", &v)?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.executable_relative_path.is_absolute() {
            return Err(HoistError::Config(format!(
                "executable_relative_path must be relative to the install root: {}",
                self.executable_relative_path.display()
            )));
        }
        if self.executable_relative_path.file_name().is_none() {
            return Err(HoistError::Config(
                "executable_relative_path does not name a file".to_string(),
            ));
        }
        if self.install_root.parent().is_none() || self.install_root.file_name().is_none() {
            return Err(HoistError::Config(format!(
                "install_root must be a named directory with a parent: {}",
                self.install_root.display()
            )));
        }
        if self.staging_path.starts_with(&self.install_root)
            || self.install_root.starts_with(&self.staging_path)
        {
            return Err(HoistError::Config(format!(
                "staging_path {} and install_root {} must not contain each other",
                self.staging_path.display(),
                self.install_root.display()
            )));
        }
        if self.http_timeout_secs == 0 || self.download_timeout_secs == 0 {
            return Err(HoistError::Config(
                "http_timeout_secs and download_timeout_secs must be greater than zero"
                    .to_string(),
            ));
        }
        Ok(())
    }

    pub fn install_root(&self) -> &Path {
        &self.install_root
    }

    pub fn staging_path(&self) -> &Path {
        &self.staging_path
    }

    /// `<install_root parent>/version.txt`; survives install replacement.
    pub fn version_file(&self) -> PathBuf {
        match self.install_root.parent() {
            Some(parent) => parent.join(VERSION_FILE_NAME),
            None => self.install_root.join(VERSION_FILE_NAME),
        }
    }

    pub fn executable_path(&self) -> PathBuf {
        self.install_root.join(&self.executable_relative_path)
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    pub fn download_timeout(&self) -> Duration {
        Duration::from_secs(self.download_timeout_secs)
    }

    pub fn installed_launcher_path(&self) -> PathBuf {
        self.launcher_dir.join(&self.launcher_name)
    }

    pub fn logs_dir(&self) -> PathBuf {
        self.launcher_dir.join("logs")
    }

    pub fn default_config_file(&self) -> PathBuf {
        self.launcher_dir.join(CONFIG_FILE_NAME)
    }

    pub fn desktop_dir(&self) -> Option<PathBuf> {
        UserDirs::new().and_then(|ud| ud.desktop_dir().map(Path::to_path_buf))
    }
}

fn parse_secs(key: &str, value: &str) -> Result<u64> {
    value
        .trim()
        .parse::<u64>()
        .map_err(|e| HoistError::Config(format!("{key} must be a number of seconds: {e}")))
}

impl Default for Config {
    fn default() -> Self {
        Self::defaults()
    }
}

fn documents_dir() -> PathBuf {
    UserDirs::new().map_or_else(
        env::temp_dir,
        |ud| {
            ud.document_dir()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| ud.home_dir().to_path_buf())
        },
    )
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn rooted(root: &Path) -> Config {
        Config {
            install_root: root.join("app").join("report"),
            staging_path: root.join("staging"),
            launcher_dir: root.join("app"),
            ..Config::defaults()
        }
    }

    #[test]
    fn default_urls_follow_archive_convention() {
        let config = Config::defaults();
        assert_eq!(
            config.repo_archive_url,
            "https://github.com/Ivan-Shevliakov/ReprortsApp/archive/refs/heads/main.zip"
        );
        assert!(config.remote_version_url.ends_with("/main/version.txt"));
        assert_eq!(config.on_update_failure, UpdateFailurePolicy::Launch);
    }

    #[test]
    fn version_file_sits_beside_install_root() {
        let tmp = tempfile::tempdir().unwrap();
        let config = rooted(tmp.path());
        assert_eq!(config.version_file(), tmp.path().join("app").join("version.txt"));
    }

    #[test]
    fn file_values_replace_defaults() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("hoist.toml");
        fs::write(
            &path,
            r#"
remote_version_url = "http://localhost:9/version.txt"
executable_relative_path = "Windows/Raports.exe"
on_update_failure = "abort"
http_timeout_secs = 5
download_timeout_secs = 900
"#,
        )
        .unwrap();

        let mut config = rooted(tmp.path());
        config.apply_file(&path).unwrap();
        assert_eq!(config.remote_version_url, "http://localhost:9/version.txt");
        assert_eq!(
            config.executable_path(),
            config.install_root.join("Windows").join("Raports.exe")
        );
        assert_eq!(config.on_update_failure, UpdateFailurePolicy::Abort);
        assert_eq!(config.http_timeout(), Duration::from_secs(5));
        assert_eq!(config.download_timeout(), Duration::from_secs(900));
    }

    #[test]
    fn download_gets_a_longer_limit_than_the_version_lookup() {
        let config = Config::defaults();
        assert_eq!(config.http_timeout(), Duration::from_secs(30));
        assert_eq!(config.download_timeout(), Duration::from_secs(300));
    }

    #[test]
    fn unknown_file_keys_are_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("hoist.toml");
        fs::write(&path, "instal_root = \"/x\"\n").unwrap();
        let err = rooted(tmp.path()).apply_file(&path).unwrap_err();
        assert!(matches!(err, HoistError::Config(_)));
    }

    #[test]
    fn overrides_ignore_blank_values_and_parse_timeout() {
        let tmp = tempfile::tempdir().unwrap();
        let vars: HashMap<&str, &str> = [
            ("HOIST_ARCHIVE_URL", "http://example.test/a.zip"),
            ("HOIST_VERSION_URL", "  "),
            ("HOIST_HTTP_TIMEOUT_SECS", "12"),
            ("HOIST_DOWNLOAD_TIMEOUT_SECS", " 600 "),
        ]
        .into_iter()
        .collect();

        let mut config = rooted(tmp.path());
        let before = config.remote_version_url.clone();
        config
            .apply_overrides(|key| vars.get(key).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(config.repo_archive_url, "http://example.test/a.zip");
        assert_eq!(config.remote_version_url, before);
        assert_eq!(config.http_timeout_secs, 12);
        assert_eq!(config.download_timeout_secs, 600);
    }

    #[test]
    fn non_numeric_timeout_is_a_config_error() {
        let tmp = tempfile::tempdir().unwrap();
        let mut config = rooted(tmp.path());
        let err = config
            .apply_overrides(|key| (key == "HOIST_HTTP_TIMEOUT_SECS").then(|| "soon".to_string()))
            .unwrap_err();
        assert!(matches!(err, HoistError::Config(_)));
    }

    #[test]
    fn validate_rejects_overlapping_staging_and_absolute_executable() {
        let tmp = tempfile::tempdir().unwrap();
        let mut config = rooted(tmp.path());
        assert!(config.validate().is_ok());

        config.staging_path = config.install_root.join("tmp");
        assert!(config.validate().is_err());

        let mut config = rooted(tmp.path());
        config.executable_relative_path = tmp.path().join("abs.exe");
        assert!(config.validate().is_err());

        let mut config = rooted(tmp.path());
        config.download_timeout_secs = 0;
        assert!(config.validate().is_err());
    }
}
