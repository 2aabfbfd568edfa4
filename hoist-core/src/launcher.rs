// hoist-core/src/launcher.rs
use std::path::{Path, PathBuf};

use hoist_aio::process::spawn_detached;
use hoist_common::error::{HoistError, Result};
use hoist_common::Config;
use tracing::{debug, info};

/// The installed application's executable: a file name inside a directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutableDescriptor {
    pub name: String,
    pub dir: PathBuf,
}

impl ExecutableDescriptor {
    pub fn new(dir: impl Into<PathBuf>, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            dir: dir.into(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        let path = config.executable_path();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| config.install_root.clone());
        Self { name, dir }
    }

    pub fn path(&self) -> PathBuf {
        self.dir.join(&self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchedProcess {
    pub pid: u32,
    pub executable: PathBuf,
}

/// Starts the installed application without waiting for it.
pub trait Launch {
    fn launch(&self, exe: &ExecutableDescriptor) -> Result<LaunchedProcess>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct AppLauncher;

impl Launch for AppLauncher {
    fn launch(&self, exe: &ExecutableDescriptor) -> Result<LaunchedProcess> {
        let path = exe.path();
        if !path.is_file() {
            return Err(HoistError::ExecutableNotFound(path.display().to_string()));
        }
        // Relative program paths resolve differently once cwd changes.
        let program = std::path::absolute(&path)?;
        let cwd = std::path::absolute(&exe.dir)?;
        debug!("Launching {} in {}", program.display(), cwd.display());

        let pid = spawn_detached(&program, &cwd)?;
        info!("Application launched");
        Ok(LaunchedProcess {
            pid,
            executable: program,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn descriptor_splits_configured_executable() {
        let mut config = Config::defaults();
        config.install_root = PathBuf::from("/opt/reports/report");
        config.executable_relative_path = PathBuf::from("Windows/Raports.exe");

        let exe = ExecutableDescriptor::from_config(&config);
        assert_eq!(exe.name, "Raports.exe");
        assert_eq!(exe.dir, PathBuf::from("/opt/reports/report/Windows"));
        assert_eq!(exe.path(), config.executable_path());
    }

    #[test]
    fn missing_executable_is_reported_by_name() {
        let tmp = tempfile::tempdir().unwrap();
        let exe = ExecutableDescriptor::new(tmp.path(), "Raports.exe");
        match AppLauncher.launch(&exe) {
            Err(HoistError::ExecutableNotFound(path)) => assert!(path.ends_with("Raports.exe")),
            other => panic!("expected ExecutableNotFound, got {other:?}"),
        }
    }

    #[cfg(unix)]
    #[test]
    fn launches_in_the_executable_directory() {
        use std::fs;
        use std::os::unix::fs::PermissionsExt;
        use std::time::{Duration, Instant};

        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("app");
        fs::create_dir_all(&dir).unwrap();
        let script = dir.join("run.sh");
        fs::write(&script, "#!/bin/sh\npwd -P > cwd.tmp && mv cwd.tmp cwd.txt\n").unwrap();
        fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).unwrap();

        let launched = AppLauncher
            .launch(&ExecutableDescriptor::new(&dir, "run.sh"))
            .unwrap();
        assert!(launched.pid > 0);

        let marker = dir.join("cwd.txt");
        let deadline = Instant::now() + Duration::from_secs(10);
        while !marker.exists() && Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(25));
        }
        let recorded = fs::read_to_string(&marker).unwrap();
        assert_eq!(
            PathBuf::from(recorded.trim()),
            dir.canonicalize().unwrap()
        );
    }
}
