// hoist-core/src/bootstrap.rs
//! Installs the launcher itself into a stable location and puts a desktop
//! entry pointing at it.
use std::fs;
use std::path::{Path, PathBuf};

#[cfg(not(windows))]
use hoist_aio::fs::atomic_write_file;
use hoist_aio::fs::create_dir_all;
use hoist_common::error::{HoistError, Result};
use hoist_common::Config;
use tracing::{debug, info};

#[derive(Debug, Clone)]
pub struct LauncherBootstrap {
    launcher_dir: PathBuf,
    launcher_name: String,
    shortcut_name: String,
    desktop_dir: Option<PathBuf>,
}

impl LauncherBootstrap {
    pub fn from_config(config: &Config) -> Self {
        Self {
            launcher_dir: config.launcher_dir.clone(),
            launcher_name: config.launcher_name.clone(),
            shortcut_name: config.shortcut_name.clone(),
            desktop_dir: config.desktop_dir(),
        }
    }

    pub fn with_desktop_dir(mut self, desktop_dir: Option<PathBuf>) -> Self {
        self.desktop_dir = desktop_dir;
        self
    }

    pub fn installed_path(&self) -> PathBuf {
        self.launcher_dir.join(&self.launcher_name)
    }

    pub fn is_installed(&self) -> bool {
        self.installed_path().is_file()
    }

    /// Copies `current_exe` into the launcher directory when no copy is there
    /// yet or the installed one is older. Returns the installed path when a
    /// copy was made.
    pub fn install_launcher(&self, current_exe: &Path) -> Result<Option<PathBuf>> {
        let target = self.installed_path();
        create_dir_all(&self.launcher_dir)?;

        if target.exists() {
            if same_file(current_exe, &target) {
                debug!("Running from the installed launcher; nothing to copy");
                return Ok(None);
            }
            if !is_newer(current_exe, &target)? {
                debug!("Installed launcher at {} is up to date", target.display());
                return Ok(None);
            }
        }

        fs::copy(current_exe, &target).map_err(|e| {
            HoistError::InstallError(format!(
                "Could not copy launcher to {}: {}",
                target.display(),
                e
            ))
        })?;
        info!("Launcher installed to: {}", target.display());
        Ok(Some(target))
    }

    /// Creates (or refreshes) a desktop entry for the installed launcher.
    pub fn create_desktop_entry(&self) -> Result<PathBuf> {
        let desktop = self.desktop_dir.as_deref().ok_or_else(|| {
            HoistError::Config("No desktop directory for this user".to_string())
        })?;
        create_dir_all(desktop)?;
        let entry = self.write_desktop_entry(desktop)?;
        info!("Desktop shortcut created: {}", entry.display());
        Ok(entry)
    }

    #[cfg(windows)]
    fn write_desktop_entry(&self, desktop: &Path) -> Result<PathBuf> {
        use std::process::Command;

        let lnk = desktop.join(format!("{}.lnk", self.shortcut_name));
        let script = shortcut_script(
            &lnk,
            &self.installed_path(),
            &self.launcher_dir,
            &format!("{} Launcher", self.shortcut_name),
        );
        let status = Command::new("powershell")
            .args(["-NoProfile", "-NonInteractive", "-Command"])
            .arg(script)
            .status()?;
        if !status.success() {
            return Err(HoistError::InstallError(format!(
                "Failed to create shortcut (exit {:?})",
                status.code()
            )));
        }
        Ok(lnk)
    }

    #[cfg(not(windows))]
    fn write_desktop_entry(&self, desktop: &Path) -> Result<PathBuf> {
        let path = desktop.join(format!("{}.desktop", self.shortcut_name));
        let contents = desktop_file(
            &self.shortcut_name,
            &self.installed_path(),
            &self.launcher_dir,
        );
        atomic_write_file(&path, contents.as_bytes())?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&path, fs::Permissions::from_mode(0o755))?;
        }
        Ok(path)
    }
}

fn same_file(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

fn is_newer(candidate: &Path, installed: &Path) -> Result<bool> {
    let candidate = fs::metadata(candidate)?.modified()?;
    let installed = fs::metadata(installed)?.modified()?;
    Ok(candidate > installed)
}

#[cfg_attr(not(windows), allow(dead_code))]
fn ps_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

#[cfg_attr(not(windows), allow(dead_code))]
fn shortcut_script(lnk: &Path, target: &Path, working_dir: &Path, description: &str) -> String {
    let lnk = ps_quote(&lnk.display().to_string());
    let tgt = ps_quote(&target.display().to_string());
    let dir = ps_quote(&working_dir.display().to_string());
    let desc = ps_quote(description);
    let icon = ps_quote(&format!("{},0", target.display()));
    format!(
        "$WshShell = New-Object -ComObject WScript.Shell; \
         $Shortcut = $WshShell.CreateShortcut({lnk}); \
         $Shortcut.TargetPath = {tgt}; \
         $Shortcut.WorkingDirectory = {dir}; \
         $Shortcut.Description = {desc}; \
         $Shortcut.IconLocation = {icon}; \
         $Shortcut.Save();"
    )
}

#[cfg_attr(windows, allow(dead_code))]
fn desktop_file(name: &str, target: &Path, working_dir: &Path) -> String {
    format!(
        "[Desktop Entry]\n\
         Type=Application\n\
         Name={name}\n\
         Comment={name} Launcher\n\
         Exec=\"{}\"\n\
         Path={}\n\
         Terminal=false\n",
        target.display(),
        working_dir.display()
    )
}
