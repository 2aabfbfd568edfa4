// hoist-aio/src/process.rs
use std::path::Path;
use std::process::{Command, Stdio};

use hoist_common::error::{HoistError, Result};
use tracing::{debug, error};

/// Starts `program` as an independent process with `cwd` as its working
/// directory and returns its pid without waiting for it.
///
/// The child gets no inherited stdio and, on Unix, its own process group so
/// that console signals aimed at the launcher do not reach it.
pub fn spawn_detached(program: &Path, cwd: &Path) -> Result<u32> {
    debug!(
        "Spawning detached: {} (cwd: {})",
        program.display(),
        cwd.display()
    );

    let mut cmd = Command::new(program);
    cmd.current_dir(cwd)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null());

    #[cfg(unix)]
    {
        use std::os::unix::process::CommandExt;
        cmd.process_group(0);
    }
    #[cfg(windows)]
    {
        use std::os::windows::process::CommandExt;
        const DETACHED_PROCESS: u32 = 0x0000_0008;
        const CREATE_NEW_PROCESS_GROUP: u32 = 0x0000_0200;
        cmd.creation_flags(DETACHED_PROCESS | CREATE_NEW_PROCESS_GROUP);
    }

    match cmd.spawn() {
        Ok(child) => {
            let pid = child.id();
            debug!("Spawned {} with pid {}", program.display(), pid);
            // Dropping the handle neither waits for nor kills the child.
            drop(child);
            Ok(pid)
        }
        Err(e) => {
            error!("Failed to start {}: {}", program.display(), e);
            Err(HoistError::Io(std::sync::Arc::new(e)))
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use std::fs;
    use std::os::unix::fs::PermissionsExt;
    use std::time::{Duration, Instant};

    use super::*;

    #[test]
    fn child_runs_in_requested_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let script = tmp.path().join("app.sh");
        fs::write(&script, "#!/bin/sh\npwd -P > where.tmp && mv where.tmp where.txt\n").unwrap();
        fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).unwrap();

        let pid = spawn_detached(&script, tmp.path()).unwrap();
        assert!(pid > 0);

        let marker = tmp.path().join("where.txt");
        let deadline = Instant::now() + Duration::from_secs(10);
        while !marker.is_file() && Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(20));
        }
        let written = fs::read_to_string(&marker).unwrap();
        let expected = fs::canonicalize(tmp.path()).unwrap();
        assert_eq!(Path::new(written.trim()), expected.as_path());
    }

    #[test]
    fn missing_program_is_an_io_error() {
        let tmp = tempfile::tempdir().unwrap();
        let err = spawn_detached(&tmp.path().join("ghost"), tmp.path()).unwrap_err();
        assert!(matches!(err, HoistError::Io(_)));
    }
}
