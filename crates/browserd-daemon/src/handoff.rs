//! Hand-off store: the endpoint and ownership records sibling processes read.
//!
//! The state directory holds exactly two flat files:
//!
//! - `ws-endpoint`: the address automation tools connect to
//! - `browser.pid`: the PID of the process owning the browser
//!
//! Records are replaced wholesale through a temporary file and a rename,
//! ownership first, so a visible endpoint always has its owner beside it.

use std::fs::{self, File};
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::error::DaemonError;
use crate::process::is_process_running;

/// File name of the endpoint record.
pub const ENDPOINT_FILE: &str = "ws-endpoint";
/// File name of the ownership record.
pub const PID_FILE: &str = "browser.pid";

/// Reader/writer for the two hand-off records in a state directory.
#[derive(Debug, Clone)]
pub struct HandoffStore {
    dir: PathBuf,
}

impl HandoffStore {
    /// Create a store rooted at the given state directory.
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn endpoint_path(&self) -> PathBuf {
        self.dir.join(ENDPOINT_FILE)
    }

    pub fn pid_path(&self) -> PathBuf {
        self.dir.join(PID_FILE)
    }

    /// Whether an endpoint record exists.
    pub fn has_endpoint(&self) -> bool {
        self.endpoint_path().exists()
    }

    /// Whether an ownership record exists.
    pub fn has_owner(&self) -> bool {
        self.pid_path().exists()
    }

    /// Create the state directory if absent.
    pub fn ensure_dir(&self) -> Result<(), DaemonError> {
        #[cfg(unix)]
        let created = {
            use std::os::unix::fs::DirBuilderExt;
            fs::DirBuilder::new()
                .recursive(true)
                .mode(0o700)
                .create(&self.dir)
        };
        #[cfg(not(unix))]
        let created = fs::create_dir_all(&self.dir);

        created.map_err(|e| DaemonError::RecordWrite {
            path: self.dir.clone(),
            reason: format!("Failed to create state directory: {}", e),
        })
    }

    /// Read the endpoint record.
    pub fn read_endpoint(&self) -> Result<Option<String>, DaemonError> {
        let path = self.endpoint_path();
        let Some(contents) = Self::read_record(&path)? else {
            return Ok(None);
        };

        let endpoint = contents.trim();
        if endpoint.is_empty() {
            return Err(DaemonError::RecordRead {
                path,
                reason: "empty endpoint".to_string(),
            });
        }
        Ok(Some(endpoint.to_string()))
    }

    /// Read the ownership record.
    pub fn read_pid(&self) -> Result<Option<u32>, DaemonError> {
        let path = self.pid_path();
        let Some(contents) = Self::read_record(&path)? else {
            return Ok(None);
        };

        let pid = contents
            .trim()
            .parse::<u32>()
            .map_err(|e| DaemonError::RecordRead {
                path,
                reason: format!("Invalid PID format: {}", e),
            })?;
        Ok(Some(pid))
    }

    /// Write both records, ownership first.
    pub fn write(&self, endpoint: &str, pid: u32) -> Result<(), DaemonError> {
        self.ensure_dir()?;
        self.write_record(PID_FILE, &pid.to_string())?;
        if let Err(e) = self.write_record(ENDPOINT_FILE, endpoint) {
            let _ = Self::remove_record(&self.pid_path());
            return Err(e);
        }

        info!(
            "Hand-off records written in {} (PID: {}, endpoint: {})",
            self.dir.display(),
            pid,
            endpoint
        );
        Ok(())
    }

    /// Remove both records. Missing files are fine.
    pub fn clear(&self) -> Result<(), DaemonError> {
        let endpoint = Self::remove_record(&self.endpoint_path());
        let owner = Self::remove_record(&self.pid_path());
        endpoint?;
        owner?;
        debug!("Hand-off records cleared in {}", self.dir.display());
        Ok(())
    }

    /// Endpoint of a live browser server, for tools attaching to it.
    ///
    /// Returns `None` when no record exists or its owner is gone.
    pub fn attach_endpoint(&self) -> Result<Option<String>, DaemonError> {
        let Some(endpoint) = self.read_endpoint()? else {
            return Ok(None);
        };
        match self.read_pid()? {
            Some(pid) if is_process_running(pid) => Ok(Some(endpoint)),
            _ => Ok(None),
        }
    }

    /// Take the exclusive start lock on the state directory.
    ///
    /// Fails with [`DaemonError::Conflict`] while another process holds it.
    pub fn try_lock(&self) -> Result<StateLock, DaemonError> {
        self.ensure_dir()?;
        StateLock::acquire(&self.dir)
    }

    fn read_record(path: &Path) -> Result<Option<String>, DaemonError> {
        match fs::read_to_string(path) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(DaemonError::RecordRead {
                path: path.to_path_buf(),
                reason: e.to_string(),
            }),
        }
    }

    fn write_record(&self, name: &str, contents: &str) -> Result<(), DaemonError> {
        let target = self.dir.join(name);
        let tmp = self.dir.join(format!(".{}.tmp", name));
        let to_err = |e: std::io::Error| DaemonError::RecordWrite {
            path: target.clone(),
            reason: e.to_string(),
        };

        fs::write(&tmp, contents).map_err(to_err)?;
        if let Err(e) = fs::rename(&tmp, &target) {
            let _ = fs::remove_file(&tmp);
            return Err(to_err(e));
        }
        Ok(())
    }

    fn remove_record(path: &Path) -> Result<(), DaemonError> {
        match fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => {
                warn!("Failed to remove {}: {}", path.display(), e);
                Err(DaemonError::RecordRemoval {
                    path: path.to_path_buf(),
                    reason: e.to_string(),
                })
            }
        }
    }
}

/// Advisory exclusive lock on the state directory, held by a running start.
///
/// The kernel drops it when the holder exits, however it exits.
pub struct StateLock {
    #[cfg(unix)]
    _lock: nix::fcntl::Flock<File>,
    #[cfg(not(unix))]
    _dir: PathBuf,
}

impl StateLock {
    #[cfg(unix)]
    fn acquire(dir: &Path) -> Result<Self, DaemonError> {
        use nix::errno::Errno;
        use nix::fcntl::{Flock, FlockArg};

        let handle = File::open(dir).map_err(|e| DaemonError::Lock {
            path: dir.to_path_buf(),
            reason: e.to_string(),
        })?;

        match Flock::lock(handle, FlockArg::LockExclusiveNonblock) {
            Ok(lock) => {
                debug!("State directory locked: {}", dir.display());
                Ok(Self { _lock: lock })
            }
            Err((_, errno)) if errno == Errno::EWOULDBLOCK => Err(DaemonError::Conflict {
                state_dir: dir.to_path_buf(),
                endpoint: None,
            }),
            Err((_, errno)) => Err(DaemonError::Lock {
                path: dir.to_path_buf(),
                reason: errno.to_string(),
            }),
        }
    }

    #[cfg(not(unix))]
    fn acquire(dir: &Path) -> Result<Self, DaemonError> {
        Ok(Self {
            _dir: dir.to_path_buf(),
        })
    }
}

#[cfg(test)]
#[path = "handoff_tests.rs"]
mod tests;
