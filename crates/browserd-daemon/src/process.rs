//! Liveness checks and signal delivery to recorded processes.

use tracing::{debug, info};

use crate::error::DaemonError;

/// Termination request sent to an owning process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessSignal {
    /// Graceful termination (SIGTERM).
    Terminate,
    /// Forced termination (SIGKILL).
    Kill,
}

impl std::fmt::Display for ProcessSignal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProcessSignal::Terminate => write!(f, "SIGTERM"),
            ProcessSignal::Kill => write!(f, "SIGKILL"),
        }
    }
}

/// Result of delivering a signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Sent,
    /// The process no longer exists.
    ProcessGone,
}

/// Check if a process with the given PID exists.
#[cfg(unix)]
pub fn is_process_running(pid: u32) -> bool {
    use nix::errno::Errno;
    use nix::sys::signal::kill;
    use nix::unistd::Pid;

    let Ok(raw) = i32::try_from(pid) else {
        return false;
    };
    if raw <= 0 {
        return false;
    }

    // Signal 0 checks for existence; EPERM still means the process exists.
    match kill(Pid::from_raw(raw), None) {
        Ok(()) => true,
        Err(Errno::EPERM) => true,
        Err(_) => false,
    }
}

#[cfg(not(unix))]
pub fn is_process_running(_pid: u32) -> bool {
    // Without signals, assume the recorded owner is alive.
    true
}

/// Send a signal to a process. A missing process is reported, not an error.
#[cfg(unix)]
pub fn send_signal(pid: u32, signal: ProcessSignal) -> Result<Delivery, DaemonError> {
    use nix::errno::Errno;
    use nix::sys::signal::{kill, Signal};
    use nix::unistd::Pid;

    let raw = i32::try_from(pid)
        .ok()
        .filter(|raw| *raw > 0)
        .ok_or_else(|| DaemonError::SignalDelivery {
            pid,
            signal: signal.to_string(),
            reason: "invalid PID".to_string(),
        })?;

    let nix_signal = match signal {
        ProcessSignal::Terminate => Signal::SIGTERM,
        ProcessSignal::Kill => Signal::SIGKILL,
    };

    match kill(Pid::from_raw(raw), nix_signal) {
        Ok(()) => {
            info!("Sent {} to PID {}", signal, pid);
            Ok(Delivery::Sent)
        }
        Err(Errno::ESRCH) => {
            debug!("PID {} already terminated", pid);
            Ok(Delivery::ProcessGone)
        }
        Err(e) => Err(DaemonError::SignalDelivery {
            pid,
            signal: signal.to_string(),
            reason: e.to_string(),
        }),
    }
}

#[cfg(not(unix))]
pub fn send_signal(pid: u32, signal: ProcessSignal) -> Result<Delivery, DaemonError> {
    Err(DaemonError::SignalDelivery {
        pid,
        signal: signal.to_string(),
        reason: "signal sending not supported on this platform".to_string(),
    })
}
