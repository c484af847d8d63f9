use rustix::process::{kill_process, test_kill_process, Pid, Signal};

use crate::error::ProcessError;

/// Out-of-band control messages delivered to the daemon as Unix signals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlSignal {
    /// SIGUSR1
    TogglePause,
    /// SIGUSR2
    Next,
    /// SIGTERM
    Terminate,
}

impl ControlSignal {
    fn as_signal(self) -> Signal {
        match self {
            ControlSignal::TogglePause => Signal::Usr1,
            ControlSignal::Next => Signal::Usr2,
            ControlSignal::Terminate => Signal::Term,
        }
    }
}

fn to_pid(pid: i32) -> Result<Pid, ProcessError> {
    Pid::from_raw(pid).ok_or_else(|| ProcessError::Signal {
        pid,
        source: std::io::Error::new(std::io::ErrorKind::InvalidInput, "invalid pid"),
    })
}

pub fn send_signal(pid: i32, signal: ControlSignal) -> Result<(), ProcessError> {
    let target = to_pid(pid)?;
    kill_process(target, signal.as_signal()).map_err(|errno| ProcessError::Signal {
        pid,
        source: errno.into(),
    })?;
    log::debug!("Sent {:?} to process {}", signal, pid);
    Ok(())
}

/// Signal-0 check: true when a process with this pid exists.
pub fn is_alive(pid: i32) -> bool {
    match to_pid(pid) {
        Ok(target) => match test_kill_process(target) {
            Ok(()) => true,
            // Exists but belongs to someone else
            Err(errno) => errno == rustix::io::Errno::PERM,
        },
        Err(_) => false,
    }
}
