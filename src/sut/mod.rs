//! Supervision of the server-under-test subprocess.
//!
//! The handle is the only owner of the child process. It is always
//! terminated when the handle drops, so the pipeline cannot leave a
//! runaway server behind, whatever exit path it takes. The child lives
//! in a shared slot so the SIGINT watcher can reach it too.

use crate::app::group::Liveness;
use crate::configuration::settings::Settings;
use crate::connection::raw::RawConnection;
use crate::error::CheckError;
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread;

pub type SharedChild = Arc<Mutex<Option<Child>>>;

fn lock(slot: &SharedChild) -> MutexGuard<Option<Child>> {
    // a poisoned lock still holds the child; termination must go on
    slot.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Kill whatever process currently occupies the slot. Safe to call from
/// the signal watcher while a handle still exists.
pub fn kill_shared(slot: &SharedChild) {
    if let Some(mut child) = lock(slot).take() {
        let _ = child.kill();
        let _ = child.wait();
    }
}

pub struct SutHandle {
    child: SharedChild,
    port: u16,
}

impl SutHandle {
    /// Spawns `server -p <port>`, optionally redirecting its output.
    pub fn launch(
        slot: SharedChild,
        server: &Path,
        port: u16,
        output: Option<&PathBuf>,
    ) -> io::Result<Self> {
        let mut command = Command::new(server);
        command.arg("-p").arg(port.to_string());
        if let Some(path) = output {
            let stdout = File::create(path)?;
            let stderr = stdout.try_clone()?;
            command.stdout(Stdio::from(stdout)).stderr(Stdio::from(stderr));
        }
        let child = command.spawn()?;
        info!("Started server {:?} with pid {} on port {}", server, child.id(), port);
        *lock(&slot) = Some(child);
        Ok(Self { child: slot, port })
    }

    /// Waits until the server accepts a probe connection, with bounded
    /// retries. The server gets `startup_retries * startup_delay` to
    /// come up before this reports the last connect error.
    pub fn wait_ready(&self, host: &str, settings: &Settings) -> Result<(), CheckError> {
        let mut last_error = None;
        for attempt in 0..settings.startup_retries {
            if attempt > 0 {
                thread::sleep(settings.startup_delay);
            }
            match RawConnection::open(host, self.port, settings) {
                Ok(probe) => {
                    drop(probe);
                    debug!("Server accepted the readiness probe on attempt {}", attempt + 1);
                    return Ok(());
                }
                Err(error) => last_error = Some(error),
            }
        }
        Err(last_error.unwrap_or_else(|| {
            CheckError::Connect("no readiness attempts configured".to_owned())
        }))
    }

    pub fn terminate(&mut self) {
        if let Some(mut child) = lock(&self.child).take() {
            debug!("Terminating server pid {}", child.id());
            if let Err(error) = child.kill() {
                warn!("Failed to kill the server process: {}", error);
            }
            let _ = child.wait();
        }
    }
}

impl Liveness for SutHandle {
    fn is_alive(&mut self) -> bool {
        match lock(&self.child).as_mut() {
            Some(child) => matches!(child.try_wait(), Ok(None)),
            None => false,
        }
    }
}

impl Drop for SutHandle {
    fn drop(&mut self) {
        self.terminate();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    fn slot() -> SharedChild {
        Arc::new(Mutex::new(None))
    }

    #[test]
    fn test_liveness_goes_false_once_the_child_exits() {
        // /bin/true ignores the -p argument and exits immediately
        let mut handle =
            SutHandle::launch(slot(), Path::new("/bin/true"), 29999, None).unwrap();
        for _ in 0..50 {
            if !handle.is_alive() {
                return;
            }
            thread::sleep(Duration::from_millis(20));
        }
        panic!("child should have exited");
    }

    #[test]
    fn test_terminate_is_idempotent() {
        let mut handle =
            SutHandle::launch(slot(), Path::new("/bin/true"), 29998, None).unwrap();
        handle.terminate();
        handle.terminate();
        assert!(!handle.is_alive());
    }

    #[test]
    fn test_kill_shared_clears_the_slot() {
        let shared = slot();
        let handle =
            SutHandle::launch(Arc::clone(&shared), Path::new("/bin/true"), 29997, None).unwrap();
        kill_shared(&shared);
        assert!(lock(&shared).is_none());
        drop(handle);
    }

    #[test]
    fn test_launch_fails_for_missing_executable() {
        let result = SutHandle::launch(slot(), Path::new("/no/such/server"), 29996, None);
        assert!(result.is_err());
    }
}
