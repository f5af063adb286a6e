use std::process::{Command, Stdio};
use tracing::debug;

/// Run `command` through `sh -c` and return its trimmed standard output.
///
/// Any failure yields `default` instead: the shell cannot be spawned, the
/// command exits non-zero, it writes anything to standard error, or it
/// prints nothing. Nothing is propagated to the caller.
pub fn safe_local(command: &str, default: &str) -> String {
    let output = match Command::new("sh")
        .arg("-c")
        .arg(command)
        .stdin(Stdio::null())
        .output()
    {
        Ok(output) => output,
        Err(e) => {
            debug!(command, error = %e, "local command could not start, using default");
            return default.to_string();
        }
    };

    if !output.status.success() {
        debug!(command, status = %output.status, "local command failed, using default");
        return default.to_string();
    }

    if !output.stderr.is_empty() {
        debug!(command, "local command wrote to stderr, using default");
        return default.to_string();
    }

    let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if stdout.is_empty() {
        return default.to_string();
    }
    stdout
}
