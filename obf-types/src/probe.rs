//! The `AntiDebug` context's runtime probe (spec.md §4.3). The original
//! reads a byte out of the process environment block on Windows; we read
//! the portable equivalent signal on the platforms Rust actually runs on:
//! `TracerPid` in `/proc/self/status` on Linux. Anywhere else the probe
//! always reports "not being debugged" — the context still obfuscates
//! correctly, it just never triggers its corrupting branch.
//!
//! `disable-anti-debug-probe` pins the probe to "never debugged", useful
//! for running the test suite itself under a debugger/profiler without
//! every anti-debug-context assertion tripping.

/// `true` if the current process appears to be traced.
pub fn being_debugged() -> bool {
    if cfg!(feature = "disable-anti-debug-probe") {
        return false;
    }
    #[cfg(all(target_os = "linux", feature = "anti-debug"))]
    {
        linux_tracer_pid_nonzero()
    }
    #[cfg(not(all(target_os = "linux", feature = "anti-debug")))]
    {
        false
    }
}

#[cfg(all(target_os = "linux", feature = "anti-debug"))]
fn linux_tracer_pid_nonzero() -> bool {
    use std::fs;
    let Ok(status) = fs::read_to_string("/proc/self/status") else {
        return false;
    };
    for line in status.lines() {
        if let Some(rest) = line.strip_prefix("TracerPid:") {
            return rest.trim().parse::<u32>().unwrap_or(0) != 0;
        }
    }
    false
}
