//! Round ownership across processes sharing one store file.
//!
//! A chat marked `running` records the pid of the process driving the
//! round. Startup recovery only resets chats whose recorded process is gone.

/// Owner marker for rounds started by this process.
pub fn current() -> u32 {
    std::process::id()
}

/// Whether the process recorded as a round holder still exists.
#[cfg(unix)]
pub fn is_alive(pid: u32) -> bool {
    use nix::errno::Errno;
    use nix::sys::signal::kill;
    use nix::unistd::Pid;

    if pid == current() {
        return true;
    }
    let Ok(raw) = i32::try_from(pid) else {
        return false;
    };
    if raw <= 0 {
        return false;
    }
    // EPERM still means the process exists.
    !matches!(kill(Pid::from_raw(raw), None), Err(Errno::ESRCH))
}

#[cfg(not(unix))]
pub fn is_alive(pid: u32) -> bool {
    pid == current()
}
