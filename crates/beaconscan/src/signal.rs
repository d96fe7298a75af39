//! Interrupt handling
//!
//! SIGINT sets a process-wide flag and nothing else. The handler is installed
//! without `SA_RESTART`, so a blocked `read` on the HCI socket fails with
//! `EINTR` and the frame reader gets to see the flag.

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::{mem, ptr};

/// Set once SIGINT has been received. Never reset.
pub static SHUTDOWN: AtomicBool = AtomicBool::new(false);

extern "C" fn on_sigint(_sig: libc::c_int) {
    SHUTDOWN.store(true, Ordering::SeqCst);
}

/// Route SIGINT to the shutdown flag
pub fn install_interrupt_handler() -> io::Result<()> {
    let result = unsafe {
        let mut sa: libc::sigaction = mem::zeroed();
        sa.sa_sigaction = on_sigint as extern "C" fn(libc::c_int) as usize;
        sa.sa_flags = libc::SA_NOCLDSTOP;
        libc::sigemptyset(&mut sa.sa_mask);
        libc::sigaction(libc::SIGINT, &sa, ptr::null_mut())
    };

    if result < 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}

/// Whether an interrupt has asked the scan to stop
pub fn shutdown_requested() -> bool {
    SHUTDOWN.load(Ordering::SeqCst)
}
