//! Unix implementations of platform helpers.
//!
//! Notes:
//! - The stop event is a self-pipe. `set` writes one byte and nothing ever
//!   drains it, so the read end stays readable forever once set.
//! - Control notifications are the signals SIGINT, SIGQUIT, SIGHUP and
//!   SIGTERM. A signal-hook iterator thread receives them and hands each one
//!   to its own thread, the way the Windows console delivers a control event
//!   on a fresh thread. Logoff has no Unix counterpart.

use std::fs::{self, File, OpenOptions};
use std::io;
use std::mem::MaybeUninit;
use std::os::fd::{AsRawFd, FromRawFd, OwnedFd, RawFd};
use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};

use libc::c_int;
use signal_hook::iterator::Signals;
use signal_hook::low_level::emulate_default_handler;
use tracing::{debug, error, warn};

use crate::handler::{Disposition, NotificationHandler, NotificationKind};
use crate::inspect::{StdStream, StreamClass, StreamInfo};

/// Raw notification codes (signal numbers) for each recognized kind.
pub const NOTIFICATION_CODES: &[(NotificationKind, u32)] = &[
    (NotificationKind::Interrupt, libc::SIGINT as u32),
    (NotificationKind::Break, libc::SIGQUIT as u32),
    (NotificationKind::Close, libc::SIGHUP as u32),
    (NotificationKind::Shutdown, libc::SIGTERM as u32),
];

/// Manual-reset event built on a non-blocking, close-on-exec pipe.
#[derive(Debug)]
pub struct Event {
    read_fd: OwnedFd,
    write_fd: OwnedFd,
}

impl Event {
    /// Allocate a fresh, unset event. Fails with EMFILE/ENFILE when the
    /// process or system is out of descriptors.
    pub fn new() -> io::Result<Self> {
        let mut fds: [c_int; 2] = [-1; 2];
        // SAFETY: `fds` is a valid two-element buffer for pipe(2).
        if unsafe { libc::pipe(fds.as_mut_ptr()) } != 0 {
            return Err(io::Error::last_os_error());
        }
        // SAFETY: pipe(2) succeeded, so both descriptors are open and owned by us.
        let (read_fd, write_fd) = unsafe { (OwnedFd::from_raw_fd(fds[0]), OwnedFd::from_raw_fd(fds[1])) };
        set_nonblocking_cloexec(read_fd.as_raw_fd())?;
        set_nonblocking_cloexec(write_fd.as_raw_fd())?;
        Ok(Self { read_fd, write_fd })
    }

    /// Mark the event as set. A full pipe means it is already set.
    pub fn set(&self) -> io::Result<()> {
        let byte = 1u8;
        loop {
            // SAFETY: writes one byte from a live stack value to an fd we own.
            let n = unsafe { libc::write(self.write_fd.as_raw_fd(), (&raw const byte).cast(), 1) };
            if n >= 0 {
                return Ok(());
            }
            let err = io::Error::last_os_error();
            match err.kind() {
                io::ErrorKind::Interrupted => continue,
                io::ErrorKind::WouldBlock => return Ok(()),
                _ => return Err(err),
            }
        }
    }

    /// Block until the event is set (`Ok(true)`) or `timeout` elapses
    /// (`Ok(false)`). `None` waits forever. EINTR is retried with the
    /// remaining time.
    pub fn wait(&self, timeout: Option<Duration>) -> io::Result<bool> {
        let deadline = timeout.map(|t| Instant::now() + t);
        loop {
            let millis = match deadline {
                None => -1,
                Some(d) => {
                    let left = d.saturating_duration_since(Instant::now());
                    c_int::try_from(left.as_nanos().div_ceil(1_000_000)).unwrap_or(c_int::MAX)
                }
            };
            let mut pfd = libc::pollfd { fd: self.read_fd.as_raw_fd(), events: libc::POLLIN, revents: 0 };
            // SAFETY: `pfd` is a single valid pollfd for the duration of the call.
            let rc = unsafe { libc::poll(&mut pfd, 1, millis) };
            if rc < 0 {
                let err = io::Error::last_os_error();
                if err.kind() == io::ErrorKind::Interrupted {
                    continue;
                }
                return Err(err);
            }
            if rc == 0 {
                return Ok(false);
            }
            if pfd.revents & libc::POLLIN != 0 {
                return Ok(true);
            }
            if pfd.revents & libc::POLLNVAL != 0 {
                return Err(io::Error::from_raw_os_error(libc::EBADF));
            }
            return Err(io::Error::other(format!("stop event poll returned revents {:#x}", pfd.revents)));
        }
    }
}

fn set_nonblocking_cloexec(fd: RawFd) -> io::Result<()> {
    // SAFETY: fcntl on a descriptor we own; flag arguments are plain ints.
    unsafe {
        let fl = libc::fcntl(fd, libc::F_GETFL);
        if fl < 0 || libc::fcntl(fd, libc::F_SETFL, fl | libc::O_NONBLOCK) < 0 {
            return Err(io::Error::last_os_error());
        }
        let fd_flags = libc::fcntl(fd, libc::F_GETFD);
        if fd_flags < 0 || libc::fcntl(fd, libc::F_SETFD, fd_flags | libc::FD_CLOEXEC) < 0 {
            return Err(io::Error::last_os_error());
        }
    }
    Ok(())
}

/// Install the handler for every signal in `NOTIFICATION_CODES`.
///
/// Signal delivery is funneled through a dispatcher thread; each received
/// signal runs the handler on a new thread so a stalled handler never
/// blocks later notifications. Registration lasts for the rest of the process.
pub fn register_console_handler(handler: NotificationHandler) -> io::Result<()> {
    let mut signals = Signals::new(NOTIFICATION_CODES.iter().map(|&(_, code)| code as c_int))?;

    thread::Builder::new().name("ctrl-dispatch".to_string()).spawn(move || {
        for signal in signals.forever() {
            let per_event = handler.clone();
            let spawned = thread::Builder::new()
                .name(format!("ctrl-notify-{signal}"))
                .spawn(move || {
                    deliver(&per_event, signal, true);
                });
            if let Err(e) = spawned {
                // The dispatcher must stay responsive, so no parking here.
                warn!(signal, error = %e, "Could not spawn a notification thread; handling inline");
                deliver(&handler, signal, false);
            }
        }
    })?;

    debug!(codes = ?NOTIFICATION_CODES, "Console control handler registered");
    Ok(())
}

/// Run the handler for one signal. With `may_stall` unset the handler only
/// sets the stop signal and always returns.
///
/// signal-hook replaced the default action, so an unhandled signal is
/// re-raised with its default disposition (usually terminating the process).
fn deliver(handler: &NotificationHandler, signal: c_int, may_stall: bool) -> Disposition {
    let disposition = match u32::try_from(signal) {
        Ok(raw) if may_stall => handler.handle(raw),
        Ok(raw) if handler.signal_stop(raw).is_some() => Disposition::Handled,
        _ => Disposition::NotHandled,
    };
    if disposition == Disposition::NotHandled {
        if let Err(e) = emulate_default_handler(signal) {
            error!(signal, error = %e, "Failed to apply the default action for the signal");
        }
    }
    disposition
}

/// Classify one of the three standard streams.
pub fn inspect_stream(stream: StdStream) -> io::Result<StreamInfo> {
    let fd = stream.fd();
    let mut st = MaybeUninit::<libc::stat>::uninit();
    // SAFETY: fstat writes into `st` only on success.
    if unsafe { libc::fstat(fd, st.as_mut_ptr()) } != 0 {
        return Err(io::Error::last_os_error());
    }
    // SAFETY: fstat returned 0, so `st` is initialized.
    let st = unsafe { st.assume_init() };
    // SAFETY: isatty only inspects the descriptor.
    let is_tty = unsafe { libc::isatty(fd) } == 1;
    Ok(StreamInfo {
        stream,
        class: classify_mode(st.st_mode, is_tty),
        name: descriptor_name(fd),
    })
}

fn classify_mode(mode: libc::mode_t, is_tty: bool) -> StreamClass {
    if is_tty {
        return StreamClass::Terminal;
    }
    match mode & libc::S_IFMT {
        libc::S_IFREG => StreamClass::Disk,
        libc::S_IFIFO => StreamClass::Pipe,
        libc::S_IFSOCK => StreamClass::Remote,
        _ => StreamClass::Unknown,
    }
}

/// Best-effort path behind a descriptor; only resolvable where /proc exists.
fn descriptor_name(fd: RawFd) -> Option<PathBuf> {
    fs::read_link(format!("/proc/self/fd/{fd}")).ok()
}

/// Open log file for appending; set 0600 only when creating a new file.
/// If the file already exists, we preserve its existing permissions.
pub fn open_log_file_secure_append(path: &Path) -> io::Result<File> {
    let existed = path.exists();
    let f = OpenOptions::new()
        .create(true)
        .append(true)
        .mode(0o600) // applies on create
        .open(path)?;
    if !existed {
        let _ = fs::set_permissions(path, fs::Permissions::from_mode(0o600));
    }
    Ok(f)
}

/// errno of the failure, or 1 when the error carries none.
pub fn os_error_code(err: &io::Error) -> i32 {
    err.raw_os_error().filter(|code| *code != 0).unwrap_or(1)
}
