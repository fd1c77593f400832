//! Windows implementations of platform helpers.
//!
//! Notes:
//! - The stop event is a native manual-reset event object.
//! - `SetConsoleCtrlHandler` callbacks carry no user data, so the registered
//!   handler lives in a once-initialized slot read only by the callback.
//! - The console runs each control callback on a new thread it creates.

use std::ffi::OsString;
use std::fs::{File, OpenOptions};
use std::io;
use std::os::windows::ffi::OsStringExt;
use std::path::{Path, PathBuf};
use std::ptr;
use std::sync::OnceLock;
use std::time::Duration;

use tracing::debug;
use windows_sys::Win32::Foundation::{
    CloseHandle, HANDLE, INVALID_HANDLE_VALUE, WAIT_OBJECT_0, WAIT_TIMEOUT,
};
use windows_sys::Win32::Storage::FileSystem::{
    FILE_NAME_NORMALIZED, FILE_TYPE_CHAR, FILE_TYPE_DISK, FILE_TYPE_PIPE, FILE_TYPE_REMOTE,
    FILE_TYPE_UNKNOWN, GetFileType, GetFinalPathNameByHandleW,
};
use windows_sys::Win32::System::Console::{
    CTRL_BREAK_EVENT, CTRL_C_EVENT, CTRL_CLOSE_EVENT, CTRL_LOGOFF_EVENT, CTRL_SHUTDOWN_EVENT,
    GetStdHandle, STD_ERROR_HANDLE, STD_INPUT_HANDLE, STD_OUTPUT_HANDLE, SetConsoleCtrlHandler,
};
use windows_sys::Win32::System::Threading::{CreateEventW, INFINITE, SetEvent, WaitForSingleObject};
use windows_sys::core::BOOL;

use crate::handler::{Disposition, NotificationHandler, NotificationKind};
use crate::inspect::{StdStream, StreamClass, StreamInfo};

/// Raw console control codes for each recognized kind.
pub const NOTIFICATION_CODES: &[(NotificationKind, u32)] = &[
    (NotificationKind::Interrupt, CTRL_C_EVENT),
    (NotificationKind::Break, CTRL_BREAK_EVENT),
    (NotificationKind::Close, CTRL_CLOSE_EVENT),
    (NotificationKind::Logoff, CTRL_LOGOFF_EVENT),
    (NotificationKind::Shutdown, CTRL_SHUTDOWN_EVENT),
];

const E_FAIL: i32 = 0x8000_4005_u32 as i32;

static HANDLER: OnceLock<NotificationHandler> = OnceLock::new();

/// Unnamed manual-reset event object.
#[derive(Debug)]
pub struct Event(HANDLE);

// SAFETY: event handles may be used from any thread.
unsafe impl Send for Event {}
// SAFETY: SetEvent and WaitForSingleObject are thread-safe on a shared handle.
unsafe impl Sync for Event {}

impl Event {
    pub fn new() -> io::Result<Self> {
        // SAFETY: default security, manual reset, initially non-signaled, unnamed.
        let handle = unsafe { CreateEventW(ptr::null(), 1, 0, ptr::null()) };
        if handle.is_null() {
            return Err(io::Error::last_os_error());
        }
        Ok(Self(handle))
    }

    pub fn set(&self) -> io::Result<()> {
        // SAFETY: self.0 is a live event handle until drop.
        if unsafe { SetEvent(self.0) } == 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(())
    }

    pub fn wait(&self, timeout: Option<Duration>) -> io::Result<bool> {
        let millis = match timeout {
            None => INFINITE,
            Some(t) => u32::try_from(t.as_millis()).unwrap_or(INFINITE - 1).min(INFINITE - 1),
        };
        // SAFETY: self.0 is a live event handle until drop.
        match unsafe { WaitForSingleObject(self.0, millis) } {
            WAIT_OBJECT_0 => Ok(true),
            WAIT_TIMEOUT => Ok(false),
            _ => Err(io::Error::last_os_error()),
        }
    }
}

impl Drop for Event {
    fn drop(&mut self) {
        // SAFETY: the handle is owned by this value and closed exactly once.
        unsafe {
            CloseHandle(self.0);
        }
    }
}

/// Register `handler` with the console. Only one registration per process.
pub fn register_console_handler(handler: NotificationHandler) -> io::Result<()> {
    HANDLER.set(handler).map_err(|_| {
        io::Error::new(io::ErrorKind::AlreadyExists, "console control handler already registered")
    })?;
    // SAFETY: console_ctrl_handler matches PHANDLER_ROUTINE and lives for the process.
    if unsafe { SetConsoleCtrlHandler(Some(console_ctrl_handler), 1) } == 0 {
        return Err(io::Error::last_os_error());
    }
    debug!("Console control handler registered");
    Ok(())
}

unsafe extern "system" fn console_ctrl_handler(ctrl_type: u32) -> BOOL {
    match HANDLER.get().map(|h| h.handle(ctrl_type)) {
        Some(Disposition::Handled) => 1,
        _ => 0,
    }
}

/// Classify one of the three standard handles.
pub fn inspect_stream(stream: StdStream) -> io::Result<StreamInfo> {
    let id = match stream {
        StdStream::Stdin => STD_INPUT_HANDLE,
        StdStream::Stdout => STD_OUTPUT_HANDLE,
        StdStream::Stderr => STD_ERROR_HANDLE,
    };
    // SAFETY: GetStdHandle has no preconditions.
    let handle = unsafe { GetStdHandle(id) };
    if handle == INVALID_HANDLE_VALUE {
        return Err(io::Error::last_os_error());
    }
    if handle.is_null() {
        return Err(io::Error::new(io::ErrorKind::NotFound, "no standard handle attached"));
    }
    // SAFETY: handle is a valid standard handle.
    let file_type = unsafe { GetFileType(handle) };
    if file_type == FILE_TYPE_UNKNOWN {
        let err = io::Error::last_os_error();
        if err.raw_os_error().unwrap_or(0) != 0 {
            return Err(err);
        }
    }
    let class = match file_type {
        FILE_TYPE_CHAR => StreamClass::Terminal,
        FILE_TYPE_DISK => StreamClass::Disk,
        FILE_TYPE_PIPE => StreamClass::Pipe,
        FILE_TYPE_REMOTE => StreamClass::Remote,
        _ => StreamClass::Unknown,
    };
    let name = if class == StreamClass::Disk { final_path(handle) } else { None };
    Ok(StreamInfo { stream, class, name })
}

fn final_path(handle: HANDLE) -> Option<PathBuf> {
    let mut buf: Vec<u16> = vec![0; 260];
    loop {
        let cap = u32::try_from(buf.len()).ok()?;
        // SAFETY: buf has `cap` writable u16 slots.
        let len = unsafe { GetFinalPathNameByHandleW(handle, buf.as_mut_ptr(), cap, FILE_NAME_NORMALIZED) };
        if len == 0 {
            return None;
        }
        let len = len as usize;
        if len < buf.len() {
            buf.truncate(len);
            return Some(PathBuf::from(OsString::from_wide(&buf)));
        }
        buf.resize(len + 1, 0);
    }
}

/// Open log file for appending (best-effort; no ACL management on Windows).
pub fn open_log_file_secure_append(path: &Path) -> io::Result<File> {
    OpenOptions::new().create(true).append(true).open(path)
}

/// HRESULT_FROM_WIN32 of the last error, or E_FAIL when there is none.
pub fn os_error_code(err: &io::Error) -> i32 {
    err.raw_os_error().map(hresult_from_win32).filter(|code| *code != 0).unwrap_or(E_FAIL)
}

fn hresult_from_win32(code: i32) -> i32 {
    if code <= 0 {
        code
    } else {
        ((code as u32 & 0xFFFF) | (7 << 16) | 0x8000_0000) as i32
    }
}
