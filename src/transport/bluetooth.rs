//! # Bluetooth RFCOMM Transport
//!
//! Talks to a paired Phomemo printer over Bluetooth Serial Port Profile
//! via an RFCOMM socket on the Linux kernel Bluetooth stack.
//!
//! ## Connection Handshake
//!
//! An RFCOMM connect completes asynchronously: the kernel reports
//! `EINPROGRESS` and finishes the link setup in the background. [`open`]
//! bridges that into a synchronous call with a bounded poll loop that
//! returns on the success signal, the error signal, or the timeout,
//! whichever comes first.
//!
//! After the channel opens, the printer needs a moment before it accepts
//! data; writing immediately drops the first bytes of the speed frame and
//! garbles the label. A fixed [`SETTLE_DELAY`] covers this.
//!
//! ## Pairing Setup (Linux)
//!
//! The printer must already be paired:
//!
//! ```bash
//! $ bluetoothctl
//! [bluetooth]# scan on
//! # Look for the model name, e.g. "M220-1234"
//! [bluetooth]# pair AA:BB:CC:DD:EE:FF
//! ```
//!
//! No `rfcomm bind` is needed; the socket connects straight to the
//! address on SPP channel 1.

use std::time::Duration;

use crate::error::PhomemoError;
use crate::uri::BdAddr;

/// SPP channel used by all known Phomemo models
pub const RFCOMM_CHANNEL: u8 = 1;

/// Delay after a successful open before the first write
pub const SETTLE_DELAY: Duration = Duration::from_millis(500);

/// Poll tick while waiting for the connect to complete
const POLL_INTERVAL_MS: i32 = 100;

/// How long to wait for the end-of-job status reply
const STATUS_TIMEOUT: Duration = Duration::from_secs(8);

/// Size of the printer's end-of-job status reply
const STATUS_REPLY_LEN: usize = 28;

/// # Bluetooth Printer Transport
///
/// Owns one RFCOMM socket for the duration of a job. Closed on drop and
/// on every error path.
pub struct BluetoothTransport {
    #[cfg(target_os = "linux")]
    fd: Option<i32>,
    #[cfg(not(target_os = "linux"))]
    _unsupported: (),
}

#[cfg(target_os = "linux")]
mod sys {
    /// From `<bluetooth/bluetooth.h>`; not exposed by the libc crate.
    pub const BTPROTO_RFCOMM: libc::c_int = 3;

    /// `struct sockaddr_rc` from `<bluetooth/rfcomm.h>`.
    ///
    /// `rc_bdaddr` is a kernel `bdaddr_t`: least significant byte first,
    /// i.e. the reverse of the display order.
    #[repr(C)]
    pub struct SockaddrRc {
        pub rc_family: libc::sa_family_t,
        pub rc_bdaddr: [u8; 6],
        pub rc_channel: u8,
    }
}

#[cfg(target_os = "linux")]
impl BluetoothTransport {
    /// Connect to `addr` on the SPP channel, blocking for at most
    /// `timeout`.
    ///
    /// ## Errors
    ///
    /// - [`PhomemoError::ConnectionTimeout`] if the link does not come up
    ///   within the bound
    /// - [`PhomemoError::DeviceNotFound`] if the address is unreachable
    /// - [`PhomemoError::PermissionDenied`] if the OS blocks the socket
    pub fn open(addr: &BdAddr, timeout: Duration) -> Result<Self, PhomemoError> {
        let fd = unsafe {
            libc::socket(
                libc::AF_BLUETOOTH,
                libc::SOCK_STREAM | libc::SOCK_CLOEXEC,
                sys::BTPROTO_RFCOMM,
            )
        };
        if fd < 0 {
            return Err(map_connect_errno(errno(), addr));
        }

        let mut transport = Self { fd: Some(fd) };
        transport.connect_with_timeout(fd, addr, timeout)?;

        // Let the link settle before the first frame.
        std::thread::sleep(SETTLE_DELAY);
        Ok(transport)
    }

    /// Non-blocking connect bridged to a bounded poll loop.
    fn connect_with_timeout(
        &mut self,
        fd: i32,
        addr: &BdAddr,
        timeout: Duration,
    ) -> Result<(), PhomemoError> {
        set_nonblocking(fd, true)?;

        let sockaddr = sys::SockaddrRc {
            rc_family: libc::AF_BLUETOOTH as libc::sa_family_t,
            rc_bdaddr: addr.socket_bytes(),
            rc_channel: RFCOMM_CHANNEL,
        };

        let rc = unsafe {
            libc::connect(
                fd,
                &sockaddr as *const sys::SockaddrRc as *const libc::sockaddr,
                std::mem::size_of::<sys::SockaddrRc>() as libc::socklen_t,
            )
        };

        if rc != 0 {
            let e = errno();
            if e != libc::EINPROGRESS && e != libc::EAGAIN {
                self.close();
                return Err(map_connect_errno(e, addr));
            }

            // Wait for the completion signal from the kernel.
            let deadline = std::time::Instant::now() + timeout;
            loop {
                let mut pollfd = libc::pollfd {
                    fd,
                    events: libc::POLLOUT,
                    revents: 0,
                };
                let rc = unsafe { libc::poll(&mut pollfd, 1, POLL_INTERVAL_MS) };
                if rc < 0 {
                    let e = errno();
                    if e == libc::EINTR {
                        continue;
                    }
                    self.close();
                    return Err(map_connect_errno(e, addr));
                }

                if rc > 0 && pollfd.revents & (libc::POLLOUT | libc::POLLERR | libc::POLLHUP) != 0 {
                    // Completion signal arrived; SO_ERROR says which kind.
                    match socket_error(fd) {
                        0 => break,
                        e => {
                            self.close();
                            return Err(map_connect_errno(e, addr));
                        }
                    }
                }

                if std::time::Instant::now() >= deadline {
                    self.close();
                    return Err(PhomemoError::ConnectionTimeout(timeout));
                }
            }
        }

        set_nonblocking(fd, false)?;
        Ok(())
    }

    /// Write one chunk to the channel.
    pub fn write(&mut self, data: &[u8]) -> Result<(), PhomemoError> {
        let fd = self
            .fd
            .ok_or_else(|| PhomemoError::WriteFailure("channel is closed".to_string()))?;

        let mut written = 0;
        while written < data.len() {
            let rc = unsafe {
                libc::write(
                    fd,
                    data[written..].as_ptr() as *const libc::c_void,
                    data.len() - written,
                )
            };
            if rc < 0 {
                let e = errno();
                if e == libc::EINTR {
                    continue;
                }
                return Err(PhomemoError::WriteFailure(format!(
                    "RFCOMM write: {}",
                    std::io::Error::from_raw_os_error(e)
                )));
            }
            written += rc as usize;
        }
        Ok(())
    }

    /// Poll for the printer's end-of-job status reply.
    ///
    /// Returns `Ok(None)` if nothing arrives before [`STATUS_TIMEOUT`];
    /// the reply is informational and a silent printer is not an error.
    pub fn read_status(&mut self) -> Result<Option<Vec<u8>>, PhomemoError> {
        let Some(fd) = self.fd else {
            return Ok(None);
        };

        let deadline = std::time::Instant::now() + STATUS_TIMEOUT;
        loop {
            let mut pollfd = libc::pollfd {
                fd,
                events: libc::POLLIN,
                revents: 0,
            };
            let rc = unsafe { libc::poll(&mut pollfd, 1, POLL_INTERVAL_MS) };
            if rc < 0 {
                let e = errno();
                if e == libc::EINTR {
                    continue;
                }
                return Err(std::io::Error::from_raw_os_error(e).into());
            }

            if rc > 0 && pollfd.revents & libc::POLLIN != 0 {
                let mut buf = [0u8; STATUS_REPLY_LEN];
                let n = unsafe {
                    libc::read(fd, buf.as_mut_ptr() as *mut libc::c_void, buf.len())
                };
                if n < 0 {
                    return Err(std::io::Error::from_raw_os_error(errno()).into());
                }
                return Ok(Some(buf[..n as usize].to_vec()));
            }

            if std::time::Instant::now() >= deadline {
                return Ok(None);
            }
        }
    }

    /// Close the socket. Idempotent; safe after a failed open.
    pub fn close(&mut self) {
        if let Some(fd) = self.fd.take() {
            unsafe { libc::close(fd) };
        }
    }
}

#[cfg(not(target_os = "linux"))]
impl BluetoothTransport {
    pub fn open(_addr: &BdAddr, _timeout: Duration) -> Result<Self, PhomemoError> {
        Err(PhomemoError::DeviceNotFound(
            "Bluetooth RFCOMM is only supported on Linux".to_string(),
        ))
    }

    pub fn write(&mut self, _data: &[u8]) -> Result<(), PhomemoError> {
        Err(PhomemoError::WriteFailure("no open socket".to_string()))
    }

    pub fn read_status(&mut self) -> Result<Option<Vec<u8>>, PhomemoError> {
        Ok(None)
    }

    pub fn close(&mut self) {}
}

impl Drop for BluetoothTransport {
    fn drop(&mut self) {
        self.close();
    }
}

// ============================================================================
// ERRNO PLUMBING
// ============================================================================

#[cfg(target_os = "linux")]
fn errno() -> libc::c_int {
    std::io::Error::last_os_error().raw_os_error().unwrap_or(0)
}

#[cfg(target_os = "linux")]
fn set_nonblocking(fd: i32, nonblocking: bool) -> Result<(), PhomemoError> {
    let flags = unsafe { libc::fcntl(fd, libc::F_GETFL) };
    if flags < 0 {
        return Err(std::io::Error::last_os_error().into());
    }
    let flags = if nonblocking {
        flags | libc::O_NONBLOCK
    } else {
        flags & !libc::O_NONBLOCK
    };
    if unsafe { libc::fcntl(fd, libc::F_SETFL, flags) } < 0 {
        return Err(std::io::Error::last_os_error().into());
    }
    Ok(())
}

/// Read and clear the pending socket error (the error signal of an
/// asynchronous connect).
#[cfg(target_os = "linux")]
fn socket_error(fd: i32) -> libc::c_int {
    let mut err: libc::c_int = 0;
    let mut len = std::mem::size_of::<libc::c_int>() as libc::socklen_t;
    let rc = unsafe {
        libc::getsockopt(
            fd,
            libc::SOL_SOCKET,
            libc::SO_ERROR,
            &mut err as *mut libc::c_int as *mut libc::c_void,
            &mut len,
        )
    };
    if rc != 0 { errno() } else { err }
}

/// Map a connect-time errno onto the transport error taxonomy.
#[cfg(target_os = "linux")]
fn map_connect_errno(e: libc::c_int, addr: &BdAddr) -> PhomemoError {
    match e {
        libc::EACCES | libc::EPERM => {
            PhomemoError::PermissionDenied(format!("RFCOMM socket to {}", addr))
        }
        libc::ETIMEDOUT => PhomemoError::ConnectionTimeout(super::OPEN_TIMEOUT),
        libc::ECONNREFUSED | libc::EHOSTDOWN | libc::EHOSTUNREACH | libc::ENODEV
        | libc::EADDRNOTAVAIL => {
            PhomemoError::DeviceNotFound(format!("Bluetooth device {}", addr))
        }
        other => PhomemoError::WriteFailure(format!(
            "RFCOMM connect to {}: {}",
            addr,
            std::io::Error::from_raw_os_error(other)
        )),
    }
}

// ============================================================================
// TESTS
// ============================================================================
