// src/exec/privilege.rs

//! Running server commands under the server's own account.

use anyhow::Result;
use tokio::process::Command;

#[cfg(unix)]
pub use unix::{Credentials, is_privileged, lookup_user};

/// Make `cmd` run as `user`.
///
/// Only a root daemon can switch identity; otherwise the command keeps the
/// daemon's own uid and this is a no-op.
#[cfg(unix)]
pub fn run_as(cmd: &mut Command, user: &str) -> Result<()> {
    if !is_privileged() {
        tracing::debug!(user, "daemon is not root; command keeps the daemon's identity");
        return Ok(());
    }

    let creds = lookup_user(user)?;
    cmd.uid(creds.uid)
        .gid(creds.gid)
        .env("HOME", &creds.home)
        .env("USER", user);
    Ok(())
}

#[cfg(not(unix))]
pub fn run_as(_cmd: &mut Command, user: &str) -> Result<()> {
    tracing::debug!(user, "switching user is not supported on this platform");
    Ok(())
}

#[cfg(unix)]
mod unix {
    use std::ffi::{CStr, CString};
    use std::path::PathBuf;

    use anyhow::{Context, Result, bail};

    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct Credentials {
        pub uid: u32,
        pub gid: u32,
        pub home: PathBuf,
    }

    pub fn is_privileged() -> bool {
        // SAFETY: geteuid has no preconditions and cannot fail.
        unsafe { libc::geteuid() == 0 }
    }

    /// Resolve a user name through the system password database.
    pub fn lookup_user(name: &str) -> Result<Credentials> {
        let c_name = CString::new(name).context("user name contains a NUL byte")?;

        // SAFETY: all-zero is a valid bit pattern for `passwd` (null pointers, zero ids).
        let mut pwd: libc::passwd = unsafe { std::mem::zeroed() };
        let mut buf = vec![0 as libc::c_char; 16 * 1024];
        let mut result: *mut libc::passwd = std::ptr::null_mut();

        // SAFETY: every pointer references live, correctly sized storage owned
        // by this frame; getpwnam_r writes strings only into `buf`.
        let rc = unsafe {
            libc::getpwnam_r(
                c_name.as_ptr(),
                &mut pwd,
                buf.as_mut_ptr(),
                buf.len(),
                &mut result,
            )
        };

        if rc != 0 {
            bail!(
                "looking up user '{name}': {}",
                std::io::Error::from_raw_os_error(rc)
            );
        }
        if result.is_null() {
            bail!("user '{name}' does not exist");
        }

        let home = if pwd.pw_dir.is_null() {
            PathBuf::from("/")
        } else {
            // SAFETY: pw_dir points into `buf`, NUL-terminated by getpwnam_r.
            let dir = unsafe { CStr::from_ptr(pwd.pw_dir) };
            PathBuf::from(dir.to_string_lossy().into_owned())
        };

        Ok(Credentials {
            uid: pwd.pw_uid,
            gid: pwd.pw_gid,
            home,
        })
    }
}
