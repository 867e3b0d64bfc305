//! The [`ScripterError`] type covering everything that can fail before a
//! session is handed to `expect`.

use crate::scripter::Mode;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while resolving credentials or building a session script.
///
/// Every variant is raised at the call that detects it and propagates to the
/// caller; nothing is caught or retried internally. Failures of the remote
/// commands themselves are invisible here — they only show up in the
/// interactive session's terminal output.
#[derive(Debug, Error)]
pub enum ScripterError {
    /// An operation was requested in a mode that does not support it, e.g.
    /// `lcd` or a file transfer outside sftp mode.
    #[error("'{op}' is only available in {required} mode (current mode: {current})")]
    UnsupportedOperation {
        op: &'static str,
        required: Mode,
        current: Mode,
    },

    /// A group or permission value that sftp cannot accept. sftp only takes
    /// octal values for `chmod` and numeric ids for `chgrp`.
    #[error("invalid {field} '{value}': numeric values must be used over sftp")]
    NonNumeric { field: &'static str, value: String },

    /// A caller-supplied config path uses `~` somewhere other than the
    /// leading component.
    #[error("config path has '~' in a non-leading position: {0}")]
    ConfigPath(PathBuf),

    /// Headless resolution found no usable credentials and is not allowed to
    /// prompt. The config file should contain `username=`, `password=` and
    /// `site=` lines.
    #[error("missing credentials: no complete config at {0} and prompting is disabled")]
    MissingCredentials(PathBuf),

    #[error("home directory could not be determined")]
    NoHomeDirectory,

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
