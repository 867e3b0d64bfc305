//! Credential resolution: direct arguments → config file → interactive prompt.
//!
//! The config file is plain text, one `key=value` pair per line, with keys
//! drawn from `username`, `password`, `group` and `site` (case-insensitive,
//! order irrelevant):
//!
//! ```text
//! username=alice
//! password=hunter2
//! site=hpc.example.edu
//! ```
//!
//! Parsing ([`PartialCredentials::parse`]) is a pure function; all prompting
//! lives in [`prompt_missing`] so the two can be tested and composed
//! separately. [`CredentialStore::resolve`] wires them together and persists
//! the result the first time a complete set is assembled.

use crate::error::ScripterError;
use std::fmt;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Relative location of the default config file under the home directory.
const DEFAULT_CONFIG: &str = ".hpc-scripter/config";

/// A fully resolved credential set.
///
/// The password is private and redacted from `Debug` output; it is only
/// reachable through [`Credentials::password`] and only ever rendered into
/// the generated script's authentication step.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    password: String,
    pub group: Option<String>,
    pub site: String,
}

impl Credentials {
    pub fn new(
        username: impl Into<String>,
        password: impl Into<String>,
        group: Option<String>,
        site: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            group,
            site: site.into(),
        }
    }

    /// The secret. Handle with care: never log it.
    pub fn password(&self) -> &str {
        &self.password
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("group", &self.group)
            .field("site", &self.site)
            .finish()
    }
}

/// A credential set with any number of fields still missing.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct PartialCredentials {
    pub username: Option<String>,
    pub password: Option<String>,
    pub group: Option<String>,
    pub site: Option<String>,
}

impl PartialCredentials {
    /// Parse config-file content. Unknown lines are ignored; keys match
    /// case-insensitively; values are split on the first `=` so they may
    /// themselves contain `=`.
    pub fn parse(content: &str) -> Self {
        let mut partial = Self::default();
        for line in content.lines() {
            let Some((key, value)) = line.split_once('=') else {
                continue;
            };
            let value = value.trim();
            if value.is_empty() {
                continue;
            }
            match key.trim().to_lowercase().as_str() {
                "username" => partial.username = Some(value.to_string()),
                "password" => partial.password = Some(value.to_string()),
                "group" => partial.group = Some(value.to_string()),
                "site" => partial.site = Some(value.to_string()),
                _ => {}
            }
        }
        partial
    }

    /// Fill any gaps in `self` from `fallback`. `self` wins where both are set.
    pub fn or(self, fallback: Self) -> Self {
        Self {
            username: self.username.or(fallback.username),
            password: self.password.or(fallback.password),
            group: self.group.or(fallback.group),
            site: self.site.or(fallback.site),
        }
    }

    /// Convert into a complete set, or hand the partial back if username,
    /// password or site is still missing. Group stays optional.
    pub fn into_credentials(self) -> Result<Credentials, Self> {
        match self {
            Self {
                username: Some(username),
                password: Some(password),
                group,
                site: Some(site),
            } => Ok(Credentials {
                username,
                password,
                group,
                site,
            }),
            partial => Err(partial),
        }
    }
}

impl fmt::Debug for PartialCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PartialCredentials")
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("group", &self.group)
            .field("site", &self.site)
            .finish()
    }
}

/// Owns the config path and the resolve/persist logic around it.
#[derive(Debug)]
pub struct CredentialStore {
    path: PathBuf,
}

impl CredentialStore {
    /// Create a store for `path`, defaulting to `~/.hpc-scripter/config`.
    ///
    /// A leading `~` in a caller-supplied path is expanded against the home
    /// directory; a `~` anywhere else fails with
    /// [`ScripterError::ConfigPath`].
    pub fn new(path: Option<PathBuf>) -> Result<Self, ScripterError> {
        let path = match path {
            Some(p) => expand_home(p)?,
            None => home_dir()?.join(DEFAULT_CONFIG),
        };
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read whatever the config file holds; an empty partial if it is absent.
    pub fn load(&self) -> Result<PartialCredentials, ScripterError> {
        if !self.path.exists() {
            return Ok(PartialCredentials::default());
        }
        let content = fs::read_to_string(&self.path)?;
        Ok(PartialCredentials::parse(&content))
    }

    /// Write the full credential set back, creating parent directories as
    /// needed. Group is omitted when absent.
    pub fn save(&self, credentials: &Credentials) -> Result<(), ScripterError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut content = format!(
            "username={}\npassword={}\nsite={}\n",
            credentials.username,
            credentials.password,
            credentials.site
        );
        if let Some(group) = &credentials.group {
            content.push_str(&format!("group={group}\n"));
        }
        fs::write(&self.path, content)?;
        info!("wrote credentials to {}", self.path.display());
        Ok(())
    }

    /// One-shot resolution: `seed` (direct arguments) takes precedence, the
    /// config file fills gaps, interactive prompting fills the rest.
    ///
    /// With `headless` set, any remaining gap is
    /// [`ScripterError::MissingCredentials`] instead of a prompt. If the
    /// config file did not exist beforehand, the resolved set is written
    /// back eagerly.
    pub fn resolve(
        &self,
        seed: PartialCredentials,
        headless: bool,
    ) -> Result<Credentials, ScripterError> {
        let existed = self.path.exists();
        let merged = seed.or(self.load()?);
        let credentials = match merged.into_credentials() {
            Ok(credentials) => credentials,
            Err(_) if headless => {
                return Err(ScripterError::MissingCredentials(self.path.clone()));
            }
            Err(partial) => {
                if !existed {
                    warn!("config not found at {}, gathering credentials", self.path.display());
                }
                prompt_missing(partial)?
            }
        };
        if !existed {
            self.save(&credentials)?;
        }
        Ok(credentials)
    }

    /// Re-prompt for the username and rewrite the config file.
    pub fn reset_username(&self, credentials: &mut Credentials) -> Result<(), ScripterError> {
        credentials.username = prompt_username()?;
        self.save(credentials)
    }

    /// Re-prompt for the password and rewrite the config file.
    pub fn reset_password(&self, credentials: &mut Credentials) -> Result<(), ScripterError> {
        credentials.password = rpassword::prompt_password("Password: ")?;
        self.save(credentials)
    }
}

/// Interactively fill whatever `partial` is missing and return the complete
/// set. Username entry gets a confirmation round-trip; the password prompt is
/// masked; group may be skipped with an empty answer.
pub fn prompt_missing(partial: PartialCredentials) -> Result<Credentials, ScripterError> {
    println!("Collecting your cluster login information to speed up future interactions:");
    let username = match partial.username {
        Some(username) => username,
        None => prompt_username()?,
    };
    let password = match partial.password {
        Some(password) => password,
        None => rpassword::prompt_password("Password: ")?,
    };
    let group = match partial.group {
        Some(group) => Some(group),
        None => {
            let answer =
                prompt_line("Group for permission changes (numeric for sftp), or enter to skip: ")?;
            (!answer.is_empty()).then_some(answer)
        }
    };
    let site = match partial.site {
        Some(site) => site,
        None => prompt_line("Site to reach: ")?,
    };
    Ok(Credentials::new(username, password, group, site))
}

fn prompt_username() -> Result<String, ScripterError> {
    loop {
        let username = prompt_line("Username: ")?;
        println!("The username you entered is: {username}");
        let answer = prompt_line("Is this correct? (Y/n) ")?;
        if !answer.eq_ignore_ascii_case("n") {
            return Ok(username);
        }
    }
}

fn prompt_line(message: &str) -> Result<String, ScripterError> {
    print!("{message}");
    io::stdout().flush()?;
    let mut answer = String::new();
    io::stdin().read_line(&mut answer)?;
    Ok(answer.trim().to_string())
}

fn home_dir() -> Result<PathBuf, ScripterError> {
    dirs::home_dir().ok_or(ScripterError::NoHomeDirectory)
}

/// Expand a leading `~` component; reject `~` anywhere else.
fn expand_home(path: PathBuf) -> Result<PathBuf, ScripterError> {
    let mut components = path.components();
    let leading_tilde = components
        .next()
        .is_some_and(|c| c.as_os_str() == "~");
    if components.any(|c| c.as_os_str() == "~") {
        return Err(ScripterError::ConfigPath(path));
    }
    if !leading_tilde {
        return Ok(path);
    }
    let rest: PathBuf = path.components().skip(1).collect();
    Ok(home_dir()?.join(rest))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_basic() {
        let partial = PartialCredentials::parse("username=alice\npassword=secret\n");
        assert_eq!(partial.username.as_deref(), Some("alice"));
        assert_eq!(partial.password.as_deref(), Some("secret"));
        assert_eq!(partial.group, None);
        assert_eq!(partial.site, None);
    }

    #[test]
    fn test_parse_case_insensitive_keys() {
        let partial = PartialCredentials::parse("USERNAME=alice\nSite=hpc.example.edu\n");
        assert_eq!(partial.username.as_deref(), Some("alice"));
        assert_eq!(partial.site.as_deref(), Some("hpc.example.edu"));
    }

    #[test]
    fn test_parse_value_keeps_embedded_equals() {
        let partial = PartialCredentials::parse("password=a=b=c\n");
        assert_eq!(partial.password.as_deref(), Some("a=b=c"));
    }

    #[test]
    fn test_parse_ignores_unknown_lines() {
        let partial = PartialCredentials::parse("# comment\nusername=alice\ncolor=blue\n\n");
        assert_eq!(partial.username.as_deref(), Some("alice"));
        assert_eq!(partial.group, None);
    }

    #[test]
    fn test_or_prefers_seed() {
        let seed = PartialCredentials {
            username: Some("bob".into()),
            ..Default::default()
        };
        let file = PartialCredentials {
            username: Some("alice".into()),
            password: Some("secret".into()),
            ..Default::default()
        };
        let merged = seed.or(file);
        assert_eq!(merged.username.as_deref(), Some("bob"));
        assert_eq!(merged.password.as_deref(), Some("secret"));
    }

    #[test]
    fn test_into_credentials_requires_site() {
        let partial = PartialCredentials::parse("username=alice\npassword=secret\n");
        assert!(partial.into_credentials().is_err());
    }

    #[test]
    fn test_expand_home_leading() {
        let expanded = expand_home(PathBuf::from("~/conf/creds.txt")).unwrap();
        assert!(expanded.ends_with("conf/creds.txt"));
        assert!(!expanded.to_string_lossy().contains('~'));
    }

    #[test]
    fn test_expand_home_rejects_non_leading_tilde() {
        let err = expand_home(PathBuf::from("/data/~/creds.txt")).unwrap_err();
        assert!(matches!(err, ScripterError::ConfigPath(_)));
    }

    #[test]
    fn test_expand_home_passthrough() {
        let path = PathBuf::from("/etc/hpc/creds.txt");
        assert_eq!(expand_home(path.clone()).unwrap(), path);
    }

    #[test]
    fn test_resolve_from_file_without_prompting() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config");
        fs::write(&path, "username=alice\npassword=secret\nsite=hpc.example.edu\n").unwrap();

        let store = CredentialStore::new(Some(path)).unwrap();
        let credentials = store.resolve(PartialCredentials::default(), true).unwrap();
        assert_eq!(credentials.username, "alice");
        assert_eq!(credentials.password(), "secret");
        assert_eq!(credentials.site, "hpc.example.edu");
    }

    #[test]
    fn test_resolve_headless_missing_config_fails() {
        let dir = tempfile::tempdir().unwrap();
        let store = CredentialStore::new(Some(dir.path().join("absent"))).unwrap();
        let err = store.resolve(PartialCredentials::default(), true).unwrap_err();
        assert!(matches!(err, ScripterError::MissingCredentials(_)));
    }

    #[test]
    fn test_resolve_writes_back_new_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/dir/config");
        let store = CredentialStore::new(Some(path.clone())).unwrap();

        let seed = PartialCredentials {
            username: Some("alice".into()),
            password: Some("secret".into()),
            group: Some("100".into()),
            site: Some("hpc.example.edu".into()),
        };
        store.resolve(seed, true).unwrap();

        let written = fs::read_to_string(&path).unwrap();
        assert!(written.contains("username=alice"));
        assert!(written.contains("password=secret"));
        assert!(written.contains("site=hpc.example.edu"));
        assert!(written.contains("group=100"));
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = CredentialStore::new(Some(dir.path().join("config"))).unwrap();
        let credentials =
            Credentials::new("alice", "secret", None, "hpc.example.edu");
        store.save(&credentials).unwrap();

        let loaded = store.load().unwrap();
        assert_eq!(loaded.username.as_deref(), Some("alice"));
        assert_eq!(loaded.group, None);
    }

    #[test]
    fn test_debug_redacts_password() {
        let credentials = Credentials::new("alice", "secret", None, "site");
        let debug = format!("{credentials:?}");
        assert!(!debug.contains("secret"));
        assert!(debug.contains("<redacted>"));
    }
}
