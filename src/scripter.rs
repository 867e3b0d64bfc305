//! [`Scripter`] — builds an ordered sequence of [`Step`]s for one sftp/ssh
//! session and hands the serialized script to the external `expect` program.
//!
//! Builder methods only append steps; nothing talks to the network until
//! [`Scripter::run`]. There is no acknowledgement from the remote side: if a
//! queued command fails on the cluster, the only signal is the interactive
//! session's terminal output, which is not captured or parsed here.

use crate::credentials::Credentials;
use crate::error::ScripterError;
use crate::step::Step;
use std::fmt;
use std::path::Path;
use std::process::Command;
use std::str::FromStr;
use tracing::debug;

/// Which remote client the generated script spawns.
///
/// Fixed at construction. The mode determines the default expected prompt,
/// the exit command, and which builders are legal: file transfer and local
/// directory changes only exist over sftp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    #[default]
    Sftp,
    Ssh,
}

impl Mode {
    /// The client program the script spawns.
    pub fn client(&self) -> &'static str {
        match self {
            Mode::Sftp => "sftp",
            Mode::Ssh => "ssh",
        }
    }

    /// The command that cleanly ends a session in this mode.
    pub fn exit_command(&self) -> &'static str {
        match self {
            Mode::Sftp => "quit",
            Mode::Ssh => "exit",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.client())
    }
}

impl FromStr for Mode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sftp" => Ok(Mode::Sftp),
            "ssh" => Ok(Mode::Ssh),
            other => Err(anyhow::anyhow!("unknown mode '{other}' (expected sftp or ssh)")),
        }
    }
}

/// Direction of an sftp file transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferKind {
    Get,
    Put,
}

impl TransferKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransferKind::Get => "get",
            TransferKind::Put => "put",
        }
    }
}

/// A session-script builder owning resolved credentials and an append-only
/// sequence of steps.
///
/// [`run`](Scripter::run) is terminal: it appends the exit command and spawns
/// the session. Steps survive the call, so a second `run` would append a
/// second exit command — call [`clear`](Scripter::clear) first to reuse an
/// instance.
#[derive(Debug)]
pub struct Scripter {
    credentials: Credentials,
    mode: Mode,
    owned_group: Option<String>,
    steps: Vec<Step>,
}

impl Scripter {
    pub fn new(credentials: Credentials, mode: Mode) -> Self {
        let owned_group = credentials.group.clone();
        Self {
            credentials,
            mode,
            owned_group,
            steps: Vec::new(),
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// The prompt waited on before each command unless a step overrides it:
    /// `sftp>` over sftp, the username over ssh.
    pub fn default_prompt(&self) -> &str {
        match self.mode {
            Mode::Sftp => "sftp>",
            Mode::Ssh => &self.credentials.username,
        }
    }

    /// Whether any steps are queued.
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Append one step, using the session's default prompt unless overridden.
    pub fn add_step(&mut self, command: &str, prompt: Option<&str>) {
        let prompt = prompt.unwrap_or_else(|| self.default_prompt()).to_string();
        self.steps.push(Step::new(prompt, command));
    }

    /// Join non-empty parts into one space-delimited command and append it.
    fn command_step(&mut self, parts: &[&str]) {
        let command = parts
            .iter()
            .filter(|part| !part.is_empty())
            .copied()
            .collect::<Vec<_>>()
            .join(" ");
        if !command.is_empty() {
            self.add_step(&command, None);
        }
    }

    /// Queue `pwd`.
    pub fn pwd(&mut self) {
        self.add_step("pwd", None);
    }

    /// Queue a long listing of `path` (default: the current directory).
    pub fn ls(&mut self, path: Option<&str>) {
        self.command_step(&["ls -la", path.unwrap_or(".")]);
    }

    /// Queue a working-directory change. With `local` set, changes the local
    /// directory instead (`lcd`), which only exists over sftp.
    pub fn cwd(&mut self, dir: &str, local: bool) -> Result<(), ScripterError> {
        let cd = if local {
            self.require_sftp("lcd")?;
            "lcd"
        } else {
            "cd"
        };
        self.command_step(&[cd, dir]);
        Ok(())
    }

    /// Queue permission (and optionally group) changes for each file.
    ///
    /// A passed `group` becomes the session's owned group when none is set
    /// yet. Over sftp both the group and the mode must be numeric (`chmod`
    /// takes octal, `chgrp` takes a numeric id).
    ///
    /// Caveat carried over from hard experience: applying this to whole
    /// directories can leave files unreachable on some clusters (permissions
    /// show as question marks). Target individual files where possible.
    pub fn set_permissions(
        &mut self,
        files: &[&str],
        group: Option<&str>,
        mode: &str,
    ) -> Result<(), ScripterError> {
        if self.owned_group.is_none() {
            if let Some(group) = group {
                if !group.is_empty() {
                    self.owned_group = Some(group.to_string());
                }
            }
        }
        if self.mode == Mode::Sftp {
            if let Some(group) = self.owned_group.as_deref() {
                ensure_numeric("group", group)?;
            }
            ensure_numeric("mode", mode)?;
        }
        let group = self.owned_group.clone();
        for file in files {
            self.command_step(&["chmod", mode, file]);
            if let Some(group) = &group {
                self.command_step(&["chgrp", group, file]);
            }
        }
        Ok(())
    }

    /// Queue an sftp transfer. With `outdir`, a directory-change step (`lcd`
    /// when `local`) precedes the transfer step, in that order. Options
    /// render as a single `-abc` flag string; `new_name` appends a rename
    /// target.
    pub fn transfer(
        &mut self,
        kind: TransferKind,
        file: &str,
        outdir: Option<&str>,
        local: bool,
        new_name: Option<&str>,
        options: &[char],
    ) -> Result<(), ScripterError> {
        self.require_sftp(kind.as_str())?;
        if let Some(dir) = outdir {
            self.cwd(dir, local)?;
        }
        let new_name = new_name.unwrap_or("");
        if options.is_empty() {
            self.command_step(&[kind.as_str(), file, new_name]);
        } else {
            let flags = format!("-{}", options.iter().collect::<String>());
            self.command_step(&[kind.as_str(), &flags, file, new_name]);
        }
        Ok(())
    }

    /// Queue a download to the current local directory or `outdir`.
    pub fn get(
        &mut self,
        file: &str,
        outdir: Option<&str>,
        new_name: Option<&str>,
        options: &[char],
    ) -> Result<(), ScripterError> {
        self.transfer(TransferKind::Get, file, outdir, true, new_name, options)
    }

    /// Queue an upload to the current remote directory or `outdir`.
    ///
    /// With `outdir` this produces, in order: `mkdir <outdir>` (the remote
    /// error when it already exists is harmless), `cd <outdir>`, then the
    /// `put`. With `set_permissions`, a permission-fix step for the uploaded
    /// file follows.
    pub fn put(
        &mut self,
        file: &str,
        outdir: Option<&str>,
        new_name: Option<&str>,
        options: &[char],
        set_permissions: bool,
    ) -> Result<(), ScripterError> {
        self.require_sftp("put")?;
        if let Some(dir) = outdir {
            self.add_step(&format!("mkdir {dir}"), None);
        }
        self.transfer(TransferKind::Put, file, outdir, false, new_name, options)?;
        if set_permissions {
            let name = match new_name {
                Some(name) if !name.is_empty() => name.to_string(),
                _ => Path::new(file)
                    .file_name()
                    .map(|name| name.to_string_lossy().into_owned())
                    .unwrap_or_else(|| file.to_string()),
            };
            let target = match outdir {
                Some(dir) => format!("{dir}/{name}"),
                None => name,
            };
            self.set_permissions(&[&target], None, "0664")?;
        }
        Ok(())
    }

    /// Discard all queued steps.
    pub fn clear(&mut self) {
        self.steps.clear();
    }

    /// The queued commands in append order, one readable line per step,
    /// without directive markup. Nothing is executed.
    pub fn preview_steps(&self) -> Vec<String> {
        self.steps
            .iter()
            .map(|step| step.command().to_string())
            .collect()
    }

    /// Serialize the full session script: heredoc boilerplate, the spawn
    /// line, the two fixed authentication steps (password prompt, then the
    /// multi-factor option prompt), every queued step, and the closing
    /// `expect eof`. This exact directive structure is the compatibility
    /// contract with `expect`.
    pub fn script(&self) -> String {
        let mut script = String::from("expect << !\nset timeout -1\nspawn ");
        script.push_str(&format!(
            "{} {}@{}\n",
            self.mode.client(),
            self.credentials.username,
            self.credentials.site
        ));
        let auth = [
            Step::new("Password:", self.credentials.password()),
            Step::new("Passcode or option (1-3):", "1"),
        ];
        for step in auth.iter().chain(&self.steps) {
            script.push_str(&step.render());
        }
        script.push_str("expect eof\n!\n");
        script
    }

    /// Append the mode's exit command and serialize. Split out from
    /// [`run`](Scripter::run) so the final script can be inspected in tests.
    pub fn final_script(&mut self) -> String {
        self.add_step(self.mode.exit_command(), None);
        self.script()
    }

    /// Append the exit command, serialize, and hand the script to the shell.
    ///
    /// Blocks until the spawned interactive session terminates. Remote
    /// command output and exit status are not inspected; only a failure to
    /// spawn the shell itself is an error.
    pub fn run(&mut self) -> Result<(), ScripterError> {
        let script = self.final_script();
        debug!(steps = self.steps.len(), mode = %self.mode, "handing session script to expect");
        Command::new("sh").arg("-c").arg(script).status()?;
        Ok(())
    }

    fn require_sftp(&self, op: &'static str) -> Result<(), ScripterError> {
        if self.mode != Mode::Sftp {
            return Err(ScripterError::UnsupportedOperation {
                op,
                required: Mode::Sftp,
                current: self.mode,
            });
        }
        Ok(())
    }
}

fn ensure_numeric(field: &'static str, value: &str) -> Result<(), ScripterError> {
    if !value.is_empty() && !value.chars().all(|c| c.is_ascii_digit()) {
        return Err(ScripterError::NonNumeric {
            field,
            value: value.to_string(),
        });
    }
    Ok(())
}
