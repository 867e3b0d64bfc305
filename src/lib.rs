//! # hpc-scripter
//!
//! Builds and runs `expect` scripts that batch interactive `sftp`/`ssh`
//! commands against an HPC cluster: login, file transfer, directory creation,
//! and permission changes.
//!
//! This is glue, not a protocol stack. A [`Scripter`] accumulates
//! prompt/response [`Step`]s, serializes them into one `expect` heredoc, and
//! hands that to the shell; the external `sftp`/`ssh` clients do all the real
//! work. Nothing reads the remote side's answers — if a command fails on the
//! cluster, the evidence is in the session's terminal output and nowhere
//! else.
//!
//! ## Quick start
//!
//! ```no_run
//! use hpc_scripter::{Credentials, Mode, Scripter};
//!
//! fn main() -> anyhow::Result<()> {
//!     let credentials = Credentials::new("alice", "hunter2", None, "hpc.example.edu");
//!     let mut scripter = Scripter::new(credentials, Mode::Sftp);
//!
//!     scripter.put("results.csv", Some("runs/2026"), None, &[], false)?;
//!     scripter.get("logs/run.log", Some("downloads"), None, &[])?;
//!
//!     for command in scripter.preview_steps() {
//!         println!("{command}");
//!     }
//!     scripter.run()?;
//!     Ok(())
//! }
//! ```
//!
//! ## Credentials
//!
//! [`CredentialStore`] resolves a credential set once per session: direct
//! arguments win, a `key=value` config file (default
//! `~/.hpc-scripter/config`) fills gaps, and anything still missing is
//! prompted for interactively — masked for the password. The first complete
//! set is written back so later runs skip the prompts.
//!
//! ```no_run
//! use hpc_scripter::{CredentialStore, Mode, PartialCredentials, Scripter};
//!
//! fn main() -> anyhow::Result<()> {
//!     let store = CredentialStore::new(None)?;
//!     let credentials = store.resolve(PartialCredentials::default(), false)?;
//!     let mut scripter = Scripter::new(credentials, Mode::Ssh);
//!     scripter.add_step("squeue -u alice", None);
//!     scripter.run()?;
//!     Ok(())
//! }
//! ```
//!
//! ## A warning about command content
//!
//! Step commands are interpolated into the generated script verbatim, shell
//! metacharacters included. Globs like `put results/*` depend on this. The
//! flip side is command injection if step text comes from untrusted input —
//! these builders are for your own commands, not anyone else's.

pub mod credentials;
pub mod error;
pub mod scripter;
pub mod step;

pub use credentials::{CredentialStore, Credentials, PartialCredentials, prompt_missing};
pub use error::ScripterError;
pub use scripter::{Mode, Scripter, TransferKind};
pub use step::{Quote, Step};
