use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use hpc_scripter::{CredentialStore, Mode, PartialCredentials, Scripter};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "hpc-scripter",
    about = "Batch sftp/ssh commands against a cluster through a generated expect script",
    version
)]
struct Args {
    /// Path to the credentials config file (default: ~/.hpc-scripter/config)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Username, overriding the config file
    #[arg(short, long)]
    username: Option<String>,

    /// Cluster hostname, overriding the config file
    #[arg(short, long)]
    site: Option<String>,

    /// Group for permission changes (numeric for sftp)
    #[arg(short, long)]
    group: Option<String>,

    /// Connection mode: sftp or ssh
    #[arg(short, long, default_value = "sftp")]
    mode: Mode,

    /// Fail instead of prompting when credentials are missing
    #[arg(long)]
    headless: bool,

    /// Print the queued commands and exit without running anything
    #[arg(long)]
    preview: bool,

    #[command(subcommand)]
    command: Cmd,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Upload a file to the cluster (sftp mode only)
    Put {
        file: String,
        /// Remote directory to create and upload into
        #[arg(long)]
        outdir: Option<String>,
        /// Name for the uploaded file on the remote side
        #[arg(long)]
        rename: Option<String>,
        /// Single-letter sftp flags, e.g. -o r -o p for "put -rp"
        #[arg(short, long)]
        options: Vec<char>,
        /// Fix permissions of the uploaded file afterwards
        #[arg(long)]
        set_permissions: bool,
    },
    /// Download a file from the cluster (sftp mode only)
    Get {
        file: String,
        /// Local directory to download into
        #[arg(long)]
        outdir: Option<String>,
        /// Name for the downloaded file
        #[arg(long)]
        rename: Option<String>,
        /// Single-letter sftp flags
        #[arg(short, long)]
        options: Vec<char>,
    },
    /// List a directory on the cluster
    Ls { path: Option<String> },
    /// Print the working directory on the cluster
    Pwd,
    /// Change the working directory
    Cwd {
        dir: String,
        /// Change the local directory instead (sftp mode only)
        #[arg(long)]
        local: bool,
    },
    /// Change permissions (and group) of files on the cluster
    Chmod {
        #[arg(required = true)]
        files: Vec<String>,
        /// Permission value; octal required over sftp
        #[arg(long, default_value = "0664")]
        mode_bits: String,
        /// Group to apply with chgrp
        #[arg(long)]
        group: Option<String>,
    },
    /// Queue free-form commands to run in the session
    Run {
        #[arg(required = true)]
        commands: Vec<String>,
    },
    /// Re-prompt for the username and rewrite the config file
    ResetUsername,
    /// Re-prompt for the password and rewrite the config file
    ResetPassword,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();

    let store =
        CredentialStore::new(args.config.clone()).context("Failed to resolve config path")?;
    let seed = PartialCredentials {
        username: args.username.clone(),
        password: None,
        group: args.group.clone(),
        site: args.site.clone(),
    };
    let mut credentials = store
        .resolve(seed, args.headless)
        .context("Failed to resolve credentials")?;

    match args.command {
        Cmd::ResetUsername => {
            store
                .reset_username(&mut credentials)
                .context("Failed to reset the username")?;
        }
        Cmd::ResetPassword => {
            store
                .reset_password(&mut credentials)
                .context("Failed to reset the password")?;
        }
        command => {
            let mut scripter = Scripter::new(credentials, args.mode);
            queue(&mut scripter, command)?;

            if args.preview {
                println!("Command preview:");
                for (index, command) in scripter.preview_steps().iter().enumerate() {
                    println!("{index}: {command}");
                }
                return Ok(());
            }
            scripter.run().context("Failed to run the session")?;
        }
    }

    Ok(())
}

/// Translate one subcommand into queued steps.
fn queue(scripter: &mut Scripter, command: Cmd) -> Result<()> {
    match command {
        Cmd::Put {
            file,
            outdir,
            rename,
            options,
            set_permissions,
        } => scripter.put(
            &file,
            outdir.as_deref(),
            rename.as_deref(),
            &options,
            set_permissions,
        )?,
        Cmd::Get {
            file,
            outdir,
            rename,
            options,
        } => scripter.get(&file, outdir.as_deref(), rename.as_deref(), &options)?,
        Cmd::Ls { path } => scripter.ls(path.as_deref()),
        Cmd::Pwd => scripter.pwd(),
        Cmd::Cwd { dir, local } => scripter.cwd(&dir, local)?,
        Cmd::Chmod {
            files,
            mode_bits,
            group,
        } => {
            let files: Vec<&str> = files.iter().map(String::as_str).collect();
            scripter.set_permissions(&files, group.as_deref(), &mode_bits)?;
        }
        Cmd::Run { commands } => {
            for command in commands {
                scripter.add_step(&command, None);
            }
        }
        Cmd::ResetUsername | Cmd::ResetPassword => unreachable!("handled in main"),
    }
    Ok(())
}
