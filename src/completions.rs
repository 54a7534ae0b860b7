use std::io::{self, Write};
use std::path::{Path, PathBuf};

use clap_complete::{generate, Shell};

use crate::app::AppError;

const BIN_NAME: &str = "tasksync";

pub fn generate_completions(shell: Shell, buf: &mut dyn Write) {
    let mut cmd = crate::cli::styled_command();
    generate(shell, &mut cmd, BIN_NAME, buf);
}

fn shell_from_path(shell_path: &str) -> Option<Shell> {
    match shell_path.rsplit('/').next()? {
        "bash" => Some(Shell::Bash),
        "zsh" => Some(Shell::Zsh),
        "fish" => Some(Shell::Fish),
        "elvish" => Some(Shell::Elvish),
        "powershell" | "pwsh" => Some(Shell::PowerShell),
        _ => None,
    }
}

pub fn detect_current_shell() -> Option<Shell> {
    shell_from_path(&std::env::var("SHELL").ok()?)
}

/// Locations each shell autoloads from without rc-file edits.
fn install_path_for_home(shell: Shell, home: &Path) -> Option<PathBuf> {
    match shell {
        Shell::Bash => Some(home.join(".local/share/bash-completion/completions").join(BIN_NAME)),
        Shell::Zsh => Some(home.join(".zfunc").join(format!("_{BIN_NAME}"))),
        Shell::Fish => Some(
            home.join(".config/fish/completions")
                .join(format!("{BIN_NAME}.fish")),
        ),
        _ => None,
    }
}

pub fn install_completions(shell: Shell, home: &Path) -> io::Result<PathBuf> {
    let path = install_path_for_home(shell, home).ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::Unsupported,
            format!("no install path for {shell}"),
        )
    })?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut buf = Vec::new();
    generate_completions(shell, &mut buf);
    std::fs::write(&path, buf)?;
    Ok(path)
}

pub fn run_completions_command(shell: Option<Shell>, install: bool) -> Result<(), AppError> {
    let shell = shell.or_else(detect_current_shell).ok_or_else(|| {
        AppError::InvalidArgument(
            "unable to detect shell from $SHELL; pass a shell name".to_string(),
        )
    })?;

    if install {
        let home = std::env::var_os("HOME")
            .map(PathBuf::from)
            .ok_or_else(|| AppError::InvalidArgument("HOME is not set".to_string()))?;
        let path = install_completions(shell, &home)?;
        println!("completions installed to {}", path.display());
    } else {
        let mut stdout = io::stdout().lock();
        generate_completions(shell, &mut stdout);
    }
    Ok(())
}
