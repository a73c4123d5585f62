//! Desktop notification delivery.
//!
//! One notifier capability is selected at startup and handed the
//! summary/body produced by the change detector. Platform plumbing
//! stays here: `notify-send` on Linux, a PowerShell balloon tip on
//! Windows, and plain stdout everywhere else (also the explicit choice
//! when notifications are disabled, so scheduled runs still leave a
//! trace in their log).

use thiserror::Error;
use tokio::process::Command;

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("Failed to launch notification helper: {0}")]
    Io(#[from] std::io::Error),

    #[error("Notification helper exited with {0}")]
    HelperFailed(std::process::ExitStatus),
}

/// How new-post reports reach the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notifier {
    /// The platform's desktop notification mechanism.
    Desktop,
    /// Print to stdout. Fallback for unsupported platforms and the
    /// behavior behind `--no-notify`.
    Stdout,
}

impl Notifier {
    pub fn select(desktop: bool) -> Self {
        if desktop {
            Notifier::Desktop
        } else {
            Notifier::Stdout
        }
    }

    /// Deliver one notification. Failures are reported to the caller
    /// and never affect snapshot persistence.
    pub async fn send(&self, summary: &str, body: &str) -> Result<(), NotifyError> {
        match self {
            Notifier::Stdout => {
                println!("{summary}\n");
                println!("{body}");
                Ok(())
            }
            Notifier::Desktop => desktop_send(summary, body).await,
        }
    }
}

#[cfg(target_os = "linux")]
async fn desktop_send(summary: &str, body: &str) -> Result<(), NotifyError> {
    // Fire and forget; notify-send returns once the notification is
    // queued and the daemon owns its lifetime.
    Command::new("notify-send")
        .args([
            "--app-name=feedping",
            "--icon=rss",
            "--expire-time=6000",
            "--hint=string:desktop-entry:feedping",
            summary,
            body,
        ])
        .spawn()?;
    Ok(())
}

#[cfg(target_os = "windows")]
async fn desktop_send(summary: &str, body: &str) -> Result<(), NotifyError> {
    use std::time::{SystemTime, UNIX_EPOCH};

    let script = format!(
        r#"Add-Type -AssemblyName System.Windows.Forms;
Add-Type -AssemblyName System.Drawing;

$ErrorActionPreference = 'silentlycontinue';
$notifyIcon = New-Object System.Windows.Forms.NotifyIcon;
$notifyIcon.Icon = [System.Drawing.SystemIcons]::Information;
$notifyIcon.BalloonTipTitle = "{}";
$notifyIcon.BalloonTipText = "{}";
$notifyIcon.Visible = $true;

$notifyIcon.ShowBalloonTip(5000);
Start-Sleep -Seconds 6;
$notifyIcon.Dispose();"#,
        powershell_escape(summary),
        powershell_escape(body),
    );

    let suffix = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or(0);
    let script_path = std::env::temp_dir().join(format!("feedping.{:016x}.ps1", suffix));
    tokio::fs::write(&script_path, &script).await?;

    let status = Command::new("pwsh").arg(&script_path).status().await;
    let _ = tokio::fs::remove_file(&script_path).await;

    let status = status?;
    if !status.success() {
        return Err(NotifyError::HelperFailed(status));
    }
    Ok(())
}

#[cfg(target_os = "windows")]
fn powershell_escape(text: &str) -> String {
    text.replace('`', "``")
        .replace('"', "`\"")
        .replace('$', "`$")
        .replace('\n', "`n")
}

#[cfg(not(any(target_os = "linux", target_os = "windows")))]
async fn desktop_send(summary: &str, body: &str) -> Result<(), NotifyError> {
    println!("{summary}\n");
    println!("{body}");
    Ok(())
}
