//! Install the generated wallpaper as the desktop background.

use common::SetterError;
use std::path::Path;
use std::process::Command;

/// Desktop environment specific wallpaper command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DesktopSetter {
    /// GNOME 2 through gconf
    Gnome,
    /// GNOME 3 through gsettings, optionally also the lock screen
    Gnome3 { lock_screen: bool },
    /// macOS Finder through AppleScript
    MacOs,
}

/// One external program invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetterCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl SetterCommand {
    fn new(program: &str, args: &[&str]) -> Self {
        Self {
            program: program.to_string(),
            args: args.iter().map(|a| a.to_string()).collect(),
        }
    }

    fn display(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl DesktopSetter {
    pub fn from_name(name: &str, lock_screen: bool) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "gnome" => Some(Self::Gnome),
            "gnome3" => Some(Self::Gnome3 { lock_screen }),
            "macos" | "osx" => Some(Self::MacOs),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Gnome => "gnome",
            Self::Gnome3 { .. } => "gnome3",
            Self::MacOs => "macos",
        }
    }

    /// Commands run for `path`, in order
    pub fn commands(&self, path: &Path) -> Vec<SetterCommand> {
        let path = path.to_string_lossy();

        match self {
            Self::Gnome => vec![SetterCommand::new(
                "gconftool-2",
                &[
                    "-t",
                    "str",
                    "-s",
                    "/desktop/gnome/background/picture_filename",
                    path.as_ref(),
                ],
            )],
            Self::Gnome3 { lock_screen } => {
                let uri = format!("file://{}", path);
                let mut schemas = vec!["org.gnome.desktop.background"];
                if *lock_screen {
                    schemas.push("org.gnome.desktop.screensaver");
                }

                schemas
                    .into_iter()
                    .map(|schema| {
                        SetterCommand::new("gsettings", &["set", schema, "picture-uri", uri.as_str()])
                    })
                    .collect()
            }
            Self::MacOs => {
                let script = format!(
                    "tell application \"Finder\" to set desktop picture to POSIX file {:?}",
                    path
                );
                vec![SetterCommand::new("/usr/bin/osascript", &["-e", script.as_str()])]
            }
        }
    }

    /// Run every command, stopping at the first failure
    pub fn apply(&self, path: &Path) -> Result<(), SetterError> {
        log::info!("Setting {} as {} wallpaper", path.display(), self.name());

        for command in self.commands(path) {
            log::debug!("Running {}", command.display());

            let output = Command::new(&command.program)
                .args(&command.args)
                .output()
                .map_err(|e| SetterError::Spawn {
                    command: command.program.clone(),
                    source: e,
                })?;

            if !output.status.success() {
                return Err(SetterError::Failed {
                    command: command.display(),
                    status: output.status.to_string(),
                    stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
                });
            }
        }

        Ok(())
    }
}
