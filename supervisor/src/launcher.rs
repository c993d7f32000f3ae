//! Starts the configured participant executables.
//!
//! Every participant receives `<server-ip> <port> <key> <datapath>` as its
//! arguments. Children are killed when the [`Participants`] handle drops.

use crate::config::{RoleConfig, SupervisorConfig};
use crate::error::SupervisorError;
use crate::registry::RoleRegistry;
use log::{info, warn};
use shared::Role;
use std::path::Path;
use tokio::process::{Child, Command};

/// True when the role has an executable that exists on disk.
pub fn is_launchable(config: &RoleConfig) -> bool {
    config.executable.as_deref().is_some_and(Path::is_file)
}

pub fn command_line(executable: &Path, host: &str, port: u16, key: &str, datapath: &Path) -> Command {
    let mut command = Command::new(executable);
    command
        .arg(host)
        .arg(port.to_string())
        .arg(key)
        .arg(datapath)
        .kill_on_drop(true);
    if let Some(dir) = executable.parent().filter(|d| !d.as_os_str().is_empty()) {
        command.current_dir(dir);
    }
    command
}

/// Running participant processes.
#[derive(Debug, Default)]
pub struct Participants {
    children: Vec<(Role, Child)>,
}

impl Participants {
    /// Launches every role whose executable exists. Missing executables are
    /// logged and skipped.
    pub fn launch_all(
        config: &SupervisorConfig,
        registry: &RoleRegistry,
        host: &str,
        port: u16,
    ) -> Result<Self, SupervisorError> {
        let mut children = Vec::new();
        for (role, role_config) in Role::ALL.into_iter().zip(config.roles()) {
            let (Some(executable), Some(key)) = (role_config.executable.as_deref(), registry.key(role)) else {
                continue;
            };
            if !is_launchable(role_config) {
                warn!("Executable for {} not found: {}", role, executable.display());
                continue;
            }

            let executable = executable
                .canonicalize()
                .map_err(|e| SupervisorError::LaunchFailed(executable.display().to_string(), e))?;
            let child = command_line(&executable, host, port, key, &role_config.datapath)
                .spawn()
                .map_err(|e| SupervisorError::LaunchFailed(executable.display().to_string(), e))?;
            info!(
                "Launched {} ({}) as pid {:?}",
                role,
                role_config.name,
                child.id()
            );
            children.push((role, child));
        }
        Ok(Self { children })
    }

    pub fn roles(&self) -> impl Iterator<Item = Role> + '_ {
        self.children.iter().map(|(role, _)| *role)
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// Kills every participant still running.
    pub async fn shutdown(&mut self) {
        for (role, child) in self.children.iter_mut() {
            if let Err(e) = child.kill().await {
                warn!("Failed to stop {}: {}", role, e);
            }
        }
        self.children.clear();
    }
}
