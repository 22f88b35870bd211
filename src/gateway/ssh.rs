//! Gateway that runs actions over `ssh` (or `sh -c` for `localhost`).
use super::{parse_keytool_aliases, Action, Gateway, HostOutput, HostResults, ServiceFacts};
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::process::Command;
use std::thread;
use std::time::Instant;

const LOCAL_HOSTS: [&str; 2] = ["localhost", "127.0.0.1"];

/// Connection settings for the SSH gateway.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SshSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identity_file: Option<PathBuf>,
    /// Extra `-o` options, e.g. `StrictHostKeyChecking=no`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
    /// Prefix remote commands with `sudo -n`.
    #[serde(default)]
    pub sudo: bool,
}

#[derive(Debug, Clone)]
pub struct SshGateway {
    settings: SshSettings,
}

impl SshGateway {
    pub fn new(settings: SshSettings) -> Result<Self> {
        which::which("ssh").context("locate ssh client")?;
        Ok(Self { settings })
    }

    fn remote_command(&self, action: &Action) -> String {
        let words: Vec<&str> = match action {
            Action::ServiceStatus { unit } => vec!["systemctl", "show", unit.as_str(), "--no-pager"],
            Action::Slurp { path } => vec!["base64", "-w0", path.as_str()],
            Action::KeystoreAliases { path, password } => {
                let mut words = vec!["keytool", "-list", "-keystore", path.as_str()];
                // The store password rides on the remote argv and shows in the
                // host's process list while keytool runs.
                match password {
                    Some(password) => words.extend(["-storepass", password.as_str()]),
                    None => words.push("-noprompt"),
                }
                words
            }
        };
        let command = shell_words::join(words);
        if self.settings.sudo {
            format!("sudo -n {command}")
        } else {
            command
        }
    }

    fn ssh_command(&self, host: &str, remote: &str) -> Command {
        if LOCAL_HOSTS.contains(&host) {
            let mut command = Command::new("sh");
            command.arg("-c").arg(remote);
            return command;
        }
        let mut command = Command::new("ssh");
        command.arg("-o").arg("BatchMode=yes");
        if let Some(port) = self.settings.port {
            command.arg("-p").arg(port.to_string());
        }
        if let Some(identity) = &self.settings.identity_file {
            command.arg("-i").arg(identity);
        }
        for option in &self.settings.options {
            command.arg("-o").arg(option);
        }
        let target = match &self.settings.user {
            Some(user) => format!("{user}@{host}"),
            None => host.to_string(),
        };
        command.arg(target).arg("--").arg(remote);
        command
    }

    fn run_on_host(&self, host: &str, action: &Action) -> Result<HostOutput> {
        let remote = self.remote_command(action);
        let start = Instant::now();
        let output = self
            .ssh_command(host, &remote)
            .output()
            .with_context(|| format!("spawn remote command on {host}"))?;
        tracing::debug!(
            host,
            elapsed_ms = start.elapsed().as_millis(),
            stdout_bytes = output.stdout.len(),
            "remote command complete"
        );
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let first_line = stderr.trim().lines().next().unwrap_or_default();
            return Err(anyhow!(
                "remote command failed with status {}: {first_line}",
                output.status
            ));
        }
        let stdout =
            String::from_utf8(output.stdout).context("decode remote stdout as UTF-8")?;
        Ok(match action {
            Action::ServiceStatus { .. } => HostOutput::Facts(ServiceFacts::from_show_output(&stdout)),
            Action::Slurp { .. } => HostOutput::Content {
                encoded: stdout.trim().to_string(),
            },
            Action::KeystoreAliases { .. } => HostOutput::Aliases(parse_keytool_aliases(&stdout)),
        })
    }
}

impl Gateway for SshGateway {
    fn execute(&self, action: &Action, hosts: &[String]) -> HostResults {
        let outcomes: Vec<(String, Result<HostOutput>)> = thread::scope(|scope| {
            let handles: Vec<_> = hosts
                .iter()
                .map(|host| {
                    scope.spawn(move || (host.clone(), self.run_on_host(host, action)))
                })
                .collect();
            handles
                .into_iter()
                .zip(hosts)
                .map(|(handle, host)| {
                    handle
                        .join()
                        .unwrap_or_else(|_| (host.clone(), Err(anyhow!("remote worker panicked"))))
                })
                .collect()
        });

        let mut results = HostResults::new();
        for (host, outcome) in outcomes {
            match outcome {
                Ok(output) => {
                    results.insert(host, output);
                }
                Err(err) => tracing::warn!(host = %host, error = %err, "gateway action failed"),
            }
        }
        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gateway(sudo: bool) -> SshGateway {
        SshGateway {
            settings: SshSettings {
                user: Some("ops".to_string()),
                port: Some(2222),
                identity_file: None,
                options: vec!["StrictHostKeyChecking=no".to_string()],
                sudo,
            },
        }
    }

    #[test]
    fn remote_commands_are_shell_quoted() {
        let command = gateway(false).remote_command(&Action::Slurp {
            path: "/etc/kafka/my file.properties".to_string(),
        });
        assert_eq!(command, "base64 -w0 '/etc/kafka/my file.properties'");
    }

    #[test]
    fn sudo_prefixes_remote_command() {
        let command = gateway(true).remote_command(&Action::ServiceStatus {
            unit: "confluent-server".to_string(),
        });
        assert_eq!(command, "sudo -n systemctl show confluent-server --no-pager");
    }

    #[test]
    fn keystore_listing_without_password_does_not_prompt() {
        let command = gateway(false).remote_command(&Action::KeystoreAliases {
            path: "/var/ssl/truststore.jks".to_string(),
            password: None,
        });
        assert_eq!(command, "keytool -list -keystore /var/ssl/truststore.jks -noprompt");
    }

    #[test]
    fn ssh_arguments_follow_settings() {
        let command = gateway(false).ssh_command("broker-1", "true");
        let args: Vec<String> = command
            .get_args()
            .map(|arg| arg.to_string_lossy().into_owned())
            .collect();
        assert_eq!(command.get_program(), "ssh");
        assert_eq!(
            args,
            vec![
                "-o",
                "BatchMode=yes",
                "-p",
                "2222",
                "-o",
                "StrictHostKeyChecking=no",
                "ops@broker-1",
                "--",
                "true"
            ]
        );
    }

    #[test]
    fn localhost_runs_through_shell() {
        let command = gateway(false).ssh_command("localhost", "true");
        assert_eq!(command.get_program(), "sh");
    }
}
