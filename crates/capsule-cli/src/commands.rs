//! Subcommand implementations.

use crate::cli::Command;
use anyhow::Context;
use capsule_sdk::{CapsuleClient, ExecOptions, ExecResult};
use serde::Serialize;
use std::io::Write;
use std::process::ExitCode;
use std::time::Duration;

/// Printable summary of a created capsule.
#[derive(Debug, Serialize)]
struct CapsuleInfo<'a> {
    id: &'a str,
    template: &'a str,
    created_at: String,
    expires_at: String,
    terminal_url: String,
}

/// Run one subcommand and return the process exit code.
pub async fn execute(client: &CapsuleClient, command: Command) -> anyhow::Result<ExitCode> {
    match command {
        Command::Create { template, ttl_ms } => {
            let capsule = client
                .create_with_ttl(template, Duration::from_millis(ttl_ms))
                .await?;
            print_json(&CapsuleInfo {
                id: capsule.id(),
                template: capsule.template(),
                created_at: capsule.created_at().to_rfc3339(),
                expires_at: capsule.expires_at().to_rfc3339(),
                terminal_url: capsule.terminal_url(),
            })?;
            Ok(ExitCode::SUCCESS)
        }

        Command::Exec {
            id,
            cwd,
            env,
            timeout_ms,
            max_stdout_bytes,
            max_stderr_bytes,
            json,
            cmd,
        } => {
            let options = ExecOptions {
                cwd,
                env: (!env.is_empty()).then(|| env.into_iter().collect()),
                timeout_ms,
                max_stdout_bytes,
                max_stderr_bytes,
            };
            let result = client.exec(&id, cmd, &options).await?;
            report(&result, json)
        }

        Command::Run {
            template,
            code,
            json,
        } => {
            let result = client
                .with_capsule(template, |capsule| async move {
                    capsule.run(&code).await
                })
                .await?;
            report(&result, json)
        }

        Command::Delete { id } => {
            client.delete(&id).await?;
            tracing::info!(sandbox_id = %id, "Deleted");
            Ok(ExitCode::SUCCESS)
        }

        Command::Write { id, path, local } => {
            let content = tokio::fs::read(&local)
                .await
                .with_context(|| format!("failed to read {}", local.display()))?;
            client.write_file(&id, &path, &content).await?;
            tracing::info!(sandbox_id = %id, path = %path, bytes = content.len(), "Uploaded");
            Ok(ExitCode::SUCCESS)
        }

        Command::Read { id, path, encoding } => {
            let bytes = match encoding {
                Some(encoding) => client
                    .read_file_text(&id, &path, encoding)
                    .await?
                    .into_bytes(),
                None => client.read_file(&id, &path).await?,
            };
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(&bytes)?;
            stdout.flush()?;
            Ok(ExitCode::SUCCESS)
        }

        Command::Ls { id, path } => {
            let files = client.list_dir(&id, &path).await?;
            print_json(&files)?;
            Ok(ExitCode::SUCCESS)
        }

        Command::TerminalUrl { id } => {
            println!("{}", client.terminal_url(&id));
            Ok(ExitCode::SUCCESS)
        }

        Command::Health => {
            client.health().await?;
            println!("ok");
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Print an exec result and map its exit code onto ours.
fn report(result: &ExecResult, json: bool) -> anyhow::Result<ExitCode> {
    if json {
        print_json(result)?;
    } else {
        print!("{}", result.stdout);
        eprint!("{}", result.stderr);
        std::io::stdout().flush()?;
    }
    if result.timed_out {
        tracing::warn!(duration_ms = result.duration_ms, "Command timed out");
    }
    if result.stdout_truncated || result.stderr_truncated {
        tracing::warn!(
            stdout_truncated = result.stdout_truncated,
            stderr_truncated = result.stderr_truncated,
            "Output truncated"
        );
    }
    Ok(ExitCode::from(exit_status(result)))
}

/// Remote exit code clamped to a process status; a timeout is a failure.
fn exit_status(result: &ExecResult) -> u8 {
    match result.exit_code {
        0 if result.timed_out => 1,
        code => u8::try_from(code).unwrap_or(1),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(exit_code: i32, timed_out: bool) -> ExecResult {
        ExecResult {
            stdout: String::new(),
            stderr: String::new(),
            exit_code,
            timed_out,
            stdout_truncated: false,
            stderr_truncated: false,
            duration_ms: 1,
        }
    }

    #[test]
    fn test_exit_status_mapping() {
        assert_eq!(exit_status(&result(0, false)), 0);
        assert_eq!(exit_status(&result(0, true)), 1);
        assert_eq!(exit_status(&result(3, false)), 3);
        assert_eq!(exit_status(&result(-9, false)), 1);
        assert_eq!(exit_status(&result(300, false)), 1);
    }
}
