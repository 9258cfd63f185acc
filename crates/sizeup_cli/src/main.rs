//! Command-line driver for SizeUp sessions.
//!
//! # Responsibility
//! - Run create/join/submit/show flows against a SQLite session store.
//! - Keep output deterministic for scripted use.
//!
//! # Configuration
//! - `SIZEUP_DB`: database file (default `sizeup.sqlite3`).
//! - `SIZEUP_LOG_DIR`: absolute log directory; logging stays off when unset.
//! - `SIZEUP_LOG_LEVEL`: `trace|debug|info|warn|error`.

mod render;

use log::error;
use sizeup_core::db::open_db;
use sizeup_core::{
    normalize_session_id, parse_participant_names, EstimationModeId, SessionService,
    SqliteSessionStore, ALL_MODES,
};
use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;

const DEFAULT_DB_FILE: &str = "sizeup.sqlite3";
const USAGE: &str = "usage:
  sizeup_cli ping
  sizeup_cli modes
  sizeup_cli create [--mode tshirt|fibonacci] <task> <names, comma separated>
  sizeup_cli join <session-id> <name>
  sizeup_cli submit <session-id> <name> <estimate>
  sizeup_cli show <session-id> [viewer]";

/// Environment-derived settings.
#[derive(Debug, Clone, PartialEq, Eq)]
struct CliConfig {
    db_path: PathBuf,
    log_dir: Option<String>,
    log_level: String,
}

impl CliConfig {
    fn from_env() -> Self {
        Self {
            db_path: std::env::var_os("SIZEUP_DB")
                .map_or_else(|| PathBuf::from(DEFAULT_DB_FILE), PathBuf::from),
            log_dir: std::env::var("SIZEUP_LOG_DIR")
                .ok()
                .filter(|dir| !dir.trim().is_empty()),
            log_level: std::env::var("SIZEUP_LOG_LEVEL")
                .unwrap_or_else(|_| sizeup_core::default_log_level().to_string()),
        }
    }
}

/// Parsed command line.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Command {
    Ping,
    Modes,
    Create {
        mode: EstimationModeId,
        task: String,
        names: Vec<String>,
    },
    Join {
        session_id: String,
        name: String,
    },
    Submit {
        session_id: String,
        name: String,
        estimate: String,
    },
    Show {
        session_id: String,
        viewer: Option<String>,
    },
}

fn parse_command(args: &[String]) -> Result<Command, String> {
    let args: Vec<&str> = args.iter().map(String::as_str).collect();
    match args.as_slice() {
        [] | ["ping"] => Ok(Command::Ping),
        ["modes"] => Ok(Command::Modes),
        ["create", "--mode", mode, task, names] => create_command(Some(*mode), task, names),
        ["create", task, names] => create_command(None, task, names),
        ["join", session_id, name] => Ok(Command::Join {
            session_id: normalize_session_id(session_id),
            name: name.trim().to_string(),
        }),
        ["submit", session_id, name, estimate] => Ok(Command::Submit {
            session_id: normalize_session_id(session_id),
            name: name.trim().to_string(),
            estimate: estimate.trim().to_string(),
        }),
        ["show", session_id] => Ok(Command::Show {
            session_id: normalize_session_id(session_id),
            viewer: None,
        }),
        ["show", session_id, viewer] => Ok(Command::Show {
            session_id: normalize_session_id(session_id),
            viewer: Some(viewer.trim().to_string()),
        }),
        _ => Err(USAGE.to_string()),
    }
}

fn create_command(mode: Option<&str>, task: &str, names: &str) -> Result<Command, String> {
    let mode = match mode {
        Some(value) => EstimationModeId::parse(value)
            .ok_or_else(|| format!("unknown estimation mode `{value}`"))?,
        None => EstimationModeId::Tshirt,
    };
    Ok(Command::Create {
        mode,
        task: task.trim().to_string(),
        names: parse_participant_names(names),
    })
}

fn run(command: Command, config: &CliConfig) -> Result<String, Box<dyn Error>> {
    match command {
        Command::Ping => Ok(format!(
            "sizeup_core ping={}\nsizeup_core version={}",
            sizeup_core::ping(),
            sizeup_core::core_version()
        )),
        Command::Modes => Ok(ALL_MODES
            .iter()
            .map(|mode| render::mode_line(mode))
            .collect::<Vec<_>>()
            .join("\n")),
        command => {
            let conn = open_db(&config.db_path)?;
            let service = SessionService::new(SqliteSessionStore::new(&conn));
            run_session_command(&service, command)
        }
    }
}

fn run_session_command(
    service: &SessionService<SqliteSessionStore<'_>>,
    command: Command,
) -> Result<String, Box<dyn Error>> {
    let output = match command {
        Command::Create { mode, task, names } => {
            let session = service.create_session(task, mode, &names)?;
            format!("created session {}", session.id)
        }
        Command::Join { session_id, name } => {
            let context = service.join_session(&session_id, &name)?;
            render::view(&service.view(&context)?)
        }
        Command::Submit {
            session_id,
            name,
            estimate,
        } => {
            let (context, _) = service.open_session(&session_id, Some(&name))?;
            service.submit_estimate(&context, &estimate)?;
            render::view(&service.view(&context)?)
        }
        Command::Show { session_id, viewer } => {
            let (context, _) = service.open_session(&session_id, viewer.as_deref())?;
            render::view(&service.view(&context)?)
        }
        Command::Ping | Command::Modes => String::new(),
    };
    Ok(output)
}

fn main() -> ExitCode {
    let config = CliConfig::from_env();
    if let Some(log_dir) = config.log_dir.as_deref() {
        if let Err(err) = sizeup_core::init_logging(&config.log_level, log_dir) {
            eprintln!("warning: logging disabled: {err}");
        }
    }

    let args: Vec<String> = std::env::args().skip(1).collect();
    let command = match parse_command(&args) {
        Ok(command) => command,
        Err(message) => {
            eprintln!("{message}");
            return ExitCode::from(2);
        }
    };

    match run(command, &config) {
        Ok(output) => {
            println!("{output}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!("event=cli_command module=cli status=error error={err}");
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{parse_command, Command};
    use sizeup_core::EstimationModeId;

    fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| value.to_string()).collect()
    }

    #[test]
    fn no_arguments_runs_ping() {
        assert_eq!(parse_command(&[]), Ok(Command::Ping));
    }

    #[test]
    fn create_parses_mode_and_roster() {
        let command = parse_command(&args(&[
            "create",
            "--mode",
            "fibonacci",
            " Login page ",
            "Alice, , Bob",
        ]))
        .expect("valid create");
        assert_eq!(
            command,
            Command::Create {
                mode: EstimationModeId::Fibonacci,
                task: "Login page".to_string(),
                names: vec!["Alice".to_string(), "Bob".to_string()],
            }
        );

        assert!(parse_command(&args(&["create", "--mode", "hours", "t", "A"])).is_err());
    }

    #[test]
    fn session_ids_are_normalized() {
        assert_eq!(
            parse_command(&args(&["show", " LUSAB-BABAD "])),
            Ok(Command::Show {
                session_id: "lusab-babad".to_string(),
                viewer: None,
            })
        );
    }

    #[test]
    fn unknown_command_prints_usage() {
        let err = parse_command(&args(&["vote"])).unwrap_err();
        assert!(err.starts_with("usage:"));
    }
}
