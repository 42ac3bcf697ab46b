//! Narrow seam around external process execution.
//!
//! Everything the transfer does to the outside world goes through
//! [`ProcessRunner`]. Production code uses [`SystemRunner`]; tests use
//! [`ScriptedRunner`], which records invocations and replays canned results.

use itertools::Itertools;
use std::collections::VecDeque;
use std::io;
use std::process::{Command, Stdio};
use std::sync::Mutex;

/// Environment variable libpq tools read their password from.
pub const PASSWORD_ENV: &str = "PGPASSWORD";

/// Where pg-transfer itself reads the two passwords from.
pub const SOURCE_PASSWORD_ENV: &str = "SOURCE_PASSWORD";
pub const DEST_PASSWORD_ENV: &str = "DEST_PASSWORD";

/// Secrets a child must never inherit from this process.
pub const CREDENTIAL_ENV: [&str; 3] = [PASSWORD_ENV, SOURCE_PASSWORD_ENV, DEST_PASSWORD_ENV];

/// A single external command, with the environment private to it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    pub env: Vec<(String, String)>,
    pub env_remove: Vec<String>,
    /// Capture stdout/stderr instead of passing them through to the terminal.
    pub capture: bool,
}

impl Invocation {
    pub fn new(program: &str) -> Self {
        Invocation {
            program: program.to_string(),
            args: Vec::new(),
            env: Vec::new(),
            env_remove: Vec::new(),
            capture: false,
        }
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn env(mut self, key: &str, value: &str) -> Self {
        self.env.push((key.to_string(), value.to_string()));
        self
    }

    pub fn env_remove(mut self, key: &str) -> Self {
        self.env_remove.push(key.to_string());
        self
    }

    /// Drops every inherited credential variable; set the stage's own afterwards.
    pub fn scrub_credentials(mut self) -> Self {
        self.env_remove
            .extend(CREDENTIAL_ENV.iter().map(|k| k.to_string()));
        self
    }

    pub fn capture(mut self) -> Self {
        self.capture = true;
        self
    }

    pub fn env_value(&self, key: &str) -> Option<&str> {
        self.env
            .iter()
            .rev()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Printable command line. Environment values are never included.
    pub fn command_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .join(" ")
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ProcessOutput {
    /// `None` when the process was terminated by a signal.
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl ProcessOutput {
    pub fn exited(code: i32) -> Self {
        ProcessOutput {
            code: Some(code),
            ..Default::default()
        }
    }

    pub fn with_stdout(mut self, stdout: &str) -> Self {
        self.stdout = stdout.to_string();
        self
    }

    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    /// Exit code to report for a failed process; signals map to 1.
    pub fn failure_code(&self) -> i32 {
        match self.code {
            Some(0) | None => 1,
            Some(code) => code,
        }
    }
}

pub trait ProcessRunner {
    /// Run to completion. `Err` means the process could not be started at all.
    fn run(&self, invocation: &Invocation) -> io::Result<ProcessOutput>;
}

/// Spawns real child processes.
pub struct SystemRunner;

impl ProcessRunner for SystemRunner {
    fn run(&self, invocation: &Invocation) -> io::Result<ProcessOutput> {
        let mut cmd = Command::new(&invocation.program);
        cmd.args(&invocation.args);
        for key in &invocation.env_remove {
            cmd.env_remove(key);
        }
        for (key, value) in &invocation.env {
            cmd.env(key, value);
        }
        if invocation.capture {
            let output = cmd.stdin(Stdio::null()).output()?;
            Ok(ProcessOutput {
                code: output.status.code(),
                stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            })
        } else {
            let status = cmd.stdin(Stdio::null()).status()?;
            Ok(ProcessOutput {
                code: status.code(),
                ..Default::default()
            })
        }
    }
}

/// Test double: pops one scripted result per call and records every invocation.
///
/// When a program's script runs dry the runner answers with exit code 0 and
/// empty output.
#[derive(Default)]
pub struct ScriptedRunner {
    scripts: Mutex<Vec<(String, VecDeque<io::Result<ProcessOutput>>)>>,
    calls: Mutex<Vec<Invocation>>,
}

impl ScriptedRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn script(self, program: &str, result: io::Result<ProcessOutput>) -> Self {
        {
            let mut scripts = self.scripts.lock().unwrap_or_else(|e| e.into_inner());
            match scripts.iter_mut().find(|(p, _)| p == program) {
                Some((_, queue)) => queue.push_back(result),
                None => scripts.push((program.to_string(), VecDeque::from([result]))),
            }
        }
        self
    }

    pub fn script_exit(self, program: &str, code: i32) -> Self {
        self.script(program, Ok(ProcessOutput::exited(code)))
    }

    pub fn calls(&self) -> Vec<Invocation> {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn calls_to(&self, program: &str) -> Vec<Invocation> {
        self.calls()
            .into_iter()
            .filter(|c| c.program == program)
            .collect()
    }
}

impl ProcessRunner for ScriptedRunner {
    fn run(&self, invocation: &Invocation) -> io::Result<ProcessOutput> {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(invocation.clone());
        let mut scripts = self.scripts.lock().unwrap_or_else(|e| e.into_inner());
        scripts
            .iter_mut()
            .find(|(p, _)| *p == invocation.program)
            .and_then(|(_, queue)| queue.pop_front())
            .unwrap_or_else(|| Ok(ProcessOutput::exited(0)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_line_excludes_env() {
        let inv = Invocation::new("pg_dump")
            .args(["-h", "db", "-f", "out.sql"])
            .env(PASSWORD_ENV, "secret");
        assert_eq!(inv.command_line(), "pg_dump -h db -f out.sql");
        assert_eq!(inv.env_value(PASSWORD_ENV), Some("secret"));
    }

    #[test]
    fn test_scrub_credentials_removes_all_password_vars() {
        let inv = Invocation::new("psql")
            .scrub_credentials()
            .env(PASSWORD_ENV, "secret");
        for key in CREDENTIAL_ENV {
            assert!(inv.env_remove.iter().any(|k| k == key));
        }
        assert_eq!(inv.env_value(PASSWORD_ENV), Some("secret"));
        assert_eq!(inv.env_value(SOURCE_PASSWORD_ENV), None);
    }

    #[test]
    fn test_failure_code_for_signal() {
        let killed = ProcessOutput::default();
        assert!(!killed.success());
        assert_eq!(killed.failure_code(), 1);
        assert_eq!(ProcessOutput::exited(2).failure_code(), 2);
    }

    #[test]
    fn test_scripted_runner_replays_in_order() {
        let runner = ScriptedRunner::new()
            .script_exit("pg_isready", 2)
            .script(
                "pg_isready",
                Ok(ProcessOutput::exited(0).with_stdout("db:5432 - accepting connections")),
            );
        let inv = Invocation::new("pg_isready");
        assert_eq!(runner.run(&inv).unwrap().code, Some(2));
        assert!(runner.run(&inv).unwrap().stdout.contains("accepting"));
        // Exhausted script falls back to success.
        assert!(runner.run(&inv).unwrap().success());
        assert_eq!(runner.calls_to("pg_isready").len(), 3);
    }
}
