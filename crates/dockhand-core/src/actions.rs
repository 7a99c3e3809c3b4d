//! GitHub Actions workflow commands: step outputs and error annotations.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;

use crate::error::Result;

/// Environment variable naming the step-output file.
pub const OUTPUT_FILE_ENV: &str = "GITHUB_OUTPUT";

/// Destination for step outputs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionOutputs {
    /// Append to the file the runner reads outputs from.
    File(PathBuf),

    /// Legacy `::set-output` command on stdout.
    Stdout,
}

impl ActionOutputs {
    /// Use `$GITHUB_OUTPUT` when set, stdout otherwise.
    pub fn from_env() -> Self {
        match std::env::var_os(OUTPUT_FILE_ENV) {
            Some(path) if !path.is_empty() => ActionOutputs::File(PathBuf::from(path)),
            _ => ActionOutputs::Stdout,
        }
    }

    pub fn set_output(&self, name: &str, value: &str) -> Result<()> {
        match self {
            ActionOutputs::File(path) => {
                let mut file = OpenOptions::new().create(true).append(true).open(path)?;
                file.write_all(file_command(name, value).as_bytes())?;
            }
            ActionOutputs::Stdout => {
                println!(
                    "::set-output name={}::{}",
                    escape_property(name),
                    escape_data(value)
                );
            }
        }
        Ok(())
    }
}

/// Entry for the output file. Multi-line values use the heredoc form.
fn file_command(name: &str, value: &str) -> String {
    if value.contains('\n') || value.contains('\r') {
        let delimiter = format!("ghadelimiter_{}", uuid::Uuid::new_v4());
        format!("{name}<<{delimiter}\n{value}\n{delimiter}\n")
    } else {
        format!("{name}={value}\n")
    }
}

/// `::error::` annotation marking the step failed with `message`.
pub fn error_command(message: &str) -> String {
    format!("::error::{}", escape_data(message))
}

/// Print the failure annotation. The caller still has to exit non-zero.
pub fn set_failed(message: &str) {
    println!("{}", error_command(message));
}

fn escape_data(s: &str) -> String {
    s.replace('%', "%25")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
}

fn escape_property(s: &str) -> String {
    escape_data(s).replace(':', "%3A").replace(',', "%2C")
}
