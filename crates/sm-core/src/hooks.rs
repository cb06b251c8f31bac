//! Post-process hook that pipes compiled output through a shell command,
//! e.g. a code formatter.

use std::io::Write;
use std::process::{Command, Stdio};

use crate::pipeline::{CollaboratorError, PostProcessor};

/// Runs `program args...` with the rendered text on stdin and uses stdout
/// as the new text.
#[derive(Debug, Clone)]
pub struct CommandPostProcessor {
    program: String,
    args: Vec<String>,
}

impl CommandPostProcessor {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }
}

impl PostProcessor for CommandPostProcessor {
    fn process(&self, rendered: &str) -> Result<String, CollaboratorError> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| format!("cannot start '{}': {}", self.program, e))?;

        // stdin is fed from its own thread while stdout is drained, otherwise
        // a filter that streams its output blocks once both pipes fill up.
        let stdin = child.stdin.take();
        let (written, output) = std::thread::scope(|scope| {
            let writer = scope.spawn(move || match stdin {
                Some(mut stdin) => stdin.write_all(rendered.as_bytes()),
                None => Ok(()),
            });
            let output = child.wait_with_output();
            (writer.join(), output)
        });

        let output = output?;
        if !output.status.success() {
            return Err(format!(
                "'{}' exited with {}: {}",
                self.program,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )
            .into());
        }
        written
            .map_err(|_| format!("writing to '{}' panicked", self.program))?
            .map_err(|e| format!("cannot write to '{}': {}", self.program, e))?;
        Ok(String::from_utf8(output.stdout)?)
    }
}
