use std::path::Path;
use std::process::Command;
use std::process::Stdio;

use crate::MdocError;
use crate::MdocResult;
use crate::ShellConfig;

/// Separator that stops the chain at the first failing command.
const AND_THEN: &str = " && ";

/// Runs each code block in a new shell process.
#[derive(Debug, Clone, Default)]
pub struct ShellExecutor {
	config: ShellConfig,
}

impl ShellExecutor {
	pub fn new(config: ShellConfig) -> Self {
		Self { config }
	}

	/// Run `body` in `dir` and return what it printed on stdout.
	///
	/// A failing command ends the chain; its exit status is not an error and
	/// the output gathered up to that point is returned.
	pub fn execute(&self, body: &str, dir: &Path) -> MdocResult<String> {
		let command = join_commands(body);
		if command.is_empty() {
			return Ok(String::new());
		}

		if !dir.is_dir() {
			return Err(MdocError::ShellSpawn(format!(
				"working directory `{}` does not exist",
				dir.display()
			)));
		}

		tracing::debug!(command = %command, dir = %dir.display(), "executing shell code");

		let output = Command::new(&self.config.program)
			.args(&self.config.args)
			.arg(&command)
			.current_dir(dir)
			.stdin(Stdio::null())
			.output()
			.map_err(|e| MdocError::ShellSpawn(format!("`{}`: {e}", self.config.program)))?;

		if !output.status.success() {
			let stderr = String::from_utf8_lossy(&output.stderr);
			tracing::debug!(
				status = %output.status,
				stderr = %stderr.trim(),
				"shell command chain stopped early"
			);
		}

		Ok(String::from_utf8_lossy(&output.stdout).to_string())
	}
}

/// Join the non-blank lines of `body` into one short-circuiting command.
pub fn join_commands(body: &str) -> String {
	body.lines()
		.map(|line| line.trim_end_matches('\r'))
		.filter(|line| !line.trim().is_empty())
		.collect::<Vec<_>>()
		.join(AND_THEN)
}
