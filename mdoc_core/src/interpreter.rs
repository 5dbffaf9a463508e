//! Persistent interactive interpreter sessions.
//!
//! An [`InterpreterExecutor`] keeps one child process alive across all code
//! blocks of its language during a pipeline run. Requests and responses are
//! paired with a sentinel: after every request the session asks the
//! interpreter to print its sentinel and reads output until the prompt
//! followed by the sentinel comes back.
//!
//! ```text
//! Stopped ──start──▶ Ready ──request──▶ Busy ──sentinel──▶ Ready
//!    ▲                  │                 │
//!    └──────stop────────┘◀──EOF/timeout───┘
//! ```
//!
//! Output is read on a dedicated thread and forwarded line by line over a
//! channel so the waiting side can apply a deadline.

use std::io::BufRead;
use std::io::BufReader;
use std::io::ErrorKind;
use std::io::Read;
use std::io::Write;
use std::path::Path;
use std::process::Child;
use std::process::ChildStdin;
use std::process::Command;
use std::process::Stdio;
use std::sync::mpsc;
use std::sync::mpsc::Receiver;
use std::sync::mpsc::RecvTimeoutError;
use std::sync::mpsc::Sender;
use std::thread;
use std::time::Duration;
use std::time::Instant;

use crate::InterpreterProfile;
use crate::MdocError;
use crate::MdocResult;

/// How long to keep collecting leftover output after the child has exited.
const DRAIN_GRACE: Duration = Duration::from_millis(100);
/// Poll interval while waiting for the child to exit.
const EXIT_POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Lifecycle of an interpreter session as seen between requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
	Stopped,
	Ready,
}

/// Drives one kind of interpreter for the duration of a pipeline run.
#[derive(Debug)]
pub struct InterpreterExecutor {
	name: String,
	profile: InterpreterProfile,
	session: Option<Session>,
	spawn_count: usize,
}

impl InterpreterExecutor {
	pub fn new(name: impl Into<String>, profile: InterpreterProfile) -> Self {
		Self {
			name: name.into(),
			profile,
			session: None,
			spawn_count: 0,
		}
	}

	pub fn name(&self) -> &str {
		&self.name
	}

	pub fn profile(&self) -> &InterpreterProfile {
		&self.profile
	}

	pub fn state(&self) -> SessionState {
		if self.session.is_some() {
			SessionState::Ready
		} else {
			SessionState::Stopped
		}
	}

	/// Number of child processes started so far.
	pub fn spawn_count(&self) -> usize {
		self.spawn_count
	}

	/// Run `body` with the interpreter working in `dir`, starting the session
	/// first if needed.
	///
	/// Any failure tears the session down; the next call starts a fresh one.
	pub fn execute(&mut self, body: &str, dir: &Path) -> MdocResult<String> {
		let command = self.build_command(body, dir);

		if self.session.is_none() {
			self.start()?;
		}

		let result = match self.session.as_mut() {
			Some(session) => session.request(&self.name, &self.profile, &command),
			None => Err(MdocError::InterpreterExited {
				name: self.name.clone(),
			}),
		};

		if let Err(e) = &result {
			tracing::warn!(interpreter = %self.name, error = %e, "request failed, stopping session");
			self.stop();
		}

		result
	}

	/// Close the session, if any. Safe to call repeatedly.
	pub fn stop(&mut self) {
		if let Some(session) = self.session.take() {
			tracing::debug!(interpreter = %self.name, "stopping interpreter");
			session.shutdown(&self.name, self.profile.shutdown_timeout());
		}
	}

	/// Turn a code block into the single line sent to the interpreter:
	/// comments stripped, blank statements dropped, statements joined by the
	/// profile separator and prefixed with a directory change to `dir`.
	pub fn build_command(&self, body: &str, dir: &Path) -> String {
		let mut statements: Vec<String> = Vec::new();

		if let Some(chdir) = self.profile.chdir_command(dir) {
			statements.push(chdir);
		}

		for line in body.lines() {
			let line = match &self.profile.comment {
				Some(marker) => line.find(marker.as_str()).map_or(line, |idx| &line[..idx]),
				None => line,
			};
			let line = line.trim();
			if !line.is_empty() {
				statements.push(line.to_string());
			}
		}

		statements.join(&self.profile.separator)
	}

	fn start(&mut self) -> MdocResult<()> {
		tracing::info!(interpreter = %self.name, command = %self.profile.command, "starting interpreter");
		let session = Session::spawn(&self.name, &self.profile)?;
		self.spawn_count += 1;
		self.session = Some(session);
		tracing::info!(interpreter = %self.name, "interpreter ready");
		Ok(())
	}
}

impl Drop for InterpreterExecutor {
	fn drop(&mut self) {
		self.stop();
	}
}

/// A live child process with its input pipe and output channel.
#[derive(Debug)]
struct Session {
	child: Child,
	stdin: Option<ChildStdin>,
	lines: Receiver<String>,
}

impl Session {
	/// Spawn the child and wait until it echoes the sentinel once, which
	/// means its startup banner has been consumed.
	fn spawn(name: &str, profile: &InterpreterProfile) -> MdocResult<Self> {
		let spawn_error = |reason: String| {
			MdocError::InterpreterSpawn {
				name: name.to_string(),
				reason,
			}
		};

		let mut child = Command::new(&profile.command)
			.args(&profile.args)
			.stdin(Stdio::piped())
			.stdout(Stdio::piped())
			.stderr(Stdio::piped())
			.spawn()
			.map_err(|e| spawn_error(format!("`{}`: {e}", profile.command)))?;

		let stdin = child.stdin.take();
		let stdout = child.stdout.take();
		let stderr = child.stderr.take();
		let (Some(stdout), Some(stderr)) = (stdout, stderr) else {
			let _ = child.kill();
			let _ = child.wait();
			return Err(spawn_error("failed to capture output streams".to_string()));
		};

		let (tx, rx) = mpsc::channel();
		let spawned = spawn_stdout_reader(name, stdout, tx)
			.and_then(|()| spawn_stderr_logger(name, stderr));
		if let Err(e) = spawned {
			let _ = child.kill();
			let _ = child.wait();
			return Err(spawn_error(e.to_string()));
		}

		let mut session = Self {
			child,
			stdin,
			lines: rx,
		};

		let deadline = profile.timeout().map(|timeout| Instant::now() + timeout);
		let synced = session
			.send_line(name, &profile.echo_command())
			.and_then(|()| session.read_until_sentinel(name, profile, deadline));

		match synced {
			Ok(banner) => {
				tracing::debug!(interpreter = name, banner = %banner, "interpreter startup output");
				Ok(session)
			}
			Err(e) => {
				session.shutdown(name, Duration::ZERO);
				Err(e)
			}
		}
	}

	fn request(
		&mut self,
		name: &str,
		profile: &InterpreterProfile,
		command: &str,
	) -> MdocResult<String> {
		tracing::debug!(interpreter = name, command = %command, "sending code to interpreter");

		let deadline = profile.timeout().map(|timeout| Instant::now() + timeout);
		if !command.is_empty() {
			self.send_line(name, command)?;
		}
		self.send_line(name, &profile.echo_command())?;

		let mut output = self.read_until_sentinel(name, profile, deadline)?;
		let trimmed_len = output.trim_end_matches(['\n', '\r']).len();
		output.truncate(trimmed_len);

		Ok(output)
	}

	fn send_line(&mut self, name: &str, line: &str) -> MdocResult<()> {
		let Some(stdin) = self.stdin.as_mut() else {
			return Err(MdocError::InterpreterExited {
				name: name.to_string(),
			});
		};

		let written = stdin
			.write_all(line.as_bytes())
			.and_then(|()| stdin.write_all(b"\n"))
			.and_then(|()| stdin.flush());

		written.map_err(|e| {
			if e.kind() == ErrorKind::BrokenPipe {
				MdocError::InterpreterExited {
					name: name.to_string(),
				}
			} else {
				MdocError::InterpreterIo {
					name: name.to_string(),
					reason: e.to_string(),
				}
			}
		})
	}

	/// Collect output lines until the ready marker appears. Leading prompts
	/// are removed and lines that held only prompts are dropped.
	fn read_until_sentinel(
		&self,
		name: &str,
		profile: &InterpreterProfile,
		deadline: Option<Instant>,
	) -> MdocResult<String> {
		let marker = profile.ready_marker();
		let mut output = String::new();

		loop {
			let line = self.next_line(name, profile, deadline)?;
			tracing::trace!(interpreter = name, line = %line, "interpreter output");

			if line.contains(&marker) {
				return Ok(output);
			}

			let Some(text) = strip_prompts(&line, &profile.prompt) else {
				continue;
			};

			output.push_str(text);
			output.push('\n');
		}
	}

	fn next_line(
		&self,
		name: &str,
		profile: &InterpreterProfile,
		deadline: Option<Instant>,
	) -> MdocResult<String> {
		let exited = || {
			MdocError::InterpreterExited {
				name: name.to_string(),
			}
		};

		let Some(deadline) = deadline else {
			return self.lines.recv().map_err(|_| exited());
		};

		let remaining = deadline.saturating_duration_since(Instant::now());
		self.lines.recv_timeout(remaining).map_err(|e| {
			match e {
				RecvTimeoutError::Timeout => {
					MdocError::InterpreterTimeout {
						name: name.to_string(),
						seconds: profile.timeout_secs.unwrap_or_default(),
					}
				}
				RecvTimeoutError::Disconnected => exited(),
			}
		})
	}

	/// Close stdin, give the child `grace` to exit, then kill it. Leftover
	/// output is logged.
	fn shutdown(mut self, name: &str, grace: Duration) {
		drop(self.stdin.take());

		let deadline = Instant::now() + grace;
		loop {
			match self.child.try_wait() {
				Ok(Some(status)) => {
					tracing::debug!(interpreter = name, %status, "interpreter exited");
					break;
				}
				Ok(None) if Instant::now() < deadline => thread::sleep(EXIT_POLL_INTERVAL),
				Ok(None) => {
					tracing::warn!(interpreter = name, "interpreter did not exit in time, killing it");
					let _ = self.child.kill();
					let _ = self.child.wait();
					break;
				}
				Err(e) => {
					tracing::warn!(interpreter = name, error = %e, "failed to wait for interpreter");
					let _ = self.child.kill();
					let _ = self.child.wait();
					break;
				}
			}
		}

		let mut leftover = Vec::new();
		while let Ok(line) = self.lines.recv_timeout(DRAIN_GRACE) {
			leftover.push(line);
		}
		if !leftover.is_empty() {
			tracing::debug!(
				interpreter = name,
				output = %leftover.join("\n"),
				"interpreter output after shutdown"
			);
		}
	}
}

/// Remove the prompts an interpreter printed in front of `line`.
///
/// The prompt is written without a line break, so output shares a line with
/// it (`>> 5`). Returns `None` when the line held nothing but prompts.
pub fn strip_prompts<'a>(line: &'a str, prompt: &str) -> Option<&'a str> {
	if prompt.is_empty() {
		return Some(line);
	}

	let bare = prompt.trim_end();
	let mut rest = line;
	let mut stripped = false;

	loop {
		if let Some(after) = rest.strip_prefix(prompt) {
			rest = after;
			stripped = true;
		} else if !bare.is_empty() && rest.trim_end() == bare {
			rest = "";
			stripped = true;
			break;
		} else {
			break;
		}
	}

	if stripped && rest.trim().is_empty() {
		None
	} else {
		Some(rest)
	}
}

fn spawn_stdout_reader(
	name: &str,
	stdout: impl Read + Send + 'static,
	tx: Sender<String>,
) -> std::io::Result<()> {
	let name = name.to_string();
	thread::Builder::new()
		.name(format!("mdoc-{name}-stdout"))
		.spawn(move || {
			let mut reader = BufReader::new(stdout);
			let mut buf = Vec::new();
			loop {
				buf.clear();
				match reader.read_until(b'\n', &mut buf) {
					Ok(0) => break,
					Ok(_) => {
						let line = String::from_utf8_lossy(&buf);
						let line = line.trim_end_matches(['\n', '\r']).to_string();
						if tx.send(line).is_err() {
							break;
						}
					}
					Err(e) => {
						tracing::warn!(interpreter = %name, error = %e, "error reading interpreter output");
						break;
					}
				}
			}
		})
		.map(|_| ())
}

fn spawn_stderr_logger(name: &str, stderr: impl Read + Send + 'static) -> std::io::Result<()> {
	let name = name.to_string();
	thread::Builder::new()
		.name(format!("mdoc-{name}-stderr"))
		.spawn(move || {
			let reader = BufReader::new(stderr);
			for line in reader.lines() {
				match line {
					Ok(text) if text.is_empty() => {}
					Ok(text) => tracing::warn!(interpreter = %name, "{text}"),
					Err(_) => break,
				}
			}
		})
		.map(|_| ())
}
