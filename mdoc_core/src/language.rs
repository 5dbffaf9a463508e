use std::collections::BTreeMap;
use std::fmt;

use crate::InterpreterProfile;

/// Result text substituted for blocks in a language nobody can run.
pub const UNSUPPORTED_LANGUAGE_MESSAGE: &str = "ERROR: Code language is not supported.";

/// Tags handled by the one-shot shell executor.
pub const SHELL_TAGS: &[&str] = &["sh", "bash", "shell"];

/// The executor a code block is dispatched to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Language {
	/// Run through a fresh shell process.
	Shell,
	/// Run in the persistent interpreter registered under this name.
	Interpreter(String),
	/// No executor knows this tag.
	Unsupported(String),
}

impl Language {
	/// Resolve a fence language tag. Interpreter profiles (names and aliases)
	/// are consulted before the shell tags.
	pub fn resolve(tag: &str, profiles: &BTreeMap<String, InterpreterProfile>) -> Self {
		if let Some((name, _)) = profiles
			.iter()
			.find(|(name, profile)| profile.matches(name, tag))
		{
			return Self::Interpreter(name.clone());
		}

		if SHELL_TAGS.contains(&tag) {
			return Self::Shell;
		}

		Self::Unsupported(tag.to_string())
	}

	pub fn is_supported(&self) -> bool {
		!matches!(self, Self::Unsupported(_))
	}
}

impl fmt::Display for Language {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Shell => write!(f, "shell"),
			Self::Interpreter(name) => write!(f, "{name}"),
			Self::Unsupported(tag) => write!(f, "unsupported ({tag})"),
		}
	}
}
