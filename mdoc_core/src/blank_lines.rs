use crate::Filter;
use crate::MdocResult;

/// Collapses doubled line breaks: every non-overlapping `\n\n` becomes `\n`.
#[derive(Debug, Clone, Copy, Default)]
pub struct BlankLineFilter;

impl Filter for BlankLineFilter {
	fn name(&self) -> &'static str {
		"blank-lines"
	}

	fn run(&mut self, document: &str) -> MdocResult<String> {
		Ok(collapse_blank_lines(document))
	}
}

pub fn collapse_blank_lines(document: &str) -> String {
	document.replace("\n\n", "\n")
}
