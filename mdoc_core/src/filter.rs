use crate::MdocResult;

/// A single text transformation stage.
///
/// A filter receives the whole document and returns the transformed
/// document. It may hold state (for example a running interpreter) for the
/// duration of one `run` call, but must release it before returning.
pub trait Filter {
	/// Short identifier used in progress output.
	fn name(&self) -> &'static str;

	/// Transform `document`.
	fn run(&mut self, document: &str) -> MdocResult<String>;
}
