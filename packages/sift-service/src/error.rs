pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Invalid request: {field} {message}")]
	InvalidRequest { field: String, message: String },
	#[error("Provider error: {message}")]
	Provider { message: String },
	#[error("Decision contract violated: {message}")]
	DecisionContract { message: String },
	#[error("Internal error: {message}")]
	Internal { message: String },
}
impl Error {
	pub(crate) fn invalid(field: &str, message: impl Into<String>) -> Self {
		Self::InvalidRequest { field: field.to_string(), message: message.into() }
	}

	/// Builds an error from a caught panic payload.
	pub(crate) fn panicked(payload: Box<dyn std::any::Any + Send>) -> Self {
		let message = payload
			.downcast_ref::<&str>()
			.map(|s| s.to_string())
			.or_else(|| payload.downcast_ref::<String>().cloned())
			.unwrap_or_else(|| "task panicked".to_string());

		Self::Internal { message }
	}
}

impl From<sift_providers::Error> for Error {
	fn from(err: sift_providers::Error) -> Self {
		Self::Provider { message: err.to_string() }
	}
}
