pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Connecting to {url} timed out.")]
	ConnectTimeout { url: String },
	#[error("Request to {url} timed out.")]
	Timeout { url: String },
	#[error("Failed to connect to {url}.")]
	Connect { url: String, source: reqwest::Error },
	#[error("{url} returned HTTP {status}: {body}")]
	Status { url: String, status: u16, body: String },
	#[error(transparent)]
	Reqwest(#[from] reqwest::Error),
	#[error(transparent)]
	SerdeJson(#[from] serde_json::Error),
	#[error(transparent)]
	InvalidHeaderName(#[from] reqwest::header::InvalidHeaderName),
	#[error(transparent)]
	InvalidHeaderValue(#[from] reqwest::header::InvalidHeaderValue),
	#[error("{message}")]
	InvalidConfig { message: String },
	#[error("{message}")]
	InvalidResponse { message: String },
}
impl Error {
	pub(crate) fn transport(url: &str, err: reqwest::Error) -> Self {
		let url = url.to_string();

		if err.is_timeout() {
			if err.is_connect() {
				return Self::ConnectTimeout { url };
			}

			return Self::Timeout { url };
		}
		if err.is_connect() {
			return Self::Connect { url, source: err };
		}
		if err.is_decode() {
			return Self::InvalidResponse {
				message: format!("{url} returned a body that is not valid JSON."),
			};
		}

		Self::Reqwest(err)
	}

	pub(crate) fn invalid_response(message: impl Into<String>) -> Self {
		Self::InvalidResponse { message: message.into() }
	}

	/// Short label for structured logs.
	pub fn kind(&self) -> &'static str {
		match self {
			Self::ConnectTimeout { .. } => "connect_timeout",
			Self::Timeout { .. } => "timeout",
			Self::Connect { .. } => "connect",
			Self::Status { .. } => "status",
			Self::Reqwest(_) => "transport",
			Self::SerdeJson(_) => "decode",
			Self::InvalidHeaderName(_) | Self::InvalidHeaderValue(_) | Self::InvalidConfig { .. } =>
				"config",
			Self::InvalidResponse { .. } => "invalid_response",
		}
	}

	pub fn is_timeout(&self) -> bool {
		matches!(self, Self::ConnectTimeout { .. } | Self::Timeout { .. })
	}

	/// Likely cause of an HTTP status failure from a collection search backend.
	pub fn hint(&self) -> Option<&'static str> {
		match self {
			Self::Status { status: 401, .. } => Some("API key is invalid or expired."),
			Self::Status { status: 403, .. } => Some("API key has no access to this collection."),
			Self::Status { status: 404, .. } =>
				Some("Collection does not exist or the request path is misconfigured."),
			Self::ConnectTimeout { .. } | Self::Connect { .. } =>
				Some("Check the backend address and network reachability."),
			Self::Timeout { .. } => Some("Backend is slow or the collection is very large."),
			_ => None,
		}
	}
}
