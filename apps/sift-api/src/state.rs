use std::sync::Arc;

use sift_service::SiftService;

#[derive(Clone)]
pub struct AppState {
	pub service: Arc<SiftService>,
}
impl AppState {
	pub fn new(config: sift_config::Config) -> Self {
		Self { service: Arc::new(SiftService::new(config)) }
	}
}
