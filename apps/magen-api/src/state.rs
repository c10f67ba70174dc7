use std::sync::Arc;

use magen_service::MagenService;

#[derive(Clone)]
pub struct AppState {
	pub service: Arc<MagenService>,
}
impl AppState {
	pub fn new(config: magen_config::Config) -> color_eyre::Result<Self> {
		let service = MagenService::new(config)?;

		Ok(Self { service: Arc::new(service) })
	}

	pub fn with_service(service: MagenService) -> Self {
		Self { service: Arc::new(service) }
	}
}
