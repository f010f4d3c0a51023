pub mod config;
pub mod dtos;
pub mod handlers;
pub mod models;
pub mod services;
pub mod startup;

use config::Settings;
use services::providers::VisionProvider;
use services::session_gate::SessionGate;
use std::sync::Arc;

/// Shared application state: settings, the domain gate, and the vision
/// provider the transcription routes forward to.
#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub gate: SessionGate,
    pub vision_provider: Arc<dyn VisionProvider>,
}

impl AppState {
    pub fn new(settings: Settings, vision_provider: Arc<dyn VisionProvider>) -> Self {
        let gate = SessionGate::new(settings.access.allowed_domain.clone());
        Self {
            settings: Arc::new(settings),
            gate,
            vision_provider,
        }
    }
}
