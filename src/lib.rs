pub mod app_state;
pub mod class_names;
pub mod error;
pub mod io_struct;
pub mod normalize;
pub mod server;
pub mod storage;
pub mod upstream;

use app_state::{AppConfig, AppState};
use server::{init_logging, startup};

pub struct Gateway {
    config: AppConfig,
}

impl Gateway {
    pub fn new(config: AppConfig) -> Self {
        Gateway { config }
    }

    pub fn start(&self) -> anyhow::Result<()> {
        init_logging(&self.config.log_level);
        let app_state = AppState::new(self.config.clone())
            .map_err(|e| anyhow::anyhow!("Failed to build gateway: {}", e))?;

        actix_web::rt::System::new().block_on(startup(self.config.clone(), app_state))?;
        Ok(())
    }
}
