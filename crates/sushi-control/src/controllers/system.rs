//! System sub-controller: pure reads about the running build (spec.md
//! §4.G System).

use std::sync::Arc;

use crate::engine::Engine;
use sushi_session::BuildInfo;

pub struct SystemController {
    engine: Arc<Engine>,
}

impl SystemController {
    pub fn new(engine: Arc<Engine>) -> Self {
        Self { engine }
    }

    pub fn get_sushi_version(&self) -> String {
        self.engine.build_info.version.clone()
    }

    pub fn get_sushi_build_info(&self) -> BuildInfo {
        self.engine.build_info.clone()
    }

    pub fn get_input_audio_channel_count(&self) -> usize {
        self.engine.input_audio_channels
    }

    pub fn get_output_audio_channel_count(&self) -> usize {
        self.engine.output_audio_channels
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests_support::test_engine;

    #[test]
    fn reports_configured_channel_counts() {
        let engine = test_engine();
        let system = SystemController::new(engine);
        assert_eq!(system.get_input_audio_channel_count(), 8);
        assert_eq!(system.get_output_audio_channel_count(), 8);
        assert!(!system.get_sushi_version().is_empty());
    }
}
