//! Shared test fixtures for the sub-controller unit tests.

use std::sync::Arc;

use sushi_core::HostConfig;
use sushi_session::BuildInfo;

use crate::engine::Engine;

pub fn test_engine() -> Arc<Engine> {
    let build_info = BuildInfo {
        version: env!("CARGO_PKG_VERSION").to_string(),
        build_options: vec![],
        build_date: "test".into(),
        commit_hash: "unknown".into(),
        audio_block_size: 64,
    };
    Arc::new(Engine::new(HostConfig::default(), build_info, 2, 2, 8, 8))
}
