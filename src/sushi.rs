//! The `Sushi` handle: wires [`Engine`], the [`SushiController`] façade,
//! and (optionally) a concrete [`OscFrontend`] together behind one
//! constructible type (spec.md §4.K external interfaces, §9's "wiring" and
//! "process entry point").
//!
//! Grounded on `tutti`'s `TuttiEngine`/`TuttiEngineBuilder` split
//! (`src/engine.rs`, `src/builder.rs`): a plain builder assembles optional
//! subsystems, then `build()` returns one handle the caller drives.

use std::sync::Arc;
use std::thread::JoinHandle;

use sushi_control::engine::Engine;
use sushi_control::SushiController;
use sushi_osc::OscFrontend;
use sushi_session::BuildInfo;

use crate::config::EngineArgs;
use crate::osc_adapter::OscBackendHandle;
use crate::Result;

/// Build-time identifiers captured by `build.rs`, exposed through
/// [`sushi_control::controllers::system::SystemController::get_sushi_build_info`].
fn build_info(audio_block_size: usize) -> BuildInfo {
    BuildInfo {
        version: env!("CARGO_PKG_VERSION").to_string(),
        build_options: Vec::new(),
        build_date: env!("SUSHI_BUILD_DATE").to_string(),
        commit_hash: env!("SUSHI_COMMIT_HASH").to_string(),
        audio_block_size,
    }
}

/// Assembles a [`Sushi`] instance. OSC is opt-in: call [`SushiBuilder::osc`]
/// to attach a frontend, or leave it unset to run with the façade's `osc`
/// sub-controller reporting `ControlStatus::UnsupportedOperation`.
pub struct SushiBuilder {
    args: EngineArgs,
}

impl Default for SushiBuilder {
    fn default() -> Self {
        Self { args: EngineArgs::default() }
    }
}

impl SushiBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn args(mut self, args: EngineArgs) -> Self {
        self.args = args;
        self
    }

    pub fn build(self) -> Result<Sushi> {
        self.args.host_config.validate()?;

        let engine = Arc::new(Engine::new(
            self.args.host_config.clone(),
            build_info(self.args.host_config.audio_block_size),
            self.args.num_midi_input_ports,
            self.args.num_midi_output_ports,
            self.args.input_audio_channels,
            self.args.output_audio_channels,
        ));
        let controller = Arc::new(SushiController::new(engine.clone()));

        let mut osc_frontend = None;
        let mut osc_receive_thread = None;
        if let Some(osc_args) = &self.args.osc {
            let frontend = OscFrontend::new(&controller, osc_args.receive_port, &osc_args.send_ip, osc_args.send_port)?;
            let backend: Box<dyn sushi_control::controllers::osc::OscBackend> =
                Box::new(OscBackendHandle(frontend.clone()));
            engine.osc.attach(Arc::new(backend));
            osc_receive_thread = Some(frontend.start());
            osc_frontend = Some(frontend);
        }

        Ok(Sushi { engine, controller, osc_frontend, osc_receive_thread })
    }
}

/// A fully wired control plane: the shared [`Engine`] state, the
/// [`SushiController`] façade external clients drive, and (if configured)
/// the OSC frontend's background receive thread.
pub struct Sushi {
    engine: Arc<Engine>,
    controller: Arc<SushiController>,
    osc_frontend: Option<Arc<OscFrontend>>,
    osc_receive_thread: Option<JoinHandle<()>>,
}

impl Sushi {
    pub fn builder() -> SushiBuilder {
        SushiBuilder::new()
    }

    /// The controller façade (spec.md §4.H): every sub-controller an
    /// external client needs is reachable from here.
    pub fn controller(&self) -> &Arc<SushiController> {
        &self.controller
    }

    /// The shared engine state. The RT audio callback and the control
    /// worker thread both drive this directly; see [`Engine`]'s doc
    /// comment for the threading model.
    pub fn engine(&self) -> &Arc<Engine> {
        &self.engine
    }

    /// The attached OSC frontend, if [`SushiBuilder::args`] configured one.
    pub fn osc_frontend(&self) -> Option<&Arc<OscFrontend>> {
        self.osc_frontend.as_ref()
    }

    /// Stop the OSC receive thread and join it. A no-op if no OSC frontend
    /// is attached.
    pub fn shutdown_osc(&mut self) {
        if let Some(frontend) = &self.osc_frontend {
            frontend.stop();
        }
        if let Some(handle) = self.osc_receive_thread.take() {
            let _ = handle.join();
        }
    }
}
