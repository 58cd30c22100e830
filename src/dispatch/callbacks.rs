//! Callback registration and simulation lifecycle on [`Gpi`].

use tracing::{debug, info, warn};

use crate::backend::{Backend, BackendId, SimPhase, SimTime};
use crate::callback::{CallbackKind, CbId, Decoded, RemoveOutcome, UserCallback};
use crate::embed::{EmbedBridge, EmbedPhase, SimEvent};
use crate::error::{GpiError, GpiResult};
use crate::loader;
use crate::logging::{log_at, LogLevel};
use crate::object::{Edge, ObjId, RawHandle};

use super::Gpi;

impl Gpi {
    /// One-shot callback after `delay` time units.
    pub fn register_timed_callback<F>(&self, delay: SimTime, func: F) -> GpiResult<CbId>
    where
        F: FnMut(&Gpi) -> GpiResult<()> + 'static,
    {
        let backend = self.first_backend()?;
        self.arm_callback(backend, CallbackKind::Timed { delay }, Box::new(func), |b, cb| {
            b.register_timed_callback(cb, delay)
        })
    }

    /// Recurring callback on value changes of `signal` that pass `edge`.
    pub fn register_value_change_callback<F>(&self, signal: ObjId, edge: Edge, func: F) -> GpiResult<CbId>
    where
        F: FnMut(&Gpi) -> GpiResult<()> + 'static,
    {
        let obj = self.signal(signal, "register_value_change_callback")?;
        let backend = obj.backend().ok_or(GpiError::InvalidHandle(signal))?;
        self.arm_callback(backend, CallbackKind::ValueChange { signal, edge }, Box::new(func), |b, cb| {
            b.register_value_change_callback(cb, &obj)
        })
    }

    /// One-shot callback in the read-only phase.
    pub fn register_readonly_callback<F>(&self, func: F) -> GpiResult<CbId>
    where
        F: FnMut(&Gpi) -> GpiResult<()> + 'static,
    {
        let backend = self.first_backend()?;
        self.arm_callback(backend, CallbackKind::ReadOnly, Box::new(func), |b, cb| {
            b.register_readonly_callback(cb)
        })
    }

    /// One-shot callback at the start of the next time step.
    pub fn register_nexttime_callback<F>(&self, func: F) -> GpiResult<CbId>
    where
        F: FnMut(&Gpi) -> GpiResult<()> + 'static,
    {
        let backend = self.first_backend()?;
        self.arm_callback(backend, CallbackKind::NextTime, Box::new(func), |b, cb| {
            b.register_nexttime_callback(cb)
        })
    }

    /// One-shot callback in the read-write phase.
    pub fn register_readwrite_callback<F>(&self, func: F) -> GpiResult<CbId>
    where
        F: FnMut(&Gpi) -> GpiResult<()> + 'static,
    {
        let backend = self.first_backend()?;
        self.arm_callback(backend, CallbackKind::ReadWrite, Box::new(func), |b, cb| {
            b.register_readwrite_callback(cb)
        })
    }

    fn arm_callback(
        &self,
        backend: BackendId,
        kind: CallbackKind,
        func: UserCallback,
        register: impl FnOnce(&dyn Backend, CbId) -> GpiResult<RawHandle>,
    ) -> GpiResult<CbId> {
        if self.is_ending() {
            return Err(GpiError::SimulationEnding);
        }

        let id = self.callbacks.create(backend, kind, func);
        match self.with_backend(backend, |b| register(b, id)) {
            Ok(Ok(native)) => {
                self.callbacks.arm(id, native);
                debug!(%id, ?kind, %native, "callback armed");
                Ok(id)
            }
            Ok(Err(e)) | Err(e) => {
                self.callbacks.discard(id);
                warn!(?kind, error = %e, "callback registration failed");
                Err(e)
            }
        }
    }

    /// Remove a callback.
    ///
    /// After this returns the user function will not run again, whatever the
    /// outcome. [`RemoveOutcome::Deferred`] means the vendor teardown is still
    /// pending.
    pub fn remove_callback(&self, id: CbId) -> GpiResult<RemoveOutcome> {
        self.callbacks.remove(self, id)
    }

    /// Deliver a vendor firing for a known callback.
    pub fn handle_callback(&self, id: CbId) {
        self.callbacks.dispatch(self, id);
    }

    /// Deliver a vendor firing from its raw user-data word.
    ///
    /// A word that fails the consistency check is logged at critical level
    /// and ends the simulation. A word for an already retired callback is
    /// dropped.
    pub fn handle_raw_callback(&self, user_data: u64) -> GpiResult<()> {
        match self.callbacks.decode(user_data) {
            Decoded::Live(id) => {
                self.handle_callback(id);
                Ok(())
            }
            Decoded::Stale(id) => {
                debug!(%id, "dropping firing for retired callback");
                Ok(())
            }
            Decoded::Corrupt => {
                log_at(
                    LogLevel::Critical,
                    "callback",
                    &format!("callback user data {user_data:#018x} failed consistency check"),
                );
                self.sim_end();
                Err(GpiError::CorruptCallback { user_data })
            }
        }
    }

    // ------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------

    /// Arm the start- and end-of-simulation callbacks on the first backend.
    pub fn install_phase_callbacks(&self) -> GpiResult<()> {
        let backend = self.first_backend()?;
        self.arm_callback(
            backend,
            CallbackKind::Phase(SimPhase::Start),
            Box::new(Gpi::on_sim_start),
            |b, cb| b.register_phase_callback(cb, SimPhase::Start),
        )?;
        self.arm_callback(
            backend,
            CallbackKind::Phase(SimPhase::End),
            Box::new(Gpi::on_sim_end),
            |b, cb| b.register_phase_callback(cb, SimPhase::End),
        )?;
        Ok(())
    }

    /// Start of simulation: load extra libraries, start the interpreter, then
    /// run user entry points.
    pub fn on_sim_start(&self) -> GpiResult<()> {
        let backend = self.first_backend()?;
        let (args, product, version) = self.with_backend(backend, |b| {
            (b.sim_args(), b.simulator_product(), b.simulator_version())
        })?;
        info!(product = %product, version = %version, "simulation started");

        loader::load_entry_points(&self.config().extra_libs)?;
        self.embed_init(&args)?;
        loader::load_entry_points(&self.config().users)
    }

    /// End of simulation: stop the interpreter and release everything.
    pub fn on_sim_end(&self) -> GpiResult<()> {
        self.embed_end("simulation ended");
        self.finalize();
        Ok(())
    }

    /// Install the interpreter bridge.
    pub fn set_embed(&self, bridge: Box<dyn EmbedBridge>) {
        match self.embed.try_borrow_mut() {
            Ok(mut slot) => *slot = Some(bridge),
            Err(_) => warn!("interpreter bridge busy; not replaced"),
        }
    }

    /// Start the interpreter. Runs at most once.
    pub fn embed_init(&self, args: &[String]) -> GpiResult<()> {
        if self.embed_phase.get() != EmbedPhase::Idle {
            debug!("interpreter already started");
            return Ok(());
        }
        let mut slot = self.embed.try_borrow_mut().map_err(|_| GpiError::Embed {
            message: "interpreter bridge busy".to_string(),
        })?;
        self.embed_phase.set(EmbedPhase::Running);
        match slot.as_mut() {
            Some(bridge) => bridge.embed_init(args),
            None => {
                debug!("no interpreter bridge installed");
                Ok(())
            }
        }
    }

    /// Stop the interpreter. Runs at most once, and only after a start.
    pub fn embed_end(&self, message: &str) {
        if self.embed_phase.replace(EmbedPhase::Ended) != EmbedPhase::Running {
            return;
        }
        match self.embed.try_borrow_mut() {
            Ok(mut slot) => {
                if let Some(bridge) = slot.as_mut() {
                    bridge.embed_end(message);
                }
            }
            Err(_) => warn!("interpreter bridge busy; end notice dropped"),
        }
    }

    /// Forward an event to a running interpreter.
    pub fn embed_event(&self, event: SimEvent, message: &str) {
        if self.embed_phase.get() != EmbedPhase::Running {
            debug!(%event, "interpreter not running; event dropped");
            return;
        }
        match self.embed.try_borrow_mut() {
            Ok(mut slot) => {
                if let Some(bridge) = slot.as_mut() {
                    bridge.embed_event(event, message);
                }
            }
            Err(_) => warn!(%event, "interpreter bridge busy; event dropped"),
        }
    }

    /// Unrecoverable error: tell the interpreter, stop it, end the run.
    pub fn fatal(&self, message: &str) {
        log_at(LogLevel::Critical, "gpi", message);
        self.embed_event(SimEvent::Fatal, message);
        self.embed_end(message);
        self.sim_end();
    }
}
