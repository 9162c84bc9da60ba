//! Scoped ownership of host callbacks
//!
//! Every listener and pending animation frame the host registers is held
//! as a `Subscription`. Dropping the guard deregisters it, so whichever
//! way the loop stops (crash, restart, teardown) nothing keeps firing into
//! a discarded session.

/// A registration that is undone when dropped
pub struct Subscription {
    name: &'static str,
    cancel: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    pub fn new(name: &'static str, cancel: impl FnOnce() + 'static) -> Self {
        Self {
            name,
            cancel: Some(Box::new(cancel)),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Deregister now
    pub fn cancel(mut self) {
        self.run_cancel();
    }

    fn run_cancel(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            log::debug!("Releasing {}", self.name);
            cancel();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.run_cancel();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("name", &self.name)
            .field("active", &self.cancel.is_some())
            .finish()
    }
}

/// Listeners owned by the host loop, released newest first
#[derive(Debug, Default)]
pub struct ListenerSet {
    subs: Vec<Subscription>,
}

impl ListenerSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, sub: Subscription) {
        self.subs.push(sub);
    }

    pub fn len(&self) -> usize {
        self.subs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subs.is_empty()
    }

    /// Deregister everything
    pub fn clear(&mut self) {
        while let Some(sub) = self.subs.pop() {
            sub.cancel();
        }
    }
}

impl Drop for ListenerSet {
    fn drop(&mut self) {
        self.clear();
    }
}

/// The animation frame a loop has queued, if any
///
/// Empty means the loop is stopped. The page cache can bring a stopped
/// page back with its session still running, so the host asks
/// `needs_resume` when the page is shown again.
#[derive(Debug, Default)]
pub struct FrameSlot {
    pending: Option<Subscription>,
}

impl FrameSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, sub: Subscription) {
        self.pending = Some(sub);
    }

    /// Claim the queued frame as it fires; `None` if the loop was stopped
    pub fn take(&mut self) -> Option<Subscription> {
        self.pending.take()
    }

    /// Cancel the queued frame
    pub fn stop(&mut self) {
        self.pending = None;
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// A running session with no frame queued has to be restarted
    pub fn needs_resume(&self, running: bool) -> bool {
        running && self.pending.is_none()
    }
}

#[cfg(target_arch = "wasm32")]
pub mod web {
    //! DOM registrations wrapped in guards

    use wasm_bindgen::JsCast;
    use wasm_bindgen::convert::FromWasmAbi;
    use wasm_bindgen::prelude::*;

    use super::Subscription;

    /// `addEventListener`, removed again when the guard drops
    pub fn listen<E: FromWasmAbi + 'static>(
        target: &web_sys::EventTarget,
        event: &'static str,
        handler: impl FnMut(E) + 'static,
    ) -> Result<Subscription, JsValue> {
        let closure = Closure::<dyn FnMut(E)>::new(handler);
        target.add_event_listener_with_callback(event, closure.as_ref().unchecked_ref())?;
        let target = target.clone();
        Ok(Subscription::new(event, move || {
            let _ = target.remove_event_listener_with_callback(event, closure.as_ref().unchecked_ref());
            drop(closure);
        }))
    }

    /// `requestAnimationFrame`, cancelled when the guard drops before it fires
    pub fn request_frame(window: &web_sys::Window, callback: &JsValue) -> Result<Subscription, JsValue> {
        let id = window.request_animation_frame(callback.unchecked_ref())?;
        let window = window.clone();
        Ok(Subscription::new("animation frame", move || {
            let _ = window.cancel_animation_frame(id);
        }))
    }
}
