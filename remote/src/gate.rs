use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;

/// Tracks whether the hub is ready for the next frame.
///
/// The state lives in a single-slot signal, so a ready notification that
/// arrives while nobody waits is kept until the next `await_ready`.
pub struct ReadyGate {
    ready: Signal<CriticalSectionRawMutex, ()>,
}

impl ReadyGate {
    pub const fn new() -> Self {
        ReadyGate {
            ready: Signal::new(),
        }
    }

    /// Marks the hub as ready. Signaling an already ready gate does nothing.
    pub fn signal(&self) {
        self.ready.signal(());
    }

    pub fn is_ready(&self) -> bool {
        self.ready.signaled()
    }

    /// Waits until the hub is ready. Does not change the state.
    pub async fn await_ready(&self) {
        self.ready.wait().await;
        // `wait` takes the signal, put it back
        self.ready.signal(());
    }

    /// Takes the ready state. Returns false if the gate was not ready.
    pub fn consume(&self) -> bool {
        self.ready.try_take().is_some()
    }
}

impl Default for ReadyGate {
    fn default() -> Self {
        ReadyGate::new()
    }
}
