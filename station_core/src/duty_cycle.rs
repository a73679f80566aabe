//! Power-on window with a single activity extension per cycle.

use station_traits::Millis;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowState {
    Off,
    On,
    /// The window ran out on this tick and has been powered down.
    Expired,
}

/// Tracks how long a peripheral may stay powered.
///
/// `powered_at` is `Some` exactly while the window is on.
#[derive(Debug, Clone)]
pub struct DutyCycleWindow {
    default_on_ms: Millis,
    total_on_ms: Millis,
    powered_at: Option<Millis>,
    extended: bool,
}

impl DutyCycleWindow {
    pub const fn new(default_on_ms: Millis) -> Self {
        Self {
            default_on_ms,
            total_on_ms: default_on_ms,
            powered_at: None,
            extended: false,
        }
    }

    /// Open a new window. Returns false if already on.
    pub fn power_up(&mut self, now: Millis) -> bool {
        if self.powered_at.is_some() {
            return false;
        }
        self.powered_at = Some(now);
        self.total_on_ms = self.default_on_ms;
        self.extended = false;
        tracing::debug!(now, on_ms = self.total_on_ms, "window opened");
        true
    }

    /// Close the window. Returns false if already off.
    pub fn power_down(&mut self) -> bool {
        if self.powered_at.take().is_none() {
            return false;
        }
        tracing::debug!("window closed");
        true
    }

    pub fn tick(&mut self, now: Millis) -> WindowState {
        match self.powered_at {
            None => WindowState::Off,
            Some(start) if now.wrapping_sub(start) > self.total_on_ms => {
                tracing::debug!(
                    elapsed_ms = now.wrapping_sub(start),
                    on_ms = self.total_on_ms,
                    "window expired"
                );
                self.power_down();
                WindowState::Expired
            }
            Some(_) => WindowState::On,
        }
    }

    /// Add `elapsed` to this cycle's on-time, once. Returns whether it applied.
    pub fn extend_once(&mut self, elapsed: Millis) -> bool {
        if self.extended || self.powered_at.is_none() {
            return false;
        }
        self.extended = true;
        self.total_on_ms = self.total_on_ms.saturating_add(elapsed);
        tracing::debug!(
            extra_ms = elapsed,
            on_ms = self.total_on_ms,
            "window extended"
        );
        true
    }

    /// On-time so far, `None` while off.
    pub fn elapsed(&self, now: Millis) -> Option<Millis> {
        self.powered_at.map(|start| now.wrapping_sub(start))
    }

    pub const fn is_on(&self) -> bool {
        self.powered_at.is_some()
    }

    pub const fn is_extended(&self) -> bool {
        self.extended
    }

    pub const fn total_on_ms(&self) -> Millis {
        self.total_on_ms
    }
}
