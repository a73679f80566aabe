//! Power-windowed serial peripheral driven one tick at a time.

use eyre::WrapErr;
use station_traits::{ByteStream, Clock, PowerSwitch};

use crate::error::Result;
use crate::frame::FrameAccumulator;
use crate::duty_cycle::{DutyCycleWindow, WindowState};
use crate::hw_error::map_hw_error;
use crate::session::{Outbox, SessionEvent, SessionProtocol};

/// A serial device behind a power switch, speaking protocol `D`.
pub struct Peripheral<B, P, D, C> {
    stream: B,
    power: P,
    protocol: D,
    clock: C,
    window: DutyCycleWindow,
    frames: FrameAccumulator,
    outbox: Outbox,
}

impl<B, P, D, C> Peripheral<B, P, D, C>
where
    B: ByteStream,
    P: PowerSwitch,
    D: SessionProtocol,
    C: Clock,
{
    pub fn new(stream: B, power: P, protocol: D, clock: C) -> Self {
        let window = DutyCycleWindow::new(protocol.on_ms());
        let frames = FrameAccumulator::new(protocol.frame_capacity(), protocol.terminators());
        Self {
            stream,
            power,
            protocol,
            clock,
            window,
            frames,
            outbox: Outbox::new(),
        }
    }

    /// Switch the device on and open a fresh window. No-op if already on.
    pub fn power_up(&mut self) -> Result<()> {
        if self.window.is_on() {
            return Ok(());
        }
        self.power
            .set_on()
            .map_err(|e| eyre::Report::new(map_hw_error(&*e)))
            .wrap_err_with(|| format!("{} power on", self.protocol.name()))?;
        let now = self.clock.now_ms();
        self.window.power_up(now);
        self.frames.reset();
        self.protocol.on_power_up(now);
        tracing::info!(device = self.protocol.name(), "powered up");
        Ok(())
    }

    /// Switch the device off and drop in-flight frame and protocol state.
    pub fn power_down(&mut self) -> Result<()> {
        let was_on = self.window.power_down();
        self.release()?;
        if was_on {
            tracing::info!(device = self.protocol.name(), "powered down");
        }
        Ok(())
    }

    fn release(&mut self) -> Result<()> {
        self.frames.reset();
        self.outbox.drain().for_each(drop);
        self.protocol.reset();
        self.power
            .set_off()
            .map_err(|e| eyre::Report::new(map_hw_error(&*e)))
            .wrap_err_with(|| format!("{} power off", self.protocol.name()))
    }

    /// Run one tick and return the protocol events it produced, in order.
    pub fn update(&mut self) -> Result<Vec<SessionEvent>> {
        let now = self.clock.now_ms();
        match self.window.tick(now) {
            WindowState::Off => return Ok(Vec::new()),
            WindowState::Expired => {
                tracing::info!(device = self.protocol.name(), "on-window expired");
                self.release()?;
                return Ok(Vec::new());
            }
            WindowState::On => {}
        }

        if !self.stream.listen() {
            tracing::warn!(device = self.protocol.name(), "cannot claim serial channel");
        }

        let mut events = Vec::new();
        // Bytes arriving mid-drain wait for the next tick.
        let pending = self.stream.available();
        for _ in 0..pending {
            let Some(byte) = self.stream.read_byte() else {
                break;
            };
            let Some(frame) = self.frames.feed(byte) else {
                continue;
            };
            tracing::trace!(device = self.protocol.name(), frame = %frame.text(), "frame");
            if let Some(event) = self.protocol.on_frame(&frame, now, &mut self.outbox) {
                if event.is_activity()
                    && let Some(elapsed) = self.window.elapsed(now)
                    && self.window.extend_once(elapsed)
                {
                    tracing::debug!(device = self.protocol.name(), elapsed, "on-window extended");
                }
                events.push(event);
            }
        }

        self.protocol.poll(now, &mut self.outbox);
        self.flush_outbox()?;
        Ok(events)
    }

    fn flush_outbox(&mut self) -> Result<()> {
        for bytes in self.outbox.drain() {
            self.stream
                .write(&bytes)
                .map_err(|e| eyre::Report::new(map_hw_error(&*e)))
                .wrap_err_with(|| format!("{} write", self.protocol.name()))?;
        }
        Ok(())
    }

    pub const fn is_on(&self) -> bool {
        self.window.is_on()
    }

    pub const fn window(&self) -> &DutyCycleWindow {
        &self.window
    }

    /// Bytes lost to frame overflow since construction.
    pub const fn dropped_bytes(&self) -> u64 {
        self.frames.dropped()
    }

    pub const fn protocol(&self) -> &D {
        &self.protocol
    }

    pub fn protocol_mut(&mut self) -> &mut D {
        &mut self.protocol
    }

    pub const fn stream(&self) -> &B {
        &self.stream
    }

    pub fn stream_mut(&mut self) -> &mut B {
        &mut self.stream
    }

    pub const fn power(&self) -> &P {
        &self.power
    }
}
