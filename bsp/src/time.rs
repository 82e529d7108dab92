// Copyright (c) 2025 vivo Mobile Communication Co., Ltd.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! System tick sources on top of the timer unit.
//!
//! The clockevent drives the scheduler tick from one 16-bit channel, the
//! clocksource free-runs on another. Both feed from the external oscillator
//! through the /16 prescaler.

use crate::{
    error::Result,
    intc::IrqLine,
    sync::SpinLock,
    timer::{Tcu, TimerUser, TCSR},
};
use alloc::sync::Arc;

pub const TICKS_PER_SECOND: u32 = 100;

/// Smallest delta the hardware reliably hits, in timer ticks.
pub const MIN_DELTA: u16 = 100;
pub const MAX_DELTA: u16 = 0xffff;

/// Counter width of the general timer channels.
pub const CLOCKSOURCE_MASK: u32 = 0xffff;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockEventMode {
    Periodic,
    OneShot,
    Shutdown,
    /// Re-arm after a suspend/resume cycle without reprogramming the period.
    Resume,
}

type EventHandler = Arc<dyn Fn() + Send + Sync>;

struct Inner {
    mode: ClockEventMode,
    handler: Option<EventHandler>,
}

/// Periodic/one-shot event source for the scheduler tick.
pub struct ClockEvent<'a> {
    tcu: &'a Tcu,
    ch: usize,
    irq: IrqLine,
    rate: u32,
    ticks_per_jiffy: u16,
    inner: SpinLock<Inner>,
}

impl<'a> ClockEvent<'a> {
    /// Claim `ch` and start ticking periodically at [`TICKS_PER_SECOND`].
    pub fn new(tcu: &'a Tcu, ch: usize, irq: IrqLine, ext_rate: u32) -> Result<Self> {
        tcu.claim(ch, TimerUser::ClockEvent)?;

        let rate = ext_rate >> 4;
        let ticks_per_jiffy = ((rate + TICKS_PER_SECOND / 2) / TICKS_PER_SECOND) as u16;

        let cevt = Self {
            tcu,
            ch,
            irq,
            rate,
            ticks_per_jiffy,
            inner: SpinLock::new(Inner {
                mode: ClockEventMode::Periodic,
                handler: None,
            }),
        };

        cevt.tcu.start(ch);
        cevt.tcu.set_ctrl(ch, TCSR::PRESCALE::Div16 + TCSR::SRC_EXT::SET);
        cevt.tcu.set_period(ch, ticks_per_jiffy);
        cevt.tcu.irq_full_enable(ch);
        cevt.tcu.enable(ch);

        Ok(cevt)
    }

    /// Event frequency in Hz, for delta conversions.
    pub fn rate(&self) -> u32 {
        self.rate
    }

    pub fn irq(&self) -> IrqLine {
        self.irq
    }

    pub fn ticks_per_jiffy(&self) -> u16 {
        self.ticks_per_jiffy
    }

    /// Install the tick callback invoked from interrupt context.
    pub fn set_handler(&self, handler: impl Fn() + Send + Sync + 'static) {
        self.inner.irqsave_lock().handler = Some(Arc::new(handler));
    }

    pub fn set_mode(&self, mode: ClockEventMode) {
        match mode {
            ClockEventMode::Periodic => {
                self.inner.irqsave_lock().mode = ClockEventMode::Periodic;
                self.tcu.set_count(self.ch, 0);
                self.tcu.set_period(self.ch, self.ticks_per_jiffy);
                self.tcu.irq_full_enable(self.ch);
                self.tcu.enable(self.ch);
            }
            ClockEventMode::Resume => {
                self.tcu.irq_full_enable(self.ch);
                self.tcu.enable(self.ch);
            }
            ClockEventMode::OneShot | ClockEventMode::Shutdown => {
                self.inner.irqsave_lock().mode = mode;
                self.tcu.disable(self.ch);
            }
        }
    }

    /// Program the next expiry `delta` ticks from now and start counting.
    pub fn set_next_event(&self, delta: u16) -> Result<()> {
        self.tcu.set_count(self.ch, 0);
        self.tcu.set_period(self.ch, delta);
        self.tcu.enable(self.ch);
        Ok(())
    }

    /// Expiry path, called from the channel's interrupt line.
    pub fn handle_irq(&self) {
        self.tcu.ack_full(self.ch);

        let (mode, handler) = {
            let inner = self.inner.irqsave_lock();
            (inner.mode, inner.handler.clone())
        };

        if mode != ClockEventMode::Periodic {
            self.tcu.disable(self.ch);
        }

        if let Some(handler) = handler {
            handler();
        }
    }
}

/// Free-running 16-bit monotonic counter.
pub struct ClockSource<'a> {
    tcu: &'a Tcu,
    ch: usize,
    rate: u32,
}

impl<'a> ClockSource<'a> {
    /// Claim `ch` and let it free-run over the full counter range.
    pub fn new(tcu: &'a Tcu, ch: usize, ext_rate: u32) -> Result<Self> {
        tcu.claim(ch, TimerUser::ClockSource)?;

        let csrc = Self {
            tcu,
            ch,
            rate: ext_rate >> 4,
        };

        csrc.tcu.start(ch);
        csrc.tcu.set_ctrl(ch, TCSR::PRESCALE::Div16 + TCSR::SRC_EXT::SET);
        csrc.tcu.set_period(ch, 0xffff);
        csrc.tcu.enable(ch);

        Ok(csrc)
    }

    pub fn rate(&self) -> u32 {
        self.rate
    }

    /// Raw counter readout; wraps at [`CLOCKSOURCE_MASK`].
    pub fn read(&self) -> u16 {
        self.tcu.count(self.ch)
    }
}
