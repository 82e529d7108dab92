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

//! Operating system timer.
//!
//! A 32-bit free-running counter with a compare unit, used on the newer
//! parts as both the high-resolution clocksource and a one-shot clockevent.
//! It shares the timer unit's enable/flag/mask bit space as channel 15.

use crate::{
    error::Result,
    sync::SpinLock,
    timer::{Tcu, TimerUser, OST_CHANNEL, TCSR},
};
use alloc::sync::Arc;

/// Counter width of the OST.
pub const OST_CLOCKSOURCE_MASK: u32 = 0xffff_ffff;

type EventHandler = Arc<dyn Fn() + Send + Sync>;

pub struct Ost<'a> {
    tcu: &'a Tcu,
    rate: u32,
    handler: SpinLock<Option<EventHandler>>,
}

impl<'a> Ost<'a> {
    /// Claim the OST and let it free-run, wrapping at the counter width
    /// rather than at the compare value.
    pub fn new(tcu: &'a Tcu, ext_rate: u32) -> Result<Self> {
        tcu.claim(OST_CHANNEL, TimerUser::ClockEvent)?;

        let ost = Self {
            tcu,
            rate: ext_rate >> 4,
            handler: SpinLock::new(None),
        };

        ost.tcu.start(OST_CHANNEL);
        ost.tcu
            .set_ost_ctrl(TCSR::COUNT_MODE::SET + TCSR::PRESCALE::Div16 + TCSR::SRC_EXT::SET);
        ost.tcu.enable(OST_CHANNEL);

        Ok(ost)
    }

    pub fn rate(&self) -> u32 {
        self.rate
    }

    /// Clocksource readout: the raw counter, no side effects.
    pub fn read(&self) -> u32 {
        self.tcu.ost_count()
    }

    pub fn set_handler(&self, handler: impl Fn() + Send + Sync + 'static) {
        *self.handler.irqsave_lock() = Some(Arc::new(handler));
    }

    /// Arm a one-shot event `delta` ticks from now.
    pub fn set_next_event(&self, delta: u32) -> Result<()> {
        let count = self.tcu.ost_count();
        self.tcu.set_ost_compare(count.wrapping_add(delta));
        self.tcu.irq_full_enable(OST_CHANNEL);
        Ok(())
    }

    /// Stop delivering events until the next [`Ost::set_next_event`].
    pub fn stop_events(&self) {
        self.tcu.irq_full_disable(OST_CHANNEL);
    }

    /// Re-arm event delivery after resume.
    pub fn resume_events(&self) {
        self.tcu.irq_full_enable(OST_CHANNEL);
    }

    /// Expiry path: one event per arm.
    pub fn handle_irq(&self) {
        self.tcu.irq_full_disable(OST_CHANNEL);
        self.tcu.ack_full(OST_CHANNEL);

        let handler = self.handler.irqsave_lock().clone();
        if let Some(handler) = handler {
            handler();
        }
    }
}
