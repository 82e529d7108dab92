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

//! Per-SoC platform contexts.
//!
//! Boot code builds one [`Soc`] and hands references to the subsystem
//! initializers and drivers; nothing in this crate lives in a global.

pub mod jz4740;
pub mod jz4750;
pub mod jz4760;

use crate::{
    arch,
    clock::{ClockTree, WaitMode},
    error::Result,
    gpio::Gpio,
    intc::Intc,
    timer::Tcu,
};

pub const CPM_BASE: usize = 0x1000_0000;
pub const INTC_BASE: usize = 0x1000_1000;
/// The timer block is addressed 0x10 into the unit, in front of the
/// enable/stop/flag/mask window.
pub const TCU_BASE: usize = 0x1000_2010;
pub const GPIO_BASE: usize = 0x1001_0000;

/// Rates the board feeds into the SoC.
#[derive(Debug, Clone, Copy)]
pub struct BoardData {
    pub ext_rate: u32,
    pub rtc_rate: u32,
}

pub struct Soc {
    pub clocks: ClockTree,
    pub intc: Intc,
    pub tcu: Tcu,
    pub gpio: Gpio,
}

impl Soc {
    /// Enter suspend and come back out.
    ///
    /// The interrupt controller goes down before the PLL so wake sources
    /// stay deliverable while everything else is already masked, and comes
    /// back up last so the restored mask only ever sees a stable clock
    /// tree. A PLL that fails to relock is reported after the interrupt
    /// state is restored.
    pub fn suspend_enter(&self) -> Result<()> {
        self.intc.suspend();
        self.clocks.suspend();

        self.clocks.set_wait_mode(WaitMode::Sleep);
        arch::wait_for_interrupt();
        self.clocks.set_wait_mode(WaitMode::Idle);

        let resumed = self.clocks.resume();
        self.intc.resume();
        resumed
    }
}
