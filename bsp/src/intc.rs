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

//! First-level interrupt controller.
//!
//! Interrupt lines live in a flat namespace: the first eight slots belong to
//! the CPU core, SoC lines start at [`IRQ_BASE`] in banks of 32, and the
//! second-level DMA/GPIO/ADC ranges follow (per-SoC constants live with the
//! SoC modules). The controller demultiplexes the CPU's cascade input by
//! scanning the per-bank pending registers.
//!
//! Mask and unmask go through write-1-to-set/clear registers, so they take
//! no lock. That asymmetry with the clock block is a hardware property, not
//! an omission.

use crate::{static_ref::StaticRef, sync::SpinLock};
use alloc::{sync::Arc, vec::Vec};
use core::sync::atomic::{AtomicU32, Ordering};
use log::warn;
use tock_registers::{
    interfaces::{Readable, Writeable},
    register_structs,
    registers::{ReadOnly, WriteOnly},
};

/// First flat line number owned by the controller; the slots below belong to
/// the CPU core.
pub const IRQ_BASE: u32 = 8;

const MAX_BANKS: usize = 2;

pub type IrqLine = u32;

register_structs! {
    pub IntcBankRegisters {
        (0x00 => status: ReadOnly<u32>),
        (0x04 => mask: ReadOnly<u32>),
        (0x08 => mask_set: WriteOnly<u32>),
        (0x0c => mask_clear: WriteOnly<u32>),
        (0x10 => pending: ReadOnly<u32>),
        (0x14 => _reserved0),
        (0x20 => @END),
    },
    pub IntcRegisters {
        (0x00 => bank: [IntcBankRegisters; 2]),
        (0x40 => @END),
    }
}

#[derive(Debug, Default)]
struct WakeState {
    wakeup: [u32; MAX_BANKS],
    saved: [u32; MAX_BANKS],
}

type Handler = Arc<dyn Fn(IrqLine) + Send + Sync>;

pub struct Intc {
    regs: StaticRef<IntcRegisters>,
    num_banks: usize,
    wake: SpinLock<WakeState>,
    handlers: SpinLock<Vec<Option<Handler>>>,
    spurious: AtomicU32,
}

impl Intc {
    /// Map the controller at `base` and mask every line in every bank.
    ///
    /// ## Safety
    ///
    /// `base` must be the interrupt controller's register block.
    pub unsafe fn map(base: usize, num_banks: usize) -> Self {
        Self::with_registers(StaticRef::new(base as *const IntcRegisters), num_banks)
    }

    pub(crate) fn with_registers(regs: StaticRef<IntcRegisters>, num_banks: usize) -> Self {
        debug_assert!(num_banks >= 1 && num_banks <= MAX_BANKS);
        let intc = Self {
            regs,
            num_banks,
            wake: SpinLock::new(WakeState::default()),
            handlers: SpinLock::new(Vec::new()),
            spurious: AtomicU32::new(0),
        };
        for i in 0..num_banks {
            intc.regs.bank[i].mask_set.set(0xffff_ffff);
        }
        intc
    }

    pub fn num_banks(&self) -> usize {
        self.num_banks
    }

    fn bank_and_bit(line: IrqLine) -> (usize, u32) {
        debug_assert!(line >= IRQ_BASE);
        let rel = line - IRQ_BASE;
        ((rel >> 5) as usize, 1 << (rel & 0x1f))
    }

    /// Lock-free: a single write to the bank's write-1-to-set register.
    pub fn mask(&self, line: IrqLine) {
        let (bank, bit) = Self::bank_and_bit(line);
        debug_assert!(bank < self.num_banks);
        self.regs.bank[bank].mask_set.set(bit);
    }

    /// Lock-free: a single write to the bank's write-1-to-clear register.
    pub fn unmask(&self, line: IrqLine) {
        let (bank, bit) = Self::bank_and_bit(line);
        debug_assert!(bank < self.num_banks);
        self.regs.bank[bank].mask_clear.set(bit);
    }

    /// Track a line as a wake source. The hardware is only touched at
    /// suspend time.
    pub fn set_wake(&self, line: IrqLine, on: bool) {
        let (bank, bit) = Self::bank_and_bit(line);
        let mut wake = self.wake.irqsave_lock();
        if on {
            wake.wakeup[bank] |= bit;
        } else {
            wake.wakeup[bank] &= !bit;
        }
    }

    /// Install the handler dispatched for `line`. Second-level controllers
    /// chain here on their first-level line and must clear their own
    /// pending state before returning.
    pub fn register_handler(&self, line: IrqLine, handler: impl Fn(IrqLine) + Send + Sync + 'static) {
        let idx = line as usize;
        let mut handlers = self.handlers.irqsave_lock();
        if handlers.len() <= idx {
            handlers.resize(idx + 1, None);
        }
        handlers[idx] = Some(Arc::new(handler));
    }

    /// Service one interrupt for a cascade entry.
    ///
    /// Banks are scanned in ascending priority order; within a bank the
    /// highest pending bit wins. Level-triggered re-entry picks up whatever
    /// is still pending. A cascade fire with nothing pending is spurious:
    /// counted, logged, not fatal.
    pub fn dispatch(&self) -> Option<IrqLine> {
        for i in 0..self.num_banks {
            let pending = self.regs.bank[i].pending.get();
            if pending != 0 {
                let line = IRQ_BASE + (i as u32) * 0x20 + (31 - pending.leading_zeros());
                self.invoke(line);
                return Some(line);
            }
        }
        self.spurious.fetch_add(1, Ordering::Relaxed);
        warn!("spurious cascade interrupt");
        None
    }

    fn invoke(&self, line: IrqLine) {
        let handler = {
            let handlers = self.handlers.irqsave_lock();
            handlers.get(line as usize).cloned().flatten()
        };
        match handler {
            Some(handler) => handler(line),
            None => warn!("no handler for interrupt {}", line),
        }
    }

    pub fn spurious_count(&self) -> u32 {
        self.spurious.load(Ordering::Relaxed)
    }

    /// Save the live masks, then leave only wake sources unmasked.
    pub fn suspend(&self) {
        let mut wake = self.wake.irqsave_lock();
        for i in 0..self.num_banks {
            let bank = &self.regs.bank[i];
            wake.saved[i] = bank.mask.get();
            bank.mask_set.set(!wake.wakeup[i]);
            bank.mask_clear.set(wake.wakeup[i]);
        }
    }

    /// Restore the masks exactly as [`Intc::suspend`] found them.
    pub fn resume(&self) {
        let wake = self.wake.irqsave_lock();
        for i in 0..self.num_banks {
            let bank = &self.regs.bank[i];
            bank.mask_clear.set(!wake.saved[i]);
            bank.mask_set.set(wake.saved[i]);
        }
    }
}
