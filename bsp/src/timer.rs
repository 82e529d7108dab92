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

//! Timer/counter unit.
//!
//! Eight 16-bit counter/compare channels plus the wide OST share one
//! register block. Channels are claimed exclusively: the tick clockevent,
//! the clocksource and each PWM output own their channel for good (PWM
//! releases on free). The enable/stop/flag/mask registers are
//! write-1-to-set/clear triplets, so channel control is lock-free; only the
//! ownership bookkeeping takes a lock.

use crate::{
    error::{Error, Result},
    static_ref::StaticRef,
    sync::SpinLock,
};
use tock_registers::{
    interfaces::{ReadWriteable, Readable, Writeable},
    register_bitfields, register_structs,
    registers::{ReadOnly, ReadWrite, WriteOnly},
};

pub const NUM_CHANNELS: usize = 8;
/// The OST occupies bit 15 of the shared enable/stop/flag/mask registers.
pub const OST_CHANNEL: usize = 15;

register_structs! {
    pub TimerInstanceRegisters {
        (0x00 => dfr: ReadWrite<u16>),
        (0x02 => _reserved0),
        (0x04 => dhr: ReadWrite<u16>),
        (0x06 => _reserved1),
        (0x08 => cnt: ReadWrite<u16>),
        (0x0a => _reserved2),
        (0x0c => ctrl: ReadWrite<u16, TCSR::Register>),
        (0x0e => _reserved3),
        (0x10 => @END),
    },
    pub TcuRegisters {
        (0x00 => enable: ReadOnly<u32>),
        (0x04 => enable_set: WriteOnly<u32>),
        (0x08 => enable_clear: WriteOnly<u32>),
        (0x0c => stop: ReadOnly<u32>),
        (0x10 => flag: ReadOnly<u32>),
        (0x14 => flag_set: WriteOnly<u32>),
        (0x18 => flag_clear: WriteOnly<u32>),
        (0x1c => stop_set: WriteOnly<u32>),
        (0x20 => mask: ReadOnly<u32>),
        (0x24 => mask_set: WriteOnly<u32>),
        (0x28 => mask_clear: WriteOnly<u32>),
        (0x2c => stop_clear: WriteOnly<u32>),
        (0x30 => channel: [TimerInstanceRegisters; 8]),
        (0xb0 => _reserved0),
        (0xd0 => ost_compare: ReadWrite<u32>),
        (0xd4 => _reserved1),
        (0xd8 => ost_count: ReadWrite<u32>),
        (0xdc => ost_ctrl: ReadWrite<u16, TCSR::Register>),
        (0xde => _reserved2),
        (0xe0 => @END),
    }
}

register_bitfields![u16,
    pub TCSR [
        /// OST only: wrap at the counter width instead of at the compare
        /// value.
        COUNT_MODE OFFSET(15) NUMBITS(1) [],
        PWM_ABRUPT_SHUTDOWN OFFSET(9) NUMBITS(1) [],
        PWM_ACTIVE_LOW OFFSET(8) NUMBITS(1) [],
        PWM_ENABLE OFFSET(7) NUMBITS(1) [],
        /// Input divider, powers of four.
        PRESCALE OFFSET(3) NUMBITS(3) [
            Div1 = 0,
            Div4 = 1,
            Div16 = 2,
            Div64 = 3,
            Div256 = 4,
            Div1024 = 5
        ],
        SRC_EXT OFFSET(2) NUMBITS(1) [],
        SRC_RTC OFFSET(1) NUMBITS(1) [],
        SRC_PCLK OFFSET(0) NUMBITS(1) [],
    ]
];

pub type TimerCtrl = tock_registers::fields::FieldValue<u16, TCSR::Register>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerUser {
    ClockEvent,
    ClockSource,
    Pwm,
}

const fn full_irq(ch: usize) -> u32 {
    1 << ch
}

const fn half_irq(ch: usize) -> u32 {
    1 << (ch + 16)
}

pub struct Tcu {
    regs: StaticRef<TcuRegisters>,
    owners: SpinLock<[Option<TimerUser>; 16]>,
}

impl Tcu {
    /// Map the timer unit at `base` and mask all channel interrupts (the
    /// hardware leaves them unmasked out of reset).
    ///
    /// ## Safety
    ///
    /// `base` must be the timer unit's register block.
    pub unsafe fn map(base: usize) -> Self {
        Self::with_registers(StaticRef::new(base as *const TcuRegisters))
    }

    pub(crate) fn with_registers(regs: StaticRef<TcuRegisters>) -> Self {
        let tcu = Self {
            regs,
            owners: SpinLock::new([None; 16]),
        };
        tcu.regs.mask_set.set(0x00ff_00ff);
        tcu
    }

    /// Reserve `ch` for `user`; channels serve exactly one role at a time.
    pub fn claim(&self, ch: usize, user: TimerUser) -> Result<()> {
        let mut owners = self.owners.irqsave_lock();
        if owners[ch].is_some() {
            return Err(Error::Busy);
        }
        owners[ch] = Some(user);
        Ok(())
    }

    pub fn release(&self, ch: usize) {
        self.owners.irqsave_lock()[ch] = None;
    }

    pub fn owner(&self, ch: usize) -> Option<TimerUser> {
        self.owners.irqsave_lock()[ch]
    }

    /// Supply the channel's clock.
    pub fn start(&self, ch: usize) {
        self.regs.stop_clear.set(1 << ch);
    }

    /// Cut the channel's clock.
    pub fn stop(&self, ch: usize) {
        self.regs.stop_set.set(1 << ch);
    }

    /// Let the counter run.
    pub fn enable(&self, ch: usize) {
        self.regs.enable_set.set(1 << ch);
    }

    /// Freeze the counter.
    pub fn disable(&self, ch: usize) {
        self.regs.enable_clear.set(1 << ch);
    }

    pub fn is_enabled(&self, ch: usize) -> bool {
        self.regs.enable.get() & (1 << ch) != 0
    }

    pub fn set_period(&self, ch: usize, period: u16) {
        self.regs.channel[ch].dfr.set(period);
    }

    pub fn set_duty(&self, ch: usize, duty: u16) {
        self.regs.channel[ch].dhr.set(duty);
    }

    pub fn set_count(&self, ch: usize, count: u16) {
        self.regs.channel[ch].cnt.set(count);
    }

    pub fn count(&self, ch: usize) -> u16 {
        self.regs.channel[ch].cnt.get()
    }

    pub fn set_ctrl(&self, ch: usize, ctrl: TimerCtrl) {
        self.regs.channel[ch].ctrl.write(ctrl);
    }

    pub fn clear_ctrl(&self, ch: usize) {
        self.regs.channel[ch].ctrl.set(0);
    }

    pub fn pwm_output_enable(&self, ch: usize) {
        self.regs.channel[ch].ctrl.modify(TCSR::PWM_ENABLE::SET);
    }

    pub fn pwm_output_disable(&self, ch: usize) {
        self.regs.channel[ch].ctrl.modify(TCSR::PWM_ENABLE::CLEAR);
    }

    /// Clear the channel's counter-full latch.
    pub fn ack_full(&self, ch: usize) {
        self.regs.flag_clear.set(full_irq(ch));
    }

    pub fn full_pending(&self, ch: usize) -> bool {
        self.regs.flag.get() & full_irq(ch) != 0
    }

    /// Unmask the counter-full interrupt, dropping any stale latch first.
    pub fn irq_full_enable(&self, ch: usize) {
        self.regs.flag_clear.set(full_irq(ch));
        self.regs.mask_clear.set(full_irq(ch));
    }

    pub fn irq_full_disable(&self, ch: usize) {
        self.regs.mask_set.set(full_irq(ch));
    }

    pub fn irq_half_disable(&self, ch: usize) {
        self.regs.mask_set.set(half_irq(ch));
    }

    pub fn ost_compare(&self) -> u32 {
        self.regs.ost_compare.get()
    }

    pub fn set_ost_compare(&self, compare: u32) {
        self.regs.ost_compare.set(compare);
    }

    pub fn ost_count(&self) -> u32 {
        self.regs.ost_count.get()
    }

    pub fn set_ost_ctrl(&self, ctrl: TimerCtrl) {
        self.regs.ost_ctrl.write(ctrl);
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use alloc::vec;

    pub(crate) struct FakeTcu {
        pub tcu: Tcu,
        pub mem: *mut u32,
    }

    pub(crate) const ENABLE: usize = 0x00;
    pub(crate) const ENABLE_SET: usize = 0x04;
    pub(crate) const ENABLE_CLEAR: usize = 0x08;
    pub(crate) const FLAG: usize = 0x10;
    pub(crate) const FLAG_CLEAR: usize = 0x18;
    pub(crate) const STOP_SET: usize = 0x1c;
    pub(crate) const MASK_SET: usize = 0x24;
    pub(crate) const MASK_CLEAR: usize = 0x28;
    pub(crate) const STOP_CLEAR: usize = 0x2c;
    pub(crate) const OST_COMPARE: usize = 0xd0;
    pub(crate) const OST_COUNT: usize = 0xd8;
    pub(crate) const OST_CTRL: usize = 0xdc;

    pub(crate) const fn chan(ch: usize) -> usize {
        0x30 + ch * 0x10
    }

    impl FakeTcu {
        pub fn new() -> Self {
            let mem = vec![0u32; 0xe0 / 4].leak().as_mut_ptr();
            let regs = unsafe { StaticRef::new(mem as *const TcuRegisters) };
            Self {
                tcu: Tcu::with_registers(regs),
                mem,
            }
        }

        pub fn poke(&self, offset: usize, value: u32) {
            unsafe { self.mem.add(offset / 4).write_volatile(value) }
        }

        pub fn peek(&self, offset: usize) -> u32 {
            unsafe { self.mem.add(offset / 4).read_volatile() }
        }
    }

    #[test]
    fn test_init_masks_all_channel_irqs() {
        let f = FakeTcu::new();
        assert_eq!(f.peek(MASK_SET), 0x00ff_00ff);
    }

    #[test]
    fn test_channel_register_offsets() {
        let f = FakeTcu::new();
        f.tcu.set_period(2, 0x1234);
        f.tcu.set_duty(2, 0x00aa);
        f.tcu.set_count(2, 0x0001);
        assert_eq!(f.peek(chan(2)) & 0xffff, 0x1234);
        assert_eq!(f.peek(chan(2) + 4) & 0xffff, 0x00aa);
        assert_eq!(f.peek(chan(2) + 8) & 0xffff, 0x0001);
    }

    #[test]
    fn test_enable_uses_set_clear_registers() {
        let f = FakeTcu::new();
        f.tcu.enable(5);
        assert_eq!(f.peek(ENABLE_SET), 1 << 5);
        f.tcu.disable(5);
        assert_eq!(f.peek(ENABLE_CLEAR), 1 << 5);
        f.tcu.start(5);
        assert_eq!(f.peek(STOP_CLEAR), 1 << 5);
        f.tcu.stop(5);
        assert_eq!(f.peek(STOP_SET), 1 << 5);
    }

    #[test]
    fn test_is_enabled_reads_the_live_register() {
        let f = FakeTcu::new();
        assert!(!f.tcu.is_enabled(3));
        f.poke(ENABLE, 1 << 3);
        assert!(f.tcu.is_enabled(3));
    }

    #[test]
    fn test_irq_full_enable_acks_then_unmasks() {
        let f = FakeTcu::new();
        f.tcu.irq_full_enable(0);
        assert_eq!(f.peek(FLAG_CLEAR), 1 << 0);
        assert_eq!(f.peek(MASK_CLEAR), 1 << 0);
        f.tcu.irq_full_disable(0);
        assert_eq!(f.peek(MASK_SET), 1 << 0);
    }

    #[test]
    fn test_ctrl_field_encoding() {
        let f = FakeTcu::new();
        f.tcu
            .set_ctrl(1, TCSR::PRESCALE::Div16 + TCSR::SRC_EXT::SET);
        // prescale 2 at offset 3, ext source bit 2.
        assert_eq!(f.peek(chan(1) + 0xc) & 0xffff, (2 << 3) | (1 << 2));
        f.tcu.pwm_output_enable(1);
        assert_eq!(
            f.peek(chan(1) + 0xc) & 0xffff,
            (2 << 3) | (1 << 2) | (1 << 7)
        );
        f.tcu.clear_ctrl(1);
        assert_eq!(f.peek(chan(1) + 0xc) & 0xffff, 0);
    }

    #[test]
    fn test_ost_registers() {
        let f = FakeTcu::new();
        f.tcu.set_ost_compare(0xdead_beef);
        assert_eq!(f.peek(OST_COMPARE), 0xdead_beef);
        f.poke(OST_COUNT, 42);
        assert_eq!(f.tcu.ost_count(), 42);
        f.tcu
            .set_ost_ctrl(TCSR::COUNT_MODE::SET + TCSR::PRESCALE::Div16 + TCSR::SRC_EXT::SET);
        assert_eq!(
            f.peek(OST_CTRL) & 0xffff,
            (1 << 15) | (2 << 3) | (1 << 2)
        );
    }

    #[test]
    fn test_channel_single_owner() {
        let f = FakeTcu::new();
        f.tcu.claim(0, TimerUser::ClockEvent).unwrap();
        assert_eq!(f.tcu.claim(0, TimerUser::Pwm), Err(Error::Busy));
        assert_eq!(f.tcu.owner(0), Some(TimerUser::ClockEvent));

        f.tcu.release(0);
        f.tcu.claim(0, TimerUser::Pwm).unwrap();
        assert_eq!(f.tcu.owner(0), Some(TimerUser::Pwm));
    }
}
