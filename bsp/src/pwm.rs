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

//! PWM outputs on top of the timer channels.
//!
//! Every output claims its timer channel and its pin for the lifetime of the
//! handle. Reconfiguration while running goes through the shared quiesce
//! window, the same pattern the clock tree uses for live dividers.

use crate::{
    clock::{Clk, ClockTree},
    error::{Error, Result},
    gpio::{Gpio, PinFunction},
    support::with_quiesced,
    timer::{Tcu, TimerUser, TCSR},
};

const NSEC_PER_SEC: u64 = 1_000_000_000;
const MAX_PRESCALER: u32 = 6;

/// Channel-to-pin binding, per SoC.
#[derive(Debug, Clone, Copy)]
pub struct PwmDesc {
    pub id: usize,
    pub pin: u32,
}

pub struct PwmController<'a> {
    tcu: &'a Tcu,
    gpio: &'a Gpio,
    clocks: &'a ClockTree,
    clk: Clk,
    list: &'static [PwmDesc],
}

impl<'a> PwmController<'a> {
    /// All PWM channels count the external oscillator.
    pub fn new(
        tcu: &'a Tcu,
        gpio: &'a Gpio,
        clocks: &'a ClockTree,
        list: &'static [PwmDesc],
    ) -> Result<Self> {
        let clk = clocks.get(None, "ext")?;
        Ok(Self {
            tcu,
            gpio,
            clocks,
            clk,
            list,
        })
    }

    /// Claim channel `id` and route its pin to the PWM function.
    pub fn request(&self, id: usize, label: &str) -> Result<Pwm<'_, 'a>> {
        let desc = self
            .list
            .iter()
            .find(|desc| desc.id == id)
            .ok_or(Error::NotFound)?;

        self.tcu.claim(id, TimerUser::Pwm)?;

        if let Err(err) = self.gpio.request(desc.pin, label) {
            self.tcu.release(id);
            return Err(err);
        }

        // Every part in the family muxes its PWM pins on function 1.
        self.gpio.set_function(desc.pin, PinFunction::Func1)?;
        self.gpio.direction_output(desc.pin, true)?;

        self.tcu.start(id);

        Ok(Pwm {
            ctrl: self,
            id,
            pin: desc.pin,
            period_ticks: 0,
        })
    }
}

pub struct Pwm<'c, 'a> {
    ctrl: &'c PwmController<'a>,
    id: usize,
    pin: u32,
    period_ticks: u16,
}

impl Pwm<'_, '_> {
    pub fn id(&self) -> usize {
        self.id
    }

    /// Program duty and period, both in nanoseconds.
    ///
    /// The prescaler walks the power-of-4 steps until the period fits the
    /// 16-bit counter; a request past the last step is unrepresentable. The
    /// duty register holds the low-side compare, clamped so every cycle has
    /// at least one transition.
    pub fn config(&mut self, duty_ns: u32, period_ns: u32) -> Result<()> {
        if duty_ns >= period_ns {
            return Err(Error::InvalidArgument);
        }

        let rate = self.ctrl.clocks.rate(self.ctrl.clk)?;
        let mut period = rate as u64 * period_ns as u64 / NSEC_PER_SEC;

        let mut prescaler = 0;
        while period > 0xffff && prescaler < MAX_PRESCALER {
            period >>= 2;
            prescaler += 1;
        }
        if prescaler == MAX_PRESCALER || period == 0 {
            return Err(Error::InvalidArgument);
        }

        let mut duty = period - period * duty_ns as u64 / period_ns as u64;
        if duty >= period {
            duty = period - 1;
        }

        let tcu = self.ctrl.tcu;
        let enabled = tcu.is_enabled(self.id);
        with_quiesced(
            enabled,
            || self.stop_output(),
            || self.start_output(),
            || -> Result<()> {
                tcu.set_count(self.id, 0);
                tcu.set_duty(self.id, duty as u16);
                tcu.set_period(self.id, period as u16);
                tcu.set_ctrl(
                    self.id,
                    TCSR::PRESCALE.val(prescaler as u16)
                        + TCSR::SRC_EXT::SET
                        + TCSR::PWM_ABRUPT_SHUTDOWN::SET,
                );
                Ok(())
            },
        )?;

        self.period_ticks = period as u16;
        Ok(())
    }

    fn start_output(&self) {
        self.ctrl.tcu.pwm_output_enable(self.id);
        self.ctrl.tcu.enable(self.id);
    }

    fn stop_output(&self) {
        self.ctrl.tcu.pwm_output_disable(self.id);
        self.ctrl.tcu.disable(self.id);
    }

    pub fn enable(&self) {
        self.start_output();
    }

    pub fn disable(&self) {
        self.stop_output();
    }

    /// Release the channel and park the pin.
    pub fn free(self) {
        self.stop_output();
        self.ctrl.tcu.clear_ctrl(self.id);

        let _ = self.ctrl.gpio.direction_input(self.pin);
        let _ = self.ctrl.gpio.set_function(self.pin, PinFunction::None);
        self.ctrl.gpio.free(self.pin);

        self.ctrl.tcu.stop(self.id);
        self.ctrl.tcu.release(self.id);
    }
}

impl embedded_hal::pwm::ErrorType for Pwm<'_, '_> {
    type Error = Error;
}

impl embedded_hal::pwm::SetDutyCycle for Pwm<'_, '_> {
    fn max_duty_cycle(&self) -> u16 {
        self.period_ticks
    }

    fn set_duty_cycle(&mut self, duty: u16) -> Result<()> {
        if duty > self.period_ticks {
            return Err(Error::InvalidArgument);
        }
        let mut compare = self.period_ticks - duty;
        if self.period_ticks > 0 && compare >= self.period_ticks {
            compare = self.period_ticks - 1;
        }
        self.ctrl.tcu.set_duty(self.id, compare);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::{lookup::ClkLookupEntry, tests::fake_bank, ClockGraph, ClockTree};
    use crate::gpio::tests::FakeGpio;
    use crate::gpio::{pin, PORT_D};
    use crate::timer::tests::{chan, FakeTcu, ENABLE, ENABLE_SET, STOP_CLEAR, STOP_SET};
    use embedded_hal::pwm::SetDutyCycle;

    static PWM_LIST: [PwmDesc; 2] = [
        PwmDesc {
            id: 2,
            pin: pin(PORT_D, 4),
        },
        PwmDesc {
            id: 3,
            pin: pin(PORT_D, 5),
        },
    ];

    struct Rig {
        tcu: FakeTcu,
        gpio: FakeGpio,
        clocks: ClockTree,
    }

    fn rig(ext_rate: u32) -> Rig {
        let mut g = ClockGraph::new();
        let ext = g.fixed("ext", ext_rate);
        let clocks = ClockTree::new(fake_bank(), g, ext);
        clocks.add_table(&[ClkLookupEntry::new(None, "ext", ext)]);
        Rig {
            tcu: FakeTcu::new(),
            gpio: FakeGpio::new(),
            clocks,
        }
    }

    #[test]
    fn test_request_claims_channel_and_pin() {
        let r = rig(12_000_000);
        let ctrl = PwmController::new(&r.tcu.tcu, &r.gpio.gpio, &r.clocks, &PWM_LIST).unwrap();
        let pwm = ctrl.request(2, "backlight").unwrap();
        assert_eq!(pwm.id(), 2);
        assert_eq!(r.tcu.tcu.owner(2), Some(TimerUser::Pwm));
        assert_eq!(r.gpio.gpio.request(pin(PORT_D, 4), "x"), Err(Error::Busy));
        assert_eq!(r.tcu.peek(STOP_CLEAR), 1 << 2);
    }

    #[test]
    fn test_request_unknown_channel() {
        let r = rig(12_000_000);
        let ctrl = PwmController::new(&r.tcu.tcu, &r.gpio.gpio, &r.clocks, &PWM_LIST).unwrap();
        assert!(matches!(ctrl.request(7, "nope"), Err(Error::NotFound)));
    }

    #[test]
    fn test_request_twice_is_busy() {
        let r = rig(12_000_000);
        let ctrl = PwmController::new(&r.tcu.tcu, &r.gpio.gpio, &r.clocks, &PWM_LIST).unwrap();
        let _pwm = ctrl.request(2, "one").unwrap();
        assert!(matches!(ctrl.request(2, "two"), Err(Error::Busy)));
    }

    #[test]
    fn test_config_programs_duty_period_ctrl() {
        let r = rig(12_000_000);
        let ctrl = PwmController::new(&r.tcu.tcu, &r.gpio.gpio, &r.clocks, &PWM_LIST).unwrap();
        let mut pwm = ctrl.request(2, "backlight").unwrap();

        // 1 ms at 12 MHz: 12000 ticks, no prescaling. 25% duty.
        pwm.config(250_000, 1_000_000).unwrap();
        assert_eq!(r.tcu.peek(chan(2)) & 0xffff, 12000);
        assert_eq!(r.tcu.peek(chan(2) + 4) & 0xffff, 9000);
        assert_eq!(
            r.tcu.peek(chan(2) + 0xc) & 0xffff,
            (1 << 9) | (1 << 2) // abrupt shutdown, ext source, prescaler 0
        );
        assert_eq!(pwm.max_duty_cycle(), 12000);
    }

    #[test]
    fn test_config_walks_prescaler() {
        let r = rig(12_000_000);
        let ctrl = PwmController::new(&r.tcu.tcu, &r.gpio.gpio, &r.clocks, &PWM_LIST).unwrap();
        let mut pwm = ctrl.request(2, "slow").unwrap();

        // 1 s at 12 MHz: 12M ticks, fits after four /4 steps.
        pwm.config(500_000_000, 1_000_000_000).unwrap();
        let period = 12_000_000u32 >> 8;
        assert_eq!(r.tcu.peek(chan(2)) & 0xffff, period);
        assert_eq!(
            r.tcu.peek(chan(2) + 0xc) & 0xffff,
            (1 << 9) | (4 << 3) | (1 << 2)
        );
    }

    #[test]
    fn test_config_unrepresentable_period() {
        let r = rig(48_000_000);
        let ctrl = PwmController::new(&r.tcu.tcu, &r.gpio.gpio, &r.clocks, &PWM_LIST).unwrap();
        let mut pwm = ctrl.request(2, "toolong").unwrap();

        // 4 s at 48 MHz outruns even the /1024 prescaler step.
        assert_eq!(
            pwm.config(1_000_000_000, 4_000_000_000),
            Err(Error::InvalidArgument)
        );
    }

    #[test]
    fn test_config_rejects_duty_at_period() {
        let r = rig(12_000_000);
        let ctrl = PwmController::new(&r.tcu.tcu, &r.gpio.gpio, &r.clocks, &PWM_LIST).unwrap();
        let mut pwm = ctrl.request(2, "pwm").unwrap();
        assert_eq!(
            pwm.config(1_000_000, 1_000_000),
            Err(Error::InvalidArgument)
        );
        assert_eq!(
            pwm.config(2_000_000, 1_000_000),
            Err(Error::InvalidArgument)
        );
    }

    #[test]
    fn test_config_zero_duty_keeps_one_tick() {
        let r = rig(12_000_000);
        let ctrl = PwmController::new(&r.tcu.tcu, &r.gpio.gpio, &r.clocks, &PWM_LIST).unwrap();
        let mut pwm = ctrl.request(2, "idle").unwrap();

        pwm.config(0, 1_000_000).unwrap();
        // Compare clamps one tick short of the full period.
        assert_eq!(r.tcu.peek(chan(2) + 4) & 0xffff, 11999);
    }

    #[test]
    fn test_config_while_running_reenables() {
        let r = rig(12_000_000);
        let ctrl = PwmController::new(&r.tcu.tcu, &r.gpio.gpio, &r.clocks, &PWM_LIST).unwrap();
        let mut pwm = ctrl.request(2, "live").unwrap();
        pwm.config(250_000, 1_000_000).unwrap();
        pwm.enable();

        r.tcu.poke(ENABLE, 1 << 2);
        r.tcu.poke(ENABLE_SET, 0);
        pwm.config(500_000, 1_000_000).unwrap();
        // Quiesced around the rewrite, then brought back up.
        assert_eq!(r.tcu.peek(ENABLE_SET), 1 << 2);
        assert_ne!(r.tcu.peek(chan(2) + 0xc) & (1 << 7), 0);
    }

    #[test]
    fn test_set_duty_cycle_inverts_compare() {
        let r = rig(12_000_000);
        let ctrl = PwmController::new(&r.tcu.tcu, &r.gpio.gpio, &r.clocks, &PWM_LIST).unwrap();
        let mut pwm = ctrl.request(2, "hal").unwrap();
        pwm.config(0, 1_000_000).unwrap();

        pwm.set_duty_cycle(3000).unwrap();
        assert_eq!(r.tcu.peek(chan(2) + 4) & 0xffff, 9000);

        pwm.set_duty_cycle(12000).unwrap();
        assert_eq!(r.tcu.peek(chan(2) + 4) & 0xffff, 0);

        assert_eq!(pwm.set_duty_cycle(12001), Err(Error::InvalidArgument));
    }

    #[test]
    fn test_free_releases_channel_and_pin() {
        let r = rig(12_000_000);
        let ctrl = PwmController::new(&r.tcu.tcu, &r.gpio.gpio, &r.clocks, &PWM_LIST).unwrap();
        let pwm = ctrl.request(2, "transient").unwrap();
        pwm.free();

        assert_eq!(r.tcu.tcu.owner(2), None);
        assert_eq!(r.tcu.peek(STOP_SET), 1 << 2);
        assert_eq!(r.tcu.peek(chan(2) + 0xc) & 0xffff, 0);
        // Requestable again.
        let _again = ctrl.request(2, "again").unwrap();
    }
}
