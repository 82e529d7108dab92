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

//! Pin multiplexing and the bulk request helper.
//!
//! Peripheral drivers usually need a handful of pins switched to a hardware
//! function at once; [`Gpio::bulk_request`] claims and configures them in one
//! go and rolls back on conflict. Per-pin interrupt demultiplexing belongs to
//! a second-level controller chained on the port's first-level line.

use crate::{
    error::{Error, Result},
    intc::IrqLine,
    mmio::RegisterBank,
    sync::SpinLock,
};
use log::error;

pub const MAX_PORTS: usize = 6;
const PORT_STRIDE: usize = 0x100;

const REG_DATA_SET: usize = 0x14;
const REG_DATA_CLEAR: usize = 0x18;
const REG_PULL_SET: usize = 0x34;
const REG_PULL_CLEAR: usize = 0x38;
const REG_FUNC_SET: usize = 0x44;
const REG_FUNC_CLEAR: usize = 0x48;
const REG_SELECT_SET: usize = 0x54;
const REG_SELECT_CLEAR: usize = 0x58;
const REG_DIRECTION_SET: usize = 0x64;
const REG_DIRECTION_CLEAR: usize = 0x68;
const REG_TRIGGER_SET: usize = 0x74;
const REG_TRIGGER_CLEAR: usize = 0x78;

/// Flat pin number: 32 pins per port.
pub const fn pin(port: u32, bit: u32) -> u32 {
    port * 32 + bit
}

pub const PORT_A: u32 = 0;
pub const PORT_B: u32 = 1;
pub const PORT_C: u32 = 2;
pub const PORT_D: u32 = 3;
pub const PORT_E: u32 = 4;
pub const PORT_F: u32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinFunction {
    None,
    Func1,
    Func2,
    Func3,
}

/// One pin of a bulk request.
#[derive(Debug, Clone, Copy)]
pub struct PinRequest {
    pub pin: u32,
    pub name: &'static str,
    pub function: PinFunction,
}

/// Static description of one port.
#[derive(Debug, Clone, Copy)]
pub struct PortDesc {
    pub name: &'static str,
    pub pins: u8,
    /// First-level line the port's pin interrupts cascade into.
    pub irq: IrqLine,
}

pub struct Gpio {
    regs: RegisterBank,
    ports: &'static [PortDesc],
    requested: SpinLock<[u32; MAX_PORTS]>,
}

impl Gpio {
    /// Map the port registers at `base`.
    ///
    /// ## Safety
    ///
    /// `base` must be the GPIO register block, with one `PORT_STRIDE` frame
    /// per entry in `ports`.
    pub unsafe fn map(base: usize, ports: &'static [PortDesc]) -> Self {
        Self::with_registers(
            RegisterBank::new(base as *mut u32, ports.len() * PORT_STRIDE),
            ports,
        )
    }

    pub(crate) fn with_registers(regs: RegisterBank, ports: &'static [PortDesc]) -> Self {
        debug_assert!(ports.len() <= MAX_PORTS);
        Self {
            regs,
            ports,
            requested: SpinLock::new([0; MAX_PORTS]),
        }
    }

    pub fn ports(&self) -> &'static [PortDesc] {
        self.ports
    }

    fn split(&self, pin: u32) -> Result<(usize, u32)> {
        let port = (pin / 32) as usize;
        let bit = 1u32 << (pin % 32);
        if port >= self.ports.len() || (pin % 32) >= self.ports[port].pins as u32 {
            return Err(Error::InvalidArgument);
        }
        Ok((port, bit))
    }

    fn write(&self, port: usize, reg: usize, mask: u32) {
        self.regs.write(port * PORT_STRIDE + reg, mask);
    }

    /// Claim a pin for one consumer.
    pub fn request(&self, pin: u32, _label: &str) -> Result<()> {
        let (port, bit) = self.split(pin)?;
        let mut requested = self.requested.irqsave_lock();
        if requested[port] & bit != 0 {
            return Err(Error::Busy);
        }
        requested[port] |= bit;
        Ok(())
    }

    pub fn free(&self, pin: u32) {
        if let Ok((port, bit)) = self.split(pin) {
            self.requested.irqsave_lock()[port] &= !bit;
        }
    }

    /// Route a pin to a hardware function or back to plain I/O.
    pub fn set_function(&self, pin: u32, function: PinFunction) -> Result<()> {
        let (port, bit) = self.split(pin)?;
        match function {
            PinFunction::None => {
                self.write(port, REG_FUNC_CLEAR, bit);
                self.write(port, REG_SELECT_CLEAR, bit);
                self.write(port, REG_TRIGGER_CLEAR, bit);
            }
            PinFunction::Func1 => {
                self.write(port, REG_FUNC_SET, bit);
                self.write(port, REG_SELECT_CLEAR, bit);
                self.write(port, REG_TRIGGER_CLEAR, bit);
            }
            PinFunction::Func2 => {
                self.write(port, REG_FUNC_SET, bit);
                self.write(port, REG_SELECT_SET, bit);
                self.write(port, REG_TRIGGER_CLEAR, bit);
            }
            PinFunction::Func3 => {
                self.write(port, REG_FUNC_SET, bit);
                self.write(port, REG_SELECT_SET, bit);
                self.write(port, REG_TRIGGER_SET, bit);
            }
        }
        Ok(())
    }

    pub fn direction_output(&self, pin: u32, value: bool) -> Result<()> {
        let (port, bit) = self.split(pin)?;
        if value {
            self.write(port, REG_DATA_SET, bit);
        } else {
            self.write(port, REG_DATA_CLEAR, bit);
        }
        self.write(port, REG_DIRECTION_SET, bit);
        Ok(())
    }

    pub fn direction_input(&self, pin: u32) -> Result<()> {
        let (port, bit) = self.split(pin)?;
        self.write(port, REG_DIRECTION_CLEAR, bit);
        Ok(())
    }

    /// The pull register holds disable bits, so enabling the pull-up clears.
    pub fn enable_pullup(&self, pin: u32) -> Result<()> {
        let (port, bit) = self.split(pin)?;
        self.write(port, REG_PULL_CLEAR, bit);
        Ok(())
    }

    pub fn disable_pullup(&self, pin: u32) -> Result<()> {
        let (port, bit) = self.split(pin)?;
        self.write(port, REG_PULL_SET, bit);
        Ok(())
    }

    /// Claim every pin of `requests` and switch it to its function. On the
    /// first conflict everything already claimed is released again.
    pub fn bulk_request(&self, requests: &[PinRequest]) -> Result<()> {
        for (i, req) in requests.iter().enumerate() {
            if let Err(err) = self.request(req.pin, req.name) {
                error!("failed to request {} pin {}", req.name, req.pin);
                self.bulk_free(&requests[..i]);
                return Err(err);
            }
            self.set_function(req.pin, req.function)?;
        }
        Ok(())
    }

    pub fn bulk_free(&self, requests: &[PinRequest]) {
        for req in requests {
            let _ = self.set_function(req.pin, PinFunction::None);
            self.free(req.pin);
        }
    }

    /// Park the pins as plain inputs for suspend; ownership is kept.
    pub fn bulk_suspend(&self, requests: &[PinRequest]) {
        for req in requests {
            let _ = self.set_function(req.pin, PinFunction::None);
            let _ = self.direction_input(req.pin);
        }
    }

    /// Reapply the recorded functions after resume.
    pub fn bulk_resume(&self, requests: &[PinRequest]) {
        for req in requests {
            let _ = self.set_function(req.pin, req.function);
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use alloc::vec;

    pub(crate) static TEST_PORTS: [PortDesc; 4] = [
        PortDesc {
            name: "A",
            pins: 32,
            irq: 36,
        },
        PortDesc {
            name: "B",
            pins: 32,
            irq: 35,
        },
        PortDesc {
            name: "C",
            pins: 31,
            irq: 34,
        },
        PortDesc {
            name: "D",
            pins: 32,
            irq: 33,
        },
    ];

    pub(crate) struct FakeGpio {
        pub gpio: Gpio,
        pub mem: *mut u32,
    }

    impl FakeGpio {
        pub fn new() -> Self {
            let mem = vec![0u32; TEST_PORTS.len() * PORT_STRIDE / 4]
                .leak()
                .as_mut_ptr();
            let bank =
                unsafe { RegisterBank::new(mem, TEST_PORTS.len() * PORT_STRIDE) };
            Self {
                gpio: Gpio::with_registers(bank, &TEST_PORTS),
                mem,
            }
        }

        pub fn peek(&self, port: usize, reg: usize) -> u32 {
            unsafe { self.mem.add((port * PORT_STRIDE + reg) / 4).read_volatile() }
        }
    }

    #[test]
    fn test_pin_numbering() {
        assert_eq!(pin(PORT_A, 5), 5);
        assert_eq!(pin(PORT_D, 11), 3 * 32 + 11);
    }

    #[test]
    fn test_request_is_exclusive() {
        let f = FakeGpio::new();
        f.gpio.request(pin(PORT_B, 4), "uart").unwrap();
        assert_eq!(f.gpio.request(pin(PORT_B, 4), "pwm"), Err(Error::Busy));
        f.gpio.free(pin(PORT_B, 4));
        f.gpio.request(pin(PORT_B, 4), "pwm").unwrap();
    }

    #[test]
    fn test_request_rejects_missing_pin() {
        let f = FakeGpio::new();
        // Port C only has 31 pins.
        assert_eq!(
            f.gpio.request(pin(PORT_C, 31), "x"),
            Err(Error::InvalidArgument)
        );
        assert_eq!(f.gpio.request(pin(PORT_E, 0), "x"), Err(Error::InvalidArgument));
    }

    #[test]
    fn test_set_function_register_traffic() {
        let f = FakeGpio::new();
        f.gpio.set_function(pin(PORT_D, 4), PinFunction::Func1).unwrap();
        assert_eq!(f.peek(3, REG_FUNC_SET), 1 << 4);
        assert_eq!(f.peek(3, REG_SELECT_CLEAR), 1 << 4);

        f.gpio.set_function(pin(PORT_D, 4), PinFunction::Func3).unwrap();
        assert_eq!(f.peek(3, REG_SELECT_SET), 1 << 4);
        assert_eq!(f.peek(3, REG_TRIGGER_SET), 1 << 4);

        f.gpio.set_function(pin(PORT_D, 4), PinFunction::None).unwrap();
        assert_eq!(f.peek(3, REG_FUNC_CLEAR), 1 << 4);
    }

    #[test]
    fn test_bulk_request_rolls_back_on_conflict() {
        let f = FakeGpio::new();
        f.gpio.request(pin(PORT_A, 2), "owner").unwrap();

        let pins = [
            PinRequest {
                pin: pin(PORT_A, 0),
                name: "sda",
                function: PinFunction::Func1,
            },
            PinRequest {
                pin: pin(PORT_A, 1),
                name: "sck",
                function: PinFunction::Func1,
            },
            PinRequest {
                pin: pin(PORT_A, 2),
                name: "irq",
                function: PinFunction::Func1,
            },
        ];
        assert_eq!(f.gpio.bulk_request(&pins), Err(Error::Busy));

        // The first two were released again.
        f.gpio.request(pin(PORT_A, 0), "later").unwrap();
        f.gpio.request(pin(PORT_A, 1), "later").unwrap();
    }

    #[test]
    fn test_bulk_suspend_parks_and_resume_restores() {
        let f = FakeGpio::new();
        let pins = [PinRequest {
            pin: pin(PORT_B, 7),
            name: "lcd",
            function: PinFunction::Func2,
        }];
        f.gpio.bulk_request(&pins).unwrap();
        assert_eq!(f.peek(1, REG_FUNC_SET), 1 << 7);

        f.gpio.bulk_suspend(&pins);
        assert_eq!(f.peek(1, REG_FUNC_CLEAR), 1 << 7);
        assert_eq!(f.peek(1, REG_DIRECTION_CLEAR), 1 << 7);

        f.gpio.bulk_resume(&pins);
        assert_eq!(f.peek(1, REG_SELECT_SET), 1 << 7);
        // Still owned across the cycle.
        assert_eq!(f.gpio.request(pin(PORT_B, 7), "x"), Err(Error::Busy));
    }

    #[test]
    fn test_direction_output_drives_level_first() {
        let f = FakeGpio::new();
        f.gpio.direction_output(pin(PORT_A, 9), true).unwrap();
        assert_eq!(f.peek(0, REG_DATA_SET), 1 << 9);
        assert_eq!(f.peek(0, REG_DIRECTION_SET), 1 << 9);

        f.gpio.direction_output(pin(PORT_A, 9), false).unwrap();
        assert_eq!(f.peek(0, REG_DATA_CLEAR), 1 << 9);
    }

    #[test]
    fn test_pull_register_polarity() {
        let f = FakeGpio::new();
        f.gpio.enable_pullup(pin(PORT_A, 1)).unwrap();
        assert_eq!(f.peek(0, REG_PULL_CLEAR), 1 << 1);
        f.gpio.disable_pullup(pin(PORT_A, 1)).unwrap();
        assert_eq!(f.peek(0, REG_PULL_SET), 1 << 1);
    }
}
