//! JZ4750 support.
//!
//! The part is a close sibling of the JZ4740 on the clock side and reuses
//! its tree; interrupt lines, timer wiring and PWM pins are its own.

#![allow(dead_code)]

use crate::{
    clock::reg,
    gpio::{pin, Gpio, PortDesc, PORT_D},
    intc::{Intc, IrqLine, IRQ_BASE},
    mmio::RegisterBank,
    pwm::PwmDesc,
    soc::{jz4740, BoardData, Soc, CPM_BASE, GPIO_BASE, INTC_BASE, TCU_BASE},
    timer::Tcu,
};

pub const NUM_INTC_BANKS: usize = 1;
pub const NR_IRQS: u32 = 190;

const fn irq(x: u32) -> IrqLine {
    IRQ_BASE + x
}

/* 1st-level interrupts */
pub const IRQ_SFT: IrqLine = irq(4);
pub const IRQ_I2C: IrqLine = irq(5);
pub const IRQ_RTC: IrqLine = irq(6);
pub const IRQ_UART0: IrqLine = irq(9);
pub const IRQ_AIC: IrqLine = irq(10);
pub const IRQ_GPIO3: IrqLine = irq(13);
pub const IRQ_GPIO2: IrqLine = irq(14);
pub const IRQ_GPIO1: IrqLine = irq(15);
pub const IRQ_GPIO0: IrqLine = irq(16);
pub const IRQ_BCH: IrqLine = irq(17);
pub const IRQ_SADC: IrqLine = irq(18);
pub const IRQ_CIM: IrqLine = irq(19);
pub const IRQ_TCU2: IrqLine = irq(21);
pub const IRQ_TCU1: IrqLine = irq(22);
pub const IRQ_TCU0: IrqLine = irq(23);
pub const IRQ_MSC1: IrqLine = irq(24);
pub const IRQ_MSC0: IrqLine = irq(25);
pub const IRQ_SSI: IrqLine = irq(26);
pub const IRQ_UDC: IrqLine = irq(27);
pub const IRQ_DMA0: IrqLine = irq(29);
pub const IRQ_IPU: IrqLine = irq(30);
pub const IRQ_LCD: IrqLine = irq(31);

/* 2nd-level interrupts */
pub const fn irq_dma(x: u32) -> IrqLine {
    irq(32) + x
}

pub const fn irq_gpio(x: u32) -> IrqLine {
    irq(48) + x
}

pub const IRQ_ADC_BASE: IrqLine = irq(176);

/// Tick timer wiring: clockevent on channel 0, raised on the TCU1 line.
pub const TIMER_CLOCKEVENT: usize = 0;
pub const CLOCKEVENT_IRQ: IrqLine = IRQ_TCU1;

pub static GPIO_PORTS: [PortDesc; 4] = [
    PortDesc { name: "A", pins: 32, irq: IRQ_GPIO0 },
    PortDesc { name: "B", pins: 32, irq: IRQ_GPIO1 },
    PortDesc { name: "C", pins: 31, irq: IRQ_GPIO2 },
    PortDesc { name: "D", pins: 32, irq: IRQ_GPIO3 },
];

pub static PWM_LIST: [PwmDesc; 6] = [
    PwmDesc { id: 0, pin: pin(PORT_D, 23) },
    PwmDesc { id: 1, pin: pin(PORT_D, 24) },
    PwmDesc { id: 2, pin: pin(PORT_D, 25) },
    PwmDesc { id: 3, pin: pin(PORT_D, 26) },
    PwmDesc { id: 4, pin: pin(PORT_D, 27) },
    PwmDesc { id: 5, pin: pin(PORT_D, 28) },
];

/// Bring up the platform context.
///
/// ## Safety
///
/// Must run once, on a JZ4750, with the register blocks at their reset
/// addresses.
pub unsafe fn soc(board: BoardData) -> Soc {
    Soc {
        clocks: jz4740::build_clocks(
            RegisterBank::new(CPM_BASE as *mut u32, reg::LEN),
            &board,
        ),
        intc: Intc::map(INTC_BASE, NUM_INTC_BANKS),
        tcu: Tcu::map(TCU_BASE),
        gpio: Gpio::map(GPIO_BASE, &GPIO_PORTS),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tick_raises_on_tcu1() {
        assert_eq!(CLOCKEVENT_IRQ, 30);
        assert_eq!(TIMER_CLOCKEVENT, 0);
    }

    #[test]
    fn test_pwm_channels_start_at_zero() {
        assert_eq!(PWM_LIST[0].id, 0);
        assert_eq!(PWM_LIST.len(), 6);
    }
}
