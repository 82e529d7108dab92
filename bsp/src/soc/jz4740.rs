//! JZ4740 support: one interrupt bank, four GPIO ports, the 16-bit timer
//! channels as tick and clocksource, and the single-gate-register clock
//! tree.

#![allow(dead_code)]

use crate::{
    clock::{reg, Clk, ClkKind, ClockGraph, ClockTree, Gate, SrcSel},
    clock::lookup::ClkLookupEntry,
    gpio::{pin, Gpio, PortDesc, PORT_D},
    intc::{Intc, IrqLine, IRQ_BASE},
    mmio::RegisterBank,
    pwm::PwmDesc,
    soc::{BoardData, Soc, CPM_BASE, GPIO_BASE, INTC_BASE, TCU_BASE},
    timer::Tcu,
};

pub const NUM_INTC_BANKS: usize = 1;
pub const NR_IRQS: u32 = 182;

const fn irq(x: u32) -> IrqLine {
    IRQ_BASE + x
}

/* 1st-level interrupts */
pub const IRQ_I2C: IrqLine = irq(1);
pub const IRQ_UHC: IrqLine = irq(3);
pub const IRQ_UART1: IrqLine = irq(8);
pub const IRQ_UART0: IrqLine = irq(9);
pub const IRQ_SADC: IrqLine = irq(12);
pub const IRQ_MSC: IrqLine = irq(14);
pub const IRQ_RTC: IrqLine = irq(15);
pub const IRQ_SSI: IrqLine = irq(16);
pub const IRQ_CIM: IrqLine = irq(17);
pub const IRQ_AIC: IrqLine = irq(18);
pub const IRQ_ETH: IrqLine = irq(19);
pub const IRQ_DMAC: IrqLine = irq(20);
pub const IRQ_TCU2: IrqLine = irq(21);
pub const IRQ_TCU1: IrqLine = irq(22);
pub const IRQ_TCU0: IrqLine = irq(23);
pub const IRQ_UDC: IrqLine = irq(24);
pub const IRQ_GPIO3: IrqLine = irq(25);
pub const IRQ_GPIO2: IrqLine = irq(26);
pub const IRQ_GPIO1: IrqLine = irq(27);
pub const IRQ_GPIO0: IrqLine = irq(28);
pub const IRQ_IPU: IrqLine = irq(29);
pub const IRQ_LCD: IrqLine = irq(30);

/* 2nd-level interrupts */
pub const fn irq_dma(x: u32) -> IrqLine {
    irq(32) + x
}

pub const fn irq_gpio(x: u32) -> IrqLine {
    irq(48) + x
}

pub const IRQ_ADC_BASE: IrqLine = irq(176);

/// Tick timer wiring: clockevent on channel 0, clocksource free-running on
/// channel 1.
pub const TIMER_CLOCKEVENT: usize = 0;
pub const TIMER_CLOCKSOURCE: usize = 1;
pub const CLOCKEVENT_IRQ: IrqLine = IRQ_TCU0;

pub static GPIO_PORTS: [PortDesc; 4] = [
    PortDesc { name: "A", pins: 32, irq: IRQ_GPIO0 },
    PortDesc { name: "B", pins: 32, irq: IRQ_GPIO1 },
    PortDesc { name: "C", pins: 31, irq: IRQ_GPIO2 },
    PortDesc { name: "D", pins: 32, irq: IRQ_GPIO3 },
];

/// PWM outputs 0 and 1 share pins with the RTC oscillator on this part and
/// are not routed.
pub static PWM_LIST: [PwmDesc; 6] = [
    PwmDesc { id: 2, pin: pin(PORT_D, 25) },
    PwmDesc { id: 3, pin: pin(PORT_D, 26) },
    PwmDesc { id: 4, pin: pin(PORT_D, 27) },
    PwmDesc { id: 5, pin: pin(PORT_D, 28) },
    PwmDesc { id: 6, pin: pin(PORT_D, 30) },
    PwmDesc { id: 7, pin: pin(PORT_D, 31) },
];

/* The single gate register */
const GATE_UART0: u32 = 1 << 0;
const GATE_TCU: u32 = 1 << 1;
const GATE_RTC: u32 = 1 << 2;
const GATE_I2C: u32 = 1 << 3;
const GATE_SSI: u32 = 1 << 4;
const GATE_AIC: u32 = 1 << 5;
const GATE_AIC2: u32 = 1 << 6;
const GATE_MSC: u32 = 1 << 7;
const GATE_SADC: u32 = 1 << 8;
const GATE_CIM: u32 = 1 << 9;
const GATE_LCD: u32 = 1 << 10;
const GATE_UDC: u32 = 1 << 11;
const GATE_DMAC: u32 = 1 << 12;
const GATE_IPU: u32 = 1 << 13;
const GATE_UHC: u32 = 1 << 14;
const GATE_UART1: u32 = 1 << 15;

/* Main control register divider fields */
const LDIV_OFFSET: u32 = 16;
const MDIV_OFFSET: u32 = 12;
const PDIV_OFFSET: u32 = 8;
const HDIV_OFFSET: u32 = 4;
const CDIV_OFFSET: u32 = 0;

/* Peripheral divider registers */
const I2S_SRC_PLL: u32 = 1 << 31;
const I2S_DIV_MASK: u32 = 0x01ff;
const LCD_DIV_MASK: u32 = 0x07ff;
const MSC_DIV_MASK: u32 = 0x001f;
const UHC_DIV_MASK: u32 = 0x000f;
const SSI_DIV_MASK: u32 = 0x000f;

fn main_div(g: &mut ClockGraph, name: &'static str, pll: Clk, div_offset: u32) -> Clk {
    g.add(name, Some(pll), Gate::None, ClkKind::MainDiv { div_offset })
}

pub(crate) fn build_clocks(regs: RegisterBank, board: &BoardData) -> ClockTree {
    let mut g = ClockGraph::new();

    let ext = g.fixed("ext", board.ext_rate);
    let rtc = g.fixed("rtc", board.rtc_rate);
    let pll = g.add("pll", Some(ext), Gate::None, ClkKind::Pll);
    let pll_half = g.add("pll half", Some(pll), Gate::None, ClkKind::PllHalf);

    let cclk = main_div(&mut g, "cclk", pll, CDIV_OFFSET);
    let hclk = main_div(&mut g, "hclk", pll, HDIV_OFFSET);
    let pclk = main_div(&mut g, "pclk", pll, PDIV_OFFSET);
    let mclk = main_div(&mut g, "mclk", pll, MDIV_OFFSET);

    let i2s = g.add(
        "i2s",
        Some(ext),
        Gate::Bank0(GATE_AIC),
        ClkKind::Divided {
            reg: reg::I2S,
            mask: I2S_DIV_MASK,
            src: Some(SrcSel { bit: I2S_SRC_PLL, pll: pll_half, ext, pll_when_set: true }),
            quiesce: false,
        },
    );
    let lcd_pclk = g.add(
        "lcd_pclk",
        Some(pll_half),
        Gate::None,
        ClkKind::Divided { reg: reg::LCD, mask: LCD_DIV_MASK, src: None, quiesce: false },
    );
    let msc = g.add(
        "mmc",
        Some(pll_half),
        Gate::Bank0(GATE_MSC),
        ClkKind::Divided { reg: reg::MSC, mask: MSC_DIV_MASK, src: None, quiesce: false },
    );
    let uhc = g.add(
        "uhc",
        Some(pll_half),
        Gate::Bank0(GATE_UHC),
        ClkKind::Divided { reg: reg::UHC, mask: UHC_DIV_MASK, src: None, quiesce: true },
    );
    let ssi = g.add(
        "ssi",
        Some(pll_half),
        Gate::Bank0(GATE_SSI),
        ClkKind::Divided { reg: reg::SSI, mask: SSI_DIV_MASK, src: None, quiesce: false },
    );

    let uart0 = g.gated("uart0", ext, Gate::Bank0(GATE_UART0));
    let uart1 = g.gated("uart1", ext, Gate::Bank0(GATE_UART1));
    let tcu = g.gated("tcu", ext, Gate::Bank0(GATE_TCU));
    let i2c = g.gated("i2c", ext, Gate::Bank0(GATE_I2C));
    let aic = g.gated("aic", ext, Gate::Bank0(GATE_AIC));
    let adc = g.gated("adc", ext, Gate::Bank0(GATE_SADC));
    let cim = g.gated("cim", hclk, Gate::Bank0(GATE_CIM));
    let lcd = g.gated("lcd", ext, Gate::Bank0(GATE_LCD));
    let udc = g.gated("udc", ext, Gate::Bank0(GATE_UDC));
    let dma = g.gated("dma", hclk, Gate::Bank0(GATE_DMAC));
    let ipu = g.gated("ipu", hclk, Gate::Bank0(GATE_IPU));

    let tree = ClockTree::new(regs, g, ext);

    if tree.reg_read(reg::I2S) & I2S_SRC_PLL != 0 {
        tree.reparent(i2s, pll_half);
    }

    tree.add_table(&[
        ClkLookupEntry::new(None, "ext", ext),
        ClkLookupEntry::new(None, "pll", pll),
        ClkLookupEntry::new(None, "pll half", pll_half),
        ClkLookupEntry::new(None, "cclk", cclk),
        ClkLookupEntry::new(None, "hclk", hclk),
        ClkLookupEntry::new(None, "pclk", pclk),
        ClkLookupEntry::new(None, "mclk", mclk),
        ClkLookupEntry::new(Some("jz4740-rtc"), "rtc", rtc),
        ClkLookupEntry::new(Some("jz4740-fb"), "lcd", lcd),
        ClkLookupEntry::new(Some("jz4740-fb"), "lcd_pclk", lcd_pclk),
        ClkLookupEntry::new(Some("jz4740-i2s"), "i2s", i2s),
        ClkLookupEntry::new(Some("jz4740-i2s"), "aic", aic),
        ClkLookupEntry::new(Some("jz4740-adc"), "adc", adc),
        ClkLookupEntry::new(Some("jz4740-mmc.0"), "mmc", msc),
        ClkLookupEntry::new(Some("jz4740-ohci"), "uhc", uhc),
        ClkLookupEntry::new(None, "ssi", ssi),
        ClkLookupEntry::new(None, "tcu", tcu),
        ClkLookupEntry::new(None, "i2c", i2c),
        ClkLookupEntry::new(None, "cim", cim),
        ClkLookupEntry::new(None, "udc", udc),
        ClkLookupEntry::new(None, "uart0", uart0),
        ClkLookupEntry::new(None, "uart1", uart1),
        ClkLookupEntry::new(None, "dma", dma),
        ClkLookupEntry::new(None, "ipu", ipu),
    ]);

    tree
}

/// Bring up the platform context.
///
/// ## Safety
///
/// Must run once, on a JZ4740, with the register blocks at their reset
/// addresses.
pub unsafe fn soc(board: BoardData) -> Soc {
    Soc {
        clocks: build_clocks(
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
    use crate::clock::tests::fake_bank;

    const BOARD: BoardData = BoardData {
        ext_rate: 12_000_000,
        rtc_rate: 32768,
    };

    #[test]
    fn test_single_mmc_instance() {
        let bank = fake_bank();
        bank.write(reg::PLL, (24 << 23) | (2 << 18));
        let tree = build_clocks(bank, &BOARD);

        let mmc = tree.get(Some("jz4740-mmc.0"), "mmc").unwrap();
        // Half PLL / (field + 1), field reset 0.
        assert_eq!(tree.rate(mmc).unwrap(), 72_000_000);
    }

    #[test]
    fn test_bus_clock_names() {
        let bank = fake_bank();
        bank.write(reg::PLL, (24 << 23) | (2 << 18));
        let tree = build_clocks(bank, &BOARD);
        for name in ["ext", "pll", "cclk", "hclk", "pclk", "mclk"] {
            tree.get(None, name).unwrap();
        }
    }

    #[test]
    fn test_timer_wiring_constants() {
        assert_ne!(TIMER_CLOCKEVENT, TIMER_CLOCKSOURCE);
        assert_eq!(CLOCKEVENT_IRQ, 31);
        assert_eq!(irq_dma(3), 43);
        assert_eq!(irq_gpio(0), 56);
        assert_eq!(IRQ_ADC_BASE, 184);
    }
}
