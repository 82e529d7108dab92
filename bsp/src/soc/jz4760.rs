//! JZ4760 support: two interrupt banks, six GPIO ports, the OST as tick
//! source, and the full dual-gate-register clock tree.

#![allow(dead_code)]

use crate::{
    clock::{reg, Clk, ClkKind, ClockGraph, ClockTree, Gate, SrcSel, SLEEP_CTRL_SUSPEND_UHC},
    clock::lookup::ClkLookupEntry,
    gpio::{pin, Gpio, PortDesc, PORT_D, PORT_E},
    intc::{Intc, IrqLine, IRQ_BASE},
    mmio::RegisterBank,
    pwm::PwmDesc,
    soc::{BoardData, Soc, CPM_BASE, GPIO_BASE, INTC_BASE, TCU_BASE},
    timer::Tcu,
};

pub const NUM_INTC_BANKS: usize = 2;
pub const NR_IRQS: u32 = 270;

const fn irq(x: u32) -> IrqLine {
    IRQ_BASE + x
}

/* 1st-level interrupts */
pub const IRQ_I2C1: IrqLine = irq(0);
pub const IRQ_I2C0: IrqLine = irq(1);
pub const IRQ_UART3: IrqLine = irq(2);
pub const IRQ_UART2: IrqLine = irq(3);
pub const IRQ_UART1: IrqLine = irq(4);
pub const IRQ_UART0: IrqLine = irq(5);
pub const IRQ_GPU: IrqLine = irq(6);
pub const IRQ_SSI1: IrqLine = irq(7);
pub const IRQ_SSI0: IrqLine = irq(8);
pub const IRQ_TSSI: IrqLine = irq(9);
pub const IRQ_BDMA: IrqLine = irq(10);
pub const IRQ_KBC: IrqLine = irq(11);
pub const IRQ_GPIO5: IrqLine = irq(12);
pub const IRQ_GPIO4: IrqLine = irq(13);
pub const IRQ_GPIO3: IrqLine = irq(14);
pub const IRQ_GPIO2: IrqLine = irq(15);
pub const IRQ_GPIO1: IrqLine = irq(16);
pub const IRQ_GPIO0: IrqLine = irq(17);
pub const IRQ_SADC: IrqLine = irq(18);
pub const IRQ_ETH: IrqLine = irq(19);
pub const IRQ_UDC: IrqLine = irq(20);
pub const IRQ_OTG: IrqLine = irq(21);
pub const IRQ_MDMA: IrqLine = irq(22);
pub const IRQ_DMA1: IrqLine = irq(23);
pub const IRQ_DMA0: IrqLine = irq(24);
pub const IRQ_TCU2: IrqLine = irq(25);
pub const IRQ_TCU1: IrqLine = irq(26);
pub const IRQ_TCU0: IrqLine = irq(27);
pub const IRQ_GPS: IrqLine = irq(28);
pub const IRQ_IPU: IrqLine = irq(29);
pub const IRQ_CIM: IrqLine = irq(30);
pub const IRQ_LCD: IrqLine = irq(31);
pub const IRQ_RTC: IrqLine = irq(32);
pub const IRQ_OWI: IrqLine = irq(33);
pub const IRQ_AIC: IrqLine = irq(34);
pub const IRQ_MSC2: IrqLine = irq(35);
pub const IRQ_MSC1: IrqLine = irq(36);
pub const IRQ_MSC0: IrqLine = irq(37);
pub const IRQ_SCC: IrqLine = irq(38);
pub const IRQ_BCH: IrqLine = irq(39);
pub const IRQ_PCM: IrqLine = irq(40);
pub const IRQ_HARB0: IrqLine = irq(41);
pub const IRQ_HARB2: IrqLine = irq(42);

/* 2nd-level interrupts */
pub const fn irq_dma(x: u32) -> IrqLine {
    irq(64) + x
}

pub const fn irq_gpio(x: u32) -> IrqLine {
    irq(79) + x
}

pub const IRQ_ADC_BASE: IrqLine = irq(239);

/// The OST drives the tick on this part.
pub const OST_IRQ: IrqLine = IRQ_TCU0;

pub static GPIO_PORTS: [PortDesc; 6] = [
    PortDesc { name: "A", pins: 32, irq: IRQ_GPIO0 },
    PortDesc { name: "B", pins: 32, irq: IRQ_GPIO1 },
    PortDesc { name: "C", pins: 32, irq: IRQ_GPIO2 },
    PortDesc { name: "D", pins: 32, irq: IRQ_GPIO3 },
    PortDesc { name: "E", pins: 32, irq: IRQ_GPIO4 },
    PortDesc { name: "F", pins: 12, irq: IRQ_GPIO5 },
];

pub static PWM_LIST: [PwmDesc; 8] = [
    PwmDesc { id: 0, pin: pin(PORT_E, 0) },
    PwmDesc { id: 1, pin: pin(PORT_E, 1) },
    PwmDesc { id: 2, pin: pin(PORT_E, 2) },
    PwmDesc { id: 3, pin: pin(PORT_E, 3) },
    PwmDesc { id: 4, pin: pin(PORT_D, 4) },
    PwmDesc { id: 5, pin: pin(PORT_D, 5) },
    PwmDesc { id: 6, pin: pin(PORT_D, 10) },
    PwmDesc { id: 7, pin: pin(PORT_D, 11) },
];

/* First gate register */
const GATE0_NEMC: u32 = 1 << 0;
const GATE0_BCH: u32 = 1 << 1;
const GATE0_OTG: u32 = 1 << 2;
const GATE0_MSC0: u32 = 1 << 3;
const GATE0_SSI0: u32 = 1 << 4;
const GATE0_I2C0: u32 = 1 << 5;
const GATE0_I2C1: u32 = 1 << 6;
const GATE0_SCC: u32 = 1 << 7;
const GATE0_AIC: u32 = 1 << 8;
const GATE0_TSSI: u32 = 1 << 9;
const GATE0_OWI: u32 = 1 << 10;
const GATE0_MSC1: u32 = 1 << 11;
const GATE0_MSC2: u32 = 1 << 12;
const GATE0_KBC: u32 = 1 << 13;
const GATE0_SADC: u32 = 1 << 14;
const GATE0_UART0: u32 = 1 << 15;
const GATE0_UART1: u32 = 1 << 16;
const GATE0_UART2: u32 = 1 << 17;
const GATE0_UART3: u32 = 1 << 18;
const GATE0_SSI1: u32 = 1 << 19;
const GATE0_SSI2: u32 = 1 << 20;
const GATE0_DMAC: u32 = 1 << 21;
const GATE0_GPS: u32 = 1 << 22;
const GATE0_MAC: u32 = 1 << 23;
const GATE0_UHC: u32 = 1 << 24;
const GATE0_MDMA: u32 = 1 << 25;
const GATE0_CIM: u32 = 1 << 26;
const GATE0_TVE: u32 = 1 << 27;
const GATE0_LCD: u32 = 1 << 28;
const GATE0_IPU: u32 = 1 << 29;
const GATE0_DDR: u32 = 1 << 30;
const GATE0_EMC: u32 = 1 << 31;

/* Second gate register */
const GATE1_BDMA: u32 = 1 << 0;
const GATE1_MC: u32 = 1 << 1;
const GATE1_DBLK: u32 = 1 << 2;
const GATE1_ME: u32 = 1 << 3;
const GATE1_DCT: u32 = 1 << 4;
const GATE1_SRAM: u32 = 1 << 5;
const GATE1_CABAC: u32 = 1 << 6;
const GATE1_AHB1: u32 = 1 << 7;
const GATE1_PCM: u32 = 1 << 8;
const GATE1_GPU: u32 = 1 << 9;

/* Main control register divider fields */
const SDIV_OFFSET: u32 = 24;
const H2DIV_OFFSET: u32 = 16;
const MDIV_OFFSET: u32 = 12;
const PDIV_OFFSET: u32 = 8;
const HDIV_OFFSET: u32 = 4;
const CDIV_OFFSET: u32 = 0;

/* Peripheral divider registers */
const I2S_SRC_PLL: u32 = 1 << 31;
const I2S_DIV_MASK: u32 = 0x01ff;
const LCD_DIV_MASK: u32 = 0x07ff;
const MSC_SRC_PLL0: u32 = 1 << 31;
const MSC_DIV_MASK: u32 = 0x001f;
const UHC_DIV_MASK: u32 = 0x000f;
const SSI_SRC_PLL0: u32 = 1 << 31;
const SSI_DIV_MASK: u32 = 0x001f;

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
    let mclk = main_div(&mut g, "mclk", pll, MDIV_OFFSET);
    let hclk = main_div(&mut g, "hclk", pll, HDIV_OFFSET);
    let pclk = main_div(&mut g, "pclk", pll, PDIV_OFFSET);
    let h2clk = main_div(&mut g, "h2clk", pll, H2DIV_OFFSET);
    let sclk = main_div(&mut g, "sclk", pll, SDIV_OFFSET);

    let i2s = g.add(
        "i2s",
        Some(ext),
        Gate::None,
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
        "msc",
        Some(ext),
        Gate::None,
        ClkKind::Divided {
            reg: reg::MSC,
            mask: MSC_DIV_MASK,
            src: Some(SrcSel { bit: MSC_SRC_PLL0, pll: pll_half, ext, pll_when_set: false }),
            quiesce: false,
        },
    );
    let uhc = g.add(
        "uhc",
        Some(pll_half),
        Gate::Bank0(GATE0_UHC),
        ClkKind::Divided { reg: reg::UHC, mask: UHC_DIV_MASK, src: None, quiesce: true },
    );
    let ssi = g.add(
        "ssi",
        Some(pll_half),
        Gate::None,
        ClkKind::Divided {
            reg: reg::SSI,
            mask: SSI_DIV_MASK,
            src: Some(SrcSel { bit: SSI_SRC_PLL0, pll: pll_half, ext, pll_when_set: true }),
            quiesce: false,
        },
    );

    let bch = g.gated("bch", ext, Gate::Bank0(GATE0_BCH));
    let emc = g.gated("emc", ext, Gate::Bank0(GATE0_EMC));
    let ssi0 = g.gated("ssi0", ssi, Gate::Bank0(GATE0_SSI0));
    let ssi1 = g.gated("ssi1", ssi, Gate::Bank0(GATE0_SSI1));
    let ssi2 = g.gated("ssi2", ssi, Gate::Bank0(GATE0_SSI2));
    let msc0 = g.gated("msc0", msc, Gate::Bank0(GATE0_MSC0));
    let msc1 = g.gated("msc1", msc, Gate::Bank0(GATE0_MSC1));
    let msc2 = g.gated("msc2", msc, Gate::Bank0(GATE0_MSC2));
    let uart0 = g.gated("uart0", ext, Gate::Bank0(GATE0_UART0));
    let uart1 = g.gated("uart1", ext, Gate::Bank0(GATE0_UART1));
    let uart2 = g.gated("uart2", ext, Gate::Bank0(GATE0_UART2));
    let uart3 = g.gated("uart3", ext, Gate::Bank0(GATE0_UART3));
    let dma = g.gated("dma", hclk, Gate::Bank0(GATE0_DMAC));
    let ipu = g.gated("ipu", hclk, Gate::Bank0(GATE0_IPU));
    let adc = g.gated("adc", ext, Gate::Bank0(GATE0_SADC));
    let i2c0 = g.gated("i2c0", ext, Gate::Bank0(GATE0_I2C0));
    let i2c1 = g.gated("i2c1", ext, Gate::Bank0(GATE0_I2C1));
    let aic = g.gated("aic", ext, Gate::Bank0(GATE0_AIC));
    let lcd = g.gated("lcd", ext, Gate::Bank0(GATE0_LCD));

    let tree = ClockTree::new(regs, g, ext);

    // Adopt whatever sources the boot loader left selected.
    if tree.reg_read(reg::I2S) & I2S_SRC_PLL != 0 {
        tree.reparent(i2s, pll_half);
    }
    if tree.reg_read(reg::SSI) & SSI_SRC_PLL0 != 0 {
        tree.reparent(ssi, pll_half);
    }
    if tree.reg_read(reg::MSC) & MSC_SRC_PLL0 == 0 {
        tree.reparent(msc, pll_half);
    }

    // Card clock default; fails harmlessly when the divider is bypassed.
    let _ = tree.set_rate(msc, 12_000_000);

    tree.reg_clear_bits(reg::SLEEP_CTRL, SLEEP_CTRL_SUSPEND_UHC);

    tree.add_table(&[
        ClkLookupEntry::new(None, "ext", ext),
        ClkLookupEntry::new(None, "pll", pll),
        ClkLookupEntry::new(None, "pll half", pll_half),
        ClkLookupEntry::new(None, "cclk", cclk),
        ClkLookupEntry::new(None, "mclk", mclk),
        ClkLookupEntry::new(None, "hclk", hclk),
        ClkLookupEntry::new(None, "pclk", pclk),
        ClkLookupEntry::new(None, "h2clk", h2clk),
        ClkLookupEntry::new(None, "sclk", sclk),
        ClkLookupEntry::new(Some("jz4750-nand"), "bch", bch),
        ClkLookupEntry::new(Some("jz4750-nand"), "emc", emc),
        ClkLookupEntry::new(Some("jz4740-rtc"), "rtc", rtc),
        ClkLookupEntry::new(Some("jz4740-fb"), "lcd", lcd),
        ClkLookupEntry::new(Some("jz4740-fb"), "lcd_pclk", lcd_pclk),
        ClkLookupEntry::new(None, "ssi", ssi),
        ClkLookupEntry::new(None, "ssi0", ssi0),
        ClkLookupEntry::new(None, "ssi1", ssi1),
        ClkLookupEntry::new(None, "ssi2", ssi2),
        ClkLookupEntry::new(None, "i2c0", i2c0),
        ClkLookupEntry::new(None, "i2c1", i2c1),
        ClkLookupEntry::new(Some("jz4740-i2s"), "i2s", i2s),
        ClkLookupEntry::new(Some("jz4740-i2s"), "aic", aic),
        ClkLookupEntry::new(Some("jz4740-adc"), "adc", adc),
        ClkLookupEntry::new(None, "msc", msc),
        ClkLookupEntry::new(Some("jz4740-mmc.0"), "mmc", msc0),
        ClkLookupEntry::new(Some("jz4740-mmc.1"), "mmc", msc1),
        ClkLookupEntry::new(Some("jz4740-mmc.2"), "mmc", msc2),
        ClkLookupEntry::new(Some("jz4740-ohci"), "uhc", uhc),
        ClkLookupEntry::new(Some("jz4740-ohci"), "uhc-phy", uhc),
        ClkLookupEntry::new(None, "uart0", uart0),
        ClkLookupEntry::new(None, "uart1", uart1),
        ClkLookupEntry::new(None, "uart2", uart2),
        ClkLookupEntry::new(None, "uart3", uart3),
        ClkLookupEntry::new(None, "dma", dma),
        ClkLookupEntry::new(None, "ipu", ipu),
    ]);

    tree
}

/// Bring up the platform context.
///
/// ## Safety
///
/// Must run once, on a JZ4760, with the register blocks at their reset
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
