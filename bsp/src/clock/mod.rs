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

//! Clock generation unit.
//!
//! The clock tree is a flat arena of nodes rooted at the external oscillator
//! and the 32.768 kHz RTC oscillator. Consumers hold [`Clk`] handles (arena
//! indices) obtained from the lookup table and drive them through
//! [`ClockTree`] methods. Gate-register updates are read-modify-write under
//! the clock spin lock; everything else is plain register traffic.

pub mod lookup;

use crate::{
    error::{Error, Result},
    mmio::RegisterBank,
    support::with_quiesced,
    sync::SpinLock,
};
use alloc::vec::Vec;
use log::debug;

/// Register offsets within the clock block. The jz4760 layout; the older
/// parts share everything they have (they simply lack the second gate
/// register and the extra bus dividers).
pub(crate) mod reg {
    pub const CTRL: usize = 0x00;
    pub const LOW_POWER: usize = 0x04;
    pub const PLL: usize = 0x10;
    pub const GATE0: usize = 0x20;
    pub const SLEEP_CTRL: usize = 0x24;
    pub const GATE1: usize = 0x28;
    pub const I2S: usize = 0x60;
    pub const LCD: usize = 0x64;
    pub const MSC: usize = 0x68;
    pub const UHC: usize = 0x6C;
    pub const SSI: usize = 0x74;

    pub const LEN: usize = 0x100;
}

pub(crate) const CTRL_PLL_HALF: u32 = 1 << 21;

pub(crate) const PLL_STABLE: u32 = 1 << 10;
pub(crate) const PLL_BYPASS: u32 = 1 << 9;
pub(crate) const PLL_ENABLED: u32 = 1 << 8;

const LOW_POWER_MODE_SLEEP: u32 = 1 << 0;
pub(crate) const SLEEP_CTRL_SUSPEND_UHC: u32 = 1 << 5;

/// Retry bound for the PLL lock poll on resume. The hardware locks within a
/// few hundred microseconds; running out means the oscillator is gone.
const PLL_STABLE_RETRIES: u32 = 1_000_000;

/// CPU/bus divider encoding. The 4-bit register field indexes this table.
const MAIN_DIVS: [u32; 10] = [1, 2, 3, 4, 6, 8, 12, 16, 24, 32];

/// Handle to a node in the clock arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Clk(pub(crate) u16);

/// Gate bit location, if the node is gated at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gate {
    /// Always running; enable/disable are not supported.
    None,
    /// Bit in the first gate register.
    Bank0(u32),
    /// Bit in the second gate register (jz4760 only).
    Bank1(u32),
}

/// Source selection for divided clocks that can be fed from either the PLL
/// tap or the external oscillator.
#[derive(Debug, Clone, Copy)]
pub struct SrcSel {
    /// Select bit inside the node's divider register.
    pub bit: u32,
    /// Parent when the select bit routes to the PLL tap.
    pub pll: Clk,
    /// Parent when it routes to the external oscillator.
    pub ext: Clk,
    /// Bit polarity: `true` when a set bit selects the PLL tap.
    pub pll_when_set: bool,
}

#[derive(Debug, Clone, Copy)]
pub(crate) enum ClkKind {
    /// Board-supplied fixed rate (external osc, RTC osc).
    Fixed { rate: u32 },
    /// Rate derived from the PLL control register, transparent on bypass.
    Pll,
    /// PLL output, halved depending on a control bit.
    PllHalf,
    /// One of the bus dividers sharing the main control register.
    MainDiv { div_offset: u32 },
    /// Linear `field + 1` divider in a dedicated register.
    Divided {
        reg: usize,
        mask: u32,
        src: Option<SrcSel>,
        /// Gate the node around divider rewrites while it is running.
        quiesce: bool,
    },
    /// Gate only; rate follows the parent unchanged.
    Gated,
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct ClkNode {
    pub name: &'static str,
    pub parent: Option<Clk>,
    pub gate: Gate,
    pub kind: ClkKind,
}

/// Arena of clock nodes, built once per SoC variant at boot.
#[derive(Debug, Default)]
pub struct ClockGraph {
    nodes: Vec<ClkNode>,
}

impl ClockGraph {
    pub fn new() -> Self {
        Self { nodes: Vec::new() }
    }

    pub(crate) fn add(
        &mut self,
        name: &'static str,
        parent: Option<Clk>,
        gate: Gate,
        kind: ClkKind,
    ) -> Clk {
        let id = Clk(self.nodes.len() as u16);
        self.nodes.push(ClkNode {
            name,
            parent,
            gate,
            kind,
        });
        id
    }

    pub(crate) fn fixed(&mut self, name: &'static str, rate: u32) -> Clk {
        self.add(name, None, Gate::None, ClkKind::Fixed { rate })
    }

    pub(crate) fn gated(&mut self, name: &'static str, parent: Clk, gate: Gate) -> Clk {
        self.add(name, Some(parent), gate, ClkKind::Gated)
    }
}

/// The clock tree of one SoC.
pub struct ClockTree {
    regs: RegisterBank,
    /// Serializes gate/control register read-modify-write from process and
    /// interrupt context. Reads go unlocked.
    reg_lock: SpinLock<()>,
    graph: SpinLock<Vec<ClkNode>>,
    table: lookup::ClkTable,
    ext: Clk,
}

impl ClockTree {
    pub fn new(regs: RegisterBank, graph: ClockGraph, ext: Clk) -> Self {
        Self {
            regs,
            reg_lock: SpinLock::new(()),
            graph: SpinLock::new(graph.nodes),
            table: lookup::ClkTable::new(),
            ext,
        }
    }

    fn node(&self, clk: Clk) -> ClkNode {
        self.graph.irqsave_lock()[clk.0 as usize]
    }

    pub(crate) fn reg_read(&self, reg: usize) -> u32 {
        self.regs.read(reg)
    }

    pub(crate) fn reg_write_mask(&self, reg: usize, val: u32, mask: u32) {
        let _guard = self.reg_lock.irqsave_lock();
        let cur = self.regs.read(reg);
        self.regs.write(reg, (cur & !mask) | val);
    }

    pub(crate) fn reg_set_bits(&self, reg: usize, mask: u32) {
        let _guard = self.reg_lock.irqsave_lock();
        let cur = self.regs.read(reg);
        self.regs.write(reg, cur | mask);
    }

    pub(crate) fn reg_clear_bits(&self, reg: usize, mask: u32) {
        let _guard = self.reg_lock.irqsave_lock();
        let cur = self.regs.read(reg);
        self.regs.write(reg, cur & !mask);
    }

    fn gate_location(gate: Gate) -> Option<(usize, u32)> {
        match gate {
            Gate::None => None,
            Gate::Bank0(bit) => Some((reg::GATE0, bit)),
            Gate::Bank1(bit) => Some((reg::GATE1, bit)),
        }
    }

    /// Ungate the node. Fails on nodes that are always running.
    pub fn enable(&self, clk: Clk) -> Result<()> {
        let (reg, bit) =
            Self::gate_location(self.node(clk).gate).ok_or(Error::UnsupportedOperation)?;
        self.reg_clear_bits(reg, bit);
        Ok(())
    }

    /// Gate the node off. Fails on nodes that are always running.
    pub fn disable(&self, clk: Clk) -> Result<()> {
        let (reg, bit) =
            Self::gate_location(self.node(clk).gate).ok_or(Error::UnsupportedOperation)?;
        self.reg_set_bits(reg, bit);
        Ok(())
    }

    /// Gated nodes consult their gate bit; ungated nodes always report
    /// enabled.
    pub fn is_enabled(&self, clk: Clk) -> bool {
        match Self::gate_location(self.node(clk).gate) {
            None => true,
            Some((reg, bit)) => self.reg_read(reg) & bit == 0,
        }
    }

    /// Current output frequency in Hz.
    ///
    /// Nodes without a rate rule defer to their parent; a rootless chain of
    /// such nodes is malformed and reports `UnsupportedOperation`.
    pub fn rate(&self, clk: Clk) -> Result<u32> {
        let nodes = self.graph.irqsave_lock();
        self.node_rate(&nodes, clk)
    }

    fn parent_rate(&self, nodes: &[ClkNode], node: &ClkNode) -> Result<u32> {
        let parent = node.parent.ok_or(Error::UnsupportedOperation)?;
        self.node_rate(nodes, parent)
    }

    fn node_rate(&self, nodes: &[ClkNode], clk: Clk) -> Result<u32> {
        let node = &nodes[clk.0 as usize];
        match node.kind {
            ClkKind::Fixed { rate } => Ok(rate),
            ClkKind::Pll => {
                let parent_rate = self.parent_rate(nodes, node)?;
                let val = self.reg_read(reg::PLL);

                if val & PLL_BYPASS != 0 {
                    return Ok(parent_rate);
                }

                let m = (val >> 23) & 0xfe;
                let n = (val >> 18) & 0xf;
                let od = (val >> 16) & 0x3;

                // Divide before multiplying; the product does not fit 32 bits
                // the other way around. A zero divisor cannot leave the
                // factory but must not take the whole rate query down.
                let rate = (parent_rate / n.max(1)) * m / (1 << od);
                debug!("pll rate: {} {} {} {}", m, n, od, rate);
                Ok(rate)
            }
            ClkKind::PllHalf => {
                let pll_rate = self.parent_rate(nodes, node)?;
                if self.reg_read(reg::CTRL) & CTRL_PLL_HALF != 0 {
                    Ok(pll_rate)
                } else {
                    Ok(pll_rate >> 1)
                }
            }
            ClkKind::MainDiv { div_offset } => {
                let parent_rate = self.parent_rate(nodes, node)?;
                let mut idx = ((self.reg_read(reg::CTRL) >> div_offset) & 0xf) as usize;
                if idx >= MAIN_DIVS.len() {
                    idx = MAIN_DIVS.len() - 1;
                }
                Ok(parent_rate / MAIN_DIVS[idx])
            }
            ClkKind::Divided { reg, mask, .. } => {
                let parent_rate = self.parent_rate(nodes, node)?;
                // Fed straight from the external oscillator the divider is
                // bypassed by the hardware.
                if node.parent == Some(self.ext) {
                    return Ok(parent_rate);
                }
                let div = (self.reg_read(reg) & mask) + 1;
                Ok(parent_rate / div)
            }
            ClkKind::Gated => self.parent_rate(nodes, node),
        }
    }

    /// Closest achievable rate for `rate`, without touching the hardware.
    pub fn round_rate(&self, clk: Clk, rate: u32) -> Result<u32> {
        let nodes = self.graph.irqsave_lock();
        let node = &nodes[clk.0 as usize];
        match node.kind {
            ClkKind::MainDiv { .. } => {
                let parent_rate = self.parent_rate(&nodes, node)?;
                Ok(main_round_rate(parent_rate, rate))
            }
            ClkKind::Divided { mask, .. } => {
                if node.parent == Some(self.ext) {
                    return Err(Error::UnsupportedOperation);
                }
                let parent_rate = self.parent_rate(&nodes, node)?;
                let div = divided_div_for(parent_rate, rate, mask);
                Ok(parent_rate / div)
            }
            _ => Err(Error::UnsupportedOperation),
        }
    }

    /// Program the divisor so the achieved rate equals
    /// [`ClockTree::round_rate`] of the request.
    pub fn set_rate(&self, clk: Clk, rate: u32) -> Result<()> {
        let node = self.node(clk);
        match node.kind {
            ClkKind::MainDiv { div_offset } => {
                let rounded = self.round_rate(clk, rate)?;
                let parent_rate = {
                    let nodes = self.graph.irqsave_lock();
                    self.parent_rate(&nodes, &node)?
                };
                let idx = main_div_index(parent_rate, rounded);
                self.reg_write_mask(reg::CTRL, (idx as u32) << div_offset, 0xf << div_offset);
                Ok(())
            }
            ClkKind::Divided {
                reg,
                mask,
                quiesce,
                ..
            } => {
                if node.parent == Some(self.ext) {
                    return Err(Error::UnsupportedOperation);
                }
                let parent_rate = {
                    let nodes = self.graph.irqsave_lock();
                    self.parent_rate(&nodes, &node)?
                };
                let div = divided_div_for(parent_rate, rate, mask);
                let enabled = quiesce && node.gate != Gate::None && self.is_enabled(clk);
                with_quiesced(
                    enabled,
                    || {
                        let _ = self.disable(clk);
                    },
                    || {
                        let _ = self.enable(clk);
                    },
                    || {
                        self.reg_write_mask(reg, div - 1, mask);
                        debug!("{} rate: {} {}", node.name, rate, parent_rate / div);
                        Ok(())
                    },
                )
            }
            _ => Err(Error::UnsupportedOperation),
        }
    }

    /// Switch a source-selectable node between its PLL tap and the external
    /// oscillator, quiescing a live node around the switch.
    pub fn set_parent(&self, clk: Clk, parent: Clk) -> Result<()> {
        let node = self.node(clk);
        let src = match node.kind {
            ClkKind::Divided { src: Some(src), .. } => src,
            _ => return Err(Error::UnsupportedOperation),
        };
        if parent != src.pll && parent != src.ext {
            return Err(Error::InvalidArgument);
        }
        let (reg, _) = match node.kind {
            ClkKind::Divided { reg, mask, .. } => (reg, mask),
            _ => unreachable!(),
        };

        let enabled = node.gate != Gate::None && self.is_enabled(clk);
        with_quiesced(
            enabled,
            || {
                let _ = self.disable(clk);
            },
            || {
                let _ = self.enable(clk);
            },
            || {
                let select_pll = parent == src.pll;
                if select_pll == src.pll_when_set {
                    self.reg_set_bits(reg, src.bit);
                } else {
                    self.reg_clear_bits(reg, src.bit);
                }
                self.graph.irqsave_lock()[clk.0 as usize].parent = Some(parent);
                Ok(())
            },
        )
    }

    /// Look up a clock by optional device key and connection name.
    pub fn get(&self, dev_id: Option<&str>, con_id: &str) -> Result<Clk> {
        self.table.get(dev_id, con_id)
    }

    /// Append lookup entries. Earlier tables win ties between entries of
    /// equal specificity.
    pub fn add_table(&self, entries: &[lookup::ClkLookupEntry]) {
        self.table.add_table(entries);
    }

    /// Stop the PLL for suspend. Gated state is left alone; it is part of
    /// what resume must find unchanged.
    pub fn suspend(&self) {
        self.reg_clear_bits(reg::PLL, PLL_ENABLED);
    }

    /// Restart the PLL and poll for lock, bounded.
    pub fn resume(&self) -> Result<()> {
        self.reg_set_bits(reg::PLL, PLL_ENABLED);

        for _ in 0..PLL_STABLE_RETRIES {
            if self.reg_read(reg::PLL) & PLL_STABLE != 0 {
                return Ok(());
            }
            core::hint::spin_loop();
        }
        Err(Error::HardwareTimeout)
    }

    /// Select what the core's wait instruction does.
    pub fn set_wait_mode(&self, mode: WaitMode) {
        match mode {
            WaitMode::Idle => self.reg_clear_bits(reg::LOW_POWER, LOW_POWER_MODE_SLEEP),
            WaitMode::Sleep => self.reg_set_bits(reg::LOW_POWER, LOW_POWER_MODE_SLEEP),
        }
    }

    /// Boot-time only: adopt the parent the firmware left selected, without
    /// touching the select bit.
    pub(crate) fn reparent(&self, clk: Clk, parent: Clk) {
        self.graph.irqsave_lock()[clk.0 as usize].parent = Some(parent);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitMode {
    Idle,
    Sleep,
}

/// Round to the nearest achievable main-divider rate at or above `rate`,
/// clamped to the undivided parent above and the /32 floor below.
fn main_round_rate(parent_rate: u32, rate: u32) -> u32 {
    if rate == 0 {
        return parent_rate / 32;
    }
    let div = parent_rate / rate;
    if div > 32 {
        return parent_rate / 32;
    }
    if div < 1 {
        return parent_rate;
    }
    let div = MAIN_DIVS
        .iter()
        .rev()
        .find(|&&d| d <= div)
        .copied()
        .unwrap_or(1);
    parent_rate / div
}

/// Register field index for a rate previously produced by
/// [`main_round_rate`].
fn main_div_index(parent_rate: u32, rounded: u32) -> usize {
    let div = parent_rate / rounded.max(1);
    MAIN_DIVS
        .iter()
        .rposition(|&d| d <= div)
        .unwrap_or(0)
}

/// Linear divider choice: `parent / div >= rate` with the largest in-range
/// divisor when the request is unreachable.
fn divided_div_for(parent_rate: u32, rate: u32, mask: u32) -> u32 {
    if rate == 0 {
        return mask + 1;
    }
    let div = parent_rate / rate;
    div.clamp(1, mask + 1)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use alloc::vec;

    pub(crate) fn fake_bank() -> RegisterBank {
        let mem = vec![0u32; reg::LEN / 4].leak();
        unsafe { RegisterBank::new(mem.as_mut_ptr(), reg::LEN) }
    }

    struct TestTree {
        tree: ClockTree,
        ext: Clk,
        pll: Clk,
        pll_half: Clk,
        cclk: Clk,
        msc: Clk,
        uart0: Clk,
        gpu: Clk,
    }

    /// 12 MHz ext, PLL at (12 MHz / 2) * 24 = 144 MHz.
    fn test_tree() -> TestTree {
        let bank = fake_bank();
        let mut g = ClockGraph::new();
        let ext = g.fixed("ext", 12_000_000);
        let pll = g.add("pll", Some(ext), Gate::None, ClkKind::Pll);
        let pll_half = g.add("pll half", Some(pll), Gate::None, ClkKind::PllHalf);
        let cclk = g.add(
            "cclk",
            Some(pll),
            Gate::None,
            ClkKind::MainDiv { div_offset: 0 },
        );
        let msc = g.add(
            "msc",
            Some(pll_half),
            Gate::Bank0(1 << 3),
            ClkKind::Divided {
                reg: reg::MSC,
                mask: 0x1f,
                src: Some(SrcSel {
                    bit: 1 << 31,
                    pll: pll_half,
                    ext,
                    pll_when_set: true,
                }),
                quiesce: true,
            },
        );
        let uart0 = g.gated("uart0", ext, Gate::Bank0(1 << 15));
        let gpu = g.gated("gpu", pll_half, Gate::Bank1(1 << 9));

        let tree = ClockTree::new(bank, g, ext);
        // M = 24, N = 2, OD = 0, bypass off.
        tree.regs.write(reg::PLL, (24 << 23) | (2 << 18));
        TestTree {
            tree,
            ext,
            pll,
            pll_half,
            cclk,
            msc,
            uart0,
            gpu,
        }
    }

    #[test]
    fn test_fixed_and_pll_rate() {
        let t = test_tree();
        assert_eq!(t.tree.rate(t.ext).unwrap(), 12_000_000);
        assert_eq!(t.tree.rate(t.pll).unwrap(), 144_000_000);
    }

    #[test]
    fn test_pll_bypass_returns_parent_rate() {
        let t = test_tree();
        t.tree.reg_set_bits(reg::PLL, PLL_BYPASS);
        assert_eq!(t.tree.rate(t.pll).unwrap(), 12_000_000);
    }

    #[test]
    fn test_pll_rate_ignores_low_multiplier_bit() {
        // The multiplier field is read through an even mask, so the low bit
        // of the raw register field never reaches the computation. Keep the
        // readback stable against that quirk rather than "fixing" it.
        let t = test_tree();
        t.tree.regs.write(reg::PLL, (25 << 23) | (2 << 18));
        assert_eq!(t.tree.rate(t.pll).unwrap(), 144_000_000);
    }

    #[test]
    fn test_pll_half_follows_control_bit() {
        let t = test_tree();
        assert_eq!(t.tree.rate(t.pll_half).unwrap(), 72_000_000);
        t.tree.reg_set_bits(reg::CTRL, CTRL_PLL_HALF);
        assert_eq!(t.tree.rate(t.pll_half).unwrap(), 144_000_000);
    }

    #[test]
    fn test_main_round_rate_idempotent() {
        let t = test_tree();
        let parent = t.tree.rate(t.pll).unwrap();
        let mut target = 0u32;
        while target <= 2 * parent {
            let once = t.tree.round_rate(t.cclk, target).unwrap();
            let twice = t.tree.round_rate(t.cclk, once).unwrap();
            assert_eq!(once, twice, "target {}", target);
            target += parent / 64;
        }
    }

    #[test]
    fn test_main_set_rate_matches_round_rate() {
        let t = test_tree();
        let parent = t.tree.rate(t.pll).unwrap();
        let mut target = 0u32;
        while target <= 2 * parent {
            let rounded = t.tree.round_rate(t.cclk, target).unwrap();
            t.tree.set_rate(t.cclk, target).unwrap();
            assert_eq!(t.tree.rate(t.cclk).unwrap(), rounded, "target {}", target);
            target += parent / 64;
        }
    }

    #[test]
    fn test_main_round_rate_clamps() {
        let t = test_tree();
        let parent = t.tree.rate(t.pll).unwrap();
        assert_eq!(t.tree.round_rate(t.cclk, parent * 2).unwrap(), parent);
        assert_eq!(t.tree.round_rate(t.cclk, 1).unwrap(), parent / 32);
    }

    #[test]
    fn test_gate_enable_disable_readback() {
        let t = test_tree();
        for clk in [t.uart0, t.gpu] {
            t.tree.enable(clk).unwrap();
            assert!(t.tree.is_enabled(clk));
            t.tree.disable(clk).unwrap();
            assert!(!t.tree.is_enabled(clk));
        }
    }

    #[test]
    fn test_gate_banks_are_independent() {
        let t = test_tree();
        t.tree.disable(t.gpu).unwrap();
        assert_eq!(t.tree.reg_read(reg::GATE0) & (1 << 9), 0);
        assert_ne!(t.tree.reg_read(reg::GATE1) & (1 << 9), 0);
    }

    #[test]
    fn test_ungated_node_is_always_enabled() {
        let t = test_tree();
        assert_eq!(t.tree.enable(t.ext), Err(Error::UnsupportedOperation));
        assert_eq!(t.tree.disable(t.ext), Err(Error::UnsupportedOperation));
        assert!(t.tree.is_enabled(t.ext));
    }

    #[test]
    fn test_gated_rate_defers_to_parent() {
        let t = test_tree();
        assert_eq!(t.tree.rate(t.uart0).unwrap(), 12_000_000);
        assert_eq!(t.tree.rate(t.gpu).unwrap(), 72_000_000);
    }

    #[test]
    fn test_rootless_chain_reports_unsupported() {
        let bank = fake_bank();
        let mut g = ClockGraph::new();
        let orphan = g.add("orphan", None, Gate::None, ClkKind::Gated);
        let tree = ClockTree::new(bank, g, Clk(0));
        assert_eq!(tree.rate(orphan), Err(Error::UnsupportedOperation));
    }

    #[test]
    fn test_divided_set_rate_round_trip() {
        let t = test_tree();
        // 72 MHz parent / 6.
        t.tree.set_rate(t.msc, 12_000_000).unwrap();
        assert_eq!(t.tree.rate(t.msc).unwrap(), 12_000_000);
        assert_eq!(t.tree.reg_read(reg::MSC) & 0x1f, 5);
        assert_eq!(t.tree.round_rate(t.msc, 12_000_000).unwrap(), 12_000_000);
    }

    #[test]
    fn test_divided_quiesces_while_enabled() {
        let t = test_tree();
        t.tree.enable(t.msc).unwrap();
        t.tree.set_rate(t.msc, 12_000_000).unwrap();
        // Re-enabled after the reprogram window.
        assert!(t.tree.is_enabled(t.msc));
    }

    #[test]
    fn test_divided_on_ext_rejects_set_rate() {
        let t = test_tree();
        t.tree.reparent(t.msc, t.ext);
        assert_eq!(
            t.tree.set_rate(t.msc, 1_000_000),
            Err(Error::UnsupportedOperation)
        );
        // Divider bypassed: rate is the oscillator's.
        assert_eq!(t.tree.rate(t.msc).unwrap(), 12_000_000);
    }

    #[test]
    fn test_set_parent_switches_source() {
        let t = test_tree();
        t.tree.reparent(t.msc, t.ext);
        t.tree.enable(t.msc).unwrap();

        t.tree.set_parent(t.msc, t.pll_half).unwrap();
        assert_ne!(t.tree.reg_read(reg::MSC) & (1 << 31), 0);
        assert!(t.tree.is_enabled(t.msc));
        assert_eq!(t.tree.rate(t.msc).unwrap(), 72_000_000);

        t.tree.set_parent(t.msc, t.ext).unwrap();
        assert_eq!(t.tree.reg_read(reg::MSC) & (1 << 31), 0);
        assert_eq!(t.tree.rate(t.msc).unwrap(), 12_000_000);
    }

    #[test]
    fn test_set_parent_rejects_unrelated_node() {
        let t = test_tree();
        assert_eq!(
            t.tree.set_parent(t.msc, t.cclk),
            Err(Error::InvalidArgument)
        );
        assert_eq!(
            t.tree.set_parent(t.uart0, t.ext),
            Err(Error::UnsupportedOperation)
        );
    }

    #[test]
    fn test_suspend_stops_pll() {
        let t = test_tree();
        t.tree.reg_set_bits(reg::PLL, PLL_ENABLED);
        t.tree.suspend();
        assert_eq!(t.tree.reg_read(reg::PLL) & PLL_ENABLED, 0);
    }

    #[test]
    fn test_resume_times_out_without_lock() {
        let t = test_tree();
        assert_eq!(t.tree.resume(), Err(Error::HardwareTimeout));
        assert_ne!(t.tree.reg_read(reg::PLL) & PLL_ENABLED, 0);
    }

    #[test]
    fn test_resume_sees_stable_pll() {
        let t = test_tree();
        t.tree.reg_set_bits(reg::PLL, PLL_STABLE);
        assert_eq!(t.tree.resume(), Ok(()));
    }

    #[test]
    fn test_wait_mode_toggles_sleep_bit() {
        let t = test_tree();
        t.tree.set_wait_mode(WaitMode::Sleep);
        assert_ne!(t.tree.reg_read(reg::LOW_POWER) & 1, 0);
        t.tree.set_wait_mode(WaitMode::Idle);
        assert_eq!(t.tree.reg_read(reg::LOW_POWER) & 1, 0);
    }
}
