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

//! Local interrupt control for the XBurst (MIPS32) cores.

cfg_if::cfg_if! {
    if #[cfg(all(target_arch = "mips", target_os = "none"))] {
        use core::arch::asm;

        const STATUS_IE: usize = 1;

        /// Disable local interrupts, returning the previous CP0 Status word.
        #[inline]
        pub fn disable_local_irq_save() -> usize {
            let status: usize;
            unsafe {
                asm!("mfc0 {0}, $12", out(reg) status);
                asm!("mtc0 {0}, $12", "ehb", in(reg) status & !STATUS_IE);
            }
            status
        }

        /// Restore a CP0 Status word saved by [`disable_local_irq_save`].
        #[inline]
        pub fn enable_local_irq_restore(old: usize) {
            unsafe {
                asm!("mtc0 {0}, $12", "ehb", in(reg) old);
            }
        }

        /// Stall the pipeline until an interrupt arrives.
        #[inline]
        pub fn wait_for_interrupt() {
            unsafe {
                asm!(".set mips3", "wait", ".set mips0");
            }
        }
    } else {
        // Hosted build: interrupt state is a no-op so the drivers can be
        // exercised by unit tests.
        #[inline]
        pub fn disable_local_irq_save() -> usize {
            0
        }

        #[inline]
        pub fn enable_local_irq_restore(_old: usize) {}

        #[inline]
        pub fn wait_for_interrupt() {}
    }
}
