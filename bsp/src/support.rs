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

use crate::arch;

#[derive(Debug)]
pub(crate) struct DisableInterruptGuard {
    old: usize,
}

impl DisableInterruptGuard {
    #[inline]
    pub fn new() -> Self {
        Self {
            old: arch::disable_local_irq_save(),
        }
    }
}

impl Drop for DisableInterruptGuard {
    #[inline]
    fn drop(&mut self) {
        arch::enable_local_irq_restore(self.old);
    }
}

/// Run `mutate` with the consumer quiesced.
///
/// If `enabled` the resource is gated off before the mutation and gated back
/// on afterwards, whether or not the mutation succeeded. Live dividers,
/// source switches and PWM reprogramming all glitch without this window.
pub(crate) fn with_quiesced<T, E>(
    enabled: bool,
    disable: impl FnOnce(),
    enable: impl FnOnce(),
    mutate: impl FnOnce() -> core::result::Result<T, E>,
) -> core::result::Result<T, E> {
    if enabled {
        disable();
    }
    let ret = mutate();
    if enabled {
        enable();
    }
    ret
}
