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

//! Board support for the Ingenic JZ4740/JZ4750/JZ4760 SoC family: the clock
//! tree, the two-level interrupt demultiplexer, the timer/OST tick sources
//! and PWM, and the pin-mux bulk helper every on-chip peripheral driver
//! builds on.

#![cfg_attr(not(test), no_std)]
#![cfg_attr(all(target_arch = "mips", target_os = "none"), feature(asm_experimental_arch))]

extern crate alloc;

pub mod arch;
pub mod clock;
pub mod error;
pub mod gpio;
pub mod intc;
pub mod mmio;
pub mod ost;
pub mod pwm;
pub mod soc;
mod static_ref;
mod support;
pub mod sync;
pub mod time;
pub mod timer;

pub use error::{Error, Result};
