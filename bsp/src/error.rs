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

use thiserror::Error;

/// Errors returned by the clock, interrupt, timer and PWM layers.
///
/// Spurious cascade interrupts are counted and logged by the interrupt
/// controller but never surface here.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The node or channel does not implement the requested operation.
    #[error("operation not supported by this node")]
    UnsupportedOperation,
    /// Lookup miss.
    #[error("no such entry")]
    NotFound,
    /// The resource is exclusively claimed by another consumer.
    #[error("resource busy")]
    Busy,
    /// The request cannot be represented by the hardware.
    #[error("invalid argument")]
    InvalidArgument,
    /// A bounded hardware poll ran out of retries.
    #[error("hardware poll timed out")]
    HardwareTimeout,
}

impl embedded_hal::pwm::Error for Error {
    fn kind(&self) -> embedded_hal::pwm::ErrorKind {
        embedded_hal::pwm::ErrorKind::Other
    }
}

pub type Result<T> = core::result::Result<T, Error>;
