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

//! Name-keyed clock registry.
//!
//! Several controllers share a connection name ("mmc" exists once per MSC
//! instance), so entries carry an optional device key and an exact device
//! match outranks a wildcard one. Ties keep registration order.

use crate::{
    error::{Error, Result},
    sync::SpinLock,
};
use alloc::vec::Vec;

use super::Clk;

#[derive(Debug, Clone, Copy)]
pub struct ClkLookupEntry {
    /// `None` matches any device.
    pub dev_id: Option<&'static str>,
    pub con_id: &'static str,
    pub clk: Clk,
}

impl ClkLookupEntry {
    pub const fn new(dev_id: Option<&'static str>, con_id: &'static str, clk: Clk) -> Self {
        Self {
            dev_id,
            con_id,
            clk,
        }
    }
}

#[derive(Debug)]
pub(crate) struct ClkTable {
    entries: SpinLock<Vec<ClkLookupEntry>>,
}

impl ClkTable {
    pub fn new() -> Self {
        Self {
            entries: SpinLock::new(Vec::new()),
        }
    }

    pub fn add_table(&self, entries: &[ClkLookupEntry]) {
        self.entries.irqsave_lock().extend_from_slice(entries);
    }

    pub fn get(&self, dev_id: Option<&str>, con_id: &str) -> Result<Clk> {
        let entries = self.entries.irqsave_lock();

        let mut best: Option<(u32, Clk)> = None;
        for entry in entries.iter() {
            let mut rank = 1;
            if entry.con_id != con_id {
                continue;
            }
            if let Some(entry_dev) = entry.dev_id {
                match dev_id {
                    Some(dev) if dev == entry_dev => rank += 2,
                    _ => continue,
                }
            }
            // Strictly greater: the earliest entry of a given rank wins.
            if best.map_or(true, |(r, _)| rank > r) {
                best = Some((rank, entry.clk));
            }
        }

        best.map(|(_, clk)| clk).ok_or(Error::NotFound)
    }
}
