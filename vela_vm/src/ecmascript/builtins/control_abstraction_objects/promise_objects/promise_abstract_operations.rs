// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

pub(crate) mod promise_capability_records;
pub(crate) mod promise_jobs;
pub(crate) mod promise_reaction_records;

pub use promise_capability_records::PromiseCapability;
