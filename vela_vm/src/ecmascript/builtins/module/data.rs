// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use crate::ecmascript::{
    scripts_and_modules::module::module_semantics::source_text_module_records::SourceTextModule,
    types::String,
};

#[derive(Debug)]
pub struct ModuleHeapData {
    /// \[\[Module]]
    ///
    /// The module whose exports this namespace exposes.
    pub(crate) module: SourceTextModule,
    /// \[\[Exports]]
    ///
    /// The unambiguously resolvable exported names, sorted by code unit
    /// order.
    pub(crate) exports: Box<[String]>,
}
