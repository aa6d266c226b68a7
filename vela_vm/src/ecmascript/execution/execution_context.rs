// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use crate::ecmascript::{
    execution::{environments::DeclarativeEnvironment, realm::Realm},
    scripts_and_modules::module::module_semantics::source_text_module_records::SourceTextModule,
};

/// ### [9.4 Execution Contexts](https://tc39.es/ecma262/#sec-execution-contexts)
///
/// An execution context tracks the runtime evaluation of a module body or a
/// function body. Entering one must be paired with leaving it on every exit
/// path; a context that suspends at an `await` is popped off the stack and
/// stored in its await reaction until the awaited promise settles.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ExecutionContext {
    /// The LexicalEnvironment the code is evaluated against. Module and
    /// function code is always strict.
    pub(crate) lexical_environment: DeclarativeEnvironment,
    /// The Realm of the executing code.
    pub(crate) realm: Realm,
    /// ScriptOrModule of the executing code. Empty for host-initiated calls.
    pub(crate) module: Option<SourceTextModule>,
}
