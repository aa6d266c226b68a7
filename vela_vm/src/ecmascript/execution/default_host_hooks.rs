// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::any::Any;

use crate::ecmascript::{
    execution::{
        agent::{ExceptionType, HostHooks},
        Agent, JsResult,
    },
    scripts_and_modules::module::module_semantics::source_text_module_records::SourceTextModule,
};

/// Host hooks for a host that does not support module resolution.
#[derive(Debug)]
pub struct DefaultHostHooks;

impl HostHooks for DefaultHostHooks {
    fn resolve_imported_module(
        &self,
        agent: &mut Agent,
        _referrer: SourceTextModule,
        specifier: &str,
    ) -> JsResult<SourceTextModule> {
        let error_message = format!("Failed to resolve module '{}'.", specifier);
        Err(agent.throw_exception(ExceptionType::TypeError, error_message))
    }

    fn get_host_data(&self) -> &dyn Any {
        &()
    }
}
