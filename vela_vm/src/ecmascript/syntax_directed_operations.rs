// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

pub(crate) mod miscellaneous;
pub(crate) mod scope_analysis;

pub(crate) use miscellaneous::{
    block_declaration_instantiation, function_declaration_instantiation,
    instantiate_function_object,
};
pub(crate) use scope_analysis::{
    lexically_scoped_declarations, var_scoped_declarations, LexicallyScopedDeclaration,
};
