// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The AST interface between the (host-provided) parser and the Vela engine.
//!
//! The engine consumes a module-goal parse result in pre-analysed form: a
//! statement list plus the module's import/export entries already classified
//! the way [16.2.1.7 ParseModule](https://tc39.es/ecma262/#sec-parsemodule)
//! classifies them. The parser is responsible for that classification and for
//! enforcing the syntactic restrictions the engine relies on, most notably
//! that `await` only occurs in the statement positions listed on
//! [`Statement`].

/// A half-open byte range into the original source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    pub start: u32,
    pub end: u32,
}

impl Span {
    pub const fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }

    pub fn into_range(&self) -> std::ops::Range<usize> {
        self.start as usize..self.end as usize
    }
}

/// A parsed module source, ready to back a Source Text Module Record.
///
/// `requested_modules` lists every module specifier the source imports from,
/// in source text occurrence order, including side-effect-only imports that
/// produce no import entries.
#[derive(Debug, Clone, Default)]
pub struct ModuleSource {
    pub body: Vec<Statement>,
    pub requested_modules: Vec<String>,
    pub import_entries: Vec<ImportEntry>,
    pub local_export_entries: Vec<ExportEntry>,
    pub indirect_export_entries: Vec<ExportEntry>,
    pub star_export_entries: Vec<ExportEntry>,
    /// Whether the body contains a top-level `await`.
    pub has_top_level_await: bool,
}

/// ### [ImportEntry Record](https://tc39.es/ecma262/#table-importentry-record-fields)
#[derive(Debug, Clone)]
pub struct ImportEntry {
    /// \[\[ModuleRequest]]
    ///
    /// The module specifier this entry imports from.
    pub module_request: String,
    /// \[\[ImportName]]
    pub import_name: ImportName,
    /// \[\[LocalName]]
    ///
    /// The name under which the import is bound in the importing module.
    pub local_name: String,
}

/// \[\[ImportName]] of an [ImportEntry].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportName {
    /// `import { name } from "mod"` or `import name from "mod"` (`"default"`).
    Name(String),
    /// `import * as ns from "mod"`.
    Namespace,
}

/// ### [ExportEntry Record](https://tc39.es/ecma262/#table-exportentry-records)
///
/// Local exports carry `local_name`; indirect exports carry `module_request`
/// and `import_name`; star exports carry only `module_request`.
#[derive(Debug, Clone)]
pub struct ExportEntry {
    /// \[\[ExportName]]
    ///
    /// The name under which the export is visible to importers. Absent for
    /// star exports.
    pub export_name: Option<String>,
    /// \[\[ModuleRequest]]
    pub module_request: Option<String>,
    /// \[\[ImportName]]
    pub import_name: Option<ExportImportName>,
    /// \[\[LocalName]]
    pub local_name: Option<String>,
}

impl ExportEntry {
    /// `export { x }` / `export const x = ...`
    pub fn local(export_name: &str, local_name: &str) -> Self {
        Self {
            export_name: Some(export_name.to_string()),
            module_request: None,
            import_name: None,
            local_name: Some(local_name.to_string()),
        }
    }

    /// `export { x as y } from "mod"`
    pub fn indirect(export_name: &str, module_request: &str, import_name: &str) -> Self {
        Self {
            export_name: Some(export_name.to_string()),
            module_request: Some(module_request.to_string()),
            import_name: Some(ExportImportName::Name(import_name.to_string())),
            local_name: None,
        }
    }

    /// `export * as ns from "mod"`
    pub fn namespace(export_name: &str, module_request: &str) -> Self {
        Self {
            export_name: Some(export_name.to_string()),
            module_request: Some(module_request.to_string()),
            import_name: Some(ExportImportName::Namespace),
            local_name: None,
        }
    }

    /// `export * from "mod"`
    pub fn star(module_request: &str) -> Self {
        Self {
            export_name: None,
            module_request: Some(module_request.to_string()),
            import_name: Some(ExportImportName::All),
            local_name: None,
        }
    }
}

/// \[\[ImportName]] of an [ExportEntry].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportImportName {
    Name(String),
    /// `export * as ns from "mod"`: the target module's namespace object.
    Namespace,
    /// `export * from "mod"`.
    All,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclarationKind {
    Var,
    Let,
    Const,
}

impl DeclarationKind {
    pub fn is_lexical(self) -> bool {
        !matches!(self, DeclarationKind::Var)
    }
}

/// A statement of the narrow module/function-body grammar the engine
/// executes.
///
/// `await` is restricted to statement position: an expression statement
/// operand, a variable declaration initializer, an assignment value, or a
/// return argument. The parser desugars any other occurrence into this shape
/// before handing the body to the engine.
#[derive(Debug, Clone)]
pub enum Statement {
    Expression {
        expression: Expression,
        span: Span,
    },
    VariableDeclaration {
        kind: DeclarationKind,
        name: String,
        init: Option<Expression>,
        span: Span,
    },
    FunctionDeclaration {
        name: String,
        params: Vec<String>,
        body: Vec<Statement>,
        is_async: bool,
        span: Span,
    },
    Return {
        argument: Option<Expression>,
        span: Span,
    },
    If {
        test: Expression,
        consequent: Box<Statement>,
        alternate: Option<Box<Statement>>,
        span: Span,
    },
    While {
        test: Expression,
        body: Box<Statement>,
        span: Span,
    },
    Block {
        body: Vec<Statement>,
        span: Span,
    },
    Break {
        label: Option<String>,
        span: Span,
    },
    Continue {
        label: Option<String>,
        span: Span,
    },
    Throw {
        argument: Expression,
        span: Span,
    },
    Empty {
        span: Span,
    },
}

impl Statement {
    pub fn span(&self) -> Span {
        match self {
            Statement::Expression { span, .. }
            | Statement::VariableDeclaration { span, .. }
            | Statement::FunctionDeclaration { span, .. }
            | Statement::Return { span, .. }
            | Statement::If { span, .. }
            | Statement::While { span, .. }
            | Statement::Block { span, .. }
            | Statement::Break { span, .. }
            | Statement::Continue { span, .. }
            | Statement::Throw { span, .. }
            | Statement::Empty { span } => *span,
        }
    }
}

/// An expression of the narrow grammar.
#[derive(Debug, Clone)]
pub enum Expression {
    Literal {
        value: Literal,
        span: Span,
    },
    Identifier {
        name: String,
        span: Span,
    },
    /// `await expr`. Only valid in the statement positions documented on
    /// [`Statement`].
    Await {
        argument: Box<Expression>,
        span: Span,
    },
    Call {
        callee: Box<Expression>,
        arguments: Vec<Expression>,
        span: Span,
    },
    /// `object.property` with a static property name.
    Member {
        object: Box<Expression>,
        property: String,
        span: Span,
    },
    Assignment {
        target: AssignmentTarget,
        value: Box<Expression>,
        span: Span,
    },
    Binary {
        operator: BinaryOperator,
        left: Box<Expression>,
        right: Box<Expression>,
        span: Span,
    },
}

impl Expression {
    pub fn span(&self) -> Span {
        match self {
            Expression::Literal { span, .. }
            | Expression::Identifier { span, .. }
            | Expression::Await { span, .. }
            | Expression::Call { span, .. }
            | Expression::Member { span, .. }
            | Expression::Assignment { span, .. }
            | Expression::Binary { span, .. } => *span,
        }
    }
}

#[derive(Debug, Clone)]
pub enum AssignmentTarget {
    Identifier { name: String, span: Span },
    Member { object: Box<Expression>, property: String, span: Span },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Undefined,
    Null,
    Boolean(bool),
    Number(f64),
    String(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    Add,
    Subtract,
    LessThan,
    GreaterThan,
    /// `===`
    StrictEquals,
    /// `!==`
    StrictNotEquals,
}
