// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The statement list executor and the await bridge.
//!
//! Statement execution folds a body into a single [`Completion`]; bodies that
//! may await run under a [`Vm`] cursor which can suspend at a pending promise
//! and later be resumed by an await reaction with the settled value.

use vela_ast as ast;

use crate::ecmascript::{
    abstract_operations::{
        operations_on_functions::call_function,
        operations_on_objects::{get_property, set_property},
    },
    builtins::promise::{data::PromiseState, Promise},
    execution::{
        agent::{ExceptionType, PromiseRejectionTrackerOperation},
        environments::{
            new_declarative_environment, resolve_binding, set_binding, DeclarativeEnvironment,
        },
        Agent, JsError, JsResult,
    },
    syntax_directed_operations::block_declaration_instantiation,
    types::{String, Value},
};

use super::executable::Executable;

/// ### [6.2.4 The Completion Record Specification Type](https://tc39.es/ecma262/#sec-completion-record-specification-type)
///
/// The uniform result of executing a statement. The value is optional: an
/// empty normal completion is produced by declarations and other statements
/// that contribute no value to their statement list.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Completion {
    Normal(Option<Value>),
    Break {
        label: Option<String>,
        value: Option<Value>,
    },
    Continue {
        label: Option<String>,
        value: Option<Value>,
    },
    Return {
        value: Value,
    },
    /// A throw completion always carries the thrown error value; the span of
    /// the erring statement is kept for diagnostics.
    Throw {
        error: JsError,
        span: ast::Span,
    },
}

impl Completion {
    /// ### [6.2.4.3 UpdateEmpty ( completionRecord, value )](https://tc39.es/ecma262/#sec-updateempty)
    ///
    /// Fill in the completion's value with `value` if it has none of its own.
    fn update_empty(self, value: Option<Value>) -> Completion {
        match self {
            Completion::Normal(None) => Completion::Normal(value),
            Completion::Break { label, value: None } => Completion::Break { label, value },
            Completion::Continue { label, value: None } => Completion::Continue { label, value },
            other => other,
        }
    }
}

/// The result of running a body under a [`Vm`] cursor.
#[derive(Debug)]
pub(crate) enum ExecutionResult {
    /// The body ran to completion without an explicit `return`; carries the
    /// value of the statement list.
    Normal(Value),
    /// An explicit `return` completion.
    Return(Value),
    Throw(JsError),
    /// The body awaited a pending promise. The suspended cursor re-enters at
    /// the same point once the promise settles.
    Await {
        vm: SuspendedVm,
        awaited_promise: Promise,
    },
}

/// What to do with the awaited value when a suspended body is resumed.
///
/// `await` occurs at statement position, so resumption completes the
/// suspended statement with the settled value substituted for the await
/// expression and then continues with the following statement.
#[derive(Debug, Clone, Copy)]
pub(crate) enum AwaitTarget {
    /// `await expr;` — the value becomes the statement's value.
    Drop,
    /// `let x = await expr;` and friends.
    Initialize { name: String, is_lexical: bool },
    /// `x = await expr;`
    AssignIdentifier { name: String },
    /// `obj.prop = await expr;` — the target reference was evaluated before
    /// suspension, in source order.
    AssignMember { object: Value, property: String },
    /// `return await expr;`
    Return,
}

/// A parked statement list cursor, stored in an await reaction while its
/// awaited promise is pending.
#[derive(Debug, Clone, Copy)]
pub(crate) struct SuspendedVm {
    /// Index of the statement that suspended.
    ip: usize,
    /// The statement list value accumulated so far.
    result: Option<Value>,
    target: AwaitTarget,
}

#[derive(Debug)]
pub(crate) struct Vm {
    ip: usize,
    result: Option<Value>,
}

enum AwaitedValue {
    Ready(Value),
    Thrown(JsError),
    Pending(Promise),
}

enum AwaitContinuation {
    Next(Option<Value>),
    Return(Value),
}

impl Vm {
    /// Execute a built statement list against the running execution context.
    /// Each call starts a fresh cursor over the same built list.
    pub(crate) fn execute(agent: &mut Agent, executable: Executable) -> ExecutionResult {
        let vm = Vm {
            ip: 0,
            result: None,
        };
        vm.inner_execute(agent, executable)
    }

    fn inner_execute(mut self, agent: &mut Agent, executable: Executable) -> ExecutionResult {
        let statements = agent[executable].statements.clone();
        let env = agent.running_execution_context().lexical_environment;
        while self.ip < statements.len() {
            let index = self.ip;
            // Reuse the build-time resolved completion if one exists.
            if let Some(fast) = agent[executable].fast_completions[index] {
                if fast.is_return {
                    return ExecutionResult::Return(fast.value);
                }
                self.result = Some(fast.value);
                self.ip += 1;
                continue;
            }
            let statement = &statements[index];
            if let Some((argument, position)) = find_await_site(statement) {
                // The target reference of an assignment is evaluated before
                // the awaited operand, in source order.
                let target = match build_await_target(agent, position, env) {
                    Ok(target) => target,
                    Err(error) => return ExecutionResult::Throw(error),
                };
                let value = match evaluate_expression(agent, argument, env) {
                    Ok(value) => value,
                    Err(error) => return ExecutionResult::Throw(error),
                };
                match await_value(agent, value) {
                    AwaitedValue::Ready(value) => {
                        match apply_await_target(agent, target, value, env) {
                            Ok(AwaitContinuation::Next(statement_value)) => {
                                if let Some(value) = statement_value {
                                    self.result = Some(value);
                                }
                            }
                            Ok(AwaitContinuation::Return(value)) => {
                                return ExecutionResult::Return(value);
                            }
                            Err(error) => return ExecutionResult::Throw(error),
                        }
                    }
                    AwaitedValue::Thrown(error) => return ExecutionResult::Throw(error),
                    AwaitedValue::Pending(awaited_promise) => {
                        return ExecutionResult::Await {
                            vm: SuspendedVm {
                                ip: self.ip,
                                result: self.result,
                                target,
                            },
                            awaited_promise,
                        };
                    }
                }
            } else {
                match execute_statement(agent, statement, env) {
                    Completion::Normal(Some(value)) => self.result = Some(value),
                    Completion::Normal(None) => {}
                    Completion::Return { value } => return ExecutionResult::Return(value),
                    Completion::Throw { error, span } => {
                        if agent.options.print_internals {
                            eprintln!(
                                "[vm] throw completion from statement at {}..{}",
                                span.start, span.end
                            );
                        }
                        return ExecutionResult::Throw(error);
                    }
                    Completion::Break { .. } => {
                        return ExecutionResult::Throw(
                            agent.throw_exception(
                                ExceptionType::SyntaxError,
                                "Illegal break statement.",
                            ),
                        );
                    }
                    Completion::Continue { .. } => {
                        return ExecutionResult::Throw(agent.throw_exception(
                            ExceptionType::SyntaxError,
                            "Illegal continue statement.",
                        ));
                    }
                }
            }
            self.ip += 1;
        }
        ExecutionResult::Normal(self.result.unwrap_or(Value::Undefined))
    }
}

impl SuspendedVm {
    /// Re-enter the suspended body with the settled value as the result of
    /// the await, completing the suspended statement and continuing with the
    /// one after it.
    pub(crate) fn resume(
        self,
        agent: &mut Agent,
        executable: Executable,
        value: Value,
    ) -> ExecutionResult {
        let SuspendedVm { ip, result, target } = self;
        let env = agent.running_execution_context().lexical_environment;
        let mut vm = Vm { ip, result };
        match apply_await_target(agent, target, value, env) {
            Ok(AwaitContinuation::Next(statement_value)) => {
                if let Some(value) = statement_value {
                    vm.result = Some(value);
                }
            }
            Ok(AwaitContinuation::Return(value)) => return ExecutionResult::Return(value),
            Err(error) => return ExecutionResult::Throw(error),
        }
        vm.ip += 1;
        vm.inner_execute(agent, executable)
    }

    /// Re-enter the suspended body with a rejection reason as the result of
    /// the await. There are no try statements inside this core, so the throw
    /// propagates straight out of the body, sourced at the await.
    pub(crate) fn resume_throw(
        self,
        _agent: &mut Agent,
        _executable: Executable,
        reason: Value,
    ) -> ExecutionResult {
        ExecutionResult::Throw(JsError::new(reason))
    }
}

/// The awaited operand and resume target of a statement-position `await`.
enum AwaitPosition<'a> {
    Drop,
    Initialize {
        name: &'a str,
        is_lexical: bool,
    },
    AssignIdentifier {
        name: &'a str,
    },
    AssignMember {
        object: &'a ast::Expression,
        property: &'a str,
    },
    Return,
}

fn find_await_site(statement: &ast::Statement) -> Option<(&ast::Expression, AwaitPosition)> {
    match statement {
        ast::Statement::Expression {
            expression: ast::Expression::Await { argument, .. },
            ..
        } => Some((&**argument, AwaitPosition::Drop)),
        ast::Statement::Expression {
            expression: ast::Expression::Assignment { target, value, .. },
            ..
        } => {
            let ast::Expression::Await { argument, .. } = &**value else {
                return None;
            };
            let position = match target {
                ast::AssignmentTarget::Identifier { name, .. } => {
                    AwaitPosition::AssignIdentifier { name }
                }
                ast::AssignmentTarget::Member {
                    object, property, ..
                } => AwaitPosition::AssignMember {
                    object: &**object,
                    property,
                },
            };
            Some((&**argument, position))
        }
        ast::Statement::VariableDeclaration {
            kind,
            name,
            init: Some(ast::Expression::Await { argument, .. }),
            ..
        } => Some((
            &**argument,
            AwaitPosition::Initialize {
                name,
                is_lexical: kind.is_lexical(),
            },
        )),
        ast::Statement::Return {
            argument: Some(ast::Expression::Await { argument, .. }),
            ..
        } => Some((&**argument, AwaitPosition::Return)),
        _ => None,
    }
}

fn build_await_target(
    agent: &mut Agent,
    position: AwaitPosition,
    env: DeclarativeEnvironment,
) -> JsResult<AwaitTarget> {
    Ok(match position {
        AwaitPosition::Drop => AwaitTarget::Drop,
        AwaitPosition::Initialize { name, is_lexical } => AwaitTarget::Initialize {
            name: String::from_str(agent, name),
            is_lexical,
        },
        AwaitPosition::AssignIdentifier { name } => AwaitTarget::AssignIdentifier {
            name: String::from_str(agent, name),
        },
        AwaitPosition::AssignMember { object, property } => {
            let object = evaluate_expression(agent, object, env)?;
            AwaitTarget::AssignMember {
                object,
                property: String::from_str(agent, property),
            }
        }
        AwaitPosition::Return => AwaitTarget::Return,
    })
}

fn apply_await_target(
    agent: &mut Agent,
    target: AwaitTarget,
    value: Value,
    env: DeclarativeEnvironment,
) -> JsResult<AwaitContinuation> {
    match target {
        AwaitTarget::Drop => Ok(AwaitContinuation::Next(Some(value))),
        AwaitTarget::Initialize { name, is_lexical } => {
            if is_lexical {
                // The binding was created uninitialized when the scope was
                // instantiated.
                env.initialize_binding(agent, name, value);
            } else {
                set_binding(agent, name, value, env)?;
            }
            Ok(AwaitContinuation::Next(None))
        }
        AwaitTarget::AssignIdentifier { name } => {
            set_binding(agent, name, value, env)?;
            Ok(AwaitContinuation::Next(Some(value)))
        }
        AwaitTarget::AssignMember { object, property } => {
            set_property(agent, object, property, value)?;
            Ok(AwaitContinuation::Next(Some(value)))
        }
        AwaitTarget::Return => Ok(AwaitContinuation::Return(value)),
    }
}

/// ### [27.7.5.3 Await ( value )](https://tc39.es/ecma262/#await)
///
/// Settled promises and plain values complete the await synchronously; a
/// rejected promise raises the rejection reason as a throw. For a pending
/// promise the continuation queue is drained first, since a queued reaction
/// may settle the promise; only if it stays pending does the computation
/// park.
fn await_value(agent: &mut Agent, value: Value) -> AwaitedValue {
    let Value::Promise(promise) = value else {
        return AwaitedValue::Ready(value);
    };
    if let Some(result) = promise.try_get_result(agent) {
        return settled_await(agent, promise, result);
    }
    agent.run_jobs();
    match promise.try_get_result(agent) {
        Some(result) => settled_await(agent, promise, result),
        None => AwaitedValue::Pending(promise),
    }
}

fn settled_await(agent: &mut Agent, promise: Promise, result: JsResult<Value>) -> AwaitedValue {
    match result {
        Ok(value) => AwaitedValue::Ready(value),
        Err(error) => {
            // Awaiting a rejection observes it.
            if matches!(
                agent[promise].promise_state,
                PromiseState::Rejected {
                    is_handled: false,
                    ..
                }
            ) {
                promise.set_is_handled(agent);
                agent
                    .host_hooks
                    .promise_rejection_tracker(promise, PromiseRejectionTrackerOperation::Handle);
            }
            AwaitedValue::Thrown(error)
        }
    }
}

/// Fold an ordered statement list into a single completion.
///
/// Statements execute in order; the value of the list is the last non-empty
/// normal completion value. Any abrupt completion stops the fold and is
/// returned, carrying the list value so far when it has none of its own. A
/// list that completes normally without producing a value has the value
/// `undefined` at the consumer.
pub(crate) fn execute_statement_list(
    agent: &mut Agent,
    statements: &[ast::Statement],
    env: DeclarativeEnvironment,
) -> Completion {
    let mut result: Option<Value> = None;
    for statement in statements {
        match execute_statement(agent, statement, env) {
            Completion::Normal(Some(value)) => result = Some(value),
            Completion::Normal(None) => {}
            abrupt => return abrupt.update_empty(result),
        }
    }
    Completion::Normal(result)
}

pub(crate) fn execute_statement(
    agent: &mut Agent,
    statement: &ast::Statement,
    env: DeclarativeEnvironment,
) -> Completion {
    match statement {
        ast::Statement::Expression { expression, span } => {
            match evaluate_expression(agent, expression, env) {
                Ok(value) => Completion::Normal(Some(value)),
                Err(error) => Completion::Throw { error, span: *span },
            }
        }
        ast::Statement::VariableDeclaration {
            kind,
            name,
            init,
            span,
        } => {
            let value = match init {
                Some(init) => match evaluate_expression(agent, init, env) {
                    Ok(value) => value,
                    Err(error) => return Completion::Throw { error, span: *span },
                },
                None => Value::Undefined,
            };
            let name = String::from_str(agent, name);
            if kind.is_lexical() {
                // The binding was created uninitialized when the containing
                // scope was instantiated.
                env.initialize_binding(agent, name, value);
            } else if let Err(error) = set_binding(agent, name, value, env) {
                return Completion::Throw { error, span: *span };
            }
            Completion::Normal(None)
        }
        // Function declarations are instantiated when the containing scope
        // is; the statement itself contributes nothing.
        ast::Statement::FunctionDeclaration { .. } => Completion::Normal(None),
        ast::Statement::Return { argument, span } => {
            let value = match argument {
                Some(argument) => match evaluate_expression(agent, argument, env) {
                    Ok(value) => value,
                    Err(error) => return Completion::Throw { error, span: *span },
                },
                None => Value::Undefined,
            };
            Completion::Return { value }
        }
        ast::Statement::If {
            test,
            consequent,
            alternate,
            span,
        } => {
            // [14.6.2 IfStatement Evaluation](https://tc39.es/ecma262/#sec-if-statement-runtime-semantics-evaluation)
            let test_value = match evaluate_expression(agent, test, env) {
                Ok(value) => value,
                Err(error) => return Completion::Throw { error, span: *span },
            };
            let completion = if test_value.is_truthy(agent) {
                execute_statement(agent, consequent, env)
            } else if let Some(alternate) = alternate {
                execute_statement(agent, alternate, env)
            } else {
                Completion::Normal(None)
            };
            // Return Completion(UpdateEmpty(stmtCompletion, undefined)).
            completion.update_empty(Some(Value::Undefined))
        }
        ast::Statement::While { test, body, span } => {
            // [14.7.3.2 WhileLoopEvaluation](https://tc39.es/ecma262/#sec-whileloopevaluation)
            // 1. Let V be undefined.
            let mut result: Option<Value> = None;
            // 2. Repeat,
            loop {
                // a-c. If ToBoolean(exprValue) is false, return V.
                let test_value = match evaluate_expression(agent, test, env) {
                    Ok(value) => value,
                    Err(error) => return Completion::Throw { error, span: *span },
                };
                if !test_value.is_truthy(agent) {
                    return Completion::Normal(Some(result.unwrap_or(Value::Undefined)));
                }
                // d. Let stmtResult be Completion(Evaluation of Statement).
                match execute_statement(agent, body, env) {
                    // f. If stmtResult.[[Value]] is not empty, set V to it.
                    Completion::Normal(Some(value)) => result = Some(value),
                    Completion::Normal(None) => {}
                    Completion::Continue { label: None, value } => {
                        if let Some(value) = value {
                            result = Some(value);
                        }
                    }
                    // e. If LoopContinues(stmtResult) is false, return
                    //    Completion(UpdateEmpty(stmtResult, V)).
                    Completion::Break { label: None, value } => {
                        return Completion::Normal(Some(
                            value.or(result).unwrap_or(Value::Undefined),
                        ));
                    }
                    abrupt => return abrupt.update_empty(result),
                }
            }
        }
        ast::Statement::Block { body, .. } => {
            // [14.2.2 Block Evaluation](https://tc39.es/ecma262/#sec-block-runtime-semantics-evaluation)
            // 1. Let blockEnv be NewDeclarativeEnvironment(running context's
            //    LexicalEnvironment).
            let block_env = new_declarative_environment(agent, Some(env));
            // 2. Perform BlockDeclarationInstantiation(StatementList, blockEnv).
            block_declaration_instantiation(agent, body, block_env);
            // 3-6. Evaluate the statement list in blockEnv; the block's
            //    environment is discarded on exit.
            execute_statement_list(agent, body, block_env)
        }
        ast::Statement::Break { label, .. } => Completion::Break {
            label: label.as_ref().map(|label| String::from_str(agent, label)),
            value: None,
        },
        ast::Statement::Continue { label, .. } => Completion::Continue {
            label: label.as_ref().map(|label| String::from_str(agent, label)),
            value: None,
        },
        ast::Statement::Throw { argument, span } => {
            match evaluate_expression(agent, argument, env) {
                Ok(value) => Completion::Throw {
                    error: JsError::new(value),
                    span: *span,
                },
                Err(error) => Completion::Throw { error, span: *span },
            }
        }
        ast::Statement::Empty { .. } => Completion::Normal(None),
    }
}

pub(crate) fn evaluate_expression(
    agent: &mut Agent,
    expression: &ast::Expression,
    env: DeclarativeEnvironment,
) -> JsResult<Value> {
    match expression {
        ast::Expression::Literal { value, .. } => Ok(Value::from_literal(agent, value)),
        ast::Expression::Identifier { name, .. } => {
            let name = String::from_str(agent, name);
            resolve_binding(agent, name, env)
        }
        ast::Expression::Await { .. } => Err(agent.throw_exception(
            ExceptionType::SyntaxError,
            "`await` is only supported in statement position.",
        )),
        ast::Expression::Call {
            callee, arguments, ..
        } => {
            let (function, this_value) = match &**callee {
                ast::Expression::Member {
                    object, property, ..
                } => {
                    let object_value = evaluate_expression(agent, object, env)?;
                    let property = String::from_str(agent, property);
                    let function = get_property(agent, object_value, property)?;
                    (function, object_value)
                }
                other => (evaluate_expression(agent, other, env)?, Value::Undefined),
            };
            let mut args = Vec::with_capacity(arguments.len());
            for argument in arguments {
                args.push(evaluate_expression(agent, argument, env)?);
            }
            call_function(agent, function, this_value, &args)
        }
        ast::Expression::Member {
            object, property, ..
        } => {
            let object = evaluate_expression(agent, object, env)?;
            let property = String::from_str(agent, property);
            get_property(agent, object, property)
        }
        ast::Expression::Assignment { target, value, .. } => match target {
            ast::AssignmentTarget::Identifier { name, .. } => {
                let value = evaluate_expression(agent, value, env)?;
                let name = String::from_str(agent, name);
                set_binding(agent, name, value, env)?;
                Ok(value)
            }
            ast::AssignmentTarget::Member {
                object, property, ..
            } => {
                let object = evaluate_expression(agent, object, env)?;
                let value = evaluate_expression(agent, value, env)?;
                let property = String::from_str(agent, property);
                set_property(agent, object, property, value)?;
                Ok(value)
            }
        },
        ast::Expression::Binary {
            operator,
            left,
            right,
            ..
        } => {
            let left = evaluate_expression(agent, left, env)?;
            let right = evaluate_expression(agent, right, env)?;
            apply_binary_operator(agent, *operator, left, right)
        }
    }
}

fn apply_binary_operator(
    agent: &mut Agent,
    operator: ast::BinaryOperator,
    left: Value,
    right: Value,
) -> JsResult<Value> {
    match operator {
        ast::BinaryOperator::Add => match (left, right) {
            (Value::Number(left), Value::Number(right)) => Ok(Value::Number(left + right)),
            (Value::String(left), Value::String(right)) => {
                let concatenated = format!("{}{}", left.as_str(agent), right.as_str(agent));
                Ok(Value::String(String::from_string(agent, concatenated)))
            }
            _ => Err(numeric_operand_error(agent, "+", left, right)),
        },
        ast::BinaryOperator::Subtract => match (left, right) {
            (Value::Number(left), Value::Number(right)) => Ok(Value::Number(left - right)),
            _ => Err(numeric_operand_error(agent, "-", left, right)),
        },
        ast::BinaryOperator::LessThan => match (left, right) {
            (Value::Number(left), Value::Number(right)) => Ok(Value::Boolean(left < right)),
            _ => Err(numeric_operand_error(agent, "<", left, right)),
        },
        ast::BinaryOperator::GreaterThan => match (left, right) {
            (Value::Number(left), Value::Number(right)) => Ok(Value::Boolean(left > right)),
            _ => Err(numeric_operand_error(agent, ">", left, right)),
        },
        ast::BinaryOperator::StrictEquals => Ok(Value::Boolean(left == right)),
        ast::BinaryOperator::StrictNotEquals => Ok(Value::Boolean(left != right)),
    }
}

fn numeric_operand_error(
    agent: &mut Agent,
    operator: &str,
    left: Value,
    right: Value,
) -> JsError {
    let error_message = format!(
        "Unsupported operand types for '{}': {} and {}.",
        operator,
        left.type_name(),
        right.type_name()
    );
    agent.throw_exception(ExceptionType::TypeError, error_message)
}
