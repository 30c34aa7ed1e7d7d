//! Interpreter Types
//!
//! Type definitions for the scroll interpreter state: the scoped variable
//! store, per-call state, and the context object threaded through every
//! handler invocation.

use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use crate::ast::types::ASTNode;
use crate::interpreter::callhandler::RuntimeCallHandler;
use crate::interpreter::errors::{CallKind, InterpreterError, SourceAnchor};

/// Maps argument positions to the AST node they were produced from.
///
/// One argument node may produce several arguments (multi expansions), so
/// ranges of positions can share a source node. Handlers use this both to
/// reposition errors onto a specific argument and to re-evaluate argument
/// expressions across loop iterations.
#[derive(Debug, Clone, Default)]
pub struct ArgSourceMap {
    nodes: HashMap<usize, Rc<ASTNode>>,
    count: usize,
}

impl ArgSourceMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that the next `count` arguments came from `source`.
    pub fn add_args(&mut self, count: usize, source: &Rc<ASTNode>) {
        for i in 0..count {
            self.nodes.insert(self.count + i, Rc::clone(source));
        }
        self.count += count;
    }

    pub fn get(&self, index: usize) -> Option<&Rc<ASTNode>> {
        self.nodes.get(&index)
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }
}

/// State for one call in flight.
#[derive(Debug, Clone)]
pub struct CallContext {
    pub call_name: String,
    pub args: Vec<String>,
    pub arg_nodes: ArgSourceMap,
    /// Body statement of the control call, absent for other call kinds.
    pub control_node: Option<Rc<ASTNode>>,
    pub return_value: Option<String>,
    /// Whether this frame belongs to a script-defined call.
    pub runtime_call: bool,
}

impl CallContext {
    pub fn new(
        call_name: String,
        args: Vec<String>,
        arg_nodes: ArgSourceMap,
        control_node: Option<Rc<ASTNode>>,
    ) -> Self {
        Self {
            call_name,
            args,
            arg_nodes,
            control_node,
            return_value: None,
            runtime_call: false,
        }
    }
}

/// One variable scope plus its declared redirections.
#[derive(Debug, Clone, Default)]
struct Scope {
    vars: HashMap<String, String>,
    nonlocals: HashSet<String>,
    globals: HashSet<String>,
}

/// Stack of variable scopes.
///
/// A name is a plain entry in the innermost scope unless redirected: a
/// global declaration targets the root scope, a nonlocal declaration targets
/// the enclosing scope (following further redirections declared there).
/// Reads search outward from the resolved scope; writes and deletes land on
/// it directly.
#[derive(Debug, Clone)]
pub struct ScopedVarStore {
    scopes: Vec<Scope>,
}

impl Default for ScopedVarStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ScopedVarStore {
    pub fn new() -> Self {
        // There is always at least one scope.
        Self {
            scopes: vec![Scope::default()],
        }
    }

    pub fn new_scope(&mut self) {
        self.scopes.push(Scope::default());
    }

    /// Pop the innermost scope. The root scope is never popped; returns
    /// whether a scope was removed.
    pub fn destroy_scope(&mut self) -> bool {
        if self.scopes.len() > 1 {
            self.scopes.pop();
            true
        } else {
            false
        }
    }

    pub fn depth(&self) -> usize {
        self.scopes.len()
    }

    pub fn declare_nonlocal(&mut self, name: &str) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.nonlocals.insert(name.to_string());
        }
    }

    pub fn declare_global(&mut self, name: &str) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.globals.insert(name.to_string());
        }
    }

    /// Scope index `name` resolves to, honoring redirections at each level.
    fn resolve_target(&self, name: &str) -> usize {
        let mut idx = self.scopes.len().saturating_sub(1);
        loop {
            let scope = &self.scopes[idx];
            if scope.globals.contains(name) {
                return 0;
            }
            if idx > 0 && scope.nonlocals.contains(name) {
                idx -= 1;
                continue;
            }
            return idx;
        }
    }

    pub fn get_var(&self, name: &str) -> Option<&str> {
        let target = self.resolve_target(name);
        for scope in self.scopes[..=target].iter().rev() {
            if let Some(value) = scope.vars.get(name) {
                return Some(value.as_str());
            }
        }
        None
    }

    pub fn set_var(&mut self, name: &str, value: &str) {
        let target = self.resolve_target(name);
        self.scopes[target]
            .vars
            .insert(name.to_string(), value.to_string());
    }

    /// Returns whether the variable existed.
    pub fn del_var(&mut self, name: &str) -> bool {
        let target = self.resolve_target(name);
        self.scopes[target].vars.remove(name).is_some()
    }
}

/// Execution limits configuration. A limit of zero disables that check.
#[derive(Debug, Clone, Copy)]
pub struct ExecutionLimits {
    /// Maximum number of statements to execute
    pub statement_limit: usize,
    /// Maximum call stack depth
    pub call_depth_limit: usize,
}

impl Default for ExecutionLimits {
    fn default() -> Self {
        Self {
            statement_limit: 0,
            call_depth_limit: 200,
        }
    }
}

/// Execution state for one interpreter run.
///
/// Holds the variable store, the script text for diagnostics, the current
/// call context and call stack, and the runtime calls registered by the
/// script itself. A context may be reused across runs to retain variables
/// and definitions.
#[derive(Debug, Default)]
pub struct InterpreterContext {
    vars: ScopedVarStore,
    script: String,
    pub statement_count: usize,
    current_anchor: Option<SourceAnchor>,
    call_context: Option<CallContext>,
    call_stack: Vec<CallContext>,
    runtime_commands: RuntimeCallHandler,
    runtime_expansions: RuntimeCallHandler,
}

impl InterpreterContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn vars(&self) -> &ScopedVarStore {
        &self.vars
    }

    pub fn vars_mut(&mut self) -> &mut ScopedVarStore {
        &mut self.vars
    }

    pub fn get_var(&self, name: &str) -> Option<&str> {
        self.vars.get_var(name)
    }

    pub fn set_var(&mut self, name: &str, value: &str) {
        self.vars.set_var(name, value);
    }

    pub fn del_var(&mut self, name: &str) -> bool {
        self.vars.del_var(name)
    }

    /// Script-defined commands, looked up ahead of builtin commands.
    pub fn runtime_commands(&self) -> &RuntimeCallHandler {
        &self.runtime_commands
    }

    pub fn runtime_commands_mut(&mut self) -> &mut RuntimeCallHandler {
        &mut self.runtime_commands
    }

    /// Script-defined expansions, looked up ahead of builtin expansions.
    pub fn runtime_expansions(&self) -> &RuntimeCallHandler {
        &self.runtime_expansions
    }

    pub fn runtime_expansions_mut(&mut self) -> &mut RuntimeCallHandler {
        &mut self.runtime_expansions
    }

    pub fn script(&self) -> &str {
        &self.script
    }

    pub fn set_script(&mut self, script: impl Into<String>) {
        self.script = script.into();
    }

    pub fn current_anchor(&self) -> Option<SourceAnchor> {
        self.current_anchor
    }

    pub fn set_anchor(&mut self, anchor: Option<SourceAnchor>) {
        self.current_anchor = anchor;
    }

    /// Point error reporting at `node`.
    pub fn anchor_to(&mut self, node: &ASTNode) {
        self.current_anchor = node
            .token
            .as_ref()
            .map(|t| SourceAnchor::new(t.line, t.column));
    }

    /// Point error reporting at the source of argument `index`, if known.
    pub fn anchor_to_arg(&mut self, index: usize) {
        let anchor = self
            .call_context
            .as_ref()
            .and_then(|call| call.arg_nodes.get(index))
            .and_then(|node| node.token.as_ref())
            .map(|t| SourceAnchor::new(t.line, t.column));
        if anchor.is_some() {
            self.current_anchor = anchor;
        }
    }

    /// Error anchored at the current node.
    pub fn error(&self, message: impl Into<String>) -> InterpreterError {
        InterpreterError::new(message, self.current_anchor, self.script.clone())
    }

    pub fn internal_error(&self, message: impl Into<String>) -> InterpreterError {
        InterpreterError::internal(message, self.current_anchor, self.script.clone())
    }

    pub fn missing_call_error(&self, kind: CallKind, name: &str) -> InterpreterError {
        InterpreterError::missing_call(kind, name, self.current_anchor, self.script.clone())
    }

    pub fn call_stack(&self) -> &[CallContext] {
        &self.call_stack
    }

    pub fn in_call(&self) -> bool {
        self.call_context.is_some()
    }

    pub fn call_context(&self) -> Result<&CallContext, InterpreterError> {
        self.call_context
            .as_ref()
            .ok_or_else(|| self.internal_error("Current context is not a call."))
    }

    pub fn call_context_mut(&mut self) -> Result<&mut CallContext, InterpreterError> {
        let anchor = self.current_anchor;
        match self.call_context.as_mut() {
            Some(call) => Ok(call),
            None => Err(InterpreterError::internal(
                "Current context is not a call.",
                anchor,
                self.script.clone(),
            )),
        }
    }

    pub fn call_name(&self) -> Result<&str, InterpreterError> {
        Ok(self.call_context()?.call_name.as_str())
    }

    pub fn args(&self) -> Result<&[String], InterpreterError> {
        Ok(self.call_context()?.args.as_slice())
    }

    pub fn arg_nodes(&self) -> Result<&ArgSourceMap, InterpreterError> {
        Ok(&self.call_context()?.arg_nodes)
    }

    /// Body of the active control call.
    pub fn control_node(&self) -> Result<Rc<ASTNode>, InterpreterError> {
        match &self.call_context()?.control_node {
            Some(node) => Ok(Rc::clone(node)),
            None => Err(self.internal_error("Current context is not a control call.")),
        }
    }

    pub fn set_call(
        &mut self,
        call_name: String,
        args: Vec<String>,
        arg_nodes: ArgSourceMap,
        control_node: Option<Rc<ASTNode>>,
    ) {
        self.call_context = Some(CallContext::new(call_name, args, arg_nodes, control_node));
    }

    pub fn reset_call(&mut self) {
        self.call_context = None;
    }

    /// Move the active call onto the stack ahead of entering a nested call.
    pub fn push_call(&mut self) -> Result<(), InterpreterError> {
        match self.call_context.take() {
            Some(call) => {
                self.call_stack.push(call);
                Ok(())
            }
            None => Err(self.internal_error("Current context is not a call.")),
        }
    }

    /// Restore the most recently pushed call as the active one.
    pub fn pop_call(&mut self) -> Result<(), InterpreterError> {
        match self.call_stack.pop() {
            Some(call) => {
                self.call_context = Some(call);
                Ok(())
            }
            None => Err(self.internal_error("Cannot pop call. No calls pushed.")),
        }
    }

    /// Restore the caller's frame after a call ends, whatever the outcome.
    pub fn restore_call(&mut self) {
        self.call_context = self.call_stack.pop();
    }

    /// Record a return value on the nearest runtime-call frame below the
    /// current call.
    pub fn set_retval(&mut self, retval: &str) -> Result<(), InterpreterError> {
        if self.call_context.is_none() {
            return Err(self.internal_error("Current context is not a call."));
        }

        if self.call_stack.is_empty() {
            return Err(self.error("cannot return, no call stack (outside calls)"));
        }

        for frame in self.call_stack.iter_mut().rev() {
            if frame.runtime_call {
                frame.return_value = Some(retval.to_string());
                return Ok(());
            }
        }

        Err(self.error("cannot return outside of function"))
    }
}
