//! Execution Engine
//!
//! The tree-walking evaluator that ties all interpreter components together.
//! Implements the full execution chain:
//!
//! interpret_ast -> interpret_statement -> interpret_command/control/block
//!
//! Calls are dispatched through handler containers, with script-defined
//! calls (held on the context) shadowing registered handlers of the same
//! name. Delegates to specialized modules for:
//! - Handler containers and callbacks (callhandler.rs)
//! - Execution state (types.rs)
//! - Errors and non-local exits (errors.rs)

use std::collections::HashMap;
use std::rc::Rc;

use tracing::debug;

use crate::ast::types::{ASTNode, NodeKind, AST};
use crate::errors::ScrollError;
use crate::interpreter::callhandler::CallHandlerContainer;
use crate::interpreter::errors::{CallKind, Unwind};
use crate::interpreter::types::{ArgSourceMap, ExecutionLimits, InterpreterContext};
use crate::parser::lexer::Tokenizer;
use crate::parser::parser::{parse_scroll, Parser};

/// The interpreter. Holds handler containers for the three call namespaces
/// plus initializers, and the limits applied to every run.
///
/// The interpreter itself is stateless across runs. All execution state
/// lives in an [`InterpreterContext`], so one interpreter may serve many
/// scripts, and a context may be carried between runs to keep variables
/// and script-defined calls alive.
pub struct Interpreter {
    command_handlers: CallHandlerContainer<()>,
    control_handlers: CallHandlerContainer<()>,
    expansion_handlers: CallHandlerContainer<String>,
    initializers: CallHandlerContainer<()>,
    limits: ExecutionLimits,
    consume_rest_triggers: HashMap<String, usize>,
}

impl Interpreter {
    pub fn new() -> Self {
        Self::with_limits(ExecutionLimits::default())
    }

    pub fn with_limits(limits: ExecutionLimits) -> Self {
        Self {
            command_handlers: CallHandlerContainer::new(),
            control_handlers: CallHandlerContainer::new(),
            expansion_handlers: CallHandlerContainer::new(),
            initializers: CallHandlerContainer::new(),
            limits,
            consume_rest_triggers: HashMap::new(),
        }
    }

    pub fn limits(&self) -> ExecutionLimits {
        self.limits
    }

    pub fn set_limits(&mut self, limits: ExecutionLimits) {
        self.limits = limits;
    }

    pub fn command_handlers(&self) -> &CallHandlerContainer<()> {
        &self.command_handlers
    }

    pub fn command_handlers_mut(&mut self) -> &mut CallHandlerContainer<()> {
        &mut self.command_handlers
    }

    pub fn control_handlers(&self) -> &CallHandlerContainer<()> {
        &self.control_handlers
    }

    pub fn control_handlers_mut(&mut self) -> &mut CallHandlerContainer<()> {
        &mut self.control_handlers
    }

    pub fn expansion_handlers(&self) -> &CallHandlerContainer<String> {
        &self.expansion_handlers
    }

    pub fn expansion_handlers_mut(&mut self) -> &mut CallHandlerContainer<String> {
        &mut self.expansion_handlers
    }

    /// Handlers run once per `interpret_ast` before the root, for seeding
    /// contexts with baseline state.
    pub fn initializers(&self) -> &CallHandlerContainer<()> {
        &self.initializers
    }

    pub fn initializers_mut(&mut self) -> &mut CallHandlerContainer<()> {
        &mut self.initializers
    }

    pub fn consume_rest_triggers(&self) -> &HashMap<String, usize> {
        &self.consume_rest_triggers
    }

    /// Arm consume-rest tokenizing for statements starting with `name`.
    /// The rest of the line is captured as one literal after `count` normal
    /// arguments.
    pub fn set_consume_rest_trigger(&mut self, name: impl Into<String>, count: usize) {
        self.consume_rest_triggers.insert(name.into(), count);
    }

    fn over_statement_limit(&self, context: &InterpreterContext) -> bool {
        self.limits.statement_limit != 0 && context.statement_count > self.limits.statement_limit
    }

    fn over_call_depth_limit(&self, context: &InterpreterContext) -> bool {
        self.limits.call_depth_limit != 0
            && context.call_stack().len() > self.limits.call_depth_limit
    }

    // ------------------------------------------------------------------
    // Entry points
    // ------------------------------------------------------------------

    /// Parse and execute a script in a fresh context. Returns the context
    /// so callers can inspect variables and script-defined calls.
    pub fn run(&self, script: &str) -> Result<InterpreterContext, ScrollError> {
        let mut context = InterpreterContext::new();
        self.run_with_context(script, &mut context)?;
        Ok(context)
    }

    /// Parse and execute a script in an existing context.
    pub fn run_with_context(
        &self,
        script: &str,
        context: &mut InterpreterContext,
    ) -> Result<(), ScrollError> {
        let tokenizer = Tokenizer::new(script, self.consume_rest_triggers.clone());
        let tree = parse_scroll(tokenizer)?;
        self.interpret_ast(&tree, context)
    }

    /// Execute an already-parsed script.
    pub fn interpret_ast(
        &self,
        tree: &AST,
        context: &mut InterpreterContext,
    ) -> Result<(), ScrollError> {
        context.set_script(tree.script.clone());

        let result = self
            .apply_initializers(context)
            .and_then(|()| self.interpret_root(context, &tree.root));

        self.finish_run(result, context)
    }

    /// Parse and execute a single statement in an existing context.
    ///
    /// Initializers are not applied. Made for line-at-a-time drivers
    /// feeding statements into a long-lived context; `consume_rest_all`
    /// makes an armed consume-rest capture run to the end of the line.
    pub fn run_statement(
        &self,
        statement: &str,
        context: &mut InterpreterContext,
        consume_rest_all: bool,
    ) -> Result<(), ScrollError> {
        let mut tokenizer = Tokenizer::new(statement, self.consume_rest_triggers.clone());
        tokenizer.set_consume_rest_all(consume_rest_all);

        let source = tokenizer.source().to_string();
        let tokens = tokenizer.get_all_tokens()?;
        let node = Parser::new(tokens, source.clone()).parse_statement()?;

        context.set_script(source);

        let result = self.interpret_statement(context, &node);
        self.finish_run(result, context)
    }

    /// Parse a script and render the tree without executing anything.
    pub fn test_parse(
        script: &str,
        consume_rest_triggers: HashMap<String, usize>,
    ) -> Result<String, ScrollError> {
        let tokenizer = Tokenizer::new(script, consume_rest_triggers);
        let tree = parse_scroll(tokenizer)?;
        Ok(tree.prettify())
    }

    pub fn apply_initializers(&self, context: &mut InterpreterContext) -> Result<(), Unwind> {
        for (name, initializer) in self.initializers.iter() {
            debug!("apply initializer {}", name);
            initializer.handle_call(self, context)?;
        }
        Ok(())
    }

    /// Fold non-local exits at the end of a run. A stop is a normal halt;
    /// a return with no runtime call left to catch it is an error.
    fn finish_run(
        &self,
        result: Result<(), Unwind>,
        context: &InterpreterContext,
    ) -> Result<(), ScrollError> {
        match result {
            Ok(()) => Ok(()),
            Err(Unwind::Stop) => {
                debug!("script stopped");
                Ok(())
            }
            Err(Unwind::Return) => Err(context
                .error("returning only allowed in functions")
                .into()),
            Err(Unwind::Err(e)) => Err(e.into()),
        }
    }

    // ------------------------------------------------------------------
    // Statements
    // ------------------------------------------------------------------

    pub fn interpret_statement(
        &self,
        context: &mut InterpreterContext,
        node: &ASTNode,
    ) -> Result<(), Unwind> {
        context.anchor_to(node);

        match node.kind {
            NodeKind::Block => self.interpret_block(context, node)?,
            NodeKind::ControlCall => self.interpret_control(context, node)?,
            NodeKind::CommandCall => self.interpret_command(context, node)?,
            _ => {
                return Err(context
                    .internal_error(format!("Bad statement type {}", node.kind.as_str()))
                    .into())
            }
        }

        // Statements count once their effects have landed, so the statement
        // that crosses the limit still runs before the abort.
        context.statement_count += 1;
        if self.over_statement_limit(context) {
            return Err(context
                .error(format!(
                    "Exceeded maximum statement limit of {}.",
                    self.limits.statement_limit
                ))
                .into());
        }

        Ok(())
    }

    /// Blocks run their statements in the enclosing scope. Scoping is the
    /// business of individual control handlers, not of blocks.
    pub fn interpret_block(
        &self,
        context: &mut InterpreterContext,
        node: &ASTNode,
    ) -> Result<(), Unwind> {
        context.anchor_to(node);
        for sub_statement in &node.children {
            self.interpret_statement(context, sub_statement)?;
        }
        Ok(())
    }

    fn interpret_root(
        &self,
        context: &mut InterpreterContext,
        node: &ASTNode,
    ) -> Result<(), Unwind> {
        self.interpret_block(context, node)
    }

    // ------------------------------------------------------------------
    // Expansions
    // ------------------------------------------------------------------

    fn interpret_variable_reference(
        &self,
        context: &mut InterpreterContext,
        node: &ASTNode,
    ) -> Result<String, Unwind> {
        context.anchor_to(node);

        let var_name = match node.str_content() {
            Some(name) => name,
            None => {
                return Err(context
                    .internal_error("Variable reference is not a string node.")
                    .into())
            }
        };

        match context.get_var(var_name) {
            Some(value) => Ok(value.to_string()),
            None => Err(context
                .error(format!("No such variable {}.", var_name))
                .into()),
        }
    }

    fn interpret_sub_expansion(
        &self,
        context: &mut InterpreterContext,
        node: &ASTNode,
    ) -> Result<String, Unwind> {
        context.anchor_to(node);

        match node.kind {
            NodeKind::ExpansionVar => match node.children.first() {
                Some(child) => self.interpret_variable_reference(context, child),
                None => Err(context
                    .internal_error("Variable expansion has no name node.")
                    .into()),
            },
            NodeKind::ExpansionCall => self.interpret_expansion_call(context, node),
            _ => Err(context
                .internal_error(format!("Bad expansion node type {}", node.kind.as_str()))
                .into()),
        }
    }

    /// Evaluate an expansion node into the argument strings it produces.
    /// Single expansions yield their value as-is; multi expansions split
    /// it on whitespace.
    pub fn interpret_expansion(
        &self,
        context: &mut InterpreterContext,
        node: &ASTNode,
    ) -> Result<Vec<String>, Unwind> {
        context.anchor_to(node);

        let (multi_node, expansion_node) = match (node.children.first(), node.children.get(1)) {
            (Some(multi), Some(sub)) => (multi, sub),
            _ => {
                return Err(context
                    .internal_error("Malformed expansion node.")
                    .into())
            }
        };

        let multi = match multi_node.kind {
            NodeKind::ExpansionMulti => true,
            NodeKind::ExpansionSingle => false,
            _ => {
                return Err(context
                    .internal_error(format!(
                        "Bad expansion multi node type {}",
                        multi_node.kind.as_str()
                    ))
                    .into())
            }
        };

        let value = self.interpret_sub_expansion(context, expansion_node)?;
        if multi {
            Ok(value.split_whitespace().map(str::to_string).collect())
        } else {
            Ok(vec![value])
        }
    }

    /// Evaluate a string or expansion node into argument strings.
    pub fn interpret_string_or_expansion(
        &self,
        context: &mut InterpreterContext,
        node: &ASTNode,
    ) -> Result<Vec<String>, Unwind> {
        context.anchor_to(node);

        match node.kind {
            NodeKind::String => match node.str_content() {
                Some(s) => Ok(vec![s.to_string()]),
                None => Err(context
                    .internal_error("String node has no token.")
                    .into()),
            },
            NodeKind::Expansion => self.interpret_expansion(context, node),
            _ => Err(context
                .internal_error(format!(
                    "Bad node type for string_or_expansion: {}",
                    node.kind.as_str()
                ))
                .into()),
        }
    }

    // ------------------------------------------------------------------
    // Calls
    // ------------------------------------------------------------------

    /// Evaluate the name and arguments of a call node. The name itself may
    /// expand to several strings, in which case the extras become leading
    /// arguments.
    fn eval_call_parts(
        &self,
        context: &mut InterpreterContext,
        node: &ASTNode,
        kind: CallKind,
    ) -> Result<(String, Vec<String>, ArgSourceMap), Unwind> {
        if node.kind != kind.node_kind() {
            return Err(context
                .internal_error(format!(
                    "interpret_call: name: Expected {}, got {}",
                    kind.node_kind().as_str(),
                    node.kind.as_str()
                ))
                .into());
        }

        let name_node = match node.children.first() {
            Some(child) => child,
            None => {
                return Err(context
                    .internal_error("interpret_call: malformed call node.")
                    .into())
            }
        };
        let args_node = match node.children.get(1) {
            Some(child) => child,
            None => {
                return Err(context
                    .internal_error("interpret_call: malformed call node.")
                    .into())
            }
        };

        let mut raw_call = self.interpret_string_or_expansion(context, name_node)?;
        if raw_call.is_empty() {
            return Err(context
                .error("Call name must not expand to empty string.")
                .into());
        }

        let mut arg_node_map = ArgSourceMap::new();
        arg_node_map.add_args(raw_call.len() - 1, &Rc::new(name_node.clone()));

        for arg_node in &args_node.children {
            let new_args = self.interpret_string_or_expansion(context, arg_node)?;
            arg_node_map.add_args(new_args.len(), &Rc::new(arg_node.clone()));
            raw_call.extend(new_args);
        }

        debug!("interpret_call: raw args {:?}", raw_call);

        let call_name = raw_call.remove(0);
        Ok((call_name, raw_call, arg_node_map))
    }

    /// Make `name` the active call, stacking any call already in flight.
    fn enter_call(
        &self,
        context: &mut InterpreterContext,
        call_name: String,
        args: Vec<String>,
        arg_nodes: ArgSourceMap,
        control_node: Option<Rc<ASTNode>>,
    ) -> Result<(), Unwind> {
        if context.in_call() {
            context.push_call()?;
            if self.over_call_depth_limit(context) {
                let err = context.error(format!(
                    "Maximum call stack depth ({}) exceeded.",
                    self.limits.call_depth_limit
                ));
                context.restore_call();
                return Err(err.into());
            }
        }

        context.set_call(call_name, args, arg_nodes, control_node);
        Ok(())
    }

    fn missing_call_unwind(
        &self,
        context: &mut InterpreterContext,
        node: &ASTNode,
        kind: CallKind,
        name: &str,
    ) -> Unwind {
        if let Some(name_node) = node.children.first() {
            context.anchor_to(name_node);
        }
        context.missing_call_error(kind, name).into()
    }

    pub fn interpret_command(
        &self,
        context: &mut InterpreterContext,
        node: &ASTNode,
    ) -> Result<(), Unwind> {
        let (call_name, call_args, arg_node_map) =
            self.eval_call_parts(context, node, CallKind::Command)?;

        context.anchor_to(node);
        self.enter_call(context, call_name.clone(), call_args, arg_node_map, None)?;

        // Script-defined commands shadow registered handlers.
        let result = if let Some((body, params)) = context.runtime_commands().get(&call_name) {
            self.invoke_runtime_call(context, body, params).map(|_| ())
        } else {
            match self.command_handlers.get_for_call(&call_name) {
                Some(handler) => handler.handle_call(self, context),
                None => Err(self.missing_call_unwind(context, node, CallKind::Command, &call_name)),
            }
        };

        context.restore_call();
        result
    }

    pub fn interpret_control(
        &self,
        context: &mut InterpreterContext,
        node: &ASTNode,
    ) -> Result<(), Unwind> {
        let (call_name, call_args, arg_node_map) =
            self.eval_call_parts(context, node, CallKind::Control)?;

        let body = match node.children.get(2) {
            Some(child) => child,
            None => {
                return Err(context
                    .internal_error("interpret_call: malformed call node.")
                    .into())
            }
        };

        context.anchor_to(node);
        self.enter_call(
            context,
            call_name.clone(),
            call_args,
            arg_node_map,
            Some(Rc::new(body.clone())),
        )?;

        let result = match self.control_handlers.get_for_call(&call_name) {
            Some(handler) => handler.handle_call(self, context),
            None => Err(self.missing_call_unwind(context, node, CallKind::Control, &call_name)),
        };

        context.restore_call();
        result
    }

    pub fn interpret_expansion_call(
        &self,
        context: &mut InterpreterContext,
        node: &ASTNode,
    ) -> Result<String, Unwind> {
        let (call_name, call_args, arg_node_map) =
            self.eval_call_parts(context, node, CallKind::Expansion)?;

        context.anchor_to(node);
        self.enter_call(context, call_name.clone(), call_args, arg_node_map, None)?;

        let result = if let Some((body, params)) = context.runtime_expansions().get(&call_name) {
            match self.invoke_runtime_call(context, body, params) {
                Ok(Some(value)) => Ok(value),
                Ok(None) => Err(context
                    .error(format!("Expansion '{}' returned no value.", call_name))
                    .into()),
                Err(unwind) => Err(unwind),
            }
        } else {
            match self.expansion_handlers.get_for_call(&call_name) {
                Some(handler) => handler.handle_call(self, context),
                None => {
                    Err(self.missing_call_unwind(context, node, CallKind::Expansion, &call_name))
                }
            }
        };

        context.restore_call();
        result
    }

    /// Run a script-defined call: bind parameters in a fresh scope, execute
    /// the stored body, and collect any value set by return. A `*`-prefixed
    /// final parameter takes all remaining arguments, space-joined.
    fn invoke_runtime_call(
        &self,
        context: &mut InterpreterContext,
        body: Rc<ASTNode>,
        params: Vec<String>,
    ) -> Result<Option<String>, Unwind> {
        let call_name = context.call_name()?.to_string();
        let args = context.args()?.to_vec();

        let variadic = params.last().map_or(false, |p| p.starts_with('*'));
        let required = if variadic {
            params.len() - 1
        } else {
            params.len()
        };

        if variadic && args.len() < required {
            return Err(context
                .error(format!(
                    "{}: Invalid number of arguments (expected at least {})",
                    call_name, required
                ))
                .into());
        }
        if !variadic && args.len() != required {
            return Err(context
                .error(format!(
                    "{}: Invalid number of arguments (expected {})",
                    call_name, required
                ))
                .into());
        }

        context.call_context_mut()?.runtime_call = true;
        context.vars_mut().new_scope();

        for (param, arg) in params[..required].iter().zip(args.iter()) {
            context.set_var(param, arg);
        }
        if variadic {
            if let Some(rest_param) = params.last() {
                let rest = args[required..].join(" ");
                context.set_var(rest_param.trim_start_matches('*'), &rest);
            }
        }

        let result = match self.interpret_statement(context, &body) {
            // return unwinds exactly to the frame that invoked the body
            Err(Unwind::Return) => Ok(()),
            other => other,
        };

        context.vars_mut().destroy_scope();
        result?;

        Ok(context.call_context()?.return_value.clone())
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}
