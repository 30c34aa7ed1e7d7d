//! Call Handlers
//!
//! Every named call a script makes resolves to a handler. Handlers are
//! registered in ordered containers; dispatch picks the first handler that
//! reports containing the name. Script-defined calls live in a dedicated
//! runtime handler that stores AST bodies instead of callbacks.

use std::collections::HashMap;
use std::rc::Rc;

use indexmap::IndexMap;
use tracing::debug;

use crate::ast::types::ASTNode;
use crate::interpreter::errors::Unwind;
use crate::interpreter::interpreter::Interpreter;
use crate::interpreter::types::InterpreterContext;

/// Callback signature for builtin calls.
pub type ScrollCallback<T> =
    Box<dyn Fn(&Interpreter, &mut InterpreterContext) -> Result<T, Unwind>>;

/// A named set of calls dispatchable by the engine.
///
/// `T` is `()` for commands, controls, and initializers, and `String` for
/// expansions.
pub trait CallHandler<T> {
    fn handle_call(
        &self,
        interpreter: &Interpreter,
        context: &mut InterpreterContext,
    ) -> Result<T, Unwind>;

    fn contains(&self, name: &str) -> bool;
}

impl<T> CallHandler<T> for Box<dyn CallHandler<T>> {
    fn handle_call(
        &self,
        interpreter: &Interpreter,
        context: &mut InterpreterContext,
    ) -> Result<T, Unwind> {
        (**self).handle_call(interpreter, context)
    }

    fn contains(&self, name: &str) -> bool {
        (**self).contains(name)
    }
}

/// Call handler backed by plain callbacks.
pub struct CallbackCallHandler<T> {
    calls: HashMap<String, ScrollCallback<T>>,
    aliases: HashMap<String, String>,
}

impl<T> CallbackCallHandler<T> {
    pub fn new() -> Self {
        Self {
            calls: HashMap::new(),
            aliases: HashMap::new(),
        }
    }

    pub fn add_call<F>(&mut self, name: impl Into<String>, callback: F)
    where
        F: Fn(&Interpreter, &mut InterpreterContext) -> Result<T, Unwind> + 'static,
    {
        self.calls.insert(name.into(), Box::new(callback));
    }

    pub fn add_alias(&mut self, alias: impl Into<String>, name: impl Into<String>) {
        self.aliases.insert(alias.into(), name.into());
    }

    pub fn remove_call(&mut self, name: &str) {
        self.calls.remove(name);
        self.aliases.retain(|_, target| target != name);
    }

    fn get_callback(&self, name: &str) -> Option<&ScrollCallback<T>> {
        if let Some(callback) = self.calls.get(name) {
            return Some(callback);
        }
        self.aliases
            .get(name)
            .and_then(|target| self.calls.get(target))
    }
}

impl<T> Default for CallbackCallHandler<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> CallHandler<T> for CallbackCallHandler<T> {
    fn handle_call(
        &self,
        interpreter: &Interpreter,
        context: &mut InterpreterContext,
    ) -> Result<T, Unwind> {
        let name = context.call_name()?.to_string();
        match self.get_callback(&name) {
            Some(callback) => callback(interpreter, context),
            None => Err(context
                .internal_error(format!("No callback registered for '{}'.", name))
                .into()),
        }
    }

    fn contains(&self, name: &str) -> bool {
        self.calls.contains_key(name) || self.aliases.contains_key(name)
    }
}

/// Stores script-defined calls as AST bodies plus parameter names.
///
/// Invocation lives in the engine, which looks a definition up by value so
/// no borrow on the owning context is held while the body runs.
#[derive(Debug, Clone, Default)]
pub struct RuntimeCallHandler {
    calls: HashMap<String, (Rc<ASTNode>, Vec<String>)>,
}

impl RuntimeCallHandler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn define(&mut self, name: impl Into<String>, node: Rc<ASTNode>, params: Vec<String>) {
        let name = name.into();
        debug!("define runtime call {}", name);
        self.calls.insert(name, (node, params));
    }

    pub fn undefine(&mut self, name: &str) {
        self.calls.remove(name);
    }

    pub fn get(&self, name: &str) -> Option<(Rc<ASTNode>, Vec<String>)> {
        self.calls
            .get(name)
            .map(|(node, params)| (Rc::clone(node), params.clone()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.calls.contains_key(name)
    }
}

/// Ordered, named collection of call handlers.
///
/// Lookup for a call scans handlers in registration order and picks the
/// first whose `contains` accepts the name.
pub struct CallHandlerContainer<T> {
    handlers: IndexMap<String, Box<dyn CallHandler<T>>>,
}

impl<T> CallHandlerContainer<T> {
    pub fn new() -> Self {
        Self {
            handlers: IndexMap::new(),
        }
    }

    pub fn add<H>(&mut self, name: impl Into<String>, handler: H)
    where
        H: CallHandler<T> + 'static,
    {
        let name = name.into();
        debug!("register call handler {}", name);
        self.handlers.insert(name, Box::new(handler));
    }

    pub fn remove(&mut self, name: &str) {
        self.handlers.shift_remove(name);
    }

    pub fn get(&self, name: &str) -> Option<&dyn CallHandler<T>> {
        self.handlers.get(name).map(|h| h.as_ref())
    }

    /// First registered handler that can satisfy `name`.
    pub fn get_for_call(&self, name: &str) -> Option<&dyn CallHandler<T>> {
        self.handlers
            .values()
            .find(|handler| handler.contains(name))
            .map(|h| h.as_ref())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &dyn CallHandler<T>)> {
        self.handlers
            .iter()
            .map(|(name, h)| (name.as_str(), h.as_ref()))
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl<T> Default for CallHandlerContainer<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::types::NodeKind;

    #[test]
    fn test_callback_handler_aliases() {
        let mut handler: CallbackCallHandler<()> = CallbackCallHandler::new();
        handler.add_call("cat", |_, _| Ok(()));
        handler.add_alias("concat", "cat");

        assert!(handler.contains("cat"));
        assert!(handler.contains("concat"));
        assert!(handler.get_callback("concat").is_some());

        handler.remove_call("cat");
        assert!(!handler.contains("cat"));
        assert!(!handler.contains("concat"));
    }

    #[test]
    fn test_callback_handler_dispatches_by_call_name() {
        let mut handler: CallbackCallHandler<String> = CallbackCallHandler::new();
        handler.add_call("greet", |_, context| {
            let args = context.args()?;
            Ok(format!("hello {}", args.join(" ")))
        });

        let interpreter = Interpreter::new();
        let mut context = InterpreterContext::new();
        context.set_call(
            "greet".to_string(),
            vec!["world".to_string()],
            Default::default(),
            None,
        );

        let result = handler.handle_call(&interpreter, &mut context).unwrap();
        assert_eq!(result, "hello world");
    }

    #[test]
    fn test_runtime_handler_define_and_undefine() {
        let mut handler = RuntimeCallHandler::new();
        let body = Rc::new(ASTNode::new(NodeKind::Block, None));
        handler.define("f", Rc::clone(&body), vec!["a".to_string()]);

        assert!(handler.contains("f"));
        let (node, params) = handler.get("f").unwrap();
        assert_eq!(node.kind, NodeKind::Block);
        assert_eq!(params, vec!["a".to_string()]);

        handler.undefine("f");
        assert!(!handler.contains("f"));
    }

    #[test]
    fn test_container_resolves_in_registration_order() {
        let mut first: CallbackCallHandler<String> = CallbackCallHandler::new();
        first.add_call("x", |_, _| Ok("first".to_string()));
        let mut second: CallbackCallHandler<String> = CallbackCallHandler::new();
        second.add_call("x", |_, _| Ok("second".to_string()));

        let mut container = CallHandlerContainer::new();
        container.add("first", first);
        container.add("second", second);

        let interpreter = Interpreter::new();
        let mut context = InterpreterContext::new();
        context.set_call("x".to_string(), vec![], Default::default(), None);

        let handler = container.get_for_call("x").unwrap();
        let result = handler.handle_call(&interpreter, &mut context).unwrap();
        assert_eq!(result, "first");

        assert!(container.get("second").is_some());
        assert!(container.get_for_call("missing").is_none());
    }
}
