//! Abstract Syntax Tree (AST) Types for Scrolls
//!
//! Scroll ASTs are homogeneous: every node carries a kind tag, an optional
//! anchoring token, and a list of children. Call structure, argument lists,
//! and block bodies are all expressed through the same node shape, which lets
//! the interpreter walk any subtree without caring what produced it.

use std::fmt;

use crate::parser::lexer::Token;

// =============================================================================
// NODE KINDS
// =============================================================================

/// Kind tag for AST nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    None,
    Eof,
    String,
    CommandCall,
    CommandArguments,
    ControlCall,
    ControlArguments,
    Expansion,
    ExpansionSingle,
    ExpansionMulti,
    ExpansionVar,
    ExpansionCall,
    ExpansionArguments,
    Block,
    Root,
}

impl NodeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "NONE",
            Self::Eof => "EOF",
            Self::String => "STRING",
            Self::CommandCall => "COMMAND_CALL",
            Self::CommandArguments => "COMMAND_ARGUMENTS",
            Self::ControlCall => "CONTROL_CALL",
            Self::ControlArguments => "CONTROL_ARGUMENTS",
            Self::Expansion => "EXPANSION",
            Self::ExpansionSingle => "EXPANSION_SINGLE",
            Self::ExpansionMulti => "EXPANSION_MULTI",
            Self::ExpansionVar => "EXPANSION_VAR",
            Self::ExpansionCall => "EXPANSION_CALL",
            Self::ExpansionArguments => "EXPANSION_ARGUMENTS",
            Self::Block => "BLOCK",
            Self::Root => "ROOT",
        }
    }
}

// =============================================================================
// NODES
// =============================================================================

/// A single AST node.
#[derive(Debug, Clone, PartialEq)]
pub struct ASTNode {
    pub kind: NodeKind,
    /// Token this node was built from, used to anchor error messages.
    pub token: Option<Token>,
    pub children: Vec<ASTNode>,
}

impl ASTNode {
    pub fn new(kind: NodeKind, token: Option<Token>) -> Self {
        Self {
            kind,
            token,
            children: Vec::new(),
        }
    }

    /// Build a new node of `kind` anchored to the same token, optionally
    /// taking this node as its first child.
    pub fn wrap(self, kind: NodeKind, as_child: bool) -> ASTNode {
        let mut node = ASTNode::new(kind, self.token.clone());
        if as_child {
            node.children.push(self);
        }
        node
    }

    /// The literal text of a string node.
    pub fn str_content(&self) -> Option<&str> {
        if self.kind == NodeKind::String {
            self.token.as_ref().map(|t| t.value.as_str())
        } else {
            None
        }
    }

    /// Collect every node in this subtree matching `pred`, depth first.
    pub fn find_all<'a, F>(&'a self, pred: &F) -> Vec<&'a ASTNode>
    where
        F: Fn(&ASTNode) -> bool,
    {
        let mut found = Vec::new();
        if pred(self) {
            found.push(self);
        }
        for child in &self.children {
            found.extend(child.find_all(pred));
        }
        found
    }

    pub fn to_value(&self) -> serde_json::Value {
        let tok = match &self.token {
            Some(t) => t.to_string(),
            None => "None".to_string(),
        };
        serde_json::json!({
            "_type": self.kind.as_str(),
            "_tok": tok,
            "children": self.children.iter().map(|c| c.to_value()).collect::<Vec<_>>(),
        })
    }

    /// Render this subtree as indented JSON for debugging.
    pub fn prettify(&self) -> String {
        serde_json::to_string_pretty(&self.to_value()).unwrap_or_default()
    }
}

impl fmt::Display for ASTNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.token {
            Some(t) => write!(f, "{}:{}", self.kind.as_str(), t),
            None => write!(f, "{}:None", self.kind.as_str()),
        }
    }
}

// =============================================================================
// PARSED SCRIPTS
// =============================================================================

/// A parsed scroll: the root node plus the normalized source it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct AST {
    pub root: ASTNode,
    pub script: String,
}

impl AST {
    pub fn new(root: ASTNode, script: String) -> Self {
        Self { root, script }
    }

    pub fn prettify(&self) -> String {
        self.root.prettify()
    }
}
