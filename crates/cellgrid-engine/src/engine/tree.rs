//! Expression trees built from infix formulas.
//!
//! A tree mirrors the static parse of one formula. Variables are resolved
//! through a [`Bindings`] table handed to [`ExpressionTree::evaluate`]; the
//! tree itself never holds on to caller state.

use std::collections::HashMap;

use super::operator::Operator;
use super::parse::{ParseError, build_tree, to_postfix};

/// Variable name -> value table used during evaluation.
pub type Bindings = HashMap<String, f64>;

/// A node of an expression tree.
#[derive(Clone, Debug, PartialEq)]
pub enum Node {
    Constant(f64),
    Variable(String),
    Operator {
        op: Operator,
        left: Box<Node>,
        right: Box<Node>,
    },
}

impl Node {
    /// Evaluate this node. Unbound variables evaluate to `0.0`.
    pub fn evaluate(&self, bindings: &Bindings) -> f64 {
        match self {
            Node::Constant(n) => *n,
            Node::Variable(name) => bindings.get(name).copied().unwrap_or(0.0),
            Node::Operator { op, left, right } => {
                let l = left.evaluate(bindings);
                let r = right.evaluate(bindings);
                op.apply(l, r)
            }
        }
    }

    fn collect_variables<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Node::Constant(_) => {}
            Node::Variable(name) => {
                if !out.contains(&name.as_str()) {
                    out.push(name);
                }
            }
            Node::Operator { left, right, .. } => {
                left.collect_variables(out);
                right.collect_variables(out);
            }
        }
    }
}

/// A parsed formula.
///
/// An empty expression parses to an empty tree; callers treat it as "no
/// formula" rather than as an error.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ExpressionTree {
    root: Option<Node>,
}

impl ExpressionTree {
    /// Parse an infix expression (without the leading `=`).
    pub fn parse(expression: &str) -> Result<ExpressionTree, ParseError> {
        if expression.chars().all(char::is_whitespace) {
            return Ok(ExpressionTree::default());
        }
        let root = build_tree(to_postfix(expression)?)?;
        Ok(ExpressionTree { root: Some(root) })
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Distinct variable names in left-to-right order of first appearance.
    pub fn variables(&self) -> Vec<&str> {
        let mut out = Vec::new();
        if let Some(root) = &self.root {
            root.collect_variables(&mut out);
        }
        out
    }

    /// Evaluate the tree. An empty tree evaluates to `0.0`.
    pub fn evaluate(&self, bindings: &Bindings) -> f64 {
        self.root.as_ref().map_or(0.0, |root| root.evaluate(bindings))
    }
}
