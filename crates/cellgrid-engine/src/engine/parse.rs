//! Formula tokenizer and shunting-yard conversion.
//!
//! A formula body (the text after the leading `=`) is scanned left to right.
//! Runs of letters, digits and `.` form one operand; `(` and `)` group; every
//! other character must be a catalog operator. Whitespace carries no meaning
//! and is dropped before scanning.
//!
//! [`to_postfix`] turns the infix token stream into reverse Polish order,
//! which [`build_tree`] folds into an expression tree.

use thiserror::Error;

use super::operator::Operator;
use super::tree::Node;

/// Why a formula could not be turned into a tree.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("Formula has no operands")]
    Empty,

    #[error("Unbalanced parentheses")]
    UnbalancedParentheses,

    #[error("Unsupported operator: {0}")]
    UnsupportedOperator(char),

    #[error("Operator is missing an operand")]
    MissingOperand,

    #[error("{0} operands left without an operator")]
    DanglingOperands(usize),
}

/// A lexical token of a formula.
#[derive(Clone, Debug, PartialEq)]
pub enum Token {
    Operand(String),
    Operator(Operator),
    LeftParen,
    RightParen,
}

/// Split an infix expression into tokens.
pub fn tokenize(expression: &str) -> Result<Vec<Token>, ParseError> {
    let mut tokens = Vec::new();
    let mut operand = String::new();

    for ch in expression.chars().filter(|c| !c.is_whitespace()) {
        if ch.is_ascii_alphanumeric() || ch == '.' {
            operand.push(ch);
            continue;
        }

        if !operand.is_empty() {
            tokens.push(Token::Operand(std::mem::take(&mut operand)));
        }

        tokens.push(match ch {
            '(' => Token::LeftParen,
            ')' => Token::RightParen,
            _ => Token::Operator(Operator::from_symbol(ch)?),
        });
    }

    if !operand.is_empty() {
        tokens.push(Token::Operand(operand));
    }
    Ok(tokens)
}

/// Convert an infix expression to postfix order (shunting-yard).
///
/// The result holds only operands and operators; parentheses are consumed.
pub fn to_postfix(expression: &str) -> Result<Vec<Token>, ParseError> {
    let mut output = Vec::new();
    let mut stack: Vec<Token> = Vec::new();

    for token in tokenize(expression)? {
        match token {
            Token::Operand(_) => output.push(token),
            Token::LeftParen => stack.push(token),
            Token::RightParen => loop {
                match stack.pop() {
                    Some(Token::LeftParen) => break,
                    Some(other) => output.push(other),
                    None => return Err(ParseError::UnbalancedParentheses),
                }
            },
            Token::Operator(op) => {
                while let Some(Token::Operator(top)) = stack.last() {
                    if op.binds_over(top) {
                        break;
                    }
                    if let Some(popped) = stack.pop() {
                        output.push(popped);
                    }
                }
                stack.push(Token::Operator(op));
            }
        }
    }

    while let Some(token) = stack.pop() {
        if token == Token::LeftParen {
            return Err(ParseError::UnbalancedParentheses);
        }
        output.push(token);
    }

    Ok(output)
}

/// Fold a postfix token sequence into a single tree.
///
/// Operands that start like a number and parse as one become constants;
/// everything else is a variable resolved at evaluation time.
pub fn build_tree(postfix: Vec<Token>) -> Result<Node, ParseError> {
    let mut values: Vec<Node> = Vec::new();

    for token in postfix {
        match token {
            Token::Operand(text) => values.push(operand_node(text)),
            Token::Operator(op) => {
                let right = values.pop().ok_or(ParseError::MissingOperand)?;
                let left = values.pop().ok_or(ParseError::MissingOperand)?;
                values.push(Node::Operator {
                    op,
                    left: Box::new(left),
                    right: Box::new(right),
                });
            }
            Token::LeftParen | Token::RightParen => {
                return Err(ParseError::UnbalancedParentheses);
            }
        }
    }

    match values.len() {
        0 => Err(ParseError::Empty),
        1 => values.pop().ok_or(ParseError::Empty),
        n => Err(ParseError::DanglingOperands(n)),
    }
}

fn operand_node(text: String) -> Node {
    let numeric_start = text
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_digit() || c == '.');
    if numeric_start && let Ok(n) = text.parse::<f64>() {
        return Node::Constant(n);
    }
    Node::Variable(text)
}
