//! Binary operator catalog.
//!
//! Every operator the formula grammar understands is registered in one static
//! table: its symbol, how tightly it binds, which way it associates and the
//! function that combines two operands. The parser asks the catalog whether a
//! character is an operator and how to order it; tree nodes carry the
//! resolved [`Operator`] so evaluation is a plain match.

use super::parse::ParseError;

/// Direction in which a chain of equal-precedence operators groups.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Associativity {
    Left,
    Right,
}

/// One entry of the operator table. Only obtainable through the catalog.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Operator {
    symbol: char,
    precedence: u8,
    associativity: Associativity,
}

const OPERATORS: [Operator; 4] = [
    Operator {
        symbol: '+',
        precedence: 5,
        associativity: Associativity::Left,
    },
    Operator {
        symbol: '-',
        precedence: 5,
        associativity: Associativity::Left,
    },
    Operator {
        symbol: '*',
        precedence: 6,
        associativity: Associativity::Left,
    },
    Operator {
        symbol: '/',
        precedence: 6,
        associativity: Associativity::Left,
    },
];

impl Operator {
    /// Look up an operator by symbol.
    pub fn from_symbol(symbol: char) -> Result<Operator, ParseError> {
        Self::lookup(symbol).ok_or(ParseError::UnsupportedOperator(symbol))
    }

    fn lookup(symbol: char) -> Option<Operator> {
        OPERATORS.iter().copied().find(|op| op.symbol == symbol)
    }

    pub fn symbol(&self) -> char {
        self.symbol
    }

    /// Higher binds tighter.
    pub fn precedence(&self) -> u8 {
        self.precedence
    }

    pub fn associativity(&self) -> Associativity {
        self.associativity
    }

    /// Apply the operator. Division follows IEEE semantics: `x/0` is
    /// `±Infinity` and `0/0` is `NaN`.
    pub fn apply(&self, left: f64, right: f64) -> f64 {
        match self.symbol {
            '+' => left + right,
            '-' => left - right,
            '*' => left * right,
            '/' => left / right,
            _ => unreachable!("operator {:?} is not in the catalog", self.symbol),
        }
    }

    /// Whether `self`, arriving while `top` sits on the operator stack, should
    /// be pushed on top of it rather than popping `top` first.
    pub fn binds_over(&self, top: &Operator) -> bool {
        self.precedence > top.precedence
            || (self.precedence == top.precedence && self.associativity == Associativity::Right)
    }
}
