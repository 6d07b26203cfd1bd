#![allow(clippy::module_inception)]

use std::rc::Rc;

pub mod ast;
pub mod errors;
pub mod macros;
pub mod type_checker;

#[derive(Debug, Clone, PartialEq)]
pub struct Position(pub u32, pub Rc<String>);

impl Position {
    pub fn null() -> Self {
        Position(0, Rc::new(String::from("<null>")))
    }

    /// A null position marks a location the compiler synthesized, which
    /// diagnostics must not point at.
    pub fn is_valid(&self) -> bool {
        self.1.as_str() != "<null>"
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Span {
    pub start: Position,
    pub end: Position,
}

impl Span {
    pub fn new(file: &Rc<String>, start: u32, end: u32) -> Self {
        Span {
            start: Position(start, Rc::clone(file)),
            end: Position(end, Rc::clone(file)),
        }
    }

    pub fn null() -> Self {
        Span {
            start: Position::null(),
            end: Position::null(),
        }
    }

    pub fn is_valid(&self) -> bool {
        self.start.is_valid()
    }
}
