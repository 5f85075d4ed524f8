//! Динамически типизированные значения для шины по умолчанию.
//!
//! - `value`, [`Payload`]: одно значение аргумента или результата.
//! - `args`, [`Args`]: упорядоченный список аргументов одного вызова и
//!   макрос [`args!`](crate::args).

pub mod args;
pub mod value;

pub use args::*;
pub use value::*;
