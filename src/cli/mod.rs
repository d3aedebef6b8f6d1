pub mod console;
pub mod parser;

pub use parser::{Command, CommandParser};
