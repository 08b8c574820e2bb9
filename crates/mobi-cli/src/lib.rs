// Terminal front end: command parsing, update rendering and the line loop
// that connects stdin/stdout to the app loop.

pub mod commands;
pub mod output;
pub mod render;
pub mod repl;
