pub mod cli;
pub mod history;
pub mod render;
pub mod repl;
pub mod server;
