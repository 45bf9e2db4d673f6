mod common;

mod cli;
mod config;
mod modules;
mod parser;
