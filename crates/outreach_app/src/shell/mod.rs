//! Terminal front end: reads commands, feeds `update`, runs effects.
mod app;
mod command;
mod effects;
mod render;

pub use app::run;
