pub mod cell;
pub mod clipboard;
pub mod formula;
pub mod grid;
pub mod recalc;
