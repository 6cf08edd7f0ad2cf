#[path = "util/cores.rs"]
mod cores;
