pub mod peer;
pub mod trace;
