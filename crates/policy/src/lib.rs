pub mod gate;

pub use gate::{PolicyDecision, PolicyGate, NONE_MATCHED};
