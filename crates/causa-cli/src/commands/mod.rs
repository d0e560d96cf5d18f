pub mod analyze;
pub mod axioms;
pub mod paths;
pub mod stats;
