pub mod retry;
pub mod row;
pub mod selfref;
pub mod synth;
pub mod tracker;
pub mod value;

pub use row::{GeneratedRow, RowGenerator};
pub use synth::Synthesizer;
pub use tracker::{ConstraintTracker, InsertedKey, KeyStore};
pub use value::Value;
