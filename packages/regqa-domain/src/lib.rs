pub mod fusion;
pub mod grounding;
pub mod normalize;
pub mod text;
pub mod types;
