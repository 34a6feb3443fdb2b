pub mod compare;
pub mod mortgage;
pub mod sequence;
