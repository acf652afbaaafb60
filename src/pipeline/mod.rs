pub mod matcher;
pub mod normalize;
pub mod processor;
pub mod similarity;
pub mod validate;
