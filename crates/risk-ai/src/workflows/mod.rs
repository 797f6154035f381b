pub mod assessment;
pub mod learning;
