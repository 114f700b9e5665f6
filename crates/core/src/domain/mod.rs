pub mod portfolio;
pub mod risk;
