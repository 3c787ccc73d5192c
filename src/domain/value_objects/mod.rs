pub mod currency;
pub mod region;
