pub mod catalog;
pub mod data_store;
pub mod export;
pub mod join;
pub mod queries;
pub mod tabular;
