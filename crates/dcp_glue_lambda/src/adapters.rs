pub mod callback;
pub mod object_store;
pub mod workflow;
