pub mod script_resource;
pub mod workflow_trigger;
