pub mod activity;
pub mod device_model;
