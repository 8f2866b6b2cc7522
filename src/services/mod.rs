pub mod controller;
pub mod ingest;
pub mod selection;

pub use controller::Dashboard;
