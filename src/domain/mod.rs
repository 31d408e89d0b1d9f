pub mod client_entry;
pub mod conflict;
pub mod fingerprint;
pub mod identity;
pub mod plan;
pub mod ports;
pub mod snapshot;
pub mod value_objects;
