//! Core data models for the farm directory.

pub mod address;
pub mod farm;
pub mod produce;
pub mod user;

pub use address::AddressRecord;
pub use farm::{Farm, FarmAddress, FarmAddressPatch, FarmMetrics, FarmPatch, GeoPoint};
pub use produce::{Produce, ProducePatch};
pub use user::{User, UserPatch};
