// Domain services
// Feature normalization and the risk policy are pure; the services below
// them are generic over the repository traits of the data crate.

pub mod normalizer;
pub mod risk_policy;
pub mod screening;
pub mod profile;
pub mod admin;

pub use admin::{AdminService, AdminServiceTrait};
pub use profile::{ProfileService, ProfileServiceTrait};
pub use risk_policy::RiskPolicy;
pub use screening::{ScreeningService, ScreeningServiceTrait};
