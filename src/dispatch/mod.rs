//! The dispatch path: request building, specialist reply normalization, and
//! the [`coordinator::SmartCoordinator`] that drives them per query.

pub mod coordinator;
pub mod normalize;
pub mod request;
pub mod types;

pub use coordinator::{SmartCoordinator, Stage};
pub use normalize::ResponseNormalizer;
pub use request::{RequestBuilder, build_specialist_system_message};
pub use types::{
    CanonicalResponse, JsonMap, ResponseStatus, RoutingDecision, SpecialistRequest,
    SpecialistResult,
};
