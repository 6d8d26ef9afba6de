//! Query routing.
//!
//! A [`Router`] classifies a user query into a [`RoutingDecision`]. The
//! coordinator only depends on the trait; [`KeywordRouter`] is the
//! configuration-driven implementation used by the binary.

pub mod keyword;

pub use keyword::KeywordRouter;

use crate::dispatch::types::RoutingDecision;
use crate::error::RouteError;

pub trait Router: Send + Sync {
    fn route(&self, query: &str) -> Result<RoutingDecision, RouteError>;
}
