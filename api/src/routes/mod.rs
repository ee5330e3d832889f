pub mod ask;
pub mod docs_route;
pub mod health_route;
pub mod stats_route;
