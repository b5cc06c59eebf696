pub mod api_router;
pub mod audit;
pub mod controls;
pub mod dashboards;
pub mod risks;
pub mod scoring;
pub mod shared;
