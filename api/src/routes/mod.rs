pub mod health_route;
pub mod images;
pub mod quotes;
