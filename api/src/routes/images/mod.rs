pub mod probe_request;
pub mod probe_route;
