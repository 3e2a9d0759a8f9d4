pub mod consolidate_request;
pub mod consolidate_route;
pub mod email_images_response;
pub mod email_images_route;
