pub mod image_service_config;
