use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct ProbeRequest {
    pub urls: Vec<String>,
}
