use serde::{Deserialize, Serialize};

use crate::lenient;
use crate::structs::raw_quote_line::present;

/// One known color → image mapping of a catalog product.
///
/// Older catalog rows name the image field `link_image`, and some rows carry
/// both keys. `image` wins when it is populated.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VariationRecord {
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub color: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub image: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient::opt_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub link_image: Option<String>,
}

impl VariationRecord {
    /// First populated of `image` and `link_image`.
    pub fn image_url(&self) -> Option<&str> {
        present(&self.image).or_else(|| present(&self.link_image))
    }
}
