//! Constants used across ParWorks clients.

/// Base URL of the public development deployment of the AR platform.
pub const DEFAULT_BASE_URL: &str = "http://dev.parworksapi.com";

/// Names of the three authentication headers carried by every request.
pub mod headers {
    /// The caller's API key.
    pub const API_KEY: &str = "apikey";
    /// The timestamp the signature was computed over.
    pub const SALT: &str = "salt";
    /// HMAC-SHA256 of the salt, keyed by the secret key.
    pub const SIGNATURE: &str = "signature";
}

/// Endpoint paths, relative to the base URL.
pub mod paths {
    /// Health check.
    pub const HEALTH_CHECK: &str = "/ar/ping";

    /// Create a site.
    pub const ADD_SITE: &str = "/ar/site/add";
    /// Fetch a site's info.
    pub const SITE_INFO: &str = "/ar/site/info";
    /// Sites near a coordinate.
    pub const NEARBY_SITES: &str = "/ar/site/nearby";
    /// Delete a site.
    pub const REMOVE_SITE: &str = "/ar/site/remove";

    /// List a site's base images.
    pub const LIST_BASE_IMAGES: &str = "/ar/site/image";
    /// Upload a base image.
    pub const ADD_BASE_IMAGE: &str = "/ar/site/image/add";
    /// Start processing a site's base images.
    pub const PROCESS_BASE_IMAGES: &str = "/ar/site/process";
    /// Base image processing state.
    pub const BASE_IMAGE_PROCESSING_STATE: &str = "/ar/site/process/state";

    /// List a site's overlays.
    ///
    /// Published without a leading slash; [`crate::query::build_url`] inserts
    /// the separator when joining it to the base URL.
    pub const SITE_OVERLAYS: &str = "ar/site/overlay";
    /// Add an overlay.
    pub const ADD_OVERLAY: &str = "/ar/site/overlay/add";
    /// Save an overlay.
    pub const SAVE_OVERLAY: &str = "/ar/site/overlay/save";
    /// Remove an overlay.
    pub const REMOVE_OVERLAY: &str = "/ar/site/overlay/remove";

    /// Augment an image against one site.
    pub const AUGMENT_IMAGE: &str = "/ar/image/augment";
    /// Augment an image against the sites near a coordinate.
    pub const AUGMENT_IMAGE_GEO: &str = "/ar/image/augment/geo";
    /// Fetch the result of an augmentation.
    pub const AUGMENT_IMAGE_RESULT: &str = "/ar/image/augment/result";
}
