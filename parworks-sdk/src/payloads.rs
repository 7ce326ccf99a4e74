//! JSON bodies returned by the platform, and the image payload sent to it.
//!
//! Only `success` is guaranteed to be present; everything else defaults when
//! the server leaves it out.

use reqwest::multipart::{Form, Part};
use serde::Deserialize;

use crate::errors::{Error, Result};
use crate::response::Payload;

macro_rules! impl_payload {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Payload for $ty {
                fn success(&self) -> bool {
                    self.success
                }
            }
        )*
    };
}

/// A body carrying nothing but the success flag.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BasicResponse {
    /// Whether the platform handled the request.
    pub success: bool,
}

/// Descriptive data of a site.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct SiteInfo {
    /// Caller-chosen identifier.
    pub id: String,
    /// Display name.
    pub name: Option<String>,
    /// Latitude, when the site is georeferenced.
    pub lat: Option<f64>,
    /// Longitude, when the site is georeferenced.
    pub lon: Option<f64>,
    /// Free-form description.
    pub description: Option<String>,
    /// Feature tag.
    pub feature: Option<String>,
    /// Channel.
    pub channel: Option<String>,
    /// Number of base images uploaded so far.
    #[serde(alias = "numImages")]
    pub num_images: Option<u64>,
}

/// Body of `/ar/site/info`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SiteInfoResponse {
    /// Whether the site was found.
    pub success: bool,
    /// The site, when found.
    #[serde(default)]
    pub site: Option<SiteInfo>,
}

/// Body of `/ar/site/nearby`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NearbySitesResponse {
    /// Whether the search ran.
    pub success: bool,
    /// Sites, nearest first.
    #[serde(default)]
    pub sites: Vec<SiteInfo>,
}

/// A reference image uploaded to a site.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct BaseImage {
    /// Image identifier.
    pub id: String,
    /// Original file name, if the platform kept it.
    pub name: Option<String>,
}

/// Body of `/ar/site/image`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BaseImagesResponse {
    /// Whether the listing ran.
    pub success: bool,
    /// The site's base images.
    #[serde(default)]
    pub images: Vec<BaseImage>,
}

/// Body of `/ar/site/image/add`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AddBaseImageResponse {
    /// Whether the upload was accepted.
    pub success: bool,
    /// Identifier of the stored image.
    #[serde(default)]
    pub id: String,
}

/// Body of `/ar/site/process/state`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ProcessingStateResponse {
    /// Whether the state could be read.
    pub success: bool,
    /// Processing state as reported by the platform, e.g. `PROCESSING` or `PROCESSED`.
    #[serde(default)]
    pub state: String,
}

/// An overlay attached to a site.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct OverlayInfo {
    /// Overlay identifier.
    pub id: String,
    /// Site the overlay belongs to.
    pub site: String,
    /// Base image the overlay is drawn on.
    #[serde(alias = "imageId")]
    pub image_id: String,
    /// Display name.
    pub name: String,
    /// Opaque overlay content (usually JSON-encoded geometry and payload).
    pub content: String,
}

/// Body of `/ar/site/overlay`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct OverlaysResponse {
    /// Whether the listing ran.
    pub success: bool,
    /// The site's overlays.
    #[serde(default)]
    pub overlays: Vec<OverlayInfo>,
}

/// Body of `/ar/site/overlay/add`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AddOverlayResponse {
    /// Whether the overlay was stored.
    pub success: bool,
    /// Identifier of the new overlay.
    #[serde(default)]
    pub id: String,
}

/// Body of `/ar/image/augment` and `/ar/image/augment/geo`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AugmentImageResponse {
    /// Whether the augmentation was queued.
    pub success: bool,
    /// Identifier to poll `/ar/image/augment/result` with.
    #[serde(default, alias = "imgId")]
    pub img_id: String,
}

/// An overlay placed on an augmented image.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct AugmentedOverlay {
    /// Overlay identifier.
    pub id: String,
    /// Overlay name.
    pub name: String,
    /// Overlay content.
    pub content: String,
    /// Outline of the overlay in the query image, as `x,y` pixel pairs.
    pub points: Vec<[f64; 2]>,
}

/// Body of `/ar/image/augment/result`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AugmentResultResponse {
    /// Whether a result is available.
    pub success: bool,
    /// Site the image was matched against.
    #[serde(default)]
    pub site: Option<String>,
    /// Whether the platform found a match.
    #[serde(default)]
    pub localized: bool,
    /// Overlays positioned on the image.
    #[serde(default)]
    pub overlays: Vec<AugmentedOverlay>,
}

impl_payload!(
    BasicResponse,
    SiteInfoResponse,
    NearbySitesResponse,
    BaseImagesResponse,
    AddBaseImageResponse,
    ProcessingStateResponse,
    OverlaysResponse,
    AddOverlayResponse,
    AugmentImageResponse,
    AugmentResultResponse,
);

/// Name of the multipart field carrying image bytes.
pub const IMAGE_FIELD: &str = "image";

/// Image bytes to upload, sent as the `image` field of a multipart body.
#[derive(Clone, PartialEq, Eq)]
pub struct ImagePayload {
    /// Encoded image.
    pub bytes: Vec<u8>,
    /// File name reported to the platform.
    pub file_name: String,
    /// MIME type, e.g. `image/jpeg`.
    pub content_type: String,
}

impl ImagePayload {
    /// A JPEG image.
    pub fn jpeg(file_name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            bytes: bytes.into(),
            file_name: file_name.into(),
            content_type: "image/jpeg".to_string(),
        }
    }

    pub(crate) fn into_form(self) -> Result<Form> {
        if self.bytes.is_empty() {
            return Err(Error::validation("image payload is empty"));
        }
        let part = Part::bytes(self.bytes)
            .file_name(self.file_name)
            .mime_str(&self.content_type)
            .map_err(|e| Error::validation(format!("invalid image content type: {e}")))?;
        Ok(Form::new().part(IMAGE_FIELD, part))
    }
}

impl std::fmt::Debug for ImagePayload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImagePayload")
            .field("bytes", &self.bytes.len())
            .field("file_name", &self.file_name)
            .field("content_type", &self.content_type)
            .finish()
    }
}
