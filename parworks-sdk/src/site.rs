//! Operations on one site: base images, processing, overlays, augmentation.

use parworks_common::constants::paths;

use crate::{
    errors::Result,
    invoker::{Call, Invoker, PendingCall},
    payloads::{
        AddBaseImageResponse, AddOverlayResponse, AugmentImageResponse, BaseImage,
        BaseImagesResponse, BasicResponse, ImagePayload, OverlayInfo, OverlaysResponse,
        ProcessingStateResponse, SiteInfo, SiteInfoResponse,
    },
    response::json_extractor,
    sites::require,
};

const INFO_FAILED: &str =
    "Successfully communicated with the server, but the server couldn't get the site info.";
const REMOVE_FAILED: &str =
    "Successfully communicated with the server, but the server couldn't remove the site.";
const LIST_IMAGES_FAILED: &str =
    "Successfully communicated with the server, but the server couldn't list the base images.";
const ADD_IMAGE_FAILED: &str =
    "Successfully communicated with the server, but the server couldn't add the base image.";
const PROCESS_FAILED: &str = "Successfully communicated with the server, but the server couldn't start processing the base images.";
const STATE_FAILED: &str = "Successfully communicated with the server, but the server couldn't report the processing state.";
const LIST_OVERLAYS_FAILED: &str =
    "Successfully communicated with the server, but the server couldn't list the overlays.";
const ADD_OVERLAY_FAILED: &str =
    "Successfully communicated with the server, but the server couldn't add the overlay.";
const SAVE_OVERLAY_FAILED: &str =
    "Successfully communicated with the server, but the server couldn't save the overlay.";
const REMOVE_OVERLAY_FAILED: &str =
    "Successfully communicated with the server, but the server couldn't remove the overlay.";
const AUGMENT_FAILED: &str =
    "Successfully communicated with the server, but the server couldn't augment the image.";

/// A new overlay drawn on one of a site's base images.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOverlay {
    /// Base image the overlay is drawn on.
    pub image_id: String,
    /// Display name.
    pub name: String,
    /// Opaque content.
    pub content: String,
}

/// Handle on one site, authenticated with the triple of the [`crate::ArSites`]
/// it came from.
#[derive(Debug, Clone)]
pub struct ArSite {
    id: String,
    info: Option<SiteInfo>,
    invoker: Invoker,
}

impl ArSite {
    pub(crate) fn new(id: impl Into<String>, invoker: Invoker) -> Self {
        Self {
            id: id.into(),
            info: None,
            invoker,
        }
    }

    pub(crate) fn with_info(info: SiteInfo, invoker: Invoker) -> Self {
        Self {
            id: info.id.clone(),
            info: Some(info),
            invoker,
        }
    }

    /// The site id.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Site info as returned by the lookup that produced this handle, if any.
    pub fn cached_info(&self) -> Option<&SiteInfo> {
        self.info.as_ref()
    }

    // === Site ===

    /// Fetch the site's current info.
    pub fn info(&self) -> Result<SiteInfo> {
        self.invoker.call_blocking(self.info_call()?)
    }

    /// Async [`ArSite::info`].
    pub fn info_async(&self) -> PendingCall<SiteInfo> {
        self.spawn(self.info_call())
    }

    /// Delete the site.
    pub fn remove(&self) -> Result<()> {
        self.invoker
            .call_blocking(self.site_call(paths::REMOVE_SITE, REMOVE_FAILED)?)
    }

    /// Async [`ArSite::remove`].
    pub fn remove_async(&self) -> PendingCall<()> {
        self.spawn(self.site_call(paths::REMOVE_SITE, REMOVE_FAILED))
    }

    // === Base images ===

    /// The site's base images.
    pub fn base_images(&self) -> Result<Vec<BaseImage>> {
        self.invoker.call_blocking(self.base_images_call()?)
    }

    /// Async [`ArSite::base_images`].
    pub fn base_images_async(&self) -> PendingCall<Vec<BaseImage>> {
        self.spawn(self.base_images_call())
    }

    /// Upload a base image. Returns its id.
    pub fn add_base_image(&self, image: ImagePayload) -> Result<String> {
        self.invoker.call_blocking(self.add_base_image_call(image)?)
    }

    /// Async [`ArSite::add_base_image`].
    pub fn add_base_image_async(&self, image: ImagePayload) -> PendingCall<String> {
        self.spawn(self.add_base_image_call(image))
    }

    /// Start processing the uploaded base images.
    pub fn process_base_images(&self) -> Result<()> {
        self.invoker
            .call_blocking(self.site_call(paths::PROCESS_BASE_IMAGES, PROCESS_FAILED)?)
    }

    /// Async [`ArSite::process_base_images`].
    pub fn process_base_images_async(&self) -> PendingCall<()> {
        self.spawn(self.site_call(paths::PROCESS_BASE_IMAGES, PROCESS_FAILED))
    }

    /// Processing state of the base images, as reported by the platform.
    pub fn base_image_state(&self) -> Result<String> {
        self.invoker.call_blocking(self.state_call()?)
    }

    /// Async [`ArSite::base_image_state`].
    pub fn base_image_state_async(&self) -> PendingCall<String> {
        self.spawn(self.state_call())
    }

    // === Overlays ===

    /// The site's overlays.
    pub fn overlays(&self) -> Result<Vec<OverlayInfo>> {
        self.invoker.call_blocking(self.overlays_call()?)
    }

    /// Async [`ArSite::overlays`].
    pub fn overlays_async(&self) -> PendingCall<Vec<OverlayInfo>> {
        self.spawn(self.overlays_call())
    }

    /// Attach an overlay. Returns its id.
    pub fn add_overlay(&self, overlay: &NewOverlay) -> Result<String> {
        self.invoker.call_blocking(self.add_overlay_call(overlay)?)
    }

    /// Async [`ArSite::add_overlay`].
    pub fn add_overlay_async(&self, overlay: &NewOverlay) -> PendingCall<String> {
        self.spawn(self.add_overlay_call(overlay))
    }

    /// Overwrite an existing overlay.
    pub fn save_overlay(&self, overlay: &OverlayInfo) -> Result<()> {
        self.invoker.call_blocking(self.save_overlay_call(overlay)?)
    }

    /// Async [`ArSite::save_overlay`].
    pub fn save_overlay_async(&self, overlay: &OverlayInfo) -> PendingCall<()> {
        self.spawn(self.save_overlay_call(overlay))
    }

    /// Detach an overlay.
    pub fn remove_overlay(&self, overlay_id: &str) -> Result<()> {
        self.invoker
            .call_blocking(self.remove_overlay_call(overlay_id)?)
    }

    /// Async [`ArSite::remove_overlay`].
    pub fn remove_overlay_async(&self, overlay_id: &str) -> PendingCall<()> {
        self.spawn(self.remove_overlay_call(overlay_id))
    }

    // === Augmentation ===

    /// Augment `image` against this site. Returns the image id to poll
    /// [`crate::ArSites::augment_result`] with.
    pub fn augment_image(&self, image: ImagePayload) -> Result<String> {
        self.invoker.call_blocking(self.augment_call(image)?)
    }

    /// Async [`ArSite::augment_image`].
    pub fn augment_image_async(&self, image: ImagePayload) -> PendingCall<String> {
        self.spawn(self.augment_call(image))
    }

    // === Calls ===

    fn spawn<T: Send + Sync + 'static>(&self, call: Result<Call<T>>) -> PendingCall<T> {
        match call {
            Ok(call) => self.invoker.call_async(call),
            Err(e) => PendingCall::failed(e),
        }
    }

    fn site_call(&self, path: &'static str, failure: &'static str) -> Result<Call<()>> {
        require("site id", &self.id)?;
        Ok(Call::get(path, json_extractor(failure, |_: BasicResponse| Ok(())))
            .param("site", self.id.as_str()))
    }

    fn info_call(&self) -> Result<Call<SiteInfo>> {
        require("site id", &self.id)?;
        Ok(Call::get(
            paths::SITE_INFO,
            json_extractor(INFO_FAILED, |body: SiteInfoResponse| {
                body.site
                    .ok_or_else(|| crate::Error::Domain(INFO_FAILED.to_string()))
            }),
        )
        .param("site", self.id.as_str()))
    }

    fn base_images_call(&self) -> Result<Call<Vec<BaseImage>>> {
        require("site id", &self.id)?;
        Ok(Call::get(
            paths::LIST_BASE_IMAGES,
            json_extractor(LIST_IMAGES_FAILED, |body: BaseImagesResponse| Ok(body.images)),
        )
        .param("site", self.id.as_str()))
    }

    fn add_base_image_call(&self, image: ImagePayload) -> Result<Call<String>> {
        require("site id", &self.id)?;
        Ok(Call::post(
            paths::ADD_BASE_IMAGE,
            json_extractor(ADD_IMAGE_FAILED, |body: AddBaseImageResponse| Ok(body.id)),
        )
        .param("site", self.id.as_str())
        .multipart(image.into_form()?))
    }

    fn state_call(&self) -> Result<Call<String>> {
        require("site id", &self.id)?;
        Ok(Call::get(
            paths::BASE_IMAGE_PROCESSING_STATE,
            json_extractor(STATE_FAILED, |body: ProcessingStateResponse| Ok(body.state)),
        )
        .param("site", self.id.as_str()))
    }

    fn overlays_call(&self) -> Result<Call<Vec<OverlayInfo>>> {
        require("site id", &self.id)?;
        Ok(Call::get(
            paths::SITE_OVERLAYS,
            json_extractor(LIST_OVERLAYS_FAILED, |body: OverlaysResponse| Ok(body.overlays)),
        )
        .param("site", self.id.as_str()))
    }

    fn add_overlay_call(&self, overlay: &NewOverlay) -> Result<Call<String>> {
        require("site id", &self.id)?;
        require("image id", &overlay.image_id)?;
        Ok(Call::post(
            paths::ADD_OVERLAY,
            json_extractor(ADD_OVERLAY_FAILED, |body: AddOverlayResponse| Ok(body.id)),
        )
        .param("site", self.id.as_str())
        .param("imgId", overlay.image_id.as_str())
        .param("name", overlay.name.as_str())
        .param("content", overlay.content.as_str()))
    }

    fn save_overlay_call(&self, overlay: &OverlayInfo) -> Result<Call<()>> {
        require("site id", &self.id)?;
        require("overlay id", &overlay.id)?;
        Ok(Call::post(
            paths::SAVE_OVERLAY,
            json_extractor(SAVE_OVERLAY_FAILED, |_: BasicResponse| Ok(())),
        )
        .param("id", overlay.id.as_str())
        .param("site", self.id.as_str())
        .param("imgId", overlay.image_id.as_str())
        .param("name", overlay.name.as_str())
        .param("content", overlay.content.as_str()))
    }

    fn remove_overlay_call(&self, overlay_id: &str) -> Result<Call<()>> {
        require("site id", &self.id)?;
        require("overlay id", overlay_id)?;
        Ok(Call::post(
            paths::REMOVE_OVERLAY,
            json_extractor(REMOVE_OVERLAY_FAILED, |_: BasicResponse| Ok(())),
        )
        .param("id", overlay_id)
        .param("site", self.id.as_str()))
    }

    fn augment_call(&self, image: ImagePayload) -> Result<Call<String>> {
        require("site id", &self.id)?;
        Ok(Call::post(
            paths::AUGMENT_IMAGE,
            json_extractor(AUGMENT_FAILED, |body: AugmentImageResponse| Ok(body.img_id)),
        )
        .param("site", self.id.as_str())
        .multipart(image.into_form()?))
    }
}
