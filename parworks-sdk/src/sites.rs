//! Finding, creating and augmenting against sites.

use parworks_common::auth::Credentials;
use parworks_common::constants::paths;

use crate::{
    ArSite, BuildError, Client,
    errors::{Error, Result},
    global::global_client,
    invoker::{ArListener, Call, Invoker, PendingCall},
    payloads::{
        AugmentImageResponse, AugmentResultResponse, BasicResponse, ImagePayload,
        NearbySitesResponse, SiteInfoResponse,
    },
    response::json_extractor,
};

const CREATE_FAILED: &str = "Successfully communicated with the server, but failed to create a new site. The site id could already be in use, or a problem occurred.";
const GET_FAILED: &str = "Successfully communicated with the server, but failed to get siteinfo. The most likely cause is that a site with the specified ID does not exist.";
const NEARBY_FAILED: &str =
    "Successfully communicated with the server, but the server was unsuccessful in finding nearby sites.";
const AUGMENT_FAILED: &str =
    "Successfully communicated with the server, but the server couldn't augment the image.";
const AUGMENT_RESULT_FAILED: &str =
    "Successfully communicated with the server, but the augmentation result is not available.";

/// Everything the platform records about a new georeferenced site.
#[derive(Debug, Clone, PartialEq)]
pub struct NewSite {
    /// Caller-chosen identifier, used for every later access.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Longitude.
    pub lon: f64,
    /// Latitude.
    pub lat: f64,
    /// Description.
    pub description: String,
    /// Feature tag.
    pub feature: String,
    /// Channel.
    pub channel: String,
}

/// Site collection handle: creates, finds and augments against sites.
///
/// Holds one credential triple, signed when the handle is built and sent with
/// every call. Every operation comes as a blocking method and an `_async`
/// twin that runs on a worker thread; the most common ones also take an
/// [`ArListener`].
///
/// ```no_run
/// # fn main() -> parworks::Result<()> {
/// let sites = parworks::ArSites::new("my-api-key", "my-secret-key")?;
/// let site = sites.get_existing("my-site")?;
/// for nearby in sites.near(37.0, -122.0)? {
///     println!("{}", nearby.id());
/// }
/// # let _ = site;
/// # Ok(()) }
/// ```
#[derive(Debug, Clone)]
pub struct ArSites {
    invoker: Invoker,
}

impl ArSites {
    /// Sign `secret_key` now and bind the result to the process-wide [`Client`].
    pub fn new(
        api_key: impl Into<String>,
        secret_key: impl AsRef<[u8]>,
    ) -> std::result::Result<Self, BuildError> {
        let client = global_client()?;
        let credentials = client.credentials(api_key, secret_key);
        Ok(Self::with_credentials(client, credentials))
    }

    /// Bind an existing credential triple to `client`.
    pub fn with_credentials(client: Client, credentials: Credentials) -> Self {
        Self {
            invoker: Invoker::new(client, credentials),
        }
    }

    /// The invoker behind this handle, for calls the facade does not cover.
    pub fn invoker(&self) -> &Invoker {
        &self.invoker
    }

    /// The credential triple sent with every call.
    pub fn credentials(&self) -> &Credentials {
        self.invoker.credentials()
    }

    /// A handle on the site `id`, without asking the platform whether it exists.
    pub fn site(&self, id: impl Into<String>) -> ArSite {
        ArSite::new(id, self.invoker.clone())
    }

    // === Health ===

    /// Check that the platform is reachable and accepts these credentials.
    pub fn ping(&self) -> Result<()> {
        self.invoker.call_blocking(ping_call())
    }

    /// Async [`ArSites::ping`].
    pub fn ping_async(&self) -> PendingCall<()> {
        self.invoker.call_async(ping_call())
    }

    // === Create ===

    /// Create a georeferenced site, then fetch it.
    pub fn create(&self, site: &NewSite) -> Result<ArSite> {
        let call = create_full_call(site, |_| Ok(()))?;
        self.invoker.call_blocking(call)?;
        self.get_existing(&site.id)
    }

    /// Async [`ArSites::create`]. Resolves to a handle on the new site without
    /// fetching it again.
    pub fn create_async(&self, site: &NewSite) -> PendingCall<ArSite> {
        let invoker = self.invoker.clone();
        let id = site.id.clone();
        match create_full_call(site, move |_| Ok(ArSite::new(id.clone(), invoker.clone()))) {
            Ok(call) => self.invoker.call_async(call),
            Err(e) => PendingCall::failed(e),
        }
    }

    /// Listener form of [`ArSites::create_async`].
    pub fn create_with_listener<L: ArListener<ArSite>>(&self, site: &NewSite, listener: L) {
        let invoker = self.invoker.clone();
        let id = site.id.clone();
        match create_full_call(site, move |_| Ok(ArSite::new(id.clone(), invoker.clone()))) {
            Ok(call) => self.invoker.call_with_listener(call, listener),
            Err(e) => listener.on_error(e),
        }
    }

    /// Create a site with only the required fields, then fetch it.
    pub fn create_minimal(&self, id: &str, description: &str, channel: &str) -> Result<ArSite> {
        let call = create_minimal_call(id, description, channel, |_| Ok(()))?;
        self.invoker.call_blocking(call)?;
        self.get_existing(id)
    }

    /// Async [`ArSites::create_minimal`]. Resolves to a handle on the new site
    /// without fetching it again.
    pub fn create_minimal_async(
        &self,
        id: &str,
        description: &str,
        channel: &str,
    ) -> PendingCall<ArSite> {
        let invoker = self.invoker.clone();
        let owned_id = id.to_string();
        match create_minimal_call(id, description, channel, move |_| {
            Ok(ArSite::new(owned_id.clone(), invoker.clone()))
        }) {
            Ok(call) => self.invoker.call_async(call),
            Err(e) => PendingCall::failed(e),
        }
    }

    // === Lookup ===

    /// Fetch a previously created site.
    pub fn get_existing(&self, id: &str) -> Result<ArSite> {
        self.invoker.call_blocking(self.get_existing_call(id)?)
    }

    /// Async [`ArSites::get_existing`].
    pub fn get_existing_async(&self, id: &str) -> PendingCall<ArSite> {
        match self.get_existing_call(id) {
            Ok(call) => self.invoker.call_async(call),
            Err(e) => PendingCall::failed(e),
        }
    }

    /// Listener form of [`ArSites::get_existing_async`].
    pub fn get_existing_with_listener<L: ArListener<ArSite>>(&self, id: &str, listener: L) {
        match self.get_existing_call(id) {
            Ok(call) => self.invoker.call_with_listener(call, listener),
            Err(e) => listener.on_error(e),
        }
    }

    // === Proximity search ===

    /// The sites nearest a coordinate, with the platform's default count and radius.
    pub fn near(&self, lat: f64, lon: f64) -> Result<Vec<ArSite>> {
        self.invoker.call_blocking(self.near_call(lat, lon, None))
    }

    /// Up to `max` sites within `radius` of a coordinate.
    pub fn near_within(&self, lat: f64, lon: f64, max: u32, radius: f64) -> Result<Vec<ArSite>> {
        self.invoker
            .call_blocking(self.near_call(lat, lon, Some((max, radius))))
    }

    /// Async [`ArSites::near`].
    pub fn near_async(&self, lat: f64, lon: f64) -> PendingCall<Vec<ArSite>> {
        self.invoker.call_async(self.near_call(lat, lon, None))
    }

    /// Async [`ArSites::near_within`].
    pub fn near_within_async(
        &self,
        lat: f64,
        lon: f64,
        max: u32,
        radius: f64,
    ) -> PendingCall<Vec<ArSite>> {
        self.invoker
            .call_async(self.near_call(lat, lon, Some((max, radius))))
    }

    /// Listener form of [`ArSites::near_async`].
    pub fn near_with_listener<L: ArListener<Vec<ArSite>>>(&self, lat: f64, lon: f64, listener: L) {
        self.invoker
            .call_with_listener(self.near_call(lat, lon, None), listener);
    }

    /// Listener form of [`ArSites::near_within_async`].
    pub fn near_within_with_listener<L: ArListener<Vec<ArSite>>>(
        &self,
        lat: f64,
        lon: f64,
        max: u32,
        radius: f64,
        listener: L,
    ) {
        self.invoker
            .call_with_listener(self.near_call(lat, lon, Some((max, radius))), listener);
    }

    // === Augmentation ===

    /// Augment `image` against the sites within `radius` of a coordinate.
    /// Returns the image id to poll [`ArSites::augment_result`] with.
    pub fn augment_image_geo(
        &self,
        lat: f64,
        lon: f64,
        radius: f64,
        image: ImagePayload,
    ) -> Result<String> {
        self.invoker
            .call_blocking(augment_geo_call(lat, lon, radius, image)?)
    }

    /// Async [`ArSites::augment_image_geo`].
    pub fn augment_image_geo_async(
        &self,
        lat: f64,
        lon: f64,
        radius: f64,
        image: ImagePayload,
    ) -> PendingCall<String> {
        match augment_geo_call(lat, lon, radius, image) {
            Ok(call) => self.invoker.call_async(call),
            Err(e) => PendingCall::failed(e),
        }
    }

    /// The result of an augmentation started by any `augment_image*` call.
    pub fn augment_result(&self, img_id: &str) -> Result<AugmentResultResponse> {
        self.invoker.call_blocking(augment_result_call(img_id)?)
    }

    /// Async [`ArSites::augment_result`].
    pub fn augment_result_async(&self, img_id: &str) -> PendingCall<AugmentResultResponse> {
        match augment_result_call(img_id) {
            Ok(call) => self.invoker.call_async(call),
            Err(e) => PendingCall::failed(e),
        }
    }

    // === Calls ===

    fn get_existing_call(&self, id: &str) -> Result<Call<ArSite>> {
        require("site id", id)?;
        let invoker = self.invoker.clone();
        Ok(Call::get(
            paths::SITE_INFO,
            json_extractor(GET_FAILED, move |body: SiteInfoResponse| {
                let site = body
                    .site
                    .ok_or_else(|| Error::Domain(GET_FAILED.to_string()))?;
                // A site without an id cannot be addressed later.
                if site.id.is_empty() {
                    return Err(Error::Domain(GET_FAILED.to_string()));
                }
                Ok(ArSite::with_info(site, invoker.clone()))
            }),
        )
        .param("site", id))
    }

    fn near_call(&self, lat: f64, lon: f64, bounds: Option<(u32, f64)>) -> Call<Vec<ArSite>> {
        let invoker = self.invoker.clone();
        let call = Call::get(
            paths::NEARBY_SITES,
            json_extractor(NEARBY_FAILED, move |body: NearbySitesResponse| {
                Ok(body
                    .sites
                    .into_iter()
                    .map(|info| ArSite::with_info(info, invoker.clone()))
                    .collect())
            }),
        )
        .param("lat", lat)
        .param("lon", lon);

        match bounds {
            Some((max, radius)) => call.param("max", max).param("radius", radius),
            None => call.param("max", "").param("radius", ""),
        }
    }
}

fn ping_call() -> Call<()> {
    Call::get(paths::HEALTH_CHECK, |_| Ok(()))
}

fn create_full_call<T, F>(site: &NewSite, on_success: F) -> Result<Call<T>>
where
    T: 'static,
    F: Fn(BasicResponse) -> Result<T> + Send + Sync + 'static,
{
    require("site id", &site.id)?;
    Ok(
        Call::post(paths::ADD_SITE, json_extractor(CREATE_FAILED, on_success))
            .param("id", site.id.as_str())
            .param("name", site.name.as_str())
            .param("lon", site.lon)
            .param("lat", site.lat)
            .param("description", site.description.as_str())
            .param("feature", site.feature.as_str())
            .param("channel", site.channel.as_str()),
    )
}

fn create_minimal_call<T, F>(
    id: &str,
    description: &str,
    channel: &str,
    on_success: F,
) -> Result<Call<T>>
where
    T: 'static,
    F: Fn(BasicResponse) -> Result<T> + Send + Sync + 'static,
{
    require("site id", id)?;
    Ok(
        Call::post(paths::ADD_SITE, json_extractor(CREATE_FAILED, on_success))
            .param("id", id)
            .param("description", description)
            .param("channel", channel),
    )
}

fn augment_geo_call(lat: f64, lon: f64, radius: f64, image: ImagePayload) -> Result<Call<String>> {
    Ok(Call::post(
        paths::AUGMENT_IMAGE_GEO,
        json_extractor(AUGMENT_FAILED, |body: AugmentImageResponse| Ok(body.img_id)),
    )
    .param("lat", lat)
    .param("lon", lon)
    .param("radius", radius)
    .multipart(image.into_form()?))
}

fn augment_result_call(img_id: &str) -> Result<Call<AugmentResultResponse>> {
    require("image id", img_id)?;
    Ok(Call::get(
        paths::AUGMENT_IMAGE_RESULT,
        json_extractor::<AugmentResultResponse, _, _>(AUGMENT_RESULT_FAILED, Ok),
    )
    .param("imgId", img_id))
}

/// Reject empty identifiers before anything is sent.
pub(crate) fn require(what: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::validation(format!("{what} must not be empty")));
    }
    Ok(())
}
