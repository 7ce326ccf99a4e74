//! Common imports for quick starts.

// Common
pub use crate::{BuildError, Error, Result};

// Transport
pub use crate::{Client, ClientBuilder};

// Sites and their content
pub use crate::{ArSite, ArSites, NewOverlay, NewSite};
pub use crate::payloads::{ImagePayload, OverlayInfo, SiteInfo};

// Asynchronous forms
pub use crate::{ArListener, ArResponse, PendingCall, listener};
