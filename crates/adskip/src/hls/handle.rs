// Single-slot store for cleaned playlist bodies.
//
// At most one body is resident: installing a new one revokes the previous
// handle and drops its bytes.

use bytes::Bytes;
use parking_lot::Mutex;
use tracing::trace;
use uuid::Uuid;

use crate::config::PLAYLIST_MIME_TYPE;

const HANDLE_SCHEME: &str = "blob:adskip/";

/// Revocable reference to a cleaned playlist body, usable as a video source.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CleanedResourceHandle {
    url: String,
}

impl CleanedResourceHandle {
    fn generate() -> Self {
        Self {
            url: format!("{HANDLE_SCHEME}{}", Uuid::new_v4()),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn mime_type(&self) -> &'static str {
        PLAYLIST_MIME_TYPE
    }

    /// Returns `true` if the URL was minted by a [`HandleSlot`].
    pub fn is_handle_url(url: &str) -> bool {
        url.starts_with(HANDLE_SCHEME)
    }
}

impl std::fmt::Display for CleanedResourceHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.url)
    }
}

struct Resident {
    handle: CleanedResourceHandle,
    body: Bytes,
}

#[derive(Default)]
pub struct HandleSlot {
    current: Mutex<Option<Resident>>,
}

impl HandleSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install `body` under a fresh handle, revoking the one it replaces.
    pub fn install(&self, body: impl Into<Bytes>) -> CleanedResourceHandle {
        let handle = CleanedResourceHandle::generate();
        let resident = Resident {
            handle: handle.clone(),
            body: body.into(),
        };
        let previous = self.current.lock().replace(resident);
        if let Some(previous) = previous {
            trace!(
                revoked = %previous.handle,
                bytes = previous.body.len(),
                "Revoked previous cleaned playlist"
            );
        }
        handle
    }

    /// Body behind `url`, if it names the live handle.
    pub fn resolve(&self, url: &str) -> Option<Bytes> {
        self.current
            .lock()
            .as_ref()
            .filter(|resident| resident.handle.url == url)
            .map(|resident| resident.body.clone())
    }

    pub fn current(&self) -> Option<CleanedResourceHandle> {
        self.current.lock().as_ref().map(|r| r.handle.clone())
    }

    /// Revoke the live handle, if any.
    pub fn release(&self) -> Option<CleanedResourceHandle> {
        self.current.lock().take().map(|r| r.handle)
    }
}

impl std::fmt::Debug for HandleSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandleSlot")
            .field("current", &self.current())
            .finish()
    }
}
