//! Display slots and the surface that owns them.
//!
//! A slot remembers the URL it most recently requested. Completions for any
//! other URL are dropped on arrival, so a slow superseded request can never
//! replace the image of a newer one.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, trace};

use crate::domain::entities::{ImageStatus, LoadedImage, SlotId};
use crate::infrastructure::image::{ImageLoadedEvent, ImageLoader, RequestHandle, RequestOutcome};

/// One visual position that shows at most one image.
pub struct ImageSlot {
    id: SlotId,
    url: Option<String>,
    image: Option<Arc<image::DynamicImage>>,
    status: ImageStatus,
    pending: Option<RequestHandle>,
}

impl ImageSlot {
    /// Creates an empty slot.
    #[must_use]
    pub const fn new(id: SlotId) -> Self {
        Self {
            id,
            url: None,
            image: None,
            status: ImageStatus::Idle,
            pending: None,
        }
    }

    /// Starts showing `url`. `None` leaves the slot untouched.
    ///
    /// The previous image is cleared and any in-flight request is cancelled.
    /// A memory hit is shown before this returns.
    pub fn load(&mut self, loader: &ImageLoader, url: Option<&str>) {
        let Some(url) = url else {
            return;
        };

        self.cancel_pending();
        self.url = Some(url.to_string());
        self.image = None;

        match loader.request(self.id, url) {
            RequestOutcome::Ready(loaded) => self.show(loaded),
            RequestOutcome::Pending(handle) => {
                self.status = ImageStatus::Loading;
                self.pending = Some(handle);
            }
        }
    }

    /// Applies a completion. Returns false if it was for a superseded URL.
    pub fn apply(&mut self, event: ImageLoadedEvent) -> bool {
        if self.url.as_deref() != Some(event.url.as_str()) {
            trace!(
                slot = %self.id,
                stale = %event.url,
                latest = ?self.url,
                "Discarding stale image completion"
            );
            return false;
        }

        self.pending = None;
        match event.image {
            Some(loaded) => self.show(loaded),
            None => {
                self.image = None;
                self.status = ImageStatus::Unavailable;
            }
        }
        true
    }

    fn show(&mut self, loaded: LoadedImage) {
        trace!(slot = %self.id, url = %loaded.url, source = %loaded.source, "Showing image");
        self.image = Some(loaded.image);
        self.status = ImageStatus::Ready;
    }

    fn cancel_pending(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.cancel();
        }
    }

    /// Slot identifier.
    #[must_use]
    pub const fn id(&self) -> SlotId {
        self.id
    }

    /// Most recently requested URL.
    #[must_use]
    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    /// Image currently shown.
    #[must_use]
    pub const fn image(&self) -> Option<&Arc<image::DynamicImage>> {
        self.image.as_ref()
    }

    /// Current status.
    #[must_use]
    pub const fn status(&self) -> ImageStatus {
        self.status
    }

    /// True when an image is shown.
    #[must_use]
    pub const fn is_ready(&self) -> bool {
        self.image.is_some() && self.status.is_ready()
    }

    /// True while a request is outstanding.
    #[must_use]
    pub const fn is_loading(&self) -> bool {
        self.status.is_loading()
    }
}

impl std::fmt::Debug for ImageSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageSlot")
            .field("id", &self.id)
            .field("url", &self.url)
            .field("has_image", &self.image.is_some())
            .field("status", &self.status)
            .finish_non_exhaustive()
    }
}

/// Owns slots and applies loader completions to them.
///
/// All mutation happens on the task that owns the surface, which plays the
/// role of the UI thread.
pub struct DisplaySurface {
    loader: ImageLoader,
    events: mpsc::UnboundedReceiver<ImageLoadedEvent>,
    slots: HashMap<SlotId, ImageSlot>,
    next_slot: u64,
}

impl DisplaySurface {
    /// Creates a surface fed by the receiving half of the loader's event channel.
    #[must_use]
    pub fn new(loader: ImageLoader, events: mpsc::UnboundedReceiver<ImageLoadedEvent>) -> Self {
        Self {
            loader,
            events,
            slots: HashMap::new(),
            next_slot: 0,
        }
    }

    /// Adds an empty slot.
    pub fn add_slot(&mut self) -> SlotId {
        let id = SlotId::new(self.next_slot);
        self.next_slot += 1;
        self.slots.insert(id, ImageSlot::new(id));
        id
    }

    /// Removes a slot, cancelling its in-flight request.
    pub fn remove_slot(&mut self, id: SlotId) -> Option<ImageSlot> {
        let mut slot = self.slots.remove(&id)?;
        slot.cancel_pending();
        Some(slot)
    }

    /// Returns a slot by id.
    #[must_use]
    pub fn slot(&self, id: SlotId) -> Option<&ImageSlot> {
        self.slots.get(&id)
    }

    /// Number of slots.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Returns true if the surface has no slots.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Requests `url` on a slot. Returns false if the slot does not exist.
    pub fn load(&mut self, id: SlotId, url: Option<&str>) -> bool {
        let Some(slot) = self.slots.get_mut(&id) else {
            return false;
        };
        slot.load(&self.loader, url);
        true
    }

    /// Routes a completion to its slot. Returns true if it was applied.
    pub fn apply(&mut self, event: ImageLoadedEvent) -> bool {
        match self.slots.get_mut(&event.slot) {
            Some(slot) => slot.apply(event),
            None => {
                debug!(slot = %event.slot, "Completion for removed slot");
                false
            }
        }
    }

    /// Applies every completion already queued. Returns how many were applied.
    pub fn drain(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(event) = self.events.try_recv() {
            if self.apply(event) {
                applied += 1;
            }
        }
        applied
    }

    /// Waits for the next completion and applies it.
    /// Returns `None` once the channel is closed.
    pub async fn next_event(&mut self) -> Option<bool> {
        let event = self.events.recv().await?;
        Some(self.apply(event))
    }

    /// Processes completions until the slot is no longer loading.
    /// Returns `None` for an unknown slot.
    pub async fn settle(&mut self, id: SlotId) -> Option<ImageStatus> {
        loop {
            let slot = self.slots.get(&id)?;
            if !slot.is_loading() {
                return Some(slot.status());
            }
            if self.next_event().await.is_none() {
                return self.slots.get(&id).map(ImageSlot::status);
            }
        }
    }
}

impl std::fmt::Debug for DisplaySurface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DisplaySurface")
            .field("slots", &self.slots.len())
            .finish_non_exhaustive()
    }
}
