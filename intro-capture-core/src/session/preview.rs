use uuid::Uuid;

/// What a preview handle shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PreviewTarget {
    /// The live camera stream with this id.
    LiveStream(String),
    /// A recorded or uploaded file, identified by its checksum.
    Asset(String),
}

/// An in-memory preview handle the UI binds to a player.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewHandle {
    pub url: String,
    pub target: PreviewTarget,
}

/// Tracks preview handles so at most one is live at a time.
///
/// Creating a handle revokes the previous one; `revoke_all` runs on teardown.
#[derive(Debug, Default)]
pub struct PreviewRegistry {
    current: Option<PreviewHandle>,
    created: u64,
    revoked: u64,
}

impl PreviewRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(&mut self, target: PreviewTarget) -> PreviewHandle {
        self.revoke_all();
        let handle = PreviewHandle {
            url: format!("preview://{}", Uuid::new_v4()),
            target,
        };
        log::debug!("Created preview {} for {:?}", handle.url, handle.target);
        self.created += 1;
        self.current = Some(handle.clone());
        handle
    }

    pub fn current(&self) -> Option<&PreviewHandle> {
        self.current.as_ref()
    }

    pub fn revoke_all(&mut self) {
        if let Some(handle) = self.current.take() {
            log::debug!("Revoked preview {}", handle.url);
            self.revoked += 1;
        }
    }

    /// Handles created but not yet revoked.
    pub fn live_count(&self) -> u64 {
        self.created - self.revoked
    }

    pub fn created_total(&self) -> u64 {
        self.created
    }
}
