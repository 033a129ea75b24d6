use crate::models::error::CaptureError;
use crate::models::media::MediaAsset;
use crate::models::state::CaptureState;

/// Event delegate for capture controller notifications.
///
/// Called on whichever thread drives the controller. Implementations should
/// marshal to the UI thread if needed.
pub trait CaptureDelegate: Send + Sync {
    /// Called when the controller state changes.
    fn on_state_changed(&self, state: &CaptureState);

    /// Called once per elapsed countdown second, with the seconds left.
    fn on_countdown(&self, remaining: u32) {
        let _ = remaining;
    }

    /// Called when an error is surfaced or a stage degrades.
    fn on_error(&self, error: &CaptureError);

    /// Called when a processed asset is ready for review.
    fn on_asset_ready(&self, asset: &MediaAsset);
}
