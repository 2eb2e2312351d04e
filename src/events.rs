use crate::slot::SlotId;

/// Control surface of the player task.
#[derive(Debug)]
pub enum PlayerCommand {
    /// (Re)arm the rotation timer. Idempotent.
    Start,
    /// Cancel the rotation timer. No-op when not running.
    Stop,
    /// Jump to a specific (signed) catalog index.
    Show(i64),
}

/// Ask the loader to stage a reference that was just routed to a slot.
#[derive(Debug)]
pub struct StageImage {
    pub slot: SlotId,
    pub reference: String,
}

/// Loader verdict: the staged reference could not be read or decoded.
#[derive(Debug)]
pub struct StageFailed {
    pub slot: SlotId,
    pub reference: String,
}
