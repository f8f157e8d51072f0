use crate::SwapChainId;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum HmdError {
    #[error("session status query failed: {reason}")]
    SessionStatus { reason: String },

    #[error("eye pose query for frame {frame_index} failed: {reason}")]
    EyePoses { frame_index: u64, reason: String },

    #[error("texture swap chain creation failed: {reason}")]
    SwapChainCreate { reason: String },

    #[error("commit of texture swap chain {id:?} failed: {reason}")]
    Commit { id: SwapChainId, reason: String },

    #[error("submission of frame {frame_index} failed: {reason}")]
    Submit { frame_index: u64, reason: String },

    #[error("the display was lost")]
    DisplayLost,
}
