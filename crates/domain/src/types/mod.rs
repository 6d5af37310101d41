//! Domain types and models

pub mod connectivity;
pub mod notification;
pub mod operation;
pub mod sync;

pub use connectivity::{ConnectivitySignal, ConnectivityState, Reachability};
pub use notification::{Notification, NotificationKind, Severity};
pub use operation::{
    AttachmentPayload, CategoryPayload, EntityType, EntryPayload, OperationId, OperationInput,
    OperationKind, OperationPayload, OperationRecord, QueuedOperation,
};
pub use sync::{
    EngineState, PermanentFailure, QueueStats, SyncOutcome, SyncReport, SyncStatus, SyncSummary,
    SyncTrigger,
};
