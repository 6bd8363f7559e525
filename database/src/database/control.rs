use num_format::{Locale, ToFormattedString};

use super::{
    commands::{Control, ControlResponse},
    database::Database,
};

pub enum DatabaseControlAction {
    Continue,
    Exit,
}

/// Runs control commands on behalf of one worker thread
pub struct ControlContext<'a> {
    pub thread_id: usize,
    pub database: &'a Database,
}

impl<'a> ControlContext<'a> {
    pub fn run(&self, control: Control) -> (DatabaseControlAction, ControlResponse) {
        match control {
            Control::Shutdown => (DatabaseControlAction::Exit, self.shutdown()),
            Control::SnapshotDatabase => (DatabaseControlAction::Continue, self.snapshot()),
            Control::ResetDatabase => (DatabaseControlAction::Continue, self.reset()),
        }
    }

    fn shutdown(&self) -> ControlResponse {
        // Everything this worker committed is made durable before it stops
        ControlResponse::from_result(
            self.database.persistence.transaction_wal.sync(),
            |_| format!("[Thread: {}] Successfully shut down worker thread", self.thread_id),
            |e| {
                format!(
                    "[Thread: {}] Shut down without syncing the transaction log: {}",
                    self.thread_id, e
                )
            },
        )
    }

    fn snapshot(&self) -> ControlResponse {
        ControlResponse::from_result(
            self.database.snapshot(),
            |flushed| {
                format!(
                    "[Thread: {}] Successfully snapshotted database, flushed {} transactions",
                    self.thread_id,
                    flushed.to_formatted_string(&Locale::en)
                )
            },
            |e| format!("[Thread: {}] Unable to snapshot database: {}", self.thread_id, e),
        )
    }

    fn reset(&self) -> ControlResponse {
        ControlResponse::from_result(
            self.database.reset(),
            |_| format!("[Thread: {}] Successfully reset database", self.thread_id),
            |e| format!("[Thread: {}] Unable to reset database: {}", self.thread_id, e),
        )
    }
}
