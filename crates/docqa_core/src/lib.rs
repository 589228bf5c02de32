//! Docqa core: pure state machine and view-model helpers.
mod effect;
mod msg;
mod state;
mod update;
mod view_model;

pub use effect::{Effect, Notice};
pub use msg::Msg;
pub use state::{
    AppState, BackendStatus, ChatTurn, PageRef, QueryResult, RequestId, SelectedFile,
    UploadReceipt, HISTORY_LIMIT,
};
pub use update::update;
pub use view_model::{AnswerView, AppViewModel, ButtonView, TurnView};
