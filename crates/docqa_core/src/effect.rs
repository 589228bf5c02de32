use std::fmt;

use crate::{RequestId, SelectedFile};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Show a blocking notice to the user. No request is issued.
    Notify(Notice),
    Upload {
        request_id: RequestId,
        file: SelectedFile,
    },
    Query {
        request_id: RequestId,
        query: String,
    },
    DeleteDocument {
        request_id: RequestId,
        filename: String,
    },
    Cancel {
        request_id: RequestId,
    },
    CheckHealth,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    NoFileSelected,
    EmptyQuery,
    /// Removal requested for a name that is not in the indexed list.
    UnknownDocument(String),
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::NoFileSelected => write!(f, "Please select a file first!"),
            Notice::EmptyQuery => write!(f, "Please enter a question!"),
            Notice::UnknownDocument(name) => write!(f, "{name} is not an indexed document."),
        }
    }
}
