use crate::{BackendStatus, ChatTurn, QueryResult};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppViewModel {
    pub selected_filename: Option<String>,
    pub query_text: String,
    pub upload_status: String,
    pub busy: bool,
    pub upload_button: ButtonView,
    pub ask_button: ButtonView,
    pub cancel_enabled: bool,
    pub answer: Option<AnswerView>,
    pub indexed_documents: Vec<String>,
    pub history: Vec<TurnView>,
    pub backend_status: Option<BackendStatus>,
    pub dirty: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ButtonView {
    pub label: &'static str,
    pub enabled: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerView {
    pub answer: String,
    /// `Source: a, b` when the backend named any sources.
    pub sources_line: Option<String>,
    /// `Pages: 2, 3`, only shown beneath a sources line.
    pub pages_line: Option<String>,
}

impl AnswerView {
    pub(crate) fn from_result(result: &QueryResult) -> Self {
        let sources_line = (!result.sources.is_empty())
            .then(|| format!("Source: {}", result.sources.join(", ")));
        let pages_line = (sources_line.is_some() && !result.pages.is_empty()).then(|| {
            let pages: Vec<String> = result.pages.iter().map(ToString::to_string).collect();
            format!("Pages: {}", pages.join(", "))
        });

        Self {
            answer: result.answer.clone(),
            sources_line,
            pages_line,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnView {
    pub question: String,
    pub answer: AnswerView,
}

impl TurnView {
    pub(crate) fn from_turn(turn: &ChatTurn) -> Self {
        Self {
            question: turn.question.clone(),
            answer: AnswerView::from_result(&turn.result),
        }
    }
}
