use docqa_core::{AnswerView, AppViewModel, BackendStatus, ButtonView, Notice, TurnView};

pub fn render(view: &AppViewModel) -> Vec<String> {
    let mut lines = Vec::new();

    let file = view
        .selected_filename
        .as_deref()
        .unwrap_or("(no file selected)");
    lines.push(format!("Document: {file}"));
    if view.indexed_documents.is_empty() {
        lines.push("Indexed documents: (none yet)".to_string());
    } else {
        lines.push(format!(
            "Indexed documents: {}",
            view.indexed_documents.join(", ")
        ));
    }
    lines.push(format!(
        "{}  {}  {}",
        button(&view.upload_button),
        button(&view.ask_button),
        button(&ButtonView {
            label: "Cancel",
            enabled: view.cancel_enabled,
        }),
    ));

    if !view.upload_status.is_empty() {
        lines.push(view.upload_status.clone());
    }
    if !view.query_text.is_empty() {
        lines.push(format!("Question: {}", view.query_text));
    }

    if let Some(answer) = &view.answer {
        lines.push("Answer:".to_string());
        push_answer(&mut lines, answer);
    }

    if let Some(status) = &view.backend_status {
        lines.push(match status {
            BackendStatus::Online(text) => format!("Backend: online ({text})"),
            BackendStatus::Unreachable(detail) => format!("Backend: unreachable ({detail})"),
        });
    }

    lines
}

/// Earlier turns, oldest first.
pub fn render_history(history: &[TurnView]) -> Vec<String> {
    if history.is_empty() {
        return vec!["No questions asked yet.".to_string()];
    }
    let mut lines = Vec::new();
    for (n, turn) in history.iter().enumerate() {
        lines.push(format!("Q{}: {}", n + 1, turn.question));
        push_answer(&mut lines, &turn.answer);
    }
    lines
}

fn push_answer(lines: &mut Vec<String>, answer: &AnswerView) {
    lines.push(format!("  {}", answer.answer));
    if let Some(sources) = &answer.sources_line {
        lines.push(format!("  {sources}"));
        if let Some(pages) = &answer.pages_line {
            lines.push(format!("  {pages}"));
        }
    }
}

pub fn render_notice(notice: Notice) -> String {
    format!("! {notice}")
}

fn button(view: &ButtonView) -> String {
    if view.enabled {
        format!("[{}]", view.label)
    } else {
        format!("({} - disabled)", view.label)
    }
}
