use std::sync::Once;

use docqa_core::{update, AppState, Effect, Msg, Notice, SelectedFile, UploadReceipt};
use pretty_assertions::assert_eq;

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(docqa_logging::initialize_for_tests);
}

fn report_pdf() -> SelectedFile {
    SelectedFile::new(
        "report.pdf",
        Some("application/pdf".to_string()),
        b"%PDF-1.4".to_vec(),
    )
}

fn select(state: AppState, file: SelectedFile) -> AppState {
    update(state, Msg::FileSelected(file)).0
}

fn start_upload(state: AppState) -> (AppState, u64) {
    let (state, effects) = update(state, Msg::UploadClicked);
    let request_id = match effects.as_slice() {
        [Effect::Upload { request_id, .. }] => *request_id,
        other => panic!("expected a single upload effect, got {other:?}"),
    };
    (state, request_id)
}

#[test]
fn upload_without_file_only_notifies() {
    init_logging();
    let mut state = AppState::new();
    let before = state.upload_status().to_string();

    let (mut next, effects) = update(state.clone(), Msg::UploadClicked);

    assert_eq!(effects, vec![Effect::Notify(Notice::NoFileSelected)]);
    assert_eq!(next.upload_status(), before);
    assert!(!next.is_busy());
    assert!(!next.consume_dirty());
    assert!(!state.consume_dirty());
}

#[test]
fn notice_texts_match_prompts() {
    assert_eq!(Notice::NoFileSelected.to_string(), "Please select a file first!");
    assert_eq!(Notice::EmptyQuery.to_string(), "Please enter a question!");
}

#[test]
fn upload_marks_busy_and_emits_request() {
    init_logging();
    let state = select(AppState::new(), report_pdf());

    let (state, effects) = update(state, Msg::UploadClicked);

    assert_eq!(
        effects,
        vec![Effect::Upload {
            request_id: 1,
            file: report_pdf(),
        }]
    );
    assert!(state.is_busy());
    assert_eq!(state.upload_status(), "Uploading and processing...");
    assert_eq!(state.upload_in_flight(), Some(1));
}

#[test]
fn successful_upload_formats_status_and_releases_busy() {
    init_logging();
    let state = select(AppState::new(), report_pdf());
    let (state, request_id) = start_upload(state);

    let (state, effects) = update(
        state,
        Msg::UploadFinished {
            request_id,
            result: Ok(UploadReceipt {
                filename: "report.pdf".to_string(),
                message: "3 chunks indexed".to_string(),
            }),
        },
    );

    assert!(effects.is_empty());
    assert_eq!(
        state.upload_status(),
        "✅ report.pdf uploaded successfully (3 chunks indexed)"
    );
    assert!(!state.is_busy());
}

#[test]
fn failed_upload_shows_detail_and_releases_busy() {
    init_logging();
    let state = select(AppState::new(), report_pdf());
    let (state, request_id) = start_upload(state);

    let (state, _) = update(
        state,
        Msg::UploadFinished {
            request_id,
            result: Err("file too large".to_string()),
        },
    );

    assert_eq!(state.upload_status(), "❌ Error: file too large");
    assert!(state.upload_status().starts_with("❌"));
    assert!(!state.is_busy());
}

#[test]
fn selecting_a_file_clears_status_and_answer() {
    init_logging();
    let state = select(AppState::new(), report_pdf());
    let (state, request_id) = start_upload(state);
    let (state, _) = update(
        state,
        Msg::UploadFinished {
            request_id,
            result: Err("boom".to_string()),
        },
    );
    let (state, _) = update(state, Msg::QueryTextChanged("anything?".to_string()));
    let (state, effects) = update(state, Msg::QueryClicked);
    let query_id = match effects.as_slice() {
        [Effect::Query { request_id, .. }] => *request_id,
        other => panic!("expected a query effect, got {other:?}"),
    };
    let (state, _) = update(
        state,
        Msg::QueryFinished {
            request_id: query_id,
            result: Err("index not found".to_string()),
        },
    );
    assert!(state.query_result().is_some());

    let other = SelectedFile::new("notes.txt", Some("text/plain".to_string()), b"hi".to_vec());
    let state = select(state, other);

    assert_eq!(state.upload_status(), "");
    assert!(state.query_result().is_none());
    assert_eq!(state.selected_file().map(|f| f.filename.as_str()), Some("notes.txt"));
}

#[test]
fn second_upload_click_while_in_flight_is_ignored() {
    init_logging();
    let state = select(AppState::new(), report_pdf());
    let (state, _) = start_upload(state);

    let (state, effects) = update(state, Msg::UploadClicked);

    assert!(effects.is_empty());
    assert_eq!(state.upload_in_flight(), Some(1));
}

#[test]
fn request_ids_are_monotonic_across_uploads() {
    init_logging();
    let state = select(AppState::new(), report_pdf());
    let (state, first) = start_upload(state);
    let (state, _) = update(
        state,
        Msg::UploadFinished {
            request_id: first,
            result: Err("nope".to_string()),
        },
    );
    let (_state, second) = start_upload(state);

    assert!(second > first);
}
