use std::io::{self, BufRead, Write};
use std::sync::mpsc;
use std::thread;

use anyhow::Context;
use clap::Parser;
use docqa_core::{update, AppState, Msg};
use docqa_engine::load_document;
use docqa_logging::{docqa_info, docqa_warn};

use super::config::{load_settings, Args};
use super::effects::{to_selected_file, EffectRunner};
use super::logging;
use super::ui::commands::{parse_line, Command, HELP};
use super::ui::render::{render, render_history, render_notice};

/// Everything the UI loop reacts to, in arrival order.
pub enum LoopEvent {
    Msg(Msg),
    Input(Command),
    InputClosed,
}

pub fn run_app() -> anyhow::Result<()> {
    let args = Args::parse();
    let settings = load_settings(&args).context("failed to load settings")?;
    logging::initialize(settings.log_destination, settings.log_level);
    docqa_info!("Starting docqa against {}", settings.origin);

    let (loop_tx, loop_rx) = mpsc::channel::<LoopEvent>();
    let runner = EffectRunner::new(settings.client_settings(), loop_tx.clone())
        .with_context(|| format!("cannot use backend origin {:?}", settings.origin))?;
    spawn_input_reader(loop_tx);

    let stdout = io::stdout();
    let mut out = stdout.lock();
    writeln!(out, "Document Q&A ({})", settings.origin)?;
    for line in HELP {
        writeln!(out, "{line}")?;
    }

    let mut app = App {
        state: AppState::new(),
        runner,
    };
    app.dispatch(Msg::HealthCheckRequested, &mut out)?;
    app.flush(&mut out)?;

    // Drain everything that queued up, then render once.
    while let Ok(first) = loop_rx.recv() {
        let mut flow = Flow::Continue;
        for event in std::iter::once(first).chain(loop_rx.try_iter()) {
            flow = app.handle(event, &mut out)?;
            if flow == Flow::Quit {
                break;
            }
        }
        if flow == Flow::Quit {
            break;
        }
        app.flush(&mut out)?;
    }

    docqa_info!("Shutting down");
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Quit,
}

struct App {
    state: AppState,
    runner: EffectRunner,
}

impl App {
    fn dispatch(&mut self, msg: Msg, out: &mut impl Write) -> io::Result<()> {
        let state = std::mem::take(&mut self.state);
        let (state, effects) = update(state, msg);
        self.state = state;
        for notice in self.runner.enqueue(effects) {
            writeln!(out, "{}", render_notice(notice))?;
        }
        Ok(())
    }

    fn handle(&mut self, event: LoopEvent, out: &mut impl Write) -> io::Result<Flow> {
        match event {
            LoopEvent::Msg(msg) => self.dispatch(msg, out)?,
            LoopEvent::Input(command) => match interpret(command) {
                Outcome::Dispatch(msgs) => {
                    for msg in msgs {
                        self.dispatch(msg, out)?;
                    }
                }
                Outcome::Print(lines) => {
                    for line in lines {
                        writeln!(out, "{line}")?;
                    }
                }
                Outcome::ShowHistory => {
                    for line in render_history(&self.state.view().history) {
                        writeln!(out, "{line}")?;
                    }
                }
                Outcome::Quit => return Ok(Flow::Quit),
            },
            LoopEvent::InputClosed => return Ok(Flow::Quit),
        }
        Ok(Flow::Continue)
    }

    fn flush(&mut self, out: &mut impl Write) -> io::Result<()> {
        if self.state.consume_dirty() {
            for line in render(&self.state.view()) {
                writeln!(out, "{line}")?;
            }
        }
        write!(out, "> ")?;
        out.flush()
    }
}

#[derive(Debug, PartialEq, Eq)]
enum Outcome {
    Dispatch(Vec<Msg>),
    Print(Vec<String>),
    ShowHistory,
    Quit,
}

/// Turns a console command into core messages. Only `open` touches the filesystem.
fn interpret(command: Command) -> Outcome {
    match command {
        Command::Open(path) => match load_document(&path) {
            Ok(document) => Outcome::Dispatch(vec![Msg::FileSelected(to_selected_file(document))]),
            Err(err) => {
                docqa_warn!("Rejected document {:?}: {}", path, err);
                Outcome::Print(vec![format!("! {err}")])
            }
        },
        Command::Text(text) => Outcome::Dispatch(vec![Msg::QueryTextChanged(text)]),
        Command::Ask(Some(text)) => {
            Outcome::Dispatch(vec![Msg::QueryTextChanged(text), Msg::QueryClicked])
        }
        Command::Ask(None) => Outcome::Dispatch(vec![Msg::QueryClicked]),
        Command::Upload => Outcome::Dispatch(vec![Msg::UploadClicked]),
        Command::Remove(name) => Outcome::Dispatch(vec![Msg::RemoveDocumentClicked(name)]),
        Command::History => Outcome::ShowHistory,
        Command::Cancel => Outcome::Dispatch(vec![Msg::CancelClicked]),
        Command::Health => Outcome::Dispatch(vec![Msg::HealthCheckRequested]),
        Command::Help => Outcome::Print(HELP.iter().map(|line| line.to_string()).collect()),
        Command::Quit => Outcome::Quit,
        Command::Empty => Outcome::Dispatch(Vec::new()),
        Command::Unknown(line) => {
            Outcome::Print(vec![format!("! Unknown command {line:?}; type 'help'")])
        }
    }
}

fn spawn_input_reader(tx: mpsc::Sender<LoopEvent>) {
    thread::spawn(move || {
        let stdin = io::stdin();
        for line in stdin.lock().lines() {
            match line {
                Ok(line) => {
                    if tx.send(LoopEvent::Input(parse_line(&line))).is_err() {
                        return;
                    }
                }
                Err(err) => {
                    docqa_warn!("Failed to read console input: {}", err);
                    break;
                }
            }
        }
        let _ = tx.send(LoopEvent::InputClosed);
    });
}
