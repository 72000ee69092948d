use std::fs;
use std::io::{self, BufRead, Write};

use anyhow::{Context, Result};
use outreach_core::{update, AppState, Effect, Msg};
use outreach_engine::EngineHandle;
use outreach_logging::{outreach_info, outreach_warn};

use super::command::{self, Command, HELP};
use super::effects::EffectRunner;
use super::render::{progress_line, render, render_notice};
use crate::config::AppConfig;

pub fn run(config: &AppConfig) -> Result<()> {
    let engine = EngineHandle::new(config.webhook_settings(), config.endpoints())
        .context("starting the webhook client")?;
    let runner = EffectRunner::new(engine, config.export_dir.clone());
    let state = AppState::with_compose_defaults(&config.default_subject, &config.default_body);
    let mut shell = Shell { state, runner };

    let stdin = io::stdin();
    let mut out = io::stdout();
    shell.serve(stdin.lock(), &mut out)?;
    outreach_info!("Shell closed");
    Ok(())
}

struct Shell {
    state: AppState,
    runner: EffectRunner,
}

impl Shell {
    /// Reads commands until end of input or `quit`. A line that is not
    /// valid UTF-8 is reported and skipped.
    fn serve(&mut self, mut input: impl BufRead, out: &mut dyn Write) -> io::Result<()> {
        writeln!(out, "Outreach workflow. Type 'help' for commands.")?;
        writeln!(out, "{}", render(&self.state.view()))?;

        let mut buf = Vec::new();
        loop {
            buf.clear();
            if input.read_until(b'\n', &mut buf)? == 0 {
                return Ok(());
            }
            let line = match std::str::from_utf8(&buf) {
                Ok(line) => line,
                Err(err) => {
                    outreach_warn!("Ignoring input line that is not UTF-8: {}", err);
                    writeln!(out, "That line is not valid UTF-8 and was ignored.")?;
                    continue;
                }
            };
            let command = match command::parse(line) {
                Ok(command) => command,
                Err(message) => {
                    writeln!(out, "{message}")?;
                    continue;
                }
            };
            if !self.handle(command, out)? {
                return Ok(());
            }
            out.flush()?;
        }
    }

    /// Returns `false` when the user asked to quit.
    fn handle(&mut self, command: Command, out: &mut dyn Write) -> io::Result<bool> {
        let msg = match command {
            Command::Msg(msg) => msg,
            Command::Subject(subject) => Msg::ComposeEdited {
                subject,
                body_template: self.state.compose().body_template.clone(),
            },
            Command::Body(body_template) => Msg::ComposeEdited {
                subject: self.state.compose().subject.clone(),
                body_template,
            },
            Command::Load(path) => match fs::read_to_string(&path) {
                Ok(text) => Msg::JsonPasted(text),
                Err(err) => {
                    outreach_warn!("Cannot read {:?}: {}", path, err);
                    writeln!(out, "Cannot read {}: {err}", path.display())?;
                    return Ok(true);
                }
            },
            Command::Show => {
                writeln!(out, "{}", render(&self.state.view()))?;
                return Ok(true);
            }
            Command::Help => {
                writeln!(out, "{HELP}")?;
                return Ok(true);
            }
            Command::Quit => return Ok(false),
        };

        self.dispatch(msg, out)?;
        if self.state.consume_dirty() {
            writeln!(out, "{}", render(&self.state.view()))?;
        }
        Ok(true)
    }

    /// Applies `msg` and runs every effect it leads to, one after another.
    fn dispatch(&mut self, msg: Msg, out: &mut dyn Write) -> io::Result<()> {
        let mut effects = step(&mut self.state, msg, out)?;
        while !effects.is_empty() {
            let mut follow_ups = Vec::new();
            for effect in effects {
                let mut failure = None;
                let state = &mut self.state;
                self.runner.run(effect, &mut |msg: Msg| {
                    if failure.is_some() {
                        return;
                    }
                    match step(state, msg, out) {
                        Ok(more) => follow_ups.extend(more),
                        Err(err) => failure = Some(err),
                    }
                });
                if let Some(err) = failure {
                    return Err(err);
                }
            }
            effects = follow_ups;
        }
        Ok(())
    }
}

fn step(state: &mut AppState, msg: Msg, out: &mut dyn Write) -> io::Result<Vec<Effect>> {
    let is_progress = matches!(msg, Msg::BatchProgress { .. });
    let (next, effects) = update(std::mem::take(state), msg);
    *state = next;

    if is_progress {
        if let Some(progress) = state.progress() {
            writeln!(out, "{}", progress_line(progress))?;
        }
    }
    for notice in state.take_notices() {
        writeln!(out, "{}", render_notice(&notice))?;
    }
    Ok(effects)
}
