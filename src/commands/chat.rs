use std::future::Future;
use std::io::Write;
use std::path::Path;

use tokio::io::{AsyncBufRead, AsyncBufReadExt};

use crate::config::AppConfig;
use crate::session::{SessionFile, TurnPhase};

use super::{CommandError, build_orchestrator};

const BANNER: &str =
    "Describe your product idea. /prd shows the document, /reset starts over, /quit exits.";

/// Line-oriented chat loop: every input line is one turn. The session file
/// is saved after each turn, including failed ones.
pub async fn run<R>(
    config: &AppConfig,
    path: &Path,
    resume: bool,
    force: bool,
    input: R,
    out: &mut impl Write,
) -> Result<(), CommandError>
where
    R: AsyncBufRead + Unpin,
{
    run_until_interrupted(config, path, resume, force, input, out, tokio::signal::ctrl_c).await
}

/// [`run`] with the interrupt source supplied by the caller. Each prompt and
/// each turn waits on a fresh `interrupt()` future: firing at the prompt ends
/// the session, firing during a turn cancels just that turn.
pub async fn run_until_interrupted<R, I, F>(
    config: &AppConfig,
    path: &Path,
    resume: bool,
    force: bool,
    input: R,
    out: &mut impl Write,
    mut interrupt: I,
) -> Result<(), CommandError>
where
    R: AsyncBufRead + Unpin,
    I: FnMut() -> F,
    F: Future<Output = std::io::Result<()>>,
{
    let orchestrator = build_orchestrator(config)?;
    let mut session = SessionFile::load_or_create(path, resume, force)?;

    writeln!(out, "PRD builder ({} adapter)", orchestrator.adapter_name())?;
    if !session.state.is_fresh() {
        writeln!(
            out,
            "Resuming session {} after {} turn(s)",
            session.state.id, session.state.turn_count
        )?;
    }
    writeln!(out, "{}", BANNER)?;

    let mut lines = input.lines();
    loop {
        write!(out, "> ")?;
        out.flush()?;

        let next = tokio::select! {
            biased;
            _ = interrupt() => None,
            line = lines.next_line() => Some(line?),
        };
        let line = match next {
            Some(Some(line)) => line,
            Some(None) => break,
            None => {
                writeln!(out)?;
                break;
            }
        };
        let line = line.trim();

        match line {
            "" => continue,
            "/quit" | "/exit" => break,
            "/prd" => {
                writeln!(out, "{}", serde_json::to_string_pretty(&session.state.prd)?)?;
                continue;
            }
            "/reset" => {
                session.state.reset();
                session.save()?;
                writeln!(out, "Started over with an empty PRD.")?;
                continue;
            }
            _ => {}
        }

        // Ctrl+C drops the turn future; nothing is merged in that case
        let turn = tokio::select! {
            biased;
            _ = interrupt() => None,
            result = orchestrator.run_turn(&mut session.state, line) => Some(result),
        };

        match turn {
            Some(Ok(outcome)) => {
                writeln!(out, "{}", outcome.assistant_text)?;
                for question in outcome
                    .questions
                    .iter()
                    .filter(|q| !outcome.assistant_text.contains(q.as_str()))
                {
                    writeln!(out, "  ? {}", question)?;
                }
                if outcome.complete {
                    writeln!(out, "(PRD complete: type /prd to review it)")?;
                }
            }
            Some(Err(err)) if err.is_retryable() => {
                writeln!(
                    out,
                    "Something went wrong: {}. Your message was kept; send it again to retry.",
                    err
                )?;
            }
            Some(Err(err)) => writeln!(out, "{}", err)?,
            None => {
                session.state.set_phase(TurnPhase::Idle);
                writeln!(out, "Turn cancelled; the PRD was not changed.")?;
            }
        }

        session.save()?;
    }

    session.save()?;
    writeln!(out, "Session saved to {}", path.display())?;
    Ok(())
}
