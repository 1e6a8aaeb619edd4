//! Progress spinner shown while waiting on the model.

use crossterm::cursor::MoveToColumn;
use crossterm::queue;
use crossterm::style::{Color, Print, PrintStyledContent, Stylize};
use crossterm::terminal::{Clear, ClearType};
use std::future::Future;
use std::io::{self, Write};
use std::time::Duration;
use tracing::{debug, warn};

const FRAMES: [&str; 10] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];
const TICK: Duration = Duration::from_millis(80);

pub struct Spinner {
    message: String,
    color: Color,
    frame: usize,
    /// Draw frames; when false the spinner only waits.
    animate: bool,
}

impl Spinner {
    pub fn new(message: impl Into<String>, color: Color, animate: bool) -> Self {
        Self {
            message: message.into(),
            color,
            frame: 0,
            animate,
        }
    }

    fn tick<W: Write>(&mut self, out: &mut W) -> io::Result<()> {
        if !self.animate {
            return Ok(());
        }
        let frame = FRAMES[self.frame % FRAMES.len()];
        self.frame += 1;
        queue!(
            out,
            MoveToColumn(0),
            Clear(ClearType::CurrentLine),
            PrintStyledContent(frame.with(self.color)),
            Print(" "),
            Print(&self.message)
        )?;
        out.flush()
    }

    fn clear<W: Write>(&self, out: &mut W) -> io::Result<()> {
        if !self.animate || self.frame == 0 {
            return Ok(());
        }
        queue!(out, MoveToColumn(0), Clear(ClearType::CurrentLine))?;
        out.flush()
    }

    /// Await `task` while animating. Returns `None` if Ctrl+C arrives first;
    /// the task is dropped in that case.
    pub async fn run<W, F, T>(mut self, out: &mut W, task: F) -> io::Result<Option<T>>
    where
        W: Write,
        F: Future<Output = T>,
    {
        tokio::pin!(task);
        let interrupt = tokio::signal::ctrl_c();
        tokio::pin!(interrupt);
        let mut interrupt_armed = true;
        let mut ticker = tokio::time::interval(TICK);

        loop {
            tokio::select! {
                biased;
                result = &mut task => {
                    self.clear(out)?;
                    return Ok(Some(result));
                }
                signal = &mut interrupt, if interrupt_armed => match signal {
                    Ok(()) => {
                        debug!("interrupted while waiting");
                        self.clear(out)?;
                        return Ok(None);
                    }
                    Err(err) => {
                        warn!(%err, "could not listen for Ctrl+C");
                        interrupt_armed = false;
                    }
                },
                _ = ticker.tick() => self.tick(out)?,
            }
        }
    }
}
