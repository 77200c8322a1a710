//! What happens when the user is caught looking at the camera.

use anyhow::{bail, Result};
use colored::*;
use serde::{Deserialize, Serialize};
use std::io::{self, BufRead, Write};

use crate::types::Point2D;

/// Details handed to a notifier on a match.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GazeMatch {
    pub frame: u64,
    pub left: Point2D,
    pub right: Point2D,
}

/// Called synchronously from the detection loop. The loop does not continue
/// until `notify` returns.
pub trait Notifier {
    fn notify(&mut self, event: &GazeMatch) -> Result<()>;
}

impl<T: Notifier + ?Sized> Notifier for Box<T> {
    fn notify(&mut self, event: &GazeMatch) -> Result<()> {
        (**self).notify(event)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotifyPolicy {
    /// Every matching frame notifies, so a held gaze repeats.
    #[default]
    EveryFrame,
    /// First matching frame of each unbroken run notifies.
    OncePerEpisode,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotifyMode {
    #[default]
    Console,
    Prompt,
}

pub struct ConsoleNotifier {
    message: String,
    bell: bool,
}

impl ConsoleNotifier {
    pub fn new(message: impl Into<String>, bell: bool) -> Self {
        Self { message: message.into(), bell }
    }
}

impl Notifier for ConsoleNotifier {
    fn notify(&mut self, event: &GazeMatch) -> Result<()> {
        let mut out = io::stdout().lock();
        if self.bell {
            write!(out, "\x07")?;
        }
        writeln!(out, "{} {}", format!("[frame {}]", event.frame).dimmed(), self.message.green().bold())?;
        out.flush()?;
        Ok(())
    }
}

/// Blocks like a modal alert until Enter is pressed.
pub struct PromptNotifier<R> {
    message: String,
    input: R,
}

impl PromptNotifier<io::StdinLock<'static>> {
    pub fn stdin(message: impl Into<String>) -> Self {
        Self::new(message, io::stdin().lock())
    }
}

impl<R: BufRead> PromptNotifier<R> {
    pub fn new(message: impl Into<String>, input: R) -> Self {
        Self { message: message.into(), input }
    }
}

impl<R: BufRead> Notifier for PromptNotifier<R> {
    fn notify(&mut self, _event: &GazeMatch) -> Result<()> {
        {
            let mut out = io::stdout().lock();
            writeln!(out, "{}", self.message.yellow().bold())?;
            write!(out, "{}", "Press Enter to continue...".dimmed())?;
            out.flush()?;
        }
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            bail!("input closed while waiting for acknowledgement");
        }
        Ok(())
    }
}
