//! # Dispatch — Queue Session
//!
//! Classifies each case in a cases file into the priority queue, then
//! replays a command script against it. Without a script, the queue is
//! listed and drained in service order.
//!
//! ```bash
//! triage dispatch --cases arrivals.json
//! triage dispatch --cases arrivals.json --script session.txt
//! triage dispatch --script -          # commands from stdin
//! ```
//!
//! ## Script commands
//!
//! One per line; blank lines and `#` comments are ignored.
//!
//! | Command            | Effect                                         |
//! |--------------------|------------------------------------------------|
//! | `add <case-json>`  | classify and enqueue one case                  |
//! | `serve`            | serve the next case                            |
//! | `remove <ticket>`  | withdraw a queued case                         |
//! | `position <ticket>`| 1-based place in service order                 |
//! | `status`           | per-level counts and the queue in order        |

use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{anyhow, bail, Context, Result};
use clap::Args;
use serde::Serialize;

use triage_core::{CaseId, SeverityLevel, ThresholdNormalizer};
use triage_decision::DecisionFuser;
use triage_queue::{PriorityQueue, Ticket, TicketId};

use crate::case::CaseInput;
use crate::config::TriageConfig;

/// Arguments for `triage dispatch`.
#[derive(Args, Debug)]
pub struct DispatchArgs {
    /// JSON array of cases (`{name, vitals, facts}`) enqueued at start.
    #[arg(long)]
    pub cases: Option<PathBuf>,

    /// Command script; `-` reads stdin.
    #[arg(long)]
    pub script: Option<PathBuf>,

    /// Trained model file, overriding the configured one.
    #[arg(long)]
    pub model: Option<PathBuf>,
}

/// Queue payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueuedCase {
    /// Stable case identity.
    pub case_id: CaseId,
    /// Display name.
    pub name: String,
}

impl std::fmt::Display for QueuedCase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name)
    }
}

/// One parsed script line.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// `add <case-json>`
    Add(Box<CaseInput>),
    /// `serve` or `next`
    Serve,
    /// `remove <ticket>`
    Remove(TicketId),
    /// `position <ticket>`
    Position(TicketId),
    /// `status` or `list`
    Status,
}

impl FromStr for Command {
    type Err = anyhow::Error;

    fn from_str(line: &str) -> Result<Self> {
        let line = line.trim();
        let (verb, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
        let rest = rest.trim();
        let ticket = |rest: &str| -> Result<TicketId> {
            if rest.is_empty() {
                bail!("{verb}: missing ticket id");
            }
            rest.parse::<TicketId>().map_err(|e| anyhow!("{verb}: {e}"))
        };
        match verb.to_ascii_lowercase().as_str() {
            "add" => {
                let case: CaseInput =
                    serde_json::from_str(rest).context("add: invalid case JSON")?;
                Ok(Self::Add(Box::new(case)))
            }
            "serve" | "next" => Ok(Self::Serve),
            "remove" => Ok(Self::Remove(ticket(rest)?)),
            "position" => Ok(Self::Position(ticket(rest)?)),
            "status" | "list" => Ok(Self::Status),
            other => bail!("unknown command {other:?}"),
        }
    }
}

/// Fuser, normalizer, and queue for one session.
pub struct Session {
    fuser: DecisionFuser,
    normalizer: ThresholdNormalizer,
    queue: PriorityQueue<QueuedCase>,
    admitted: usize,
}

impl Session {
    /// Empty session.
    pub fn new(fuser: DecisionFuser, normalizer: ThresholdNormalizer) -> Self {
        Self {
            fuser,
            normalizer,
            queue: PriorityQueue::new(),
            admitted: 0,
        }
    }

    /// The session's queue.
    pub fn queue(&self) -> &PriorityQueue<QueuedCase> {
        &self.queue
    }

    /// Classify and enqueue one case.
    pub fn admit(&mut self, case: &CaseInput) -> Result<Ticket<QueuedCase>> {
        self.admitted += 1;
        let name = case
            .name
            .clone()
            .unwrap_or_else(|| format!("case {}", self.admitted));
        let facts = case.to_facts(&self.normalizer);
        let outcome = self
            .fuser
            .classify(&facts)
            .with_context(|| format!("cannot classify {name}"))?;
        let payload = QueuedCase {
            case_id: CaseId::new(),
            name,
        };
        Ok(self.queue.enqueue(outcome.severity, payload))
    }

    /// Apply one command, writing its report to `out`.
    pub fn apply(&mut self, command: &Command, out: &mut dyn Write) -> Result<()> {
        match command {
            Command::Add(case) => {
                let ticket = self.admit(case)?;
                writeln!(out, "queued {ticket}")?;
            }
            Command::Serve => match self.queue.serve_next() {
                Some(ticket) => writeln!(out, "serving {ticket}")?,
                None => writeln!(out, "queue empty")?,
            },
            Command::Remove(id) => match self.queue.remove(*id) {
                Some(ticket) => writeln!(out, "removed {ticket}")?,
                None => writeln!(out, "{id} is not queued")?,
            },
            Command::Position(id) => match self.queue.position(*id) {
                Some(pos) => writeln!(out, "{id} is at position {pos} of {}", self.queue.size())?,
                None => writeln!(out, "{id} is not queued")?,
            },
            Command::Status => self.write_status(out)?,
        }
        Ok(())
    }

    /// Per-level counts followed by the queue in service order.
    pub fn write_status(&self, out: &mut dyn Write) -> Result<()> {
        let counts = self.queue.counts();
        let parts: Vec<String> = SeverityLevel::descending()
            .map(|l| format!("{l}={}", counts.get(&l).copied().unwrap_or(0)))
            .collect();
        writeln!(out, "waiting: {} ({})", self.queue.size(), parts.join(" "))?;
        for (pos, ticket) in self.queue.snapshot().iter().enumerate() {
            writeln!(out, "  {:>3}. {ticket}", pos + 1)?;
        }
        Ok(())
    }

    /// Run every line of `script`. Failed lines are reported and skipped;
    /// returns how many failed.
    pub fn run_script(&mut self, script: impl BufRead, out: &mut dyn Write) -> Result<usize> {
        let mut failures = 0;
        for (idx, line) in script.lines().enumerate() {
            let line = line.context("failed to read script")?;
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            let result = trimmed
                .parse::<Command>()
                .and_then(|command| self.apply(&command, out));
            if let Err(e) = result {
                failures += 1;
                tracing::warn!(line = idx + 1, "{e:#}");
                writeln!(out, "error (line {}): {e:#}", idx + 1)?;
            }
        }
        Ok(failures)
    }

    /// Serve everything left, in order.
    pub fn drain(&mut self, out: &mut dyn Write) -> Result<()> {
        while let Some(ticket) = self.queue.serve_next() {
            writeln!(out, "serving {ticket}")?;
        }
        Ok(())
    }
}

fn load_cases(path: &Path) -> Result<Vec<CaseInput>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read cases {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("invalid cases file {}", path.display()))
}

/// Execute `triage dispatch`.
pub fn run_dispatch(args: &DispatchArgs, config: &TriageConfig) -> Result<u8> {
    let fuser = config.fuser(args.model.as_deref())?;
    let mut session = Session::new(fuser, config.normalizer());
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    let mut failures = 0;

    if let Some(path) = &args.cases {
        for case in load_cases(path)? {
            match session.admit(&case) {
                Ok(ticket) => writeln!(out, "queued {ticket}")?,
                Err(e) => {
                    failures += 1;
                    tracing::error!("{e:#}");
                }
            }
        }
    }

    match &args.script {
        Some(path) if path.as_os_str() == "-" => {
            failures += session.run_script(std::io::stdin().lock(), &mut out)?;
        }
        Some(path) => {
            let file = std::fs::File::open(path)
                .with_context(|| format!("failed to open script {}", path.display()))?;
            failures += session.run_script(std::io::BufReader::new(file), &mut out)?;
        }
        None => {
            session.write_status(&mut out)?;
            session.drain(&mut out)?;
        }
    }

    Ok(if failures == 0 { 0 } else { 1 })
}
