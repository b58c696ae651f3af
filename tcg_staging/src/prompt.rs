//! Operator disambiguation.
//!
//! The resolver never talks to a terminal directly. It hands a [`Prompter`]
//! the query and a ranked candidate list and gets a [`Choice`] back, so the
//! matching logic runs unchanged against the terminal, a scripted responder
//! in tests, or a non-interactive batch run.

use crate::error::{Result, StagingError};
use dialoguer::{Confirm, Select};
use mtg_common::NormalizedKey;
use std::collections::VecDeque;
use std::fmt;

/// The card being resolved, as shown to the operator
#[derive(Debug, Clone, PartialEq)]
pub struct QueryIdentity {
    pub name: String,
    pub set: String,
    pub number: String,
    pub condition: String,
}

impl QueryIdentity {
    pub fn from_key(key: &NormalizedKey) -> Self {
        Self {
            name: format!("{}{}", key.name, key.suffix),
            set: key.set.clone(),
            number: key.number.clone(),
            condition: key.condition.clone(),
        }
    }
}

impl fmt::Display for QueryIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} from set {} with number {} ({})",
            self.name, self.set, self.number, self.condition
        )
    }
}

/// One offered candidate
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateSummary {
    pub name: String,
    pub set: String,
    pub number: String,
    pub condition: String,
    pub score: f64,
}

impl fmt::Display for CandidateSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} | Set: {} | Card Number: {} | {} | Score: {:.0}",
            self.name, self.set, self.number, self.condition, self.score
        )
    }
}

/// The operator's answer to a disambiguation prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Choice {
    /// Index into the offered candidate list
    Select(usize),
    GiveUp,
    /// Stop the whole run without writing anything
    Abort,
}

/// Interactive surface used by the resolver
pub trait Prompter {
    /// Pick one of `candidates` (best first) for `query`, or give up
    fn choose(&mut self, query: &QueryIdentity, candidates: &[CandidateSummary]) -> Result<Choice>;

    /// Ask whether the physical token in hand has a printed back face
    fn is_double_sided(&mut self, query: &QueryIdentity) -> Result<bool>;
}

impl<P: Prompter + ?Sized> Prompter for Box<P> {
    fn choose(&mut self, query: &QueryIdentity, candidates: &[CandidateSummary]) -> Result<Choice> {
        (**self).choose(query, candidates)
    }

    fn is_double_sided(&mut self, query: &QueryIdentity) -> Result<bool> {
        (**self).is_double_sided(query)
    }
}

/// Prompts on the terminal with arrow-key menus
#[derive(Debug, Default)]
pub struct TerminalPrompter;

impl Prompter for TerminalPrompter {
    fn choose(&mut self, query: &QueryIdentity, candidates: &[CandidateSummary]) -> Result<Choice> {
        let mut items: Vec<String> = candidates.iter().map(ToString::to_string).collect();
        items.push("Give up on this card".to_string());

        let selection = Select::new()
            .with_prompt(format!("Match for {query} (Esc aborts the run)"))
            .items(&items)
            .default(0)
            .interact_opt()
            .map_err(|e| StagingError::Prompt(e.to_string()))?;

        Ok(match selection {
            Some(index) if index < candidates.len() => Choice::Select(index),
            Some(_) => Choice::GiveUp,
            None => Choice::Abort,
        })
    }

    fn is_double_sided(&mut self, query: &QueryIdentity) -> Result<bool> {
        Confirm::new()
            .with_prompt(format!("Is the token {} double-sided?", query.name))
            .default(false)
            .interact()
            .map_err(|e| StagingError::Prompt(e.to_string()))
    }
}

/// Gives up on every prompt; used for unattended runs
#[derive(Debug, Default)]
pub struct GiveUpPrompter;

impl Prompter for GiveUpPrompter {
    fn choose(&mut self, query: &QueryIdentity, candidates: &[CandidateSummary]) -> Result<Choice> {
        log::debug!(
            "Non-interactive run, giving up on {} ({} candidates)",
            query,
            candidates.len()
        );
        Ok(Choice::GiveUp)
    }

    fn is_double_sided(&mut self, _query: &QueryIdentity) -> Result<bool> {
        Ok(false)
    }
}

/// Replays prepared answers in order.
///
/// When the script runs out it gives up and answers "not double-sided".
#[derive(Debug, Default)]
pub struct ScriptedPrompter {
    choices: VecDeque<Choice>,
    double_sided: VecDeque<bool>,
    /// Every query the resolver asked about, with the candidates it offered
    pub asked: Vec<(QueryIdentity, Vec<CandidateSummary>)>,
}

impl ScriptedPrompter {
    pub fn new<I: IntoIterator<Item = Choice>>(choices: I) -> Self {
        Self {
            choices: choices.into_iter().collect(),
            ..Self::default()
        }
    }

    /// Queue answers for the double-sided question
    pub fn with_double_sided<I: IntoIterator<Item = bool>>(mut self, answers: I) -> Self {
        self.double_sided.extend(answers);
        self
    }
}

impl Prompter for ScriptedPrompter {
    fn choose(&mut self, query: &QueryIdentity, candidates: &[CandidateSummary]) -> Result<Choice> {
        self.asked.push((query.clone(), candidates.to_vec()));
        Ok(self.choices.pop_front().unwrap_or(Choice::GiveUp))
    }

    fn is_double_sided(&mut self, _query: &QueryIdentity) -> Result<bool> {
        Ok(self.double_sided.pop_front().unwrap_or(false))
    }
}
