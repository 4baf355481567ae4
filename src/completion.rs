//! Completion proposals: patterns the user has started to type.

use std::fmt;

/// What kind of value completes a proposal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ProposalType {
    #[default]
    NoType,
    DateTime,
    Tag,
    Contact,
    Email,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CompletionProposal {
    pattern: Vec<String>,
    last_matched_part: usize,
    position: usize,
    length: usize,
    proposal_type: ProposalType,
    description: String,
}

impl CompletionProposal {
    pub fn new(
        pattern: Vec<String>,
        last_matched_part: usize,
        position: usize,
        length: usize,
        proposal_type: ProposalType,
        description: impl Into<String>,
    ) -> Self {
        Self {
            pattern,
            last_matched_part,
            position,
            length,
            proposal_type,
            description: description.into(),
        }
    }
    /// The pattern parts, placeholders included (`%1`).
    pub fn pattern(&self) -> &[String] {
        &self.pattern
    }
    /// Index of the last pattern part the input already matches.
    pub fn last_matched_part(&self) -> usize {
        self.last_matched_part
    }
    pub fn position(&self) -> usize {
        self.position
    }
    pub fn length(&self) -> usize {
        self.length
    }
    pub fn proposal_type(&self) -> ProposalType {
        self.proposal_type
    }
    pub fn description(&self) -> &str {
        &self.description
    }
    /// The parts still to be typed.
    pub fn remaining(&self) -> &[String] {
        let next = (self.last_matched_part + 1).min(self.pattern.len());
        &self.pattern[next..]
    }
}

impl fmt::Display for CompletionProposal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.pattern.join(" "))
    }
}
