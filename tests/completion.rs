mod common;

use common::setup;
use deskquery::{CompletionProposal, ParserFlags, ProposalType};

fn proposals(text: &str, cursor: usize) -> Vec<CompletionProposal> {
    let mut parser = setup();
    parser.parse(text, ParserFlags::empty(), Some(cursor));
    parser.completion_proposals().to_vec()
}

fn described<'a>(proposals: &'a [CompletionProposal], description: &str) -> Option<&'a CompletionProposal> {
    proposals.iter().find(|p| p.description() == description)
}

#[test]
fn unfinished_property_pattern() {
    let proposals = proposals("mails sent by", 13);
    let sender = described(&proposals, "Sender of an e-mail").expect("a sender proposal");
    assert_eq!(sender.proposal_type(), ProposalType::Email);
    assert_eq!(sender.remaining(), &["%1".to_string()]);
    assert_eq!(sender.last_matched_part(), 1);
    assert_eq!((sender.position(), sender.length()), (6, 7));
}

#[test]
fn proposals_need_a_cursor_near_the_match() {
    assert!(described(&proposals("sent by mails", 13), "Sender of an e-mail").is_none());
    let mut parser = setup();
    parser.parse("mails sent by", ParserFlags::empty(), None);
    assert!(parser.completion_proposals().is_empty());
}

#[test]
fn proposals_are_not_repeated() {
    let proposals = proposals("tagged as", 9);
    let tags: Vec<_> = proposals.iter().filter(|p| p.description() == "Tag name").collect();
    assert_eq!(tags.len(), 1);
    assert_eq!(tags[0].proposal_type(), ProposalType::Tag);
}

#[test]
fn proposals_are_reset_between_parses() {
    let mut parser = setup();
    parser.parse("tagged as", ParserFlags::empty(), Some(9));
    assert!(!parser.completion_proposals().is_empty());
    parser.parse("Hello", ParserFlags::empty(), Some(5));
    assert!(parser.completion_proposals().is_empty());
}
