use crate::fusion::Fuser;
use crate::matcher::Pass;
use crate::term::{Comparator, Term};
use crate::vocabulary::Uri;

/// `related to ... ,`: the terms up to the comma are fused into a query of
/// their own, nested under `property`.
pub struct Subqueries<'a> {
    pub property: Uri,
    pub fuser: &'a Fuser<'a>,
}

impl Pass for Subqueries<'_> {
    fn run(&self, captures: &[Term]) -> Vec<Term> {
        let (nested, _) = self.fuser.fuse(captures, 0);
        if !nested.is_valid() {
            return Vec::new();
        }
        vec![Term::compare(Some(self.property.clone()), nested, Comparator::Equal)]
    }
}
