//! Property passes ("sent by", "tagged as", "size") and the label caches
//! resource-valued properties are resolved with.

use std::cell::OnceCell;

use tracing::{debug, warn};

use crate::datatype::LiteralValue;
use crate::matcher::Pass;
use crate::ontology::{Row, StatementStore};
use crate::term::{Comparator, Term, TermBody};
use crate::vocabulary::{Uri, nao, nco, rdfs};

/// What a property accepts as its value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueDomain {
    Integer,
    IntegerOrDouble,
    String,
    DateTime,
    Tag,
    Contact,
    EmailAddress,
}

/// Label to resource pairs sorted by label.
type Labels = Vec<(String, Uri)>;

#[derive(Debug, Default)]
struct People {
    names: Labels,
    emails: Labels,
}

/// Tag, contact and e-mail address labels, read from the store the first
/// time they are needed and kept for the lifetime of the parser.
#[derive(Debug, Default)]
pub struct LookupCaches {
    tags: OnceCell<Labels>,
    people: OnceCell<People>,
}

fn sorted(mut labels: Labels) -> Labels {
    labels.sort();
    labels.dedup_by(|a, b| a.0 == b.0);
    labels
}

fn rows(store: Option<&dyn StatementStore>, query: &str, what: &str) -> Vec<Row> {
    let Some(store) = store else {
        debug!(what, "no statement store, nothing to look up");
        return Vec::new();
    };
    match store.execute_query(query) {
        Ok(rows) => rows,
        Err(e) => {
            warn!(what, error = %e, "could not fill lookup cache");
            Vec::new()
        }
    }
}

fn lookup<'a>(labels: &'a [(String, Uri)], label: &str) -> Option<&'a Uri> {
    labels
        .binary_search_by(|(l, _)| l.as_str().cmp(label))
        .ok()
        .map(|i| &labels[i].1)
}

impl LookupCaches {
    pub fn tags(&self, store: Option<&dyn StatementStore>) -> &[(String, Uri)] {
        self.tags.get_or_init(|| {
            let query = format!(
                "select ?tag ?label where {{ ?tag a {} . ?tag {} ?label . }}",
                nao::TAG.to_n3(),
                rdfs::LABEL.to_n3()
            );
            let tags = rows(store, &query, "tags")
                .into_iter()
                .filter_map(|mut row| Some((row.remove("label")?, Uri::new(row.remove("tag")?))))
                .collect();
            sorted(tags)
        })
    }

    fn people(&self, store: Option<&dyn StatementStore>) -> &People {
        self.people.get_or_init(|| {
            let query = format!(
                "select distinct ?c ?fullname ?email where {{ ?c a {} . {{ ?c {} ?fullname . }} \
                 OPTIONAL {{ ?c {} ?address . ?address {} ?email . }} }}",
                nco::CONTACT.to_n3(),
                nco::FULLNAME.to_n3(),
                nco::HAS_EMAIL_ADDRESS.to_n3(),
                nco::EMAIL_ADDRESS.to_n3()
            );
            let mut people = People::default();
            for row in rows(store, &query, "contacts") {
                let Some(contact) = row.get("c").map(|c| Uri::new(c.as_str())) else {
                    continue;
                };
                if let Some(name) = row.get("fullname").filter(|n| !n.is_empty()) {
                    people.names.push((name.clone(), contact.clone()));
                }
                if let Some(email) = row.get("email").filter(|e| !e.is_empty()) {
                    people.emails.push((email.clone(), contact));
                }
            }
            People {
                names: sorted(people.names),
                emails: sorted(people.emails),
            }
        })
    }

    pub fn contacts(&self, store: Option<&dyn StatementStore>) -> &[(String, Uri)] {
        &self.people(store).names
    }

    pub fn email_addresses(&self, store: Option<&dyn StatementStore>) -> &[(String, Uri)] {
        &self.people(store).emails
    }
}

/// Binds a value to a property, checking it against the property's domain.
/// The captured value is either a bare literal or a comparison built by the
/// comparator pass, whose comparator is kept.
pub struct Properties<'a> {
    pub property: Uri,
    pub domain: ValueDomain,
    pub caches: &'a LookupCaches,
    pub store: Option<&'a dyn StatementStore>,
}

impl Properties<'_> {
    fn convert(&self, term: &Term) -> Option<Term> {
        let value = term.as_literal()?;
        let accepted = match (self.domain, value) {
            (ValueDomain::Integer, LiteralValue::Integer(_))
            | (ValueDomain::IntegerOrDouble, LiteralValue::Integer(_) | LiteralValue::Double(_))
            | (ValueDomain::String, LiteralValue::String(_))
            | (ValueDomain::DateTime, LiteralValue::DateTime(_)) => return Some(term.clone()),
            (ValueDomain::Tag, LiteralValue::String(label)) => lookup(self.caches.tags(self.store), label),
            (ValueDomain::Contact, LiteralValue::String(label)) => lookup(self.caches.contacts(self.store), label)
                .or_else(|| lookup(self.caches.email_addresses(self.store), label)),
            (ValueDomain::EmailAddress, LiteralValue::String(label)) => {
                lookup(self.caches.email_addresses(self.store), label)
                    .or_else(|| lookup(self.caches.contacts(self.store), label))
            }
            _ => None,
        };
        accepted.map(|uri| Term::resource(uri.clone()).with_span(term.span()))
    }
}

impl Pass for Properties<'_> {
    fn run(&self, captures: &[Term]) -> Vec<Term> {
        let Some(capture) = captures.first() else {
            return Vec::new();
        };
        let (value, comparator) = match capture.body() {
            TermBody::Literal(_) => (capture, None),
            TermBody::Comparison(c) if c.property.is_none() => (&c.sub_term, Some(c.comparator)),
            _ => return Vec::new(),
        };
        let Some(sub_term) = self.convert(value) else {
            return Vec::new();
        };
        let comparator = comparator.unwrap_or_else(|| {
            if sub_term.literal_str().is_some() {
                Comparator::Contains
            } else {
                Comparator::Equal
            }
        });
        vec![Term::compare(Some(self.property.clone()), sub_term, comparator)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{QueryError, Result};
    use crate::vocabulary::{nie, nmo};
    use std::cell::Cell;

    struct Tags {
        calls: Cell<usize>,
    }

    impl StatementStore for Tags {
        fn execute_query(&self, query: &str) -> Result<Vec<Row>> {
            self.calls.set(self.calls.get() + 1);
            if !query.contains("?tag") {
                return Err(QueryError::Store("unexpected query".into()));
            }
            let row = |tag: &str, label: &str| {
                Row::from([("tag".to_string(), tag.to_string()), ("label".to_string(), label.to_string())])
            };
            Ok(vec![row("urn:tag:work", "work"), row("urn:tag:akademy", "akademy")])
        }
        fn boolean_query(&self, _: &str) -> Result<bool> {
            Ok(true)
        }
    }

    #[test]
    fn tags_are_looked_up_once() {
        let store = Tags { calls: Cell::new(0) };
        let caches = LookupCaches::default();
        let pass = Properties {
            property: nao::HAS_TAG,
            domain: ValueDomain::Tag,
            caches: &caches,
            store: Some(&store),
        };
        assert_eq!(
            pass.run(&[Term::literal("work")]),
            vec![Term::compare(
                Some(nao::HAS_TAG),
                Term::resource(Uri::new("urn:tag:work")),
                Comparator::Equal
            )]
        );
        assert!(pass.run(&[Term::literal("holidays")]).is_empty());
        assert_eq!(store.calls.get(), 1);
        assert_eq!(caches.tags(None)[0].0, "akademy");
    }

    #[test]
    fn store_errors_leave_caches_empty() {
        let store = Tags { calls: Cell::new(0) };
        let caches = LookupCaches::default();
        assert!(caches.contacts(Some(&store)).is_empty());
        let pass = Properties {
            property: nmo::MESSAGE_FROM,
            domain: ValueDomain::EmailAddress,
            caches: &caches,
            store: Some(&store),
        };
        assert!(pass.run(&[Term::literal("alice@example.org")]).is_empty());
    }

    #[test]
    fn comparator_of_a_captured_comparison_is_kept() {
        let caches = LookupCaches::default();
        let pass = Properties {
            property: nie::CONTENT_SIZE,
            domain: ValueDomain::IntegerOrDouble,
            caches: &caches,
            store: None,
        };
        let captured = Term::compare(None, Term::literal(2048), Comparator::Smaller);
        assert_eq!(
            pass.run(&[captured]),
            vec![Term::compare(Some(nie::CONTENT_SIZE), Term::literal(2048), Comparator::Smaller)]
        );
        assert_eq!(
            pass.run(&[Term::literal(7)]),
            vec![Term::compare(Some(nie::CONTENT_SIZE), Term::literal(7), Comparator::Equal)]
        );
        assert!(pass.run(&[Term::literal("big")]).is_empty());
    }
}
