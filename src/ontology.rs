//! Seams to the services the parser and the compiler consult but do not own:
//! the ontology (which properties and classes exist and how they relate) and
//! the statement store the lazy tag/contact/email caches are filled from.

use std::collections::{HashMap, HashSet};

use crate::datatype::LiteralType;
use crate::error::Result;
use crate::compiler::UriHasher;
use crate::vocabulary::{nao, ncal, nco, nfo, nie, nmm, nmo, rdf, rdfs, xsd, Uri};

/// One result row, binding names (without `?`) to their values.
pub type Row = HashMap<String, String>;

pub trait Ontology {
    fn is_subclass_of(&self, class: &Uri, parent: &Uri) -> bool;
    fn property_range(&self, property: &Uri) -> Option<Uri>;
    /// The scalar kind of a property whose range is a literal type.
    fn property_literal_range_type(&self, property: &Uri) -> Option<LiteralType> {
        self.property_range(property)
            .as_ref()
            .and_then(LiteralType::from_data_type)
    }
    fn inverse_property(&self, property: &Uri) -> Option<Uri>;
    /// Whether a resource carries at most one value of `property`.
    fn is_single_valued(&self, _property: &Uri) -> bool {
        false
    }
}

pub trait StatementStore {
    fn execute_query(&self, query: &str) -> Result<Vec<Row>>;
    fn boolean_query(&self, query: &str) -> Result<bool>;
}

/// Table-backed ontology knowledge.
#[derive(Debug, Clone, Default)]
pub struct StaticOntology {
    ranges: HashMap<Uri, Uri, UriHasher>,
    parents: HashMap<Uri, Vec<Uri>, UriHasher>,
    inverses: HashMap<Uri, Uri, UriHasher>,
    single_valued: HashSet<Uri, UriHasher>,
}

impl StaticOntology {
    pub fn new() -> Self {
        Self::default()
    }

    /// The desktop vocabulary this crate generates queries for.
    pub fn desktop() -> Self {
        let mut ontology = Self::new();
        for (property, range) in [
            (nie::TITLE, xsd::STRING),
            (nie::URL, xsd::STRING),
            (nie::PLAIN_TEXT_CONTENT, xsd::STRING),
            (nie::CREATED, xsd::DATE_TIME),
            (nie::LAST_MODIFIED, xsd::DATE_TIME),
            (nie::CONTENT_SIZE, xsd::INTEGER),
            (nie::RELATED_TO, nie::INFORMATION_ELEMENT),
            (nfo::FILE_NAME, xsd::STRING),
            (nfo::FILE_SIZE, xsd::INTEGER),
            (nfo::FILE_CREATED, xsd::DATE_TIME),
            (nfo::FILE_LAST_MODIFIED, xsd::DATE_TIME),
            (nfo::FILE_OWNER, nco::CONTACT),
            (nmo::MESSAGE_SUBJECT, xsd::STRING),
            (nmo::MESSAGE_FROM, nco::CONTACT),
            (nmo::MESSAGE_RECIPIENT, nco::CONTACT),
            (nmo::SENT_DATE, xsd::DATE_TIME),
            (nmo::RECEIVED_DATE, xsd::DATE_TIME),
            (nco::FULLNAME, xsd::STRING),
            (nco::EMAIL_ADDRESS, xsd::STRING),
            (nco::CREATOR, nco::CONTACT),
            (nmm::PERFORMER, nco::CONTACT),
            (ncal::SUMMARY, xsd::STRING),
            (ncal::DESCRIPTION, xsd::STRING),
            (nao::HAS_TAG, nao::TAG),
            (nao::NUMERIC_RATING, xsd::INTEGER),
            (nao::DESCRIPTION, xsd::STRING),
            (nao::USER_VISIBLE, xsd::BOOLEAN),
            (rdfs::LABEL, xsd::STRING),
            (rdf::TYPE, rdfs::CLASS),
        ] {
            ontology.add_property(property, range);
        }
        for (class, parent) in [
            (nfo::FILE_DATA_OBJECT, nie::INFORMATION_ELEMENT),
            (nfo::FOLDER, nfo::FILE_DATA_OBJECT),
            (nfo::DOCUMENT, nie::INFORMATION_ELEMENT),
            (nfo::IMAGE, nie::INFORMATION_ELEMENT),
            (nfo::VIDEO, nie::INFORMATION_ELEMENT),
            (nfo::AUDIO, nie::INFORMATION_ELEMENT),
            (nmo::MESSAGE, nie::INFORMATION_ELEMENT),
            (nmo::EMAIL, nmo::MESSAGE),
            (ncal::EVENT, nie::INFORMATION_ELEMENT),
        ] {
            ontology.add_subclass(class, parent);
        }
        for property in [
            nie::URL,
            nie::CREATED,
            nie::LAST_MODIFIED,
            nie::CONTENT_SIZE,
            nfo::FILE_NAME,
            nfo::FILE_SIZE,
            nfo::FILE_CREATED,
            nfo::FILE_LAST_MODIFIED,
            nmo::SENT_DATE,
            nmo::RECEIVED_DATE,
            nao::NUMERIC_RATING,
            nao::USER_VISIBLE,
        ] {
            ontology.add_single_valued(property);
        }
        ontology
    }

    pub fn add_property(&mut self, property: Uri, range: Uri) {
        self.ranges.insert(property, range);
    }
    pub fn add_subclass(&mut self, class: Uri, parent: Uri) {
        self.parents.entry(class).or_default().push(parent);
    }
    pub fn add_single_valued(&mut self, property: Uri) {
        self.single_valued.insert(property);
    }
    /// Registers both directions.
    pub fn add_inverse(&mut self, property: Uri, inverse: Uri) {
        self.inverses.insert(property.clone(), inverse.clone());
        self.inverses.insert(inverse, property);
    }
}

impl Ontology for StaticOntology {
    fn is_subclass_of(&self, class: &Uri, parent: &Uri) -> bool {
        let mut pending = vec![class];
        let mut visited = Vec::new();
        while let Some(current) = pending.pop() {
            if visited.contains(&current) {
                continue;
            }
            visited.push(current);
            if let Some(parents) = self.parents.get(current) {
                for p in parents {
                    if p == parent {
                        return true;
                    }
                    pending.push(p);
                }
            }
        }
        false
    }
    fn property_range(&self, property: &Uri) -> Option<Uri> {
        self.ranges.get(property).cloned()
    }
    fn inverse_property(&self, property: &Uri) -> Option<Uri> {
        self.inverses.get(property).cloned()
    }
    fn is_single_valued(&self, property: &Uri) -> bool {
        self.single_valued.contains(property)
    }
}
