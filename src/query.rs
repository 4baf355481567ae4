//! The [`Query`] value: a root [`Term`] plus paging, file restrictions,
//! request properties and flags. Turn it into a graph pattern with
//! [`Query::to_sparql_query`].

use std::collections::BTreeMap;
use std::fmt;
use std::ops;

use bitflags::bitflags;

use crate::ontology::Ontology;
use crate::term::{SortOrder, Term};
use crate::vocabulary::Uri;

bitflags! {
    /// Flags carried by a query.
    #[derive(Default)]
    pub struct QueryFlags: u32 {
        /// Do not restrict results to user-visible resources.
        const NO_RESULT_RESTRICTIONS = 0x1;
        /// Select a full-text excerpt of the matched text.
        const WITH_FULL_TEXT_EXCERPT = 0x2;
    }
}

bitflags! {
    /// Flags influencing the compiled query string.
    #[derive(Default)]
    pub struct SparqlFlags: u32 {
        const CREATE_ASK_QUERY = 0x1;
        const CREATE_COUNT_QUERY = 0x2;
        /// Also match statements using the inverse of a property.
        const HANDLE_INVERSE_PROPERTIES = 0x4;
        const NO_RESULT_RESTRICTIONS = 0x8;
        const WITH_FULL_TEXT_EXCERPT = 0x10;
    }
}

impl From<QueryFlags> for SparqlFlags {
    fn from(flags: QueryFlags) -> Self {
        let mut sparql = SparqlFlags::empty();
        if flags.contains(QueryFlags::NO_RESULT_RESTRICTIONS) {
            sparql |= SparqlFlags::NO_RESULT_RESTRICTIONS;
        }
        if flags.contains(QueryFlags::WITH_FULL_TEXT_EXCERPT) {
            sparql |= SparqlFlags::WITH_FULL_TEXT_EXCERPT;
        }
        sparql
    }
}

/// What a file query returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FileMode {
    Files,
    Folders,
    #[default]
    Both,
}

impl FileMode {
    pub fn query_files(self) -> bool {
        matches!(self, FileMode::Files | FileMode::Both)
    }
    pub fn query_folders(self) -> bool {
        matches!(self, FileMode::Folders | FileMode::Both)
    }
    pub fn from_switches(files: bool, folders: bool) -> FileMode {
        match (files, folders) {
            (true, false) => FileMode::Files,
            (false, true) => FileMode::Folders,
            _ => FileMode::Both,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Folder {
    pub url: String,
    pub recursive: bool,
}

impl Folder {
    pub fn new(url: impl Into<String>, recursive: bool) -> Self {
        Self {
            url: url.into(),
            recursive,
        }
    }
}

/// A property fetched for every result, `optional` meaning the result does
/// not have to have it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RequestProperty {
    pub property: Uri,
    pub optional: bool,
}

impl RequestProperty {
    pub fn new(property: Uri, optional: bool) -> Self {
        Self { property, optional }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Query {
    term: Term,
    limit: usize,
    offset: usize,
    file_query: bool,
    file_mode: FileMode,
    include_folders: Vec<Folder>,
    exclude_folders: Vec<String>,
    request_properties: Vec<RequestProperty>,
    full_text_scoring: bool,
    full_text_scoring_order: SortOrder,
    flags: QueryFlags,
}

impl Query {
    pub fn new(term: Term) -> Self {
        Self {
            term,
            ..Default::default()
        }
    }
    /// An empty file query, restricting to files and/or folders.
    pub fn file_query(term: Term, mode: FileMode) -> Self {
        Self {
            term,
            file_query: true,
            file_mode: mode,
            ..Default::default()
        }
    }

    /// A file query is valid even without a term.
    pub fn is_valid(&self) -> bool {
        self.term.is_valid() || self.file_query
    }
    pub fn is_file_query(&self) -> bool {
        self.file_query
    }

    pub fn term(&self) -> &Term {
        &self.term
    }
    pub fn set_term(&mut self, term: Term) {
        self.term = term;
    }
    pub fn limit(&self) -> usize {
        self.limit
    }
    pub fn set_limit(&mut self, limit: usize) {
        self.limit = limit;
    }
    pub fn offset(&self) -> usize {
        self.offset
    }
    pub fn set_offset(&mut self, offset: usize) {
        self.offset = offset;
    }
    pub fn flags(&self) -> QueryFlags {
        self.flags
    }
    pub fn set_flags(&mut self, flags: QueryFlags) {
        self.flags = flags;
    }
    pub fn full_text_scoring_enabled(&self) -> bool {
        self.full_text_scoring
    }
    pub fn set_full_text_scoring_enabled(&mut self, enabled: bool) {
        self.full_text_scoring = enabled;
    }
    pub fn full_text_scoring_sort_order(&self) -> SortOrder {
        self.full_text_scoring_order
    }
    pub fn set_full_text_scoring_sort_order(&mut self, order: SortOrder) {
        self.full_text_scoring_order = order;
    }

    // ------------- File queries -------------
    pub fn file_mode(&self) -> FileMode {
        self.file_mode
    }
    /// Turns this into a file query.
    pub fn set_file_mode(&mut self, mode: FileMode) {
        self.file_query = true;
        self.file_mode = mode;
    }
    pub fn include_folders(&self) -> &[Folder] {
        &self.include_folders
    }
    /// Turns this into a file query.
    pub fn add_include_folder(&mut self, folder: Folder) {
        self.file_query = true;
        self.include_folders.push(folder);
    }
    pub fn exclude_folders(&self) -> &[String] {
        &self.exclude_folders
    }
    /// Turns this into a file query.
    pub fn add_exclude_folder(&mut self, url: impl Into<String>) {
        self.file_query = true;
        self.exclude_folders.push(url.into());
    }

    // ------------- Request properties -------------
    pub fn request_properties(&self) -> &[RequestProperty] {
        &self.request_properties
    }
    pub fn add_request_property(&mut self, property: RequestProperty) {
        self.request_properties.push(property);
    }
    pub fn set_request_properties(&mut self, properties: Vec<RequestProperty>) {
        self.request_properties = properties;
    }
    /// Binding name (`reqPropN`, 1-based) to the property it fetches.
    pub fn request_property_map(&self) -> BTreeMap<String, Uri> {
        self.request_properties
            .iter()
            .enumerate()
            .map(|(i, rp)| (request_property_name(i), rp.property.clone()))
            .collect()
    }

    /// The same query with its term optimized.
    pub fn optimized(&self) -> Query {
        let mut query = self.clone();
        query.term = self.term.optimize();
        query
    }

    /// Compiles the query into a SPARQL string, empty if it cannot be expressed.
    pub fn to_sparql_query(&self, flags: SparqlFlags, ontology: &dyn Ontology) -> String {
        crate::compiler::compile(self, flags, ontology)
    }

    /// Reads a query from its serialized form, invalid when unreadable.
    pub fn from_string(text: &str) -> Query {
        crate::serializer::parse_query(text)
    }
}

pub(crate) fn request_property_name(index: usize) -> String {
    format!("reqProp{}", index + 1)
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", crate::serializer::serialize_query(self))
    }
}

// ------------- Combining queries -------------
// The term is combined, every other setting is taken from the left side.
impl ops::BitAnd<Term> for Query {
    type Output = Query;
    fn bitand(mut self, rhs: Term) -> Query {
        self.term = self.term & rhs;
        self
    }
}

impl ops::BitOr<Term> for Query {
    type Output = Query;
    fn bitor(mut self, rhs: Term) -> Query {
        self.term = self.term | rhs;
        self
    }
}

impl ops::BitAnd for Query {
    type Output = Query;
    fn bitand(self, rhs: Query) -> Query {
        self & rhs.term
    }
}

impl ops::BitOr for Query {
    type Output = Query;
    fn bitor(self, rhs: Query) -> Query {
        self | rhs.term
    }
}

impl ops::Not for Query {
    type Output = Query;
    fn not(mut self) -> Query {
        self.term = !self.term;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vocabulary::nie;

    #[test]
    fn file_query_is_valid_without_term() {
        assert!(!Query::default().is_valid());
        let mut query = Query::default();
        query.add_include_folder(Folder::new("file:///home", true));
        assert!(query.is_valid());
        assert!(query.is_file_query());
    }

    #[test]
    fn request_property_names_are_one_based() {
        let mut query = Query::new(Term::literal("x"));
        query.add_request_property(RequestProperty::new(nie::TITLE, true));
        query.add_request_property(RequestProperty::new(nie::URL, false));
        let map = query.request_property_map();
        assert_eq!(map.get("reqProp1"), Some(&nie::TITLE));
        assert_eq!(map.get("reqProp2"), Some(&nie::URL));
    }

    #[test]
    fn combining_queries_combines_terms() {
        let query = Query::new(Term::literal("a")) & Query::new(Term::literal("b"));
        assert_eq!(query.term(), &(Term::literal("a") & Term::literal("b")));
        let query = !Query::new(Term::literal("a"));
        assert_eq!(query.term(), &Term::negation(Term::literal("a")));
    }
}
