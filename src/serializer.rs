//! Textual form of terms and queries.
//!
//! The format is a small XML dialect: a `query` (or `filequery`) element with
//! paging and flag attributes, holding one term element plus
//! `requestProperty` and `folder` elements. Term elements are `literal`,
//! `resource`, `type`, `and`, `or`, `not`, `optional` and `comparison`.
//!
//! Reading never fails loudly. Unknown elements and unreadable values turn
//! the element they occur in into an invalid term; a document that is not
//! well formed yields an invalid term or query.

use pest::Parser;
use pest::iterators::Pair;
use pest_derive::Parser;
use quick_xml::escape::escape;
use tracing::warn;

use crate::datatype::{LiteralValue, Moment, Period};
use crate::error::{QueryError, Result};
use crate::query::{FileMode, Folder, Query, QueryFlags, RequestProperty};
use crate::term::{
    comparator_to_string, string_to_comparator, AggregateFunction, Comparison, SortOrder, Term, TermBody,
};
use crate::vocabulary::Uri;

#[derive(Parser)]
#[grammar = "serializer.pest"]
pub struct ElementParser;

const XML_PROLOG: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>";

// ------------- Writing -------------
pub fn serialize_term(term: &Term) -> String {
    let mut out = String::new();
    write_term(term, &mut out);
    out
}

pub fn serialize_query(query: &Query) -> String {
    let mut out = String::from(XML_PROLOG);
    let element = if query.is_file_query() { "filequery" } else { "query" };
    out.push('<');
    out.push_str(element);
    if query.is_file_query() {
        push_attribute(&mut out, "queryFiles", bool_text(query.file_mode().query_files()));
        push_attribute(&mut out, "queryFolders", bool_text(query.file_mode().query_folders()));
    }
    push_attribute(&mut out, "limit", &query.limit().to_string());
    push_attribute(&mut out, "offset", &query.offset().to_string());
    push_attribute(&mut out, "fullTextScoring", bool_text(query.full_text_scoring_enabled()));
    push_attribute(&mut out, "fullTextScoringOrder", query.full_text_scoring_sort_order().name());
    push_attribute(&mut out, "flags", &flags_to_string(query.flags()));
    out.push('>');

    write_term(query.term(), &mut out);
    for rp in query.request_properties() {
        out.push_str("<requestProperty");
        push_attribute(&mut out, "uri", rp.property.as_str());
        push_attribute(&mut out, "optional", bool_text(rp.optional));
        out.push_str("/>");
    }
    for folder in query.include_folders() {
        out.push_str("<folder");
        push_attribute(&mut out, "url", &folder.url);
        push_attribute(&mut out, "include", "true");
        push_attribute(&mut out, "recursive", bool_text(folder.recursive));
        out.push_str("/>");
    }
    for url in query.exclude_folders() {
        out.push_str("<folder");
        push_attribute(&mut out, "url", url);
        push_attribute(&mut out, "include", "false");
        out.push_str("/>");
    }
    out.push_str("</");
    out.push_str(element);
    out.push('>');
    out
}

fn write_term(term: &Term, out: &mut String) {
    match term.body() {
        TermBody::Invalid => (),
        TermBody::Literal(value) => {
            out.push_str("<literal");
            push_attribute(out, "datatype", value.data_type().as_str());
            if let LiteralValue::DateTime(moment) = value {
                if moment.granularity != Period::Second {
                    push_attribute(out, "granularity", moment.granularity.name());
                }
            }
            out.push('>');
            out.push_str(&escape(&value.to_string()));
            out.push_str("</literal>");
        }
        TermBody::Resource(uri) => {
            out.push_str("<resource");
            push_attribute(out, "uri", uri.as_str());
            out.push_str("/>");
        }
        TermBody::ResourceType(types) => {
            out.push_str("<type");
            push_attribute(out, "uri", types.first().map(Uri::as_str).unwrap_or(""));
            if types.len() > 1 {
                out.push('>');
                for also in &types[1..] {
                    out.push_str("<also");
                    push_attribute(out, "uri", also.as_str());
                    out.push_str("/>");
                }
                out.push_str("</type>");
            } else {
                out.push_str("/>");
            }
        }
        TermBody::Comparison(c) => {
            out.push_str("<comparison");
            if let Some(property) = &c.property {
                push_attribute(out, "property", property.as_str());
            }
            push_attribute(out, "comparator", comparator_to_string(c.comparator));
            if let Some(name) = &c.variable_name {
                push_attribute(out, "varname", name);
            }
            if let Some(aggregate) = c.aggregate.name() {
                push_attribute(out, "aggregate", aggregate);
            }
            if c.sort_weight != 0 {
                push_attribute(out, "sortWeight", &c.sort_weight.to_string());
                push_attribute(out, "sortOrder", c.sort_order.name());
            }
            if c.inverted {
                push_attribute(out, "inverted", "true");
            }
            if c.sub_term.is_valid() {
                out.push('>');
                write_term(&c.sub_term, out);
                out.push_str("</comparison>");
            } else {
                out.push_str("/>");
            }
        }
        TermBody::Negation(inner) => write_group("not", std::slice::from_ref(inner.as_ref()), out),
        TermBody::Optional(inner) => write_group("optional", std::slice::from_ref(inner.as_ref()), out),
        TermBody::And(terms) => write_group("and", terms, out),
        TermBody::Or(terms) => write_group("or", terms, out),
    }
}

fn write_group(element: &str, terms: &[Term], out: &mut String) {
    out.push('<');
    out.push_str(element);
    out.push('>');
    for term in terms {
        write_term(term, out);
    }
    out.push_str("</");
    out.push_str(element);
    out.push('>');
}

fn push_attribute(out: &mut String, name: &str, value: &str) {
    out.push(' ');
    out.push_str(name);
    out.push_str("=\"");
    out.push_str(&escape(value));
    out.push('"');
}

fn bool_text(value: bool) -> &'static str {
    if value { "true" } else { "false" }
}

fn flags_to_string(flags: QueryFlags) -> String {
    let mut names = Vec::new();
    if flags.contains(QueryFlags::NO_RESULT_RESTRICTIONS) {
        names.push("NoResultRestrictions");
    }
    if flags.contains(QueryFlags::WITH_FULL_TEXT_EXCERPT) {
        names.push("WithFullTextExcerpt");
    }
    names.join("|")
}

fn flags_from_string(text: &str) -> QueryFlags {
    let mut flags = QueryFlags::empty();
    for name in text.split('|').map(str::trim) {
        match name {
            "NoResultRestrictions" => flags |= QueryFlags::NO_RESULT_RESTRICTIONS,
            "WithFullTextExcerpt" => flags |= QueryFlags::WITH_FULL_TEXT_EXCERPT,
            _ => (),
        }
    }
    flags
}

fn unescape(text: &str) -> Result<String> {
    quick_xml::escape::unescape(text)
        .map(|text| text.into_owned())
        .map_err(|e| QueryError::serialization(format!("bad character reference: {}", e)))
}

// ------------- Reading -------------
#[derive(Debug)]
struct Element {
    name: String,
    attributes: Vec<(String, String)>,
    children: Vec<Node>,
}

#[derive(Debug)]
enum Node {
    Element(Element),
    Text(String),
}

impl Element {
    fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
    fn flag(&self, name: &str) -> bool {
        self.attribute(name) == Some("true")
    }
    fn elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|node| match node {
            Node::Element(e) => Some(e),
            Node::Text(_) => None,
        })
    }
    fn text(&self) -> String {
        self.children
            .iter()
            .filter_map(|node| match node {
                Node::Text(t) => Some(t.as_str()),
                Node::Element(_) => None,
            })
            .collect()
    }
}

fn read_document(text: &str) -> Result<Element> {
    let document = ElementParser::parse(Rule::document, text)?
        .next()
        .ok_or_else(|| QueryError::serialization("empty document"))?;
    for pair in document.into_inner() {
        if pair.as_rule() == Rule::element {
            return read_element(pair);
        }
    }
    Err(QueryError::serialization("no root element"))
}

fn read_element(pair: Pair<Rule>) -> Result<Element> {
    let inner = pair
        .into_inner()
        .next()
        .ok_or_else(|| QueryError::serialization("empty element"))?;
    match inner.as_rule() {
        Rule::empty_element => {
            let (name, attributes) = read_tag(inner)?;
            Ok(Element {
                name,
                attributes,
                children: Vec::new(),
            })
        }
        Rule::full_element => {
            let mut parts = inner.into_inner();
            let open = parts
                .next()
                .ok_or_else(|| QueryError::serialization("missing opening tag"))?;
            let (name, attributes) = read_tag(open)?;
            let mut children = Vec::new();
            for part in parts {
                match part.as_rule() {
                    Rule::element => children.push(Node::Element(read_element(part)?)),
                    Rule::text => children.push(Node::Text(unescape(part.as_str())?)),
                    Rule::close_tag => {
                        let (closing, _) = read_tag(part)?;
                        if closing != name {
                            return Err(QueryError::serialization(format!(
                                "element '{}' closed by '{}'",
                                name, closing
                            )));
                        }
                    }
                    _ => (),
                }
            }
            Ok(Element {
                name,
                attributes,
                children,
            })
        }
        other => Err(QueryError::serialization(format!("unexpected {:?}", other))),
    }
}

fn read_tag(pair: Pair<Rule>) -> Result<(String, Vec<(String, String)>)> {
    let mut name = None;
    let mut attributes = Vec::new();
    for part in pair.into_inner() {
        match part.as_rule() {
            Rule::name => name = Some(part.as_str().to_string()),
            Rule::attribute => {
                let mut key_value = part.into_inner();
                let key = key_value
                    .next()
                    .map(|k| k.as_str().to_string())
                    .ok_or_else(|| QueryError::serialization("attribute without name"))?;
                let value = key_value.next().map(|v| unescape(v.as_str())).transpose()?.unwrap_or_default();
                attributes.push((key, value));
            }
            _ => (),
        }
    }
    let name = name.ok_or_else(|| QueryError::serialization("tag without name"))?;
    Ok((name, attributes))
}

/// Reads a serialized term, invalid when the text is not a readable term.
pub fn parse_term(text: &str) -> Term {
    if text.trim().is_empty() {
        return Term::invalid();
    }
    match read_document(text) {
        Ok(element) => term_from_element(&element),
        Err(e) => {
            warn!(error = %e, "unreadable term");
            Term::invalid()
        }
    }
}

/// Reads a serialized query, invalid when the text is not a readable query.
pub fn parse_query(text: &str) -> Query {
    match read_document(text) {
        Ok(element) => query_from_element(&element).unwrap_or_else(|e| {
            warn!(error = %e, "rejected query document");
            Query::default()
        }),
        Err(e) => {
            warn!(error = %e, "unreadable query");
            Query::default()
        }
    }
}

fn query_from_element(element: &Element) -> Result<Query> {
    let mut query = match element.name.as_str() {
        "query" => Query::default(),
        "filequery" => {
            let mode = FileMode::from_switches(element.flag("queryFiles"), element.flag("queryFolders"));
            Query::file_query(Term::invalid(), mode)
        }
        other => return Err(QueryError::serialization(format!("unknown query element '{}'", other))),
    };
    if let Some(limit) = element.attribute("limit") {
        query.set_limit(limit.trim().parse().unwrap_or(0));
    }
    if let Some(offset) = element.attribute("offset") {
        query.set_offset(offset.trim().parse().unwrap_or(0));
    }
    query.set_full_text_scoring_enabled(element.flag("fullTextScoring"));
    query.set_full_text_scoring_sort_order(SortOrder::from_name(
        element.attribute("fullTextScoringOrder").unwrap_or("asc"),
    ));
    query.set_flags(flags_from_string(element.attribute("flags").unwrap_or("")));

    for child in element.elements() {
        match child.name.as_str() {
            "requestProperty" => {
                let uri = child
                    .attribute("uri")
                    .ok_or_else(|| QueryError::serialization("requestProperty without uri"))?;
                query.add_request_property(RequestProperty::new(Uri::new(uri), child.flag("optional")));
            }
            "folder" => {
                if !query.is_file_query() {
                    return Err(QueryError::serialization("folder in a non-file query"));
                }
                let url = child
                    .attribute("url")
                    .ok_or_else(|| QueryError::serialization("folder without url"))?;
                if child.attribute("include") == Some("false") {
                    query.add_exclude_folder(url);
                } else {
                    let recursive = child.attribute("recursive") != Some("false");
                    query.add_include_folder(Folder::new(url, recursive));
                }
            }
            _ => query.set_term(term_from_element(child)),
        }
    }
    Ok(query)
}

fn term_from_element(element: &Element) -> Term {
    match element.name.as_str() {
        "literal" => literal_from_element(element),
        "resource" => match element.attribute("uri") {
            Some(uri) => Term::resource(Uri::new(uri)),
            None => Term::invalid(),
        },
        "type" => {
            let mut types: Vec<Uri> = element.attribute("uri").map(Uri::new).into_iter().collect();
            types.extend(
                element
                    .elements()
                    .filter(|e| e.name == "also")
                    .filter_map(|e| e.attribute("uri"))
                    .map(Uri::new),
            );
            Term::resource_types(types)
        }
        "and" | "or" => {
            let terms: Vec<Term> = element
                .elements()
                .map(term_from_element)
                .filter(Term::is_valid)
                .collect();
            if element.name == "and" {
                Term::and(terms)
            } else {
                Term::or(terms)
            }
        }
        "not" | "optional" => match element.elements().next().map(term_from_element) {
            Some(inner) if inner.is_valid() => {
                if element.name == "not" {
                    Term::negation(inner)
                } else {
                    Term::optional(inner)
                }
            }
            _ => Term::invalid(),
        },
        "comparison" => comparison_from_element(element),
        other => {
            warn!(element = other, "unknown term element");
            Term::invalid()
        }
    }
}

fn literal_from_element(element: &Element) -> Term {
    let text = element.text();
    let data_type = element.attribute("datatype").map(Uri::new);
    let Some(mut value) = LiteralValue::from_lexical(&text, data_type.as_ref()) else {
        return Term::invalid();
    };
    if let LiteralValue::DateTime(moment) = &mut value {
        if let Some(granularity) = element.attribute("granularity").and_then(Period::from_name) {
            *moment = Moment::new(moment.instant, granularity);
        }
    }
    Term::literal(value)
}

fn comparison_from_element(element: &Element) -> Term {
    let sub_term = element
        .elements()
        .next()
        .map(term_from_element)
        .unwrap_or_default();
    let mut comparison = Comparison::new(
        element.attribute("property").map(Uri::new),
        sub_term,
        string_to_comparator(element.attribute("comparator").unwrap_or(":")),
    );
    comparison.variable_name = element.attribute("varname").map(str::to_string);
    if let Some(aggregate) = element.attribute("aggregate") {
        match aggregate.parse::<AggregateFunction>() {
            Ok(aggregate) => comparison.aggregate = aggregate,
            Err(_) => return Term::invalid(),
        }
    }
    if let Some(weight) = element.attribute("sortWeight") {
        match weight.trim().parse::<i32>() {
            Ok(weight) => comparison.sort_weight = weight,
            Err(_) => return Term::invalid(),
        }
        comparison.sort_order = SortOrder::from_name(element.attribute("sortOrder").unwrap_or("asc"));
    }
    comparison.inverted = element.flag("inverted");
    Term::comparison(comparison)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::term::Comparator;

    #[test]
    fn literal_keeps_surrounding_whitespace() {
        let term = Term::literal(" padded <b> & \"quoted\" ");
        let text = serialize_term(&term);
        assert_eq!(parse_term(&text), term);
    }

    #[test]
    fn comparison_attributes() {
        let term = Term::comparison(
            Comparison::new(Some(Uri::new("urn:p")), Term::literal(5i64), Comparator::GreaterOrEqual)
                .with_variable_name("v")
                .with_aggregate(AggregateFunction::Max)
                .with_sort(2, SortOrder::Descending)
                .inverted(true),
        );
        let text = serialize_term(&term);
        assert!(text.contains("comparator=\"&gt;=\""));
        assert_eq!(parse_term(&text), term);
    }

    #[test]
    fn character_references_are_decoded() {
        assert_eq!(parse_term("<literal>a&#38;b&#x3C;c&amp;d</literal>"), Term::literal("a&b<c&d"));
        assert!(!parse_term("<literal>a&bogus;b</literal>").is_valid());
    }

    #[test]
    fn unknown_elements_are_invalid() {
        assert!(!parse_term("<bogus/>").is_valid());
        assert!(!parse_term("<and><literal>a</literal>").is_valid());
        let term = parse_term("<and><bogus/><literal>a</literal><literal>b</literal></and>");
        assert_eq!(term, Term::and(vec![Term::literal("a"), Term::literal("b")]));
    }

    #[test]
    fn folder_requires_file_query() {
        let query = parse_query("<query limit=\"5\"><folder url=\"file:///tmp\"/></query>");
        assert!(!query.is_valid());
        assert_eq!(query.limit(), 0);
    }
}
