//! Deskquery – natural language desktop search queries, a query term algebra
//! and a compiler from query terms to SPARQL graph patterns.
//!
//! A user types something like `size < 2KB after June 5, 2013 tagged as work`.
//! The [`parser::QueryParser`] turns that text into a [`query::Query`] whose
//! root [`term::Term`] says: a size comparison, a date comparison and a tag
//! comparison, all of which must hold. [`query::Query::to_sparql_query`] then
//! lowers the term tree into a SPARQL query for a desktop triple store.
//!
//! ## Modules
//! * [`term`] – The term algebra: literals, resources, types, comparisons,
//!   boolean combinators, optimization.
//! * [`datatype`] – Literal values, calendar periods and the `Moment` value
//!   carrying a date-time together with its granularity.
//! * [`query`] – The query value: root term, paging, file restrictions,
//!   request properties and flags.
//! * [`parser`] – The natural language parser driving the rewriting passes
//!   in [`passes`], date folding ([`datefold`]) and term fusion ([`fusion`]).
//! * [`matcher`] – The pattern matcher the passes are run through.
//! * [`compiler`] – Lowering of queries into SPARQL.
//! * [`serializer`] – The XML-shaped text form of queries and terms.
//! * [`ontology`] – The ontology and statement store seams.
//! * [`settings`] – Locale keywords and parser tuning, readable from a file.
//!
//! ## Quick Start
//! ```
//! use deskquery::{QueryParser, SparqlFlags, StaticOntology};
//! use deskquery::vocabulary::nie;
//!
//! let query = QueryParser::parse_query("size > 2K");
//! let sparql = query.to_sparql_query(SparqlFlags::empty(), &StaticOntology::desktop());
//! assert!(sparql.contains(&nie::CONTENT_SIZE.to_n3()));
//! ```

pub mod compiler;
pub mod completion;
pub mod datatype;
pub mod datefold;
pub mod error;
pub mod fusion;
pub mod matcher;
pub mod ontology;
pub mod parser;
pub mod passes;
pub mod query;
pub mod serializer;
pub mod settings;
pub mod term;
pub mod vocabulary;

pub use completion::{CompletionProposal, ProposalType};
pub use datatype::{LiteralValue, Moment, Period};
pub use error::{QueryError, Result};
pub use ontology::{Ontology, Row, StatementStore, StaticOntology};
pub use parser::{ParserFlags, QueryParser};
pub use query::{FileMode, Folder, Query, QueryFlags, RequestProperty, SparqlFlags};
pub use settings::ParserSettings;
pub use term::{AggregateFunction, Comparator, Comparison, SortOrder, Term, TermBody, TermKind};
pub use vocabulary::Uri;
