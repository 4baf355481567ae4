//! Resource identifiers and the desktop ontology terms the parser and the
//! compiler refer to.
//!
//! Two internal URI schemes travel between the parsing passes and term fusion:
//! * `date://<period>/<offset|value>` marks a partial calendar field (see
//!   [`crate::datatype::Period`]);
//! * `property://<name>/` is a placeholder property resolved once the resource
//!   type context of a term is known.

use std::borrow::Cow;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Uri(Cow<'static, str>);

impl Uri {
    pub const fn from_static(uri: &'static str) -> Self {
        Uri(Cow::Borrowed(uri))
    }
    pub fn new(uri: impl Into<String>) -> Self {
        Uri(Cow::Owned(uri.into()))
    }
    pub fn as_str(&self) -> &str {
        &self.0
    }
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
    pub fn scheme(&self) -> Option<&str> {
        self.0.split_once("://").map(|(scheme, _)| scheme)
    }
    /// The authority part of a `scheme://host/path` identifier.
    pub fn host(&self) -> Option<&str> {
        let (_, rest) = self.0.split_once("://")?;
        Some(rest.split('/').next().unwrap_or(rest))
    }
    /// Everything from the first slash after the host, empty if there is none.
    pub fn path(&self) -> &str {
        match self.0.split_once("://") {
            Some((_, rest)) => rest.find('/').map(|i| &rest[i..]).unwrap_or(""),
            None => "",
        }
    }
    /// The identifier in N3 notation, `<...>`.
    pub fn to_n3(&self) -> String {
        format!("<{}>", self.0)
    }
}

impl fmt::Display for Uri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Uri {
    fn from(s: &str) -> Self {
        Uri::new(s)
    }
}

impl From<String> for Uri {
    fn from(s: String) -> Self {
        Uri::new(s)
    }
}

// ------------- Internal schemes -------------
pub const DATE_SCHEME: &str = "date";
pub const PROPERTY_SCHEME: &str = "property";

pub fn pseudo_property(name: &str) -> Uri {
    Uri::new(format!("{}://{}/", PROPERTY_SCHEME, name))
}

/// The name of a `property://<name>/` placeholder, if `uri` is one.
pub fn pseudo_property_name(uri: &Uri) -> Option<&str> {
    if uri.scheme() == Some(PROPERTY_SCHEME) {
        uri.host()
    } else {
        None
    }
}

// ------------- Namespaces -------------
pub mod rdf {
    use super::Uri;
    pub const TYPE: Uri = Uri::from_static("http://www.w3.org/1999/02/22-rdf-syntax-ns#type");
    pub const PROPERTY: Uri = Uri::from_static("http://www.w3.org/1999/02/22-rdf-syntax-ns#Property");
}

pub mod rdfs {
    use super::Uri;
    pub const LABEL: Uri = Uri::from_static("http://www.w3.org/2000/01/rdf-schema#label");
    pub const CLASS: Uri = Uri::from_static("http://www.w3.org/2000/01/rdf-schema#Class");
    pub const RESOURCE: Uri = Uri::from_static("http://www.w3.org/2000/01/rdf-schema#Resource");
}

pub mod xsd {
    use super::Uri;
    pub const STRING: Uri = Uri::from_static("http://www.w3.org/2001/XMLSchema#string");
    pub const INT: Uri = Uri::from_static("http://www.w3.org/2001/XMLSchema#int");
    pub const INTEGER: Uri = Uri::from_static("http://www.w3.org/2001/XMLSchema#integer");
    pub const LONG: Uri = Uri::from_static("http://www.w3.org/2001/XMLSchema#long");
    pub const DOUBLE: Uri = Uri::from_static("http://www.w3.org/2001/XMLSchema#double");
    pub const FLOAT: Uri = Uri::from_static("http://www.w3.org/2001/XMLSchema#float");
    pub const DECIMAL: Uri = Uri::from_static("http://www.w3.org/2001/XMLSchema#decimal");
    pub const BOOLEAN: Uri = Uri::from_static("http://www.w3.org/2001/XMLSchema#boolean");
    pub const DATE_TIME: Uri = Uri::from_static("http://www.w3.org/2001/XMLSchema#dateTime");
}

pub mod nao {
    use super::Uri;
    pub const TAG: Uri = Uri::from_static("http://www.semanticdesktop.org/ontologies/2007/08/15/nao#Tag");
    pub const HAS_TAG: Uri = Uri::from_static("http://www.semanticdesktop.org/ontologies/2007/08/15/nao#hasTag");
    pub const NUMERIC_RATING: Uri =
        Uri::from_static("http://www.semanticdesktop.org/ontologies/2007/08/15/nao#numericRating");
    pub const DESCRIPTION: Uri =
        Uri::from_static("http://www.semanticdesktop.org/ontologies/2007/08/15/nao#description");
    pub const USER_VISIBLE: Uri =
        Uri::from_static("http://www.semanticdesktop.org/ontologies/2007/08/15/nao#userVisible");
}

pub mod nie {
    use super::Uri;
    pub const INFORMATION_ELEMENT: Uri =
        Uri::from_static("http://www.semanticdesktop.org/ontologies/2007/01/19/nie#InformationElement");
    pub const URL: Uri = Uri::from_static("http://www.semanticdesktop.org/ontologies/2007/01/19/nie#url");
    pub const TITLE: Uri = Uri::from_static("http://www.semanticdesktop.org/ontologies/2007/01/19/nie#title");
    pub const CREATED: Uri = Uri::from_static("http://www.semanticdesktop.org/ontologies/2007/01/19/nie#created");
    pub const LAST_MODIFIED: Uri =
        Uri::from_static("http://www.semanticdesktop.org/ontologies/2007/01/19/nie#lastModified");
    pub const CONTENT_SIZE: Uri =
        Uri::from_static("http://www.semanticdesktop.org/ontologies/2007/01/19/nie#contentSize");
    pub const RELATED_TO: Uri =
        Uri::from_static("http://www.semanticdesktop.org/ontologies/2007/01/19/nie#relatedTo");
    pub const PLAIN_TEXT_CONTENT: Uri =
        Uri::from_static("http://www.semanticdesktop.org/ontologies/2007/01/19/nie#plainTextContent");
}

pub mod nfo {
    use super::Uri;
    pub const FILE_DATA_OBJECT: Uri =
        Uri::from_static("http://www.semanticdesktop.org/ontologies/2007/03/22/nfo#FileDataObject");
    pub const FOLDER: Uri = Uri::from_static("http://www.semanticdesktop.org/ontologies/2007/03/22/nfo#Folder");
    pub const DOCUMENT: Uri = Uri::from_static("http://www.semanticdesktop.org/ontologies/2007/03/22/nfo#Document");
    pub const IMAGE: Uri = Uri::from_static("http://www.semanticdesktop.org/ontologies/2007/03/22/nfo#Image");
    pub const VIDEO: Uri = Uri::from_static("http://www.semanticdesktop.org/ontologies/2007/03/22/nfo#Video");
    pub const AUDIO: Uri = Uri::from_static("http://www.semanticdesktop.org/ontologies/2007/03/22/nfo#Audio");
    pub const FILE_NAME: Uri = Uri::from_static("http://www.semanticdesktop.org/ontologies/2007/03/22/nfo#fileName");
    pub const FILE_SIZE: Uri = Uri::from_static("http://www.semanticdesktop.org/ontologies/2007/03/22/nfo#fileSize");
    pub const FILE_CREATED: Uri =
        Uri::from_static("http://www.semanticdesktop.org/ontologies/2007/03/22/nfo#fileCreated");
    pub const FILE_LAST_MODIFIED: Uri =
        Uri::from_static("http://www.semanticdesktop.org/ontologies/2007/03/22/nfo#fileLastModified");
    pub const FILE_OWNER: Uri = Uri::from_static("http://www.semanticdesktop.org/ontologies/2007/03/22/nfo#fileOwner");
}

pub mod nmo {
    use super::Uri;
    pub const MESSAGE: Uri = Uri::from_static("http://www.semanticdesktop.org/ontologies/2007/03/22/nmo#Message");
    pub const EMAIL: Uri = Uri::from_static("http://www.semanticdesktop.org/ontologies/2007/03/22/nmo#Email");
    pub const MESSAGE_SUBJECT: Uri =
        Uri::from_static("http://www.semanticdesktop.org/ontologies/2007/03/22/nmo#messageSubject");
    pub const MESSAGE_FROM: Uri =
        Uri::from_static("http://www.semanticdesktop.org/ontologies/2007/03/22/nmo#messageFrom");
    pub const MESSAGE_RECIPIENT: Uri =
        Uri::from_static("http://www.semanticdesktop.org/ontologies/2007/03/22/nmo#messageRecipient");
    pub const SENT_DATE: Uri = Uri::from_static("http://www.semanticdesktop.org/ontologies/2007/03/22/nmo#sentDate");
    pub const RECEIVED_DATE: Uri =
        Uri::from_static("http://www.semanticdesktop.org/ontologies/2007/03/22/nmo#receivedDate");
}

pub mod nco {
    use super::Uri;
    pub const CONTACT: Uri = Uri::from_static("http://www.semanticdesktop.org/ontologies/2007/03/22/nco#Contact");
    pub const FULLNAME: Uri = Uri::from_static("http://www.semanticdesktop.org/ontologies/2007/03/22/nco#fullname");
    pub const HAS_EMAIL_ADDRESS: Uri =
        Uri::from_static("http://www.semanticdesktop.org/ontologies/2007/03/22/nco#hasEmailAddress");
    pub const EMAIL_ADDRESS: Uri =
        Uri::from_static("http://www.semanticdesktop.org/ontologies/2007/03/22/nco#emailAddress");
    pub const CREATOR: Uri = Uri::from_static("http://www.semanticdesktop.org/ontologies/2007/03/22/nco#creator");
}

pub mod nmm {
    use super::Uri;
    pub const PERFORMER: Uri = Uri::from_static("http://www.semanticdesktop.org/ontologies/2009/02/19/nmm#performer");
}

pub mod ncal {
    use super::Uri;
    pub const EVENT: Uri = Uri::from_static("http://www.semanticdesktop.org/ontologies/2007/04/02/ncal#Event");
    pub const SUMMARY: Uri = Uri::from_static("http://www.semanticdesktop.org/ontologies/2007/04/02/ncal#summary");
    pub const DESCRIPTION: Uri =
        Uri::from_static("http://www.semanticdesktop.org/ontologies/2007/04/02/ncal#description");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn date_uri_parts() {
        let uri = Uri::new("date://dayofweek/offset");
        assert_eq!(uri.scheme(), Some("date"));
        assert_eq!(uri.host(), Some("dayofweek"));
        assert_eq!(uri.path(), "/offset");
        let uri = Uri::new("property://size/");
        assert_eq!(pseudo_property_name(&uri), Some("size"));
        assert_eq!(uri.path(), "/");
        assert_eq!(pseudo_property_name(&nie::TITLE), None);
    }
}
