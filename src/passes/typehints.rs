use crate::matcher::Pass;
use crate::term::Term;
use crate::vocabulary::{Uri, ncal, nco, nfo, nmo};

fn type_from_word(word: &str) -> Option<Uri> {
    let uri = match word.to_lowercase().as_str() {
        "mail" | "mails" | "email" | "emails" | "message" | "messages" => nmo::MESSAGE,
        "file" | "files" => nfo::FILE_DATA_OBJECT,
        "image" | "images" | "picture" | "pictures" | "photo" | "photos" => nfo::IMAGE,
        "video" | "videos" | "movie" | "movies" => nfo::VIDEO,
        "music" | "song" | "songs" | "audio" => nfo::AUDIO,
        "document" | "documents" => nfo::DOCUMENT,
        "contact" | "contacts" | "person" | "people" => nco::CONTACT,
        "event" | "events" => ncal::EVENT,
        "folder" | "folders" | "directory" | "directories" => nfo::FOLDER,
        _ => return None,
    };
    Some(uri)
}

/// Words naming a kind of resource ("mails", "pictures") become type restrictions.
pub struct TypeHints;

impl Pass for TypeHints {
    fn run(&self, captures: &[Term]) -> Vec<Term> {
        captures
            .first()
            .and_then(Term::literal_str)
            .and_then(type_from_word)
            .map(|uri| vec![Term::resource_type(uri)])
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plural_and_case() {
        assert_eq!(TypeHints.run(&[Term::literal("Mails")]), vec![Term::resource_type(nmo::MESSAGE)]);
        assert_eq!(TypeHints.run(&[Term::literal("photos")]), vec![Term::resource_type(nfo::IMAGE)]);
        assert!(TypeHints.run(&[Term::literal("tag")]).is_empty());
    }
}
