//! Field-level rules shared by the blog domain objects.
//!
//! Every check returns the first rule the value breaks. Callers run all the
//! checks for a mutation before writing any field.

use regex::Regex;
use std::collections::HashSet;
use std::sync::OnceLock;

pub const BLOG_POST_ID_LENGTH: usize = 12;

const TAG_PATTERN: &str = r"^[a-z ]+$";
const TITLE_PATTERN: &str = r"^[a-zA-Z]+( [a-zA-Z]+)*$";
const URL_FRAGMENT_PATTERN: &str = r"^[a-z0-9]+(-[a-z0-9]+)*$";
const THUMBNAIL_EXTENSIONS: &[&str] = &["svg", "png", "jpg", "jpeg", "webp"];

/// Length limits applied by validation, normally taken from [`crate::Config`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Limits {
    pub max_title_chars: usize,
    pub max_url_fragment_chars: usize,
    pub max_summary_chars: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_title_chars: 40,
            max_url_fragment_chars: 65,
            max_summary_chars: 240,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("{0}")]
    Id(String),
    #[error("{0}")]
    Title(String),
    #[error("{0}")]
    Tags(String),
    #[error("{0}")]
    Thumbnail(String),
    #[error("{0}")]
    UrlFragment(String),
    #[error("{0}")]
    Content(String),
    #[error("{0}")]
    Summary(String),
    #[error("{0}")]
    CustomizationArg(String),
    #[error("{0}")]
    User(String),
}

impl ValidationError {
    pub fn field(&self) -> &'static str {
        match self {
            ValidationError::Id(_) => "id",
            ValidationError::Title(_) => "title",
            ValidationError::Tags(_) => "tags",
            ValidationError::Thumbnail(_) => "thumbnail_filename",
            ValidationError::UrlFragment(_) => "url_fragment",
            ValidationError::Content(_) => "content",
            ValidationError::Summary(_) => "summary",
            ValidationError::CustomizationArg(_) => "customization_args",
            ValidationError::User(_) => "user",
        }
    }

    pub fn message(&self) -> String {
        self.to_string()
    }
}

pub type ValidationResult = std::result::Result<(), ValidationError>;

fn regex(cell: &'static OnceLock<Regex>, pattern: &str) -> &'static Regex {
    cell.get_or_init(|| Regex::new(pattern).expect("static pattern compiles"))
}

fn tag_regex() -> &'static Regex {
    static CELL: OnceLock<Regex> = OnceLock::new();
    regex(&CELL, TAG_PATTERN)
}

fn title_regex() -> &'static Regex {
    static CELL: OnceLock<Regex> = OnceLock::new();
    regex(&CELL, TITLE_PATTERN)
}

fn url_fragment_regex() -> &'static Regex {
    static CELL: OnceLock<Regex> = OnceLock::new();
    regex(&CELL, URL_FRAGMENT_PATTERN)
}

pub fn post_id(id: &str) -> ValidationResult {
    if id.chars().count() != BLOG_POST_ID_LENGTH {
        return Err(ValidationError::Id("Invalid Blog Post ID.".to_string()));
    }
    Ok(())
}

/// Length is always enforced; `strict` adds non-emptiness and, when
/// `require_words` is set, the words-and-spaces character set.
pub fn title(title: &str, strict: bool, require_words: bool, limits: &Limits) -> ValidationResult {
    if title.chars().count() > limits.max_title_chars {
        return Err(ValidationError::Title(format!(
            "Blog Post title should at most have {} chars, received: {}",
            limits.max_title_chars, title
        )));
    }

    if strict {
        if title.is_empty() {
            return Err(ValidationError::Title("Title should not be empty".to_string()));
        }
        if require_words && !title_regex().is_match(title) {
            return Err(ValidationError::Title(format!(
                "Title field contains invalid characters. Only words (a-zA-Z) \
                 separated by spaces are allowed. Received {}",
                title
            )));
        }
    }

    Ok(())
}

pub fn tags(tags: &[String], strict: bool) -> ValidationResult {
    for tag in tags {
        if !tag_regex().is_match(tag) {
            return Err(ValidationError::Tags(format!(
                "Tags should only contain lowercase letters and spaces, received: '{}'",
                tag
            )));
        }

        if tag.starts_with(' ') || tag.ends_with(' ') {
            return Err(ValidationError::Tags(format!(
                "Tags should not start or end with whitespace, received: '{}'",
                tag
            )));
        }

        if tag.contains("  ") {
            return Err(ValidationError::Tags(format!(
                "Adjacent whitespace in tags should be collapsed, received: '{}'",
                tag
            )));
        }
    }

    if strict && tags.is_empty() {
        return Err(ValidationError::Tags(
            "Atleast one tag should be selected".to_string(),
        ));
    }

    let unique: HashSet<&String> = tags.iter().collect();
    if unique.len() != tags.len() {
        return Err(ValidationError::Tags(
            "Some tags duplicate each other".to_string(),
        ));
    }

    Ok(())
}

pub fn url_fragment(fragment: &str, limits: &Limits) -> ValidationResult {
    if fragment.is_empty() {
        return Err(ValidationError::UrlFragment(
            "Blog Post URL Fragment field should not be empty.".to_string(),
        ));
    }

    if fragment.chars().count() > limits.max_url_fragment_chars {
        return Err(ValidationError::UrlFragment(format!(
            "Blog Post URL Fragment field should not exceed {} characters, received {}.",
            limits.max_url_fragment_chars, fragment
        )));
    }

    if !url_fragment_regex().is_match(fragment) {
        return Err(ValidationError::UrlFragment(format!(
            "Blog Post URL Fragment field contains invalid characters. Only \
             lowercase words separated by hyphens are allowed. Received {}.",
            fragment
        )));
    }

    Ok(())
}

/// Thumbnail rules common to posts and summaries.
pub fn thumbnail(filename: Option<&str>, strict: bool) -> ValidationResult {
    let Some(filename) = filename else {
        if strict {
            return Err(ValidationError::Thumbnail(
                "Expected thumbnail filename to be a string, received: None.".to_string(),
            ));
        }
        return Ok(());
    };

    if filename.is_empty() {
        return Err(ValidationError::Thumbnail(
            "Thumbnail filename should not be empty.".to_string(),
        ));
    }

    thumbnail_filename(filename)
}

/// Filename legality: no path components, a single known image extension.
pub fn thumbnail_filename(filename: &str) -> ValidationResult {
    if filename.starts_with('.') {
        return Err(ValidationError::Thumbnail(
            "Thumbnail filename should not start with a dot.".to_string(),
        ));
    }

    if filename.contains('/') || filename.contains("..") {
        return Err(ValidationError::Thumbnail(
            "Thumbnail filename should not include slashes or consecutive dot characters."
                .to_string(),
        ));
    }

    let Some((_, extension)) = filename.rsplit_once('.') else {
        return Err(ValidationError::Thumbnail(
            "Thumbnail filename should include an extension.".to_string(),
        ));
    };

    if !THUMBNAIL_EXTENSIONS.contains(&extension.to_lowercase().as_str()) {
        return Err(ValidationError::Thumbnail(format!(
            "Expected a filename ending in one of {}, received {}",
            THUMBNAIL_EXTENSIONS.join(", "),
            filename
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn owned(tags: &[&str]) -> Vec<String> {
        tags.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn test_post_id_length() {
        assert!(post_id("validblogid1").is_ok());
        assert_eq!(
            post_id("short"),
            Err(ValidationError::Id("Invalid Blog Post ID.".to_string()))
        );
    }

    #[test]
    fn test_tag_messages() {
        let err = tags(&owned(&["Tag"]), false).unwrap_err();
        assert!(err.message().contains("only contain lowercase letters"));

        let err = tags(&owned(&[" tag"]), false).unwrap_err();
        assert!(err.message().contains("should not start or end with whitespace"));

        let err = tags(&owned(&["two  words"]), false).unwrap_err();
        assert!(err.message().contains("Adjacent whitespace"));

        let err = tags(&owned(&["one", "one"]), false).unwrap_err();
        assert_eq!(err.message(), "Some tags duplicate each other");

        let err = tags(&[], true).unwrap_err();
        assert_eq!(err.message(), "Atleast one tag should be selected");
        assert!(tags(&[], false).is_ok());
    }

    #[test]
    fn test_title_rules() {
        let limits = Limits::default();

        assert!(title("", false, true, &limits).is_ok());
        assert_eq!(
            title("", true, true, &limits).unwrap_err().message(),
            "Title should not be empty"
        );
        assert!(title("Sample Title", true, true, &limits).is_ok());
        assert!(title("Title 42", true, true, &limits).is_err());
        assert!(title("Title 42", true, false, &limits).is_ok());

        let long = "a".repeat(limits.max_title_chars + 1);
        let err = title(&long, false, true, &limits).unwrap_err();
        assert!(err.message().starts_with("Blog Post title should at most have 40 chars"));
    }

    #[test]
    fn test_url_fragment_rules() {
        let limits = Limits::default();

        assert!(url_fragment("sample-title", &limits).is_ok());
        assert!(url_fragment("post-2", &limits).is_ok());
        assert!(url_fragment("", &limits).is_err());
        assert!(url_fragment("Sample-Title", &limits).is_err());
        assert!(url_fragment("double--dash", &limits).is_err());
        assert!(url_fragment(&"a".repeat(66), &limits).is_err());
    }

    #[test]
    fn test_thumbnail_rules() {
        assert!(thumbnail(None, false).is_ok());
        assert!(thumbnail(None, true).is_err());
        assert_eq!(
            thumbnail(Some(""), false).unwrap_err().message(),
            "Thumbnail filename should not be empty."
        );
        assert!(thumbnail(Some("thumbnail.svg"), true).is_ok());
        assert!(thumbnail(Some(".svg"), true).is_err());
        assert!(thumbnail(Some("dir/image.svg"), true).is_err());
        assert!(thumbnail(Some("image"), true).is_err());
        assert!(thumbnail(Some("image.exe"), true).is_err());
    }

    fn well_formed_tag() -> impl Strategy<Value = String> {
        prop::collection::vec("[a-z]{1,6}", 1..4).prop_map(|words| words.join(" "))
    }

    proptest! {
        #[test]
        fn well_formed_distinct_tags_pass(set in prop::collection::hash_set(well_formed_tag(), 0..6)) {
            let tags_list: Vec<String> = set.into_iter().collect();
            prop_assert!(tags(&tags_list, false).is_ok());
            prop_assert_eq!(tags(&tags_list, true).is_ok(), !tags_list.is_empty());
        }

        #[test]
        fn tag_validity_matches_word_grammar(tag in "[a-zA-Z ]{0,12}") {
            let grammar = Regex::new(r"^[a-z]+( [a-z]+)*$").unwrap();
            prop_assert_eq!(tags(&[tag.clone()], false).is_ok(), grammar.is_match(&tag));
        }

        #[test]
        fn duplicated_tag_always_fails(tag in well_formed_tag()) {
            prop_assert!(tags(&[tag.clone(), tag], false).is_err());
        }

        #[test]
        fn title_validity_matches_length_and_pattern(candidate in "[a-zA-Z0-9 ]{0,50}") {
            let limits = Limits::default();
            let fits = candidate.chars().count() <= limits.max_title_chars;
            prop_assert_eq!(title(&candidate, false, true, &limits).is_ok(), fits);

            let words = Regex::new(TITLE_PATTERN).unwrap().is_match(&candidate);
            prop_assert_eq!(
                title(&candidate, true, true, &limits).is_ok(),
                fits && !candidate.is_empty() && words
            );
        }
    }
}
