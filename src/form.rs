use derive_more::Display;

/// Reasons a submitted post or reply form is turned away.
#[derive(Debug, Display, PartialEq)]
pub enum FormError {
    #[display(fmt = "missing required field '{}'", _0)]
    MissingField(&'static str),
    #[display(fmt = "field '{}' is longer than {} characters", field, max)]
    TooLong { field: &'static str, max: usize },
    #[display(fmt = "'{}' is not an allowed author", _0)]
    UnknownAuthor(String),
    #[display(fmt = "at most {} attachments are allowed, got {}", limit, count)]
    TooManyAttachments { limit: usize, count: usize },
}

/// URL-encoded form body that keeps repeated keys.
///
/// Attachment metadata arrives as parallel lists (`attachment_urls`,
/// `attachment_names`, ...), which `web::Form` cannot represent.
#[derive(Debug, Default)]
pub struct FormFields {
    pairs: Vec<(String, String)>,
}

impl FormFields {
    pub fn parse(body: &[u8]) -> Self {
        Self {
            pairs: url::form_urlencoded::parse(body).into_owned().collect(),
        }
    }

    /// First value submitted under `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Every value submitted under `name`, in submission order.
    pub fn get_all(&self, name: &str) -> Vec<&str> {
        self.pairs
            .iter()
            .filter(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
            .collect()
    }

    /// Trimmed value of a field that must not be blank.
    pub fn require(&self, name: &'static str) -> Result<String, FormError> {
        self.get(name)
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_owned)
            .ok_or(FormError::MissingField(name))
    }

    /// Trimmed value of an optional field; blank when absent.
    pub fn optional(&self, name: &str) -> String {
        self.get(name).map(str::trim).unwrap_or_default().to_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_keys_are_kept_in_order() {
        let form = FormFields::parse(b"a=1&b=x&a=2&a=3");
        assert_eq!(form.get("a"), Some("1"));
        assert_eq!(form.get_all("a"), vec!["1", "2", "3"]);
        assert_eq!(form.get_all("b"), vec!["x"]);
        assert!(form.get_all("c").is_empty());
    }

    #[test]
    fn values_are_decoded() {
        let form = FormFields::parse(b"title=Hello+World&content=%23+code%0A");
        assert_eq!(form.get("title"), Some("Hello World"));
        assert_eq!(form.get("content"), Some("# code\n"));
    }

    #[test]
    fn require_rejects_blank() {
        let form = FormFields::parse(b"title=+++&content=body");
        assert_eq!(
            form.require("title"),
            Err(FormError::MissingField("title"))
        );
        assert_eq!(
            form.require("author"),
            Err(FormError::MissingField("author"))
        );
        assert_eq!(form.require("content"), Ok("body".to_owned()));
    }

    #[test]
    fn optional_defaults_to_empty() {
        let form = FormFields::parse(b"description=+short+");
        assert_eq!(form.optional("description"), "short");
        assert_eq!(form.optional("missing"), "");
    }
}
