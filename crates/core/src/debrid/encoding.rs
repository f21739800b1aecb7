//! Hash-list encodings for batched availability requests.
//!
//! Each provider expects a list of infohashes in its own shape. Getting it
//! wrong tends to silently drop results, so the encodings live here where
//! they can be tested without any network I/O.

use crate::http::{HttpRequest, RequestBody};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HashListEncoding {
    /// `/base/h1/h2/h3` appended to the URL path.
    PathSegments,
    /// Form fields `name[0]=h1&name[1]=h2`.
    IndexedForm(&'static str),
    /// Repeated query parameter `key=h1&key=h2`.
    RepeatedQuery(&'static str),
    /// One query parameter `key=h1,h2`.
    CommaList(&'static str),
}

impl HashListEncoding {
    pub fn apply(&self, mut request: HttpRequest, hashes: &[String]) -> HttpRequest {
        match self {
            HashListEncoding::PathSegments => {
                request.url = format!("{}/{}", request.url.trim_end_matches('/'), hashes.join("/"));
                request
            }
            HashListEncoding::IndexedForm(name) => {
                let mut fields = match std::mem::replace(&mut request.body, RequestBody::Empty) {
                    RequestBody::Form(existing) => existing,
                    _ => Vec::new(),
                };
                fields.extend(
                    hashes
                        .iter()
                        .enumerate()
                        .map(|(i, hash)| (format!("{}[{}]", name, i), hash.clone())),
                );
                request.form(fields)
            }
            HashListEncoding::RepeatedQuery(key) => hashes
                .iter()
                .fold(request, |request, hash| request.query(*key, hash.as_str())),
            HashListEncoding::CommaList(key) => request.query(*key, hashes.join(",")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hashes() -> Vec<String> {
        vec!["aaa".to_string(), "bbb".to_string(), "ccc".to_string()]
    }

    #[test]
    fn test_path_segments() {
        let request = HashListEncoding::PathSegments
            .apply(HttpRequest::get("https://api/instantAvailability/"), &hashes());
        assert_eq!(request.full_url(), "https://api/instantAvailability/aaa/bbb/ccc");
    }

    #[test]
    fn test_indexed_form() {
        let request = HashListEncoding::IndexedForm("magnets")
            .apply(HttpRequest::post("https://api/magnet/instant"), &hashes());
        assert_eq!(
            request.body,
            RequestBody::Form(vec![
                ("magnets[0]".to_string(), "aaa".to_string()),
                ("magnets[1]".to_string(), "bbb".to_string()),
                ("magnets[2]".to_string(), "ccc".to_string()),
            ])
        );
        assert_eq!(request.full_url(), "https://api/magnet/instant");
    }

    #[test]
    fn test_indexed_form_keeps_existing_fields() {
        let request = HttpRequest::post("https://api").form(vec![("agent".into(), "x".into())]);
        let request = HashListEncoding::IndexedForm("magnets").apply(request, &hashes()[..1]);
        assert_eq!(
            request.body,
            RequestBody::Form(vec![
                ("agent".to_string(), "x".to_string()),
                ("magnets[0]".to_string(), "aaa".to_string()),
            ])
        );
    }

    #[test]
    fn test_repeated_query() {
        let request = HashListEncoding::RepeatedQuery("items[]")
            .apply(HttpRequest::get("https://api/cache/check"), &hashes());
        assert_eq!(
            request.full_url(),
            "https://api/cache/check?items[]=aaa&items[]=bbb&items[]=ccc"
        );
    }

    #[test]
    fn test_comma_list() {
        let request = HashListEncoding::CommaList("hash")
            .apply(HttpRequest::get("https://api/checkcached"), &hashes());
        assert_eq!(request.full_url(), "https://api/checkcached?hash=aaa%2Cbbb%2Cccc");
    }
}
