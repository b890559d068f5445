//! Minimal `multipart/form-data` encoder (RFC 7578).
//!
//! Only what the CSV upload needs: text fields and in-memory files, written
//! in insertion order into one buffer.

use uuid::Uuid;

pub struct MultipartForm {
    boundary: String,
    body: Vec<u8>,
}

impl MultipartForm {
    pub fn new() -> Self {
        Self::with_boundary(format!("langsmith-{}", Uuid::new_v4().simple()))
    }

    pub fn with_boundary(boundary: impl Into<String>) -> Self {
        Self {
            boundary: boundary.into(),
            body: Vec::new(),
        }
    }

    pub fn text(&mut self, name: &str, value: &str) -> &mut Self {
        self.open_part(name, None, None);
        self.body.extend_from_slice(value.as_bytes());
        self.body.extend_from_slice(b"\r\n");
        self
    }

    pub fn file(&mut self, name: &str, filename: &str, content_type: &str, data: &[u8]) -> &mut Self {
        self.open_part(name, Some(filename), Some(content_type));
        self.body.extend_from_slice(data);
        self.body.extend_from_slice(b"\r\n");
        self
    }

    /// Closes the form, returning the body and its `content-type` value.
    pub fn finish(mut self) -> (Vec<u8>, String) {
        self.body
            .extend_from_slice(format!("--{}--\r\n", self.boundary).as_bytes());
        let content_type = format!("multipart/form-data; boundary={}", self.boundary);
        (self.body, content_type)
    }

    fn open_part(&mut self, name: &str, filename: Option<&str>, content_type: Option<&str>) {
        let mut head = format!(
            "--{}\r\nContent-Disposition: form-data; name=\"{}\"",
            self.boundary,
            escape(name)
        );
        if let Some(filename) = filename {
            head.push_str(&format!("; filename=\"{}\"", escape(filename)));
        }
        head.push_str("\r\n");
        if let Some(content_type) = content_type {
            head.push_str(&format!("Content-Type: {content_type}\r\n"));
        }
        head.push_str("\r\n");
        self.body.extend_from_slice(head.as_bytes());
    }
}

impl Default for MultipartForm {
    fn default() -> Self {
        Self::new()
    }
}

// Quote and line breaks are percent-escaped, as browsers do.
fn escape(value: &str) -> String {
    value
        .replace('"', "%22")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_fields_and_closing_boundary() {
        let mut form = MultipartForm::with_boundary("XYZ");
        form.text("name", "demo")
            .file("file", "dataset.csv", "text/csv", b"a,b\n1,2\n");
        let (body, content_type) = form.finish();

        assert_eq!(content_type, "multipart/form-data; boundary=XYZ");
        assert_eq!(
            String::from_utf8(body).unwrap(),
            "--XYZ\r\n\
             Content-Disposition: form-data; name=\"name\"\r\n\
             \r\n\
             demo\r\n\
             --XYZ\r\n\
             Content-Disposition: form-data; name=\"file\"; filename=\"dataset.csv\"\r\n\
             Content-Type: text/csv\r\n\
             \r\n\
             a,b\n1,2\n\r\n\
             --XYZ--\r\n"
        );
    }

    #[test]
    fn escapes_quotes_in_names() {
        let mut form = MultipartForm::with_boundary("B");
        form.text("a\"b", "v");
        let (body, _) = form.finish();
        assert!(String::from_utf8(body).unwrap().contains("name=\"a%22b\""));
    }

    #[test]
    fn random_boundaries_differ() {
        let (_, a) = MultipartForm::new().finish();
        let (_, b) = MultipartForm::new().finish();
        assert_ne!(a, b);
    }
}
