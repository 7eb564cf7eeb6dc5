//! `multipart/x-mixed-replace` framing.
//!
//! Browsers replace the displayed image with each new part. A part is only
//! shown once the boundary that follows it arrives, so every frame carries
//! the image and then the header of the next part.

use axum::body::Bytes;
use uuid::Uuid;

/// Writes image frames as parts of a `multipart/x-mixed-replace` body.
#[derive(Debug, Clone)]
pub struct MultipartWriter {
    boundary: String,
    part_content_type: String,
    started: bool,
}

impl MultipartWriter {
    /// Create a writer with a random boundary.
    #[must_use]
    pub fn new(part_content_type: impl Into<String>) -> Self {
        Self::with_boundary(Uuid::new_v4().simple().to_string(), part_content_type)
    }

    /// Create a writer with a fixed boundary.
    #[must_use]
    pub fn with_boundary(boundary: impl Into<String>, part_content_type: impl Into<String>) -> Self {
        Self {
            boundary: boundary.into(),
            part_content_type: part_content_type.into(),
            started: false,
        }
    }

    /// The part boundary.
    #[must_use]
    pub fn boundary(&self) -> &str {
        &self.boundary
    }

    /// Value of the response `Content-Type` header.
    #[must_use]
    pub fn content_type(&self) -> String {
        format!("multipart/x-mixed-replace;boundary={}", self.boundary)
    }

    /// Encode one image.
    ///
    /// The first frame also opens the first part.
    pub fn frame(&mut self, image: &[u8]) -> Bytes {
        let mut out = Vec::with_capacity(image.len() + 2 * (self.boundary.len() + 64));
        if !self.started {
            self.started = true;
            out.extend_from_slice(self.part_header(true).as_bytes());
        }
        out.extend_from_slice(image);
        out.extend_from_slice(self.part_header(false).as_bytes());
        Bytes::from(out)
    }

    fn part_header(&self, first: bool) -> String {
        let lead = if first { "" } else { "\r\n" };
        format!(
            "{lead}--{}\r\nContent-Type: {}\r\n\r\n",
            self.boundary, self.part_content_type
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_type() {
        let writer = MultipartWriter::with_boundary("abc", "image/svg+xml");
        assert_eq!(writer.content_type(), "multipart/x-mixed-replace;boundary=abc");
    }

    #[test]
    fn test_first_frame_opens_part() {
        let mut writer = MultipartWriter::with_boundary("abc", "image/svg+xml");
        let frame = writer.frame(b"<svg/>");

        assert_eq!(
            &frame[..],
            b"--abc\r\nContent-Type: image/svg+xml\r\n\r\n<svg/>\r\n--abc\r\nContent-Type: image/svg+xml\r\n\r\n"
        );
    }

    #[test]
    fn test_later_frames_continue_open_part() {
        let mut writer = MultipartWriter::with_boundary("abc", "image/svg+xml");
        writer.frame(b"<svg/>");
        let frame = writer.frame(b"<svg id=\"2\"/>");

        assert_eq!(
            &frame[..],
            b"<svg id=\"2\"/>\r\n--abc\r\nContent-Type: image/svg+xml\r\n\r\n"
        );
    }

    #[test]
    fn test_random_boundaries_differ() {
        let a = MultipartWriter::new("image/svg+xml");
        let b = MultipartWriter::new("image/svg+xml");

        assert_ne!(a.boundary(), b.boundary());
        assert_eq!(a.boundary().len(), 32);
    }
}
