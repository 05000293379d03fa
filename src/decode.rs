//! Total page count decoding from the probe page.

use tokio::io::AsyncReadExt;

use crate::error::{Error, Result};
use crate::types::{PageBody, PageCount};

/// Extracts the total page count from a listing page
#[async_trait::async_trait]
pub trait PageCountDecoder: Send + Sync {
    /// Consume `body` and return the listing's total page count
    async fn decode(&self, body: PageBody) -> Result<PageCount>;
}

/// Reads a top-level integer field from a JSON page
#[derive(Clone, Debug)]
pub struct JsonTotalPages {
    field: String,
}

impl JsonTotalPages {
    /// Decoder for the given field name
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
        }
    }

    /// Decode from an already-buffered page
    pub fn decode_slice(&self, bytes: &[u8]) -> Result<PageCount> {
        let value: serde_json::Value = serde_json::from_slice(bytes)
            .map_err(|e| Error::Decode(format!("page is not valid JSON: {e}")))?;

        let raw = value
            .get(&self.field)
            .ok_or_else(|| Error::Decode(format!("field {:?} is missing", self.field)))?;
        let total = raw.as_u64().ok_or_else(|| {
            Error::Decode(format!(
                "field {:?} is not a non-negative integer: {raw}",
                self.field
            ))
        })?;
        let total = u32::try_from(total)
            .map_err(|_| Error::Decode(format!("total page count {total} is out of range")))?;

        PageCount::new(total)
    }
}

impl Default for JsonTotalPages {
    fn default() -> Self {
        Self::new("totalPages")
    }
}

#[async_trait::async_trait]
impl PageCountDecoder for JsonTotalPages {
    async fn decode(&self, mut body: PageBody) -> Result<PageCount> {
        let mut bytes = Vec::new();
        body.read_to_end(&mut bytes)
            .await
            .map_err(|e| Error::Decode(format!("cannot read page: {e}")))?;
        self.decode_slice(&bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_total_pages_field() {
        let decoder = JsonTotalPages::default();
        let count = decoder
            .decode_slice(br#"{"page":1,"totalPages":12,"products":[]}"#)
            .unwrap();
        assert_eq!(count.get(), 12);
    }

    #[test]
    fn honours_custom_field_name() {
        let decoder = JsonTotalPages::new("pages");
        assert_eq!(decoder.decode_slice(br#"{"pages":4}"#).unwrap().get(), 4);
        assert!(decoder.decode_slice(br#"{"totalPages":4}"#).is_err());
    }

    #[test]
    fn rejects_zero_negative_and_non_integer_counts() {
        let decoder = JsonTotalPages::default();
        for payload in [
            &br#"{"totalPages":0}"#[..],
            br#"{"totalPages":-2}"#,
            br#"{"totalPages":"3"}"#,
            br#"{"totalPages":2.5}"#,
            br#"{"totalPages":99999999999}"#,
        ] {
            let err = decoder.decode_slice(payload).unwrap_err();
            assert!(
                matches!(err, Error::Decode(_)),
                "{} should be a decode error, got {err:?}",
                String::from_utf8_lossy(payload)
            );
        }
    }

    #[test]
    fn rejects_non_json_body() {
        let err = JsonTotalPages::default()
            .decode_slice(b"<html>maintenance</html>")
            .unwrap_err();
        assert_eq!(err.error_code(), "decode_error");
    }

    #[tokio::test]
    async fn decodes_from_stream() {
        let body: PageBody = Box::pin(std::io::Cursor::new(&br#"{"totalPages":2}"#[..]));
        let count = JsonTotalPages::default().decode(body).await.unwrap();
        assert_eq!(count.get(), 2);
    }

    #[tokio::test]
    async fn unreadable_body_is_a_decode_error() {
        let chunks = futures::stream::iter(vec![
            Ok::<&'static [u8], std::io::Error>(br#"{"totalPa"#),
            Err(std::io::Error::other("connection reset")),
        ]);
        let body: PageBody = Box::pin(tokio_util::io::StreamReader::new(chunks));

        let err = JsonTotalPages::default().decode(body).await.unwrap_err();

        match err {
            Error::Decode(message) => assert!(message.contains("connection reset"), "{message}"),
            other => panic!("expected decode error, got {other:?}"),
        }
    }
}
