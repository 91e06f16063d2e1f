//! Records decoded from the petitions feed
use serde::{Deserialize, Serialize};

/// A single petition as returned by the feed.
///
/// Keys on the wire are camelCase (`signatureCount`), any key not listed
/// here is ignored.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Petition {
    /// Identity of the petition
    pub id: String,
    /// Headline shown in the list
    pub title: String,
    /// Full text, may span several paragraphs
    pub body: String,
    /// Number of signatures collected so far
    pub signature_count: i64,
    /// Link to the petition page
    pub url: String,
}

/// Top level object of a feed response, wrapping the records under `results`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Petitions {
    /// Records in server order
    pub results: Vec<Petition>,
}

/// Decode a raw response body into the records it wraps.
///
/// Decoding is all-or-nothing: a single malformed record, or a missing
/// `results` key, fails the whole body and no record is returned.
pub fn decode_envelope(body: &[u8]) -> Result<Vec<Petition>, serde_json::Error> {
    let envelope: Petitions = serde_json::from_slice(body)?;
    Ok(envelope.results)
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn decodes_single_record() {
        let body = br#"{"results":[{"id":"1","title":"T","body":"B","signatureCount":5,"url":"https://x"}]}"#;
        let decoded = decode_envelope(body).unwrap();
        assert_eq!(
            decoded,
            vec![Petition {
                id: "1".into(),
                title: "T".into(),
                body: "B".into(),
                signature_count: 5,
                url: "https://x".into(),
            }]
        );
    }

    #[test]
    fn tolerates_unknown_fields() {
        let body = br#"{
            "metadata": {"responseInfo": {"status": 200}},
            "results": [{
                "id": "2", "type": "petition", "title": "T", "body": "B",
                "signatureCount": 10, "signatureThreshold": 100000,
                "url": "https://y", "issues": []
            }]
        }"#;
        let decoded = decode_envelope(body).unwrap();
        assert_eq!(decoded.len(), 1);
        assert_eq!(decoded[0].signature_count, 10);
    }

    #[test]
    fn empty_results() {
        let decoded = decode_envelope(br#"{"results":[]}"#).unwrap();
        assert!(decoded.is_empty());
    }

    #[test]
    fn missing_results_is_an_error() {
        assert!(decode_envelope(br#"{"metadata":{}}"#).is_err());
    }

    #[test]
    fn snake_case_count_is_rejected() {
        let body = br#"{"results":[{"id":"1","title":"T","body":"B","signature_count":5,"url":"u"}]}"#;
        assert!(decode_envelope(body).is_err());
    }

    fn petition() -> impl Strategy<Value = Petition> {
        (".*", ".*", ".*", any::<i64>(), ".*").prop_map(|(id, title, body, signature_count, url)| {
            Petition {
                id,
                title,
                body,
                signature_count,
                url,
            }
        })
    }

    proptest! {
        /// One record missing a required key fails the whole envelope
        #[test]
        fn decoding_is_all_or_nothing(
            records in prop::collection::vec(petition(), 1..8),
            broken in any::<prop::sample::Index>(),
            field in prop::sample::select(vec!["id", "title", "body", "signatureCount", "url"]),
        ) {
            let mut value = serde_json::to_value(Petitions { results: records }).unwrap();
            let results = value["results"].as_array_mut().unwrap();
            let idx = broken.index(results.len());
            results[idx].as_object_mut().unwrap().remove(field);
            let body = serde_json::to_vec(&value).unwrap();
            prop_assert!(decode_envelope(&body).is_err());
        }
    }
}
