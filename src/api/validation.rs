use super::models::DownloadRequest;
use crate::config::ServerConfig;
use crate::search::{QueryError, SearchQuery};

/// Turn a submission into a [`SearchQuery`] under the server's count limits
pub fn validate_request(
    request: &DownloadRequest,
    server: &ServerConfig,
) -> Result<SearchQuery, QueryError> {
    let count = request
        .count
        .as_ref()
        .map_or(server.default_count, |count| count.as_count());

    SearchQuery::new(&request.query, count, server.max_count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::models::CountValue;

    fn request(query: &str, count: Option<i64>) -> DownloadRequest {
        DownloadRequest {
            query: query.to_string(),
            count: count.map(CountValue::Number),
        }
    }

    #[test]
    fn validate_request_accepts_bounds() {
        let server = ServerConfig::default();

        let low = validate_request(&request("cats", Some(1)), &server).unwrap();
        assert_eq!(low.count(), 1);

        let high = validate_request(&request("cats", Some(50)), &server).unwrap();
        assert_eq!(high.count(), 50);
    }

    #[test]
    fn validate_request_defaults_count() {
        let server = ServerConfig::default();
        let query = validate_request(&request("  cats  ", None), &server).unwrap();

        assert_eq!(query.count(), server.default_count);
        assert_eq!(query.text(), "cats");
    }

    #[test]
    fn validate_request_rejects_out_of_range() {
        let server = ServerConfig::default();

        for count in [0, -3, 51] {
            let err = validate_request(&request("cats", Some(count)), &server).unwrap_err();
            assert!(matches!(err, QueryError::CountOutOfRange { max: 50, .. }));
        }
    }

    #[test]
    fn validate_request_rejects_blank_query() {
        let server = ServerConfig::default();
        assert_eq!(
            validate_request(&request("   ", Some(5)), &server),
            Err(QueryError::EmptyText)
        );
    }

    #[test]
    fn validate_request_accepts_numeric_strings() {
        let server = ServerConfig::default();
        let body: DownloadRequest =
            serde_json::from_str(r#"{"query": "cats", "count": " 10 "}"#).unwrap();
        assert_eq!(validate_request(&body, &server).unwrap().count(), 10);

        for raw in [r#""abc""#, r#""-2""#, r#""51""#] {
            let body: DownloadRequest =
                serde_json::from_str(&format!(r#"{{"query": "cats", "count": {raw}}}"#)).unwrap();
            assert!(matches!(
                validate_request(&body, &server),
                Err(QueryError::CountOutOfRange { max: 50, .. })
            ));
        }
    }
}
