use std::path::Path;

use anyhow::Result;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::api::{birthday_query_param, ApiClient, ApiError};
use crate::auth::SessionStore;
use crate::models::{AcademicYear, BirthdayResults, CardRequest, FileListing, Person};
use crate::storage::KeyValueStore;

use super::ServiceError;

/// Result of sending one card.
#[derive(Debug)]
pub struct CardOutcome {
    pub name: String,
    pub result: std::result::Result<Value, String>,
}

impl CardOutcome {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

/// Check that `path` is an existing `.xlsx` file before anything is sent.
pub fn validate_spreadsheet(path: &Path) -> Result<(), ServiceError> {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_lowercase())
        .unwrap_or_default();

    if !name.ends_with(".xlsx") {
        return Err(ServiceError::InvalidUpload(
            "Only .xlsx files allowed".to_string(),
        ));
    }
    if !path.is_file() {
        return Err(ServiceError::InvalidUpload(format!(
            "File not found: {}",
            path.display()
        )));
    }
    Ok(())
}

pub struct MessengerService<S> {
    api: ApiClient,
    session: SessionStore<S>,
    ttl_minutes: i64,
}

impl<S: KeyValueStore> MessengerService<S> {
    pub fn new(api: ApiClient, session: SessionStore<S>, ttl_minutes: i64) -> Self {
        Self {
            api,
            session,
            ttl_minutes,
        }
    }

    pub fn session(&self) -> &SessionStore<S> {
        &self.session
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.is_authenticated()
    }

    /// Log in and record the session.
    ///
    /// A success response without a token still records the expiry, but the
    /// resulting session is not authenticated.
    pub async fn login(&self, user: &str, password: &str) -> Result<()> {
        let user = user.trim();
        let response = self.api.login(user, password).await?;

        let token = response.token.unwrap_or_default();
        if token.is_empty() {
            warn!(user, "Login succeeded without a token");
        }
        self.session.record(&token, self.ttl_minutes)?;
        info!(user, ttl_minutes = self.ttl_minutes, "Logged in");
        Ok(())
    }

    /// Revoke the token server-side if possible, then forget the session.
    pub async fn logout(&self) {
        if let Some(token) = self.session.stored_token().filter(|t| !t.is_empty()) {
            if let Err(e) = self.api.with_token(token).logout().await {
                warn!(error = %e, "Server logout failed, clearing local session anyway");
            }
        }
        self.session.clear();
        info!("Logged out");
    }

    /// Client carrying the session token, or `NotAuthenticated`.
    fn authed(&self) -> Result<ApiClient> {
        match self.session.bearer_token() {
            Some(token) => Ok(self.api.with_token(token)),
            None => {
                debug!("Rejecting request without a valid session");
                Err(ServiceError::NotAuthenticated.into())
            }
        }
    }

    /// A token the server rejects is as good as no token.
    fn expire_on_unauthorized(&self, err: anyhow::Error) -> anyhow::Error {
        if matches!(err.downcast_ref::<ApiError>(), Some(ApiError::Unauthorized)) {
            warn!("Server rejected the session token, clearing session");
            self.session.clear();
        }
        err
    }

    pub async fn find_birthdays(&self, date: &str) -> Result<BirthdayResults> {
        let date = date.trim();
        if date.is_empty() {
            return Err(ServiceError::InvalidDate.into());
        }
        let api = self.authed()?;
        api.filter_birthdays(&birthday_query_param(date))
            .await
            .map_err(|e| self.expire_on_unauthorized(e))
    }

    /// Send one card per person, in order. Individual failures are reported
    /// in the outcomes rather than aborting the batch.
    pub async fn send_cards(&self, people: &[Person]) -> Result<Vec<CardOutcome>> {
        if people.is_empty() {
            return Err(ServiceError::NothingToSend.into());
        }
        let api = self.authed()?;

        let mut outcomes = Vec::with_capacity(people.len());
        for person in people {
            let card = CardRequest::from(person);
            let result = match api.send_card(&card).await {
                Ok(value) => Ok(value),
                Err(e) => {
                    let e = self.expire_on_unauthorized(e);
                    warn!(name = %card.name, error = %e, "Failed to send card");
                    Err(e.to_string())
                }
            };
            outcomes.push(CardOutcome {
                name: person.display_name().to_string(),
                result,
            });
        }
        Ok(outcomes)
    }

    pub async fn upload_spreadsheet(&self, year: AcademicYear, path: &Path) -> Result<Value> {
        validate_spreadsheet(path)?;
        let api = self.authed()?;
        api.upload_spreadsheet(year, path)
            .await
            .map_err(|e| self.expire_on_unauthorized(e))
    }

    pub async fn list_files(&self) -> Result<FileListing> {
        let api = self.authed()?;
        api.list_files().await.map_err(|e| self.expire_on_unauthorized(e))
    }

    pub async fn delete_file(&self, name: &str) -> Result<Value> {
        let api = self.authed()?;
        api.delete_file(name).await.map_err(|e| self.expire_on_unauthorized(e))
    }

    pub async fn delete_all_files(&self) -> Result<Value> {
        let api = self.authed()?;
        api.delete_all_files().await.map_err(|e| self.expire_on_unauthorized(e))
    }

    pub async fn convert_to_csv(&self) -> Result<Value> {
        let api = self.authed()?;
        api.convert_to_csv().await.map_err(|e| self.expire_on_unauthorized(e))
    }

    pub async fn change_password(&self, old_password: &str, new_password: &str) -> Result<Value> {
        let api = self.authed()?;
        api.change_password(old_password, new_password)
            .await
            .map_err(|e| self.expire_on_unauthorized(e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{AUTH_CACHE_KEY, TOKEN_KEY};
    use crate::storage::MemoryStore;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn service(uri: &str) -> MessengerService<MemoryStore> {
        MessengerService::new(
            ApiClient::new(uri).unwrap(),
            SessionStore::new(MemoryStore::new()),
            60,
        )
    }

    fn service_error(err: &anyhow::Error) -> Option<&ServiceError> {
        err.downcast_ref::<ServiceError>()
    }

    #[tokio::test]
    async fn test_login_records_session() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/login"))
            .and(body_json(serde_json::json!({"user": "admin", "password": "pw"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"token": "abc"})))
            .mount(&server)
            .await;

        let svc = service(&server.uri());
        svc.login("  admin ", "pw").await.unwrap();

        assert!(svc.is_authenticated());
        assert_eq!(svc.session().bearer_token().as_deref(), Some("abc"));
    }

    #[tokio::test]
    async fn test_tokenless_login_does_not_revive_old_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/login"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
            .mount(&server)
            .await;

        let svc = service(&server.uri());
        let expired = chrono::Utc::now().timestamp_millis() - 1;
        svc.session().record_until("old-revoked", expired).unwrap();

        svc.login("admin", "pw").await.unwrap();

        assert!(svc.session().is_valid());
        assert!(svc.session().bearer_token().is_none());
        assert!(!svc.is_authenticated());
        let err = svc.list_files().await.unwrap_err();
        assert_eq!(service_error(&err), Some(&ServiceError::NotAuthenticated));
    }

    #[tokio::test]
    async fn test_failed_login_records_nothing() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/login"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let svc = service(&server.uri());
        assert!(svc.login("admin", "bad").await.is_err());
        assert!(!svc.session().is_valid());
    }

    #[tokio::test]
    async fn test_gated_calls_fail_without_session() {
        // No mocks mounted: any request reaching the server would 404
        let server = MockServer::start().await;
        let svc = service(&server.uri());

        let err = svc.find_birthdays("2025-10-19").await.unwrap_err();
        assert_eq!(service_error(&err), Some(&ServiceError::NotAuthenticated));

        let err = svc.list_files().await.unwrap_err();
        assert_eq!(service_error(&err), Some(&ServiceError::NotAuthenticated));

        assert!(server.received_requests().await.unwrap_or_default().is_empty());
    }

    #[tokio::test]
    async fn test_expired_session_behaves_like_none() {
        let server = MockServer::start().await;
        let svc = service(&server.uri());
        let expired = chrono::Utc::now().timestamp_millis() - 1;
        svc.session().record_until("abc", expired).unwrap();

        let err = svc.convert_to_csv().await.unwrap_err();
        assert_eq!(service_error(&err), Some(&ServiceError::NotAuthenticated));
    }

    #[tokio::test]
    async fn test_find_birthdays_converts_date() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/filter"))
            .and(wiremock::matchers::query_param("date", "10-19"))
            .and(header("authorization", "Bearer abc"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "count": 0, "date": "10-19", "people": []
            })))
            .mount(&server)
            .await;

        let svc = service(&server.uri());
        svc.session().record("abc", 60).unwrap();

        let results = svc.find_birthdays("2025-10-19").await.unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn test_empty_date_rejected() {
        let svc = service("http://localhost:9");
        svc.session().record("abc", 60).unwrap();
        let err = svc.find_birthdays("  ").await.unwrap_err();
        assert_eq!(service_error(&err), Some(&ServiceError::InvalidDate));
    }

    #[tokio::test]
    async fn test_unauthorized_response_clears_session() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/files"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let svc = service(&server.uri());
        svc.session().record("revoked", 60).unwrap();

        assert!(svc.list_files().await.is_err());
        assert!(!svc.session().is_valid());
    }

    #[tokio::test]
    async fn test_logout_clears_even_when_server_unreachable() {
        let svc = service("http://127.0.0.1:9");
        svc.session().record("abc", 60).unwrap();

        svc.logout().await;

        assert!(svc.session().store().get(TOKEN_KEY).is_none());
        assert!(svc.session().store().get(AUTH_CACHE_KEY).is_none());
    }

    #[tokio::test]
    async fn test_send_cards_reports_each_outcome() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/send_card"))
            .and(body_json(serde_json::json!({
                "name": "Asha", "recipient": "asha@example.com", "recipient_phone": "",
                "father_email": "", "father_phone": "", "mother_email": "", "mother_phone": ""
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"status": 202})))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/send_card"))
            .respond_with(ResponseTemplate::new(500).set_body_json(serde_json::json!({"error": "SMTP down"})))
            .mount(&server)
            .await;

        let svc = service(&server.uri());
        svc.session().record("abc", 60).unwrap();

        let people = vec![
            Person {
                name: Some("Asha".to_string()),
                email: Some("asha@example.com".to_string()),
                ..Default::default()
            },
            Person {
                name: Some("Ravi".to_string()),
                ..Default::default()
            },
        ];
        let outcomes = svc.send_cards(&people).await.unwrap();
        assert_eq!(outcomes.len(), 2);
        assert!(outcomes[0].is_ok());
        assert_eq!(outcomes[1].name, "Ravi");
        assert!(outcomes[1].result.as_ref().unwrap_err().contains("SMTP down"));
    }

    #[tokio::test]
    async fn test_send_cards_requires_people() {
        let svc = service("http://localhost:9");
        svc.session().record("abc", 60).unwrap();
        let err = svc.send_cards(&[]).await.unwrap_err();
        assert_eq!(service_error(&err), Some(&ServiceError::NothingToSend));
    }

    #[test]
    fn test_validate_spreadsheet() {
        let dir = tempfile::tempdir().unwrap();
        let xlsx = dir.path().join("Students.XLSX");
        std::fs::write(&xlsx, b"PK").unwrap();
        let csv = dir.path().join("students.csv");
        std::fs::write(&csv, b"a,b").unwrap();

        assert!(validate_spreadsheet(&xlsx).is_ok());
        assert_eq!(
            validate_spreadsheet(&csv),
            Err(ServiceError::InvalidUpload("Only .xlsx files allowed".to_string()))
        );
        assert!(matches!(
            validate_spreadsheet(&dir.path().join("missing.xlsx")),
            Err(ServiceError::InvalidUpload(_))
        ));
    }
}
