//! Integration tests for the attestation adapter

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use pd_attestation::*;
    use pd_errors::AttestationError;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct RecordingClient {
        fail: bool,
        calls: AtomicUsize,
        seen: Mutex<Vec<MeasurementRequest>>,
    }

    #[async_trait]
    impl AttestationClient for RecordingClient {
        async fn request_measurement(
            &self,
            request: &MeasurementRequest,
        ) -> Result<Vec<u8>, AttestationError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.seen.lock().unwrap().push(request.clone());
            if self.fail {
                Err(AttestationError::MeasurementFailed("no hardware".into()))
            } else {
                Ok(b"token".to_vec())
            }
        }
    }

    #[tokio::test]
    async fn test_absent_client_is_not_run() {
        let outcome = Attestor::disabled().attest("hash").await;
        assert_eq!(outcome.status, AttestationStatus::NotRun);
        assert!(outcome.token.is_none());
    }

    #[tokio::test]
    async fn test_success_carries_token_and_binding() {
        let client = Arc::new(RecordingClient::default());
        let attestor = Attestor::new(Some(client.clone()));

        let outcome = attestor.attest("binding-hash").await;
        assert_eq!(outcome, AttestationOutcome::success(b"token".to_vec()));

        let seen = client.seen.lock().unwrap();
        assert_eq!(seen[0].content_binding, "binding-hash");
        assert_eq!(seen[0].ttl, ATTESTATION_MEASUREMENT_TTL);
    }

    #[tokio::test]
    async fn test_failure_degrades_to_failed_status() {
        let client = Arc::new(RecordingClient {
            fail: true,
            ..Default::default()
        });
        let outcome = Attestor::new(Some(client.clone())).attest("hash").await;
        assert_eq!(outcome.status, AttestationStatus::Failed);
        assert!(outcome.token.is_none());
        assert_eq!(client.calls.load(Ordering::SeqCst), 1);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_command_client_reads_stdout() {
        let client = CommandAttestationClient::new("echo", vec!["-n".into()]);
        let token = client
            .request_measurement(&MeasurementRequest::new("abc"))
            .await
            .unwrap();
        assert_eq!(token, b"--content-binding abc --ttl-secs 600");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_command_client_failure_is_error() {
        let client = CommandAttestationClient::new("false", Vec::new());
        let err = client
            .request_measurement(&MeasurementRequest::new("abc"))
            .await
            .unwrap_err();
        assert!(matches!(err, AttestationError::MeasurementFailed(_)));
    }
}
