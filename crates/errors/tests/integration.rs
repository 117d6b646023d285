//! Integration tests for error types

#[cfg(test)]
mod tests {
    use pd_errors::*;

    #[test]
    fn test_error_conversion() {
        let net_err = NetworkError::Timeout {
            url: "https://example.com".into(),
        };
        let err: Error = net_err.into();
        assert!(matches!(err, Error::Network(_)));
        assert_eq!(err.rpc_status(), RpcStatus::Unavailable);
    }

    #[test]
    fn test_error_display() {
        let err = ValidationError::ApiKeyLength {
            expected: 39,
            actual: 3,
        };
        assert_eq!(
            err.to_string(),
            "unexpected api key size: expected 39, got 3"
        );
    }

    #[test]
    fn test_error_clone() {
        let err = CryptoError::NoKeyAvailable {
            client_id: "VM_CLIENT".into(),
        };
        let cloned = err.clone();
        assert_eq!(err, cloned);
    }

    #[test]
    fn test_rpc_status_mapping() {
        let invalid: Error = ValidationError::MissingPublicKey.into();
        assert_eq!(invalid.rpc_status(), RpcStatus::InvalidArgument);

        let unrecognized: Error = AuthorizationError::UnrecognizedClient {
            client_id: "x".into(),
        }
        .into();
        assert_eq!(unrecognized.rpc_status(), RpcStatus::PermissionDenied);

        assert_eq!(Error::FeatureDisabled.rpc_status(), RpcStatus::FailedPrecondition);
        assert_eq!(Error::Cancelled.rpc_status(), RpcStatus::Cancelled);

        let storage: Error = StorageError::IoError {
            message: "disk".into(),
        }
        .into();
        assert_eq!(storage.rpc_status(), RpcStatus::Internal);
    }

    #[test]
    fn test_user_codes_are_stable() {
        let err: Error = CryptoError::DecompressFailed("bad header".into()).into();
        assert_eq!(err.user_code(), Some("crypto.decompress_failed"));
        assert!(!err.is_retryable());

        let err: Error = NetworkError::HttpError {
            status: 503,
            message: "unavailable".into(),
        }
        .into();
        assert!(err.is_retryable());
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "test");
        let storage_err = StorageError::from_io_with_path(&io_err, std::path::Path::new("/state"));
        assert!(matches!(storage_err, StorageError::PermissionDenied { .. }));
    }
}
