//! Integration tests for the engine's data model

#[cfg(test)]
mod tests {
    use pd_types::*;
    use proptest::prelude::*;

    #[test]
    fn test_persistent_state_defaults() {
        let state = ClientPersistentState::default();
        assert!(!state.has_external_key_set());
        assert!(state.page_token.is_empty());
        assert_eq!(state.last_completion_time_millis, 0);
    }

    #[test]
    fn test_completed_state_keeps_token_without_next_page() {
        let state = ClientPersistentState {
            external_key_set: Some(vec![1, 2, 3]),
            page_token: b"p1".to_vec(),
            last_completion_time_millis: 10,
        };

        let advanced = state.clone().completed(Some(b"p2".to_vec()), 20);
        assert_eq!(advanced.page_token, b"p2");
        assert_eq!(advanced.last_completion_time_millis, 20);
        assert_eq!(advanced.external_key_set, Some(vec![1, 2, 3]));

        let unchanged = state.completed(None, 30);
        assert_eq!(unchanged.page_token, b"p1");
        assert_eq!(unchanged.last_completion_time_millis, 30);
    }

    #[test]
    fn test_persistent_state_json_shape() {
        let state = ClientPersistentState {
            external_key_set: Some(vec![0xde, 0xad]),
            page_token: vec![],
            last_completion_time_millis: 5,
        };
        let json = serde_json::to_value(&state).unwrap();
        assert_eq!(json["externalKeySet"], "3q0=");
        assert_eq!(json["pageToken"], "");
        assert_eq!(json["lastCompletionTimeMillis"], 5);

        let parsed: ClientPersistentState = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, state);
    }

    #[test]
    fn test_client_version_type_wire_names() {
        let json = serde_json::to_string(&ClientVersionType::AttestedPkvm).unwrap();
        assert_eq!(json, "\"attested-pkVM\"");
        let json = serde_json::to_string(&ClientVersionType::Standard).unwrap();
        assert_eq!(json, "\"standard\"");
    }

    #[test]
    fn test_download_request_from_json() {
        let json = r#"{
            "apiKey": "key",
            "metadata": {
                "blobConstraints": {
                    "client": "text-input",
                    "deviceTier": "ultra_low",
                    "variant": "vendor_qc"
                },
                "cryptoKeys": { "publicKey": "AQID" }
            }
        }"#;
        let request: DownloadBlobRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.client(), Client::TextInput);
        assert_eq!(request.metadata.blob_constraints.device_tier, DeviceTier::UltraLow);
        assert_eq!(request.metadata.blob_constraints.variant, Variant::VendorQc);
        assert_eq!(request.metadata.blob_constraints.client_group, ClientGroup::All);
        assert_eq!(request.metadata.crypto_keys.public_key, vec![1, 2, 3]);
        assert_eq!(request.download_mode, DownloadMode::Unspecified);
    }

    fn constraints_from_json(constraints: &str) -> serde_json::Result<BlobConstraints> {
        serde_json::from_str(constraints)
    }

    #[test]
    fn test_unknown_variant_degrades_to_unspecified() {
        let constraints = constraints_from_json(
            r#"{ "client": "text-input", "variant": "vendor_new_soc" }"#,
        )
        .unwrap();
        assert_eq!(constraints.variant, Variant::Unspecified);
        assert!(!constraints.variant.is_specified());

        let json = r#"{
            "apiKey": "key",
            "metadata": {
                "blobConstraints": { "client": "text-input", "variant": "VENDOR_MTK" },
                "cryptoKeys": { "publicKey": "AQID" }
            }
        }"#;
        let request: DownloadBlobRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.metadata.blob_constraints.variant, Variant::Unspecified);
    }

    #[test]
    fn test_constraints_accept_canonical_labels() {
        let constraints = constraints_from_json(
            r#"{
                "client": "text-input",
                "deviceTier": "Ultra Low",
                "clientGroup": "third_party_eap",
                "variant": "VENDOR_SLSI"
            }"#,
        )
        .unwrap();
        assert_eq!(constraints.device_tier, DeviceTier::UltraLow);
        assert_eq!(constraints.client_group, ClientGroup::ThirdPartyEap);
        assert_eq!(constraints.variant, Variant::VendorSlsi);

        let json = serde_json::to_value(&constraints).unwrap();
        assert_eq!(json["deviceTier"], "ultra_low");
        assert_eq!(json["variant"], "vendor_slsi");
    }

    #[test]
    fn test_unknown_tier_or_group_is_rejected() {
        let tier = constraints_from_json(r#"{ "client": "text-input", "deviceTier": "Huge" }"#);
        assert!(tier.unwrap_err().to_string().contains("unknown variant `Huge`"));

        let group = constraints_from_json(r#"{ "client": "text-input", "clientGroup": "gamma" }"#);
        assert!(group.is_err());
    }

    #[test]
    fn test_wire_request_defaults_proof_config() {
        let config = wire::ProtectionProofConfig::default();
        assert!(config.include_v2_proof);
        assert!(config.exclude_v1_proof);
        let json = serde_json::to_value(config).unwrap();
        assert_eq!(json["includeV2Proof"], true);
        assert_eq!(json["excludeV1Proof"], true);
    }

    #[test]
    fn test_approximate_size_grows_with_payload() {
        let small = wire::DownloadBlobResponse::default();
        let large = wire::DownloadBlobResponse {
            blob: vec![7; 1024],
            ..Default::default()
        };
        assert!(small.approximate_size() > 0);
        assert!(large.approximate_size() > small.approximate_size() + 1024);
    }

    proptest! {
        #[test]
        fn test_response_bytes_survive_json(blob in proptest::collection::vec(any::<u8>(), 0..256),
                                            token in proptest::collection::vec(any::<u8>(), 0..64)) {
            let response = DownloadBlobResponse {
                blob: blob.clone(),
                next_page_token: token.clone(),
                ..Default::default()
            };
            let json = serde_json::to_string(&response).unwrap();
            let parsed: DownloadBlobResponse = serde_json::from_str(&json).unwrap();
            prop_assert_eq!(parsed.blob, blob);
            prop_assert_eq!(parsed.next_page_token, token);
        }
    }
}
