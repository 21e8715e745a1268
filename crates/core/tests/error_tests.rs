// ═══════════════════════════════════════════════════════════════════
// Error Tests — CoreError display, classification, From impls
// ═══════════════════════════════════════════════════════════════════

use cotacao_core::errors::CoreError;

mod display {
    use super::*;

    #[test]
    fn server_error_surfaces_only_the_detail() {
        let err = CoreError::Server {
            status: 400,
            detail: "Moeda de origem inválida".to_string(),
        };
        assert_eq!(err.to_string(), "Moeda de origem inválida");
    }

    #[test]
    fn rate_limited_uses_the_fixed_user_message() {
        let err = CoreError::RateLimited {
            detail: "502: upstream returned 429".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Request limit reached — the next automatic refresh will retry"
        );
    }

    #[test]
    fn auth_invalid_asks_to_sign_in_again() {
        assert_eq!(
            CoreError::AuthInvalid.to_string(),
            "Session expired or invalid — please sign in again"
        );
    }

    #[test]
    fn network_and_storage_prefix_their_cause() {
        assert_eq!(
            CoreError::Network("connection refused".to_string()).to_string(),
            "Network error: connection refused"
        );
        assert_eq!(
            CoreError::Storage("disk full".to_string()).to_string(),
            "Token storage error: disk full"
        );
    }

    #[test]
    fn invalid_currency_names_the_offender() {
        let message = CoreError::InvalidCurrency("US".to_string()).to_string();
        assert!(message.contains("'US'"));
        assert!(message.contains("3 ASCII letters"));
    }

    #[test]
    fn invalid_quotation_carries_the_reason() {
        let message =
            CoreError::InvalidQuotation("exchange rate 0 must be finite and positive".to_string())
                .to_string();
        assert!(message.starts_with("Invalid quotation:"));
    }
}

mod classification {
    use super::*;

    #[test]
    fn only_rate_limited_is_rate_limited() {
        assert!(CoreError::RateLimited {
            detail: "429".to_string()
        }
        .is_rate_limited());

        assert!(!CoreError::AuthInvalid.is_rate_limited());
        assert!(!CoreError::Server {
            status: 502,
            detail: "down".to_string()
        }
        .is_rate_limited());
        assert!(!CoreError::Network("timeout".to_string()).is_rate_limited());
    }
}

mod conversions {
    use super::*;

    #[test]
    fn io_errors_become_storage_errors() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: CoreError = io.into();
        assert!(matches!(err, CoreError::Storage(_)));
        assert!(err.to_string().contains("denied"));
    }
}
