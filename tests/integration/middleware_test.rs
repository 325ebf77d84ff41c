use fanvault::config::AuthConfig;
use fanvault::error::ApiError;
use fanvault::middleware::UserIdentity;
use fanvault::services::JwtService;
use std::sync::Arc;
use uuid::Uuid;

fn test_jwt_service() -> JwtService {
    JwtService::new(Arc::new(AuthConfig {
        jwt_secret: "test-secret-key-for-integration-tests".to_string(),
        access_token_expiration_minutes: 60,
    }))
}

#[test]
fn test_user_identity_struct() {
    let identity = UserIdentity {
        user_id: Uuid::new_v4(),
        is_creator: true,
    };

    assert!(identity.is_creator);
}

#[test]
fn test_token_round_trip() {
    let service = test_jwt_service();
    let user_id = Uuid::new_v4();

    let token = service
        .generate_token(user_id, true)
        .expect("Failed to generate token");
    let claims = service
        .validate_token(&token)
        .expect("Failed to validate token");

    assert_eq!(JwtService::user_id_from_claims(&claims).unwrap(), user_id);
    assert!(claims.creator);
}

#[test]
fn test_garbage_token_rejected() {
    let service = test_jwt_service();

    let result = service.validate_token("not-a-jwt");
    assert!(matches!(result, Err(ApiError::InvalidToken(_))));
}

#[test]
fn test_token_from_other_secret_rejected() {
    let service = test_jwt_service();
    let other = JwtService::new(Arc::new(AuthConfig {
        jwt_secret: "a-different-secret".to_string(),
        access_token_expiration_minutes: 60,
    }));

    let token = other
        .generate_token(Uuid::new_v4(), false)
        .expect("Failed to generate token");
    assert!(service.validate_token(&token).is_err());
}
