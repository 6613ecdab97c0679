//! OpenAPI documentation for the whole HTTP surface, served at `/docs` (Scalar) and
//! `/api-docs/openapi.json`.

use utoipa::{
    Modify, OpenApi,
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
};

use crate::{api, verification};

/// Bearer access tokens issued by `/authentication/login`
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.security_schemes.insert(
                "BearerAuth".to_string(),
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some(
                            "Access token from `/authentication/login` or `/authentication/refresh`:\n\n\
                            ```\nAuthorization: Bearer ACCESS_TOKEN\n```\n\n\
                            Refresh tokens are not accepted here.",
                        ))
                        .build(),
                ),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    info(title = "Gigwork API", description = "Accounts, worker onboarding and identity document verification"),
    modifiers(&SecurityAddon),
    paths(
        api::handlers::auth::register,
        api::handlers::auth::login,
        api::handlers::auth::refresh,
        api::handlers::auth::logout_all,
        api::handlers::accounts::get_me,
        api::handlers::accounts::delete_me,
        api::handlers::profiles::get_profile,
        api::handlers::profiles::update_profile,
        api::handlers::workers::become_worker,
        api::handlers::workers::get_worker_profile,
        api::handlers::workers::update_worker_profile,
        api::handlers::documents::upload_document,
        api::handlers::documents::list_documents,
        api::handlers::admin::list_accounts,
        api::handlers::admin::delete_account,
        api::handlers::admin::list_workers,
        api::handlers::admin::list_documents,
        api::handlers::admin::get_document,
        api::handlers::admin::get_document_content,
        api::handlers::admin::decide,
        api::handlers::admin::get_registry,
    ),
    components(
        schemas(
            api::models::auth::RegisterRequest,
            api::models::auth::LoginRequest,
            api::models::auth::TokenPairResponse,
            api::models::auth::RefreshRequest,
            api::models::auth::AccessTokenResponse,
            api::models::auth::MessageResponse,
            api::models::accounts::AccountResponse,
            api::models::accounts::AccountRole,
            api::models::accounts::Capability,
            api::models::profiles::ProfileResponse,
            api::models::profiles::ProfileUpdate,
            api::models::workers::BecomeWorkerRequest,
            api::models::workers::WorkerProfileUpdate,
            api::models::workers::WorkerProfileResponse,
            api::models::workers::ServiceCategory,
            api::models::workers::AvailabilityStatus,
            api::models::documents::DocumentType,
            api::models::documents::DocumentUploadForm,
            api::models::documents::DocumentResponse,
            api::models::documents::DecisionRequest,
            api::models::documents::DecisionResponse,
            verification::status::VerificationStatus,
            verification::status::DocumentStatus,
            verification::status::DecisionOutcome,
            verification::registry::EntityKind,
            verification::registry::AdminAction,
            verification::registry::RegisteredEntity,
        )
    ),
    tags(
        (name = "authentication", description = "Registration, login and token management"),
        (name = "accounts", description = "The caller's own account"),
        (name = "profiles", description = "Location profile created with every account"),
        (name = "workers", description = "Becoming a worker and managing the worker profile"),
        (name = "documents", description = "Identity documents submitted for verification"),
        (name = "admin", description = "Account administration and document review. Requires the ADMIN capability."),
    )
)]
pub struct ApiDoc;
