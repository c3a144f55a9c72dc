//! Generated OpenAPI document, served as JSON.

use crate::config::OpenApiServers;
use crate::handlers::user;
use crate::model::{Privilege, Role, User};
use crate::response::MetaCount;
use axum::{routing::get, Json, Router};
use std::sync::Arc;
use utoipa::openapi::server::{Server, ServerBuilder};
use utoipa::OpenApi;

pub const OPENAPI_PATH: &str = "/api-docs/openapi.json";

#[derive(OpenApi)]
#[openapi(
    info(
        title = "User Admin API",
        version = "1.0",
        description = "Endpoints to manage application users, roles and privileges",
        terms_of_service = "https://www.noubissie.com/terms",
        contact(name = "Donfack Pavel", email = "noubissiepavel@gmail.com", url = "http://www.noubissie.com"),
        license(name = "MIT", url = "https://choosealicense.com/licenses/mit/")
    ),
    paths(
        user::list_users,
        user::list_roles,
        user::list_privileges,
        user::create_user,
        user::create_role,
        user::create_privilege,
        user::get_user,
        user::update_user,
        user::delete_user,
    ),
    components(schemas(User, Role, Privilege, MetaCount)),
    tags((name = "App User", description = "Management of the application users"))
)]
pub struct ApiDoc;

/// The document with the configured dev and prod servers attached.
pub fn openapi(servers: &OpenApiServers) -> utoipa::openapi::OpenApi {
    let mut doc = ApiDoc::openapi();
    let list: Vec<Server> = [
        (&servers.dev_url, "Server URL in Development environment"),
        (&servers.prod_url, "Server URL in Production environment"),
    ]
    .into_iter()
    .filter_map(|(url, description)| {
        url.as_ref()
            .map(|u| ServerBuilder::new().url(u.clone()).description(Some(description)).build())
    })
    .collect();
    if !list.is_empty() {
        doc.servers = Some(list);
    }
    doc
}

pub fn docs_routes(servers: &OpenApiServers) -> Router {
    let doc = Arc::new(openapi(servers));
    Router::new().route(
        OPENAPI_PATH,
        get(move || {
            let doc = Arc::clone(&doc);
            async move { Json(doc.as_ref().clone()) }
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_every_user_route() {
        let doc = openapi(&OpenApiServers::default());
        let paths: Vec<&String> = doc.paths.paths.keys().collect();
        for p in ["/api/user", "/api/user/role", "/api/user/privilege", "/api/user/{id}"] {
            assert!(paths.iter().any(|k| k.as_str() == p), "missing {}", p);
        }
        assert!(doc.servers.is_none());
    }

    #[test]
    fn configured_servers_are_attached_in_order() {
        let doc = openapi(&OpenApiServers {
            dev_url: Some("http://localhost:3000".into()),
            prod_url: Some("https://api.example.com".into()),
        });
        let urls: Vec<String> = doc
            .servers
            .unwrap()
            .into_iter()
            .map(|s| s.url)
            .collect();
        assert_eq!(urls, vec!["http://localhost:3000", "https://api.example.com"]);
    }

    #[test]
    fn user_schema_uses_camel_case_fields() {
        let json = serde_json::to_value(ApiDoc::openapi()).unwrap();
        let props = &json["components"]["schemas"]["User"]["properties"];
        assert!(props.get("userName").is_some());
        assert!(props.get("createdDate").is_some());
    }

    #[test]
    fn info_carries_contact_terms_and_license() {
        let info = ApiDoc::openapi().info;
        assert_eq!(info.terms_of_service.as_deref(), Some("https://www.noubissie.com/terms"));
        let contact = info.contact.unwrap();
        assert_eq!(contact.name.as_deref(), Some("Donfack Pavel"));
        assert_eq!(contact.email.as_deref(), Some("noubissiepavel@gmail.com"));
        assert_eq!(contact.url.as_deref(), Some("http://www.noubissie.com"));
        assert_eq!(info.license.unwrap().name, "MIT");
    }
}
