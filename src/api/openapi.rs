use super::handlers::{admin, auth, dashboard, habits, health, pomodoro, todos};
use utoipa::openapi::{
    Contact, InfoBuilder, License, OpenApiBuilder, Tag,
    security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
};
use utoipa_axum::{router::OpenApiRouter, routes};

#[must_use]
pub fn openapi() -> utoipa::openapi::OpenApi {
    let (_router, openapi) = api_router().split_for_parts();
    openapi
}

/// Build the router that also drives the `OpenAPI` document.
///
/// Handlers sharing a path are registered in one `routes!` call. Routes added
/// outside (like `/` or `OPTIONS /health`) are not documented.
pub(crate) fn api_router() -> OpenApiRouter {
    let mut router = OpenApiRouter::with_openapi(cargo_openapi())
        .routes(routes!(health::health))
        .routes(routes!(auth::register::register))
        .routes(routes!(auth::login::login))
        .routes(routes!(auth::login::me))
        .routes(routes!(auth::otp::send_otp))
        .routes(routes!(auth::otp::verify_otp))
        .routes(routes!(auth::two_factor::enable_2fa))
        .routes(routes!(auth::two_factor::verify_2fa))
        .routes(routes!(auth::password_reset::forgot_password))
        .routes(routes!(auth::password_reset::reset_password))
        .routes(routes!(auth::google::google_login))
        .routes(routes!(auth::google::google_callback))
        .routes(routes!(
            habits::crud::create_habit,
            habits::crud::list_habits
        ))
        .routes(routes!(
            habits::crud::get_habit,
            habits::crud::put_habit,
            habits::crud::delete_habit
        ))
        .routes(routes!(
            habits::entries::create_entry,
            habits::entries::list_entries
        ))
        .routes(routes!(todos::crud::create_todo, todos::crud::list_todos))
        .routes(routes!(
            todos::crud::get_todo,
            todos::crud::put_todo,
            todos::crud::delete_todo
        ))
        .routes(routes!(
            pomodoro::crud::create_session,
            pomodoro::crud::list_sessions
        ))
        .routes(routes!(pomodoro::analytics::pomodoro_analytics))
        .routes(routes!(
            pomodoro::crud::get_session,
            pomodoro::crud::put_session,
            pomodoro::crud::delete_session
        ))
        .routes(routes!(dashboard::stats::dashboard_stats))
        .routes(routes!(admin::dashboard::admin_dashboard))
        .routes(routes!(admin::users::list_users))
        .routes(routes!(
            admin::users::get_user,
            admin::users::put_user,
            admin::users::delete_user
        ))
        .routes(routes!(admin::content::list_all_todos))
        .routes(routes!(admin::content::list_all_habits));

    let openapi = router.get_openapi_mut();
    openapi.tags = Some(vec![
        tag("habitrack", "Todos, habits and pomodoro sessions"),
        tag("health", "Service and database health"),
        tag("auth", "Registration, login, one-time codes and two-factor"),
        tag("habits", "Habits, daily entries and streaks"),
        tag("todos", "Todo items"),
        tag("pomodoro", "Focus sessions and analytics"),
        tag("dashboard", "Per-user statistics"),
        tag("admin", "User management and platform totals"),
    ]);
    openapi
        .components
        .get_or_insert_with(Default::default)
        .add_security_scheme(
            "bearer",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );

    router
}

fn tag(name: &str, description: &str) -> Tag {
    let mut tag = Tag::new(name);
    tag.description = Some(description.to_string());
    tag
}

fn cargo_openapi() -> utoipa::openapi::OpenApi {
    let mut info = InfoBuilder::new()
        .title(env!("CARGO_PKG_NAME"))
        .version(env!("CARGO_PKG_VERSION"))
        .description(optional_str(env!("CARGO_PKG_DESCRIPTION")))
        .build();

    info.contact = cargo_contact();
    info.license = cargo_license();

    OpenApiBuilder::new().info(info).build()
}

fn cargo_contact() -> Option<Contact> {
    // Cargo authors are `;` separated and may include "Name <email>".
    let authors = env!("CARGO_PKG_AUTHORS");
    let primary = authors.split(';').next().map(str::trim)?;
    if primary.is_empty() {
        return None;
    }

    let (name, email) = parse_author(primary);
    if name.is_none() && email.is_none() {
        return None;
    }

    let mut contact = Contact::new();
    contact.name = name.map(str::to_string);
    contact.email = email.map(str::to_string);
    Some(contact)
}

fn cargo_license() -> Option<License> {
    let identifier = optional_str(env!("CARGO_PKG_LICENSE"))?;
    let mut license = License::new(identifier);
    license.identifier = Some(identifier.to_string());
    Some(license)
}

fn optional_str(value: &'static str) -> Option<&'static str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed)
    }
}

fn parse_author(author: &str) -> (Option<&str>, Option<&str>) {
    let non_empty: fn(&str) -> Option<&str> = |value| (!value.is_empty()).then_some(value);
    match author.find('<') {
        Some(start) => {
            let name = author[..start].trim();
            let email = author[start + 1..].trim_end_matches('>').trim();
            (non_empty(name), non_empty(email))
        }
        None => (non_empty(author.trim()), None),
    }
}
