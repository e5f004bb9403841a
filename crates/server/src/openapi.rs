use utoipa::OpenApi;
use utoipa::ToSchema;

#[derive(ToSchema)]
pub struct HealthResponse { pub status: String }

#[derive(ToSchema)]
pub struct LoginRequest { pub username: String, pub password: String }

#[derive(ToSchema)]
pub struct BookingRequestDoc {
    pub name: String,
    pub phone: String,
    pub service: String,
    pub date: String,
    pub time: Option<String>,
    pub notes: Option<String>,
}

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::routes::health,
        crate::routes::auth::login,
        crate::routes::public::list,
        crate::routes::public::get,
        crate::routes::booking::submit_form,
        crate::routes::booking::submit_json,
        crate::routes::admin::list_records,
        crate::routes::admin::create_record,
        crate::routes::admin::get_record,
        crate::routes::admin::update_record,
        crate::routes::admin::delete_record,
        crate::routes::uploads::upload_file,
        crate::routes::uploads::upload_gallery,
        crate::routes::uploads::upload_video,
    ),
    components(schemas(HealthResponse, LoginRequest, BookingRequestDoc)),
    tags(
        (name = "health"),
        (name = "auth"),
        (name = "public"),
        (name = "booking"),
        (name = "admin")
    )
)]
pub struct ApiDoc;
