use crate::api::test_util::deserialize_body;
use crate::persistence::ExternalConnectivity;
use crate::token::TokenService;
use crate::{SharedData, app_env, db, dto};
use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use dotenv::dotenv;
use lazy_static::lazy_static;
use rand::{Rng, thread_rng};
use serde::Serialize;
use sqlx::{Connection, PgConnection, PgPool, Row};
use std::env;
use std::future::Future;
use std::sync::Arc;
use tokio::runtime::Runtime;

lazy_static! {
    static ref TOKIO_RT: Runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .expect("Tokio runtime failed to initialize");
}

struct TestDatabase {
    db_name: String,
}

impl TestDatabase {
    /// Provisions an empty, uniquely named database for one test run.
    async fn create(conn: &mut PgConnection) -> Result<TestDatabase, sqlx::Error> {
        let db_id: u32 = thread_rng().gen_range(10_000..99_999);
        let db_name = format!("test_db_{db_id}");

        sqlx::query(format!("CREATE DATABASE {db_name}").as_str())
            .execute(&mut *conn)
            .await?;

        Ok(TestDatabase { db_name })
    }

    /// Best-effort removal of databases left behind by earlier runs. Provisioning
    /// succeeded already, so failures here only leave clutter.
    async fn clear_stale_dbs(conn: &mut PgConnection, current_db_name: &str) {
        let listing_result = sqlx::query(
            "SELECT datname FROM pg_catalog.pg_database WHERE datname LIKE 'test_db%'",
        )
        .fetch_all(&mut *conn)
        .await;
        let stale_dbs = match listing_result {
            Ok(rows) => rows.into_iter().map(|row| row.get::<String, _>(0)),
            Err(listing_err) => {
                println!(
                    "Warning: failed to list old test databases. You may need to delete them manually. Error: {listing_err}"
                );
                return;
            }
        };

        for stale_db in stale_dbs {
            if stale_db == current_db_name {
                continue;
            }
            let drop_result = sqlx::query(format!("DROP DATABASE {stale_db}").as_str())
                .execute(&mut *conn)
                .await;
            if drop_result.is_err() {
                println!(
                    "Warning: failed to drop old test database {stale_db}, you may need to do it manually."
                );
            }
        }
    }

    fn db_name(&self) -> &str {
        self.db_name.as_str()
    }
}

/// Provisions a dedicated database for a single integration test, applies the schema
/// to it, and hands the test a pool pointed at it.
///
/// Expects the TEST_DB_URL environment variable to hold the base postgres connection
/// string, without a database name in the path.
pub fn prepare_db_and_test<F, R>(test_fn: F)
where
    R: Future<Output = ()>,
    F: FnOnce(PgPool) -> R,
{
    if dotenv().is_err() {
        println!("Test is running without .env file.");
    }

    TOKIO_RT.block_on(async move {
        let pg_connection_base_url = env::var(app_env::test::TEST_DB_URL).expect(
            "You must provide the TEST_DB_URL environment variable as the base postgres connection string",
        );

        let test_db = {
            let mut provisioning_conn = PgConnection::connect(&pg_connection_base_url)
                .await
                .expect("Test failure - could not create initial connection to provision database.");
            let test_db = match TestDatabase::create(&mut provisioning_conn).await {
                Ok(fresh_db) => fresh_db,
                Err(db_err) => panic!("Failed to provision the test database: {db_err}"),
            };
            TestDatabase::clear_stale_dbs(&mut provisioning_conn, test_db.db_name()).await;
            let _ = provisioning_conn.close().await;

            test_db
        };

        let sqlx_pool = db::connect_sqlx(
            format!("{pg_connection_base_url}/{}", test_db.db_name()).as_str(),
        )
        .await
        .expect("Could not connect to the provisioned test database");
        db::bootstrap_schema(&sqlx_pool)
            .await
            .expect("Could not apply the schema to the provisioned test database");

        test_fn(sqlx_pool).await;
    });
}

/// Assembles the full application router around the given pool, signing session
/// tokens with a fixed secret for the test process.
pub fn test_router(db: PgPool) -> Router {
    crate::app_router(Arc::new(SharedData {
        ext_cxn: ExternalConnectivity::new(db),
        tokens: TokenService::new("integration-test-secret"),
    }))
}

/// Registers an account through the API and hands back its session. Panics on
/// anything but a successful signup.
pub async fn sign_up(app: &Router, email: &str, name: &str, password: &str) -> dto::auth::Session {
    use tower::ServiceExt;

    let signup_response = app
        .clone()
        .oneshot(json_request(
            Method::POST,
            "/api/auth/signup",
            &serde_json::json!({
                "email": email,
                "name": name,
                "password": password,
            }),
        ))
        .await
        .expect("The signup request should complete");
    assert_eq!(StatusCode::CREATED, signup_response.status());

    deserialize_body(signup_response.into_body()).await
}

/// Builds an unauthenticated request carrying a JSON payload.
pub fn json_request(method: Method, uri: &str, payload: &impl Serialize) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(
            serde_json::to_vec(payload).expect("Test payload should serialize"),
        ))
        .expect("Test request should build")
}

/// Builds a bearer-authenticated request, with an optional JSON payload.
pub fn authed_request(
    method: Method,
    uri: &str,
    token: &str,
    payload: Option<serde_json::Value>,
) -> Request<Body> {
    let mut request_builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {token}"));
    let body = match payload {
        Some(json_payload) => {
            request_builder = request_builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(json_payload.to_string())
        }
        None => Body::empty(),
    };

    request_builder
        .body(body)
        .expect("Test request should build")
}
