use axum::body;
use serde::de::DeserializeOwned;

/// Used in tests to both extract the raw bytes from an HTTP response body and deserialize
/// them into the requested type. Panics and fails the test if either step goes wrong.
pub async fn deserialize_body<T: DeserializeOwned>(response_body: body::Body) -> T {
    let bytes = body::to_bytes(response_body, usize::MAX)
        .await
        .expect("The response body should be readable");

    serde_json::from_slice(&bytes).unwrap_or_else(|err| {
        panic!("The response body couldn't be parsed ({err}), raw content: {bytes:?}")
    })
}
