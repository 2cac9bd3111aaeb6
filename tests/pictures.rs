mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use common::{TestApp, TestResponse};
use serde_json::json;

const BOUNDARY: &str = "salewallet-test-boundary";

fn multipart_body(name: Option<&str>, file: Option<(&str, &str, &[u8])>) -> Vec<u8> {
    let mut body = Vec::new();
    if let Some(name) = name {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"name\"\r\n\r\n{name}\r\n"
            )
            .as_bytes(),
        );
    }
    if let Some((file_name, content_type, bytes)) = file {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{file_name}\"\r\nContent-Type: {content_type}\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

async fn upload(
    t: &TestApp,
    access: &str,
    name: Option<&str>,
    file: Option<(&str, &str, &[u8])>,
) -> TestResponse {
    t.send(
        Request::builder()
            .method("POST")
            .uri("/api/v1/picture/upload")
            .header("authorization", format!("Bearer {access}"))
            .header(
                "content-type",
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(multipart_body(name, file)))
            .expect("failed to build request"),
    )
    .await
}

const PNG: &[u8] = b"\x89PNG\r\n\x1a\nfake-image-bytes";

#[tokio::test]
async fn upload_stores_file_and_serves_it_publicly() {
    let t = TestApp::spawn().await;
    let (_, access, _) = t.signed_in("bob").await;

    let resp = upload(&t, &access, Some("Coffee House"), Some(("Logo.PNG", "image/png", PNG))).await;
    assert_eq!(resp.status, StatusCode::CREATED, "{}", resp.body);
    let picture = resp.json()["picture"].clone();
    assert_eq!(picture["name"], "Coffee House");
    assert!(picture["createdAt"].as_str().is_some());
    let path = picture["path"].as_str().expect("path").to_string();
    assert!(path.starts_with("/public/suggestions/coffee-house-"));
    assert!(path.ends_with(".png"));

    let file_name = path.rsplit('/').next().expect("file name");
    let on_disk = t.upload_dir().join("suggestions").join(file_name);
    assert_eq!(std::fs::read(&on_disk).expect("uploaded file"), PNG);

    let served = t.request("GET", &path, None, None).await;
    assert_eq!(served.status, StatusCode::OK);
    assert_eq!(served.content_type.as_deref(), Some("image/png"));
    assert_eq!(served.bytes, PNG);
}

#[tokio::test]
async fn upload_validation_errors() {
    let t = TestApp::spawn().await;
    let (_, access, _) = t.signed_in("bob").await;

    let resp = upload(&t, &access, Some("logo"), None).await;
    assert_eq!(resp.code(), "NO_FILE_PROVIDED");

    let resp = upload(&t, &access, None, Some(("a.png", "image/png", PNG))).await;
    assert_eq!(resp.code(), "INVALID_INPUT");
    assert_eq!(resp.json()["message"], "Name is required");

    let resp = upload(&t, &access, Some("logo"), Some(("a.gif", "image/gif", PNG))).await;
    assert_eq!(resp.code(), "INVALID_FILE_TYPE");

    let big = vec![0u8; 2048];
    let resp = upload(&t, &access, Some("logo"), Some(("a.png", "image/png", &big))).await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    assert_eq!(resp.code(), "FILE_TOO_LARGE");

    let resp = upload(&t, &access, Some("logo"), Some(("a.png", "image/png", PNG))).await;
    assert_eq!(resp.status, StatusCode::CREATED);
    let resp = upload(&t, &access, Some("logo"), Some(("b.jpg", "image/jpeg", PNG))).await;
    assert_eq!(resp.status, StatusCode::CONFLICT);
    assert_eq!(resp.code(), "DUPLICATE_NAME");
}

#[tokio::test]
async fn upload_requires_authentication() {
    let t = TestApp::spawn().await;
    let resp = upload(&t, "bogus", Some("logo"), Some(("a.png", "image/png", PNG))).await;
    assert_eq!(resp.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn search_ranks_similar_names() {
    let t = TestApp::spawn().await;
    let (_, access, _) = t.signed_in("bob").await;
    for name in ["Coffee House", "Coffee", "Lidl"] {
        let resp = upload(&t, &access, Some(name), Some(("a.png", "image/png", PNG))).await;
        assert_eq!(resp.status, StatusCode::CREATED, "{}", resp.body);
    }

    let resp = t
        .request("GET", "/api/v1/picture/search?name=coffee", None, None)
        .await;
    assert_eq!(resp.status, StatusCode::OK, "{}", resp.body);
    let pictures = resp.json()["pictures"].clone();
    let names: Vec<&str> = pictures
        .as_array()
        .expect("array")
        .iter()
        .filter_map(|p| p["name"].as_str())
        .collect();
    assert_eq!(names, vec!["Coffee", "Coffee House"]);
    assert_eq!(pictures[0]["score"], json!(1.0));

    let resp = t
        .request("GET", "/api/v1/picture/search?name=zzzz", None, None)
        .await;
    assert_eq!(resp.status, StatusCode::NOT_FOUND);
    assert_eq!(resp.code(), "PICTURES_NOT_FOUND");

    let resp = t.request("GET", "/api/v1/picture/search", None, None).await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    assert_eq!(resp.code(), "INVALID_NAME_INPUT");
}

#[tokio::test]
async fn delete_removes_file_and_row() {
    let t = TestApp::spawn().await;
    let (_, access, _) = t.signed_in("bob").await;
    let resp = upload(&t, &access, Some("logo"), Some(("a.png", "image/png", PNG))).await;
    let path = resp.json()["picture"]["path"]
        .as_str()
        .expect("path")
        .to_string();

    let resp = t
        .request(
            "DELETE",
            "/api/v1/picture/delete",
            Some(&access),
            Some(json!({ "path": path.to_uppercase() })),
        )
        .await;
    assert_eq!(resp.status, StatusCode::OK, "{}", resp.body);
    let json = resp.json();
    assert_eq!(json["message"], "Deletion completed successfully");
    assert_eq!(json["deletedFromDisk"], true);
    assert_eq!(json["deletedFromDatabase"], true);

    let resp = t
        .request(
            "DELETE",
            "/api/v1/picture/delete",
            Some(&access),
            Some(json!({ "path": path })),
        )
        .await;
    assert_eq!(resp.status, StatusCode::NOT_FOUND);
    assert_eq!(resp.code(), "NOTHING_TO_DELETE");
}

#[tokio::test]
async fn delete_rejects_missing_and_escaping_paths() {
    let t = TestApp::spawn().await;
    let (_, access, _) = t.signed_in("bob").await;

    let resp = t
        .request("DELETE", "/api/v1/picture/delete", Some(&access), Some(json!({})))
        .await;
    assert_eq!(resp.code(), "NO_PATH_PROVIDED");

    let resp = t
        .request(
            "DELETE",
            "/api/v1/picture/delete",
            Some(&access),
            Some(json!({ "path": "/etc/passwd" })),
        )
        .await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    assert_eq!(resp.code(), "NO_PATH_PROVIDED");

    let resp = t
        .request(
            "DELETE",
            "/api/v1/picture/delete",
            Some(&access),
            Some(json!({ "path": "/public/suggestions/missing.png" })),
        )
        .await;
    assert_eq!(resp.code(), "NOTHING_TO_DELETE");
}
