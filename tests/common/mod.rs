#![allow(dead_code)]

pub mod mock_upstream;

use actix_web::test::TestRequest;

pub const BOUNDARY: &str = "floret-test-boundary";

pub fn flower_names() -> Vec<&'static str> {
    vec!["rose", "tulip", "lily", "daisy", "orchid", "sunflower"]
}

pub struct FormPart<'a> {
    pub name: &'a str,
    pub filename: Option<&'a str>,
    pub content_type: Option<&'a str>,
    pub body: &'a [u8],
}

impl<'a> FormPart<'a> {
    pub fn file(filename: &'a str, content_type: &'a str, body: &'a [u8]) -> Self {
        FormPart {
            name: "file",
            filename: Some(filename),
            content_type: Some(content_type),
            body,
        }
    }

    pub fn text(name: &'a str, body: &'a str) -> Self {
        FormPart {
            name,
            filename: None,
            content_type: None,
            body: body.as_bytes(),
        }
    }
}

pub fn multipart_body(parts: &[FormPart<'_>]) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        let mut disposition = format!("Content-Disposition: form-data; name=\"{}\"", part.name);
        if let Some(filename) = part.filename {
            disposition.push_str(&format!("; filename=\"{}\"", filename));
        }
        body.extend_from_slice(disposition.as_bytes());
        body.extend_from_slice(b"\r\n");
        if let Some(content_type) = part.content_type {
            body.extend_from_slice(format!("Content-Type: {}\r\n", content_type).as_bytes());
        }
        body.extend_from_slice(b"\r\n");
        body.extend_from_slice(part.body);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}

pub fn predict_request(parts: &[FormPart<'_>]) -> TestRequest {
    TestRequest::post()
        .uri("/predict")
        .insert_header((
            "content-type",
            format!("multipart/form-data; boundary={}", BOUNDARY),
        ))
        .set_payload(multipart_body(parts))
}
