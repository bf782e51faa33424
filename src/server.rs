use crate::app_state::{AppConfig, AppState};
use crate::error::ClassifyError;
use crate::io_struct::UploadedImage;
use actix_multipart::Multipart;
use actix_web::{HttpRequest, HttpResponse, HttpServer, get, post, web};
use bytes::BytesMut;
use futures::StreamExt;
use serde_json::json;
use std::io::Write;

#[get("/health")]
pub async fn health(_req: HttpRequest, _: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().body("Ok")
}

#[get("/class_names")]
pub async fn class_names(_req: HttpRequest, app_state: web::Data<AppState>) -> HttpResponse {
    let mapping = app_state.normalizer.class_names().get_mapping().await;
    HttpResponse::Ok().json(json!({ "class_names": mapping }))
}

#[post("/predict")]
pub async fn predict(
    mut payload: Multipart,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, ClassifyError> {
    let image = read_upload(&mut payload, app_state.max_upload_bytes).await?;
    let outcome = app_state.classify(image).await?;
    Ok(HttpResponse::Ok().json(outcome))
}

/// Pulls the `file` part out of a multipart body. Other parts are drained and ignored.
pub async fn read_upload(
    payload: &mut Multipart,
    limit: usize,
) -> Result<UploadedImage, ClassifyError> {
    let mut upload = None;
    while let Some(field) = payload.next().await {
        let mut field = field.map_err(|e| ClassifyError::BadUpload(e.to_string()))?;
        let is_file = upload.is_none() && field.name() == Some("file");
        let filename = field
            .content_disposition()
            .and_then(|cd| cd.get_filename())
            .unwrap_or_default()
            .to_string();
        let content_type = field.content_type().map(|m| m.to_string());

        let mut buf = BytesMut::new();
        while let Some(chunk) = field.next().await {
            let chunk = chunk.map_err(|e| ClassifyError::BadUpload(e.to_string()))?;
            if !is_file {
                continue;
            }
            if buf.len() + chunk.len() > limit {
                return Err(ClassifyError::PayloadTooLarge { limit });
            }
            buf.extend_from_slice(&chunk);
        }
        if is_file {
            upload = Some(UploadedImage::new(filename, content_type, buf.freeze()));
        }
    }
    upload.ok_or(ClassifyError::MissingFile)
}

pub fn init_logging(level: &str) {
    let level = level.parse().unwrap_or(log::LevelFilter::Info);
    let _ = env_logger::Builder::new()
        .format(|buf, record| {
            writeln!(
                buf,
                "{} - {} - {}",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
                record.level(),
                record.args()
            )
        })
        .filter(None, level)
        .parse_default_env()
        .try_init();
}

pub async fn startup(config: AppConfig, app_state: AppState) -> std::io::Result<()> {
    let app_state = web::Data::new(app_state);

    log::info!(
        "Starting server at {}:{}, forwarding to {}",
        config.host,
        config.port,
        config.inference_url
    );

    HttpServer::new(move || {
        actix_web::App::new()
            .wrap(actix_web::middleware::Logger::default())
            .app_data(app_state.clone())
            .service(health)
            .service(class_names)
            .service(predict)
    })
    .bind((config.host, config.port))?
    .run()
    .await?;

    std::io::Result::Ok(())
}
