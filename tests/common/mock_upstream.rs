use actix_multipart::Multipart;
use actix_web::{App, HttpResponse, HttpServer, http::StatusCode, web};
use futures::StreamExt;
use serde_json::{Value, json};
use std::net::TcpListener;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

#[derive(Debug, Clone, PartialEq)]
pub enum ReceivedRequest {
    Multipart {
        field: String,
        filename: String,
        content_type: Option<String>,
        len: usize,
    },
    Json(Value),
}

pub struct MockState {
    predict_response: Mutex<(u16, Value)>,
    class_names_response: Mutex<(u16, Value)>,
    predict_hits: AtomicUsize,
    class_names_hits: AtomicUsize,
    received: Mutex<Vec<ReceivedRequest>>,
}

/// Stand-in for both the hosted classifier and the class names document.
///
/// - `POST /api/predict` takes multipart uploads
/// - `POST /run/predict` takes Gradio-style JSON
/// - `GET /class_names.json` serves the mapping document
pub struct MockUpstream {
    base_url: String,
    state: web::Data<MockState>,
}

impl MockUpstream {
    pub async fn start(predict_response: Value) -> Self {
        let state = web::Data::new(MockState {
            predict_response: Mutex::new((200, predict_response)),
            class_names_response: Mutex::new((200, json!([]))),
            predict_hits: AtomicUsize::new(0),
            class_names_hits: AtomicUsize::new(0),
            received: Mutex::new(Vec::new()),
        });

        let listener = TcpListener::bind("127.0.0.1:0").expect("bind mock upstream");
        let port = listener.local_addr().unwrap().port();
        let data = state.clone();
        let server = HttpServer::new(move || {
            App::new()
                .app_data(data.clone())
                .route("/api/predict", web::post().to(predict_multipart))
                .route("/run/predict", web::post().to(predict_json))
                .route("/class_names.json", web::get().to(class_names))
        })
        .workers(1)
        .disable_signals()
        .listen(listener)
        .expect("listen mock upstream")
        .run();
        actix_web::rt::spawn(server);

        MockUpstream {
            base_url: format!("http://127.0.0.1:{}", port),
            state,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub fn set_predict_response(&self, status: u16, body: Value) {
        *self.state.predict_response.lock().unwrap() = (status, body);
    }

    pub fn set_class_names(&self, status: u16, body: Value) {
        *self.state.class_names_response.lock().unwrap() = (status, body);
    }

    pub fn predict_hits(&self) -> usize {
        self.state.predict_hits.load(Ordering::SeqCst)
    }

    pub fn class_names_hits(&self) -> usize {
        self.state.class_names_hits.load(Ordering::SeqCst)
    }

    pub fn received(&self) -> Vec<ReceivedRequest> {
        self.state.received.lock().unwrap().clone()
    }
}

fn reply(response: &Mutex<(u16, Value)>) -> HttpResponse {
    let (status, body) = response.lock().unwrap().clone();
    HttpResponse::build(StatusCode::from_u16(status).unwrap()).json(body)
}

async fn predict_multipart(mut payload: Multipart, state: web::Data<MockState>) -> HttpResponse {
    state.predict_hits.fetch_add(1, Ordering::SeqCst);
    while let Some(Ok(mut field)) = payload.next().await {
        let name = field.name().unwrap_or_default().to_string();
        let filename = field
            .content_disposition()
            .and_then(|cd| cd.get_filename())
            .unwrap_or_default()
            .to_string();
        let content_type = field.content_type().map(|m| m.to_string());
        let mut len = 0;
        while let Some(Ok(chunk)) = field.next().await {
            len += chunk.len();
        }
        state.received.lock().unwrap().push(ReceivedRequest::Multipart {
            field: name,
            filename,
            content_type,
            len,
        });
    }
    reply(&state.predict_response)
}

async fn predict_json(body: web::Json<Value>, state: web::Data<MockState>) -> HttpResponse {
    state.predict_hits.fetch_add(1, Ordering::SeqCst);
    state
        .received
        .lock()
        .unwrap()
        .push(ReceivedRequest::Json(body.into_inner()));
    reply(&state.predict_response)
}

async fn class_names(state: web::Data<MockState>) -> HttpResponse {
    state.class_names_hits.fetch_add(1, Ordering::SeqCst);
    reply(&state.class_names_response)
}
