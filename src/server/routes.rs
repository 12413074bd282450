use crate::server::api::{self, ApiError, AppState};

pub struct HttpResponse {
    pub status_code: u16,
    pub status_text: &'static str,
    pub content_type: &'static str,
    pub body: String,
}

impl HttpResponse {
    pub fn to_http_string(&self) -> String {
        format!(
            "HTTP/1.1 {} {}\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            self.status_code,
            self.status_text,
            self.content_type,
            self.body.len(),
            self.body
        )
    }
}

pub fn route_request(state: &AppState, method: &str, path: &str, body: &str) -> HttpResponse {
    let path = path.split('?').next().unwrap_or(path);
    let segments: Vec<&str> = path.trim_matches('/').split('/').collect();

    let result = match (method, segments.as_slice()) {
        ("GET", ["api", "health"]) => api::health_payload(state),
        ("GET", ["api", "units"]) => api::units_payload(state),
        ("POST", ["api", "units"]) => {
            return match api::open_unit_payload(state, body) {
                Ok(payload) => json_response(201, "Created", payload),
                Err(err) => api_error_response(&err),
            };
        }
        ("GET", ["api", "units", id]) => api::unit_payload(state, id),
        ("DELETE", ["api", "units", id]) => api::close_payload(state, id),
        ("GET", ["api", "units", id, "options"]) => api::options_payload(state, id),
        ("POST", ["api", "units", id, "select"]) => api::select_payload(state, id, body),
        ("POST", ["api", "units", id, "apply"]) => api::apply_payload(state, id),
        ("POST", ["api", "units", id, "resize"]) => api::resize_payload(state, id, body),
        ("POST", ["api", "units", id, "reset"]) => api::reset_payload(state, id),
        _ => return error_response(404, "Not Found", &format!("no route for {method} {path}")),
    };

    match result {
        Ok(payload) => json_response(200, "OK", payload),
        Err(err) => api_error_response(&err),
    }
}

fn json_response(status_code: u16, status_text: &'static str, body: String) -> HttpResponse {
    HttpResponse {
        status_code,
        status_text,
        content_type: "application/json",
        body,
    }
}

fn api_error_response(err: &ApiError) -> HttpResponse {
    let (status_code, status_text) = err.status();
    if status_code >= 500 {
        tracing::error!(error = %err, "request failed");
    }
    error_response(status_code, status_text, &err.to_string())
}

fn error_response(status_code: u16, status_text: &'static str, message: &str) -> HttpResponse {
    HttpResponse {
        status_code,
        status_text,
        content_type: "application/json",
        body: format!(
            "{{\n  \"status\": \"error\",\n  \"message\": {}\n}}",
            serde_json::to_string(message).unwrap_or_else(|_| "\"Unknown error\"".to_string())
        ),
    }
}
