//! Receive endpoint for results pushed by peer agents.

use actix_web::http::header;
use actix_web::{HttpResponse, web};
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, warn};

use crate::RESULTS_PATH;
use crate::result::CheckResult;

/// Shared handle on the persister's incoming stage.
pub type Incoming = web::Data<UnboundedSender<CheckResult>>;

pub fn incoming(sender: UnboundedSender<CheckResult>) -> Incoming {
    web::Data::new(sender)
}

/// Register the results endpoint. Expects an [`Incoming`] in the app data.
pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource(RESULTS_PATH)
            .route(web::put().to(put_result))
            .default_service(web::to(method_not_allowed)),
    );
}

async fn put_result(incoming: Incoming, payload: web::Payload) -> HttpResponse {
    let body = match payload.to_bytes().await {
        Ok(body) => body,
        Err(e) => {
            warn!("Cannot read result body: {}", e);
            return internal_error();
        }
    };
    let result: CheckResult = match serde_json::from_slice(&body) {
        Ok(result) => result,
        Err(e) => {
            warn!("Cannot unmarshal received result: {}", e);
            return internal_error();
        }
    };

    debug!("Received result of {}/{} from {}", result.host, result.product, result.from);
    if incoming.send(result).is_err() {
        warn!("Incoming stage closed, dropping received result");
        return internal_error();
    }
    HttpResponse::Ok().content_type("text/plain; charset=utf-8").body("Success\n")
}

async fn method_not_allowed() -> HttpResponse {
    HttpResponse::MethodNotAllowed()
        .insert_header((header::ALLOW, "PUT"))
        .content_type("text/plain; charset=utf-8")
        .body("Method not allowed")
}

fn internal_error() -> HttpResponse {
    HttpResponse::InternalServerError()
        .content_type("text/plain; charset=utf-8")
        .body("Internal Server Error")
}
