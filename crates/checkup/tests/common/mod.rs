#![allow(dead_code)]

use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

use actix_web::{App, HttpRequest, HttpResponse, HttpServer, web};
use checkup::StatusStore;

/// Start an actix server on an ephemeral local port.
pub fn serve<F>(configure: F) -> SocketAddr
where
    F: Fn(&mut web::ServiceConfig) + Clone + Send + 'static,
{
    let server = HttpServer::new(move || App::new().configure(configure.clone()))
        .workers(1)
        .bind(("127.0.0.1", 0))
        .unwrap();
    let addr = server.addrs()[0];
    actix_web::rt::spawn(server.run());
    addr
}

/// A probe target with a plain status page, a JSON document and a page
/// that echoes the Host header it was asked for.
pub fn target() -> SocketAddr {
    serve(|cfg| {
        cfg.route("/health", web::get().to(|| async { HttpResponse::Ok().body("status: ready\n") }))
            .route(
                "/status.json",
                web::get().to(|| async {
                    HttpResponse::Ok()
                        .content_type("application/json")
                        .body(r#"{"data": {"nodes": [{"id": "n1"}]}}"#)
                }),
            )
            .route(
                "/vhost",
                web::get().to(|req: HttpRequest| async move {
                    let host = req.headers().get("host").and_then(|h| h.to_str().ok()).unwrap_or("");
                    if host == "status.example" {
                        HttpResponse::Ok().body("vhost ok")
                    } else {
                        HttpResponse::NotFound().finish()
                    }
                }),
            );
    })
}

/// Poll `path` until it decodes into a store holding `entries` entries.
pub async fn wait_for_store(path: &Path, entries: usize) -> StatusStore {
    for _ in 0..250 {
        if let Ok(bytes) = tokio::fs::read(path).await {
            if let Ok(store) = serde_json::from_slice::<StatusStore>(&bytes) {
                if store.len() >= entries {
                    return store;
                }
            }
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("status file {} never reached {} entries", path.display(), entries);
}
