//! Actix-Web WebSocket handler for the event gateway

use crate::gateway::events::EventBroadcaster;
use actix_web::{web, HttpRequest, HttpResponse};
use actix_ws::AggregatedMessage;
use futures_util::StreamExt;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Requests a client may send over the socket
#[derive(Debug, Deserialize)]
struct ClientRequest {
    #[serde(default)]
    id: Option<String>,
    method: String,
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/ws").route(web::get().to(ws_handler)));
}

async fn ws_handler(
    req: HttpRequest,
    stream: web::Payload,
    broadcaster: web::Data<Arc<EventBroadcaster>>,
) -> Result<HttpResponse, actix_web::Error> {
    let (response, session, msg_stream) = actix_ws::handle(&req, stream)?;
    actix_web::rt::spawn(handle_ws_connection(
        session,
        msg_stream,
        broadcaster.get_ref().clone(),
    ));
    Ok(response)
}

async fn handle_ws_connection(
    mut session: actix_ws::Session,
    msg_stream: actix_ws::MessageStream,
    broadcaster: Arc<EventBroadcaster>,
) {
    let mut msg_stream = msg_stream
        .aggregate_continuations()
        .max_continuation_size(64 * 1024);

    // Replay before subscribing live so a reconnecting page can rebuild its state
    for event in broadcaster.get_recent_events() {
        if let Ok(json) = serde_json::to_string(&event) {
            if session.text(json).await.is_err() {
                return;
            }
        }
    }

    let (client_id, mut event_rx) = broadcaster.subscribe();
    log::info!(
        "[GATEWAY] Client {} connected (total: {} clients)",
        client_id,
        broadcaster.client_count()
    );

    let (reply_tx, mut reply_rx) = mpsc::channel::<String>(32);
    let mut send_session = session.clone();
    let send_client_id = client_id.clone();

    let send_task = tokio::spawn(async move {
        loop {
            tokio::select! {
                Some(reply) = reply_rx.recv() => {
                    if send_session.text(reply).await.is_err() {
                        break;
                    }
                }
                Some(event) = event_rx.recv() => {
                    if let Ok(json) = serde_json::to_string(&event) {
                        if send_session.text(json).await.is_err() {
                            log::warn!("[GATEWAY] Failed to send event to client {}", send_client_id);
                            break;
                        }
                    }
                }
                else => break,
            }
        }
    });

    while let Some(msg_result) = msg_stream.next().await {
        match msg_result {
            Ok(AggregatedMessage::Text(text)) => {
                let reply = handle_request(&text, &broadcaster);
                let _ = reply_tx.send(reply.to_string()).await;
            }
            Ok(AggregatedMessage::Ping(data)) => {
                if session.pong(&data).await.is_err() {
                    break;
                }
            }
            Ok(AggregatedMessage::Close(_)) => break,
            Err(e) => {
                log::error!("[GATEWAY] WebSocket error: {:?}", e);
                break;
            }
            _ => {}
        }
    }

    broadcaster.unsubscribe(&client_id);
    send_task.abort();
    let _ = session.close(None).await;
    log::info!("[GATEWAY] Client {} disconnected", client_id);
}

fn handle_request(text: &str, broadcaster: &EventBroadcaster) -> serde_json::Value {
    let request: ClientRequest = match serde_json::from_str(text) {
        Ok(req) => req,
        Err(e) => return json!({ "type": "error", "error": format!("Invalid request: {}", e) }),
    };

    match request.method.as_str() {
        "ping" => json!({ "type": "response", "id": request.id, "result": "pong" }),
        "status" => json!({
            "type": "response",
            "id": request.id,
            "result": { "clients": broadcaster.client_count() },
        }),
        other => json!({
            "type": "error",
            "id": request.id,
            "error": format!("Unknown method '{}'", other),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_handle_ping() {
        let broadcaster = EventBroadcaster::new();
        let reply = handle_request(r#"{"id":"1","method":"ping"}"#, &broadcaster);
        assert_eq!(reply["result"], "pong");
        assert_eq!(reply["id"], "1");
    }

    #[tokio::test]
    async fn test_handle_unknown_and_malformed() {
        let broadcaster = EventBroadcaster::new();
        assert_eq!(handle_request(r#"{"method":"vote"}"#, &broadcaster)["type"], "error");
        assert_eq!(handle_request("not json", &broadcaster)["type"], "error");
    }
}
