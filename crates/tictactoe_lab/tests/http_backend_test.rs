//! Tests for the HTTP backend against a canned local server.

use futures::StreamExt;
use tictactoe_board::{Board, Mark};
use tictactoe_lab::{
    HttpBackend, JobRequest, LabConfig, MoveEndpoint, MoveRequest, MoveService, StatusEvent,
    TrainingService, TransportError,
};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// Serves one connection with `response` and returns the raw request.
async fn serve_once(response: String) -> (String, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("http://{}", listener.local_addr().unwrap());
    let handle = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let request = read_request(&mut socket).await;
        socket.write_all(response.as_bytes()).await.unwrap();
        socket.shutdown().await.unwrap();
        request
    });
    (url, handle)
}

async fn read_request(socket: &mut tokio::net::TcpStream) -> String {
    let mut raw = Vec::new();
    let mut buf = [0u8; 1024];
    loop {
        let n = socket.read(&mut buf).await.unwrap();
        raw.extend_from_slice(&buf[..n]);
        let text = String::from_utf8_lossy(&raw).to_string();
        if let Some(end) = text.find("\r\n\r\n") {
            let length = text[..end]
                .lines()
                .find_map(|line| {
                    let (name, value) = line.split_once(':')?;
                    name.eq_ignore_ascii_case("content-length")
                        .then(|| value.trim().parse::<usize>().ok())
                        .flatten()
                })
                .unwrap_or(0);
            if raw.len() >= end + 4 + length || n == 0 {
                return text;
            }
        }
        if n == 0 {
            return text;
        }
    }
}

fn json_response(status: &str, body: &str) -> String {
    format!(
        "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status,
        body.len(),
        body
    )
}

fn backend(url: &str) -> HttpBackend {
    HttpBackend::new(LabConfig::default().with_server_url(url)).unwrap()
}

#[tokio::test]
async fn test_move_request_posts_board_and_reads_cell() {
    let (url, server) = serve_once(json_response(
        "200 OK",
        r#"{"row": 0, "col": 1, "status": "success", "move_type": "minimax"}"#,
    ))
    .await;

    let request = MoveRequest::new(Board::new(), Mark::Agent);
    let reply = backend(&url)
        .request_move(MoveEndpoint::Search, &request)
        .await
        .unwrap();
    assert_eq!((reply.row, reply.col), (Some(0), Some(1)));
    assert_eq!(reply.move_type.as_deref(), Some("minimax"));

    let raw = server.await.unwrap();
    assert!(raw.starts_with("POST /api/move/minimax "));
    assert!(raw.contains(r#""player":1"#));
}

#[tokio::test]
async fn test_error_status_carries_server_message() {
    let (url, _server) = serve_once(json_response(
        "400 Bad Request",
        r#"{"status": "error", "message": "Training already in progress"}"#,
    ))
    .await;

    let request = JobRequest {
        generations: 5,
        games: 10,
        population_size: 10,
    };
    let result = backend(&url).submit_job(&request).await;
    assert_eq!(
        result,
        Err(TransportError::Status {
            code: 400,
            message: "Training already in progress".to_string()
        })
    );
}

#[tokio::test]
async fn test_unparseable_move_body_is_decode_error() {
    let (url, _server) = serve_once(json_response("200 OK", "<html>oops</html>")).await;

    let request = MoveRequest::new(Board::new(), Mark::Agent);
    let result = backend(&url)
        .request_move(MoveEndpoint::Inference, &request)
        .await;
    assert!(matches!(result, Err(TransportError::Decode { .. })));
}

#[tokio::test]
async fn test_status_stream_yields_events_until_close() {
    let body = concat!(
        ": connected\n\n",
        "data: {\"status\": \"training\", \"progress\": 0.5, \"generation\": 1}\n\n",
        "data: {\"status\": \"bogus\"}\n\n",
        "data: {\"status\": \"completed\", \"best_fitness\": 0.9}\n\n",
    );
    let response = format!(
        "HTTP/1.1 200 OK\r\nContent-Type: text/event-stream\r\nConnection: close\r\n\r\n{}",
        body
    );
    let (url, server) = serve_once(response).await;

    let stream = backend(&url).open_status_stream().await.unwrap();
    let items: Vec<Result<StatusEvent, TransportError>> = stream.collect().await;

    assert_eq!(items.len(), 3);
    assert!(matches!(&items[0], Ok(StatusEvent::Training(p)) if p.progress == Some(0.5)));
    assert!(matches!(&items[1], Err(TransportError::Decode { .. })));
    assert!(matches!(&items[2], Ok(StatusEvent::Completed(p)) if p.best_fitness == Some(0.9)));

    let raw = server.await.unwrap();
    assert!(raw.starts_with("GET /api/train/status "));
    assert!(raw.to_ascii_lowercase().contains("accept: text/event-stream"));
}

#[tokio::test]
async fn test_unreachable_server_is_connection_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("http://{}", listener.local_addr().unwrap());
    drop(listener);

    let result = backend(&url).model_status().await;
    assert!(matches!(result, Err(TransportError::Connection { .. })));
}
